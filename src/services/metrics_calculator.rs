use chrono::{DateTime, Duration, FixedOffset};
use tracing::warn;

use crate::models::analytics::{
    CompletionStats, DayType, DayTypeBreakdown, OptimalWorkPeriods, PeriodKind, PeriodStatistic,
    ProcrastinationLevel, ProcrastinationMetrics, ProductivityTrend, TimeRange, TimeSlot,
    TimeSlotBreakdown, TrendDirection, WorkPeriodStats,
};
use crate::models::settings::ProcrastinationSettings;
use crate::models::task::TaskRecord;
use crate::utils::time_bucket;

const STABLE_SLOPE_THRESHOLD: f64 = 0.1;
const VOLUME_SATURATION: f64 = 10.0;
const COMPLETION_WEIGHT: f64 = 0.7;
const VOLUME_WEIGHT: f64 = 0.3;
const LOW_PRODUCTIVITY_SCORE: u32 = 40;
const UNEVEN_DEVIATION: f64 = 0.5;

pub fn completion_rate(records: &[TaskRecord], range: Option<&TimeRange>) -> CompletionStats {
    let (total, completed) = records
        .iter()
        .filter(|record| range.map_or(true, |range| range.contains(record.create_time)))
        .fold((0usize, 0usize), |(total, completed), record| {
            (total + 1, completed + usize::from(record.completed))
        });
    stats_from_counts(total, completed)
}

pub(crate) fn stats_from_counts(total: usize, completed: usize) -> CompletionStats {
    let pending = total.saturating_sub(completed);
    CompletionStats {
        total,
        completed,
        pending,
        completion_rate: percent(completed, total),
        pending_rate: percent(pending, total),
    }
}

pub(crate) fn percent(part: usize, total: usize) -> u32 {
    if total == 0 {
        0
    } else {
        ((part as f64 / total as f64) * 100.0).round() as u32
    }
}

/// Bounds of the `index`-th most recent bucket, `0` being the one holding `now`.
/// `None` once the bucket would start before the earliest representable instant.
pub fn period_bounds(
    period: PeriodKind,
    index: u32,
    now: DateTime<FixedOffset>,
) -> Option<TimeRange> {
    let back = i64::from(index);
    // One extra bucket of headroom keeps the boundary helpers in range.
    match period {
        PeriodKind::Day => {
            now.checked_sub_signed(Duration::days(back + 1))?;
            let day = now - Duration::days(back);
            Some(TimeRange::new(time_bucket::start_of_day(day), time_bucket::end_of_day(day)))
        }
        PeriodKind::Week => {
            let current = time_bucket::start_of_week(now);
            current.checked_sub_signed(Duration::weeks(back + 1))?;
            let week = current - Duration::weeks(back);
            Some(TimeRange::new(week, time_bucket::end_of_week(week)))
        }
        PeriodKind::Month => {
            let months = i32::try_from(index).ok()?;
            let current = time_bucket::start_of_month(now);
            time_bucket::add_months(current, -months.checked_add(1)?)?;
            let month = time_bucket::add_months(current, -months)?;
            Some(TimeRange::new(month, time_bucket::end_of_month(month)))
        }
    }
}

/// Per-bucket completion statistics for the last `count` buckets, oldest first.
/// Buckets that would reach past the representable calendar are left out, so
/// the result can hold fewer than `count` entries but never repeats one.
pub fn time_period_stats(
    records: &[TaskRecord],
    period: PeriodKind,
    count: u32,
    now: DateTime<FixedOffset>,
) -> Vec<PeriodStatistic> {
    let mut buckets: Vec<PeriodStatistic> = (0..count)
        .map_while(|index| period_bounds(period, index, now))
        .map(|range| {
            let stats = completion_rate(records, Some(&range));
            PeriodStatistic {
                label: time_bucket::bucket_label(range.start, period),
                period,
                start_date: range.start,
                end_date: range.end,
                total: stats.total,
                completed: stats.completed,
                pending: stats.pending,
                completion_rate: stats.completion_rate,
                pending_rate: stats.pending_rate,
            }
        })
        .collect();
    buckets.reverse();
    buckets
}

/// Ordinary-least-squares slope of `values` against their index.
pub fn linear_slope(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }

    let mean_x = (n - 1) as f64 / 2.0;
    let mean_y = values.iter().sum::<f64>() / n as f64;
    let (numerator, denominator) =
        values
            .iter()
            .enumerate()
            .fold((0.0, 0.0), |(num, den), (index, value)| {
                let dx = index as f64 - mean_x;
                (num + dx * (value - mean_y), den + dx * dx)
            });

    if denominator == 0.0 {
        0.0
    } else {
        finite_or_zero(numerator / denominator)
    }
}

pub fn productivity_trend(
    records: &[TaskRecord],
    days: u32,
    now: DateTime<FixedOffset>,
) -> ProductivityTrend {
    let periods = time_period_stats(records, PeriodKind::Day, days, now);
    if periods.len() < 2 {
        return ProductivityTrend {
            trend: TrendDirection::Stable,
            change: 0.0,
            daily_average: 0.0,
            description: "数据不足，暂时无法判断效率趋势".to_string(),
            periods,
        };
    }

    let series: Vec<f64> = periods.iter().map(|period| period.completed as f64).collect();
    let slope = linear_slope(&series);
    let daily_average = series.iter().sum::<f64>() / series.len() as f64;

    let trend = if slope.abs() < STABLE_SLOPE_THRESHOLD {
        TrendDirection::Stable
    } else if slope > 0.0 {
        TrendDirection::Increasing
    } else {
        TrendDirection::Decreasing
    };

    let description = match trend {
        TrendDirection::Increasing => format!(
            "完成数量呈上升趋势，每天多完成约 {:.2} 个任务，日均完成 {:.1} 个",
            slope, daily_average
        ),
        TrendDirection::Decreasing => format!(
            "完成数量呈下降趋势，每天少完成约 {:.2} 个任务，日均完成 {:.1} 个",
            slope.abs(),
            daily_average
        ),
        TrendDirection::Stable => {
            format!("完成数量保持平稳，日均完成 {:.1} 个任务", daily_average)
        }
    };

    ProductivityTrend {
        trend,
        change: round_to(slope, 3),
        daily_average: round_to(daily_average, 2),
        description,
        periods,
    }
}

pub fn procrastination_metrics(
    records: &[TaskRecord],
    now: DateTime<FixedOffset>,
) -> ProcrastinationMetrics {
    procrastination_metrics_with(records, now, &ProcrastinationSettings::default())
}

pub fn procrastination_metrics_with(
    records: &[TaskRecord],
    now: DateTime<FixedOffset>,
    settings: &ProcrastinationSettings,
) -> ProcrastinationMetrics {
    let mut pending = 0usize;
    let mut delayed = 0usize;
    let mut long_term = 0usize;
    let mut very_long_term = 0usize;
    let mut delay_days_total = 0i64;
    let mut latencies: Vec<f64> = Vec::new();
    let mut inconsistent = 0usize;

    for record in records {
        if !record.completed {
            pending += 1;
            let age = time_bucket::days_difference(record.create_time, now);
            if age > settings.delayed_days {
                delayed += 1;
                delay_days_total += age;
                if age > settings.long_term_days {
                    long_term += 1;
                }
                if age > settings.very_long_term_days {
                    very_long_term += 1;
                }
            }
            continue;
        }

        if let Some(completed_at) = record.update_time {
            let latency = time_bucket::elapsed_days(record.create_time, completed_at);
            if latency < 0.0 {
                inconsistent += 1;
                warn!(
                    target: "app::analytics",
                    task_id = %record.id,
                    "updateTime precedes createTime; treating latency as zero"
                );
            }
            latencies.push(latency.max(0.0));
        }
    }

    let average_completion_days = mean(&latencies);
    let average_delay_days = if delayed > 0 {
        delay_days_total as f64 / delayed as f64
    } else {
        0.0
    };

    let delayed_ratio = ratio(delayed, records.len());
    let long_term_ratio = ratio(long_term, delayed);
    let very_long_term_ratio = ratio(very_long_term, delayed);

    let score = procrastination_score(
        delayed_ratio,
        long_term_ratio,
        very_long_term_ratio,
        average_completion_days,
        settings,
    );
    let level = procrastination_level(score);

    ProcrastinationMetrics {
        total_tasks: records.len(),
        pending_tasks: pending,
        delayed_tasks: delayed,
        long_term_delayed: long_term,
        very_long_term_delayed: very_long_term,
        average_delay_days: round_to(average_delay_days, 1),
        average_completion_days: round_to(average_completion_days, 1),
        inconsistent_records: inconsistent,
        procrastination_score: score,
        procrastination_level: level,
        recommendations: level_recommendations(level),
    }
}

/// Weighted sum of the four capped sub-scores, clamped to `[0, 100]`.
pub fn procrastination_score(
    delayed_ratio: f64,
    long_term_ratio: f64,
    very_long_term_ratio: f64,
    average_completion_days: f64,
    settings: &ProcrastinationSettings,
) -> u32 {
    let weights = &settings.weights;
    let capped = |value: f64, cap: f64| finite_or_zero(value).clamp(0.0, cap.max(0.0));

    let delayed = capped(delayed_ratio * weights.delayed, weights.delayed);
    let long_term = capped(long_term_ratio * weights.long_term, weights.long_term);
    let very_long_term = capped(
        very_long_term_ratio * weights.very_long_term,
        weights.very_long_term,
    );
    let latency = if average_completion_days > settings.completion_baseline_days {
        capped(
            (average_completion_days - settings.completion_baseline_days)
                * settings.completion_penalty_per_day,
            weights.completion_latency,
        )
    } else {
        0.0
    };

    (delayed + long_term + very_long_term + latency)
        .clamp(0.0, 100.0)
        .round() as u32
}

pub fn procrastination_level(score: u32) -> ProcrastinationLevel {
    match score {
        0..=19 => ProcrastinationLevel::Low,
        20..=39 => ProcrastinationLevel::Moderate,
        40..=69 => ProcrastinationLevel::High,
        _ => ProcrastinationLevel::VeryHigh,
    }
}

pub fn level_recommendations(level: ProcrastinationLevel) -> Vec<String> {
    let items: &[&str] = match level {
        ProcrastinationLevel::Low => &[
            "保持当前的节奏，你的任务推进很及时",
            "继续及时记录新任务，避免遗漏",
        ],
        ProcrastinationLevel::Moderate => &[
            "每天开始前挑出 1-2 个积压任务优先处理",
            "把超过一周未动的任务拆分成更小的步骤",
            "为重要任务设置明确的截止时间",
        ],
        ProcrastinationLevel::High => &[
            "立即清理拖延超过一周的任务，决定完成、委派或删除",
            "使用番茄工作法，以 25 分钟为单位启动困难任务",
            "每天限定新增任务数量，先消化积压",
            "每周固定时间复盘未完成任务",
        ],
        ProcrastinationLevel::VeryHigh => &[
            "暂停新增任务，集中精力清理长期积压",
            "把每个积压任务拆成 15 分钟内可完成的第一步",
            "请同伴或导师定期检查进度，建立外部约束",
            "考虑寻求结构化的时间管理辅导或干预",
        ],
    };
    items.iter().map(|item| item.to_string()).collect()
}

/// Blend of completion ratio and volume, `0..=100`. Volume saturates at ten
/// tasks so a single finished task cannot outrank a busy bucket.
pub fn productivity_score(total: usize, completed: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    let completion = completed as f64 / total as f64;
    let volume = (total as f64 / VOLUME_SATURATION).min(1.0);
    (100.0 * (COMPLETION_WEIGHT * completion + VOLUME_WEIGHT * volume))
        .clamp(0.0, 100.0)
        .round() as u32
}

pub fn optimal_work_periods(records: &[TaskRecord]) -> OptimalWorkPeriods {
    let mut time_slots = TimeSlotBreakdown::default();
    let mut day_types = DayTypeBreakdown::default();

    for record in records {
        let completed = usize::from(record.completed);

        let slot = time_slots.get_mut(time_bucket::time_slot(record.create_time));
        slot.total += 1;
        slot.completed += completed;

        let day = day_types.get_mut(time_bucket::day_type(record.create_time));
        day.total += 1;
        day.completed += completed;
    }

    for slot in TimeSlot::ALL {
        score_bucket(time_slots.get_mut(slot));
    }
    for day in [DayType::Weekday, DayType::Weekend] {
        score_bucket(day_types.get_mut(day));
    }

    let best_time_slot = best_bucket(TimeSlot::ALL, |slot| *time_slots.get(slot));
    let best_day_type = best_bucket([DayType::Weekday, DayType::Weekend], |day| {
        *day_types.get(day)
    });

    let mut recommendations = Vec::new();
    if let Some(slot) = best_time_slot {
        recommendations.push(format!(
            "你在{}的效率最高（生产力得分 {}），建议把重要任务安排在这个时段",
            slot.label(),
            time_slots.get(slot).productivity_score
        ));
    }

    for slot in TimeSlot::ALL {
        let stats = time_slots.get(slot);
        if stats.total > 0
            && stats.productivity_score < LOW_PRODUCTIVITY_SCORE
            && Some(slot) != best_time_slot
        {
            recommendations.push(format!(
                "{}的生产力偏低（得分 {}），尽量避免在该时段安排关键任务",
                slot.label(),
                stats.productivity_score
            ));
        }
    }

    let counts: Vec<f64> = TimeSlot::ALL
        .iter()
        .map(|slot| time_slots.get(*slot).total as f64)
        .collect();
    let average = mean(&counts);
    if average > 0.0
        && counts
            .iter()
            .any(|count| (count - average).abs() > average * UNEVEN_DEVIATION)
    {
        recommendations.push("任务在各时段的分布不均衡，可以尝试更均匀地安排工作".to_string());
    }

    if let Some(day) = best_day_type {
        if day_types.weekday.total > 0 && day_types.weekend.total > 0 {
            recommendations.push(format!("{}的完成效率更高", day.label()));
        }
    }

    OptimalWorkPeriods {
        time_slots,
        day_types,
        best_time_slot,
        best_day_type,
        recommendations,
    }
}

fn score_bucket(stats: &mut WorkPeriodStats) {
    stats.completion_rate = percent(stats.completed, stats.total);
    stats.productivity_score = productivity_score(stats.total, stats.completed);
}

/// Highest-scoring non-empty bucket; the earliest candidate wins ties.
fn best_bucket<K: Copy, const N: usize>(
    candidates: [K; N],
    stats: impl Fn(K) -> WorkPeriodStats,
) -> Option<K> {
    let mut best: Option<(K, u32)> = None;
    for key in candidates {
        let current = stats(key);
        if current.total == 0 {
            continue;
        }
        match best {
            Some((_, score)) if current.productivity_score <= score => {}
            _ => best = Some((key, current.productivity_score)),
        }
    }
    best.map(|(key, _)| key)
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        finite_or_zero(values.iter().sum::<f64>() / values.len() as f64)
    }
}

fn ratio(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    finite_or_zero((value * factor).round() / factor)
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}
