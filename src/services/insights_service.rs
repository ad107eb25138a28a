//! Personalized insight synthesis: working style, task habits, completion
//! streaks, achievement badges, and the recommendation lists derived from
//! a finished report's sections.

use std::collections::BTreeSet;

use chrono::{DateTime, FixedOffset, NaiveDate, Timelike};

use crate::models::analytics::{
    Achievement, AchievementCategory, CompletionStats, OptimalWorkPeriods, PersonalizedInsights,
    ProcrastinationLevel, ProcrastinationMetrics, ProductivityTrend, StreakSummary, TaskPatterns,
    TrendDirection, WorkStyle, WorkingStyle,
};
use crate::models::report::{Recommendation, RecommendationPriority, Recommendations};
use crate::models::task::TaskRecord;
use crate::services::metrics_calculator::{self, mean, percent, round_to};
use crate::utils::time_bucket;

const QUICK_COMPLETION_DAYS: f64 = 1.0;
const SPRINT_MAX_DAYS: f64 = 1.0;
const SPRINT_QUICK_RATIO: f64 = 0.7;
const MARATHON_MIN_DAYS: f64 = 3.0;
const MIXED_FAST_QUICK_RATIO: f64 = 0.5;
const MIN_TASKS_FOR_RATE_BADGE: usize = 10;

const VOLUME_TIERS: [(usize, &str, &str); 3] = [
    (100, "volume-100", "百项达成"),
    (50, "volume-50", "半百里程碑"),
    (10, "volume-10", "初露锋芒"),
];
const RATE_TIERS: [(u32, &str, &str); 2] = [
    (90, "rate-90", "执行大师"),
    (75, "rate-75", "稳定输出"),
];
const STREAK_TIERS: [(u32, &str, &str); 2] = [
    (7, "streak-7", "周冠军"),
    (3, "streak-3", "渐入佳境"),
];

pub fn personalized_insights(
    records: &[TaskRecord],
    now: DateTime<FixedOffset>,
) -> PersonalizedInsights {
    let working_style = working_style(records);
    let task_patterns = task_patterns(records);
    let streaks = streaks(records, now);
    let overview = metrics_calculator::completion_rate(records, None);
    let achievements = achievements(&overview, &streaks);

    let mut summary = vec![format!(
        "你的工作风格是{}：{}",
        working_style.style.label(),
        working_style.description
    )];
    if let Some(hour) = task_patterns.peak_creation_hour {
        summary.push(format!("你最常在 {hour}:00 左右创建任务"));
    }
    if streaks.current_streak > 0 {
        summary.push(format!("已连续 {} 天完成任务", streaks.current_streak));
    } else if streaks.longest_streak > 0 {
        summary.push(format!(
            "历史最长连续完成 {} 天，今天完成一个任务重新开始吧",
            streaks.longest_streak
        ));
    }
    if !achievements.is_empty() {
        let titles: Vec<&str> = achievements.iter().map(|badge| badge.title.as_str()).collect();
        summary.push(format!("已获得成就：{}", titles.join("、")));
    }

    PersonalizedInsights {
        working_style,
        task_patterns,
        streaks,
        achievements,
        summary,
    }
}

pub fn working_style(records: &[TaskRecord]) -> WorkingStyle {
    let latencies: Vec<f64> = records
        .iter()
        .filter_map(|record| {
            record
                .completion_time()
                .map(|done| time_bucket::elapsed_days(record.create_time, done).max(0.0))
        })
        .collect();

    if latencies.is_empty() {
        return WorkingStyle {
            style: WorkStyle::Balanced,
            average_completion_days: 0.0,
            quick_completion_ratio: 0.0,
            sample_size: 0,
            description: "已完成的任务还不够多，暂时无法判断工作风格".to_string(),
        };
    }

    let average = mean(&latencies);
    let quick = latencies
        .iter()
        .filter(|days| **days <= QUICK_COMPLETION_DAYS)
        .count();
    let quick_ratio = quick as f64 / latencies.len() as f64;

    let style = if average < SPRINT_MAX_DAYS && quick_ratio > SPRINT_QUICK_RATIO {
        WorkStyle::Sprint
    } else if average > MARATHON_MIN_DAYS {
        WorkStyle::Marathon
    } else if quick_ratio > MIXED_FAST_QUICK_RATIO {
        WorkStyle::MixedFast
    } else {
        WorkStyle::Balanced
    };

    let description = match style {
        WorkStyle::Sprint => "大多数任务在一天内完成，行动迅速",
        WorkStyle::Marathon => "任务通常需要数天完成，适合深度投入的长期工作",
        WorkStyle::MixedFast => "多数任务完成得很快，少数任务周期较长",
        WorkStyle::Balanced => "任务完成节奏均衡，快慢适中",
    }
    .to_string();

    WorkingStyle {
        style,
        average_completion_days: round_to(average, 1),
        quick_completion_ratio: round_to(quick_ratio, 2),
        sample_size: latencies.len(),
        description,
    }
}

pub fn task_patterns(records: &[TaskRecord]) -> TaskPatterns {
    let title_lengths: Vec<f64> = records
        .iter()
        .map(|record| record.title.chars().count() as f64)
        .collect();
    let described = records.iter().filter(|record| record.has_description()).count();

    TaskPatterns {
        average_title_length: round_to(mean(&title_lengths), 1),
        description_rate: percent(described, records.len()),
        peak_creation_hour: peak_hour(records),
    }
}

/// Most frequent creation hour; the hour seen first wins ties.
fn peak_hour(records: &[TaskRecord]) -> Option<u32> {
    let mut counts: Vec<(u32, usize)> = Vec::new();
    for record in records {
        let hour = record.create_time.hour();
        match counts.iter_mut().find(|(seen, _)| *seen == hour) {
            Some((_, count)) => *count += 1,
            None => counts.push((hour, 1)),
        }
    }

    let mut best: Option<(u32, usize)> = None;
    for (hour, count) in counts {
        match best {
            Some((_, top)) if count <= top => {}
            _ => best = Some((hour, count)),
        }
    }
    best.map(|(hour, _)| hour)
}

/// Consecutive days with a completion, walking back from `now`'s calendar
/// day. A day without completions ends the walk, so a quiet today yields 0.
pub fn streaks(records: &[TaskRecord], now: DateTime<FixedOffset>) -> StreakSummary {
    let offset = *now.offset();
    let days: BTreeSet<NaiveDate> = records
        .iter()
        .filter_map(|record| record.completion_time())
        .map(|done| done.with_timezone(&offset).date_naive())
        .collect();

    let mut current = 0u32;
    let mut cursor = Some(now.date_naive());
    while let Some(day) = cursor {
        if !days.contains(&day) {
            break;
        }
        current += 1;
        cursor = day.pred_opt();
    }

    let mut longest = 0u32;
    let mut run = 0u32;
    let mut previous: Option<NaiveDate> = None;
    for day in &days {
        run = match previous.and_then(|prev| prev.succ_opt()) {
            Some(expected) if expected == *day => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        previous = Some(*day);
    }

    StreakSummary {
        current_streak: current,
        longest_streak: longest,
        last_completion_date: days.iter().next_back().copied(),
    }
}

/// One badge per category, the highest tier reached.
pub fn achievements(overview: &CompletionStats, streaks: &StreakSummary) -> Vec<Achievement> {
    let mut earned = Vec::new();

    if let Some((threshold, id, title)) = VOLUME_TIERS
        .iter()
        .find(|(threshold, _, _)| overview.completed >= *threshold)
    {
        earned.push(Achievement {
            id: id.to_string(),
            category: AchievementCategory::Volume,
            title: title.to_string(),
            description: format!("累计完成 {threshold} 个任务"),
        });
    }

    if overview.total >= MIN_TASKS_FOR_RATE_BADGE {
        if let Some((threshold, id, title)) = RATE_TIERS
            .iter()
            .find(|(threshold, _, _)| overview.completion_rate >= *threshold)
        {
            earned.push(Achievement {
                id: id.to_string(),
                category: AchievementCategory::CompletionRate,
                title: title.to_string(),
                description: format!("任务完成率达到 {threshold}%"),
            });
        }
    }

    if let Some((threshold, id, title)) = STREAK_TIERS
        .iter()
        .find(|(threshold, _, _)| streaks.current_streak >= *threshold)
    {
        earned.push(Achievement {
            id: id.to_string(),
            category: AchievementCategory::Streak,
            title: title.to_string(),
            description: format!("连续 {threshold} 天完成任务"),
        });
    }

    earned
}

pub fn build_recommendations(
    overview: &CompletionStats,
    trend: &ProductivityTrend,
    procrastination: &ProcrastinationMetrics,
    work_periods: &OptimalWorkPeriods,
    insights: Option<&PersonalizedInsights>,
) -> Recommendations {
    let mut recommendations = Recommendations::default();

    if matches!(
        procrastination.procrastination_level,
        ProcrastinationLevel::High | ProcrastinationLevel::VeryHigh
    ) {
        recommendations.immediate.push(Recommendation {
            priority: RecommendationPriority::High,
            category: "procrastination".to_string(),
            title: "控制拖延".to_string(),
            description: format!(
                "拖延指数为 {}（{}），积压任务正在影响整体进度",
                procrastination.procrastination_score,
                procrastination.procrastination_level.label()
            ),
            actions: procrastination.recommendations.iter().take(2).cloned().collect(),
        });
    }

    if procrastination.long_term_delayed > 0 {
        recommendations.immediate.push(Recommendation {
            priority: RecommendationPriority::High,
            category: "backlog".to_string(),
            title: "清理长期积压".to_string(),
            description: format!(
                "有 {} 个任务已拖延超过一周",
                procrastination.long_term_delayed
            ),
            actions: vec![
                "逐一决定：立即完成、重新排期或删除".to_string(),
                "为保留的任务写下下一步具体行动".to_string(),
            ],
        });
    }

    if overview.total > 0 && overview.completion_rate < 50 {
        recommendations.immediate.push(Recommendation {
            priority: RecommendationPriority::Medium,
            category: "completion".to_string(),
            title: "提升完成率".to_string(),
            description: format!("当前完成率为 {}%，低于一半", overview.completion_rate),
            actions: vec![
                "每天只设定 3 个必须完成的任务".to_string(),
                "优先完成耗时少于 15 分钟的任务".to_string(),
            ],
        });
    }

    if trend.trend == TrendDirection::Decreasing {
        recommendations.strategic.push(Recommendation {
            priority: RecommendationPriority::High,
            category: "trend".to_string(),
            title: "扭转下降趋势".to_string(),
            description: trend.description.clone(),
            actions: vec![
                "回顾最近一周的任务安排，找出阻碍因素".to_string(),
                "适当减少新任务，恢复稳定节奏".to_string(),
            ],
        });
    }

    if let Some(insights) = insights {
        if insights.working_style.style == WorkStyle::Marathon {
            recommendations.strategic.push(Recommendation {
                priority: RecommendationPriority::Medium,
                category: "work_style".to_string(),
                title: "拆分大任务".to_string(),
                description: format!(
                    "任务平均需要 {:.1} 天完成",
                    insights.working_style.average_completion_days
                ),
                actions: vec![
                    "把大任务拆成一天内可完成的子任务".to_string(),
                    "为每个子任务设置检查点".to_string(),
                ],
            });
        }

        if insights.streaks.current_streak == 0 && overview.completed > 0 {
            recommendations.strategic.push(Recommendation {
                priority: RecommendationPriority::Low,
                category: "habit".to_string(),
                title: "建立每日节奏".to_string(),
                description: "今天还没有完成任务，连续完成能帮助形成习惯".to_string(),
                actions: vec!["每天至少完成一个小任务".to_string()],
            });
        }

        if overview.total > 0 && insights.task_patterns.description_rate < 50 {
            recommendations.optimization.push(Recommendation {
                priority: RecommendationPriority::Low,
                category: "task_quality".to_string(),
                title: "完善任务描述".to_string(),
                description: format!(
                    "只有 {}% 的任务带有描述",
                    insights.task_patterns.description_rate
                ),
                actions: vec!["为重要任务补充完成标准和背景信息".to_string()],
            });
        }
    }

    if let Some(slot) = work_periods.best_time_slot {
        recommendations.optimization.push(Recommendation {
            priority: RecommendationPriority::Medium,
            category: "time_management".to_string(),
            title: "利用高效时段".to_string(),
            description: format!("你在{}的生产力最高", slot.label()),
            actions: work_periods.recommendations.clone(),
        });
    }

    recommendations
}
