use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, FixedOffset, Local, Timelike, Weekday};
use serde_json::json;
use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use crate::models::analytics::{CompletionStats, PeriodKind, TimeRange};
use crate::models::report::{
    ActivityEvent, ActivityKind, AnalysisReport, ComparisonTrend, CreationDistribution,
    DailyBreakdown, PeriodAnalysis, PeriodComparison, RealTimeStats, ReportBuilder,
    ReportMetadata, ReportOptions, TaskBrief, REPORT_VERSION,
};
use crate::models::settings::AnalyticsSettings;
use crate::models::task::TaskRecord;
use crate::services::insights_service;
use crate::services::metrics_calculator::{self, percent};
use crate::services::report_cache::{fingerprint, CacheKey, CacheOperation, TtlCache};
use crate::services::report_export;
use crate::utils::time_bucket;

const RECENT_WINDOW_HOURS: i64 = 24;
const RECENT_PER_KIND: usize = 5;
const RECENT_TOTAL: usize = 10;
const COMPARISON_RATE_THRESHOLD: i64 = 5;
const COMPARISON_VOLUME_THRESHOLD: i64 = 1;
const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Current local time as a fixed-offset instant, for callers without a clock
/// of their own.
pub fn local_now() -> DateTime<FixedOffset> {
    let now = Local::now();
    now.with_timezone(now.offset())
}

/// Orchestrates the metrics calculator and owns the result caches.
pub struct AnalyticsEngine {
    settings: AnalyticsSettings,
    report_cache: TtlCache<Arc<AnalysisReport>>,
    period_cache: TtlCache<Arc<PeriodAnalysis>>,
}

impl Default for AnalyticsEngine {
    fn default() -> Self {
        Self::new(AnalyticsSettings::default())
    }
}

impl AnalyticsEngine {
    pub fn new(settings: AnalyticsSettings) -> Self {
        let ttl = settings.cache_ttl();
        Self {
            settings,
            report_cache: TtlCache::new(ttl),
            period_cache: TtlCache::new(ttl),
        }
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self::new(AnalyticsSettings {
            cache_ttl_seconds: ttl.num_seconds(),
            ..AnalyticsSettings::default()
        })
    }

    pub fn settings(&self) -> &AnalyticsSettings {
        &self.settings
    }

    /// Full report for `records`. Identical input and options within the
    /// cache lifetime return the same shared report.
    pub fn generate_report(
        &self,
        records: &[TaskRecord],
        options: &ReportOptions,
        now: DateTime<FixedOffset>,
    ) -> AppResult<Arc<AnalysisReport>> {
        let options = options.normalized();
        let context = serde_json::to_string(&options)?;
        let fingerprint = fingerprint(records, &context);
        let key = CacheKey::new(CacheOperation::Report, fingerprint.clone());

        if let Some(cached) = self.report_cache.get(&key, now) {
            debug!(target: "app::analytics", records = records.len(), "report cache hit");
            return Ok(cached);
        }

        let report = Arc::new(self.compute_report(records, options, fingerprint, now)?);
        self.report_cache.insert(&key, Arc::clone(&report), now);
        Ok(report)
    }

    pub fn generate_report_now(
        &self,
        records: &[TaskRecord],
        options: &ReportOptions,
    ) -> AppResult<Arc<AnalysisReport>> {
        self.generate_report(records, options, local_now())
    }

    /// Ad hoc analysis of records created within `[start, end]`, compared
    /// against the preceding window of equal length.
    pub fn get_period_analysis(
        &self,
        records: &[TaskRecord],
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
        now: DateTime<FixedOffset>,
    ) -> AppResult<Arc<PeriodAnalysis>> {
        if start > end {
            return Err(AppError::validation_with_details(
                "时间范围不合法",
                json!({ "start": start.to_rfc3339(), "end": end.to_rfc3339() }),
            ));
        }

        let context = format!("{}|{}", start.to_rfc3339(), end.to_rfc3339());
        let key = CacheKey::new(CacheOperation::PeriodAnalysis, fingerprint(records, &context));
        if let Some(cached) = self.period_cache.get(&key, now) {
            debug!(target: "app::analytics", "period analysis cache hit");
            return Ok(cached);
        }

        let analysis = Arc::new(compute_period_analysis(records, TimeRange::new(start, end)));
        self.period_cache.insert(&key, Arc::clone(&analysis), now);
        Ok(analysis)
    }

    /// Always-fresh snapshot; never cached.
    pub fn get_real_time_stats(
        &self,
        records: &[TaskRecord],
        now: DateTime<FixedOffset>,
    ) -> RealTimeStats {
        let today = TimeRange::new(time_bucket::start_of_day(now), time_bucket::end_of_day(now));
        let this_week =
            TimeRange::new(time_bucket::start_of_week(now), time_bucket::end_of_week(now));

        let recent_activity = recent_activity(records, now);

        let mut quick_insights = Vec::new();
        let completed_today = records
            .iter()
            .filter_map(|record| record.completion_time())
            .filter(|done| today.contains(*done))
            .count();
        if completed_today > 0 {
            quick_insights.push(format!("今天已完成 {completed_today} 个任务，继续保持！"));
        } else {
            quick_insights.push("今天还没有完成任务，从一个小任务开始吧".to_string());
        }

        let procrastination = metrics_calculator::procrastination_metrics_with(
            records,
            now,
            &self.settings.procrastination,
        );
        if procrastination.long_term_delayed > 0 {
            quick_insights.push(format!(
                "有 {} 个任务已拖延超过 {} 天，建议优先处理",
                procrastination.long_term_delayed, self.settings.procrastination.long_term_days
            ));
        }

        let current_slot = time_bucket::time_slot(now);
        if metrics_calculator::optimal_work_periods(records).best_time_slot == Some(current_slot) {
            quick_insights.push(format!(
                "现在正是你效率最高的{}时段，适合处理重要任务",
                current_slot.label()
            ));
        }

        RealTimeStats {
            generated_at: now,
            overall: metrics_calculator::completion_rate(records, None),
            today: metrics_calculator::completion_rate(records, Some(&today)),
            this_week: metrics_calculator::completion_rate(records, Some(&this_week)),
            recent_activity,
            quick_insights,
        }
    }

    pub fn export_analysis_data(&self, report: &AnalysisReport, format: &str) -> AppResult<String> {
        report_export::export_analysis_data(report, format)
    }

    pub fn clear_cache(&self) {
        self.report_cache.clear();
        self.period_cache.clear();
        debug!(target: "app::analytics::cache", "analytics caches cleared");
    }

    /// Cached entries across both caches, stale ones included.
    pub fn cache_len(&self) -> usize {
        self.report_cache.len() + self.period_cache.len()
    }

    fn compute_report(
        &self,
        records: &[TaskRecord],
        options: ReportOptions,
        fingerprint: String,
        now: DateTime<FixedOffset>,
    ) -> AppResult<AnalysisReport> {
        let overview = metrics_calculator::completion_rate(records, None);
        let trend = metrics_calculator::productivity_trend(records, self.settings.trend_days, now);
        let procrastination = metrics_calculator::procrastination_metrics_with(
            records,
            now,
            &self.settings.procrastination,
        );
        let work_periods = metrics_calculator::optimal_work_periods(records);
        let insights = options
            .include_insights
            .then(|| insights_service::personalized_insights(records, now));

        let mut builder = ReportBuilder::new(ReportMetadata {
            generated_at: now,
            record_count: records.len(),
            fingerprint,
            options: options.clone(),
            version: REPORT_VERSION.to_string(),
        });

        for period in &options.include_periods {
            let stats =
                metrics_calculator::time_period_stats(records, *period, options.period_count, now);
            debug!(
                target: "app::analytics",
                period = period.as_str(),
                buckets = stats.len(),
                "period buckets computed"
            );
            builder = builder.period(*period, stats);
        }

        if options.include_recommendations {
            builder = builder.recommendations(insights_service::build_recommendations(
                &overview,
                &trend,
                &procrastination,
                &work_periods,
                insights.as_ref(),
            ));
        }
        if let Some(insights) = insights {
            builder = builder.personalized_insights(insights);
        }

        let report = builder
            .overview(overview)
            .productivity_trend(trend)
            .procrastination(procrastination)
            .optimal_work_periods(work_periods)
            .build()?;

        info!(
            target: "app::analytics",
            records = records.len(),
            periods = options.include_periods.len(),
            score = report.procrastination_analysis.procrastination_score,
            level = report.procrastination_analysis.procrastination_level.as_str(),
            best_slot = report
                .optimal_work_periods
                .best_time_slot
                .map_or("none", |slot| slot.as_str()),
            "analysis report generated"
        );
        Ok(report)
    }
}

fn compute_period_analysis(records: &[TaskRecord], range: TimeRange) -> PeriodAnalysis {
    let in_window: Vec<&TaskRecord> = records
        .iter()
        .filter(|record| range.contains(record.create_time))
        .collect();
    let overview = stats_for(&in_window);

    let offset = *range.start.offset();
    let daily_breakdown = time_bucket::date_range(
        time_bucket::start_of_day(range.start),
        range.end,
        PeriodKind::Day,
    )
    .map(|day| {
        let day_range = TimeRange::new(day, time_bucket::end_of_day(day));
        let created: Vec<&TaskRecord> = in_window
            .iter()
            .copied()
            .filter(|record| day_range.contains(record.create_time))
            .collect();
        let completed = created.iter().filter(|record| record.completed).count();
        DailyBreakdown {
            date: day.with_timezone(&offset).date_naive(),
            created: created.len(),
            completed,
            completion_rate: percent(completed, created.len()),
            tasks: created
                .iter()
                .map(|record| TaskBrief {
                    id: record.id.clone(),
                    title: record.title.clone(),
                    completed: record.completed,
                })
                .collect(),
        }
    })
    .collect();

    let distribution = creation_distribution(&in_window);

    let length = range.end - range.start;
    let previous_end = range.start - Duration::nanoseconds(1);
    let previous_range = TimeRange::new(previous_end - length, previous_end);
    let previous = metrics_calculator::completion_rate(records, Some(&previous_range));

    PeriodAnalysis {
        range,
        overview,
        daily_breakdown,
        distribution,
        comparison: compare_periods(&overview, &previous, previous_range),
    }
}

fn stats_for(records: &[&TaskRecord]) -> CompletionStats {
    let completed = records.iter().filter(|record| record.completed).count();
    metrics_calculator::stats_from_counts(records.len(), completed)
}

fn creation_distribution(records: &[&TaskRecord]) -> CreationDistribution {
    let mut hourly = vec![0usize; 24];
    let mut weekday = vec![0usize; 7];
    for record in records {
        hourly[record.create_time.hour() as usize] += 1;
        weekday[record.create_time.weekday().num_days_from_monday() as usize] += 1;
    }

    let peak_hour = peak_index(&hourly).and_then(|index| u32::try_from(index).ok());
    let peak_weekday = peak_index(&weekday).and_then(|index| WEEKDAYS.get(index).copied());

    CreationDistribution {
        hourly,
        weekday,
        peak_hour,
        peak_weekday,
    }
}

/// Index of the largest non-zero count; earlier indices win ties.
fn peak_index(counts: &[usize]) -> Option<usize> {
    let mut best: Option<(usize, usize)> = None;
    for (index, count) in counts.iter().copied().enumerate() {
        if count == 0 {
            continue;
        }
        match best {
            Some((_, top)) if count <= top => {}
            _ => best = Some((index, count)),
        }
    }
    best.map(|(index, _)| index)
}

fn compare_periods(
    current: &CompletionStats,
    previous: &CompletionStats,
    previous_range: TimeRange,
) -> PeriodComparison {
    let total_change = current.total as i64 - previous.total as i64;
    let completed_change = current.completed as i64 - previous.completed as i64;
    let completion_rate_change =
        i64::from(current.completion_rate) - i64::from(previous.completion_rate);

    let better = completion_rate_change > COMPARISON_RATE_THRESHOLD
        || total_change > COMPARISON_VOLUME_THRESHOLD;
    let worse = completion_rate_change < -COMPARISON_RATE_THRESHOLD
        || total_change < -COMPARISON_VOLUME_THRESHOLD;

    let trend = match (better, worse) {
        (false, false) => ComparisonTrend::Stable,
        (true, false) => ComparisonTrend::Improving,
        (false, true) => ComparisonTrend::Declining,
        (true, true) => ComparisonTrend::Mixed,
    };

    PeriodComparison {
        previous_range,
        previous: *previous,
        total_change,
        completed_change,
        completion_rate_change,
        trend,
    }
}

fn recent_activity(records: &[TaskRecord], now: DateTime<FixedOffset>) -> Vec<ActivityEvent> {
    let window = TimeRange::new(now - Duration::hours(RECENT_WINDOW_HOURS), now);
    let event = |kind, record: &TaskRecord, timestamp: DateTime<FixedOffset>| ActivityEvent {
        kind,
        task_id: record.id.clone(),
        title: record.title.clone(),
        timestamp,
        relative_time: time_bucket::format_relative(timestamp, now),
    };

    let mut created: Vec<ActivityEvent> = records
        .iter()
        .filter(|record| window.contains(record.create_time))
        .map(|record| event(ActivityKind::Created, record, record.create_time))
        .collect();
    let mut completed: Vec<ActivityEvent> = records
        .iter()
        .filter_map(|record| {
            record
                .completion_time()
                .filter(|done| window.contains(*done))
                .map(|done| event(ActivityKind::Completed, record, done))
        })
        .collect();

    for events in [&mut created, &mut completed] {
        events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        events.truncate(RECENT_PER_KIND);
    }

    let mut merged: Vec<ActivityEvent> = created.into_iter().chain(completed).collect();
    merged.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    merged.truncate(RECENT_TOTAL);
    merged
}
