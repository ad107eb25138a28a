use behavior_analytics_lib::models::analytics::{
    PeriodKind, ProcrastinationLevel, TimeSlot, TrendDirection,
};
use behavior_analytics_lib::models::report::{ActivityKind, ComparisonTrend, ReportOptions};
use behavior_analytics_lib::models::task::TaskRecord;
use behavior_analytics_lib::services::analytics_engine::AnalyticsEngine;
use chrono::{DateTime, Duration, FixedOffset, TimeZone, Weekday};
use serde_json::json;

fn tz() -> FixedOffset {
    FixedOffset::east_opt(8 * 3600).expect("offset")
}

fn at(month: u32, day: u32, hour: u32, minute: u32) -> DateTime<FixedOffset> {
    tz().with_ymd_and_hms(2025, month, day, hour, minute, 0)
        .single()
        .expect("valid instant")
}

fn pending(id: &str, created: DateTime<FixedOffset>) -> TaskRecord {
    TaskRecord::new(id, format!("Task {id}"), created)
}

fn done(id: &str, created: DateTime<FixedOffset>, completed: DateTime<FixedOffset>) -> TaskRecord {
    let mut task = pending(id, created);
    task.completed = true;
    task.update_time = Some(completed);
    task
}

#[test]
fn report_for_stale_backlog_flags_procrastination() {
    let now = at(5, 14, 15, 0);
    let mut records: Vec<TaskRecord> = (0..7)
        .map(|index| {
            let created = now - Duration::hours(30 + index);
            done(&format!("done-{index}"), created, now - Duration::hours(1))
        })
        .collect();
    records.extend((0..3).map(|index| pending(&format!("late-{index}"), now - Duration::days(10))));

    let engine = AnalyticsEngine::default();
    let report = engine
        .generate_report(&records, &ReportOptions::default(), now)
        .expect("report");

    assert_eq!(report.overview.total, 10);
    assert_eq!(report.overview.completion_rate, 70);
    assert_eq!(report.overview.pending_rate, 30);

    let procrastination = &report.procrastination_analysis;
    assert_eq!(procrastination.delayed_tasks, 3);
    assert_eq!(procrastination.long_term_delayed, 3);
    assert!(procrastination.procrastination_level >= ProcrastinationLevel::Moderate);

    for period in PeriodKind::ALL {
        let buckets = report
            .time_period_analysis
            .get(period)
            .expect("requested period present");
        assert_eq!(buckets.len(), 7);
    }

    let recommendations = report.recommendations.as_ref().expect("recommendations");
    assert!(!recommendations.is_empty());
    assert_eq!(report.metadata.record_count, 10);
    assert_eq!(report.metadata.version, "1.0");
}

#[test]
fn fresh_single_task_is_low_procrastination() {
    let now = at(5, 14, 15, 0);
    let engine = AnalyticsEngine::default();
    let report = engine
        .generate_report(&[pending("fresh", now)], &ReportOptions::default(), now)
        .expect("report");

    assert_eq!(report.procrastination_analysis.delayed_tasks, 0);
    assert_eq!(
        report.procrastination_analysis.procrastination_level,
        ProcrastinationLevel::Low
    );
}

#[test]
fn empty_input_yields_neutral_report() {
    let now = at(5, 14, 15, 0);
    let engine = AnalyticsEngine::default();
    let report = engine
        .generate_report(&[], &ReportOptions::default(), now)
        .expect("report");

    assert_eq!(report.overview.total, 0);
    assert_eq!(report.overview.completion_rate, 0);
    assert_eq!(report.productivity_trend.trend, TrendDirection::Stable);
    assert_eq!(report.productivity_trend.daily_average, 0.0);
    assert_eq!(report.procrastination_analysis.procrastination_score, 0);
    assert_eq!(report.optimal_work_periods.best_time_slot, None);

    let insights = report.personalized_insights.as_ref().expect("insights");
    assert_eq!(insights.streaks.current_streak, 0);
    assert!(insights.achievements.is_empty());

    let day_buckets = report
        .time_period_analysis
        .get(PeriodKind::Day)
        .expect("day buckets");
    assert!(day_buckets.iter().all(|bucket| bucket.total == 0));
}

#[test]
fn optional_sections_follow_options() {
    let now = at(5, 14, 15, 0);
    let options = ReportOptions {
        include_periods: vec![PeriodKind::Week],
        period_count: 4,
        include_insights: false,
        include_recommendations: false,
    };
    let engine = AnalyticsEngine::default();
    let report = engine
        .generate_report(&[pending("a", now)], &options, now)
        .expect("report");

    assert!(report.time_period_analysis.get(PeriodKind::Day).is_none());
    assert_eq!(
        report
            .time_period_analysis
            .get(PeriodKind::Week)
            .map(|buckets| buckets.len()),
        Some(4)
    );
    assert!(report.personalized_insights.is_none());
    assert!(report.recommendations.is_none());
}

#[test]
fn records_from_json_flow_into_report() {
    let payload = json!([
        {
            "id": 1,
            "title": "Write weekly review",
            "description": "notes",
            "completed": true,
            "createTime": "2025-05-14T08:00:00+08:00",
            "updateTime": "2025-05-14T09:00:00+08:00"
        },
        {
            "id": "2",
            "title": "Plan sprint",
            "completed": false,
            "createTime": "2025-05-13T14:00:00+08:00",
            "updateTime": "not a date"
        }
    ]);
    let records = TaskRecord::collection_from_json(&payload).expect("records");
    assert_eq!(records[0].id, "1");
    assert_eq!(records[1].update_time, None);

    let now = at(5, 14, 10, 0);
    let report = AnalyticsEngine::default()
        .generate_report(&records, &ReportOptions::default(), now)
        .expect("report");
    assert_eq!(report.overview.completed, 1);
    assert_eq!(report.optimal_work_periods.best_time_slot, Some(TimeSlot::Morning));

    let insights = report.personalized_insights.as_ref().expect("insights");
    assert_eq!(insights.streaks.current_streak, 1);
    assert_eq!(insights.task_patterns.description_rate, 50);
}

#[test]
fn period_analysis_compares_with_previous_window() {
    let records = vec![
        done("mon-1", at(5, 12, 9, 0), at(5, 12, 11, 0)),
        pending("mon-2", at(5, 12, 14, 0)),
        done("wed-1", at(5, 14, 9, 30), at(5, 14, 9, 50)),
        pending("sat-prev", at(5, 10, 16, 0)),
    ];
    let start = at(5, 12, 0, 0);
    let end = at(5, 14, 23, 59);
    let now = at(5, 14, 10, 0);

    let analysis = AnalyticsEngine::default()
        .get_period_analysis(&records, start, end, now)
        .expect("period analysis");

    assert_eq!(analysis.overview.total, 3);
    assert_eq!(analysis.overview.completion_rate, 67);

    let created: Vec<usize> = analysis
        .daily_breakdown
        .iter()
        .map(|day| day.created)
        .collect();
    assert_eq!(created, vec![2, 0, 1]);
    let rates: Vec<u32> = analysis
        .daily_breakdown
        .iter()
        .map(|day| day.completion_rate)
        .collect();
    assert_eq!(rates, vec![50, 0, 100]);
    assert_eq!(analysis.daily_breakdown[0].tasks.len(), 2);

    assert_eq!(analysis.distribution.peak_hour, Some(9));
    assert_eq!(analysis.distribution.hourly[9], 2);
    assert_eq!(analysis.distribution.peak_weekday, Some(Weekday::Mon));

    let comparison = &analysis.comparison;
    assert_eq!(comparison.previous.total, 1);
    assert_eq!(comparison.total_change, 2);
    assert_eq!(comparison.completion_rate_change, 67);
    assert_eq!(comparison.trend, ComparisonTrend::Improving);
    assert!(comparison.previous_range.end < start);
}

#[test]
fn real_time_stats_report_today_and_recent_activity() {
    let records = vec![
        done("mon-1", at(5, 12, 9, 0), at(5, 12, 11, 0)),
        done("wed-1", at(5, 14, 9, 30), at(5, 14, 9, 50)),
        pending("old", at(5, 1, 9, 0)),
    ];
    let now = at(5, 14, 10, 0);

    let stats = AnalyticsEngine::default().get_real_time_stats(&records, now);

    assert_eq!(stats.generated_at, now);
    assert_eq!(stats.overall.total, 3);
    assert_eq!(stats.today.total, 1);
    assert_eq!(stats.today.completed, 1);
    assert_eq!(stats.this_week.total, 2);

    assert_eq!(stats.recent_activity.len(), 2);
    assert_eq!(stats.recent_activity[0].kind, ActivityKind::Completed);
    assert_eq!(stats.recent_activity[0].relative_time, "10 分钟前");
    assert_eq!(stats.recent_activity[1].kind, ActivityKind::Created);

    assert!(stats.quick_insights[0].contains('1'));
    assert!(stats
        .quick_insights
        .iter()
        .any(|line| line.contains("拖延")));
}
