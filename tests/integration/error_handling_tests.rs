use behavior_analytics_lib::error::AppError;
use behavior_analytics_lib::models::analytics::CompletionStats;
use behavior_analytics_lib::models::report::{ReportBuilder, ReportMetadata, ReportOptions};
use behavior_analytics_lib::models::task::TaskRecord;
use behavior_analytics_lib::services::analytics_engine::AnalyticsEngine;
use chrono::{DateTime, Duration, FixedOffset, TimeZone};
use serde_json::json;

fn now() -> DateTime<FixedOffset> {
    FixedOffset::east_opt(0)
        .expect("offset")
        .with_ymd_and_hms(2025, 5, 1, 9, 0, 0)
        .single()
        .expect("now")
}

#[test]
fn unsupported_export_format_names_the_format() {
    let engine = AnalyticsEngine::default();
    let report = engine
        .generate_report(&[], &ReportOptions::default(), now())
        .expect("report");

    match engine.export_analysis_data(&report, "xml") {
        Err(AppError::UnsupportedFormat { format }) => assert_eq!(format, "xml"),
        other => panic!("expected unsupported format error, got {other:?}"),
    }
}

#[test]
fn non_array_collection_is_rejected() {
    let result = TaskRecord::collection_from_json(&json!({ "id": "1" }));
    let error = result.expect_err("object is not a collection");
    assert!(matches!(error, AppError::Validation { .. }));
    assert_eq!(
        error.details().and_then(|details| details["received"].as_str()),
        Some("object")
    );
}

#[test]
fn records_missing_required_fields_are_rejected_with_index() {
    let missing_id = json!([{ "createTime": "2025-05-01T09:00:00Z" }]);
    let error = TaskRecord::collection_from_json(&missing_id).expect_err("missing id");
    assert_eq!(
        error.details().and_then(|details| details["index"].as_u64()),
        Some(0)
    );

    let bad_time = json!([
        { "id": "ok", "createTime": "2025-05-01T09:00:00Z" },
        { "id": "broken", "createTime": "yesterday" }
    ]);
    let error = TaskRecord::collection_from_json(&bad_time).expect_err("bad createTime");
    assert_eq!(
        error.details().and_then(|details| details["index"].as_u64()),
        Some(1)
    );
}

#[test]
fn inverted_period_window_is_rejected() {
    let engine = AnalyticsEngine::default();
    let result = engine.get_period_analysis(&[], now(), now() - Duration::days(1), now());
    assert!(matches!(result, Err(AppError::Validation { .. })));
    assert_eq!(engine.cache_len(), 0);
}

#[test]
fn builder_reports_the_missing_section() {
    let metadata = ReportMetadata {
        generated_at: now(),
        record_count: 0,
        fingerprint: "empty".to_string(),
        options: ReportOptions::default(),
        version: "1.0".to_string(),
    };

    let error = ReportBuilder::new(metadata)
        .overview(CompletionStats::default())
        .build()
        .expect_err("incomplete report");

    assert_eq!(
        error.details().and_then(|details| details["section"].as_str()),
        Some("productivityTrend")
    );
}

#[test]
fn inconsistent_timestamps_are_counted_not_fatal() {
    let mut record = TaskRecord::new("odd", "Clock skew", now());
    record.completed = true;
    record.update_time = Some(now() - Duration::hours(3));

    let report = AnalyticsEngine::default()
        .generate_report(&[record], &ReportOptions::default(), now())
        .expect("report");

    assert_eq!(report.procrastination_analysis.inconsistent_records, 1);
    assert_eq!(report.procrastination_analysis.average_completion_days, 0.0);
}
