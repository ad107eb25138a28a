use std::fs;

use behavior_analytics_lib::models::analytics::PeriodKind;
use behavior_analytics_lib::models::report::{ExportFormat, ReportOptions};
use behavior_analytics_lib::models::task::TaskRecord;
use behavior_analytics_lib::services::analytics_engine::AnalyticsEngine;
use behavior_analytics_lib::services::report_export;
use chrono::{DateTime, Duration, FixedOffset, TimeZone};
use serde_json::Value as JsonValue;
use tempfile::tempdir;

fn now() -> DateTime<FixedOffset> {
    FixedOffset::east_opt(8 * 3600)
        .expect("offset")
        .with_ymd_and_hms(2025, 5, 14, 15, 0, 0)
        .single()
        .expect("now")
}

fn sample_records() -> Vec<TaskRecord> {
    let now = now();
    let mut records: Vec<TaskRecord> = (0..4)
        .map(|index| {
            let created = now - Duration::days(index) - Duration::hours(5);
            let mut task = TaskRecord::new(format!("done-{index}"), "Deep work block", created);
            task.completed = true;
            task.update_time = Some(created + Duration::hours(2));
            task
        })
        .collect();
    records.push(TaskRecord::new("late", "Expense report", now - Duration::days(12)));
    records
}

#[test]
fn structured_export_round_trips() {
    let engine = AnalyticsEngine::default();
    let report = engine
        .generate_report(&sample_records(), &ReportOptions::default(), now())
        .expect("report");

    let payload = engine
        .export_analysis_data(&report, "structured")
        .expect("structured export");
    let parsed = report_export::parse_structured(&payload).expect("parse back");

    assert_eq!(parsed, *report);
    assert_eq!(parsed.metadata.generated_at, report.metadata.generated_at);

    let value: JsonValue = serde_json::from_str(&payload).expect("json");
    assert!(value["recommendations"]["immediate"].is_array());
    assert!(value["procrastinationAnalysis"]["procrastinationScore"].is_u64());
    assert!(value["timePeriodAnalysis"]["day"].is_array());
}

#[test]
fn tabular_export_lists_day_buckets() {
    let engine = AnalyticsEngine::default();
    let report = engine
        .generate_report(&sample_records(), &ReportOptions::default(), now())
        .expect("report");

    let table = engine
        .export_analysis_data(&report, "tabular")
        .expect("tabular export");
    let lines: Vec<&str> = table.lines().collect();

    assert_eq!(lines[0], "date,created,completed,completion_rate");
    assert_eq!(lines.len(), 1 + 7);
    assert!(lines[7].starts_with("2025-05-14,"));
    assert_eq!(lines[7], "2025-05-14,1,1,100");
}

#[test]
fn tabular_export_without_day_buckets_is_header_only() {
    let engine = AnalyticsEngine::default();
    let options = ReportOptions {
        include_periods: vec![PeriodKind::Month],
        ..ReportOptions::default()
    };
    let report = engine
        .generate_report(&sample_records(), &options, now())
        .expect("report");

    let table = engine
        .export_analysis_data(&report, "tabular")
        .expect("tabular export");
    assert_eq!(table.lines().count(), 1);
}

#[test]
fn summary_export_contains_every_section() {
    let engine = AnalyticsEngine::default();
    let report = engine
        .generate_report(&sample_records(), &ReportOptions::default(), now())
        .expect("report");

    let summary = engine
        .export_analysis_data(&report, "summary")
        .expect("summary export");

    for section in ["【概览】", "【效率趋势】", "【拖延分析】", "【重点建议】"] {
        assert!(summary.contains(section), "missing {section}");
    }
    assert!(summary.contains("完成率：80%"));
    assert!(summary.contains("清理长期积压"));
}

#[test]
fn exports_can_be_written_to_disk() {
    let engine = AnalyticsEngine::default();
    let report = engine
        .generate_report(&sample_records(), &ReportOptions::default(), now())
        .expect("report");
    let dir = tempdir().expect("temp dir");

    for format in [ExportFormat::Structured, ExportFormat::Tabular, ExportFormat::Summary] {
        let content = report_export::export_report(&report, format).expect("export");
        let path = dir
            .path()
            .join(format!("analytics.{}", format.file_extension()));
        fs::write(&path, &content).expect("write export");

        let stored = fs::read_to_string(&path).expect("read export");
        assert_eq!(stored, content);
    }
}
