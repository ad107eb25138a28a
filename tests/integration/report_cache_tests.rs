use std::sync::Arc;

use behavior_analytics_lib::models::analytics::PeriodKind;
use behavior_analytics_lib::models::report::ReportOptions;
use behavior_analytics_lib::models::settings::AnalyticsSettings;
use behavior_analytics_lib::models::task::TaskRecord;
use behavior_analytics_lib::services::analytics_engine::{local_now, AnalyticsEngine};
use chrono::{DateTime, Duration, FixedOffset, TimeZone};

fn now() -> DateTime<FixedOffset> {
    FixedOffset::east_opt(0)
        .expect("offset")
        .with_ymd_and_hms(2025, 5, 1, 9, 0, 0)
        .single()
        .expect("now")
}

fn sample_records() -> Vec<TaskRecord> {
    let now = now();
    let mut finished = TaskRecord::new("done", "Retrospective", now - Duration::days(2));
    finished.completed = true;
    finished.update_time = Some(now - Duration::days(1));

    let stale = TaskRecord::new("stale", "Tax paperwork", now - Duration::hours(9 * 24 + 12));
    let fresh = TaskRecord::new("fresh", "Reply to mail", now - Duration::hours(2));
    vec![finished, stale, fresh]
}

#[test]
fn identical_requests_share_the_cached_report() {
    let engine = AnalyticsEngine::default();
    let records = sample_records();
    let options = ReportOptions::default();

    let first = engine.generate_report(&records, &options, now()).expect("first");
    let second = engine
        .generate_report(&records, &options, now() + Duration::minutes(4))
        .expect("second");

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(engine.cache_len(), 1);
}

#[test]
fn equivalent_options_share_a_fingerprint() {
    let engine = AnalyticsEngine::default();
    let records = sample_records();
    let forward = ReportOptions {
        include_periods: vec![PeriodKind::Day, PeriodKind::Week],
        ..ReportOptions::default()
    };
    let shuffled = ReportOptions {
        include_periods: vec![PeriodKind::Week, PeriodKind::Day, PeriodKind::Week],
        ..ReportOptions::default()
    };

    let first = engine.generate_report(&records, &forward, now()).expect("first");
    let second = engine.generate_report(&records, &shuffled, now()).expect("second");
    assert!(Arc::ptr_eq(&first, &second));

    let other = engine
        .generate_report(&records, &ReportOptions::default(), now())
        .expect("other");
    assert!(!Arc::ptr_eq(&first, &other));
    assert_eq!(engine.cache_len(), 2);
}

#[test]
fn expired_entries_are_recomputed_to_an_equal_report() {
    let engine = AnalyticsEngine::default();
    let records = sample_records();
    let options = ReportOptions::default();

    let first = engine.generate_report(&records, &options, now()).expect("first");
    let later = now() + Duration::minutes(6);
    let second = engine.generate_report(&records, &options, later).expect("second");

    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(*first, *second);
    assert_eq!(second.metadata.generated_at, later);
}

#[test]
fn same_length_collections_with_different_content_do_not_collide() {
    let engine = AnalyticsEngine::default();
    let records = sample_records();
    let mut changed = records.clone();
    changed[2].completed = true;
    changed[2].update_time = Some(now() - Duration::hours(1));

    let first = engine
        .generate_report(&records, &ReportOptions::default(), now())
        .expect("first");
    let second = engine
        .generate_report(&changed, &ReportOptions::default(), now())
        .expect("second");

    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(first.metadata.record_count, second.metadata.record_count);
    assert_ne!(first.metadata.fingerprint, second.metadata.fingerprint);
    assert_eq!(first.overview.completed, 1);
    assert_eq!(second.overview.completed, 2);
}

#[test]
fn clear_cache_forces_recomputation() {
    let engine = AnalyticsEngine::default();
    let records = sample_records();
    let options = ReportOptions::default();

    let first = engine.generate_report(&records, &options, now()).expect("first");
    engine
        .get_period_analysis(&records, now() - Duration::days(7), now(), now())
        .expect("period analysis");
    assert_eq!(engine.cache_len(), 2);

    engine.clear_cache();
    assert_eq!(engine.cache_len(), 0);

    let second = engine.generate_report(&records, &options, now()).expect("second");
    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(*first, *second);
}

#[test]
fn zero_ttl_never_serves_cached_results() {
    let engine = AnalyticsEngine::with_ttl(Duration::zero());
    let records = sample_records();
    let options = ReportOptions::default();

    let first = engine.generate_report(&records, &options, now()).expect("first");
    let second = engine.generate_report(&records, &options, now()).expect("second");
    assert!(!Arc::ptr_eq(&first, &second));
}

#[test]
fn period_analysis_is_cached_per_window() {
    let engine = AnalyticsEngine::new(AnalyticsSettings {
        cache_ttl_seconds: 60,
        ..AnalyticsSettings::default()
    });
    let records = sample_records();
    let start = now() - Duration::days(3);

    let first = engine
        .get_period_analysis(&records, start, now(), now())
        .expect("first");
    let again = engine
        .get_period_analysis(&records, start, now(), now() + Duration::seconds(30))
        .expect("again");
    let wider = engine
        .get_period_analysis(&records, start - Duration::days(1), now(), now())
        .expect("wider");

    assert!(Arc::ptr_eq(&first, &again));
    assert!(!Arc::ptr_eq(&first, &wider));

    let expired = engine
        .get_period_analysis(&records, start, now(), now() + Duration::seconds(61))
        .expect("expired");
    assert!(!Arc::ptr_eq(&first, &expired));
    assert_eq!(*first, *expired);
}

#[test]
fn oversized_ttl_keeps_reports_cached_instead_of_failing() {
    let records = sample_records();
    let options = ReportOptions::default();

    for cache_ttl_seconds in [i64::MAX, 9_000_000_000_000] {
        let engine = AnalyticsEngine::new(AnalyticsSettings {
            cache_ttl_seconds,
            ..AnalyticsSettings::default()
        });
        assert_eq!(engine.settings().cache_ttl_seconds, cache_ttl_seconds);

        let first = engine.generate_report(&records, &options, now()).expect("first");
        let later = now() + Duration::days(365 * 100);
        let second = engine.generate_report(&records, &options, later).expect("second");
        assert!(Arc::ptr_eq(&first, &second));
    }
}

#[test]
fn wall_clock_entry_point_uses_the_current_local_time() {
    let engine = AnalyticsEngine::default();
    let before = local_now();
    let report = engine
        .generate_report_now(&sample_records(), &ReportOptions::default())
        .expect("report");
    let after = local_now();

    assert!(report.metadata.generated_at >= before);
    assert!(report.metadata.generated_at <= after);
    assert_eq!(report.overview.total, 3);
}
