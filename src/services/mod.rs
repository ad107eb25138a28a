pub mod analytics_engine;
pub mod insights_service;
pub mod metrics_calculator;
pub mod report_cache;
pub mod report_export;
