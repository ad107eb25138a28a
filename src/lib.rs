pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use error::{AppError, AppResult};
pub use models::report::{AnalysisReport, ExportFormat, ReportOptions};
pub use models::settings::AnalyticsSettings;
pub use models::task::TaskRecord;
pub use services::analytics_engine::{local_now, AnalyticsEngine};
pub use utils::logger::init_logging;
