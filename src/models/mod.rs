pub mod analytics;
pub mod report;
pub mod settings;
pub mod task;
