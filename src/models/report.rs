use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::models::analytics::{
    CompletionStats, OptimalWorkPeriods, PeriodKind, PeriodStatistic, PersonalizedInsights,
    ProcrastinationMetrics, ProductivityTrend, TimeRange,
};

pub const REPORT_VERSION: &str = "1.0";
const DEFAULT_PERIOD_COUNT: u32 = 7;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportOptions {
    pub include_periods: Vec<PeriodKind>,
    pub period_count: u32,
    pub include_insights: bool,
    pub include_recommendations: bool,
}

impl ReportOptions {
    /// Sorted and de-duplicated copy, so equivalent option sets share a
    /// cache fingerprint.
    pub fn normalized(&self) -> Self {
        let mut include_periods = self.include_periods.clone();
        include_periods.sort();
        include_periods.dedup();
        Self {
            include_periods,
            ..self.clone()
        }
    }
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            include_periods: PeriodKind::ALL.to_vec(),
            period_count: DEFAULT_PERIOD_COUNT,
            include_insights: true,
            include_recommendations: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetadata {
    pub generated_at: DateTime<FixedOffset>,
    pub record_count: usize,
    pub fingerprint: String,
    pub options: ReportOptions,
    pub version: String,
}

// Generation time is bookkeeping; two reports over the same input compare equal.
impl PartialEq for ReportMetadata {
    fn eq(&self, other: &Self) -> bool {
        self.record_count == other.record_count
            && self.fingerprint == other.fingerprint
            && self.options == other.options
            && self.version == other.version
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimePeriodAnalysis {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<Vec<PeriodStatistic>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub week: Option<Vec<PeriodStatistic>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<Vec<PeriodStatistic>>,
}

impl TimePeriodAnalysis {
    pub fn get(&self, period: PeriodKind) -> Option<&[PeriodStatistic]> {
        match period {
            PeriodKind::Day => self.day.as_deref(),
            PeriodKind::Week => self.week.as_deref(),
            PeriodKind::Month => self.month.as_deref(),
        }
    }

    pub fn insert(&mut self, period: PeriodKind, stats: Vec<PeriodStatistic>) {
        match period {
            PeriodKind::Day => self.day = Some(stats),
            PeriodKind::Week => self.week = Some(stats),
            PeriodKind::Month => self.month = Some(stats),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationPriority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub priority: RecommendationPriority,
    pub category: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub actions: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Recommendations {
    #[serde(default)]
    pub immediate: Vec<Recommendation>,
    #[serde(default)]
    pub strategic: Vec<Recommendation>,
    #[serde(default)]
    pub optimization: Vec<Recommendation>,
}

impl Recommendations {
    pub fn is_empty(&self) -> bool {
        self.immediate.is_empty() && self.strategic.is_empty() && self.optimization.is_empty()
    }

    /// Highest-priority items first; immediate wins ties over strategic,
    /// strategic over optimization.
    pub fn top(&self, limit: usize) -> Vec<&Recommendation> {
        let mut all: Vec<&Recommendation> = self
            .immediate
            .iter()
            .chain(self.strategic.iter())
            .chain(self.optimization.iter())
            .collect();
        all.sort_by_key(|item| item.priority);
        all.truncate(limit);
        all
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub metadata: ReportMetadata,
    pub overview: CompletionStats,
    pub time_period_analysis: TimePeriodAnalysis,
    pub productivity_trend: ProductivityTrend,
    pub procrastination_analysis: ProcrastinationMetrics,
    pub optimal_work_periods: OptimalWorkPeriods,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personalized_insights: Option<PersonalizedInsights>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<Recommendations>,
}

/// Assembles an [`AnalysisReport`] one section at a time.
#[derive(Debug, Clone)]
pub struct ReportBuilder {
    metadata: ReportMetadata,
    overview: Option<CompletionStats>,
    time_period_analysis: TimePeriodAnalysis,
    productivity_trend: Option<ProductivityTrend>,
    procrastination_analysis: Option<ProcrastinationMetrics>,
    optimal_work_periods: Option<OptimalWorkPeriods>,
    personalized_insights: Option<PersonalizedInsights>,
    recommendations: Option<Recommendations>,
}

impl ReportBuilder {
    pub fn new(metadata: ReportMetadata) -> Self {
        Self {
            metadata,
            overview: None,
            time_period_analysis: TimePeriodAnalysis::default(),
            productivity_trend: None,
            procrastination_analysis: None,
            optimal_work_periods: None,
            personalized_insights: None,
            recommendations: None,
        }
    }

    pub fn overview(mut self, overview: CompletionStats) -> Self {
        self.overview = Some(overview);
        self
    }

    pub fn period(mut self, period: PeriodKind, stats: Vec<PeriodStatistic>) -> Self {
        self.time_period_analysis.insert(period, stats);
        self
    }

    pub fn productivity_trend(mut self, trend: ProductivityTrend) -> Self {
        self.productivity_trend = Some(trend);
        self
    }

    pub fn procrastination(mut self, metrics: ProcrastinationMetrics) -> Self {
        self.procrastination_analysis = Some(metrics);
        self
    }

    pub fn optimal_work_periods(mut self, periods: OptimalWorkPeriods) -> Self {
        self.optimal_work_periods = Some(periods);
        self
    }

    pub fn personalized_insights(mut self, insights: PersonalizedInsights) -> Self {
        self.personalized_insights = Some(insights);
        self
    }

    pub fn recommendations(mut self, recommendations: Recommendations) -> Self {
        self.recommendations = Some(recommendations);
        self
    }

    pub fn build(self) -> AppResult<AnalysisReport> {
        Ok(AnalysisReport {
            metadata: self.metadata,
            overview: self.overview.ok_or_else(|| missing_section("overview"))?,
            time_period_analysis: self.time_period_analysis,
            productivity_trend: self
                .productivity_trend
                .ok_or_else(|| missing_section("productivityTrend"))?,
            procrastination_analysis: self
                .procrastination_analysis
                .ok_or_else(|| missing_section("procrastinationAnalysis"))?,
            optimal_work_periods: self
                .optimal_work_periods
                .ok_or_else(|| missing_section("optimalWorkPeriods"))?,
            personalized_insights: self.personalized_insights,
            recommendations: self.recommendations,
        })
    }
}

fn missing_section(section: &str) -> AppError {
    AppError::validation_with_details(
        "分析报告缺少必需部分",
        serde_json::json!({ "section": section }),
    )
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskBrief {
    pub id: String,
    pub title: String,
    pub completed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DailyBreakdown {
    pub date: NaiveDate,
    pub created: usize,
    pub completed: usize,
    pub completion_rate: u32,
    #[serde(default)]
    pub tasks: Vec<TaskBrief>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreationDistribution {
    /// Records created per hour of day, index 0 is midnight.
    pub hourly: Vec<usize>,
    /// Records created per weekday, index 0 is Monday.
    pub weekday: Vec<usize>,
    pub peak_hour: Option<u32>,
    pub peak_weekday: Option<Weekday>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ComparisonTrend {
    Stable,
    Improving,
    Declining,
    Mixed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PeriodComparison {
    pub previous_range: TimeRange,
    pub previous: CompletionStats,
    pub total_change: i64,
    pub completed_change: i64,
    pub completion_rate_change: i64,
    pub trend: ComparisonTrend,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PeriodAnalysis {
    pub range: TimeRange,
    pub overview: CompletionStats,
    pub daily_breakdown: Vec<DailyBreakdown>,
    pub distribution: CreationDistribution,
    pub comparison: PeriodComparison,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Created,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEvent {
    pub kind: ActivityKind,
    pub task_id: String,
    pub title: String,
    pub timestamp: DateTime<FixedOffset>,
    pub relative_time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RealTimeStats {
    pub generated_at: DateTime<FixedOffset>,
    pub overall: CompletionStats,
    pub today: CompletionStats,
    pub this_week: CompletionStats,
    #[serde(default)]
    pub recent_activity: Vec<ActivityEvent>,
    #[serde(default)]
    pub quick_insights: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Structured,
    Tabular,
    Summary,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Structured => "structured",
            ExportFormat::Tabular => "tabular",
            ExportFormat::Summary => "summary",
        }
    }

    pub fn file_extension(&self) -> &'static str {
        match self {
            ExportFormat::Structured => "json",
            ExportFormat::Tabular => "csv",
            ExportFormat::Summary => "txt",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "structured" => Ok(ExportFormat::Structured),
            "tabular" => Ok(ExportFormat::Tabular),
            "summary" => Ok(ExportFormat::Summary),
            _ => Err(AppError::unsupported_format(value)),
        }
    }
}
