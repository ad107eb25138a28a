use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum PeriodKind {
    Day,
    Week,
    Month,
}

impl PeriodKind {
    pub const ALL: [PeriodKind; 3] = [PeriodKind::Day, PeriodKind::Week, PeriodKind::Month];

    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodKind::Day => "day",
            PeriodKind::Week => "week",
            PeriodKind::Month => "month",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TimeSlot {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimeSlot {
    pub const ALL: [TimeSlot; 4] = [
        TimeSlot::Morning,
        TimeSlot::Afternoon,
        TimeSlot::Evening,
        TimeSlot::Night,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeSlot::Morning => "morning",
            TimeSlot::Afternoon => "afternoon",
            TimeSlot::Evening => "evening",
            TimeSlot::Night => "night",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TimeSlot::Morning => "上午",
            TimeSlot::Afternoon => "下午",
            TimeSlot::Evening => "晚上",
            TimeSlot::Night => "深夜",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DayType {
    Weekday,
    Weekend,
}

impl DayType {
    pub fn label(&self) -> &'static str {
        match self {
            DayType::Weekday => "工作日",
            DayType::Weekend => "周末",
        }
    }
}

/// Inclusive window of instants.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimeRange {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

impl TimeRange {
    pub fn new(start: DateTime<FixedOffset>, end: DateTime<FixedOffset>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, instant: DateTime<FixedOffset>) -> bool {
        instant >= self.start && instant <= self.end
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CompletionStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    pub completion_rate: u32,
    pub pending_rate: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PeriodStatistic {
    pub label: String,
    pub period: PeriodKind,
    pub start_date: DateTime<FixedOffset>,
    pub end_date: DateTime<FixedOffset>,
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    pub completion_rate: u32,
    pub pending_rate: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

impl TrendDirection {
    pub fn label(&self) -> &'static str {
        match self {
            TrendDirection::Increasing => "上升",
            TrendDirection::Decreasing => "下降",
            TrendDirection::Stable => "平稳",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductivityTrend {
    pub trend: TrendDirection,
    /// Fitted slope, completed tasks per bucket.
    pub change: f64,
    pub daily_average: f64,
    pub description: String,
    #[serde(default)]
    pub periods: Vec<PeriodStatistic>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ProcrastinationLevel {
    Low,
    Moderate,
    High,
    VeryHigh,
}

impl ProcrastinationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcrastinationLevel::Low => "low",
            ProcrastinationLevel::Moderate => "moderate",
            ProcrastinationLevel::High => "high",
            ProcrastinationLevel::VeryHigh => "very_high",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ProcrastinationLevel::Low => "较低",
            ProcrastinationLevel::Moderate => "中等",
            ProcrastinationLevel::High => "较高",
            ProcrastinationLevel::VeryHigh => "很高",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProcrastinationMetrics {
    pub total_tasks: usize,
    pub pending_tasks: usize,
    pub delayed_tasks: usize,
    pub long_term_delayed: usize,
    pub very_long_term_delayed: usize,
    pub average_delay_days: f64,
    pub average_completion_days: f64,
    /// Completed records whose `updateTime` precedes `createTime`.
    pub inconsistent_records: usize,
    pub procrastination_score: u32,
    pub procrastination_level: ProcrastinationLevel,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WorkPeriodStats {
    pub total: usize,
    pub completed: usize,
    pub completion_rate: u32,
    pub productivity_score: u32,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlotBreakdown {
    pub morning: WorkPeriodStats,
    pub afternoon: WorkPeriodStats,
    pub evening: WorkPeriodStats,
    pub night: WorkPeriodStats,
}

impl TimeSlotBreakdown {
    pub fn get(&self, slot: TimeSlot) -> &WorkPeriodStats {
        match slot {
            TimeSlot::Morning => &self.morning,
            TimeSlot::Afternoon => &self.afternoon,
            TimeSlot::Evening => &self.evening,
            TimeSlot::Night => &self.night,
        }
    }

    pub fn get_mut(&mut self, slot: TimeSlot) -> &mut WorkPeriodStats {
        match slot {
            TimeSlot::Morning => &mut self.morning,
            TimeSlot::Afternoon => &mut self.afternoon,
            TimeSlot::Evening => &mut self.evening,
            TimeSlot::Night => &mut self.night,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DayTypeBreakdown {
    pub weekday: WorkPeriodStats,
    pub weekend: WorkPeriodStats,
}

impl DayTypeBreakdown {
    pub fn get(&self, day_type: DayType) -> &WorkPeriodStats {
        match day_type {
            DayType::Weekday => &self.weekday,
            DayType::Weekend => &self.weekend,
        }
    }

    pub fn get_mut(&mut self, day_type: DayType) -> &mut WorkPeriodStats {
        match day_type {
            DayType::Weekday => &mut self.weekday,
            DayType::Weekend => &mut self.weekend,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OptimalWorkPeriods {
    pub time_slots: TimeSlotBreakdown,
    pub day_types: DayTypeBreakdown,
    pub best_time_slot: Option<TimeSlot>,
    pub best_day_type: Option<DayType>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum WorkStyle {
    Sprint,
    Marathon,
    MixedFast,
    Balanced,
}

impl WorkStyle {
    pub fn label(&self) -> &'static str {
        match self {
            WorkStyle::Sprint => "冲刺型",
            WorkStyle::Marathon => "马拉松型",
            WorkStyle::MixedFast => "快慢结合型",
            WorkStyle::Balanced => "均衡型",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkingStyle {
    pub style: WorkStyle,
    pub average_completion_days: f64,
    pub quick_completion_ratio: f64,
    pub sample_size: usize,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatterns {
    pub average_title_length: f64,
    /// Percentage of records carrying a non-empty description.
    pub description_rate: u32,
    pub peak_creation_hour: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct StreakSummary {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_completion_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AchievementCategory {
    Volume,
    CompletionRate,
    Streak,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub id: String,
    pub category: AchievementCategory,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PersonalizedInsights {
    pub working_style: WorkingStyle,
    pub task_patterns: TaskPatterns,
    pub streaks: StreakSummary,
    #[serde(default)]
    pub achievements: Vec<Achievement>,
    #[serde(default)]
    pub summary: Vec<String>,
}
