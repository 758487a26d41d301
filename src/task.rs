use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Which predecessor date anchors the successor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DependencyType {
    #[serde(rename = "FS")]
    FinishToStart,
    #[serde(rename = "SS")]
    StartToStart,
    #[serde(rename = "FF")]
    FinishToFinish,
    #[serde(rename = "SF")]
    StartToFinish,
}

impl DependencyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyType::FinishToStart => "FS",
            DependencyType::StartToStart => "SS",
            DependencyType::FinishToFinish => "FF",
            DependencyType::StartToFinish => "SF",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "FS" => Some(DependencyType::FinishToStart),
            "SS" => Some(DependencyType::StartToStart),
            "FF" => Some(DependencyType::FinishToFinish),
            "SF" => Some(DependencyType::StartToFinish),
            _ => None,
        }
    }
}

impl Default for DependencyType {
    fn default() -> Self {
        DependencyType::FinishToStart
    }
}

/// Edge in the task graph: the predecessor's id, the anchor rule, and a
/// signed lag in working days (positive = delay, negative = lead/overlap).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub task_id: String,
    #[serde(default)]
    pub kind: DependencyType,
    #[serde(default)]
    pub lag_days: i64,
}

impl Dependency {
    pub fn new(task_id: impl Into<String>, kind: DependencyType, lag_days: i64) -> Self {
        Self {
            task_id: task_id.into(),
            kind,
            lag_days,
        }
    }

    /// The common case: successor starts after the predecessor finishes.
    pub fn finish_to_start(task_id: impl Into<String>) -> Self {
        Self::new(task_id, DependencyType::FinishToStart, 0)
    }
}

/// Manual tasks keep whatever dates the user fixed; automatic tasks have
/// their dates derived from dependencies and the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulingMode {
    #[default]
    Automatic,
    Manual,
}

impl SchedulingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchedulingMode::Automatic => "automatic",
            SchedulingMode::Manual => "manual",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "automatic" => Some(SchedulingMode::Automatic),
            "manual" => Some(SchedulingMode::Manual),
            _ => None,
        }
    }
}

/// Scheduling-relevant task data as supplied by the caller. Dates, duration
/// and work are optional until the scheduler computes them; serde defaults
/// let sparse client JSON deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub scheduling_mode: SchedulingMode,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub duration_days: Option<i64>,
    #[serde(default)]
    pub work_hours: Option<f64>,
    #[serde(default)]
    pub predecessors: Vec<Dependency>,
    #[serde(default)]
    pub calendar_id: Option<String>,
}

impl Task {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            scheduling_mode: SchedulingMode::Automatic,
            start_date: None,
            end_date: None,
            duration_days: None,
            work_hours: None,
            predecessors: Vec::new(),
            calendar_id: None,
        }
    }

    pub fn with_duration(id: impl Into<String>, name: impl Into<String>, duration_days: i64) -> Self {
        let mut task = Self::new(id, name);
        task.duration_days = Some(duration_days);
        task
    }

    pub fn is_manual(&self) -> bool {
        self.scheduling_mode == SchedulingMode::Manual
    }
}
