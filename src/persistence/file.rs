use super::{PersistenceError, PersistenceResult};
use crate::calendar::{WorkCalendar, WorkCalendarConfig};
use crate::metadata::ProjectMetadata;
use crate::scheduler::{GanttScheduler, ScheduleError};
use crate::task::{Dependency, DependencyType, SchedulingMode, Task};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

/// A whole project as stored on disk: metadata, the calendar registry (as
/// configs, keyed by calendar id), and the task list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSnapshot {
    pub metadata: ProjectMetadata,
    #[serde(default)]
    pub calendars: BTreeMap<String, WorkCalendarConfig>,
    pub tasks: Vec<Task>,
}

impl ProjectSnapshot {
    pub fn new(metadata: ProjectMetadata, tasks: Vec<Task>) -> Self {
        Self {
            metadata,
            calendars: BTreeMap::new(),
            tasks,
        }
    }

    /// A scheduler loaded with the stored calendar registry. The default
    /// calendar follows `metadata.default_calendar_id` when it names a stored
    /// config.
    pub fn scheduler(&self) -> GanttScheduler {
        let default_calendar = self
            .metadata
            .default_calendar_id
            .as_deref()
            .and_then(|id| self.calendars.get(id))
            .map(WorkCalendar::from_config)
            .unwrap_or_default();

        let mut scheduler = GanttScheduler::with_default_calendar(default_calendar);
        for (id, config) in &self.calendars {
            scheduler.register_calendar(id.clone(), WorkCalendar::from_config(config));
        }
        scheduler
    }

    /// Recompute the stored task list against the stored project start.
    pub fn recalculate(&self) -> Result<Vec<Task>, ScheduleError> {
        self.scheduler().recalculate_project(
            &self.tasks,
            self.metadata.project_start_date,
            self.metadata.default_calendar_id.as_deref(),
        )
    }
}

pub fn save_project_to_json<P: AsRef<Path>>(
    snapshot: &ProjectSnapshot,
    path: P,
) -> PersistenceResult<()> {
    super::validate_tasks(&snapshot.tasks)?;
    validate_calendar_configs(&snapshot.calendars)?;
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, snapshot)?;
    Ok(())
}

pub fn load_project_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<ProjectSnapshot> {
    let file = File::open(path)?;
    let snapshot: ProjectSnapshot = serde_json::from_reader(file)?;
    super::validate_tasks(&snapshot.tasks)?;
    validate_calendar_configs(&snapshot.calendars)?;
    Ok(snapshot)
}

/// Stored calendar configs must satisfy the same bounds
/// [`WorkCalendar::from_config`] enforces, so a loaded snapshot can always
/// build its scheduler.
fn validate_calendar_configs(
    calendars: &BTreeMap<String, WorkCalendarConfig>,
) -> PersistenceResult<()> {
    for (id, config) in calendars {
        if config.working_days().is_empty() {
            return Err(PersistenceError::InvalidData(format!(
                "calendar '{id}' has no working days"
            )));
        }
        if !(config.hours_per_day() > 0.0) {
            return Err(PersistenceError::InvalidData(format!(
                "calendar '{id}' has invalid hours_per_day {}",
                config.hours_per_day()
            )));
        }
    }
    Ok(())
}

#[derive(Default, Serialize, Deserialize)]
struct TaskCsvRecord {
    id: String,
    name: String,
    scheduling_mode: String,
    start_date: String,
    end_date: String,
    duration_days: String,
    work_hours: String,
    predecessors: String,
    calendar_id: String,
}

impl From<&Task> for TaskCsvRecord {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id.clone(),
            name: task.name.clone(),
            scheduling_mode: task.scheduling_mode.as_str().to_string(),
            start_date: format_date(task.start_date),
            end_date: format_date(task.end_date),
            duration_days: format_option_i64(task.duration_days),
            work_hours: format_option_f64(task.work_hours),
            predecessors: join_dependencies(&task.predecessors),
            calendar_id: task.calendar_id.clone().unwrap_or_default(),
        }
    }
}

impl TaskCsvRecord {
    fn into_task(self) -> PersistenceResult<Task> {
        let mut task = Task::new(self.id, self.name);
        task.scheduling_mode = if self.scheduling_mode.trim().is_empty() {
            SchedulingMode::Automatic
        } else {
            SchedulingMode::from_str(self.scheduling_mode.trim()).ok_or_else(|| {
                PersistenceError::InvalidData(format!(
                    "invalid scheduling_mode '{}'",
                    self.scheduling_mode
                ))
            })?
        };
        task.start_date = parse_date(&self.start_date)?;
        task.end_date = parse_date(&self.end_date)?;
        task.duration_days = parse_i64(&self.duration_days)?;
        task.work_hours = parse_f64(&self.work_hours)?;
        task.predecessors = split_dependencies(&self.predecessors)?;
        task.calendar_id = parse_string_option(self.calendar_id);
        Ok(task)
    }
}

pub fn save_tasks_to_csv<P: AsRef<Path>>(tasks: &[Task], path: P) -> PersistenceResult<()> {
    super::validate_tasks(tasks)?;
    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);
    for task in tasks {
        writer.serialize(TaskCsvRecord::from(task))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn load_tasks_from_csv<P: AsRef<Path>>(path: P) -> PersistenceResult<Vec<Task>> {
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(file);
    let mut tasks = Vec::new();
    for record in reader.deserialize::<TaskCsvRecord>() {
        tasks.push(record?.into_task()?);
    }

    if tasks.is_empty() {
        return Err(PersistenceError::InvalidData(
            "CSV file contained no tasks".into(),
        ));
    }

    super::validate_tasks(&tasks)?;
    Ok(tasks)
}

fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn parse_date(input: &str) -> PersistenceResult<Option<NaiveDate>> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map(Some)
        .map_err(|e| PersistenceError::InvalidData(format!("invalid date '{input}': {e}")))
}

fn format_option_i64(value: Option<i64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn parse_i64(input: &str) -> PersistenceResult<Option<i64>> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    input
        .trim()
        .parse::<i64>()
        .map(Some)
        .map_err(|e| PersistenceError::InvalidData(format!("invalid integer '{input}': {e}")))
}

fn format_option_f64(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn parse_f64(input: &str) -> PersistenceResult<Option<f64>> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    input
        .trim()
        .parse::<f64>()
        .map(Some)
        .map_err(|e| PersistenceError::InvalidData(format!("invalid float '{input}': {e}")))
}

fn parse_string_option(value: String) -> Option<String> {
    if value.trim().is_empty() { None } else { Some(value) }
}

/// Dependencies serialize as `task_id:KIND:lag` entries joined with `;`.
/// A bare `task_id` entry reads back as finish-to-start with zero lag.
fn join_dependencies(dependencies: &[Dependency]) -> String {
    dependencies
        .iter()
        .map(|dep| format!("{}:{}:{}", dep.task_id, dep.kind.as_str(), dep.lag_days))
        .collect::<Vec<_>>()
        .join(";")
}

fn split_dependencies(input: &str) -> PersistenceResult<Vec<Dependency>> {
    if input.trim().is_empty() {
        return Ok(Vec::new());
    }
    input
        .split(';')
        .map(|entry| parse_dependency(entry.trim()))
        .collect()
}

fn parse_dependency(entry: &str) -> PersistenceResult<Dependency> {
    let parts: Vec<&str> = entry.split(':').collect();
    match parts.as_slice() {
        [task_id] if !task_id.is_empty() => Ok(Dependency::finish_to_start(*task_id)),
        [task_id, kind, lag] if !task_id.is_empty() => {
            let kind = DependencyType::from_str(kind).ok_or_else(|| {
                PersistenceError::InvalidData(format!("invalid dependency type '{kind}'"))
            })?;
            let lag_days = lag.parse::<i64>().map_err(|e| {
                PersistenceError::InvalidData(format!("invalid dependency lag '{lag}': {e}"))
            })?;
            Ok(Dependency::new(*task_id, kind, lag_days))
        }
        _ => Err(PersistenceError::InvalidData(format!(
            "invalid dependency entry '{entry}'"
        ))),
    }
}
