use crate::calendar::WorkCalendar;
use crate::graph::DependencyDag;
use crate::task::{DependencyType, SchedulingMode, Task};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

#[derive(Debug, Clone)]
pub enum ScheduleError {
    CircularDependency {
        task_id: String,
    },
    UnknownPredecessor {
        task_id: String,
        predecessor_id: String,
    },
}

impl fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleError::CircularDependency { task_id } => write!(
                f,
                "circular dependency detected involving task '{task_id}'"
            ),
            ScheduleError::UnknownPredecessor {
                task_id,
                predecessor_id,
            } => write!(
                f,
                "task '{task_id}' references unknown predecessor '{predecessor_id}'"
            ),
        }
    }
}

impl std::error::Error for ScheduleError {}

/// Aggregate figures over a scheduled task list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleSummary {
    pub task_count: usize,
    pub manual_count: usize,
    pub earliest_start: Option<NaiveDate>,
    pub latest_finish: Option<NaiveDate>,
    pub total_work_hours: f64,
}

impl ScheduleSummary {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let mut earliest_start: Option<NaiveDate> = None;
        let mut latest_finish: Option<NaiveDate> = None;
        let mut manual_count = 0usize;
        let mut total_work_hours = 0.0;

        for task in tasks {
            if task.is_manual() {
                manual_count += 1;
            }
            if let Some(work) = task.work_hours {
                total_work_hours += work;
            }
            if let Some(start) = task.start_date {
                earliest_start = Some(match earliest_start {
                    Some(current) if current <= start => current,
                    _ => start,
                });
            }
            if let Some(end) = task.end_date {
                latest_finish = Some(match latest_finish {
                    Some(current) if current >= end => current,
                    _ => end,
                });
            }
        }

        Self {
            task_count: tasks.len(),
            manual_count,
            earliest_start,
            latest_finish,
            total_work_hours,
        }
    }

    pub fn to_cli_summary(&self) -> String {
        let mut parts = Vec::new();
        parts.push(format!("tasks={}", self.task_count));
        if self.manual_count > 0 {
            parts.push(format!("manual={}", self.manual_count));
        }
        if let Some(date) = self.earliest_start {
            parts.push(format!("start={}", date));
        }
        if let Some(date) = self.latest_finish {
            parts.push(format!("finish={}", date));
        }
        if self.total_work_hours > 0.0 {
            parts.push(format!("work={}h", self.total_work_hours));
        }
        parts.join(", ")
    }
}

/// Computes a globally consistent schedule for a task set, honoring
/// dependencies, per-task calendars, and manual overrides.
///
/// Scheduling never mutates the scheduler: the effective project calendar is
/// resolved up front and threaded through every call, so a single instance
/// can serve overlapping recalculations.
pub struct GanttScheduler {
    calendars: HashMap<String, WorkCalendar>,
    default_calendar: WorkCalendar,
    strict_dependencies: bool,
}

impl Default for GanttScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl GanttScheduler {
    /// Scheduler with a Mon-Fri, 8 hours/day default calendar.
    pub fn new() -> Self {
        Self::with_default_calendar(WorkCalendar::default())
    }

    pub fn with_default_calendar(default_calendar: WorkCalendar) -> Self {
        Self {
            calendars: HashMap::new(),
            default_calendar,
            strict_dependencies: false,
        }
    }

    /// When strict, [`validate_dependencies`](Self::validate_dependencies)
    /// rejects references to unknown task ids instead of silently skipping
    /// them during propagation.
    pub fn strict_dependencies(mut self, strict: bool) -> Self {
        self.strict_dependencies = strict;
        self
    }

    pub fn register_calendar(&mut self, id: impl Into<String>, calendar: WorkCalendar) {
        self.calendars.insert(id.into(), calendar);
    }

    pub fn default_calendar(&self) -> &WorkCalendar {
        &self.default_calendar
    }

    /// The registered calendar for `calendar_id`; absent or unregistered ids
    /// degrade to the default rather than erroring.
    pub fn calendar(&self, calendar_id: Option<&str>) -> &WorkCalendar {
        calendar_id
            .and_then(|id| self.calendars.get(id))
            .unwrap_or(&self.default_calendar)
    }

    fn task_calendar<'a>(&'a self, task: &Task, project_calendar: &'a WorkCalendar) -> &'a WorkCalendar {
        match task.calendar_id.as_deref() {
            Some(id) => self.calendars.get(id).unwrap_or(project_calendar),
            None => project_calendar,
        }
    }

    /// Resolve the date a single dependency edge contributes to its
    /// successor. FS/FF anchor on the predecessor's end date (falling back to
    /// its start), SS/SF on its start date; the signed lag is applied in
    /// working days. `None` when the predecessor has no dates at all, which
    /// callers treat as "no constraint from that edge".
    pub fn calculate_dependency_date(
        &self,
        predecessor: &Task,
        kind: DependencyType,
        lag_days: i64,
        calendar_id: Option<&str>,
    ) -> Option<NaiveDate> {
        self.dependency_date(predecessor, kind, lag_days, self.calendar(calendar_id))
    }

    fn dependency_date(
        &self,
        predecessor: &Task,
        kind: DependencyType,
        lag_days: i64,
        calendar: &WorkCalendar,
    ) -> Option<NaiveDate> {
        let anchor = match kind {
            DependencyType::FinishToStart | DependencyType::FinishToFinish => {
                predecessor.end_date.or(predecessor.start_date)
            }
            DependencyType::StartToStart | DependencyType::StartToFinish => predecessor.start_date,
        }?;

        Some(if lag_days > 0 {
            calendar.add_workdays(anchor, lag_days)
        } else if lag_days < 0 {
            calendar.subtract_workdays(anchor, -lag_days)
        } else {
            anchor
        })
    }

    /// Start date for one task against the given context. Manual tasks keep
    /// their own start (or fall back to the project start); root tasks start
    /// on the first workday on/after the project start; otherwise the binding
    /// constraint is the latest-resolving predecessor, snapped forward to a
    /// workday.
    pub fn calculate_start_date(
        &self,
        task: &Task,
        project_start: NaiveDate,
        all_tasks: &[Task],
    ) -> NaiveDate {
        let context = Self::context_from(all_tasks);
        let calendar = self.task_calendar(task, &self.default_calendar);
        self.resolve_start(task, project_start, &context, calendar)
    }

    fn resolve_start(
        &self,
        task: &Task,
        project_start: NaiveDate,
        context: &HashMap<String, Task>,
        calendar: &WorkCalendar,
    ) -> NaiveDate {
        if task.scheduling_mode == SchedulingMode::Manual {
            return task.start_date.unwrap_or(project_start);
        }
        if task.predecessors.is_empty() {
            return calendar.next_workday(project_start);
        }

        let mut latest: Option<NaiveDate> = None;
        for dependency in &task.predecessors {
            // Unknown predecessor ids contribute no constraint.
            let Some(predecessor) = context.get(&dependency.task_id) else {
                continue;
            };
            let Some(date) =
                self.dependency_date(predecessor, dependency.kind, dependency.lag_days, calendar)
            else {
                continue;
            };
            latest = Some(match latest {
                Some(current) if current >= date => current,
                _ => date,
            });
        }

        match latest {
            Some(date) => calendar.next_workday(date),
            None => calendar.next_workday(project_start),
        }
    }

    /// End date from a start date, in order of precedence: explicit duration,
    /// work-derived duration, an already-set end date, or a one-workday
    /// default. `None` only when no start date is available.
    pub fn calculate_end_date(&self, task: &Task, start_date: Option<NaiveDate>) -> Option<NaiveDate> {
        let calendar = self.task_calendar(task, &self.default_calendar);
        self.resolve_end(task, start_date, calendar)
    }

    fn resolve_end(
        &self,
        task: &Task,
        start_date: Option<NaiveDate>,
        calendar: &WorkCalendar,
    ) -> Option<NaiveDate> {
        let start = start_date.or(task.start_date)?;

        if let Some(duration) = task.duration_days.filter(|days| *days > 0) {
            return Some(calendar.add_workdays(start, duration));
        }
        if let Some(work) = task.work_hours.filter(|hours| *hours > 0.0) {
            let days = calendar.hours_to_days(work);
            return Some(calendar.add_workdays(start, days));
        }
        if let Some(end) = task.end_date {
            return Some(end);
        }
        Some(calendar.add_workdays(start, 1))
    }

    /// Working days strictly between the resolved start and end; 0 when
    /// either date is missing.
    pub fn calculate_duration(
        &self,
        task: &Task,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> i64 {
        let calendar = self.task_calendar(task, &self.default_calendar);
        self.resolve_duration(task, start_date, end_date, calendar)
    }

    fn resolve_duration(
        &self,
        task: &Task,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
        calendar: &WorkCalendar,
    ) -> i64 {
        match (start_date.or(task.start_date), end_date.or(task.end_date)) {
            (Some(start), Some(end)) => calendar.workdays_between(start, end),
            _ => 0,
        }
    }

    /// A new task value with dates recomputed against the given context.
    /// Duration and work are backfilled only when absent from the input.
    pub fn recalculate_task(
        &self,
        task: &Task,
        project_start: NaiveDate,
        all_tasks: &[Task],
    ) -> Task {
        let context = Self::context_from(all_tasks);
        self.recalc_task(task, project_start, &context, &self.default_calendar)
    }

    fn recalc_task(
        &self,
        task: &Task,
        project_start: NaiveDate,
        context: &HashMap<String, Task>,
        project_calendar: &WorkCalendar,
    ) -> Task {
        let calendar = self.task_calendar(task, project_calendar);
        let mut updated = task.clone();

        let start = self.resolve_start(task, project_start, context, calendar);
        updated.start_date = Some(start);
        updated.end_date = self.resolve_end(&updated, Some(start), calendar);

        if updated.duration_days.is_none() {
            updated.duration_days =
                Some(self.resolve_duration(&updated, updated.start_date, updated.end_date, calendar));
        }
        if updated.work_hours.is_none() {
            if let Some(days) = updated.duration_days {
                updated.work_hours = Some(calendar.days_to_hours(days));
            }
        }
        updated
    }

    /// Cycle check over the predecessor graph; must pass before any
    /// scheduling is attempted. In strict mode, dangling predecessor
    /// references are reported as well.
    pub fn validate_dependencies(&self, tasks: &[Task]) -> Result<(), ScheduleError> {
        if self.strict_dependencies {
            let known: HashSet<&str> = tasks.iter().map(|task| task.id.as_str()).collect();
            for task in tasks {
                for dependency in &task.predecessors {
                    if !known.contains(dependency.task_id.as_str()) {
                        return Err(ScheduleError::UnknownPredecessor {
                            task_id: task.id.clone(),
                            predecessor_id: dependency.task_id.clone(),
                        });
                    }
                }
            }
        }

        let dag = DependencyDag::build(tasks);
        if let Some(task_id) = dag.find_cycle() {
            return Err(ScheduleError::CircularDependency { task_id });
        }
        Ok(())
    }

    /// Tasks reordered so every task appears after all of its in-graph
    /// predecessors. Tasks on a cycle are omitted; validate first.
    pub fn topological_sort(&self, tasks: &[Task]) -> Vec<Task> {
        let dag = DependencyDag::build(tasks);
        let by_id: HashMap<&str, &Task> =
            tasks.iter().map(|task| (task.id.as_str(), task)).collect();

        dag.topological_order()
            .into_iter()
            .filter_map(|id| by_id.get(id.as_str()).map(|task| (*task).clone()))
            .collect()
    }

    /// The entry point: validate the dependency graph, resolve the effective
    /// project calendar, and recompute every task in dependency order so
    /// predecessors carry final dates before their successors are computed.
    /// The result preserves the caller's input order. On a cyclic graph the
    /// whole batch fails before any dates are produced.
    pub fn recalculate_project(
        &self,
        tasks: &[Task],
        project_start: NaiveDate,
        project_calendar_id: Option<&str>,
    ) -> Result<Vec<Task>, ScheduleError> {
        self.validate_dependencies(tasks)?;

        let project_calendar = self.calendar(project_calendar_id);
        let dag = DependencyDag::build(tasks);
        let order = dag.topological_order();
        let by_id: HashMap<&str, &Task> =
            tasks.iter().map(|task| (task.id.as_str(), task)).collect();

        let mut scheduled: HashMap<String, Task> = HashMap::with_capacity(tasks.len());
        for id in &order {
            let Some(task) = by_id.get(id.as_str()) else {
                continue;
            };
            let updated = self.recalc_task(task, project_start, &scheduled, project_calendar);
            scheduled.insert(updated.id.clone(), updated);
        }

        // Hand results back in the caller's original order.
        Ok(tasks
            .iter()
            .map(|task| scheduled.remove(&task.id).unwrap_or_else(|| task.clone()))
            .collect())
    }

    fn context_from(tasks: &[Task]) -> HashMap<String, Task> {
        tasks
            .iter()
            .map(|task| (task.id.clone(), task.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    #[test]
    fn calendar_lookup_falls_back_to_default() {
        let mut scheduler = GanttScheduler::new();
        scheduler.register_calendar(
            "six-day",
            WorkCalendar::custom(
                "Six Day",
                [
                    Weekday::Mon,
                    Weekday::Tue,
                    Weekday::Wed,
                    Weekday::Thu,
                    Weekday::Fri,
                    Weekday::Sat,
                ],
                [],
                8.0,
            ),
        );

        assert_eq!(scheduler.calendar(Some("six-day")).name(), "Six Day");
        assert_eq!(scheduler.calendar(Some("missing")).name(), "Standard");
        assert_eq!(scheduler.calendar(None).name(), "Standard");
    }

    #[test]
    fn register_calendar_overwrites_existing_id() {
        let mut scheduler = GanttScheduler::new();
        scheduler.register_calendar("plant", WorkCalendar::default());
        scheduler.register_calendar("plant", WorkCalendar::with_us_holidays(2025, 2025));
        assert_eq!(scheduler.calendar(Some("plant")).name(), "US Business");
    }
}
