pub mod calendar;
pub mod graph;
pub mod metadata;
pub mod persistence;
pub mod scheduler;
pub mod task;
pub(crate) mod task_validation;

pub use calendar::{WorkCalendar, WorkCalendarConfig};
pub use graph::DependencyDag;
pub use metadata::ProjectMetadata;
pub use persistence::{
    PersistenceError, ProjectSnapshot, load_project_from_json, load_tasks_from_csv,
    save_project_to_json, save_tasks_to_csv, validate_tasks,
};
pub use scheduler::{GanttScheduler, ScheduleError, ScheduleSummary};
pub use task::{Dependency, DependencyType, SchedulingMode, Task};
