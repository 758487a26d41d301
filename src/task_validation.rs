use crate::task::Task;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone)]
pub struct TaskValidationError {
    message: String,
}

impl TaskValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for TaskValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for TaskValidationError {}

pub fn validate_task(task: &Task) -> Result<(), TaskValidationError> {
    if task.id.trim().is_empty() {
        return Err(TaskValidationError::new("task has an empty id"));
    }

    if let Some(duration) = task.duration_days {
        if duration < 0 {
            return Err(TaskValidationError::new(format!(
                "task {} has negative duration {}",
                task.id, duration
            )));
        }
    }

    if let Some(work) = task.work_hours {
        if !work.is_finite() || work < 0.0 {
            return Err(TaskValidationError::new(format!(
                "task {} has invalid work_hours {}",
                task.id, work
            )));
        }
    }

    for dependency in &task.predecessors {
        if dependency.task_id == task.id {
            return Err(TaskValidationError::new(format!(
                "task {} depends on itself",
                task.id
            )));
        }
    }

    Ok(())
}

pub fn validate_task_collection(tasks: &[Task]) -> Result<(), TaskValidationError> {
    let mut seen_ids = HashSet::with_capacity(tasks.len());
    for task in tasks {
        if !seen_ids.insert(task.id.as_str()) {
            return Err(TaskValidationError::new(format!(
                "duplicate task id {}",
                task.id
            )));
        }
        validate_task(task)?;
    }
    Ok(())
}
