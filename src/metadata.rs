use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectMetadata {
    pub project_name: String,
    pub project_description: String,
    pub project_start_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_calendar_id: Option<String>,
}

impl Default for ProjectMetadata {
    fn default() -> Self {
        Self {
            project_name: "New Project".to_string(),
            project_description: "No description".to_string(),
            project_start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            default_calendar_id: None,
        }
    }
}
