use chrono::{NaiveDate, Weekday};
use gantt_scheduler::{
    Dependency, DependencyType, PersistenceError, ProjectMetadata, ProjectSnapshot, SchedulingMode,
    Task, WorkCalendarConfig, load_project_from_json, load_tasks_from_csv, save_project_to_json,
    save_tasks_to_csv,
};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn sample_tasks() -> Vec<Task> {
    let mut a = Task::with_duration("a", "Design", 2);
    a.start_date = Some(d(2025, 1, 6));
    a.work_hours = Some(16.0);

    let mut b = Task::with_duration("b", "Build", 3);
    b.predecessors = vec![
        Dependency::finish_to_start("a"),
        Dependency::new("a", DependencyType::StartToStart, 2),
    ];
    b.calendar_id = Some("shop".to_string());

    let mut m = Task::new("m", "Fixed review");
    m.scheduling_mode = SchedulingMode::Manual;
    m.start_date = Some(d(2025, 1, 20));
    m.end_date = Some(d(2025, 1, 21));

    vec![a, b, m]
}

#[test]
fn json_snapshot_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("project.json");

    let mut metadata = ProjectMetadata::default();
    metadata.project_name = "Line retooling".to_string();
    metadata.project_start_date = d(2025, 1, 6);
    metadata.default_calendar_id = Some("shop".to_string());

    let mut snapshot = ProjectSnapshot::new(metadata, sample_tasks());
    snapshot.calendars.insert(
        "shop".to_string(),
        WorkCalendarConfig::new(
            "Shop Floor",
            [
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
                Weekday::Sat,
            ],
            [d(2025, 1, 1)],
            10.0,
        ),
    );

    save_project_to_json(&snapshot, &path).unwrap();
    let loaded = load_project_from_json(&path).unwrap();

    assert_eq!(loaded.metadata.project_name, "Line retooling");
    assert_eq!(loaded.metadata.default_calendar_id.as_deref(), Some("shop"));
    assert_eq!(loaded.tasks, snapshot.tasks);
    assert_eq!(loaded.calendars["shop"].hours_per_day(), 10.0);
}

#[test]
fn loaded_snapshot_recalculates_with_its_own_calendars() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("project.json");

    let mut metadata = ProjectMetadata::default();
    metadata.project_start_date = d(2025, 1, 4); // Saturday
    metadata.default_calendar_id = Some("seven-day".to_string());

    let mut snapshot = ProjectSnapshot::new(metadata, vec![Task::with_duration("a", "Outage", 1)]);
    snapshot.calendars.insert(
        "seven-day".to_string(),
        WorkCalendarConfig::new(
            "Continuous",
            [
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
                Weekday::Sat,
                Weekday::Sun,
            ],
            [],
            8.0,
        ),
    );

    save_project_to_json(&snapshot, &path).unwrap();
    let scheduled = load_project_from_json(&path).unwrap().recalculate().unwrap();

    // The stored calendar treats Saturday as working
    assert_eq!(scheduled[0].start_date, Some(d(2025, 1, 4)));
    assert_eq!(scheduled[0].end_date, Some(d(2025, 1, 5)));
}

#[test]
fn csv_round_trip_preserves_dependency_encoding() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasks.csv");

    let tasks = sample_tasks();
    save_tasks_to_csv(&tasks, &path).unwrap();
    let loaded = load_tasks_from_csv(&path).unwrap();

    assert_eq!(loaded, tasks);
    assert_eq!(loaded[1].predecessors.len(), 2);
    assert_eq!(loaded[1].predecessors[1].kind, DependencyType::StartToStart);
    assert_eq!(loaded[1].predecessors[1].lag_days, 2);
}

#[test]
fn csv_load_accepts_bare_predecessor_ids() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasks.csv");

    let contents = "\
id,name,scheduling_mode,start_date,end_date,duration_days,work_hours,predecessors,calendar_id
a,Design,,2025-01-06,,2,,,
b,Build,,,,3,,a,
";
    std::fs::write(&path, contents).unwrap();

    let loaded = load_tasks_from_csv(&path).unwrap();
    assert_eq!(loaded[1].predecessors, vec![Dependency::finish_to_start("a")]);
    assert_eq!(loaded[0].scheduling_mode, SchedulingMode::Automatic);
    assert_eq!(loaded[0].start_date, Some(d(2025, 1, 6)));
    assert_eq!(loaded[1].calendar_id, None);
}

#[test]
fn csv_load_rejects_malformed_dates() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasks.csv");

    let contents = "\
id,name,scheduling_mode,start_date,end_date,duration_days,work_hours,predecessors,calendar_id
a,Design,,06/01/2025,,2,,,
";
    std::fs::write(&path, contents).unwrap();

    let err = load_tasks_from_csv(&path).unwrap_err();
    assert!(matches!(err, PersistenceError::InvalidData(_)));
}

#[test]
fn empty_csv_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasks.csv");

    let contents =
        "id,name,scheduling_mode,start_date,end_date,duration_days,work_hours,predecessors,calendar_id\n";
    std::fs::write(&path, contents).unwrap();

    let err = load_tasks_from_csv(&path).unwrap_err();
    assert!(err.to_string().contains("no tasks"));
}

#[test]
fn duplicate_task_ids_fail_validation_on_save() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasks.csv");

    let tasks = vec![Task::new("a", "One"), Task::new("a", "Two")];
    let err = save_tasks_to_csv(&tasks, &path).unwrap_err();
    assert!(matches!(err, PersistenceError::InvalidData(_)));
    assert!(err.to_string().contains("duplicate task id"));
}

#[test]
fn self_dependency_fails_validation_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasks.csv");

    let contents = "\
id,name,scheduling_mode,start_date,end_date,duration_days,work_hours,predecessors,calendar_id
a,Loop,,,,1,,a:FS:0,
";
    std::fs::write(&path, contents).unwrap();

    let err = load_tasks_from_csv(&path).unwrap_err();
    assert!(err.to_string().contains("depends on itself"));
}

#[test]
fn snapshot_with_empty_working_days_fails_to_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("project.json");

    let contents = r#"{
  "metadata": {
    "project_name": "Broken calendars",
    "project_description": "",
    "project_start_date": "2025-01-06"
  },
  "calendars": {
    "never": { "name": "Never", "working_days": [] }
  },
  "tasks": [{ "id": "a", "name": "Task" }]
}"#;
    std::fs::write(&path, contents).unwrap();

    let err = load_project_from_json(&path).unwrap_err();
    assert!(matches!(err, PersistenceError::InvalidData(_)));
    assert!(err.to_string().contains("no working days"));
}

#[test]
fn calendar_with_non_positive_hours_fails_to_save() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("project.json");

    let mut snapshot =
        ProjectSnapshot::new(ProjectMetadata::default(), vec![Task::new("a", "Task")]);
    snapshot.calendars.insert(
        "zero".to_string(),
        WorkCalendarConfig::new("Zero Hours", [Weekday::Mon], [], 0.0),
    );

    let err = save_project_to_json(&snapshot, &path).unwrap_err();
    assert!(matches!(err, PersistenceError::InvalidData(_)));
    assert!(err.to_string().contains("hours_per_day"));
    assert!(!path.exists());
}

#[test]
fn missing_json_file_surfaces_as_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_project_from_json(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, PersistenceError::Io(_)));
}
