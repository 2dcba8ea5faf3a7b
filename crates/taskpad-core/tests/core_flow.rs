use std::ffi::OsString;
use std::fs;

use chrono::{Days, NaiveDate};
use taskpad_core::confirm::DeleteFlow;
use taskpad_core::datastore::{BlobStore, FileBlobStore, TASKS_KEY};
use taskpad_core::filter::filter_tasks;
use taskpad_core::schema::{Field, RawTaskInput, validate};
use taskpad_core::store::{TaskStore, decode};
use taskpad_core::task::Priority;
use tempfile::tempdir;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 2, 16).expect("date")
}

fn form(name: &str, assignee: &str, due: NaiveDate) -> RawTaskInput {
    RawTaskInput {
        task_name: name.to_string(),
        priority: "High".to_string(),
        story_points: "5".to_string(),
        assignee: assignee.to_string(),
        due_date: due.format("%Y-%m-%d").to_string(),
    }
}

fn tomorrow() -> NaiveDate {
    today().checked_add_days(Days::new(1)).expect("tomorrow")
}

#[test]
fn submitted_task_shows_up_in_pending_view() {
    let temp = tempdir().expect("tempdir");
    let blob = FileBlobStore::open(temp.path()).expect("open blob store");
    let mut store = TaskStore::load(blob);

    let draft = validate(&form("Write specs", "Ada Lovelace", tomorrow()), today())
        .expect("valid submission");
    let task = store.add(draft).clone();

    assert!(!task.completed);
    assert_eq!(task.priority, Priority::High);
    assert_eq!(task.story_points, 5);
    assert_eq!(filter_tasks(store.tasks(), "", false), vec![&task]);
    assert!(filter_tasks(store.tasks(), "", true).is_empty());

    let reopened = TaskStore::load(FileBlobStore::open(temp.path()).expect("reopen"));
    assert_eq!(reopened.tasks(), store.tasks());
}

#[test]
fn short_name_is_rejected_and_nothing_is_stored() {
    let temp = tempdir().expect("tempdir");
    let store = TaskStore::load(FileBlobStore::open(temp.path()).expect("open"));

    let errors = validate(&form("Hi", "Ada Lovelace", tomorrow()), today())
        .expect_err("short name");
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors.get(Field::TaskName),
        Some("Task Name must be at least 5 characters.")
    );
    assert!(store.is_empty());
    assert!(!temp.path().join("tasks.json").exists());
}

#[test]
fn yesterday_is_not_a_valid_due_date() {
    let yesterday = today().checked_sub_days(Days::new(1)).expect("yesterday");
    let errors = validate(&form("Write specs", "Ada", yesterday), today())
        .expect_err("past due date");
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors.get(Field::DueDate),
        Some("Due Date must be a valid date in the future.")
    );
}

#[test]
fn search_and_completion_filters_combine() {
    let temp = tempdir().expect("tempdir");
    let mut store = TaskStore::load(FileBlobStore::open(temp.path()).expect("open"));

    let a = store
        .add(validate(&form("Task A work", "Ada", tomorrow()), today()).expect("a"))
        .id;
    let b = store
        .add(validate(&form("Task B work", "Bob", tomorrow()), today()).expect("b"))
        .id;
    assert_eq!(store.toggle_completed(b), Some(true));

    let pending: Vec<_> = filter_tasks(store.tasks(), "ada", false)
        .into_iter()
        .map(|t| t.id)
        .collect();
    assert_eq!(pending, vec![a]);

    let completed: Vec<_> = filter_tasks(store.tasks(), "", true)
        .into_iter()
        .map(|t| t.id)
        .collect();
    assert_eq!(completed, vec![b]);
}

#[test]
fn last_delete_request_wins_and_is_persisted() {
    let temp = tempdir().expect("tempdir");
    let mut store = TaskStore::load(FileBlobStore::open(temp.path()).expect("open"));
    let a = store
        .add(validate(&form("Task A work", "Ada", tomorrow()), today()).expect("a"))
        .id;
    let b = store
        .add(validate(&form("Task B work", "Bob", tomorrow()), today()).expect("b"))
        .id;

    let mut flow = DeleteFlow::default();
    flow.request(a);
    flow.request(b);
    flow.confirm(&mut store).expect("b removed");

    let blob = FileBlobStore::open(temp.path()).expect("reopen");
    let persisted = decode(&blob.read(TASKS_KEY).expect("read").expect("blob")).expect("decode");
    let ids: Vec<_> = persisted.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![a]);
}

#[test]
fn corrupted_file_loads_as_empty_and_is_overwritten_on_next_change() {
    let temp = tempdir().expect("tempdir");
    fs::write(temp.path().join("tasks.json"), "{{{ definitely not json").expect("write junk");

    let mut store = TaskStore::load(FileBlobStore::open(temp.path()).expect("open"));
    assert!(store.is_empty());

    store.add(validate(&form("Write specs", "Ada", tomorrow()), today()).expect("valid"));
    let raw = fs::read_to_string(temp.path().join("tasks.json")).expect("read back");
    assert_eq!(decode(&raw).expect("decode").len(), 1);
}

fn args(extra: &[&str], data: &std::path::Path, rc: &std::path::Path) -> Vec<OsString> {
    let mut out: Vec<OsString> = vec![
        "taskpad".into(),
        "--data".into(),
        data.as_os_str().to_owned(),
        "--config".into(),
        rc.as_os_str().to_owned(),
        "rc.color=off".into(),
    ];
    out.extend(extra.iter().map(OsString::from));
    out
}

#[test]
fn cli_add_toggle_delete_round_trip() {
    let temp = tempdir().expect("tempdir");
    let data = temp.path().join("data");
    let rc = temp.path().join("taskpadrc");
    fs::write(&rc, "confirmation = on\n").expect("write rc");

    taskpad_core::run(args(
        &[
            "add",
            "--name",
            "Write specs",
            "--priority",
            "Urgent",
            "--points",
            "8",
            "--assignee",
            "Ada Lovelace",
            "--due",
            "+3d",
        ],
        &data,
        &rc,
    ))
    .expect("add");

    let load = || {
        decode(&fs::read_to_string(data.join("tasks.json")).expect("tasks.json")).expect("decode")
    };
    let tasks = load();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].priority, Priority::Urgent);
    let id = tasks[0].id.to_string();

    taskpad_core::run(args(&["done", &id[..8]], &data, &rc)).expect("toggle");
    assert!(load()[0].completed);

    taskpad_core::run(args(&["list", "--completed", "--search", "ADA"], &data, &rc))
        .expect("list");

    let err = taskpad_core::run(args(
        &["add", "--name", "Hi", "--priority", "High", "--points", "5", "--assignee", "Ada", "--due", "today"],
        &data,
        &rc,
    ))
    .expect_err("invalid add");
    assert!(format!("{err:#}").contains("task not created"));
    assert_eq!(load().len(), 1);

    taskpad_core::run(args(&["delete", &id, "--yes"], &data, &rc)).expect("delete");
    assert!(load().is_empty());
}
