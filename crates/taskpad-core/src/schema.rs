//! Field rules for new tasks.
//!
//! Every field is checked on every submission and contributes at most one
//! message, so a caller can show all problems at once. Success and failure
//! are exclusive: no task data escapes unless every field passed.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::datetime::{parse_due_date, today};
use crate::task::{Priority, TaskDraft};

pub const TASK_NAME_MIN: usize = 5;
pub const TASK_NAME_MAX: usize = 30;
pub const STORY_POINTS_MIN: u8 = 1;
pub const STORY_POINTS_MAX: u8 = 20;

const ASSIGNEE_PATTERN: &str = r"^[A-Za-z\s]+$";

pub const MSG_TASK_NAME_SHORT: &str = "Task Name must be at least 5 characters.";
pub const MSG_TASK_NAME_LONG: &str = "Task Name must be at most 30 characters.";
pub const MSG_PRIORITY: &str = "Priority must be one of: Urgent, High, Normal, Low.";
pub const MSG_STORY_POINTS_WHOLE: &str =
    "Story Points must be a whole number (no fractions or decimals) and above 0.";
pub const MSG_STORY_POINTS_POSITIVE: &str = "Story Points must be a positive number above 0.";
pub const MSG_STORY_POINTS_MIN: &str = "Story Points must be at least 1.";
pub const MSG_STORY_POINTS_MAX: &str = "Story Points must be at most 20.";
pub const MSG_ASSIGNEE_PATTERN: &str = "Assignee must contain only letters and spaces.";
pub const MSG_DUE_DATE: &str = "Due Date must be a valid date in the future.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    TaskName,
    Priority,
    StoryPoints,
    Assignee,
    DueDate,
}

impl Field {
    pub fn as_str(self) -> &'static str {
        match self {
            Field::TaskName => "taskName",
            Field::Priority => "priority",
            Field::StoryPoints => "storyPoints",
            Field::Assignee => "assignee",
            Field::DueDate => "dueDate",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unvalidated form values, all as text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawTaskInput {
    pub task_name: String,
    pub priority: String,
    pub story_points: String,
    pub assignee: String,
    pub due_date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("task rejected: {} invalid field(s)", .errors.len())]
pub struct ValidationErrors {
    errors: BTreeMap<Field, String>,
}

impl ValidationErrors {
    pub fn get(&self, field: Field) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: Field) -> bool {
        self.errors.contains_key(&field)
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.errors.iter().map(|(field, msg)| (*field, msg.as_str()))
    }

    fn record(&mut self, field: Field, outcome: Result<(), &'static str>) {
        if let Err(msg) = outcome {
            self.errors.insert(field, msg.to_string());
        }
    }
}

/// Validates against the current date in the configured zone.
pub fn validate_today(raw: &RawTaskInput) -> Result<TaskDraft, ValidationErrors> {
    validate(raw, today())
}

#[tracing::instrument(skip(raw))]
pub fn validate(raw: &RawTaskInput, today: NaiveDate) -> Result<TaskDraft, ValidationErrors> {
    let task_name = check_task_name(&raw.task_name);
    let priority = check_priority(&raw.priority);
    let story_points = check_story_points(&raw.story_points);
    let assignee = check_assignee(&raw.assignee);
    let due_date = check_due_date(&raw.due_date, today);

    match (task_name, priority, story_points, assignee, due_date) {
        (Ok(()), Ok(priority), Ok(story_points), Ok(()), Ok(due_date)) => Ok(TaskDraft {
            task_name: raw.task_name.clone(),
            priority,
            story_points,
            assignee: raw.assignee.clone(),
            due_date,
        }),
        (task_name, priority, story_points, assignee, due_date) => {
            let mut errors = ValidationErrors::default();
            errors.record(Field::TaskName, task_name);
            errors.record(Field::Priority, priority.map(drop));
            errors.record(Field::StoryPoints, story_points.map(drop));
            errors.record(Field::Assignee, assignee);
            errors.record(Field::DueDate, due_date.map(drop));
            debug!(invalid = errors.len(), "task input rejected");
            Err(errors)
        }
    }
}

fn check_task_name(value: &str) -> Result<(), &'static str> {
    let len = value.chars().count();
    if len < TASK_NAME_MIN {
        Err(MSG_TASK_NAME_SHORT)
    } else if len > TASK_NAME_MAX {
        Err(MSG_TASK_NAME_LONG)
    } else {
        Ok(())
    }
}

fn check_priority(value: &str) -> Result<Priority, &'static str> {
    value.parse::<Priority>().map_err(|_| MSG_PRIORITY)
}

/// Numeric coercion: surrounding whitespace is ignored and blank text counts
/// as zero, the way a number input submits an empty value.
fn check_story_points(value: &str) -> Result<u8, &'static str> {
    let trimmed = value.trim();
    let number = if trimmed.is_empty() {
        0.0
    } else {
        trimmed
            .parse::<f64>()
            .map_err(|_| MSG_STORY_POINTS_WHOLE)?
    };

    if !number.is_finite() || number.fract() != 0.0 {
        return Err(MSG_STORY_POINTS_WHOLE);
    }
    if number <= 0.0 {
        return Err(MSG_STORY_POINTS_POSITIVE);
    }
    if number < f64::from(STORY_POINTS_MIN) {
        return Err(MSG_STORY_POINTS_MIN);
    }
    if number > f64::from(STORY_POINTS_MAX) {
        return Err(MSG_STORY_POINTS_MAX);
    }
    Ok(number as u8)
}

fn assignee_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(ASSIGNEE_PATTERN).expect("assignee pattern compiles"))
}

/// The pattern requires at least one character, so it also rejects blank
/// input with the same message.
fn check_assignee(value: &str) -> Result<(), &'static str> {
    if assignee_regex().is_match(value) {
        Ok(())
    } else {
        Err(MSG_ASSIGNEE_PATTERN)
    }
}

fn check_due_date(value: &str, today: NaiveDate) -> Result<NaiveDate, &'static str> {
    match parse_due_date(value, today) {
        Ok(date) if date >= today => Ok(date),
        _ => Err(MSG_DUE_DATE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 16).expect("date")
    }

    fn valid_input() -> RawTaskInput {
        RawTaskInput {
            task_name: "Write specs".to_string(),
            priority: "High".to_string(),
            story_points: "5".to_string(),
            assignee: "Ada Lovelace".to_string(),
            due_date: "2026-02-17".to_string(),
        }
    }

    fn only_error(raw: &RawTaskInput) -> (Field, String) {
        let errors = validate(raw, today()).expect_err("input should be rejected");
        assert_eq!(errors.len(), 1, "expected exactly one error, got {errors:?}");
        let (field, msg) = errors.iter().next().expect("one error");
        (field, msg.to_string())
    }

    #[test]
    fn accepts_valid_input_with_coerced_types() {
        let draft = validate(&valid_input(), today()).expect("valid");
        assert_eq!(draft.task_name, "Write specs");
        assert_eq!(draft.priority, Priority::High);
        assert_eq!(draft.story_points, 5);
        assert_eq!(draft.assignee, "Ada Lovelace");
        assert_eq!(draft.due_date, NaiveDate::from_ymd_opt(2026, 2, 17).expect("date"));
    }

    #[test]
    fn accepts_boundary_values() {
        let mut raw = valid_input();
        raw.task_name = "abcde".to_string();
        raw.story_points = "1".to_string();
        raw.due_date = "2026-02-16".to_string();
        assert!(validate(&raw, today()).is_ok());

        raw.task_name = "a".repeat(30);
        raw.story_points = " 20 ".to_string();
        assert_eq!(validate(&raw, today()).expect("valid").story_points, 20);

        raw.story_points = "7.0".to_string();
        assert_eq!(validate(&raw, today()).expect("valid").story_points, 7);
    }

    #[test]
    fn short_task_name_is_the_only_error() {
        let mut raw = valid_input();
        raw.task_name = "Hi".to_string();
        assert_eq!(
            only_error(&raw),
            (Field::TaskName, MSG_TASK_NAME_SHORT.to_string())
        );
    }

    #[test]
    fn long_task_name_is_rejected() {
        let mut raw = valid_input();
        raw.task_name = "x".repeat(31);
        assert_eq!(only_error(&raw), (Field::TaskName, MSG_TASK_NAME_LONG.to_string()));
    }

    #[test]
    fn task_name_length_counts_characters() {
        let mut raw = valid_input();
        raw.task_name = "ééééé".to_string();
        assert!(validate(&raw, today()).is_ok());
    }

    #[test]
    fn priority_must_be_exact() {
        for bad in ["", "high", "Medium", " High"] {
            let mut raw = valid_input();
            raw.priority = bad.to_string();
            assert_eq!(only_error(&raw), (Field::Priority, MSG_PRIORITY.to_string()));
        }
    }

    #[test]
    fn story_points_rules() {
        let cases = [
            ("2.5", MSG_STORY_POINTS_WHOLE),
            ("abc", MSG_STORY_POINTS_WHOLE),
            ("inf", MSG_STORY_POINTS_WHOLE),
            ("0", MSG_STORY_POINTS_POSITIVE),
            ("", MSG_STORY_POINTS_POSITIVE),
            ("-3", MSG_STORY_POINTS_POSITIVE),
            ("21", MSG_STORY_POINTS_MAX),
            ("1000", MSG_STORY_POINTS_MAX),
        ];
        for (input, expected) in cases {
            let mut raw = valid_input();
            raw.story_points = input.to_string();
            assert_eq!(
                only_error(&raw),
                (Field::StoryPoints, expected.to_string()),
                "input {input:?}"
            );
        }
    }

    #[test]
    fn assignee_rules() {
        let mut raw = valid_input();
        for bad in ["", "Ada2", "O'Brien", "ada_l", "Zoë"] {
            raw.assignee = bad.to_string();
            assert_eq!(
                only_error(&raw),
                (Field::Assignee, MSG_ASSIGNEE_PATTERN.to_string()),
                "input {bad:?}"
            );
        }
    }

    #[test]
    fn past_or_unparseable_due_date_is_rejected() {
        for bad in ["2026-02-15", "yesterday", "", "someday"] {
            let mut raw = valid_input();
            raw.due_date = bad.to_string();
            assert_eq!(
                only_error(&raw),
                (Field::DueDate, MSG_DUE_DATE.to_string()),
                "input {bad:?}"
            );
        }
    }

    #[test]
    fn every_invalid_field_is_reported() {
        let raw = RawTaskInput::default();
        let errors = validate(&raw, today()).expect_err("empty form");
        assert_eq!(errors.len(), 5);
        assert_eq!(errors.get(Field::TaskName), Some(MSG_TASK_NAME_SHORT));
        assert_eq!(errors.get(Field::Priority), Some(MSG_PRIORITY));
        assert_eq!(errors.get(Field::StoryPoints), Some(MSG_STORY_POINTS_POSITIVE));
        assert_eq!(errors.get(Field::Assignee), Some(MSG_ASSIGNEE_PATTERN));
        assert_eq!(errors.get(Field::DueDate), Some(MSG_DUE_DATE));
        assert_eq!(errors.to_string(), "task rejected: 5 invalid field(s)");
    }

    #[test]
    fn raw_input_reads_form_json() {
        let raw: RawTaskInput = serde_json::from_str(
            r#"{"taskName":"Write specs","priority":"High","storyPoints":"5"}"#,
        )
        .expect("parse");
        assert_eq!(raw.task_name, "Write specs");
        assert_eq!(raw.story_points, "5");
        assert!(raw.assignee.is_empty());
    }
}
