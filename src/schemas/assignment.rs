use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{Assignment, Question, Test};
use crate::db::types::{QuestionKind, TestStatus};

fn default_wildcard() -> Vec<String> {
    vec!["all".to_string()]
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AssignmentCreate {
    #[validate(length(min = 1))]
    pub(crate) test_id: String,
    #[serde(default = "default_wildcard")]
    pub(crate) colleges: Vec<String>,
    #[serde(default = "default_wildcard")]
    pub(crate) batches: Vec<String>,
    #[serde(default = "default_wildcard")]
    pub(crate) departments: Vec<String>,
    #[serde(default)]
    pub(crate) instructions: String,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub(crate) start_time: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub(crate) end_time: Option<OffsetDateTime>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AssignmentUpdate {
    pub(crate) colleges: Option<Vec<String>>,
    pub(crate) batches: Option<Vec<String>>,
    pub(crate) departments: Option<Vec<String>>,
    pub(crate) instructions: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub(crate) start_time: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub(crate) end_time: Option<OffsetDateTime>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AssignmentResponse {
    pub(crate) id: String,
    pub(crate) test_id: String,
    pub(crate) test_title: String,
    pub(crate) colleges: Vec<String>,
    pub(crate) batches: Vec<String>,
    pub(crate) departments: Vec<String>,
    pub(crate) instructions: String,
    pub(crate) start_time: Option<String>,
    pub(crate) end_time: Option<String>,
    pub(crate) completed: bool,
    pub(crate) created_at: String,
}

impl AssignmentResponse {
    pub(crate) fn from_db(assignment: Assignment, test_title: String, completed: bool) -> Self {
        Self {
            id: assignment.id,
            test_id: assignment.test_id,
            test_title,
            colleges: assignment.colleges.0,
            batches: assignment.batches.0,
            departments: assignment.departments.0,
            instructions: assignment.instructions,
            start_time: assignment.start_time.map(format_primitive),
            end_time: assignment.end_time.map(format_primitive),
            completed,
            created_at: format_primitive(assignment.created_at),
        }
    }
}

/// Test metadata as seen by an exam taker. The schedule window is the
/// assignment override where present, falling back to the test's own window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct TestMeta {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) duration_minutes: i32,
    pub(crate) status: TestStatus,
    pub(crate) start_time: Option<String>,
    pub(crate) end_time: Option<String>,
}

impl TestMeta {
    pub(crate) fn from_db(test: Test, assignment: &Assignment) -> Self {
        let start_time = assignment.start_time.or(test.start_time);
        let end_time = assignment.end_time.or(test.end_time);
        Self {
            id: test.id,
            title: test.title,
            description: test.description,
            duration_minutes: test.duration_minutes,
            status: test.status,
            start_time: start_time.map(format_primitive),
            end_time: end_time.map(format_primitive),
        }
    }
}

/// Question as rendered to the exam taker. Never carries the answer key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct QuestionPublic {
    pub(crate) id: String,
    pub(crate) kind: QuestionKind,
    pub(crate) question_text: String,
    pub(crate) options: Vec<String>,
    pub(crate) marks: f64,
}

impl QuestionPublic {
    pub(crate) fn from_db(question: Question) -> Self {
        Self {
            id: question.id,
            kind: question.kind,
            question_text: question.question_text,
            options: question.options.0,
            marks: question.marks,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct AssignmentDetailResponse {
    pub(crate) id: String,
    pub(crate) instructions: String,
    pub(crate) test: TestMeta,
    pub(crate) questions: Vec<QuestionPublic>,
}
