use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{Question, Test};
use crate::db::types::{QuestionKind, TestStatus};

fn default_marks() -> f64 {
    1.0
}

fn default_category() -> String {
    "general".to_string()
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuestionCreate {
    pub(crate) kind: QuestionKind,
    #[validate(length(min = 1))]
    pub(crate) question_text: String,
    #[serde(default)]
    pub(crate) options: Vec<String>,
    #[serde(default)]
    pub(crate) correct_answer: String,
    #[serde(default = "default_marks")]
    pub(crate) marks: f64,
    #[serde(default = "default_category")]
    pub(crate) category: String,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct TestCreate {
    #[validate(length(min = 1, max = 255))]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: String,
    #[validate(range(min = 1))]
    pub(crate) duration_minutes: i32,
    #[validate(range(min = 1))]
    pub(crate) question_count: i32,
    #[serde(default)]
    pub(crate) status: Option<TestStatus>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub(crate) start_time: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub(crate) end_time: Option<OffsetDateTime>,
    #[validate(nested)]
    pub(crate) questions: Vec<QuestionCreate>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct TestUpdate {
    #[validate(length(min = 1, max = 255))]
    pub(crate) title: Option<String>,
    pub(crate) description: Option<String>,
    #[validate(range(min = 1))]
    pub(crate) duration_minutes: Option<i32>,
    #[validate(range(min = 1))]
    pub(crate) question_count: Option<i32>,
    pub(crate) status: Option<TestStatus>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub(crate) start_time: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub(crate) end_time: Option<OffsetDateTime>,
    /// When present, replaces the linked question set wholesale.
    #[validate(nested)]
    pub(crate) questions: Option<Vec<QuestionCreate>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct TestResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) duration_minutes: i32,
    pub(crate) question_count: i32,
    pub(crate) max_marks: f64,
    pub(crate) status: TestStatus,
    pub(crate) start_time: Option<String>,
    pub(crate) end_time: Option<String>,
    pub(crate) created_at: String,
}

impl TestResponse {
    pub(crate) fn from_db(test: Test) -> Self {
        Self {
            id: test.id,
            title: test.title,
            description: test.description,
            duration_minutes: test.duration_minutes,
            question_count: test.question_count,
            max_marks: test.max_marks,
            status: test.status,
            start_time: test.start_time.map(format_primitive),
            end_time: test.end_time.map(format_primitive),
            created_at: format_primitive(test.created_at),
        }
    }
}

/// Admin view of a bank question, answer key included.
#[derive(Debug, Serialize)]
pub(crate) struct QuestionResponse {
    pub(crate) id: String,
    pub(crate) kind: QuestionKind,
    pub(crate) question_text: String,
    pub(crate) options: Vec<String>,
    pub(crate) correct_answer: String,
    pub(crate) marks: f64,
    pub(crate) category: String,
}

impl QuestionResponse {
    pub(crate) fn from_db(question: Question) -> Self {
        Self {
            id: question.id,
            kind: question.kind,
            question_text: question.question_text,
            options: question.options.0,
            correct_answer: question.correct_answer,
            marks: question.marks,
            category: question.category,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct TestDetailResponse {
    #[serde(flatten)]
    pub(crate) test: TestResponse,
    pub(crate) questions: Vec<QuestionResponse>,
}
