use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{GradedAnswer, Submission};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct AnswerIn {
    pub(crate) question: String,
    #[serde(default)]
    pub(crate) selected_options: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub(crate) struct SubmissionCreate {
    #[validate(length(min = 1))]
    pub(crate) assignment_id: String,
    #[serde(default)]
    pub(crate) answers: Vec<AnswerIn>,
    #[serde(default)]
    pub(crate) auto_submitted: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct SubmissionAcceptedResponse {
    pub(crate) message: String,
    pub(crate) test_title: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct GradedAnswerResponse {
    pub(crate) question: String,
    pub(crate) selected_options: Vec<String>,
    pub(crate) is_correct: bool,
    pub(crate) marks_awarded: f64,
}

impl GradedAnswerResponse {
    pub(crate) fn from_db(answer: GradedAnswer) -> Self {
        Self {
            question: answer.question,
            selected_options: answer.selected_options,
            is_correct: answer.is_correct,
            marks_awarded: answer.marks_awarded,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmissionResponse {
    pub(crate) id: String,
    pub(crate) assignment_id: String,
    pub(crate) test_id: String,
    pub(crate) student_id: String,
    pub(crate) answers: Vec<GradedAnswerResponse>,
    pub(crate) total_score: f64,
    pub(crate) max_score: f64,
    pub(crate) percentage: f64,
    pub(crate) auto_submitted: bool,
    pub(crate) submitted_at: String,
}

impl SubmissionResponse {
    pub(crate) fn from_db(submission: Submission) -> Self {
        Self {
            id: submission.id,
            assignment_id: submission.assignment_id,
            test_id: submission.test_id,
            student_id: submission.student_id,
            answers: submission
                .answers
                .0
                .into_iter()
                .map(GradedAnswerResponse::from_db)
                .collect(),
            total_score: submission.total_score,
            max_score: submission.max_score,
            percentage: submission.percentage,
            auto_submitted: submission.auto_submitted,
            submitted_at: format_primitive(submission.submitted_at),
        }
    }
}

#[derive(Debug, Default, Serialize)]
pub(crate) struct CategoryStats {
    pub(crate) total: u32,
    pub(crate) correct: u32,
    pub(crate) marks_awarded: f64,
    pub(crate) marks_available: f64,
}

#[derive(Debug, Serialize)]
pub(crate) struct AnalysisResponse {
    pub(crate) test_title: String,
    pub(crate) submitted_at: String,
    pub(crate) total_score: f64,
    pub(crate) max_score: f64,
    pub(crate) percentage: f64,
    pub(crate) attempted: u32,
    pub(crate) correct: u32,
    pub(crate) incorrect: u32,
    pub(crate) unattempted: u32,
    pub(crate) categories: BTreeMap<String, CategoryStats>,
}
