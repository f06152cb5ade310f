use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::schemas::assignment::AssignmentDetailResponse;
use crate::schemas::submission::{SubmissionAcceptedResponse, SubmissionCreate};
use crate::session::controller::{ExamQuestion, SessionConfig};

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: String,
}

#[derive(Debug, Error)]
pub(crate) enum SubmitError {
    /// The server refused the submission outright, typically because one
    /// already exists. Never retried.
    #[error("{0}")]
    Rejected(String),
    /// Transient failure; the attempt may be retried.
    #[error("{0}")]
    Failed(String),
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

impl SubmitError {
    pub(crate) fn is_terminal(&self) -> bool {
        matches!(self, SubmitError::Rejected(_))
    }
}

/// Thin client for the attempt endpoints, used by the session controller's
/// host to fetch the locked question set and post the final answers.
#[derive(Debug, Clone)]
pub(crate) struct AttemptClient {
    client: Client,
    base_url: String,
    token: String,
}

impl AttemptClient {
    pub(crate) fn new(base_url: &str, token: String) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client, base_url: base_url.trim_end_matches('/').to_string(), token })
    }

    pub(crate) async fn fetch_assignment(&self, id: &str) -> Result<AssignmentDetailResponse> {
        let response = self
            .client
            .get(format!("{}/assignments/{id}", self.base_url))
            .bearer_auth(&self.token)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = error_detail(response).await;
            anyhow::bail!("assignment fetch failed ({status}): {detail}");
        }

        response.json().await.context("Failed to decode assignment response")
    }

    pub(crate) async fn submit(
        &self,
        payload: &SubmissionCreate,
    ) -> Result<SubmissionAcceptedResponse, SubmitError> {
        let response = self
            .client
            .post(format!("{}/submissions", self.base_url))
            .bearer_auth(&self.token)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return response.json().await.map_err(SubmitError::from);
        }

        let detail = error_detail(response).await;
        if status == StatusCode::BAD_REQUEST {
            Err(SubmitError::Rejected(detail))
        } else {
            Err(SubmitError::Failed(detail))
        }
    }
}

async fn error_detail(response: reqwest::Response) -> String {
    match response.json::<ErrorBody>().await {
        Ok(body) => body.detail,
        Err(_) => "submission failed".to_string(),
    }
}

/// Splits the assignment detail payload into the controller's inputs.
/// Unparseable window timestamps are treated as unbounded.
pub(crate) fn session_inputs(
    detail: AssignmentDetailResponse,
) -> (SessionConfig, Vec<ExamQuestion>) {
    let config = SessionConfig {
        assignment_id: detail.id,
        test_title: detail.test.title,
        status: detail.test.status,
        duration_minutes: detail.test.duration_minutes,
        start_time: detail.test.start_time.as_deref().and_then(parse_rfc3339),
        end_time: detail.test.end_time.as_deref().and_then(parse_rfc3339),
    };

    let questions = detail
        .questions
        .into_iter()
        .map(|q| ExamQuestion {
            id: q.id,
            question_text: q.question_text,
            options: q.options,
            marks: q.marks,
        })
        .collect();

    (config, questions)
}

fn parse_rfc3339(value: &str) -> Option<OffsetDateTime> {
    OffsetDateTime::parse(value, &Rfc3339).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::types::{QuestionKind, TestStatus};
    use crate::schemas::assignment::{QuestionPublic, TestMeta};
    use time::macros::datetime;

    #[test]
    fn session_inputs_parse_window_and_questions() {
        let detail = AssignmentDetailResponse {
            id: "a1".to_string(),
            instructions: String::new(),
            test: TestMeta {
                id: "t1".to_string(),
                title: "Aptitude Round 1".to_string(),
                description: String::new(),
                duration_minutes: 10,
                status: TestStatus::Active,
                start_time: Some("2025-06-01T09:00:00Z".to_string()),
                end_time: Some("not-a-timestamp".to_string()),
            },
            questions: vec![QuestionPublic {
                id: "q1".to_string(),
                kind: QuestionKind::Mcq,
                question_text: "pick one".to_string(),
                options: vec!["a".into(), "b".into()],
                marks: 2.0,
            }],
        };

        let (config, questions) = session_inputs(detail);
        assert_eq!(config.start_time, Some(datetime!(2025-06-01 09:00:00 UTC)));
        assert_eq!(config.end_time, None);
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].marks, 2.0);
    }
}
