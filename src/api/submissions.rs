use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAdmin, CurrentUser};
use crate::api::validation::validate_payload;
use crate::core::state::AppState;
use crate::core::time::{format_primitive, primitive_now_utc};
use crate::repositories;
use crate::schemas::submission::{
    AnalysisResponse, CategoryStats, SubmissionAcceptedResponse, SubmissionCreate,
    SubmissionResponse,
};
use crate::services::scoring;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(submit))
        .route("/my/:assignment_id", get(my_submission))
        .route("/assignment/:assignment_id", get(by_assignment))
        .route("/analysis/:assignment_id", get(analysis))
}

/// Accepts the one and only submission for the caller's attempt. Scoring
/// runs against the locked question order, never the live pool.
async fn submit(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<SubmissionCreate>,
) -> Result<(StatusCode, Json<SubmissionAcceptedResponse>), ApiError> {
    validate_payload(&payload)?;

    let assignment = repositories::assignments::find_by_id(state.db(), &payload.assignment_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch assignment"))?
        .ok_or_else(|| ApiError::NotFound("Assignment not found".to_string()))?;

    let test = repositories::tests::find_by_id(state.db(), &assignment.test_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch test"))?
        .ok_or_else(|| ApiError::NotFound("Test not found".to_string()))?;

    let existing = repositories::submissions::find_by_pair(state.db(), &user.id, &assignment.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check existing submission"))?;
    if existing.is_some() {
        return Err(ApiError::BadRequest("Already submitted this test".to_string()));
    }

    let attempt = repositories::attempts::find_by_pair(state.db(), &user.id, &assignment.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch attempt"))?
        .ok_or_else(|| ApiError::NotFound("No attempt found for this assignment".to_string()))?;

    let locked_questions =
        repositories::questions::find_by_ids_ordered(state.db(), &attempt.question_order.0)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load locked questions"))?;

    let answers: Vec<(String, Vec<String>)> = payload
        .answers
        .iter()
        .map(|a| (a.question.clone(), a.selected_options.clone()))
        .collect();

    let (graded, total_score) = scoring::grade(&locked_questions, &answers);
    let max_score = test.max_marks;
    let percentage = scoring::percentage(total_score, max_score);

    let now = primitive_now_utc();
    let created = repositories::submissions::create_if_absent(
        state.db(),
        repositories::submissions::CreateSubmission {
            id: &Uuid::new_v4().to_string(),
            assignment_id: &assignment.id,
            test_id: &test.id,
            student_id: &user.id,
            answers: graded,
            total_score,
            max_score,
            percentage,
            auto_submitted: payload.auto_submitted,
            submitted_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to persist submission"))?;

    if !created {
        // Lost a concurrent submit race; the winner's record stands.
        return Err(ApiError::BadRequest("Already submitted this test".to_string()));
    }

    repositories::attempts::mark_submitted(state.db(), &user.id, &assignment.id, now)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to close attempt"))?;

    metrics::counter!("submissions_total", "auto" => payload.auto_submitted.to_string())
        .increment(1);

    Ok((
        StatusCode::CREATED,
        Json(SubmissionAcceptedResponse {
            message: "Test submitted successfully".to_string(),
            test_title: test.title,
        }),
    ))
}

async fn my_submission(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(assignment_id): Path<String>,
) -> Result<Json<SubmissionResponse>, ApiError> {
    let submission = repositories::submissions::find_by_pair(state.db(), &user.id, &assignment_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch submission"))?
        .ok_or_else(|| ApiError::NotFound("Submission not found".to_string()))?;

    Ok(Json(SubmissionResponse::from_db(submission)))
}

async fn by_assignment(
    State(state): State<AppState>,
    CurrentAdmin(_): CurrentAdmin,
    Path(assignment_id): Path<String>,
) -> Result<Json<Vec<SubmissionResponse>>, ApiError> {
    let submissions = repositories::submissions::list_by_assignment(state.db(), &assignment_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list submissions"))?;

    Ok(Json(submissions.into_iter().map(SubmissionResponse::from_db).collect()))
}

/// Per-category correctness breakdown for the caller's own submission.
async fn analysis(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(assignment_id): Path<String>,
) -> Result<Json<AnalysisResponse>, ApiError> {
    let submission = repositories::submissions::find_by_pair(state.db(), &user.id, &assignment_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch submission"))?
        .ok_or_else(|| ApiError::NotFound("Submission not found".to_string()))?;

    let test = repositories::tests::find_by_id(state.db(), &submission.test_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch test"))?
        .ok_or_else(|| ApiError::NotFound("Test not found".to_string()))?;

    let question_ids: Vec<String> =
        submission.answers.0.iter().map(|a| a.question.clone()).collect();
    let questions = repositories::questions::find_by_ids_ordered(state.db(), &question_ids)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load questions"))?;
    let categories_by_id: BTreeMap<&str, (&str, f64)> = questions
        .iter()
        .map(|q| (q.id.as_str(), (q.category.as_str(), q.marks)))
        .collect();

    let mut attempted = 0;
    let mut correct = 0;
    let mut categories: BTreeMap<String, CategoryStats> = BTreeMap::new();

    for answer in &submission.answers.0 {
        let (category, marks) = categories_by_id
            .get(answer.question.as_str())
            .copied()
            .unwrap_or(("general", 0.0));
        let stats = categories.entry(category.to_string()).or_default();

        stats.total += 1;
        stats.marks_available += marks;
        stats.marks_awarded += answer.marks_awarded;

        if !answer.selected_options.is_empty() {
            attempted += 1;
        }
        if answer.is_correct {
            correct += 1;
            stats.correct += 1;
        }
    }

    let total = submission.answers.0.len() as u32;
    Ok(Json(AnalysisResponse {
        test_title: test.title,
        submitted_at: format_primitive(submission.submitted_at),
        total_score: submission.total_score,
        max_score: submission.max_score,
        percentage: submission.percentage,
        attempted,
        correct,
        incorrect: attempted - correct,
        unattempted: total - attempted,
        categories,
    }))
}
