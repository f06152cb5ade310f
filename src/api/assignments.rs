use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAdmin, CurrentUser};
use crate::api::validation::validate_payload;
use crate::core::state::AppState;
use crate::core::time::{primitive_now_utc, to_primitive_utc};
use crate::db::models::{Assignment, StudentAttempt, User};
use crate::db::types::{AttemptStatus, UserRole};
use crate::repositories;
use crate::schemas::assignment::{
    AssignmentCreate, AssignmentDetailResponse, AssignmentResponse, AssignmentUpdate,
    QuestionPublic, TestMeta,
};
use crate::services::targeting;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:assignment_id", get(detail).patch(update).delete(remove))
}

/// Assignments visible to the caller. Students see only those targeting
/// their college/batch/department, annotated with completion; admins see
/// everything.
async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<AssignmentResponse>>, ApiError> {
    let assignments = repositories::assignments::list(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list assignments"))?;

    let completed = repositories::submissions::completed_assignment_ids(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load submission history"))?;

    let mut out = Vec::new();
    for assignment in assignments {
        if user.role != UserRole::Admin && !targeting::matches(&assignment, &user) {
            continue;
        }

        let test = repositories::tests::find_by_id(state.db(), &assignment.test_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch test"))?;
        let Some(test) = test else {
            continue;
        };

        let done = completed.contains(&assignment.id);
        out.push(AssignmentResponse::from_db(assignment, test.title, done));
    }

    Ok(Json(out))
}

/// Returns the assignment with the caller's locked question set, creating
/// the lock on first access. Repeated calls always return the same
/// questions in the same order.
async fn detail(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(assignment_id): Path<String>,
) -> Result<Json<AssignmentDetailResponse>, ApiError> {
    let assignment = repositories::assignments::find_by_id(state.db(), &assignment_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch assignment"))?
        .ok_or_else(|| ApiError::NotFound("Assignment not found".to_string()))?;

    if user.role != UserRole::Admin && !targeting::matches(&assignment, &user) {
        return Err(ApiError::NotFound("Assignment not found".to_string()));
    }

    let test = repositories::tests::find_by_id(state.db(), &assignment.test_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch test"))?
        .ok_or_else(|| ApiError::NotFound("Test not found".to_string()))?;

    let attempt = locked_attempt(&state, &user, &assignment, test.question_count).await?;

    let questions =
        repositories::questions::find_by_ids_ordered(state.db(), &attempt.question_order.0)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load locked questions"))?;

    let response = AssignmentDetailResponse {
        id: assignment.id.clone(),
        instructions: assignment.instructions.clone(),
        test: TestMeta::from_db(test, &assignment),
        questions: questions.into_iter().map(QuestionPublic::from_db).collect(),
    };

    Ok(Json(response))
}

/// Get-or-create for the (student, assignment) lock record. A losing
/// concurrent writer re-reads the winner's row instead of failing.
async fn locked_attempt(
    state: &AppState,
    user: &User,
    assignment: &Assignment,
    question_count: i32,
) -> Result<StudentAttempt, ApiError> {
    if let Some(attempt) =
        repositories::attempts::find_by_pair(state.db(), &user.id, &assignment.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch attempt"))?
    {
        // A re-fetch of an unstarted lock means the student is back in the
        // exam view.
        if attempt.status == AttemptStatus::NotStarted {
            repositories::attempts::mark_in_progress(
                state.db(),
                &user.id,
                &assignment.id,
                primitive_now_utc(),
            )
            .await
            .map_err(|e| ApiError::internal(e, "Failed to update attempt status"))?;
        }
        return Ok(attempt);
    }

    let pool = repositories::questions::list_by_test(state.db(), &assignment.test_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load question pool"))?;

    let mut rng = StdRng::from_entropy();
    let sample_size = (question_count.max(0) as usize).min(pool.len());
    let question_order: Vec<String> =
        pool.choose_multiple(&mut rng, sample_size).map(|q| q.id.clone()).collect();

    let created = repositories::attempts::create(
        state.db(),
        &Uuid::new_v4().to_string(),
        &user.id,
        &assignment.id,
        question_order,
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create attempt"))?;

    if !created {
        tracing::debug!(
            student_id = %user.id,
            assignment_id = %assignment.id,
            "lost attempt-creation race, reusing winner"
        );
    }

    repositories::attempts::find_by_pair(state.db(), &user.id, &assignment.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to reload attempt"))?
        .ok_or_else(|| ApiError::Internal("Attempt vanished after creation".to_string()))
}

async fn create(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    Json(payload): Json<AssignmentCreate>,
) -> Result<(StatusCode, Json<AssignmentResponse>), ApiError> {
    validate_payload(&payload)?;

    let test = repositories::tests::find_by_id(state.db(), &payload.test_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch test"))?
        .ok_or_else(|| ApiError::NotFound("Test not found".to_string()))?;

    let assignment = repositories::assignments::create(
        state.db(),
        repositories::assignments::CreateAssignment {
            id: &Uuid::new_v4().to_string(),
            test_id: &payload.test_id,
            colleges: payload.colleges,
            batches: payload.batches,
            departments: payload.departments,
            instructions: &payload.instructions,
            start_time: payload.start_time.map(to_primitive_utc),
            end_time: payload.end_time.map(to_primitive_utc),
            created_by: &admin.id,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create assignment"))?;

    Ok((StatusCode::CREATED, Json(AssignmentResponse::from_db(assignment, test.title, false))))
}

async fn update(
    State(state): State<AppState>,
    CurrentAdmin(_): CurrentAdmin,
    Path(assignment_id): Path<String>,
    Json(payload): Json<AssignmentUpdate>,
) -> Result<Json<AssignmentResponse>, ApiError> {
    let updated = repositories::assignments::update(
        state.db(),
        &assignment_id,
        repositories::assignments::UpdateAssignment {
            colleges: payload.colleges,
            batches: payload.batches,
            departments: payload.departments,
            instructions: payload.instructions,
            start_time: payload.start_time.map(to_primitive_utc),
            end_time: payload.end_time.map(to_primitive_utc),
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update assignment"))?
    .ok_or_else(|| ApiError::NotFound("Assignment not found".to_string()))?;

    let test = repositories::tests::find_by_id(state.db(), &updated.test_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch test"))?
        .ok_or_else(|| ApiError::NotFound("Test not found".to_string()))?;

    Ok(Json(AssignmentResponse::from_db(updated, test.title, false)))
}

async fn remove(
    State(state): State<AppState>,
    CurrentAdmin(_): CurrentAdmin,
    Path(assignment_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let deleted = repositories::assignments::delete(state.db(), &assignment_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete assignment"))?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Assignment not found".to_string()))
    }
}
