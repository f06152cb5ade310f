use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentAdmin;
use crate::api::validation::{validate_payload, validate_question};
use crate::core::state::AppState;
use crate::core::time::{primitive_now_utc, to_primitive_utc};
use crate::db::types::TestStatus;
use crate::repositories;
use crate::schemas::test::{
    QuestionResponse, TestCreate, TestDetailResponse, TestResponse, TestUpdate,
};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create).get(list))
        .route("/:test_id", get(detail).patch(update).delete(remove))
}

/// Creates a test together with its question bank entries in one
/// transaction; `max_marks` is derived from the linked questions.
async fn create(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    Json(payload): Json<TestCreate>,
) -> Result<(StatusCode, Json<TestResponse>), ApiError> {
    validate_payload(&payload)?;
    for question in &payload.questions {
        validate_question(question)?;
    }
    if payload.questions.len() < payload.question_count as usize {
        return Err(ApiError::BadRequest(
            "question_count exceeds the number of supplied questions".to_string(),
        ));
    }

    let now = primitive_now_utc();
    let test_id = Uuid::new_v4().to_string();

    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    repositories::tests::create(
        &mut *tx,
        repositories::tests::CreateTest {
            id: &test_id,
            title: &payload.title,
            description: &payload.description,
            duration_minutes: payload.duration_minutes,
            question_count: payload.question_count,
            status: payload.status.unwrap_or(TestStatus::Active),
            start_time: payload.start_time.map(to_primitive_utc),
            end_time: payload.end_time.map(to_primitive_utc),
            created_by: &admin.id,
            created_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create test"))?;

    let mut question_ids = Vec::with_capacity(payload.questions.len());
    for question in &payload.questions {
        let question_id = Uuid::new_v4().to_string();
        repositories::questions::create(
            &mut *tx,
            repositories::questions::CreateQuestion {
                id: &question_id,
                kind: question.kind,
                question_text: &question.question_text,
                options: question.options.clone(),
                correct_answer: &question.correct_answer,
                marks: question.marks,
                category: &question.category,
                created_by: &admin.id,
                created_at: now,
            },
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to create question"))?;
        question_ids.push(question_id);
    }

    repositories::tests::link_questions(&mut *tx, &test_id, &question_ids)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to link questions"))?;
    repositories::tests::refresh_max_marks(&mut *tx, &test_id, now)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to compute max marks"))?;

    let test = repositories::tests::find_by_id(&mut *tx, &test_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to reload test"))?
        .ok_or_else(|| ApiError::Internal("Test vanished during creation".to_string()))?;

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit test"))?;

    Ok((StatusCode::CREATED, Json(TestResponse::from_db(test))))
}

async fn list(
    State(state): State<AppState>,
    CurrentAdmin(_): CurrentAdmin,
) -> Result<Json<Vec<TestResponse>>, ApiError> {
    let tests = repositories::tests::list(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list tests"))?;

    Ok(Json(tests.into_iter().map(TestResponse::from_db).collect()))
}

async fn detail(
    State(state): State<AppState>,
    CurrentAdmin(_): CurrentAdmin,
    Path(test_id): Path<String>,
) -> Result<Json<TestDetailResponse>, ApiError> {
    let test = repositories::tests::find_by_id(state.db(), &test_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch test"))?
        .ok_or_else(|| ApiError::NotFound("Test not found".to_string()))?;

    let questions = repositories::questions::list_by_test(state.db(), &test_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch questions"))?;

    Ok(Json(TestDetailResponse {
        test: TestResponse::from_db(test),
        questions: questions.into_iter().map(QuestionResponse::from_db).collect(),
    }))
}

/// Updates test metadata and, when `questions` is supplied, replaces the
/// linked question set and recomputes `max_marks`.
async fn update(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    Path(test_id): Path<String>,
    Json(payload): Json<TestUpdate>,
) -> Result<Json<TestResponse>, ApiError> {
    validate_payload(&payload)?;
    if let Some(questions) = &payload.questions {
        for question in questions {
            validate_question(question)?;
        }
    }

    let now = primitive_now_utc();

    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    let updated = repositories::tests::update(
        &mut *tx,
        &test_id,
        repositories::tests::UpdateTest {
            title: payload.title,
            description: payload.description,
            duration_minutes: payload.duration_minutes,
            question_count: payload.question_count,
            status: payload.status,
            start_time: payload.start_time.map(to_primitive_utc),
            end_time: payload.end_time.map(to_primitive_utc),
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update test"))?
    .ok_or_else(|| ApiError::NotFound("Test not found".to_string()))?;

    let test = if let Some(questions) = payload.questions {
        if questions.len() < updated.question_count as usize {
            return Err(ApiError::BadRequest(
                "question_count exceeds the number of supplied questions".to_string(),
            ));
        }

        repositories::tests::unlink_questions(&mut *tx, &test_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to unlink questions"))?;

        let mut question_ids = Vec::with_capacity(questions.len());
        for question in &questions {
            let question_id = Uuid::new_v4().to_string();
            repositories::questions::create(
                &mut *tx,
                repositories::questions::CreateQuestion {
                    id: &question_id,
                    kind: question.kind,
                    question_text: &question.question_text,
                    options: question.options.clone(),
                    correct_answer: &question.correct_answer,
                    marks: question.marks,
                    category: &question.category,
                    created_by: &admin.id,
                    created_at: now,
                },
            )
            .await
            .map_err(|e| ApiError::internal(e, "Failed to create question"))?;
            question_ids.push(question_id);
        }

        repositories::tests::link_questions(&mut *tx, &test_id, &question_ids)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to link questions"))?;
        repositories::tests::refresh_max_marks(&mut *tx, &test_id, now)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to compute max marks"))?;

        repositories::tests::find_by_id(&mut *tx, &test_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to reload test"))?
            .ok_or_else(|| ApiError::Internal("Test vanished during update".to_string()))?
    } else {
        updated
    };

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit test"))?;

    Ok(Json(TestResponse::from_db(test)))
}

async fn remove(
    State(state): State<AppState>,
    CurrentAdmin(_): CurrentAdmin,
    Path(test_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let deleted = repositories::tests::delete(state.db(), &test_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete test"))?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Test not found".to_string()))
    }
}
