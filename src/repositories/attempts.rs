use sqlx::types::Json;
use sqlx::PgPool;

use crate::db::models::StudentAttempt;
use crate::db::types::AttemptStatus;

const COLUMNS: &str = "\
    id, student_id, assignment_id, question_order, status, created_at, updated_at";

pub(crate) async fn find_by_pair(
    pool: &PgPool,
    student_id: &str,
    assignment_id: &str,
) -> Result<Option<StudentAttempt>, sqlx::Error> {
    sqlx::query_as::<_, StudentAttempt>(&format!(
        "SELECT {COLUMNS} FROM student_attempts \
         WHERE student_id = $1 AND assignment_id = $2"
    ))
    .bind(student_id)
    .bind(assignment_id)
    .fetch_optional(pool)
    .await
}

/// Inserts the locked question selection. Returns false when another writer
/// already holds the (student, assignment) slot; the caller re-reads the
/// winning row in that case.
pub(crate) async fn create(
    pool: &PgPool,
    id: &str,
    student_id: &str,
    assignment_id: &str,
    question_order: Vec<String>,
    now: time::PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO student_attempts (
            id, student_id, assignment_id, question_order, status, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7)
        ON CONFLICT DO NOTHING",
    )
    .bind(id)
    .bind(student_id)
    .bind(assignment_id)
    .bind(Json(question_order))
    .bind(AttemptStatus::NotStarted)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub(crate) async fn mark_in_progress(
    pool: &PgPool,
    student_id: &str,
    assignment_id: &str,
    now: time::PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE student_attempts SET status = $1, updated_at = $2 \
         WHERE student_id = $3 AND assignment_id = $4 AND status = $5",
    )
    .bind(AttemptStatus::InProgress)
    .bind(now)
    .bind(student_id)
    .bind(assignment_id)
    .bind(AttemptStatus::NotStarted)
    .execute(pool)
    .await?;
    Ok(())
}

pub(crate) async fn mark_submitted(
    pool: &PgPool,
    student_id: &str,
    assignment_id: &str,
    now: time::PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE student_attempts SET status = $1, updated_at = $2 \
         WHERE student_id = $3 AND assignment_id = $4",
    )
    .bind(AttemptStatus::Submitted)
    .bind(now)
    .bind(student_id)
    .bind(assignment_id)
    .execute(pool)
    .await?;
    Ok(())
}
