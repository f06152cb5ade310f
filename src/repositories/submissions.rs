use std::collections::HashSet;

use sqlx::types::Json;
use sqlx::PgPool;

use crate::db::models::{GradedAnswer, Submission};

const COLUMNS: &str = "\
    id, assignment_id, test_id, student_id, answers, total_score, \
    max_score, percentage, auto_submitted, submitted_at";

pub(crate) struct CreateSubmission<'a> {
    pub(crate) id: &'a str,
    pub(crate) assignment_id: &'a str,
    pub(crate) test_id: &'a str,
    pub(crate) student_id: &'a str,
    pub(crate) answers: Vec<GradedAnswer>,
    pub(crate) total_score: f64,
    pub(crate) max_score: f64,
    pub(crate) percentage: f64,
    pub(crate) auto_submitted: bool,
    pub(crate) submitted_at: time::PrimitiveDateTime,
}

/// Write-once insert. Returns false when a submission already exists for
/// the (student, assignment) pair; the stored row is never overwritten.
pub(crate) async fn create_if_absent(
    pool: &PgPool,
    params: CreateSubmission<'_>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO submissions (
            id, assignment_id, test_id, student_id, answers,
            total_score, max_score, percentage, auto_submitted, submitted_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10)
        ON CONFLICT DO NOTHING",
    )
    .bind(params.id)
    .bind(params.assignment_id)
    .bind(params.test_id)
    .bind(params.student_id)
    .bind(Json(params.answers))
    .bind(params.total_score)
    .bind(params.max_score)
    .bind(params.percentage)
    .bind(params.auto_submitted)
    .bind(params.submitted_at)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub(crate) async fn find_by_pair(
    pool: &PgPool,
    student_id: &str,
    assignment_id: &str,
) -> Result<Option<Submission>, sqlx::Error> {
    sqlx::query_as::<_, Submission>(&format!(
        "SELECT {COLUMNS} FROM submissions \
         WHERE student_id = $1 AND assignment_id = $2"
    ))
    .bind(student_id)
    .bind(assignment_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn list_by_assignment(
    pool: &PgPool,
    assignment_id: &str,
) -> Result<Vec<Submission>, sqlx::Error> {
    sqlx::query_as::<_, Submission>(&format!(
        "SELECT {COLUMNS} FROM submissions \
         WHERE assignment_id = $1 ORDER BY submitted_at DESC"
    ))
    .bind(assignment_id)
    .fetch_all(pool)
    .await
}

/// Assignment ids the student has already submitted for, used to annotate
/// assignment listings.
pub(crate) async fn completed_assignment_ids(
    pool: &PgPool,
    student_id: &str,
) -> Result<HashSet<String>, sqlx::Error> {
    let ids: Vec<String> =
        sqlx::query_scalar("SELECT assignment_id FROM submissions WHERE student_id = $1")
            .bind(student_id)
            .fetch_all(pool)
            .await?;
    Ok(ids.into_iter().collect())
}
