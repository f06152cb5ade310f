use sqlx::types::Json;
use sqlx::PgPool;

use crate::db::models::Assignment;

const COLUMNS: &str = "\
    id, test_id, colleges, batches, departments, instructions, \
    start_time, end_time, created_by, created_at, updated_at";

pub(crate) struct CreateAssignment<'a> {
    pub(crate) id: &'a str,
    pub(crate) test_id: &'a str,
    pub(crate) colleges: Vec<String>,
    pub(crate) batches: Vec<String>,
    pub(crate) departments: Vec<String>,
    pub(crate) instructions: &'a str,
    pub(crate) start_time: Option<time::PrimitiveDateTime>,
    pub(crate) end_time: Option<time::PrimitiveDateTime>,
    pub(crate) created_by: &'a str,
    pub(crate) created_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateAssignment<'_>,
) -> Result<Assignment, sqlx::Error> {
    sqlx::query_as::<_, Assignment>(&format!(
        "INSERT INTO assignments (
            id, test_id, colleges, batches, departments, instructions,
            start_time, end_time, created_by, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11)
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.test_id)
    .bind(Json(params.colleges))
    .bind(Json(params.batches))
    .bind(Json(params.departments))
    .bind(params.instructions)
    .bind(params.start_time)
    .bind(params.end_time)
    .bind(params.created_by)
    .bind(params.created_at)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_by_id(
    pool: &PgPool,
    id: &str,
) -> Result<Option<Assignment>, sqlx::Error> {
    sqlx::query_as::<_, Assignment>(&format!("SELECT {COLUMNS} FROM assignments WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list(pool: &PgPool) -> Result<Vec<Assignment>, sqlx::Error> {
    sqlx::query_as::<_, Assignment>(&format!(
        "SELECT {COLUMNS} FROM assignments ORDER BY created_at DESC"
    ))
    .fetch_all(pool)
    .await
}

pub(crate) struct UpdateAssignment {
    pub(crate) colleges: Option<Vec<String>>,
    pub(crate) batches: Option<Vec<String>>,
    pub(crate) departments: Option<Vec<String>>,
    pub(crate) instructions: Option<String>,
    pub(crate) start_time: Option<time::PrimitiveDateTime>,
    pub(crate) end_time: Option<time::PrimitiveDateTime>,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateAssignment,
) -> Result<Option<Assignment>, sqlx::Error> {
    sqlx::query_as::<_, Assignment>(&format!(
        "UPDATE assignments SET
            colleges = COALESCE($1, colleges),
            batches = COALESCE($2, batches),
            departments = COALESCE($3, departments),
            instructions = COALESCE($4, instructions),
            start_time = COALESCE($5, start_time),
            end_time = COALESCE($6, end_time),
            updated_at = $7
         WHERE id = $8
         RETURNING {COLUMNS}",
    ))
    .bind(params.colleges.map(Json))
    .bind(params.batches.map(Json))
    .bind(params.departments.map(Json))
    .bind(params.instructions)
    .bind(params.start_time)
    .bind(params.end_time)
    .bind(params.updated_at)
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("DELETE FROM assignments WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}
