use sqlx::PgPool;

use crate::db::models::Test;
use crate::db::types::TestStatus;

const COLUMNS: &str = "\
    id, title, description, duration_minutes, question_count, max_marks, \
    status, start_time, end_time, created_by, created_at, updated_at";

pub(crate) struct CreateTest<'a> {
    pub(crate) id: &'a str,
    pub(crate) title: &'a str,
    pub(crate) description: &'a str,
    pub(crate) duration_minutes: i32,
    pub(crate) question_count: i32,
    pub(crate) status: TestStatus,
    pub(crate) start_time: Option<time::PrimitiveDateTime>,
    pub(crate) end_time: Option<time::PrimitiveDateTime>,
    pub(crate) created_by: &'a str,
    pub(crate) created_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateTest<'_>,
) -> Result<Test, sqlx::Error> {
    sqlx::query_as::<_, Test>(&format!(
        "INSERT INTO tests (
            id, title, description, duration_minutes, question_count, max_marks,
            status, start_time, end_time, created_by, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,0,$6,$7,$8,$9,$10,$11)
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.title)
    .bind(params.description)
    .bind(params.duration_minutes)
    .bind(params.question_count)
    .bind(params.status)
    .bind(params.start_time)
    .bind(params.end_time)
    .bind(params.created_by)
    .bind(params.created_at)
    .bind(params.created_at)
    .fetch_one(executor)
    .await
}

pub(crate) async fn find_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<Test>, sqlx::Error> {
    sqlx::query_as::<_, Test>(&format!("SELECT {COLUMNS} FROM tests WHERE id = $1"))
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub(crate) async fn list(pool: &PgPool) -> Result<Vec<Test>, sqlx::Error> {
    sqlx::query_as::<_, Test>(&format!("SELECT {COLUMNS} FROM tests ORDER BY created_at DESC"))
        .fetch_all(pool)
        .await
}

pub(crate) struct UpdateTest {
    pub(crate) title: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) duration_minutes: Option<i32>,
    pub(crate) question_count: Option<i32>,
    pub(crate) status: Option<TestStatus>,
    pub(crate) start_time: Option<time::PrimitiveDateTime>,
    pub(crate) end_time: Option<time::PrimitiveDateTime>,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn update(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    params: UpdateTest,
) -> Result<Option<Test>, sqlx::Error> {
    sqlx::query_as::<_, Test>(&format!(
        "UPDATE tests SET
            title = COALESCE($1, title),
            description = COALESCE($2, description),
            duration_minutes = COALESCE($3, duration_minutes),
            question_count = COALESCE($4, question_count),
            status = COALESCE($5, status),
            start_time = COALESCE($6, start_time),
            end_time = COALESCE($7, end_time),
            updated_at = $8
         WHERE id = $9
         RETURNING {COLUMNS}",
    ))
    .bind(params.title)
    .bind(params.description)
    .bind(params.duration_minutes)
    .bind(params.question_count)
    .bind(params.status)
    .bind(params.start_time)
    .bind(params.end_time)
    .bind(params.updated_at)
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM tests WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn link_questions(
    executor: impl sqlx::PgExecutor<'_>,
    test_id: &str,
    question_ids: &[String],
) -> Result<(), sqlx::Error> {
    if question_ids.is_empty() {
        return Ok(());
    }

    let mut builder = sqlx::QueryBuilder::<sqlx::Postgres>::new(
        "INSERT INTO test_questions (test_id, question_id) ",
    );
    builder.push_values(question_ids, |mut row, question_id| {
        row.push_bind(test_id);
        row.push_bind(question_id);
    });
    builder.push(" ON CONFLICT DO NOTHING");
    builder.build().execute(executor).await?;
    Ok(())
}

pub(crate) async fn unlink_questions(
    executor: impl sqlx::PgExecutor<'_>,
    test_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM test_questions WHERE test_id = $1")
        .bind(test_id)
        .execute(executor)
        .await?;
    Ok(())
}

/// Recomputes `max_marks` from the currently linked questions.
pub(crate) async fn refresh_max_marks(
    executor: impl sqlx::PgExecutor<'_>,
    test_id: &str,
    updated_at: time::PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE tests SET
            max_marks = COALESCE((
                SELECT SUM(q.marks) FROM questions q
                JOIN test_questions tq ON tq.question_id = q.id
                WHERE tq.test_id = $1
            ), 0),
            updated_at = $2
         WHERE id = $1",
    )
    .bind(test_id)
    .bind(updated_at)
    .execute(executor)
    .await?;
    Ok(())
}
