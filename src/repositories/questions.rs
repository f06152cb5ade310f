use std::collections::HashMap;

use sqlx::types::Json;
use sqlx::PgPool;

use crate::db::models::Question;
use crate::db::types::QuestionKind;

const COLUMNS: &str = "\
    id, kind, question_text, options, correct_answer, marks, category, \
    created_by, created_at, updated_at";

pub(crate) struct CreateQuestion<'a> {
    pub(crate) id: &'a str,
    pub(crate) kind: QuestionKind,
    pub(crate) question_text: &'a str,
    pub(crate) options: Vec<String>,
    pub(crate) correct_answer: &'a str,
    pub(crate) marks: f64,
    pub(crate) category: &'a str,
    pub(crate) created_by: &'a str,
    pub(crate) created_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateQuestion<'_>,
) -> Result<Question, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "INSERT INTO questions (
            id, kind, question_text, options, correct_answer, marks, category,
            created_by, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10)
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.kind)
    .bind(params.question_text)
    .bind(Json(params.options))
    .bind(params.correct_answer)
    .bind(params.marks)
    .bind(params.category)
    .bind(params.created_by)
    .bind(params.created_at)
    .bind(params.created_at)
    .fetch_one(executor)
    .await
}

pub(crate) async fn list_by_test(
    executor: impl sqlx::PgExecutor<'_>,
    test_id: &str,
) -> Result<Vec<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "SELECT {COLUMNS} FROM questions \
         WHERE id IN (SELECT question_id FROM test_questions WHERE test_id = $1)"
    ))
    .bind(test_id)
    .fetch_all(executor)
    .await
}

/// Fetches questions and returns them in the order of `ids`. Ids that no
/// longer resolve to a question are skipped.
pub(crate) async fn find_by_ids_ordered(
    pool: &PgPool,
    ids: &[String],
) -> Result<Vec<Question>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let rows = sqlx::query_as::<_, Question>(&format!(
        "SELECT {COLUMNS} FROM questions WHERE id = ANY($1)"
    ))
    .bind(ids)
    .fetch_all(pool)
    .await?;

    let mut by_id: HashMap<String, Question> =
        rows.into_iter().map(|q| (q.id.clone(), q)).collect();

    Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
}
