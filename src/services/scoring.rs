use std::collections::HashMap;

use crate::db::models::{GradedAnswer, Question};

/// Grades submitted answers against the locked question set. Every locked
/// question gets a graded entry; answers for ids outside the locked set are
/// ignored.
pub(crate) fn grade(
    locked_questions: &[Question],
    answers: &[(String, Vec<String>)],
) -> (Vec<GradedAnswer>, f64) {
    let by_question: HashMap<&str, &Vec<String>> =
        answers.iter().map(|(question, selected)| (question.as_str(), selected)).collect();

    let mut graded = Vec::with_capacity(locked_questions.len());
    let mut total = 0.0;

    for question in locked_questions {
        let selected = by_question.get(question.id.as_str()).copied().cloned().unwrap_or_default();

        let is_correct = !question.correct_answer.is_empty()
            && selected.iter().any(|choice| choice == &question.correct_answer);

        let marks_awarded = if is_correct { question.marks } else { 0.0 };
        total += marks_awarded;

        graded.push(GradedAnswer {
            question: question.id.clone(),
            selected_options: selected,
            is_correct,
            marks_awarded,
        });
    }

    (graded, total)
}

pub(crate) fn percentage(total: f64, max: f64) -> f64 {
    if max <= 0.0 {
        return 0.0;
    }
    ((total / max) * 100.0 * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::types::QuestionKind;
    use sqlx::types::Json;
    use time::macros::datetime;

    fn question(id: &str, correct: &str, marks: f64) -> Question {
        Question {
            id: id.into(),
            kind: QuestionKind::Mcq,
            question_text: format!("question {id}"),
            options: Json(vec!["a".into(), "b".into(), "c".into(), correct.into()]),
            correct_answer: correct.into(),
            marks,
            category: "general".into(),
            created_by: "admin".into(),
            created_at: datetime!(2025-01-01 00:00:00),
            updated_at: datetime!(2025-01-01 00:00:00),
        }
    }

    #[test]
    fn correct_answers_score_full_marks() {
        let locked = vec![question("q1", "x", 2.0), question("q2", "y", 3.0)];
        let answers = vec![
            ("q1".to_string(), vec!["x".to_string()]),
            ("q2".to_string(), vec!["y".to_string()]),
        ];

        let (graded, total) = grade(&locked, &answers);
        assert_eq!(total, 5.0);
        assert!(graded.iter().all(|g| g.is_correct));
    }

    #[test]
    fn wrong_and_missing_answers_score_zero() {
        let locked = vec![question("q1", "x", 2.0), question("q2", "y", 3.0)];
        let answers = vec![("q1".to_string(), vec!["b".to_string()])];

        let (graded, total) = grade(&locked, &answers);
        assert_eq!(total, 0.0);
        assert_eq!(graded.len(), 2);
        assert!(graded[1].selected_options.is_empty());
    }

    #[test]
    fn answers_outside_locked_set_are_ignored() {
        let locked = vec![question("q1", "x", 2.0)];
        let answers = vec![
            ("q1".to_string(), vec!["x".to_string()]),
            ("q-unknown".to_string(), vec!["x".to_string()]),
        ];

        let (graded, total) = grade(&locked, &answers);
        assert_eq!(total, 2.0);
        assert_eq!(graded.len(), 1);
    }

    #[test]
    fn blank_correct_answer_never_matches() {
        let locked = vec![question("q1", "", 2.0)];
        let answers = vec![("q1".to_string(), vec!["".to_string()])];

        let (_, total) = grade(&locked, &answers);
        assert_eq!(total, 0.0);
    }

    #[test]
    fn percentage_rounds_to_two_places() {
        assert_eq!(percentage(1.0, 3.0), 33.33);
        assert_eq!(percentage(2.0, 3.0), 66.67);
        assert_eq!(percentage(3.0, 3.0), 100.0);
    }

    #[test]
    fn zero_max_score_yields_zero_percentage() {
        assert_eq!(percentage(0.0, 0.0), 0.0);
        assert_eq!(percentage(5.0, 0.0), 0.0);
    }
}
