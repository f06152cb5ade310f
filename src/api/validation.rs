use validator::Validate;

use crate::api::errors::ApiError;
use crate::db::types::QuestionKind;
use crate::schemas::test::QuestionCreate;

pub(crate) fn validate_payload<T: Validate>(payload: &T) -> Result<(), ApiError> {
    payload.validate().map_err(|errors| ApiError::BadRequest(errors.to_string()))
}

/// Structural checks for a new bank question beyond field-level validation.
pub(crate) fn validate_question(question: &QuestionCreate) -> Result<(), ApiError> {
    if question.marks <= 0.0 {
        return Err(ApiError::BadRequest("Question marks must be positive".to_string()));
    }

    if question.kind == QuestionKind::Mcq {
        if question.options.len() < 2 {
            return Err(ApiError::BadRequest(
                "An MCQ question needs at least two options".to_string(),
            ));
        }
        if !question.options.contains(&question.correct_answer) {
            return Err(ApiError::BadRequest(
                "The correct answer must be one of the options".to_string(),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mcq(options: &[&str], correct: &str, marks: f64) -> QuestionCreate {
        QuestionCreate {
            kind: QuestionKind::Mcq,
            question_text: "pick one".to_string(),
            options: options.iter().map(|s| s.to_string()).collect(),
            correct_answer: correct.to_string(),
            marks,
            category: "general".to_string(),
        }
    }

    #[test]
    fn accepts_well_formed_mcq() {
        assert!(validate_question(&mcq(&["a", "b"], "a", 1.0)).is_ok());
    }

    #[test]
    fn rejects_correct_answer_outside_options() {
        assert!(validate_question(&mcq(&["a", "b"], "c", 1.0)).is_err());
    }

    #[test]
    fn rejects_single_option_and_nonpositive_marks() {
        assert!(validate_question(&mcq(&["a"], "a", 1.0)).is_err());
        assert!(validate_question(&mcq(&["a", "b"], "a", 0.0)).is_err());
    }
}
