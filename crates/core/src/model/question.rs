use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::QuestionId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// A question set that cannot back a `QuestionBank`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionSetError {
    #[error("malformed question set: {0}")]
    Parse(String),

    #[error("duplicate question id {0}")]
    DuplicateId(QuestionId),

    #[error("question {id} has an empty category")]
    EmptyCategory { id: QuestionId },

    #[error("question {id} has no options")]
    NoOptions { id: QuestionId },

    #[error("question {id}: correct answer {answer:?} is not one of its options")]
    UnknownCorrectAnswer { id: QuestionId, answer: String },
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// Immutable multiple-choice question content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    id: QuestionId,
    category: String,
    question: String,
    options: BTreeMap<String, String>,
    correct_answer: String,
}

impl Question {
    #[must_use]
    pub fn new(
        id: QuestionId,
        category: impl Into<String>,
        question: impl Into<String>,
        options: BTreeMap<String, String>,
        correct_answer: impl Into<String>,
    ) -> Self {
        Self {
            id,
            category: category.into(),
            question: question.into(),
            options,
            correct_answer: correct_answer.into(),
        }
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.question
    }

    /// Option key → option text, ordered by key.
    #[must_use]
    pub fn options(&self) -> &BTreeMap<String, String> {
        &self.options
    }

    #[must_use]
    pub fn correct_answer(&self) -> &str {
        &self.correct_answer
    }

    /// Text of the correct option.
    #[must_use]
    pub fn correct_text(&self) -> &str {
        self.options
            .get(&self.correct_answer)
            .map_or("", String::as_str)
    }

    /// Returns true when `option_key` is the correct answer.
    ///
    /// Keys are compared case-insensitively so "B" matches "b".
    #[must_use]
    pub fn is_correct(&self, option_key: &str) -> bool {
        option_key.trim().eq_ignore_ascii_case(&self.correct_answer)
    }

    fn validate(&self) -> Result<(), QuestionSetError> {
        if self.category.trim().is_empty() {
            return Err(QuestionSetError::EmptyCategory { id: self.id });
        }
        if self.options.is_empty() {
            return Err(QuestionSetError::NoOptions { id: self.id });
        }
        if !self.options.contains_key(&self.correct_answer) {
            return Err(QuestionSetError::UnknownCorrectAnswer {
                id: self.id,
                answer: self.correct_answer.clone(),
            });
        }
        Ok(())
    }
}

//
// ─── QUESTION SET ──────────────────────────────────────────────────────────────
//

#[derive(Deserialize)]
struct QuestionSetDocument {
    questions: Vec<Question>,
}

/// Validated, immutable collection of questions keyed by id.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QuestionSet {
    questions: BTreeMap<QuestionId, Question>,
}

impl QuestionSet {
    /// Build a question set, rejecting duplicates and invalid answers.
    ///
    /// # Errors
    ///
    /// Returns `QuestionSetError` for the first malformed question found.
    pub fn new(questions: impl IntoIterator<Item = Question>) -> Result<Self, QuestionSetError> {
        let mut by_id = BTreeMap::new();
        for question in questions {
            question.validate()?;
            let id = question.id();
            if by_id.insert(id, question).is_some() {
                return Err(QuestionSetError::DuplicateId(id));
            }
        }
        Ok(Self { questions: by_id })
    }

    /// Parse a `{"questions": [...]}` document.
    ///
    /// # Errors
    ///
    /// Returns `QuestionSetError::Parse` for invalid JSON or missing fields, and the
    /// validation errors of [`QuestionSet::new`].
    pub fn from_json_str(raw: &str) -> Result<Self, QuestionSetError> {
        let doc: QuestionSetDocument =
            serde_json::from_str(raw).map_err(|e| QuestionSetError::Parse(e.to_string()))?;
        Self::new(doc.questions)
    }

    #[must_use]
    pub fn get(&self, id: QuestionId) -> Option<&Question> {
        self.questions.get(&id)
    }

    #[must_use]
    pub fn contains(&self, id: QuestionId) -> bool {
        self.questions.contains_key(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = QuestionId> + '_ {
        self.questions.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Question> {
        self.questions.values()
    }

    /// Distinct categories in sorted order.
    #[must_use]
    pub fn categories(&self) -> BTreeSet<&str> {
        self.questions.values().map(Question::category).collect()
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::question;
    use super::*;

    const DOC: &str = r#"{
        "questions": [
            {"id": 1, "category": "greetings", "question": "你好?",
             "options": {"a": "goodbye", "b": "hello"}, "correct_answer": "b"},
            {"id": 2, "category": "numbers", "question": "三?",
             "options": {"a": "three", "b": "four"}, "correct_answer": "a"}
        ]
    }"#;

    #[test]
    fn parses_question_document() {
        let set = QuestionSet::from_json_str(DOC).unwrap();
        assert_eq!(set.len(), 2);
        let q = set.get(QuestionId::new(1)).unwrap();
        assert_eq!(q.category(), "greetings");
        assert_eq!(q.correct_text(), "hello");
        assert!(q.is_correct("B"));
        assert!(!q.is_correct("a"));
        assert_eq!(
            set.categories().into_iter().collect::<Vec<_>>(),
            vec!["greetings", "numbers"]
        );
    }

    #[test]
    fn missing_field_is_a_parse_error() {
        let raw = r#"{"questions": [{"id": 1, "category": "x", "options": {"a": "y"}, "correct_answer": "a"}]}"#;
        let err = QuestionSet::from_json_str(raw).unwrap_err();
        assert!(matches!(err, QuestionSetError::Parse(_)));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let err = QuestionSet::new(vec![question(1, "a"), question(1, "b")]).unwrap_err();
        assert_eq!(err, QuestionSetError::DuplicateId(QuestionId::new(1)));
    }

    #[test]
    fn correct_answer_must_be_an_option() {
        let q = Question::new(
            QuestionId::new(3),
            "cat",
            "?",
            BTreeMap::from([("a".to_owned(), "x".to_owned())]),
            "z",
        );
        let err = QuestionSet::new(vec![q]).unwrap_err();
        assert!(matches!(err, QuestionSetError::UnknownCorrectAnswer { .. }));
    }

    #[test]
    fn empty_category_is_rejected() {
        let err = QuestionSet::new(vec![question(4, "  ")]).unwrap_err();
        assert_eq!(err, QuestionSetError::EmptyCategory { id: QuestionId::new(4) });
    }
}
