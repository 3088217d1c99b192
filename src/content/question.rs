use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("question has an empty id")]
    EmptyId,
    #[error("question {id} has no choices")]
    NoChoices { id: String },
    #[error("question {id}: answer {answer:?} is not one of the choices")]
    AnswerNotInChoices { id: String, answer: String },
    #[error("question {id}: choice {choice:?} appears more than once")]
    DuplicateChoice { id: String, choice: String },
    #[error("failed to read era file {file}: {source}")]
    Io {
        file: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse era file {file}: {source}")]
    Parse {
        file: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A single multiple-choice item about one history term.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    #[serde(default)]
    pub era: String,
    pub term: String,
    pub question: String,
    pub choices: Vec<String>,
    pub answer: String,
    pub explanation: String,
}

impl Question {
    pub fn validate(&self) -> Result<(), ContentError> {
        if self.id.trim().is_empty() {
            return Err(ContentError::EmptyId);
        }
        if self.choices.is_empty() {
            return Err(ContentError::NoChoices {
                id: self.id.clone(),
            });
        }
        let mut seen = HashSet::new();
        for choice in &self.choices {
            if !seen.insert(choice.as_str()) {
                return Err(ContentError::DuplicateChoice {
                    id: self.id.clone(),
                    choice: choice.clone(),
                });
            }
        }
        if !seen.contains(self.answer.as_str()) {
            return Err(ContentError::AnswerNotInChoices {
                id: self.id.clone(),
                answer: self.answer.clone(),
            });
        }
        Ok(())
    }

    pub fn is_correct(&self, choice: &str) -> bool {
        choice == self.answer
    }
}

#[cfg(test)]
pub(crate) fn sample(id: &str) -> Question {
    Question {
        id: id.to_string(),
        era: "テスト時代".to_string(),
        term: format!("{id}-term"),
        question: format!("{id}?"),
        choices: vec![
            format!("{id}-a"),
            format!("{id}-b"),
            format!("{id}-c"),
            format!("{id}-d"),
        ],
        answer: format!("{id}-a"),
        explanation: format!("{id} explained"),
    }
}
