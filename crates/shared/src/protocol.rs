use serde::{Deserialize, Serialize};

use crate::domain::{AttemptId, QuestionId, QuizId, Role};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Both fields are optional on the wire; the client fills the gaps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizSummary {
    #[serde(alias = "Id")]
    pub id: QuizId,
    pub title: String,
    #[serde(default)]
    pub category: String,
}

/// A question as served for answering. `rightAnswer` is never read here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    #[serde(alias = "Id")]
    pub id: QuestionId,
    pub question_title: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub difficulty_level: String,
    pub option1: String,
    pub option2: String,
    pub option3: String,
    pub option4: String,
}

impl QuestionView {
    pub fn options(&self) -> [&str; 4] {
        [&self.option1, &self.option2, &self.option3, &self.option4]
    }
}

/// Admin input for `POST /question/add`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionForm {
    pub question_title: String,
    pub category: String,
    pub difficulty_level: String,
    pub option1: String,
    pub option2: String,
    pub option3: String,
    pub option4: String,
    pub right_answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerEntry {
    pub id: QuestionId,
    pub answer: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    pub score: u32,
    pub total_questions: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptSummary {
    pub attempt_id: AttemptId,
    pub quiz_id: QuizId,
    pub quiz_title: String,
    pub score: u32,
    pub total_questions: u32,
    /// Opaque backend timestamp, displayed as-is.
    pub attempted_at: String,
}

/// Parameters for `POST /quiz/create`; sent as query string, not body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateQuizRequest {
    pub category: String,
    pub num_questions: u32,
    pub title: String,
}
