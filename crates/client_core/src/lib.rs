use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::QuizId,
    error::message_from_body,
    protocol::{
        AnswerEntry, AttemptSummary, CreateQuizRequest, LoginRequest, LoginResponse,
        QuestionForm, QuestionView, QuizResult, QuizSummary, RegisterRequest,
    },
};
use tracing::debug;
use url::Url;

pub mod controller;
pub mod error;

pub use controller::{
    orchestration::{spawn_controller, ControllerClosed, ControllerHandle, QuizController},
    state::{can_perform_admin_action, AppState, View},
};
pub use error::{BackendError, BackendResult};

/// The remote quiz service, one method per REST operation.
///
/// Identity travels as a plain `username` parameter on mutating calls; the
/// backend re-validates role on its side.
#[async_trait]
pub trait QuizBackend: Send + Sync {
    async fn register(&self, request: &RegisterRequest) -> BackendResult<()>;
    async fn login(&self, request: &LoginRequest) -> BackendResult<LoginResponse>;
    async fn list_quizzes(&self) -> BackendResult<Vec<QuizSummary>>;
    async fn fetch_quiz(&self, quiz_id: QuizId) -> BackendResult<Vec<QuestionView>>;
    async fn submit_quiz(
        &self,
        quiz_id: QuizId,
        username: &str,
        answers: &[AnswerEntry],
    ) -> BackendResult<QuizResult>;
    async fn list_attempts(&self, username: &str) -> BackendResult<Vec<AttemptSummary>>;
    async fn create_question(&self, username: &str, form: &QuestionForm) -> BackendResult<()>;
    async fn create_quiz(&self, username: &str, request: &CreateQuizRequest)
        -> BackendResult<()>;
    async fn delete_quiz(&self, username: &str, quiz_id: QuizId) -> BackendResult<()>;
}

pub struct HttpQuizBackend {
    http: Client,
    base_url: Url,
}

impl HttpQuizBackend {
    pub fn new(server_url: &str) -> BackendResult<Self> {
        Self::with_timeout(server_url, None)
    }

    /// Builds a backend whose calls give up after `timeout`. `None` waits forever.
    pub fn with_timeout(server_url: &str, timeout: Option<Duration>) -> BackendResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;
        let base_url = Url::parse(server_url.trim())?;
        if base_url.cannot_be_a_base() {
            return Err(BackendError::InvalidUrl(format!(
                "{server_url} cannot be used as a base url"
            )));
        }
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> BackendResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| BackendError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

async fn expect_success(response: Response) -> BackendResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(BackendError::Rejected {
        status: status.as_u16(),
        message: message_from_body(&body),
    })
}

async fn decode_json<T: DeserializeOwned>(response: Response) -> BackendResult<T> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|err| BackendError::Decode(err.to_string()))
}

#[async_trait]
impl QuizBackend for HttpQuizBackend {
    async fn register(&self, request: &RegisterRequest) -> BackendResult<()> {
        let url = self.endpoint(&["user", "create"])?;
        debug!(username = %request.username, role = %request.role, "POST /user/create");
        let response = self.http.post(url).json(request).send().await?;
        expect_success(response).await?;
        Ok(())
    }

    async fn login(&self, request: &LoginRequest) -> BackendResult<LoginResponse> {
        let url = self.endpoint(&["user", "login"])?;
        debug!(username = %request.username, "POST /user/login");
        let response = self.http.post(url).json(request).send().await?;
        let response = expect_success(response).await?;
        let bytes = response.bytes().await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(LoginResponse::default());
        }
        serde_json::from_slice(&bytes).map_err(|err| BackendError::Decode(err.to_string()))
    }

    async fn list_quizzes(&self) -> BackendResult<Vec<QuizSummary>> {
        let url = self.endpoint(&["quiz", "all"])?;
        let response = self.http.get(url).send().await?;
        decode_json(expect_success(response).await?).await
    }

    async fn fetch_quiz(&self, quiz_id: QuizId) -> BackendResult<Vec<QuestionView>> {
        let quiz_id = quiz_id.to_string();
        let url = self.endpoint(&["quiz", "getQuiz", &quiz_id])?;
        let response = self.http.get(url).send().await?;
        decode_json(expect_success(response).await?).await
    }

    async fn submit_quiz(
        &self,
        quiz_id: QuizId,
        username: &str,
        answers: &[AnswerEntry],
    ) -> BackendResult<QuizResult> {
        let quiz_id = quiz_id.to_string();
        let url = self.endpoint(&["quiz", "submit", &quiz_id])?;
        debug!(quiz_id = %quiz_id, answers = answers.len(), "POST /quiz/submit");
        let response = self
            .http
            .post(url)
            .query(&[("username", username)])
            .json(answers)
            .send()
            .await?;
        decode_json(expect_success(response).await?).await
    }

    async fn list_attempts(&self, username: &str) -> BackendResult<Vec<AttemptSummary>> {
        let url = self.endpoint(&["user", username, "attempts"])?;
        let response = self.http.get(url).send().await?;
        decode_json(expect_success(response).await?).await
    }

    async fn create_question(&self, username: &str, form: &QuestionForm) -> BackendResult<()> {
        let url = self.endpoint(&["question", "add"])?;
        let response = self
            .http
            .post(url)
            .query(&[("username", username)])
            .json(form)
            .send()
            .await?;
        expect_success(response).await?;
        Ok(())
    }

    async fn create_quiz(
        &self,
        username: &str,
        request: &CreateQuizRequest,
    ) -> BackendResult<()> {
        let url = self.endpoint(&["quiz", "create"])?;
        let num_questions = request.num_questions.to_string();
        let response = self
            .http
            .post(url)
            .query(&[
                ("username", username),
                ("category", request.category.as_str()),
                ("numQ", num_questions.as_str()),
                ("title", request.title.as_str()),
            ])
            .send()
            .await?;
        expect_success(response).await?;
        Ok(())
    }

    async fn delete_quiz(&self, username: &str, quiz_id: QuizId) -> BackendResult<()> {
        let quiz_id = quiz_id.to_string();
        let url = self.endpoint(&["quiz", "delete", &quiz_id])?;
        let response = self
            .http
            .delete(url)
            .query(&[("username", username)])
            .send()
            .await?;
        expect_success(response).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
