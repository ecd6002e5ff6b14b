//! The single session/view state object the controller mutates.

use std::collections::HashMap;

use shared::{
    domain::{QuestionId, QuizId, Role},
    protocol::{AnswerEntry, AttemptSummary, QuestionForm, QuestionView, QuizResult, QuizSummary},
};

use crate::controller::events::{BackendCall, CallClass, Request, Ticket};

pub const DEFAULT_QUIZ_QUESTION_COUNT: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Login,
    Register,
    Dashboard,
    Quiz,
    Attempts,
}

impl View {
    pub fn label(self) -> &'static str {
        match self {
            View::Login => "login",
            View::Register => "register",
            View::Dashboard => "dashboard",
            View::Quiz => "quiz",
            View::Attempts => "attempts",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
    pub role: Role,
}

/// Who is logged in. Username and role only ever change together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    identity: Option<Identity>,
}

impl SessionState {
    pub fn authenticated(username: impl Into<String>, role: Role) -> Self {
        Self {
            identity: Some(Identity {
                username: username.into(),
                role,
            }),
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn username(&self) -> Option<&str> {
        self.identity
            .as_ref()
            .map(|identity| identity.username.as_str())
            .filter(|username| !username.is_empty())
    }

    pub fn role(&self) -> Option<Role> {
        self.identity.as_ref().map(|identity| identity.role)
    }

    pub fn is_authenticated(&self) -> bool {
        self.username().is_some()
    }
}

/// Shared gate for every admin operation. A role without a username is not a session.
pub fn can_perform_admin_action(session: &SessionState) -> bool {
    session.is_authenticated() && session.role() == Some(Role::Admin)
}

/// Typed login/register form input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub role: Role,
}

/// The active quiz attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSession {
    quiz_id: QuizId,
    questions: Vec<QuestionView>,
    answers: HashMap<QuestionId, String>,
    result: Option<QuizResult>,
}

impl QuizSession {
    pub fn new(quiz_id: QuizId, questions: Vec<QuestionView>) -> Self {
        Self {
            quiz_id,
            questions,
            answers: HashMap::new(),
            result: None,
        }
    }

    pub fn quiz_id(&self) -> QuizId {
        self.quiz_id
    }

    pub fn questions(&self) -> &[QuestionView] {
        &self.questions
    }

    pub fn answers(&self) -> &HashMap<QuestionId, String> {
        &self.answers
    }

    pub fn answer(&self, question_id: QuestionId) -> Option<&str> {
        self.answers.get(&question_id).map(String::as_str)
    }

    pub fn result(&self) -> Option<QuizResult> {
        self.result
    }

    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    /// Upserts the selected option. Ids outside the loaded question set are
    /// ignored so the answer keys always stay a subset of the loaded ids.
    pub fn record_answer(&mut self, question_id: QuestionId, option: impl Into<String>) -> bool {
        if !self.questions.iter().any(|question| question.id == question_id) {
            return false;
        }
        self.answers.insert(question_id, option.into());
        true
    }

    /// One entry per loaded question in loaded order; unanswered ones carry `""`.
    pub fn submission_payload(&self) -> Vec<AnswerEntry> {
        self.questions
            .iter()
            .map(|question| AnswerEntry {
                id: question.id,
                answer: self.answers.get(&question.id).cloned().unwrap_or_default(),
            })
            .collect()
    }

    pub(crate) fn set_result(&mut self, result: QuizResult) {
        self.result = Some(result);
    }

    pub(crate) fn clear_result(&mut self) {
        self.result = None;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizDraft {
    pub category: String,
    pub num_questions: u32,
    pub title: String,
}

impl Default for QuizDraft {
    fn default() -> Self {
        Self {
            category: String::new(),
            num_questions: DEFAULT_QUIZ_QUESTION_COUNT,
            title: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminDrafts {
    pub question: QuestionForm,
    pub quiz: QuizDraft,
    pub delete_quiz_id: Option<QuizId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppState {
    pub view: View,
    pub session: SessionState,
    pub credentials: Credentials,
    pub catalog: Vec<QuizSummary>,
    pub selected_quiz: Option<QuizId>,
    pub quiz: Option<QuizSession>,
    pub attempts: Vec<AttemptSummary>,
    pub message: Option<String>,
    pub admin: AdminDrafts,
    session_epoch: u64,
    nav_epoch: u64,
    next_ticket: u64,
    in_flight: HashMap<CallClass, u64>,
}

impl AppState {
    pub fn session_epoch(&self) -> u64 {
        self.session_epoch
    }

    pub fn nav_epoch(&self) -> u64 {
        self.nav_epoch
    }

    pub fn is_in_flight(&self, class: CallClass) -> bool {
        self.in_flight.contains_key(&class)
    }

    pub fn has_pending_calls(&self) -> bool {
        !self.in_flight.is_empty()
    }

    pub(crate) fn set_message(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
    }

    pub(crate) fn navigate(&mut self, view: View) {
        if self.view != view {
            self.view = view;
            self.nav_epoch += 1;
        }
    }

    pub(crate) fn discard_quiz_session(&mut self) {
        if self.quiz.take().is_some() {
            self.nav_epoch += 1;
        }
    }

    pub(crate) fn begin_session(&mut self, session: SessionState) {
        self.session = session;
        self.session_epoch += 1;
    }

    /// Back to the initial state. Epochs and the ticket counter keep advancing so
    /// completions issued before the reset can never look current again.
    pub(crate) fn reset(&mut self) {
        let session_epoch = self.session_epoch + 1;
        let nav_epoch = self.nav_epoch + 1;
        let next_ticket = self.next_ticket;
        *self = AppState {
            session_epoch,
            nav_epoch,
            next_ticket,
            ..AppState::default()
        };
    }

    /// Records `request` as the in-flight call of `class`, superseding any
    /// previous one of the same class.
    pub(crate) fn issue(&mut self, class: CallClass, request: Request) -> BackendCall {
        self.next_ticket += 1;
        let ticket = Ticket {
            id: self.next_ticket,
            class,
            session_epoch: self.session_epoch,
            nav_epoch: self.nav_epoch,
        };
        self.in_flight.insert(class, ticket.id);
        BackendCall { ticket, request }
    }

    /// Releases the in-flight slot if `ticket` still owns it.
    pub(crate) fn settle(&mut self, ticket: &Ticket) -> bool {
        if self.in_flight.get(&ticket.class) == Some(&ticket.id) {
            self.in_flight.remove(&ticket.class);
            true
        } else {
            false
        }
    }

    pub(crate) fn is_current(&self, ticket: &Ticket) -> bool {
        if ticket.session_epoch != self.session_epoch {
            return false;
        }
        !ticket.class.is_view_scoped() || ticket.nav_epoch == self.nav_epoch
    }
}
