//! User actions, backend calls, and their completions.

use shared::{
    domain::{QuestionId, QuizId, Role},
    protocol::{
        AnswerEntry, AttemptSummary, CreateQuizRequest, LoginRequest, LoginResponse,
        QuestionForm, QuestionView, QuizResult, QuizSummary, RegisterRequest,
    },
};

use crate::{controller::state::QuizDraft, error::BackendResult};

/// Everything the user can do to the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    EditUsername(String),
    EditPassword(String),
    EditRole(Role),
    SwitchToRegister,
    SwitchToLogin,
    Register,
    Login,
    Logout,
    RefreshCatalog,
    SelectQuiz(Option<QuizId>),
    FetchQuiz,
    RecordAnswer {
        question_id: QuestionId,
        option: String,
    },
    Submit,
    LoadAttempts,
    BackToDashboard,
    EditQuestionForm(QuestionForm),
    CreateQuestion,
    EditQuizDraft(QuizDraft),
    CreateQuiz,
    EditDeleteQuizId(Option<QuizId>),
    DeleteQuiz,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::EditUsername(_) => "edit_username",
            Action::EditPassword(_) => "edit_password",
            Action::EditRole(_) => "edit_role",
            Action::SwitchToRegister => "switch_to_register",
            Action::SwitchToLogin => "switch_to_login",
            Action::Register => "register",
            Action::Login => "login",
            Action::Logout => "logout",
            Action::RefreshCatalog => "refresh_catalog",
            Action::SelectQuiz(_) => "select_quiz",
            Action::FetchQuiz => "fetch_quiz",
            Action::RecordAnswer { .. } => "record_answer",
            Action::Submit => "submit",
            Action::LoadAttempts => "load_attempts",
            Action::BackToDashboard => "back_to_dashboard",
            Action::EditQuestionForm(_) => "edit_question_form",
            Action::CreateQuestion => "create_question",
            Action::EditQuizDraft(_) => "edit_quiz_draft",
            Action::CreateQuiz => "create_quiz",
            Action::EditDeleteQuizId(_) => "edit_delete_quiz_id",
            Action::DeleteQuiz => "delete_quiz",
        }
    }
}

/// Operation class used for the one-in-flight guard and for staleness scoping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallClass {
    Register,
    Login,
    Catalog,
    FetchQuiz,
    Submit,
    Attempts,
    CreateQuestion,
    CreateQuiz,
    DeleteQuiz,
}

impl CallClass {
    /// View-scoped calls are dropped once the user navigates away; the rest only
    /// care that the same login session is still active.
    pub fn is_view_scoped(self) -> bool {
        matches!(
            self,
            CallClass::Register
                | CallClass::Login
                | CallClass::FetchQuiz
                | CallClass::Submit
                | CallClass::Attempts
        )
    }
}

/// Snapshot of the state a call was issued against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub id: u64,
    pub class: CallClass,
    pub session_epoch: u64,
    pub nav_epoch: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Register(RegisterRequest),
    Login(LoginRequest),
    ListQuizzes,
    FetchQuiz(QuizId),
    Submit {
        quiz_id: QuizId,
        username: String,
        answers: Vec<AnswerEntry>,
    },
    ListAttempts {
        username: String,
    },
    CreateQuestion {
        username: String,
        form: QuestionForm,
    },
    CreateQuiz {
        username: String,
        request: CreateQuizRequest,
    },
    DeleteQuiz {
        username: String,
        quiz_id: QuizId,
    },
}

/// A backend call the caller must execute and feed back as a [`Completion`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendCall {
    pub ticket: Ticket,
    pub request: Request,
}

#[derive(Debug, Clone)]
pub enum Outcome {
    Registered(BackendResult<()>),
    LoggedIn {
        typed_username: String,
        result: BackendResult<LoginResponse>,
    },
    Catalog(BackendResult<Vec<QuizSummary>>),
    Questions {
        quiz_id: QuizId,
        result: BackendResult<Vec<QuestionView>>,
    },
    Scored(BackendResult<QuizResult>),
    Attempts(BackendResult<Vec<AttemptSummary>>),
    QuestionCreated(BackendResult<()>),
    QuizCreated(BackendResult<()>),
    QuizDeleted {
        quiz_id: QuizId,
        result: BackendResult<()>,
    },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        match self {
            Outcome::Registered(result)
            | Outcome::QuestionCreated(result)
            | Outcome::QuizCreated(result)
            | Outcome::QuizDeleted { result, .. } => result.is_ok(),
            Outcome::LoggedIn { result, .. } => result.is_ok(),
            Outcome::Catalog(result) => result.is_ok(),
            Outcome::Questions { result, .. } => result.is_ok(),
            Outcome::Scored(result) => result.is_ok(),
            Outcome::Attempts(result) => result.is_ok(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Completion {
    pub ticket: Ticket,
    pub outcome: Outcome,
}
