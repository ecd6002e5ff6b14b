//! State transitions for user actions and backend completions.
//!
//! Both entry points only touch the [`AppState`] they are handed: `reduce` may
//! hand back a [`BackendCall`] for the caller to execute, and `apply` folds the
//! resulting [`Completion`] back in (possibly returning a follow-up call such as
//! a catalog refresh).

use shared::protocol::{CreateQuizRequest, LoginRequest, QuestionForm, RegisterRequest};
use tracing::{debug, info, warn};

use crate::controller::{
    events::{Action, BackendCall, CallClass, Completion, Outcome, Request},
    state::{can_perform_admin_action, AppState, QuizDraft, QuizSession, SessionState, View},
};

pub mod messages {
    pub const REGISTERED: &str = "Registered successfully! You can now log in.";
    pub const REGISTER_FAILED: &str = "Registration failed.";
    pub const LOGIN_OK: &str = "Login successful";
    pub const LOGIN_FAILED: &str = "Login failed. Check username/password.";
    pub const CREDENTIALS_REQUIRED: &str = "Username and password are required.";
    pub const CATALOG_FAILED: &str = "Failed to load quizzes.";
    pub const SELECT_QUIZ: &str = "Please select a quiz.";
    pub const NO_QUESTIONS: &str = "No questions found for this quiz.";
    pub const FETCH_FAILED: &str = "Failed to fetch quiz.";
    pub const SUBMIT_UNAUTHENTICATED: &str = "You must be logged in to submit a quiz.";
    pub const NO_QUIZ_SELECTED: &str = "No quiz selected.";
    pub const NO_QUIZ_LOADED: &str = "No quiz loaded.";
    pub const SUBMIT_FAILED: &str = "Failed to submit quiz.";
    pub const ATTEMPTS_UNAUTHENTICATED: &str = "You must be logged in.";
    pub const ATTEMPTS_FAILED: &str = "Failed to load attempts.";
    pub const ADMIN_REQUIRED: &str = "You must be logged in as ADMIN.";
    pub const QUESTION_CREATED: &str = "Question created successfully.";
    pub const QUESTION_FAILED: &str = "Failed to create question.";
    pub const QUIZ_CREATED: &str = "Quiz created successfully.";
    pub const QUIZ_CREATE_FAILED: &str = "Failed to create quiz.";
    pub const DELETE_ID_REQUIRED: &str = "Enter a quiz ID to delete.";
    pub const DELETE_FAILED: &str = "Failed to delete quiz.";
    pub const REQUEST_PENDING: &str = "Please wait for the previous request to finish.";

    pub fn quiz_deleted(quiz_id: impl std::fmt::Display) -> String {
        format!("Quiz {quiz_id} deleted successfully.")
    }
}

/// Whether `action` has a control on `view`. Anything else is a self-loop.
pub fn is_available(view: View, action: &Action) -> bool {
    match action {
        Action::EditUsername(_) | Action::EditPassword(_) => {
            matches!(view, View::Login | View::Register)
        }
        Action::Login | Action::SwitchToRegister => view == View::Login,
        Action::Register | Action::SwitchToLogin | Action::EditRole(_) => view == View::Register,
        Action::Logout => matches!(view, View::Dashboard | View::Quiz | View::Attempts),
        Action::RefreshCatalog
        | Action::SelectQuiz(_)
        | Action::FetchQuiz
        | Action::LoadAttempts
        | Action::EditQuestionForm(_)
        | Action::CreateQuestion
        | Action::EditQuizDraft(_)
        | Action::CreateQuiz
        | Action::EditDeleteQuizId(_)
        | Action::DeleteQuiz => view == View::Dashboard,
        Action::RecordAnswer { .. } | Action::Submit => view == View::Quiz,
        Action::BackToDashboard => matches!(view, View::Quiz | View::Attempts),
    }
}

/// Pure form of [`reduce`] for callers that prefer owned state.
pub fn step(mut state: AppState, action: Action) -> (AppState, Option<BackendCall>) {
    let call = reduce(&mut state, action);
    (state, call)
}

/// Applies a user action. Returns the backend call to issue, if any.
pub fn reduce(state: &mut AppState, action: Action) -> Option<BackendCall> {
    if !is_available(state.view, &action) {
        warn!(
            view = state.view.label(),
            action = action.name(),
            "ignoring action not available in current view"
        );
        return None;
    }

    match action {
        Action::EditUsername(username) => {
            state.credentials.username = username;
            None
        }
        Action::EditPassword(password) => {
            state.credentials.password = password;
            None
        }
        Action::EditRole(role) => {
            state.credentials.role = role;
            None
        }
        Action::SwitchToRegister => {
            state.navigate(View::Register);
            None
        }
        Action::SwitchToLogin => {
            state.navigate(View::Login);
            None
        }
        Action::Register => register(state),
        Action::Login => login(state),
        Action::Logout => {
            info!(username = ?state.session.username(), "logging out");
            state.reset();
            None
        }
        Action::RefreshCatalog => {
            state.message = None;
            guarded(state, CallClass::Catalog)?;
            Some(state.issue(CallClass::Catalog, Request::ListQuizzes))
        }
        Action::SelectQuiz(quiz_id) => {
            if state.selected_quiz != quiz_id {
                state.discard_quiz_session();
            }
            state.selected_quiz = quiz_id;
            None
        }
        Action::FetchQuiz => fetch_quiz(state),
        Action::RecordAnswer {
            question_id,
            option,
        } => {
            if let Some(quiz) = state.quiz.as_mut() {
                if !quiz.record_answer(question_id, option) {
                    warn!(question_id = %question_id, "answer for a question that is not loaded");
                }
            }
            None
        }
        Action::Submit => submit(state),
        Action::LoadAttempts => load_attempts(state),
        Action::BackToDashboard => {
            state.discard_quiz_session();
            state.navigate(View::Dashboard);
            None
        }
        Action::EditQuestionForm(form) => {
            state.admin.question = form;
            None
        }
        Action::CreateQuestion => {
            let username = admin_username(state)?;
            guarded(state, CallClass::CreateQuestion)?;
            let form = state.admin.question.clone();
            Some(state.issue(
                CallClass::CreateQuestion,
                Request::CreateQuestion { username, form },
            ))
        }
        Action::EditQuizDraft(draft) => {
            state.admin.quiz = draft;
            None
        }
        Action::CreateQuiz => {
            let username = admin_username(state)?;
            guarded(state, CallClass::CreateQuiz)?;
            let QuizDraft {
                category,
                num_questions,
                title,
            } = state.admin.quiz.clone();
            Some(state.issue(
                CallClass::CreateQuiz,
                Request::CreateQuiz {
                    username,
                    request: CreateQuizRequest {
                        category,
                        num_questions,
                        title,
                    },
                },
            ))
        }
        Action::EditDeleteQuizId(quiz_id) => {
            state.admin.delete_quiz_id = quiz_id;
            None
        }
        Action::DeleteQuiz => {
            let username = admin_username(state)?;
            let Some(quiz_id) = state.admin.delete_quiz_id else {
                state.set_message(messages::DELETE_ID_REQUIRED);
                return None;
            };
            guarded(state, CallClass::DeleteQuiz)?;
            Some(state.issue(
                CallClass::DeleteQuiz,
                Request::DeleteQuiz { username, quiz_id },
            ))
        }
    }
}

/// Rejects a second call of `class` while one is still pending.
fn guarded(state: &mut AppState, class: CallClass) -> Option<()> {
    if state.is_in_flight(class) {
        debug!(?class, "call already in flight");
        state.set_message(messages::REQUEST_PENDING);
        return None;
    }
    Some(())
}

fn admin_username(state: &mut AppState) -> Option<String> {
    state.message = None;
    if !can_perform_admin_action(&state.session) {
        state.set_message(messages::ADMIN_REQUIRED);
        return None;
    }
    state.session.username().map(str::to_string)
}

fn typed_credentials(state: &mut AppState) -> Option<(String, String)> {
    state.message = None;
    let username = state.credentials.username.trim();
    if username.is_empty() || state.credentials.password.is_empty() {
        state.set_message(messages::CREDENTIALS_REQUIRED);
        return None;
    }
    Some((username.to_string(), state.credentials.password.clone()))
}

fn register(state: &mut AppState) -> Option<BackendCall> {
    let (username, password) = typed_credentials(state)?;
    guarded(state, CallClass::Register)?;
    let role = state.credentials.role;
    Some(state.issue(
        CallClass::Register,
        Request::Register(RegisterRequest {
            username,
            password,
            role,
        }),
    ))
}

fn login(state: &mut AppState) -> Option<BackendCall> {
    let (username, password) = typed_credentials(state)?;
    guarded(state, CallClass::Login)?;
    Some(state.issue(
        CallClass::Login,
        Request::Login(LoginRequest { username, password }),
    ))
}

fn fetch_quiz(state: &mut AppState) -> Option<BackendCall> {
    let Some(quiz_id) = state.selected_quiz else {
        state.set_message(messages::SELECT_QUIZ);
        return None;
    };
    state.message = None;
    guarded(state, CallClass::FetchQuiz)?;
    // Answers and result never survive a new fetch, whatever it returns.
    state.discard_quiz_session();
    Some(state.issue(CallClass::FetchQuiz, Request::FetchQuiz(quiz_id)))
}

fn submit(state: &mut AppState) -> Option<BackendCall> {
    let Some(username) = state.session.username().map(str::to_string) else {
        state.set_message(messages::SUBMIT_UNAUTHENTICATED);
        return None;
    };
    if state.selected_quiz.is_none() {
        state.set_message(messages::NO_QUIZ_SELECTED);
        return None;
    }
    let Some(quiz) = state.quiz.as_ref().filter(|quiz| !quiz.questions().is_empty()) else {
        state.set_message(messages::NO_QUIZ_LOADED);
        return None;
    };
    let quiz_id = quiz.quiz_id();
    let answers = quiz.submission_payload();
    guarded(state, CallClass::Submit)?;
    debug!(
        quiz_id = %quiz_id,
        total = answers.len(),
        answered = answers.iter().filter(|entry| !entry.answer.is_empty()).count(),
        "submitting quiz"
    );
    Some(state.issue(
        CallClass::Submit,
        Request::Submit {
            quiz_id,
            username,
            answers,
        },
    ))
}

fn load_attempts(state: &mut AppState) -> Option<BackendCall> {
    let Some(username) = state.session.username().map(str::to_string) else {
        state.set_message(messages::ATTEMPTS_UNAUTHENTICATED);
        return None;
    };
    state.message = None;
    guarded(state, CallClass::Attempts)?;
    if let Some(quiz) = state.quiz.as_mut() {
        quiz.clear_result();
    }
    Some(state.issue(CallClass::Attempts, Request::ListAttempts { username }))
}

/// Folds a resolved call back into the state. Completions for calls issued
/// against a state that is no longer current are discarded without effect.
pub fn apply(state: &mut AppState, completion: Completion) -> Option<BackendCall> {
    let Completion { ticket, outcome } = completion;
    let owned_slot = state.settle(&ticket);
    if !owned_slot || !state.is_current(&ticket) {
        debug!(
            ticket = ticket.id,
            class = ?ticket.class,
            success = outcome.is_success(),
            "discarding stale completion"
        );
        return None;
    }

    match outcome {
        Outcome::Registered(result) => {
            match result {
                Ok(()) => {
                    info!(username = %state.credentials.username, "registered");
                    state.set_message(messages::REGISTERED);
                    state.credentials.password.clear();
                    state.navigate(View::Login);
                }
                Err(err) => {
                    warn!(error = %err, "registration failed");
                    let message = err.server_message().unwrap_or(messages::REGISTER_FAILED);
                    state.set_message(message);
                }
            }
            None
        }
        Outcome::LoggedIn {
            typed_username,
            result,
        } => match result {
            Ok(body) => {
                let username = body
                    .username
                    .filter(|username| !username.is_empty())
                    .unwrap_or(typed_username);
                let role = body.role.unwrap_or_default();
                info!(username = %username, role = %role, "logged in");
                state.credentials.username = username.clone();
                state.credentials.password.clear();
                state.begin_session(SessionState::authenticated(username, role));
                state.set_message(messages::LOGIN_OK);
                state.navigate(View::Dashboard);
                Some(state.issue(CallClass::Catalog, Request::ListQuizzes))
            }
            Err(err) => {
                warn!(error = %err, "login failed");
                let message = err.server_message().unwrap_or(messages::LOGIN_FAILED);
                state.set_message(message);
                None
            }
        },
        Outcome::Catalog(result) => {
            match result {
                Ok(quizzes) => {
                    debug!(count = quizzes.len(), "quiz catalog refreshed");
                    if let Some(selected) = state.selected_quiz {
                        if !quizzes.iter().any(|quiz| quiz.id == selected) {
                            state.selected_quiz = None;
                        }
                    }
                    state.catalog = quizzes;
                }
                Err(err) => {
                    warn!(error = %err, "catalog refresh failed");
                    state.set_message(messages::CATALOG_FAILED);
                }
            }
            None
        }
        Outcome::Questions { quiz_id, result } => {
            if state.selected_quiz != Some(quiz_id) {
                debug!(
                    quiz_id = %quiz_id,
                    selected = ?state.selected_quiz,
                    "discarding questions for a quiz that is no longer selected"
                );
                return None;
            }
            match result {
                Ok(questions) if questions.is_empty() => {
                    state.set_message(messages::NO_QUESTIONS);
                }
                Ok(questions) => {
                    info!(quiz_id = %quiz_id, questions = questions.len(), "quiz loaded");
                    state.quiz = Some(QuizSession::new(quiz_id, questions));
                    state.navigate(View::Quiz);
                }
                Err(err) => {
                    warn!(quiz_id = %quiz_id, error = %err, "quiz fetch failed");
                    state.set_message(messages::FETCH_FAILED);
                }
            }
            None
        }
        Outcome::Scored(result) => {
            match result {
                Ok(result) => {
                    info!(
                        score = result.score,
                        total = result.total_questions,
                        "quiz scored"
                    );
                    if let Some(quiz) = state.quiz.as_mut() {
                        quiz.set_result(result);
                    }
                    state.message = None;
                }
                Err(err) => {
                    warn!(error = %err, "quiz submission failed");
                    state.set_message(messages::SUBMIT_FAILED);
                }
            }
            None
        }
        Outcome::Attempts(result) => {
            match result {
                Ok(attempts) => {
                    state.attempts = attempts;
                    state.navigate(View::Attempts);
                }
                Err(err) => {
                    warn!(error = %err, "loading attempts failed");
                    state.set_message(messages::ATTEMPTS_FAILED);
                }
            }
            None
        }
        Outcome::QuestionCreated(result) => {
            match result {
                Ok(()) => {
                    state.set_message(messages::QUESTION_CREATED);
                    state.admin.question = QuestionForm::default();
                }
                Err(err) => {
                    warn!(error = %err, "question creation failed");
                    state.set_message(messages::QUESTION_FAILED);
                }
            }
            None
        }
        Outcome::QuizCreated(result) => match result {
            Ok(()) => {
                state.set_message(messages::QUIZ_CREATED);
                state.admin.quiz = QuizDraft::default();
                Some(state.issue(CallClass::Catalog, Request::ListQuizzes))
            }
            Err(err) => {
                warn!(error = %err, "quiz creation failed");
                state.set_message(messages::QUIZ_CREATE_FAILED);
                None
            }
        },
        Outcome::QuizDeleted { quiz_id, result } => match result {
            Ok(()) => {
                state.set_message(messages::quiz_deleted(quiz_id));
                state.admin.delete_quiz_id = None;
                Some(state.issue(CallClass::Catalog, Request::ListQuizzes))
            }
            Err(err) => {
                warn!(quiz_id = %quiz_id, error = %err, "quiz deletion failed");
                state.set_message(messages::DELETE_FAILED);
                None
            }
        },
    }
}

#[cfg(test)]
#[path = "../tests/reducer_tests.rs"]
mod tests;
