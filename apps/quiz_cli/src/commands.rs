//! Line commands typed at the prompt, translated into controller actions.

use client_core::{
    can_perform_admin_action,
    controller::{events::Action, reducer::messages, state::QuizDraft},
    AppState, View,
};
use shared::domain::{QuizId, Role};
use thiserror::Error;

pub const HELP: &str = "\
commands:
  login <user> <password>              log in
  register <user> <password> [ROLE]    create an account (USER or ADMIN)
  to-register | to-login               switch between the login and register forms
  quizzes                              refresh the quiz list
  select <id>                          select a quiz
  start [id]                           load the selected quiz
  answer <n> <1-4>                     choose an option for question n
  submit                               submit your answers
  attempts                             show your past attempts
  back                                 return to the dashboard
  logout                               end the session
  add-question                         create a question (admin, prompts for fields)
  create-quiz <category> <n> <title>   create a quiz from n random questions (admin)
  delete-quiz [id]                     delete a quiz (admin)
  help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Dispatch(Vec<Action>),
    /// Interactive question form; the prompt loop collects the fields.
    AddQuestion,
    Help,
    Quit,
    Nothing,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("unknown command '{0}', type 'help' for the list")]
    Unknown(String),
    #[error("'{0}' is not a number")]
    NotANumber(String),
    #[error("unknown role '{0}', expected USER or ADMIN")]
    InvalidRole(String),
    #[error("no quiz is loaded")]
    NoQuizLoaded,
    #[error("question {number} does not exist, the quiz has {total}")]
    NoSuchQuestion { number: usize, total: usize },
    #[error("{}", messages::ADMIN_REQUIRED)]
    AdminRequired,
    #[error("questions can only be added from the dashboard")]
    NotOnDashboard,
}

/// Parses one input line. `state` is the latest snapshot; `answer` needs it
/// to turn display numbers into question ids and option text.
pub fn parse(line: &str, state: &AppState) -> Result<Command, CommandError> {
    let mut words = line.split_whitespace();
    let Some(name) = words.next() else {
        return Ok(Command::Nothing);
    };
    let args: Vec<&str> = words.collect();

    let actions = match (name.to_ascii_lowercase().as_str(), args.as_slice()) {
        ("help" | "?", _) => return Ok(Command::Help),
        ("quit" | "exit", _) => return Ok(Command::Quit),
        // Gated here so the form is never prompted for a call the reducer would refuse.
        ("add-question", []) if state.view != View::Dashboard => {
            return Err(CommandError::NotOnDashboard)
        }
        ("add-question", []) if !can_perform_admin_action(&state.session) => {
            return Err(CommandError::AdminRequired)
        }
        ("add-question", []) => return Ok(Command::AddQuestion),
        ("login", [username, password]) => vec![
            Action::EditUsername(username.to_string()),
            Action::EditPassword(password.to_string()),
            Action::Login,
        ],
        ("login", _) => return Err(CommandError::Usage("login <user> <password>")),
        ("register", [username, password, rest @ ..]) if rest.len() <= 1 => {
            let role = match rest.first() {
                Some(raw) => {
                    Role::parse(raw).ok_or_else(|| CommandError::InvalidRole(raw.to_string()))?
                }
                None => Role::User,
            };
            vec![
                Action::EditUsername(username.to_string()),
                Action::EditPassword(password.to_string()),
                Action::EditRole(role),
                Action::Register,
            ]
        }
        ("register", _) => {
            return Err(CommandError::Usage("register <user> <password> [USER|ADMIN]"))
        }
        ("to-register", []) => vec![Action::SwitchToRegister],
        ("to-login", []) => vec![Action::SwitchToLogin],
        ("quizzes", []) => vec![Action::RefreshCatalog],
        ("select", []) => vec![Action::SelectQuiz(None)],
        ("select", [id]) => vec![Action::SelectQuiz(Some(quiz_id(id)?))],
        ("start", []) => vec![Action::FetchQuiz],
        ("start", [id]) => vec![Action::SelectQuiz(Some(quiz_id(id)?)), Action::FetchQuiz],
        ("answer", [number, option]) => vec![answer(state, number, option)?],
        ("answer", _) => return Err(CommandError::Usage("answer <n> <1-4>")),
        ("submit", []) => vec![Action::Submit],
        ("attempts", []) => vec![Action::LoadAttempts],
        ("back", []) => vec![Action::BackToDashboard],
        ("logout", []) => vec![Action::Logout],
        ("create-quiz", [category, count, title @ ..]) if !title.is_empty() => {
            let num_questions = count
                .parse::<u32>()
                .map_err(|_| CommandError::NotANumber(count.to_string()))?;
            vec![
                Action::EditQuizDraft(QuizDraft {
                    category: category.to_string(),
                    num_questions,
                    title: title.join(" "),
                }),
                Action::CreateQuiz,
            ]
        }
        ("create-quiz", _) => {
            return Err(CommandError::Usage("create-quiz <category> <n> <title...>"))
        }
        ("delete-quiz", []) => vec![Action::EditDeleteQuizId(None), Action::DeleteQuiz],
        ("delete-quiz", [id]) => vec![
            Action::EditDeleteQuizId(Some(quiz_id(id)?)),
            Action::DeleteQuiz,
        ],
        (other, _) => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Command::Dispatch(actions))
}

fn quiz_id(raw: &str) -> Result<QuizId, CommandError> {
    raw.parse::<i64>()
        .map(QuizId)
        .map_err(|_| CommandError::NotANumber(raw.to_string()))
}

fn answer(state: &AppState, number: &str, option: &str) -> Result<Action, CommandError> {
    let quiz = state.quiz.as_ref().ok_or(CommandError::NoQuizLoaded)?;
    let number: usize = number
        .parse()
        .map_err(|_| CommandError::NotANumber(number.to_string()))?;
    let total = quiz.questions().len();
    let question = number
        .checked_sub(1)
        .and_then(|index| quiz.questions().get(index))
        .ok_or(CommandError::NoSuchQuestion { number, total })?;

    let choice = match option.parse::<usize>() {
        Ok(choice @ 1..=4) => choice,
        _ => return Err(CommandError::Usage("answer <n> <1-4>")),
    };
    Ok(Action::RecordAnswer {
        question_id: question.id,
        option: question.options()[choice - 1].to_string(),
    })
}

#[cfg(test)]
#[path = "tests/commands_tests.rs"]
mod tests;
