use super::*;
use client_core::controller::state::{QuizSession, SessionState};
use shared::{domain::QuestionId, protocol::QuestionView};

fn quiz_state() -> AppState {
    let question = |id: i64| QuestionView {
        id: QuestionId(id),
        question_title: format!("question {id}"),
        category: String::new(),
        difficulty_level: String::new(),
        option1: "red".into(),
        option2: "green".into(),
        option3: "blue".into(),
        option4: "black".into(),
    };
    let mut state = AppState::default();
    state.quiz = Some(QuizSession::new(QuizId(3), vec![question(21), question(22)]));
    state
}

fn dispatch(line: &str) -> Vec<Action> {
    match parse(line, &AppState::default()).expect("parse") {
        Command::Dispatch(actions) => actions,
        other => panic!("expected actions, got {other:?}"),
    }
}

#[test]
fn blank_lines_do_nothing() {
    assert_eq!(parse("   ", &AppState::default()), Ok(Command::Nothing));
}

#[test]
fn login_fills_credentials_then_submits() {
    assert_eq!(
        dispatch("login amy secret"),
        vec![
            Action::EditUsername("amy".into()),
            Action::EditPassword("secret".into()),
            Action::Login,
        ]
    );
    assert_eq!(
        parse("login amy", &AppState::default()),
        Err(CommandError::Usage("login <user> <password>"))
    );
}

#[test]
fn register_role_defaults_to_user_and_is_case_insensitive() {
    assert!(dispatch("register amy pw").contains(&Action::EditRole(Role::User)));
    assert!(dispatch("REGISTER root pw admin").contains(&Action::EditRole(Role::Admin)));
    assert_eq!(
        parse("register amy pw owner", &AppState::default()),
        Err(CommandError::InvalidRole("owner".into()))
    );
}

#[test]
fn start_with_id_selects_before_fetching() {
    assert_eq!(
        dispatch("start 4"),
        vec![Action::SelectQuiz(Some(QuizId(4))), Action::FetchQuiz]
    );
    assert_eq!(
        parse("select four", &AppState::default()),
        Err(CommandError::NotANumber("four".into()))
    );
}

#[test]
fn answer_maps_display_numbers_to_question_ids_and_option_text() {
    let state = quiz_state();
    assert_eq!(
        parse("answer 2 3", &state),
        Ok(Command::Dispatch(vec![Action::RecordAnswer {
            question_id: QuestionId(22),
            option: "blue".into(),
        }]))
    );
}

#[test]
fn answer_rejects_out_of_range_input() {
    let state = quiz_state();
    assert_eq!(
        parse("answer 3 1", &state),
        Err(CommandError::NoSuchQuestion {
            number: 3,
            total: 2
        })
    );
    assert_eq!(
        parse("answer 0 1", &state),
        Err(CommandError::NoSuchQuestion {
            number: 0,
            total: 2
        })
    );
    assert_eq!(
        parse("answer 1 5", &state),
        Err(CommandError::Usage("answer <n> <1-4>"))
    );
    assert_eq!(
        parse("answer 1 1", &AppState::default()),
        Err(CommandError::NoQuizLoaded)
    );
}

#[test]
fn create_quiz_joins_title_words() {
    assert_eq!(
        dispatch("create-quiz java 5 Java Collections Basics"),
        vec![
            Action::EditQuizDraft(QuizDraft {
                category: "java".into(),
                num_questions: 5,
                title: "Java Collections Basics".into(),
            }),
            Action::CreateQuiz,
        ]
    );
    assert!(parse("create-quiz java 5", &AppState::default()).is_err());
}

#[test]
fn delete_quiz_without_id_clears_the_field() {
    assert_eq!(
        dispatch("delete-quiz"),
        vec![Action::EditDeleteQuizId(None), Action::DeleteQuiz]
    );
    assert_eq!(
        dispatch("delete-quiz 9"),
        vec![Action::EditDeleteQuizId(Some(QuizId(9))), Action::DeleteQuiz]
    );
}

#[test]
fn control_commands() {
    let state = AppState::default();
    assert_eq!(parse("help", &state), Ok(Command::Help));
    assert_eq!(parse("quit", &state), Ok(Command::Quit));
    assert_eq!(
        parse("dance", &state),
        Err(CommandError::Unknown("dance".into()))
    );
}

#[test]
fn add_question_requires_an_admin_on_the_dashboard() {
    assert_eq!(
        parse("add-question", &AppState::default()),
        Err(CommandError::NotOnDashboard)
    );

    let mut state = AppState::default();
    state.view = View::Dashboard;
    state.session = SessionState::authenticated("amy", Role::User);
    assert_eq!(
        parse("add-question", &state),
        Err(CommandError::AdminRequired)
    );
    assert_eq!(
        CommandError::AdminRequired.to_string(),
        "You must be logged in as ADMIN."
    );

    state.session = SessionState::authenticated("root", Role::Admin);
    assert_eq!(parse("add-question", &state), Ok(Command::AddQuestion));

    state.view = View::Attempts;
    assert_eq!(
        parse("add-question", &state),
        Err(CommandError::NotOnDashboard)
    );
}
