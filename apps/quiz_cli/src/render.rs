use std::fmt::Write as _;

use client_core::{can_perform_admin_action, controller::state::QuizSession, AppState, View};

/// Text rendering of the current view, banner first.
pub fn render(state: &AppState) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "==== {} ====", heading(state));
    if let Some(message) = &state.message {
        let _ = writeln!(out, "! {message}");
    }
    if state.has_pending_calls() {
        let _ = writeln!(out, "(waiting for the server...)");
    }

    match state.view {
        View::Login => {
            let _ = writeln!(out, "login <user> <password>, or to-register");
        }
        View::Register => {
            let _ = writeln!(
                out,
                "register <user> <password> [USER|ADMIN], or to-login (role: {})",
                state.credentials.role
            );
        }
        View::Dashboard => render_dashboard(&mut out, state),
        View::Quiz => match &state.quiz {
            Some(quiz) => render_quiz(&mut out, state, quiz),
            None => {
                let _ = writeln!(out, "No quiz loaded.");
            }
        },
        View::Attempts => render_attempts(&mut out, state),
    }
    out
}

fn heading(state: &AppState) -> String {
    match (state.view, state.session.identity()) {
        (View::Login, _) => "Login".into(),
        (View::Register, _) => "Register".into(),
        (view, Some(identity)) => format!(
            "{} | {} ({})",
            title_case(view.label()),
            identity.username,
            identity.role
        ),
        (view, None) => title_case(view.label()),
    }
}

fn title_case(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn render_dashboard(out: &mut String, state: &AppState) {
    if state.catalog.is_empty() {
        let _ = writeln!(out, "No quizzes available.");
    } else {
        let _ = writeln!(out, "Quizzes:");
        for quiz in &state.catalog {
            let marker = if state.selected_quiz == Some(quiz.id) {
                '*'
            } else {
                ' '
            };
            let _ = write!(out, " {marker} [{}] {}", quiz.id, quiz.title);
            if !quiz.category.is_empty() {
                let _ = write!(out, " ({})", quiz.category);
            }
            let _ = writeln!(out);
        }
    }
    let _ = writeln!(out, "select <id>, start, attempts, quizzes, logout");

    if can_perform_admin_action(&state.session) {
        let draft = &state.admin.quiz;
        let _ = writeln!(
            out,
            "admin: add-question | create-quiz <category> <n> <title> (last: {} x{}) | delete-quiz <id>",
            if draft.title.is_empty() { "-" } else { draft.title.as_str() },
            draft.num_questions
        );
    }
}

fn render_quiz(out: &mut String, state: &AppState, quiz: &QuizSession) {
    let title = state
        .catalog
        .iter()
        .find(|summary| summary.id == quiz.quiz_id())
        .map(|summary| summary.title.as_str())
        .unwrap_or("Quiz");
    let _ = writeln!(
        out,
        "{title}: {}/{} answered",
        quiz.answered_count(),
        quiz.questions().len()
    );

    for (index, question) in quiz.questions().iter().enumerate() {
        let _ = writeln!(out, "Q{}. {}", index + 1, question.question_title);
        let chosen = quiz.answer(question.id);
        for (option_index, option) in question.options().iter().enumerate() {
            let mark = if chosen == Some(*option) { 'x' } else { ' ' };
            let _ = writeln!(out, "   ({mark}) {}. {option}", option_index + 1);
        }
    }

    if let Some(result) = quiz.result() {
        let _ = writeln!(
            out,
            "Score: {} / {}",
            result.score, result.total_questions
        );
    }
    let _ = writeln!(out, "answer <n> <1-4>, submit, back");
}

fn render_attempts(out: &mut String, state: &AppState) {
    if state.attempts.is_empty() {
        let _ = writeln!(out, "No attempts found.");
    } else {
        let _ = writeln!(out, "Quiz                      Score    Attempted at");
        for attempt in &state.attempts {
            let _ = writeln!(
                out,
                "{:<25} {:>3}/{:<4} {}",
                attempt.quiz_title, attempt.score, attempt.total_questions, attempt.attempted_at
            );
        }
    }
    let _ = writeln!(out, "back");
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
