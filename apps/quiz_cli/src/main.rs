use std::{path::PathBuf, sync::Arc};

use anyhow::Result;
use clap::Parser;
use client_core::{
    controller::events::Action, spawn_controller, AppState, ControllerHandle, HttpQuizBackend,
};
use shared::protocol::QuestionForm;
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin},
    sync::watch,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod render;

use commands::{Command, HELP};
use config::load_settings;

#[derive(Parser, Debug)]
#[command(about = "Terminal client for the quiz service")]
struct Args {
    /// Backend base URL, overrides quiz.toml and the environment.
    #[arg(long)]
    server_url: Option<String>,
    /// Path to a TOML config file (defaults to ./quiz.toml when present).
    #[arg(long)]
    config: Option<PathBuf>,
}

type InputLines = Lines<BufReader<Stdin>>;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let settings = load_settings(args.config.as_deref(), args.server_url)?;
    info!(
        server_url = %settings.server_url,
        timeout_secs = ?settings.request_timeout_secs,
        "starting quiz client"
    );

    let backend = HttpQuizBackend::with_timeout(&settings.server_url, settings.request_timeout())?;
    let (handle, actor) = spawn_controller(Arc::new(backend));

    println!("{}", render::render(&handle.snapshot()));
    let renderer = tokio::spawn(render_snapshots(handle.subscribe()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match commands::parse(&line, &handle.snapshot()) {
            Ok(Command::Dispatch(actions)) => send_all(&handle, actions).await?,
            Ok(Command::AddQuestion) => {
                let Some(form) = prompt_question(&mut lines).await? else {
                    break;
                };
                send_all(
                    &handle,
                    vec![Action::EditQuestionForm(form), Action::CreateQuestion],
                )
                .await?;
            }
            Ok(Command::Help) => println!("{HELP}"),
            Ok(Command::Quit) => break,
            Ok(Command::Nothing) => {}
            Err(err) => println!("{err}"),
        }
    }

    drop(handle);
    if let Err(err) = actor.await {
        warn!(error = %err, "controller task ended abnormally");
    }
    renderer.abort();
    info!("quiz client stopped");
    Ok(())
}

async fn send_all(handle: &ControllerHandle, actions: Vec<Action>) -> Result<()> {
    for action in actions {
        handle.send(action).await?;
    }
    Ok(())
}

/// Re-renders whenever the controller publishes a new state.
async fn render_snapshots(mut snapshots: watch::Receiver<AppState>) {
    while snapshots.changed().await.is_ok() {
        let text = render::render(&snapshots.borrow_and_update());
        println!("{text}");
    }
}

/// Collects the question form field by field. `None` when stdin closes midway.
async fn prompt_question(lines: &mut InputLines) -> Result<Option<QuestionForm>> {
    let mut values = Vec::with_capacity(QUESTION_FIELDS.len());
    let mut stdout = tokio::io::stdout();
    for label in QUESTION_FIELDS {
        stdout.write_all(format!("{label}: ").as_bytes()).await?;
        stdout.flush().await?;
        let Some(line) = lines.next_line().await? else {
            return Ok(None);
        };
        values.push(line.trim().to_string());
    }

    let [question_title, category, difficulty_level, option1, option2, option3, option4, right_answer] =
        <[String; 8]>::try_from(values).map_err(|_| anyhow::anyhow!("incomplete question form"))?;
    Ok(Some(QuestionForm {
        question_title,
        category,
        difficulty_level,
        option1,
        option2,
        option3,
        option4,
        right_answer,
    }))
}

const QUESTION_FIELDS: [&str; 8] = [
    "question",
    "category",
    "difficulty",
    "option 1",
    "option 2",
    "option 3",
    "option 4",
    "right answer",
];
