//! Executes backend calls produced by the reducer and feeds their completions back.

use std::sync::Arc;

use thiserror::Error;
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};
use tracing::debug;

use crate::{
    controller::{
        events::{Action, BackendCall, Completion, Outcome, Request},
        reducer,
        state::AppState,
    },
    QuizBackend,
};

const ACTION_QUEUE_CAPACITY: usize = 64;

/// Runs one backend call. Never fails: transport and backend failures are
/// carried inside the returned [`Outcome`].
pub async fn execute<B: QuizBackend + ?Sized>(backend: &B, call: BackendCall) -> Completion {
    let BackendCall { ticket, request } = call;
    debug!(ticket = ticket.id, class = ?ticket.class, "issuing backend call");
    let outcome = match request {
        Request::Register(request) => Outcome::Registered(backend.register(&request).await),
        Request::Login(request) => {
            let result = backend.login(&request).await;
            Outcome::LoggedIn {
                typed_username: request.username,
                result,
            }
        }
        Request::ListQuizzes => Outcome::Catalog(backend.list_quizzes().await),
        Request::FetchQuiz(quiz_id) => Outcome::Questions {
            quiz_id,
            result: backend.fetch_quiz(quiz_id).await,
        },
        Request::Submit {
            quiz_id,
            username,
            answers,
        } => Outcome::Scored(backend.submit_quiz(quiz_id, &username, &answers).await),
        Request::ListAttempts { username } => {
            Outcome::Attempts(backend.list_attempts(&username).await)
        }
        Request::CreateQuestion { username, form } => {
            Outcome::QuestionCreated(backend.create_question(&username, &form).await)
        }
        Request::CreateQuiz { username, request } => {
            Outcome::QuizCreated(backend.create_quiz(&username, &request).await)
        }
        Request::DeleteQuiz { username, quiz_id } => Outcome::QuizDeleted {
            quiz_id,
            result: backend.delete_quiz(&username, quiz_id).await,
        },
    };
    Completion { ticket, outcome }
}

/// Sequential driver: each dispatch runs its calls, follow-ups included, to
/// completion before returning.
pub struct QuizController<B: ?Sized> {
    backend: Arc<B>,
    state: AppState,
}

impl<B: QuizBackend + ?Sized> QuizController<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            state: AppState::default(),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub async fn dispatch(&mut self, action: Action) -> &AppState {
        let mut next = reducer::reduce(&mut self.state, action);
        while let Some(call) = next.take() {
            let completion = execute(self.backend.as_ref(), call).await;
            next = reducer::apply(&mut self.state, completion);
        }
        &self.state
    }
}

#[derive(Debug, Error)]
#[error("controller task has stopped")]
pub struct ControllerClosed;

/// Front-end side of a spawned controller actor.
#[derive(Clone)]
pub struct ControllerHandle {
    actions: mpsc::Sender<Action>,
    snapshots: watch::Receiver<AppState>,
}

impl ControllerHandle {
    pub async fn send(&self, action: Action) -> Result<(), ControllerClosed> {
        self.actions.send(action).await.map_err(|_| ControllerClosed)
    }

    /// Latest published state.
    pub fn snapshot(&self) -> AppState {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AppState> {
        self.snapshots.clone()
    }
}

/// Spawns the single actor that owns [`AppState`].
///
/// Actions and completions are processed one at a time on the actor; each
/// backend call runs on its own task so the actor keeps accepting actions while
/// calls are pending. The actor stops once every handle is dropped.
pub fn spawn_controller<B>(backend: Arc<B>) -> (ControllerHandle, JoinHandle<()>)
where
    B: QuizBackend + ?Sized + 'static,
{
    let (action_tx, mut action_rx) = mpsc::channel::<Action>(ACTION_QUEUE_CAPACITY);
    let (completion_tx, mut completion_rx) = mpsc::unbounded_channel::<Completion>();
    let (snapshot_tx, snapshot_rx) = watch::channel(AppState::default());

    let task = tokio::spawn(async move {
        let mut state = AppState::default();
        loop {
            let next = tokio::select! {
                action = action_rx.recv() => match action {
                    Some(action) => reducer::reduce(&mut state, action),
                    None => break,
                },
                Some(completion) = completion_rx.recv() => reducer::apply(&mut state, completion),
            };

            if let Some(call) = next {
                let backend = Arc::clone(&backend);
                let completion_tx = completion_tx.clone();
                tokio::spawn(async move {
                    let completion = execute(backend.as_ref(), call).await;
                    let _ = completion_tx.send(completion);
                });
            }

            snapshot_tx.send_if_modified(|published| {
                if *published == state {
                    false
                } else {
                    *published = state.clone();
                    true
                }
            });
        }
        debug!("controller actor stopped");
    });

    (
        ControllerHandle {
            actions: action_tx,
            snapshots: snapshot_rx,
        },
        task,
    )
}

#[cfg(test)]
#[path = "../tests/orchestration_tests.rs"]
mod tests;
