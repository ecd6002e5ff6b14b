use std::collections::HashMap;
use std::sync::Arc;

use super::*;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use shared::domain::{AttemptId, QuestionId, Role};
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Debug, Clone, PartialEq)]
enum Captured {
    Submit {
        quiz_id: i64,
        query: HashMap<String, String>,
        answers: Vec<AnswerEntry>,
    },
    Attempts {
        username: String,
    },
    CreateQuiz {
        query: HashMap<String, String>,
    },
    CreateQuestion {
        query: HashMap<String, String>,
        form: QuestionForm,
    },
    Delete {
        quiz_id: i64,
        query: HashMap<String, String>,
    },
}

#[derive(Clone, Default)]
struct Recorder {
    calls: Arc<Mutex<Vec<Captured>>>,
}

impl Recorder {
    async fn take(&self) -> Vec<Captured> {
        std::mem::take(&mut *self.calls.lock().await)
    }
}

async fn spawn_backend(app: Router) -> String {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

async fn handle_submit(
    State(recorder): State<Recorder>,
    Path(quiz_id): Path<i64>,
    Query(query): Query<HashMap<String, String>>,
    Json(answers): Json<Vec<AnswerEntry>>,
) -> Json<QuizResult> {
    let score = answers.iter().filter(|entry| entry.answer == "4").count() as u32;
    let total_questions = answers.len() as u32;
    recorder.calls.lock().await.push(Captured::Submit {
        quiz_id,
        query,
        answers,
    });
    Json(QuizResult {
        score,
        total_questions,
    })
}

async fn handle_attempts(
    State(recorder): State<Recorder>,
    Path(username): Path<String>,
) -> Json<Vec<AttemptSummary>> {
    recorder.calls.lock().await.push(Captured::Attempts {
        username: username.clone(),
    });
    Json(vec![AttemptSummary {
        attempt_id: AttemptId(1),
        quiz_id: QuizId(3),
        quiz_title: "Rust basics".into(),
        score: 2,
        total_questions: 3,
        attempted_at: "2025-03-01T09:30:00".into(),
    }])
}

async fn handle_create_quiz(
    State(recorder): State<Recorder>,
    Query(query): Query<HashMap<String, String>>,
) -> StatusCode {
    recorder
        .calls
        .lock()
        .await
        .push(Captured::CreateQuiz { query });
    StatusCode::CREATED
}

async fn handle_create_question(
    State(recorder): State<Recorder>,
    Query(query): Query<HashMap<String, String>>,
    Json(form): Json<QuestionForm>,
) -> StatusCode {
    recorder
        .calls
        .lock()
        .await
        .push(Captured::CreateQuestion { query, form });
    StatusCode::CREATED
}

async fn handle_delete(
    State(recorder): State<Recorder>,
    Path(quiz_id): Path<i64>,
    Query(query): Query<HashMap<String, String>>,
) -> StatusCode {
    recorder
        .calls
        .lock()
        .await
        .push(Captured::Delete { quiz_id, query });
    StatusCode::NO_CONTENT
}

async fn handle_login(Json(request): Json<LoginRequest>) -> (StatusCode, String) {
    match (request.username.as_str(), request.password.as_str()) {
        ("root", "secret") => (
            StatusCode::OK,
            r#"{"username":"root","role":"ADMIN"}"#.to_string(),
        ),
        ("quiet", "secret") => (StatusCode::OK, String::new()),
        ("plain", _) => (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string()),
        _ => (
            StatusCode::UNAUTHORIZED,
            serde_json::json!({ "message": "User not found" }).to_string(),
        ),
    }
}

fn recording_router(recorder: Recorder) -> Router {
    Router::new()
        .route("/quiz/submit/:quiz_id", post(handle_submit))
        .route("/user/:username/attempts", get(handle_attempts))
        .route("/quiz/create", post(handle_create_quiz))
        .route("/question/add", post(handle_create_question))
        .route("/quiz/delete/:quiz_id", delete(handle_delete))
        .route("/user/login", post(handle_login))
        .route("/quiz/all", get(|| async { "definitely not json" }))
        .route(
            "/user/create",
            post(|| async { (StatusCode::CONFLICT, "") }),
        )
        .with_state(recorder)
}

#[tokio::test]
async fn submit_posts_every_answer_with_username_query() {
    let recorder = Recorder::default();
    let server_url = spawn_backend(recording_router(recorder.clone())).await;
    let backend = HttpQuizBackend::new(&server_url).expect("backend");

    let answers = vec![
        AnswerEntry {
            id: QuestionId(1),
            answer: "4".into(),
        },
        AnswerEntry {
            id: QuestionId(2),
            answer: String::new(),
        },
    ];
    let result = backend
        .submit_quiz(QuizId(7), "amy", &answers)
        .await
        .expect("submit");

    assert_eq!(
        result,
        QuizResult {
            score: 1,
            total_questions: 2
        }
    );
    let calls = recorder.take().await;
    assert_eq!(
        calls,
        vec![Captured::Submit {
            quiz_id: 7,
            query: HashMap::from([("username".to_string(), "amy".to_string())]),
            answers,
        }]
    );
}

#[tokio::test]
async fn attempts_path_encodes_username() {
    let recorder = Recorder::default();
    let server_url = spawn_backend(recording_router(recorder.clone())).await;
    let backend = HttpQuizBackend::new(&server_url).expect("backend");

    let attempts = backend.list_attempts("jane doe/2").await.expect("attempts");

    assert_eq!(attempts.len(), 1);
    assert_eq!(attempts[0].quiz_title, "Rust basics");
    assert_eq!(
        recorder.take().await,
        vec![Captured::Attempts {
            username: "jane doe/2".into()
        }]
    );
}

#[tokio::test]
async fn create_quiz_sends_query_parameters_without_body() {
    let recorder = Recorder::default();
    let server_url = spawn_backend(recording_router(recorder.clone())).await;
    let backend = HttpQuizBackend::new(&server_url).expect("backend");

    backend
        .create_quiz(
            "root",
            &CreateQuizRequest {
                category: "Java & JVM".into(),
                num_questions: 3,
                title: "Warm up".into(),
            },
        )
        .await
        .expect("create quiz");

    let calls = recorder.take().await;
    let [Captured::CreateQuiz { query }] = calls.as_slice() else {
        panic!("unexpected calls: {calls:?}");
    };
    assert_eq!(query.get("username").map(String::as_str), Some("root"));
    assert_eq!(query.get("category").map(String::as_str), Some("Java & JVM"));
    assert_eq!(query.get("numQ").map(String::as_str), Some("3"));
    assert_eq!(query.get("title").map(String::as_str), Some("Warm up"));
}

#[tokio::test]
async fn create_question_and_delete_quiz_carry_username() {
    let recorder = Recorder::default();
    let server_url = spawn_backend(recording_router(recorder.clone())).await;
    let backend = HttpQuizBackend::new(&server_url).expect("backend");
    let form = QuestionForm {
        question_title: "2 + 2?".into(),
        category: "math".into(),
        difficulty_level: "easy".into(),
        option1: "3".into(),
        option2: "4".into(),
        option3: "5".into(),
        option4: "6".into(),
        right_answer: "4".into(),
    };

    backend.create_question("root", &form).await.expect("create");
    backend.delete_quiz("root", QuizId(12)).await.expect("delete");

    let username = HashMap::from([("username".to_string(), "root".to_string())]);
    assert_eq!(
        recorder.take().await,
        vec![
            Captured::CreateQuestion {
                query: username.clone(),
                form,
            },
            Captured::Delete {
                quiz_id: 12,
                query: username,
            },
        ]
    );
}

#[tokio::test]
async fn login_decodes_identity_and_tolerates_empty_body() {
    let server_url = spawn_backend(recording_router(Recorder::default())).await;
    let backend = HttpQuizBackend::new(&server_url).expect("backend");

    let body = backend
        .login(&LoginRequest {
            username: "root".into(),
            password: "secret".into(),
        })
        .await
        .expect("login");
    assert_eq!(body.username.as_deref(), Some("root"));
    assert_eq!(body.role, Some(Role::Admin));

    let body = backend
        .login(&LoginRequest {
            username: "quiet".into(),
            password: "secret".into(),
        })
        .await
        .expect("login");
    assert_eq!(body, LoginResponse::default());
}

#[tokio::test]
async fn rejections_carry_structured_or_plain_server_messages() {
    let server_url = spawn_backend(recording_router(Recorder::default())).await;
    let backend = HttpQuizBackend::new(&server_url).expect("backend");

    let err = backend
        .login(&LoginRequest {
            username: "ghost".into(),
            password: "x".into(),
        })
        .await
        .expect_err("unknown user");
    assert_eq!(err.server_message(), Some("User not found"));

    let err = backend
        .login(&LoginRequest {
            username: "plain".into(),
            password: "x".into(),
        })
        .await
        .expect_err("bad password");
    assert_eq!(err.server_message(), Some("Invalid credentials"));

    let err = backend
        .register(&RegisterRequest {
            username: "amy".into(),
            password: "pw".into(),
            role: Role::User,
        })
        .await
        .expect_err("conflict");
    assert_eq!(
        err,
        BackendError::Rejected {
            status: 409,
            message: None
        }
    );
}

#[tokio::test]
async fn unexpected_response_shape_is_a_decode_error() {
    let server_url = spawn_backend(recording_router(Recorder::default())).await;
    let backend = HttpQuizBackend::new(&server_url).expect("backend");

    let err = backend.list_quizzes().await.expect_err("not json");
    assert!(matches!(err, BackendError::Decode(_)), "got {err:?}");
}

#[tokio::test]
async fn unreachable_backend_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let backend = HttpQuizBackend::new(&format!("http://{addr}")).expect("backend");
    let err = backend.list_quizzes().await.expect_err("nothing listening");
    assert!(matches!(err, BackendError::Transport(_)), "got {err:?}");
}

#[test]
fn endpoints_extend_base_path() {
    let backend = HttpQuizBackend::new("http://quiz.local:8080/api/").expect("backend");
    let url = backend.endpoint(&["quiz", "getQuiz", "5"]).expect("url");
    assert_eq!(url.as_str(), "http://quiz.local:8080/api/quiz/getQuiz/5");

    let backend = HttpQuizBackend::new("http://quiz.local:8080").expect("backend");
    let url = backend.endpoint(&["quiz", "all"]).expect("url");
    assert_eq!(url.as_str(), "http://quiz.local:8080/quiz/all");
}

#[test]
fn rejects_urls_that_cannot_be_a_base() {
    assert!(matches!(
        HttpQuizBackend::new("mailto:quiz@example.com"),
        Err(BackendError::InvalidUrl(_))
    ));
    assert!(matches!(
        HttpQuizBackend::new("not a url"),
        Err(BackendError::InvalidUrl(_))
    ));
}
