use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    routing::post,
    Json, Router,
};
use quiz_forge::{
    middleware::rate_limit::GenerationLimiter,
    models::entity::Analysis,
    routes,
    services::{
        ai_service::GenerationClient,
        form_service::FormService,
        mcq_service::McqService,
        ner_service::{EntityRecognizer, RuleBasedRecognizer},
    },
    AppState,
};
use serde_json::{json, Value as JsonValue};
use tokio::net::TcpListener;
use tower::ServiceExt;

const BOUNDARY: &str = "quiz-forge-test-boundary";

const ARTICLE: &str = "Marie Curie won a prize in 1903 in Stockholm.\n\
                       The Treaty of Versailles was signed in Paris in 1919.\n\
                       NASA launched a rocket from Florida in 1969.";

/// Answers every prompt with a well-formed question built around the requested answer.
#[derive(Default)]
struct EchoGenerator {
    calls: AtomicUsize,
}

#[async_trait]
impl GenerationClient for EchoGenerator {
    async fn generate(&self, prompt: &str) -> quiz_forge::error::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let answer = prompt
            .split("exactly \"")
            .nth(1)
            .and_then(|rest| rest.split('"').next())
            .unwrap_or_default();
        let body = json!({
            "question": format!("Which of these is {}?", answer),
            "options": ["Alpha", "Beta", "Gamma", answer],
            "answer": answer,
        });
        Ok(format!("```json\n{}\n```", body))
    }
}

/// Rule-based recognizer that keeps a copy of every text it is asked to analyze.
struct RecordingRecognizer {
    inner: RuleBasedRecognizer,
    seen: Mutex<Vec<String>>,
}

impl EntityRecognizer for RecordingRecognizer {
    fn analyze(&self, text: &str) -> Analysis {
        self.seen.lock().unwrap().push(text.to_string());
        self.inner.analyze(text)
    }
}

fn build_app(
    recognizer: Arc<dyn EntityRecognizer>,
    form_url: Option<String>,
    max_questions: usize,
    limiter: GenerationLimiter,
) -> (Router, Arc<EchoGenerator>) {
    let generator = Arc::new(EchoGenerator::default());
    let mcq_service = McqService::new(recognizer, generator.clone());
    let form_service = FormService::new(form_url).expect("form service");
    let state = AppState::from_parts(mcq_service, form_service, max_questions);
    (routes::router(state, limiter), generator)
}

fn setup_app(form_url: Option<String>, max_questions: usize) -> (Router, Arc<EchoGenerator>) {
    let recognizer = RuleBasedRecognizer::new().expect("recognizer");
    build_app(
        Arc::new(recognizer),
        form_url,
        max_questions,
        GenerationLimiter::per_minute(0),
    )
}

/// Stand-in for the form-building web app; records every published batch.
async fn spawn_form_builder(
    status: StatusCode,
    reply: &'static str,
) -> (String, Arc<Mutex<Vec<JsonValue>>>) {
    let received = Arc::new(Mutex::new(Vec::new()));
    let store = received.clone();
    let app = Router::new().route(
        "/exec",
        post(move |Json(body): Json<JsonValue>| {
            let store = store.clone();
            async move {
                store.lock().unwrap().push(body);
                (status, reply)
            }
        }),
    );
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    (format!("http://{}/exec", addr), received)
}

enum Part<'a> {
    Field(&'a str, &'a str),
    File(&'a str, &'a str, &'a [u8]),
}

fn multipart_request(parts: &[Part<'_>]) -> Request<Body> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Field(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File(name, filename, data) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n",
                        name, filename
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri("/")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

fn json_request(body: JsonValue) -> Request<Body> {
    json_request_from(body, "198.51.100.1")
}

fn json_request_from(body: JsonValue, client: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/mcqs")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", client)
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn read_text(resp: axum::response::Response) -> String {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn read_json(resp: axum::response::Response) -> JsonValue {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_reports_publishing_state() {
    let (app, _) = setup_app(None, 20);
    let resp = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = read_json(resp).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["form_publishing"], false);
    assert_eq!(body["max_questions"], 20);
}

#[tokio::test]
async fn index_serves_upload_form() {
    let (app, _) = setup_app(None, 20);
    let resp = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let html = read_text(resp).await;
    assert!(html.contains(r#"name="files[]""#));
    assert!(html.contains(r#"name="num_questions""#));
}

#[tokio::test]
async fn api_generates_lettered_questions() {
    let (app, generator) = setup_app(None, 20);
    let resp = app
        .oneshot(json_request(json!({ "text": ARTICLE, "num_questions": 3 })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = read_json(resp).await;
    assert_eq!(body["requested"], 3);
    assert_eq!(body["generated"], 3);
    assert_eq!(generator.calls.load(Ordering::SeqCst), 3);

    for mcq in body["mcqs"].as_array().unwrap() {
        let options = mcq["options"].as_array().unwrap();
        assert_eq!(options.len(), 4);
        let letter = mcq["correct_letter"].as_str().unwrap();
        assert_eq!(letter.len(), 1);
        let index = (letter.as_bytes()[0] - b'A') as usize;
        let answer = options[index].as_str().unwrap();
        assert!(mcq["question"].as_str().unwrap().ends_with(&format!("{}?", answer)));
    }
}

#[tokio::test]
async fn api_caps_and_defaults_question_count() {
    let (app, _) = setup_app(None, 2);
    let resp = app
        .clone()
        .oneshot(json_request(json!({ "text": ARTICLE, "num_questions": 100 })))
        .await
        .unwrap();
    let body = read_json(resp).await;
    assert_eq!(body["requested"], 2);
    assert_eq!(body["generated"], 2);

    let (app, _) = setup_app(None, 20);
    let resp = app
        .oneshot(json_request(json!({ "text": ARTICLE, "num_questions": 0 })))
        .await
        .unwrap();
    let body = read_json(resp).await;
    assert_eq!(body["requested"], 5);
}

#[tokio::test]
async fn api_rejects_empty_text() {
    let (app, generator) = setup_app(None, 20);
    let resp = app.oneshot(json_request(json!({ "text": "" }))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn api_returns_empty_list_for_short_paragraphs() {
    let (app, generator) = setup_app(None, 20);
    let resp = app
        .oneshot(json_request(json!({ "text": "Paris 1919\nin Berlin\n" })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = read_json(resp).await;
    assert_eq!(body["generated"], 0);
    assert_eq!(body["mcqs"], json!([]));
    assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn submit_text_renders_questions_when_publishing_disabled() {
    let (app, _) = setup_app(None, 20);
    let resp = app
        .oneshot(multipart_request(&[
            Part::File("files[]", "", b""),
            Part::Field("text", ARTICLE),
            Part::Field("num_questions", "2"),
        ]))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let html = read_text(resp).await;
    assert!(html.contains("Generated 2 questions"));
    assert!(html.contains("Answer: "));
}

#[tokio::test]
async fn submit_without_input_is_rejected() {
    let (app, _) = setup_app(None, 20);
    let resp = app
        .oneshot(multipart_request(&[Part::Field("num_questions", "3")]))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn submit_rejects_unreadable_pdf() {
    let (app, generator) = setup_app(None, 20);
    let resp = app
        .oneshot(multipart_request(&[Part::File(
            "files[]",
            "notes.pdf",
            b"this is not a pdf document",
        )]))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = read_json(resp).await;
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Failed to process PDF"));
    assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn submit_publishes_questions_from_uploaded_text() {
    let (form_url, received) =
        spawn_form_builder(StatusCode::OK, "https://forms.example.com/d/quiz-1\n").await;
    let (app, _) = setup_app(Some(form_url), 20);

    let resp = app
        .oneshot(multipart_request(&[
            Part::File("files[]", "article.txt", ARTICLE.as_bytes()),
            Part::File("files[]", "cover.docx", b"ignored"),
            Part::Field("num_questions", "3"),
        ]))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let html = read_text(resp).await;
    assert!(html.contains(r#"<a href="https://forms.example.com/d/quiz-1""#));

    let batches = received.lock().unwrap();
    assert_eq!(batches.len(), 1);
    let entries = batches[0].as_array().unwrap();
    assert_eq!(entries.len(), 3);
    for entry in entries {
        let pair = entry.as_array().unwrap();
        assert_eq!(pair.len(), 2);
        assert!(pair[0].is_string());
        assert_eq!(pair[1].as_array().unwrap().len(), 4);
    }
}

#[tokio::test]
async fn submit_reports_publishing_failure_inline() {
    let (form_url, _) =
        spawn_form_builder(StatusCode::INTERNAL_SERVER_ERROR, "script quota exceeded").await;
    let (app, _) = setup_app(Some(form_url), 20);

    let resp = app
        .oneshot(multipart_request(&[
            Part::Field("text", ARTICLE),
            Part::Field("num_questions", "1"),
        ]))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let html = read_text(resp).await;
    assert!(html.contains("Error creating form: script quota exceeded"));
}

#[tokio::test]
async fn uploaded_files_are_read_in_order() {
    let recognizer = Arc::new(RecordingRecognizer {
        inner: RuleBasedRecognizer::new().expect("recognizer"),
        seen: Mutex::new(Vec::new()),
    });
    let (app, _) = build_app(
        recognizer.clone(),
        None,
        20,
        GenerationLimiter::per_minute(0),
    );

    let resp = app
        .oneshot(multipart_request(&[
            Part::File("files[]", "first.txt", "Marie Curie won a prize in 1903 in Stockholm.".as_bytes()),
            Part::File("files[]", "notes.docx", b"skipped"),
            Part::File("files[]", "second.txt", "NASA launched a rocket from Florida in 1969.".as_bytes()),
            Part::Field("text", "This pasted text is ignored when files are present."),
        ]))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let seen = recognizer.seen.lock().unwrap();
    assert_eq!(
        seen.as_slice(),
        ["Marie Curie won a prize in 1903 in Stockholm. NASA launched a rocket from Florida in 1969."]
    );
}

#[tokio::test]
async fn generation_routes_are_limited_per_client() {
    let recognizer = RuleBasedRecognizer::new().expect("recognizer");
    let (app, generator) = build_app(
        Arc::new(recognizer),
        None,
        1,
        GenerationLimiter::per_minute(2),
    );
    let body = json!({ "text": ARTICLE, "num_questions": 1 });

    for _ in 0..2 {
        let resp = app
            .clone()
            .oneshot(json_request_from(body.clone(), "203.0.113.7"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let resp = app
        .clone()
        .oneshot(json_request_from(body.clone(), "203.0.113.7"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(resp.headers().contains_key(header::RETRY_AFTER));
    assert_eq!(generator.calls.load(Ordering::SeqCst), 2);

    let mut submit = multipart_request(&[Part::Field("text", ARTICLE)]);
    submit
        .headers_mut()
        .insert("x-forwarded-for", "203.0.113.7".parse().unwrap());
    let resp = app.clone().oneshot(submit).await.unwrap();
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);

    let resp = app
        .clone()
        .oneshot(json_request_from(body, "203.0.113.8"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    for uri in ["/", "/health"] {
        let resp = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
