//! HTTP tests for the web front end.
//!
//! The router is driven in-process with `tower::ServiceExt::oneshot`; the
//! LLM and OCR engine are replaced by fakes so no network, API key or
//! tesseract install is needed.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use infobait::server::{create_router, AppState, ReanalyzeResponse};
use infobait::{
    Analyzer, AnalyzerConfig, ChatBackend, CompletionRequest, InfoBaitError, ServerConfig,
    TextRecognizer,
};
use std::io::Cursor;
use std::sync::Arc;
use tower::ServiceExt;

// ── Fakes ────────────────────────────────────────────────────────────────────

const ANALYSIS: &str = "The claim is mostly accurate according to official data.\n\n\
SOURCES:\n- WHO | https://www.who.int/news\n- Local paper";

/// Answers each of the three prompts by recognising its opening line.
struct FakeLlm {
    rating: &'static str,
}

#[async_trait]
impl ChatBackend for FakeLlm {
    fn name(&self) -> &str {
        "fake"
    }

    async fn complete(
        &self,
        prompt: &str,
        _request: &CompletionRequest,
    ) -> Result<String, InfoBaitError> {
        if prompt.starts_with("You are a text cleanup assistant") {
            let text = prompt.rsplit("Text to clean:\n").next().unwrap_or_default();
            Ok(text.to_string())
        } else if prompt.starts_with("You are a fact-check assistant") {
            Ok(ANALYSIS.to_string())
        } else if prompt.starts_with("You are a strict accuracy scoring system") {
            Ok(self.rating.to_string())
        } else {
            Err(InfoBaitError::LlmApiError {
                message: "unexpected prompt".into(),
            })
        }
    }
}

struct FakeOcr(Result<String, String>);

impl TextRecognizer for FakeOcr {
    fn recognize(&self, _image: &DynamicImage) -> Result<String, InfoBaitError> {
        self.0.clone().map_err(|detail| InfoBaitError::OcrFailed { detail })
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn app_with(rating: &'static str, ocr: Result<String, String>) -> Router {
    let analyzer = Analyzer::with_parts(
        AnalyzerConfig::default(),
        Arc::new(FakeLlm { rating }),
        Arc::new(FakeOcr(ocr)),
    );
    create_router(AppState::new(analyzer, &ServerConfig::default()))
}

fn app() -> Router {
    app_with("8", Ok("Vaccines went through clinical trials.".to_string()))
}

fn png() -> Vec<u8> {
    let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([255, 255, 255, 255])));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

const BOUNDARY: &str = "infobait-test-boundary";

fn multipart_body(field: &str, filename: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n\
             Content-Type: image/png\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn json_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/reanalyze")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

// ── Pages ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_healthz() {
    let response = app()
        .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "ok");
}

#[tokio::test]
async fn test_index_has_upload_form() {
    let response = app()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("enctype=\"multipart/form-data\""));
    assert!(html.contains("name=\"image\""));
    assert!(html.contains("up to 16 MB"));
}

// ── Upload ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_upload_renders_result_page() {
    let response = app()
        .oneshot(upload_request(multipart_body("image", "shot.png", &png())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response).await;
    assert!(html.contains("shot.png"));
    assert!(html.contains("Vaccines went through clinical trials."));
    assert!(html.contains("The claim is mostly accurate according to official data."));
    assert!(html.contains("<strong>8</strong> / 10"));
    assert!(html.contains("width:80%"));
    assert!(html.contains(";base64,"));
    // Linked source and plain source.
    assert!(html.contains(">WHO</a>"));
    assert!(html.contains("<li>Local paper</li>"));
    // The SOURCES block is not repeated in the analysis text.
    assert!(!html.contains("SOURCES:"));
}

#[tokio::test]
async fn test_upload_without_rating_shows_note() {
    let response = app_with("N/A", Ok("Something happened.".into()))
        .oneshot(upload_request(multipart_body("image", "shot.png", &png())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("No rating"));
    assert!(!html.contains("/ 10</p>"));
}

#[tokio::test]
async fn test_upload_missing_field() {
    let response = app()
        .oneshot(upload_request(multipart_body("file", "shot.png", &png())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(response).await, "No file uploaded");
}

#[tokio::test]
async fn test_upload_part_without_filename_is_not_a_file() {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"image\"\r\n\r\n\
             just text\r\n--{BOUNDARY}--\r\n"
        )
        .as_bytes(),
    );
    let response = app().oneshot(upload_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(response).await, "No file uploaded");
}

#[tokio::test]
async fn test_upload_no_file_selected() {
    let response = app()
        .oneshot(upload_request(multipart_body("image", "", &[])))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(response).await, "No file selected");
}

#[tokio::test]
async fn test_upload_empty_file() {
    let response = app()
        .oneshot(upload_request(multipart_body("image", "shot.png", &[])))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(response).await, "Uploaded file is empty");
}

#[tokio::test]
async fn test_upload_not_an_image() {
    let response = app()
        .oneshot(upload_request(multipart_body(
            "image",
            "notes.png",
            b"this is plain text",
        )))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.starts_with("Could not read image"));
}

#[tokio::test]
async fn test_upload_ocr_failure_is_server_error() {
    let response = app_with("8", Err("engine crashed".into()))
        .oneshot(upload_request(multipart_body("image", "shot.png", &png())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_text(response).await.contains("engine crashed"));
}

#[tokio::test]
async fn test_upload_over_body_limit() {
    let analyzer = Analyzer::with_parts(
        AnalyzerConfig::default(),
        Arc::new(FakeLlm { rating: "8" }),
        Arc::new(FakeOcr(Ok("x".into()))),
    );
    let config = ServerConfig {
        max_upload_bytes: 64,
        ..ServerConfig::default()
    };
    let app = create_router(AppState::new(analyzer, &config));
    let body = multipart_body("image", "shot.png", &png());
    let mut request = upload_request(body.clone());
    request
        .headers_mut()
        .insert(header::CONTENT_LENGTH, body.len().into());
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

// ── Reanalyze ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_reanalyze_returns_json() {
    let response = app()
        .oneshot(json_request(
            r#"{"extracted_text":"Edited claim","image_b64":"AAAA","mime":"image/png","filename":"a.png"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let reply: ReanalyzeResponse = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(
        reply.ai_output,
        "The claim is mostly accurate according to official data."
    );
    assert_eq!(reply.rating, Some(8));
    assert_eq!(reply.rating_percent, 80);
    assert!(reply.bar_color.starts_with('#'));
    assert_eq!(reply.bar_color.len(), 7);
    assert_eq!(reply.sources.len(), 2);
    assert_eq!(reply.sources[0].name, "WHO");
    assert_eq!(reply.sources[0].url, "https://www.who.int/news");
    assert_eq!(reply.sources[1].url, "");
}

#[tokio::test]
async fn test_reanalyze_unrated_uses_accent_colour() {
    let response = app_with("N/A", Ok(String::new()))
        .oneshot(json_request(r#"{"extracted_text":"Something"}"#))
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert!(json["rating"].is_null());
    assert_eq!(json["rating_percent"], 0);
    assert_eq!(json["bar_color"], "var(--accent)");
}

#[tokio::test]
async fn test_reanalyze_missing_text() {
    for body in [r#"{}"#, r#"{"extracted_text":null}"#, "not json", ""] {
        let response = app().oneshot(json_request(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body {body:?}");
        let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(json["error"], "No text provided");
    }
}

#[tokio::test]
async fn test_reanalyze_blank_text() {
    let response = app()
        .oneshot(json_request(r#"{"extracted_text":"   \n  "}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["error"], "Text cannot be empty");
}
