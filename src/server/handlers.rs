//! HTTP request handlers for the web server.

use askama::Template;
use axum::{
    body::Bytes,
    extract::{Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use super::templates::{IndexTemplate, ResultTemplate, FALLBACK_BAR_COLOR};
use super::AppState;
use crate::error::InfoBaitError;
use crate::output::{FactCheck, Source, Upload};

/// Multipart field the upload form posts the screenshot under.
pub const UPLOAD_FIELD: &str = "image";

/// Body of `POST /reanalyze`. The page also sends the image back
/// (`image_b64`, `mime`, `filename`); those are ignored.
#[derive(Debug, Deserialize)]
pub struct ReanalyzeRequest {
    pub extracted_text: Option<String>,
}

/// Reply of `POST /reanalyze`.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ReanalyzeResponse {
    pub ai_output: String,
    pub rating: Option<u8>,
    pub rating_percent: u8,
    pub bar_color: String,
    pub sources: Vec<Source>,
}

impl From<FactCheck> for ReanalyzeResponse {
    fn from(fc: FactCheck) -> Self {
        Self {
            ai_output: fc.analysis,
            rating: fc.rating,
            rating_percent: fc.rating_percent,
            bar_color: fc
                .bar_color
                .unwrap_or_else(|| FALLBACK_BAR_COLOR.to_string()),
            sources: fc.sources,
        }
    }
}

fn status_of(err: &InfoBaitError) -> StatusCode {
    StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// Plain-text error reply.
fn error_response(err: &InfoBaitError) -> Response {
    let status = status_of(err);
    if status.is_server_error() {
        error!("Request failed: {}", err);
    } else {
        warn!("Rejected request: {}", err);
    }
    (status, err.to_string()).into_response()
}

fn json_error(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

fn render<T: Template>(template: T) -> Response {
    match template.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => error_response(&InfoBaitError::Template(e)),
    }
}

/// Upload form.
pub async fn index(State(state): State<AppState>) -> Response {
    render(IndexTemplate {
        max_upload_mb: state.max_upload_bytes / (1024 * 1024),
    })
}

pub async fn healthz() -> &'static str {
    "ok"
}

/// Run the pipeline on the uploaded screenshot and render the result page.
pub async fn upload(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => {
                return error_response(&InfoBaitError::MissingField {
                    field: UPLOAD_FIELD.to_string(),
                })
            }
            Err(e) => return (e.status(), e.body_text()).into_response(),
        };
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        // A part without a filename parameter is a plain form value, not a file.
        let Some(filename) = field.file_name().map(str::to_string) else {
            return error_response(&InfoBaitError::MissingField {
                field: UPLOAD_FIELD.to_string(),
            });
        };
        if filename.is_empty() {
            return error_response(&InfoBaitError::NoFileSelected);
        }
        let mime = field.content_type().unwrap_or("image/png").to_string();
        let bytes = match field.bytes().await {
            Ok(b) => b.to_vec(),
            Err(e) => return (e.status(), e.body_text()).into_response(),
        };

        let upload = Upload {
            filename,
            mime,
            bytes,
        };
        return match state.analyzer.analyze_upload(upload).await {
            Ok(report) => render(ResultTemplate::from_report(&report)),
            Err(e) => error_response(&e),
        };
    }
}

/// Re-run analysis and rating on edited text; JSON in, JSON out.
pub async fn reanalyze(State(state): State<AppState>, body: Bytes) -> Response {
    // Parsed by hand so a bad body gets the same JSON error as a missing field.
    let text = serde_json::from_slice::<ReanalyzeRequest>(&body)
        .ok()
        .and_then(|r| r.extracted_text);
    let Some(text) = text else {
        return json_error(StatusCode::BAD_REQUEST, "No text provided");
    };

    match state.analyzer.reanalyze(&text).await {
        Ok(fc) => Json(ReanalyzeResponse::from(fc)).into_response(),
        Err(e) => json_error(status_of(&e), &e.to_string()),
    }
}
