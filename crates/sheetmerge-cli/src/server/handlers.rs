use std::sync::Arc;

use axum::Json;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{Multipart, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use sheetmerge::{OutputFormat, UploadedFile, merge_with_template_file};

use super::AppState;
use super::error::{ApiError, wants_json};

const INDEX_HTML: &str = include_str!("index.html");

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// `POST /process` and `POST /upload_and_process`.
pub async fn process(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let json = wants_json(&headers);
    match run_process(state, multipart).await {
        Ok(response) => response,
        Err(err) => err.into_response_for(json),
    }
}

#[derive(Default)]
struct ProcessForm {
    excel: Option<UploadedFile>,
    pdfs: Vec<UploadedFile>,
    output: Option<OutputFormat>,
}

async fn run_process(
    state: AppState,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let mut multipart = multipart.map_err(|_| ApiError::MissingFile)?;
    let form = read_form(&mut multipart, state.config.max_upload_mb()).await?;
    let excel = form.excel.ok_or(ApiError::MissingFile)?;
    let pdfs = form.pdfs;

    let config = Arc::clone(&state.config);
    let mut options = config.options.clone();
    if let Some(output) = form.output {
        options.output = output;
    }

    tracing::info!(
        excel = %excel.filename,
        pdfs = pdfs.len(),
        output = %options.output,
        "processing upload"
    );

    let merged = tokio::task::spawn_blocking(move || {
        merge_with_template_file(&config.template, &excel, &pdfs, &options)
    })
    .await
    .map_err(|e| ApiError::Internal(anyhow::Error::new(e).context("merge task failed")))??;

    let low = merged.report.low_confidence_pages();
    if !low.is_empty() {
        tracing::info!(pages = low.len(), "low confidence pages in result");
    }

    let disposition = format!("attachment; filename=\"{}\"", merged.file_name);
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, merged.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        merged.bytes,
    )
        .into_response())
}

async fn read_form(multipart: &mut Multipart, limit_mb: usize) -> Result<ProcessForm, ApiError> {
    let upload_error = |err: MultipartError| {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge { limit_mb }
        } else {
            tracing::debug!(error = %err, "unreadable multipart body");
            ApiError::MalformedUpload
        }
    };

    let mut form = ProcessForm::default();
    while let Some(field) = multipart.next_field().await.map_err(upload_error)? {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().unwrap_or_default().to_string();

        match name.as_str() {
            "excel_file" => {
                let bytes = field.bytes().await.map_err(upload_error)?;
                form.excel = Some(UploadedFile::new(file_name, bytes.to_vec()));
            }
            "pdf_files" => {
                let bytes = field.bytes().await.map_err(upload_error)?;
                // Browsers send an empty part when no PDF was chosen.
                if file_name.is_empty() && bytes.is_empty() {
                    continue;
                }
                form.pdfs.push(UploadedFile::new(file_name, bytes.to_vec()));
            }
            "output" => {
                let text = field.text().await.map_err(upload_error)?;
                if !text.trim().is_empty() {
                    form.output = Some(text.parse().map_err(|_| ApiError::UnknownOutput)?);
                }
            }
            other => tracing::debug!(field = other, "ignoring form field"),
        }
    }
    Ok(form)
}
