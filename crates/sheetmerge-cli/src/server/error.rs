//! Request errors and their localized responses.

use axum::Json;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use sheetmerge::MergeError;

/// Everything a request can fail with.
///
/// Client-facing messages come from a fixed table; internal error text is
/// logged and never sent back.
#[derive(Debug)]
pub enum ApiError {
    /// No `excel_file` field, or the body was not multipart.
    MissingFile,
    /// The body was cut off by the upload limit.
    PayloadTooLarge { limit_mb: usize },
    /// The multipart body could not be read.
    MalformedUpload,
    /// The `output` field named an unknown format.
    UnknownOutput,
    /// A merge failure attributable to the request or the template.
    Merge(MergeError),
    /// Anything else.
    Internal(anyhow::Error),
}

impl From<MergeError> for ApiError {
    fn from(err: MergeError) -> Self {
        if err.is_client_error() || matches!(err, MergeError::TemplateNotFound(_)) {
            ApiError::Merge(err)
        } else {
            ApiError::Internal(anyhow::Error::new(err))
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingFile | ApiError::MalformedUpload | ApiError::UnknownOutput => {
                StatusCode::BAD_REQUEST
            }
            ApiError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Merge(MergeError::TemplateNotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Merge(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> String {
        let text = match self {
            ApiError::MissingFile => "ファイルが選択されていません",
            ApiError::PayloadTooLarge { limit_mb } => {
                return format!("ファイルサイズが大きすぎます（最大{limit_mb}MB）");
            }
            ApiError::MalformedUpload => "ファイルを読み込めませんでした",
            ApiError::UnknownOutput => "出力形式が不正です",
            ApiError::Merge(err) => match err {
                MergeError::EmptyFileName => "ファイル名が不正です",
                MergeError::UnsupportedFileType { .. } => "許可されていないファイル形式です",
                MergeError::TemplateNotFound(_) => "テンプレートファイルが見つかりません",
                MergeError::EmptyWorkbook(_) => "ブックにシートがありません",
                MergeError::Spreadsheet { .. } | MergeError::Pdf { .. } => {
                    "ファイルを読み込めませんでした"
                }
                _ => "処理エラーが発生しました",
            },
            ApiError::Internal(_) => "処理エラーが発生しました",
        };
        text.to_string()
    }

    /// Log the failure and render it as HTML or as `{"error": ...}`.
    pub fn into_response_for(self, json: bool) -> Response {
        let status = self.status();
        match &self {
            ApiError::Internal(err) => tracing::error!(error = %format!("{err:#}"), "request failed"),
            ApiError::Merge(err) => {
                tracing::warn!(status = status.as_u16(), error = %err, "request rejected")
            }
            other => tracing::warn!(status = status.as_u16(), error = ?other, "request rejected"),
        }

        let message = self.message();
        if json {
            (status, Json(serde_json::json!({ "error": message }))).into_response()
        } else {
            (status, Html(error_page(status, &message))).into_response()
        }
    }
}

fn error_page(status: StatusCode, message: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"ja\">\n<head><meta charset=\"utf-8\"><title>エラー {code}</title></head>\n\
         <body>\n<h1>エラー</h1>\n<p>{message}</p>\n<p><a href=\"/\">戻る</a></p>\n</body>\n</html>\n",
        code = status.as_u16(),
    )
}

/// True when `Accept` ranks `application/json` above `text/html`.
pub fn wants_json(headers: &HeaderMap) -> bool {
    let Some(accept) = headers.get(header::ACCEPT).and_then(|v| v.to_str().ok()) else {
        return false;
    };

    let mut best: Option<(f32, bool)> = None;
    for item in accept.split(',') {
        let mut params = item.split(';');
        let media = params.next().unwrap_or_default().trim().to_ascii_lowercase();
        let is_json = match media.as_str() {
            "application/json" => true,
            "text/html" => false,
            _ => continue,
        };
        let q = params
            .filter_map(|p| p.trim().strip_prefix("q="))
            .find_map(|q| q.parse::<f32>().ok())
            .unwrap_or(1.0);
        if best.is_none_or(|(best_q, _)| q > best_q) {
            best = Some((q, is_json));
        }
    }
    best.is_some_and(|(_, json)| json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use sheetmerge::{PdfError, WorkbookRole};
    use std::path::PathBuf;

    fn accept(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn json_only_when_preferred() {
        assert!(!wants_json(&HeaderMap::new()));
        assert!(wants_json(&accept("application/json")));
        assert!(!wants_json(&accept("text/html,application/json")));
        assert!(wants_json(&accept("text/html;q=0.5, application/json")));
        assert!(!wants_json(&accept("*/*")));
    }

    #[test]
    fn merge_errors_map_to_status_and_message() {
        let cases = [
            (MergeError::EmptyFileName, 400, "ファイル名が不正です"),
            (
                MergeError::UnsupportedFileType { filename: "a.png".into() },
                400,
                "許可されていないファイル形式です",
            ),
            (
                MergeError::TemplateNotFound(PathBuf::from("t.xlsm")),
                404,
                "テンプレートファイルが見つかりません",
            ),
            (
                MergeError::EmptyWorkbook(WorkbookRole::Template),
                400,
                "ブックにシートがありません",
            ),
            (
                MergeError::Pdf {
                    filename: "a.pdf".into(),
                    source: PdfError::ParseError("bad xref".into()),
                },
                400,
                "ファイルを読み込めませんでした",
            ),
        ];
        for (err, status, message) in cases {
            let api = ApiError::from(err);
            assert_eq!(api.status().as_u16(), status);
            assert_eq!(api.message(), message);
        }
    }

    #[test]
    fn server_errors_are_generic() {
        let api = ApiError::from(MergeError::Template("secret detail".into()));
        assert!(matches!(api, ApiError::Internal(_)));
        assert_eq!(api.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.message(), "処理エラーが発生しました");
    }

    #[test]
    fn payload_message_names_the_limit() {
        let api = ApiError::PayloadTooLarge { limit_mb: 16 };
        assert_eq!(api.message(), "ファイルサイズが大きすぎます（最大16MB）");
    }
}
