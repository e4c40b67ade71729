// Shared HTTP plumbing for the image backends: send with retry, map status
// codes onto the image failure taxonomy.

use crate::core::image::{ImageError, RetryPolicy};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

/// Longest backend error detail we keep (it ends up in logs, maybe in chat).
const MAX_DETAIL_CHARS: usize = 300;

fn transport_error(e: reqwest::Error) -> ImageError {
    ImageError::Connection(e.to_string())
}

/// 422 means the backend didn't like our parameters; the detail is shown to the
/// user. Anything else non-2xx is an API error.
pub async fn check_status(response: Response) -> Result<Response, ImageError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    if status == StatusCode::UNPROCESSABLE_ENTITY || status == StatusCode::BAD_REQUEST {
        return Err(ImageError::InvalidParameters(error_detail(&body)));
    }
    Err(ImageError::Api {
        status: status.as_u16(),
        body: error_detail(&body),
    })
}

/// Sends the request built by `build` under `policy` and decodes a JSON body.
/// `build` runs once per attempt since request builders are single use.
pub async fn send_json<T, F>(policy: &RetryPolicy, label: &str, build: F) -> Result<T, ImageError>
where
    T: DeserializeOwned,
    F: Fn() -> RequestBuilder,
{
    let build = &build;
    policy
        .run(label, move || async move {
            let response = build().send().await.map_err(transport_error)?;
            let response = check_status(response).await?;
            response
                .json::<T>()
                .await
                .map_err(|e| ImageError::Decode(e.to_string()))
        })
        .await
}

/// Like `send_json` but returns the raw body bytes (image downloads).
pub async fn send_bytes<F>(
    policy: &RetryPolicy,
    label: &str,
    build: F,
) -> Result<Vec<u8>, ImageError>
where
    F: Fn() -> RequestBuilder,
{
    let build = &build;
    policy
        .run(label, move || async move {
            let response = build().send().await.map_err(transport_error)?;
            let response = check_status(response).await?;
            response
                .bytes()
                .await
                .map(|b| b.to_vec())
                .map_err(transport_error)
        })
        .await
}

/// Pulls a readable message out of an error body.
///
/// Knows the FastAPI shape (`detail` as string or list of `{msg}`), and the
/// `message` / `error` fields used by the other backends.
pub fn error_detail(body: &str) -> String {
    let detail = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| {
            let detail = &json["detail"];
            if let Some(text) = detail.as_str() {
                return Some(text.to_string());
            }
            if let Some(items) = detail.as_array() {
                let msgs: Vec<String> = items
                    .iter()
                    .filter_map(|item| {
                        let msg = item["msg"].as_str()?;
                        let loc = item["loc"]
                            .as_array()
                            .and_then(|l| l.last())
                            .and_then(|l| l.as_str());
                        Some(match loc {
                            Some(field) => format!("{}: {}", field, msg),
                            None => msg.to_string(),
                        })
                    })
                    .collect();
                if !msgs.is_empty() {
                    return Some(msgs.join("; "));
                }
            }
            ["message", "error"]
                .iter()
                .find_map(|key| json[*key].as_str().map(str::to_string))
        })
        .unwrap_or_else(|| body.trim().to_string());

    crate::core::chat::formatting::truncate(&detail, MAX_DETAIL_CHARS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fastapi_string_detail() {
        assert_eq!(
            error_detail(r#"{"detail":"Sampler not found"}"#),
            "Sampler not found"
        );
    }

    #[test]
    fn test_fastapi_validation_list() {
        let body = r#"{"detail":[{"loc":["body","steps"],"msg":"value is not a valid integer","type":"type_error.integer"}]}"#;
        assert_eq!(error_detail(body), "steps: value is not a valid integer");
    }

    #[test]
    fn test_message_field() {
        assert_eq!(
            error_detail(r#"{"message":"Input payload validation failed","errors":{}}"#),
            "Input payload validation failed"
        );
    }

    #[test]
    fn test_plain_text_body() {
        assert_eq!(error_detail("  Internal Server Error "), "Internal Server Error");
    }

    #[test]
    fn test_long_detail_truncated() {
        let body = "x".repeat(1000);
        assert!(error_detail(&body).chars().count() <= MAX_DETAIL_CHARS);
    }
}
