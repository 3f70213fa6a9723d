//! Classification of provider replies.
//!
//! Google, Meta and TikTok all report failures as an `error` member in the
//! JSON body, sometimes alongside a 200 status. TikTok also sends
//! `"error": {"code": "ok"}` on success.

use reqwest::blocking::Response;
use serde_json::Value;

use super::UploadError;

const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    Success(Value),
    ProviderError {
        status: u16,
        code: String,
        message: String,
    },
}

impl ApiResponse {
    /// Classify a reply from its HTTP status and body text.
    pub fn classify(status: u16, body: &str) -> Self {
        let success = (200..300).contains(&status);

        let value = match serde_json::from_str::<Value>(body) {
            Ok(value) => value,
            Err(_) if success && body.trim().is_empty() => return ApiResponse::Success(Value::Null),
            Err(_) if success => return ApiResponse::Success(Value::String(body.to_string())),
            Err(_) => {
                return ApiResponse::ProviderError {
                    status,
                    code: status.to_string(),
                    message: truncate(body.trim()),
                }
            }
        };

        if let Some((code, message)) = embedded_error(&value) {
            let code = code.unwrap_or_else(|| status.to_string());
            return ApiResponse::ProviderError {
                status,
                code,
                message,
            };
        }

        if success {
            ApiResponse::Success(value)
        } else {
            ApiResponse::ProviderError {
                status,
                code: status.to_string(),
                message: truncate(&value.to_string()),
            }
        }
    }

    /// Read the body of `response` and classify it.
    pub fn from_response(response: Response) -> Result<Self, UploadError> {
        let status = response.status().as_u16();
        let body = response.text()?;
        Ok(Self::classify(status, &body))
    }

    pub fn into_result(self) -> Result<Value, UploadError> {
        match self {
            ApiResponse::Success(value) => Ok(value),
            ApiResponse::ProviderError {
                status,
                code,
                message,
            } => Err(UploadError::Provider {
                status,
                code,
                message,
            }),
        }
    }
}

/// Turn a reply whose status the caller did not expect into an error.
pub fn failure(response: Response) -> UploadError {
    let status = response.status().as_u16();
    match ApiResponse::from_response(response) {
        Ok(ApiResponse::ProviderError {
            status,
            code,
            message,
        }) => UploadError::Provider {
            status,
            code,
            message,
        },
        Ok(ApiResponse::Success(_)) => UploadError::Protocol(format!("unexpected HTTP {}", status)),
        Err(e) => e,
    }
}

/// Extract `(code, message)` from an `error` member, if it signals a failure.
fn embedded_error(value: &Value) -> Option<(Option<String>, String)> {
    match value.get("error")? {
        Value::Object(error) => {
            let code = error.get("code").and_then(scalar_to_string);
            if code.as_deref() == Some("ok") {
                return None;
            }
            let message = ["message", "error_user_msg", "description"]
                .iter()
                .find_map(|key| error.get(*key).and_then(Value::as_str))
                .unwrap_or_default()
                .to_string();
            Some((code, message))
        }
        // OAuth style: {"error": "invalid_token", "error_description": "..."}
        Value::String(code) => {
            let message = value
                .get("error_description")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            Some((Some(code.clone()), message))
        }
        _ => None,
    }
}

/// Look up a string (or number) at `path`, e.g. `&["data", "upload_id"]`.
pub fn str_field(value: &Value, path: &[&str]) -> Option<String> {
    let mut current = value;
    for key in path {
        current = current.get(*key)?;
    }
    scalar_to_string(current).filter(|s| !s.is_empty())
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn truncate(text: &str) -> String {
    if text.len() <= MAX_ERROR_BODY {
        return text.to_string();
    }
    let mut end = MAX_ERROR_BODY;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &text[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_success() {
        let response = ApiResponse::classify(200, r#"{"id":"123"}"#);
        assert_eq!(response, ApiResponse::Success(json!({"id": "123"})));
    }

    #[test]
    fn test_tiktok_ok_error_is_success() {
        let body = r#"{"data":{"publish_id":"p1"},"error":{"code":"ok","message":"","log_id":"x"}}"#;
        match ApiResponse::classify(200, body) {
            ApiResponse::Success(value) => {
                assert_eq!(str_field(&value, &["data", "publish_id"]).as_deref(), Some("p1"))
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_tiktok_error_with_200_status() {
        let body = r#"{"error":{"code":"access_token_invalid","message":"The access token is invalid"}}"#;
        assert_eq!(
            ApiResponse::classify(200, body),
            ApiResponse::ProviderError {
                status: 200,
                code: "access_token_invalid".to_string(),
                message: "The access token is invalid".to_string(),
            }
        );
    }

    #[test]
    fn test_graph_error() {
        let body = r#"{"error":{"message":"Invalid OAuth access token.","type":"OAuthException","code":190}}"#;
        assert_eq!(
            ApiResponse::classify(400, body),
            ApiResponse::ProviderError {
                status: 400,
                code: "190".to_string(),
                message: "Invalid OAuth access token.".to_string(),
            }
        );
    }

    #[test]
    fn test_oauth_string_error() {
        let body = r#"{"error":"invalid_grant","error_description":"Token has been expired"}"#;
        match ApiResponse::classify(401, body) {
            ApiResponse::ProviderError { code, message, .. } => {
                assert_eq!(code, "invalid_grant");
                assert_eq!(message, "Token has been expired");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_non_json_failure_uses_status() {
        match ApiResponse::classify(502, "<html>Bad Gateway</html>") {
            ApiResponse::ProviderError { status, code, message } => {
                assert_eq!(status, 502);
                assert_eq!(code, "502");
                assert_eq!(message, "<html>Bad Gateway</html>");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_json_failure_without_error_member() {
        let response = ApiResponse::classify(404, r#"{"detail":"nope"}"#);
        assert!(matches!(response, ApiResponse::ProviderError { status: 404, .. }));
    }

    #[test]
    fn test_empty_success_body() {
        assert_eq!(ApiResponse::classify(204, ""), ApiResponse::Success(Value::Null));
    }

    #[test]
    fn test_into_result_maps_to_upload_error() {
        let err = ApiResponse::classify(500, "boom").into_result().unwrap_err();
        assert!(err.is_retryable());
    }

    #[test]
    fn test_str_field_numbers_and_missing() {
        let value = json!({"id": 17841400000u64, "data": {"upload_id": ""}});
        assert_eq!(str_field(&value, &["id"]).as_deref(), Some("17841400000"));
        assert_eq!(str_field(&value, &["data", "upload_id"]), None);
        assert_eq!(str_field(&value, &["missing"]), None);
    }

    #[test]
    fn test_long_bodies_truncated() {
        let body = "x".repeat(2000);
        match ApiResponse::classify(500, &body) {
            ApiResponse::ProviderError { message, .. } => assert!(message.len() < 600),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
