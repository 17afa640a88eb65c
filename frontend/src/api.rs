//! Thin JSON client for the site's backend.

use gloo_net::http::{Request, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;

const GENERIC_FAILURE: &str = "API request failed";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    fn carries_body(self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put)
    }

    fn builder(self, url: &str) -> RequestBuilder {
        match self {
            HttpMethod::Get => Request::get(url),
            HttpMethod::Post => Request::post(url),
            HttpMethod::Put => Request::put(url),
            HttpMethod::Delete => Request::delete(url),
        }
    }
}

/// Backend envelope: every endpoint answers `{success, ...}`.
#[derive(Clone, Debug, PartialEq)]
pub enum BackendReply<T> {
    Success(T),
    Failure { error: Option<String> },
}

impl<T: DeserializeOwned> BackendReply<T> {
    pub fn from_value(value: Value) -> Result<Self, ApiError> {
        let success = value
            .get("success")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        if success {
            Ok(BackendReply::Success(serde_json::from_value(value)?))
        } else {
            let error = value
                .get("error")
                .and_then(Value::as_str)
                .map(str::to_string);
            Ok(BackendReply::Failure { error })
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ApiClient {
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    pub fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Sends `payload` as JSON (POST/PUT only) and returns the decoded JSON
    /// answer. Non-success statuses become [`ApiError::Backend`].
    pub async fn call(
        &self,
        endpoint: &str,
        payload: Option<&Value>,
        method: HttpMethod,
    ) -> Result<Value, ApiError> {
        let url = self.url(endpoint);
        let builder = method
            .builder(&url)
            .header("Content-Type", "application/json");

        let sent = match request_body(method, payload)? {
            Some(body) => {
                builder
                    .body(body)
                    .map_err(|e| ApiError::Encode(e.to_string()))?
                    .send()
                    .await
            }
            None => builder.send().await,
        };
        let response = sent.map_err(|e| ApiError::Transport(e.to_string()));

        let result = match response {
            Ok(resp) => {
                let status = resp.status();
                let ok = resp.ok();
                match resp.text().await {
                    Ok(text) => parse_response(status, ok, &text),
                    Err(e) => Err(ApiError::Transport(e.to_string())),
                }
            }
            Err(e) => Err(e),
        };

        if let Err(err) = &result {
            match err.status() {
                Some(status) => log::error!("API error on {} ({}): {}", endpoint, status, err),
                None => log::error!("API error on {}: {}", endpoint, err),
            }
        }
        result
    }

    pub async fn post<B, T>(&self, endpoint: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let payload = serde_json::to_value(body).map_err(|e| ApiError::Encode(e.to_string()))?;
        let value = self.call(endpoint, Some(&payload), HttpMethod::Post).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn post_reply<B, T>(&self, endpoint: &str, body: &B) -> Result<BackendReply<T>, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let value: Value = self.post(endpoint, body).await?;
        BackendReply::from_value(value)
    }
}

fn request_body(method: HttpMethod, payload: Option<&Value>) -> Result<Option<String>, ApiError> {
    match payload {
        Some(value) if method.carries_body() => serde_json::to_string(value)
            .map(Some)
            .map_err(|e| ApiError::Encode(e.to_string())),
        _ => Ok(None),
    }
}

fn parse_response(status: u16, ok: bool, text: &str) -> Result<Value, ApiError> {
    let parsed = serde_json::from_str::<Value>(text);

    if !ok {
        let message = parsed
            .ok()
            .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| GENERIC_FAILURE.to_string());
        return Err(ApiError::Backend { status, message });
    }

    Ok(parsed?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[test]
    fn error_status_uses_backend_message() {
        let err = parse_response(500, false, r#"{"success":false,"error":"X"}"#).unwrap_err();
        assert_eq!(err.to_string(), "X");
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn error_status_without_message_is_generic() {
        let err = parse_response(502, false, "<html>Bad gateway</html>").unwrap_err();
        assert_eq!(err.to_string(), GENERIC_FAILURE);

        let err = parse_response(400, false, r#"{"success":false}"#).unwrap_err();
        assert_eq!(err.to_string(), GENERIC_FAILURE);
    }

    #[test]
    fn success_with_invalid_json_is_decode_error() {
        let err = parse_response(200, true, "not json").unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn body_only_for_post_and_put() {
        let payload = json!({"type": "equity"});
        assert_eq!(request_body(HttpMethod::Get, Some(&payload)).unwrap(), None);
        assert_eq!(request_body(HttpMethod::Delete, Some(&payload)).unwrap(), None);
        assert_eq!(request_body(HttpMethod::Post, None).unwrap(), None);
        assert_eq!(
            request_body(HttpMethod::Put, Some(&payload)).unwrap().as_deref(),
            Some(r#"{"type":"equity"}"#)
        );
    }

    #[test]
    fn url_joins_base_and_endpoint() {
        assert_eq!(ApiClient::new("").url("/api/x"), "/api/x");
        assert_eq!(
            ApiClient::new("http://localhost:5000").url("/api/x"),
            "http://localhost:5000/api/x"
        );
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Echo {
        response: String,
    }

    #[test]
    fn reply_envelope_is_tagged() {
        let ok = BackendReply::<Echo>::from_value(json!({"success": true, "response": "hi"})).unwrap();
        assert_eq!(ok, BackendReply::Success(Echo { response: "hi".into() }));

        let failed =
            BackendReply::<Echo>::from_value(json!({"success": false, "error": "nope"})).unwrap();
        assert_eq!(failed, BackendReply::Failure { error: Some("nope".into()) });

        let missing_flag = BackendReply::<Echo>::from_value(json!({"response": "hi"})).unwrap();
        assert_eq!(missing_flag, BackendReply::Failure { error: None });
    }
}
