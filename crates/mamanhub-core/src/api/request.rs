//! Request and response descriptors used by `ApiClient::send`.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::ApiError;

/// An outgoing API call.
///
/// The `retried` flag is owned by the client: it is set once after a
/// token refresh so the same request is never refreshed twice.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    headers: HeaderMap,
    body: Option<serde_json::Value>,
    retried: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            body: None,
            retried: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Attach a JSON body
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ApiError> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> Option<&serde_json::Value> {
        self.body.as_ref()
    }

    pub fn is_retried(&self) -> bool {
        self.retried
    }

    pub(crate) fn mark_retried(&mut self) {
        self.retried = true;
    }
}

/// A fully-read API response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    pub(crate) async fn read(response: reqwest::Response) -> Result<Self, ApiError> {
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();
        Ok(Self::new(status, headers, body))
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decode the body as JSON. An empty body decodes as JSON `null`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        let body: &[u8] = if self.body.iter().all(u8::is_ascii_whitespace) {
            b"null"
        } else {
            &self.body
        };
        serde_json::from_slice(body).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse JSON response: {}", e))
        })
    }

    /// Turn non-2xx responses into `ApiError::Http`, passing the body through verbatim
    pub fn error_for_status(self) -> Result<Self, ApiError> {
        if self.status.is_success() {
            Ok(self)
        } else {
            Err(ApiError::from_status(self.status, &self.text()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Course {
        id: String,
        title: String,
    }

    #[test]
    fn test_request_builder() {
        let request = ApiRequest::post("/orders")
            .json(&serde_json::json!({ "courseIds": ["c1", "c2"] }))
            .expect("body should encode")
            .header(
                HeaderName::from_static("x-request-id"),
                HeaderValue::from_static("abc"),
            );

        assert_eq!(*request.method(), Method::POST);
        assert_eq!(request.path(), "/orders");
        assert_eq!(request.headers()["x-request-id"], "abc");
        assert_eq!(request.body().unwrap()["courseIds"][1], "c2");
        assert!(!request.is_retried());
    }

    #[test]
    fn test_response_json() {
        let response = ApiResponse::new(
            StatusCode::OK,
            HeaderMap::new(),
            br#"{"id":"c1","title":"Intro to Algebra"}"#.to_vec(),
        );
        let course: Course = response.json().expect("should parse");
        assert_eq!(
            course,
            Course {
                id: "c1".to_string(),
                title: "Intro to Algebra".to_string()
            }
        );

        let empty = ApiResponse::new(StatusCode::NO_CONTENT, HeaderMap::new(), Vec::new());
        let value: serde_json::Value = empty.json().expect("empty body is null");
        assert!(value.is_null());

        let broken = ApiResponse::new(StatusCode::OK, HeaderMap::new(), b"{not json".to_vec());
        assert!(matches!(
            broken.json::<Course>(),
            Err(ApiError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_error_for_status() {
        let ok = ApiResponse::new(StatusCode::CREATED, HeaderMap::new(), b"{}".to_vec());
        assert!(ok.error_for_status().is_ok());

        let not_found = ApiResponse::new(StatusCode::NOT_FOUND, HeaderMap::new(), b"missing".to_vec());
        match not_found.error_for_status() {
            Err(ApiError::Http { status, body }) => {
                assert_eq!(status, StatusCode::NOT_FOUND);
                assert_eq!(body, "missing");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
