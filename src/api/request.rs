//! Request descriptors.
//!
//! An [`ApiRequest`] is a transport-independent description of one call:
//! method, path, query, body and the bearer token to attach. The client
//! builds them, a [`Transport`](super::Transport) executes them.

use reqwest::{Method, Url};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;

use super::ApiError;

pub const AUTHORIZATION: &str = "Authorization";
pub const CONTENT_TYPE: &str = "Content-Type";
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Multipart field name the server expects for article images.
pub const IMAGE_FIELD: &str = "image";

/// A file to send as a multipart form part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Read an image from disk, guessing its content type from the extension.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        let content_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Ok(Self {
            file_name,
            content_type,
            bytes,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(Value),
    Multipart(ImageUpload),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
    pub bearer: Option<String>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
            bearer: None,
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

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self, ApiError> {
        let value =
            serde_json::to_value(body).map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
        self.body = RequestBody::Json(value);
        Ok(self)
    }

    pub fn multipart(mut self, upload: ImageUpload) -> Self {
        self.body = RequestBody::Multipart(upload);
        self
    }

    pub fn bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    /// Anything but GET changes server state and needs a session.
    pub fn is_mutating(&self) -> bool {
        self.method != Method::GET
    }

    /// Headers the request carries. Multipart bodies get no content type
    /// here; the transport sets it together with the boundary.
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        let mut headers = Vec::new();
        if let Some(token) = &self.bearer {
            headers.push((AUTHORIZATION, format!("Bearer {}", token)));
        }
        if matches!(self.body, RequestBody::Json(_)) {
            headers.push((CONTENT_TYPE, JSON_CONTENT_TYPE.to_string()));
        }
        headers
    }

    /// Full URL against `base_url`.
    pub fn url(&self, base_url: &str) -> Result<Url, ApiError> {
        let raw = format!("{}{}", base_url.trim_end_matches('/'), self.path);
        let mut url = Url::parse(&raw).map_err(|e| ApiError::InvalidRequest(format!("{}: {}", raw, e)))?;
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(self.query.iter());
        }
        Ok(url)
    }

    /// Path plus encoded query, e.g. `/api/articles?userId=42`.
    pub fn target(&self) -> String {
        match self.url("http://localhost") {
            Ok(url) => match url.query() {
                Some(q) => format!("{}?{}", url.path(), q),
                None => url.path().to_string(),
            },
            Err(_) => self.path.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_request_headers() {
        let req = ApiRequest::post("/api/issues")
            .json(&json!({"title": "t"}))
            .unwrap()
            .bearer("tok");

        assert_eq!(
            req.headers(),
            vec![
                (AUTHORIZATION, "Bearer tok".to_string()),
                (CONTENT_TYPE, JSON_CONTENT_TYPE.to_string()),
            ]
        );
        assert!(req.is_mutating());
    }

    #[test]
    fn test_multipart_omits_content_type() {
        let req = ApiRequest::post("/api/articles/a1/image")
            .multipart(ImageUpload::new("cover.png", "image/png", vec![1, 2, 3]))
            .bearer("tok");

        let headers = req.headers();
        assert_eq!(headers.len(), 1);
        assert_eq!(headers[0].0, AUTHORIZATION);
    }

    #[test]
    fn test_anonymous_get_has_no_headers() {
        let req = ApiRequest::get("/api/articles/a1");
        assert!(req.headers().is_empty());
        assert!(!req.is_mutating());
    }

    #[test]
    fn test_target_encodes_query() {
        let req = ApiRequest::get("/api/articles").query("userId", "u 1");
        assert_eq!(req.target(), "/api/articles?userId=u+1");
        assert_eq!(ApiRequest::get("/api/issues").target(), "/api/issues");
    }

    #[test]
    fn test_url_joins_base() {
        let req = ApiRequest::get("/api/issues/i1");
        let url = req.url("https://cms.example.com/").unwrap();
        assert_eq!(url.as_str(), "https://cms.example.com/api/issues/i1");
    }

    #[test]
    fn test_image_from_path_guesses_type() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("cover.jpg");
        std::fs::write(&path, b"jpeg").unwrap();

        let upload = ImageUpload::from_path(&path).unwrap();
        assert_eq!(upload.file_name, "cover.jpg");
        assert_eq!(upload.content_type, "image/jpeg");
        assert_eq!(upload.bytes, b"jpeg");
    }
}
