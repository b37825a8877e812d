use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use super::models::{
    Article, ArticleInput, ArticlePatch, Issue, IssueInput, IssuePatch, LoginRequest,
    LoginResponse, RegisterRequest,
};
use super::request::{ApiRequest, ImageUpload};
use super::transport::{RawResponse, Transport};
use super::ApiError;

/// Source of the bearer token, and the sink for "this token was rejected".
///
/// The auth gate implements this so 401 handling lives in one place.
pub trait Credentials: Send + Sync {
    fn bearer(&self) -> Option<String>;
    fn revoke(&self);
}

/// Typed client for the CMS REST API.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    credentials: Option<Arc<dyn Credentials>>,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            credentials: None,
        }
    }

    pub fn with_credentials(mut self, credentials: Arc<dyn Credentials>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    fn current_bearer(&self) -> Option<String> {
        self.credentials.as_ref().and_then(|c| c.bearer())
    }

    /// Attach the token if there is one.
    fn optional_auth(&self, request: ApiRequest) -> ApiRequest {
        match self.current_bearer() {
            Some(token) => request.bearer(token),
            None => request,
        }
    }

    /// Attach the token, failing without a network call if signed out.
    fn required_auth(&self, request: ApiRequest) -> Result<ApiRequest, ApiError> {
        match self.current_bearer() {
            Some(token) => Ok(request.bearer(token)),
            None => {
                debug!(method = %request.method, path = %request.path, "Refusing unauthenticated request");
                Err(ApiError::not_authenticated())
            }
        }
    }

    /// Send a request and turn non-2xx responses into [`ApiError`].
    pub async fn execute(&self, request: ApiRequest) -> Result<RawResponse, ApiError> {
        let response = self.transport.send(&request).await?;
        if response.is_success() {
            return Ok(response);
        }

        let err = ApiError::from_response(response.status, &response.body);
        if err.is_unauthorized() && request.bearer.is_some() {
            warn!(path = %request.path, "Server rejected the session token");
            if let Some(credentials) = &self.credentials {
                credentials.revoke();
            }
        }
        Err(err)
    }

    async fn call<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let response = self.execute(request).await?;
        serde_json::from_str(&response.body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Like `call`, for endpoints whose success body carries nothing we use.
    async fn call_value(&self, request: ApiRequest) -> Result<Value, ApiError> {
        let response = self.execute(request).await?;
        if response.body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&response.body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    // ------------------------------------------------------------------
    // Auth
    // ------------------------------------------------------------------

    pub async fn login(&self, credentials: &LoginRequest) -> Result<LoginResponse, ApiError> {
        self.call(ApiRequest::post("/api/auth/login").json(credentials)?)
            .await
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<Value, ApiError> {
        self.call_value(ApiRequest::post("/api/auth/register").json(request)?)
            .await
    }

    // ------------------------------------------------------------------
    // Issues
    // ------------------------------------------------------------------

    pub async fn list_issues(&self) -> Result<Vec<Issue>, ApiError> {
        self.call(self.optional_auth(ApiRequest::get("/api/issues")))
            .await
    }

    pub async fn get_issue(&self, id: &str) -> Result<Issue, ApiError> {
        self.call(self.optional_auth(ApiRequest::get(format!("/api/issues/{}", id))))
            .await
    }

    pub async fn create_issue(&self, input: &IssueInput) -> Result<Issue, ApiError> {
        let request = self.required_auth(ApiRequest::post("/api/issues").json(input)?)?;
        self.call(request).await
    }

    pub async fn update_issue(&self, id: &str, input: &IssueInput) -> Result<Issue, ApiError> {
        let request =
            self.required_auth(ApiRequest::put(format!("/api/issues/{}", id)).json(input)?)?;
        self.call(request).await
    }

    pub async fn patch_issue(&self, id: &str, patch: &IssuePatch) -> Result<Issue, ApiError> {
        let request =
            self.required_auth(ApiRequest::patch(format!("/api/issues/{}", id)).json(patch)?)?;
        self.call(request).await
    }

    pub async fn delete_issue(&self, id: &str) -> Result<Value, ApiError> {
        let request = self.required_auth(ApiRequest::delete(format!("/api/issues/{}", id)))?;
        self.call_value(request).await
    }

    pub async fn list_issue_articles(&self, id: &str) -> Result<Vec<Article>, ApiError> {
        self.call(self.optional_auth(ApiRequest::get(format!("/api/issues/{}/articles", id))))
            .await
    }

    // ------------------------------------------------------------------
    // Articles
    // ------------------------------------------------------------------

    /// List articles, optionally only those written by `user_id`.
    pub async fn list_articles(&self, user_id: Option<&str>) -> Result<Vec<Article>, ApiError> {
        let mut request = ApiRequest::get("/api/articles");
        if let Some(user_id) = user_id {
            request = request.query("userId", user_id);
        }
        self.call(self.optional_auth(request)).await
    }

    pub async fn get_article(&self, id: &str) -> Result<Article, ApiError> {
        self.call(self.optional_auth(ApiRequest::get(format!("/api/articles/{}", id))))
            .await
    }

    pub async fn create_article(&self, input: &ArticleInput) -> Result<Article, ApiError> {
        let request = self.required_auth(ApiRequest::post("/api/articles").json(input)?)?;
        self.call(request).await
    }

    pub async fn update_article(&self, id: &str, input: &ArticleInput) -> Result<Article, ApiError> {
        let request =
            self.required_auth(ApiRequest::put(format!("/api/articles/{}", id)).json(input)?)?;
        self.call(request).await
    }

    pub async fn patch_article(&self, id: &str, patch: &ArticlePatch) -> Result<Value, ApiError> {
        let request =
            self.required_auth(ApiRequest::patch(format!("/api/articles/{}", id)).json(patch)?)?;
        self.call_value(request).await
    }

    pub async fn delete_article(&self, id: &str) -> Result<Value, ApiError> {
        let request = self.required_auth(ApiRequest::delete(format!("/api/articles/{}", id)))?;
        self.call_value(request).await
    }

    pub async fn upload_article_image(
        &self,
        id: &str,
        upload: ImageUpload,
    ) -> Result<Value, ApiError> {
        let request = self.required_auth(
            ApiRequest::post(format!("/api/articles/{}/image", id)).multipart(upload),
        )?;
        self.call_value(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::ArticleStatus;
    use crate::api::request::{RequestBody, AUTHORIZATION, CONTENT_TYPE};
    use crate::api::testing::{MockTransport, StaticCredentials};
    use reqwest::Method;
    use serde_json::json;

    fn client(mock: &Arc<MockTransport>, token: Option<&str>) -> (ApiClient, Arc<StaticCredentials>) {
        let creds = Arc::new(StaticCredentials::new(token));
        let client = ApiClient::new(mock.clone()).with_credentials(creds.clone());
        (client, creds)
    }

    #[tokio::test]
    async fn test_login_sends_credentials_without_token() {
        let mock = Arc::new(MockTransport::new());
        mock.on_json(Method::POST, "/api/auth/login", 200, json!({"token": "t.o.k"}));
        let (client, _) = client(&mock, None);

        let response = client
            .login(&LoginRequest {
                username: "a".into(),
                password: "b".into(),
            })
            .await
            .unwrap();
        assert_eq!(response.token, "t.o.k");

        let sent = mock.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].bearer, None);
        assert_eq!(sent[0].body, RequestBody::Json(json!({"username": "a", "password": "b"})));
    }

    #[tokio::test]
    async fn test_mutation_without_token_makes_no_call() {
        let mock = Arc::new(MockTransport::new());
        let (client, _) = client(&mock, None);

        let err = client.delete_issue("i1").await.unwrap_err();
        assert!(err.is_unauthorized());
        assert_eq!(mock.request_count(), 0);
    }

    #[tokio::test]
    async fn test_writer_scope_adds_user_filter() {
        let mock = Arc::new(MockTransport::new());
        mock.on_json(Method::GET, "/api/articles?userId=u-2", 200, json!([]));
        let (client, _) = client(&mock, Some("tok"));

        client.list_articles(Some("u-2")).await.unwrap();

        let sent = mock.requests();
        assert_eq!(sent[0].target(), "/api/articles?userId=u-2");
        assert_eq!(sent[0].bearer.as_deref(), Some("tok"));
    }

    #[tokio::test]
    async fn test_error_message_surfaces() {
        let mock = Arc::new(MockTransport::new());
        mock.on(Method::GET, "/api/articles/a1", 404, r#"{"message":"X"}"#);
        mock.on(Method::GET, "/api/articles/a2", 500, "Y");
        let (client, _) = client(&mock, None);

        assert_eq!(client.get_article("a1").await.unwrap_err().to_string(), "X");
        assert_eq!(client.get_article("a2").await.unwrap_err().to_string(), "Y");
    }

    #[tokio::test]
    async fn test_unauthorized_revokes_credentials() {
        let mock = Arc::new(MockTransport::new());
        mock.on(Method::GET, "/api/issues", 401, r#"{"msg":"Token is not valid"}"#);
        let (client, creds) = client(&mock, Some("stale"));

        let err = client.list_issues().await.unwrap_err();
        assert!(err.is_unauthorized());
        assert_eq!(creds.revocations(), 1);
    }

    #[tokio::test]
    async fn test_failed_login_does_not_revoke() {
        let mock = Arc::new(MockTransport::new());
        mock.on(Method::POST, "/api/auth/login", 401, r#"{"msg":"Invalid credentials"}"#);
        let (client, creds) = client(&mock, None);

        let err = client
            .login(&LoginRequest {
                username: "a".into(),
                password: "wrong".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid credentials");
        assert_eq!(creds.revocations(), 0);
    }

    #[tokio::test]
    async fn test_network_failure_is_reported() {
        let mock = Arc::new(MockTransport::new());
        mock.fail(Method::GET, "/api/issues", "connection refused");
        let (client, _) = client(&mock, None);

        let err = client.list_issues().await.unwrap_err();
        assert!(err.is_network());
    }

    #[tokio::test]
    async fn test_success_with_unexpected_body_is_decode_error() {
        let mock = Arc::new(MockTransport::new());
        mock.on(Method::GET, "/api/issues", 200, "<html>");
        let (client, _) = client(&mock, None);

        assert!(matches!(client.list_issues().await, Err(ApiError::Decode(_))));
    }

    #[tokio::test]
    async fn test_patch_status_and_empty_delete_body() {
        let mock = Arc::new(MockTransport::new());
        mock.on(Method::PATCH, "/api/articles/a1", 200, "");
        mock.on(Method::DELETE, "/api/articles/a1", 204, "");
        let (client, _) = client(&mock, Some("tok"));

        client
            .patch_article("a1", &ArticlePatch::status(ArticleStatus::Published))
            .await
            .unwrap();
        assert_eq!(client.delete_article("a1").await.unwrap(), Value::Null);

        let sent = mock.requests();
        assert_eq!(sent[0].body, RequestBody::Json(json!({"status": "published"})));
        assert_eq!(sent[1].method, Method::DELETE);
    }

    #[tokio::test]
    async fn test_image_upload_is_multipart() {
        let mock = Arc::new(MockTransport::new());
        mock.on_json(Method::POST, "/api/articles/a1/image", 200, json!({"image": "/img/a1.png"}));
        let (client, _) = client(&mock, Some("tok"));

        client
            .upload_article_image("a1", ImageUpload::new("a.png", "image/png", vec![0u8; 4]))
            .await
            .unwrap();

        let sent = mock.requests();
        assert!(matches!(sent[0].body, RequestBody::Multipart(_)));
        let headers = sent[0].headers();
        assert!(headers.iter().any(|(name, _)| *name == AUTHORIZATION));
        assert!(!headers.iter().any(|(name, _)| *name == CONTENT_TYPE));
    }
}
