pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod session;
pub mod store;
pub mod views;

use anyhow::Result;
use config::Config;
use std::sync::Arc;

use crate::api::{ApiClient, ReqwestTransport, Transport};
use crate::auth::AuthGate;
use crate::store::{FileTokenStore, TokenStore};

/// Shared handles every view is built from.
///
/// The API client reads its bearer token from the gate and reports 401s back
/// to it, so both always agree on who is signed in.
#[derive(Clone)]
pub struct AppContext {
    pub api: ApiClient,
    pub gate: AuthGate,
}

impl AppContext {
    pub fn new(transport: Arc<dyn Transport>, store: Arc<dyn TokenStore>) -> Self {
        let gate = AuthGate::new(store);
        let api = ApiClient::new(transport).with_credentials(Arc::new(gate.clone()));
        Self { api, gate }
    }

    /// Production wiring: HTTP transport plus the token file under
    /// `session.data_dir`. Any persisted session is restored.
    pub fn from_config(config: &Config) -> Result<Self> {
        let transport = ReqwestTransport::new(config.api.base_url.clone(), config.api.timeout())?;
        let store = FileTokenStore::in_dir(&config.session.data_dir);
        let ctx = Self::new(Arc::new(transport), Arc::new(store));
        ctx.gate.restore();
        Ok(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::MockTransport;
    use crate::session::testing::writer_token;
    use crate::store::MemoryTokenStore;
    use reqwest::Method;
    use serde_json::json;

    #[tokio::test]
    async fn test_context_shares_session_between_gate_and_client() {
        let mock = Arc::new(MockTransport::new());
        mock.on_json(Method::GET, "/api/issues", 200, json!([]));
        let token = writer_token();
        let store = Arc::new(MemoryTokenStore::with_token(token.clone()));

        let ctx = AppContext::new(mock.clone(), store);
        ctx.gate.restore();
        ctx.api.list_issues().await.unwrap();
        assert_eq!(mock.requests()[0].bearer, Some(token));

        ctx.gate.logout(crate::auth::LogoutReason::UserRequested);
        ctx.api.list_issues().await.unwrap();
        assert_eq!(mock.requests()[1].bearer, None);
    }

    #[test]
    fn test_from_config_restores_persisted_session() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = FileTokenStore::in_dir(dir.path());
        store.save(&writer_token()).unwrap();

        let mut config = Config::default();
        config.session.data_dir = dir.path().to_path_buf();
        let ctx = AppContext::from_config(&config).unwrap();
        assert_eq!(ctx.gate.session().unwrap().user.username, "bob");
    }
}
