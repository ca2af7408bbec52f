// SPDX-FileCopyrightText: 2026 Arcane Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` boots a complete stack: temp SQLite document store and a
//! real server on an ephemeral port. Tests drive it through the public
//! HTTP surface with [`TestHarness::signed_in_client`] and assert against
//! the store directly.

use std::sync::Arc;
use std::time::Duration;

use arcane_client::ApiClient;
use arcane_core::ArcaneError;
use arcane_server::{AppState, AuthConfig, GmScript, RatePolicy, default_policies, serve_on};
use arcane_store::DocumentStore;

const TEST_AUTH_SECRET: &str = "test-harness-secret-key";

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    gm: Option<GmScript>,
    command_policy: Option<RatePolicy>,
    message_policy: Option<RatePolicy>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            gm: None,
            command_policy: None,
            message_policy: None,
        }
    }

    /// Use a specific GM scene script instead of the fast default.
    pub fn with_gm_script(mut self, script: GmScript) -> Self {
        self.gm = Some(script);
        self
    }

    /// Override the command rate policy (e.g. to make limits reachable).
    pub fn with_command_policy(mut self, policy: RatePolicy) -> Self {
        self.command_policy = Some(policy);
        self
    }

    /// Override the message rate policy.
    pub fn with_message_policy(mut self, policy: RatePolicy) -> Self {
        self.message_policy = Some(policy);
        self
    }

    /// Build the harness: open a temp store, bind an ephemeral port, and
    /// start serving.
    pub async fn build(self) -> Result<TestHarness, ArcaneError> {
        let temp_dir = tempfile::TempDir::new().map_err(|e| ArcaneError::Storage {
            source: e.into(),
        })?;
        let db_path = temp_dir.path().join("test.db");
        let db_path = db_path.to_string_lossy().to_string();

        let store = Arc::new(DocumentStore::open(&db_path).await?);
        let auth = AuthConfig::new(TEST_AUTH_SECRET);

        let (default_command, default_message) = default_policies();
        let gm = self.gm.unwrap_or_else(|| GmScript {
            chunks: vec!["chunk1".to_string(), "chunk2".to_string()],
            narration: "The door shudders.".to_string(),
            public_hints: vec!["The order of the symbols matters".to_string()],
            chunk_delay: Duration::from_millis(5),
        });

        let state = AppState::new(
            Arc::clone(&store),
            auth.clone(),
            self.command_policy.unwrap_or(default_command),
            self.message_policy.unwrap_or(default_message),
            gm,
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| ArcaneError::Stream {
                message: format!("failed to bind test listener: {e}"),
                source: Some(Box::new(e)),
            })?;
        let addr = listener.local_addr().map_err(|e| ArcaneError::Stream {
            message: format!("failed to read test listener address: {e}"),
            source: Some(Box::new(e)),
        })?;

        let server = tokio::spawn(serve_on(listener, state));

        Ok(TestHarness {
            store,
            auth,
            base_url: format!("http://{addr}"),
            server,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment: temp store, live server, token minting.
pub struct TestHarness {
    /// The document store the server writes to (temp DB, cleaned up on drop).
    pub store: Arc<DocumentStore>,
    /// Token minting for out-of-band identities.
    pub auth: AuthConfig,
    /// Base URL of the running server.
    pub base_url: String,
    server: tokio::task::JoinHandle<Result<(), ArcaneError>>,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// An API client with no credentials.
    pub fn client(&self) -> Result<ApiClient, ArcaneError> {
        ApiClient::new(&self.base_url)
    }

    /// An API client signed in anonymously; returns the client and its
    /// user id.
    pub async fn signed_in_client(&self) -> Result<(ApiClient, String), ArcaneError> {
        let mut client = self.client()?;
        let auth = client.sign_in_anonymously().await?;
        Ok((client, auth.user_id))
    }
}

impl Drop for TestHarness {
    fn drop(&mut self) {
        self.server.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn builder_creates_working_environment() {
        let harness = TestHarness::builder().build().await.unwrap();
        // Server is reachable and the store is empty.
        let (client, _user) = harness.signed_in_client().await.unwrap();
        let created = client.create_session("Harness Owner").await.unwrap();
        assert_eq!(created.code.len(), 6);
    }

    #[tokio::test]
    async fn harnesses_are_isolated() {
        let h1 = TestHarness::builder().build().await.unwrap();
        let h2 = TestHarness::builder().build().await.unwrap();

        let (client, _user) = h1.signed_in_client().await.unwrap();
        let created = client.create_session("Owner").await.unwrap();

        assert!(
            h1.store
                .get_session(&created.session_id)
                .await
                .unwrap()
                .is_some()
        );
        assert!(
            h2.store
                .get_session(&created.session_id)
                .await
                .unwrap()
                .is_none()
        );
    }
}
