//! Integration tests for the FlowChat library.
//! These tests require a running backend; set FLOWCHAT_API_BASE to run them.

#[cfg(test)]
mod tests {
    use flowchat::{
        AuthMode, Backend, ClientConfig, FlowChat, KnownModel, MemoryTokenStore, Model,
        SessionClient, StorageKey, TokenStore,
    };

    fn base_url() -> Option<String> {
        let base = std::env::var("FLOWCHAT_API_BASE").ok();
        if base.is_none() {
            eprintln!("Skipping test: FLOWCHAT_API_BASE not set");
        }
        base
    }

    fn unique_username() -> String {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        format!("flowchat-test-{nanos}")
    }

    #[tokio::test]
    async fn test_health() {
        let Some(base) = base_url() else {
            return;
        };
        let client = FlowChat::new(&base).expect("Failed to create client");
        let health = client.health().await.expect("health should succeed");
        assert!(health.is_ok(), "unexpected status {}", health.status);
    }

    #[tokio::test]
    async fn test_bad_credentials_are_rejected() {
        let Some(base) = base_url() else {
            return;
        };
        let client = FlowChat::new(&base).expect("Failed to create client");
        let credentials = flowchat::Credentials::new(unique_username(), "wrong-password");
        let err = client
            .obtain_token(&credentials)
            .await
            .expect_err("unknown user must not get a token");
        assert!(err.is_authentication(), "got {err:?}");
    }

    #[tokio::test]
    async fn test_full_session() {
        let Some(base) = base_url() else {
            return;
        };
        let config = ClientConfig::new().with_base_url(base);
        let client = FlowChat::with_config(&config).expect("Failed to create client");
        let session = SessionClient::new(client, MemoryTokenStore::new(), config);

        let username = unique_username();
        let password = "integration-password-1";
        session
            .authenticate(&username, password, AuthMode::Signup)
            .await
            .expect("signup should succeed");
        assert!(!session.is_authenticated());

        session
            .authenticate(&username, password, AuthMode::Login)
            .await
            .expect("login should succeed");
        assert!(session.is_authenticated());
        assert!(
            session
                .store()
                .get(StorageKey::AccessToken)
                .unwrap()
                .is_some()
        );

        let id = session
            .create_thread()
            .await
            .expect("create should succeed")
            .expect("server should report the new id");
        assert_eq!(session.active_thread(), Some(id));

        let reply = session
            .send_message("Say hello.", &Model::Known(KnownModel::Gemini20Flash))
            .await;
        if let Ok(reply) = reply {
            assert!(!reply.content.is_empty());
            assert_eq!(session.messages().len(), 2);
        }

        session.delete_thread(id).await.expect("delete should succeed");
        assert_eq!(session.active_thread(), None);

        session.logout();
        assert!(session.store().is_empty());
    }
}
