//! Integration tests against a live deployment.
//! These tests require OPENAI_ENDPOINT and OPENAI_KEY in the environment to run.

#[cfg(test)]
mod tests {
    use chatline::chat::{ChatConfig, ChatSession};
    use chatline::AzureOpenAI;

    fn live_client() -> Option<(String, String)> {
        let endpoint = std::env::var("OPENAI_ENDPOINT").ok()?;
        let key = std::env::var("OPENAI_KEY").ok()?;
        Some((endpoint, key))
    }

    #[tokio::test]
    async fn test_simple_conversation() {
        let Some((endpoint, key)) = live_client() else {
            eprintln!("Skipping test: OPENAI_ENDPOINT or OPENAI_KEY not set");
            return;
        };
        let deployment =
            std::env::var("OPENAI_DEPLOYMENT").unwrap_or_else(|_| "gpt-35-turbo".to_string());

        let client = AzureOpenAI::new(&endpoint, key.clone()).expect("Failed to create client");
        let config = ChatConfig::new(endpoint, key)
            .with_deployment(deployment)
            .with_max_tokens(10);
        let mut session = ChatSession::new(client, config);

        let reply = session.send("Say 'test passed'").await;
        assert!(reply.is_ok(), "Request should succeed with valid credentials");
        assert_eq!(session.turn_count(), 2);
    }
}
