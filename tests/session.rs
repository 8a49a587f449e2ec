//! Conversation behaviour of the chat session against scripted transports.

use std::collections::VecDeque;
use std::sync::Mutex;

use chatline::chat::{ChatConfig, ChatSession};
use chatline::{
    ChatCompletions, ChatCompletionsOptions, ChatMessage, ChatRole, ChatTransport,
    CompletionsUsage, Error, Result, RetrievedDocument, Retriever,
};

/// Replays a fixed list of outcomes and records every request.
struct ScriptedTransport {
    replies: Mutex<VecDeque<Result<ChatCompletions>>>,
    requests: Mutex<Vec<(String, ChatCompletionsOptions)>>,
}

impl ScriptedTransport {
    fn new(replies: Vec<Result<ChatCompletions>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn replying(texts: &[&str]) -> Self {
        Self::new(
            texts
                .iter()
                .map(|text| Ok(ChatCompletions::from_reply(*text, CompletionsUsage::new(3, 2))))
                .collect(),
        )
    }

    fn requests(&self) -> Vec<(String, ChatCompletionsOptions)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl<'a> ChatTransport for &'a ScriptedTransport {
    async fn chat_completions(
        &self,
        deployment: &str,
        options: &ChatCompletionsOptions,
    ) -> Result<ChatCompletions> {
        self.requests
            .lock()
            .unwrap()
            .push((deployment.to_string(), options.clone()));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Error::protocol("script exhausted")))
    }
}

struct FixedRetriever(Vec<RetrievedDocument>);

#[async_trait::async_trait]
impl Retriever for FixedRetriever {
    async fn query(&self, _text: &str) -> Result<Vec<RetrievedDocument>> {
        Ok(self.0.clone())
    }
}

fn config() -> ChatConfig {
    ChatConfig::new("https://example.openai.azure.com/", "key")
}

#[tokio::test]
async fn hello_gets_the_scripted_reply() {
    let transport = ScriptedTransport::replying(&["hi there"]);
    let mut session = ChatSession::new(&transport, config());

    assert_eq!(session.send("hello").await.unwrap(), "hi there");
    assert_eq!(
        session.turns(),
        &[ChatMessage::user("hello"), ChatMessage::assistant("hi there")]
    );
}

#[tokio::test]
async fn turns_grow_by_two_per_send_in_call_order() {
    let inputs = ["one", "two", "three", "four"];
    let transport = ScriptedTransport::replying(&["1", "2", "3", "4"]);
    let mut session = ChatSession::new(&transport, config());

    for (sent, input) in inputs.iter().enumerate() {
        let reply = session.send(input).await.unwrap();
        assert_eq!(reply, (sent + 1).to_string());
        assert_eq!(session.turn_count(), 2 * (sent + 1));
    }

    let expected: Vec<ChatMessage> = inputs
        .iter()
        .enumerate()
        .flat_map(|(idx, input)| {
            [
                ChatMessage::user(*input),
                ChatMessage::assistant((idx + 1).to_string()),
            ]
        })
        .collect();
    assert_eq!(session.turns(), expected.as_slice());
}

#[tokio::test]
async fn every_request_carries_the_whole_conversation() {
    let transport = ScriptedTransport::replying(&["first reply", "second reply"]);
    let mut session = ChatSession::new(
        &transport,
        config()
            .with_deployment("gpt-4")
            .with_system_prompt(Some("You will talk like a pirate.".to_string())),
    );
    session.send("first").await.unwrap();
    session.send("second").await.unwrap();

    let requests = transport.requests();
    assert_eq!(requests.len(), 2);
    let (deployment, last) = &requests[1];
    assert_eq!(deployment, "gpt-4");
    let sent: Vec<(ChatRole, &str)> = last.messages.iter().map(|m| (m.role, m.text())).collect();
    assert_eq!(
        sent,
        vec![
            (ChatRole::System, "You will talk like a pirate."),
            (ChatRole::User, "first"),
            (ChatRole::Assistant, "first reply"),
            (ChatRole::User, "second"),
        ]
    );
}

#[tokio::test]
async fn transport_failure_keeps_only_the_user_turn() {
    let transport = ScriptedTransport::new(vec![
        Err(Error::connection("connection refused", None)),
        Ok(ChatCompletions::from_reply("recovered", CompletionsUsage::new(1, 1))),
    ]);
    let mut session = ChatSession::new(&transport, config());

    let err = session.send("are you there?").await.unwrap_err();
    assert!(err.is_transport());
    assert!(!err.is_protocol());
    assert_eq!(session.turns(), &[ChatMessage::user("are you there?")]);
    assert!(session.last_usage().is_none());

    assert_eq!(session.send("hello again").await.unwrap(), "recovered");
    assert_eq!(session.turn_count(), 3);
    let stats = session.stats();
    assert_eq!(stats.total_requests, 2);
    assert_eq!(stats.total_prompt_tokens, 1);
}

#[tokio::test]
async fn reply_without_choices_is_a_protocol_error() {
    let empty: ChatCompletions = serde_json::from_str(r#"{"id":"x","choices":[]}"#).unwrap();
    let transport = ScriptedTransport::new(vec![Ok(empty)]);
    let mut session = ChatSession::new(&transport, config());

    let err = session.send("hello").await.unwrap_err();
    assert!(err.is_protocol());
    assert_eq!(session.turns(), &[ChatMessage::user("hello")]);
}

#[tokio::test]
async fn retrieved_context_only_reaches_one_request() {
    let transport = ScriptedTransport::replying(&["The T-47.", "It has a harpoon."]);
    let mut session = ChatSession::new(
        &transport,
        config().with_system_prompt(Some("Be brief.".to_string())),
    )
    .with_retriever(Box::new(FixedRetriever(vec![RetrievedDocument::new(
        "The T-47 airspeeder is a snowspeeder.",
        1.2,
    )])));

    session.send("Which vehicle is a snowspeeder?").await.unwrap();
    session.set_retrieval_enabled(false);
    session.send("What does it carry?").await.unwrap();

    let requests = transport.requests();
    let first_system = requests[0].1.messages[0].text();
    assert!(first_system.starts_with("Be brief.\n\n"));
    assert!(first_system.contains("- The T-47 airspeeder is a snowspeeder."));
    assert_eq!(requests[1].1.messages[0].text(), "Be brief.");
    // The stored conversation never holds retrieved text.
    assert!(
        session
            .turns()
            .iter()
            .all(|turn| !turn.text().contains("airspeeder"))
    );
}
