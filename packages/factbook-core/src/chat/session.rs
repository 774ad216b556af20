//! Chat session state: transcript, single-flight enforcement, streaming send.
//!
//! A session is owned by exactly one chat panel instance. The transcript and
//! the in-flight flag are fields of the session rather than process globals,
//! so several panels (or tests) never interfere with each other.

use futures::{Future, Stream, StreamExt};
use std::pin::pin;

use crate::api::types::ChatRequest;
use crate::api::FactbookClient;
use crate::{Error, Result};

/// Who authored a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

/// One transcript entry.
///
/// The id is a per-session monotonic counter used only for display-list
/// keying. An assistant message grows while its stream is open and is left
/// untouched afterwards.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub id: u64,
    pub role: ChatRole,
    pub content: String,
}

/// A chat panel's conversation with the backend.
pub struct ChatSession {
    client: FactbookClient,
    strategy_id: Option<i64>,
    messages: Vec<ChatMessage>,
    next_id: u64,
    in_flight: bool,
}

impl ChatSession {
    /// Create a session, optionally scoped to a strategy the answers should
    /// reference.
    pub fn new(client: FactbookClient, strategy_id: Option<i64>) -> Self {
        Self {
            client,
            strategy_id,
            messages: Vec::new(),
            next_id: 1,
            in_flight: false,
        }
    }

    /// Seed the transcript with an assistant greeting, as the chat panel
    /// shows before the first question.
    pub fn with_greeting(mut self, greeting: &str) -> Self {
        self.append(ChatRole::Assistant, greeting.to_string());
        self
    }

    pub fn strategy_id(&self) -> Option<i64> {
        self.strategy_id
    }

    /// The transcript in display order.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Whether a streaming response is currently being read.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Clear the in-flight flag after abandoning a [`send`](Self::send)
    /// future.
    ///
    /// Dropping the future aborts the request, but only the future itself
    /// clears the flag on completion; a caller that cancels (e.g. on panel
    /// teardown and reuse) calls this before the next send. The partial
    /// assistant content stays in the transcript.
    pub fn reset(&mut self) {
        self.in_flight = false;
    }

    /// Send a question and stream the answer into the transcript.
    ///
    /// The user message and an empty assistant placeholder are appended
    /// before the request is issued. Each decoded chunk is concatenated onto
    /// the placeholder in arrival order, and `on_chunk` is invoked with the
    /// updated message after every append so any UI layer can re-render.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyInput`] if `input` trims to nothing (no side effects)
    /// - [`Error::ChatBusy`] if a send is already in flight (no side effects)
    /// - transport errors from the request or the stream; the in-flight flag
    ///   is cleared and any partial assistant content is retained
    pub async fn send<F>(&mut self, input: &str, on_chunk: F) -> Result<()>
    where
        F: FnMut(&ChatMessage),
    {
        let request = self.begin_exchange(input)?;
        let client = self.client.clone();
        self.run_exchange(client.chat_stream(&request), on_chunk)
            .await
    }

    /// Validate the input, append the user message plus the assistant
    /// placeholder, and mark the session in flight.
    fn begin_exchange(&mut self, input: &str) -> Result<ChatRequest> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(Error::EmptyInput);
        }
        if self.in_flight {
            return Err(Error::ChatBusy);
        }

        self.append(ChatRole::User, trimmed.to_string());
        self.append(ChatRole::Assistant, String::new());
        self.in_flight = true;

        tracing::debug!(strategy_id = ?self.strategy_id, "starting chat exchange");

        Ok(ChatRequest {
            input: trimmed.to_string(),
            strategy_id: self.strategy_id,
        })
    }

    /// Drive one exchange to completion, clearing the in-flight flag on
    /// success and on every error path.
    async fn run_exchange<C, S, F>(&mut self, connect: C, on_chunk: F) -> Result<()>
    where
        C: Future<Output = Result<S>>,
        S: Stream<Item = Result<String>>,
        F: FnMut(&ChatMessage),
    {
        let result = match connect.await {
            Ok(stream) => self.consume(stream, on_chunk).await,
            Err(err) => Err(err),
        };
        self.in_flight = false;
        if let Err(err) = &result {
            tracing::warn!("chat exchange failed: {err}");
        }
        result
    }

    async fn consume<S, F>(&mut self, stream: S, mut on_chunk: F) -> Result<()>
    where
        S: Stream<Item = Result<String>>,
        F: FnMut(&ChatMessage),
    {
        let mut stream = pin!(stream);
        while let Some(chunk) = stream.next().await {
            let text = chunk?;
            // The placeholder appended in begin_exchange is always last:
            // the in-flight flag blocks any other transcript mutation.
            if let Some(message) = self.messages.last_mut() {
                message.content.push_str(&text);
                on_chunk(message);
            }
        }
        Ok(())
    }

    fn append(&mut self, role: ChatRole, content: String) {
        let id = self.next_id;
        self.next_id += 1;
        self.messages.push(ChatMessage { id, role, content });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::decoder::decode_stream;
    use futures::future;
    use futures::stream;

    fn session() -> ChatSession {
        ChatSession::new(FactbookClient::new("http://localhost:8000"), None)
    }

    fn text_stream(chunks: Vec<&str>) -> impl Stream<Item = Result<String>> {
        stream::iter(chunks.into_iter().map(|c| Ok(c.to_string())).collect::<Vec<_>>())
    }

    #[tokio::test]
    async fn empty_input_is_rejected_without_side_effects() {
        let mut session = session();
        for input in ["", "   ", "\n\t"] {
            let err = session.send(input, |_| {}).await.unwrap_err();
            assert!(matches!(err, Error::EmptyInput));
        }
        assert!(session.messages().is_empty());
        assert!(!session.is_in_flight());
    }

    #[tokio::test]
    async fn transcript_gains_user_then_assistant_in_order() {
        let mut session = session();
        let request = session.begin_exchange("  What is the goal?  ").unwrap();
        assert_eq!(request.input, "What is the goal?");

        session
            .run_exchange(
                future::ready(Ok(text_stream(vec!["Reach", " new", " buyers"]))),
                |_| {},
            )
            .await
            .unwrap();

        let messages = session.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, ChatRole::User);
        assert_eq!(messages[0].content, "What is the goal?");
        assert_eq!(messages[1].role, ChatRole::Assistant);
        assert_eq!(messages[1].content, "Reach new buyers");
        assert!(messages[0].id < messages[1].id);
        assert!(!session.is_in_flight());
    }

    #[tokio::test]
    async fn chunks_concatenate_in_arrival_order() {
        let mut session = session();
        session.begin_exchange("hello").unwrap();

        let mut observed = Vec::new();
        session
            .run_exchange(
                future::ready(Ok(text_stream(vec!["Hel", "lo, ", "world"]))),
                |message| observed.push(message.content.clone()),
            )
            .await
            .unwrap();

        assert_eq!(session.messages()[1].content, "Hello, world");
        // The observer sees the growing message after every chunk.
        assert_eq!(observed, vec!["Hel", "Hello, ", "Hello, world"]);
    }

    #[tokio::test]
    async fn second_send_is_rejected_while_in_flight() {
        let mut session = session();
        session.begin_exchange("first").unwrap();
        assert!(session.is_in_flight());

        let err = session.begin_exchange("second").unwrap_err();
        assert!(matches!(err, Error::ChatBusy));
        // No messages from the rejected send were interleaved.
        assert_eq!(session.messages().len(), 2);
        assert_eq!(session.messages()[0].content, "first");
    }

    #[tokio::test]
    async fn multibyte_character_split_across_chunks_survives() {
        let mut session = session();
        session.begin_exchange("안녕").unwrap();

        let bytes = "전략 보고서".as_bytes();
        let chunks: Vec<Result<&[u8]>> = vec![Ok(&bytes[..1]), Ok(&bytes[1..5]), Ok(&bytes[5..])];
        session
            .run_exchange(future::ready(Ok(decode_stream(stream::iter(chunks)))), |_| {})
            .await
            .unwrap();

        assert_eq!(session.messages()[1].content, "전략 보고서");
    }

    #[tokio::test]
    async fn connect_failure_clears_in_flight_and_keeps_transcript() {
        let mut session = session();
        session.begin_exchange("question").unwrap();

        let err = session
            .run_exchange(
                future::ready(Err::<stream::Empty<Result<String>>, _>(Error::Api {
                    status: 500,
                    message: "internal".to_string(),
                })),
                |_| {},
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Api { status: 500, .. }));

        // Flag cleared, placeholder retained, next send accepted.
        assert!(!session.is_in_flight());
        assert_eq!(session.messages().len(), 2);
        assert!(session.begin_exchange("again").is_ok());
    }

    #[tokio::test]
    async fn mid_stream_error_retains_partial_content() {
        let mut session = session();
        session.begin_exchange("question").unwrap();

        let chunks: Vec<Result<String>> = vec![
            Ok("partial ".to_string()),
            Ok("answer".to_string()),
            Err(Error::Api {
                status: 502,
                message: "upstream closed".to_string(),
            }),
        ];
        let err = session
            .run_exchange(future::ready(Ok(stream::iter(chunks))), |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Api { status: 502, .. }));

        assert_eq!(session.messages()[1].content, "partial answer");
        assert!(!session.is_in_flight());
        assert!(session.begin_exchange("follow-up").is_ok());
    }

    #[tokio::test]
    async fn reset_unblocks_an_abandoned_exchange() {
        let mut session = session();
        session.begin_exchange("abandoned").unwrap();
        assert!(matches!(session.begin_exchange("next"), Err(Error::ChatBusy)));

        session.reset();
        assert!(session.begin_exchange("next").is_ok());
    }

    #[tokio::test]
    async fn greeting_seeds_the_transcript() {
        let session = session().with_greeting("Ask me anything about the strategy.");
        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.messages()[0].role, ChatRole::Assistant);
    }
}
