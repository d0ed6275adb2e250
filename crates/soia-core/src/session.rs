//! Conversation state controller
//!
//! [`ChatSession`] is the single source of truth for one chat: the message
//! history, the conversation id handed out by the service, and whether a
//! request is in flight. Front ends call [`ChatSession::submit`], run the
//! returned request wherever they like, and feed the result back through
//! [`ChatSession::resolve`]. [`ChatSession::send_message`] does all three in
//! one call for callers that can simply await.

use crate::api::{ApiError, ChatApi, ChatRequest, ChatResponse};
use crate::state::ChatMessage;

/// Assistant reply shown when a request fails for any reason.
pub const FALLBACK_REPLY: &str = "Sorry, an error occurred. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Idle,
    AwaitingResponse,
}

/// Identifies one outbound request.
///
/// `generation` is the session generation at submit time; `turn` is unique
/// per submit within the session's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
    turn: u64,
}

impl Ticket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// A submitted turn whose request still has to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTurn {
    pub ticket: Ticket,
    pub request: ChatRequest,
}

/// What [`ChatSession::resolve`] did with a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The reply was appended and the conversation id updated.
    Replied,
    /// The request failed; the fallback reply was appended.
    Fallback,
    /// The request belonged to a conversation that has since been reset.
    Stale,
    /// The ticket is not the one in flight.
    Ignored,
}

#[derive(Debug, Default)]
pub struct ChatSession {
    messages: Vec<ChatMessage>,
    conversation_id: Option<String>,
    in_flight: Option<Ticket>,
    generation: u64,
    next_turn: u64,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn is_pending(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn status(&self) -> SessionStatus {
        if self.is_pending() {
            SessionStatus::AwaitingResponse
        } else {
            SessionStatus::Idle
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Start a turn.
    ///
    /// Returns `None` without touching any state when the trimmed text is
    /// empty or another request is still outstanding.
    pub fn submit(&mut self, text: &str) -> Option<PendingTurn> {
        let text = text.trim();
        if text.is_empty() || self.is_pending() {
            return None;
        }

        let ticket = Ticket {
            generation: self.generation,
            turn: self.next_turn,
        };
        self.next_turn += 1;
        self.in_flight = Some(ticket);
        self.messages.push(ChatMessage::user(text));

        tracing::debug!(
            turn = ticket.turn,
            generation = ticket.generation,
            conversation_id = ?self.conversation_id,
            "turn submitted"
        );

        Some(PendingTurn {
            ticket,
            request: ChatRequest {
                message: text.to_string(),
                conversation_id: self.conversation_id.clone(),
            },
        })
    }

    /// Apply the result of the request identified by `ticket`.
    pub fn resolve(
        &mut self,
        ticket: Ticket,
        outcome: Result<ChatResponse, ApiError>,
    ) -> TurnOutcome {
        if self.in_flight != Some(ticket) {
            tracing::debug!(turn = ticket.turn, "ignoring result for unknown ticket");
            return TurnOutcome::Ignored;
        }
        self.in_flight = None;

        if ticket.generation != self.generation {
            tracing::info!(
                turn = ticket.turn,
                generation = ticket.generation,
                current = self.generation,
                "discarding reply for abandoned conversation"
            );
            return TurnOutcome::Stale;
        }

        match outcome {
            Ok(reply) => {
                self.conversation_id = Some(reply.conversation_id);
                self.messages.push(ChatMessage::assistant(reply.message));
                TurnOutcome::Replied
            }
            Err(err) => {
                tracing::warn!(turn = ticket.turn, error = %err, detail = ?error_detail(&err), "chat request failed");
                self.messages.push(ChatMessage::assistant(FALLBACK_REPLY));
                TurnOutcome::Fallback
            }
        }
    }

    /// Submit, send and resolve in one go.
    pub async fn send_message(&mut self, api: &dyn ChatApi, text: &str) -> Option<TurnOutcome> {
        let PendingTurn { ticket, request } = self.submit(text)?;
        let outcome = api.send(request).await;
        Some(self.resolve(ticket, outcome))
    }

    /// Forget the current conversation.
    ///
    /// Messages and conversation id are cleared together. An outstanding
    /// request keeps the session pending until its result arrives, and that
    /// result is then discarded.
    pub fn new_chat(&mut self) {
        self.messages.clear();
        self.conversation_id = None;
        self.generation += 1;
        tracing::info!(generation = self.generation, "new conversation");
    }
}

fn error_detail(err: &ApiError) -> Option<&str> {
    match err {
        ApiError::Status { detail, .. } => detail.as_deref(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ChatRole;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays scripted results and records every request it sees.
    #[derive(Default)]
    struct ScriptedApi {
        replies: Mutex<VecDeque<Result<ChatResponse, ApiError>>>,
        requests: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedApi {
        fn with(replies: Vec<Result<ChatResponse, ApiError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<ChatRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatApi for ScriptedApi {
        async fn send(&self, request: ChatRequest) -> Result<ChatResponse, ApiError> {
            self.requests.lock().unwrap().push(request);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ApiError::Decode("no scripted reply".to_string())))
        }
    }

    fn failure() -> Result<ChatResponse, ApiError> {
        Err(ApiError::Status {
            status: 500,
            detail: Some("boom".to_string()),
        })
    }

    fn session_with_history() -> ChatSession {
        let mut session = ChatSession::new();
        let turn = session.submit("Hello").unwrap();
        session.resolve(turn.ticket, Ok(ChatResponse::new("abc", "Hi there")));
        session
    }

    #[tokio::test]
    async fn test_first_turn_sets_identity() {
        let api = ScriptedApi::with(vec![Ok(ChatResponse::new("abc", "Hi there"))]);
        let mut session = ChatSession::new();

        let outcome = session.send_message(&api, "Hello").await;

        assert_eq!(outcome, Some(TurnOutcome::Replied));
        assert_eq!(
            session.messages(),
            &[ChatMessage::user("Hello"), ChatMessage::assistant("Hi there")]
        );
        assert_eq!(session.conversation_id(), Some("abc"));
        assert_eq!(session.status(), SessionStatus::Idle);
        assert_eq!(api.requests()[0].conversation_id, None);
    }

    #[tokio::test]
    async fn test_failure_appends_fallback_and_keeps_identity() {
        let api = ScriptedApi::with(vec![failure()]);
        let mut session = session_with_history();
        let before = session.messages().to_vec();

        let outcome = session.send_message(&api, "More").await;

        assert_eq!(outcome, Some(TurnOutcome::Fallback));
        assert_eq!(session.conversation_id(), Some("abc"));
        assert_eq!(session.messages().len(), 4);
        assert_eq!(&session.messages()[..2], before.as_slice());
        assert_eq!(session.messages()[2], ChatMessage::user("More"));
        assert_eq!(session.messages()[3], ChatMessage::assistant(FALLBACK_REPLY));
        assert!(!session.is_pending());
    }

    #[tokio::test]
    async fn test_identity_reused_on_next_request() {
        let api = ScriptedApi::with(vec![
            Ok(ChatResponse::new("c1", "hi")),
            Ok(ChatResponse::new("c1", "again")),
        ]);
        let mut session = ChatSession::new();

        session.send_message(&api, "first").await;
        session.send_message(&api, "second").await;

        let requests = api.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].conversation_id.as_deref(), Some("c1"));
        assert_eq!(requests[1].message, "second");
    }

    #[tokio::test]
    async fn test_retry_after_failure_uses_last_good_identity() {
        let api = ScriptedApi::with(vec![failure(), Ok(ChatResponse::new("abc", "ok"))]);
        let mut session = session_with_history();

        session.send_message(&api, "More").await;
        session.send_message(&api, "More").await;

        let requests = api.requests();
        assert!(requests.iter().all(|r| r.conversation_id.as_deref() == Some("abc")));
    }

    #[test]
    fn test_blank_text_is_noop() {
        let mut session = ChatSession::new();

        assert!(session.submit("").is_none());
        assert!(session.submit("   ").is_none());
        assert!(session.submit("\n\t").is_none());
        assert!(session.is_empty());
        assert!(!session.is_pending());
    }

    #[test]
    fn test_submit_appends_trimmed_user_message_before_reply() {
        let mut session = ChatSession::new();

        let turn = session.submit("  Hola  ").unwrap();

        assert_eq!(turn.request.message, "Hola");
        assert_eq!(session.messages(), &[ChatMessage::user("Hola")]);
        assert_eq!(session.status(), SessionStatus::AwaitingResponse);
    }

    #[test]
    fn test_submit_while_pending_is_noop() {
        let mut session = ChatSession::new();
        session.submit("one").unwrap();

        assert!(session.submit("two").is_none());
        assert_eq!(session.messages().len(), 1);
        assert!(session.is_pending());
    }

    #[test]
    fn test_exactly_one_assistant_message_per_turn() {
        let mut session = ChatSession::new();
        let turn = session.submit("Hello").unwrap();

        assert_eq!(session.resolve(turn.ticket, failure()), TurnOutcome::Fallback);
        assert_eq!(
            session.resolve(turn.ticket, Ok(ChatResponse::new("x", "late"))),
            TurnOutcome::Ignored
        );

        let assistant = session
            .messages()
            .iter()
            .filter(|m| m.role == ChatRole::Assistant)
            .count();
        assert_eq!(assistant, 1);
        assert_eq!(session.conversation_id(), None);
    }

    #[test]
    fn test_new_chat_clears_everything() {
        let mut session = session_with_history();

        session.new_chat();
        assert!(session.is_empty());
        assert_eq!(session.conversation_id(), None);

        session.new_chat();
        assert!(session.is_empty());
        assert_eq!(session.conversation_id(), None);
    }

    #[test]
    fn test_new_chat_keeps_pending_until_abandoned_reply_arrives() {
        let mut session = session_with_history();
        let turn = session.submit("More").unwrap();

        session.new_chat();
        assert!(session.is_empty());
        assert!(session.is_pending());
        assert!(session.submit("fresh").is_none());

        let outcome = session.resolve(turn.ticket, Ok(ChatResponse::new("old", "late reply")));

        assert_eq!(outcome, TurnOutcome::Stale);
        assert!(session.is_empty());
        assert_eq!(session.conversation_id(), None);
        assert!(!session.is_pending());
    }

    #[test]
    fn test_stale_failure_does_not_append_fallback() {
        let mut session = ChatSession::new();
        let turn = session.submit("Hello").unwrap();
        session.new_chat();

        assert_eq!(session.resolve(turn.ticket, failure()), TurnOutcome::Stale);
        assert!(session.is_empty());

        let next = session.submit("Again").unwrap();
        assert_eq!(next.ticket.generation(), session.generation());
        assert_eq!(next.request.conversation_id, None);
    }
}
