pub mod api;
pub mod config;
pub mod session;
pub mod state;

// Re-export main types for convenience
pub use api::{ApiError, ChatApi, ChatClient, ChatRequest, ChatResponse};
pub use config::Config;
pub use session::{ChatSession, PendingTurn, SessionStatus, Ticket, TurnOutcome, FALLBACK_REPLY};
pub use state::{ChatMessage, ChatRole};
