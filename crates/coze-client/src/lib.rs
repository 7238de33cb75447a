//! HTTP and SSE client SDK for the Coze agent platform.
//!
//! This crate provides a typed client for the Coze REST API, including streaming chats
//! and workflows delivered as server-sent events.
//!
//! # Example
//!
//! ```no_run
//! use coze_client::{ChatEvent, ChatRequest, CozeClient, EnterMessage, Result};
//!
//! # async fn example() -> Result<()> {
//! // Create a client
//! let client = CozeClient::builder()
//!     .base_url(coze_client::COZE_COM_BASE_URL)
//!     .api_token("pat_xxx")
//!     .build()?;
//!
//! // Stream a chat
//! use futures::StreamExt;
//! let request = ChatRequest::new("7400000000000000000", "user-1")
//!     .with_message(EnterMessage::user_text("Tell me a story"));
//! let mut stream = client.chat().stream(request).await?;
//! while let Some(event) = stream.next().await {
//!     match event? {
//!         ChatEvent::MessageDelta(message) => print!("{}", message.content),
//!         ChatEvent::ChatCompleted(chat) => println!("\n[{} tokens]", chat.usage.token_count),
//!         ChatEvent::Done => break,
//!         _ => {}
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # API Coverage
//!
//! - **Workspaces**: List workspaces
//! - **Bots**: Create, update, publish, list and retrieve bots
//! - **Conversations**: Create and retrieve conversations; manage their messages
//! - **Chat**: Create, stream, poll, cancel, submit tool outputs
//! - **Files**: Upload and retrieve files
//! - **Workflows**: Run, stream, and resume interrupted runs
//! - **Audio**: List voices, create real-time rooms
//! - **OAuth**: Authorization URL, code exchange, token refresh

pub mod api;
pub mod client;
mod envelope;
pub mod error;
pub mod events;
pub mod sse;
pub mod transport;
pub mod types;

#[cfg(test)]
mod testing;

pub use api::{
    AudioApi, BotsApi, ChatApi, ConversationsApi, FilesApi, MessagesApi, OAuthApi, PollOptions,
    WorkflowsApi, WorkspacesApi,
};
pub use client::{
    COZE_CN_BASE_URL, COZE_COM_BASE_URL, ClientBuilder, CozeClient, ENV_API_BASE, ENV_API_TOKEN,
};
pub use envelope::Response;
pub use error::{Error, Result};
pub use events::{
    ChatEvent, ChatEventStream, WorkflowEvent, WorkflowEventKind, WorkflowEventStream,
    chat_event, workflow_event,
};
pub use sse::{EventStream, RawEvent};
pub use transport::{
    HttpRequest, HttpResponse, Method, ReqwestTransport, RequestBody, StreamingResponse,
    Transport,
};
pub use types::*;
