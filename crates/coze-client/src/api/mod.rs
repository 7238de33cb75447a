//! API endpoint implementations.

mod audio;
mod bots;
mod chat;
mod conversations;
mod files;
mod messages;
mod oauth;
mod workflows;
mod workspaces;

pub use audio::AudioApi;
pub use bots::BotsApi;
pub use chat::{ChatApi, PollOptions};
pub use conversations::ConversationsApi;
pub use files::FilesApi;
pub use messages::MessagesApi;
pub use oauth::OAuthApi;
pub use workflows::WorkflowsApi;
pub use workspaces::WorkspacesApi;
