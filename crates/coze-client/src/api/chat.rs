//! Chat API.
//!
//! A chat is one bot turn. Start it with [`ChatApi::stream`] to receive events as the bot
//! produces them, or with [`ChatApi::create`] and observe it through
//! [`ChatApi::retrieve`]. [`ChatApi::create_and_poll`] wraps the second pattern.

use std::time::Duration;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::client::CozeClient;
use crate::envelope::{PayloadAt, Response};
use crate::error::{Error, Result};
use crate::events::{ChatEvent, ChatEventStream};
use crate::types::{
    Chat, ChatPoll, ChatRequest, ChatStatus, Message, SubmitToolOutputsRequest, ToolOutput,
    require,
};

/// Shortest wait between two polls.
const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Settings for [`ChatApi::create_and_poll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    /// Wait between retrieve calls. Raised to one second when shorter.
    pub interval: Duration,
    /// Give up after this many retrieve calls. Unlimited when unset.
    pub max_attempts: Option<u32>,
}

impl PollOptions {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    fn effective_interval(&self) -> Duration {
        self.interval.max(MIN_POLL_INTERVAL)
    }
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: MIN_POLL_INTERVAL,
            max_attempts: None,
        }
    }
}

#[derive(Serialize)]
struct ChatBody<'a> {
    #[serde(flatten)]
    request: &'a ChatRequest,
    stream: bool,
    auto_save_history: bool,
}

#[derive(Serialize)]
struct SubmitBody<'a> {
    tool_outputs: &'a [ToolOutput],
    stream: bool,
}

#[derive(Serialize)]
struct ChatIds<'a> {
    conversation_id: &'a str,
    chat_id: &'a str,
}

/// Chat API client.
pub struct ChatApi {
    client: CozeClient,
}

impl ChatApi {
    pub(crate) fn new(client: CozeClient) -> Self {
        Self { client }
    }

    /// Start a chat without streaming. The returned chat is usually still `in_progress`.
    pub async fn create(&self, request: ChatRequest) -> Result<Response<Chat>> {
        validate_chat(&request)?;
        let body = ChatBody {
            request: &request,
            stream: false,
            auto_save_history: true,
        };
        self.client
            .post("/v3/chat", &chat_query(&request), &body, PayloadAt::Data)
            .await
    }

    /// Start a chat and stream its events.
    pub async fn stream(&self, request: ChatRequest) -> Result<ChatEventStream> {
        self.stream_with_cancellation(request, CancellationToken::new())
            .await
    }

    /// Start a chat and stream its events until `cancel` fires.
    pub async fn stream_with_cancellation(
        &self,
        request: ChatRequest,
        cancel: CancellationToken,
    ) -> Result<ChatEventStream> {
        validate_chat(&request)?;
        let body = ChatBody {
            request: &request,
            stream: true,
            auto_save_history: request.auto_save_history,
        };
        tracing::debug!(bot_id = %request.bot_id, "opening chat stream");
        self.client
            .post_stream(
                "/v3/chat",
                &chat_query(&request),
                &body,
                cancel,
                ChatEvent::decode,
            )
            .await
    }

    /// Get the current state of a chat.
    pub async fn retrieve(&self, conversation_id: &str, chat_id: &str) -> Result<Response<Chat>> {
        require("conversation_id", conversation_id)?;
        require("chat_id", chat_id)?;
        self.client
            .get(
                "/v3/chat/retrieve",
                &[("conversation_id", conversation_id), ("chat_id", chat_id)],
                PayloadAt::Data,
            )
            .await
    }

    /// List the messages a chat produced.
    pub async fn list_messages(
        &self,
        conversation_id: &str,
        chat_id: &str,
    ) -> Result<Response<Vec<Message>>> {
        require("conversation_id", conversation_id)?;
        require("chat_id", chat_id)?;
        self.client
            .get(
                "/v3/chat/message/list",
                &[("conversation_id", conversation_id), ("chat_id", chat_id)],
                PayloadAt::Data,
            )
            .await
    }

    /// Answer the tool calls of a `requires_action` chat without streaming.
    pub async fn submit_tool_outputs(
        &self,
        request: SubmitToolOutputsRequest,
    ) -> Result<Response<Chat>> {
        validate_submit(&request)?;
        let body = SubmitBody {
            tool_outputs: &request.tool_outputs,
            stream: false,
        };
        self.client
            .post(
                "/v3/chat/submit_tool_outputs",
                &submit_query(&request),
                &body,
                PayloadAt::Data,
            )
            .await
    }

    /// Answer the tool calls of a `requires_action` chat and stream the rest of the turn.
    pub async fn submit_tool_outputs_stream(
        &self,
        request: SubmitToolOutputsRequest,
    ) -> Result<ChatEventStream> {
        self.submit_tool_outputs_stream_with_cancellation(request, CancellationToken::new())
            .await
    }

    pub async fn submit_tool_outputs_stream_with_cancellation(
        &self,
        request: SubmitToolOutputsRequest,
        cancel: CancellationToken,
    ) -> Result<ChatEventStream> {
        validate_submit(&request)?;
        let body = SubmitBody {
            tool_outputs: &request.tool_outputs,
            stream: true,
        };
        self.client
            .post_stream(
                "/v3/chat/submit_tool_outputs",
                &submit_query(&request),
                &body,
                cancel,
                ChatEvent::decode,
            )
            .await
    }

    /// Cancel a chat that is still running.
    pub async fn cancel(&self, conversation_id: &str, chat_id: &str) -> Result<Response<Chat>> {
        require("conversation_id", conversation_id)?;
        require("chat_id", chat_id)?;
        let body = ChatIds {
            conversation_id,
            chat_id,
        };
        self.client
            .post("/v3/chat/cancel", &[], &body, PayloadAt::Data)
            .await
    }

    /// Start a chat, wait for it to settle and fetch its messages.
    ///
    /// Polling stops at a terminal status or at `requires_action`, which needs the
    /// caller to submit tool outputs before the chat can move on.
    pub async fn create_and_poll(
        &self,
        request: ChatRequest,
        options: PollOptions,
    ) -> Result<ChatPoll> {
        let mut chat = self.create(request).await?.into_inner();
        let conversation_id = chat.conversation_id.clone();
        let chat_id = chat.id.clone();
        let interval = options.effective_interval();
        let mut attempts: u32 = 0;

        while !settled(chat.status) {
            if options.max_attempts.is_some_and(|max| attempts >= max) {
                return Err(Error::PollExhausted {
                    chat_id,
                    attempts,
                    status: chat.status.to_string(),
                });
            }
            tokio::time::sleep(interval).await;
            chat = self.retrieve(&conversation_id, &chat_id).await?.into_inner();
            attempts += 1;
            tracing::debug!(chat_id = %chat_id, status = %chat.status, attempts, "polled chat");
        }

        let messages = self
            .list_messages(&conversation_id, &chat_id)
            .await?
            .into_inner();
        Ok(ChatPoll { chat, messages })
    }
}

fn settled(status: ChatStatus) -> bool {
    status.is_terminal() || status == ChatStatus::RequiresAction
}

fn validate_chat(request: &ChatRequest) -> Result<()> {
    require("bot_id", &request.bot_id)?;
    require("user_id", &request.user_id)
}

fn validate_submit(request: &SubmitToolOutputsRequest) -> Result<()> {
    require("conversation_id", &request.conversation_id)?;
    require("chat_id", &request.chat_id)?;
    if request.tool_outputs.is_empty() {
        return Err(Error::missing("tool_outputs"));
    }
    Ok(())
}

fn chat_query(request: &ChatRequest) -> Vec<(&'static str, &str)> {
    request
        .conversation_id
        .as_deref()
        .map(|id| vec![("conversation_id", id)])
        .unwrap_or_default()
}

fn submit_query(request: &SubmitToolOutputsRequest) -> [(&'static str, &str); 2] {
    [
        ("conversation_id", request.conversation_id.as_str()),
        ("chat_id", request.chat_id.as_str()),
    ]
}
