//! Request and response types for the Coze API.
//!
//! Response types derive `Default` and decode with `#[serde(default)]`: any field the
//! server omits (or sends as `null`) comes back as its empty value. Request types skip
//! unset optional fields so they never reach the wire as `null`.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Vocabularies
// ─────────────────────────────────────────────────────────────────────────────

/// Who sent a message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
    #[default]
    #[serde(other)]
    Unknown,
}

/// What a message represents in the turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    /// User input.
    Question,
    /// Bot reply, possibly delivered incrementally.
    Answer,
    /// Intermediate function call made by the bot.
    FunctionCall,
    ToolOutput,
    ToolResponse,
    /// Suggested follow-up question.
    FollowUp,
    /// Out-of-band package, e.g. `generate_answer_finish`.
    Verbose,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Encoding of a message's `content`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageContentType {
    Text,
    /// JSON array of [`MessageObjectString`] items.
    ObjectString,
    /// Response only.
    Card,
    /// Base64 PCM, 24kHz, 16 bit, mono.
    Audio,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Chat status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatStatus {
    Created,
    InProgress,
    Completed,
    Failed,
    /// Waiting for tool outputs.
    RequiresAction,
    Canceled,
    #[default]
    #[serde(other)]
    Unknown,
}

impl ChatStatus {
    /// Whether the chat can no longer change state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ChatStatus::Completed | ChatStatus::Failed | ChatStatus::Canceled
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChatStatus::Created => "created",
            ChatStatus::InProgress => "in_progress",
            ChatStatus::Completed => "completed",
            ChatStatus::Failed => "failed",
            ChatStatus::RequiresAction => "requires_action",
            ChatStatus::Canceled => "canceled",
            ChatStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ChatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort order for message listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Order {
    Asc,
    Desc,
}

/// Accept a string or a number and keep its decimal text.
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Int(n) => n.to_string(),
        Raw::Float(n) => n.to_string(),
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Workspaces
// ─────────────────────────────────────────────────────────────────────────────

/// A workspace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Workspace {
    pub id: String,
    pub name: String,
    pub icon_url: String,
    pub role_type: String,
    pub workspace_type: String,
}

/// One page of workspaces.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceList {
    pub workspaces: Vec<Workspace>,
    pub total_count: i64,
}

/// Query for listing workspaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListWorkspacesRequest {
    /// Starts at 1.
    pub page_num: u32,
    pub page_size: u32,
}

impl Default for ListWorkspacesRequest {
    fn default() -> Self {
        Self {
            page_num: 1,
            page_size: 20,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Bots
// ─────────────────────────────────────────────────────────────────────────────

/// Bot persona prompt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptInfo {
    pub prompt: String,
}

/// Opening message and suggested questions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OnboardingInfo {
    pub prologue: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggested_questions: Vec<String>,
}

/// Model backing a bot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelInfo {
    pub model_id: String,
    pub model_name: String,
}

/// One API exposed by a plugin.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginApiInfo {
    pub api_id: String,
    pub name: String,
    pub description: String,
}

/// A plugin attached to a bot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginInfo {
    pub plugin_id: String,
    pub name: String,
    pub description: String,
    pub icon_url: String,
    pub api_info_list: Vec<PluginApiInfo>,
}

/// A bot's full configuration.
///
/// Create and publish only fill in `bot_id` (and `version` for publish).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bot {
    pub bot_id: String,
    pub name: String,
    pub description: String,
    pub icon_url: String,
    /// Unix seconds.
    pub create_time: i64,
    /// Unix seconds.
    pub update_time: i64,
    pub version: String,
    pub prompt_info: PromptInfo,
    pub onboarding_info: OnboardingInfo,
    pub bot_mode: i64,
    pub model_info: ModelInfo,
    pub plugin_info_list: Vec<PluginInfo>,
}

/// A published bot, as listed within a space.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimpleBot {
    pub bot_id: String,
    pub bot_name: String,
    pub description: String,
    pub icon_url: String,
    pub publish_time: String,
}

/// One page of published bots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotList {
    pub space_bots: Vec<SimpleBot>,
    pub total: i64,
}

/// Request to create a bot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateBotRequest {
    pub space_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// File id of an uploaded icon.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_file_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_info: Option<PromptInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub onboarding_info: Option<OnboardingInfo>,
}

impl CreateBotRequest {
    pub fn new(space_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            space_id: space_id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt_info = Some(PromptInfo {
            prompt: prompt.into(),
        });
        self
    }
}

/// Request to update a bot. Unset fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateBotRequest {
    pub bot_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_file_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_info: Option<PromptInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub onboarding_info: Option<OnboardingInfo>,
}

impl UpdateBotRequest {
    pub fn new(bot_id: impl Into<String>) -> Self {
        Self {
            bot_id: bot_id.into(),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt_info = Some(PromptInfo {
            prompt: prompt.into(),
        });
        self
    }
}

/// Request to publish a bot to connectors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PublishBotRequest {
    pub bot_id: String,
    /// `"1024"` is the API connector.
    pub connector_ids: Vec<String>,
}

impl PublishBotRequest {
    pub fn new<I, S>(bot_id: impl Into<String>, connector_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            bot_id: bot_id.into(),
            connector_ids: connector_ids.into_iter().map(Into::into).collect(),
        }
    }
}

/// Query for listing the bots published in a space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListBotsRequest {
    pub space_id: String,
    /// Starts at 1.
    pub page_num: u32,
    pub page_size: u32,
}

impl ListBotsRequest {
    pub fn new(space_id: impl Into<String>) -> Self {
        Self {
            space_id: space_id.into(),
            page_num: 1,
            page_size: 20,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Conversations and messages
// ─────────────────────────────────────────────────────────────────────────────

/// A conversation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Conversation {
    pub id: String,
    /// Unix seconds.
    pub created_at: i64,
    pub last_section_id: String,
    pub meta_data: HashMap<String, String>,
}

/// A message as returned by the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Message {
    pub id: String,
    pub conversation_id: String,
    pub bot_id: String,
    pub chat_id: String,
    pub role: MessageRole,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub content: String,
    pub content_type: MessageContentType,
    pub meta_data: HashMap<String, String>,
    /// Unix seconds.
    pub created_at: i64,
    /// Unix seconds.
    pub updated_at: i64,
}

/// A message sent as input: additional chat messages and conversation seeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnterMessage {
    pub role: MessageRole,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub message_type: Option<MessageType>,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<MessageContentType>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub meta_data: HashMap<String, String>,
}

impl EnterMessage {
    fn text(role: MessageRole, message_type: MessageType, content: impl Into<String>) -> Self {
        Self {
            role,
            message_type: Some(message_type),
            content: content.into(),
            content_type: Some(MessageContentType::Text),
            meta_data: HashMap::new(),
        }
    }

    /// A plain-text user question.
    pub fn user_text(content: impl Into<String>) -> Self {
        Self::text(MessageRole::User, MessageType::Question, content)
    }

    /// A plain-text assistant answer, for seeding history.
    pub fn assistant_text(content: impl Into<String>) -> Self {
        Self::text(MessageRole::Assistant, MessageType::Answer, content)
    }

    /// A multimodal user question.
    pub fn user_objects(items: &[MessageObjectString]) -> Result<Self> {
        Ok(Self {
            role: MessageRole::User,
            message_type: Some(MessageType::Question),
            content: serde_json::to_string(items)?,
            content_type: Some(MessageContentType::ObjectString),
            meta_data: HashMap::new(),
        })
    }

    pub fn with_meta_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta_data.insert(key.into(), value.into());
        self
    }
}

/// Kind of a multimodal content item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectStringType {
    Text,
    File,
    Image,
    Audio,
}

/// One item of multimodal message content.
///
/// Files are referenced either by `file_id` (from an upload) or by `file_url`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageObjectString {
    #[serde(rename = "type")]
    pub kind: ObjectStringType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
}

impl MessageObjectString {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: ObjectStringType::Text,
            text: Some(text.into()),
            file_id: None,
            file_url: None,
        }
    }

    /// Reference an uploaded file by id.
    pub fn file_id(kind: ObjectStringType, file_id: impl Into<String>) -> Self {
        Self {
            kind,
            text: None,
            file_id: Some(file_id.into()),
            file_url: None,
        }
    }

    /// Reference a file by URL.
    pub fn file_url(kind: ObjectStringType, file_url: impl Into<String>) -> Self {
        Self {
            kind,
            text: None,
            file_id: None,
            file_url: Some(file_url.into()),
        }
    }
}

/// Request to create a conversation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateConversationRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_id: Option<String>,
    /// Messages to seed the conversation with.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<EnterMessage>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub meta_data: HashMap<String, String>,
}

/// Request to append a message to a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMessageRequest {
    /// Sent in the query string.
    #[serde(skip)]
    pub conversation_id: String,
    pub role: MessageRole,
    pub content: String,
    pub content_type: MessageContentType,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub meta_data: HashMap<String, String>,
}

impl CreateMessageRequest {
    /// A plain-text user message.
    pub fn user_text(conversation_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            role: MessageRole::User,
            content: content.into(),
            content_type: MessageContentType::Text,
            meta_data: HashMap::new(),
        }
    }
}

/// Request to list a conversation's messages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListMessagesRequest {
    /// Sent in the query string.
    #[serde(skip)]
    pub conversation_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<Order>,
    /// Only messages of this chat.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after_id: Option<String>,
    /// 1 to 50, server default 50.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl ListMessagesRequest {
    pub fn new(conversation_id: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            ..Default::default()
        }
    }
}

/// One page of conversation messages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageList {
    #[serde(rename = "data")]
    pub messages: Vec<Message>,
    pub first_id: String,
    pub last_id: String,
    pub has_more: bool,
}

/// Request to modify a message. Unset fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateMessageRequest {
    /// Sent in the query string.
    #[serde(skip)]
    pub conversation_id: String,
    /// Sent in the query string.
    #[serde(skip)]
    pub message_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<MessageContentType>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub meta_data: HashMap<String, String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Chat
// ─────────────────────────────────────────────────────────────────────────────

/// Error recorded on a failed chat.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LastError {
    pub code: i64,
    pub msg: String,
}

/// The function a tool call asks for.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolCallFunction {
    pub name: String,
    /// JSON-encoded arguments.
    pub arguments: String,
}

/// A tool call the caller must execute.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolCall {
    /// Echo back as [`ToolOutput::tool_call_id`].
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub function: ToolCallFunction,
}

/// Tool calls awaiting outputs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmitToolOutputs {
    pub tool_calls: Vec<ToolCall>,
}

/// What a `requires_action` chat is waiting for.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequiredAction {
    /// Currently always `submit_tool_outputs`.
    #[serde(rename = "type")]
    pub kind: String,
    pub submit_tool_outputs: SubmitToolOutputs,
}

/// Token usage of a chat.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatUsage {
    /// Input plus output.
    pub token_count: i64,
    pub output_count: i64,
    pub input_count: i64,
}

/// One bot turn-taking session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Chat {
    pub id: String,
    pub conversation_id: String,
    pub bot_id: String,
    /// Unix seconds.
    pub created_at: i64,
    /// Unix seconds.
    pub completed_at: i64,
    /// Unix seconds.
    pub failed_at: i64,
    pub meta_data: HashMap<String, String>,
    pub last_error: LastError,
    pub status: ChatStatus,
    /// Only present while `status` is `requires_action`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_action: Option<RequiredAction>,
    pub usage: ChatUsage,
}

/// Request to start a chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Sent in the query string; a new conversation is created when unset.
    #[serde(skip)]
    pub conversation_id: Option<String>,
    pub bot_id: String,
    /// Caller-defined user identity.
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_messages: Vec<EnterMessage>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub custom_variables: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub meta_data: HashMap<String, String>,
    /// Honoured by streaming chats; non-streaming chats always save history.
    #[serde(skip)]
    pub auto_save_history: bool,
}

impl ChatRequest {
    pub fn new(bot_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            conversation_id: None,
            bot_id: bot_id.into(),
            user_id: user_id.into(),
            additional_messages: Vec::new(),
            custom_variables: HashMap::new(),
            meta_data: HashMap::new(),
            auto_save_history: true,
        }
    }

    pub fn with_conversation(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }

    pub fn with_message(mut self, message: EnterMessage) -> Self {
        self.additional_messages.push(message);
        self
    }

    pub fn with_auto_save_history(mut self, save: bool) -> Self {
        self.auto_save_history = save;
        self
    }
}

/// Output of one executed tool call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    pub tool_call_id: String,
    pub output: String,
}

impl ToolOutput {
    pub fn new(tool_call_id: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            output: output.into(),
        }
    }
}

/// Request to resume a `requires_action` chat.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmitToolOutputsRequest {
    /// Sent in the query string.
    #[serde(skip)]
    pub conversation_id: String,
    /// Sent in the query string.
    #[serde(skip)]
    pub chat_id: String,
    pub tool_outputs: Vec<ToolOutput>,
}

impl SubmitToolOutputsRequest {
    pub fn new(
        conversation_id: impl Into<String>,
        chat_id: impl Into<String>,
        tool_outputs: Vec<ToolOutput>,
    ) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            chat_id: chat_id.into(),
            tool_outputs,
        }
    }
}

/// Final state of a polled chat and the messages it produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatPoll {
    pub chat: Chat,
    pub messages: Vec<Message>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Files
// ─────────────────────────────────────────────────────────────────────────────

/// An uploaded file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct File {
    pub id: String,
    pub file_name: String,
    /// Unix seconds.
    pub created_at: i64,
    /// Size in bytes.
    pub bytes: i64,
}

// ─────────────────────────────────────────────────────────────────────────────
// Workflows
// ─────────────────────────────────────────────────────────────────────────────

/// Request to run a workflow.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowRunRequest {
    pub workflow_id: String,
    /// Bot whose context the workflow runs in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_id: Option<String>,
    /// Input parameters keyed by name.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub parameters: HashMap<String, serde_json::Value>,
    /// Only sent for non-streaming runs.
    #[serde(skip)]
    pub is_async: Option<bool>,
}

impl WorkflowRunRequest {
    pub fn new(workflow_id: impl Into<String>) -> Self {
        Self {
            workflow_id: workflow_id.into(),
            ..Default::default()
        }
    }

    pub fn with_bot(mut self, bot_id: impl Into<String>) -> Self {
        self.bot_id = Some(bot_id.into());
        self
    }

    pub fn with_parameter(
        mut self,
        name: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    pub fn with_async(mut self, is_async: bool) -> Self {
        self.is_async = Some(is_async);
        self
    }
}

/// Result of a non-streaming workflow run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowRunResult {
    /// Workflow output, JSON-encoded.
    pub data: String,
    pub debug_url: String,
    /// Set for asynchronous runs.
    pub execute_id: String,
}

/// Node output streamed by a workflow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowMessage {
    pub content: String,
    /// Node that produced the output.
    pub node_title: String,
    /// Position of this output within the node, from `"0"`.
    #[serde(deserialize_with = "string_or_number")]
    pub node_seq_id: String,
    /// Last packet of this node.
    pub node_is_finish: bool,
}

/// Error reported inside a workflow stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowError {
    pub error_code: i64,
    pub error_message: String,
}

/// Resumption token of an interrupt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterruptData {
    pub event_id: String,
    #[serde(rename = "type")]
    pub kind: i64,
}

/// A workflow suspended waiting for input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowInterrupt {
    pub interrupt_data: InterruptData,
    /// Node that raised the interrupt.
    pub node_title: String,
}

/// Request to resume an interrupted workflow.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowResumeRequest {
    pub workflow_id: String,
    /// `interrupt_data.event_id` of the interrupt being answered.
    pub event_id: String,
    /// The caller's answer.
    pub resume_data: String,
    /// `interrupt_data.type` of the interrupt being answered.
    pub interrupt_type: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_id: Option<String>,
}

impl WorkflowResumeRequest {
    /// Answer an interrupt.
    pub fn from_interrupt(
        workflow_id: impl Into<String>,
        interrupt: &WorkflowInterrupt,
        resume_data: impl Into<String>,
    ) -> Self {
        Self {
            workflow_id: workflow_id.into(),
            event_id: interrupt.interrupt_data.event_id.clone(),
            resume_data: resume_data.into(),
            interrupt_type: interrupt.interrupt_data.kind,
            bot_id: None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Audio
// ─────────────────────────────────────────────────────────────────────────────

/// A text-to-speech voice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Voice {
    pub voice_id: String,
    pub name: String,
    pub is_system_voice: bool,
    pub language_code: String,
    pub language_name: String,
    pub preview_text: String,
    /// URL of a preview clip.
    pub preview_audio: String,
    /// Training runs left for a cloned voice.
    pub available_training_times: i64,
    /// Unix seconds.
    pub create_time: i64,
    /// Unix seconds.
    pub update_time: i64,
}

/// One page of voices.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceList {
    pub voice_list: Vec<Voice>,
    pub has_more: bool,
}

/// Query for listing voices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListVoicesRequest {
    /// Leave out system voices.
    pub filter_system_voice: bool,
    /// Starts at 1; 1 when unset.
    pub page_num: Option<u32>,
    /// At most 100; 100 when unset.
    pub page_size: Option<u32>,
}

/// Request to provision a real-time audio room.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateRoomRequest {
    pub bot_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_id: Option<String>,
}

impl CreateRoomRequest {
    pub fn new(bot_id: impl Into<String>) -> Self {
        Self {
            bot_id: bot_id.into(),
            ..Default::default()
        }
    }
}

/// Credentials for joining an audio room.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioRoom {
    pub room_id: String,
    pub app_id: String,
    pub token: String,
    pub uid: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// OAuth
// ─────────────────────────────────────────────────────────────────────────────

/// Tokens issued by the OAuth flow.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OAuthToken {
    pub access_token: String,
    /// Expiry as a Unix timestamp in seconds.
    pub expires_in: i64,
    pub refresh_token: String,
    /// Usually `Bearer`.
    pub token_type: String,
}

impl OAuthToken {
    /// Expiry instant, if `expires_in` is a valid timestamp.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.expires_in, 0)
    }

    /// Whether the access token has expired (or has no usable expiry).
    pub fn is_expired(&self) -> bool {
        self.expires_at().is_none_or(|at| at <= Utc::now())
    }
}

impl fmt::Debug for OAuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthToken")
            .field("access_token", &"[REDACTED]")
            .field("expires_in", &self.expires_in)
            .field("refresh_token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .finish()
    }
}

/// Parameters of the authorization URL.
#[derive(Debug, Clone, Default)]
pub struct AuthorizationUrlRequest {
    pub client_id: String,
    pub redirect_uri: String,
    /// Echoed back on the redirect; empty when unset.
    pub state: Option<String>,
    /// Scope the grant to one workspace.
    pub workspace_id: Option<String>,
}

impl AuthorizationUrlRequest {
    pub fn new(client_id: impl Into<String>, redirect_uri: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            redirect_uri: redirect_uri.into(),
            ..Default::default()
        }
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn with_workspace(mut self, workspace_id: impl Into<String>) -> Self {
        self.workspace_id = Some(workspace_id.into());
        self
    }
}

/// Exchange an authorization code for tokens.
#[derive(Clone, Default)]
pub struct GetAccessTokenRequest {
    /// Overrides the client base URL for this call.
    pub api_base: Option<String>,
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub code: String,
}

impl fmt::Debug for GetAccessTokenRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GetAccessTokenRequest")
            .field("api_base", &self.api_base)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("redirect_uri", &self.redirect_uri)
            .finish_non_exhaustive()
    }
}

/// Exchange a refresh token for new tokens.
#[derive(Clone, Default)]
pub struct RefreshAccessTokenRequest {
    /// Overrides the client base URL for this call.
    pub api_base: Option<String>,
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

impl fmt::Debug for RefreshAccessTokenRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshAccessTokenRequest")
            .field("api_base", &self.api_base)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Validation
// ─────────────────────────────────────────────────────────────────────────────

/// Fail with `InvalidParam` when a required string is empty.
pub(crate) fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(Error::missing(field))
    } else {
        Ok(())
    }
}
