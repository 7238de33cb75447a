//! Streaming events.
//!
//! Each SSE frame is tagged by its `event:` name. Names outside the known vocabulary
//! are passed through as `Unknown` so new server event types never break a stream.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::envelope::strip_nulls;
use crate::sse::{EventStream, RawEvent};
use crate::types::{Chat, Message, WorkflowError, WorkflowInterrupt, WorkflowMessage};

/// Chat stream event names.
pub mod chat_event {
    pub const CHAT_CREATED: &str = "conversation.chat.created";
    pub const CHAT_IN_PROGRESS: &str = "conversation.chat.in_progress";
    pub const CHAT_COMPLETED: &str = "conversation.chat.completed";
    pub const CHAT_FAILED: &str = "conversation.chat.failed";
    pub const CHAT_REQUIRES_ACTION: &str = "conversation.chat.requires_action";
    pub const MESSAGE_DELTA: &str = "conversation.message.delta";
    pub const MESSAGE_COMPLETED: &str = "conversation.message.completed";
    pub const AUDIO_DELTA: &str = "conversation.audio.delta";
    pub const ERROR: &str = "error";
    pub const DONE: &str = "done";
}

/// Workflow stream event names.
pub mod workflow_event {
    pub const MESSAGE: &str = "Message";
    pub const ERROR: &str = "Error";
    pub const INTERRUPT: &str = "Interrupt";
    pub const DONE: &str = "Done";
}

/// An event of a streaming chat.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    ChatCreated(Chat),
    ChatInProgress(Chat),
    ChatCompleted(Chat),
    ChatFailed(Chat),
    /// The chat waits for tool outputs; see [`Chat::required_action`].
    ChatRequiresAction(Chat),
    /// Incremental message content.
    MessageDelta(Message),
    /// The full message, once all deltas are sent.
    MessageCompleted(Message),
    /// Incremental audio; `content` carries base64 PCM.
    AudioDelta(Message),
    /// Error reported by the platform inside the stream. Carries the raw data.
    Error(String),
    /// The stream finished normally.
    Done,
    /// A known event whose data is not a JSON object. Carries the raw frame.
    Undecoded { event: String, data: String },
    /// An event name this client does not know.
    Unknown { event: String, data: String },
}

impl ChatEvent {
    /// Wire name of the event.
    pub fn event_name(&self) -> &str {
        use chat_event::*;
        match self {
            ChatEvent::ChatCreated(_) => CHAT_CREATED,
            ChatEvent::ChatInProgress(_) => CHAT_IN_PROGRESS,
            ChatEvent::ChatCompleted(_) => CHAT_COMPLETED,
            ChatEvent::ChatFailed(_) => CHAT_FAILED,
            ChatEvent::ChatRequiresAction(_) => CHAT_REQUIRES_ACTION,
            ChatEvent::MessageDelta(_) => MESSAGE_DELTA,
            ChatEvent::MessageCompleted(_) => MESSAGE_COMPLETED,
            ChatEvent::AudioDelta(_) => AUDIO_DELTA,
            ChatEvent::Error(_) => ERROR,
            ChatEvent::Done => DONE,
            ChatEvent::Undecoded { event, .. } | ChatEvent::Unknown { event, .. } => {
                event.as_str()
            }
        }
    }

    /// The chat carried by a lifecycle event.
    pub fn chat(&self) -> Option<&Chat> {
        match self {
            ChatEvent::ChatCreated(chat)
            | ChatEvent::ChatInProgress(chat)
            | ChatEvent::ChatCompleted(chat)
            | ChatEvent::ChatFailed(chat)
            | ChatEvent::ChatRequiresAction(chat) => Some(chat),
            _ => None,
        }
    }

    /// The message carried by a message or audio event.
    pub fn message(&self) -> Option<&Message> {
        match self {
            ChatEvent::MessageDelta(msg)
            | ChatEvent::MessageCompleted(msg)
            | ChatEvent::AudioDelta(msg) => Some(msg),
            _ => None,
        }
    }

    /// Decode one named frame.
    ///
    /// Payload members of the wrong type fall back to their defaults one by one. A known
    /// event whose data is not a JSON object becomes [`ChatEvent::Undecoded`].
    pub fn decode(raw: RawEvent, logid: Option<&str>) -> Self {
        use chat_event::*;
        let RawEvent { event, data, .. } = raw;

        match event.as_str() {
            DONE => ChatEvent::Done,
            ERROR => {
                tracing::warn!(data = %data, logid = logid.unwrap_or_default(), "chat stream error event");
                ChatEvent::Error(data)
            }
            CHAT_CREATED => typed(event, data, logid, ChatEvent::ChatCreated),
            CHAT_IN_PROGRESS => typed(event, data, logid, ChatEvent::ChatInProgress),
            CHAT_COMPLETED => typed(event, data, logid, ChatEvent::ChatCompleted),
            CHAT_FAILED => typed(event, data, logid, ChatEvent::ChatFailed),
            CHAT_REQUIRES_ACTION => typed(event, data, logid, ChatEvent::ChatRequiresAction),
            MESSAGE_DELTA => typed(event, data, logid, ChatEvent::MessageDelta),
            MESSAGE_COMPLETED => typed(event, data, logid, ChatEvent::MessageCompleted),
            AUDIO_DELTA => typed(event, data, logid, ChatEvent::AudioDelta),
            _ => ChatEvent::Unknown { event, data },
        }
    }
}

fn typed<T: DeserializeOwned>(
    event: String,
    data: String,
    logid: Option<&str>,
    wrap: fn(T) -> ChatEvent,
) -> ChatEvent {
    match payload(&event, &data, logid) {
        Some(value) => wrap(value),
        None => ChatEvent::Undecoded { event, data },
    }
}

/// Kind and payload of a workflow event.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowEventKind {
    /// Node output.
    Message(WorkflowMessage),
    /// The workflow failed.
    Error(WorkflowError),
    /// The workflow is suspended; answer with a resume call.
    Interrupt(WorkflowInterrupt),
    /// The workflow finished.
    Done,
    /// A known event whose data is not a JSON object. Carries the raw frame.
    Undecoded { event: String, data: String },
    /// An event name this client does not know.
    Unknown { event: String, data: String },
}

/// An event of a streaming workflow run.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowEvent {
    /// Server-assigned event id.
    pub id: String,
    pub kind: WorkflowEventKind,
}

impl WorkflowEvent {
    /// Wire name of the event.
    pub fn event_name(&self) -> &str {
        use workflow_event::*;
        match &self.kind {
            WorkflowEventKind::Message(_) => MESSAGE,
            WorkflowEventKind::Error(_) => ERROR,
            WorkflowEventKind::Interrupt(_) => INTERRUPT,
            WorkflowEventKind::Done => DONE,
            WorkflowEventKind::Undecoded { event, .. }
            | WorkflowEventKind::Unknown { event, .. } => event.as_str(),
        }
    }

    /// Decode one named frame, with the same fallbacks as [`ChatEvent::decode`].
    pub fn decode(raw: RawEvent, logid: Option<&str>) -> Self {
        use workflow_event::*;
        let RawEvent { id, event, data } = raw;

        let decoded = match event.as_str() {
            MESSAGE => payload(&event, &data, logid).map(WorkflowEventKind::Message),
            ERROR => payload(&event, &data, logid).map(WorkflowEventKind::Error),
            INTERRUPT => payload(&event, &data, logid).map(WorkflowEventKind::Interrupt),
            DONE => Some(WorkflowEventKind::Done),
            _ => None,
        };
        let kind = match decoded {
            Some(kind) => kind,
            None if is_known_workflow_event(&event) => {
                WorkflowEventKind::Undecoded { event, data }
            }
            None => WorkflowEventKind::Unknown { event, data },
        };

        Self {
            id: id.unwrap_or_default(),
            kind,
        }
    }
}

fn is_known_workflow_event(event: &str) -> bool {
    use workflow_event::*;
    matches!(event, MESSAGE | ERROR | INTERRUPT | DONE)
}

/// Decode an event payload member by member.
///
/// Returns `None` when `data` is not a JSON object.
fn payload<T: DeserializeOwned>(event: &str, data: &str, logid: Option<&str>) -> Option<T> {
    let mut members = match serde_json::from_str(data) {
        Ok(Value::Object(members)) => members,
        Ok(_) | Err(_) => {
            tracing::warn!(event, data = %data, logid = logid.unwrap_or_default(), "stream payload is not a JSON object");
            return None;
        }
    };
    members.retain(|_, v| !v.is_null());
    members.values_mut().for_each(strip_nulls);

    let whole = Value::Object(members.clone());
    if let Ok(decoded) = serde_json::from_value(whole) {
        return Some(decoded);
    }

    tracing::warn!(event, logid = logid.unwrap_or_default(), "stream payload has mistyped members");
    let kept = keep_decodable(members, &|candidate| {
        serde_json::from_value::<T>(Value::Object(candidate.clone())).is_ok()
    });
    serde_json::from_value(Value::Object(kept)).ok()
}

/// Keep the members of `members` that `accepts` tolerates, descending into objects.
fn keep_decodable(
    members: Map<String, Value>,
    accepts: &dyn Fn(&Map<String, Value>) -> bool,
) -> Map<String, Value> {
    let mut kept = Map::new();
    for (key, value) in members {
        kept.insert(key.clone(), value.clone());
        if accepts(&kept) {
            continue;
        }
        kept.remove(&key);

        let Value::Object(inner) = value else {
            tracing::debug!(member = %key, "dropping mistyped payload member");
            continue;
        };
        let base = kept.clone();
        let nested = keep_decodable(inner, &|partial| {
            let mut candidate = base.clone();
            candidate.insert(key.clone(), Value::Object(partial.clone()));
            accepts(&candidate)
        });
        if !nested.is_empty() {
            kept.insert(key, Value::Object(nested));
        }
    }
    kept
}

/// Events of a streaming chat.
pub type ChatEventStream = EventStream<ChatEvent>;

/// Events of a streaming workflow run.
pub type WorkflowEventStream = EventStream<WorkflowEvent>;
