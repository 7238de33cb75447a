//! Conversation messages API.

use crate::client::CozeClient;
use crate::envelope::{PayloadAt, Response};
use crate::error::Result;
use crate::types::{
    CreateMessageRequest, ListMessagesRequest, Message, MessageList, UpdateMessageRequest,
    require,
};

/// Conversation messages API client.
pub struct MessagesApi {
    client: CozeClient,
}

impl MessagesApi {
    pub(crate) fn new(client: CozeClient) -> Self {
        Self { client }
    }

    /// Append a message to a conversation.
    pub async fn create(&self, request: CreateMessageRequest) -> Result<Response<Message>> {
        require("conversation_id", request.conversation_id.as_str())?;
        require("content", &request.content)?;
        self.client
            .post(
                "/v1/conversation/message/create",
                &[("conversation_id", request.conversation_id.as_str())],
                &request,
                PayloadAt::Data,
            )
            .await
    }

    /// List a conversation's messages, one page at a time.
    pub async fn list(&self, request: ListMessagesRequest) -> Result<Response<MessageList>> {
        require("conversation_id", request.conversation_id.as_str())?;
        self.client
            .post(
                "/v1/conversation/message/list",
                &[("conversation_id", request.conversation_id.as_str())],
                &request,
                PayloadAt::Body,
            )
            .await
    }

    /// Get one message.
    pub async fn retrieve(
        &self,
        conversation_id: &str,
        message_id: &str,
    ) -> Result<Response<Message>> {
        require("conversation_id", conversation_id)?;
        require("message_id", message_id)?;
        self.client
            .get(
                "/v1/conversation/message/retrieve",
                &[
                    ("conversation_id", conversation_id),
                    ("message_id", message_id),
                ],
                PayloadAt::Data,
            )
            .await
    }

    /// Modify a message. Returns the updated message.
    pub async fn update(&self, request: UpdateMessageRequest) -> Result<Response<Message>> {
        require("conversation_id", request.conversation_id.as_str())?;
        require("message_id", request.message_id.as_str())?;
        self.client
            .post(
                "/v1/conversation/message/modify",
                &[
                    ("conversation_id", request.conversation_id.as_str()),
                    ("message_id", request.message_id.as_str()),
                ],
                &request,
                PayloadAt::Field("message"),
            )
            .await
    }

    /// Delete a message. Returns the deleted message.
    pub async fn delete(&self, conversation_id: &str, message_id: &str) -> Result<Response<Message>> {
        require("conversation_id", conversation_id)?;
        require("message_id", message_id)?;
        self.client
            .post_empty(
                "/v1/conversation/message/delete",
                &[
                    ("conversation_id", conversation_id),
                    ("message_id", message_id),
                ],
                PayloadAt::Data,
            )
            .await
    }
}
