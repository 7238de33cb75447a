//! Conversations API.

use crate::client::CozeClient;
use crate::envelope::{PayloadAt, Response};
use crate::error::Result;
use crate::types::{Conversation, CreateConversationRequest, require};

/// Conversations API client.
pub struct ConversationsApi {
    client: CozeClient,
}

impl ConversationsApi {
    pub(crate) fn new(client: CozeClient) -> Self {
        Self { client }
    }

    /// Create a conversation, optionally seeded with messages.
    pub async fn create(&self, request: CreateConversationRequest) -> Result<Response<Conversation>> {
        self.client
            .post("/v1/conversation/create", &[], &request, PayloadAt::Data)
            .await
    }

    /// Get a conversation.
    pub async fn retrieve(&self, conversation_id: &str) -> Result<Response<Conversation>> {
        require("conversation_id", conversation_id)?;
        self.client
            .get(
                "/v1/conversation/retrieve",
                &[("conversation_id", conversation_id)],
                PayloadAt::Data,
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{StubTransport, anonymous_client, client, json_body};
    use crate::types::EnterMessage;

    #[tokio::test]
    async fn test_create_with_messages() {
        let stub = StubTransport::new();
        stub.push_json(
            200,
            r#"{"code":0,"data":{"id":"cv1","created_at":1718000000,"meta_data":{"k":"v"}}}"#,
        );

        let request = CreateConversationRequest {
            bot_id: Some("b1".to_string()),
            messages: vec![EnterMessage::user_text("hello")],
            ..Default::default()
        };
        let conv = client(&stub).conversations().create(request).await.unwrap();
        assert_eq!(conv.id, "cv1");
        assert_eq!(conv.meta_data["k"], "v");
        assert_eq!(conv.last_section_id, "");

        let body = json_body(&stub.last_request().unwrap());
        assert_eq!(body["bot_id"], "b1");
        assert_eq!(body["messages"][0]["role"], "user");
        assert!(body.get("meta_data").is_none());
    }

    #[tokio::test]
    async fn test_create_without_token() {
        let stub = StubTransport::new();
        let err = anonymous_client(&stub)
            .conversations()
            .create(CreateConversationRequest::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid parameter: api_token is required");
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn test_retrieve_requires_id() {
        let stub = StubTransport::new();
        let err = client(&stub).conversations().retrieve("").await.unwrap_err();
        assert!(err.is_invalid_param());
        assert_eq!(stub.calls(), 0);
    }
}
