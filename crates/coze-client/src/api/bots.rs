//! Bots API.

use crate::client::CozeClient;
use crate::envelope::{PayloadAt, Response};
use crate::error::Result;
use crate::types::{
    Bot, BotList, CreateBotRequest, ListBotsRequest, PublishBotRequest, UpdateBotRequest, require,
};

/// Bots API client.
pub struct BotsApi {
    client: CozeClient,
}

impl BotsApi {
    pub(crate) fn new(client: CozeClient) -> Self {
        Self { client }
    }

    /// Create a bot in a space. Only `bot_id` is filled in on the result.
    pub async fn create(&self, request: CreateBotRequest) -> Result<Response<Bot>> {
        require("space_id", request.space_id.as_str())?;
        require("name", &request.name)?;
        self.client
            .post("/v1/bot/create", &[], &request, PayloadAt::Data)
            .await
    }

    /// Update a bot's draft.
    pub async fn update(&self, request: UpdateBotRequest) -> Result<Response<()>> {
        require("bot_id", &request.bot_id)?;
        let resp: Response<serde_json::Value> = self
            .client
            .post("/v1/bot/update", &[], &request, PayloadAt::Data)
            .await?;
        Ok(resp.map(|_| ()))
    }

    /// Publish a bot. `bot_id` and `version` are filled in on the result.
    pub async fn publish(&self, request: PublishBotRequest) -> Result<Response<Bot>> {
        require("bot_id", &request.bot_id)?;
        self.client
            .post("/v1/bot/publish", &[], &request, PayloadAt::Data)
            .await
    }

    /// List the bots published in a space.
    pub async fn list(&self, request: ListBotsRequest) -> Result<Response<BotList>> {
        require("space_id", request.space_id.as_str())?;
        let page_num = request.page_num.to_string();
        let page_size = request.page_size.to_string();
        self.client
            .get(
                "/v1/space/published_bots_list",
                &[
                    ("space_id", request.space_id.as_str()),
                    ("page_index", page_num.as_str()),
                    ("page_size", page_size.as_str()),
                ],
                PayloadAt::Data,
            )
            .await
    }

    /// Get the published configuration of a bot.
    pub async fn retrieve(&self, bot_id: &str) -> Result<Response<Bot>> {
        require("bot_id", bot_id)?;
        self.client
            .get(
                "/v1/bot/get_online_info",
                &[("bot_id", bot_id)],
                PayloadAt::Data,
            )
            .await
    }
}
