//! Audio API.

use crate::client::CozeClient;
use crate::envelope::{PayloadAt, Response};
use crate::error::Result;
use crate::types::{AudioRoom, CreateRoomRequest, ListVoicesRequest, VoiceList, require};

const DEFAULT_VOICE_PAGE_NUM: u32 = 1;
const DEFAULT_VOICE_PAGE_SIZE: u32 = 100;

/// Audio API client.
pub struct AudioApi {
    client: CozeClient,
}

impl AudioApi {
    pub(crate) fn new(client: CozeClient) -> Self {
        Self { client }
    }

    /// List the voices available to the token.
    pub async fn list_voices(&self, request: ListVoicesRequest) -> Result<Response<VoiceList>> {
        let page_num = request
            .page_num
            .unwrap_or(DEFAULT_VOICE_PAGE_NUM)
            .to_string();
        let page_size = request
            .page_size
            .unwrap_or(DEFAULT_VOICE_PAGE_SIZE)
            .to_string();
        let filter = request.filter_system_voice.to_string();
        self.client
            .get(
                "/v1/audio/voices",
                &[
                    ("page_num", page_num.as_str()),
                    ("page_size", page_size.as_str()),
                    ("filter_system_voice", filter.as_str()),
                ],
                PayloadAt::Data,
            )
            .await
    }

    /// Provision a real-time audio room for a bot.
    pub async fn create_room(&self, request: CreateRoomRequest) -> Result<Response<AudioRoom>> {
        require("bot_id", &request.bot_id)?;
        self.client
            .post("/v1/audio/rooms", &[], &request, PayloadAt::Data)
            .await
    }
}
