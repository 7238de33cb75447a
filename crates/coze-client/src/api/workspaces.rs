//! Workspaces API.

use crate::client::CozeClient;
use crate::envelope::{PayloadAt, Response};
use crate::error::Result;
use crate::types::{ListWorkspacesRequest, WorkspaceList};

/// Workspaces API client.
pub struct WorkspacesApi {
    client: CozeClient,
}

impl WorkspacesApi {
    pub(crate) fn new(client: CozeClient) -> Self {
        Self { client }
    }

    /// List the workspaces the token can see.
    pub async fn list(&self, request: ListWorkspacesRequest) -> Result<Response<WorkspaceList>> {
        let page_num = request.page_num.to_string();
        let page_size = request.page_size.to_string();
        self.client
            .get(
                "/v1/workspaces",
                &[("page_num", page_num.as_str()), ("page_size", page_size.as_str())],
                PayloadAt::Data,
            )
            .await
    }
}
