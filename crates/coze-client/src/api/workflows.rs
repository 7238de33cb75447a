//! Workflows API.
//!
//! A streamed run may stop at an `Interrupt` event. Answer it with
//! [`WorkflowsApi::resume`], which opens a new stream continuing the same run.

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::client::CozeClient;
use crate::envelope::{PayloadAt, Response};
use crate::error::Result;
use crate::events::{WorkflowEvent, WorkflowEventStream};
use crate::types::{WorkflowResumeRequest, WorkflowRunRequest, WorkflowRunResult, require};

#[derive(Serialize)]
struct RunBody<'a> {
    #[serde(flatten)]
    request: &'a WorkflowRunRequest,
    #[serde(skip_serializing_if = "Option::is_none")]
    is_async: Option<bool>,
}

/// Workflows API client.
pub struct WorkflowsApi {
    client: CozeClient,
}

impl WorkflowsApi {
    pub(crate) fn new(client: CozeClient) -> Self {
        Self { client }
    }

    /// Run a workflow and wait for its output.
    pub async fn run(&self, request: WorkflowRunRequest) -> Result<Response<WorkflowRunResult>> {
        require("workflow_id", &request.workflow_id)?;
        let body = RunBody {
            request: &request,
            is_async: request.is_async,
        };
        self.client
            .post("/v1/workflow/run", &[], &body, PayloadAt::Body)
            .await
    }

    /// Run a workflow and stream its events.
    pub async fn stream(&self, request: WorkflowRunRequest) -> Result<WorkflowEventStream> {
        self.stream_with_cancellation(request, CancellationToken::new())
            .await
    }

    pub async fn stream_with_cancellation(
        &self,
        request: WorkflowRunRequest,
        cancel: CancellationToken,
    ) -> Result<WorkflowEventStream> {
        require("workflow_id", &request.workflow_id)?;
        tracing::debug!(workflow_id = %request.workflow_id, "opening workflow stream");
        self.client
            .post_stream(
                "/v1/workflow/stream_run",
                &[],
                &request,
                cancel,
                WorkflowEvent::decode,
            )
            .await
    }

    /// Answer an interrupt and stream the rest of the run.
    pub async fn resume(&self, request: WorkflowResumeRequest) -> Result<WorkflowEventStream> {
        self.resume_with_cancellation(request, CancellationToken::new())
            .await
    }

    pub async fn resume_with_cancellation(
        &self,
        request: WorkflowResumeRequest,
        cancel: CancellationToken,
    ) -> Result<WorkflowEventStream> {
        require("workflow_id", &request.workflow_id)?;
        require("event_id", &request.event_id)?;
        tracing::debug!(
            workflow_id = %request.workflow_id,
            event_id = %request.event_id,
            "resuming workflow"
        );
        self.client
            .post_stream(
                "/v1/workflow/stream_resume",
                &[],
                &request,
                cancel,
                WorkflowEvent::decode,
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::WorkflowEventKind;
    use crate::testing::{StubTransport, client, json_body};
    use futures::StreamExt;
    use serde_json::json;

    #[tokio::test]
    async fn test_run_reads_top_level_result() {
        let stub = StubTransport::new();
        stub.push_json(
            200,
            r#"{"code":0,"msg":"Success","data":"{\"answer\":42}","debug_url":"https://debug","execute_id":""}"#,
        );

        let resp = client(&stub)
            .workflows()
            .run(WorkflowRunRequest::new("wf").with_parameter("q", "life").with_async(false))
            .await
            .unwrap();
        assert_eq!(resp.msg, "Success");
        let result = resp.into_inner();
        assert_eq!(result.data, r#"{"answer":42}"#);
        assert_eq!(result.debug_url, "https://debug");

        assert_eq!(
            json_body(&stub.last_request().unwrap()),
            json!({"workflow_id": "wf", "parameters": {"q": "life"}, "is_async": false})
        );
    }

    #[tokio::test]
    async fn test_run_requires_workflow_id() {
        let stub = StubTransport::new();
        let err = client(&stub)
            .workflows()
            .run(WorkflowRunRequest::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid parameter: workflow_id is required");
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn test_stream_until_interrupt() {
        let stub = StubTransport::new();
        stub.push_sse(&[
            "id: 0\nevent: Message\ndata: {\"content\":\"thinking\",\"node_title\":\"LLM\",\"node_seq_id\":\"0\",\"node_is_finish\":true}\n\n",
            "id: 1\nevent: Interrupt\ndata: {\"interrupt_data\":{\"event_id\":\"ev-1\",\"type\":2},\"node_title\":\"Ask\"}\n\n",
        ]);

        let stream = client(&stub)
            .workflows()
            .stream(WorkflowRunRequest::new("wf").with_async(true))
            .await
            .unwrap();
        let events: Vec<WorkflowEvent> = stream.map(|e| e.unwrap()).collect().await;
        assert_eq!(events.len(), 2);

        let WorkflowEventKind::Message(msg) = &events[0].kind else {
            panic!("expected a message");
        };
        assert_eq!(msg.content, "thinking");
        assert!(msg.node_is_finish);

        assert_eq!(events[1].id, "1");
        let WorkflowEventKind::Interrupt(interrupt) = &events[1].kind else {
            panic!("expected an interrupt");
        };
        let resume = WorkflowResumeRequest::from_interrupt("wf", interrupt, "yes");
        assert_eq!(resume.event_id, "ev-1");
        assert_eq!(resume.interrupt_type, 2);

        let body = json_body(&stub.last_request().unwrap());
        assert!(body.get("is_async").is_none());
        assert_eq!(stub.last_request().unwrap().url.path(), "/v1/workflow/stream_run");
    }

    #[tokio::test]
    async fn test_resume_streams_to_done() {
        let stub = StubTransport::new();
        stub.push_sse(&[
            "id: 2\nevent: Message\ndata: {\"content\":\"ok\",\"node_seq_id\":1}\n\n",
            "id: 3\nevent: Done\ndata: {}\n\n",
        ]);

        let request = WorkflowResumeRequest {
            workflow_id: "wf".to_string(),
            event_id: "ev-1".to_string(),
            resume_data: "yes".to_string(),
            interrupt_type: 2,
            bot_id: None,
        };
        let events: Vec<_> = client(&stub)
            .workflows()
            .resume(request)
            .await
            .unwrap()
            .map(|e| e.unwrap())
            .collect()
            .await;
        assert_eq!(events[1].kind, WorkflowEventKind::Done);

        let req = stub.last_request().unwrap();
        assert_eq!(req.url.path(), "/v1/workflow/stream_resume");
        assert_eq!(json_body(&req)["resume_data"], "yes");
    }

    #[tokio::test]
    async fn test_resume_requires_event_id() {
        let stub = StubTransport::new();
        let request = WorkflowResumeRequest {
            workflow_id: "wf".to_string(),
            ..Default::default()
        };
        let err = client(&stub).workflows().resume(request).await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid parameter: event_id is required");
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn test_stream_error_event() {
        let stub = StubTransport::new();
        stub.push_sse(&[
            "id: 0\nevent: Error\ndata: {\"error_code\":720701013,\"error_message\":\"node failed\"}\n\n",
        ]);

        let events: Vec<_> = client(&stub)
            .workflows()
            .stream(WorkflowRunRequest::new("wf"))
            .await
            .unwrap()
            .collect()
            .await;
        let WorkflowEventKind::Error(error) = &events[0].as_ref().unwrap().kind else {
            panic!("expected an error event");
        };
        assert_eq!(error.error_code, 720701013);
        assert_eq!(error.error_message, "node failed");
    }
}
