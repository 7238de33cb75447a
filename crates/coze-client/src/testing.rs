//! Recording transport for unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;

use crate::error::{Error, Result};
use crate::transport::{HttpRequest, HttpResponse, StreamingResponse, Transport};

pub(crate) const STUB_LOGID: &str = "stub-logid";

enum Canned {
    Full(HttpResponse),
    Stream {
        status: u16,
        content_type: &'static str,
        chunks: Vec<Bytes>,
    },
}

/// Answers requests from a queue and records every request it sees.
#[derive(Default)]
pub(crate) struct StubTransport {
    requests: Mutex<Vec<HttpRequest>>,
    responses: Mutex<VecDeque<Canned>>,
}

impl StubTransport {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn push_json(&self, status: u16, body: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Canned::Full(HttpResponse {
                status,
                logid: Some(STUB_LOGID.to_string()),
                content_type: Some("application/json".to_string()),
                body: Bytes::from(body.to_string()),
            }));
    }

    pub(crate) fn push_sse(&self, chunks: &[&str]) {
        self.responses.lock().unwrap().push_back(Canned::Stream {
            status: 200,
            content_type: "text/event-stream",
            chunks: chunks
                .iter()
                .map(|c| Bytes::from(c.to_string()))
                .collect(),
        });
    }

    /// Queue a JSON envelope answered on a streaming endpoint.
    pub(crate) fn push_stream_json(&self, status: u16, body: &str) {
        self.responses.lock().unwrap().push_back(Canned::Stream {
            status,
            content_type: "application/json",
            chunks: vec![Bytes::from(body.to_string())],
        });
    }

    pub(crate) fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn last_request(&self) -> Option<HttpRequest> {
        self.requests.lock().unwrap().last().cloned()
    }

    fn next(&self, request: HttpRequest) -> Result<Canned> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| Error::Transport("no canned response".to_string()))
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        match self.next(request)? {
            Canned::Full(response) => Ok(response),
            Canned::Stream { .. } => Err(Error::Transport("expected a full response".to_string())),
        }
    }

    async fn send_streaming(&self, request: HttpRequest) -> Result<StreamingResponse> {
        match self.next(request)? {
            Canned::Stream {
                status,
                content_type,
                chunks,
            } => Ok(StreamingResponse {
                status,
                logid: Some(STUB_LOGID.to_string()),
                content_type: Some(content_type.to_string()),
                body: futures::stream::iter(chunks.into_iter().map(Ok)).boxed(),
            }),
            Canned::Full(_) => Err(Error::Transport("expected a streaming response".to_string())),
        }
    }
}

/// A client with a token, routed through `stub`.
pub(crate) fn client(stub: &Arc<StubTransport>) -> crate::client::CozeClient {
    crate::client::CozeClient::builder()
        .api_token("pat_test")
        .base_url("https://api.test")
        .transport(stub.clone())
        .build()
        .unwrap()
}

/// A client without a token, routed through `stub`.
pub(crate) fn anonymous_client(stub: &Arc<StubTransport>) -> crate::client::CozeClient {
    crate::client::CozeClient::builder()
        .base_url("https://api.test")
        .transport(stub.clone())
        .build()
        .unwrap()
}

/// The JSON body of a recorded request.
pub(crate) fn json_body(request: &HttpRequest) -> serde_json::Value {
    match &request.body {
        crate::transport::RequestBody::Json(value) => value.clone(),
        other => panic!("expected a JSON body, got {other:?}"),
    }
}

/// A query parameter of a recorded request.
pub(crate) fn query(request: &HttpRequest, key: &str) -> Option<String> {
    request
        .url
        .query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}
