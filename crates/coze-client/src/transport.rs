//! HTTP transport seam.
//!
//! The client never talks to reqwest directly. Every request goes through a
//! [`Transport`], which lets tests substitute a recording stub and lets callers
//! bring their own HTTP stack.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use reqwest::header::{ACCEPT, CACHE_CONTROL, CONTENT_TYPE, HeaderMap};
use url::Url;

use crate::error::Result;

/// Response header carrying the platform's trace id.
pub const LOGID_HEADER: &str = "x-tt-logid";

/// HTTP method used by the platform API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => f.write_str("GET"),
            Method::Post => f.write_str("POST"),
        }
    }
}

/// Request body.
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    /// No body.
    #[default]
    Empty,
    /// JSON document, sent with `Content-Type: application/json`.
    Json(serde_json::Value),
    /// `multipart/form-data` with a single part named `file`.
    Multipart {
        /// File name reported in the part's content disposition.
        file_name: String,
        /// File contents.
        bytes: Bytes,
    },
}

/// A single request to the platform.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    /// Sent as `Authorization: Bearer <token>` when present.
    pub bearer: Option<String>,
    pub body: RequestBody,
    /// Total request timeout. Ignored for streaming requests.
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            bearer: None,
            body: RequestBody::Empty,
            timeout: None,
        }
    }

    pub fn bearer(mut self, token: Option<impl Into<String>>) -> Self {
        self.bearer = token.map(Into::into);
        self
    }

    pub fn body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

/// A fully-read response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub logid: Option<String>,
    pub content_type: Option<String>,
    pub body: Bytes,
}

/// A response whose body is delivered incrementally.
pub struct StreamingResponse {
    pub status: u16,
    pub logid: Option<String>,
    pub content_type: Option<String>,
    pub body: BoxStream<'static, Result<Bytes>>,
}

impl StreamingResponse {
    /// Whether the server answered with an error status or a JSON document instead of
    /// an event stream.
    pub fn is_envelope(&self) -> bool {
        !(200..300).contains(&self.status)
            || self
                .content_type
                .as_deref()
                .is_some_and(|ct| ct.starts_with("application/json"))
    }

    /// Read the remaining body into memory.
    pub async fn collect(self) -> Result<HttpResponse> {
        let chunks: Vec<Bytes> = self.body.try_collect().await?;
        Ok(HttpResponse {
            status: self.status,
            logid: self.logid,
            content_type: self.content_type,
            body: Bytes::from(chunks.concat()),
        })
    }
}

impl fmt::Debug for StreamingResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamingResponse")
            .field("status", &self.status)
            .field("logid", &self.logid)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// Issues HTTP requests on behalf of the client.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request and read the whole response body.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;

    /// Send a request and hand back the body as a chunk stream.
    ///
    /// Implementations must not impose a read timeout: the stream stays open until the
    /// server closes it or the stream is dropped.
    async fn send_streaming(&self, request: HttpRequest) -> Result<StreamingResponse>;
}

/// Default transport backed by reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport with the given user agent.
    pub fn new(user_agent: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .tcp_keepalive(Duration::from_secs(60))
            .build()?;
        Ok(Self { http })
    }

    /// Wrap an existing reqwest client.
    pub fn from_client(http: reqwest::Client) -> Self {
        Self { http }
    }

    fn build(&self, request: HttpRequest, streaming: bool) -> reqwest::RequestBuilder {
        let mut builder = match request.method {
            Method::Get => self.http.get(request.url),
            Method::Post => self.http.post(request.url),
        };

        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }

        if streaming {
            builder = builder
                .header(ACCEPT, "text/event-stream")
                .header(CACHE_CONTROL, "no-cache");
        } else if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart { file_name, bytes } => {
                let part = reqwest::multipart::Part::bytes(bytes.to_vec()).file_name(file_name);
                builder.multipart(reqwest::multipart::Form::new().part("file", part))
            }
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        tracing::debug!(method = %request.method, url = %request.url, "coze request");

        let response = self.build(request, false).send().await?;
        let status = response.status().as_u16();
        let logid = extract_logid(response.headers());
        let content_type = extract_content_type(response.headers());
        let body = response.bytes().await?;

        tracing::debug!(
            status,
            logid = logid.as_deref().unwrap_or_default(),
            bytes = body.len(),
            "coze response"
        );

        Ok(HttpResponse {
            status,
            logid,
            content_type,
            body,
        })
    }

    async fn send_streaming(&self, request: HttpRequest) -> Result<StreamingResponse> {
        tracing::debug!(method = %request.method, url = %request.url, "coze stream request");

        let response = self.build(request, true).send().await?;
        let status = response.status().as_u16();
        let logid = extract_logid(response.headers());
        let content_type = extract_content_type(response.headers());

        tracing::debug!(
            status,
            logid = logid.as_deref().unwrap_or_default(),
            "coze stream opened"
        );

        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(crate::error::Error::from))
            .boxed();

        Ok(StreamingResponse {
            status,
            logid,
            content_type,
            body,
        })
    }
}

/// Pull the log id out of response headers.
///
/// Header names are case-insensitive; the value is trimmed and empty values are ignored.
pub fn extract_logid(headers: &HeaderMap) -> Option<String> {
    headers
        .get(LOGID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn extract_content_type(headers: &HeaderMap) -> Option<String> {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderName, HeaderValue};

    #[test]
    fn test_extract_logid_any_case() {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_bytes(b"X-TT-LOGID").unwrap(),
            HeaderValue::from_static(" 20241018abc "),
        );
        assert_eq!(extract_logid(&headers), Some("20241018abc".to_string()));
    }

    #[test]
    fn test_extract_logid_missing_or_empty() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_logid(&headers), None);

        headers.insert(LOGID_HEADER, HeaderValue::from_static(""));
        assert_eq!(extract_logid(&headers), None);
    }

    #[test]
    fn test_method_display() {
        assert_eq!(Method::Get.to_string(), "GET");
        assert_eq!(Method::Post.to_string(), "POST");
    }

    fn streaming(status: u16, content_type: &str) -> StreamingResponse {
        StreamingResponse {
            status,
            logid: None,
            content_type: Some(content_type.to_string()),
            body: futures::stream::empty::<Result<Bytes>>().boxed(),
        }
    }

    #[test]
    fn test_streaming_response_is_envelope() {
        assert!(!streaming(200, "text/event-stream; charset=utf-8").is_envelope());
        assert!(streaming(200, "application/json; charset=utf-8").is_envelope());
        assert!(streaming(502, "text/event-stream").is_envelope());
        assert!(streaming(401, "text/plain").is_envelope());
    }

    #[tokio::test]
    async fn test_streaming_response_collect() {
        let chunks = vec![Ok(Bytes::from_static(b"{\"code\":")), Ok(Bytes::from_static(b"0}"))];
        let response = StreamingResponse {
            status: 200,
            logid: None,
            content_type: Some("application/json".to_string()),
            body: futures::stream::iter(chunks).boxed(),
        };
        assert!(response.is_envelope());

        let full = response.collect().await.unwrap();
        assert_eq!(&full.body[..], b"{\"code\":0}");
    }
}
