//! Main client implementation.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::time::Duration;

use futures::StreamExt;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::api::{
    AudioApi, BotsApi, ChatApi, ConversationsApi, FilesApi, MessagesApi, OAuthApi, WorkflowsApi,
    WorkspacesApi,
};
use crate::envelope::{self, PayloadAt, Response};
use crate::error::{Error, Result};
use crate::sse::{self, EventStream, RawEvent};
use crate::transport::{HttpRequest, Method, ReqwestTransport, RequestBody, Transport};

/// Base URL of the China-region platform.
pub const COZE_CN_BASE_URL: &str = "https://api.coze.cn";

/// Base URL of the international platform.
pub const COZE_COM_BASE_URL: &str = "https://api.coze.com";

/// Environment variable holding the API token.
pub const ENV_API_TOKEN: &str = "COZE_API_TOKEN";

/// Environment variable overriding the base URL.
pub const ENV_API_BASE: &str = "COZE_API_BASE";

/// Default timeout for non-streaming requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Coze API client.
///
/// Cheap to clone; clones share the transport.
///
/// # Example
///
/// ```no_run
/// use coze_client::{ChatRequest, CozeClient, EnterMessage};
///
/// # async fn example() -> coze_client::Result<()> {
/// let client = CozeClient::builder().api_token("pat_xxx").build()?;
///
/// let request = ChatRequest::new("7400000000000000000", "user-1")
///     .with_message(EnterMessage::user_text("What's the weather like?"));
/// let result = client.chat().create_and_poll(request, Default::default()).await?;
/// for message in &result.messages {
///     println!("{}", message.content);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct CozeClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    transport: Arc<dyn Transport>,
    base_url: Url,
    api_token: Option<String>,
    timeout: Duration,
}

impl CozeClient {
    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Build a client from `COZE_API_TOKEN` and `COZE_API_BASE`.
    pub fn from_env() -> Result<Self> {
        ClientBuilder::from_env()?.build()
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    // ─────────────────────────────────────────────────────────────────────────
    // API accessors
    // ─────────────────────────────────────────────────────────────────────────

    /// Access the workspaces API.
    pub fn workspaces(&self) -> WorkspacesApi {
        WorkspacesApi::new(self.clone())
    }

    /// Access the bots API.
    pub fn bots(&self) -> BotsApi {
        BotsApi::new(self.clone())
    }

    /// Access the conversations API.
    pub fn conversations(&self) -> ConversationsApi {
        ConversationsApi::new(self.clone())
    }

    /// Access the conversation messages API.
    pub fn messages(&self) -> MessagesApi {
        MessagesApi::new(self.clone())
    }

    /// Access the chat API.
    pub fn chat(&self) -> ChatApi {
        ChatApi::new(self.clone())
    }

    /// Access the files API.
    pub fn files(&self) -> FilesApi {
        FilesApi::new(self.clone())
    }

    /// Access the workflows API.
    pub fn workflows(&self) -> WorkflowsApi {
        WorkflowsApi::new(self.clone())
    }

    /// Access the audio API.
    pub fn audio(&self) -> AudioApi {
        AudioApi::new(self.clone())
    }

    /// Access the OAuth API.
    pub fn oauth(&self) -> OAuthApi {
        OAuthApi::new(self.clone())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internal HTTP methods
    // ─────────────────────────────────────────────────────────────────────────

    /// Build a URL for an API path on the client base URL.
    pub(crate) fn url(&self, path: &str, query: &[(&str, &str)]) -> Result<Url> {
        build_url(&self.inner.base_url, path, query)
    }

    /// Build a URL for an API path on another base URL.
    pub(crate) fn url_on(base: &str, path: &str, query: &[(&str, &str)]) -> Result<Url> {
        build_url(&normalize_base(base)?, path, query)
    }

    /// The API token, or `InvalidParam` when none is configured.
    pub(crate) fn token(&self) -> Result<&str> {
        match self.inner.api_token.as_deref() {
            Some(token) if !token.trim().is_empty() => Ok(token),
            _ => Err(Error::missing("api_token")),
        }
    }

    /// Make an authenticated GET request.
    pub(crate) async fn get<T>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        at: PayloadAt,
    ) -> Result<Response<T>>
    where
        T: DeserializeOwned + Default,
    {
        let token = self.token()?;
        let url = self.url(path, query)?;
        self.send(Method::Get, url, token, RequestBody::Empty, at)
            .await
    }

    /// Make an authenticated POST request with a JSON body.
    pub(crate) async fn post<T, B>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        body: &B,
        at: PayloadAt,
    ) -> Result<Response<T>>
    where
        T: DeserializeOwned + Default,
        B: Serialize + ?Sized,
    {
        let token = self.token()?;
        let url = self.url(path, query)?;
        let body = RequestBody::Json(serde_json::to_value(body)?);
        self.send(Method::Post, url, token, body, at).await
    }

    /// Make an authenticated POST request without a body.
    pub(crate) async fn post_empty<T>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        at: PayloadAt,
    ) -> Result<Response<T>>
    where
        T: DeserializeOwned + Default,
    {
        let token = self.token()?;
        let url = self.url(path, query)?;
        self.send(Method::Post, url, token, RequestBody::Empty, at)
            .await
    }

    /// Send one request and decode its envelope.
    pub(crate) async fn send<T>(
        &self,
        method: Method,
        url: Url,
        bearer: &str,
        body: RequestBody,
        at: PayloadAt,
    ) -> Result<Response<T>>
    where
        T: DeserializeOwned + Default,
    {
        let request = HttpRequest::new(method, url)
            .bearer(Some(bearer))
            .body(body)
            .timeout(Some(self.inner.timeout));
        let response = self.inner.transport.send(request).await?;
        envelope::decode(response, at)
    }

    /// Open an event stream with an authenticated POST.
    ///
    /// Stream-setup failures reported as a JSON envelope surface here as errors.
    pub(crate) async fn post_stream<T, B>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        body: &B,
        cancel: CancellationToken,
        decode: fn(RawEvent, Option<&str>) -> T,
    ) -> Result<EventStream<T>>
    where
        T: Send + 'static,
        B: Serialize + ?Sized,
    {
        let token = self.token()?;
        let url = self.url(path, query)?;
        let request = HttpRequest::new(Method::Post, url)
            .bearer(Some(token))
            .body(RequestBody::Json(serde_json::to_value(body)?));

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            response = self.inner.transport.send_streaming(request) => response?,
        };

        let logid = response.logid.clone();
        let chunks = if response.is_envelope() {
            let full = response.collect().await?;
            envelope::classify(&full)?;
            futures::stream::once(async move { Ok::<_, Error>(full.body) }).boxed()
        } else {
            response.body
        };

        let dropped = Arc::new(AtomicU64::new(0));
        let event_logid = logid.clone();
        let events = sse::raw_events(chunks, cancel, dropped.clone())
            .map(move |item| item.map(|raw| decode(raw, event_logid.as_deref())))
            .boxed();

        Ok(EventStream::new(events, logid, dropped))
    }
}

impl fmt::Debug for CozeClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CozeClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("has_token", &self.inner.api_token.is_some())
            .field("timeout", &self.inner.timeout)
            .finish_non_exhaustive()
    }
}

fn normalize_base(base: &str) -> Result<Url> {
    let mut url = Url::parse(base.trim())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::Config(format!(
            "base_url must be http or https, got {}",
            url.scheme()
        )));
    }
    if !url.path().ends_with('/') {
        url.set_path(&format!("{}/", url.path()));
    }
    Ok(url)
}

fn build_url(base: &Url, path: &str, query: &[(&str, &str)]) -> Result<Url> {
    let mut url = base.join(path.trim_start_matches('/'))?;
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }
    Ok(url)
}

/// Builder for creating a [`CozeClient`].
pub struct ClientBuilder {
    base_url: String,
    api_token: Option<String>,
    timeout: Duration,
    user_agent: Option<String>,
    transport: Option<Arc<dyn Transport>>,
}

impl ClientBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        Self {
            base_url: COZE_CN_BASE_URL.to_string(),
            api_token: None,
            timeout: DEFAULT_TIMEOUT,
            user_agent: None,
            transport: None,
        }
    }

    /// Create a builder from `COZE_API_TOKEN` and the optional `COZE_API_BASE`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let token = lookup(ENV_API_TOKEN)
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                Error::Config(format!("{ENV_API_TOKEN} environment variable not set"))
            })?;

        let mut builder = Self::new().api_token(token);
        if let Some(base) = lookup(ENV_API_BASE).filter(|b| !b.trim().is_empty()) {
            builder = builder.base_url(base);
        }
        Ok(builder)
    }

    /// Set the base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the API token (personal access token or OAuth access token).
    pub fn api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    /// Set the timeout for non-streaming requests.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set a custom user agent. Ignored when a transport is supplied.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Use a custom transport instead of the reqwest default.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<CozeClient> {
        let base_url = normalize_base(&self.base_url)?;

        let transport = match self.transport {
            Some(transport) => transport,
            None => {
                let user_agent = self
                    .user_agent
                    .unwrap_or_else(|| format!("coze-client/{}", env!("CARGO_PKG_VERSION")));
                Arc::new(ReqwestTransport::new(&user_agent)?)
            }
        };

        Ok(CozeClient {
            inner: Arc::new(ClientInner {
                transport,
                base_url,
                api_token: self.api_token,
                timeout: self.timeout,
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("base_url", &self.base_url)
            .field("has_token", &self.api_token.is_some())
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .field("custom_transport", &self.transport.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubTransport;

    #[test]
    fn test_builder_defaults_to_cn_host() {
        let client = ClientBuilder::new().build().unwrap();
        assert_eq!(client.base_url().as_str(), "https://api.coze.cn/");
    }

    #[test]
    fn test_builder_normalizes_trailing_slash() {
        let client = ClientBuilder::new()
            .base_url("http://localhost:8080/proxy")
            .build()
            .unwrap();
        assert_eq!(client.base_url().as_str(), "http://localhost:8080/proxy/");
    }

    #[test]
    fn test_builder_rejects_bad_urls() {
        let err = ClientBuilder::new().base_url("not a url").build().unwrap_err();
        assert!(matches!(err, Error::InvalidUrl(_)));

        let err = ClientBuilder::new()
            .base_url("ftp://example.com")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_url_building() {
        let client = ClientBuilder::new()
            .base_url("http://localhost:8080")
            .build()
            .unwrap();

        let url = client.url("/v1/bot/create", &[]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/v1/bot/create");
        assert_eq!(url.query(), None);

        let url = client
            .url("v3/chat/retrieve", &[("conversation_id", "c 1"), ("chat_id", "x&y")])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/v3/chat/retrieve?conversation_id=c+1&chat_id=x%26y"
        );
    }

    #[test]
    fn test_url_on_other_base() {
        let url = CozeClient::url_on(
            "https://api.coze.com",
            "/api/permission/oauth2/token",
            &[],
        )
        .unwrap();
        assert_eq!(url.as_str(), "https://api.coze.com/api/permission/oauth2/token");
    }

    #[test]
    fn test_from_lookup() {
        let builder = ClientBuilder::from_lookup(|key| match key {
            ENV_API_TOKEN => Some("pat_123".to_string()),
            ENV_API_BASE => Some(COZE_COM_BASE_URL.to_string()),
            _ => None,
        })
        .unwrap();
        let client = builder.build().unwrap();
        assert_eq!(client.base_url().as_str(), "https://api.coze.com/");
        assert_eq!(client.token().unwrap(), "pat_123");

        let builder = ClientBuilder::from_lookup(|key| {
            (key == ENV_API_TOKEN).then(|| "pat_123".to_string())
        })
        .unwrap();
        assert_eq!(builder.build().unwrap().base_url().as_str(), "https://api.coze.cn/");

        let err = ClientBuilder::from_lookup(|_| None).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_debug_hides_token() {
        let builder = ClientBuilder::new().api_token("pat_secret");
        assert!(!format!("{:?}", builder).contains("pat_secret"));

        let client = builder.build().unwrap();
        assert!(!format!("{:?}", client).contains("pat_secret"));
    }

    #[tokio::test]
    async fn test_missing_token_sends_nothing() {
        let stub = StubTransport::new();
        let client = ClientBuilder::new()
            .transport(stub.clone())
            .build()
            .unwrap();

        let err = client
            .get::<serde_json::Value>("/v1/workspaces", &[], PayloadAt::Data)
            .await
            .unwrap_err();
        assert!(err.is_invalid_param());
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn test_request_carries_bearer_and_timeout() {
        let stub = StubTransport::new();
        stub.push_json(200, r#"{"code":0,"msg":"","data":{"id":"x"}}"#);
        let client = ClientBuilder::new()
            .api_token("pat_1")
            .timeout(Duration::from_secs(5))
            .transport(stub.clone())
            .build()
            .unwrap();

        let resp = client
            .post::<serde_json::Value, _>(
                "/v1/conversation/create",
                &[],
                &serde_json::json!({"bot_id": "b"}),
                PayloadAt::Data,
            )
            .await
            .unwrap();
        assert_eq!(resp["id"], "x");

        let request = stub.last_request().unwrap();
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.bearer.as_deref(), Some("pat_1"));
        assert_eq!(request.timeout, Some(Duration::from_secs(5)));
        assert_eq!(request.url.path(), "/v1/conversation/create");
    }
}
