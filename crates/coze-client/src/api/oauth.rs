//! OAuth web-application flow.
//!
//! These calls authenticate with the application's client secret, so they work on a
//! client built without an API token.

use serde::Serialize;
use url::Url;

use crate::client::CozeClient;
use crate::envelope::{PayloadAt, Response};
use crate::error::Result;
use crate::transport::{Method, RequestBody};
use crate::types::{
    AuthorizationUrlRequest, GetAccessTokenRequest, OAuthToken, RefreshAccessTokenRequest,
    require,
};

const TOKEN_PATH: &str = "/api/permission/oauth2/token";

#[derive(Serialize)]
#[serde(tag = "grant_type", rename_all = "snake_case")]
enum TokenGrant<'a> {
    AuthorizationCode {
        client_id: &'a str,
        code: &'a str,
        redirect_uri: &'a str,
    },
    RefreshToken {
        client_id: &'a str,
        refresh_token: &'a str,
    },
}

/// OAuth API client.
pub struct OAuthApi {
    client: CozeClient,
}

impl OAuthApi {
    pub(crate) fn new(client: CozeClient) -> Self {
        Self { client }
    }

    /// URL to send the user to for consent.
    ///
    /// The consent page lives on the web host matching the client's API host
    /// (`api.coze.cn` becomes `www.coze.cn`).
    pub fn authorization_url(&self, request: &AuthorizationUrlRequest) -> Result<String> {
        require("client_id", &request.client_id)?;

        let path = match request.workspace_id.as_deref() {
            Some(workspace) if !workspace.trim().is_empty() => format!(
                "api/permission/oauth2/workspace_id/{}/authorize",
                urlencoding::encode(workspace)
            ),
            _ => "api/permission/oauth2/authorize".to_string(),
        };

        let mut url = web_base(self.client.base_url())?.join(&path)?;
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &request.client_id)
            .append_pair("redirect_uri", &request.redirect_uri)
            .append_pair("state", request.state.as_deref().unwrap_or_default());
        Ok(url.into())
    }

    /// Exchange an authorization code for tokens.
    pub async fn get_access_token(
        &self,
        request: &GetAccessTokenRequest,
    ) -> Result<Response<OAuthToken>> {
        require("client_id", &request.client_id)?;
        require("client_secret", &request.client_secret)?;
        require("code", &request.code)?;
        let grant = TokenGrant::AuthorizationCode {
            client_id: &request.client_id,
            code: &request.code,
            redirect_uri: &request.redirect_uri,
        };
        self.request_token(request.api_base.as_deref(), &request.client_secret, &grant)
            .await
    }

    /// Exchange a refresh token for new tokens.
    pub async fn refresh_access_token(
        &self,
        request: &RefreshAccessTokenRequest,
    ) -> Result<Response<OAuthToken>> {
        require("client_id", &request.client_id)?;
        require("client_secret", &request.client_secret)?;
        require("refresh_token", &request.refresh_token)?;
        let grant = TokenGrant::RefreshToken {
            client_id: &request.client_id,
            refresh_token: &request.refresh_token,
        };
        self.request_token(request.api_base.as_deref(), &request.client_secret, &grant)
            .await
    }

    async fn request_token(
        &self,
        api_base: Option<&str>,
        client_secret: &str,
        grant: &TokenGrant<'_>,
    ) -> Result<Response<OAuthToken>> {
        let url = match api_base.filter(|base| !base.trim().is_empty()) {
            Some(base) => CozeClient::url_on(base, TOKEN_PATH, &[])?,
            None => self.client.url(TOKEN_PATH, &[])?,
        };
        let body = RequestBody::Json(serde_json::to_value(grant)?);
        self.client
            .send(Method::Post, url, client_secret, body, PayloadAt::Body)
            .await
    }
}

/// Web host serving the consent page for an API base URL.
fn web_base(api_base: &Url) -> Result<Url> {
    let mut base = api_base.clone();
    let web_host = base
        .host_str()
        .and_then(|host| host.strip_prefix("api."))
        .map(|rest| format!("www.{rest}"));
    if let Some(host) = web_host {
        base.set_host(Some(&host))?;
    }
    base.set_path("/");
    Ok(base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{StubTransport, anonymous_client, json_body};
    use serde_json::json;

    fn cn_client() -> CozeClient {
        CozeClient::builder().build().unwrap()
    }

    #[test]
    fn test_authorization_url() {
        let url = cn_client()
            .oauth()
            .authorization_url(&AuthorizationUrlRequest::new(
                "app-1",
                "https://example.com/callback",
            ))
            .unwrap();
        assert_eq!(
            url,
            "https://www.coze.cn/api/permission/oauth2/authorize?response_type=code&client_id=app-1&redirect_uri=https%3A%2F%2Fexample.com%2Fcallback&state="
        );
    }

    #[test]
    fn test_authorization_url_with_workspace_and_state() {
        let client = CozeClient::builder()
            .base_url(crate::client::COZE_COM_BASE_URL)
            .build()
            .unwrap();
        let url = client
            .oauth()
            .authorization_url(
                &AuthorizationUrlRequest::new("app-1", "https://example.com/cb")
                    .with_state("xyz")
                    .with_workspace("ws-9"),
            )
            .unwrap();
        assert!(url.starts_with(
            "https://www.coze.com/api/permission/oauth2/workspace_id/ws-9/authorize?"
        ));
        assert!(url.ends_with("&state=xyz"));
    }

    #[test]
    fn test_authorization_url_requires_client_id() {
        let err = cn_client()
            .oauth()
            .authorization_url(&AuthorizationUrlRequest::new("", "https://example.com"))
            .unwrap_err();
        assert!(err.is_invalid_param());
    }

    #[test]
    fn test_web_base_host_mapping() {
        let base = Url::parse("http://localhost:8080/proxy/").unwrap();
        assert_eq!(web_base(&base).unwrap().as_str(), "http://localhost:8080/");

        let base = Url::parse("https://api.coze.com/").unwrap();
        assert_eq!(web_base(&base).unwrap().as_str(), "https://www.coze.com/");
    }

    #[tokio::test]
    async fn test_get_access_token_without_api_token() {
        let stub = StubTransport::new();
        stub.push_json(
            200,
            r#"{"access_token":"at","expires_in":1718003600,"refresh_token":"rt","token_type":"Bearer"}"#,
        );

        let request = GetAccessTokenRequest {
            client_id: "app-1".to_string(),
            client_secret: "secret".to_string(),
            redirect_uri: "https://example.com/cb".to_string(),
            code: "code-1".to_string(),
            ..Default::default()
        };
        let token = anonymous_client(&stub)
            .oauth()
            .get_access_token(&request)
            .await
            .unwrap();
        assert_eq!(token.access_token, "at");
        assert_eq!(token.refresh_token, "rt");
        assert_eq!(token.expires_in, 1718003600);

        let sent = stub.last_request().unwrap();
        assert_eq!(sent.url.as_str(), "https://api.test/api/permission/oauth2/token");
        assert_eq!(sent.bearer.as_deref(), Some("secret"));
        assert_eq!(
            json_body(&sent),
            json!({
                "grant_type": "authorization_code",
                "client_id": "app-1",
                "code": "code-1",
                "redirect_uri": "https://example.com/cb"
            })
        );
    }

    #[tokio::test]
    async fn test_refresh_uses_api_base_override() {
        let stub = StubTransport::new();
        stub.push_json(200, r#"{"access_token":"at2","refresh_token":"rt2"}"#);

        let request = RefreshAccessTokenRequest {
            api_base: Some("https://api.coze.com".to_string()),
            client_id: "app-1".to_string(),
            client_secret: "secret".to_string(),
            refresh_token: "rt".to_string(),
        };
        let token = anonymous_client(&stub)
            .oauth()
            .refresh_access_token(&request)
            .await
            .unwrap();
        assert_eq!(token.access_token, "at2");

        let sent = stub.last_request().unwrap();
        assert_eq!(sent.url.host_str(), Some("api.coze.com"));
        assert_eq!(
            json_body(&sent),
            json!({"grant_type": "refresh_token", "client_id": "app-1", "refresh_token": "rt"})
        );
    }

    #[tokio::test]
    async fn test_token_error_code() {
        let stub = StubTransport::new();
        stub.push_json(
            401,
            r#"{"error_code":"invalid_grant","error_message":"code expired"}"#,
        );

        let request = GetAccessTokenRequest {
            client_id: "app-1".to_string(),
            client_secret: "secret".to_string(),
            code: "stale".to_string(),
            ..Default::default()
        };
        let err = anonymous_client(&stub)
            .oauth()
            .get_access_token(&request)
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(-1));
        assert_eq!(err.to_string(), "API error (code -1): code expired");
    }

    #[tokio::test]
    async fn test_refresh_requires_secret() {
        let stub = StubTransport::new();
        let request = RefreshAccessTokenRequest {
            client_id: "app-1".to_string(),
            refresh_token: "rt".to_string(),
            ..Default::default()
        };
        let err = anonymous_client(&stub)
            .oauth()
            .refresh_access_token(&request)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid parameter: client_secret is required");
        assert_eq!(stub.calls(), 0);
    }
}
