//! OAuth 2.0 installed-application flow for Google Drive access.
//!
//! This module handles:
//! - Running the consent flow with a local callback server on `localhost:3030`
//! - Persisting access and refresh tokens to `token.json`
//! - Refreshing the access token shortly before it expires
//! - Revoking the grant on logout

use crate::api::files::{File, SecretFile, TokenFile};
use crate::api::OAUTH_SCOPES;
use crate::error::Res;
use anyhow::{anyhow, bail, Context};
use chrono::{DateTime, Utc};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use oauth2::basic::BasicClient;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointNotSet, EndpointSet,
    PkceCodeChallenge, RedirectUrl, RefreshToken, RevocationUrl, Scope, StandardRevocableToken,
    TokenResponse, TokenUrl,
};
use std::convert::Infallible;
use std::path::Path;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use url::Url;

const OAUTH_CALLBACK_PORT: u16 = 3030;
const REVOCATION_URL: &str = "https://oauth2.googleapis.com/revoke";

type GoogleClient =
    BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointSet, EndpointSet>;

/// Hands out a valid access token, refreshing it through Google when it is close to expiring.
pub(crate) struct TokenProvider {
    client: GoogleClient,
    http: reqwest::Client,
    token: File<TokenFile>,
}

impl std::fmt::Debug for TokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenProvider")
            .field("token_path", &self.token.path())
            .field("expires_at", &self.token.data().expires_at())
            .finish()
    }
}

impl TokenProvider {
    /// Runs the complete consent flow and saves the resulting tokens to `token_path`:
    /// 1. Binds a local HTTP server on localhost:3030
    /// 2. Logs the Google consent URL for the user to open
    /// 3. Waits for the redirect carrying the authorization code
    /// 4. Exchanges the code (with its PKCE verifier) for access and refresh tokens
    pub(crate) async fn initialize(secret_path: &Path, token_path: &Path) -> Res<Self> {
        let secret = SecretFile::load(secret_path).await?;
        let client = google_client(&secret)?;
        let http = http_client()?;

        let listener = TcpListener::bind(("127.0.0.1", OAUTH_CALLBACK_PORT))
            .await
            .with_context(|| format!("Unable to listen on localhost:{OAUTH_CALLBACK_PORT}"))?;

        let (challenge, verifier) = PkceCodeChallenge::new_random_sha256();
        let (auth_url, csrf) = client
            .authorize_url(CsrfToken::new_random)
            .add_scopes(OAUTH_SCOPES.iter().map(|s| Scope::new(s.to_string())))
            .set_pkce_challenge(challenge)
            .add_extra_param("access_type", "offline")
            .add_extra_param("prompt", "consent")
            .url();

        info!("Open this URL in your browser to authorize fintrack:\n\n{auth_url}\n");
        info!("Waiting for the redirect on http://localhost:{OAUTH_CALLBACK_PORT}");

        let (code, state) = wait_for_redirect(listener).await?;
        if state != *csrf.secret() {
            bail!("The OAuth state parameter did not match, the redirect was not ours");
        }

        let response = client
            .exchange_code(AuthorizationCode::new(code))
            .set_pkce_verifier(verifier)
            .request_async(&http)
            .await
            .map_err(|e| anyhow!("Failed to exchange the authorization code: {e}"))?;

        let refresh_token = response
            .refresh_token()
            .map(|t| t.secret().to_string())
            .context("Google did not return a refresh token")?;
        let token = TokenFile::new(
            response.access_token().secret().to_string(),
            refresh_token,
            expiry(response.expires_in()),
        );
        let token = File::new(token_path, token);
        token.save().await?;
        info!("Authorization successful, tokens saved to {}", token_path.display());

        Ok(Self {
            client,
            http,
            token,
        })
    }

    /// Loads previously saved tokens, refreshing them if they are about to expire. Never opens a
    /// browser.
    pub(crate) async fn load(secret_path: &Path, token_path: &Path) -> Res<Self> {
        let secret = SecretFile::load(secret_path).await?;
        let token = TokenFile::load(token_path).await?;
        let mut provider = Self {
            client: google_client(&secret)?,
            http: http_client()?,
            token: File::new(token_path, token),
        };
        provider.access_token().await?;
        Ok(provider)
    }

    /// Returns an access token that is valid for at least five more minutes.
    pub(crate) async fn access_token(&mut self) -> Res<String> {
        if self.token.data().is_expired() {
            self.refresh().await?;
        }
        Ok(self.token.data().access_token().to_string())
    }

    async fn refresh(&mut self) -> Res<()> {
        debug!("Refreshing the OAuth access token");
        let refresh_token = RefreshToken::new(self.token.data().refresh_token().to_string());
        let response = self
            .client
            .exchange_refresh_token(&refresh_token)
            .request_async(&self.http)
            .await
            .map_err(|e| anyhow!("Failed to refresh the OAuth token: {e}"))?;
        self.token.data_mut().update(
            response.access_token().secret().to_string(),
            expiry(response.expires_in()),
            response.refresh_token().map(|t| t.secret().to_string()),
        );
        self.token.save().await?;
        debug!("Token valid until: {}", self.token.data().expires_at());
        Ok(())
    }

    /// Asks Google to revoke the grant. Failures are logged and otherwise ignored.
    pub(crate) async fn revoke(&self) {
        let token = StandardRevocableToken::RefreshToken(RefreshToken::new(
            self.token.data().refresh_token().to_string(),
        ));
        let request = match self.client.revoke_token(token) {
            Ok(request) => request,
            Err(e) => {
                warn!("Unable to build the token revocation request: {e}");
                return;
            }
        };
        match request.request_async(&self.http).await {
            Ok(()) => debug!("OAuth grant revoked"),
            Err(e) => warn!("Unable to revoke the OAuth grant: {e}"),
        }
    }
}

fn google_client(secret: &SecretFile) -> Res<GoogleClient> {
    Ok(BasicClient::new(ClientId::new(secret.client_id().to_string()))
        .set_client_secret(ClientSecret::new(secret.client_secret().to_string()))
        .set_auth_uri(AuthUrl::new(secret.auth_uri().to_string()).context("Invalid auth_uri")?)
        .set_token_uri(TokenUrl::new(secret.token_uri().to_string()).context("Invalid token_uri")?)
        .set_revocation_url(
            RevocationUrl::new(REVOCATION_URL.to_string()).context("Invalid revocation URL")?,
        )
        .set_redirect_uri(
            RedirectUrl::new(format!("http://localhost:{OAUTH_CALLBACK_PORT}"))
                .context("Invalid redirect URL")?,
        ))
}

fn http_client() -> Res<reqwest::Client> {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .context("Unable to create the HTTP client")
}

fn expiry(expires_in: Option<Duration>) -> DateTime<Utc> {
    let secs = expires_in.map(|d| d.as_secs()).unwrap_or(3600);
    Utc::now() + chrono::Duration::seconds(secs as i64)
}

/// Serves HTTP on `listener` until a request arrives carrying either an authorization code or an
/// OAuth error. Other requests, such as for a favicon, get a 404.
async fn wait_for_redirect(listener: TcpListener) -> Res<(String, String)> {
    let (tx, mut rx) = mpsc::channel::<Res<(String, String)>>(1);
    loop {
        tokio::select! {
            received = rx.recv() => {
                return received.context("The OAuth callback server stopped unexpectedly")?;
            }
            accepted = listener.accept() => {
                let (stream, _) = accepted.context("Failed to accept the OAuth callback")?;
                let tx = tx.clone();
                tokio::spawn(async move {
                    let service = service_fn(move |req: Request<Incoming>| {
                        let tx = tx.clone();
                        async move { Ok::<_, Infallible>(handle_redirect(req, tx).await) }
                    });
                    if let Err(e) = http1::Builder::new()
                        .serve_connection(TokioIo::new(stream), service)
                        .await
                    {
                        debug!("OAuth callback connection error: {e}");
                    }
                });
            }
        }
    }
}

async fn handle_redirect(
    req: Request<Incoming>,
    tx: mpsc::Sender<Res<(String, String)>>,
) -> Response<String> {
    let Some(outcome) = parse_redirect(&req.uri().to_string()) else {
        return respond(StatusCode::NOT_FOUND, "Not found");
    };
    let response = match &outcome {
        Ok(_) => respond(
            StatusCode::OK,
            "fintrack is authorized. You can close this window.",
        ),
        Err(_) => respond(
            StatusCode::BAD_REQUEST,
            "Authorization failed. Check the fintrack logs.",
        ),
    };
    let _ = tx.send(outcome).await;
    response
}

fn respond(status: StatusCode, body: &str) -> Response<String> {
    let mut response = Response::new(body.to_string());
    *response.status_mut() = status;
    response
}

/// Pulls `code` and `state`, or `error`, out of the redirect's query string. Returns `None` when
/// the request is not an OAuth redirect.
fn parse_redirect(path_and_query: &str) -> Option<Res<(String, String)>> {
    let url = Url::parse(&format!("http://localhost{path_and_query}")).ok()?;
    let mut code = None;
    let mut state = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.to_string()),
            "state" => state = Some(value.to_string()),
            "error" => return Some(Err(anyhow!("Google denied the authorization: {value}"))),
            _ => {}
        }
    }
    let code = code?;
    Some(Ok((code, state.unwrap_or_default())))
}

#[test]
fn test_parse_redirect_code() {
    let (code, state) = parse_redirect("/?state=abc&code=4%2F0xyz&scope=x")
        .unwrap()
        .unwrap();
    assert_eq!(code, "4/0xyz");
    assert_eq!(state, "abc");
}

#[test]
fn test_parse_redirect_error() {
    let outcome = parse_redirect("/?error=access_denied&state=abc").unwrap();
    assert!(outcome.unwrap_err().to_string().contains("access_denied"));
}

#[test]
fn test_parse_redirect_ignores_other_requests() {
    assert!(parse_redirect("/favicon.ico").is_none());
}
