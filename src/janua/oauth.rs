//! OAuth2 provider configuration and the two provider HTTP calls.
//!
//! The configuration is an explicit value constructed at process start and
//! handed to the federation handlers; endpoint URLs are overridable so tests
//! can point the flow at a fake provider.

use anyhow::{anyhow, Context, Result};
use base64ct::{Base64UrlUnpadded, Encoding};
use rand::{rngs::OsRng, RngCore};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use url::Url;

use crate::APP_USER_AGENT;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

const SCOPES: &str = "openid email profile";

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub name: String,
    pub client_id: String,
    pub client_secret: SecretString,
    pub redirect_url: String,
    pub auth_url: String,
    pub token_url: String,
    pub userinfo_url: String,
}

impl ProviderConfig {
    #[must_use]
    pub fn google(client_id: String, client_secret: SecretString, redirect_url: String) -> Self {
        Self {
            name: "google".to_string(),
            client_id,
            client_secret,
            redirect_url,
            auth_url: GOOGLE_AUTH_URL.to_string(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
            userinfo_url: GOOGLE_USERINFO_URL.to_string(),
        }
    }

    #[must_use]
    pub fn with_endpoints(
        mut self,
        auth_url: String,
        token_url: String,
        userinfo_url: String,
    ) -> Self {
        self.auth_url = auth_url;
        self.token_url = token_url;
        self.userinfo_url = userinfo_url;
        self
    }

    /// Build the provider authorization URL carrying the CSRF state.
    pub fn authorize_url(&self, state: &str) -> Result<String> {
        let mut url =
            Url::parse(&self.auth_url).context("invalid provider authorization URL")?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", &self.redirect_url)
            .append_pair("response_type", "code")
            .append_pair("scope", SCOPES)
            .append_pair("state", state);
        Ok(url.into())
    }
}

/// Generate the single-use CSRF state value: 32 random bytes, base64.
pub fn generate_state() -> Result<String> {
    let mut bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate oauth state")?;
    Ok(Base64UrlUnpadded::encode_string(&bytes))
}

#[derive(Debug, Deserialize)]
pub struct ProviderToken {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

/// Profile returned by the provider userinfo endpoint.
///
/// `verified_email` defaults to `false`: a provider that omits the field is
/// treated as unverified.
#[derive(Debug, Deserialize)]
pub struct ProviderProfile {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub verified_email: bool,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub picture: String,
}

/// Exchange the authorization code for a provider access token.
pub async fn exchange_code(config: &ProviderConfig, code: &str) -> Result<ProviderToken> {
    let client = Client::builder()
        .user_agent(APP_USER_AGENT)
        .build()
        .context("failed to create http client")?;

    let params = [
        ("grant_type", "authorization_code"),
        ("code", code),
        ("client_id", config.client_id.as_str()),
        ("client_secret", config.client_secret.expose_secret()),
        ("redirect_uri", config.redirect_url.as_str()),
    ];

    let response = client
        .post(&config.token_url)
        .form(&params)
        .send()
        .await
        .context("token exchange request failed")?;

    if !response.status().is_success() {
        return Err(anyhow!("token exchange failed: {}", response.status()));
    }

    response
        .json::<ProviderToken>()
        .await
        .context("failed to parse token response")
}

/// Fetch the federated profile with the exchanged token.
pub async fn fetch_profile(config: &ProviderConfig, access_token: &str) -> Result<ProviderProfile> {
    let client = Client::builder()
        .user_agent(APP_USER_AGENT)
        .build()
        .context("failed to create http client")?;

    let response = client
        .get(&config.userinfo_url)
        .bearer_auth(access_token)
        .send()
        .await
        .context("userinfo request failed")?;

    if !response.status().is_success() {
        return Err(anyhow!("userinfo fetch failed: {}", response.status()));
    }

    response
        .json::<ProviderProfile>()
        .await
        .context("failed to parse userinfo response")
}
