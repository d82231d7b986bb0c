//! OAuth2 password grant against wallabag's `/oauth/v2/token`.

use reqwest::Client;

use super::error::RemoteError;
use super::responses::TokenResponse;

/// API client registration plus the account it acts for.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Exchange the credentials for an access token.
pub async fn request_token(
    http: &Client,
    server_url: &str,
    credentials: &Credentials,
) -> Result<String, RemoteError> {
    let url = format!("{}/oauth/v2/token", server_url);
    let form = [
        ("grant_type", "password"),
        ("client_id", credentials.client_id.as_str()),
        ("client_secret", credentials.client_secret.as_str()),
        ("username", credentials.username.as_str()),
        ("password", credentials.password.as_str()),
    ];

    tracing::debug!(username = %credentials.username, "Requesting access token");
    let response = http
        .post(&url)
        .form(&form)
        .send()
        .await
        .map_err(|source| RemoteError::Http {
            url: url.clone(),
            source,
        })?;

    let status = response.status();
    let body = response.bytes().await.map_err(|source| RemoteError::Http {
        url: url.clone(),
        source,
    })?;

    if !status.is_success() {
        return Err(RemoteError::Auth {
            status: status.as_u16(),
            message: String::from_utf8_lossy(&body).trim().to_string(),
        });
    }

    let token: TokenResponse =
        serde_json::from_slice(&body).map_err(|source| RemoteError::Json { url, source })?;
    tracing::debug!(expires_in = ?token.expires_in, "Access token granted");
    Ok(token.access_token)
}
