use anyhow::Context;
use serde::Deserialize;

/// Long-lived OAuth credentials for the Google APIs (calendar, mail).
/// Obtained once through the consent flow; only the refresh token is stored.
#[derive(Clone, Debug)]
pub struct GoogleCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl GoogleCredentials {
    /// Exchange the refresh token for a short-lived access token.
    pub async fn fetch_access_token(&self, client: &reqwest::Client) -> anyhow::Result<String> {
        let resp = client
            .post("https://oauth2.googleapis.com/token")
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", self.refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .context("failed to call Google token endpoint")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Google token endpoint error ({status}): {body}");
        }

        let token: TokenResponse = resp
            .json()
            .await
            .context("failed to parse Google token response")?;

        Ok(token.access_token)
    }
}
