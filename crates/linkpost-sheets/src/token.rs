use crate::{Result, ServiceAccountKey};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tokio::sync::Mutex;

/// Refresh this long before the token actually expires
const EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    3600
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_MARGIN_SECS) < self.expires_at
    }
}

/// Exchanges a service-account assertion for bearer tokens and caches them
pub struct TokenProvider {
    key: ServiceAccountKey,
    scope: String,
    client: reqwest::Client,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    pub fn new(key: ServiceAccountKey, scope: &str, client: reqwest::Client) -> Self {
        Self {
            key,
            scope: scope.to_string(),
            client,
            cached: Mutex::new(None),
        }
    }

    /// Return a valid access token, fetching a new one when the cache is stale
    pub async fn access_token(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;
        let now = Utc::now();

        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(now)) {
            return Ok(token.value.clone());
        }

        tracing::debug!(
            "Requesting access token for {} from {}",
            self.key.client_email,
            self.key.token_uri
        );

        let assertion = self.key.assertion(&self.scope, now.timestamp())?;
        let resp = self
            .client
            .post(&self.key.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await?;

        let body: TokenResponse = crate::client::read_json(resp).await?;
        let token = CachedToken {
            value: body.access_token,
            expires_at: now + Duration::seconds(body.expires_in),
        };
        tracing::debug!("Access token valid until {}", token.expires_at);

        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_freshness_respects_margin() {
        let now = Utc::now();
        let token = CachedToken {
            value: "ya29.token".to_string(),
            expires_at: now + Duration::seconds(3600),
        };
        assert!(token.is_fresh(now));
        assert!(!token.is_fresh(now + Duration::seconds(3550)));
        assert!(!token.is_fresh(now + Duration::seconds(4000)));
    }

    #[test]
    fn test_token_response_defaults_expiry() {
        let body: TokenResponse =
            serde_json::from_str(r#"{"access_token": "ya29.token", "token_type": "Bearer"}"#)
                .unwrap();
        assert_eq!(body.access_token, "ya29.token");
        assert_eq!(body.expires_in, 3600);
    }
}
