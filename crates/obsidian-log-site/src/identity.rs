//! Identity provider (Supabase Auth) for GitHub OAuth sign-in.
//!
//! The site never handles the OAuth exchange itself: it redirects to the
//! provider's authorize endpoint and later resolves access tokens to an
//! [`Identity`].

use std::time::Duration;

use async_trait::async_trait;
use obsidian_log_core::Identity;
use serde_json::Value;

use crate::config::SupabaseConfig;
use crate::error::SiteError;

const AUTH_TIMEOUT: Duration = Duration::from_secs(10);

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// URL that starts GitHub sign-in and returns to `redirect_to`.
    fn sign_in_url(&self, redirect_to: &str) -> String;

    /// Revoke the session behind `access_token`.
    async fn sign_out(&self, access_token: &str) -> Result<(), SiteError>;

    /// Resolve an access token. `None` for invalid or expired tokens and
    /// provider failures.
    async fn get_user(&self, access_token: &str) -> Option<Identity>;
}

/// Supabase Auth over its REST endpoints.
pub struct SupabaseAuth {
    http: reqwest::Client,
    url: String,
    anon_key: String,
}

impl SupabaseAuth {
    pub fn new(config: &SupabaseConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(AUTH_TIMEOUT).build()?;
        Ok(Self {
            http,
            url: config.url.clone(),
            anon_key: config.anon_key.clone(),
        })
    }
}

#[async_trait]
impl IdentityProvider for SupabaseAuth {
    fn sign_in_url(&self, redirect_to: &str) -> String {
        let query: String = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("provider", "github")
            .append_pair("redirect_to", redirect_to)
            .finish();
        format!("{}/auth/v1/authorize?{query}", self.url)
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), SiteError> {
        let response = self
            .http
            .post(format!("{}/auth/v1/logout", self.url))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| SiteError::Upstream(format!("sign-out request failed: {e}")))?;

        // An already-expired session is as good as signed out.
        if response.status().is_success() || response.status().as_u16() == 401 {
            Ok(())
        } else {
            Err(SiteError::Upstream(format!(
                "sign-out returned {}",
                response.status()
            )))
        }
    }

    async fn get_user(&self, access_token: &str) -> Option<Identity> {
        let response = self
            .http
            .get(format!("{}/auth/v1/user", self.url))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await;

        let response = match response {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                tracing::debug!(status = %r.status(), "access token rejected");
                return None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "identity provider unreachable");
                return None;
            }
        };

        let user: Value = match response.json().await {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!(error = %e, "malformed user response");
                return None;
            }
        };

        let identity = Identity::from_provider_user(&user);
        if identity.is_none() {
            tracing::warn!("user response without an id");
        }
        identity
    }
}
