//! Authenticated identities and admin membership.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::AppConfig;

/// Metadata keys the identity provider may use for the GitHub login name,
/// in order of preference.
const USERNAME_KEYS: &[&str] = &["user_name", "user_login", "login", "preferred_username"];

/// A signed-in user as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub provider_username: Option<String>,
}

impl Identity {
    /// Build an identity from the provider's user object.
    ///
    /// Expects a top-level string `id`; the username is taken from
    /// `user_metadata`. Returns `None` if there is no usable id.
    pub fn from_provider_user(user: &Value) -> Option<Self> {
        let id = user.get("id").and_then(Value::as_str)?.trim();
        if id.is_empty() {
            return None;
        }

        let metadata = user.get("user_metadata");
        let provider_username = USERNAME_KEYS
            .iter()
            .filter_map(|key| metadata?.get(*key)?.as_str())
            .map(str::trim)
            .find(|name| !name.is_empty())
            .map(str::to_string);

        Some(Self {
            id: id.to_string(),
            provider_username,
        })
    }
}

/// Whether `identity` is listed in the config's admin identities.
///
/// Comparison is on the trimmed, lowercased provider username. An empty
/// admin list or a missing username always yields `false`.
pub fn is_admin(identity: &Identity, config: &AppConfig) -> bool {
    identity
        .provider_username
        .as_deref()
        .is_some_and(|name| is_admin_username(name, &config.admin_identities))
}

/// Case-insensitive membership test of `username` in `admins`.
pub fn is_admin_username(username: &str, admins: &[String]) -> bool {
    let username = username.trim().to_lowercase();
    if username.is_empty() {
        return false;
    }
    admins
        .iter()
        .any(|admin| admin.trim().to_lowercase() == username)
}
