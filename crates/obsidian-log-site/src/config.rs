//! Application configuration loaded from environment variables.

use std::path::PathBuf;

use obsidian_log_core::is_valid_repo_url;

/// Identity provider / content store connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupabaseConfig {
    /// Project URL, without trailing slash.
    pub url: String,
    /// Public (anon) API key.
    pub anon_key: String,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (e.g., "0.0.0.0:3000").
    pub bind_addr: String,

    /// Public base URL of the site, used for canonical links and sign-in
    /// redirects.
    pub base_url: String,

    /// Local content root (articles/, scraps/, blog/, .obsidian-log/).
    pub content_dir: PathBuf,

    /// Repository URL override. May be empty or malformed; consumers check.
    pub github_repo_url: String,

    /// Credential for private reads and config/blog commits.
    pub github_token: Option<String>,

    /// GitHub REST API base URL.
    pub github_api_url: String,

    /// Identity provider and content store. `None` disables sign-in and tasks.
    pub supabase: Option<SupabaseConfig>,
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// All variables are optional:
    /// - `OBSIDIAN_LOG_BIND_ADDR`: Server bind address (default: "0.0.0.0:3000")
    /// - `OBSIDIAN_LOG_BASE_URL`: Public base URL (default: "http://localhost:3000")
    /// - `CONTENT_DIR`: Local content root (default: "content")
    /// - `GITHUB_REPO_URL`: Repository to mirror content and config from
    /// - `GITHUB_TOKEN`: GitHub credential
    /// - `GITHUB_API_URL`: GitHub API base (default: "https://api.github.com")
    /// - `SUPABASE_URL`, `SUPABASE_ANON_KEY`: Identity provider and store (both required to enable)
    pub fn from_env() -> anyhow::Result<Self> {
        let bind_addr = std::env::var("OBSIDIAN_LOG_BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let base_url = std::env::var("OBSIDIAN_LOG_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .trim_end_matches('/')
            .to_string();

        let content_dir =
            PathBuf::from(std::env::var("CONTENT_DIR").unwrap_or_else(|_| "content".to_string()));

        let github_repo_url = non_empty_var("GITHUB_REPO_URL").unwrap_or_default();
        let github_token = non_empty_var("GITHUB_TOKEN");

        let github_api_url = std::env::var("GITHUB_API_URL")
            .unwrap_or_else(|_| "https://api.github.com".to_string())
            .trim_end_matches('/')
            .to_string();

        let supabase = match (non_empty_var("SUPABASE_URL"), non_empty_var("SUPABASE_ANON_KEY")) {
            (Some(url), Some(anon_key)) => Some(SupabaseConfig {
                url: url.trim_end_matches('/').to_string(),
                anon_key,
            }),
            (Some(_), None) | (None, Some(_)) => {
                tracing::warn!("SUPABASE_URL and SUPABASE_ANON_KEY must both be set; sign-in disabled");
                None
            }
            (None, None) => None,
        };

        if !github_repo_url.is_empty() && !is_valid_repo_url(&github_repo_url) {
            tracing::warn!(url = %github_repo_url, "GITHUB_REPO_URL is not a valid repository URL");
        }

        tracing::info!(
            bind_addr = %bind_addr,
            base_url = %base_url,
            content_dir = %content_dir.display(),
            github_repo_url = %github_repo_url,
            github_token = github_token.is_some(),
            supabase = supabase.is_some(),
            "site configuration loaded"
        );

        Ok(Self {
            bind_addr,
            base_url,
            content_dir,
            github_repo_url,
            github_token,
            github_api_url,
            supabase,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Mutex to serialize config tests that manipulate env vars.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const ENV_KEYS: &[&str] = &[
        "OBSIDIAN_LOG_BIND_ADDR",
        "OBSIDIAN_LOG_BASE_URL",
        "CONTENT_DIR",
        "GITHUB_REPO_URL",
        "GITHUB_TOKEN",
        "GITHUB_API_URL",
        "SUPABASE_URL",
        "SUPABASE_ANON_KEY",
    ];

    /// Run `f` with only `vars` set among [`ENV_KEYS`].
    fn with_env_vars<F: FnOnce()>(vars: &[(&str, &str)], f: F) {
        let _guard = ENV_MUTEX.lock().unwrap();

        let saved: Vec<_> = ENV_KEYS
            .iter()
            .map(|k| (*k, std::env::var(k).ok()))
            .collect();

        // SAFETY: Serialized by mutex; only test code touches these vars.
        unsafe {
            for k in ENV_KEYS {
                std::env::remove_var(k);
            }
            for (k, v) in vars {
                std::env::set_var(k, v);
            }
        }

        f();

        // SAFETY: Restoring original env state.
        unsafe {
            for (k, v) in &saved {
                match v {
                    Some(val) => std::env::set_var(k, val),
                    None => std::env::remove_var(k),
                }
            }
        }
    }

    #[test]
    fn config_defaults() {
        with_env_vars(&[], || {
            let config = Config::from_env().unwrap();
            assert_eq!(config.bind_addr, "0.0.0.0:3000");
            assert_eq!(config.base_url, "http://localhost:3000");
            assert_eq!(config.content_dir, PathBuf::from("content"));
            assert_eq!(config.github_repo_url, "");
            assert_eq!(config.github_token, None);
            assert_eq!(config.github_api_url, "https://api.github.com");
            assert!(config.supabase.is_none());
        });
    }

    #[test]
    fn config_custom_values() {
        with_env_vars(
            &[
                ("OBSIDIAN_LOG_BIND_ADDR", "127.0.0.1:8080"),
                ("OBSIDIAN_LOG_BASE_URL", "https://log.example.com/"),
                ("CONTENT_DIR", "/srv/content"),
                ("GITHUB_REPO_URL", " https://github.com/alice/notes "),
                ("GITHUB_TOKEN", "ghp_x"),
                ("GITHUB_API_URL", "https://ghe.example.com/api/v3/"),
                ("SUPABASE_URL", "https://proj.supabase.co/"),
                ("SUPABASE_ANON_KEY", "anon"),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.bind_addr, "127.0.0.1:8080");
                assert_eq!(config.base_url, "https://log.example.com");
                assert_eq!(config.content_dir, PathBuf::from("/srv/content"));
                assert_eq!(config.github_repo_url, "https://github.com/alice/notes");
                assert_eq!(config.github_token.as_deref(), Some("ghp_x"));
                assert_eq!(config.github_api_url, "https://ghe.example.com/api/v3");
                assert_eq!(
                    config.supabase,
                    Some(SupabaseConfig {
                        url: "https://proj.supabase.co".into(),
                        anon_key: "anon".into(),
                    })
                );
            },
        );
    }

    #[test]
    fn config_blank_token_is_none() {
        with_env_vars(&[("GITHUB_TOKEN", "   ")], || {
            let config = Config::from_env().unwrap();
            assert!(config.github_token.is_none());
        });
    }

    #[test]
    fn config_partial_supabase_disabled() {
        with_env_vars(&[("SUPABASE_URL", "https://proj.supabase.co")], || {
            let config = Config::from_env().unwrap();
            assert!(config.supabase.is_none());
        });
    }

    #[test]
    fn config_invalid_repo_url_is_kept_verbatim() {
        with_env_vars(&[("GITHUB_REPO_URL", "not-a-url")], || {
            let config = Config::from_env().unwrap();
            assert_eq!(config.github_repo_url, "not-a-url");
        });
    }
}
