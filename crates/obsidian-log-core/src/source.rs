//! Content source selection: remote mirror or local directory.

use serde::Serialize;

use crate::{AppConfig, RepoLocation};

/// Where content should be read from for a given configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentSourceDecision {
    pub use_remote: bool,
    pub remote_location: Option<RepoLocation>,
}

impl ContentSourceDecision {
    /// Read from the local content directory.
    pub fn local() -> Self {
        Self {
            use_remote: false,
            remote_location: None,
        }
    }
}

/// Decide the content source for `config`.
///
/// A non-empty, well-formed repository URL selects the remote mirror.
pub fn decide(config: &AppConfig) -> ContentSourceDecision {
    match config.repo_location() {
        Some(location) => ContentSourceDecision {
            use_remote: true,
            remote_location: Some(location),
        },
        None => ContentSourceDecision::local(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_url(url: &str) -> AppConfig {
        AppConfig {
            repository_url: url.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_decide_remote() {
        let decision = decide(&with_url("https://github.com/alice/notes"));
        assert!(decision.use_remote);
        assert_eq!(
            decision.remote_location,
            Some(RepoLocation {
                owner: "alice".into(),
                repo: "notes".into()
            })
        );
    }

    #[test]
    fn test_decide_local_when_empty() {
        assert_eq!(decide(&AppConfig::default()), ContentSourceDecision::local());
    }

    #[test]
    fn test_decide_local_when_malformed() {
        let decision = decide(&with_url("not a url"));
        assert!(!decision.use_remote);
        assert!(decision.remote_location.is_none());
    }
}
