//! Input validation for admin writes.
//!
//! Messages in returned errors are shown to the admin as-is.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::config::is_valid_repo_url;
use crate::{Error, Result};

pub const REPO_URL_MAX: usize = 500;
pub const DISPLAY_USERNAME_MAX: usize = 50;
pub const ADMINS_MAX: usize = 100;
pub const TITLE_MAX: usize = 200;
pub const DESCRIPTION_MAX: usize = 2000;

static SLUG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("slug regex should compile"));
static DISPLAY_USERNAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9_-]*$").expect("display username regex should compile")
});

pub fn is_valid_slug(slug: &str) -> bool {
    SLUG_REGEX.is_match(slug)
}

pub fn validate_slug(slug: &str) -> Result<()> {
    if is_valid_slug(slug) {
        Ok(())
    } else {
        Err(Error::invalid(
            "slug",
            "Slug may only contain letters, digits, '-' and '_'",
        ))
    }
}

/// An empty URL is allowed here; whether a URL is required is decided by
/// the caller.
pub fn validate_repo_url(url: &str) -> Result<()> {
    let url = url.trim();
    if url.is_empty() {
        return Ok(());
    }
    if url.chars().count() > REPO_URL_MAX {
        return Err(Error::invalid(
            "github_repo_url",
            format!("Repository URL must be at most {REPO_URL_MAX} characters"),
        ));
    }
    if !is_valid_repo_url(url) {
        return Err(Error::invalid(
            "github_repo_url",
            "Repository URL must look like https://github.com/owner/repo",
        ));
    }
    Ok(())
}

pub fn validate_display_username(name: &str) -> Result<()> {
    if name.chars().count() > DISPLAY_USERNAME_MAX {
        return Err(Error::invalid(
            "zenn_username",
            format!("Username must be at most {DISPLAY_USERNAME_MAX} characters"),
        ));
    }
    if !DISPLAY_USERNAME_REGEX.is_match(name) {
        return Err(Error::invalid(
            "zenn_username",
            "Username may only contain lowercase letters, digits, '-' and '_'",
        ));
    }
    Ok(())
}

/// Keep string entries only, trimmed and non-empty.
pub fn normalize_admins(entries: &[Value]) -> Result<Vec<String>> {
    let admins: Vec<String> = entries
        .iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string)
        .collect();

    if admins.len() > ADMINS_MAX {
        return Err(Error::invalid(
            "admins",
            format!("At most {ADMINS_MAX} admins are allowed"),
        ));
    }
    Ok(admins)
}

pub fn validate_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(Error::invalid("title", "Title is required"));
    }
    if title.chars().count() > TITLE_MAX {
        return Err(Error::invalid(
            "title",
            format!("Title must be at most {TITLE_MAX} characters"),
        ));
    }
    Ok(())
}

pub fn validate_description(description: &str) -> Result<()> {
    if description.chars().count() > DESCRIPTION_MAX {
        return Err(Error::invalid(
            "description",
            format!("Description must be at most {DESCRIPTION_MAX} characters"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_slug() {
        assert!(validate_slug("hello-world_2").is_ok());
        assert!(validate_slug("").is_err());
        assert!(validate_slug("../etc").is_err());
        assert!(validate_slug("with space").is_err());
    }

    #[test]
    fn test_repo_url() {
        assert!(validate_repo_url("").is_ok());
        assert!(validate_repo_url("https://github.com/a/b").is_ok());
        assert!(validate_repo_url("github.com/a/b").is_err());

        let long = format!("https://github.com/a/{}", "b".repeat(REPO_URL_MAX));
        let err = validate_repo_url(&long).unwrap_err();
        assert!(err.user_message().contains("500"));
    }

    #[test]
    fn test_display_username() {
        assert!(validate_display_username("").is_ok());
        assert!(validate_display_username("my_name-1").is_ok());
        assert!(validate_display_username("MyName").is_err());
        assert!(validate_display_username(&"a".repeat(51)).is_err());
    }

    #[test]
    fn test_normalize_admins() {
        let admins = normalize_admins(&[json!(" alice "), json!(3), json!(""), json!("bob")]).unwrap();
        assert_eq!(admins, vec!["alice", "bob"]);

        let many: Vec<Value> = (0..=ADMINS_MAX).map(|i| json!(format!("u{i}"))).collect();
        assert!(normalize_admins(&many).is_err());
    }

    #[test]
    fn test_title_and_description() {
        assert!(validate_title("ok").is_ok());
        assert!(validate_title("  ").is_err());
        assert!(validate_title(&"é".repeat(TITLE_MAX)).is_ok());
        assert!(validate_title(&"é".repeat(TITLE_MAX + 1)).is_err());
        assert!(validate_description(&"d".repeat(DESCRIPTION_MAX)).is_ok());
        assert!(validate_description(&"d".repeat(DESCRIPTION_MAX + 1)).is_err());
    }
}
