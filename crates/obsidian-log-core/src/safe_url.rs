//! URL safety classification for rendered links and images.
//!
//! Every `href` and `src` that ends up in rendered HTML passes through one of
//! these predicates first.

/// Transparent 1x1 GIF used in place of an unsafe image source.
pub const TRANSPARENT_GIF: &str =
    "data:image/gif;base64,R0lGODlhAQABAIAAAAAAAP///yH5BAEAAAAALAAAAAABAAEAAAIBRAA7";

/// Route that serves images from the mirror repository.
pub const BLOG_ASSET_PROXY_PATH: &str = "/api/blog-assets/proxy";

const RAW_GITHUB_PREFIX: &str = "https://raw.githubusercontent.com/";

const BLOCKED_SCHEMES: &[&str] = &["javascript:", "vbscript:", "file:"];

fn normalized(url: &str) -> Option<String> {
    let url = url.trim().to_ascii_lowercase();
    if url.is_empty() || BLOCKED_SCHEMES.iter().any(|s| url.starts_with(s)) {
        return None;
    }
    Some(url)
}

fn is_http(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Whether `url` may be used as a hyperlink target. Only `http(s)` passes.
pub fn is_safe_for_link(url: &str) -> bool {
    normalized(url).is_some_and(|url| is_http(&url))
}

/// Whether `url` may be used as an image source: `http(s)` or an inline
/// `data:image/` payload.
pub fn is_safe_for_image(url: &str) -> bool {
    normalized(url).is_some_and(|url| {
        if url.starts_with("data:") {
            return url.starts_with("data:image/");
        }
        is_http(&url)
    })
}

/// Rewrite an image source found in a blog post.
///
/// Unsafe sources become [`TRANSPARENT_GIF`], raw GitHub content goes through
/// the asset proxy (so private mirrors still render), and sources containing
/// spaces or non-ASCII characters are percent-encoded.
pub fn blog_image_src(src: &str) -> String {
    let src = src.trim();
    if src.is_empty() {
        return TRANSPARENT_GIF.to_string();
    }

    // Relative paths are served by the page's own origin. `//host` and
    // `\\host` name another origin and must pass the image filter.
    let is_relative = !src.contains(':')
        && !src.starts_with("//")
        && !src.starts_with('\\')
        && !src.starts_with("/\\");
    if !is_relative && !is_safe_for_image(src) {
        return TRANSPARENT_GIF.to_string();
    }

    if src.starts_with(RAW_GITHUB_PREFIX) {
        let encoded: String = url::form_urlencoded::byte_serialize(src.as_bytes()).collect();
        return format!("{BLOG_ASSET_PROXY_PATH}?url={encoded}");
    }

    if src.chars().any(|c| c == ' ' || !c.is_ascii()) {
        return encode_unsafe_chars(src);
    }

    src.to_string()
}

/// Percent-encode spaces and non-ASCII characters, leaving URL syntax intact.
fn encode_unsafe_chars(src: &str) -> String {
    let mut out = String::with_capacity(src.len());
    for c in src.chars() {
        if c == ' ' || !c.is_ascii() {
            let mut buf = [0u8; 4];
            for byte in c.encode_utf8(&mut buf).bytes() {
                out.push_str(&format!("%{byte:02X}"));
            }
        } else {
            out.push(c);
        }
    }
    out
}
