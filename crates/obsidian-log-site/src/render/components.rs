//! Shared HTML components used across all site pages.

use maud::{DOCTYPE, Markup, PreEscaped, html};
use obsidian_log_core::{AppConfig, ContentKind, Entry, is_safe_for_image};

/// Inline CSS for all site pages.
pub const PAGE_CSS: &str = r#"
*{margin:0;padding:0;box-sizing:border-box}
:root{--bg:#fafafa;--fg:#111;--fg2:#555;--fg3:#999;--accent:#6d28d9;--accent-hover:#5b21b6;--surface:#fff;--border:rgba(109,40,217,.15);--mono:"SF Mono",SFMono-Regular,ui-monospace,Menlo,monospace}
body{font-family:Inter,-apple-system,BlinkMacSystemFont,"Segoe UI",Roboto,sans-serif;line-height:1.6;color:var(--fg);background:var(--bg);min-height:100vh;display:flex;flex-direction:column;align-items:center;padding:1.5rem 1rem}
main{max-width:720px;width:100%;flex:1}
a{color:var(--accent);text-decoration:none}
a:hover{text-decoration:underline}
img{max-width:100%;height:auto}

.site-header{max-width:720px;width:100%;margin-bottom:2rem}
.site-title{font-size:1.5rem;font-weight:700;color:var(--fg);letter-spacing:-.02em}
.site-subtitle{color:var(--fg3);font-size:.95rem}
.site-nav{display:flex;gap:1.25rem;margin-top:.75rem;font-size:.95rem}

.section{margin-bottom:2.5rem}
.section-title{font-size:1.1rem;font-weight:700;margin-bottom:.75rem;display:flex;justify-content:space-between;align-items:baseline}
.section-title a{font-size:.85rem;font-weight:400}

.entry-list{list-style:none}
.entry-item{padding:.85rem 0;border-bottom:1px solid var(--border)}
.entry-item:last-child{border-bottom:none}
.entry-title{font-weight:600;font-size:1.05rem;color:var(--fg)}
.entry-emoji{margin-right:.35rem}
.entry-meta{font-size:.8rem;color:var(--fg3);display:flex;gap:.75rem;flex-wrap:wrap;margin-top:.15rem}
.entry-preview{color:var(--fg2);font-size:.95rem;margin-top:.25rem}
.empty{color:var(--fg3);font-style:italic}

.tag{display:inline-block;font-size:.75rem;padding:.1rem .55rem;border-radius:100px;border:1px solid var(--border);color:var(--fg2)}
.tag.active{background:var(--accent);color:#fff;border-color:var(--accent)}
.tag-bar{display:flex;flex-wrap:wrap;gap:.4rem;margin:.75rem 0 1.25rem}

.search{display:flex;gap:.5rem;margin-bottom:.5rem}
.search input{flex:1;padding:.45rem .75rem;border:1px solid var(--border);border-radius:6px;font:inherit;background:var(--surface);color:var(--fg)}
.search button{padding:.45rem 1rem;border:none;border-radius:6px;background:var(--accent);color:#fff;font:inherit;cursor:pointer}

.entry-header{margin-bottom:1.5rem}
.entry-header h1{font-size:1.75rem;line-height:1.3;letter-spacing:-.01em}
.entry-content{font-size:1.05rem;line-height:1.8}
.entry-content h1,.entry-content h2,.entry-content h3,.entry-content h4{font-weight:700;margin:1.5rem 0 .75rem;letter-spacing:-.01em}
.entry-content h1{font-size:1.4rem}
.entry-content h2{font-size:1.25rem}
.entry-content h3{font-size:1.1rem}
.entry-content p{margin:.75rem 0}
.entry-content ul,.entry-content ol{margin:.75rem 0;padding-left:1.5rem}
.entry-content blockquote{border-left:3px solid var(--border);padding:.5rem 0 .5rem 1rem;margin:.75rem 0;color:var(--fg2)}
.entry-content pre{background:var(--surface);border:1px solid var(--border);border-radius:6px;padding:.75rem 1rem;overflow-x:auto;margin:.75rem 0;font-size:.85rem;line-height:1.5}
.entry-content code{font-family:var(--mono);font-size:.88em}
.entry-content img{border-radius:6px;margin:.75rem 0}
.entry-content table{border-collapse:collapse;width:100%;margin:.75rem 0;font-size:.9rem}
.entry-content th,.entry-content td{border:1px solid var(--border);padding:.4rem .75rem;text-align:left}

.link-card{display:flex;gap:1rem;align-items:center;justify-content:space-between;border:1px solid var(--border);border-radius:8px;padding:.85rem 1rem;margin:.75rem 0;color:var(--fg);transition:border-color .15s}
.link-card:hover{border-color:var(--accent);text-decoration:none}
.link-card-body{min-width:0}
.link-card-title{font-weight:600;overflow:hidden;text-overflow:ellipsis;white-space:nowrap}
.link-card-host{font-size:.8rem;color:var(--fg3)}
.link-card-image{width:120px;height:63px;object-fit:cover;border-radius:4px;flex-shrink:0;margin:0}
.link-card-text{display:block;margin:.75rem 0;color:var(--fg2);word-break:break-all}

.task-summary{display:flex;gap:1.25rem;font-size:.9rem;color:var(--fg2);margin-bottom:.5rem}
.progress{height:6px;border-radius:3px;background:var(--border);overflow:hidden;margin-bottom:1.5rem}
.progress-bar{height:100%;background:var(--accent)}
.task-status{font-size:.75rem;font-weight:600;text-transform:uppercase;letter-spacing:.03em;margin-right:.5rem}
.task-status.todo{color:var(--fg3)}
.task-status.doing{color:#d97706}
.task-status.done{color:#059669}
.task-description{color:var(--fg2);font-size:.9rem;margin-top:.2rem}

.footer{text-align:center;margin-top:2rem;padding-top:.75rem;font-size:.8rem;color:var(--fg3);width:100%;max-width:720px;display:flex;align-items:center;justify-content:center;gap:.5rem}
.footer img{width:24px;height:24px;border-radius:50%}

@media(prefers-color-scheme:dark){
:root{--bg:#0a0a0f;--fg:#e5e5e5;--fg2:#a0a0a0;--fg3:#666;--accent:#a78bfa;--accent-hover:#c4b5fd;--surface:#111118;--border:rgba(167,139,250,.2)}
}
"#;

/// Inline CSS for error pages.
pub const ERROR_CSS: &str = r#"
*{margin:0;padding:0;box-sizing:border-box}
body{font-family:-apple-system,BlinkMacSystemFont,"Segoe UI",Roboto,sans-serif;display:flex;justify-content:center;align-items:center;min-height:100vh;background:#fafafa;color:#1a1a2e;padding:1rem}
.error-page{text-align:center;max-width:400px}
.error-page h1{font-size:1.5rem;margin-bottom:.75rem}
.error-page p{color:#666;margin-bottom:1rem;line-height:1.5}
.error-page a{color:#6d28d9}
@media(prefers-color-scheme:dark){
body{background:#0f0f17;color:#e0e0e8}
.error-page p{color:#aaa}
.error-page a{color:#a78bfa}
}
"#;

/// Content-Security-Policy header value.
///
/// No scripts at all. Images may come from anywhere the URL safety filter
/// lets through, plus the same-origin asset proxy. Forms only post back to
/// the site (search, sign-out).
pub const CSP_HEADER: &str = "default-src 'none'; style-src 'unsafe-inline'; img-src 'self' https: http: data:; connect-src 'self'; form-action 'self'; frame-ancestors 'none'; base-uri 'none'";

/// Render the full HTML page shell with site header, navigation and footer.
pub fn page_shell(
    title: &str,
    description: &str,
    canonical_url: &str,
    config: &AppConfig,
    body_content: Markup,
) -> Markup {
    let site_title = config.title();
    let full_title = if title == site_title {
        title.to_string()
    } else {
        format!("{title} - {site_title}")
    };

    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (full_title) }
                meta name="description" content=(description);
                link rel="canonical" href=(canonical_url);

                meta property="og:title" content=(title);
                meta property="og:description" content=(description);
                meta property="og:url" content=(canonical_url);
                meta property="og:site_name" content=(site_title);
                meta property="og:type" content="website";

                style { (PreEscaped(PAGE_CSS)) }
            }
            body {
                (site_header(config))
                main { (body_content) }
                (footer(config))
            }
        }
    }
}

fn site_header(config: &AppConfig) -> Markup {
    html! {
        header class="site-header" {
            a class="site-title" href="/" { (config.title()) }
            p class="site-subtitle" { (config.subtitle()) }
            nav class="site-nav" {
                @for kind in ContentKind::ALL {
                    a href=(kind.route()) { (kind.label()) }
                }
                a href="/tasks" { "Tasks" }
            }
        }
    }
}

fn footer(config: &AppConfig) -> Markup {
    let author = config.author_name.trim();
    let username = config.display_username.trim();
    let icon = config.author_icon.trim();

    html! {
        footer class="footer" {
            @if !icon.is_empty() && is_safe_for_image(icon) {
                img src=(icon) alt="" loading="lazy";
            }
            @if !author.is_empty() {
                span { (author) }
            }
            @if !username.is_empty() {
                a href=(format!("https://zenn.dev/{username}")) rel="noopener noreferrer" { "@" (username) }
            }
        }
    }
}

/// Date and tags line for an entry.
pub fn entry_meta(entry: &Entry) -> Markup {
    html! {
        div class="entry-meta" {
            @if let Some(date) = entry.created_date() {
                time datetime=(date) { (date) }
            }
            @for tag in &entry.tags {
                span class="tag" { (tag) }
            }
        }
    }
}

/// Link to an entry's page.
pub fn entry_href(entry: &Entry) -> String {
    format!("{}/{}", entry.kind.route(), entry.slug)
}

/// Title with its emoji, if any.
pub fn entry_title(entry: &Entry) -> Markup {
    html! {
        @if let Some(emoji) = &entry.emoji {
            span class="entry-emoji" { (emoji) }
        }
        (entry.title)
    }
}
