//! Entry bodies: markdown prose interleaved with link cards.

use std::collections::HashMap;

use futures::future::join_all;
use maud::{Markup, PreEscaped, html};
use obsidian_log_core::markdown::render as split_blocks;
use obsidian_log_core::safe_url::blog_image_src;
use obsidian_log_core::{LinkSpan, PageMetadata, RenderBlock, is_safe_for_image, is_safe_for_link};
use pulldown_cmark::{Event, Options, Parser, Tag, html as md_html};

use crate::page_metadata::MetadataSource;

/// Render markdown text to HTML.
///
/// Uses pulldown-cmark with common extensions (tables, footnotes, strikethrough,
/// task lists). Single newlines become `<br>`. Image sources are rewritten
/// with [`blog_image_src`], link targets with a scheme other than `http(s)`
/// become `#`, and raw HTML is emitted as text.
pub fn render_markdown(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(markdown, options).map(|event| match event {
        Event::SoftBreak => Event::HardBreak,
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Image {
            link_type,
            dest_url: blog_image_src(&dest_url).into(),
            title,
            id,
        }),
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) => {
            let dest_url = if is_allowed_href(&dest_url) {
                dest_url
            } else {
                "#".into()
            };
            Event::Start(Tag::Link {
                link_type,
                dest_url,
                title,
                id,
            })
        }
        other => other,
    });

    let mut html_output = String::with_capacity(markdown.len() * 2);
    md_html::push_html(&mut html_output, parser);
    html_output
}

/// Relative and fragment links stay; anything with a scheme must be `http(s)`.
fn is_allowed_href(href: &str) -> bool {
    let href = href.trim();
    if href.starts_with('/') || href.starts_with('#') || href.starts_with('?') {
        return true;
    }
    match href.split_once(':') {
        // A colon after the first path separator isn't a scheme.
        Some((scheme, _)) if !scheme.contains('/') => is_safe_for_link(href),
        _ => true,
    }
}

/// Render an entry body, turning link-only lines into cards.
///
/// Metadata for all cards of the document is fetched concurrently.
pub async fn render_document(raw: &str, metadata: &dyn MetadataSource) -> Markup {
    let blocks = split_blocks(raw);

    let mut targets: Vec<&str> = blocks
        .iter()
        .filter_map(|block| match block {
            RenderBlock::LinkCards(links) => Some(links),
            _ => None,
        })
        .flatten()
        .map(|link| link.target_url.as_str())
        .filter(|url| is_safe_for_link(url))
        .collect();
    targets.sort_unstable();
    targets.dedup();

    let fetched = join_all(targets.iter().map(|url| metadata.fetch(url))).await;
    let pages: HashMap<&str, PageMetadata> = targets.into_iter().zip(fetched).collect();

    // Consecutive prose lines are rendered together so that multi-line
    // constructs (lists, code fences) survive.
    let mut prose = String::new();
    let mut parts: Vec<Markup> = Vec::new();
    for block in &blocks {
        match block {
            RenderBlock::Prose(text) => {
                prose.push_str(text);
                prose.push('\n');
            }
            RenderBlock::Break => prose.push('\n'),
            RenderBlock::LinkCards(links) => {
                flush_prose(&mut prose, &mut parts);
                for link in links {
                    parts.push(link_card(link, pages.get(link.target_url.as_str())));
                }
            }
        }
    }
    flush_prose(&mut prose, &mut parts);

    html! {
        @for part in parts {
            (part)
        }
    }
}

fn flush_prose(prose: &mut String, parts: &mut Vec<Markup>) {
    if !prose.trim().is_empty() {
        parts.push(PreEscaped(render_markdown(prose)));
    }
    prose.clear();
}

/// A preview card for one link. Unsafe targets render as plain text.
pub fn link_card(link: &LinkSpan, page: Option<&PageMetadata>) -> Markup {
    if !is_safe_for_link(&link.target_url) {
        return html! {
            span class="link-card-text" { (link.display_text) }
        };
    }

    let host = url::Url::parse(&link.target_url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_default();

    let title = page
        .and_then(|p| p.title.as_deref())
        .filter(|t| !t.trim().is_empty())
        .or_else(|| (link.display_text != link.target_url).then_some(link.display_text.as_str()))
        .filter(|t| !t.trim().is_empty())
        .unwrap_or(if host.is_empty() {
            link.target_url.as_str()
        } else {
            host.as_str()
        });

    let image = page
        .and_then(|p| p.image.as_deref())
        .filter(|img| is_safe_for_image(img));

    html! {
        a class="link-card" href=(link.target_url) rel="noopener noreferrer" target="_blank" {
            div class="link-card-body" {
                div class="link-card-title" { (title) }
                div class="link-card-host" { (host) }
            }
            @if let Some(image) = image {
                img class="link-card-image" src=(image) alt="" loading="lazy";
            }
        }
    }
}
