//! Splitting raw markdown into prose and link-card blocks.
//!
//! A document with no link-only line is returned untouched as one prose
//! block so that multi-line markdown constructs (lists, tables, code fences)
//! render normally. Otherwise the document is handled line by line, with
//! lines inside fenced code blocks always kept as prose.

use serde::Serialize;

use crate::links::{LinkSpan, extract_links, is_link_only};

/// One unit of rendered output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum RenderBlock {
    /// Markdown to render as prose.
    Prose(String),
    /// A line consisting only of links, shown as preview cards.
    LinkCards(Vec<LinkSpan>),
    /// Vertical spacing.
    Break,
}

/// Split `raw` into render blocks.
pub fn render(raw: &str) -> Vec<RenderBlock> {
    if raw.trim().is_empty() {
        return Vec::new();
    }

    let lines: Vec<&str> = raw
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect();

    let in_fence = fenced_lines(&lines);
    let has_link_line = lines
        .iter()
        .zip(&in_fence)
        .any(|(line, fenced)| !fenced && is_link_only(line));
    if !has_link_line {
        return vec![RenderBlock::Prose(raw.to_string())];
    }

    lines
        .into_iter()
        .zip(in_fence)
        .map(|(line, fenced)| {
            if fenced {
                return RenderBlock::Prose(line.to_string());
            }
            let trimmed = line.trim();
            if trimmed.is_empty() {
                return RenderBlock::Break;
            }
            if is_link_only(trimmed) {
                let links = extract_links(trimmed);
                if links.is_empty() {
                    return RenderBlock::Break;
                }
                return RenderBlock::LinkCards(links);
            }
            RenderBlock::Prose(line.to_string())
        })
        .collect()
}

/// Opening or closing code fence: up to three spaces of indent, then three or
/// more backticks or tildes. Returns the fence character and run length.
fn fence_marker(line: &str) -> Option<(char, usize)> {
    let rest = line.trim_start_matches(' ');
    if line.len() - rest.len() > 3 {
        return None;
    }
    let marker = rest.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let run = rest.chars().take_while(|c| *c == marker).count();
    (run >= 3).then_some((marker, run))
}

/// For each line, whether it belongs to a fenced code block (fence lines
/// included). An unclosed fence runs to the end of the document.
fn fenced_lines(lines: &[&str]) -> Vec<bool> {
    let mut open: Option<(char, usize)> = None;
    lines
        .iter()
        .map(|line| match (open, fence_marker(line)) {
            (None, Some(marker)) => {
                open = Some(marker);
                true
            }
            (Some((c, n)), Some((close, run)))
                if close == c && run >= n && line.trim().chars().all(|ch| ch == c) =>
            {
                open = None;
                true
            }
            (Some(_), _) => true,
            (None, None) => false,
        })
        .collect()
}
