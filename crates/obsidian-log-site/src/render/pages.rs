//! Full-page renderers.

use maud::{Markup, html};
use obsidian_log_core::blog::{PREVIEW_LENGTH, preview};
use obsidian_log_core::{AppConfig, ContentKind, Entry, Task, TaskSummary};

use super::components::{entry_href, entry_meta, entry_title, page_shell};

/// Entries shown per section on the home page.
pub const HOME_SECTION_LIMIT: usize = 5;

/// Search state of the blog listing.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlogFilter<'a> {
    pub query: &'a str,
    pub tag: &'a str,
    /// Every tag across published posts, for the tag bar.
    pub tags: &'a [String],
}

pub fn home(config: &AppConfig, sections: &[(ContentKind, Vec<Entry>)], canonical: &str) -> Markup {
    let body = html! {
        @for (kind, entries) in sections {
            section class="section" {
                h2 class="section-title" {
                    (kind.label())
                    a href=(kind.route()) { "All " (kind.label().to_lowercase()) " →" }
                }
                (entry_items(&entries[..entries.len().min(HOME_SECTION_LIMIT)], false))
            }
        }
    };

    page_shell(config.title(), config.subtitle(), canonical, config, body)
}

pub fn entry_list(
    config: &AppConfig,
    kind: ContentKind,
    entries: &[Entry],
    canonical: &str,
    filter: Option<BlogFilter<'_>>,
) -> Markup {
    let body = html! {
        section class="section" {
            h1 class="section-title" { (kind.label()) }

            @if let Some(filter) = filter {
                form class="search" method="get" action=(kind.route()) role="search" {
                    input type="search" name="q" value=(filter.query) placeholder="Search posts";
                    @if !filter.tag.is_empty() {
                        input type="hidden" name="tag" value=(filter.tag);
                    }
                    button type="submit" { "Search" }
                }
                @if !filter.tags.is_empty() {
                    div class="tag-bar" {
                        a class=(tag_class(filter.tag.is_empty())) href=(kind.route()) { "All" }
                        @for tag in filter.tags {
                            a class=(tag_class(tag.eq_ignore_ascii_case(filter.tag)))
                                href=(tag_href(kind, tag)) { (tag) }
                        }
                    }
                }
            }

            (entry_items(entries, kind == ContentKind::Blog))
        }
    };

    let description = format!("{} - {}", kind.label(), config.subtitle());
    page_shell(kind.label(), &description, canonical, config, body)
}

pub fn entry_detail(config: &AppConfig, entry: &Entry, content: Markup, canonical: &str) -> Markup {
    let description = preview(&entry.body, PREVIEW_LENGTH);
    let body = html! {
        article {
            header class="entry-header" {
                h1 { (entry_title(entry)) }
                (entry_meta(entry))
            }
            div class="entry-content" { (content) }
        }
        p { a href=(entry.kind.route()) { "← " (entry.kind.label()) } }
    };

    page_shell(&entry.title, &description, canonical, config, body)
}

pub fn tasks(config: &AppConfig, tasks: &[Task], summary: &TaskSummary, canonical: &str) -> Markup {
    let percent = summary.percent_done();
    let body = html! {
        section class="section" {
            h1 class="section-title" { "Tasks" }
            div class="task-summary" {
                span { (summary.total) " total" }
                span { (summary.todo) " todo" }
                span { (summary.doing) " doing" }
                span { (summary.done) " done" }
                span { (percent) "%" }
            }
            div class="progress" {
                div class="progress-bar" style=(format!("width:{percent}%")) {}
            }
            @if tasks.is_empty() {
                p class="empty" { "No tasks yet." }
            } @else {
                ul class="entry-list" {
                    @for task in tasks {
                        @let status = task.status.label();
                        li class="entry-item" {
                            span class=(format!("task-status {}", status.to_lowercase())) { (status) }
                            span class="entry-title" { (task.title) }
                            @if let Some(description) = &task.description {
                                p class="task-description" { (description) }
                            }
                        }
                    }
                }
            }
        }
    };

    page_shell("Tasks", "What I'm working on", canonical, config, body)
}

fn entry_items(entries: &[Entry], with_preview: bool) -> Markup {
    html! {
        @if entries.is_empty() {
            p class="empty" { "Nothing here yet." }
        } @else {
            ul class="entry-list" {
                @for entry in entries {
                    li class="entry-item" {
                        a class="entry-title" href=(entry_href(entry)) { (entry_title(entry)) }
                        (entry_meta(entry))
                        @if with_preview {
                            p class="entry-preview" { (preview(&entry.body, PREVIEW_LENGTH)) }
                        }
                    }
                }
            }
        }
    }
}

fn tag_class(active: bool) -> &'static str {
    if active { "tag active" } else { "tag" }
}

fn tag_href(kind: ContentKind, tag: &str) -> String {
    let query: String = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("tag", tag)
        .finish();
    format!("{}?{query}", kind.route())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use obsidian_log_core::{TaskStatus, Visibility};

    fn entry(kind: ContentKind, slug: &str, body: &str) -> Entry {
        Entry::parse(kind, slug, body).unwrap()
    }

    fn task(id: &str, status: TaskStatus) -> Task {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Task {
            id: id.into(),
            title: format!("Task {id}"),
            description: Some("details".into()),
            status,
            visibility: Visibility::Public,
            started_at: None,
            completed_at: None,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn home_limits_sections() {
        let entries: Vec<Entry> = (0..8)
            .map(|i| entry(ContentKind::Article, &format!("a{i}"), "body"))
            .collect();
        let html = home(
            &AppConfig::default(),
            &[(ContentKind::Article, entries), (ContentKind::Scrap, Vec::new())],
            "http://localhost:3000/",
        )
        .into_string();

        assert_eq!(html.matches("class=\"entry-item\"").count(), HOME_SECTION_LIMIT);
        assert!(html.contains("Nothing here yet."));
    }

    #[test]
    fn blog_list_shows_search_and_tags() {
        let posts = vec![entry(ContentKind::Blog, "p", "---\ntags: [rust]\n---\n**Bold** intro")];
        let tags = vec!["rust".to_string(), "web dev".to_string()];
        let html = entry_list(
            &AppConfig::default(),
            ContentKind::Blog,
            &posts,
            "/blog",
            Some(BlogFilter {
                query: "intro",
                tag: "rust",
                tags: &tags,
            }),
        )
        .into_string();

        assert!(html.contains("value=\"intro\""));
        assert!(html.contains("class=\"tag active\" href=\"/blog?tag=rust\""));
        assert!(html.contains("href=\"/blog?tag=web+dev\""));
        assert!(html.contains("Bold intro"));
    }

    #[test]
    fn article_list_has_no_search() {
        let html = entry_list(&AppConfig::default(), ContentKind::Article, &[], "/articles", None)
            .into_string();
        assert!(!html.contains("<form"));
    }

    #[test]
    fn tasks_page_summary() {
        let list = vec![task("1", TaskStatus::Done), task("2", TaskStatus::Todo)];
        let summary = TaskSummary::from_tasks(&list);
        let html = tasks(&AppConfig::default(), &list, &summary, "/tasks").into_string();
        assert!(html.contains("width:50%"));
        assert!(html.contains("task-status done"));
        assert!(html.contains("Task 2"));
    }

    #[test]
    fn entry_detail_wraps_content() {
        let post = entry(ContentKind::Scrap, "s", "---\ntitle: Note\n---\nText");
        let html = entry_detail(&AppConfig::default(), &post, html! { p { "rendered" } }, "/scraps/s")
            .into_string();
        assert!(html.contains("<h1>Note</h1>"));
        assert!(html.contains("<p>rendered</p>"));
        assert!(html.contains("href=\"/scraps\""));
    }
}
