use std::cmp::Ordering;
use std::io;

use chrono::NaiveDate;
use gray_matter::{engine::YAML, Matter};
use tokio::fs;
use tracing::{error, info};

use crate::markdown;
use crate::models::{FrontMatter, Post, PostSummary};
use crate::state::AppState;

/// Everything the server caches between requests: the page templates and
/// the sorted post summaries.
pub struct SiteContent {
    pub layout_html: String,
    pub home_html: String,
    pub not_found_html: String,
    pub posts: Vec<PostSummary>,
}

pub async fn load_site(content_dir: &str) -> io::Result<SiteContent> {
    let layout_html = fs::read_to_string(format!("{content_dir}/layout.html")).await?;
    let home_html = fs::read_to_string(format!("{content_dir}/home.html")).await?;
    let not_found_html = fs::read_to_string(format!("{content_dir}/not_found.html")).await?;
    let posts = load_posts(content_dir).await?;

    Ok(SiteContent {
        layout_html,
        home_html,
        not_found_html,
        posts,
    })
}

/// Scan `{content_dir}/posts` and build one summary per markdown file,
/// ordered by date descending. The id is the filename minus its extension.
pub async fn load_posts(content_dir: &str) -> io::Result<Vec<PostSummary>> {
    let mut posts = Vec::new();
    let mut entries = fs::read_dir(format!("{content_dir}/posts")).await?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if !path.extension().map_or(false, |ext| ext == "md") {
            continue;
        }
        let Some(id) = path.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };
        let raw = fs::read_to_string(&path).await?;
        let (front_matter, _body) = parse_front_matter(&raw, id);
        posts.push(summarize(id, front_matter));
    }

    posts.sort_by(compare_posts);
    Ok(posts)
}

/// Load the full post for `id`, rendering the markdown body to HTML.
/// Returns `Ok(None)` when no matching file exists.
pub async fn load_post(content_dir: &str, id: &str) -> io::Result<Option<Post>> {
    let path = format!("{content_dir}/posts/{id}.md");
    let raw = match fs::read_to_string(&path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };

    let (front_matter, body) = parse_front_matter(&raw, id);
    Ok(Some(Post {
        summary: summarize(id, front_matter),
        content_html: markdown::to_html(&body),
    }))
}

/// Swap the cached templates and summaries for freshly loaded ones. Used by
/// the dev-mode watcher; a load failure keeps the previous content in place.
pub async fn reload_content(state: &AppState) {
    info!("Reloading site content...");
    match load_site(&state.config.content_dir).await {
        Ok(site) => {
            *state.layout_html.write().await = site.layout_html;
            *state.home_html.write().await = site.home_html;
            *state.not_found_html.write().await = site.not_found_html;
            *state.posts.write().await = site.posts;
            info!("Content reloaded.");
        }
        Err(e) => {
            error!("Failed to reload content: {}", e);
        }
    }
}

fn parse_front_matter(raw: &str, id: &str) -> (FrontMatter, String) {
    let matter = Matter::<YAML>::new();
    match matter.parse::<FrontMatter>(raw) {
        Ok(parsed) => (parsed.data.unwrap_or_default(), parsed.content),
        Err(e) => {
            error!("Failed to parse front matter in {}: {}", id, e);
            (FrontMatter::default(), raw.to_string())
        }
    }
}

fn summarize(id: &str, front_matter: FrontMatter) -> PostSummary {
    PostSummary {
        id: id.to_string(),
        title: front_matter.title.unwrap_or_else(|| id.to_string()),
        subtitle: front_matter.subtitle,
        date: front_matter.date,
    }
}

/// Dated posts first, newest first; undated posts last. Ties break ascending
/// by id so the ordering is stable across rescans.
fn compare_posts(a: &PostSummary, b: &PostSummary) -> Ordering {
    match (a.date.as_deref(), b.date.as_deref()) {
        (Some(x), Some(y)) => compare_dates(x, y).then_with(|| a.id.cmp(&b.id)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.id.cmp(&b.id),
    }
}

/// Descending. Dates are compared chronologically when both sides parse as
/// `YYYY-MM-DD`, otherwise as plain strings so free-form dates still order
/// deterministically.
fn compare_dates(a: &str, b: &str) -> Ordering {
    let parse = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok();
    match (parse(a), parse(b)) {
        (Some(x), Some(y)) => y.cmp(&x),
        _ => b.cmp(a),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn content_fixture(posts: &[(&str, String)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        let posts_dir = dir.path().join("posts");
        std::fs::create_dir_all(&posts_dir).unwrap();
        for (name, body) in posts {
            std::fs::write(posts_dir.join(name), body).unwrap();
        }
        dir
    }

    fn post(title: &str, date: Option<&str>, body: &str) -> String {
        let date_line = date.map(|d| format!("date: {d}\n")).unwrap_or_default();
        format!("---\ntitle: {title}\n{date_line}---\n\n{body}\n")
    }

    fn dir_str(dir: &TempDir) -> &str {
        dir.path().to_str().unwrap()
    }

    #[tokio::test]
    async fn sorts_posts_by_date_descending() {
        let dir = content_fixture(&[
            ("a.md", post("Older", Some("2023-01-01"), "old")),
            ("b.md", post("Newer", Some("2024-01-01"), "new")),
        ]);

        let posts = load_posts(dir_str(&dir)).await.unwrap();
        let ids: Vec<&str> = posts.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["b", "a"]);
    }

    #[tokio::test]
    async fn undated_posts_sort_after_dated_ones() {
        let dir = content_fixture(&[
            ("undated.md", post("No Date", None, "text")),
            ("dated.md", post("Dated", Some("2022-06-01"), "text")),
        ]);

        let posts = load_posts(dir_str(&dir)).await.unwrap();
        assert_eq!(posts[0].id, "dated");
        assert_eq!(posts[1].id, "undated");
        assert!(posts[1].date.is_none());
    }

    #[tokio::test]
    async fn equal_dates_break_ties_by_id() {
        let dir = content_fixture(&[
            ("zebra.md", post("Z", Some("2024-03-01"), "z")),
            ("apple.md", post("A", Some("2024-03-01"), "a")),
        ]);

        let posts = load_posts(dir_str(&dir)).await.unwrap();
        let ids: Vec<&str> = posts.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["apple", "zebra"]);
    }

    #[tokio::test]
    async fn non_iso_dates_fall_back_to_string_order() {
        let dir = content_fixture(&[
            ("a.md", post("A", Some("draft"), "a")),
            ("b.md", post("B", Some("unpublished"), "b")),
        ]);

        let posts = load_posts(dir_str(&dir)).await.unwrap();
        let ids: Vec<&str> = posts.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["b", "a"]);
    }

    #[tokio::test]
    async fn ignores_files_without_md_extension() {
        let dir = content_fixture(&[
            ("real.md", post("Real", Some("2024-01-01"), "text")),
            ("notes.txt", "not a post".to_string()),
        ]);

        let posts = load_posts(dir_str(&dir)).await.unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].id, "real");
    }

    #[tokio::test]
    async fn title_falls_back_to_id_when_front_matter_is_missing() {
        let dir = content_fixture(&[("bare.md", "Just a body.".to_string())]);

        let posts = load_posts(dir_str(&dir)).await.unwrap();
        assert_eq!(posts[0].title, "bare");
    }

    #[tokio::test]
    async fn every_listed_post_loads_with_non_empty_html() {
        let dir = content_fixture(&[
            ("a.md", post("A", Some("2023-01-01"), "First body.")),
            ("b.md", post("B", None, "Second body.")),
        ]);

        let posts = load_posts(dir_str(&dir)).await.unwrap();
        for summary in &posts {
            let post = load_post(dir_str(&dir), &summary.id).await.unwrap().unwrap();
            assert!(!post.content_html.is_empty());
            assert!(post.content_html.contains("<p>"));
        }
    }

    #[tokio::test]
    async fn loaded_post_carries_metadata_and_rendered_body() {
        let dir = content_fixture(&[(
            "hello.md".into(),
            "---\ntitle: Hello\nsubtitle: A greeting\ndate: 2024-05-01\n---\n\n# Heading\n\nBody text.\n"
                .to_string(),
        )]);

        let post = load_post(dir_str(&dir), "hello").await.unwrap().unwrap();
        assert_eq!(post.summary.title, "Hello");
        assert_eq!(post.summary.subtitle.as_deref(), Some("A greeting"));
        assert_eq!(post.summary.date.as_deref(), Some("2024-05-01"));
        assert!(post.content_html.contains("<h1>Heading</h1>"));
    }

    #[tokio::test]
    async fn unknown_id_loads_as_none() {
        let dir = content_fixture(&[("real.md", post("Real", None, "text"))]);

        let missing = load_post(dir_str(&dir), "unknown-id").await.unwrap();
        assert!(missing.is_none());
    }
}
