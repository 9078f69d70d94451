use serde::Deserialize;

/// YAML metadata block at the top of a post file. Every field is optional;
/// a missing field suppresses the matching UI section instead of erroring.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct FrontMatter {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub date: Option<String>,
}

/// Post metadata as shown on the list page. The id is the on-disk filename
/// without its extension and doubles as the URL path segment.
#[derive(Debug, Clone)]
pub struct PostSummary {
    pub id: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub date: Option<String>,
}

/// A full post: its summary plus the markdown body converted to HTML.
#[derive(Debug, Clone)]
pub struct Post {
    pub summary: PostSummary,
    pub content_html: String,
}
