use htmlescape::encode_minimal;

use crate::models::{Post, PostSummary};

const RELOAD_SCRIPT: &str = r#"
<script>
    const socket = new WebSocket("ws://" + window.location.host + "/ws");
    socket.onmessage = (event) => {
        if (event.data === "reload") {
            window.location.reload();
        }
    };
</script>
"#;

/// Fill the layout template and, in development, inject the live-reload
/// script just before the closing body tag.
pub fn page(layout: &str, title: &str, content: &str, is_development: bool) -> String {
    let mut page = layout
        .replace("{{ title }}", &encode_minimal(title))
        .replace("{{ content }}", content);

    if is_development {
        page = page.replace("</body>", &format!("{RELOAD_SCRIPT}</body>"));
    }

    page
}

/// Home page body: the static intro block followed by the post list.
pub fn post_list(intro_html: &str, posts: &[PostSummary]) -> String {
    let items: String = posts.iter().map(list_item).collect();
    format!("{intro_html}\n<ul class=\"post-list\">{items}</ul>")
}

/// One entry of the post list: a linked title, an optional subtitle line,
/// and the read-more/date row only when the post carries a date.
pub fn list_item(post: &PostSummary) -> String {
    let mut item = format!(
        "<li class=\"post-item\"><a href=\"/posts/{}\">{}</a>",
        post.id,
        encode_minimal(&post.title)
    );

    if let Some(subtitle) = &post.subtitle {
        item.push_str(&format!(
            "<p class=\"post-subtitle\">{}</p>",
            encode_minimal(subtitle)
        ));
    }

    if let Some(date) = &post.date {
        item.push_str(&format!(
            "<div class=\"post-meta\"><a href=\"/posts/{}\">Read more</a><span class=\"post-date\">{}</span></div>",
            post.id,
            encode_minimal(date)
        ));
    }

    item.push_str("</li>");
    item
}

/// Detail page body: title, optional date line, the rendered markdown body
/// (trusted, embedded raw), and a back link.
pub fn post_page(post: &Post) -> String {
    let mut out = format!("<h1>{}</h1>", encode_minimal(&post.summary.title));

    if let Some(date) = &post.summary.date {
        out.push_str(&format!(
            "<p class=\"post-date\">{}</p>",
            encode_minimal(date)
        ));
    }

    out.push_str("<article>");
    out.push_str(&post.content_html);
    out.push_str("<p><a href=\"/\">&larr; Back to home</a></p></article>");
    out
}

pub fn not_found(template: &str, id: &str) -> String {
    template.replace("{{ id }}", &encode_minimal(id))
}
