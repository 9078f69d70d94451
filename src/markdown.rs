use pulldown_cmark::{html, CowStr, Event, Options, Parser};

/// Convert a markdown post body to an HTML fragment.
///
/// Strikethrough, tables and math are enabled. Math segments are rendered
/// server-side with KaTeX so pages need no client-side math runtime.
pub fn to_html(markdown: &str) -> String {
    let source = rewrite_latex_delimiters(markdown);

    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_MATH);

    let events = Parser::new_ext(&source, options).map(|event| match event {
        Event::InlineMath(src) => Event::Html(CowStr::from(render_math(&src, false))),
        Event::DisplayMath(src) => Event::Html(CowStr::from(render_math(&src, true))),
        other => other,
    });

    let mut out = String::new();
    html::push_html(&mut out, events);
    out
}

/// Rewrite LaTeX-style `\(..\)` and `\[..\]` delimiters to the `$`/`$$`
/// fences pulldown-cmark understands. Inline segments containing a newline
/// are promoted to display fences, since `$..$` cannot span lines.
fn rewrite_latex_delimiters(input: &str) -> String {
    const DELIMITERS: [(&str, &str, bool); 2] =
        [("\\(", "\\)", false), ("\\[", "\\]", true)];

    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find('\\') {
        let (head, tail) = rest.split_at(pos);
        out.push_str(head);

        let consumed = DELIMITERS
            .iter()
            .find(|(open, _, _)| tail.starts_with(open))
            .and_then(|(open, close, display)| {
                let body_start = open.len();
                let body_len = tail[body_start..].find(close)?;
                let body = &tail[body_start..body_start + body_len];
                let fence = if *display || body.contains('\n') { "$$" } else { "$" };
                out.push_str(fence);
                out.push_str(body);
                out.push_str(fence);
                Some(body_start + body_len + close.len())
            });

        match consumed {
            Some(n) => rest = &tail[n..],
            None => {
                out.push('\\');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

fn render_math(source: &str, display_mode: bool) -> String {
    katex::Opts::builder()
        .display_mode(display_mode)
        .build()
        .ok()
        .and_then(|opts| katex::render_with_opts(source, opts).ok())
        .unwrap_or_else(|| {
            let class = if display_mode { "math math-display" } else { "math math-inline" };
            format!("<span class=\"{class}\">{source}</span>")
        })
}
