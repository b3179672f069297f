//! HTML to markdown conversion.
//!
//! Produces the plain markdown that agents read: headings, paragraphs,
//! lists, code, and links/images with absolute URLs so that pagination
//! candidates survive the conversion.

use scraper::{ElementRef, Html, Node, Selector};
use url::Url;

/// Elements whose content is never rendered.
const SKIPPED_ELEMENTS: &[&str] = &[
    "script", "style", "noscript", "svg", "template", "iframe", "head",
];

/// Nesting depth past which a subtree is flattened to its text.
const MAX_DEPTH: usize = 128;

/// Convert an HTML document to markdown.
///
/// The first of `<main>`, `<article>` or `<body>` found is rendered; documents
/// without any of them are rendered from the root. Relative links and image
/// sources are resolved against `base_url` when it parses.
#[must_use]
pub fn html_to_markdown(html: &str, base_url: &str) -> String {
    let document = Html::parse_document(html);
    let base = Url::parse(base_url).ok();

    let root = ["main", "article", "body"]
        .iter()
        .filter_map(|name| Selector::parse(name).ok())
        .find_map(|selector| document.select(&selector).next())
        .unwrap_or_else(|| document.root_element());

    let mut renderer = Renderer {
        base,
        out: String::new(),
        list_stack: Vec::new(),
        depth: 0,
    };
    renderer.render_children(root);
    tidy(&renderer.out)
}

/// Title of an HTML document, if it has a non-empty `<title>`.
#[must_use]
pub fn document_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("title").ok()?;
    let title = document
        .select(&selector)
        .next()?
        .text()
        .collect::<String>();
    let title = collapse_whitespace(&title);
    (!title.is_empty()).then_some(title)
}

struct Renderer {
    base: Option<Url>,
    out: String,
    /// Ordered-list counters; `None` for unordered lists.
    list_stack: Vec<Option<usize>>,
    depth: usize,
}

impl Renderer {
    fn render_children(&mut self, element: ElementRef<'_>) {
        for child in element.children() {
            match child.value() {
                Node::Text(text) => {
                    let collapsed = collapse_whitespace(text);
                    if !collapsed.is_empty() {
                        self.push_inline(&collapsed);
                    }
                }
                Node::Element(_) => {
                    if let Some(child_element) = ElementRef::wrap(child) {
                        self.render_element(child_element);
                    }
                }
                _ => {}
            }
        }
    }

    fn render_element(&mut self, element: ElementRef<'_>) {
        let name = element.value().name();
        if SKIPPED_ELEMENTS.contains(&name) {
            return;
        }
        if self.depth >= MAX_DEPTH {
            let text = inline_text(element);
            if !text.is_empty() {
                self.push_inline(&text);
            }
            return;
        }

        self.depth += 1;
        self.render_tag(name, element);
        self.depth -= 1;
    }

    fn render_tag(&mut self, name: &str, element: ElementRef<'_>) {
        match name {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = usize::from(name.as_bytes()[1] - b'0');
                let text = inline_text(element);
                if !text.is_empty() {
                    self.block_break();
                    self.out.push_str(&"#".repeat(level));
                    self.out.push(' ');
                    self.out.push_str(&text);
                    self.block_break();
                }
            }
            "p" | "div" | "section" | "header" | "footer" | "nav" | "aside" | "blockquote"
            | "figure" | "table" | "tr" => {
                self.block_break();
                self.render_children(element);
                self.block_break();
            }
            "br" => self.out.push('\n'),
            "hr" => {
                self.block_break();
                self.out.push_str("---");
                self.block_break();
            }
            "ul" | "ol" => {
                self.block_break();
                self.list_stack
                    .push(if name == "ol" { Some(0) } else { None });
                self.render_children(element);
                self.list_stack.pop();
                self.block_break();
            }
            "li" => {
                self.line_break();
                let depth = self.list_stack.len().saturating_sub(1);
                self.out.push_str(&"  ".repeat(depth));
                match self.list_stack.last_mut() {
                    Some(Some(counter)) => {
                        *counter += 1;
                        self.out.push_str(&format!("{counter}. "));
                    }
                    _ => self.out.push_str("- "),
                }
                self.render_children(element);
                self.line_break();
            }
            "pre" => {
                let code = element.text().collect::<String>();
                self.block_break();
                self.out.push_str("```\n");
                self.out.push_str(code.trim_end_matches('\n'));
                self.out.push_str("\n```");
                self.block_break();
            }
            "code" => {
                let code = element.text().collect::<String>();
                if !code.is_empty() {
                    self.push_inline(&format!("`{}`", code.trim()));
                }
            }
            "strong" | "b" => self.wrap_inline(element, "**"),
            "em" | "i" => self.wrap_inline(element, "*"),
            "a" => {
                let text = inline_text(element);
                match element.value().attr("href") {
                    Some(href) if !href.trim().is_empty() => {
                        let target = self.resolve(href);
                        let label = if text.is_empty() { target.clone() } else { text };
                        self.push_inline(&format!("[{label}]({target})"));
                    }
                    _ => {
                        if !text.is_empty() {
                            self.push_inline(&text);
                        }
                    }
                }
            }
            "img" => {
                if let Some(src) = element.value().attr("src") {
                    let alt = element.value().attr("alt").unwrap_or_default();
                    let target = self.resolve(src);
                    self.push_inline(&format!("![{}]({target})", alt.trim()));
                }
            }
            "td" | "th" => {
                self.render_children(element);
                self.out.push(' ');
            }
            _ => self.render_children(element),
        }
    }

    fn wrap_inline(&mut self, element: ElementRef<'_>, marker: &str) {
        let text = inline_text(element);
        if !text.is_empty() {
            self.push_inline(&format!("{marker}{text}{marker}"));
        }
    }

    fn push_inline(&mut self, text: &str) {
        let needs_space = self
            .out
            .chars()
            .last()
            .is_some_and(|c| !c.is_whitespace() && c != '(' && c != '[');
        let starts_with_punct = text
            .chars()
            .next()
            .is_some_and(|c| matches!(c, '.' | ',' | ';' | ':' | '!' | '?' | ')'));
        if needs_space && !starts_with_punct {
            self.out.push(' ');
        }
        self.out.push_str(text.trim_start());
    }

    fn line_break(&mut self) {
        if !self.out.is_empty() && !self.out.ends_with('\n') {
            self.out.push('\n');
        }
    }

    fn block_break(&mut self) {
        if self.out.is_empty() {
            return;
        }
        while self.out.ends_with(' ') {
            self.out.pop();
        }
        if !self.out.ends_with("\n\n") {
            if self.out.ends_with('\n') {
                self.out.push('\n');
            } else {
                self.out.push_str("\n\n");
            }
        }
    }

    fn resolve(&self, href: &str) -> String {
        let href = href.trim();
        if href.starts_with('#') {
            return href.to_string();
        }
        match &self.base {
            Some(base) => base
                .join(href)
                .map_or_else(|_| href.to_string(), |u| u.to_string()),
            None => href.to_string(),
        }
    }
}

/// Text content of an element with whitespace collapsed.
fn inline_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Trim line ends and collapse runs of blank lines.
fn tidy(markdown: &str) -> String {
    let mut out = String::with_capacity(markdown.len());
    let mut blank_run = 0;
    for line in markdown.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://example.com/blog/post-1";

    #[test]
    fn test_headings_and_paragraphs() {
        let html = "<html><body><h1>Title</h1><p>First   paragraph.</p><h3>Sub</h3><p>Second</p></body></html>";
        let md = html_to_markdown(html, BASE);
        assert_eq!(md, "# Title\n\nFirst paragraph.\n\n### Sub\n\nSecond");
    }

    #[test]
    fn test_links_are_absolute() {
        let html = r#"<body><p>Go to <a href="/blog/post-2">Next page</a>.</p></body>"#;
        let md = html_to_markdown(html, BASE);
        assert!(md.contains("[Next page](https://example.com/blog/post-2)"));
        assert!(md.ends_with(")."));
    }

    #[test]
    fn test_fragment_links_kept() {
        let html = r##"<body><a href="#comments">Comments</a></body>"##;
        let md = html_to_markdown(html, BASE);
        assert_eq!(md, "[Comments](#comments)");
    }

    #[test]
    fn test_images() {
        let html = r#"<body><img src="img/fig1.png" alt="Figure 1"></body>"#;
        let md = html_to_markdown(html, BASE);
        assert_eq!(md, "![Figure 1](https://example.com/blog/img/fig1.png)");
    }

    #[test]
    fn test_lists() {
        let html = "<body><ul><li>one</li><li>two</li></ul><ol><li>a</li><li>b</li></ol></body>";
        let md = html_to_markdown(html, BASE);
        assert!(md.contains("- one\n- two"));
        assert!(md.contains("1. a\n2. b"));
    }

    #[test]
    fn test_code_blocks() {
        let html = "<body><pre><code>fn main() {}\n</code></pre><p>Use <code>cargo</code> here</p></body>";
        let md = html_to_markdown(html, BASE);
        assert!(md.contains("```\nfn main() {}\n```"));
        assert!(md.contains("Use `cargo` here"));
    }

    #[test]
    fn test_scripts_and_styles_dropped() {
        let html = "<html><head><style>p{}</style></head><body><script>alert(1)</script><p>Visible</p></body></html>";
        let md = html_to_markdown(html, BASE);
        assert_eq!(md, "Visible");
    }

    #[test]
    fn test_prefers_main_element() {
        let html = "<body><nav>Menu</nav><main><p>Article body</p></main></body>";
        let md = html_to_markdown(html, BASE);
        assert_eq!(md, "Article body");
    }

    #[test]
    fn test_emphasis() {
        let html = "<body><p>A <strong>bold</strong> and <em>soft</em> claim</p></body>";
        let md = html_to_markdown(html, BASE);
        assert_eq!(md, "A **bold** and *soft* claim");
    }

    #[test]
    fn test_invalid_base_keeps_relative_links() {
        let html = r#"<body><a href="/x">X</a></body>"#;
        let md = html_to_markdown(html, "not a url");
        assert_eq!(md, "[X](/x)");
    }

    #[test]
    fn test_deep_nesting_is_flattened() {
        let depth = 2_000;
        let html = format!(
            "<html><body>{}<p>deep text</p>{}</body></html>",
            "<div><span>".repeat(depth),
            "</span></div>".repeat(depth)
        );
        let md = html_to_markdown(&html, BASE);
        assert_eq!(md, "deep text");
    }

    #[test]
    fn test_document_title() {
        let html = "<html><head><title>  My   Page </title></head><body></body></html>";
        assert_eq!(document_title(html).as_deref(), Some("My Page"));
        assert!(document_title("<html><body></body></html>").is_none());
    }
}
