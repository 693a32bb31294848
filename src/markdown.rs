//! Markdown → HTML rendering for generated documentation.
//!
//! Supports the subset the model is asked to produce: `#`..`###` headings,
//! `**bold**`, `* ` bullet lists and fenced code blocks. Everything else is
//! passed through as text with `<` and `>` escaped.
//!
//! ```text
//! "# Title\n* one\n* two"
//!     ↓ parse
//! [Heading { level: 1, [Text("Title")] },
//!  List([[Text("one")], [Text("two")]])]
//!     ↓ to_html
//! "<h1>Title</h1><ul><li>one</li><li>two</li></ul>"
//! ```
//!
//! Line-level blocks (headings and text lines) are joined with `<br />`.
//! Lists and code blocks are containers: no `<br />` is emitted on either
//! side of them.

use once_cell::sync::Lazy;
use regex::Regex;

static BOLD: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"\*\*(.*?)\*\*").unwrap()
});

const FENCE: &str = "```";
const BULLET: &str = "* ";
const LINE_BREAK: &str = "<br />";

/// Inline content of a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    /// Plain text
    Text(String),
    /// `**bold**` span
    Bold(String),
}

/// A block-level node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// `#`, `##` or `###` heading
    Heading {
        /// 1 to 3
        level: u8,
        /// Heading text
        content: Vec<Inline>,
    },
    /// One source line of running text; empty for blank lines
    Line(Vec<Inline>),
    /// Consecutive `* ` items
    List(Vec<Vec<Inline>>),
    /// Fenced code block
    CodeBlock {
        /// Tag after the opening fence, may be empty
        language: String,
        /// Lines between the fences, verbatim
        body: String,
    },
}

impl Block {
    const fn is_container(&self) -> bool {
        matches!(self, Self::List(_) | Self::CodeBlock { .. })
    }
}

/// A parsed Markdown document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Document {
    /// Top-level blocks in source order
    pub blocks: Vec<Block>,
}

impl Document {
    /// Parses Markdown text into blocks.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let lines: Vec<&str> = text
            .split('\n')
            .map(|l| l.strip_suffix('\r').unwrap_or(l))
            .collect();

        let mut blocks = Vec::new();
        let mut i = 0;

        while i < lines.len() {
            let line = lines[i];

            if let Some(tag) = line.strip_prefix(FENCE) {
                // An unclosed fence is plain text.
                if let Some(len) = lines[i + 1..].iter().position(|l| l.starts_with(FENCE)) {
                    blocks.push(Block::CodeBlock {
                        language: tag.trim().to_string(),
                        body: lines[i + 1..=i + len].join("\n"),
                    });
                    i += len + 2;
                    continue;
                }
            }

            if let Some(first) = line.strip_prefix(BULLET) {
                let (items, next) = collect_list(&lines, i + 1, first);
                blocks.push(Block::List(items));
                i = next;
                continue;
            }

            blocks.push(match heading(line) {
                Some((level, rest)) => Block::Heading {
                    level,
                    content: parse_inlines(rest),
                },
                None => Block::Line(parse_inlines(line)),
            });
            i += 1;
        }

        Self { blocks }
    }

    /// Renders the document as an HTML fragment.
    #[must_use]
    pub fn to_html(&self) -> String {
        let mut html = String::new();
        let mut previous: Option<&Block> = None;

        for block in &self.blocks {
            if let Some(prev) = previous {
                if !prev.is_container() && !block.is_container() {
                    html.push_str(LINE_BREAK);
                }
            }
            render_block(block, &mut html);
            previous = Some(block);
        }

        html
    }
}

/// Gathers list items starting after the first one. Blank lines between
/// items are swallowed; blank lines after the last item are left in place.
fn collect_list(lines: &[&str], start: usize, first: &str) -> (Vec<Vec<Inline>>, usize) {
    let mut items = vec![parse_inlines(first)];
    let mut next = start;

    loop {
        let mut k = next;
        while k < lines.len() && lines[k].trim().is_empty() {
            k += 1;
        }

        match lines.get(k).and_then(|l| l.strip_prefix(BULLET)) {
            Some(item) => {
                items.push(parse_inlines(item));
                next = k + 1;
            }
            None => break,
        }
    }

    (items, next)
}

fn heading(line: &str) -> Option<(u8, &str)> {
    [(3, "### "), (2, "## "), (1, "# ")]
        .into_iter()
        .find_map(|(level, marker)| line.strip_prefix(marker).map(|rest| (level, rest)))
}

fn parse_inlines(text: &str) -> Vec<Inline> {
    let mut inlines = Vec::new();
    let mut last = 0;

    for m in BOLD.find_iter(text) {
        if m.start() > last {
            inlines.push(Inline::Text(text[last..m.start()].to_string()));
        }
        inlines.push(Inline::Bold(text[m.start() + 2..m.end() - 2].to_string()));
        last = m.end();
    }

    if last < text.len() {
        inlines.push(Inline::Text(text[last..].to_string()));
    }

    inlines
}

fn render_block(block: &Block, html: &mut String) {
    match block {
        Block::Heading { level, content } => {
            html.push_str(&format!("<h{level}>"));
            render_inlines(content, html);
            html.push_str(&format!("</h{level}>"));
        }
        Block::Line(content) => render_inlines(content, html),
        Block::List(items) => {
            html.push_str("<ul>");
            for item in items {
                html.push_str("<li>");
                render_inlines(item, html);
                html.push_str("</li>");
            }
            html.push_str("</ul>");
        }
        Block::CodeBlock { language, body } => {
            if language.is_empty() {
                html.push_str("<pre><code>");
            } else {
                html.push_str(&format!(
                    "<pre><code class=\"language-{}\">",
                    escape(language).replace('"', "&quot;")
                ));
            }
            html.push_str(&escape(body));
            html.push_str("</code></pre>");
        }
    }
}

fn render_inlines(inlines: &[Inline], html: &mut String) {
    for inline in inlines {
        match inline {
            Inline::Text(text) => html.push_str(&escape(text)),
            Inline::Bold(text) => {
                html.push_str("<strong>");
                html.push_str(&escape(text));
                html.push_str("</strong>");
            }
        }
    }
}

/// Only angle brackets are escaped; existing entities pass through unchanged.
fn escape(text: &str) -> String {
    text.replace('<', "&lt;").replace('>', "&gt;")
}

/// Renders Markdown text to an HTML fragment.
#[must_use]
pub fn render(markdown: &str) -> String {
    Document::parse(markdown).to_html()
}

/// Generated Markdown together with its rendered HTML.
///
/// Derived once from the source text and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    markdown: String,
    html: String,
}

impl RenderedDocument {
    /// Renders `markdown`.
    #[must_use]
    pub fn new(markdown: impl Into<String>) -> Self {
        let markdown = markdown.into();
        let html = render(&markdown);
        Self { markdown, html }
    }

    /// The source Markdown as returned by the model.
    #[must_use]
    pub fn markdown(&self) -> &str {
        &self.markdown
    }

    /// The rendered HTML fragment.
    #[must_use]
    pub fn html(&self) -> &str {
        &self.html
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Inline {
        Inline::Text(s.to_string())
    }

    #[test]
    fn test_plain_text_only_escapes_and_breaks() {
        assert_eq!(
            render("a < b\nc > d\n\ne &lt; f"),
            "a &lt; b<br />c &gt; d<br /><br />e &lt; f"
        );
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(render(""), "");
    }

    #[test]
    fn test_title_bold_and_list() {
        let input = "# Title\n\n**bold** text\n* item one\n* item two";
        let doc = Document::parse(input);

        assert_eq!(
            doc.blocks,
            vec![
                Block::Heading {
                    level: 1,
                    content: vec![text("Title")],
                },
                Block::Line(vec![]),
                Block::Line(vec![Inline::Bold("bold".to_string()), text(" text")]),
                Block::List(vec![vec![text("item one")], vec![text("item two")]]),
            ]
        );

        let html = doc.to_html();
        assert_eq!(
            html,
            "<h1>Title</h1><br /><br /><strong>bold</strong> text\
             <ul><li>item one</li><li>item two</li></ul>"
        );
        assert_eq!(html.matches("<ul>").count(), 1);
        assert_eq!(html.matches("<li>").count(), 2);
    }

    #[test]
    fn test_fenced_block() {
        assert_eq!(
            render("```js\nconst x = 1;\n```"),
            "<pre><code class=\"language-js\">const x = 1;</code></pre>"
        );
    }

    #[test]
    fn test_code_body_is_verbatim_and_escaped() {
        let html = render("```\n# not a heading\n* not a list\n**not bold** <T>\n```");
        assert_eq!(
            html,
            "<pre><code># not a heading\n* not a list\n**not bold** &lt;T&gt;</code></pre>"
        );
    }

    #[test]
    fn test_no_breaks_around_code_block() {
        assert_eq!(
            render("Intro\n```rust\nfn main() {}\n```\nAfter"),
            "Intro<pre><code class=\"language-rust\">fn main() {}</code></pre>After"
        );
    }

    #[test]
    fn test_unclosed_fence_is_text() {
        assert_eq!(render("```js\nlet a;"), "```js<br />let a;");
    }

    #[test]
    fn test_heading_levels() {
        assert_eq!(
            render("# One\n## Two\n### Three\n#### Four"),
            "<h1>One</h1><br /><h2>Two</h2><br /><h3>Three</h3><br />#### Four"
        );
    }

    #[test]
    fn test_heading_requires_space() {
        assert_eq!(render("#hashtag"), "#hashtag");
    }

    #[test]
    fn test_list_followed_by_heading() {
        assert_eq!(
            render("* a\n## Next"),
            "<ul><li>a</li></ul><h2>Next</h2>"
        );
    }

    #[test]
    fn test_blank_lines_between_items_join_list() {
        assert_eq!(
            render("* a\n\n* b\n\nAfter"),
            "<ul><li>a</li><li>b</li></ul><br />After"
        );
    }

    #[test]
    fn test_separate_lists() {
        assert_eq!(
            render("* a\ntext\n* b"),
            "<ul><li>a</li></ul>text<ul><li>b</li></ul>"
        );
    }

    #[test]
    fn test_bold_in_list_and_heading() {
        assert_eq!(
            render("## **API**\n* **get**: fetch"),
            "<h2><strong>API</strong></h2><ul><li><strong>get</strong>: fetch</li></ul>"
        );
    }

    #[test]
    fn test_bold_is_non_greedy() {
        assert_eq!(
            render("**a** and **b**"),
            "<strong>a</strong> and <strong>b</strong>"
        );
    }

    #[test]
    fn test_unmatched_bold_marker_is_text() {
        assert_eq!(render("**open"), "**open");
    }

    #[test]
    fn test_markup_is_escaped() {
        assert_eq!(
            render("<script>alert(1)</script>"),
            "&lt;script&gt;alert(1)&lt;/script&gt;"
        );
    }

    #[test]
    fn test_language_attribute_is_escaped() {
        assert_eq!(
            render("```a\"b\nx\n```"),
            "<pre><code class=\"language-a&quot;b\">x</code></pre>"
        );
    }

    #[test]
    fn test_crlf_input() {
        assert_eq!(render("# T\r\nbody\r\n"), "<h1>T</h1><br />body<br />");
    }

    #[test]
    fn test_rendered_document() {
        let doc = RenderedDocument::new("**x**");
        assert_eq!(doc.markdown(), "**x**");
        assert_eq!(doc.html(), "<strong>x</strong>");
    }
}
