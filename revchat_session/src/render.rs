//! Markdown to structured output.
//!
//! [`render_markdown`] is pure: the parser is built per call and the only
//! shared state is the immutable syntax and theme sets loaded once on first
//! use. Re-rendering a message on every streamed fragment is therefore safe.

use std::sync::OnceLock;

use pulldown_cmark::{Alignment, CodeBlockKind, Event, Options, Parser, Tag, TextMergeStream};
use regex::Regex;
use syntect::{
    easy::HighlightLines,
    highlighting::{FontStyle, Theme, ThemeSet},
    parsing::{SyntaxReference, SyntaxSet},
    util::LinesWithEndings,
};

pub const DEFAULT_THEME: &str = "InspiredGitHub";

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderedMessage {
    pub blocks: Vec<Block>,
}

impl RenderedMessage {
    /// Code blocks in document order, including those nested in lists and
    /// quotes.
    pub fn code_blocks(&self) -> Vec<&CodeBlock> {
        fn walk<'a>(blocks: &'a [Block], out: &mut Vec<&'a CodeBlock>) {
            for block in blocks {
                match block {
                    Block::Code(code) => out.push(code),
                    Block::BlockQuote(inner) => walk(inner, out),
                    Block::List { items, .. } => {
                        for item in items {
                            walk(&item.blocks, out);
                        }
                    }
                    _ => {}
                }
            }
        }
        let mut out = vec![];
        walk(&self.blocks, &mut out);
        out
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Heading { level: u8, content: Vec<Inline> },
    Paragraph(Vec<Inline>),
    List { start: Option<u64>, items: Vec<ListItem> },
    BlockQuote(Vec<Block>),
    Code(CodeBlock),
    Table(Table),
    Rule,
    Html(String),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListItem {
    /// `Some` for GFM task list items.
    pub checked: Option<bool>,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnAlignment {
    None,
    Left,
    Center,
    Right,
}

impl From<Alignment> for ColumnAlignment {
    fn from(alignment: Alignment) -> Self {
        match alignment {
            Alignment::None => ColumnAlignment::None,
            Alignment::Left => ColumnAlignment::Left,
            Alignment::Center => ColumnAlignment::Center,
            Alignment::Right => ColumnAlignment::Right,
        }
    }
}

pub type TableRow = Vec<Vec<Inline>>;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub alignments: Vec<ColumnAlignment>,
    pub header: TableRow,
    pub rows: Vec<TableRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    Text(String),
    /// Inline code span, shown monospace on its own background.
    Code(String),
    Strong(Vec<Inline>),
    Emphasis(Vec<Inline>),
    Strikethrough(Vec<Inline>),
    Link { url: String, content: Vec<Inline> },
    Image { url: String, alt: String },
    SoftBreak,
    HardBreak,
}

impl Inline {
    pub fn plain_text(inlines: &[Inline]) -> String {
        let mut out = String::new();
        for inline in inlines {
            match inline {
                Inline::Text(text) | Inline::Code(text) => out.push_str(text),
                Inline::Strong(inner)
                | Inline::Emphasis(inner)
                | Inline::Strikethrough(inner)
                | Inline::Link { content: inner, .. } => out.push_str(&Self::plain_text(inner)),
                Inline::Image { alt, .. } => out.push_str(alt),
                Inline::SoftBreak => out.push(' '),
                Inline::HardBreak => out.push('\n'),
            }
        }
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpanStyle {
    pub foreground: Rgb,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StyledSpan {
    pub text: String,
    pub style: SpanStyle,
}

pub type HighlightedLine = Vec<StyledSpan>;

#[derive(Debug, Clone, PartialEq)]
pub struct CodeBlock {
    /// Tag from the opening fence, if any.
    pub language: Option<String>,
    pub code: String,
    /// `None` means plain monospace: no tag, or a tag no syntax matches.
    pub highlighted: Option<Vec<HighlightedLine>>,
}

impl CodeBlock {
    /// Raw code as placed on the clipboard by the copy control.
    pub fn copy_text(&self) -> &str {
        &self.code
    }

    pub fn is_highlighted(&self) -> bool {
        self.highlighted.is_some()
    }
}

struct Assets {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
}

fn assets() -> &'static Assets {
    static ASSETS: OnceLock<Assets> = OnceLock::new();
    ASSETS.get_or_init(|| Assets {
        syntax_set: SyntaxSet::load_defaults_newlines(),
        theme_set: ThemeSet::load_defaults(),
    })
}

pub fn theme_names() -> Vec<&'static str> {
    assets().theme_set.themes.keys().map(String::as_str).collect()
}

/// Fence tags accepted besides whatever syntect resolves on its own.
fn canonical_language(tag: &str) -> &str {
    match tag {
        "javascript" | "js" | "jsx" => "js",
        // no TypeScript grammar ships with syntect; JavaScript is close enough
        "typescript" | "ts" | "tsx" => "js",
        "python" | "py" => "py",
        "cpp" | "c++" | "cxx" => "cpp",
        "bash" | "shell" | "sh" | "zsh" => "sh",
        "html" => "html",
        "xml" => "xml",
        "json" => "json",
        "css" => "css",
        "java" => "java",
        other => other,
    }
}

fn find_syntax(language: &str) -> Option<&'static SyntaxReference> {
    let syntax_set = &assets().syntax_set;
    let tag = language.trim().to_ascii_lowercase();
    let canonical = canonical_language(&tag);
    syntax_set
        .find_syntax_by_token(canonical)
        .or_else(|| syntax_set.find_syntax_by_extension(canonical))
}

pub fn is_recognized_language(language: &str) -> bool {
    find_syntax(language).is_some()
}

fn autolink_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"\b(?:https?://|www\.)[^\s<]*[^\s<.,;:!?'")\]]"#)
            .expect("autolink pattern is valid")
    })
}

/// Renders with [`DEFAULT_THEME`].
pub fn render_markdown(content: &str) -> RenderedMessage {
    Renderer::default().render(content)
}

#[derive(Clone, Copy)]
pub struct Renderer {
    theme: &'static Theme,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::with_theme(DEFAULT_THEME)
            .or_else(|| {
                let theme = assets().theme_set.themes.values().next()?;
                Some(Self { theme })
            })
            .expect("syntect ships with at least one theme")
    }
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("theme", &self.theme.name)
            .finish()
    }
}

impl Renderer {
    pub fn with_theme(name: &str) -> Option<Self> {
        let theme = assets().theme_set.themes.get(name)?;
        Some(Self { theme })
    }

    pub fn render(&self, content: &str) -> RenderedMessage {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);

        // entities and escapes split text into several events; autolinking
        // needs each run of text whole
        let mut builder = TreeBuilder::new(*self);
        for event in TextMergeStream::new(Parser::new_ext(content, options)) {
            builder.event(event);
        }
        RenderedMessage {
            blocks: builder.finish(),
        }
    }

    pub fn highlight(&self, code: &str, language: &str) -> Option<Vec<HighlightedLine>> {
        let syntax = find_syntax(language)?;
        let syntax_set = &assets().syntax_set;
        let mut highlighter = HighlightLines::new(syntax, self.theme);

        let mut lines = vec![];
        for line in LinesWithEndings::from(code) {
            // a grammar error downgrades the block to plain text
            let ranges = highlighter.highlight_line(line, syntax_set).ok()?;
            let spans = ranges
                .into_iter()
                .filter_map(|(style, text)| {
                    let text = text.trim_end_matches('\n');
                    (!text.is_empty()).then(|| StyledSpan {
                        text: text.to_owned(),
                        style: SpanStyle {
                            foreground: Rgb(
                                style.foreground.r,
                                style.foreground.g,
                                style.foreground.b,
                            ),
                            bold: style.font_style.contains(FontStyle::BOLD),
                            italic: style.font_style.contains(FontStyle::ITALIC),
                            underline: style.font_style.contains(FontStyle::UNDERLINE),
                        },
                    })
                })
                .collect();
            lines.push(spans);
        }
        Some(lines)
    }

    fn code_block(&self, language: Option<String>, mut code: String) -> CodeBlock {
        if code.ends_with('\n') {
            code.pop();
        }
        let highlighted = language
            .as_deref()
            .and_then(|language| self.highlight(&code, language));
        CodeBlock {
            language,
            code,
            highlighted,
        }
    }
}

enum Frame {
    Root(Vec<Block>),
    BlockQuote(Vec<Block>),
    List { start: Option<u64>, items: Vec<ListItem> },
    Item(ListItem),
    /// `implicit` paragraphs wrap inline content of tight list items.
    Paragraph { content: Vec<Inline>, implicit: bool },
    Heading { level: u8, content: Vec<Inline> },
    Code { language: Option<String>, code: String },
    Html(String),
    Table(Table),
    TableHead(TableRow),
    TableRow(TableRow),
    TableCell(Vec<Inline>),
    Strong(Vec<Inline>),
    Emphasis(Vec<Inline>),
    Strikethrough(Vec<Inline>),
    Link { url: String, content: Vec<Inline> },
    Image { url: String, content: Vec<Inline> },
    /// Containers without a rendering (footnotes, metadata); content dropped.
    Skip,
}

impl Frame {
    fn holds_blocks(&self) -> bool {
        matches!(self, Frame::Root(_) | Frame::BlockQuote(_) | Frame::Item(_))
    }

    fn is_inline(&self) -> bool {
        matches!(
            self,
            Frame::Strong(_)
                | Frame::Emphasis(_)
                | Frame::Strikethrough(_)
                | Frame::Link { .. }
                | Frame::Image { .. }
        )
    }

    fn inlines_mut(&mut self) -> Option<&mut Vec<Inline>> {
        match self {
            Frame::Paragraph { content, .. }
            | Frame::Heading { content, .. }
            | Frame::TableCell(content)
            | Frame::Strong(content)
            | Frame::Emphasis(content)
            | Frame::Strikethrough(content)
            | Frame::Link { content, .. }
            | Frame::Image { content, .. } => Some(content),
            _ => None,
        }
    }
}

struct TreeBuilder {
    renderer: Renderer,
    stack: Vec<Frame>,
}

impl TreeBuilder {
    fn new(renderer: Renderer) -> Self {
        Self {
            renderer,
            stack: vec![Frame::Root(vec![])],
        }
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(_) => {
                // events nest, so every end closes the innermost open frame
                self.close_implicit_paragraph();
                self.close();
            }
            Event::Text(text) => self.text(&text),
            Event::Code(code) => self.push_inline(Inline::Code(code.into_string())),
            Event::Html(html) => match self.stack.last_mut() {
                Some(Frame::Html(buffer)) => buffer.push_str(&html),
                _ => self.push_block(Block::Html(html.into_string())),
            },
            Event::InlineHtml(html) => self.push_inline(Inline::Text(html.into_string())),
            Event::SoftBreak => self.push_inline(Inline::SoftBreak),
            Event::HardBreak => self.push_inline(Inline::HardBreak),
            Event::Rule => {
                self.close_implicit_paragraph();
                self.push_block(Block::Rule);
            }
            Event::TaskListMarker(checked) => {
                let item = self.stack.iter_mut().rev().find_map(|frame| match frame {
                    Frame::Item(item) => Some(item),
                    _ => None,
                });
                if let Some(item) = item {
                    item.checked = Some(checked);
                }
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        let frame = match tag {
            Tag::Paragraph => Frame::Paragraph {
                content: vec![],
                implicit: false,
            },
            Tag::Heading { level, .. } => Frame::Heading {
                level: level as u8,
                content: vec![],
            },
            Tag::BlockQuote(_) => Frame::BlockQuote(vec![]),
            Tag::CodeBlock(kind) => {
                let language = match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .map(|x| x.to_owned())
                        .filter(|x| !x.is_empty()),
                    CodeBlockKind::Indented => None,
                };
                Frame::Code {
                    language,
                    code: String::new(),
                }
            }
            Tag::HtmlBlock => Frame::Html(String::new()),
            Tag::List(start) => Frame::List {
                start,
                items: vec![],
            },
            Tag::Item => Frame::Item(ListItem::default()),
            Tag::Table(alignments) => Frame::Table(Table {
                alignments: alignments.into_iter().map(ColumnAlignment::from).collect(),
                ..Table::default()
            }),
            Tag::TableHead => Frame::TableHead(vec![]),
            Tag::TableRow => Frame::TableRow(vec![]),
            Tag::TableCell => Frame::TableCell(vec![]),
            Tag::Emphasis => Frame::Emphasis(vec![]),
            Tag::Strong => Frame::Strong(vec![]),
            Tag::Strikethrough => Frame::Strikethrough(vec![]),
            Tag::Link { dest_url, .. } => Frame::Link {
                url: dest_url.into_string(),
                content: vec![],
            },
            Tag::Image { dest_url, .. } => Frame::Image {
                url: dest_url.into_string(),
                content: vec![],
            },
            _ => Frame::Skip,
        };

        if frame.is_inline() {
            self.ensure_inline_container();
        } else {
            self.close_implicit_paragraph();
        }
        self.stack.push(frame);
    }

    fn text(&mut self, text: &str) {
        match self.stack.last_mut() {
            Some(Frame::Code { code, .. }) => return code.push_str(text),
            Some(Frame::Html(buffer)) => return buffer.push_str(text),
            _ => {}
        }

        let in_link = self
            .stack
            .iter()
            .any(|frame| matches!(frame, Frame::Link { .. } | Frame::Image { .. }));
        if in_link {
            return self.push_inline(Inline::Text(text.to_owned()));
        }

        let mut last = 0;
        for found in autolink_regex().find_iter(text) {
            if found.start() > last {
                self.push_inline(Inline::Text(text[last..found.start()].to_owned()));
            }
            let label = found.as_str();
            let url = if label.starts_with("www.") {
                format!("http://{label}")
            } else {
                label.to_owned()
            };
            self.push_inline(Inline::Link {
                url,
                content: vec![Inline::Text(label.to_owned())],
            });
            last = found.end();
        }
        if last < text.len() {
            self.push_inline(Inline::Text(text[last..].to_owned()));
        }
    }

    fn ensure_inline_container(&mut self) {
        let needs_paragraph = self.stack.last().map(Frame::holds_blocks).unwrap_or(false);
        if needs_paragraph {
            self.stack.push(Frame::Paragraph {
                content: vec![],
                implicit: true,
            });
        }
    }

    fn push_inline(&mut self, inline: Inline) {
        self.ensure_inline_container();
        if let Some(content) = self.stack.last_mut().and_then(Frame::inlines_mut) {
            // merge adjacent text so streaming boundaries leave no trace
            if let (Some(Inline::Text(prev)), Inline::Text(next)) = (content.last_mut(), &inline)
            {
                prev.push_str(next);
                return;
            }
            content.push(inline);
        }
    }

    fn push_block(&mut self, block: Block) {
        match self.stack.last_mut() {
            Some(Frame::Root(blocks)) | Some(Frame::BlockQuote(blocks)) => blocks.push(block),
            Some(Frame::Item(item)) => item.blocks.push(block),
            _ => {}
        }
    }

    fn close_implicit_paragraph(&mut self) {
        if let Some(Frame::Paragraph { implicit: true, .. }) = self.stack.last() {
            self.close();
        }
    }

    fn close(&mut self) {
        if self.stack.len() <= 1 {
            return;
        }
        let Some(frame) = self.stack.pop() else {
            return;
        };
        match frame {
            Frame::Root(_) | Frame::Skip => {}
            Frame::Paragraph { content, .. } => {
                if !content.is_empty() {
                    self.push_block(Block::Paragraph(content));
                }
            }
            Frame::Heading { level, content } => {
                self.push_block(Block::Heading { level, content })
            }
            Frame::BlockQuote(blocks) => self.push_block(Block::BlockQuote(blocks)),
            Frame::Code { language, code } => {
                let block = self.renderer.code_block(language, code);
                self.push_block(Block::Code(block));
            }
            Frame::Html(html) => self.push_block(Block::Html(html)),
            Frame::List { start, items } => self.push_block(Block::List { start, items }),
            Frame::Item(item) => {
                if let Some(Frame::List { items, .. }) = self.stack.last_mut() {
                    items.push(item);
                }
            }
            Frame::Table(table) => self.push_block(Block::Table(table)),
            Frame::TableHead(cells) => {
                if let Some(Frame::Table(table)) = self.stack.last_mut() {
                    table.header = cells;
                }
            }
            Frame::TableRow(cells) => {
                if let Some(Frame::Table(table)) = self.stack.last_mut() {
                    table.rows.push(cells);
                }
            }
            Frame::TableCell(content) => match self.stack.last_mut() {
                Some(Frame::TableHead(cells)) | Some(Frame::TableRow(cells)) => {
                    cells.push(content)
                }
                _ => {}
            },
            Frame::Strong(content) => self.push_inline(Inline::Strong(content)),
            Frame::Emphasis(content) => self.push_inline(Inline::Emphasis(content)),
            Frame::Strikethrough(content) => self.push_inline(Inline::Strikethrough(content)),
            Frame::Link { url, content } => self.push_inline(Inline::Link { url, content }),
            Frame::Image { url, content } => self.push_inline(Inline::Image {
                url,
                alt: Inline::plain_text(&content),
            }),
        }
    }

    fn finish(mut self) -> Vec<Block> {
        while self.stack.len() > 1 {
            self.close();
        }
        match self.stack.pop() {
            Some(Frame::Root(blocks)) => blocks,
            _ => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(value: &str) -> Inline {
        Inline::Text(value.to_string())
    }

    #[test]
    fn renders_headings_paragraphs_and_inline_styles() {
        let rendered = render_markdown("# Title\n\nSome **bold**, *em* and ~~gone~~ `x = 1`.");

        assert_eq!(
            rendered.blocks[0],
            Block::Heading {
                level: 1,
                content: vec![text("Title")]
            }
        );
        assert_eq!(
            rendered.blocks[1],
            Block::Paragraph(vec![
                text("Some "),
                Inline::Strong(vec![text("bold")]),
                text(", "),
                Inline::Emphasis(vec![text("em")]),
                text(" and "),
                Inline::Strikethrough(vec![text("gone")]),
                text(" "),
                Inline::Code("x = 1".to_string()),
                text("."),
            ])
        );
    }

    #[test]
    fn renders_tight_and_task_lists() {
        let rendered = render_markdown("- one\n- two\n\n1. [x] done\n2. [ ] todo\n");

        match &rendered.blocks[0] {
            Block::List { start, items } => {
                assert_eq!(*start, None);
                assert_eq!(items.len(), 2);
                assert_eq!(items[0].blocks, vec![Block::Paragraph(vec![text("one")])]);
            }
            other => panic!("expected list, got {other:?}"),
        }
        match &rendered.blocks[1] {
            Block::List { start, items } => {
                assert_eq!(*start, Some(1));
                assert_eq!(items[0].checked, Some(true));
                assert_eq!(items[1].checked, Some(false));
            }
            other => panic!("expected list, got {other:?}"),
        }
    }

    #[test]
    fn renders_blockquote_rule_and_links() {
        let rendered = render_markdown("> quoted\n\n---\n\n[docs](https://docs.rs)");

        assert_eq!(
            rendered.blocks[0],
            Block::BlockQuote(vec![Block::Paragraph(vec![text("quoted")])])
        );
        assert_eq!(rendered.blocks[1], Block::Rule);
        assert_eq!(
            rendered.blocks[2],
            Block::Paragraph(vec![Inline::Link {
                url: "https://docs.rs".to_string(),
                content: vec![text("docs")],
            }])
        );
    }

    #[test]
    fn autolinks_bare_urls() {
        let rendered = render_markdown("see https://example.com/a. or www.rust-lang.org");

        assert_eq!(
            rendered.blocks[0],
            Block::Paragraph(vec![
                text("see "),
                Inline::Link {
                    url: "https://example.com/a".to_string(),
                    content: vec![text("https://example.com/a")],
                },
                text(". or "),
                Inline::Link {
                    url: "http://www.rust-lang.org".to_string(),
                    content: vec![text("www.rust-lang.org")],
                },
            ])
        );
    }

    #[test]
    fn autolinks_urls_containing_entities() {
        let rendered = render_markdown("see https://example.com/?a=1&amp;b=2 here");

        assert_eq!(
            rendered.blocks[0],
            Block::Paragraph(vec![
                text("see "),
                Inline::Link {
                    url: "https://example.com/?a=1&b=2".to_string(),
                    content: vec![text("https://example.com/?a=1&b=2")],
                },
                text(" here"),
            ])
        );
    }

    #[test]
    fn renders_tables_with_alignment() {
        let rendered = render_markdown("| a | b |\n|:--|--:|\n| 1 | 2 |\n| 3 | 4 |\n");

        match &rendered.blocks[0] {
            Block::Table(table) => {
                assert_eq!(
                    table.alignments,
                    vec![ColumnAlignment::Left, ColumnAlignment::Right]
                );
                assert_eq!(table.header, vec![vec![text("a")], vec![text("b")]]);
                assert_eq!(table.rows.len(), 2);
                assert_eq!(table.rows[1][0], vec![text("3")]);
            }
            other => panic!("expected table, got {other:?}"),
        }
    }

    #[test]
    fn recognized_fence_is_highlighted() {
        let rendered = render_markdown("```python\ndef f():\n    pass\n```\n");
        let blocks = rendered.code_blocks();

        assert_eq!(blocks.len(), 1);
        let block = blocks[0];
        assert_eq!(block.language.as_deref(), Some("python"));
        assert_eq!(block.copy_text(), "def f():\n    pass");
        let lines = block.highlighted.as_ref().expect("python is highlighted");
        assert_eq!(lines.len(), 2);
        assert!(lines[0].len() > 1, "expected several styled spans");
        let line: String = lines[1].iter().map(|x| x.text.as_str()).collect();
        assert_eq!(line, "    pass");
    }

    #[test]
    fn alias_tags_resolve() {
        for tag in ["js", "ts", "py", "c++", "sh", "shell", "json", "html", "css", "java"] {
            assert!(is_recognized_language(tag), "{tag} should be recognized");
        }
    }

    #[test]
    fn unknown_or_missing_fence_tag_falls_back_to_plain() {
        for source in ["```klingon\nqapla'\n```", "```\nplain\n```", "    indented\n"] {
            let rendered = render_markdown(source);
            let blocks = rendered.code_blocks();
            assert_eq!(blocks.len(), 1, "{source}");
            assert!(!blocks[0].is_highlighted(), "{source}");
        }
    }

    #[test]
    fn unterminated_fence_still_renders_code() {
        // mid-stream content often ends inside a fence
        let rendered = render_markdown("Here:\n```rust\nfn main() {");
        let blocks = rendered.code_blocks();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].copy_text(), "fn main() {");
    }

    #[test]
    fn rendering_is_idempotent_and_independent() {
        let first = "# A\n\n```js\nlet a = 1;\n```\n\n- x\n";
        let second = "plain *text*";

        let a1 = render_markdown(first);
        let b = render_markdown(second);
        let a2 = render_markdown(first);

        assert_eq!(a1, a2);
        assert_eq!(b, render_markdown(second));
        assert_ne!(a1, b);
    }

    #[test]
    fn unknown_theme_is_rejected() {
        assert!(Renderer::with_theme("no-such-theme").is_none());
        assert!(theme_names().contains(&DEFAULT_THEME));
    }

    #[test]
    fn code_blocks_found_inside_lists_and_quotes() {
        let rendered = render_markdown("> ```sh\n> ls\n> ```\n\n- item\n\n  ```\n  x\n  ```\n");
        assert_eq!(rendered.code_blocks().len(), 2);
    }
}
