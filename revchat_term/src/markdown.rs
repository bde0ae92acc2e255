use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};
use session::render::{
    Block, CodeBlock, ColumnAlignment, Inline, ListItem, RenderedMessage, SpanStyle, Table,
};

const GUTTER: Style = Style::new().fg(Color::DarkGray);
const INLINE_CODE: Style = Style::new().fg(Color::LightRed).bg(Color::Rgb(40, 40, 40));
const LINK: Style = Style::new()
    .fg(Color::Blue)
    .add_modifier(Modifier::UNDERLINED);
const MUTED: Style = Style::new().fg(Color::DarkGray);
const COPY_CONTROL: Style = Style::new().fg(Color::Cyan);

/// Key that copies the `index`th code block of the transcript (1-based).
pub fn copy_key(index: usize) -> Option<String> {
    (1..=9).contains(&index).then(|| format!("Alt+{index}"))
}

/// Terminal lines for one assistant message. `code_index` numbers code blocks
/// across the whole transcript and is advanced past this message's blocks.
pub fn message_lines(message: &RenderedMessage, code_index: &mut usize) -> Vec<Line<'static>> {
    block_lines(&message.blocks, code_index, true)
}

fn block_lines(blocks: &[Block], code_index: &mut usize, spaced: bool) -> Vec<Line<'static>> {
    let mut lines = vec![];
    for (i, block) in blocks.iter().enumerate() {
        if spaced && i > 0 {
            lines.push(Line::default());
        }
        lines.extend(single_block_lines(block, code_index));
    }
    lines
}

fn single_block_lines(block: &Block, code_index: &mut usize) -> Vec<Line<'static>> {
    match block {
        Block::Heading { level, content } => {
            let style = match level {
                1 => Style::new()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
                2 => Style::new().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                _ => Style::new().add_modifier(Modifier::BOLD),
            };
            inline_lines(content, style)
        }
        Block::Paragraph(content) => inline_lines(content, Style::new()),
        Block::List { start, items } => list_lines(*start, items, code_index),
        Block::BlockQuote(inner) => {
            let quoted = block_lines(inner, code_index, true);
            let bar = Span::styled("▎ ", GUTTER);
            prefixed(quoted, bar.clone(), bar)
                .into_iter()
                .map(|line| line.patch_style(Style::new().add_modifier(Modifier::ITALIC)))
                .collect()
        }
        Block::Code(code) => {
            *code_index += 1;
            code_block_lines(code, *code_index)
        }
        Block::Table(table) => table_lines(table),
        Block::Rule => vec![Line::styled("─".repeat(40), GUTTER)],
        Block::Html(html) => html
            .lines()
            .map(|line| Line::styled(line.to_owned(), MUTED))
            .collect(),
    }
}

fn list_lines(
    start: Option<u64>,
    items: &[ListItem],
    code_index: &mut usize,
) -> Vec<Line<'static>> {
    let mut lines = vec![];
    for (i, item) in items.iter().enumerate() {
        let mut marker = match start {
            Some(n) => format!("{}. ", n + i as u64),
            None => "• ".to_string(),
        };
        match item.checked {
            Some(true) => marker.push_str("[x] "),
            Some(false) => marker.push_str("[ ] "),
            None => {}
        }
        let indent = " ".repeat(marker.chars().count());

        let mut body = block_lines(&item.blocks, code_index, false);
        if body.is_empty() {
            body.push(Line::default());
        }
        lines.extend(prefixed(
            body,
            Span::styled(marker, GUTTER),
            Span::raw(indent),
        ));
    }
    lines
}

fn prefixed(
    lines: Vec<Line<'static>>,
    first: Span<'static>,
    rest: Span<'static>,
) -> Vec<Line<'static>> {
    lines
        .into_iter()
        .enumerate()
        .map(|(i, line)| {
            let prefix = if i == 0 { first.clone() } else { rest.clone() };
            let mut spans = Vec::with_capacity(line.spans.len() + 1);
            spans.push(prefix);
            spans.extend(line.spans);
            Line::from(spans).style(line.style)
        })
        .collect()
}

fn syntect_style(style: &SpanStyle) -> Style {
    let mut out = Style::new().fg(Color::Rgb(
        style.foreground.0,
        style.foreground.1,
        style.foreground.2,
    ));
    if style.bold {
        out = out.add_modifier(Modifier::BOLD);
    }
    if style.italic {
        out = out.add_modifier(Modifier::ITALIC);
    }
    if style.underline {
        out = out.add_modifier(Modifier::UNDERLINED);
    }
    out
}

fn code_block_lines(code: &CodeBlock, index: usize) -> Vec<Line<'static>> {
    let language = code.language.clone().unwrap_or_else(|| "text".to_string());
    let mut header = vec![
        Span::styled("╭─ ", GUTTER),
        Span::styled(language, Style::new().add_modifier(Modifier::BOLD)),
        Span::styled(" ─── ", GUTTER),
    ];
    match copy_key(index) {
        Some(key) => header.push(Span::styled(format!("⧉ copy ({key})"), COPY_CONTROL)),
        None => header.push(Span::styled("⧉ copy (Ctrl+Y when last)", COPY_CONTROL)),
    }

    let mut lines = vec![Line::from(header)];
    match &code.highlighted {
        Some(highlighted) => {
            for line in highlighted {
                let mut spans = vec![Span::styled("│ ", GUTTER)];
                spans.extend(line.iter().map(|span| {
                    Span::styled(expand_tabs(&span.text), syntect_style(&span.style))
                }));
                lines.push(Line::from(spans));
            }
        }
        None => {
            for line in code.code.split('\n') {
                lines.push(Line::from(vec![
                    Span::styled("│ ", GUTTER),
                    Span::raw(expand_tabs(line)),
                ]));
            }
        }
    }
    lines.push(Line::styled("╰─", GUTTER));
    lines
}

fn expand_tabs(text: &str) -> String {
    text.replace('\t', "    ")
}

fn table_lines(table: &Table) -> Vec<Line<'static>> {
    let header: Vec<String> = table.header.iter().map(|x| Inline::plain_text(x)).collect();
    let rows: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|row| row.iter().map(|x| Inline::plain_text(x)).collect())
        .collect();

    let columns = std::iter::once(&header)
        .chain(rows.iter())
        .map(Vec::len)
        .max()
        .unwrap_or(0);
    let mut widths = vec![0; columns];
    for row in std::iter::once(&header).chain(rows.iter()) {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let row_line = |row: &[String], style: Style| {
        let mut spans = vec![];
        for (i, width) in widths.iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled(" │ ", GUTTER));
            }
            let cell = row.get(i).map(String::as_str).unwrap_or("");
            let alignment = table
                .alignments
                .get(i)
                .copied()
                .unwrap_or(ColumnAlignment::None);
            spans.push(Span::styled(align(cell, *width, alignment), style));
        }
        Line::from(spans)
    };

    let mut lines = vec![row_line(&header, Style::new().add_modifier(Modifier::BOLD))];
    let separator = widths
        .iter()
        .map(|width| "─".repeat(*width))
        .collect::<Vec<_>>()
        .join("─┼─");
    lines.push(Line::styled(separator, GUTTER));
    for row in &rows {
        lines.push(row_line(row, Style::new()));
    }
    lines
}

fn align(cell: &str, width: usize, alignment: ColumnAlignment) -> String {
    match alignment {
        ColumnAlignment::Right => format!("{cell:>width$}"),
        ColumnAlignment::Center => format!("{cell:^width$}"),
        ColumnAlignment::Left | ColumnAlignment::None => format!("{cell:<width$}"),
    }
}

fn inline_lines(inlines: &[Inline], style: Style) -> Vec<Line<'static>> {
    let mut writer = InlineWriter::default();
    writer.write(inlines, style);
    writer.finish()
}

#[derive(Default)]
struct InlineWriter {
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
}

impl InlineWriter {
    fn write(&mut self, inlines: &[Inline], style: Style) {
        for inline in inlines {
            match inline {
                Inline::Text(text) => self.push(text.clone(), style),
                Inline::Code(code) => self.push(code.clone(), style.patch(INLINE_CODE)),
                Inline::Strong(inner) => self.write(inner, style.add_modifier(Modifier::BOLD)),
                Inline::Emphasis(inner) => self.write(inner, style.add_modifier(Modifier::ITALIC)),
                Inline::Strikethrough(inner) => {
                    self.write(inner, style.add_modifier(Modifier::CROSSED_OUT))
                }
                Inline::Link { url, content } => {
                    self.write(content, style.patch(LINK));
                    if Inline::plain_text(content) != *url {
                        self.push(format!(" ({url})"), MUTED);
                    }
                }
                Inline::Image { url, alt } => self.push(format!("[image: {alt}] ({url})"), MUTED),
                Inline::SoftBreak => self.push(" ".to_string(), style),
                Inline::HardBreak => self.break_line(),
            }
        }
    }

    fn push(&mut self, text: String, style: Style) {
        self.current.push(Span::styled(text, style));
    }

    fn break_line(&mut self) {
        let spans = std::mem::take(&mut self.current);
        self.lines.push(Line::from(spans));
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        if !self.current.is_empty() || self.lines.is_empty() {
            self.break_line();
        }
        self.lines
    }
}
