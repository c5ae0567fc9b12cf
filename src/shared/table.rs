//! Table formatting utilities for terminal output.
//!
//! Column widths use Unicode display width so CJK titles and author names
//! stay aligned.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Widest a single column may grow before its cells are truncated.
pub const MAX_COLUMN_WIDTH: usize = 60;

/// Truncates a string to fit within the specified display width.
pub fn truncate_to_width(s: &str, max_width: usize) -> String {
    let mut result = String::new();
    let mut current_width = 0;

    for c in s.chars() {
        let char_width = c.width().unwrap_or(0);
        if current_width + char_width > max_width {
            break;
        }
        result.push(c);
        current_width += char_width;
    }

    result
}

/// Pads or truncates a string to exactly the specified display width,
/// using "..." as the truncation marker when there is room for it.
pub fn pad_or_truncate(s: &str, width: usize) -> String {
    let display_width = s.width();

    if display_width <= width {
        format!("{}{}", s, " ".repeat(width - display_width))
    } else if width < 3 {
        truncate_to_width(s, width)
    } else {
        let truncated = truncate_to_width(s, width - 3);
        let padding = width.saturating_sub(truncated.width()).saturating_sub(3);
        format!("{}...{}", truncated, " ".repeat(padding))
    }
}

/// Collapse a cell to a single line so rows never wrap.
fn single_line(cell: &str) -> String {
    cell.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Render headers and rows as an aligned, space-separated table.
/// The last column is left unpadded.
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let rows: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.iter().map(|c| single_line(c)).collect())
        .collect();

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, header)| {
            rows.iter()
                .filter_map(|row| row.get(i))
                .map(|cell| cell.width())
                .chain(std::iter::once(header.width()))
                .max()
                .unwrap_or(0)
                .min(MAX_COLUMN_WIDTH)
        })
        .collect();

    let header_cells: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    let mut out = String::new();
    for row in std::iter::once(&header_cells).chain(rows.iter()) {
        let last = headers.len().saturating_sub(1);
        let line: Vec<String> = widths
            .iter()
            .enumerate()
            .map(|(i, width)| {
                let cell = row.get(i).map(String::as_str).unwrap_or("");
                if i == last {
                    truncate_to_width(cell, *width)
                } else {
                    pad_or_truncate(cell, *width)
                }
            })
            .collect();
        out.push_str(line.join("  ").trim_end());
        out.push('\n');
    }
    out
}
