//! rustc-like source excerpts for errors.
//!
//! Rendering happens once, when an error leaves the loader, so errors keep a small
//! pre-rendered window instead of the whole document text.

use annotate_snippets::{
    AnnotationKind, Level, Renderer, Snippet as AnnotateSnippet, renderer::DecorStyle,
};

use crate::location::Location;

/// Source text plus display name used to render a snippet.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Snippet<'a> {
    text: &'a str,
    path: &'a str,
    /// Maximum number of *columns* kept on each side of the error column when cropping
    /// very long lines.
    crop_radius: usize,
}

impl<'a> Snippet<'a> {
    pub(crate) fn new(text: &'a str, path: &'a str, crop_radius: usize) -> Self {
        Self {
            text,
            path,
            crop_radius,
        }
    }

    /// Render `msg` against a window of two lines around `location`.
    ///
    /// Returns `None` when the location is unknown or falls outside the text, in which case
    /// the caller keeps the plain error.
    pub(crate) fn render(&self, msg: &str, location: &Location) -> Option<String> {
        if !location.is_known() {
            return None;
        }
        // Keep snippet coordinates aligned with parsers that ignore a leading UTF-8 BOM.
        let text = self.text.strip_prefix('\u{FEFF}').unwrap_or(self.text);

        let row = location.line as usize;
        let col = location.column as usize;

        let starts = line_starts(text);
        if row == 0 || row > starts.len() {
            return None;
        }
        let start = line_col_to_byte_offset_with_starts(text, &starts, row, col)?;

        // Caret-like span: one character, or empty at EOL/EOF.
        let end = match text.as_bytes().get(start) {
            Some(b'\n') | Some(b'\r') => start,
            _ => next_char_boundary(text, start).unwrap_or(start),
        };

        let total_lines = starts.len();
        let window_start_row = row.saturating_sub(2).max(1);
        let window_end_row = row.saturating_add(2).min(total_lines);
        let window_start_row = window_start_row.min(window_end_row);

        let window_start = starts[window_start_row - 1];
        let window_end = if window_end_row < total_lines {
            starts[window_end_row]
        } else {
            text.len()
        };
        let window_text = &text[window_start..window_end];

        let local_start = start.saturating_sub(window_start).min(window_text.len());
        let local_end = end.saturating_sub(window_start).min(window_text.len());

        let (window_text, local_start, local_end) = crop_window_text(
            window_text,
            window_start_row,
            row,
            col,
            self.crop_radius,
            local_start,
            local_end,
        );

        let report = &[Level::ERROR
            .primary_title(format!("line {row} column {col}: {msg}"))
            .element(
                AnnotateSnippet::source(&window_text)
                    .line_start(window_start_row)
                    .path(self.path)
                    .fold(false)
                    .annotation(
                        AnnotationKind::Primary
                            .span(local_start..local_end)
                            .label(msg),
                    ),
            )];

        // Plain ASCII decoration keeps `Display` output stable and free of escape sequences.
        let renderer = Renderer::plain().decor_style(DecorStyle::Ascii);
        Some(renderer.render(report).to_string())
    }
}

/// Replace control characters (except `\n` and `\t`) without changing byte length,
/// so spans computed on the original text stay valid.
fn sanitize_preserve_len(s: String) -> String {
    let mut bytes = s.into_bytes();
    for x in &mut bytes {
        if (*x < 0x20 && *x != b'\n' && *x != b'\t') || *x == 0x7F {
            *x = b' ';
        }
    }
    // UTF-8 encoded C1 controls (0xC2 0x80..=0x9F) become NBSP (0xC2 0xA0).
    let mut i = 0usize;
    while i + 1 < bytes.len() {
        if bytes[i] == 0xC2 && (0x80..=0x9F).contains(&bytes[i + 1]) {
            bytes[i + 1] = 0xA0;
            i += 2;
            continue;
        }
        i += 1;
    }
    match String::from_utf8(bytes) {
        Ok(out) => out,
        Err(e) => String::from_utf8_lossy(&e.into_bytes()).into_owned(),
    }
}

/// Horizontally crop the window by character columns, normalize CRLF and rebase the
/// annotation span onto the produced text.
fn crop_window_text(
    window_text: &str,
    window_start_row: usize,
    error_row: usize,
    error_col: usize,
    crop_radius: usize,
    local_start: usize,
    local_end: usize,
) -> (String, usize, usize) {
    let do_crop = crop_radius != 0;
    let left_col = error_col.saturating_sub(crop_radius).max(1);
    let right_col = error_col.saturating_add(crop_radius);

    let mut out = String::with_capacity(window_text.len().min(4096));
    let mut old_pos = 0usize;
    let mut new_local_start = local_start;
    let mut new_local_end = local_end;
    let mut rebased = false;

    let mut row = window_start_row;
    while old_pos < window_text.len() {
        let next_nl = window_text[old_pos..].find('\n').map(|i| old_pos + i);
        let (line_raw, had_nl, consumed) = match next_nl {
            Some(nl) => (&window_text[old_pos..nl], true, (nl - old_pos) + 1),
            None => (&window_text[old_pos..], false, window_text.len() - old_pos),
        };
        let line = line_raw.strip_suffix('\r').unwrap_or(line_raw);

        let line_start_old = old_pos;
        let line_start_new = out.len();

        let (rendered_line, crop) = if do_crop {
            crop_line_by_cols(line, left_col, right_col)
        } else {
            (line.to_owned(), LineCrop::NONE)
        };

        out.push_str(&rendered_line);
        if had_nl {
            out.push('\n');
        }

        if row == error_row {
            let in_line_start = local_start
                .saturating_sub(line_start_old)
                .min(line.len())
                .saturating_sub(crop.start_byte);
            let in_line_end = local_end
                .saturating_sub(line_start_old)
                .min(line.len())
                .saturating_sub(crop.start_byte);

            let max = line_start_new + rendered_line.len();
            new_local_start = (line_start_new + crop.prefix_bytes + in_line_start).min(max);
            new_local_end = (line_start_new + crop.prefix_bytes + in_line_end).min(max);
            rebased = true;
        }

        old_pos += consumed;
        row += 1;
        if !had_nl {
            break;
        }
    }

    // Error on the implicit empty line after a trailing '\n' (EOF errors).
    if !rebased && window_text.ends_with('\n') && row == error_row {
        new_local_start = out.len();
        new_local_end = out.len();
    }

    let max = out.len();
    new_local_start = new_local_start.min(max);
    new_local_end = new_local_end.min(max).max(new_local_start);

    (sanitize_preserve_len(out), new_local_start, new_local_end)
}

#[derive(Clone, Copy, Debug)]
struct LineCrop {
    start_byte: usize,
    prefix_bytes: usize,
}

impl LineCrop {
    const NONE: Self = Self {
        start_byte: 0,
        prefix_bytes: 0,
    };
}

/// Crop one line to the 1-based column window `[left_col, right_col]`, marking clipped
/// ends with `…`.
fn crop_line_by_cols(line: &str, left_col: usize, right_col: usize) -> (String, LineCrop) {
    let line_len_cols = line.chars().count();
    if line_len_cols == 0 {
        return (String::new(), LineCrop::NONE);
    }
    // Short context lines that would crop to nothing stay intact.
    if left_col > line_len_cols || (left_col <= 1 && right_col >= line_len_cols) {
        return (line.to_owned(), LineCrop::NONE);
    }

    let end_col_excl = right_col.saturating_add(1).min(line_len_cols + 1);
    let start_byte = col_to_byte_offset_in_line(line, left_col).unwrap_or(0);
    let end_byte = col_to_byte_offset_in_line(line, end_col_excl).unwrap_or(line.len());

    let left_clipped = left_col > 1 && start_byte > 0;
    let right_clipped = end_col_excl <= line_len_cols && end_byte < line.len();

    let mut out = String::new();
    if left_clipped {
        out.push('…');
    }
    out.push_str(&line[start_byte..end_byte]);
    if right_clipped {
        out.push('…');
    }

    let prefix_bytes = if left_clipped { '…'.len_utf8() } else { 0 };
    (
        out,
        LineCrop {
            start_byte,
            prefix_bytes,
        },
    )
}

/// Convert a 1-based column to a byte offset within a single line. Column `len + 1` is EOL.
fn col_to_byte_offset_in_line(line: &str, col: usize) -> Option<usize> {
    if col == 0 {
        return None;
    }
    match line.char_indices().nth(col - 1) {
        Some((i, _)) => Some(i),
        None if line.chars().count() + 1 == col => Some(line.len()),
        None => None,
    }
}

/// Byte offsets of all line starts. A trailing `\n` yields an extra, empty last line.
fn line_starts(source: &str) -> Vec<usize> {
    if source.is_empty() {
        return Vec::new();
    }
    let mut starts = vec![0usize];
    for (i, b) in source.as_bytes().iter().enumerate() {
        if *b == b'\n' {
            starts.push(i + 1);
        }
    }
    starts
}

fn line_col_to_byte_offset_with_starts(
    source: &str,
    starts: &[usize],
    row: usize,
    col: usize,
) -> Option<usize> {
    let row_idx = row.checked_sub(1)?;
    let line_start = *starts.get(row_idx)?;
    let mut line_end = match starts.get(row_idx + 1) {
        Some(next) => next.saturating_sub(1),
        None => source.len(),
    };
    if line_end > line_start && source.as_bytes().get(line_end - 1) == Some(&b'\r') {
        line_end -= 1;
    }
    let line = &source[line_start..line_end];
    col_to_byte_offset_in_line(line, col).map(|off| line_start + off)
}

fn next_char_boundary(source: &str, start: usize) -> Option<usize> {
    let mut it = source.get(start..)?.char_indices();
    it.next()?;
    match it.next() {
        Some((i, _)) => Some(start + i),
        None => Some(source.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_offending_line_with_path() {
        let text = "name: x\nport: eighty\nhost: y\n";
        let snippet = Snippet::new(text, "config.yaml", 64);
        let rendered = snippet
            .render("invalid integer", &Location::new(2, 7))
            .expect("location is inside the text");
        assert!(rendered.contains("config.yaml"), "{rendered}");
        assert!(rendered.contains("port: eighty"), "{rendered}");
        assert!(rendered.contains('^'), "{rendered}");
    }

    #[test]
    fn unknown_or_out_of_range_location_renders_nothing() {
        let snippet = Snippet::new("a: 1\n", "<input>", 64);
        assert!(snippet.render("boom", &Location::UNKNOWN).is_none());
        assert!(snippet.render("boom", &Location::new(40, 1)).is_none());
    }

    #[test]
    fn long_lines_are_cropped_around_the_column() {
        let line = format!("key: {}", "x".repeat(300));
        let (cropped, _) = crop_line_by_cols(&line, 100, 120);
        assert!(cropped.starts_with('…'));
        assert!(cropped.ends_with('…'));
        assert!(cropped.chars().count() < 30);
    }

    #[test]
    fn control_characters_are_neutralized() {
        let cleaned = sanitize_preserve_len("a\u{1b}[31mb\n".to_string());
        assert_eq!(cleaned.len(), "a\u{1b}[31mb\n".len());
        assert!(!cleaned.contains('\u{1b}'));
    }
}
