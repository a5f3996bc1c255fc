//! Paragraph-aware chunking with overlap and oversized-paragraph force-split.
//!
//! Chunk boundaries are expressed as character spans into the *original*
//! text, so `text[span.start..span.end]` is always exactly the chunk's
//! content — no separate reconstruction step that could drift from the
//! source.

use regex::Regex;

/// A half-open character range into the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSpan {
    pub start: usize,
    pub end: usize,
}

fn char_count(s: &str) -> usize {
    s.chars().count()
}

/// Split text on blank-line paragraph boundaries, returning `(start, end,
/// trimmed_text)` triples with char offsets into the original text.
fn split_paragraphs(text: &str) -> Vec<(usize, usize, String)> {
    let boundary = Regex::new(r"\n[ \t\r]*\n+").expect("static regex");

    let mut out = Vec::new();
    let mut byte_pos = 0usize;
    let mut char_pos = 0usize;

    let mut push_segment = |seg: &str, char_pos: usize, out: &mut Vec<(usize, usize, String)>| {
        let trimmed = seg.trim();
        if !trimmed.is_empty() {
            let leading_ws = char_count(&seg[..seg.len() - seg.trim_start().len()]);
            let start = char_pos + leading_ws;
            let end = start + char_count(trimmed);
            out.push((start, end, trimmed.to_string()));
        }
    };

    for m in boundary.find_iter(text) {
        let seg = &text[byte_pos..m.start()];
        push_segment(seg, char_pos, &mut out);
        char_pos += char_count(seg);
        let sep = &text[m.start()..m.end()];
        char_pos += char_count(sep);
        byte_pos = m.end();
    }
    let seg = &text[byte_pos..];
    push_segment(seg, char_pos, &mut out);

    out
}

/// Find the best split point inside `[offset + lo, offset + hi]` (clamped to
/// `remaining`): nearest sentence terminator, else nearest newline, else
/// nearest space, else a hard cut at `hi`.
fn find_split_point(chars: &[char], offset: usize, lo: usize, hi: usize, remaining: usize) -> usize {
    let window_hi = offset + hi.min(remaining);
    let window_lo = offset + lo.min(remaining).min(hi.min(remaining));

    if window_lo >= window_hi {
        return window_hi.max(offset + 1).min(offset + remaining);
    }

    for i in (window_lo..window_hi).rev() {
        if matches!(chars[i], '.' | '?' | '!') {
            return (i + 1).min(offset + remaining);
        }
    }
    for i in (window_lo..window_hi).rev() {
        if chars[i] == '\n' {
            return (i + 1).min(offset + remaining);
        }
    }
    for i in (window_lo..window_hi).rev() {
        if chars[i] == ' ' {
            return (i + 1).min(offset + remaining);
        }
    }
    window_hi
}

/// Force-split a single oversized paragraph into several pieces, each
/// carrying an `overlap`-sized backward slice from the previous piece.
fn force_split_paragraph(start: usize, text: &str, chunk_size: usize, overlap: usize) -> Vec<(usize, usize, String)> {
    let chars: Vec<char> = text.chars().collect();
    let total = chars.len();
    let mut out = Vec::new();
    let mut offset = 0usize;

    let lo = ((chunk_size as f64) * 0.7) as usize;
    let hi = chunk_size;

    while offset < total {
        let remaining = total - offset;
        if remaining <= chunk_size {
            let piece: String = chars[offset..].iter().collect();
            out.push((start + offset, start + total, piece));
            break;
        }

        let split_at = find_split_point(&chars, offset, lo, hi, remaining);
        let piece: String = chars[offset..split_at].iter().collect();
        out.push((start + offset, start + split_at, piece));

        let next_offset = split_at.saturating_sub(overlap);
        offset = if next_offset > offset { next_offset } else { split_at };
    }

    out
}

/// Expand any paragraph exceeding `chunk_size * 1.5` into multiple pieces.
fn expand_oversized(paragraphs: Vec<(usize, usize, String)>, chunk_size: usize, overlap: usize) -> Vec<(usize, usize, String)> {
    let threshold = ((chunk_size as f64) * 1.5) as usize;
    let mut out = Vec::new();
    for (start, end, text) in paragraphs {
        if char_count(&text) > threshold {
            out.extend(force_split_paragraph(start, &text, chunk_size, overlap));
        } else {
            out.push((start, end, text));
        }
    }
    out
}

/// Chunk `text` into greedy paragraph-concatenated spans of roughly
/// `chunk_size` characters, carrying `overlap` characters of context
/// backward across each flush. Empty/whitespace-only input yields no spans.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<ChunkSpan> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let paragraphs = expand_oversized(split_paragraphs(text), chunk_size, overlap);
    if paragraphs.is_empty() {
        return Vec::new();
    }

    let mut spans = Vec::new();
    let mut cur_start = paragraphs[0].0;
    let mut cur_end = paragraphs[0].1;

    for (p_start, p_end, _) in paragraphs.into_iter().skip(1) {
        let prospective_len = p_end - cur_start;
        if prospective_len > chunk_size {
            spans.push(ChunkSpan { start: cur_start, end: cur_end });
            cur_start = cur_end.saturating_sub(overlap);
            cur_end = p_end;
        } else {
            cur_end = p_end;
        }
    }
    spans.push(ChunkSpan { start: cur_start, end: cur_end });
    spans
}

/// Resolve spans against `text`, trimming whitespace at each boundary and
/// dropping any span that trims to nothing.
pub fn materialize(text: &str, spans: &[ChunkSpan]) -> Vec<(usize, usize, String)> {
    let chars: Vec<char> = text.chars().collect();
    spans
        .iter()
        .filter_map(|s| {
            let end = s.end.min(chars.len());
            let start = s.start.min(end);
            let raw: String = chars[start..end].iter().collect();
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return None;
            }
            let leading_ws = char_count(&raw[..raw.len() - raw.trim_start().len()]);
            let new_start = start + leading_ws;
            let new_end = new_start + char_count(trimmed);
            Some((new_start, new_end, trimmed.to_string()))
        })
        .collect()
}
