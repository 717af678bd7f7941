//! Document chunking.
//!
//! [`RecursiveChunker`] splits text into overlap-free fragments of at most
//! `chunk_size` characters. It cuts on the coarsest separator present in an
//! oversized span and only falls back to finer ones for pieces that are
//! still too long:
//!
//! 1. `"\n\n"` (paragraph)
//! 2. `"\n"` (line)
//! 3. `". "`, `"! "`, `"? "` (sentence)
//! 4. `" "` (word)
//! 5. hard cut at a character boundary
//!
//! Pieces are trimmed and then merged greedily, left to right, while the
//! merged source slice still fits. Every fragment is an exact slice of the
//! source, and only whitespace is left between consecutive fragments.

use std::ops::Range;

use crate::document::{Chunk, Document};

/// Separator cascade, coarse to fine.
pub const DEFAULT_SEPARATORS: &[&str] = &["\n\n", "\n", ". ", "! ", "? ", " "];

/// A strategy for splitting documents into chunks.
///
/// Implementations produce [`Chunk`]s with text and metadata but no embeddings.
/// Embeddings are attached later when the index is built.
pub trait Chunker: Send + Sync {
    /// Split a document into chunks.
    ///
    /// Returns an empty `Vec` if the document has no non-whitespace text.
    fn chunk(&self, document: &Document) -> Vec<Chunk>;
}

/// A piece of source text produced by [`RecursiveChunker::split`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fragment<'a> {
    /// Byte offset of `text` in the source.
    pub offset: usize,
    pub text: &'a str,
}

impl Fragment<'_> {
    /// Byte offset one past the end of the fragment.
    pub fn end(&self) -> usize {
        self.offset + self.text.len()
    }
}

/// Splits text hierarchically: paragraphs → lines → sentences → words → characters.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::RecursiveChunker;
///
/// let chunker = RecursiveChunker::new(1000);
/// for fragment in chunker.split(&text) {
///     println!("{} @ {}", fragment.text, fragment.offset);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    separators: &'static [&'static str],
}

impl RecursiveChunker {
    /// Create a chunker producing fragments of at most `chunk_size` characters.
    ///
    /// A `chunk_size` of zero is treated as one.
    pub fn new(chunk_size: usize) -> Self {
        Self { chunk_size: chunk_size.max(1), separators: DEFAULT_SEPARATORS }
    }

    /// Replace the separator cascade. Separators must end in whitespace so
    /// that trimming removes them from fragment boundaries.
    pub fn with_separators(mut self, separators: &'static [&'static str]) -> Self {
        self.separators = separators;
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Lazily split `text`.
    ///
    /// The returned iterator is `Clone`; cloning it before consuming gives an
    /// independent pass over the same fragments.
    pub fn split<'a>(&self, text: &'a str) -> Splits<'a> {
        let root = trim_span(text, 0..text.len());
        let stack = if root.is_empty() {
            Vec::new()
        } else {
            vec![Frame { pieces: Pieces::Single(Some(root)), next_level: 0, pending: None }]
        };

        Splits { text, chunk_size: self.chunk_size, separators: self.separators, stack }
    }
}

impl Chunker for RecursiveChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        self.split(&document.text)
            .enumerate()
            .map(|(i, fragment)| {
                let mut metadata = document.metadata.clone();
                metadata.insert("chunk_index".to_string(), i.to_string());
                Chunk {
                    id: format!("{}_{i}", document.id),
                    text: fragment.text.to_string(),
                    offset: fragment.offset,
                    embedding: Vec::new(),
                    metadata,
                    document_id: document.id.clone(),
                }
            })
            .collect()
    }
}

/// Iterator over the fragments of one text. See [`RecursiveChunker::split`].
#[derive(Debug, Clone)]
pub struct Splits<'a> {
    text: &'a str,
    chunk_size: usize,
    separators: &'static [&'static str],
    stack: Vec<Frame>,
}

/// One level of recursion: the pieces of a span plus the merge in progress.
#[derive(Debug, Clone)]
struct Frame {
    pieces: Pieces,
    /// First separator to try on pieces that are still too long.
    next_level: usize,
    pending: Option<Pending>,
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    start: usize,
    end: usize,
    chars: usize,
}

#[derive(Debug, Clone)]
enum Pieces {
    Single(Option<Range<usize>>),
    Separated { separator: &'static str, pos: usize, end: usize },
    Hard { pos: usize, end: usize },
}

impl Pieces {
    fn next(&mut self, text: &str, chunk_size: usize) -> Option<Range<usize>> {
        match self {
            Pieces::Single(span) => span.take(),
            Pieces::Separated { separator, pos, end } => {
                if *pos >= *end {
                    return None;
                }
                let start = *pos;
                let stop = match text[start..*end].find(*separator) {
                    Some(i) => start + i + separator.len(),
                    None => *end,
                };
                *pos = stop;
                Some(start..stop)
            }
            Pieces::Hard { pos, end } => {
                if *pos >= *end {
                    return None;
                }
                let start = *pos;
                let stop = text[start..*end]
                    .char_indices()
                    .nth(chunk_size)
                    .map(|(i, _)| start + i)
                    .unwrap_or(*end);
                *pos = stop;
                Some(start..stop)
            }
        }
    }
}

fn frame_for(
    text: &str,
    separators: &'static [&'static str],
    span: Range<usize>,
    level: usize,
) -> Frame {
    let slice = &text[span.clone()];
    for (i, &separator) in separators.iter().enumerate().skip(level) {
        if slice.contains(separator) {
            return Frame {
                pieces: Pieces::Separated { separator, pos: span.start, end: span.end },
                next_level: i + 1,
                pending: None,
            };
        }
    }

    Frame {
        pieces: Pieces::Hard { pos: span.start, end: span.end },
        next_level: separators.len(),
        pending: None,
    }
}

fn trim_span(text: &str, span: Range<usize>) -> Range<usize> {
    let slice = &text[span.clone()];
    let start = span.start + (slice.len() - slice.trim_start().len());
    let end = span.start + slice.trim_end().len();
    if start >= end { start..start } else { start..end }
}

impl<'a> Splits<'a> {
    fn fragment(&self, pending: Pending) -> Fragment<'a> {
        Fragment { offset: pending.start, text: &self.text[pending.start..pending.end] }
    }
}

impl<'a> Iterator for Splits<'a> {
    type Item = Fragment<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let text = self.text;
        let chunk_size = self.chunk_size;

        loop {
            let frame = self.stack.last_mut()?;

            let Some(piece) = frame.pieces.next(text, chunk_size) else {
                let pending = frame.pending.take();
                self.stack.pop();
                match pending {
                    Some(pending) => return Some(self.fragment(pending)),
                    None => continue,
                }
            };

            let piece = trim_span(text, piece);
            if piece.is_empty() {
                continue;
            }
            let piece_chars = text[piece.clone()].chars().count();

            if let Some(pending) = frame.pending.as_mut() {
                let merged = pending.chars + text[pending.end..piece.end].chars().count();
                if merged <= chunk_size {
                    pending.end = piece.end;
                    pending.chars = merged;
                    continue;
                }
            }

            let flushed = frame.pending.take();
            if piece_chars <= chunk_size {
                frame.pending =
                    Some(Pending { start: piece.start, end: piece.end, chars: piece_chars });
            } else {
                let level = frame.next_level;
                self.stack.push(frame_for(text, self.separators, piece, level));
            }

            if let Some(pending) = flushed {
                return Some(self.fragment(pending));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(chunker: &RecursiveChunker, text: &str) -> Vec<String> {
        chunker.split(text).map(|f| f.text.to_string()).collect()
    }

    #[test]
    fn trim_span_handles_all_whitespace() {
        let text = "  \n\t ";
        assert!(trim_span(text, 0..text.len()).is_empty());
        assert_eq!(trim_span(" ab ", 0..4), 1..3);
    }

    #[test]
    fn separator_is_chosen_coarse_to_fine() {
        let chunker = RecursiveChunker::new(12);
        // paragraph break wins over the sentence boundary inside the first paragraph
        let out = texts(&chunker, "One. Two.\n\nThree four.");
        assert_eq!(out, vec!["One. Two.", "Three four."]);
    }

    #[test]
    fn chunk_size_zero_is_clamped() {
        let chunker = RecursiveChunker::new(0);
        assert_eq!(chunker.chunk_size(), 1);
        assert_eq!(texts(&chunker, "ab"), vec!["a", "b"]);
    }

    #[test]
    fn custom_separators() {
        let chunker = RecursiveChunker::new(3).with_separators(&["; "]);
        assert_eq!(texts(&chunker, "ab; cd; ef"), vec!["ab;", "cd;", "ef"]);
    }
}
