//! Token-bounded document splitting
//!
//! [`ChunkSplitter`] packs text greedily into chunks that never exceed a token
//! budget, cutting at the coarsest boundary that works: paragraphs first, then
//! sentences, then words, and as a last resort token-exact slices of a word.

use super::traits::{TokenCounter, TokenCounterRef};
use crate::{ParsingError, ParsingResult};
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

const PARAGRAPH_SEPARATOR: &str = "\n\n";
const SENTENCE_SEPARATOR: &str = " ";
const WORD_SEPARATOR: &str = " ";

fn paragraph_break() -> Option<&'static Regex> {
    static PARAGRAPH_BREAK: OnceLock<Option<Regex>> = OnceLock::new();
    PARAGRAPH_BREAK
        .get_or_init(|| Regex::new(r"\n[ \t\r]*\n").ok())
        .as_ref()
}

/// A contiguous, token-bounded slice of a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    /// Position in document order, starting at 0
    pub index: usize,
    pub text: String,
    /// Exact token count of `text`
    pub token_count: usize,
}

/// Splits documents into chunks using a shared token counter
pub struct ChunkSplitter {
    counter: TokenCounterRef,
}

impl ChunkSplitter {
    pub fn new(counter: TokenCounterRef) -> Self {
        Self { counter }
    }

    /// Split `text` into ordered chunks of at most `max_input_tokens` tokens
    ///
    /// Blank input yields no chunks.
    ///
    /// # Errors
    /// Returns `ParsingError::ChunkOverflow` for a zero budget or when a
    /// single character already exceeds the budget
    pub fn split(&self, text: &str, max_input_tokens: usize) -> ParsingResult<Vec<Chunk>> {
        if max_input_tokens == 0 {
            return Err(ParsingError::chunk_overflow(0, "token budget must be positive"));
        }

        let mut packer = ChunkPacker::new(self.counter.as_ref(), max_input_tokens);

        for paragraph in split_paragraphs(text) {
            let tokens = self.counter.count(paragraph);
            if tokens <= max_input_tokens {
                packer.push(paragraph, PARAGRAPH_SEPARATOR, tokens)?;
                continue;
            }

            tracing::debug!(tokens, max_input_tokens, "Paragraph over budget, splitting sentences");
            packer.seal()?;
            for sentence in split_sentences(paragraph) {
                self.push_sentence(&mut packer, sentence)?;
            }
            // The tail of a split paragraph is never joined to the next one
            packer.seal()?;
        }

        let chunks = packer.finish()?;
        tracing::debug!(
            chunks = chunks.len(),
            max_input_tokens,
            counter = self.counter.name(),
            "Split document"
        );
        Ok(chunks)
    }

    fn push_sentence(&self, packer: &mut ChunkPacker<'_>, sentence: &str) -> ParsingResult<()> {
        let budget = packer.budget;
        let tokens = self.counter.count(sentence);
        if tokens <= budget {
            return packer.push(sentence, SENTENCE_SEPARATOR, tokens);
        }

        packer.seal()?;
        for word in sentence.split_whitespace() {
            let tokens = self.counter.count(word);
            if tokens <= budget {
                packer.push(word, WORD_SEPARATOR, tokens)?;
                continue;
            }

            packer.seal()?;
            let mut rest = word;
            while !rest.is_empty() {
                let piece = self.counter.truncate(rest, budget);
                if piece.is_empty() {
                    return Err(ParsingError::chunk_overflow(
                        budget,
                        "a single character encodes to more tokens than the budget",
                    ));
                }
                let tokens = self.counter.count(&piece);
                rest = rest.get(piece.len()..).unwrap_or_default();
                packer.push(&piece, "", tokens)?;
            }
        }
        Ok(())
    }
}

/// Non-blank paragraphs, trimmed, in document order
fn split_paragraphs(text: &str) -> Vec<&str> {
    match paragraph_break() {
        Some(re) => re.split(text).map(str::trim).filter(|p| !p.is_empty()).collect(),
        None => text
            .split(PARAGRAPH_SEPARATOR)
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect(),
    }
}

/// Sentences split on `". "`, each keeping its period
fn split_sentences(paragraph: &str) -> impl Iterator<Item = &str> {
    paragraph
        .split_inclusive(". ")
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

struct Piece {
    separator: &'static str,
    text: String,
    tokens: usize,
}

/// Greedy accumulator behind [`ChunkSplitter`]
///
/// Pieces are packed using the sum of their individual counts. Tokenizers can
/// merge differently across a seam, so each chunk is re-counted when sealed
/// and trailing pieces are carried into the next chunk until it fits.
struct ChunkPacker<'a> {
    counter: &'a dyn TokenCounter,
    budget: usize,
    open: Vec<Piece>,
    estimate: usize,
    chunks: Vec<Chunk>,
}

impl<'a> ChunkPacker<'a> {
    fn new(counter: &'a dyn TokenCounter, budget: usize) -> Self {
        Self {
            counter,
            budget,
            open: Vec::new(),
            estimate: 0,
            chunks: Vec::new(),
        }
    }

    fn push(&mut self, text: &str, separator: &'static str, tokens: usize) -> ParsingResult<()> {
        let joined = if self.open.is_empty() {
            tokens
        } else {
            self.counter.count(separator) + tokens
        };

        if !self.open.is_empty() && self.estimate + joined > self.budget {
            self.seal()?;
            return self.push(text, separator, tokens);
        }

        self.estimate += joined;
        self.open.push(Piece {
            separator,
            text: text.to_string(),
            tokens,
        });
        Ok(())
    }

    /// Emit the open chunk, carrying over trailing pieces that push it past
    /// the budget once counted exactly
    fn seal(&mut self) -> ParsingResult<()> {
        let mut carry = Vec::new();

        while !self.open.is_empty() {
            let text = render(&self.open);
            let tokens = self.counter.count(&text);

            if tokens <= self.budget {
                self.emit(text, tokens);
                break;
            }
            if self.open.len() == 1 {
                return Err(ParsingError::chunk_overflow(
                    self.budget,
                    format!("piece of {tokens} tokens cannot be placed"),
                ));
            }
            if let Some(last) = self.open.pop() {
                carry.push(last);
            }
        }

        self.estimate = 0;
        for piece in carry.into_iter().rev() {
            self.push(&piece.text, piece.separator, piece.tokens)?;
        }
        Ok(())
    }

    fn emit(&mut self, text: String, token_count: usize) {
        self.open.clear();
        if text.trim().is_empty() {
            return;
        }
        self.chunks.push(Chunk {
            index: self.chunks.len(),
            text,
            token_count,
        });
    }

    fn finish(mut self) -> ParsingResult<Vec<Chunk>> {
        while !self.open.is_empty() {
            self.seal()?;
        }
        Ok(self.chunks)
    }
}

fn render(pieces: &[Piece]) -> String {
    let mut text = String::new();
    for (i, piece) in pieces.iter().enumerate() {
        if i > 0 {
            text.push_str(piece.separator);
        }
        text.push_str(&piece.text);
    }
    text
}
