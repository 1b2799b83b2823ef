//! Filename slugs for bookmarks.
//!
//! [`slugify`] turns a free-text description into a short, lowercase token
//! made of `[a-z0-9-]` only. It is a pure function: the same text,
//! stopwords and length always give the same slug.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::app::Result;

const SEPARATOR: char = '-';

/// Hex digits used for the placeholder slug of degenerate input.
const PLACEHOLDER_LEN: usize = 12;

const BUILTIN_STOPWORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "few", "for",
    "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers", "him", "his",
    "how", "i", "if", "in", "into", "is", "it", "its", "just", "me", "more", "most", "my", "no",
    "nor", "not", "now", "of", "off", "on", "once", "only", "or", "other", "our", "ours", "out",
    "over", "own", "same", "she", "should", "so", "some", "such", "than", "that", "the", "their",
    "them", "then", "there", "these", "they", "this", "those", "through", "to", "too", "under",
    "until", "up", "very", "was", "we", "were", "what", "when", "where", "which", "while", "who",
    "whom", "why", "will", "with", "would", "you", "your",
];

/// Lowercase words left out of slugs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StopwordSet {
    words: HashSet<String>,
}

impl StopwordSet {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        Self { words }
    }

    /// The list used when no stopword file can be read.
    pub fn builtin() -> Self {
        Self::new(BUILTIN_STOPWORDS.iter().copied())
    }

    /// Read one word per line. Blank lines and `#` comments are ignored.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(Self::parse(&content))
    }

    pub fn parse(content: &str) -> Self {
        Self::new(
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.starts_with('#')),
        )
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Derive a slug from `text`.
///
/// The text is transliterated to ASCII and lowercased, split on anything
/// that is not a letter or digit, stripped of stopwords and joined with
/// `-`. The result is cut to `max_length` characters at a word boundary;
/// `0` means no limit. If nothing is left, a placeholder derived from a
/// hash of `text` is returned, so the slug is never empty.
pub fn slugify(text: &str, stopwords: &StopwordSet, max_length: usize) -> String {
    let ascii = deunicode::deunicode(text).to_lowercase();

    let words = ascii
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .filter(|w| !stopwords.contains(w));

    let mut slug = String::new();
    for word in words {
        let needed = if slug.is_empty() { word.len() } else { word.len() + 1 };
        if max_length > 0 && slug.len() + needed > max_length {
            if slug.is_empty() {
                // A single word longer than the limit.
                slug.push_str(&word[..max_length]);
            }
            break;
        }
        if !slug.is_empty() {
            slug.push(SEPARATOR);
        }
        slug.push_str(word);
    }

    if slug.is_empty() {
        return placeholder(text, max_length);
    }
    slug
}

fn placeholder(text: &str, max_length: usize) -> String {
    let digest = hex::encode(Sha256::digest(text.as_bytes()));
    let len = match max_length {
        0 => PLACEHOLDER_LEN,
        n => PLACEHOLDER_LEN.min(n),
    };
    digest[..len].to_string()
}
