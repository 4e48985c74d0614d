//! Character input for the tokenizer.
//!
//! The tokenizer consumes already-decoded Unicode scalar values; decoding
//! bytes (and sniffing encodings) is the caller's job. [`Source`] is the seam
//! through which characters are supplied, with optional fast paths for
//! literal matching and run scanning that in-memory sources can implement
//! much more efficiently than a scalar-at-a-time loop.

use std::collections::VecDeque;
use std::convert::Infallible;

/// An object that supplies characters to the tokenizer.
///
/// Only [`Source::next_char`] and [`Source::try_match_literal`] are required;
/// [`Source::read_run`] has a correct (but slow) default.
pub trait Source {
    /// The error returned by this source. Use [`Infallible`] for in-memory
    /// sources so [`crate::Tokenizer::infallible`] becomes available.
    type Error: std::error::Error;

    /// Return the next character, or `None` at end of input.
    fn next_char(&mut self) -> Result<Option<char>, Self::Error>;

    /// Attempt to consume `literal` in one step.
    ///
    /// Returns `true` and consumes the matching characters if the input
    /// continues with `literal` (compared byte-for-byte, or ignoring ASCII
    /// case when `case_insensitive` is set). Otherwise consumes nothing and
    /// returns `false`.
    ///
    /// `literal` is always non-empty ASCII and never contains `\r` or `\n`.
    fn try_match_literal(
        &mut self,
        literal: &str,
        case_insensitive: bool,
    ) -> Result<bool, Self::Error>;

    /// Read up to the next character contained in `needle`.
    ///
    /// Returns either a chunk of characters none of which is in `needle`
    /// (arbitrarily short, so streaming sources can hand out whatever they
    /// have), or, when the very next character is in `needle`, that single
    /// character. `None` means end of input. `needle` is always ASCII.
    ///
    /// `char_buf` is scratch space for sources that cannot borrow the
    /// returned chunk from an internal buffer.
    fn read_run<'a>(
        &'a mut self,
        needle: &[char],
        char_buf: &'a mut [u8; 4],
    ) -> Result<Option<&'a str>, Self::Error> {
        let _ = needle;
        match self.next_char()? {
            Some(c) => Ok(Some(&*c.encode_utf8(char_buf))),
            None => Ok(None),
        }
    }
}

/// Conversion into a [`Source`].
///
/// Implemented for `&str` and `&String` (and, trivially, every `Source`), so
/// `Tokenizer::new("<p>")` works directly.
pub trait IntoSource<'a> {
    /// The source this type converts into.
    type Source: Source + 'a;

    /// Perform the conversion.
    fn into_source(self) -> Self::Source;
}

impl<'a, S: Source + 'a> IntoSource<'a> for S {
    type Source = S;

    fn into_source(self) -> S {
        self
    }
}

/// A [`Source`] over an in-memory string.
///
/// Implements [`Source::read_run`] with a real needle search (via `memchr`
/// when the feature is enabled), which is where bulk text throughput comes
/// from.
#[derive(Debug)]
pub struct StringSource<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> StringSource<'a> {
    /// Create a source reading from `input`.
    #[must_use]
    pub fn new(input: &'a str) -> Self {
        StringSource { input, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }
}

impl<'a> Source for StringSource<'a> {
    type Error = Infallible;

    fn next_char(&mut self) -> Result<Option<char>, Self::Error> {
        match self.rest().chars().next() {
            Some(c) => {
                self.pos += c.len_utf8();
                Ok(Some(c))
            }
            None => Ok(None),
        }
    }

    fn try_match_literal(
        &mut self,
        literal: &str,
        case_insensitive: bool,
    ) -> Result<bool, Self::Error> {
        debug_assert!(literal.is_ascii());
        let candidate = match self.rest().as_bytes().get(..literal.len()) {
            Some(c) => c,
            None => return Ok(false),
        };
        let matched = candidate == literal.as_bytes()
            || (case_insensitive && candidate.eq_ignore_ascii_case(literal.as_bytes()));
        if matched {
            // ASCII literal, so the new position is a character boundary.
            self.pos += literal.len();
        }
        Ok(matched)
    }

    fn read_run<'b>(
        &'b mut self,
        needle: &[char],
        _: &'b mut [u8; 4],
    ) -> Result<Option<&'b str>, Self::Error> {
        let rest = self.rest();
        if rest.is_empty() {
            return Ok(None);
        }

        let mut bytes = [0u8; 8];
        debug_assert!(needle.len() <= bytes.len());
        for (slot, &c) in bytes.iter_mut().zip(needle) {
            debug_assert!(c.is_ascii());
            *slot = c as u8;
        }
        let needle_bytes = &bytes[..needle.len().min(bytes.len())];

        let chunk = match fast_find(needle_bytes, rest.as_bytes()) {
            Some(0) => &rest[..1],
            Some(found) => &rest[..found],
            None => rest,
        };
        self.pos += chunk.len();
        Ok(Some(chunk))
    }
}

impl<'a> IntoSource<'a> for &'a str {
    type Source = StringSource<'a>;

    fn into_source(self) -> StringSource<'a> {
        StringSource::new(self)
    }
}

impl<'a> IntoSource<'a> for &'a String {
    type Source = StringSource<'a>;

    fn into_source(self) -> StringSource<'a> {
        StringSource::new(self)
    }
}

/// A [`Source`] over any character iterator.
///
/// This is the streaming entry point: the iterator may hand out characters
/// chunk by chunk (e.g. from a decoder), and the source buffers just enough
/// lookahead to answer literal matches.
#[derive(Debug)]
pub struct CharIterSource<I: Iterator<Item = char>> {
    chars: I,
    lookahead: VecDeque<char>,
}

impl<I: Iterator<Item = char>> CharIterSource<I> {
    /// Create a source reading from `chars`.
    pub fn new(chars: I) -> Self {
        CharIterSource {
            chars,
            lookahead: VecDeque::new(),
        }
    }

    fn fill_lookahead(&mut self, n: usize) {
        while self.lookahead.len() < n {
            match self.chars.next() {
                Some(c) => self.lookahead.push_back(c),
                None => break,
            }
        }
    }
}

impl<I: Iterator<Item = char>> Source for CharIterSource<I> {
    type Error = Infallible;

    fn next_char(&mut self) -> Result<Option<char>, Self::Error> {
        Ok(self.lookahead.pop_front().or_else(|| self.chars.next()))
    }

    fn try_match_literal(
        &mut self,
        literal: &str,
        case_insensitive: bool,
    ) -> Result<bool, Self::Error> {
        let len = literal.chars().count();
        self.fill_lookahead(len);
        if self.lookahead.len() < len {
            return Ok(false);
        }
        let matched = literal.chars().zip(self.lookahead.iter()).all(|(a, &b)| {
            a == b || (case_insensitive && a.to_ascii_lowercase() == b.to_ascii_lowercase())
        });
        if matched {
            self.lookahead.drain(..len);
        }
        Ok(matched)
    }
}

#[cfg(feature = "memchr")]
fn fast_find(needle: &[u8], haystack: &[u8]) -> Option<usize> {
    match needle {
        &[a] => memchr::memchr(a, haystack),
        &[a, b] => memchr::memchr2(a, b, haystack),
        &[a, b, c] => memchr::memchr3(a, b, c, haystack),
        &[a, b, c, ..] => {
            let first = memchr::memchr3(a, b, c, haystack);
            let second = fast_find(&needle[3..], haystack);
            match (first, second) {
                (Some(x), Some(y)) => Some(x.min(y)),
                (x, y) => x.or(y),
            }
        }
        &[] => None,
    }
}

#[cfg(not(feature = "memchr"))]
fn fast_find(needle: &[u8], haystack: &[u8]) -> Option<usize> {
    haystack.iter().position(|b| needle.contains(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect_runs<S: Source>(mut source: S, needle: &[char]) -> Vec<String> {
        let mut chunks = Vec::new();
        loop {
            let mut char_buf = [0; 4];
            match source.read_run(needle, &mut char_buf).unwrap() {
                Some(chunk) => chunks.push(chunk.to_owned()),
                None => break,
            }
        }
        chunks
    }

    #[test]
    fn string_source_splits_at_needles() {
        let chunks = collect_runs(StringSource::new("hello world"), &[' ', 'r']);
        assert_eq!(chunks, &["hello", " ", "wo", "r", "ld"]);
    }

    #[test]
    fn string_source_without_needle_returns_rest() {
        let chunks = collect_runs(StringSource::new("héllo"), &['<']);
        assert_eq!(chunks, &["héllo"]);
    }

    #[test]
    fn literal_matching_consumes_only_on_match() {
        let mut source = StringSource::new("DocTYPE x");
        assert!(!source.try_match_literal("doctype!", false).unwrap());
        assert!(!source.try_match_literal("doctype", false).unwrap());
        assert!(source.try_match_literal("doctype", true).unwrap());
        assert_eq!(source.next_char().unwrap(), Some(' '));
    }

    #[test]
    fn iter_source_lookahead_survives_failed_match() {
        let mut source = CharIterSource::new("abcd".chars());
        assert!(!source.try_match_literal("abx", false).unwrap());
        assert!(source.try_match_literal("ab", false).unwrap());
        assert_eq!(source.next_char().unwrap(), Some('c'));
    }
}
