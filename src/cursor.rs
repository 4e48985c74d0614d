//! The cursor over the character stream.
//!
//! [`Cursor`] wraps a [`Source`] and layers on what the state machine needs:
//!
//! * a bounded reconsume stack, so a transition can hand the character it
//!   just read to the next state;
//! * newline normalization (`\r` and `\r\n` both become `\n`);
//! * input-stream validation (noncharacters and stray control characters are
//!   reported, never rejected);
//! * an offset counter for diagnostics.
//!
//! The reconsume state is explicit data rather than control flow, so the
//! whole tokenizer remains snapshot-able between steps.

use crate::charref;
use crate::error::{ErrorKind, ErrorLog};
use crate::source::Source;

/// Reconsume buffer. Newline normalization can leave one pending character
/// behind a reconsumed one, so two slots are required; more indicates a bug
/// in the state machine.
#[derive(Debug, Default, Clone, Copy)]
struct UnreadStack {
    slots: [Option<char>; 2],
    len: u8,
}

impl UnreadStack {
    fn push(&mut self, c: Option<char>) {
        assert!(self.len < 2, "reconsume stack overflow");
        self.slots[self.len as usize] = c;
        self.len += 1;
    }

    fn pop(&mut self) -> Option<Option<char>> {
        if self.len == 0 {
            None
        } else {
            self.len -= 1;
            Some(self.slots[self.len as usize])
        }
    }

    fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Owns the character supply and the read position.
#[derive(Debug)]
pub(crate) struct Cursor<S: Source> {
    source: S,
    unread: UnreadStack,
    offset: usize,
}

impl<S: Source> Cursor<S> {
    pub(crate) fn new(source: S) -> Self {
        Cursor {
            source,
            unread: UnreadStack::default(),
            offset: 0,
        }
    }

    /// Characters consumed so far, after newline normalization.
    pub(crate) fn position(&self) -> usize {
        self.offset
    }

    /// Return the current character and advance. `None` at end of input (and
    /// on every call thereafter; the end is sticky).
    pub(crate) fn consume(&mut self, errors: &mut ErrorLog) -> Result<Option<char>, S::Error> {
        let (c, fresh) = match self.unread.pop() {
            Some(c) => (c, false),
            None => (self.source.next_char()?, true),
        };

        let mut c = match c {
            Some(c) => c,
            None => return Ok(None),
        };

        self.offset += 1;

        if c == '\r' {
            c = '\n';
            let next = self.source.next_char()?;
            if next != Some('\n') {
                self.unread.push(next);
            }
        }

        if fresh {
            validate(errors, self.offset, c);
        }

        Ok(Some(c))
    }

    /// Non-consuming lookahead of one character.
    pub(crate) fn peek(&mut self, errors: &mut ErrorLog) -> Result<Option<char>, S::Error> {
        let c = self.consume(errors)?;
        self.unread(c);
        Ok(c)
    }

    /// Rewind one position, so the next [`Cursor::consume`] replays `c`.
    /// Legal only for a character (or end marker) obtained from this cursor.
    pub(crate) fn unread(&mut self, c: Option<char>) {
        if c.is_some() {
            self.offset -= 1;
        }
        self.unread.push(c);
    }

    /// Check whether the input continues with `literal`, consuming it if so.
    ///
    /// `literal` must be non-empty ASCII without newlines. Characters sitting
    /// on the reconsume stack are matched first; on failure the stack is
    /// restored and nothing is consumed.
    pub(crate) fn try_match_literal(
        &mut self,
        mut literal: &str,
        case_insensitive: bool,
    ) -> Result<bool, S::Error> {
        debug_assert!(!literal.is_empty() && literal.is_ascii());

        let unread_backup = self.unread;
        let offset_backup = self.offset;
        while let Some(c) = self.unread.pop() {
            let expected = literal.chars().next();
            if let (Some(c), Some(expected)) = (c, expected) {
                if c == expected
                    || (case_insensitive
                        && c.to_ascii_lowercase() == expected.to_ascii_lowercase())
                {
                    self.offset += 1;
                    literal = &literal[expected.len_utf8()..];
                    if literal.is_empty() {
                        return Ok(true);
                    }
                    continue;
                }
            }

            self.unread = unread_backup;
            self.offset = offset_backup;
            return Ok(false);
        }

        if self.source.try_match_literal(literal, case_insensitive)? {
            self.offset += literal.len();
            Ok(true)
        } else {
            self.unread = unread_backup;
            self.offset = offset_backup;
            Ok(false)
        }
    }

    /// Append characters to `out` until a character from `needle` is
    /// consumed (returned) or the input ends (`None`).
    ///
    /// `needle` must be ASCII and should not contain `\n`-adjacent tricks:
    /// normalization happens in here, so a `\n` needle also matches `\r`.
    pub(crate) fn read_run(
        &mut self,
        needle: &[char],
        out: &mut String,
        errors: &mut ErrorLog,
    ) -> Result<Option<char>, S::Error> {
        // The bulk path adds '\r' so normalization stays in charge of it.
        let mut ext = ['\r'; 8];
        debug_assert!(needle.len() < ext.len());
        ext[..needle.len()].copy_from_slice(needle);
        let ext = &ext[..needle.len() + 1];

        loop {
            // Anything reconsumed goes through the scalar path first.
            while !self.unread.is_empty() {
                match self.consume(errors)? {
                    None => return Ok(None),
                    Some(c) if needle.contains(&c) => return Ok(Some(c)),
                    Some(c) => out.push(c),
                }
            }

            let mut char_buf = [0; 4];
            let chunk = match self.source.read_run(ext, &mut char_buf)? {
                Some(chunk) => chunk,
                None => return Ok(None),
            };

            let mut chars = chunk.chars();
            let first = match chars.next() {
                Some(first) => first,
                None => continue,
            };

            if chars.next().is_none() && ext.contains(&first) {
                // Found a needle character (or a '\r' to normalize).
                self.offset += 1;
                validate(errors, self.offset, first);
                if first == '\r' {
                    let next = self.source.next_char()?;
                    if next != Some('\n') {
                        self.unread.push(next);
                    }
                    if needle.contains(&'\n') {
                        return Ok(Some('\n'));
                    }
                    out.push('\n');
                } else {
                    return Ok(Some(first));
                }
            } else {
                for c in chunk.chars() {
                    self.offset += 1;
                    validate(errors, self.offset, c);
                }
                out.push_str(chunk);
            }
        }
    }
}

/// Input-stream preflight: noncharacters and non-whitespace controls are
/// reported once, at the position they were read. NUL is excluded here; the
/// states give it individual treatment.
fn validate(errors: &mut ErrorLog, offset: usize, c: char) {
    let code = c as u32;
    if charref::is_noncharacter(code) {
        errors.report(ErrorKind::NoncharacterInInputStream, offset);
    } else if charref::is_control(code) && !matches!(code, 0x00 | 0x09 | 0x0a | 0x0c | 0x0d | 0x20)
    {
        errors.report(ErrorKind::ControlCharacterInInputStream, offset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::StringSource;

    fn cursor(input: &str) -> Cursor<StringSource<'_>> {
        Cursor::new(StringSource::new(input))
    }

    #[test]
    fn consume_normalizes_newlines() {
        let mut errors = ErrorLog::default();
        let mut cursor = cursor("a\r\nb\rc");
        let mut seen = String::new();
        while let Some(c) = cursor.consume(&mut errors).unwrap() {
            seen.push(c);
        }
        assert_eq!(seen, "a\nb\nc");
        // The end is sticky.
        assert_eq!(cursor.consume(&mut errors).unwrap(), None);
    }

    #[test]
    fn unread_replays_and_rewinds_offset() {
        let mut errors = ErrorLog::default();
        let mut cursor = cursor("xy");
        let c = cursor.consume(&mut errors).unwrap();
        assert_eq!(c, Some('x'));
        assert_eq!(cursor.position(), 1);
        cursor.unread(c);
        assert_eq!(cursor.position(), 0);
        assert_eq!(cursor.consume(&mut errors).unwrap(), Some('x'));
        assert_eq!(cursor.consume(&mut errors).unwrap(), Some('y'));
    }

    #[test]
    fn literal_match_spans_reconsumed_characters() {
        let mut errors = ErrorLog::default();
        let mut cursor = cursor("DOCTYPE");
        let c = cursor.consume(&mut errors).unwrap();
        cursor.unread(c);
        assert!(cursor.try_match_literal("doc", true).unwrap());
        assert_eq!(cursor.consume(&mut errors).unwrap(), Some('T'));
    }

    #[test]
    fn failed_literal_match_restores_everything() {
        let mut errors = ErrorLog::default();
        let mut cursor = cursor("data");
        let c = cursor.consume(&mut errors).unwrap();
        cursor.unread(c);
        assert!(!cursor.try_match_literal("dx", false).unwrap());
        assert_eq!(cursor.position(), 0);
        assert_eq!(cursor.consume(&mut errors).unwrap(), Some('d'));
    }

    #[test]
    fn read_run_stops_at_needles_and_normalizes() {
        let mut errors = ErrorLog::default();
        let mut cursor = cursor("ab\r\ncd<e");
        let mut out = String::new();
        let found = cursor.read_run(&['<'], &mut out, &mut errors).unwrap();
        assert_eq!(found, Some('<'));
        assert_eq!(out, "ab\ncd");
        let mut out = String::new();
        let found = cursor.read_run(&['<'], &mut out, &mut errors).unwrap();
        assert_eq!(found, None);
        assert_eq!(out, "e");
    }

    #[test]
    fn read_run_returns_newline_needle_for_carriage_return() {
        let mut errors = ErrorLog::default();
        let mut cursor = cursor("a\rb");
        let mut out = String::new();
        let found = cursor.read_run(&['\n'], &mut out, &mut errors).unwrap();
        assert_eq!(found, Some('\n'));
        assert_eq!(out, "a");
        assert_eq!(cursor.consume(&mut errors).unwrap(), Some('b'));
    }

    #[test]
    fn control_characters_are_reported() {
        let mut errors = ErrorLog::default();
        let mut cursor = cursor("a\u{1}b");
        while cursor.consume(&mut errors).unwrap().is_some() {}
        let entries = errors.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, ErrorKind::ControlCharacterInInputStream);
        assert_eq!(entries[0].offset, 2);
    }
}
