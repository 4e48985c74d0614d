//! The tokenizer itself.

use std::collections::VecDeque;
use std::convert::Infallible;

use crate::builder::TokenBuilder;
use crate::config::Options;
use crate::cursor::Cursor;
use crate::error::{ErrorKind, ErrorLog, ParseError};
use crate::machine::{self, Control};
use crate::source::{IntoSource, Source};
use crate::state::{StartState, State};
use crate::token::Token;

/// An HTML tokenizer. See the crate-level docs for basic usage.
///
/// `Tokenizer` implements [`Iterator`], yielding tokens in input order and
/// ending with exactly one [`Token::EndOfFile`]. Parse errors do not appear
/// in the stream; they collect on a side channel ([`Tokenizer::errors`]).
///
/// A single instance is single-threaded and synchronous; it pulls from its
/// source only while being iterated and holds no external resources, so
/// cancellation is simply dropping it.
#[derive(Debug)]
pub struct Tokenizer<S: Source> {
    eof: bool,
    pub(crate) state: State,
    /// Where to go back to after a character reference, and whether the
    /// reference is part of an attribute value.
    pub(crate) return_state: Option<(State, bool)>,
    /// Scratch for character references and raw-text end-tag candidates.
    pub(crate) temp: String,
    /// Accumulator for numeric character references.
    pub(crate) charref_code: u32,
    pub(crate) cursor: Cursor<S>,
    pub(crate) builder: TokenBuilder,
    pub(crate) errors: ErrorLog,
    pub(crate) options: Options,
    pub(crate) pending_text: String,
    queue: VecDeque<Token>,
}

impl<S: Source> Tokenizer<S> {
    /// Create a tokenizer with default options.
    ///
    /// `input` can be a `&str`, a `&String`, or any [`Source`].
    pub fn new<'a, I: IntoSource<'a, Source = S>>(input: I) -> Self {
        Tokenizer::with_options(input, Options::default())
    }

    /// Create a tokenizer with the given [`Options`].
    pub fn with_options<'a, I: IntoSource<'a, Source = S>>(input: I, options: Options) -> Self {
        Tokenizer {
            eof: false,
            state: State::Data,
            return_state: None,
            temp: String::new(),
            charref_code: 0,
            cursor: Cursor::new(input.into_source()),
            builder: TokenBuilder::default(),
            errors: ErrorLog::default(),
            options,
            pending_text: String::new(),
            queue: VecDeque::new(),
        }
    }

    /// Override the state to start tokenizing in. Needed for fragment
    /// parsing; see [`StartState`].
    pub fn set_start_state(&mut self, start: StartState) {
        self.state = start.into();
    }

    /// Seed the "last start tag" used for end-tag matching in raw-text
    /// states, as if a start tag with this name had just been emitted.
    pub fn set_last_start_tag(&mut self, name: Option<&str>) {
        self.builder.set_last_start_tag(name);
    }

    /// The parse errors recorded so far.
    pub fn errors(&self) -> &[ParseError] {
        self.errors.entries()
    }

    /// Take the recorded parse errors, leaving the side channel empty.
    pub fn take_errors(&mut self) -> Vec<ParseError> {
        self.errors.take()
    }

    /// Drive tokenization to the end of input, discarding tokens. Useful
    /// when only the parse errors are of interest.
    pub fn finish(mut self) -> Result<Vec<ParseError>, S::Error> {
        for token in self.by_ref() {
            let _ = token?;
        }
        Ok(self.take_errors())
    }

    /// Record `kind` at the current input position.
    pub(crate) fn report(&mut self, kind: ErrorKind) {
        let offset = self.cursor.position();
        self.errors.report(kind, offset);
    }

    /// Queue a run of characters.
    pub(crate) fn emit_str(&mut self, s: &str) {
        self.pending_text.push_str(s);
    }

    /// Queue a single character.
    pub(crate) fn emit_char(&mut self, c: char) {
        self.pending_text.push(c);
    }

    fn flush_text(&mut self) {
        if !self.pending_text.is_empty() {
            let text = std::mem::take(&mut self.pending_text);
            self.queue.push_back(Token::Text(text));
        }
    }

    fn push_token(&mut self, token: Token) {
        self.flush_text();
        self.queue.push_back(token);
    }

    /// Finish and queue the tag under construction. Returns the state to
    /// continue in when the tag was a configured raw-text start tag.
    pub(crate) fn emit_current_tag(&mut self) -> Option<State> {
        if let Some(kind) = self.builder.finish_attribute() {
            self.report(kind);
        }
        let (token, error) = self.builder.finish_tag();
        if let Some(kind) = error {
            self.report(kind);
        }
        let next_state = match &token {
            Token::StartTag(tag) => self
                .options
                .text_modes
                .lookup(&tag.name)
                .map(State::from),
            _ => None,
        };
        self.push_token(token);
        next_state
    }

    /// Finish and queue the comment under construction.
    pub(crate) fn emit_current_comment(&mut self) {
        let token = self.builder.finish_comment();
        self.push_token(token);
    }

    /// Finish and queue the doctype under construction.
    pub(crate) fn emit_current_doctype(&mut self) {
        let token = self.builder.finish_doctype();
        self.push_token(token);
    }

    /// Whether the character reference being resolved belongs to an
    /// attribute value.
    pub(crate) fn charref_in_attribute(&self) -> bool {
        matches!(self.return_state, Some((_, true)))
    }

    /// Hand the temporary buffer to wherever the interrupted state was
    /// accumulating: the current attribute value, or the text stream.
    pub(crate) fn flush_charref_buffer(&mut self) {
        if self.charref_in_attribute() {
            self.builder.push_attribute_value_str(&self.temp);
        } else {
            self.pending_text.push_str(&self.temp);
        }
        self.temp.clear();
    }

    /// Pop the saved return state.
    pub(crate) fn take_return_state(&mut self) -> State {
        match self.return_state.take() {
            Some((state, _)) => state,
            None => unreachable!("no return state saved"),
        }
    }
}

impl<S: Source> Iterator for Tokenizer<S> {
    type Item = Result<Token, S::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(token) = self.queue.pop_front() {
                return Some(Ok(token));
            }
            if self.eof {
                return None;
            }
            match machine::step(self) {
                Ok(Control::Continue) => {}
                Ok(Control::Eof) => {
                    self.eof = true;
                    self.flush_text();
                    self.queue.push_back(Token::EndOfFile);
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// A tokenizer over an infallible source, yielding bare [`Token`]s.
///
/// This is the return value of [`Tokenizer::infallible`].
#[derive(Debug)]
pub struct InfallibleTokenizer<S: Source<Error = Infallible>>(Tokenizer<S>);

impl<S: Source<Error = Infallible>> Tokenizer<S> {
    /// Statically discharge the error half of the iterator item. Available
    /// whenever the source cannot fail, e.g. for string inputs.
    pub fn infallible(self) -> InfallibleTokenizer<S> {
        InfallibleTokenizer(self)
    }
}

impl<S: Source<Error = Infallible>> InfallibleTokenizer<S> {
    /// The parse errors recorded so far.
    pub fn errors(&self) -> &[ParseError] {
        self.0.errors()
    }

    /// Take the recorded parse errors, leaving the side channel empty.
    pub fn take_errors(&mut self) -> Vec<ParseError> {
        self.0.take_errors()
    }
}

impl<S: Source<Error = Infallible>> Iterator for InfallibleTokenizer<S> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        match self.0.next()? {
            Ok(token) => Some(token),
            Err(e) => match e {},
        }
    }
}
