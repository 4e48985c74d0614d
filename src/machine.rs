//! The state machine.
//!
//! One [`step`] call consumes at least one character (or one text run) and
//! performs the transitions of the current state. States are grouped the way
//! the WHATWG parsing section groups them; the macros at the top of [`step`]
//! keep the arms close to the prose of that section.

use crate::charref;
use crate::error::ErrorKind;
use crate::source::Source;
use crate::state::State;
use crate::tokenizer::Tokenizer;

/// What the driver should do after a step.
pub(crate) enum Control {
    /// Keep stepping.
    Continue,
    /// Input is exhausted; emit the end-of-file token.
    Eof,
}

macro_rules! trace_log {
    ($($tt:tt)*) => {{
        #[cfg(debug_assertions)]
        crate::testutils::trace_log(&format!($($tt)*));
    }};
}

/// Run one step of the state machine.
#[allow(clippy::too_many_lines)]
pub(crate) fn step<S: Source>(slf: &mut Tokenizer<S>) -> Result<Control, S::Error> {
    macro_rules! cont {
        () => {{
            return Ok(Control::Continue);
        }};
    }

    macro_rules! eof {
        () => {{
            return Ok(Control::Eof);
        }};
    }

    macro_rules! switch_to {
        ($state:ident) => {{
            trace_log!("state: {:?} -> {:?}", slf.state, State::$state);
            slf.state = State::$state;
            cont!()
        }};
    }

    macro_rules! reconsume_in {
        ($c:expr, $state:ident) => {{
            trace_log!("state: {:?} -> {:?} (reconsume)", slf.state, State::$state);
            slf.cursor.unread($c);
            slf.state = State::$state;
            cont!()
        }};
    }

    macro_rules! enter_charref {
        ($is_attribute:expr) => {{
            debug_assert!(slf.return_state.is_none());
            slf.return_state = Some((slf.state, $is_attribute));
            slf.state = State::CharacterReference;
            cont!()
        }};
    }

    macro_rules! switch_to_return_state {
        () => {{
            slf.state = slf.take_return_state();
            cont!()
        }};
    }

    macro_rules! reconsume_in_return_state {
        ($c:expr) => {{
            let state = slf.take_return_state();
            slf.cursor.unread($c);
            slf.state = state;
            cont!()
        }};
    }

    macro_rules! error {
        ($kind:ident) => {
            slf.report(ErrorKind::$kind)
        };
    }

    macro_rules! read_char {
        () => {
            slf.cursor.consume(&mut slf.errors)
        };
    }

    macro_rules! read_run {
        ($($needle:literal),*) => {
            slf.cursor
                .read_run(&[$($needle),*], &mut slf.pending_text, &mut slf.errors)
        };
    }

    macro_rules! emit_tag_and_switch {
        ($fallback:ident) => {{
            let next = slf.emit_current_tag();
            slf.state = next.unwrap_or(State::$fallback);
            cont!()
        }};
    }

    match slf.state {
        State::Data => match read_run!('&', '<', '\0')? {
            Some('&') => enter_charref!(false),
            Some('<') => switch_to!(TagOpen),
            Some(c) => {
                debug_assert_eq!(c, '\0');
                error!(UnexpectedNullCharacter);
                slf.emit_char('\0');
                cont!()
            }
            None => eof!(),
        },
        State::RcData => match read_run!('&', '<', '\0')? {
            Some('&') => enter_charref!(false),
            Some('<') => switch_to!(RcDataLessThanSign),
            Some(c) => {
                debug_assert_eq!(c, '\0');
                error!(UnexpectedNullCharacter);
                slf.emit_char('\u{fffd}');
                cont!()
            }
            None => eof!(),
        },
        State::RawText => match read_run!('<', '\0')? {
            Some('<') => switch_to!(RawTextLessThanSign),
            Some(c) => {
                debug_assert_eq!(c, '\0');
                error!(UnexpectedNullCharacter);
                slf.emit_char('\u{fffd}');
                cont!()
            }
            None => eof!(),
        },
        State::ScriptData => match read_run!('<', '\0')? {
            Some('<') => switch_to!(ScriptDataLessThanSign),
            Some(c) => {
                debug_assert_eq!(c, '\0');
                error!(UnexpectedNullCharacter);
                slf.emit_char('\u{fffd}');
                cont!()
            }
            None => eof!(),
        },
        State::PlainText => match read_run!('\0')? {
            Some(c) => {
                debug_assert_eq!(c, '\0');
                error!(UnexpectedNullCharacter);
                slf.emit_char('\u{fffd}');
                cont!()
            }
            None => eof!(),
        },
        State::TagOpen => match read_char!()? {
            Some('!') => switch_to!(MarkupDeclarationOpen),
            Some('/') => switch_to!(EndTagOpen),
            Some(c) if c.is_ascii_alphabetic() => {
                slf.builder.start_start_tag();
                reconsume_in!(Some(c), TagName)
            }
            c @ Some('?') => {
                error!(UnexpectedQuestionMarkInsteadOfTagName);
                slf.builder.start_comment();
                reconsume_in!(c, BogusComment)
            }
            None => {
                error!(EofBeforeTagName);
                slf.emit_char('<');
                eof!()
            }
            c @ Some(_) => {
                error!(InvalidFirstCharacterOfTagName);
                slf.emit_char('<');
                reconsume_in!(c, Data)
            }
        },
        State::EndTagOpen => match read_char!()? {
            Some(c) if c.is_ascii_alphabetic() => {
                slf.builder.start_end_tag();
                reconsume_in!(Some(c), TagName)
            }
            Some('>') => {
                error!(MissingEndTagName);
                switch_to!(Data)
            }
            None => {
                error!(EofBeforeTagName);
                slf.emit_str("</");
                eof!()
            }
            c @ Some(_) => {
                error!(InvalidFirstCharacterOfTagName);
                slf.builder.start_comment();
                reconsume_in!(c, BogusComment)
            }
        },
        State::TagName => match read_char!()? {
            Some('\t' | '\n' | '\x0C' | ' ') => switch_to!(BeforeAttributeName),
            Some('/') => switch_to!(SelfClosingStartTag),
            Some('>') => emit_tag_and_switch!(Data),
            Some('\0') => {
                error!(UnexpectedNullCharacter);
                slf.builder.push_name('\u{fffd}');
                cont!()
            }
            Some(c) => {
                slf.builder.push_name(c);
                cont!()
            }
            None => {
                error!(EofInTag);
                eof!()
            }
        },
        State::RcDataLessThanSign => match read_char!()? {
            Some('/') => {
                slf.temp.clear();
                switch_to!(RcDataEndTagOpen)
            }
            c => {
                slf.emit_char('<');
                reconsume_in!(c, RcData)
            }
        },
        State::RcDataEndTagOpen => match read_char!()? {
            Some(c) if c.is_ascii_alphabetic() => {
                slf.builder.start_end_tag();
                reconsume_in!(Some(c), RcDataEndTagName)
            }
            c => {
                slf.emit_str("</");
                reconsume_in!(c, RcData)
            }
        },
        State::RcDataEndTagName => match read_char!()? {
            Some('\t' | '\n' | '\x0C' | ' ') if slf.builder.is_appropriate_end_tag() => {
                switch_to!(BeforeAttributeName)
            }
            Some('/') if slf.builder.is_appropriate_end_tag() => {
                switch_to!(SelfClosingStartTag)
            }
            Some('>') if slf.builder.is_appropriate_end_tag() => emit_tag_and_switch!(Data),
            Some(c) if c.is_ascii_alphabetic() => {
                slf.builder.push_name(c);
                slf.temp.push(c);
                cont!()
            }
            c => {
                slf.builder.abandon();
                slf.emit_str("</");
                slf.pending_text.push_str(&slf.temp);
                slf.temp.clear();
                reconsume_in!(c, RcData)
            }
        },
        State::RawTextLessThanSign => match read_char!()? {
            Some('/') => {
                slf.temp.clear();
                switch_to!(RawTextEndTagOpen)
            }
            c => {
                slf.emit_char('<');
                reconsume_in!(c, RawText)
            }
        },
        State::RawTextEndTagOpen => match read_char!()? {
            Some(c) if c.is_ascii_alphabetic() => {
                slf.builder.start_end_tag();
                reconsume_in!(Some(c), RawTextEndTagName)
            }
            c => {
                slf.emit_str("</");
                reconsume_in!(c, RawText)
            }
        },
        State::RawTextEndTagName => match read_char!()? {
            Some('\t' | '\n' | '\x0C' | ' ') if slf.builder.is_appropriate_end_tag() => {
                switch_to!(BeforeAttributeName)
            }
            Some('/') if slf.builder.is_appropriate_end_tag() => {
                switch_to!(SelfClosingStartTag)
            }
            Some('>') if slf.builder.is_appropriate_end_tag() => emit_tag_and_switch!(Data),
            Some(c) if c.is_ascii_alphabetic() => {
                slf.builder.push_name(c);
                slf.temp.push(c);
                cont!()
            }
            c => {
                slf.builder.abandon();
                slf.emit_str("</");
                slf.pending_text.push_str(&slf.temp);
                slf.temp.clear();
                reconsume_in!(c, RawText)
            }
        },
        State::ScriptDataLessThanSign => match read_char!()? {
            Some('/') => {
                slf.temp.clear();
                switch_to!(ScriptDataEndTagOpen)
            }
            Some('!') => {
                slf.emit_str("<!");
                switch_to!(ScriptDataEscapeStart)
            }
            c => {
                slf.emit_char('<');
                reconsume_in!(c, ScriptData)
            }
        },
        State::ScriptDataEndTagOpen => match read_char!()? {
            Some(c) if c.is_ascii_alphabetic() => {
                slf.builder.start_end_tag();
                reconsume_in!(Some(c), ScriptDataEndTagName)
            }
            c => {
                slf.emit_str("</");
                reconsume_in!(c, ScriptData)
            }
        },
        State::ScriptDataEndTagName => match read_char!()? {
            Some('\t' | '\n' | '\x0C' | ' ') if slf.builder.is_appropriate_end_tag() => {
                switch_to!(BeforeAttributeName)
            }
            Some('/') if slf.builder.is_appropriate_end_tag() => {
                switch_to!(SelfClosingStartTag)
            }
            Some('>') if slf.builder.is_appropriate_end_tag() => emit_tag_and_switch!(Data),
            Some(c) if c.is_ascii_alphabetic() => {
                slf.builder.push_name(c);
                slf.temp.push(c);
                cont!()
            }
            c => {
                slf.builder.abandon();
                slf.emit_str("</");
                slf.pending_text.push_str(&slf.temp);
                slf.temp.clear();
                reconsume_in!(c, ScriptData)
            }
        },
        State::ScriptDataEscapeStart => match read_char!()? {
            Some('-') => {
                slf.emit_char('-');
                switch_to!(ScriptDataEscapeStartDash)
            }
            c => reconsume_in!(c, ScriptData),
        },
        State::ScriptDataEscapeStartDash => match read_char!()? {
            Some('-') => {
                slf.emit_char('-');
                switch_to!(ScriptDataEscapedDashDash)
            }
            c => reconsume_in!(c, ScriptData),
        },
        State::ScriptDataEscaped => match read_run!('-', '<', '\0')? {
            Some('-') => {
                slf.emit_char('-');
                switch_to!(ScriptDataEscapedDash)
            }
            Some('<') => switch_to!(ScriptDataEscapedLessThanSign),
            Some(c) => {
                debug_assert_eq!(c, '\0');
                error!(UnexpectedNullCharacter);
                slf.emit_char('\u{fffd}');
                cont!()
            }
            None => {
                error!(EofInScriptHtmlCommentLikeText);
                eof!()
            }
        },
        State::ScriptDataEscapedDash => match read_char!()? {
            Some('-') => {
                slf.emit_char('-');
                switch_to!(ScriptDataEscapedDashDash)
            }
            Some('<') => switch_to!(ScriptDataEscapedLessThanSign),
            Some('\0') => {
                error!(UnexpectedNullCharacter);
                slf.emit_char('\u{fffd}');
                switch_to!(ScriptDataEscaped)
            }
            Some(c) => {
                slf.emit_char(c);
                switch_to!(ScriptDataEscaped)
            }
            None => {
                error!(EofInScriptHtmlCommentLikeText);
                eof!()
            }
        },
        State::ScriptDataEscapedDashDash => match read_char!()? {
            Some('-') => {
                slf.emit_char('-');
                cont!()
            }
            Some('<') => switch_to!(ScriptDataEscapedLessThanSign),
            Some('>') => {
                slf.emit_char('>');
                switch_to!(ScriptData)
            }
            Some('\0') => {
                error!(UnexpectedNullCharacter);
                slf.emit_char('\u{fffd}');
                switch_to!(ScriptDataEscaped)
            }
            Some(c) => {
                slf.emit_char(c);
                switch_to!(ScriptDataEscaped)
            }
            None => {
                error!(EofInScriptHtmlCommentLikeText);
                eof!()
            }
        },
        State::ScriptDataEscapedLessThanSign => match read_char!()? {
            Some('/') => {
                slf.temp.clear();
                switch_to!(ScriptDataEscapedEndTagOpen)
            }
            Some(c) if c.is_ascii_alphabetic() => {
                slf.temp.clear();
                slf.emit_char('<');
                reconsume_in!(Some(c), ScriptDataDoubleEscapeStart)
            }
            c => {
                slf.emit_char('<');
                reconsume_in!(c, ScriptDataEscaped)
            }
        },
        State::ScriptDataEscapedEndTagOpen => match read_char!()? {
            Some(c) if c.is_ascii_alphabetic() => {
                slf.builder.start_end_tag();
                reconsume_in!(Some(c), ScriptDataEscapedEndTagName)
            }
            c => {
                slf.emit_str("</");
                reconsume_in!(c, ScriptDataEscaped)
            }
        },
        State::ScriptDataEscapedEndTagName => match read_char!()? {
            Some('\t' | '\n' | '\x0C' | ' ') if slf.builder.is_appropriate_end_tag() => {
                switch_to!(BeforeAttributeName)
            }
            Some('/') if slf.builder.is_appropriate_end_tag() => {
                switch_to!(SelfClosingStartTag)
            }
            Some('>') if slf.builder.is_appropriate_end_tag() => emit_tag_and_switch!(Data),
            Some(c) if c.is_ascii_alphabetic() => {
                slf.builder.push_name(c);
                slf.temp.push(c);
                cont!()
            }
            c => {
                slf.builder.abandon();
                slf.emit_str("</");
                slf.pending_text.push_str(&slf.temp);
                slf.temp.clear();
                reconsume_in!(c, ScriptDataEscaped)
            }
        },
        State::ScriptDataDoubleEscapeStart => match read_char!()? {
            Some(c @ ('\t' | '\n' | '\x0C' | ' ' | '/' | '>')) => {
                slf.emit_char(c);
                if slf.temp == "script" {
                    switch_to!(ScriptDataDoubleEscaped)
                } else {
                    switch_to!(ScriptDataEscaped)
                }
            }
            Some(c) if c.is_ascii_alphabetic() => {
                slf.temp.push(c.to_ascii_lowercase());
                slf.emit_char(c);
                cont!()
            }
            c => reconsume_in!(c, ScriptDataEscaped),
        },
        State::ScriptDataDoubleEscaped => match read_run!('-', '<', '\0')? {
            Some('-') => {
                slf.emit_char('-');
                switch_to!(ScriptDataDoubleEscapedDash)
            }
            Some('<') => {
                slf.emit_char('<');
                switch_to!(ScriptDataDoubleEscapedLessThanSign)
            }
            Some(c) => {
                debug_assert_eq!(c, '\0');
                error!(UnexpectedNullCharacter);
                slf.emit_char('\u{fffd}');
                cont!()
            }
            None => {
                error!(EofInScriptHtmlCommentLikeText);
                eof!()
            }
        },
        State::ScriptDataDoubleEscapedDash => match read_char!()? {
            Some('-') => {
                slf.emit_char('-');
                switch_to!(ScriptDataDoubleEscapedDashDash)
            }
            Some('<') => {
                slf.emit_char('<');
                switch_to!(ScriptDataDoubleEscapedLessThanSign)
            }
            Some('\0') => {
                error!(UnexpectedNullCharacter);
                slf.emit_char('\u{fffd}');
                switch_to!(ScriptDataDoubleEscaped)
            }
            Some(c) => {
                slf.emit_char(c);
                switch_to!(ScriptDataDoubleEscaped)
            }
            None => {
                error!(EofInScriptHtmlCommentLikeText);
                eof!()
            }
        },
        State::ScriptDataDoubleEscapedDashDash => match read_char!()? {
            Some('-') => {
                slf.emit_char('-');
                cont!()
            }
            Some('<') => {
                slf.emit_char('<');
                switch_to!(ScriptDataDoubleEscapedLessThanSign)
            }
            Some('>') => {
                slf.emit_char('>');
                switch_to!(ScriptData)
            }
            Some('\0') => {
                error!(UnexpectedNullCharacter);
                slf.emit_char('\u{fffd}');
                switch_to!(ScriptDataDoubleEscaped)
            }
            Some(c) => {
                slf.emit_char(c);
                switch_to!(ScriptDataDoubleEscaped)
            }
            None => {
                error!(EofInScriptHtmlCommentLikeText);
                eof!()
            }
        },
        State::ScriptDataDoubleEscapedLessThanSign => match read_char!()? {
            Some('/') => {
                slf.temp.clear();
                slf.emit_char('/');
                switch_to!(ScriptDataDoubleEscapeEnd)
            }
            c => reconsume_in!(c, ScriptDataDoubleEscaped),
        },
        State::ScriptDataDoubleEscapeEnd => match read_char!()? {
            Some(c @ ('\t' | '\n' | '\x0C' | ' ' | '/' | '>')) => {
                slf.emit_char(c);
                if slf.temp == "script" {
                    switch_to!(ScriptDataEscaped)
                } else {
                    switch_to!(ScriptDataDoubleEscaped)
                }
            }
            Some(c) if c.is_ascii_alphabetic() => {
                slf.temp.push(c.to_ascii_lowercase());
                slf.emit_char(c);
                cont!()
            }
            c => reconsume_in!(c, ScriptDataDoubleEscaped),
        },
        State::BeforeAttributeName => match read_char!()? {
            Some('\t' | '\n' | '\x0C' | ' ') => cont!(),
            c @ (Some('/' | '>') | None) => reconsume_in!(c, AfterAttributeName),
            Some('=') => {
                error!(UnexpectedEqualsSignBeforeAttributeName);
                if let Some(kind) = slf.builder.start_attribute() {
                    slf.report(kind);
                }
                slf.builder.push_attribute_name('=');
                switch_to!(AttributeName)
            }
            Some(c) => {
                if let Some(kind) = slf.builder.start_attribute() {
                    slf.report(kind);
                }
                reconsume_in!(Some(c), AttributeName)
            }
        },
        State::AttributeName => match read_char!()? {
            c @ (Some('\t' | '\n' | '\x0C' | ' ' | '/' | '>') | None) => {
                reconsume_in!(c, AfterAttributeName)
            }
            Some('=') => switch_to!(BeforeAttributeValue),
            Some('\0') => {
                error!(UnexpectedNullCharacter);
                slf.builder.push_attribute_name('\u{fffd}');
                cont!()
            }
            Some(c @ ('"' | '\'' | '<')) => {
                error!(UnexpectedCharacterInAttributeName);
                slf.builder.push_attribute_name(c);
                cont!()
            }
            Some(c) => {
                slf.builder.push_attribute_name(c);
                cont!()
            }
        },
        State::AfterAttributeName => match read_char!()? {
            Some('\t' | '\n' | '\x0C' | ' ') => cont!(),
            Some('/') => switch_to!(SelfClosingStartTag),
            Some('=') => switch_to!(BeforeAttributeValue),
            Some('>') => emit_tag_and_switch!(Data),
            None => {
                error!(EofInTag);
                eof!()
            }
            Some(c) => {
                if let Some(kind) = slf.builder.start_attribute() {
                    slf.report(kind);
                }
                reconsume_in!(Some(c), AttributeName)
            }
        },
        State::BeforeAttributeValue => match read_char!()? {
            Some('\t' | '\n' | '\x0C' | ' ') => cont!(),
            Some('"') => switch_to!(AttributeValueDoubleQuoted),
            Some('\'') => switch_to!(AttributeValueSingleQuoted),
            Some('>') => {
                error!(MissingAttributeValue);
                emit_tag_and_switch!(Data)
            }
            c => reconsume_in!(c, AttributeValueUnquoted),
        },
        State::AttributeValueDoubleQuoted => match read_char!()? {
            Some('"') => switch_to!(AfterAttributeValueQuoted),
            Some('&') => enter_charref!(true),
            Some('\0') => {
                error!(UnexpectedNullCharacter);
                slf.builder.push_attribute_value('\u{fffd}');
                cont!()
            }
            Some(c) => {
                slf.builder.push_attribute_value(c);
                cont!()
            }
            None => {
                error!(EofInTag);
                eof!()
            }
        },
        State::AttributeValueSingleQuoted => match read_char!()? {
            Some('\'') => switch_to!(AfterAttributeValueQuoted),
            Some('&') => enter_charref!(true),
            Some('\0') => {
                error!(UnexpectedNullCharacter);
                slf.builder.push_attribute_value('\u{fffd}');
                cont!()
            }
            Some(c) => {
                slf.builder.push_attribute_value(c);
                cont!()
            }
            None => {
                error!(EofInTag);
                eof!()
            }
        },
        State::AttributeValueUnquoted => match read_char!()? {
            Some('\t' | '\n' | '\x0C' | ' ') => switch_to!(BeforeAttributeName),
            Some('&') => enter_charref!(true),
            Some('>') => emit_tag_and_switch!(Data),
            Some('\0') => {
                error!(UnexpectedNullCharacter);
                slf.builder.push_attribute_value('\u{fffd}');
                cont!()
            }
            Some(c @ ('"' | '\'' | '<' | '=' | '`')) => {
                error!(UnexpectedCharacterInUnquotedAttributeValue);
                slf.builder.push_attribute_value(c);
                cont!()
            }
            Some(c) => {
                slf.builder.push_attribute_value(c);
                cont!()
            }
            None => {
                error!(EofInTag);
                eof!()
            }
        },
        State::AfterAttributeValueQuoted => match read_char!()? {
            c @ (Some('\t' | '\n' | '\x0C' | ' ' | '/' | '>') | None) => {
                reconsume_in!(c, BeforeAttributeName)
            }
            c => {
                error!(MissingWhitespaceBetweenAttributes);
                reconsume_in!(c, BeforeAttributeName)
            }
        },
        State::SelfClosingStartTag => match read_char!()? {
            Some('>') => {
                if let Some(kind) = slf.builder.set_self_closing() {
                    slf.report(kind);
                }
                emit_tag_and_switch!(Data)
            }
            None => {
                error!(EofInTag);
                eof!()
            }
            c @ Some(_) => {
                error!(UnexpectedSolidusInTag);
                reconsume_in!(c, BeforeAttributeName)
            }
        },
        State::BogusComment => match read_char!()? {
            Some('>') => {
                slf.emit_current_comment();
                switch_to!(Data)
            }
            Some('\0') => {
                error!(UnexpectedNullCharacter);
                slf.builder.push_comment('\u{fffd}');
                cont!()
            }
            Some(c) => {
                slf.builder.push_comment(c);
                cont!()
            }
            None => {
                slf.emit_current_comment();
                eof!()
            }
        },
        State::MarkupDeclarationOpen => match read_char!()? {
            Some('-') if slf.cursor.try_match_literal("-", false)? => {
                slf.builder.start_comment();
                switch_to!(CommentStart)
            }
            Some('d' | 'D') if slf.cursor.try_match_literal("octype", true)? => {
                switch_to!(Doctype)
            }
            Some('[') if slf.cursor.try_match_literal("CDATA[", false)? => {
                if slf.options.cdata_allowed {
                    switch_to!(CdataSection)
                } else {
                    error!(CdataInHtmlContent);
                    slf.builder.start_comment();
                    slf.builder.push_comment_str("[CDATA[");
                    switch_to!(BogusComment)
                }
            }
            c => {
                error!(IncorrectlyOpenedComment);
                slf.builder.start_comment();
                reconsume_in!(c, BogusComment)
            }
        },
        State::CommentStart => match read_char!()? {
            Some('-') => switch_to!(CommentStartDash),
            Some('>') => {
                error!(AbruptClosingOfEmptyComment);
                slf.emit_current_comment();
                switch_to!(Data)
            }
            c => reconsume_in!(c, Comment),
        },
        State::CommentStartDash => match read_char!()? {
            Some('-') => switch_to!(CommentEnd),
            Some('>') => {
                error!(AbruptClosingOfEmptyComment);
                slf.emit_current_comment();
                switch_to!(Data)
            }
            None => {
                error!(EofInComment);
                slf.emit_current_comment();
                eof!()
            }
            c @ Some(_) => {
                slf.builder.push_comment('-');
                reconsume_in!(c, Comment)
            }
        },
        State::Comment => match read_char!()? {
            Some('<') => {
                slf.builder.push_comment('<');
                switch_to!(CommentLessThanSign)
            }
            Some('-') => switch_to!(CommentEndDash),
            Some('\0') => {
                error!(UnexpectedNullCharacter);
                slf.builder.push_comment('\u{fffd}');
                cont!()
            }
            Some(c) => {
                slf.builder.push_comment(c);
                cont!()
            }
            None => {
                error!(EofInComment);
                slf.emit_current_comment();
                eof!()
            }
        },
        State::CommentLessThanSign => match read_char!()? {
            Some('!') => {
                slf.builder.push_comment('!');
                switch_to!(CommentLessThanSignBang)
            }
            Some('<') => {
                slf.builder.push_comment('<');
                cont!()
            }
            c => reconsume_in!(c, Comment),
        },
        State::CommentLessThanSignBang => match read_char!()? {
            Some('-') => switch_to!(CommentLessThanSignBangDash),
            c => reconsume_in!(c, Comment),
        },
        State::CommentLessThanSignBangDash => match read_char!()? {
            Some('-') => switch_to!(CommentLessThanSignBangDashDash),
            c => reconsume_in!(c, CommentEndDash),
        },
        State::CommentLessThanSignBangDashDash => match read_char!()? {
            c @ (Some('>') | None) => reconsume_in!(c, CommentEnd),
            c => {
                error!(NestedComment);
                reconsume_in!(c, CommentEnd)
            }
        },
        State::CommentEndDash => match read_char!()? {
            Some('-') => switch_to!(CommentEnd),
            None => {
                error!(EofInComment);
                slf.emit_current_comment();
                eof!()
            }
            c => {
                slf.builder.push_comment('-');
                reconsume_in!(c, Comment)
            }
        },
        State::CommentEnd => match read_char!()? {
            Some('>') => {
                slf.emit_current_comment();
                switch_to!(Data)
            }
            Some('!') => switch_to!(CommentEndBang),
            Some('-') => {
                slf.builder.push_comment('-');
                cont!()
            }
            None => {
                error!(EofInComment);
                slf.emit_current_comment();
                eof!()
            }
            c @ Some(_) => {
                slf.builder.push_comment_str("--");
                reconsume_in!(c, Comment)
            }
        },
        State::CommentEndBang => match read_char!()? {
            Some('-') => {
                slf.builder.push_comment_str("--!");
                switch_to!(CommentEndDash)
            }
            Some('>') => {
                error!(IncorrectlyClosedComment);
                slf.emit_current_comment();
                switch_to!(Data)
            }
            None => {
                error!(EofInComment);
                slf.emit_current_comment();
                eof!()
            }
            c @ Some(_) => {
                slf.builder.push_comment_str("--!");
                reconsume_in!(c, Comment)
            }
        },
        State::Doctype => match read_char!()? {
            Some('\t' | '\n' | '\x0C' | ' ') => switch_to!(BeforeDoctypeName),
            c @ Some('>') => reconsume_in!(c, BeforeDoctypeName),
            None => {
                error!(EofInDoctype);
                slf.builder.start_doctype();
                slf.builder.set_force_quirks();
                slf.emit_current_doctype();
                eof!()
            }
            c @ Some(_) => {
                error!(MissingWhitespaceBeforeDoctypeName);
                reconsume_in!(c, BeforeDoctypeName)
            }
        },
        State::BeforeDoctypeName => match read_char!()? {
            Some('\t' | '\n' | '\x0C' | ' ') => cont!(),
            Some('\0') => {
                error!(UnexpectedNullCharacter);
                slf.builder.start_doctype();
                slf.builder.push_doctype_name('\u{fffd}');
                switch_to!(DoctypeName)
            }
            Some('>') => {
                error!(MissingDoctypeName);
                slf.builder.start_doctype();
                slf.builder.set_force_quirks();
                slf.emit_current_doctype();
                switch_to!(Data)
            }
            None => {
                error!(EofInDoctype);
                slf.builder.start_doctype();
                slf.builder.set_force_quirks();
                slf.emit_current_doctype();
                eof!()
            }
            Some(c) => {
                slf.builder.start_doctype();
                slf.builder.push_doctype_name(c);
                switch_to!(DoctypeName)
            }
        },
        State::DoctypeName => match read_char!()? {
            Some('\t' | '\n' | '\x0C' | ' ') => switch_to!(AfterDoctypeName),
            Some('>') => {
                slf.emit_current_doctype();
                switch_to!(Data)
            }
            Some('\0') => {
                error!(UnexpectedNullCharacter);
                slf.builder.push_doctype_name('\u{fffd}');
                cont!()
            }
            Some(c) => {
                slf.builder.push_doctype_name(c);
                cont!()
            }
            None => {
                error!(EofInDoctype);
                slf.builder.set_force_quirks();
                slf.emit_current_doctype();
                eof!()
            }
        },
        State::AfterDoctypeName => match read_char!()? {
            Some('\t' | '\n' | '\x0C' | ' ') => cont!(),
            Some('>') => {
                slf.emit_current_doctype();
                switch_to!(Data)
            }
            None => {
                error!(EofInDoctype);
                slf.builder.set_force_quirks();
                slf.emit_current_doctype();
                eof!()
            }
            Some('p' | 'P') if slf.cursor.try_match_literal("ublic", true)? => {
                switch_to!(AfterDoctypePublicKeyword)
            }
            Some('s' | 'S') if slf.cursor.try_match_literal("ystem", true)? => {
                switch_to!(AfterDoctypeSystemKeyword)
            }
            c @ Some(_) => {
                error!(InvalidCharacterSequenceAfterDoctypeName);
                slf.builder.set_force_quirks();
                reconsume_in!(c, BogusDoctype)
            }
        },
        State::AfterDoctypePublicKeyword => match read_char!()? {
            Some('\t' | '\n' | '\x0C' | ' ') => switch_to!(BeforeDoctypePublicIdentifier),
            Some('"') => {
                error!(MissingWhitespaceAfterDoctypePublicKeyword);
                slf.builder.start_public_identifier();
                switch_to!(DoctypePublicIdentifierDoubleQuoted)
            }
            Some('\'') => {
                error!(MissingWhitespaceAfterDoctypePublicKeyword);
                slf.builder.start_public_identifier();
                switch_to!(DoctypePublicIdentifierSingleQuoted)
            }
            Some('>') => {
                error!(MissingDoctypePublicIdentifier);
                slf.builder.set_force_quirks();
                slf.emit_current_doctype();
                switch_to!(Data)
            }
            None => {
                error!(EofInDoctype);
                slf.builder.set_force_quirks();
                slf.emit_current_doctype();
                eof!()
            }
            c @ Some(_) => {
                error!(MissingQuoteBeforeDoctypePublicIdentifier);
                slf.builder.set_force_quirks();
                reconsume_in!(c, BogusDoctype)
            }
        },
        State::BeforeDoctypePublicIdentifier => match read_char!()? {
            Some('\t' | '\n' | '\x0C' | ' ') => cont!(),
            Some('"') => {
                slf.builder.start_public_identifier();
                switch_to!(DoctypePublicIdentifierDoubleQuoted)
            }
            Some('\'') => {
                slf.builder.start_public_identifier();
                switch_to!(DoctypePublicIdentifierSingleQuoted)
            }
            Some('>') => {
                error!(MissingDoctypePublicIdentifier);
                slf.builder.set_force_quirks();
                slf.emit_current_doctype();
                switch_to!(Data)
            }
            None => {
                error!(EofInDoctype);
                slf.builder.set_force_quirks();
                slf.emit_current_doctype();
                eof!()
            }
            c @ Some(_) => {
                error!(MissingQuoteBeforeDoctypePublicIdentifier);
                slf.builder.set_force_quirks();
                reconsume_in!(c, BogusDoctype)
            }
        },
        State::DoctypePublicIdentifierDoubleQuoted => match read_char!()? {
            Some('"') => switch_to!(AfterDoctypePublicIdentifier),
            Some('\0') => {
                error!(UnexpectedNullCharacter);
                slf.builder.push_public_identifier('\u{fffd}');
                cont!()
            }
            Some('>') => {
                error!(AbruptDoctypePublicIdentifier);
                slf.builder.set_force_quirks();
                slf.emit_current_doctype();
                switch_to!(Data)
            }
            Some(c) => {
                slf.builder.push_public_identifier(c);
                cont!()
            }
            None => {
                error!(EofInDoctype);
                slf.builder.set_force_quirks();
                slf.emit_current_doctype();
                eof!()
            }
        },
        State::DoctypePublicIdentifierSingleQuoted => match read_char!()? {
            Some('\'') => switch_to!(AfterDoctypePublicIdentifier),
            Some('\0') => {
                error!(UnexpectedNullCharacter);
                slf.builder.push_public_identifier('\u{fffd}');
                cont!()
            }
            Some('>') => {
                error!(AbruptDoctypePublicIdentifier);
                slf.builder.set_force_quirks();
                slf.emit_current_doctype();
                switch_to!(Data)
            }
            Some(c) => {
                slf.builder.push_public_identifier(c);
                cont!()
            }
            None => {
                error!(EofInDoctype);
                slf.builder.set_force_quirks();
                slf.emit_current_doctype();
                eof!()
            }
        },
        State::AfterDoctypePublicIdentifier => match read_char!()? {
            Some('\t' | '\n' | '\x0C' | ' ') => {
                switch_to!(BetweenDoctypePublicAndSystemIdentifiers)
            }
            Some('>') => {
                slf.emit_current_doctype();
                switch_to!(Data)
            }
            Some('"') => {
                error!(MissingWhitespaceBetweenDoctypePublicAndSystemIdentifiers);
                slf.builder.start_system_identifier();
                switch_to!(DoctypeSystemIdentifierDoubleQuoted)
            }
            Some('\'') => {
                error!(MissingWhitespaceBetweenDoctypePublicAndSystemIdentifiers);
                slf.builder.start_system_identifier();
                switch_to!(DoctypeSystemIdentifierSingleQuoted)
            }
            None => {
                error!(EofInDoctype);
                slf.builder.set_force_quirks();
                slf.emit_current_doctype();
                eof!()
            }
            c @ Some(_) => {
                error!(MissingQuoteBeforeDoctypeSystemIdentifier);
                slf.builder.set_force_quirks();
                reconsume_in!(c, BogusDoctype)
            }
        },
        State::BetweenDoctypePublicAndSystemIdentifiers => match read_char!()? {
            Some('\t' | '\n' | '\x0C' | ' ') => cont!(),
            Some('>') => {
                slf.emit_current_doctype();
                switch_to!(Data)
            }
            Some('"') => {
                slf.builder.start_system_identifier();
                switch_to!(DoctypeSystemIdentifierDoubleQuoted)
            }
            Some('\'') => {
                slf.builder.start_system_identifier();
                switch_to!(DoctypeSystemIdentifierSingleQuoted)
            }
            None => {
                error!(EofInDoctype);
                slf.builder.set_force_quirks();
                slf.emit_current_doctype();
                eof!()
            }
            c @ Some(_) => {
                error!(MissingQuoteBeforeDoctypeSystemIdentifier);
                slf.builder.set_force_quirks();
                reconsume_in!(c, BogusDoctype)
            }
        },
        State::AfterDoctypeSystemKeyword => match read_char!()? {
            Some('\t' | '\n' | '\x0C' | ' ') => switch_to!(BeforeDoctypeSystemIdentifier),
            Some('"') => {
                error!(MissingWhitespaceAfterDoctypeSystemKeyword);
                slf.builder.start_system_identifier();
                switch_to!(DoctypeSystemIdentifierDoubleQuoted)
            }
            Some('\'') => {
                error!(MissingWhitespaceAfterDoctypeSystemKeyword);
                slf.builder.start_system_identifier();
                switch_to!(DoctypeSystemIdentifierSingleQuoted)
            }
            Some('>') => {
                error!(MissingDoctypeSystemIdentifier);
                slf.builder.set_force_quirks();
                slf.emit_current_doctype();
                switch_to!(Data)
            }
            None => {
                error!(EofInDoctype);
                slf.builder.set_force_quirks();
                slf.emit_current_doctype();
                eof!()
            }
            c @ Some(_) => {
                error!(MissingQuoteBeforeDoctypeSystemIdentifier);
                slf.builder.set_force_quirks();
                reconsume_in!(c, BogusDoctype)
            }
        },
        State::BeforeDoctypeSystemIdentifier => match read_char!()? {
            Some('\t' | '\n' | '\x0C' | ' ') => cont!(),
            Some('"') => {
                slf.builder.start_system_identifier();
                switch_to!(DoctypeSystemIdentifierDoubleQuoted)
            }
            Some('\'') => {
                slf.builder.start_system_identifier();
                switch_to!(DoctypeSystemIdentifierSingleQuoted)
            }
            Some('>') => {
                error!(MissingDoctypeSystemIdentifier);
                slf.builder.set_force_quirks();
                slf.emit_current_doctype();
                switch_to!(Data)
            }
            None => {
                error!(EofInDoctype);
                slf.builder.set_force_quirks();
                slf.emit_current_doctype();
                eof!()
            }
            c @ Some(_) => {
                error!(MissingQuoteBeforeDoctypeSystemIdentifier);
                slf.builder.set_force_quirks();
                reconsume_in!(c, BogusDoctype)
            }
        },
        State::DoctypeSystemIdentifierDoubleQuoted => match read_char!()? {
            Some('"') => switch_to!(AfterDoctypeSystemIdentifier),
            Some('\0') => {
                error!(UnexpectedNullCharacter);
                slf.builder.push_system_identifier('\u{fffd}');
                cont!()
            }
            Some('>') => {
                error!(AbruptDoctypeSystemIdentifier);
                slf.builder.set_force_quirks();
                slf.emit_current_doctype();
                switch_to!(Data)
            }
            Some(c) => {
                slf.builder.push_system_identifier(c);
                cont!()
            }
            None => {
                error!(EofInDoctype);
                slf.builder.set_force_quirks();
                slf.emit_current_doctype();
                eof!()
            }
        },
        State::DoctypeSystemIdentifierSingleQuoted => match read_char!()? {
            Some('\'') => switch_to!(AfterDoctypeSystemIdentifier),
            Some('\0') => {
                error!(UnexpectedNullCharacter);
                slf.builder.push_system_identifier('\u{fffd}');
                cont!()
            }
            Some('>') => {
                error!(AbruptDoctypeSystemIdentifier);
                slf.builder.set_force_quirks();
                slf.emit_current_doctype();
                switch_to!(Data)
            }
            Some(c) => {
                slf.builder.push_system_identifier(c);
                cont!()
            }
            None => {
                error!(EofInDoctype);
                slf.builder.set_force_quirks();
                slf.emit_current_doctype();
                eof!()
            }
        },
        State::AfterDoctypeSystemIdentifier => match read_char!()? {
            Some('\t' | '\n' | '\x0C' | ' ') => cont!(),
            Some('>') => {
                slf.emit_current_doctype();
                switch_to!(Data)
            }
            None => {
                error!(EofInDoctype);
                slf.builder.set_force_quirks();
                slf.emit_current_doctype();
                eof!()
            }
            c @ Some(_) => {
                error!(UnexpectedCharacterAfterDoctypeSystemIdentifier);
                reconsume_in!(c, BogusDoctype)
            }
        },
        State::BogusDoctype => match read_char!()? {
            Some('>') => {
                slf.emit_current_doctype();
                switch_to!(Data)
            }
            Some('\0') => {
                error!(UnexpectedNullCharacter);
                cont!()
            }
            Some(_) => cont!(),
            None => {
                slf.emit_current_doctype();
                eof!()
            }
        },
        State::CdataSection => match read_run!(']')? {
            Some(c) => {
                debug_assert_eq!(c, ']');
                switch_to!(CdataSectionBracket)
            }
            None => {
                error!(EofInCdata);
                eof!()
            }
        },
        State::CdataSectionBracket => match read_char!()? {
            Some(']') => switch_to!(CdataSectionEnd),
            c => {
                slf.emit_char(']');
                reconsume_in!(c, CdataSection)
            }
        },
        State::CdataSectionEnd => match read_char!()? {
            Some(']') => {
                slf.emit_char(']');
                cont!()
            }
            Some('>') => switch_to!(Data),
            c => {
                slf.emit_str("]]");
                reconsume_in!(c, CdataSection)
            }
        },
        State::CharacterReference => {
            slf.temp.clear();
            slf.temp.push('&');

            match read_char!()? {
                Some(c) if c.is_ascii_alphanumeric() => {
                    reconsume_in!(Some(c), NamedCharacterReference)
                }
                Some('#') => {
                    slf.temp.push('#');
                    switch_to!(NumericCharacterReference)
                }
                c => {
                    slf.flush_charref_buffer();
                    reconsume_in_return_state!(c)
                }
            }
        }
        State::NamedCharacterReference => {
            let c = read_char!()?;

            let reference = match c {
                Some(first) => charref::resolve_named(first, |rest| {
                    slf.cursor.try_match_literal(rest, false)
                })?,
                None => None,
            };

            if let Some(reference) = reference {
                let terminated = reference.name.ends_with(';');
                let next = slf.cursor.peek(&mut slf.errors)?;

                // A bare legacy name followed by `=` or an alphanumeric is
                // left alone, so that `&notit;` stays literal while `&not`
                // before a space resolves.
                if !terminated
                    && matches!(next, Some(c) if c == '=' || c.is_ascii_alphanumeric())
                {
                    slf.temp.push_str(reference.name);
                } else {
                    if !terminated {
                        error!(MissingSemicolonAfterCharacterReference);
                    }
                    slf.temp.clear();
                    slf.temp.push_str(reference.characters);
                }

                slf.flush_charref_buffer();
                switch_to_return_state!()
            } else {
                slf.flush_charref_buffer();
                reconsume_in!(c, AmbiguousAmpersand)
            }
        }
        State::AmbiguousAmpersand => match read_char!()? {
            Some(c) if c.is_ascii_alphanumeric() => {
                if slf.charref_in_attribute() {
                    slf.builder.push_attribute_value(c);
                } else {
                    slf.emit_char(c);
                }
                cont!()
            }
            c @ Some(';') => {
                error!(UnknownNamedCharacterReference);
                reconsume_in_return_state!(c)
            }
            c => reconsume_in_return_state!(c),
        },
        State::NumericCharacterReference => {
            slf.charref_code = 0;

            match read_char!()? {
                Some(c @ ('x' | 'X')) => {
                    slf.temp.push(c);
                    switch_to!(HexadecimalCharacterReferenceStart)
                }
                c @ Some('0'..='9') => reconsume_in!(c, DecimalCharacterReference),
                c => {
                    error!(AbsenceOfDigitsInNumericCharacterReference);
                    slf.flush_charref_buffer();
                    reconsume_in_return_state!(c)
                }
            }
        }
        State::HexadecimalCharacterReferenceStart => match read_char!()? {
            c @ Some('0'..='9' | 'A'..='F' | 'a'..='f') => {
                reconsume_in!(c, HexadecimalCharacterReference)
            }
            c => {
                error!(AbsenceOfDigitsInNumericCharacterReference);
                slf.flush_charref_buffer();
                reconsume_in_return_state!(c)
            }
        },
        State::HexadecimalCharacterReference => match read_char!()? {
            Some(c @ '0'..='9') => {
                slf.charref_code = charref::push_digit(slf.charref_code, 16, c as u32 - 0x30);
                cont!()
            }
            Some(c @ 'A'..='F') => {
                slf.charref_code = charref::push_digit(slf.charref_code, 16, c as u32 - 0x37);
                cont!()
            }
            Some(c @ 'a'..='f') => {
                slf.charref_code = charref::push_digit(slf.charref_code, 16, c as u32 - 0x57);
                cont!()
            }
            Some(';') => switch_to!(NumericCharacterReferenceEnd),
            c => {
                error!(MissingSemicolonAfterCharacterReference);
                reconsume_in!(c, NumericCharacterReferenceEnd)
            }
        },
        State::DecimalCharacterReference => match read_char!()? {
            Some(c @ '0'..='9') => {
                slf.charref_code = charref::push_digit(slf.charref_code, 10, c as u32 - 0x30);
                cont!()
            }
            Some(';') => switch_to!(NumericCharacterReferenceEnd),
            c => {
                error!(MissingSemicolonAfterCharacterReference);
                reconsume_in!(c, NumericCharacterReferenceEnd)
            }
        },
        State::NumericCharacterReferenceEnd => {
            // This state consumes nothing; a reconsumed character stays put
            // for the return state.
            let code = slf.charref_code;
            let decoded = match code {
                0x00 => {
                    error!(NullCharacterReference);
                    '\u{fffd}'
                }
                0x0011_0000.. => {
                    error!(CharacterReferenceOutsideUnicodeRange);
                    '\u{fffd}'
                }
                code if charref::is_surrogate(code) => {
                    error!(SurrogateCharacterReference);
                    '\u{fffd}'
                }
                code if charref::is_noncharacter(code) => {
                    error!(NoncharacterCharacterReference);
                    char::from_u32(code).unwrap_or('\u{fffd}')
                }
                code if charref::is_control(code)
                    && !matches!(code, 0x09 | 0x0a | 0x0c | 0x20) =>
                {
                    error!(ControlCharacterReference);
                    charref::replace_control(code)
                        .or_else(|| char::from_u32(code))
                        .unwrap_or('\u{fffd}')
                }
                code => char::from_u32(code).unwrap_or('\u{fffd}'),
            };

            slf.temp.clear();
            slf.temp.push(decoded);
            slf.flush_charref_buffer();
            switch_to_return_state!()
        }
    }
}
