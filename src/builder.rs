//! Accumulation of the token under construction.
//!
//! [`TokenBuilder`] is a plain accumulator: the state machine feeds it
//! characters and structural signals across many state transitions, then
//! asks it to finish the token. It holds no position information and never
//! looks at the input; rule violations it can detect (duplicate attributes,
//! attributes on end tags) are returned to the caller as error kinds so the
//! tokenizer can attach offsets.

use crate::error::ErrorKind;
use crate::token::{Attribute, Doctype, EndTag, StartTag, Token};

#[derive(Debug)]
enum Pending {
    StartTag(StartTag),
    EndTag {
        tag: EndTag,
        dropped_attributes: bool,
    },
    Comment(String),
    Doctype(Doctype),
}

/// Builds one token at a time. Owned exclusively by the tokenizer and reset
/// whenever a token is finished or a malformed construct is abandoned.
#[derive(Debug, Default)]
pub(crate) struct TokenBuilder {
    pending: Option<Pending>,
    attr_name: String,
    attr_value: String,
    has_attribute: bool,
    last_start_tag: String,
}

impl TokenBuilder {
    /// Begin a start-tag token.
    pub(crate) fn start_start_tag(&mut self) {
        self.reset_attribute();
        self.pending = Some(Pending::StartTag(StartTag::default()));
    }

    /// Begin an end-tag token.
    pub(crate) fn start_end_tag(&mut self) {
        self.reset_attribute();
        self.pending = Some(Pending::EndTag {
            tag: EndTag::default(),
            dropped_attributes: false,
        });
    }

    /// Append to the current tag's name. Names are ASCII-lowercased here so
    /// every call site agrees on the case.
    pub(crate) fn push_name(&mut self, c: char) {
        match self.pending {
            Some(Pending::StartTag(ref mut tag)) => tag.name.push(c.to_ascii_lowercase()),
            Some(Pending::EndTag { ref mut tag, .. }) => tag.name.push(c.to_ascii_lowercase()),
            _ => unreachable!("no tag under construction"),
        }
    }

    /// Begin a new attribute, finishing the previous one first.
    pub(crate) fn start_attribute(&mut self) -> Option<ErrorKind> {
        let error = self.finish_attribute();
        self.has_attribute = true;
        error
    }

    /// Finish the attribute under construction, if any.
    ///
    /// Uniqueness is enforced here, at insertion time: a repeated name loses
    /// to the first occurrence and surfaces as `duplicate-attribute`. On an
    /// end tag the attribute is dropped entirely; that is reported once, at
    /// tag finish.
    pub(crate) fn finish_attribute(&mut self) -> Option<ErrorKind> {
        if !self.has_attribute {
            return None;
        }
        self.has_attribute = false;
        let name = std::mem::take(&mut self.attr_name);
        let value = std::mem::take(&mut self.attr_value);

        match self.pending {
            Some(Pending::StartTag(ref mut tag)) => {
                if tag.attributes.iter().any(|a| a.name == name) {
                    Some(ErrorKind::DuplicateAttribute)
                } else {
                    tag.attributes.push(Attribute { name, value });
                    None
                }
            }
            Some(Pending::EndTag {
                ref mut dropped_attributes,
                ..
            }) => {
                *dropped_attributes = true;
                None
            }
            _ => unreachable!("no tag under construction"),
        }
    }

    /// Whether an attribute with this (lowercase) name is already finished on
    /// the current start tag.
    #[cfg(test)]
    pub(crate) fn has_finished_attribute(&self, name: &str) -> bool {
        match self.pending {
            Some(Pending::StartTag(ref tag)) => tag.attributes.iter().any(|a| a.name == name),
            _ => false,
        }
    }

    /// Append to the current attribute's name.
    pub(crate) fn push_attribute_name(&mut self, c: char) {
        debug_assert!(self.has_attribute);
        self.attr_name.push(c.to_ascii_lowercase());
    }

    /// Append to the current attribute's value.
    pub(crate) fn push_attribute_value(&mut self, c: char) {
        debug_assert!(self.has_attribute);
        self.attr_value.push(c);
    }

    /// Append a string to the current attribute's value (decoded character
    /// references arrive this way).
    pub(crate) fn push_attribute_value_str(&mut self, s: &str) {
        debug_assert!(self.has_attribute);
        self.attr_value.push_str(s);
    }

    /// Mark the current tag self-closing. On an end tag the flag is invalid
    /// and reported instead.
    pub(crate) fn set_self_closing(&mut self) -> Option<ErrorKind> {
        match self.pending {
            Some(Pending::StartTag(ref mut tag)) => {
                tag.self_closing = true;
                None
            }
            Some(Pending::EndTag { .. }) => Some(ErrorKind::EndTagWithTrailingSolidus),
            _ => unreachable!("no tag under construction"),
        }
    }

    /// Finish the current tag. Returns the token and, for an end tag that
    /// carried attributes, the error to report.
    ///
    /// The caller must run [`TokenBuilder::finish_attribute`] first.
    pub(crate) fn finish_tag(&mut self) -> (Token, Option<ErrorKind>) {
        debug_assert!(!self.has_attribute);
        match self.pending.take() {
            Some(Pending::StartTag(tag)) => {
                self.last_start_tag.clear();
                self.last_start_tag.push_str(&tag.name);
                (Token::StartTag(tag), None)
            }
            Some(Pending::EndTag {
                tag,
                dropped_attributes,
            }) => {
                self.last_start_tag.clear();
                let error = if dropped_attributes {
                    Some(ErrorKind::EndTagWithAttributes)
                } else {
                    None
                };
                (Token::EndTag(tag), error)
            }
            _ => unreachable!("no tag under construction"),
        }
    }

    /// Begin a comment token.
    pub(crate) fn start_comment(&mut self) {
        self.pending = Some(Pending::Comment(String::new()));
    }

    /// Append to the current comment's data.
    pub(crate) fn push_comment(&mut self, c: char) {
        match self.pending {
            Some(Pending::Comment(ref mut data)) => data.push(c),
            _ => unreachable!("no comment under construction"),
        }
    }

    /// Append a string to the current comment's data.
    pub(crate) fn push_comment_str(&mut self, s: &str) {
        match self.pending {
            Some(Pending::Comment(ref mut data)) => data.push_str(s),
            _ => unreachable!("no comment under construction"),
        }
    }

    /// Finish the current comment.
    pub(crate) fn finish_comment(&mut self) -> Token {
        match self.pending.take() {
            Some(Pending::Comment(data)) => Token::Comment(data),
            _ => unreachable!("no comment under construction"),
        }
    }

    /// Begin a doctype token: empty name, both identifiers absent, quirks
    /// flag clear.
    pub(crate) fn start_doctype(&mut self) {
        self.pending = Some(Pending::Doctype(Doctype::default()));
    }

    fn doctype(&mut self) -> &mut Doctype {
        match self.pending {
            Some(Pending::Doctype(ref mut doctype)) => doctype,
            _ => unreachable!("no doctype under construction"),
        }
    }

    /// Append to the doctype's name.
    pub(crate) fn push_doctype_name(&mut self, c: char) {
        self.doctype().name.push(c.to_ascii_lowercase());
    }

    /// Give the doctype a public identifier (present but empty).
    pub(crate) fn start_public_identifier(&mut self) {
        self.doctype().public_identifier = Some(String::new());
    }

    /// Append to the doctype's public identifier.
    pub(crate) fn push_public_identifier(&mut self, c: char) {
        match self.doctype().public_identifier {
            Some(ref mut id) => id.push(c),
            None => unreachable!("public identifier not started"),
        }
    }

    /// Give the doctype a system identifier (present but empty).
    pub(crate) fn start_system_identifier(&mut self) {
        self.doctype().system_identifier = Some(String::new());
    }

    /// Append to the doctype's system identifier.
    pub(crate) fn push_system_identifier(&mut self, c: char) {
        match self.doctype().system_identifier {
            Some(ref mut id) => id.push(c),
            None => unreachable!("system identifier not started"),
        }
    }

    /// Set the doctype's force-quirks flag.
    pub(crate) fn set_force_quirks(&mut self) {
        self.doctype().force_quirks = true;
    }

    /// Finish the current doctype.
    pub(crate) fn finish_doctype(&mut self) -> Token {
        match self.pending.take() {
            Some(Pending::Doctype(doctype)) => Token::Doctype(doctype),
            _ => unreachable!("no doctype under construction"),
        }
    }

    /// Abandon whatever is under construction (malformed constructs that get
    /// reinterpreted as literal text).
    pub(crate) fn abandon(&mut self) {
        self.pending = None;
        self.reset_attribute();
    }

    /// True when the token under construction is an end tag whose name
    /// matches the most recently emitted start tag.
    pub(crate) fn is_appropriate_end_tag(&self) -> bool {
        match self.pending {
            Some(Pending::EndTag { ref tag, .. }) => {
                !self.last_start_tag.is_empty() && self.last_start_tag == tag.name
            }
            _ => false,
        }
    }

    /// Seed the last start tag for fragment parsing.
    pub(crate) fn set_last_start_tag(&mut self, name: Option<&str>) {
        self.last_start_tag.clear();
        if let Some(name) = name {
            self.last_start_tag.push_str(name);
        }
    }

    fn reset_attribute(&mut self) {
        self.attr_name.clear();
        self.attr_value.clear();
        self.has_attribute = false;
    }
}
