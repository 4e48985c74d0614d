//! The tokens produced by tokenization.

use std::fmt;

/// One name/value pair on a start tag.
#[derive(Debug, Default, Eq, PartialEq, Clone)]
pub struct Attribute {
    /// The attribute's name, ASCII-lowercased.
    pub name: String,
    /// The attribute's value with character references decoded. Empty for
    /// attributes written without a value.
    pub value: String,
}

/// A start tag such as `<p>` or `<a href="/">`.
#[derive(Debug, Default, Eq, PartialEq, Clone)]
pub struct StartTag {
    /// The tag name, ASCII-lowercased.
    pub name: String,

    /// Attributes in source order. Names are unique: when the markup repeats
    /// a name, the first occurrence wins and the duplicate is dropped with a
    /// `duplicate-attribute` error.
    pub attributes: Vec<Attribute>,

    /// Whether the tag was written `<br/>`-style. A self-closing tag has no
    /// matching end tag.
    pub self_closing: bool,
}

impl StartTag {
    /// Look up an attribute value by (lowercase) name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }
}

/// An end tag such as `</p>`.
#[derive(Debug, Default, Eq, PartialEq, Clone)]
pub struct EndTag {
    /// The tag name, ASCII-lowercased.
    pub name: String,
}

/// A doctype declaration. Some examples:
///
/// * `<!DOCTYPE {name}>`
/// * `<!DOCTYPE {name} PUBLIC '{public_identifier}'>`
/// * `<!DOCTYPE {name} SYSTEM '{system_identifier}'>`
/// * `<!DOCTYPE {name} PUBLIC '{public_identifier}' '{system_identifier}'>`
#[derive(Debug, Default, Eq, PartialEq, Clone)]
pub struct Doctype {
    /// The doctype's name, ASCII-lowercased. `"html"` for HTML documents.
    pub name: String,

    /// The public identifier, if one was written. Absent is distinct from
    /// empty.
    pub public_identifier: Option<String>,

    /// The system identifier, if one was written. Absent is distinct from
    /// empty.
    pub system_identifier: Option<String>,

    /// Set when the declaration was malformed enough that a downstream
    /// consumer should treat the document as quirky.
    pub force_quirks: bool,
}

/// One structural unit of the input.
///
/// The tokenizer emits these in input order and finishes every stream with
/// exactly one [`Token::EndOfFile`].
#[derive(Debug, Eq, PartialEq, Clone)]
pub enum Token {
    /// A doctype declaration.
    Doctype(Doctype),
    /// A start tag.
    StartTag(StartTag),
    /// An end tag.
    EndTag(EndTag),
    /// A comment.
    Comment(String),
    /// A run of character data. Adjacent characters are coalesced; the run
    /// preserves input order exactly.
    Text(String),
    /// End of input. Terminal, emitted exactly once.
    EndOfFile,
}

impl fmt::Display for Token {
    /// Render the token roughly the way it could have been written.
    ///
    /// This is a debugging aid, not a serializer: attribute values are
    /// emitted double-quoted without re-escaping, and decoded character
    /// references stay decoded.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Doctype(doctype) => {
                write!(f, "<!DOCTYPE {}", doctype.name)?;
                if let Some(public_identifier) = &doctype.public_identifier {
                    write!(f, " PUBLIC \"{}\"", public_identifier)?;
                    if let Some(system_identifier) = &doctype.system_identifier {
                        write!(f, " \"{}\"", system_identifier)?;
                    }
                } else if let Some(system_identifier) = &doctype.system_identifier {
                    write!(f, " SYSTEM \"{}\"", system_identifier)?;
                }
                write!(f, ">")
            }
            Token::StartTag(tag) => {
                write!(f, "<{}", tag.name)?;
                for attribute in &tag.attributes {
                    write!(f, " {}=\"{}\"", attribute.name, attribute.value)?;
                }
                if tag.self_closing {
                    write!(f, "/>")
                } else {
                    write!(f, ">")
                }
            }
            Token::EndTag(tag) => write!(f, "</{}>", tag.name),
            Token::Comment(data) => write!(f, "<!--{}-->", data),
            Token::Text(data) => data.fmt(f),
            Token::EndOfFile => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_lookup() {
        let tag = StartTag {
            name: "a".into(),
            attributes: vec![
                Attribute {
                    name: "href".into(),
                    value: "/x".into(),
                },
                Attribute {
                    name: "target".into(),
                    value: String::new(),
                },
            ],
            self_closing: false,
        };
        assert_eq!(tag.attribute("href"), Some("/x"));
        assert_eq!(tag.attribute("target"), Some(""));
        assert_eq!(tag.attribute("id"), None);
    }

    #[test]
    fn display_round_trips_simple_markup() {
        let tag = Token::StartTag(StartTag {
            name: "img".into(),
            attributes: vec![Attribute {
                name: "src".into(),
                value: "a.png".into(),
            }],
            self_closing: true,
        });
        assert_eq!(tag.to_string(), "<img src=\"a.png\"/>");
        assert_eq!(
            Token::Comment(" hi ".into()).to_string(),
            "<!-- hi -->"
        );
        assert_eq!(
            Token::EndTag(EndTag { name: "p".into() }).to_string(),
            "</p>"
        );
    }
}
