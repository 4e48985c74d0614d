//! Tokenizer configuration.
//!
//! The parsing rules themselves are fixed; what varies per caller is the set
//! of element names that switch the tokenizer out of regular markup after
//! their start tag, and whether CDATA sections are meaningful (they only are
//! in foreign content, which the tokenizer cannot see on its own).

use std::collections::HashMap;

use crate::state::State;

/// How the contents of a raw-text element are tokenized.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum TextMode {
    /// Character references decode, tags do not open (`<title>`,
    /// `<textarea>`).
    RcData,
    /// Fully literal until the matching end tag (`<style>`, `<iframe>`).
    RawText,
    /// Literal with the `<!--` escape tracking of script content
    /// (`<script>`).
    ScriptData,
    /// Literal to the end of input (`<plaintext>`).
    PlainText,
}

impl From<TextMode> for State {
    fn from(mode: TextMode) -> State {
        match mode {
            TextMode::RcData => State::RcData,
            TextMode::RawText => State::RawText,
            TextMode::ScriptData => State::ScriptData,
            TextMode::PlainText => State::PlainText,
        }
    }
}

/// The element names whose start tag switches the tokenizer into a raw-text
/// mode.
///
/// This is configuration, not parsing logic: the table is consulted once per
/// emitted start tag and is immutable while the tokenizer runs. The
/// [`Default`] table carries the standard HTML element set; scrapers that
/// treat e.g. `<noscript>` as markup can build their own.
///
/// Strictly, which elements are raw-text is tree-construction knowledge; a
/// name table is the approximation that works everywhere outside of a full
/// browser.
#[derive(Debug, Clone)]
pub struct TextModeTable {
    entries: HashMap<String, TextMode>,
}

impl TextModeTable {
    /// A table with no entries: every tag returns to regular markup.
    #[must_use]
    pub fn empty() -> Self {
        TextModeTable {
            entries: HashMap::new(),
        }
    }

    /// Add an element name. Names are matched ASCII-lowercased.
    #[must_use]
    pub fn with(mut self, name: &str, mode: TextMode) -> Self {
        self.entries.insert(name.to_ascii_lowercase(), mode);
        self
    }

    /// The mode for `name`, if it is a raw-text element.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<TextMode> {
        self.entries.get(name).copied()
    }
}

impl Default for TextModeTable {
    fn default() -> Self {
        TextModeTable::empty()
            .with("title", TextMode::RcData)
            .with("textarea", TextMode::RcData)
            .with("style", TextMode::RawText)
            .with("xmp", TextMode::RawText)
            .with("iframe", TextMode::RawText)
            .with("noembed", TextMode::RawText)
            .with("noframes", TextMode::RawText)
            .with("noscript", TextMode::RawText)
            .with("script", TextMode::ScriptData)
            .with("plaintext", TextMode::PlainText)
    }
}

/// Everything about a tokenizer that is decided up front by the caller.
#[derive(Debug, Clone, Default)]
pub struct Options {
    pub(crate) text_modes: TextModeTable,
    pub(crate) cdata_allowed: bool,
}

impl Options {
    /// Replace the raw-text element table.
    #[must_use]
    pub fn text_modes(mut self, table: TextModeTable) -> Self {
        self.text_modes = table;
        self
    }

    /// Permit `<![CDATA[ ... ]]>` sections.
    ///
    /// Valid only in foreign (SVG/MathML) content, which is the caller's
    /// call to make. When off (the default), CDATA openers become bogus
    /// comments with a `cdata-in-html-content` error.
    #[must_use]
    pub fn allow_cdata(mut self, yes: bool) -> Self {
        self.cdata_allowed = yes;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_covers_the_html_set() {
        let table = TextModeTable::default();
        assert_eq!(table.lookup("script"), Some(TextMode::ScriptData));
        assert_eq!(table.lookup("title"), Some(TextMode::RcData));
        assert_eq!(table.lookup("style"), Some(TextMode::RawText));
        assert_eq!(table.lookup("plaintext"), Some(TextMode::PlainText));
        assert_eq!(table.lookup("div"), None);
    }

    #[test]
    fn custom_table_is_case_normalized() {
        let table = TextModeTable::empty().with("Template", TextMode::RawText);
        assert_eq!(table.lookup("template"), Some(TextMode::RawText));
        assert_eq!(table.lookup("script"), None);
    }
}
