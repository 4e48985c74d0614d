use std::convert::Infallible;

use marklex::{
    Attribute, CharIterSource, Doctype, EndTag, ErrorKind, Options, ParseError, Source, StartState,
    StartTag, StringSource, TextModeTable, Token, Tokenizer,
};
use pretty_assertions::assert_eq;

fn tokenize(input: &str) -> (Vec<Token>, Vec<ErrorKind>) {
    let mut tokenizer = Tokenizer::new(input);
    let tokens: Vec<Token> = tokenizer.by_ref().map(|token| token.unwrap()).collect();
    let errors = tokenizer
        .take_errors()
        .into_iter()
        .map(|error| error.kind)
        .collect();
    (tokens, errors)
}

fn text(data: &str) -> Token {
    Token::Text(data.to_owned())
}

fn start_tag(name: &str, attributes: &[(&str, &str)]) -> Token {
    Token::StartTag(StartTag {
        name: name.to_owned(),
        attributes: attributes
            .iter()
            .map(|&(name, value)| Attribute {
                name: name.to_owned(),
                value: value.to_owned(),
            })
            .collect(),
        self_closing: false,
    })
}

fn end_tag(name: &str) -> Token {
    Token::EndTag(EndTag {
        name: name.to_owned(),
    })
}

#[test]
fn plain_text_passes_through_verbatim() {
    let (tokens, errors) = tokenize("hello world");
    assert_eq!(tokens, vec![text("hello world"), Token::EndOfFile]);
    assert_eq!(errors, vec![]);
}

#[test]
fn simple_element_round_trip() {
    let (tokens, errors) = tokenize("<div id=\"x\">hi</div>");
    assert_eq!(
        tokens,
        vec![
            start_tag("div", &[("id", "x")]),
            text("hi"),
            end_tag("div"),
            Token::EndOfFile,
        ]
    );
    assert_eq!(errors, vec![]);
}

#[test]
fn named_reference_decodes_in_text() {
    let (tokens, errors) = tokenize("a &amp; b");
    assert_eq!(tokens, vec![text("a & b"), Token::EndOfFile]);
    assert_eq!(errors, vec![]);
}

#[test]
fn ambiguous_ampersand_stays_literal() {
    let (tokens, errors) = tokenize("&notit;");
    assert_eq!(tokens, vec![text("&notit;"), Token::EndOfFile]);
    assert_eq!(errors, vec![]);
}

#[test]
fn legacy_reference_resolves_before_non_alphanumeric() {
    let (tokens, errors) = tokenize("&not x");
    assert_eq!(tokens, vec![text("\u{ac} x"), Token::EndOfFile]);
    assert_eq!(
        errors,
        vec![ErrorKind::MissingSemicolonAfterCharacterReference]
    );
}

#[test]
fn duplicate_attribute_first_wins() {
    let (tokens, errors) = tokenize("<a x=\"1\" x=\"2\">");
    assert_eq!(tokens, vec![start_tag("a", &[("x", "1")]), Token::EndOfFile]);
    assert_eq!(errors, vec![ErrorKind::DuplicateAttribute]);
}

#[test]
fn stray_less_than_is_literal_text() {
    let mut tokenizer = Tokenizer::new("a < b");
    let tokens: Vec<Token> = tokenizer.by_ref().map(|token| token.unwrap()).collect();
    assert_eq!(tokens, vec![text("a < b"), Token::EndOfFile]);
    assert_eq!(
        tokenizer.take_errors(),
        vec![ParseError {
            kind: ErrorKind::InvalidFirstCharacterOfTagName,
            offset: 4,
        }]
    );
}

#[test]
fn unterminated_comment_is_flushed_at_eof() {
    let (tokens, errors) = tokenize("<!-- abc");
    assert_eq!(
        tokens,
        vec![Token::Comment(" abc".to_owned()), Token::EndOfFile]
    );
    assert_eq!(errors, vec![ErrorKind::EofInComment]);
}

#[test]
fn self_closing_start_tag() {
    let (tokens, errors) = tokenize("<br/>");
    assert_eq!(
        tokens,
        vec![
            Token::StartTag(StartTag {
                name: "br".to_owned(),
                attributes: vec![],
                self_closing: true,
            }),
            Token::EndOfFile,
        ]
    );
    assert_eq!(errors, vec![]);
}

#[test]
fn end_tag_attributes_are_dropped_and_reported() {
    let (tokens, errors) = tokenize("</p id=\"x\">");
    assert_eq!(tokens, vec![end_tag("p"), Token::EndOfFile]);
    assert_eq!(errors, vec![ErrorKind::EndTagWithAttributes]);
}

#[test]
fn numeric_references_decode_to_full_scalars() {
    let (tokens, errors) = tokenize("&#x48;&#105;&#x2764;");
    assert_eq!(tokens, vec![text("Hi\u{2764}"), Token::EndOfFile]);
    assert_eq!(errors, vec![]);

    let (tokens, errors) = tokenize("&#0;");
    assert_eq!(tokens, vec![text("\u{fffd}"), Token::EndOfFile]);
    assert_eq!(errors, vec![ErrorKind::NullCharacterReference]);

    let (tokens, errors) = tokenize("&#x110000;");
    assert_eq!(tokens, vec![text("\u{fffd}"), Token::EndOfFile]);
    assert_eq!(errors, vec![ErrorKind::CharacterReferenceOutsideUnicodeRange]);

    let (tokens, errors) = tokenize("&#xD83D;");
    assert_eq!(tokens, vec![text("\u{fffd}"), Token::EndOfFile]);
    assert_eq!(errors, vec![ErrorKind::SurrogateCharacterReference]);

    let (tokens, errors) = tokenize("&#x80;");
    assert_eq!(tokens, vec![text("\u{20ac}"), Token::EndOfFile]);
    assert_eq!(errors, vec![ErrorKind::ControlCharacterReference]);
}

#[test]
fn numeric_reference_missing_semicolon() {
    let (tokens, errors) = tokenize("&#38 x");
    assert_eq!(tokens, vec![text("& x"), Token::EndOfFile]);
    assert_eq!(
        errors,
        vec![ErrorKind::MissingSemicolonAfterCharacterReference]
    );
}

#[test]
fn script_double_escape_keeps_inner_end_tag() {
    let (tokens, errors) = tokenize("<script><!--<script></script>--></script>");
    assert_eq!(
        tokens,
        vec![
            start_tag("script", &[]),
            text("<!--<script></script>-->"),
            end_tag("script"),
            Token::EndOfFile,
        ]
    );
    assert_eq!(errors, vec![]);
}

#[test]
fn title_contents_are_rcdata() {
    let (tokens, errors) = tokenize("<title>a&amp;b</title>");
    assert_eq!(
        tokens,
        vec![
            start_tag("title", &[]),
            text("a&b"),
            end_tag("title"),
            Token::EndOfFile,
        ]
    );
    assert_eq!(errors, vec![]);
}

#[test]
fn style_contents_are_rawtext() {
    let (tokens, errors) = tokenize("<style>a<b</style>");
    assert_eq!(
        tokens,
        vec![
            start_tag("style", &[]),
            text("a<b"),
            end_tag("style"),
            Token::EndOfFile,
        ]
    );
    assert_eq!(errors, vec![]);
}

#[test]
fn empty_text_mode_table_treats_script_as_markup() {
    let options = Options::default().text_modes(TextModeTable::empty());
    let mut tokenizer = Tokenizer::with_options("<script>a<b>", options);
    let tokens: Vec<Token> = tokenizer.by_ref().map(|token| token.unwrap()).collect();
    assert_eq!(
        tokens,
        vec![
            start_tag("script", &[]),
            text("a"),
            start_tag("b", &[]),
            Token::EndOfFile,
        ]
    );
}

#[test]
fn plaintext_swallows_the_rest_of_the_input() {
    let (tokens, errors) = tokenize("<plaintext></plaintext>");
    assert_eq!(
        tokens,
        vec![
            start_tag("plaintext", &[]),
            text("</plaintext>"),
            Token::EndOfFile,
        ]
    );
    assert_eq!(errors, vec![]);
}

#[test]
fn cdata_is_a_bogus_comment_in_html_content() {
    let (tokens, errors) = tokenize("<![CDATA[x]]>");
    assert_eq!(
        tokens,
        vec![Token::Comment("[CDATA[x]]".to_owned()), Token::EndOfFile]
    );
    assert_eq!(errors, vec![ErrorKind::CdataInHtmlContent]);
}

#[test]
fn cdata_tokenizes_literally_when_permitted() {
    let options = Options::default().allow_cdata(true);
    let mut tokenizer = Tokenizer::with_options("<![CDATA[x]]>", options);
    let tokens: Vec<Token> = tokenizer.by_ref().map(|token| token.unwrap()).collect();
    assert_eq!(tokens, vec![text("x"), Token::EndOfFile]);
    assert_eq!(tokenizer.take_errors(), vec![]);
}

#[test]
fn doctype_with_identifiers() {
    let (tokens, errors) = tokenize(
        "<!DOCTYPE html PUBLIC \"-//W3C//DTD HTML 4.01//EN\" \
         \"http://www.w3.org/TR/html4/strict.dtd\">",
    );
    assert_eq!(
        tokens,
        vec![
            Token::Doctype(Doctype {
                name: "html".to_owned(),
                public_identifier: Some("-//W3C//DTD HTML 4.01//EN".to_owned()),
                system_identifier: Some("http://www.w3.org/TR/html4/strict.dtd".to_owned()),
                force_quirks: false,
            }),
            Token::EndOfFile,
        ]
    );
    assert_eq!(errors, vec![]);
}

#[test]
fn malformed_doctype_forces_quirks_but_still_emits() {
    let (tokens, errors) = tokenize("<!DOCTYPE>");
    assert_eq!(
        tokens,
        vec![
            Token::Doctype(Doctype {
                name: String::new(),
                public_identifier: None,
                system_identifier: None,
                force_quirks: true,
            }),
            Token::EndOfFile,
        ]
    );
    assert_eq!(errors, vec![ErrorKind::MissingDoctypeName]);
}

#[test]
fn trailing_junk_in_doctype_is_skipped_tolerantly() {
    let (tokens, errors) = tokenize("<!DOCTYPE html SYSTEM \"x\" junk>");
    assert_eq!(
        tokens,
        vec![
            Token::Doctype(Doctype {
                name: "html".to_owned(),
                public_identifier: None,
                system_identifier: Some("x".to_owned()),
                force_quirks: false,
            }),
            Token::EndOfFile,
        ]
    );
    assert_eq!(
        errors,
        vec![ErrorKind::UnexpectedCharacterAfterDoctypeSystemIdentifier]
    );
}

#[test]
fn fragment_parsing_starts_mid_element() {
    let mut tokenizer = Tokenizer::new("x</title>y");
    tokenizer.set_start_state(StartState::RcData);
    tokenizer.set_last_start_tag(Some("title"));
    let tokens: Vec<Token> = tokenizer.map(|token| token.unwrap()).collect();
    assert_eq!(
        tokens,
        vec![text("x"), end_tag("title"), text("y"), Token::EndOfFile]
    );
}

#[test]
fn end_of_file_token_is_emitted_exactly_once() {
    let mut tokenizer = Tokenizer::new("<div>x");
    let tokens: Vec<Token> = tokenizer.by_ref().map(|token| token.unwrap()).collect();
    let eof_count = tokens
        .iter()
        .filter(|&token| *token == Token::EndOfFile)
        .count();
    assert_eq!(eof_count, 1);
    assert_eq!(tokens.last(), Some(&Token::EndOfFile));
    assert!(tokenizer.next().is_none());
}

#[test]
fn newlines_are_normalized() {
    let (tokens, errors) = tokenize("a\r\nb\rc");
    assert_eq!(tokens, vec![text("a\nb\nc"), Token::EndOfFile]);
    assert_eq!(errors, vec![]);
}

#[test]
fn null_in_data_is_reported_and_passed_through() {
    let (tokens, errors) = tokenize("a\0b");
    assert_eq!(tokens, vec![text("a\0b"), Token::EndOfFile]);
    assert_eq!(errors, vec![ErrorKind::UnexpectedNullCharacter]);
}

#[test]
fn attribute_values_decode_references_in_context() {
    let (tokens, errors) = tokenize("<a href=\"?x=1&amp;y=2\">");
    assert_eq!(
        tokens,
        vec![start_tag("a", &[("href", "?x=1&y=2")]), Token::EndOfFile]
    );
    assert_eq!(errors, vec![]);

    // A bare legacy name followed by an alphanumeric stays literal here.
    let (tokens, errors) = tokenize("<a href=\"x&notit;\">");
    assert_eq!(
        tokens,
        vec![start_tag("a", &[("href", "x&notit;")]), Token::EndOfFile]
    );
    assert_eq!(errors, vec![]);
}

#[test]
fn finish_returns_collected_errors() {
    let errors = Tokenizer::new("<div").finish().unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, ErrorKind::EofInTag);
}

/// A source that deliberately skips the bulk-read fast path, so the scalar
/// fallback gets exercised end to end.
struct SlowSource<S: Source>(S);

impl<S: Source> Source for SlowSource<S> {
    type Error = S::Error;

    fn next_char(&mut self) -> Result<Option<char>, Self::Error> {
        self.0.next_char()
    }

    fn try_match_literal(
        &mut self,
        literal: &str,
        case_insensitive: bool,
    ) -> Result<bool, Self::Error> {
        self.0.try_match_literal(literal, case_insensitive)
    }
}

#[test]
fn all_sources_agree() {
    let input = "<title>a &amp; b</title><div class=x>c\r\nd</div><!--e-->";

    let fast: Vec<Token> = Tokenizer::new(input).infallible().collect();
    let slow: Vec<Token> = Tokenizer::new(SlowSource(StringSource::new(input)))
        .map(|token| {
            let token: Result<Token, Infallible> = token;
            token.unwrap()
        })
        .collect();
    let streamed: Vec<Token> = Tokenizer::new(CharIterSource::new(input.chars()))
        .infallible()
        .collect();

    assert_eq!(fast, slow);
    assert_eq!(fast, streamed);
}
