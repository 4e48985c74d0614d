//! Runs every `tests/fixtures/*.test` file: JSON suites of input markup with
//! expected tokens and error codes.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use marklex::{
    Attribute, Doctype, EndTag, Options, StartState, StartTag, Token, Tokenizer,
};
use pretty_assertions::assert_eq;
use serde::Deserialize;

#[derive(Deserialize)]
struct Suite {
    tests: Vec<Case>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Case {
    description: String,
    input: String,
    #[serde(default, rename = "initialState")]
    initial_state: Option<String>,
    #[serde(default, rename = "lastStartTag")]
    last_start_tag: Option<String>,
    #[serde(default)]
    cdata: bool,
    output: Vec<FixtureToken>,
    #[serde(default)]
    errors: Vec<String>,
}

#[derive(Deserialize)]
#[serde(tag = "type", deny_unknown_fields)]
enum FixtureToken {
    Doctype {
        #[serde(default)]
        name: String,
        #[serde(default, rename = "publicId")]
        public_id: Option<String>,
        #[serde(default, rename = "systemId")]
        system_id: Option<String>,
        #[serde(default, rename = "forceQuirks")]
        force_quirks: bool,
    },
    StartTag {
        name: String,
        #[serde(default)]
        attributes: Vec<FixtureAttribute>,
        #[serde(default, rename = "selfClosing")]
        self_closing: bool,
    },
    EndTag {
        name: String,
    },
    Comment {
        data: String,
    },
    Text {
        data: String,
    },
}

#[derive(Deserialize)]
struct FixtureAttribute {
    name: String,
    value: String,
}

impl From<FixtureToken> for Token {
    fn from(token: FixtureToken) -> Token {
        match token {
            FixtureToken::Doctype {
                name,
                public_id,
                system_id,
                force_quirks,
            } => Token::Doctype(Doctype {
                name,
                public_identifier: public_id,
                system_identifier: system_id,
                force_quirks,
            }),
            FixtureToken::StartTag {
                name,
                attributes,
                self_closing,
            } => Token::StartTag(StartTag {
                name,
                attributes: attributes
                    .into_iter()
                    .map(|a| Attribute {
                        name: a.name,
                        value: a.value,
                    })
                    .collect(),
                self_closing,
            }),
            FixtureToken::EndTag { name } => Token::EndTag(EndTag { name }),
            FixtureToken::Comment { data } => Token::Comment(data),
            FixtureToken::Text { data } => Token::Text(data),
        }
    }
}

fn start_state(name: &str) -> StartState {
    match name {
        "Data" => StartState::Data,
        "PlainText" => StartState::PlainText,
        "RcData" => StartState::RcData,
        "RawText" => StartState::RawText,
        "ScriptData" => StartState::ScriptData,
        "CdataSection" => StartState::CdataSection,
        other => panic!("unknown initial state: {}", other),
    }
}

fn run_case(file: &str, index: usize, case: Case) {
    println!("==== {} #{}: {} ====", file, index, case.description);

    let options = Options::default().allow_cdata(case.cdata);
    let mut tokenizer = Tokenizer::with_options(&case.input, options);
    if let Some(state) = &case.initial_state {
        tokenizer.set_start_state(start_state(state));
    }
    tokenizer.set_last_start_tag(case.last_start_tag.as_deref());

    let mut tokens: Vec<Token> = tokenizer.by_ref().map(|token| token.unwrap()).collect();
    assert_eq!(tokens.pop(), Some(Token::EndOfFile));

    let expected: Vec<Token> = case.output.into_iter().map(Token::from).collect();
    assert_eq!(expected, tokens);

    let errors: Vec<&str> = tokenizer.errors().iter().map(|e| e.kind.as_str()).collect();
    assert_eq!(case.errors, errors);
}

fn run_file(path: &Path) {
    let file = path.file_name().unwrap().to_str().unwrap().to_owned();
    let suite: Suite =
        serde_json::from_reader(BufReader::new(File::open(path).unwrap())).unwrap();
    for (index, case) in suite.tests.into_iter().enumerate() {
        run_case(&file, index, case);
    }
}

#[test]
fn fixtures() {
    let pattern = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/*.test");
    let mut seen = 0;
    for entry in glob::glob(pattern).unwrap() {
        run_file(&entry.unwrap());
        seen += 1;
    }
    assert!(seen > 0, "no fixture files found");
}
