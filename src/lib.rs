#![deny(missing_docs)]
// HTML is untrusted input from the network. Keep the whole crate safe code.
#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

mod builder;
mod charref;
mod config;
mod cursor;
mod error;
mod machine;
mod source;
mod state;
mod token;
mod tokenizer;

#[cfg(debug_assertions)]
#[doc(hidden)]
pub mod testutils;

pub use config::{Options, TextMode, TextModeTable};
pub use error::{ErrorKind, ParseError};
pub use source::{CharIterSource, IntoSource, Source, StringSource};
pub use state::StartState;
pub use token::{Attribute, Doctype, EndTag, StartTag, Token};
pub use tokenizer::{InfallibleTokenizer, Tokenizer};
