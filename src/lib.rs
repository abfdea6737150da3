//! # pushjson
//!
//! An incremental, push-based JSON parser.
//!
//! Feed raw bytes into a [`Parser`] in chunks of any size; it never
//! buffers the whole document. For each syntactic token the parser drives
//! a callback on a caller-supplied event sink (a [`Backend`]): container
//! boundaries, object keys, and fully decoded scalar values. Strings
//! arrive escape-decoded with UTF-16 surrogate pairs already combined,
//! and the input is validated as UTF-8 on the fly.
//!
//! The callback sequence for any input prefix depends only on that prefix
//! and the enabled [`Extensions`], never on how the input was chunked, so
//! the parser is equally at home behind a socket, a file reader, or an
//! in-memory slice.
//!
//! ## Examples
//!
//! ### Push-based parsing
//!
//! Push chunks with [`Parser::input()`] and finish with
//! [`Parser::eof()`], which returns the backend's result:
//!
//! ```
//! use pushjson::{NullBackend, Parser};
//!
//! let json = br#"{"name": "Grace", "scores": [1, 2, 3]}"#;
//!
//! let mut parser = Parser::new(NullBackend::new());
//! for chunk in json.chunks(7) {
//!     parser.input(chunk);
//! }
//! assert!(parser.eof().is_ok());
//! ```
//!
//! ### Materialising a DOM
//!
//! The [`dom`] module ships a backend that builds a tree of
//! [`dom::Element`] values:
//!
//! ```
//! use pushjson::dom::{parse_into_dom, Element};
//! use pushjson::Extensions;
//!
//! let dom = parse_into_dom(br#"{"a": [1, true]}"#, Extensions::empty()).unwrap();
//! assert_eq!(
//!     dom.as_object().unwrap()["a"],
//!     Element::Array(vec![Element::I64(1), Element::Bool(true)])
//! );
//! ```
//!
//! ### Diagnosing failures
//!
//! Errors latch: the first diagnosis sticks, further input is ignored,
//! and the parser reports the token and input positions it refers to:
//!
//! ```
//! use pushjson::{Error, NullBackend, Parser};
//!
//! let mut parser = Parser::new(NullBackend::new());
//! parser.input(b"{\"a\": 1,}");
//! assert_eq!(parser.eof(), Err(Error::ExpectedObjectKey));
//! assert_eq!(parser.pos().column, 9);
//! ```
//!
//! ### Beyond strict JSON
//!
//! Opt-in [`Extensions`] relax the grammar: comments, trailing commas,
//! single-quoted strings, unquoted object keys, and more:
//!
//! ```
//! use pushjson::{Extensions, NullBackend, Parser};
//!
//! let json = b"{\n  // comment\n  answer: 42,\n}";
//! let ext = Extensions::SINGLE_LINE_COMMENTS
//!     | Extensions::IDENTIFIER_OBJECT_KEY
//!     | Extensions::OBJECT_TRAILING_COMMA;
//!
//! let mut parser = Parser::with_extensions(NullBackend::new(), ext);
//! parser.input(json);
//! assert!(parser.eof().is_ok());
//! ```
mod backend;
mod coord;
pub mod dom;
pub mod emit;
mod error;
mod extensions;
mod ident;
mod options;
mod parser;
pub mod schema;
mod utf8;

#[cfg(feature = "serde_json")]
pub mod serde_json;

pub use backend::{Backend, NullBackend};
pub use coord::Coord;
pub use error::Error;
pub use extensions::Extensions;
pub use options::{ParserOptions, ParserOptionsBuilder};
pub use parser::Parser;
