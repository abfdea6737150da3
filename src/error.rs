use thiserror::Error;

/// An error produced while parsing JSON text or while materialising a DOM.
///
/// Every error is terminal: once the parser has latched one, further input
/// is ignored and [`Parser::eof()`](crate::Parser::eof()) keeps returning
/// the same value.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// An object-key identifier contained a code point outside the
    /// identifier character classes
    #[error("bad identifier")]
    BadIdentifier,

    /// The input contained ill-formed UTF-8, a lone UTF-16 surrogate, or a
    /// mismatched surrogate pair
    #[error("bad UNICODE code point")]
    BadUnicodeCodePoint,

    /// The DOM backend's containers are nested more deeply than its budget
    /// allows
    #[error("(DOM) object or array contains too many members")]
    DomNestingTooDeep,

    /// An array member, `,`, or `]` was expected
    #[error("expected array member")]
    ExpectedArrayMember,

    /// A string was still open when the input ended or contained a raw
    /// control character
    #[error("expected close quote")]
    ExpectedCloseQuote,

    /// A `:` was expected after an object key
    #[error("expected colon")]
    ExpectedColon,

    /// A number was cut off where digits were required
    #[error("expected digits")]
    ExpectedDigits,

    /// An object key was expected
    #[error("expected object key")]
    ExpectedObjectKey,

    /// An object member, `,`, or `}` was expected
    #[error("expected object member")]
    ExpectedObjectMember,

    /// A token was expected
    #[error("expected token")]
    ExpectedToken,

    /// A string escape used a letter outside the supported set
    #[error("invalid escape character")]
    InvalidEscapeChar,

    /// A `\u` escape contained a non-hexadecimal character
    #[error("invalid hexadecimal escape character")]
    InvalidHexChar,

    /// The grammar stack exceeded the configured maximum depth
    #[error("objects are too deeply nested")]
    NestingTooDeep,

    /// A number cannot be represented as i64/u64/f64
    #[error("number out of range")]
    NumberOutOfRange,

    /// More input followed the top-level value
    #[error("unexpected extra input")]
    UnexpectedExtraInput,

    /// The input contained a character sequence that is not a JSON token
    #[error("unrecognized token")]
    UnrecognizedToken,

    /// A string exceeded the configured maximum length
    #[error("string too long")]
    StringTooLong,

    /// An identifier exceeded the configured maximum length
    #[error("identifier too long")]
    IdentifierTooLong,

    /// A `/*` comment was still open when the input ended
    #[error("unterminated /* comment")]
    UnterminatedMultilineComment,
}
