use std::mem;
use std::str::from_utf8;

use btoi::{btoi, btoi_radix, btou, btou_radix, ParseIntegerError};
use num_traits::{CheckedAdd, CheckedMul, CheckedSub, FromPrimitive, Zero};

use crate::coord::Coord;
use crate::ident;
use crate::utf8::{self, Decoded, Utf8Decoder};
use crate::{Backend, Error, Extensions, ParserOptions};

/// Convert an ASCII hex digit to its value.
fn hex_digit(c: char) -> Option<u16> {
    c.to_digit(16).map(|d| d as u16)
}

/// Parse an integer lexeme with overflow detection.
fn parse_int<I>(digits: &[u8], radix: u32) -> Result<I, ParseIntegerError>
where
    I: FromPrimitive + Zero + CheckedAdd + CheckedSub + CheckedMul,
{
    if radix == 10 {
        btoi(digits)
    } else {
        btoi_radix(digits, radix)
    }
}

/// Parse a non-negative integer lexeme with overflow detection.
fn parse_uint<I>(digits: &[u8], radix: u32) -> Result<I, ParseIntegerError>
where
    I: FromPrimitive + Zero + CheckedAdd + CheckedMul,
{
    if radix == 10 {
        btou(digits)
    } else {
        btou_radix(digits, radix)
    }
}

/// Sub-state of a `\uXXXX` escape, shared by strings and identifiers.
/// `high` carries a pending high surrogate awaiting its low half.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum UEscape {
    /// Collecting the four hex digits of one UTF-16 code unit
    Hex {
        high: Option<u16>,
        value: u16,
        count: u8,
    },
    /// A high surrogate was read; the next character must be `\`
    LowBackslash { high: u16 },
    /// A high surrogate was read and `\` consumed; the next must be `u`
    LowU { high: u16 },
}

/// The outcome of completing one `\uXXXX` code unit.
enum Unescape {
    Done(char),
    NeedLow(u16),
}

fn complete_code_unit(high: Option<u16>, unit: u16) -> Result<Unescape, Error> {
    match high {
        None => {
            if utf8::is_utf16_high_surrogate(unit) {
                Ok(Unescape::NeedLow(unit))
            } else if utf8::is_utf16_low_surrogate(unit) {
                Err(Error::BadUnicodeCodePoint)
            } else {
                Ok(Unescape::Done(
                    char::from_u32(u32::from(unit)).unwrap_or(utf8::REPLACEMENT),
                ))
            }
        }
        Some(h) => utf8::utf16_to_code_point(h, unit)
            .map(Unescape::Done)
            .ok_or(Error::BadUnicodeCodePoint),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StrState {
    Normal,
    Escape,
    Unicode(UEscape),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct StrLex {
    quote: char,
    state: StrState,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum IdentState {
    Normal,
    Escape,
    Unicode(UEscape),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum NumState {
    /// After a leading sign; the first digit is still outstanding
    Sign,
    /// After a leading `0`
    Zero,
    /// Inside the integer digits
    Int,
    /// After `0x`; at least one hex digit is outstanding
    HexStart,
    /// Inside hex digits
    Hex,
    /// After `.`; at least one fraction digit is outstanding
    FracStart,
    /// Inside the fraction digits
    Frac,
    /// After `e`/`E`; a sign or digit is outstanding
    ExpStart,
    /// After the exponent sign; a digit is outstanding
    ExpSign,
    /// Inside the exponent digits
    Exp,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct NumLex {
    state: NumState,
    hex: bool,
    float: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum KwToken {
    True,
    False,
    Null,
    Infinity { negative: bool },
    Nan,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct KeywordLex {
    literal: &'static [u8],
    matched: usize,
    token: KwToken,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Lex {
    Start,
    Str(StrLex),
    Num(NumLex),
    Keyword(KeywordLex),
    Ident(IdentState),
    /// Seen `/`, deciding between `//` and `/*`
    CommentStart,
    LineComment,
    BlockComment { star: bool },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ArrayState {
    Empty,
    HasElement,
    AfterComma,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ObjectState {
    Empty,
    AfterKey,
    AfterColon,
    HasMember,
    AfterComma,
}

/// One record on the grammar stack: a pending container and how far its
/// member/separator alternation has progressed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Frame {
    Array(ArrayState),
    Object(ObjectState),
}

/// An incremental, push-based JSON parser.
///
/// The parser consumes raw bytes in arbitrary chunks through
/// [`input()`](Self::input()) and drives the callbacks of a [`Backend`]
/// for each syntactic token, strictly in input order. For any input
/// prefix, the callback sequence depends only on that prefix and the
/// enabled [`Extensions`], and in particular not on how the
/// input was split into chunks.
///
/// A parser instance is single-use: feed it zero or more chunks, then
/// finish with [`eof()`](Self::eof()), which yields the backend's result
/// or the first error. Errors latch: after a failure every further chunk
/// is ignored and `eof()` keeps reporting the same error, together with
/// the position where the offending token started ([`pos()`](Self::pos()))
/// and where the offending code point was consumed
/// ([`input_pos()`](Self::input_pos())).
pub struct Parser<B> {
    backend: B,
    extensions: Extensions,
    max_depth: usize,
    max_string_length: usize,

    decoder: Utf8Decoder,
    /// Position of the code point currently being consumed
    input_pos: Coord,
    /// Position at which the current (or most recent) token started
    token_pos: Coord,
    prev_cr: bool,

    lex: Lex,
    /// Scratch for the current string or identifier, always valid UTF-8
    scratch: Vec<u8>,
    /// Length of `scratch` in code points
    scratch_cps: usize,
    /// Scratch for the current number lexeme, ASCII only
    num: Vec<u8>,

    stack: Vec<Frame>,
    /// `true` once the top-level value has been completed
    have_value: bool,
    error: Option<Error>,
}

impl<B> Parser<B>
where
    B: Backend,
{
    /// Create a parser for strict RFC 8259 JSON bound to `backend`.
    pub fn new(backend: B) -> Self {
        Self::with_options(backend, ParserOptions::default())
    }

    /// Create a parser with a set of grammar extensions enabled.
    pub fn with_extensions(backend: B, extensions: Extensions) -> Self {
        Self::with_options(
            backend,
            crate::ParserOptionsBuilder::default()
                .with_extensions(extensions)
                .build(),
        )
    }

    /// Create a parser with full control over its configuration.
    pub fn with_options(backend: B, options: ParserOptions) -> Self {
        Parser {
            backend,
            extensions: options.extensions,
            max_depth: options.max_depth,
            max_string_length: options.max_string_length,
            decoder: Utf8Decoder::new(),
            input_pos: Coord::default(),
            token_pos: Coord::default(),
            prev_cr: false,
            lex: Lex::Start,
            scratch: Vec::new(),
            scratch_cps: 0,
            num: Vec::new(),
            stack: Vec::new(),
            have_value: false,
            error: None,
        }
    }

    /// Push a chunk of input.
    ///
    /// Never fails; a diagnosis latches into the parser instead and makes
    /// every further byte a no-op. The method is chainable:
    ///
    /// ```
    /// use pushjson::{NullBackend, Parser};
    ///
    /// let mut p = Parser::new(NullBackend::new());
    /// p.input(b"[1, ").input(b"2]");
    /// assert!(p.eof().is_ok());
    /// ```
    pub fn input(&mut self, bytes: impl AsRef<[u8]>) -> &mut Self {
        for &b in bytes.as_ref() {
            if self.error.is_some() {
                break;
            }
            self.push_byte(b);
        }
        self
    }

    /// Signal the end of the input.
    ///
    /// Flushes any pending number or keyword, verifies that exactly one
    /// top-level value has been delivered, and returns the backend's
    /// result, or the latched error.
    pub fn eof(&mut self) -> Result<B::Result, Error> {
        if let Some(e) = self.error {
            return Err(e);
        }
        if let Err(e) = self.finish() {
            self.error = Some(e);
            return Err(e);
        }
        Ok(self.backend.result())
    }

    /// The position at which the current (or most recent) token started.
    /// After an error this is the token the diagnosis refers to.
    pub fn pos(&self) -> Coord {
        self.token_pos
    }

    /// The position of the most recently consumed code point.
    pub fn input_pos(&self) -> Coord {
        self.input_pos
    }

    /// The latched error, if any.
    pub fn last_error(&self) -> Option<Error> {
        self.error
    }

    /// `true` once an error has latched.
    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// The extensions this parser was created with.
    pub fn extensions(&self) -> Extensions {
        self.extensions
    }

    /// Access the backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Mutable access to the backend.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    fn push_byte(&mut self, b: u8) {
        // Fast path: printable ASCII inside a string body bypasses the
        // decoder and the state machine.
        if let Lex::Str(s) = &self.lex {
            if s.state == StrState::Normal
                && self.decoder.is_complete()
                && (0x20..0x80).contains(&b)
                && b != b'\\'
                && b != s.quote as u8
            {
                if self.scratch_cps >= self.max_string_length {
                    self.error = Some(Error::StringTooLong);
                    return;
                }
                self.scratch.push(b);
                self.scratch_cps += 1;
                self.advance_pos(b as char);
                return;
            }
        }

        match self.decoder.get(b) {
            None => {}
            Some(Decoded::CodePoint(c)) => self.consume(c, false),
            Some(Decoded::Malformed) => self.consume(utf8::REPLACEMENT, true),
        }
    }

    fn consume(&mut self, c: char, malformed: bool) {
        // The decoder substitutes U+FFFD and carries on, but inside a
        // string or identifier the damage is a terminal diagnosis.
        if malformed && matches!(self.lex, Lex::Str(_) | Lex::Ident(_)) {
            self.error = Some(Error::BadUnicodeCodePoint);
            return;
        }
        let mut again = true;
        while again {
            match self.step(c) {
                Ok(r) => again = r,
                Err(e) => {
                    self.error = Some(e);
                    return;
                }
            }
        }
        self.advance_pos(c);
    }

    fn advance_pos(&mut self, c: char) {
        self.input_pos.advance(c, self.prev_cr);
        self.prev_cr = c == '\r';
    }

    /// Process one code point. Returns `Ok(true)` if the same code point
    /// must be processed again (it terminated the previous token).
    fn step(&mut self, c: char) -> Result<bool, Error> {
        match mem::replace(&mut self.lex, Lex::Start) {
            Lex::Start => self.lex_start(c),
            Lex::Str(s) => self.lex_str(s, c),
            Lex::Num(n) => self.lex_num(n, c),
            Lex::Keyword(k) => self.lex_keyword(k, c),
            Lex::Ident(s) => self.lex_ident(s, c),
            Lex::CommentStart => self.lex_comment_start(c),
            Lex::LineComment => {
                if c != '\n' && c != '\r' {
                    self.lex = Lex::LineComment;
                }
                Ok(false)
            }
            Lex::BlockComment { star } => {
                if star && c == '/' {
                    // comment closed
                } else {
                    self.lex = Lex::BlockComment { star: c == '*' };
                }
                Ok(false)
            }
        }
    }

    fn lex_start(&mut self, c: char) -> Result<bool, Error> {
        if matches!(c, ' ' | '\t' | '\n' | '\r') {
            return Ok(false);
        }
        self.token_pos = self.input_pos;

        // Comments are permitted wherever whitespace is, including after
        // the top-level value.
        match c {
            '#' if self.extensions.contains(Extensions::BASH_COMMENTS) => {
                self.lex = Lex::LineComment;
                return Ok(false);
            }
            '/' => {
                return if self.extensions.intersects(
                    Extensions::SINGLE_LINE_COMMENTS | Extensions::MULTI_LINE_COMMENTS,
                ) {
                    self.lex = Lex::CommentStart;
                    Ok(false)
                } else {
                    Err(Error::ExpectedToken)
                };
            }
            _ => {}
        }

        // After the top-level value only whitespace and comments remain.
        if self.stack.is_empty() && self.have_value {
            return Err(Error::UnexpectedExtraInput);
        }

        if self.expecting_key()
            && self.extensions.contains(Extensions::IDENTIFIER_OBJECT_KEY)
            && (ident::is_identifier_start(c) || c == '\\')
        {
            self.scratch.clear();
            self.scratch_cps = 0;
            if c == '\\' {
                self.lex = Lex::Ident(IdentState::Escape);
            } else {
                self.append_ident(c)?;
                self.lex = Lex::Ident(IdentState::Normal);
            }
            return Ok(false);
        }

        match c {
            '{' => self.open_container(true).map(|_| false),
            '}' => self.close_object().map(|_| false),
            '[' => self.open_container(false).map(|_| false),
            ']' => self.close_array().map(|_| false),
            ',' => self.comma().map(|_| false),
            ':' => self.colon().map(|_| false),
            '"' => {
                self.begin_string('"');
                Ok(false)
            }
            '\'' if self.extensions.contains(Extensions::SINGLE_QUOTE_STRING) => {
                self.begin_string('\'');
                Ok(false)
            }
            '-' => {
                self.num.clear();
                self.num.push(b'-');
                self.lex = Lex::Num(NumLex {
                    state: NumState::Sign,
                    hex: false,
                    float: false,
                });
                Ok(false)
            }
            '+' if self.extensions.contains(Extensions::LEADING_PLUS) => {
                self.num.clear();
                self.lex = Lex::Num(NumLex {
                    state: NumState::Sign,
                    hex: false,
                    float: false,
                });
                Ok(false)
            }
            '0'..='9' => {
                self.num.clear();
                self.num.push(c as u8);
                self.lex = Lex::Num(NumLex {
                    state: if c == '0' {
                        NumState::Zero
                    } else {
                        NumState::Int
                    },
                    hex: false,
                    float: false,
                });
                Ok(false)
            }
            't' => {
                self.begin_keyword(b"true", KwToken::True);
                Ok(false)
            }
            'f' => {
                self.begin_keyword(b"false", KwToken::False);
                Ok(false)
            }
            'n' => {
                self.begin_keyword(b"null", KwToken::Null);
                Ok(false)
            }
            'I' if self.extensions.contains(Extensions::NUMERIC_INFINITY) => {
                self.begin_keyword(b"Infinity", KwToken::Infinity { negative: false });
                Ok(false)
            }
            'N' if self.extensions.contains(Extensions::NUMERIC_NAN) => {
                self.begin_keyword(b"NaN", KwToken::Nan);
                Ok(false)
            }
            _ => Err(Error::UnrecognizedToken),
        }
    }

    fn begin_string(&mut self, quote: char) {
        self.scratch.clear();
        self.scratch_cps = 0;
        self.lex = Lex::Str(StrLex {
            quote,
            state: StrState::Normal,
        });
    }

    fn begin_keyword(&mut self, literal: &'static [u8], token: KwToken) {
        self.lex = Lex::Keyword(KeywordLex {
            literal,
            matched: 1,
            token,
        });
    }

    fn lex_str(&mut self, s: StrLex, c: char) -> Result<bool, Error> {
        match s.state {
            StrState::Normal => {
                if c == s.quote {
                    self.deliver_string()?;
                } else if c == '\\' {
                    self.lex = Lex::Str(StrLex {
                        state: StrState::Escape,
                        ..s
                    });
                } else if (c as u32) < 0x20 {
                    return Err(Error::ExpectedCloseQuote);
                } else {
                    self.append_string(c)?;
                    self.lex = Lex::Str(s);
                }
                Ok(false)
            }
            StrState::Escape => {
                let decoded = match c {
                    '"' => Some('"'),
                    '\\' => Some('\\'),
                    '/' => Some('/'),
                    'b' => Some('\u{8}'),
                    'f' => Some('\u{c}'),
                    'n' => Some('\n'),
                    'r' => Some('\r'),
                    't' => Some('\t'),
                    '\'' if s.quote == '\'' => Some('\''),
                    'u' => None,
                    _ => return Err(Error::InvalidEscapeChar),
                };
                match decoded {
                    Some(d) => {
                        self.append_string(d)?;
                        self.lex = Lex::Str(StrLex {
                            state: StrState::Normal,
                            ..s
                        });
                    }
                    None => {
                        self.lex = Lex::Str(StrLex {
                            state: StrState::Unicode(UEscape::Hex {
                                high: None,
                                value: 0,
                                count: 0,
                            }),
                            ..s
                        });
                    }
                }
                Ok(false)
            }
            StrState::Unicode(u) => {
                let next = self.unicode_escape(u, c)?;
                match next {
                    Some(esc) => {
                        self.lex = Lex::Str(StrLex {
                            state: StrState::Unicode(esc),
                            ..s
                        });
                    }
                    None => {
                        self.lex = Lex::Str(StrLex {
                            state: StrState::Normal,
                            ..s
                        });
                    }
                }
                Ok(false)
            }
        }
    }

    /// Advance a `\uXXXX` escape by one character. Returns the next escape
    /// state, or `None` when a code point was completed and appended to
    /// the scratch.
    fn unicode_escape(&mut self, u: UEscape, c: char) -> Result<Option<UEscape>, Error> {
        match u {
            UEscape::Hex { high, value, count } => {
                let d = hex_digit(c).ok_or(Error::InvalidHexChar)?;
                let value = value * 16 + d;
                if count < 3 {
                    return Ok(Some(UEscape::Hex {
                        high,
                        value,
                        count: count + 1,
                    }));
                }
                match complete_code_unit(high, value)? {
                    Unescape::Done(d) => {
                        self.append_unescaped(d)?;
                        Ok(None)
                    }
                    Unescape::NeedLow(high) => Ok(Some(UEscape::LowBackslash { high })),
                }
            }
            UEscape::LowBackslash { high } => {
                if c == '\\' {
                    Ok(Some(UEscape::LowU { high }))
                } else {
                    Err(Error::BadUnicodeCodePoint)
                }
            }
            UEscape::LowU { high } => {
                if c == 'u' {
                    Ok(Some(UEscape::Hex {
                        high: Some(high),
                        value: 0,
                        count: 0,
                    }))
                } else {
                    Err(Error::BadUnicodeCodePoint)
                }
            }
        }
    }

    /// Append an escape-decoded code point to the scratch, routed by the
    /// current token kind so the length diagnosis comes out right.
    fn append_unescaped(&mut self, c: char) -> Result<(), Error> {
        if matches!(self.lex, Lex::Ident(_)) {
            self.append_ident(c)
        } else {
            self.append_string(c)
        }
    }

    fn append_string(&mut self, c: char) -> Result<(), Error> {
        if self.scratch_cps >= self.max_string_length {
            return Err(Error::StringTooLong);
        }
        utf8::code_point_to_utf8(u32::from(c), &mut self.scratch);
        self.scratch_cps += 1;
        Ok(())
    }

    fn append_ident(&mut self, c: char) -> Result<(), Error> {
        let valid = if self.scratch_cps == 0 {
            ident::is_identifier_start(c)
        } else {
            ident::is_identifier_part(c)
        };
        if !valid {
            return Err(Error::BadIdentifier);
        }
        if self.scratch_cps >= self.max_string_length {
            return Err(Error::IdentifierTooLong);
        }
        utf8::code_point_to_utf8(u32::from(c), &mut self.scratch);
        self.scratch_cps += 1;
        Ok(())
    }

    fn lex_ident(&mut self, s: IdentState, c: char) -> Result<bool, Error> {
        match s {
            IdentState::Normal => {
                if c == '\\' {
                    self.lex = Lex::Ident(IdentState::Escape);
                    Ok(false)
                } else if ident::is_identifier_part(c) {
                    self.append_ident(c)?;
                    self.lex = Lex::Ident(IdentState::Normal);
                    Ok(false)
                } else {
                    // the identifier ends before this code point
                    self.deliver_identifier()?;
                    Ok(true)
                }
            }
            IdentState::Escape => {
                if c == 'u' {
                    self.lex = Lex::Ident(IdentState::Unicode(UEscape::Hex {
                        high: None,
                        value: 0,
                        count: 0,
                    }));
                    Ok(false)
                } else {
                    Err(Error::BadIdentifier)
                }
            }
            IdentState::Unicode(u) => {
                // keep the token kind visible to append_unescaped
                self.lex = Lex::Ident(IdentState::Unicode(u));
                let next = self.unicode_escape(u, c)?;
                self.lex = match next {
                    Some(esc) => Lex::Ident(IdentState::Unicode(esc)),
                    None => Lex::Ident(IdentState::Normal),
                };
                Ok(false)
            }
        }
    }

    fn lex_num(&mut self, n: NumLex, c: char) -> Result<bool, Error> {
        let digit = c.is_ascii_digit();
        match n.state {
            NumState::Sign => {
                if c == '0' {
                    self.num.push(b'0');
                    self.relex_num(n, NumState::Zero);
                } else if digit {
                    self.num.push(c as u8);
                    self.relex_num(n, NumState::Int);
                } else if c == 'I' && self.extensions.contains(Extensions::NUMERIC_INFINITY) {
                    let negative = self.num.first() == Some(&b'-');
                    self.begin_keyword(b"Infinity", KwToken::Infinity { negative });
                } else {
                    return Err(Error::UnrecognizedToken);
                }
                Ok(false)
            }
            NumState::Zero => match c {
                '.' => {
                    self.num.push(b'.');
                    self.relex_num(NumLex { float: true, ..n }, NumState::FracStart);
                    Ok(false)
                }
                'e' | 'E' => {
                    self.num.push(b'e');
                    self.relex_num(NumLex { float: true, ..n }, NumState::ExpStart);
                    Ok(false)
                }
                'x' | 'X' if self.extensions.contains(Extensions::HEX_NUMBERS) => {
                    // drop the leading "0"; the sign, if any, stays
                    self.num.pop();
                    self.relex_num(NumLex { hex: true, ..n }, NumState::HexStart);
                    Ok(false)
                }
                _ if digit => Err(Error::UnrecognizedToken),
                _ => {
                    self.finish_number(n)?;
                    Ok(true)
                }
            },
            NumState::Int => {
                if digit {
                    self.num.push(c as u8);
                    self.relex_num(n, NumState::Int);
                    Ok(false)
                } else if c == '.' {
                    self.num.push(b'.');
                    self.relex_num(NumLex { float: true, ..n }, NumState::FracStart);
                    Ok(false)
                } else if c == 'e' || c == 'E' {
                    self.num.push(b'e');
                    self.relex_num(NumLex { float: true, ..n }, NumState::ExpStart);
                    Ok(false)
                } else {
                    self.finish_number(n)?;
                    Ok(true)
                }
            }
            NumState::HexStart => {
                if c.is_ascii_hexdigit() {
                    self.num.push(c as u8);
                    self.relex_num(n, NumState::Hex);
                    Ok(false)
                } else {
                    Err(Error::UnrecognizedToken)
                }
            }
            NumState::Hex => {
                if c.is_ascii_hexdigit() {
                    self.num.push(c as u8);
                    self.relex_num(n, NumState::Hex);
                    Ok(false)
                } else {
                    self.finish_number(n)?;
                    Ok(true)
                }
            }
            NumState::FracStart => {
                if digit {
                    self.num.push(c as u8);
                    self.relex_num(n, NumState::Frac);
                    Ok(false)
                } else {
                    Err(Error::UnrecognizedToken)
                }
            }
            NumState::Frac => {
                if digit {
                    self.num.push(c as u8);
                    self.relex_num(n, NumState::Frac);
                    Ok(false)
                } else if c == 'e' || c == 'E' {
                    self.num.push(b'e');
                    self.relex_num(n, NumState::ExpStart);
                    Ok(false)
                } else {
                    self.finish_number(n)?;
                    Ok(true)
                }
            }
            NumState::ExpStart => {
                if digit {
                    self.num.push(c as u8);
                    self.relex_num(n, NumState::Exp);
                    Ok(false)
                } else if c == '+' || c == '-' {
                    self.num.push(c as u8);
                    self.relex_num(n, NumState::ExpSign);
                    Ok(false)
                } else {
                    Err(Error::UnrecognizedToken)
                }
            }
            NumState::ExpSign => {
                if digit {
                    self.num.push(c as u8);
                    self.relex_num(n, NumState::Exp);
                    Ok(false)
                } else {
                    Err(Error::UnrecognizedToken)
                }
            }
            NumState::Exp => {
                if digit {
                    self.num.push(c as u8);
                    self.relex_num(n, NumState::Exp);
                    Ok(false)
                } else {
                    self.finish_number(n)?;
                    Ok(true)
                }
            }
        }
    }

    fn relex_num(&mut self, n: NumLex, state: NumState) {
        self.lex = Lex::Num(NumLex { state, ..n });
    }

    fn finish_number(&mut self, n: NumLex) -> Result<(), Error> {
        if n.float {
            // the lexeme is ASCII by construction
            let v: f64 = from_utf8(&self.num)
                .ok()
                .and_then(|s| s.parse().ok())
                .ok_or(Error::UnrecognizedToken)?;
            if v.is_infinite() {
                return Err(Error::NumberOutOfRange);
            }
            self.deliver_value(|b| b.double_value(v))
        } else {
            let radix = if n.hex { 16 } else { 10 };
            match parse_int::<i64>(&self.num, radix) {
                Ok(v) => self.deliver_value(|b| b.integer_value(v)),
                Err(_) if self.num.first() != Some(&b'-') => {
                    match parse_uint::<u64>(&self.num, radix) {
                        Ok(v) => self.deliver_value(|b| b.uint64_value(v)),
                        Err(_) => Err(Error::NumberOutOfRange),
                    }
                }
                Err(_) => Err(Error::NumberOutOfRange),
            }
        }
    }

    fn lex_keyword(&mut self, k: KeywordLex, c: char) -> Result<bool, Error> {
        if k.matched < k.literal.len() && c == k.literal[k.matched] as char {
            let matched = k.matched + 1;
            if matched == k.literal.len() {
                match k.token {
                    KwToken::True => self.deliver_value(|b| b.boolean_value(true))?,
                    KwToken::False => self.deliver_value(|b| b.boolean_value(false))?,
                    KwToken::Null => self.deliver_value(|b| b.null_value())?,
                    KwToken::Infinity { negative } => {
                        let v = if negative {
                            f64::NEG_INFINITY
                        } else {
                            f64::INFINITY
                        };
                        self.deliver_value(move |b| b.double_value(v))?
                    }
                    KwToken::Nan => self.deliver_value(|b| b.double_value(f64::NAN))?,
                }
            } else {
                self.lex = Lex::Keyword(KeywordLex { matched, ..k });
            }
            Ok(false)
        } else {
            Err(Error::UnrecognizedToken)
        }
    }

    fn lex_comment_start(&mut self, c: char) -> Result<bool, Error> {
        match c {
            '/' if self
                .extensions
                .contains(Extensions::SINGLE_LINE_COMMENTS) =>
            {
                self.lex = Lex::LineComment;
                Ok(false)
            }
            '*' if self.extensions.contains(Extensions::MULTI_LINE_COMMENTS) => {
                self.lex = Lex::BlockComment { star: false };
                Ok(false)
            }
            _ => Err(Error::ExpectedToken),
        }
    }

    // ----- grammar driver ---------------------------------------------

    fn expecting_key(&self) -> bool {
        matches!(
            self.stack.last(),
            Some(Frame::Object(ObjectState::Empty | ObjectState::AfterComma))
        )
    }

    /// Check whether a value may appear here, without changing state.
    fn accept_value_context(&self) -> Result<(), Error> {
        match self.stack.last() {
            None => {
                if self.have_value {
                    Err(Error::UnexpectedExtraInput)
                } else {
                    Ok(())
                }
            }
            Some(Frame::Array(ArrayState::Empty | ArrayState::AfterComma)) => Ok(()),
            Some(Frame::Array(ArrayState::HasElement)) => Err(Error::ExpectedArrayMember),
            Some(Frame::Object(ObjectState::AfterColon)) => Ok(()),
            Some(Frame::Object(ObjectState::Empty | ObjectState::AfterComma)) => {
                Err(Error::ExpectedObjectKey)
            }
            Some(Frame::Object(ObjectState::AfterKey)) => Err(Error::ExpectedColon),
            Some(Frame::Object(ObjectState::HasMember)) => Err(Error::ExpectedObjectMember),
        }
    }

    /// Record that a value has been accepted in the current context.
    fn note_value(&mut self) {
        match self.stack.last_mut() {
            None => self.have_value = true,
            Some(Frame::Array(s)) => *s = ArrayState::HasElement,
            Some(Frame::Object(s)) => *s = ObjectState::HasMember,
        }
    }

    fn deliver_value(
        &mut self,
        f: impl FnOnce(&mut B) -> Result<(), Error>,
    ) -> Result<(), Error> {
        self.accept_value_context()?;
        self.note_value();
        f(&mut self.backend)
    }

    fn deliver_string(&mut self) -> Result<(), Error> {
        if self.expecting_key() {
            let s = from_utf8(&self.scratch).map_err(|_| Error::BadUnicodeCodePoint)?;
            self.backend.key(s)?;
            if let Some(Frame::Object(st)) = self.stack.last_mut() {
                *st = ObjectState::AfterKey;
            }
            Ok(())
        } else {
            self.accept_value_context()?;
            self.note_value();
            let s = from_utf8(&self.scratch).map_err(|_| Error::BadUnicodeCodePoint)?;
            self.backend.string_value(s)
        }
    }

    fn deliver_identifier(&mut self) -> Result<(), Error> {
        let s = from_utf8(&self.scratch).map_err(|_| Error::BadUnicodeCodePoint)?;
        self.backend.key(s)?;
        if let Some(Frame::Object(st)) = self.stack.last_mut() {
            *st = ObjectState::AfterKey;
        }
        Ok(())
    }

    fn open_container(&mut self, object: bool) -> Result<(), Error> {
        self.accept_value_context()?;
        if self.stack.len() >= self.max_depth {
            return Err(Error::NestingTooDeep);
        }
        self.note_value();
        if object {
            self.backend.begin_object()?;
            self.stack.push(Frame::Object(ObjectState::Empty));
        } else {
            self.backend.begin_array()?;
            self.stack.push(Frame::Array(ArrayState::Empty));
        }
        Ok(())
    }

    fn close_array(&mut self) -> Result<(), Error> {
        match self.stack.last() {
            Some(Frame::Array(st)) => {
                let closeable = match st {
                    ArrayState::Empty | ArrayState::HasElement => true,
                    ArrayState::AfterComma => self
                        .extensions
                        .contains(Extensions::ARRAY_TRAILING_COMMA),
                };
                if closeable {
                    self.stack.pop();
                    self.backend.end_array()
                } else {
                    Err(Error::ExpectedArrayMember)
                }
            }
            Some(Frame::Object(st)) => Err(object_state_error(*st)),
            None => Err(self.top_level_error()),
        }
    }

    fn close_object(&mut self) -> Result<(), Error> {
        match self.stack.last() {
            Some(Frame::Object(st)) => {
                let closeable = match st {
                    ObjectState::Empty | ObjectState::HasMember => true,
                    ObjectState::AfterComma => self
                        .extensions
                        .contains(Extensions::OBJECT_TRAILING_COMMA),
                    ObjectState::AfterKey | ObjectState::AfterColon => false,
                };
                if closeable {
                    self.stack.pop();
                    self.backend.end_object()
                } else {
                    Err(object_state_error(*st))
                }
            }
            Some(Frame::Array(_)) => Err(Error::ExpectedArrayMember),
            None => Err(self.top_level_error()),
        }
    }

    fn comma(&mut self) -> Result<(), Error> {
        match self.stack.last_mut() {
            Some(Frame::Array(st)) => {
                if *st == ArrayState::HasElement {
                    *st = ArrayState::AfterComma;
                    Ok(())
                } else {
                    Err(Error::ExpectedArrayMember)
                }
            }
            Some(Frame::Object(st)) => {
                if *st == ObjectState::HasMember {
                    *st = ObjectState::AfterComma;
                    Ok(())
                } else {
                    Err(object_state_error(*st))
                }
            }
            None => Err(self.top_level_error()),
        }
    }

    fn colon(&mut self) -> Result<(), Error> {
        match self.stack.last_mut() {
            Some(Frame::Object(st)) => {
                if *st == ObjectState::AfterKey {
                    *st = ObjectState::AfterColon;
                    Ok(())
                } else {
                    Err(object_state_error(*st))
                }
            }
            Some(Frame::Array(_)) => Err(Error::ExpectedArrayMember),
            None => Err(self.top_level_error()),
        }
    }

    fn top_level_error(&self) -> Error {
        if self.have_value {
            Error::UnexpectedExtraInput
        } else {
            Error::ExpectedToken
        }
    }

    // ----- end of input -----------------------------------------------

    fn finish(&mut self) -> Result<(), Error> {
        if !self.decoder.is_complete() {
            return Err(Error::BadUnicodeCodePoint);
        }
        match mem::replace(&mut self.lex, Lex::Start) {
            Lex::Start | Lex::LineComment => {}
            Lex::Str(_) => return Err(Error::ExpectedCloseQuote),
            Lex::Num(n) => match n.state {
                NumState::Zero
                | NumState::Int
                | NumState::Hex
                | NumState::Frac
                | NumState::Exp => self.finish_number(n)?,
                NumState::Sign
                | NumState::HexStart
                | NumState::FracStart
                | NumState::ExpStart
                | NumState::ExpSign => return Err(Error::ExpectedDigits),
            },
            Lex::Keyword(_) => return Err(Error::UnrecognizedToken),
            Lex::Ident(s) => match s {
                IdentState::Normal => self.deliver_identifier()?,
                IdentState::Escape | IdentState::Unicode(_) => {
                    return Err(Error::BadIdentifier)
                }
            },
            Lex::CommentStart => return Err(Error::ExpectedToken),
            Lex::BlockComment { .. } => return Err(Error::UnterminatedMultilineComment),
        }
        match self.stack.last() {
            Some(Frame::Array(_)) => Err(Error::ExpectedArrayMember),
            Some(Frame::Object(_)) => Err(Error::ExpectedObjectMember),
            None if !self.have_value => Err(Error::ExpectedToken),
            None => Ok(()),
        }
    }
}

fn object_state_error(st: ObjectState) -> Error {
    match st {
        ObjectState::Empty | ObjectState::AfterComma => Error::ExpectedObjectKey,
        ObjectState::AfterKey => Error::ExpectedColon,
        ObjectState::AfterColon | ObjectState::HasMember => Error::ExpectedObjectMember,
    }
}
