use crate::Error;

/// The event sink driven by a [`Parser`](crate::Parser).
///
/// The parser invokes exactly one callback per syntactic token, strictly in
/// input order. Any callback may fail; the parser latches the returned
/// error, makes no further callbacks, and reports the error from
/// [`eof()`](crate::Parser::eof()). Because of that, a backend must not
/// rely on ever seeing the `end_*` calls that would have balanced earlier
/// `begin_*` calls; it has to clean up after itself when dropped.
///
/// The `&str` arguments of [`string_value`](Self::string_value) and
/// [`key`](Self::key) are fully decoded (escapes resolved, surrogate pairs
/// combined) and borrow a scratch buffer that is only valid for the
/// duration of the call.
pub trait Backend {
    /// The value handed out by [`Parser::eof()`](crate::Parser::eof()) on
    /// success.
    type Result;

    /// A `null` literal.
    fn null_value(&mut self) -> Result<(), Error>;

    /// A `true` or `false` literal.
    fn boolean_value(&mut self, v: bool) -> Result<(), Error>;

    /// An integer that fits a signed 64-bit value.
    fn integer_value(&mut self, v: i64) -> Result<(), Error>;

    /// An integer in `i64::MAX + 1 ..= u64::MAX`.
    ///
    /// The default implementation rejects such values with
    /// [`Error::NumberOutOfRange`]; backends that can represent unsigned
    /// 64-bit integers override it.
    fn uint64_value(&mut self, v: u64) -> Result<(), Error> {
        let _ = v;
        Err(Error::NumberOutOfRange)
    }

    /// A number with a fraction or exponent.
    fn double_value(&mut self, v: f64) -> Result<(), Error>;

    /// A string in value position.
    fn string_value(&mut self, s: &str) -> Result<(), Error>;

    /// The start of an array.
    fn begin_array(&mut self) -> Result<(), Error>;

    /// The end of an array.
    fn end_array(&mut self) -> Result<(), Error>;

    /// The start of an object.
    fn begin_object(&mut self) -> Result<(), Error>;

    /// An object key (a string, or an identifier under
    /// [`Extensions::IDENTIFIER_OBJECT_KEY`](crate::Extensions::IDENTIFIER_OBJECT_KEY)).
    fn key(&mut self, s: &str) -> Result<(), Error>;

    /// The end of an object.
    fn end_object(&mut self) -> Result<(), Error>;

    /// Produce the final result after a successful parse.
    fn result(&mut self) -> Self::Result;
}

/// A [`Backend`] that discards every event.
///
/// Useful for pure validation:
///
/// ```
/// use pushjson::{NullBackend, Parser};
///
/// let mut parser = Parser::new(NullBackend::new());
/// parser.input(br#"{"valid": true}"#);
/// assert!(parser.eof().is_ok());
/// ```
#[derive(Default, Clone, Copy, Debug)]
pub struct NullBackend;

impl NullBackend {
    pub fn new() -> Self {
        NullBackend
    }
}

impl Backend for NullBackend {
    type Result = ();

    fn null_value(&mut self) -> Result<(), Error> {
        Ok(())
    }

    fn boolean_value(&mut self, _v: bool) -> Result<(), Error> {
        Ok(())
    }

    fn integer_value(&mut self, _v: i64) -> Result<(), Error> {
        Ok(())
    }

    fn uint64_value(&mut self, _v: u64) -> Result<(), Error> {
        Ok(())
    }

    fn double_value(&mut self, _v: f64) -> Result<(), Error> {
        Ok(())
    }

    fn string_value(&mut self, _s: &str) -> Result<(), Error> {
        Ok(())
    }

    fn begin_array(&mut self) -> Result<(), Error> {
        Ok(())
    }

    fn end_array(&mut self) -> Result<(), Error> {
        Ok(())
    }

    fn begin_object(&mut self) -> Result<(), Error> {
        Ok(())
    }

    fn key(&mut self, _s: &str) -> Result<(), Error> {
        Ok(())
    }

    fn end_object(&mut self) -> Result<(), Error> {
        Ok(())
    }

    fn result(&mut self) -> Self::Result {}
}
