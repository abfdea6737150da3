use crate::Extensions;

/// Options for [`Parser`](crate::Parser). Use [`ParserOptionsBuilder`] to
/// create instances of this struct.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParserOptions {
    /// The maximum grammar stack depth
    pub(crate) max_depth: usize,

    /// The maximum length of a string or identifier, in code points
    pub(crate) max_string_length: usize,

    /// The enabled grammar extensions
    pub(crate) extensions: Extensions,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            max_depth: 200,
            max_string_length: 65535,
            extensions: Extensions::empty(),
        }
    }
}

impl ParserOptions {
    /// Returns the maximum grammar stack depth
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Returns the maximum string/identifier length in code points
    pub fn max_string_length(&self) -> usize {
        self.max_string_length
    }

    /// Returns the enabled grammar extensions
    pub fn extensions(&self) -> Extensions {
        self.extensions
    }
}

/// A builder for [`ParserOptions`]
///
/// ```rust
/// use pushjson::{Extensions, NullBackend, Parser, ParserOptionsBuilder};
///
/// let mut parser = Parser::with_options(
///     NullBackend::new(),
///     ParserOptionsBuilder::default()
///         .with_max_depth(16)
///         .with_extensions(Extensions::SINGLE_LINE_COMMENTS)
///         .build(),
/// );
/// ```
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParserOptionsBuilder {
    options: ParserOptions,
}

impl ParserOptionsBuilder {
    /// Set the maximum grammar stack depth. Opening an array or object
    /// beyond this depth fails with
    /// [`Error::NestingTooDeep`](crate::Error::NestingTooDeep).
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.options.max_depth = max_depth;
        self
    }

    /// Set the maximum length of a single string or identifier, counted in
    /// code points. Longer tokens fail with
    /// [`Error::StringTooLong`](crate::Error::StringTooLong) or
    /// [`Error::IdentifierTooLong`](crate::Error::IdentifierTooLong). The
    /// limit is independent of the total document size.
    pub fn with_max_string_length(mut self, max_string_length: usize) -> Self {
        self.options.max_string_length = max_string_length;
        self
    }

    /// Enable a set of grammar extensions
    pub fn with_extensions(mut self, extensions: Extensions) -> Self {
        self.options.extensions = extensions;
        self
    }

    /// Create a new [`ParserOptions`] object
    pub fn build(self) -> ParserOptions {
        self.options
    }
}
