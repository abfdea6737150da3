use bitflags::bitflags;

bitflags! {
    /// Opt-in relaxations of strict RFC 8259 JSON.
    ///
    /// All flags default to off; with no flags set the parser accepts
    /// exactly the RFC 8259 grammar. Flags can be OR-combined:
    ///
    /// ```
    /// use pushjson::Extensions;
    ///
    /// let ext = Extensions::SINGLE_LINE_COMMENTS | Extensions::OBJECT_TRAILING_COMMA;
    /// assert!(ext.contains(Extensions::SINGLE_LINE_COMMENTS));
    /// assert!(!ext.contains(Extensions::BASH_COMMENTS));
    /// ```
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Extensions: u32 {
        /// `#` starts a comment that runs to the end of the line
        const BASH_COMMENTS = 1 << 0;
        /// `//` starts a comment that runs to the end of the line
        const SINGLE_LINE_COMMENTS = 1 << 1;
        /// `/*` starts a comment that runs to the matching `*/`
        const MULTI_LINE_COMMENTS = 1 << 2;
        /// Strings may be delimited with `'` as well as `"`
        const SINGLE_QUOTE_STRING = 1 << 3;
        /// `{"a": 1,}` is accepted
        const OBJECT_TRAILING_COMMA = 1 << 4;
        /// `[1, 2,]` is accepted
        const ARRAY_TRAILING_COMMA = 1 << 5;
        /// Object keys may be unquoted ECMAScript-style identifiers
        const IDENTIFIER_OBJECT_KEY = 1 << 6;
        /// Numbers may carry an explicit leading `+`
        const LEADING_PLUS = 1 << 7;
        /// `0x`/`0X` hexadecimal integers are accepted
        const HEX_NUMBERS = 1 << 8;
        /// `Infinity` and `-Infinity` are accepted as numbers
        const NUMERIC_INFINITY = 1 << 9;
        /// `NaN` is accepted as a number
        const NUMERIC_NAN = 1 << 10;
    }
}
