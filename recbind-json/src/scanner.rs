//! Low-level JSON scanner that finds token boundaries without materializing strings.
//!
//! The scanner identifies where tokens are in the input; it does not interpret
//! them. String content is returned as indices plus a `has_escapes` flag so the
//! reader can match field names against raw bytes and only decode escapes
//! when a value is actually requested.

use alloc::borrow::Cow;
use alloc::string::String;
use core::str;

/// Byte range in the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// Offset of the first byte.
    pub offset: usize,
    /// Number of bytes.
    pub len: usize,
}

impl Span {
    /// Create a span.
    pub const fn new(offset: usize, len: usize) -> Self {
        Self { offset, len }
    }
}

/// Token kinds with minimal data; strings and numbers are indices into the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// `{`
    ObjectStart,
    /// `}`
    ObjectEnd,
    /// `[`
    ArrayStart,
    /// `]`
    ArrayEnd,
    /// `:`
    Colon,
    /// `,`
    Comma,
    /// `null`
    Null,
    /// `true`
    True,
    /// `false`
    False,
    /// A string literal; indices exclude the quotes.
    String {
        /// Start index of the content.
        start: usize,
        /// End index of the content.
        end: usize,
        /// True if the content contains escape sequences.
        has_escapes: bool,
    },
    /// A number literal.
    Number {
        /// Start index.
        start: usize,
        /// End index.
        end: usize,
        /// Shape of the literal.
        hint: NumberHint,
    },
    /// End of input.
    Eof,
}

/// Shape of a number literal, used to pick a parse strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberHint {
    /// No sign, no fraction, no exponent.
    Unsigned,
    /// Leading `-`, no fraction, no exponent.
    Signed,
    /// Has a fraction or an exponent.
    Float,
}

/// Token with its location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpannedToken {
    /// The token.
    pub token: Token,
    /// Where it is.
    pub span: Span,
}

/// Scanner failure.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanError {
    /// What went wrong.
    pub kind: ScanErrorKind,
    /// Where.
    pub span: Span,
}

/// Kinds of scanner failures.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanErrorKind {
    /// A byte that cannot start or continue a token.
    UnexpectedChar(char),
    /// Input ended inside a token.
    UnexpectedEof(&'static str),
    /// Invalid UTF-8 or an invalid escape.
    InvalidUtf8,
}

impl core::fmt::Display for ScanErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ScanErrorKind::UnexpectedChar(c) => write!(f, "unexpected character {c:?}"),
            ScanErrorKind::UnexpectedEof(ctx) => write!(f, "unexpected end of input {ctx}"),
            ScanErrorKind::InvalidUtf8 => f.write_str("invalid UTF-8"),
        }
    }
}

/// Result type for scanner operations.
pub type ScanResult = Result<SpannedToken, ScanError>;

/// JSON scanner over a complete input buffer.
#[derive(Debug, Default)]
pub struct Scanner {
    pos: usize,
}

impl Scanner {
    /// Create a scanner starting at position 0.
    pub const fn new() -> Self {
        Self { pos: 0 }
    }

    /// Current position in the buffer.
    pub const fn pos(&self) -> usize {
        self.pos
    }

    /// Scan the next token from the buffer.
    pub fn next_token(&mut self, buf: &[u8]) -> ScanResult {
        self.skip_whitespace(buf);

        let start = self.pos;
        let Some(&byte) = buf.get(self.pos) else {
            return Ok(SpannedToken {
                token: Token::Eof,
                span: Span::new(self.pos, 0),
            });
        };

        match byte {
            b'{' => Ok(self.single(start, Token::ObjectStart)),
            b'}' => Ok(self.single(start, Token::ObjectEnd)),
            b'[' => Ok(self.single(start, Token::ArrayStart)),
            b']' => Ok(self.single(start, Token::ArrayEnd)),
            b':' => Ok(self.single(start, Token::Colon)),
            b',' => Ok(self.single(start, Token::Comma)),
            b'"' => self.scan_string(buf, start),
            b'-' | b'0'..=b'9' => self.scan_number(buf, start),
            b't' => self.scan_literal(buf, start, b"true", Token::True),
            b'f' => self.scan_literal(buf, start, b"false", Token::False),
            b'n' => self.scan_literal(buf, start, b"null", Token::Null),
            _ => Err(ScanError {
                kind: ScanErrorKind::UnexpectedChar(byte as char),
                span: Span::new(start, 1),
            }),
        }
    }

    fn single(&mut self, start: usize, token: Token) -> SpannedToken {
        self.pos += 1;
        SpannedToken {
            token,
            span: Span::new(start, 1),
        }
    }

    fn skip_whitespace(&mut self, buf: &[u8]) {
        while let Some(&b) = buf.get(self.pos) {
            match b {
                b' ' | b'\t' | b'\n' | b'\r' => self.pos += 1,
                _ => break,
            }
        }
    }

    /// Scan a string, finding its boundaries and noting if it has escapes.
    fn scan_string(&mut self, buf: &[u8], start: usize) -> ScanResult {
        // opening quote
        self.pos += 1;
        let content_start = self.pos;
        let mut has_escapes = false;

        while let Some(&byte) = buf.get(self.pos) {
            match byte {
                b'"' => {
                    let content_end = self.pos;
                    self.pos += 1;
                    return Ok(SpannedToken {
                        token: Token::String {
                            start: content_start,
                            end: content_end,
                            has_escapes,
                        },
                        span: Span::new(start, self.pos - start),
                    });
                }
                b'\\' => {
                    has_escapes = true;
                    // The escaped byte never terminates the string; `\u` digits
                    // are validated when the content is decoded.
                    self.pos += 2;
                }
                _ => self.pos += 1,
            }
        }

        self.pos = buf.len();
        Err(ScanError {
            kind: ScanErrorKind::UnexpectedEof("in string"),
            span: Span::new(start, self.pos - start),
        })
    }

    /// Scan a number, finding its boundaries and determining its type hint.
    fn scan_number(&mut self, buf: &[u8], start: usize) -> ScanResult {
        let mut hint = NumberHint::Unsigned;
        let mut pos = self.pos;

        if buf.get(pos) == Some(&b'-') {
            hint = NumberHint::Signed;
            pos += 1;
        }

        let digits_start = pos;
        while buf.get(pos).is_some_and(u8::is_ascii_digit) {
            pos += 1;
        }
        if pos == digits_start {
            return Err(ScanError {
                kind: match buf.get(pos) {
                    Some(&b) => ScanErrorKind::UnexpectedChar(b as char),
                    None => ScanErrorKind::UnexpectedEof("in number"),
                },
                span: Span::new(start, pos - start),
            });
        }
        if buf[digits_start] == b'0' && pos - digits_start > 1 {
            return Err(self.number_error(buf, start, digits_start + 1));
        }

        if buf.get(pos) == Some(&b'.') {
            hint = NumberHint::Float;
            pos += 1;
            let fraction_start = pos;
            while buf.get(pos).is_some_and(u8::is_ascii_digit) {
                pos += 1;
            }
            if pos == fraction_start {
                return Err(self.number_error(buf, start, pos));
            }
        }

        if matches!(buf.get(pos), Some(b'e') | Some(b'E')) {
            hint = NumberHint::Float;
            pos += 1;
            if matches!(buf.get(pos), Some(b'+') | Some(b'-')) {
                pos += 1;
            }
            let exponent_start = pos;
            while buf.get(pos).is_some_and(u8::is_ascii_digit) {
                pos += 1;
            }
            if pos == exponent_start {
                return Err(self.number_error(buf, start, pos));
            }
        }

        self.pos = pos;
        Ok(SpannedToken {
            token: Token::Number {
                start,
                end: pos,
                hint,
            },
            span: Span::new(start, pos - start),
        })
    }

    fn number_error(&mut self, buf: &[u8], start: usize, pos: usize) -> ScanError {
        self.pos = pos;
        ScanError {
            kind: match buf.get(pos) {
                Some(&b) => ScanErrorKind::UnexpectedChar(b as char),
                None => ScanErrorKind::UnexpectedEof("in number"),
            },
            span: Span::new(start, pos - start),
        }
    }

    /// Scan a literal keyword (true, false, null).
    fn scan_literal(
        &mut self,
        buf: &[u8],
        start: usize,
        expected: &'static [u8],
        token: Token,
    ) -> ScanResult {
        for &want in expected {
            match buf.get(self.pos) {
                Some(&b) if b == want => self.pos += 1,
                Some(&b) => {
                    return Err(ScanError {
                        kind: ScanErrorKind::UnexpectedChar(b as char),
                        span: Span::new(self.pos, 1),
                    });
                }
                None => {
                    return Err(ScanError {
                        kind: ScanErrorKind::UnexpectedEof("in literal"),
                        span: Span::new(start, self.pos - start),
                    });
                }
            }
        }

        Ok(SpannedToken {
            token,
            span: Span::new(start, expected.len()),
        })
    }
}

// =============================================================================
// String decoding (second pass)
// =============================================================================

/// Decode a JSON string, borrowing from the buffer when it has no escapes.
pub fn decode_string(
    buf: &[u8],
    start: usize,
    end: usize,
    has_escapes: bool,
) -> Result<Cow<'_, str>, ScanError> {
    if has_escapes {
        decode_string_owned(buf, start, end).map(Cow::Owned)
    } else {
        str::from_utf8(&buf[start..end])
            .map(Cow::Borrowed)
            .map_err(|_| ScanError {
                kind: ScanErrorKind::InvalidUtf8,
                span: Span::new(start, end - start),
            })
    }
}

/// Decode a JSON string that contains escape sequences.
pub fn decode_string_owned(buf: &[u8], start: usize, end: usize) -> Result<String, ScanError> {
    let slice = &buf[start..end];
    let mut result = String::with_capacity(end - start);
    let mut i = 0;

    let invalid = |at: usize, len: usize| ScanError {
        kind: ScanErrorKind::InvalidUtf8,
        span: Span::new(start + at, len),
    };

    while i < slice.len() {
        let byte = slice[i];
        if byte != b'\\' {
            // copy the run of plain bytes up to the next escape
            let run_end = slice[i..]
                .iter()
                .position(|&b| b == b'\\')
                .map_or(slice.len(), |offset| i + offset);
            let run = str::from_utf8(&slice[i..run_end]).map_err(|_| invalid(i, run_end - i))?;
            result.push_str(run);
            i = run_end;
            continue;
        }

        i += 1;
        let Some(&escaped) = slice.get(i) else {
            return Err(ScanError {
                kind: ScanErrorKind::UnexpectedEof("in escape sequence"),
                span: Span::new(start + i - 1, 1),
            });
        };

        match escaped {
            b'"' => result.push('"'),
            b'\\' => result.push('\\'),
            b'/' => result.push('/'),
            b'b' => result.push('\x08'),
            b'f' => result.push('\x0c'),
            b'n' => result.push('\n'),
            b'r' => result.push('\r'),
            b't' => result.push('\t'),
            b'u' => {
                i += 1;
                let code_unit = read_hex4(slice, i).ok_or_else(|| invalid(i, 4))?;
                i += 4;

                let code_point = if (0xD800..=0xDBFF).contains(&code_unit) {
                    // high surrogate, a `\uXXXX` low surrogate must follow
                    if slice.get(i) != Some(&b'\\') || slice.get(i + 1) != Some(&b'u') {
                        return Err(invalid(i - 6, 6));
                    }
                    let low = read_hex4(slice, i + 2).ok_or_else(|| invalid(i + 2, 4))?;
                    if !(0xDC00..=0xDFFF).contains(&low) {
                        return Err(invalid(i + 2, 4));
                    }
                    i += 6;
                    0x10000 + ((u32::from(code_unit) & 0x3FF) << 10) + (u32::from(low) & 0x3FF)
                } else if (0xDC00..=0xDFFF).contains(&code_unit) {
                    return Err(invalid(i - 4, 4));
                } else {
                    u32::from(code_unit)
                };

                let c = char::from_u32(code_point).ok_or_else(|| invalid(i - 4, 4))?;
                result.push(c);
                continue;
            }
            other => {
                return Err(ScanError {
                    kind: ScanErrorKind::UnexpectedChar(other as char),
                    span: Span::new(start + i, 1),
                });
            }
        }
        i += 1;
    }

    Ok(result)
}

fn read_hex4(slice: &[u8], at: usize) -> Option<u16> {
    let hex = slice.get(at..at + 4)?;
    let hex = str::from_utf8(hex).ok()?;
    u16::from_str_radix(hex, 16).ok()
}

/// A number parsed according to its [`NumberHint`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParsedNumber {
    /// Unsigned 64-bit integer.
    U64(u64),
    /// Signed 64-bit integer.
    I64(i64),
    /// Anything else: fractions, exponents and integers beyond 64 bits.
    F64(f64),
}

/// Parse a number literal.
pub fn parse_number(
    buf: &[u8],
    start: usize,
    end: usize,
    hint: NumberHint,
) -> Result<ParsedNumber, ScanError> {
    use lexical_parse_float::FromLexical as _;
    use lexical_parse_integer::FromLexical as _;

    let slice = &buf[start..end];
    let integer = match hint {
        NumberHint::Unsigned => u64::from_lexical(slice).ok().map(ParsedNumber::U64),
        NumberHint::Signed => i64::from_lexical(slice).ok().map(ParsedNumber::I64),
        NumberHint::Float => None,
    };
    if let Some(number) = integer {
        return Ok(number);
    }

    f64::from_lexical(slice)
        .map(ParsedNumber::F64)
        .map_err(|_| ScanError {
            kind: ScanErrorKind::UnexpectedChar('?'),
            span: Span::new(start, end - start),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &[u8]) -> Vec<Token> {
        let mut scanner = Scanner::new();
        let mut out = Vec::new();
        loop {
            let token = scanner.next_token(input).unwrap().token;
            out.push(token);
            if token == Token::Eof {
                return out;
            }
        }
    }

    #[test]
    fn punctuation_and_literals() {
        assert_eq!(
            tokens(b" { } [ ] : , null true false "),
            vec![
                Token::ObjectStart,
                Token::ObjectEnd,
                Token::ArrayStart,
                Token::ArrayEnd,
                Token::Colon,
                Token::Comma,
                Token::Null,
                Token::True,
                Token::False,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn strings_record_escapes() {
        let input = br#""plain" "esc\"aped""#;
        let toks = tokens(input);
        assert_eq!(
            toks[0],
            Token::String {
                start: 1,
                end: 6,
                has_escapes: false
            }
        );
        let Token::String {
            start,
            end,
            has_escapes,
        } = toks[1]
        else {
            panic!("expected string, got {:?}", toks[1]);
        };
        assert!(has_escapes);
        assert_eq!(decode_string(input, start, end, true).unwrap(), "esc\"aped");
    }

    #[test]
    fn number_hints() {
        let input = b"12 -3 4.5 6e2";
        let hints: Vec<_> = tokens(input)
            .into_iter()
            .filter_map(|t| match t {
                Token::Number { hint, .. } => Some(hint),
                _ => None,
            })
            .collect();
        assert_eq!(
            hints,
            vec![
                NumberHint::Unsigned,
                NumberHint::Signed,
                NumberHint::Float,
                NumberHint::Float
            ]
        );
    }

    #[test]
    fn number_at_end_of_input() {
        let mut scanner = Scanner::new();
        let token = scanner.next_token(b"42").unwrap();
        assert_eq!(
            token.token,
            Token::Number {
                start: 0,
                end: 2,
                hint: NumberHint::Unsigned
            }
        );
        assert_eq!(
            parse_number(b"42", 0, 2, NumberHint::Unsigned).unwrap(),
            ParsedNumber::U64(42)
        );
    }

    #[test]
    fn big_integers_fall_back_to_float() {
        let input = b"123456789012345678901234567890";
        assert!(matches!(
            parse_number(input, 0, input.len(), NumberHint::Unsigned).unwrap(),
            ParsedNumber::F64(_)
        ));
    }

    #[test]
    fn unterminated_string() {
        let mut scanner = Scanner::new();
        let err = scanner.next_token(b"\"abc").unwrap_err();
        assert_eq!(err.kind, ScanErrorKind::UnexpectedEof("in string"));
    }

    #[test]
    fn bad_literal() {
        let mut scanner = Scanner::new();
        let err = scanner.next_token(b"nul!").unwrap_err();
        assert_eq!(err.kind, ScanErrorKind::UnexpectedChar('!'));
    }

    #[test]
    fn minus_without_digits() {
        let mut scanner = Scanner::new();
        assert!(scanner.next_token(b"-x").is_err());
    }

    #[test]
    fn leading_zeros() {
        let mut scanner = Scanner::new();
        let err = scanner.next_token(b"01").unwrap_err();
        assert_eq!(err.kind, ScanErrorKind::UnexpectedChar('1'));

        let mut scanner = Scanner::new();
        let err = scanner.next_token(b"-007").unwrap_err();
        assert_eq!(err.kind, ScanErrorKind::UnexpectedChar('0'));

        // four numbers and the end of input
        assert_eq!(tokens(b"0 -0 0.5 0e1").len(), 5);
    }

    #[test]
    fn unicode_escapes_and_surrogates() {
        let input = br#"\u00e9\ud83d\ude00"#;
        assert_eq!(
            decode_string_owned(input, 0, input.len()).unwrap(),
            "\u{e9}\u{1F600}"
        );
    }

    #[test]
    fn lone_low_surrogate_is_rejected() {
        let input = br#"\udc00"#;
        assert!(decode_string_owned(input, 0, input.len()).is_err());
    }

    #[test]
    fn multibyte_runs_are_copied() {
        let input = "h\u{e9}llo\\n w\u{f6}rld".as_bytes();
        assert_eq!(
            decode_string_owned(input, 0, input.len()).unwrap(),
            "h\u{e9}llo\n w\u{f6}rld"
        );
    }
}
