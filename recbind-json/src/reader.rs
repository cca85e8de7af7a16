use alloc::string::{String, ToString};
use alloc::vec::Vec;

use recbind_core::{FieldReader, NameOptions, Path, StreamError, StreamErrorKind, Token};

use crate::scanner::{
    NumberHint, ParsedNumber, ScanError, Scanner, SpannedToken, Token as ScanToken,
    decode_string, parse_number,
};

/// Structural position of the reader, one entry per open container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    EmptyDocument,
    NonEmptyDocument,
    EmptyObject,
    /// A name was read, its value was not.
    DanglingName,
    NonEmptyObject,
    EmptyArray,
    NonEmptyArray,
}

/// The next element, resolved from raw tokens and the current scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Peeked {
    BeginObject,
    EndObject,
    BeginArray,
    EndArray,
    Name {
        start: usize,
        end: usize,
        has_escapes: bool,
    },
    String {
        start: usize,
        end: usize,
        has_escapes: bool,
    },
    Number {
        start: usize,
        end: usize,
        hint: NumberHint,
    },
    True,
    False,
    Null,
    Eof,
}

impl Peeked {
    const fn token(self) -> Token {
        match self {
            Peeked::BeginObject => Token::BeginObject,
            Peeked::EndObject => Token::EndObject,
            Peeked::BeginArray => Token::BeginArray,
            Peeked::EndArray => Token::EndArray,
            Peeked::Name { .. } => Token::Name,
            Peeked::String { .. } => Token::String,
            Peeked::Number { .. } => Token::Number,
            Peeked::True | Peeked::False => Token::Bool,
            Peeked::Null => Token::Null,
            Peeked::Eof => Token::EndDocument,
        }
    }
}

/// Containers a caller may open before [`JsonReader`] refuses to go deeper.
pub const MAX_DEPTH: usize = 256;

/// Pull reader over a complete JSON document.
///
/// Field names are matched against [`NameOptions`] using the raw input bytes
/// whenever the name contains no escape sequences. At most [`MAX_DEPTH`]
/// containers can be open through `begin_object`/`begin_array`;
/// `skip_value` skips values of any depth.
pub struct JsonReader<'input> {
    input: &'input [u8],
    scanner: Scanner,
    stack: Vec<Scope>,
    peeked: Option<Peeked>,
    peeked_at: usize,
    path: Path,
}

impl<'input> JsonReader<'input> {
    /// Read from UTF-8 text.
    pub fn new(input: &'input str) -> Self {
        Self::from_slice(input.as_bytes())
    }

    /// Read from bytes; strings are validated as UTF-8 when decoded.
    pub fn from_slice(input: &'input [u8]) -> Self {
        Self {
            input,
            scanner: Scanner::new(),
            stack: alloc::vec![Scope::EmptyDocument],
            peeked: None,
            peeked_at: 0,
            path: Path::root(),
        }
    }

    /// Check that nothing but whitespace follows the root value.
    pub fn finish(&mut self) -> Result<(), StreamError> {
        match self.do_peek()? {
            Peeked::Eof => Ok(()),
            _ => Err(self.error(StreamErrorKind::TrailingData)),
        }
    }

    fn error(&self, kind: StreamErrorKind) -> StreamError {
        StreamError::new(kind, self.path.clone()).at_offset(self.peeked_at)
    }

    fn scan_error(&self, err: ScanError) -> StreamError {
        StreamError::new(
            StreamErrorKind::Syntax {
                message: err.kind.to_string(),
            },
            self.path.clone(),
        )
        .at_offset(err.span.offset)
    }

    fn syntax(&self, message: &str, at: usize) -> StreamError {
        StreamError::new(
            StreamErrorKind::Syntax {
                message: message.to_string(),
            },
            self.path.clone(),
        )
        .at_offset(at)
    }

    fn unexpected(&self, expected: &'static str, got: Peeked) -> StreamError {
        self.error(StreamErrorKind::UnexpectedToken {
            expected,
            got: got.token(),
        })
    }

    fn scan(&mut self) -> Result<SpannedToken, StreamError> {
        self.scanner
            .next_token(self.input)
            .map_err(|err| self.scan_error(err))
    }

    fn set_top(&mut self, scope: Scope) {
        if let Some(top) = self.stack.last_mut() {
            *top = scope;
        }
    }

    fn do_peek(&mut self) -> Result<Peeked, StreamError> {
        if let Some(peeked) = self.peeked {
            return Ok(peeked);
        }
        let peeked = self.advance()?;
        self.peeked = Some(peeked);
        Ok(peeked)
    }

    /// Consume separators for the current scope and resolve the next element.
    fn advance(&mut self) -> Result<Peeked, StreamError> {
        let Some(&scope) = self.stack.last() else {
            return Err(self.error(StreamErrorKind::InvalidState {
                message: "reader is closed",
            }));
        };

        match scope {
            Scope::EmptyDocument => {
                self.set_top(Scope::NonEmptyDocument);
                let token = self.scan()?;
                self.value(token)
            }
            Scope::NonEmptyDocument => {
                let token = self.scan()?;
                self.peeked_at = token.span.offset;
                match token.token {
                    ScanToken::Eof => Ok(Peeked::Eof),
                    _ => Err(self.error(StreamErrorKind::TrailingData)),
                }
            }
            Scope::EmptyObject | Scope::NonEmptyObject => {
                let mut token = self.scan()?;
                self.peeked_at = token.span.offset;
                if token.token == ScanToken::ObjectEnd {
                    return Ok(Peeked::EndObject);
                }
                if scope == Scope::NonEmptyObject {
                    if token.token != ScanToken::Comma {
                        return Err(self.syntax("unterminated object", token.span.offset));
                    }
                    token = self.scan()?;
                    self.peeked_at = token.span.offset;
                }
                match token.token {
                    ScanToken::String {
                        start,
                        end,
                        has_escapes,
                    } => {
                        self.set_top(Scope::DanglingName);
                        Ok(Peeked::Name {
                            start,
                            end,
                            has_escapes,
                        })
                    }
                    _ => Err(self.syntax("expected a field name", token.span.offset)),
                }
            }
            Scope::DanglingName => {
                self.set_top(Scope::NonEmptyObject);
                let token = self.scan()?;
                if token.token != ScanToken::Colon {
                    return Err(self.syntax("expected ':'", token.span.offset));
                }
                let token = self.scan()?;
                self.value(token)
            }
            Scope::EmptyArray => {
                self.set_top(Scope::NonEmptyArray);
                let token = self.scan()?;
                if token.token == ScanToken::ArrayEnd {
                    self.peeked_at = token.span.offset;
                    return Ok(Peeked::EndArray);
                }
                self.value(token)
            }
            Scope::NonEmptyArray => {
                let token = self.scan()?;
                self.peeked_at = token.span.offset;
                match token.token {
                    ScanToken::ArrayEnd => Ok(Peeked::EndArray),
                    ScanToken::Comma => {
                        let token = self.scan()?;
                        self.value(token)
                    }
                    _ => Err(self.syntax("unterminated array", token.span.offset)),
                }
            }
        }
    }

    fn value(&mut self, token: SpannedToken) -> Result<Peeked, StreamError> {
        self.peeked_at = token.span.offset;
        match token.token {
            ScanToken::ObjectStart => Ok(Peeked::BeginObject),
            ScanToken::ArrayStart => Ok(Peeked::BeginArray),
            ScanToken::Null => Ok(Peeked::Null),
            ScanToken::True => Ok(Peeked::True),
            ScanToken::False => Ok(Peeked::False),
            ScanToken::String {
                start,
                end,
                has_escapes,
            } => Ok(Peeked::String {
                start,
                end,
                has_escapes,
            }),
            ScanToken::Number { start, end, hint } => Ok(Peeked::Number { start, end, hint }),
            ScanToken::Eof => Err(self.syntax("unexpected end of input", token.span.offset)),
            _ => Err(self.syntax("expected a value", token.span.offset)),
        }
    }

    /// Mark the peeked value as consumed.
    fn consume_value(&mut self) {
        self.peeked = None;
        if matches!(self.stack.last(), Some(Scope::NonEmptyArray)) {
            self.path.advance_index();
        }
    }

    fn open(&mut self, scope: Scope) -> Result<(), StreamError> {
        // the bottom entry is the document itself
        if self.stack.len() > MAX_DEPTH {
            return Err(self.error(StreamErrorKind::NestingTooDeep { limit: MAX_DEPTH }));
        }
        self.push(scope);
        Ok(())
    }

    fn push(&mut self, scope: Scope) {
        self.peeked = None;
        self.stack.push(scope);
        if scope == Scope::EmptyArray {
            self.path.push_array();
        } else {
            self.path.push_object();
        }
    }

    fn close(&mut self) {
        self.stack.pop();
        self.path.pop();
        self.consume_value();
    }

    fn decode(&self, start: usize, end: usize, has_escapes: bool) -> Result<String, StreamError> {
        decode_string(self.input, start, end, has_escapes)
            .map(|text| text.into_owned())
            .map_err(|err| self.scan_error(err))
    }

    fn number(&self, start: usize, end: usize, hint: NumberHint) -> Result<ParsedNumber, StreamError> {
        parse_number(self.input, start, end, hint).map_err(|err| self.scan_error(err))
    }

    fn out_of_range(&self, start: usize, end: usize, target: &'static str) -> StreamError {
        self.error(StreamErrorKind::NumberOutOfRange {
            value: String::from_utf8_lossy(&self.input[start..end]).into_owned(),
            target,
        })
    }
}

impl FieldReader for JsonReader<'_> {
    fn begin_object(&mut self) -> Result<(), StreamError> {
        match self.do_peek()? {
            Peeked::BeginObject => self.open(Scope::EmptyObject),
            other => Err(self.unexpected("BEGIN_OBJECT", other)),
        }
    }

    fn end_object(&mut self) -> Result<(), StreamError> {
        match self.do_peek()? {
            Peeked::EndObject => {
                self.close();
                Ok(())
            }
            other => Err(self.unexpected("END_OBJECT", other)),
        }
    }

    fn begin_array(&mut self) -> Result<(), StreamError> {
        match self.do_peek()? {
            Peeked::BeginArray => self.open(Scope::EmptyArray),
            other => Err(self.unexpected("BEGIN_ARRAY", other)),
        }
    }

    fn end_array(&mut self) -> Result<(), StreamError> {
        match self.do_peek()? {
            Peeked::EndArray => {
                self.close();
                Ok(())
            }
            other => Err(self.unexpected("END_ARRAY", other)),
        }
    }

    fn has_next(&mut self) -> Result<bool, StreamError> {
        Ok(!matches!(
            self.do_peek()?,
            Peeked::EndObject | Peeked::EndArray | Peeked::Eof
        ))
    }

    fn peek(&mut self) -> Result<Token, StreamError> {
        self.do_peek().map(Peeked::token)
    }

    fn select_name(&mut self, options: &NameOptions) -> Result<Option<usize>, StreamError> {
        let Peeked::Name {
            start,
            end,
            has_escapes,
        } = self.do_peek()?
        else {
            let got = self.do_peek()?;
            return Err(self.unexpected("a name", got));
        };

        let index = if has_escapes {
            options.find(&self.decode(start, end, true)?)
        } else {
            options.find_bytes(&self.input[start..end])
        };

        if let Some(index) = index {
            self.peeked = None;
            if let Some(name) = options.name(index) {
                self.path.set_field(name);
            }
        }
        Ok(index)
    }

    fn next_name(&mut self) -> Result<String, StreamError> {
        match self.do_peek()? {
            Peeked::Name {
                start,
                end,
                has_escapes,
            } => {
                let name = self.decode(start, end, has_escapes)?;
                self.peeked = None;
                self.path.set_field(name.clone());
                Ok(name)
            }
            other => Err(self.unexpected("a name", other)),
        }
    }

    fn skip_name(&mut self) -> Result<(), StreamError> {
        match self.do_peek()? {
            Peeked::Name { start, end, .. } => {
                let raw = String::from_utf8_lossy(&self.input[start..end]).into_owned();
                self.peeked = None;
                self.path.set_field(raw);
                Ok(())
            }
            other => Err(self.unexpected("a name", other)),
        }
    }

    fn skip_value(&mut self) -> Result<(), StreamError> {
        let mut depth = 0_usize;
        loop {
            match self.do_peek()? {
                Peeked::BeginObject => {
                    self.push(Scope::EmptyObject);
                    depth += 1;
                }
                Peeked::BeginArray => {
                    self.push(Scope::EmptyArray);
                    depth += 1;
                }
                Peeked::Name { .. } => {
                    // the field's value follows
                    self.skip_name()?;
                    continue;
                }
                Peeked::EndObject | Peeked::EndArray if depth > 0 => {
                    self.close();
                    depth -= 1;
                }
                other @ (Peeked::EndObject | Peeked::EndArray | Peeked::Eof) => {
                    return Err(self.unexpected("a value", other));
                }
                Peeked::String { .. }
                | Peeked::Number { .. }
                | Peeked::True
                | Peeked::False
                | Peeked::Null => self.consume_value(),
            }
            if depth == 0 {
                return Ok(());
            }
        }
    }

    fn next_null(&mut self) -> Result<(), StreamError> {
        match self.do_peek()? {
            Peeked::Null => {
                self.consume_value();
                Ok(())
            }
            other => Err(self.unexpected("NULL", other)),
        }
    }

    fn next_bool(&mut self) -> Result<bool, StreamError> {
        let value = match self.do_peek()? {
            Peeked::True => true,
            Peeked::False => false,
            other => return Err(self.unexpected("a boolean", other)),
        };
        self.consume_value();
        Ok(value)
    }

    fn next_string(&mut self) -> Result<String, StreamError> {
        let value = match self.do_peek()? {
            Peeked::String {
                start,
                end,
                has_escapes,
            } => self.decode(start, end, has_escapes)?,
            // numbers are accepted as strings, in their literal spelling
            Peeked::Number { start, end, .. } => {
                String::from_utf8_lossy(&self.input[start..end]).into_owned()
            }
            other => return Err(self.unexpected("a string", other)),
        };
        self.consume_value();
        Ok(value)
    }

    fn next_i64(&mut self) -> Result<i64, StreamError> {
        let Peeked::Number { start, end, hint } = self.do_peek()? else {
            let got = self.do_peek()?;
            return Err(self.unexpected("an integer", got));
        };
        let value = match self.number(start, end, hint)? {
            ParsedNumber::I64(n) => n,
            ParsedNumber::U64(n) => {
                i64::try_from(n).map_err(|_| self.out_of_range(start, end, "i64"))?
            }
            ParsedNumber::F64(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
                f as i64
            }
            ParsedNumber::F64(_) => return Err(self.out_of_range(start, end, "i64")),
        };
        self.consume_value();
        Ok(value)
    }

    fn next_u64(&mut self) -> Result<u64, StreamError> {
        let Peeked::Number { start, end, hint } = self.do_peek()? else {
            let got = self.do_peek()?;
            return Err(self.unexpected("an unsigned integer", got));
        };
        let value = match self.number(start, end, hint)? {
            ParsedNumber::U64(n) => n,
            ParsedNumber::I64(n) => {
                u64::try_from(n).map_err(|_| self.out_of_range(start, end, "u64"))?
            }
            ParsedNumber::F64(f) if f.fract() == 0.0 && f >= 0.0 && f < u64::MAX as f64 => f as u64,
            ParsedNumber::F64(_) => return Err(self.out_of_range(start, end, "u64")),
        };
        self.consume_value();
        Ok(value)
    }

    fn next_f64(&mut self) -> Result<f64, StreamError> {
        let Peeked::Number { start, end, hint } = self.do_peek()? else {
            let got = self.do_peek()?;
            return Err(self.unexpected("a number", got));
        };
        let value = match self.number(start, end, hint)? {
            ParsedNumber::U64(n) => n as f64,
            ParsedNumber::I64(n) => n as f64,
            ParsedNumber::F64(f) => f,
        };
        self.consume_value();
        Ok(value)
    }

    fn path(&self) -> Path {
        self.path.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_nested_document() {
        let mut reader = JsonReader::new(r#"{"a": [1, -2, 3.5], "b": {"c": null}, "d": true}"#);
        reader.begin_object().unwrap();
        assert_eq!(reader.next_name().unwrap(), "a");
        reader.begin_array().unwrap();
        assert_eq!(reader.next_u64().unwrap(), 1);
        assert_eq!(reader.next_i64().unwrap(), -2);
        assert_eq!(reader.next_f64().unwrap(), 3.5);
        assert!(!reader.has_next().unwrap());
        reader.end_array().unwrap();
        assert_eq!(reader.next_name().unwrap(), "b");
        reader.begin_object().unwrap();
        assert_eq!(reader.next_name().unwrap(), "c");
        assert_eq!(reader.peek().unwrap(), Token::Null);
        reader.next_null().unwrap();
        reader.end_object().unwrap();
        assert_eq!(reader.next_name().unwrap(), "d");
        assert!(reader.next_bool().unwrap());
        reader.end_object().unwrap();
        reader.finish().unwrap();
    }

    #[test]
    fn path_follows_the_cursor() {
        let mut reader = JsonReader::new(r#"{"items": [10, 20]}"#);
        reader.begin_object().unwrap();
        assert_eq!(reader.path().to_string(), "$.");
        reader.next_name().unwrap();
        assert_eq!(reader.path().to_string(), "$.items");
        reader.begin_array().unwrap();
        assert_eq!(reader.path().to_string(), "$.items[0]");
        reader.next_i64().unwrap();
        assert_eq!(reader.path().to_string(), "$.items[1]");
        reader.next_i64().unwrap();
        reader.end_array().unwrap();
        reader.end_object().unwrap();
        assert_eq!(reader.path().to_string(), "$");
    }

    #[test]
    fn select_name_leaves_unknown_names_pending() {
        let options = NameOptions::new(["known"]).unwrap();
        let mut reader = JsonReader::new(r#"{"other": 1, "known": 2}"#);
        reader.begin_object().unwrap();
        assert_eq!(reader.select_name(&options).unwrap(), None);
        assert_eq!(reader.peek().unwrap(), Token::Name);
        reader.skip_name().unwrap();
        reader.skip_value().unwrap();
        assert_eq!(reader.select_name(&options).unwrap(), Some(0));
        assert_eq!(reader.next_i64().unwrap(), 2);
        reader.end_object().unwrap();
    }

    #[test]
    fn select_name_decodes_escaped_names() {
        let options = NameOptions::new(["a\"b"]).unwrap();
        let mut reader = JsonReader::new(r#"{"a\"b": 1}"#);
        reader.begin_object().unwrap();
        assert_eq!(reader.select_name(&options).unwrap(), Some(0));
    }

    #[test]
    fn skip_value_skips_nested_structures() {
        let mut reader = JsonReader::new(r#"[{"x": [1, {"y": []}]}, "after"]"#);
        reader.begin_array().unwrap();
        reader.skip_value().unwrap();
        assert_eq!(reader.next_string().unwrap(), "after");
        reader.end_array().unwrap();
        reader.finish().unwrap();
    }

    #[test]
    fn integral_floats_are_accepted_as_integers() {
        let mut reader = JsonReader::new("[1.0, 1.5]");
        reader.begin_array().unwrap();
        assert_eq!(reader.next_i64().unwrap(), 1);
        let err = reader.next_i64().unwrap_err();
        assert!(matches!(err.kind, StreamErrorKind::NumberOutOfRange { .. }));
    }

    #[test]
    fn negative_numbers_do_not_fit_u64() {
        let mut reader = JsonReader::new("-1");
        let err = reader.next_u64().unwrap_err();
        assert!(matches!(
            err.kind,
            StreamErrorKind::NumberOutOfRange { target: "u64", .. }
        ));
    }

    #[test]
    fn wrong_token_reports_expected_and_actual() {
        let mut reader = JsonReader::new(r#"{"a": "text"}"#);
        reader.begin_object().unwrap();
        reader.next_name().unwrap();
        let err = reader.next_i64().unwrap_err();
        assert_eq!(
            err.kind,
            StreamErrorKind::UnexpectedToken {
                expected: "an integer",
                got: Token::String
            }
        );
        assert_eq!(err.path.to_string(), "$.a");
    }

    #[test]
    fn trailing_data_is_rejected() {
        let mut reader = JsonReader::new("{} {}");
        reader.begin_object().unwrap();
        reader.end_object().unwrap();
        let err = reader.finish().unwrap_err();
        assert_eq!(err.kind, StreamErrorKind::TrailingData);
    }

    #[test]
    fn trailing_comma_in_object_is_rejected() {
        let mut reader = JsonReader::new(r#"{"a": 1,}"#);
        reader.begin_object().unwrap();
        reader.next_name().unwrap();
        reader.next_i64().unwrap();
        assert!(reader.has_next().is_err());
    }

    #[test]
    fn missing_colon_is_rejected() {
        let mut reader = JsonReader::new(r#"{"a" 1}"#);
        reader.begin_object().unwrap();
        reader.next_name().unwrap();
        let err = reader.next_i64().unwrap_err();
        assert!(matches!(err.kind, StreamErrorKind::Syntax { .. }));
    }

    #[test]
    fn empty_document_is_rejected() {
        let mut reader = JsonReader::new("   ");
        assert!(reader.peek().is_err());
    }
}
