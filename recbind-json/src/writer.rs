use alloc::{string::String, vec::Vec};

use recbind_core::{FieldWriter, Path, StreamError, StreamErrorKind};

/// Options for JSON output.
#[derive(Debug, Clone)]
pub struct SerializeOptions {
    /// Whether to pretty-print with indentation (default: false)
    pub pretty: bool,

    /// Indentation string for pretty-printing (default: "  ")
    pub indent: &'static str,

    /// Whether fields holding null are written (default: true)
    pub serialize_nulls: bool,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self {
            pretty: false,
            indent: "  ",
            serialize_nulls: true,
        }
    }
}

impl SerializeOptions {
    /// Create new default options (compact output, nulls written).
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable pretty-printing with default indentation.
    pub const fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }

    /// Set a custom indentation string (implies pretty-printing).
    pub const fn indent(mut self, indent: &'static str) -> Self {
        self.indent = indent;
        self.pretty = true;
        self
    }

    /// Choose whether null-valued fields are written or dropped.
    pub const fn serialize_nulls(mut self, serialize_nulls: bool) -> Self {
        self.serialize_nulls = serialize_nulls;
        self
    }
}

#[derive(Debug, Clone, Copy)]
enum Ctx {
    Object { first: bool },
    Array { first: bool },
}

/// Push writer producing JSON text.
pub struct JsonWriter {
    out: Vec<u8>,
    stack: Vec<Ctx>,
    /// Name written by [`FieldWriter::name`] whose value has not arrived yet.
    pending_name: Option<String>,
    root_written: bool,
    path: Path,
    options: SerializeOptions,
}

impl JsonWriter {
    /// Create a writer with default (compact) options.
    pub fn new() -> Self {
        Self::with_options(SerializeOptions::default())
    }

    /// Create a writer with the given options.
    pub const fn with_options(options: SerializeOptions) -> Self {
        Self {
            out: Vec::new(),
            stack: Vec::new(),
            pending_name: None,
            root_written: false,
            path: Path::root(),
            options,
        }
    }

    /// Return the output bytes, failing if a container is still open.
    pub fn finish(self) -> Result<Vec<u8>, StreamError> {
        if !self.stack.is_empty() || self.pending_name.is_some() {
            return Err(self.invalid("document is incomplete"));
        }
        Ok(self.out)
    }

    /// Like [`JsonWriter::finish`], as a `String`.
    pub fn finish_string(self) -> Result<String, StreamError> {
        let bytes = self.finish()?;
        // only ever fed `&str` and ASCII punctuation
        String::from_utf8(bytes).map_err(|_| {
            StreamError::new(
                StreamErrorKind::InvalidState {
                    message: "output is not UTF-8",
                },
                Path::root(),
            )
        })
    }

    fn invalid(&self, message: &'static str) -> StreamError {
        StreamError::new(StreamErrorKind::InvalidState { message }, self.path.clone())
    }

    const fn depth(&self) -> usize {
        self.stack.len()
    }

    fn write_indent(&mut self) {
        if self.options.pretty {
            self.out.push(b'\n');
            for _ in 0..self.depth() {
                self.out.extend_from_slice(self.options.indent.as_bytes());
            }
        }
    }

    /// Emit separators, and the pending name when inside an object.
    fn before_value(&mut self) -> Result<(), StreamError> {
        match self.stack.last_mut() {
            Some(Ctx::Array { first }) => {
                if !*first {
                    self.out.push(b',');
                }
                *first = false;
                self.write_indent();
            }
            Some(Ctx::Object { first }) => {
                let Some(name) = self.pending_name.take() else {
                    return Err(self.invalid("value written inside an object without a name"));
                };
                if !*first {
                    self.out.push(b',');
                }
                *first = false;
                self.write_indent();
                self.write_json_string(&name);
                self.out.push(b':');
                if self.options.pretty {
                    self.out.push(b' ');
                }
            }
            None => {
                if self.root_written {
                    return Err(self.invalid("document already has a root value"));
                }
                self.root_written = true;
            }
        }
        Ok(())
    }

    fn after_value(&mut self) {
        if matches!(self.stack.last(), Some(Ctx::Array { .. })) {
            self.path.advance_index();
        }
    }

    fn write_json_string(&mut self, s: &str) {
        self.out.push(b'"');
        let bytes = s.as_bytes();
        let mut run_start = 0;
        for (i, &byte) in bytes.iter().enumerate() {
            let escape: &[u8] = match byte {
                b'"' => b"\\\"",
                b'\\' => b"\\\\",
                b'\n' => b"\\n",
                b'\r' => b"\\r",
                b'\t' => b"\\t",
                0x08 => b"\\b",
                0x0C => b"\\f",
                0x00..=0x1F => {
                    self.out.extend_from_slice(&bytes[run_start..i]);
                    self.write_unicode_escape(byte);
                    run_start = i + 1;
                    continue;
                }
                _ => continue,
            };
            self.out.extend_from_slice(&bytes[run_start..i]);
            self.out.extend_from_slice(escape);
            run_start = i + 1;
        }
        self.out.extend_from_slice(&bytes[run_start..]);
        self.out.push(b'"');
    }

    fn write_unicode_escape(&mut self, byte: u8) {
        const HEX: &[u8; 16] = b"0123456789abcdef";
        self.out.extend_from_slice(&[
            b'\\',
            b'u',
            b'0',
            b'0',
            HEX[(byte >> 4) as usize],
            HEX[(byte & 0xF) as usize],
        ]);
    }

    fn scalar(&mut self, bytes: &[u8]) -> Result<(), StreamError> {
        self.before_value()?;
        self.out.extend_from_slice(bytes);
        self.after_value();
        Ok(())
    }
}

impl Default for JsonWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldWriter for JsonWriter {
    fn begin_object(&mut self) -> Result<(), StreamError> {
        self.before_value()?;
        self.out.push(b'{');
        self.stack.push(Ctx::Object { first: true });
        self.path.push_object();
        Ok(())
    }

    fn name(&mut self, name: &str) -> Result<(), StreamError> {
        match self.stack.last() {
            Some(Ctx::Object { .. }) if self.pending_name.is_none() => {
                self.pending_name = Some(name.into());
                self.path.set_field(name);
                Ok(())
            }
            Some(Ctx::Object { .. }) => Err(self.invalid("name written twice")),
            _ => Err(self.invalid("name written outside of an object")),
        }
    }

    fn end_object(&mut self) -> Result<(), StreamError> {
        if self.pending_name.is_some() {
            return Err(self.invalid("object closed while a name is dangling"));
        }
        match self.stack.pop() {
            Some(Ctx::Object { first }) => {
                if !first {
                    self.write_indent();
                }
                self.out.push(b'}');
                self.path.pop();
                self.after_value();
                Ok(())
            }
            Some(other) => {
                self.stack.push(other);
                Err(self.invalid("end_object without a matching begin_object"))
            }
            None => Err(self.invalid("end_object without a matching begin_object")),
        }
    }

    fn begin_array(&mut self) -> Result<(), StreamError> {
        self.before_value()?;
        self.out.push(b'[');
        self.stack.push(Ctx::Array { first: true });
        self.path.push_array();
        Ok(())
    }

    fn end_array(&mut self) -> Result<(), StreamError> {
        match self.stack.pop() {
            Some(Ctx::Array { first }) => {
                if !first {
                    self.write_indent();
                }
                self.out.push(b']');
                self.path.pop();
                self.after_value();
                Ok(())
            }
            Some(other) => {
                self.stack.push(other);
                Err(self.invalid("end_array without a matching begin_array"))
            }
            None => Err(self.invalid("end_array without a matching begin_array")),
        }
    }

    fn null_value(&mut self) -> Result<(), StreamError> {
        if !self.options.serialize_nulls
            && matches!(self.stack.last(), Some(Ctx::Object { .. }))
            && self.pending_name.take().is_some()
        {
            return Ok(());
        }
        self.scalar(b"null")
    }

    fn bool_value(&mut self, value: bool) -> Result<(), StreamError> {
        self.scalar(if value { b"true" } else { b"false" })
    }

    fn string_value(&mut self, value: &str) -> Result<(), StreamError> {
        self.before_value()?;
        self.write_json_string(value);
        self.after_value();
        Ok(())
    }

    fn i64_value(&mut self, value: i64) -> Result<(), StreamError> {
        self.scalar(itoa::Buffer::new().format(value).as_bytes())
    }

    fn u64_value(&mut self, value: u64) -> Result<(), StreamError> {
        self.scalar(itoa::Buffer::new().format(value).as_bytes())
    }

    fn f64_value(&mut self, value: f64) -> Result<(), StreamError> {
        if !value.is_finite() {
            return Err(StreamError::new(
                StreamErrorKind::NonFiniteNumber(value),
                self.path.clone(),
            ));
        }
        self.scalar(ryu::Buffer::new().format_finite(value).as_bytes())
    }

    fn path(&self) -> Path {
        self.path.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(options: SerializeOptions, f: impl FnOnce(&mut JsonWriter)) -> String {
        let mut writer = JsonWriter::with_options(options);
        f(&mut writer);
        writer.finish_string().unwrap()
    }

    #[test]
    fn writes_compact_objects_and_arrays() {
        let out = write(SerializeOptions::new(), |w| {
            w.begin_object().unwrap();
            w.name("a").unwrap();
            w.i64_value(-5).unwrap();
            w.name("b").unwrap();
            w.begin_array().unwrap();
            w.u64_value(1).unwrap();
            w.bool_value(false).unwrap();
            w.null_value().unwrap();
            w.end_array().unwrap();
            w.name("c").unwrap();
            w.f64_value(1.5).unwrap();
            w.end_object().unwrap();
        });
        assert_eq!(out, r#"{"a":-5,"b":[1,false,null],"c":1.5}"#);
    }

    #[test]
    fn pretty_printing_indents_nested_values() {
        let out = write(SerializeOptions::new().pretty(), |w| {
            w.begin_object().unwrap();
            w.name("xs").unwrap();
            w.begin_array().unwrap();
            w.i64_value(1).unwrap();
            w.end_array().unwrap();
            w.name("empty").unwrap();
            w.begin_object().unwrap();
            w.end_object().unwrap();
            w.end_object().unwrap();
        });
        insta::assert_snapshot!(out, @r#"
        {
          "xs": [
            1
          ],
          "empty": {}
        }
        "#);
    }

    #[test]
    fn strings_are_escaped() {
        let out = write(SerializeOptions::new(), |w| {
            w.string_value("q\"b\\n\n\u{1}é").unwrap();
        });
        assert_eq!(out, "\"q\\\"b\\\\n\\n\\u0001é\"");
    }

    #[test]
    fn nulls_can_be_dropped() {
        let out = write(SerializeOptions::new().serialize_nulls(false), |w| {
            w.begin_object().unwrap();
            w.name("gone").unwrap();
            w.null_value().unwrap();
            w.name("kept").unwrap();
            w.string_value("x").unwrap();
            w.end_object().unwrap();
        });
        assert_eq!(out, r#"{"kept":"x"}"#);
    }

    #[test]
    fn non_finite_floats_are_refused() {
        let mut writer = JsonWriter::new();
        writer.begin_array().unwrap();
        writer.f64_value(1.0).unwrap();
        let err = writer.f64_value(f64::NAN).unwrap_err();
        assert!(matches!(err.kind, StreamErrorKind::NonFiniteNumber(_)));
        assert_eq!(err.path.to_string(), "$[1]");
    }

    #[test]
    fn structural_misuse_is_reported() {
        let mut writer = JsonWriter::new();
        assert!(writer.name("x").is_err());
        writer.begin_object().unwrap();
        assert!(writer.i64_value(1).is_err());
        assert!(writer.end_array().is_err());
        writer.end_object().unwrap();
        assert!(writer.begin_object().is_err());
    }

    #[test]
    fn unfinished_documents_are_rejected() {
        let mut writer = JsonWriter::new();
        writer.begin_array().unwrap();
        assert!(writer.finish().is_err());
    }
}
