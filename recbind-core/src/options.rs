use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use std::collections::HashMap;

use crate::DuplicateName;

/// A compiled set of field names, matched by [`FieldReader::select_name`].
///
/// Built once per record type. Lookups are keyed by the raw UTF-8 bytes so
/// a reader can match unescaped names straight out of its input buffer.
///
/// [`FieldReader::select_name`]: crate::FieldReader::select_name
#[derive(Debug, Clone, Default)]
pub struct NameOptions {
    names: Vec<String>,
    index: HashMap<Box<[u8]>, usize>,
}

impl NameOptions {
    /// Compile `names`; the position of each name is the index returned on a match.
    pub fn new<I, S>(names: I) -> Result<Self, DuplicateName>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut options = NameOptions::default();
        for name in names {
            let name = name.into();
            let position = options.names.len();
            let key: Box<[u8]> = name.as_bytes().into();
            if options.index.insert(key, position).is_some() {
                return Err(DuplicateName(name));
            }
            options.names.push(name);
        }
        Ok(options)
    }

    /// Index of `name`, if it is one of the compiled names.
    #[inline]
    pub fn find(&self, name: &str) -> Option<usize> {
        self.find_bytes(name.as_bytes())
    }

    /// Index of the name spelled by `raw`, if it is one of the compiled names.
    #[inline]
    pub fn find_bytes(&self, raw: &[u8]) -> Option<usize> {
        self.index.get(raw).copied()
    }

    /// The name at `index`.
    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// All names, in index order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Number of compiled names.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// True when no names were compiled.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_follow_input_order() {
        let options = NameOptions::new(["a", "bee", "c"]).unwrap();
        assert_eq!(options.find("a"), Some(0));
        assert_eq!(options.find("bee"), Some(1));
        assert_eq!(options.find_bytes(b"c"), Some(2));
        assert_eq!(options.find("d"), None);
        assert_eq!(options.name(1), Some("bee"));
        assert_eq!(options.len(), 3);
    }

    #[test]
    fn duplicates_are_refused() {
        let err = NameOptions::new(["x", "y", "x"]).unwrap_err();
        assert_eq!(err, DuplicateName("x".into()));
    }

    #[test]
    fn empty_options() {
        let options = NameOptions::new(Vec::<String>::new()).unwrap();
        assert!(options.is_empty());
        assert_eq!(options.find(""), None);
    }
}
