use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

/// A single step in a [`Path`] through a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Inside an object. `None` until the first field name has been read.
    Field(Option<String>),
    /// Inside an array, at the given element index.
    Index(usize),
}

/// Location of the reader (or writer) inside a document.
///
/// Rendered the way JSONPath renders it: `$`, `$.name`, `$.items[3].id`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path {
    segments: Vec<PathSegment>,
}

impl Path {
    /// The document root.
    pub const fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Enter an object.
    pub fn push_object(&mut self) {
        self.segments.push(PathSegment::Field(None));
    }

    /// Enter an array, positioned before its first element.
    pub fn push_array(&mut self) {
        self.segments.push(PathSegment::Index(0));
    }

    /// Leave the innermost object or array.
    pub fn pop(&mut self) -> Option<PathSegment> {
        self.segments.pop()
    }

    /// Record the field name most recently read in the innermost object.
    ///
    /// Does nothing when the innermost container is not an object.
    pub fn set_field(&mut self, name: impl Into<String>) {
        if let Some(PathSegment::Field(slot)) = self.segments.last_mut() {
            *slot = Some(name.into());
        }
    }

    /// Move to the next element of the innermost array.
    ///
    /// Does nothing when the innermost container is not an array.
    pub fn advance_index(&mut self) {
        if let Some(PathSegment::Index(index)) = self.segments.last_mut() {
            *index += 1;
        }
    }

    /// The recorded segments, outermost first.
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Nesting depth.
    pub const fn depth(&self) -> usize {
        self.segments.len()
    }

    /// True at the document root.
    pub const fn is_root(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("$")?;
        for segment in &self.segments {
            match segment {
                PathSegment::Field(Some(name)) => write!(f, ".{name}")?,
                PathSegment::Field(None) => f.write_str(".")?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}
