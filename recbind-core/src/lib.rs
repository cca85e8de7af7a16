#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

extern crate alloc;

mod error;
mod options;
mod path;
mod reader;
mod writer;

pub use error::{DuplicateName, StreamError, StreamErrorKind};
pub use options::NameOptions;
pub use path::{Path, PathSegment};
pub use reader::{FieldReader, Token};
pub use writer::FieldWriter;
