#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

extern crate alloc;

mod reader;
pub mod scanner;
mod writer;

pub use reader::{JsonReader, MAX_DEPTH};
pub use writer::{JsonWriter, SerializeOptions};
