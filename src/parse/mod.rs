//! Readers for patch input files.

pub mod bez;

pub use bez::{ParseError, ParseResult, parse_file, parse_str, write_bez};
