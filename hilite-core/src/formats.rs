//! Output formats for tokenization results
//!
//! A formatter turns a [Highlight](crate::token::Highlight) into a string. These are
//! serializations of the token stream, not renderers:
//! - tag: one line per token, human readable and diff friendly
//! - json / yaml: the full result, including score and diagnostic flags

pub mod json;
pub mod registry;
pub mod tag;
pub mod yaml;

pub use json::JsonFormatter;
pub use registry::{FormatError, FormatRegistry, Formatter};
pub use tag::{serialize_highlight as serialize_tag, TagFormatter};
pub use yaml::YamlFormatter;
