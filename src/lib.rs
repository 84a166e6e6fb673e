//! opttab - table-driven command-line option parsing.
//!
//! This library parses process arguments against an ordered table of typed
//! option descriptors (flags, ints, doubles, strings, regex-constrained
//! strings, filenames, dates, and free-text remarks), collecting structured
//! errors in a bounded log instead of failing, and derives usage-syntax and
//! glossary text from the very same table.

pub mod config;
pub mod parser;
pub mod render;
pub mod table;

pub use config::{ConfigError, OptConfig, OptKind, TableConfig};
pub use parser::{parse_args, ParseError};
pub use render::{generate_errors, generate_glossary, generate_syntax, GLOSSARY_FORMAT};
pub use table::{
    ErrorLog, FileName, Opt, OptError, OptTable, TableBuilder, DEFAULT_ERROR_LIMIT,
};
