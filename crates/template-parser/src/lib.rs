//! Expression mini-language for template leaves.
//!
//! # Architecture
//!
//! - **[`lexer`]** — quote-aware splitting and literal parsing, with a
//!   process-wide fast/safe mode switch
//! - **[`parser`]** — compiles `{{ path | filter:arg ?? default }}` into
//!   an [`ExprIr`]; the [`ExpressionParser`] front caches results by
//!   content hash of the leaf text
//!
//! # Usage
//! ```
//! use template_parser::ExpressionParser;
//!
//! let ir = ExpressionParser::parse("{{ user.email | trim | lower }}").unwrap();
//! assert_eq!(ir.path.emit(), "user.email");
//! assert_eq!(ir.filters.len(), 2);
//! ```

pub mod error;
pub mod ir;
pub mod lexer;
pub mod parser;

pub use error::ExprParseError;
pub use ir::{ExprIr, FilterCall};
pub use lexer::{lex_mode, set_lex_mode, LexMode};
pub use parser::{is_expression, parse_expression, ExpressionParser, DEFAULT_EXPRESSION_CAPACITY};
