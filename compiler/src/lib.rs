//! Provides for the parsing and compilation of a pattern into its
//! corresponding runtime automaton.
//!
//! # Example
//!
//! ```rust
//! // Parsing and compilation of a pattern into a runnable automaton is
//! // accomplished by two functions exposed in the `mygrep_compiler` crate.
//! use mygrep_compiler::{compile, parse};
//!
//! // Evaluating a given input against a compiled pattern is accomplished
//! // via the matcher module of the `mygrep_runtime` crate.
//! use mygrep_runtime::matcher;
//!
//! let pattern = "(cat) and \\1";
//!
//! let re = parse(pattern)
//!     .map_err(|e| e.to_string())
//!     .and_then(compile)
//!     .expect("failed to parse or compile");
//!
//! assert!(matcher::matches(b"cat and cat", &re));
//! assert!(!matcher::matches(b"cat and dog", &re));
//!
//! // Captured groups are exposed as borrowed slices keyed by group
//! // number; group "0" spans the whole match.
//! let captures = matcher::match_with_captures(b"cat and cat", &re)
//!     .expect("no match found");
//! assert_eq!(b"cat".as_slice(), captures["1"]);
//! ```

pub mod ast;
pub mod compiler;
pub mod parser;

pub use compiler::{compile, Lowerable};
pub use parser::{parse, ParseErr};
