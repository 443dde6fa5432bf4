//! A tiny embedded scripting language for sandbox-host form-response logic
//! and in-game interaction.
//!
//! The pipeline, leaves first: [`reader`] (character cursor) feeds
//! [`token`] (the lexer), whose tokens are consumed by [`expr`] (expression
//! linearisation + precedence compaction) and [`parse`] (the statement
//! parser) to produce an immutable opcode list. [`eval`] walks that list
//! against a host-supplied [`host::GameInteract`] and [`host::BuiltInFunction`]
//! registry and returns the script's final [`value::Scalar`].
//!
//! ```
//! use gamescript::{parse::CodeParser, eval::CodeRunner, host::{GameInteract, BuiltInFunction}};
//!
//! let opcodes = CodeParser::parse("x = 1 + 2\nreturn x\n").unwrap();
//! let value = CodeRunner::new()
//!   .run(&opcodes, &GameInteract::new(), &BuiltInFunction::new(), true)
//!   .unwrap();
//! assert_eq!(value.as_str(), "3");
//! ```

pub mod diagnostic;
pub mod eval;
pub mod expr;
pub mod host;
pub mod parse;
pub mod reader;
pub mod token;
pub mod value;

pub use diagnostic::Error;
pub use eval::CodeRunner;
pub use host::{BuiltInFunction, GameInteract};
pub use parse::{CodeParser, Opcode};
pub use value::Scalar;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Parses and runs a script in one call, against a default (all-stub) host
/// and an empty function registry. Convenience wrapper over
/// [`CodeParser::parse`] + [`CodeRunner::run`] for callers that don't need
/// to customize the host interface.
pub fn run(src: &str, require_return: bool) -> Result<Scalar> {
  let opcodes = CodeParser::parse(src)?;
  CodeRunner::new().run(&opcodes, &GameInteract::new(), &BuiltInFunction::new(), require_return)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn top_level_run_parses_and_evaluates() {
    assert_eq!(run("return 1 + 1\n", true).unwrap(), Scalar::Int(2));
  }

  #[test]
  fn unbalanced_if_surfaces_as_formatted_syntax_error() {
    let err = run("if x > 1:\n  y = 1\n", true).unwrap_err();
    let msg = err.to_string();
    assert!(msg.starts_with("Syntax Error."));
    assert!(msg.contains(">>"));
  }
}
