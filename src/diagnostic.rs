//! The error taxonomy and the exact multi-line diagnostic format.
//!
//! Every fallible function in this crate returns `Result<T, Error>`. Errors
//! are born "unwrapped" — just a message — and are wrapped into the final
//! multi-line, user-visible shape exactly once, at the boundary that knows
//! how to locate the offending span: the statement parser (which has the
//! source text and token spans) for syntax-side errors, or the evaluator
//! (which has the opcode's `origin_line`) for runtime-side errors. An
//! already-wrapped error is never wrapped again — this is what lets a
//! runtime error raised three `Condition` bodies deep surface with exactly
//! one `- Condition -` section: the innermost one.
//!
//! The taxonomy from the spec (lex / syntax / compaction / runtime value /
//! host-propagated) is a classification of *kinds*, not distinct Rust types:
//! every kind ultimately renders under one of two envelopes ("Syntax Error."
//! or "Runtime Error."), so the constructors below just pick the matching
//! envelope while keeping the kind name in the function that produced it.

use crate::token::Token;

#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
  /// An unwrapped syntax-side error (lex, syntax, or compaction kind):
  /// just the message, no excerpt yet.
  #[error("{0}")]
  Syntax(String),
  /// An unwrapped runtime-side error (runtime value or host-propagated
  /// kind): just the message, no origin line yet.
  #[error("{0}")]
  Runtime(String),
  /// A fully-formatted, terminal diagnostic. Wrapping functions pass these
  /// through unchanged.
  #[error("{0}")]
  Formatted(String),
}

impl Error {
  pub fn lex(msg: impl Into<String>) -> Error {
    Error::Syntax(msg.into())
  }

  pub fn syntax(msg: impl Into<String>) -> Error {
    Error::Syntax(msg.into())
  }

  pub fn compaction(msg: impl Into<String>) -> Error {
    Error::Syntax(msg.into())
  }

  /// Cursor/reader-internal failures (EOF, unread-before-start). These only
  /// ever surface while scanning tokens or elements, so they render under
  /// the syntax envelope.
  pub fn internal(msg: impl Into<String>) -> Error {
    Error::Syntax(msg.into())
  }

  pub fn runtime(msg: impl Into<String>) -> Error {
    Error::Runtime(msg.into())
  }

  pub fn host_propagated(msg: impl Into<String>) -> Error {
    Error::Runtime(msg.into())
  }

  pub fn is_formatted(&self) -> bool {
    matches!(self, Error::Formatted(_))
  }

  fn raw_message(self) -> Result<String, Error> {
    match self {
      Error::Syntax(m) | Error::Runtime(m) => Ok(m),
      Error::Formatted(_) => Err(self),
    }
  }
}

/// Builds the `>>span<<`-marked excerpt: up to 30 bytes of context on each
/// side, with `...` where the context was truncated, all blank-only leading
/// lines stripped, every remaining line indented by two spaces.
pub fn format_excerpt(src: &str, start: usize, end: usize) -> String {
  let len = src.len();
  let start = start.min(len);
  let end = end.min(len).max(start);

  let mut code = String::new();
  if start > 30 {
    code.push_str("...");
    code.push_str(&src[start - 30..start]);
  } else {
    code.push_str(&src[..start]);
  }
  code.push_str(">>");
  code.push_str(&src[start..end]);
  code.push_str("<<");
  if end + 30 < len {
    code.push_str(&src[end..end + 30]);
    code.push_str("...");
  } else {
    code.push_str(&src[end..]);
  }

  let mut lines: Vec<&str> = code.split('\n').collect();
  while matches!(lines.first(), Some(l) if l.trim().is_empty()) {
    lines.remove(0);
  }
  lines
    .iter()
    .map(|l| format!("  {l}"))
    .collect::<Vec<_>>()
    .join("\n")
    .trim_end()
    .to_string()
}

/// Same as [`format_excerpt`], but takes a range of *token* indices and
/// resolves them to byte offsets via the tokens' captured spans.
pub fn format_excerpt_tokens(src: &str, tokens: &[Token], start_idx: usize, end_idx: usize) -> String {
  if tokens.is_empty() {
    return String::new();
  }
  let last = tokens.len() - 1;
  let start_idx = start_idx.min(last);
  let mut end_idx = end_idx.min(last);
  if start_idx == end_idx {
    end_idx += 1;
  }
  format_excerpt(src, tokens[start_idx].span.start, tokens[end_idx - 1].span.end)
}

/// Wraps a not-yet-formatted error with a byte-offset excerpt. No-op on an
/// already-formatted error.
pub fn wrap_syntax_bytes(src: &str, start: usize, end: usize, err: Error) -> Error {
  let msg = match err.raw_message() {
    Ok(m) => m,
    Err(already) => return already,
  };
  let excerpt = format_excerpt(src, start, end);
  Error::Formatted(format!("Syntax Error.\n\n- Error -\n  {msg}\n\n- Code -\n{excerpt}"))
}

/// Wraps a not-yet-formatted error with a token-index excerpt.
pub fn wrap_syntax_tokens(src: &str, tokens: &[Token], start_idx: usize, end_idx: usize, err: Error) -> Error {
  let msg = match err.raw_message() {
    Ok(m) => m,
    Err(already) => return already,
  };
  let excerpt = format_excerpt_tokens(src, tokens, start_idx, end_idx);
  Error::Formatted(format!("Syntax Error.\n\n- Error -\n  {msg}\n\n- Code -\n{excerpt}"))
}

/// Wraps a not-yet-formatted runtime error with the failing opcode's
/// `origin_line`, no condition/loop context.
pub fn wrap_runtime(origin_line: &str, err: Error) -> Error {
  let msg = match err.raw_message() {
    Ok(m) => m,
    Err(already) => return already,
  };
  Error::Formatted(format!("Runtime Error.\n\n- Error -\n  {msg}\n\n- Code -\n  {origin_line}"))
}

/// Wraps a not-yet-formatted runtime error that has no originating
/// statement at all, e.g. the missing-return check run after the last
/// opcode completes.
pub fn wrap_runtime_terminal(err: Error) -> Error {
  let msg = match err.raw_message() {
    Ok(m) => m,
    Err(already) => return already,
  };
  Error::Formatted(format!("Runtime Error.\n\n- Error -\n  {msg}"))
}

/// Wraps a not-yet-formatted runtime error raised while executing a
/// `Condition` body, attaching the branch's head line and (when known) the
/// specific statement's origin line.
pub fn wrap_runtime_condition(state_line: &str, code_line: Option<&str>, err: Error) -> Error {
  let msg = match err.raw_message() {
    Ok(m) => m,
    Err(already) => return already,
  };
  let mut s = format!("Runtime Error in Condition.\n\n- Error -\n  {msg}\n\n- Condition -\n  {state_line}");
  if let Some(line) = code_line {
    s.push_str(&format!("\n\n- Code -\n  {line}"));
  }
  Error::Formatted(s)
}

/// Same as [`wrap_runtime_condition`], but for a `ForLoop` body.
pub fn wrap_runtime_for_loop(state_line: &str, code_line: Option<&str>, err: Error) -> Error {
  let msg = match err.raw_message() {
    Ok(m) => m,
    Err(already) => return already,
  };
  let mut s = format!("Runtime Error in For Loop.\n\n- Error -\n  {msg}\n\n- For Loop -\n  {state_line}");
  if let Some(line) = code_line {
    s.push_str(&format!("\n\n- Code -\n  {line}"));
  }
  Error::Formatted(s)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn excerpt_marks_short_span_without_truncation() {
    let src = "x = 1 +";
    let e = format_excerpt(src, 4, 5);
    assert_eq!(e, "  x = >>1<< +");
  }

  #[test]
  fn excerpt_truncates_long_context() {
    let src = format!("{}HERE{}", "a".repeat(40), "b".repeat(40));
    let e = format_excerpt(&src, 40, 44);
    assert!(e.starts_with("  ..."));
    assert!(e.ends_with("..."));
    assert!(e.contains(">>HERE<<"));
  }

  #[test]
  fn wrap_syntax_bytes_builds_envelope() {
    let err = Error::syntax("bad token");
    let wrapped = wrap_syntax_bytes("a = 1", 0, 1, err);
    match wrapped {
      Error::Formatted(s) => {
        assert!(s.starts_with("Syntax Error.\n\n- Error -\n  bad token\n\n- Code -\n"));
      }
      _ => panic!("expected Formatted"),
    }
  }

  #[test]
  fn wrap_does_not_double_wrap() {
    let err = Error::syntax("bad token");
    let wrapped = wrap_syntax_bytes("a = 1", 0, 1, err);
    let wrapped_again = wrap_runtime("a = 1", wrapped.clone());
    assert_eq!(wrapped_again.to_string(), wrapped.to_string());
  }
}
