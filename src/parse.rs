//! The statement parser: turns a token sequence into an ordered opcode
//! list, using speculative (rewindable) parsing to decide between a bare
//! expression statement and a keyword-led statement form.

use crate::diagnostic::{self, Error};
use crate::expr::{Context, Expression};
use crate::reader::Cursor;
use crate::token::{Sentence, Token, TokenKind};

/// One arm of a `Condition` opcode. `cond = None` marks the final `else`
/// branch.
#[derive(Debug, Clone)]
pub struct Branch {
  pub cond: Option<Expression>,
  pub state_line: String,
  pub body: Vec<Opcode>,
}

/// A parsed statement, carrying the trimmed source text of the statement
/// (or, for `Condition`/`ForLoop`, of its head line) for runtime
/// diagnostics.
#[derive(Debug, Clone)]
pub enum Opcode {
  Assign { name: String, expr: Expression, origin_line: String },
  Condition { branches: Vec<Branch>, origin_line: String },
  ForLoop { var: String, count: Expression, state_line: String, body: Vec<Opcode>, origin_line: String },
  Continue { origin_line: String },
  Break { origin_line: String },
  ExpressionStmt { expr: Expression, origin_line: String },
  Return { expr: Expression, origin_line: String },
  /// Supplemental statement form, `del NAME` (see `SPEC_FULL.md` §B).
  Delete { name: String, origin_line: String },
}

impl Opcode {
  pub fn origin_line(&self) -> &str {
    match self {
      Opcode::Assign { origin_line, .. }
      | Opcode::Condition { origin_line, .. }
      | Opcode::ForLoop { origin_line, .. }
      | Opcode::Continue { origin_line }
      | Opcode::Break { origin_line }
      | Opcode::ExpressionStmt { origin_line, .. }
      | Opcode::Return { origin_line, .. }
      | Opcode::Delete { origin_line, .. } => origin_line,
    }
  }
}

fn validate_var_name(name: &str) -> Result<(), Error> {
  if name.contains('\'') || name.contains('"') {
    return Err(Error::syntax(format!("variable name \"{name}\" should not contain quotes")));
  }
  if name.contains('.') {
    return Err(Error::syntax(format!("variable name \"{name}\" should not contain a dot")));
  }
  if name.as_bytes().first().map_or(false, u8::is_ascii_digit) {
    return Err(Error::syntax(format!("variable name \"{name}\" should not start with a number")));
  }
  Ok(())
}

/// Parses a complete script into an ordered opcode list.
///
/// The caller's source is padded with a trailing newline before lexing
/// (mirroring the behaviour of the system this was distilled from), so
/// every statement — including the last — ends on a real `SEPARATE` token
/// rather than a bare EOF.
pub struct CodeParser<'a> {
  src: &'a str,
}

impl<'a> CodeParser<'a> {
  pub fn parse(src: &str) -> Result<Vec<Opcode>, Error> {
    let _span = tracing::debug_span!("parse").entered();
    let padded = format!("{src}\n");
    let tokens = Sentence::new(&padded).parse_all()?;
    let mut reader = Cursor::new(tokens);
    let parser = CodeParser { src: &padded };
    parser.parse_program(&mut reader)
  }

  fn origin_line(&self, tokens: &[Token], start_idx: usize, end_idx: usize) -> String {
    if tokens.is_empty() || start_idx >= end_idx.min(tokens.len()) {
      return String::new();
    }
    let start = tokens[start_idx].span.start;
    let end = tokens[end_idx.min(tokens.len()) - 1].span.end;
    self.src[start..end].trim().to_string()
  }

  fn wrap_here(&self, reader: &Cursor<Token>, start_idx: usize, err: Error) -> Error {
    diagnostic::wrap_syntax_tokens(self.src, reader.contents(), start_idx, reader.pointer(), err)
  }

  fn skip_separators(&self, reader: &mut Cursor<Token>) {
    loop {
      let pos = reader.pointer();
      match reader.read() {
        Some(tok) if tok.kind == TokenKind::Separate => continue,
        _ => {
          reader.set_pointer(pos);
          break;
        }
      }
    }
  }

  fn parse_program(&self, reader: &mut Cursor<Token>) -> Result<Vec<Opcode>, Error> {
    let mut ops = Vec::new();
    loop {
      self.skip_separators(reader);
      if reader.pointer() >= reader.contents().len() {
        break;
      }
      ops.push(self.parse_statement(reader)?);
    }
    Ok(ops)
  }

  /// Parses statements until one of `closers` is seen (left unconsumed) or
  /// EOF, in which case `eof_message` becomes the syntax error.
  fn parse_block_until(&self, reader: &mut Cursor<Token>, closers: &[TokenKind], eof_message: &str) -> Result<Vec<Opcode>, Error> {
    let mut body = Vec::new();
    loop {
      self.skip_separators(reader);
      let pos = reader.pointer();
      match reader.read() {
        None => return Err(Error::syntax(eof_message)),
        Some(tok) if closers.contains(&tok.kind) => {
          reader.set_pointer(pos);
          break;
        }
        Some(_) => {
          reader.set_pointer(pos);
          body.push(self.parse_statement(reader)?);
        }
      }
    }
    Ok(body)
  }

  /// Parses exactly one statement, wrapping any error (that isn't already
  /// formatted by a deeper recursive call) with the excerpt spanning from
  /// this statement's first token to wherever the cursor ended up.
  fn parse_statement(&self, reader: &mut Cursor<Token>) -> Result<Opcode, Error> {
    let start_idx = reader.pointer();
    self.parse_statement_inner(reader, start_idx).map_err(|e| self.wrap_here(reader, start_idx, e))
  }

  fn parse_statement_inner(&self, reader: &mut Cursor<Token>, start_idx: usize) -> Result<Opcode, Error> {
    match Expression::parse(reader, 0, Context::ASSIGN) {
      Ok(expr) => {
        let origin = self.origin_line(reader.contents(), start_idx, reader.pointer());
        Ok(Opcode::ExpressionStmt { expr, origin_line: origin })
      }
      Err(speculative_err) => {
        reader.set_pointer(start_idx);
        let head = reader.must_read()?;
        match head.kind {
          TokenKind::Word => match reader.read() {
            Some(tok) if tok.kind == TokenKind::Assign => {
              validate_var_name(&head.payload)?;
              let expr = Expression::parse(reader, 0, Context::ASSIGN)?;
              let origin = self.origin_line(reader.contents(), start_idx, reader.pointer());
              Ok(Opcode::Assign { name: head.payload, expr, origin_line: origin })
            }
            _ => Err(speculative_err),
          },
          TokenKind::KwDel => {
            let name_tok = reader.must_read()?;
            if name_tok.kind != TokenKind::Word {
              return Err(Error::syntax("\"del\" must be followed by a variable name"));
            }
            validate_var_name(&name_tok.payload)?;
            let sep = reader.must_read()?;
            if sep.kind != TokenKind::Separate {
              return Err(Error::syntax("expected end of statement after \"del NAME\""));
            }
            let origin = self.origin_line(reader.contents(), start_idx, reader.pointer());
            Ok(Opcode::Delete { name: name_tok.payload, origin_line: origin })
          }
          TokenKind::KwIf => self.parse_condition(reader, start_idx),
          TokenKind::KwFor => self.parse_for_loop(reader, start_idx),
          TokenKind::KwReturn => {
            let expr = Expression::parse(reader, 0, Context::ASSIGN)?;
            let origin = self.origin_line(reader.contents(), start_idx, reader.pointer());
            Ok(Opcode::Return { expr, origin_line: origin })
          }
          TokenKind::KwContinue => {
            let sep = reader.must_read()?;
            if sep.kind != TokenKind::Separate {
              return Err(Error::syntax("expected end of statement after \"continue\""));
            }
            let origin = self.origin_line(reader.contents(), start_idx, reader.pointer());
            Ok(Opcode::Continue { origin_line: origin })
          }
          TokenKind::KwBreak => {
            let sep = reader.must_read()?;
            if sep.kind != TokenKind::Separate {
              return Err(Error::syntax("expected end of statement after \"break\""));
            }
            let origin = self.origin_line(reader.contents(), start_idx, reader.pointer());
            Ok(Opcode::Break { origin_line: origin })
          }
          _ => Err(speculative_err),
        }
      }
    }
  }

  fn parse_condition(&self, reader: &mut Cursor<Token>, start_idx: usize) -> Result<Opcode, Error> {
    let _span = tracing::debug_span!("condition_block").entered();
    let cond = Expression::parse(reader, 0, Context::IF)?;
    let state_line = self.origin_line(reader.contents(), start_idx, reader.pointer());
    let body = self.parse_block_until(reader, &[TokenKind::KwElif, TokenKind::KwElse, TokenKind::KwFi], "If statement not closed with \"fi\"")?;
    let mut branches = vec![Branch { cond: Some(cond), state_line: state_line.clone(), body }];

    loop {
      let branch_start = reader.pointer();
      let head = reader.must_read()?;
      match head.kind {
        TokenKind::KwElif => {
          let cond = Expression::parse(reader, 0, Context::IF)?;
          let branch_state = self.origin_line(reader.contents(), branch_start, reader.pointer());
          let body =
            self.parse_block_until(reader, &[TokenKind::KwElif, TokenKind::KwElse, TokenKind::KwFi], "If statement not closed with \"fi\"")?;
          branches.push(Branch { cond: Some(cond), state_line: branch_state, body });
        }
        TokenKind::KwElse => {
          let colon = reader.must_read()?;
          if colon.kind != TokenKind::Colon {
            return Err(Error::syntax("\"else\" must be followed by \":\""));
          }
          let branch_state = self.origin_line(reader.contents(), branch_start, reader.pointer());
          let body = self.parse_block_until(reader, &[TokenKind::KwFi], "If statement not closed with \"fi\"")?;
          branches.push(Branch { cond: None, state_line: branch_state, body });
          let fi = reader.must_read()?;
          if fi.kind != TokenKind::KwFi {
            return Err(Error::syntax("If statement not closed with \"fi\""));
          }
          break;
        }
        TokenKind::KwFi => break,
        _ => return Err(Error::syntax("If statement not closed with \"fi\"")),
      }
    }

    Ok(Opcode::Condition { origin_line: state_line, branches })
  }

  fn parse_for_loop(&self, reader: &mut Cursor<Token>, start_idx: usize) -> Result<Opcode, Error> {
    let _span = tracing::debug_span!("for_loop_block").entered();
    let name_tok = reader.must_read()?;
    if name_tok.kind != TokenKind::Word {
      return Err(Error::syntax("for-loop variable must be an identifier"));
    }
    validate_var_name(&name_tok.payload)?;
    let comma = reader.must_read()?;
    if comma.kind != TokenKind::Comma {
      return Err(Error::syntax("for-loop variable must be followed by \",\""));
    }
    let count = Expression::parse(reader, 0, Context::FOR)?;
    let state_line = self.origin_line(reader.contents(), start_idx, reader.pointer());
    let body = self.parse_block_until(reader, &[TokenKind::KwRof], "For loop not closed with \"rof\"")?;
    let rof = reader.must_read()?;
    if rof.kind != TokenKind::KwRof {
      return Err(Error::syntax("For loop not closed with \"rof\""));
    }
    Ok(Opcode::ForLoop { var: name_tok.payload, count, state_line: state_line.clone(), body, origin_line: state_line })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_assign_and_return() {
    let ops = CodeParser::parse("x = 1\nreturn x\n").unwrap();
    assert!(matches!(ops[0], Opcode::Assign { .. }));
    assert!(matches!(ops[1], Opcode::Return { .. }));
  }

  #[test]
  fn bare_expression_is_recorded_as_expression_stmt() {
    let ops = CodeParser::parse("1 + 1\n").unwrap();
    assert!(matches!(ops[0], Opcode::ExpressionStmt { .. }));
  }

  #[test]
  fn if_elif_else_fi_parses_three_branches() {
    let ops = CodeParser::parse("if x > 1:\n  y = 1\nelif x == 1:\n  y = 2\nelse:\n  y = 3\nfi\n").unwrap();
    match &ops[0] {
      Opcode::Condition { branches, .. } => assert_eq!(branches.len(), 3),
      other => panic!("expected Condition, got {other:?}"),
    }
  }

  #[test]
  fn for_loop_parses_body_and_closer() {
    let ops = CodeParser::parse("for i, 5:\n  continue\nrof\n").unwrap();
    match &ops[0] {
      Opcode::ForLoop { var, body, .. } => {
        assert_eq!(var, "i");
        assert_eq!(body.len(), 1);
      }
      other => panic!("expected ForLoop, got {other:?}"),
    }
  }

  #[test]
  fn del_removes_statement_parses() {
    let ops = CodeParser::parse("x = 1\ndel x\n").unwrap();
    assert!(matches!(ops[1], Opcode::Delete { .. }));
  }

  #[test]
  fn unbalanced_if_is_syntax_error_with_excerpt() {
    let err = CodeParser::parse("if x > 1:\n  y = 1\n").unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("If statement not closed with \"fi\""));
    assert!(msg.contains(">>"));
  }

  #[test]
  fn assign_target_rejects_dotted_name() {
    let err = CodeParser::parse("a.b = 1\n").unwrap_err();
    assert!(err.to_string().contains("Syntax Error") || err.is_formatted());
  }
}
