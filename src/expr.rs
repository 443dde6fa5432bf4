//! The expression builder: linearisation (phase A) and operator compaction
//! by precedence (phase B).

use crate::diagnostic::Error;
use crate::reader::Cursor;
use crate::token::{Token, TokenKind};

/// Bitmask controlling which terminators are legal while linearising a
/// token run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Context(u8);

impl Context {
  pub const ASSIGN: Context = Context(1 << 0);
  pub const IF: Context = Context(1 << 1);
  pub const ARGUMENT: Context = Context(1 << 2);
  pub const SUB_EXPR: Context = Context(1 << 3);
  pub const BARRIER: Context = Context(1 << 4);
  pub const FOR: Context = Context(1 << 5);

  pub fn contains(self, other: Context) -> bool {
    self.0 & other.0 != 0
  }
}

impl std::ops::BitOr for Context {
  type Output = Context;
  fn bitor(self, rhs: Context) -> Context {
    Context(self.0 | rhs.0)
  }
}

/// Asserted/cast target type for `Cast`, `Ref`, and `func`-as-constructor
/// forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastType {
  Int,
  Bool,
  Float,
  Str,
}

impl CastType {
  pub fn name(self) -> &'static str {
    match self {
      CastType::Int => "int",
      CastType::Bool => "bool",
      CastType::Float => "float",
      CastType::Str => "str",
    }
  }
}

/// A node of the expression tree, or (only mid-linearisation) a bare
/// operator marker waiting to be compacted away. No `Op*` marker survives a
/// successful [`Expression::parse`].
#[derive(Debug, Clone)]
pub enum ExpressionElement {
  Int(i64),
  Bool(bool),
  Float(f64),
  Str(String),
  Var(String),
  Cast(CastType, Box<Expression>),
  Expr(Box<Expression>),
  Ref(CastType, Box<Expression>),
  Selector(Box<Expression>),
  Score(Box<Expression>, Box<Expression>),
  Command(Box<Expression>),
  Func(String, Vec<Expression>),

  Add(Vec<ExpressionElement>),
  Remove(Vec<ExpressionElement>),
  Times(Vec<ExpressionElement>),
  Divide(Vec<ExpressionElement>),
  And(Vec<ExpressionElement>),
  Or(Vec<ExpressionElement>),
  Eq(Box<ExpressionElement>, Box<ExpressionElement>),
  Neq(Box<ExpressionElement>, Box<ExpressionElement>),
  Lt(Box<ExpressionElement>, Box<ExpressionElement>),
  Gt(Box<ExpressionElement>, Box<ExpressionElement>),
  Le(Box<ExpressionElement>, Box<ExpressionElement>),
  Ge(Box<ExpressionElement>, Box<ExpressionElement>),
  In(Box<ExpressionElement>, Box<ExpressionElement>),
  Inverse(Box<ExpressionElement>),

  OpAdd,
  OpRemove,
  OpTimes,
  OpDivide,
  OpAnd,
  OpOr,
  OpEq,
  OpNeq,
  OpLt,
  OpGt,
  OpLe,
  OpGe,
  OpIn,
  OpInverse,
}

/// A wrapper holding exactly one top-level element after compaction.
#[derive(Debug, Clone)]
pub struct Expression {
  pub element: ExpressionElement,
}

impl Expression {
  /// Runs both phases: linearise the token run under `context`, then
  /// compact by precedence. Fails if the residual length isn't exactly 1.
  pub fn parse(reader: &mut Cursor<Token>, layer: u32, context: Context) -> Result<Expression, Error> {
    let elements = linearize(reader, layer, context)?;

    let elements = compact_operator(elements, is_op_divide, false, |ops| Ok(ExpressionElement::Divide(ops)))?;
    let elements = compact_operator(elements, is_op_times, false, |ops| Ok(ExpressionElement::Times(ops)))?;
    let elements = compact_operator(elements, is_op_remove, true, |ops| Ok(ExpressionElement::Remove(ops)))?;
    let elements = compact_operator(elements, is_op_add, true, |ops| Ok(ExpressionElement::Add(ops)))?;

    let elements = compact_operator(elements, is_op_gt, false, |ops| binary(ops, ExpressionElement::Gt, ">"))?;
    let elements = compact_operator(elements, is_op_lt, false, |ops| binary(ops, ExpressionElement::Lt, "<"))?;
    let elements = compact_operator(elements, is_op_ge, false, |ops| binary(ops, ExpressionElement::Ge, ">="))?;
    let elements = compact_operator(elements, is_op_le, false, |ops| binary(ops, ExpressionElement::Le, "<="))?;
    let elements = compact_operator(elements, is_op_eq, false, |ops| binary(ops, ExpressionElement::Eq, "=="))?;
    let elements = compact_operator(elements, is_op_neq, false, |ops| binary(ops, ExpressionElement::Neq, "!="))?;
    let elements = compact_operator(elements, is_op_in, false, |ops| binary(ops, ExpressionElement::In, "in"))?;

    let elements = compact_inverse(elements)?;

    let elements = compact_operator(elements, is_op_and, false, |ops| Ok(ExpressionElement::And(ops)))?;
    let mut elements = compact_operator(elements, is_op_or, false, |ops| Ok(ExpressionElement::Or(ops)))?;

    if elements.len() != 1 {
      return Err(Error::syntax("parse: Syntax error: Invalid compression (failed to compact the compression)"));
    }
    Ok(Expression { element: elements.remove(0) })
  }
}

fn binary(
  mut ops: Vec<ExpressionElement>,
  ctor: fn(Box<ExpressionElement>, Box<ExpressionElement>) -> ExpressionElement,
  op_name: &str,
) -> Result<ExpressionElement, Error> {
  if ops.len() != 2 {
    return Err(Error::syntax(format!(
      "Only 2 parameters are accepted for operator \"{op_name}\"; got {}",
      ops.len()
    )));
  }
  let b = ops.pop().unwrap();
  let a = ops.pop().unwrap();
  Ok(ctor(Box::new(a), Box::new(b)))
}

fn is_op_add(e: &ExpressionElement) -> bool {
  matches!(e, ExpressionElement::OpAdd)
}
fn is_op_remove(e: &ExpressionElement) -> bool {
  matches!(e, ExpressionElement::OpRemove)
}
fn is_op_times(e: &ExpressionElement) -> bool {
  matches!(e, ExpressionElement::OpTimes)
}
fn is_op_divide(e: &ExpressionElement) -> bool {
  matches!(e, ExpressionElement::OpDivide)
}
fn is_op_and(e: &ExpressionElement) -> bool {
  matches!(e, ExpressionElement::OpAnd)
}
fn is_op_or(e: &ExpressionElement) -> bool {
  matches!(e, ExpressionElement::OpOr)
}
fn is_op_eq(e: &ExpressionElement) -> bool {
  matches!(e, ExpressionElement::OpEq)
}
fn is_op_neq(e: &ExpressionElement) -> bool {
  matches!(e, ExpressionElement::OpNeq)
}
fn is_op_lt(e: &ExpressionElement) -> bool {
  matches!(e, ExpressionElement::OpLt)
}
fn is_op_gt(e: &ExpressionElement) -> bool {
  matches!(e, ExpressionElement::OpGt)
}
fn is_op_le(e: &ExpressionElement) -> bool {
  matches!(e, ExpressionElement::OpLe)
}
fn is_op_ge(e: &ExpressionElement) -> bool {
  matches!(e, ExpressionElement::OpGe)
}
fn is_op_in(e: &ExpressionElement) -> bool {
  matches!(e, ExpressionElement::OpIn)
}

/// Every non-marker element satisfies the is-variable predicate: literal,
/// `Var`, `Cast`, `Expr`, barrier form, function call, or an
/// already-compacted operator node.
fn is_operand(e: &ExpressionElement) -> bool {
  !matches!(
    e,
    ExpressionElement::OpAdd
      | ExpressionElement::OpRemove
      | ExpressionElement::OpTimes
      | ExpressionElement::OpDivide
      | ExpressionElement::OpAnd
      | ExpressionElement::OpOr
      | ExpressionElement::OpEq
      | ExpressionElement::OpNeq
      | ExpressionElement::OpLt
      | ExpressionElement::OpGt
      | ExpressionElement::OpLe
      | ExpressionElement::OpGe
      | ExpressionElement::OpIn
      | ExpressionElement::OpInverse
  )
}

/// The generic left-associative compaction pass shared by every binary
/// precedence level. `unary_signs` additionally injects a synthetic
/// `Int(0)` ahead of a `+`/`-` marker with no operand to its left (only
/// ever set for `Add`/`Remove`).
fn compact_operator(
  elements: Vec<ExpressionElement>,
  is_marker: fn(&ExpressionElement) -> bool,
  unary_signs: bool,
  build: impl Fn(Vec<ExpressionElement>) -> Result<ExpressionElement, Error>,
) -> Result<Vec<ExpressionElement>, Error> {
  let mut reader = Cursor::new(elements);
  let mut output: Vec<ExpressionElement> = Vec::new();

  loop {
    let element = match reader.read() {
      Some(e) => e,
      None => break,
    };
    if !is_marker(&element) {
      output.push(element);
      continue;
    }
    output.pop();

    if unary_signs {
      if reader.pointer() > 1 {
        reader.unread()?;
        reader.unread()?;
        let preceding = reader.must_read()?;
        if !is_operand(&preceding) {
          let at = reader.pointer();
          reader.insert(at, ExpressionElement::Int(0));
          reader.must_read()?;
          reader.must_read()?;
          output.push(preceding);
        } else {
          reader.must_read()?;
        }
      } else {
        reader.insert(0, ExpressionElement::Int(0));
        reader.must_read()?;
      }
    }

    let mut operands: Vec<ExpressionElement> = Vec::new();
    loop {
      reader.unread()?;
      reader.unread()?;
      let a = reader.must_read()?;
      reader.must_read()?;
      let b = reader.must_read()?;

      if !is_operand(&a) {
        return Err(Error::compaction("operand slot occupied by a non-operand element"));
      }
      if !is_operand(&b) {
        return Err(Error::compaction("operand slot occupied by a non-operand element"));
      }
      if operands.is_empty() {
        operands.push(a);
      }
      operands.push(b);

      match reader.read() {
        Some(next) if is_marker(&next) => continue,
        next => {
          output.push(build(operands)?);
          if next.is_some() {
            reader.unread()?;
          }
          break;
        }
      }
    }
  }

  Ok(output)
}

/// `not` is a prefix unary operator, compacted in its own pass (not via
/// [`compact_operator`], which only models left-associative binary forms).
fn compact_inverse(elements: Vec<ExpressionElement>) -> Result<Vec<ExpressionElement>, Error> {
  let mut reader = Cursor::new(elements);
  let mut output = Vec::new();
  loop {
    let element = match reader.read() {
      Some(e) => e,
      None => break,
    };
    if matches!(element, ExpressionElement::OpInverse) {
      let operand = reader.must_read()?;
      output.push(ExpressionElement::Inverse(Box::new(operand)));
    } else {
      output.push(element);
    }
  }
  Ok(output)
}

/// Phase A: accumulate elements from the token cursor until a
/// context-permitted terminator is reached.
fn linearize(reader: &mut Cursor<Token>, layer: u32, context: Context) -> Result<Vec<ExpressionElement>, Error> {
  let mut out = Vec::new();
  loop {
    let token = reader.must_read()?;
    match token.kind {
      TokenKind::Word => out.push(classify_word(&token)?),
      TokenKind::StringLit => out.push(ExpressionElement::Str(token.payload.clone())),
      TokenKind::KwTrue => out.push(ExpressionElement::Bool(true)),
      TokenKind::KwFalse => out.push(ExpressionElement::Bool(false)),

      TokenKind::Assign => {
        let sub = reader.must_read()?;
        if sub.kind != TokenKind::Assign {
          return Err(Error::syntax("\"=\" must be followed by \"=\" to form the equality operator"));
        }
        out.push(ExpressionElement::OpEq);
      }
      TokenKind::Bang => {
        let sub = reader.must_read()?;
        if sub.kind != TokenKind::Assign {
          return Err(Error::syntax("\"!\" must be followed by \"=\" to form the inequality operator"));
        }
        out.push(ExpressionElement::OpNeq);
      }
      TokenKind::Lt => {
        let sub = reader.must_read()?;
        if sub.kind == TokenKind::Assign {
          out.push(ExpressionElement::OpLe);
        } else {
          out.push(ExpressionElement::OpLt);
          reader.unread()?;
        }
      }
      TokenKind::Gt => {
        let sub = reader.must_read()?;
        if sub.kind == TokenKind::Assign {
          out.push(ExpressionElement::OpGe);
        } else {
          out.push(ExpressionElement::OpGt);
          reader.unread()?;
        }
      }

      TokenKind::Plus => out.push(ExpressionElement::OpAdd),
      TokenKind::Minus => out.push(ExpressionElement::OpRemove),
      TokenKind::Star => out.push(ExpressionElement::OpTimes),
      TokenKind::Slash => out.push(ExpressionElement::OpDivide),
      TokenKind::KwAnd => out.push(ExpressionElement::OpAnd),
      TokenKind::KwOr => out.push(ExpressionElement::OpOr),
      TokenKind::KwNot => out.push(ExpressionElement::OpInverse),
      TokenKind::KwIn => out.push(ExpressionElement::OpIn),

      TokenKind::LeftBarrier => out.push(parse_barrier(reader)?),
      TokenKind::RightBarrier => {
        if !context.contains(Context::BARRIER) {
          return Err(Error::syntax("\"}\" can only be used to close a barrier expression"));
        }
        break;
      }
      TokenKind::Colon => {
        if !context.contains(Context::IF | Context::FOR) {
          return Err(Error::syntax("\":\" can only be used to close a condition or for-loop head"));
        }
        break;
      }
      TokenKind::LeftParen => {
        let sub = Expression::parse(reader, layer + 1, Context::SUB_EXPR)?;
        out.push(ExpressionElement::Expr(Box::new(sub)));
      }
      TokenKind::RightParen => {
        if !context.contains(Context::SUB_EXPR) && !context.contains(Context::ARGUMENT) {
          return Err(Error::syntax("\")\" not permitted here"));
        }
        if layer == 0 {
          return Err(Error::syntax("Bracket closed incorrectly"));
        }
        break;
      }
      TokenKind::Comma => {
        if !context.contains(Context::ARGUMENT) && !context.contains(Context::BARRIER) {
          return Err(Error::syntax("\",\" not permitted here"));
        }
        break;
      }
      TokenKind::Separate => {
        if !context.contains(Context::ASSIGN | Context::FOR) {
          return Err(Error::syntax("Incomplete expression before end of statement"));
        }
        break;
      }

      TokenKind::KwInt => out.push(parse_cast(reader, layer, CastType::Int)?),
      TokenKind::KwBool => out.push(parse_cast(reader, layer, CastType::Bool)?),
      TokenKind::KwStr => out.push(parse_cast(reader, layer, CastType::Str)?),
      TokenKind::KwFloat => out.push(parse_cast(reader, layer, CastType::Float)?),

      TokenKind::KwRef => return Err(Error::syntax("\"ref\" can only be used inside a {ref,...} barrier")),
      TokenKind::KwSelector => return Err(Error::syntax("\"selector\" can only be used inside a {selector,...} barrier")),
      TokenKind::KwScore => return Err(Error::syntax("\"score\" can only be used inside a {score,...} barrier")),
      TokenKind::KwCommand => return Err(Error::syntax("\"command\" can only be used inside a {command,...} barrier")),
      TokenKind::KwFunc => return Err(Error::syntax("\"func\" can only be used inside a {func,...} barrier")),
      TokenKind::KwReturn => return Err(Error::syntax("\"return\" is not a valid expression token")),
      TokenKind::KwIf => return Err(Error::syntax("\"if\" is not a valid expression token")),
      TokenKind::KwElse => return Err(Error::syntax("\"else\" is not a valid expression token")),
      TokenKind::KwElif => return Err(Error::syntax("\"elif\" is not a valid expression token")),
      TokenKind::KwFi => return Err(Error::syntax("\"fi\" is not a valid expression token")),
      TokenKind::KwFor | TokenKind::KwContinue | TokenKind::KwBreak | TokenKind::KwRof | TokenKind::KwDel => {
        return Err(Error::syntax("statement keyword is not a valid expression token"));
      }
    }
  }
  Ok(out)
}

/// `WORD` containing a `.` must parse as a float (no silent fallback to
/// `Var`); otherwise try int, then fall back to a validated identifier.
fn classify_word(token: &Token) -> Result<ExpressionElement, Error> {
  if token.payload.contains('.') {
    let v: f64 = token
      .payload
      .parse()
      .map_err(|_| Error::syntax(format!("invalid float literal \"{}\"", token.payload)))?;
    return Ok(ExpressionElement::Float(v));
  }
  if let Ok(i) = token.payload.parse::<i64>() {
    return Ok(ExpressionElement::Int(i));
  }
  try_parse_var(token)
}

fn try_parse_var(token: &Token) -> Result<ExpressionElement, Error> {
  if token.payload.contains('\'') || token.payload.contains('"') {
    return Err(Error::syntax(format!("variable name \"{}\" should not contain quotes", token.payload)));
  }
  if token.payload.as_bytes().first().map_or(false, u8::is_ascii_digit) {
    return Err(Error::syntax(format!("variable name \"{}\" should not start with a number", token.payload)));
  }
  Ok(ExpressionElement::Var(token.payload.clone()))
}

fn parse_cast(reader: &mut Cursor<Token>, layer: u32, cast: CastType) -> Result<ExpressionElement, Error> {
  let open = reader.must_read()?;
  if open.kind != TokenKind::LeftParen {
    return Err(Error::syntax(format!("\"{}\" cast must be followed by \"(\"", cast.name())));
  }
  let inner = Expression::parse(reader, layer + 1, Context::SUB_EXPR)?;
  reader.unread()?;
  let close = reader.must_read()?;
  if close.kind != TokenKind::RightParen {
    return Err(Error::syntax(format!("\"{}\" cast not closed with \")\"", cast.name())));
  }
  Ok(ExpressionElement::Cast(cast, Box::new(inner)))
}

fn expect_comma(reader: &mut Cursor<Token>) -> Result<(), Error> {
  let t = reader.must_read()?;
  if t.kind != TokenKind::Comma {
    return Err(Error::syntax("expected \",\" inside barrier expression"));
  }
  Ok(())
}

fn parse_barrier(reader: &mut Cursor<Token>) -> Result<ExpressionElement, Error> {
  let head = reader.must_read()?;
  let element = match head.kind {
    TokenKind::KwRef => parse_ref(reader)?,
    TokenKind::KwSelector => parse_selector(reader)?,
    TokenKind::KwScore => parse_score(reader)?,
    TokenKind::KwCommand => parse_command(reader)?,
    TokenKind::KwFunc => parse_func(reader)?,
    _ => return Err(Error::syntax("barrier expression must start with ref/selector/score/command/func")),
  };
  let close = reader.must_read()?;
  if close.kind != TokenKind::RightBarrier {
    return Err(Error::syntax("barrier expression not closed with \"}\""));
  }
  Ok(element)
}

fn parse_ref(reader: &mut Cursor<Token>) -> Result<ExpressionElement, Error> {
  expect_comma(reader)?;
  let ty_tok = reader.must_read()?;
  let ty = match ty_tok.kind {
    TokenKind::KwInt => CastType::Int,
    TokenKind::KwBool => CastType::Bool,
    TokenKind::KwFloat => CastType::Float,
    TokenKind::KwStr => CastType::Str,
    _ => return Err(Error::syntax("type of {ref,...} must be int/bool/float/str")),
  };
  expect_comma(reader)?;
  let expr = Expression::parse(reader, 1, Context::BARRIER)?;
  reader.unread()?;
  Ok(ExpressionElement::Ref(ty, Box::new(expr)))
}

fn parse_selector(reader: &mut Cursor<Token>) -> Result<ExpressionElement, Error> {
  expect_comma(reader)?;
  let expr = Expression::parse(reader, 1, Context::BARRIER)?;
  reader.unread()?;
  Ok(ExpressionElement::Selector(Box::new(expr)))
}

fn parse_score(reader: &mut Cursor<Token>) -> Result<ExpressionElement, Error> {
  expect_comma(reader)?;
  let target = Expression::parse(reader, 1, Context::BARRIER)?;
  reader.unread()?;
  expect_comma(reader)?;
  let scoreboard = Expression::parse(reader, 1, Context::BARRIER)?;
  reader.unread()?;
  Ok(ExpressionElement::Score(Box::new(target), Box::new(scoreboard)))
}

fn parse_command(reader: &mut Cursor<Token>) -> Result<ExpressionElement, Error> {
  expect_comma(reader)?;
  let expr = Expression::parse(reader, 1, Context::BARRIER)?;
  reader.unread()?;
  Ok(ExpressionElement::Command(Box::new(expr)))
}

fn parse_func(reader: &mut Cursor<Token>) -> Result<ExpressionElement, Error> {
  expect_comma(reader)?;
  let name_tok = reader.must_read()?;
  let name = match name_tok.kind {
    TokenKind::KwInt => "int".to_string(),
    TokenKind::KwBool => "bool".to_string(),
    TokenKind::KwFloat => "float".to_string(),
    TokenKind::KwStr => "str".to_string(),
    TokenKind::Word => name_tok.payload.clone(),
    _ => return Err(Error::syntax("invalid function name in {func,...} barrier")),
  };
  let open = reader.must_read()?;
  if open.kind != TokenKind::LeftParen {
    return Err(Error::syntax("function name must be followed by \"(\""));
  }

  let mut args = Vec::new();
  let peek = reader.must_read()?;
  if peek.kind != TokenKind::RightParen {
    reader.unread()?;
    loop {
      let arg = Expression::parse(reader, 1, Context::ARGUMENT)?;
      args.push(arg);
      reader.unread()?;
      let terminator = reader.must_read()?;
      if terminator.kind == TokenKind::RightParen {
        break;
      }
    }
  }
  Ok(ExpressionElement::Func(name, args))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::token::Sentence;

  fn parse_expr(src: &str) -> ExpressionElement {
    let tokens = Sentence::new(src).parse_all().unwrap();
    let mut reader = Cursor::new(tokens);
    Expression::parse(&mut reader, 0, Context::ASSIGN).unwrap().element
  }

  #[test]
  fn precedence_times_before_add() {
    match parse_expr("1 + 2 * 3\n") {
      ExpressionElement::Add(ops) => assert_eq!(ops.len(), 2),
      other => panic!("expected Add, got {other:?}"),
    }
  }

  #[test]
  fn unary_minus_injects_zero() {
    match parse_expr("-3 + 5\n") {
      ExpressionElement::Add(ops) => {
        assert_eq!(ops.len(), 2);
        match &ops[0] {
          ExpressionElement::Remove(inner) => {
            assert!(matches!(inner[0], ExpressionElement::Int(0)));
            assert!(matches!(inner[1], ExpressionElement::Int(3)));
          }
          other => panic!("expected Remove, got {other:?}"),
        }
      }
      other => panic!("expected Add, got {other:?}"),
    }
  }

  #[test]
  fn chained_comparison_is_rejected() {
    let tokens = Sentence::new("a == b == c\n").parse_all().unwrap();
    let mut reader = Cursor::new(tokens);
    assert!(Expression::parse(&mut reader, 0, Context::ASSIGN).is_err());
  }

  #[test]
  fn not_binds_tighter_than_and() {
    match parse_expr("not True and False\n") {
      ExpressionElement::And(ops) => {
        assert!(matches!(ops[0], ExpressionElement::Inverse(_)));
      }
      other => panic!("expected And, got {other:?}"),
    }
  }

  #[test]
  fn compaction_leaves_single_root() {
    let tokens = Sentence::new("1 + 2\n").parse_all().unwrap();
    let mut reader = Cursor::new(tokens);
    let expr = Expression::parse(&mut reader, 0, Context::ASSIGN).unwrap();
    assert!(matches!(expr.element, ExpressionElement::Add(_)));
  }

  #[test]
  fn barrier_ref_parses() {
    match parse_expr("{ref, bool, 0}\n") {
      ExpressionElement::Ref(CastType::Bool, _) => {}
      other => panic!("expected Ref, got {other:?}"),
    }
  }

  #[test]
  fn barrier_selector_parses() {
    match parse_expr("{selector, '@a'}\n") {
      ExpressionElement::Selector(_) => {}
      other => panic!("expected Selector, got {other:?}"),
    }
  }

  #[test]
  fn barrier_score_parses_two_operands() {
    match parse_expr("{score, '@p', 'kills'}\n") {
      ExpressionElement::Score(_, _) => {}
      other => panic!("expected Score, got {other:?}"),
    }
  }

  #[test]
  fn barrier_command_parses() {
    match parse_expr("{command, 'say hi'}\n") {
      ExpressionElement::Command(_) => {}
      other => panic!("expected Command, got {other:?}"),
    }
  }

  #[test]
  fn bare_ref_outside_barrier_is_syntax_error() {
    let tokens = Sentence::new("ref\n").parse_all().unwrap();
    let mut reader = Cursor::new(tokens);
    assert!(Expression::parse(&mut reader, 0, Context::ASSIGN).is_err());
  }

  #[test]
  fn func_call_parses_arguments() {
    match parse_expr("{func, foo, (1, 2)}\n") {
      ExpressionElement::Func(name, args) => {
        assert_eq!(name, "foo");
        assert_eq!(args.len(), 2);
      }
      other => panic!("expected Func, got {other:?}"),
    }
  }
}
