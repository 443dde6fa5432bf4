//! The tree-walking evaluator (`spec.md` §4.6): `CodeRunner` walks an
//! opcode list, maintains a flat variable environment, and returns the
//! script's final value.

use indexmap::IndexMap;

use crate::diagnostic::{self, Error};
use crate::expr::{CastType, Expression, ExpressionElement};
use crate::host::{BuiltInFunction, GameInteract};
use crate::parse::{Branch, Opcode};
use crate::value::{self, Scalar};

/// The four control states an opcode can leave its caller in.
enum ControlState {
  KeepRunning,
  LoopContinue,
  LoopBreak,
  CodeReturn(Scalar),
}

/// Per-run environment: a flat name→scalar map (loop counters overwrite any
/// prior variable of the same name) plus the "last value" recorded by the
/// most recent bare-expression statement.
struct Env {
  variables: IndexMap<String, Scalar>,
  last_value: Option<Scalar>,
}

/// Walks a parsed opcode list. Holds no state between calls: `run` builds a
/// fresh [`Env`], evaluates, and discards it on every exit path.
pub struct CodeRunner;

impl CodeRunner {
  pub fn new() -> Self {
    CodeRunner
  }

  /// Runs `opcodes` against `host`/`registry` and returns the script's
  /// value. If `require_return` is set, a script that never executes a
  /// `Return` and never records a last value from a bare expression
  /// statement is an error.
  pub fn run(&self, opcodes: &[Opcode], host: &GameInteract, registry: &BuiltInFunction, require_return: bool) -> Result<Scalar, Error> {
    let _span = tracing::debug_span!("run", require_return).entered();
    let mut env = Env { variables: IndexMap::new(), last_value: None };

    for op in opcodes {
      tracing::trace!(kind = opcode_kind(op), "dispatch");
      let result = self.run_opcode(op, &mut env, host, registry);
      let state = match result {
        Ok(s) => s,
        Err(e) => {
          tracing::warn!(error = %e, "run failed");
          return Err(e);
        }
      };
      match state {
        ControlState::KeepRunning => continue,
        ControlState::CodeReturn(v) => return Ok(v),
        ControlState::LoopContinue => {
          let e = diagnostic::wrap_runtime(op.origin_line(), Error::runtime("\"continue\" used outside of a loop"));
          tracing::warn!(error = %e, "run failed");
          return Err(e);
        }
        ControlState::LoopBreak => {
          let e = diagnostic::wrap_runtime(op.origin_line(), Error::runtime("\"break\" used outside of a loop"));
          tracing::warn!(error = %e, "run failed");
          return Err(e);
        }
      }
    }

    match env.last_value {
      Some(v) => Ok(v),
      None if require_return => Err(diagnostic::wrap_runtime_terminal(Error::runtime("No return value after running the code"))),
      None => Ok(Scalar::Int(0)),
    }
  }

  fn run_opcode(&self, op: &Opcode, env: &mut Env, host: &GameInteract, registry: &BuiltInFunction) -> Result<ControlState, Error> {
    match op {
      Opcode::Assign { name, expr, origin_line } => {
        let v = eval_expr(expr, env, host, registry).map_err(|e| diagnostic::wrap_runtime(origin_line, e))?;
        env.variables.insert(name.clone(), v);
        Ok(ControlState::KeepRunning)
      }
      Opcode::Delete { name, origin_line: _ } => {
        env.variables.remove(name);
        Ok(ControlState::KeepRunning)
      }
      Opcode::ExpressionStmt { expr, origin_line } => {
        let v = eval_expr(expr, env, host, registry).map_err(|e| diagnostic::wrap_runtime(origin_line, e))?;
        env.last_value = Some(v);
        Ok(ControlState::KeepRunning)
      }
      Opcode::Return { expr, origin_line } => {
        let v = eval_expr(expr, env, host, registry).map_err(|e| diagnostic::wrap_runtime(origin_line, e))?;
        Ok(ControlState::CodeReturn(v))
      }
      Opcode::Continue { origin_line: _ } => Ok(ControlState::LoopContinue),
      Opcode::Break { origin_line: _ } => Ok(ControlState::LoopBreak),
      Opcode::Condition { branches, origin_line: _ } => self.run_condition(branches, env, host, registry),
      Opcode::ForLoop { var, count, state_line, body, origin_line: _ } => self.run_for_loop(var, count, state_line, body, env, host, registry),
    }
  }

  /// For the first branch whose condition evaluates truthy (or the final
  /// `else`), runs its body and propagates the control state upward; other
  /// branches are skipped entirely (including their conditions).
  fn run_condition(&self, branches: &[Branch], env: &mut Env, host: &GameInteract, registry: &BuiltInFunction) -> Result<ControlState, Error> {
    for branch in branches {
      let matched = match &branch.cond {
        Some(cond) => {
          let v = eval_expr(cond, env, host, registry)
            .map_err(|e| diagnostic::wrap_runtime_condition(&branch.state_line, None, e))?;
          v.truthy()
        }
        None => true,
      };
      if !matched {
        continue;
      }
      for stmt in &branch.body {
        let state = self
          .run_opcode(stmt, env, host, registry)
          .map_err(|e| diagnostic::wrap_runtime_condition(&branch.state_line, Some(stmt.origin_line()), e))?;
        if !matches!(state, ControlState::KeepRunning) {
          return Ok(state);
        }
      }
      return Ok(ControlState::KeepRunning);
    }
    Ok(ControlState::KeepRunning)
  }

  /// The count expression must evaluate to a non-bool int; the iterator
  /// variable is assigned `0..count-1`. `LOOP_CONTINUE` breaks the inner
  /// statement loop and advances the outer `for`; `LOOP_BREAK` stops the
  /// loop entirely and becomes `KEEP_RUNNING` to the caller; `CODE_RETURN`
  /// propagates straight through.
  #[allow(clippy::too_many_arguments)]
  fn run_for_loop(
    &self,
    var: &str,
    count: &Expression,
    state_line: &str,
    body: &[Opcode],
    env: &mut Env,
    host: &GameInteract,
    registry: &BuiltInFunction,
  ) -> Result<ControlState, Error> {
    let count_v =
      eval_expr(count, env, host, registry).map_err(|e| diagnostic::wrap_runtime_for_loop(state_line, None, e))?;
    let n = match count_v {
      Scalar::Bool(_) => {
        return Err(diagnostic::wrap_runtime_for_loop(state_line, None, Error::runtime("for-loop count must not be a bool")));
      }
      Scalar::Int(n) => n,
      other => {
        return Err(diagnostic::wrap_runtime_for_loop(
          state_line,
          None,
          Error::runtime(format!("for-loop count must be an int, got {}", other.type_name())),
        ));
      }
    };

    for i in 0..n {
      env.variables.insert(var.to_string(), Scalar::Int(i));
      for stmt in body {
        let state = self
          .run_opcode(stmt, env, host, registry)
          .map_err(|e| diagnostic::wrap_runtime_for_loop(state_line, Some(stmt.origin_line()), e))?;
        match state {
          ControlState::KeepRunning => continue,
          ControlState::LoopContinue => break,
          ControlState::LoopBreak => return Ok(ControlState::KeepRunning),
          ControlState::CodeReturn(v) => return Ok(ControlState::CodeReturn(v)),
        }
      }
    }
    Ok(ControlState::KeepRunning)
  }
}

impl Default for CodeRunner {
  fn default() -> Self {
    Self::new()
  }
}

fn opcode_kind(op: &Opcode) -> &'static str {
  match op {
    Opcode::Assign { .. } => "assign",
    Opcode::Delete { .. } => "delete",
    Opcode::Condition { .. } => "condition",
    Opcode::ForLoop { .. } => "for_loop",
    Opcode::Continue { .. } => "continue",
    Opcode::Break { .. } => "break",
    Opcode::ExpressionStmt { .. } => "expression",
    Opcode::Return { .. } => "return",
  }
}

fn eval_expr(expr: &Expression, env: &mut Env, host: &GameInteract, registry: &BuiltInFunction) -> Result<Scalar, Error> {
  eval_element(&expr.element, env, host, registry)
}

fn cast_type_from_name(name: &str) -> Option<CastType> {
  Some(match name {
    "int" => CastType::Int,
    "bool" => CastType::Bool,
    "float" => CastType::Float,
    "str" => CastType::Str,
    _ => return None,
  })
}

fn expect_str<'a>(v: &'a Scalar, what: &str) -> Result<&'a str, Error> {
  match v {
    Scalar::Str(s) => Ok(s.as_str()),
    other => Err(Error::runtime(format!("{what} requires a string argument, got {}", other.type_name()))),
  }
}

fn fold_left(
  ops: &[ExpressionElement],
  env: &mut Env,
  host: &GameInteract,
  registry: &BuiltInFunction,
  op: fn(&Scalar, &Scalar) -> Result<Scalar, Error>,
) -> Result<Scalar, Error> {
  let mut iter = ops.iter();
  let first = iter.next().ok_or_else(|| Error::runtime("internal: operator node with no operands"))?;
  let mut acc = eval_element(first, env, host, registry)?;
  for next in iter {
    let v = eval_element(next, env, host, registry)?;
    acc = op(&acc, &v)?;
  }
  Ok(acc)
}

fn eval_element(el: &ExpressionElement, env: &mut Env, host: &GameInteract, registry: &BuiltInFunction) -> Result<Scalar, Error> {
  match el {
    ExpressionElement::Int(v) => Ok(Scalar::Int(*v)),
    ExpressionElement::Bool(v) => Ok(Scalar::Bool(*v)),
    ExpressionElement::Float(v) => Ok(Scalar::Float(*v)),
    ExpressionElement::Str(v) => Ok(Scalar::Str(v.clone())),

    ExpressionElement::Var(name) => env
      .variables
      .get(name)
      .cloned()
      .ok_or_else(|| Error::runtime(format!("variable \"{name}\" used before assignment"))),

    ExpressionElement::Cast(ty, inner) => {
      let v = eval_expr(inner, env, host, registry)?;
      v.cast(*ty)
    }
    ExpressionElement::Expr(inner) => eval_expr(inner, env, host, registry),

    ExpressionElement::Ref(ty, inner) => {
      let idx_v = eval_expr(inner, env, host, registry)?;
      let idx = match idx_v {
        Scalar::Int(i) => i,
        other => return Err(Error::runtime(format!("{{ref,...}} index must be an int, got {}", other.type_name()))),
      };
      let v = host.ref_at(idx)?;
      v.assert_kind(*ty)?;
      Ok(v)
    }
    ExpressionElement::Selector(inner) => {
      let v = eval_expr(inner, env, host, registry)?;
      let target = expect_str(&v, "{selector,...}")?;
      Ok(Scalar::Str(host.selector(target)?))
    }
    ExpressionElement::Score(target, scoreboard) => {
      let tv = eval_expr(target, env, host, registry)?;
      let target_s = expect_str(&tv, "{score,...} target")?.to_string();
      let sv = eval_expr(scoreboard, env, host, registry)?;
      let sb_s = expect_str(&sv, "{score,...} scoreboard")?;
      Ok(Scalar::Int(host.score(&target_s, sb_s)?))
    }
    ExpressionElement::Command(inner) => {
      let v = eval_expr(inner, env, host, registry)?;
      let cmd = expect_str(&v, "{command,...}")?;
      Ok(Scalar::Int(host.command(cmd)?))
    }
    ExpressionElement::Func(name, args) => {
      if let Some(ty) = cast_type_from_name(name) {
        if args.len() != 1 {
          return Err(Error::runtime(format!("\"{name}\" expects exactly 1 argument, got {}", args.len())));
        }
        let v = eval_expr(&args[0], env, host, registry)?;
        return v.cast(ty);
      }
      let mut values = Vec::with_capacity(args.len());
      for a in args {
        values.push(eval_expr(a, env, host, registry)?);
      }
      registry.call(name, &values)
    }

    ExpressionElement::Add(ops) => fold_left(ops, env, host, registry, value::add),
    ExpressionElement::Remove(ops) => fold_left(ops, env, host, registry, value::sub),
    ExpressionElement::Times(ops) => fold_left(ops, env, host, registry, value::mul),
    ExpressionElement::Divide(ops) => fold_left(ops, env, host, registry, value::div),

    ExpressionElement::Eq(a, b) => {
      let av = eval_element(a, env, host, registry)?;
      let bv = eval_element(b, env, host, registry)?;
      Ok(Scalar::Bool(value::eq(&av, &bv)))
    }
    ExpressionElement::Neq(a, b) => {
      let av = eval_element(a, env, host, registry)?;
      let bv = eval_element(b, env, host, registry)?;
      Ok(Scalar::Bool(!value::eq(&av, &bv)))
    }
    ExpressionElement::Lt(a, b) => {
      let av = eval_element(a, env, host, registry)?;
      let bv = eval_element(b, env, host, registry)?;
      Ok(Scalar::Bool(value::compare(&av, &bv)?.is_lt()))
    }
    ExpressionElement::Gt(a, b) => {
      let av = eval_element(a, env, host, registry)?;
      let bv = eval_element(b, env, host, registry)?;
      Ok(Scalar::Bool(value::compare(&av, &bv)?.is_gt()))
    }
    ExpressionElement::Le(a, b) => {
      let av = eval_element(a, env, host, registry)?;
      let bv = eval_element(b, env, host, registry)?;
      Ok(Scalar::Bool(value::compare(&av, &bv)?.is_le()))
    }
    ExpressionElement::Ge(a, b) => {
      let av = eval_element(a, env, host, registry)?;
      let bv = eval_element(b, env, host, registry)?;
      Ok(Scalar::Bool(value::compare(&av, &bv)?.is_ge()))
    }
    ExpressionElement::In(a, b) => {
      let av = eval_element(a, env, host, registry)?;
      let bv = eval_element(b, env, host, registry)?;
      Ok(Scalar::Bool(value::contains(&av, &bv)?))
    }

    ExpressionElement::And(ops) => {
      for op in ops {
        let v = eval_element(op, env, host, registry)?;
        if !v.truthy() {
          return Ok(Scalar::Bool(false));
        }
      }
      Ok(Scalar::Bool(true))
    }
    ExpressionElement::Or(ops) => {
      for op in ops {
        let v = eval_element(op, env, host, registry)?;
        if v.truthy() {
          return Ok(Scalar::Bool(true));
        }
      }
      Ok(Scalar::Bool(false))
    }
    ExpressionElement::Inverse(inner) => {
      let v = eval_element(inner, env, host, registry)?;
      Ok(Scalar::Bool(!v.truthy()))
    }

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
    | ExpressionElement::OpInverse => Err(Error::runtime("internal: uncompacted operator marker reached the evaluator")),
  }
}

#[cfg(test)]
mod tests {
  use indoc::indoc;

  use super::*;
  use crate::parse::CodeParser;

  fn run(src: &str) -> Result<Scalar, Error> {
    let opcodes = CodeParser::parse(src).unwrap();
    CodeRunner::new().run(&opcodes, &GameInteract::new(), &BuiltInFunction::new(), true)
  }

  #[test]
  fn arithmetic_precedence() {
    assert_eq!(run("x = 1 + 2 * 3\nreturn x\n").unwrap(), Scalar::Int(7));
  }

  #[test]
  fn if_elif_else() {
    let src = indoc! {"
      y = 10
      if y > 5:
        y = y - 1
      elif y == 5:
        y = 0
      else:
        y = -1
      fi
      return y
    "};
    assert_eq!(run(src).unwrap(), Scalar::Int(9));
  }

  #[test]
  fn for_loop_with_continue() {
    let src = indoc! {"
      s = 0
      for i, 5:
        if i == 2:
          continue
        fi
        s = s + i
      rof
      return s
    "};
    assert_eq!(run(src).unwrap(), Scalar::Int(8));
  }

  #[test]
  fn string_concatenation() {
    assert_eq!(run("a = 'foo' + 'bar'\nreturn a\n").unwrap(), Scalar::Str("foobar".to_string()));
  }

  #[test]
  fn not_and_in_short_circuit_shape() {
    assert_eq!(run("return not (3 < 2) and (2 in 'a2b')\n").unwrap(), Scalar::Bool(true));
  }

  #[test]
  fn unary_minus_arithmetic() {
    assert_eq!(run("return -3 + 5\n").unwrap(), Scalar::Int(2));
  }

  #[test]
  fn ref_barrier_asserts_declared_type() {
    let opcodes = CodeParser::parse("return {ref, bool, 0}\n").unwrap();
    let host = GameInteract::new().with_ref(|_| Ok(Scalar::Bool(true)));
    let result = CodeRunner::new().run(&opcodes, &host, &BuiltInFunction::new(), true).unwrap();
    assert_eq!(result, Scalar::Bool(true));
  }

  #[test]
  fn ref_barrier_mismatched_type_is_runtime_error() {
    let opcodes = CodeParser::parse("return {ref, int, 0}\n").unwrap();
    let host = GameInteract::new().with_ref(|_| Ok(Scalar::Bool(true)));
    assert!(CodeRunner::new().run(&opcodes, &host, &BuiltInFunction::new(), true).is_err());
  }

  #[test]
  fn break_stops_loop_and_keeps_running_afterwards() {
    let src = "s = 0\nfor i, 10:\n  if i == 3:\n    break\n  fi\n  s = s + 1\nrof\nreturn s\n";
    assert_eq!(run(src).unwrap(), Scalar::Int(3));
  }

  #[test]
  fn continue_outside_loop_is_top_level_error() {
    let opcodes = CodeParser::parse("continue\n").unwrap();
    let err = CodeRunner::new().run(&opcodes, &GameInteract::new(), &BuiltInFunction::new(), false).unwrap_err();
    assert!(err.to_string().contains("outside of a loop"));
  }

  #[test]
  fn missing_return_is_error_when_required() {
    let opcodes = CodeParser::parse("x = 1\n").unwrap();
    let err = CodeRunner::new().run(&opcodes, &GameInteract::new(), &BuiltInFunction::new(), true).unwrap_err();
    assert!(err.to_string().contains("No return value"));
  }

  #[test]
  fn bare_expression_records_last_value_without_explicit_return() {
    let opcodes = CodeParser::parse("x = 1\nx + 1\n").unwrap();
    let v = CodeRunner::new().run(&opcodes, &GameInteract::new(), &BuiltInFunction::new(), true).unwrap();
    assert_eq!(v, Scalar::Int(2));
  }

  #[test]
  fn undefined_variable_is_runtime_error() {
    let opcodes = CodeParser::parse("return x\n").unwrap();
    let err = CodeRunner::new().run(&opcodes, &GameInteract::new(), &BuiltInFunction::new(), true).unwrap_err();
    assert!(err.to_string().contains("used before assignment"));
  }

  #[test]
  fn and_short_circuits_before_evaluating_right_operand() {
    use std::cell::Cell;
    use std::rc::Rc;

    let called = Rc::new(Cell::new(false));
    let called_inner = called.clone();
    let mut registry = BuiltInFunction::new();
    registry.register_static("mark", move |_| {
      called_inner.set(true);
      Ok(Scalar::Bool(true))
    });

    let opcodes = CodeParser::parse("return False and {func, mark, ()}\n").unwrap();
    let v = CodeRunner::new().run(&opcodes, &GameInteract::new(), &registry, true).unwrap();
    assert_eq!(v, Scalar::Bool(false));
    assert!(!called.get());
  }

  #[test]
  fn del_removes_variable_from_environment() {
    let opcodes = CodeParser::parse("x = 1\ndel x\nreturn x\n").unwrap();
    let err = CodeRunner::new().run(&opcodes, &GameInteract::new(), &BuiltInFunction::new(), true).unwrap_err();
    assert!(err.to_string().contains("used before assignment"));
  }

  #[test]
  fn selector_barrier_resolves_through_host() {
    let opcodes = CodeParser::parse("return {selector, '@a'}\n").unwrap();
    let host = GameInteract::new().with_selector(|target| Ok(format!("resolved:{target}")));
    let v = CodeRunner::new().run(&opcodes, &host, &BuiltInFunction::new(), true).unwrap();
    assert_eq!(v, Scalar::Str("resolved:@a".to_string()));
  }

  #[test]
  fn score_barrier_passes_target_and_scoreboard_through() {
    let opcodes = CodeParser::parse("return {score, '@p', 'kills'}\n").unwrap();
    let host = GameInteract::new().with_score(|target, scoreboard| {
      assert_eq!(target, "@p");
      assert_eq!(scoreboard, "kills");
      Ok(7)
    });
    let v = CodeRunner::new().run(&opcodes, &host, &BuiltInFunction::new(), true).unwrap();
    assert_eq!(v, Scalar::Int(7));
  }

  #[test]
  fn command_barrier_returns_host_success_count() {
    let opcodes = CodeParser::parse("return {command, 'say hi'}\n").unwrap();
    let host = GameInteract::new().with_command(|cmd| {
      assert_eq!(cmd, "say hi");
      Ok(1)
    });
    let v = CodeRunner::new().run(&opcodes, &host, &BuiltInFunction::new(), true).unwrap();
    assert_eq!(v, Scalar::Int(1));
  }

  #[test]
  fn selector_barrier_rejects_non_string_argument() {
    let opcodes = CodeParser::parse("return {selector, 1}\n").unwrap();
    let err = CodeRunner::new().run(&opcodes, &GameInteract::new(), &BuiltInFunction::new(), true).unwrap_err();
    assert!(err.to_string().contains("requires a string argument"));
  }

  #[test]
  fn custom_function_via_registry() {
    let mut registry = BuiltInFunction::new();
    registry.register_static("double", |args: &[Scalar]| Ok(Scalar::Int(args[0].as_int()? * 2)));
    let opcodes = CodeParser::parse("return {func, double, (21)}\n").unwrap();
    let v = CodeRunner::new().run(&opcodes, &GameInteract::new(), &registry, true).unwrap();
    assert_eq!(v, Scalar::Int(42));
  }
}
