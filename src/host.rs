//! The host interface (`spec.md` §4.7): the four callables through which a
//! script observes or influences the outside world, plus the name-indexed
//! registry of built-in functions a script can call via `{func, NAME, (...)}`.

use indexmap::IndexMap;

use crate::diagnostic::Error;
use crate::value::Scalar;

/// Four optional callables. A missing callable is replaced by a pure-zero
/// stub at call time (never at construction), matching the host's ability to
/// swap callbacks in between runs.
#[derive(Default)]
pub struct GameInteract {
  selector: Option<Box<dyn Fn(&str) -> Result<String, Error>>>,
  score: Option<Box<dyn Fn(&str, &str) -> Result<i64, Error>>>,
  command: Option<Box<dyn Fn(&str) -> Result<i64, Error>>>,
  ref_: Option<Box<dyn Fn(i64) -> Result<Scalar, Error>>>,
}

impl GameInteract {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_selector(mut self, f: impl Fn(&str) -> Result<String, Error> + 'static) -> Self {
    self.selector = Some(Box::new(f));
    self
  }

  pub fn with_score(mut self, f: impl Fn(&str, &str) -> Result<i64, Error> + 'static) -> Self {
    self.score = Some(Box::new(f));
    self
  }

  pub fn with_command(mut self, f: impl Fn(&str) -> Result<i64, Error> + 'static) -> Self {
    self.command = Some(Box::new(f));
    self
  }

  pub fn with_ref(mut self, f: impl Fn(i64) -> Result<Scalar, Error> + 'static) -> Self {
    self.ref_ = Some(Box::new(f));
    self
  }

  pub fn selector(&self, target: &str) -> Result<String, Error> {
    match &self.selector {
      Some(f) => f(target),
      None => Ok(String::new()),
    }
  }

  pub fn score(&self, target: &str, scoreboard: &str) -> Result<i64, Error> {
    match &self.score {
      Some(f) => f(target, scoreboard),
      None => Ok(0),
    }
  }

  pub fn command(&self, cmd: &str) -> Result<i64, Error> {
    match &self.command {
      Some(f) => f(cmd),
      None => Ok(0),
    }
  }

  /// `ref` semantics are prescribed by form type (`spec.md` §4.7):
  /// modal forms hand back an indexable list, long forms a single int
  /// index, short (yes/no) forms a single bool — it is up to the closure
  /// supplied by the host to know which kind of form is live and answer
  /// accordingly.
  pub fn ref_at(&self, index: i64) -> Result<Scalar, Error> {
    match &self.ref_ {
      Some(f) => f(index),
      None => Ok(Scalar::Int(0)),
    }
  }
}

/// A built-in callable: any fixed number of scalar arguments in, one scalar
/// out. Invalid argument types are reported by the callable itself.
pub type BuiltIn = Box<dyn Fn(&[Scalar]) -> Result<Scalar, Error>>;

/// Name-indexed table of built-ins available to `{func, NAME, (...)}`.
/// Lookup order (`spec.md` §4.7): hard-coded casts (`int`/`bool`/`float`/
/// `str`, handled directly by the evaluator before this registry is ever
/// consulted) first, then the static map, then the dynamic map.
#[derive(Default)]
pub struct BuiltInFunction {
  static_fns: IndexMap<String, BuiltIn>,
  dynamic_fns: IndexMap<String, BuiltIn>,
}

impl BuiltInFunction {
  pub fn new() -> Self {
    Self::default()
  }

  /// Registers a built-in in the static map. Meant to be called once at
  /// boot, before any script runs.
  pub fn register_static(&mut self, name: impl Into<String>, f: impl Fn(&[Scalar]) -> Result<Scalar, Error> + 'static) {
    self.static_fns.insert(name.into(), Box::new(f));
  }

  /// Registers a built-in in the dynamic map. Meant to be hot-swappable
  /// between runs (e.g. per-world or per-session callables).
  pub fn register_dynamic(&mut self, name: impl Into<String>, f: impl Fn(&[Scalar]) -> Result<Scalar, Error> + 'static) {
    self.dynamic_fns.insert(name.into(), Box::new(f));
  }

  pub fn unregister_dynamic(&mut self, name: &str) {
    self.dynamic_fns.remove(name);
  }

  pub fn call(&self, name: &str, args: &[Scalar]) -> Result<Scalar, Error> {
    if let Some(f) = self.static_fns.get(name) {
      return f(args);
    }
    if let Some(f) = self.dynamic_fns.get(name) {
      return f(args);
    }
    Err(Error::runtime(format!("unknown function \"{name}\"")))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn missing_callables_are_zero_stubs() {
    let host = GameInteract::new();
    assert_eq!(host.selector("@a").unwrap(), "");
    assert_eq!(host.score("@a", "kills").unwrap(), 0);
    assert_eq!(host.command("say hi").unwrap(), 0);
    assert_eq!(host.ref_at(0).unwrap(), Scalar::Int(0));
  }

  #[test]
  fn configured_selector_is_used() {
    let host = GameInteract::new().with_selector(|_| Ok("player1".to_string()));
    assert_eq!(host.selector("@p").unwrap(), "player1");
  }

  #[test]
  fn static_takes_precedence_over_dynamic() {
    let mut reg = BuiltInFunction::new();
    reg.register_static("f", |_| Ok(Scalar::Int(1)));
    reg.register_dynamic("f", |_| Ok(Scalar::Int(2)));
    assert_eq!(reg.call("f", &[]).unwrap(), Scalar::Int(1));
  }

  #[test]
  fn unknown_function_is_runtime_error() {
    let reg = BuiltInFunction::new();
    assert!(reg.call("nope", &[]).is_err());
  }

  #[test]
  fn dynamic_can_be_unregistered() {
    let mut reg = BuiltInFunction::new();
    reg.register_dynamic("f", |_| Ok(Scalar::Int(1)));
    reg.unregister_dynamic("f");
    assert!(reg.call("f", &[]).is_err());
  }
}
