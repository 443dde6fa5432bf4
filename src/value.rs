//! `Scalar`, the only value class visible to scripts.

use crate::diagnostic::Error;
use crate::expr::CastType;

/// int | bool | float | string. Lists/maps never appear here: host-returned
/// handles are carried as plain `int`.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
  Int(i64),
  Bool(bool),
  Float(f64),
  Str(String),
}

impl Scalar {
  pub fn type_name(&self) -> &'static str {
    match self {
      Scalar::Int(_) => "int",
      Scalar::Bool(_) => "bool",
      Scalar::Float(_) => "float",
      Scalar::Str(_) => "str",
    }
  }

  pub fn truthy(&self) -> bool {
    match self {
      Scalar::Int(v) => *v != 0,
      Scalar::Bool(v) => *v,
      Scalar::Float(v) => *v != 0.0,
      Scalar::Str(v) => !v.is_empty(),
    }
  }

  pub fn as_int(&self) -> Result<i64, Error> {
    match self {
      Scalar::Int(v) => Ok(*v),
      Scalar::Bool(v) => Ok(*v as i64),
      Scalar::Float(v) => Ok(*v as i64),
      Scalar::Str(v) => v.parse().map_err(|_| Error::runtime(format!("cannot convert \"{v}\" to int"))),
    }
  }

  pub fn as_float(&self) -> Result<f64, Error> {
    match self {
      Scalar::Int(v) => Ok(*v as f64),
      Scalar::Bool(v) => Ok(if *v { 1.0 } else { 0.0 }),
      Scalar::Float(v) => Ok(*v),
      Scalar::Str(v) => v.parse().map_err(|_| Error::runtime(format!("cannot convert \"{v}\" to float"))),
    }
  }

  pub fn as_str(&self) -> String {
    match self {
      Scalar::Int(v) => v.to_string(),
      Scalar::Bool(v) => v.to_string(),
      Scalar::Float(v) => v.to_string(),
      Scalar::Str(v) => v.clone(),
    }
  }

  pub fn as_bool(&self) -> bool {
    self.truthy()
  }

  /// Coerces to `target`, matching the host-level cast semantics used by
  /// both `Cast(t, e)` expressions and `int`/`bool`/`float`/`str` built-in
  /// functions.
  pub fn cast(&self, target: CastType) -> Result<Scalar, Error> {
    Ok(match target {
      CastType::Int => Scalar::Int(self.as_int()?),
      CastType::Bool => Scalar::Bool(self.truthy()),
      CastType::Float => Scalar::Float(self.as_float()?),
      CastType::Str => Scalar::Str(self.as_str()),
    })
  }

  /// Asserts that `self` is exactly of kind `target` (used by `Ref`'s
  /// type-assertion, which is strict: bool is not an int, int is not a
  /// float, nothing but a string is a string).
  pub fn assert_kind(&self, target: CastType) -> Result<(), Error> {
    let matches = match (target, self) {
      (CastType::Bool, Scalar::Bool(_)) => true,
      (CastType::Int, Scalar::Int(_)) => true,
      (CastType::Float, Scalar::Float(_)) => true,
      (CastType::Str, Scalar::Str(_)) => true,
      _ => false,
    };
    if matches {
      Ok(())
    } else {
      Err(Error::runtime(format!(
        "ref: expected {} but host returned {} ({})",
        target.name(),
        self.type_name(),
        self.as_str()
      )))
    }
  }
}

impl std::fmt::Display for Scalar {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// `+`: numeric addition, or string concatenation when either operand is a
/// string.
pub fn add(a: &Scalar, b: &Scalar) -> Result<Scalar, Error> {
  match (a, b) {
    (Scalar::Str(_), _) | (_, Scalar::Str(_)) => Ok(Scalar::Str(format!("{}{}", a.as_str(), b.as_str()))),
    (Scalar::Float(_), _) | (_, Scalar::Float(_)) => Ok(Scalar::Float(a.as_float()? + b.as_float()?)),
    _ => Ok(Scalar::Int(a.as_int()? + b.as_int()?)),
  }
}

/// `-`: numeric subtraction only.
pub fn sub(a: &Scalar, b: &Scalar) -> Result<Scalar, Error> {
  match (a, b) {
    (Scalar::Str(_), _) | (_, Scalar::Str(_)) => Err(Error::runtime("cannot subtract a string")),
    (Scalar::Float(_), _) | (_, Scalar::Float(_)) => Ok(Scalar::Float(a.as_float()? - b.as_float()?)),
    _ => Ok(Scalar::Int(a.as_int()? - b.as_int()?)),
  }
}

/// `*`: numeric multiplication, plus int-by-string repetition in either
/// operand order.
pub fn mul(a: &Scalar, b: &Scalar) -> Result<Scalar, Error> {
  match (a, b) {
    (Scalar::Str(s), other) | (other, Scalar::Str(s)) => {
      let n = other.as_int()?;
      if n < 0 {
        return Err(Error::runtime("cannot repeat a string a negative number of times"));
      }
      Ok(Scalar::Str(s.repeat(n as usize)))
    }
    (Scalar::Float(_), _) | (_, Scalar::Float(_)) => Ok(Scalar::Float(a.as_float()? * b.as_float()?)),
    _ => Ok(Scalar::Int(a.as_int()? * b.as_int()?)),
  }
}

/// `/`: true division. Returns a float whenever either operand isn't an
/// int (and always for int/int, to stay stable regardless of whether the
/// division happens to be exact — see `SPEC_FULL.md`'s Open Questions).
pub fn div(a: &Scalar, b: &Scalar) -> Result<Scalar, Error> {
  if matches!(a, Scalar::Str(_)) || matches!(b, Scalar::Str(_)) {
    return Err(Error::runtime("cannot divide a string"));
  }
  let divisor = b.as_float()?;
  if divisor == 0.0 {
    return Err(Error::runtime("division by zero"));
  }
  Ok(Scalar::Float(a.as_float()? / divisor))
}

/// Standard pairwise scalar ordering, used by `<`, `>`, `<=`, `>=`.
pub fn compare(a: &Scalar, b: &Scalar) -> Result<std::cmp::Ordering, Error> {
  match (a, b) {
    (Scalar::Str(x), Scalar::Str(y)) => Ok(x.cmp(y)),
    (Scalar::Str(_), _) | (_, Scalar::Str(_)) => Err(Error::runtime("cannot order a string against a number")),
    _ => a
      .as_float()?
      .partial_cmp(&b.as_float()?)
      .ok_or_else(|| Error::runtime("cannot order these values")),
  }
}

/// `==`/`!=`: value equality across scalar kinds, comparing numerically
/// when neither side is a string.
pub fn eq(a: &Scalar, b: &Scalar) -> bool {
  match (a, b) {
    (Scalar::Str(x), Scalar::Str(y)) => x == y,
    (Scalar::Str(_), _) | (_, Scalar::Str(_)) => false,
    _ => a.as_float().ok() == b.as_float().ok(),
  }
}

/// `in`: substring-of-string membership. Host-collection membership is
/// modeled indirectly: collections never appear in the language, only the
/// `int` handles the host hands back, so `in` only ever operates on
/// strings here.
pub fn contains(needle: &Scalar, haystack: &Scalar) -> Result<bool, Error> {
  match haystack {
    Scalar::Str(s) => Ok(s.contains(&needle.as_str())),
    _ => Err(Error::runtime("\"in\" requires a string on the right-hand side")),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn add_concatenates_strings() {
    let r = add(&Scalar::Str("foo".into()), &Scalar::Str("bar".into())).unwrap();
    assert_eq!(r, Scalar::Str("foobar".into()));
  }

  #[test]
  fn div_is_always_float() {
    let r = div(&Scalar::Int(4), &Scalar::Int(2)).unwrap();
    assert_eq!(r, Scalar::Float(2.0));
  }

  #[test]
  fn assert_kind_rejects_bool_as_int() {
    assert!(Scalar::Bool(true).assert_kind(CastType::Int).is_err());
  }

  #[test]
  fn contains_checks_substring() {
    assert!(contains(&Scalar::Str("2".into()), &Scalar::Str("a2b".into())).unwrap());
  }
}
