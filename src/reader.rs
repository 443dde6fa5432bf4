//! Rewindable cursors used throughout the pipeline.
//!
//! Two cursors live here: [`CharReader`], which walks the raw source text
//! byte-by-byte (grouping multi-byte UTF-8 sequences so a "character" is
//! always a full codepoint), and [`Cursor<T>`], a generic rewindable list
//! cursor reused both as the token reader (`Cursor<Token>`) and, inside
//! `expr`, as the scratch reader that operator compaction scans over
//! (`Cursor<ExpressionElement>`).

use crate::diagnostic::Error;

/// A bounded, rewindable cursor over a source string.
///
/// `read`/`unread` move by whole characters; the pointer itself is always a
/// byte offset into the source, so it can be handed straight to `Span`.
pub struct CharReader<'a> {
  src: &'a str,
  pointer: usize,
}

impl<'a> CharReader<'a> {
  pub fn new(src: &'a str) -> Self {
    Self { src, pointer: 0 }
  }

  pub fn src(&self) -> &'a str {
    self.src
  }

  pub fn pointer(&self) -> usize {
    self.pointer
  }

  pub fn set_pointer(&mut self, p: usize) {
    self.pointer = p.min(self.src.len());
  }

  /// Reads up to `n` characters, advancing the pointer. Returns a shorter
  /// slice at EOF.
  pub fn read(&mut self, n: usize) -> &'a str {
    let start = self.pointer;
    let mut end = self.pointer;
    for c in self.src[self.pointer..].chars().take(n) {
      end += c.len_utf8();
    }
    self.pointer = end;
    &self.src[start..end]
  }

  /// Un-reads `n` characters. Fails if doing so would move before position 0.
  pub fn unread(&mut self, n: usize) -> Result<(), Error> {
    let mut idx = self.pointer;
    for _ in 0..n {
      if idx == 0 {
        return Err(Error::internal("unread: Try unread in the beginning"));
      }
      let (last, _) = self.src[..idx].char_indices().last().unwrap();
      idx = last;
    }
    self.pointer = idx;
    Ok(())
  }

  /// Consumes spaces and tabs, but not newlines.
  pub fn jump_space(&mut self) {
    loop {
      let c = self.read(1);
      if c == " " || c == "\t" {
        continue;
      }
      if !c.is_empty() {
        // best-effort: a single char is always re-readable
        let _ = self.unread(1);
      }
      break;
    }
  }

  /// Consumes characters after a leading `'` up to (and including) the
  /// matching `'`, decoding backslash escapes, and returns the decoded
  /// string contents.
  pub fn parse_string(&mut self) -> Result<String, Error> {
    let mut out = String::new();
    loop {
      let c = self.read(1);
      if c.is_empty() {
        return Err(Error::lex("parse_string: Unexpected EOF"));
      }
      if c == "\\" {
        let esc = self.read(1);
        if esc.is_empty() {
          return Err(Error::lex("parse_string: Unexpected EOF"));
        }
        out.push_str(&decode_escape(esc));
        continue;
      }
      if c == "'" {
        break;
      }
      out.push_str(c);
    }
    Ok(out)
  }
}

fn decode_escape(esc: &str) -> String {
  match esc {
    "n" => "\n".to_string(),
    "t" => "\t".to_string(),
    "r" => "\r".to_string(),
    "\\" => "\\".to_string(),
    "'" => "'".to_string(),
    "\"" => "\"".to_string(),
    other => other.to_string(),
  }
}

/// A generic bounded, rewindable cursor over a `Vec<T>`.
///
/// Mirrors the three operations every stage of the pipeline needs: `read`
/// (advance or `None` at EOF), `unread` (fails before position 0),
/// `must_read` (read, but EOF is an error), plus `set_pointer`/`pointer` and
/// an `insert` used only by operator compaction to splice in a synthetic
/// zero for unary +/-.
pub struct Cursor<T> {
  contents: Vec<T>,
  pointer: usize,
}

impl<T: Clone> Cursor<T> {
  pub fn new(contents: Vec<T>) -> Self {
    Self { contents, pointer: 0 }
  }

  pub fn pointer(&self) -> usize {
    self.pointer
  }

  pub fn set_pointer(&mut self, p: usize) {
    self.pointer = p.min(self.contents.len());
  }

  pub fn contents(&self) -> &[T] {
    &self.contents
  }

  pub fn read(&mut self) -> Option<T> {
    if self.pointer >= self.contents.len() {
      return None;
    }
    let v = self.contents[self.pointer].clone();
    self.pointer += 1;
    Some(v)
  }

  pub fn unread(&mut self) -> Result<(), Error> {
    if self.pointer == 0 {
      return Err(Error::internal("unread: Try unread in the beginning"));
    }
    self.pointer -= 1;
    Ok(())
  }

  pub fn must_read(&mut self) -> Result<T, Error> {
    self.read().ok_or_else(|| Error::internal("must_read: Unexpected EOF"))
  }

  pub fn insert(&mut self, index: usize, value: T) {
    self.contents.insert(index, value);
  }

  pub fn into_inner(self) -> Vec<T> {
    self.contents
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn char_reader_reads_and_unreads() {
    let mut r = CharReader::new("ab");
    assert_eq!(r.read(1), "a");
    assert_eq!(r.read(1), "b");
    assert_eq!(r.read(1), "");
    r.unread(2).unwrap();
    assert_eq!(r.pointer(), 0);
  }

  #[test]
  fn char_reader_unread_before_zero_fails() {
    let mut r = CharReader::new("a");
    assert!(r.unread(1).is_err());
  }

  #[test]
  fn char_reader_jump_space_stops_at_newline() {
    let mut r = CharReader::new("  \n");
    r.jump_space();
    assert_eq!(r.pointer(), 2);
  }

  #[test]
  fn cursor_set_pointer_read_unread_is_idempotent() {
    let mut c = Cursor::new(vec![1, 2, 3]);
    c.set_pointer(1);
    c.read();
    c.unread().unwrap();
    assert_eq!(c.pointer(), 1);
  }

  #[test]
  fn cursor_must_read_eof_errors() {
    let mut c: Cursor<i32> = Cursor::new(vec![]);
    assert!(c.must_read().is_err());
  }
}
