//! Tokens and the lexer (`Sentence`) that produces them.

use span::Span;

use crate::diagnostic::Error;
use crate::reader::CharReader;

/// The closed set of lexical atoms. `Word` and `StringLit` carry a payload;
/// every other variant is a fixed lexeme or reserved word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
  Word,
  StringLit,
  Assign,
  Lt,
  Gt,
  LeftBarrier,
  RightBarrier,
  Colon,
  Plus,
  Minus,
  Star,
  Slash,
  LeftParen,
  RightParen,
  Comma,
  Bang,
  Separate,
  KwInt,
  KwBool,
  KwStr,
  KwFloat,
  KwRef,
  KwSelector,
  KwScore,
  KwCommand,
  KwFunc,
  KwReturn,
  KwIf,
  KwElse,
  KwElif,
  KwFi,
  KwFor,
  KwContinue,
  KwBreak,
  KwRof,
  KwDel,
  KwAnd,
  KwOr,
  KwNot,
  KwIn,
  KwTrue,
  KwFalse,
}

impl TokenKind {
  fn keyword(word: &str) -> Option<TokenKind> {
    use TokenKind::*;
    Some(match word {
      "int" => KwInt,
      "bool" => KwBool,
      "str" => KwStr,
      "float" => KwFloat,
      "ref" => KwRef,
      "selector" => KwSelector,
      "score" => KwScore,
      "command" => KwCommand,
      "func" => KwFunc,
      "return" => KwReturn,
      "if" => KwIf,
      "else" => KwElse,
      "elif" => KwElif,
      "fi" => KwFi,
      "for" => KwFor,
      "continue" => KwContinue,
      "break" => KwBreak,
      "rof" => KwRof,
      "del" => KwDel,
      "and" => KwAnd,
      "or" => KwOr,
      "not" => KwNot,
      "in" => KwIn,
      "True" => KwTrue,
      "False" => KwFalse,
      _ => return None,
    })
  }

  /// Single-character punctuation, keyed on the one character the lexer
  /// just read. Both `\n` and `|` map to `Separate`.
  fn punctuation(c: &str) -> Option<TokenKind> {
    use TokenKind::*;
    Some(match c {
      "=" => Assign,
      "<" => Lt,
      ">" => Gt,
      "{" => LeftBarrier,
      "}" => RightBarrier,
      ":" => Colon,
      "+" => Plus,
      "-" => Minus,
      "*" => Star,
      "/" => Slash,
      "(" => LeftParen,
      ")" => RightParen,
      "," => Comma,
      "!" => Bang,
      "\n" | "|" => Separate,
      _ => return None,
    })
  }
}

#[derive(Debug, Clone)]
pub struct Token {
  pub kind: TokenKind,
  pub payload: String,
  pub span: Span,
}

impl Token {
  fn new(kind: TokenKind, payload: String, start: usize, end: usize) -> Token {
    Token { kind, payload, span: Span { start, end } }
  }
}

/// Single-pass lexer. Consumes a [`CharReader`] and produces the full token
/// sequence for a script.
pub struct Sentence<'a> {
  reader: CharReader<'a>,
  tokens: Vec<Token>,
}

impl<'a> Sentence<'a> {
  pub fn new(src: &'a str) -> Self {
    Self { reader: CharReader::new(src), tokens: Vec::new() }
  }

  pub fn parse_all(mut self) -> Result<Vec<Token>, Error> {
    let _span = tracing::debug_span!("lex").entered();
    while self.parse_next()? {}
    tracing::debug!(count = self.tokens.len(), "lexed tokens");
    Ok(self.tokens)
  }

  /// Parses the next token. Returns `Ok(false)` at EOF.
  fn parse_next(&mut self) -> Result<bool, Error> {
    self.reader.jump_space();
    let start = self.reader.pointer();
    let first = self.reader.read(1);
    if first.is_empty() {
      return Ok(false);
    }

    if first == "'" {
      let payload = self
        .reader
        .parse_string()
        .map_err(|e| crate::diagnostic::wrap_syntax_bytes(self.reader.src(), start, self.reader.pointer(), e))?;
      let end = self.reader.pointer();
      self.tokens.push(Token::new(TokenKind::StringLit, payload, start, end));
      return Ok(true);
    }

    if let Some(kind) = TokenKind::punctuation(first) {
      let end = self.reader.pointer();
      self.tokens.push(Token::new(kind, String::new(), start, end));
      return Ok(true);
    }

    let mut word = first.to_string();
    loop {
      let c = self.reader.read(1);
      if c.is_empty() {
        break;
      }
      if c == " " || c == "\t" || TokenKind::punctuation(c).is_some() {
        self.reader.unread(1)?;
        break;
      }
      word.push_str(c);
    }
    let end = self.reader.pointer();

    let kind = TokenKind::keyword(&word).unwrap_or(TokenKind::Word);
    let payload = if kind == TokenKind::Word { word } else { String::new() };
    self.tokens.push(Token::new(kind, payload, start, end));
    Ok(true)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn kinds(src: &str) -> Vec<TokenKind> {
    Sentence::new(src).parse_all().unwrap().into_iter().map(|t| t.kind).collect()
  }

  #[test]
  fn lexes_assignment() {
    use TokenKind::*;
    assert_eq!(kinds("x = 1\n"), vec![Word, Assign, Word, Separate]);
  }

  #[test]
  fn newline_and_pipe_both_separate() {
    assert_eq!(kinds("a\nb|c"), vec![TokenKind::Word, TokenKind::Separate, TokenKind::Word, TokenKind::Separate, TokenKind::Word]);
  }

  #[test]
  fn keywords_win_over_word() {
    assert_eq!(kinds("if x"), vec![TokenKind::KwIf, TokenKind::Word]);
  }

  #[test]
  fn string_literal_decodes_escapes() {
    let tokens = Sentence::new("'a\\nb'").parse_all().unwrap();
    assert_eq!(tokens[0].kind, TokenKind::StringLit);
    assert_eq!(tokens[0].payload, "a\nb");
  }

  #[test]
  fn unterminated_string_is_lex_error() {
    assert!(Sentence::new("'abc").parse_all().is_err());
  }

  #[test]
  fn unterminated_string_is_formatted_with_excerpt() {
    let err = Sentence::new("'abc").parse_all().unwrap_err();
    insta::assert_snapshot!(err.to_string(), @r###"
    Syntax Error.

    - Error -
      parse_string: Unexpected EOF

    - Code -
      >>'abc<<
    "###);
  }

  #[test]
  fn token_span_round_trips_into_source() {
    let src = "foo = 123";
    let tokens = Sentence::new(src).parse_all().unwrap();
    for t in &tokens {
      let slice = &src[t.span.start..t.span.end];
      match t.kind {
        TokenKind::Word => assert_eq!(slice, t.payload),
        TokenKind::Assign => assert_eq!(slice, "="),
        _ => {}
      }
    }
  }
}
