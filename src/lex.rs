//! A byte cursor over `.obj`/`.mtl` text, shared by every parser in the crate.
use thiserror::Error;

/// An error encountered while parsing a `.obj` or `.mtl` file.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("line {line_number}: {kind}")]
pub struct ParseError {
  /// The line number (1-based) this error occurred on.
  pub line_number: usize,
  /// What went wrong.
  pub kind: ErrorKind,
}

/// The ways a parse can fail.
///
/// Malformed numbers are not among them: garbage where a number is expected
/// reads as zero.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ErrorKind {
  /// The allocator refused to grow one of the parser's buffers. Everything
  /// built so far has been released.
  #[error("out of memory while growing parser storage")]
  OutOfMemory,
  /// A face has more corners than the streaming parser's face buffer holds.
  #[error("face has {corners} corners but at most {max} are supported")]
  FaceTooLarge {
    /// Number of corners on the offending `f` line.
    corners: usize,
    /// Capacity of the face buffer.
    max: usize,
  },
  /// A material field showed up before any `newmtl` opened a material.
  #[error("`{keyword}` appears before any `newmtl`")]
  MaterialFieldOutsideBlock {
    /// The keyword that had no material to apply to.
    keyword: &'static str,
  },
}

impl ParseError {
  pub(crate) fn new(line_number: usize, kind: ErrorKind) -> ParseError {
    ParseError { line_number, kind }
  }

  pub(crate) fn out_of_memory(line_number: usize) -> ParseError {
    ParseError::new(line_number, ErrorKind::OutOfMemory)
  }
}

/// Makes room for `additional` more elements, reporting allocator failure
/// instead of aborting. Growth is amortized (capacity doubles).
pub(crate) fn grow<T>(
  vec: &mut Vec<T>,
  additional: usize,
  line_number: usize,
) -> Result<(), ParseError> {
  vec
    .try_reserve(additional)
    .map_err(|_| ParseError::out_of_memory(line_number))
}

// Characters of the number a malformed float literal starts with.
const FLOAT_CHARS: &[u8] = b"+-0123456789.";

fn is_space(c: u8) -> bool {
  c == b' ' || c == b'\t'
}

fn is_new_line(c: u8) -> bool {
  c == b'\n' || c == b'\r'
}

#[derive(Clone, Debug)]
pub(crate) struct Cursor<'a> {
  input: &'a str,
  pos: usize,
  line_number: usize,
}

impl<'a> Cursor<'a> {
  pub(crate) fn new(input: &'a str) -> Cursor<'a> {
    Cursor {
      input,
      pos: 0,
      line_number: 1,
    }
  }

  pub(crate) fn line_number(&self) -> usize {
    self.line_number
  }

  pub(crate) fn is_eof(&self) -> bool {
    self.pos >= self.input.len()
  }

  fn peek(&self) -> Option<u8> {
    self.input.as_bytes().get(self.pos).copied()
  }

  /// Consumes `c` if it is the next byte.
  pub(crate) fn eat(&mut self, c: u8) -> bool {
    if self.peek() == Some(c) {
      self.pos += 1;
      true
    } else {
      false
    }
  }

  pub(crate) fn peek_is(&self, c: u8) -> bool {
    self.peek() == Some(c)
  }

  /// True if the next byte can start an integer literal.
  pub(crate) fn at_number(&self) -> bool {
    match self.peek() {
      Some(c) => c.is_ascii_digit() || c == b'-' || c == b'+',
      None => false,
    }
  }

  /// True at a newline, a trailing comment or the end of input.
  pub(crate) fn at_line_end(&self) -> bool {
    match self.peek() {
      None => true,
      Some(c) => is_new_line(c) || c == b'#',
    }
  }

  /// Skips spaces and tabs, never leaving the current line.
  pub(crate) fn skip_space(&mut self) {
    while let Some(c) = self.peek() {
      if !is_space(c) {
        break;
      }
      self.pos += 1;
    }
  }

  /// Consumes one line break: `\n`, `\r\n` or a lone `\r`.
  fn eat_new_line(&mut self) -> bool {
    if self.eat(b'\r') {
      self.eat(b'\n');
    } else if !self.eat(b'\n') {
      return false;
    }
    self.line_number += 1;
    true
  }

  /// Moves to the next line break without consuming it.
  fn skip_to_new_line(&mut self) {
    match self.input[self.pos..].find(|c: char| c == '\n' || c == '\r') {
      Some(offset) => self.pos += offset,
      None => self.pos = self.input.len(),
    }
  }

  /// Skips spaces, tabs and line breaks.
  pub(crate) fn skip_whitespace(&mut self) {
    loop {
      self.skip_space();
      if !self.eat_new_line() {
        break;
      }
    }
  }

  pub(crate) fn skip_whitespace_and_comments(&mut self) {
    self.skip_whitespace();
    while self.peek_is(b'#') {
      self.skip_to_new_line();
      self.skip_whitespace();
    }
  }

  /// Moves just past the next line break, or to the end of input.
  pub(crate) fn skip_line(&mut self) {
    self.skip_to_new_line();
    self.eat_new_line();
  }

  /// Reads an optionally signed decimal integer. Overflow saturates; no
  /// digits at all reads as `0`.
  pub(crate) fn parse_int(&mut self) -> i64 {
    let negative = if self.eat(b'-') {
      true
    } else {
      self.eat(b'+');
      false
    };

    let mut value: i64 = 0;
    while let Some(c) = self.peek() {
      if !c.is_ascii_digit() {
        break;
      }
      value = value.saturating_mul(10).saturating_add(i64::from(c - b'0'));
      self.pos += 1;
    }

    if negative {
      -value
    } else {
      value
    }
  }

  /// Reads a float after skipping spaces. A malformed literal yields the
  /// number its leading sign, digits and dot spell, or `0.0` if they spell
  /// none, and the rest of the operand is dropped. The parse never fails and
  /// never leaves the current line.
  pub(crate) fn parse_float(&mut self) -> f32 {
    self.skip_space();
    let rest = &self.input.as_bytes()[self.pos..];
    let value = match lexical::parse_partial::<f32, _>(rest) {
      Ok((value, consumed)) if consumed > 0 => value,
      _ => {
        let prefix = rest.iter().take_while(|c| FLOAT_CHARS.contains(*c)).count();
        lexical::parse_partial::<f32, _>(&rest[..prefix]).map_or(0.0, |(value, _)| value)
      }
    };
    while !self.at_line_end() && !self.peek().map_or(false, is_space) {
      self.pos += 1;
    }
    value
  }

  /// Like `parse_float`, but yields `default` if the line has no more
  /// operands.
  pub(crate) fn parse_optional_float(&mut self, default: f32) -> f32 {
    self.skip_space();
    if self.at_line_end() {
      default
    } else {
      self.parse_float()
    }
  }

  /// Returns the token up to the next space, tab, line break or end of
  /// input. The token borrows from the input; it may be empty.
  pub(crate) fn parse_text(&mut self) -> &'a str {
    let input = self.input;
    let start = self.pos;
    while let Some(c) = self.peek() {
      if is_space(c) || is_new_line(c) {
        break;
      }
      self.pos += 1;
    }
    &input[start..self.pos]
  }

  pub(crate) fn error(&self, kind: ErrorKind) -> ParseError {
    ParseError::new(self.line_number, kind)
  }
}
