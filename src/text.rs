//! How names and paths pulled out of the input are stored.
//!
//! Parsers are generic over a `Text` type. With `String` every extracted
//! token is copied into its own allocation and the result owns everything.
//! With `&'a str` tokens stay borrowed from the input ("in-situ" parsing), so
//! nothing is copied but the result cannot outlive the input text.
use std::collections::TryReserveError;
use std::fmt;

use crate::lex::ParseError;

/// Storage for a token extracted from input text that lives for `'a`.
pub trait Text<'a>: Clone + fmt::Debug + PartialEq + AsRef<str> {
  /// Builds the stored form of `token`, which borrows from the input.
  fn from_slice(token: &'a str) -> Result<Self, TryReserveError>;

  /// Clones `self`, reporting allocator failure instead of aborting.
  fn try_clone(&self) -> Result<Self, TryReserveError>;
}

impl<'a> Text<'a> for &'a str {
  fn from_slice(token: &'a str) -> Result<Self, TryReserveError> {
    Ok(token)
  }

  fn try_clone(&self) -> Result<Self, TryReserveError> {
    Ok(*self)
  }
}

impl<'a> Text<'a> for String {
  fn from_slice(token: &'a str) -> Result<Self, TryReserveError> {
    copy(token)
  }

  fn try_clone(&self) -> Result<Self, TryReserveError> {
    copy(self)
  }
}

fn copy(text: &str) -> Result<String, TryReserveError> {
  let mut owned = String::new();
  owned.try_reserve_exact(text.len())?;
  owned.push_str(text);
  Ok(owned)
}

pub(crate) fn extract<'a, S: Text<'a>>(
  token: &'a str,
  line_number: usize,
) -> Result<S, ParseError> {
  S::from_slice(token).map_err(|_| ParseError::out_of_memory(line_number))
}

pub(crate) fn duplicate<'a, S: Text<'a>>(text: &S, line_number: usize) -> Result<S, ParseError> {
  text
    .try_clone()
    .map_err(|_| ParseError::out_of_memory(line_number))
}
