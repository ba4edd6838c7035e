//! Parsers for wavefront's `.obj` and `.mtl` file format for loading meshes.
//!
//! [`obj`] builds a whole [`obj::Model`], [`stream`] reports records to a
//! handler as it reads them, and [`mtl`] reads material libraries. Each can
//! copy names out of the input (`String`) or borrow them from it (`&str`).
#![crate_type = "lib"]
#![deny(missing_docs)]
#![deny(unreachable_pub)]

pub use lex::{ErrorKind, ParseError};
pub use text::Text;

mod lex;
mod text;

mod context;
pub mod mtl;
pub mod obj;
pub mod stream;
