//! A push parser for `.obj` files.
//!
//! Instead of building a [`Model`](crate::obj::Model), [`parse`] hands every
//! record to a [`Handler`] as soon as it is read and keeps nothing itself, so
//! the caller decides how geometry is stored.
//!
//! ```
//! use wavefront_objloader::obj::{ParseFlags, VTNIndex};
//! use wavefront_objloader::stream::{self, Handler};
//!
//! #[derive(Default)]
//! struct Triangles(usize);
//!
//! impl<'a> Handler<&'a str> for Triangles {
//!   fn face(&mut self, corners: &[VTNIndex]) {
//!     assert_eq!(corners.len(), 3);
//!     self.0 += 1;
//!   }
//! }
//!
//! let quad = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n";
//! let mut triangles = Triangles::default();
//! let flags = ParseFlags::default().with_triangulate(true);
//! stream::parse(quad, flags, &mut triangles).unwrap();
//! assert_eq!(triangles.0, 2);
//! ```
use log::debug;

use crate::lex::{grow, ErrorKind, ParseError};
use crate::obj::{parse_triplet, Counts, ParseFlags, Reader, Statement, VTNIndex, Words};
use crate::text::{extract, Text};

/// The most corners a single face may have.
pub const MAX_FACE_CORNERS: usize = 256;

/// Receives the records of an `.obj` file in order.
///
/// `S` is how names reach the handler: `String`s the handler now owns, or
/// `&str`s borrowed from the input. Every method does nothing by default.
pub trait Handler<S> {
  /// A position. `w` is 1.0 unless the file gives one.
  fn vertex(&mut self, _x: f32, _y: f32, _z: f32, _w: f32) {}

  /// A texture coordinate. `w` is 0.0 unless the file gives one.
  fn texcoord(&mut self, _u: f32, _v: f32, _w: f32) {}

  /// A normal.
  fn normal(&mut self, _x: f32, _y: f32, _z: f32) {}

  /// A face, or one triangle of it when triangulating. Indices are already
  /// zero-based.
  fn face(&mut self, _corners: &[VTNIndex]) {}

  /// A `g` line with every name on it. No names means the default group.
  fn group(&mut self, _names: Vec<S>) {}

  /// One material library file named by `mtllib`.
  fn mtllib(&mut self, _path: S) {}

  /// A `usemtl` line.
  fn usemtl(&mut self, _name: S) {}
}

/// Parses `input`, reporting each record to `handler`.
///
/// `optimize_meshes` has no effect here; merging is up to the handler.
pub fn parse<'a, S, H>(
  input: &'a str,
  flags: ParseFlags,
  handler: &mut H,
) -> Result<(), ParseError>
where
  S: Text<'a>,
  H: Handler<S> + ?Sized,
{
  let mut reader = Reader::new(input);
  let mut counts = Counts::default();
  let mut buffer: [VTNIndex; MAX_FACE_CORNERS] = [(0, None, None); MAX_FACE_CORNERS];

  while let Some(statement) = reader.next_statement() {
    let line = reader.line_number();
    match statement {
      Statement::Vertex([x, y, z, w]) => {
        counts.vertices += 1;
        handler.vertex(x, y, z, w);
      }
      Statement::TexCoord([u, v, w]) => {
        counts.texcoords += 1;
        handler.texcoord(u, v, w);
      }
      Statement::Normal([x, y, z]) => {
        counts.normals += 1;
        handler.normal(x, y, z);
      }
      Statement::Face(corners) => {
        emit_face::<S, H>(corners, counts, flags.triangulate, &mut buffer, handler, line)?
      }
      Statement::Group(words) => {
        let mut names = Vec::new();
        for word in words {
          grow(&mut names, 1, line)?;
          names.push(extract(word, line)?);
        }
        handler.group(names);
      }
      Statement::UseMaterial(Some(name)) => handler.usemtl(extract(name, line)?),
      Statement::UseMaterial(None) => debug!("line {}: `usemtl` without a name", line),
      Statement::MaterialLibrary(files) => {
        for file in files {
          handler.mtllib(extract(file, line)?);
        }
      }
    }
  }

  debug!(
    "streamed obj: {} vertices, {} texcoords, {} normals",
    counts.vertices, counts.texcoords, counts.normals
  );
  Ok(())
}

fn emit_face<S, H>(
  mut corners: Words<'_>,
  counts: Counts,
  triangulate: bool,
  buffer: &mut [VTNIndex; MAX_FACE_CORNERS],
  handler: &mut H,
  line: usize,
) -> Result<(), ParseError>
where
  H: Handler<S> + ?Sized,
{
  let mut len = 0;
  let mut total = 0;

  while let Some(token) = corners.next() {
    if triangulate && len == 3 {
      // Keep the fan's first corner, the last one becomes the second.
      buffer[1] = buffer[2];
      len = 2;
    }
    if len == MAX_FACE_CORNERS {
      return Err(ParseError::new(
        line,
        ErrorKind::FaceTooLarge {
          corners: total + 1 + corners.count(),
          max: MAX_FACE_CORNERS,
        },
      ));
    }

    buffer[len] = parse_triplet(token, counts);
    len += 1;
    total += 1;

    if triangulate && len == 3 {
      handler.face(&buffer[..3]);
    }
  }

  if len > 0 && !(triangulate && total >= 3) {
    handler.face(&buffer[..len]);
  }
  Ok(())
}
