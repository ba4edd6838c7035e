//! A loader for Wavefront's `.obj` file format for storing 3D meshes.
//!
//! `parse` copies every name it extracts, `parse_in_situ` hands back slices
//! of the input instead. Both share the grammar below with the streaming
//! parser in [`crate::stream`].
use log::{debug, trace};

use crate::context::Context;
use crate::lex::{grow, Cursor, ParseError};
use crate::text::Text;

/// Options controlling how an `.obj` file is turned into a model.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ParseFlags {
  /// Split every polygon into a fan of triangles. Faces are assumed to be
  /// coplanar and convex.
  pub triangulate: bool,
  /// Merge mesh parts that share a group name and material, reducing the
  /// number of groups. Only the loader honours this.
  pub optimize_meshes: bool,
}

impl ParseFlags {
  /// Sets `triangulate`.
  pub fn with_triangulate(mut self, triangulate: bool) -> ParseFlags {
    self.triangulate = triangulate;
    self
  }

  /// Sets `optimize_meshes`.
  pub fn with_optimize_meshes(mut self, optimize_meshes: bool) -> ParseFlags {
    self.optimize_meshes = optimize_meshes;
    self
  }
}

/// A parsed `.obj` file.
///
/// Attribute arrays are flat: `vertices` and `normals` hold three floats per
/// entry, `texcoords` two.
#[derive(Clone, Debug, PartialEq)]
pub struct Model<S = String> {
  /// Positions, `x y z` per vertex.
  pub vertices: Vec<f32>,
  /// Texture coordinates, `u v` per entry.
  pub texcoords: Vec<f32>,
  /// Normals, `x y z` per entry.
  pub normals: Vec<f32>,
  /// Groups of faces, in the order they were first declared.
  pub groups: Vec<Group<S>>,
  /// Material library file names, relative to the `.obj` file.
  pub material_libraries: Vec<S>,
  /// The flags the model was parsed with.
  pub flags: ParseFlags,
}

/// A run of faces sharing a group name and a material.
#[derive(Clone, Debug, PartialEq)]
pub struct Group<S = String> {
  /// The group name, or `None` if it is the same as the previous named
  /// group's.
  pub name: Option<S>,
  /// The material name, or `None` if it is the same as the previous group's
  /// material.
  pub material: Option<S>,
  /// Corners of every face, back to back.
  pub indices: Vec<VTNIndex>,
  /// Corner count of each face. Sums to `indices.len()`.
  pub face_sizes: Vec<usize>,
}

/// An index into the `vertices` array of a model, counted in vertices
/// rather than floats.
pub type VertexIndex = usize;

/// An index into the `texcoords` array of a model, counted in entries.
pub type TextureIndex = usize;

/// An index into the `normals` array of a model, counted in entries.
pub type NormalIndex = usize;

/// The corner of a face: a vertex, with an optional texture coordinate and
/// normal. Indices are zero-based and are not checked against the arrays
/// they point into.
pub type VTNIndex = (VertexIndex, Option<TextureIndex>, Option<NormalIndex>);

impl<S> Model<S> {
  /// An empty model holding the unnamed group faces land in before any `g`.
  pub(crate) fn new(flags: ParseFlags) -> Result<Model<S>, ParseError> {
    let mut groups = Vec::new();
    grow(&mut groups, 1, 1)?;
    groups.push(Group::new(None));
    Ok(Model {
      vertices: Vec::new(),
      texcoords: Vec::new(),
      normals: Vec::new(),
      groups,
      material_libraries: Vec::new(),
      flags,
    })
  }

  /// Number of positions.
  pub fn vertex_count(&self) -> usize {
    self.vertices.len() / 3
  }

  /// Number of texture coordinates.
  pub fn texcoord_count(&self) -> usize {
    self.texcoords.len() / 2
  }

  /// Number of normals.
  pub fn normal_count(&self) -> usize {
    self.normals.len() / 3
  }
}

impl<'a> Model<&'a str> {
  /// Copies every borrowed name so the model no longer depends on the input.
  pub fn into_owned(self) -> Model<String> {
    Model {
      vertices: self.vertices,
      texcoords: self.texcoords,
      normals: self.normals,
      groups: self.groups.into_iter().map(Group::into_owned).collect(),
      material_libraries: self
        .material_libraries
        .into_iter()
        .map(String::from)
        .collect(),
      flags: self.flags,
    }
  }
}

impl<S> Group<S> {
  pub(crate) fn new(name: Option<S>) -> Group<S> {
    Group {
      name,
      material: None,
      indices: Vec::new(),
      face_sizes: Vec::new(),
    }
  }

  /// Number of faces (or triangles, when triangulated) in the group.
  pub fn num_faces(&self) -> usize {
    self.face_sizes.len()
  }

  /// The corners of each face, in order.
  pub fn faces(&self) -> impl Iterator<Item = &[VTNIndex]> + '_ {
    let mut start = 0;
    self.face_sizes.iter().map(move |&size| {
      let face = &self.indices[start..start + size];
      start += size;
      face
    })
  }
}

impl<'a> Group<&'a str> {
  fn into_owned(self) -> Group<String> {
    Group {
      name: self.name.map(String::from),
      material: self.material.map(String::from),
      indices: self.indices,
      face_sizes: self.face_sizes,
    }
  }
}

/// How many of each attribute have been declared so far. Face corners are
/// resolved against these.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Counts {
  pub(crate) vertices: usize,
  pub(crate) texcoords: usize,
  pub(crate) normals: usize,
}

/// Turns an index as written in the file into a zero-based one. Positive
/// indices are 1-based, zero and negative ones count back from `count`.
/// Anything pointing before the start saturates to 0.
fn fix_index(raw: i64, count: usize) -> usize {
  if raw > 0 {
    usize::try_from(raw - 1).unwrap_or(usize::MAX)
  } else {
    let back = usize::try_from(raw.unsigned_abs()).unwrap_or(usize::MAX);
    if back > count {
      trace!("relative index {} reaches before the first element", raw);
    }
    count.saturating_sub(back)
  }
}

/// Resolves a face corner written as `v`, `v/t`, `v//n` or `v/t/n`.
pub(crate) fn parse_triplet(token: &str, counts: Counts) -> VTNIndex {
  let mut cursor = Cursor::new(token);
  let vertex = fix_index(cursor.parse_int(), counts.vertices);
  let mut texcoord = None;
  let mut normal = None;

  if cursor.eat(b'/') {
    if cursor.at_number() {
      texcoord = Some(fix_index(cursor.parse_int(), counts.texcoords));
    }
    if cursor.eat(b'/') && cursor.at_number() {
      normal = Some(fix_index(cursor.parse_int(), counts.normals));
    }
  }

  (vertex, texcoord, normal)
}

/// The whitespace-separated operands left on a line.
#[derive(Clone, Debug)]
pub(crate) struct Words<'a> {
  cursor: Cursor<'a>,
}

impl<'a> Iterator for Words<'a> {
  type Item = &'a str;

  fn next(&mut self) -> Option<&'a str> {
    self.cursor.skip_space();
    if self.cursor.at_line_end() {
      None
    } else {
      Some(self.cursor.parse_text())
    }
  }
}

/// One meaningful line of an `.obj` file.
#[derive(Clone, Debug)]
pub(crate) enum Statement<'a> {
  /// `v x y z [w]`
  Vertex([f32; 4]),
  /// `vt u v [w]`
  TexCoord([f32; 3]),
  /// `vn x y z`
  Normal([f32; 3]),
  /// `f` followed by corner fields.
  Face(Words<'a>),
  /// `g` followed by group names.
  Group(Words<'a>),
  /// `usemtl name`
  UseMaterial(Option<&'a str>),
  /// `mtllib` followed by file names.
  MaterialLibrary(Words<'a>),
}

/// Splits `.obj` text into statements, skipping comments, blank lines and
/// anything it does not understand.
pub(crate) struct Reader<'a> {
  cursor: Cursor<'a>,
  line_number: usize,
}

impl<'a> Reader<'a> {
  pub(crate) fn new(input: &'a str) -> Reader<'a> {
    Reader {
      cursor: Cursor::new(input),
      line_number: 1,
    }
  }

  /// The line the last statement came from.
  pub(crate) fn line_number(&self) -> usize {
    self.line_number
  }

  fn words(&self) -> Words<'a> {
    Words {
      cursor: self.cursor.clone(),
    }
  }

  pub(crate) fn next_statement(&mut self) -> Option<Statement<'a>> {
    loop {
      self.cursor.skip_whitespace_and_comments();
      if self.cursor.is_eof() {
        return None;
      }

      self.line_number = self.cursor.line_number();
      let keyword = self.cursor.parse_text();
      let statement = match keyword {
        "v" => {
          let x = self.cursor.parse_float();
          let y = self.cursor.parse_float();
          let z = self.cursor.parse_float();
          let w = self.cursor.parse_optional_float(1.0);
          Statement::Vertex([x, y, z, w])
        }
        "vt" => {
          let u = self.cursor.parse_float();
          let v = self.cursor.parse_float();
          let w = self.cursor.parse_optional_float(0.0);
          Statement::TexCoord([u, v, w])
        }
        "vn" => {
          let x = self.cursor.parse_float();
          let y = self.cursor.parse_float();
          let z = self.cursor.parse_float();
          Statement::Normal([x, y, z])
        }
        "f" => Statement::Face(self.words()),
        "g" => Statement::Group(self.words()),
        "usemtl" => Statement::UseMaterial(self.words().next()),
        "mtllib" => Statement::MaterialLibrary(self.words()),
        _ => {
          trace!("line {}: skipping `{}`", self.line_number, keyword);
          self.cursor.skip_line();
          continue;
        }
      };

      self.cursor.skip_line();
      return Some(statement);
    }
  }
}

/// Parses `.obj` text into a model whose names are stored as `S`.
///
/// Pick `S = String` to copy names out of `input`, or `S = &str` to borrow
/// them. On failure nothing built so far is kept.
pub fn load<'a, S: Text<'a>>(
  input: &'a str,
  flags: ParseFlags,
) -> Result<Model<S>, ParseError> {
  let mut reader = Reader::new(input);
  let mut context = Context::new(flags)?;

  while let Some(statement) = reader.next_statement() {
    context.apply(statement, reader.line_number())?;
  }

  let model = context.finish();
  debug!(
    "parsed obj: {} vertices, {} texcoords, {} normals, {} groups, {} material libraries",
    model.vertex_count(),
    model.texcoord_count(),
    model.normal_count(),
    model.groups.len(),
    model.material_libraries.len()
  );
  Ok(model)
}

/// Parses a wavefront `.obj` file, copying every name out of `input`.
pub fn parse(input: &str, flags: ParseFlags) -> Result<Model<String>, ParseError> {
  load(input, flags)
}

/// Parses a wavefront `.obj` file, borrowing every name from `input`.
pub fn parse_in_situ(input: &str, flags: ParseFlags) -> Result<Model<&str>, ParseError> {
  load(input, flags)
}
