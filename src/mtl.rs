//! A parser for Wavefront's `.mtl` material libraries.
use log::{debug, trace};

use crate::lex::{grow, Cursor, ErrorKind, ParseError};
use crate::text::{extract, Text};

/// A material declared with `newmtl`.
#[derive(Clone, Debug, PartialEq)]
pub struct Material<S = String> {
  /// The name given on the `newmtl` line.
  pub name: S,
  /// The diffuse texture map (`map_Kd`), relative to the `.mtl` file.
  pub diffuse_texture: Option<S>,
  /// Ambient color (`Ka r g b`), components in 0..1.
  pub ambient: [f32; 3],
  /// Diffuse color (`Kd r g b`), components in 0..1.
  pub diffuse: [f32; 3],
  /// Specular color (`Ks r g b`), components in 0..1.
  pub specular: [f32; 3],
  /// Specular exponent (`Ns`), usually 0..1000. Not clamped.
  pub shininess: f32,
  /// Opacity (`d` or `Tr`), 1.0 being fully opaque.
  pub opacity: f32,
}

impl<S> Material<S> {
  /// A material with black colors, no texture and full opacity.
  pub fn new(name: S) -> Material<S> {
    Material {
      name,
      diffuse_texture: None,
      ambient: [0.0; 3],
      diffuse: [0.0; 3],
      specular: [0.0; 3],
      shininess: 0.0,
      opacity: 1.0,
    }
  }
}

impl<'a> Material<&'a str> {
  /// Copies the borrowed name and texture path.
  pub fn into_owned(self) -> Material<String> {
    Material {
      name: self.name.to_owned(),
      diffuse_texture: self.diffuse_texture.map(String::from),
      ambient: self.ambient,
      diffuse: self.diffuse,
      specular: self.specular,
      shininess: self.shininess,
      opacity: self.opacity,
    }
  }
}

// Keywords that set a field of the current material.
const FIELDS: [&str; 8] = ["Ka", "Kd", "Ks", "Tr", "d", "Ns", "ns", "map_Kd"];

fn parse_color(cursor: &mut Cursor<'_>) -> [f32; 3] {
  let r = cursor.parse_float();
  let g = cursor.parse_float();
  let b = cursor.parse_float();
  [r, g, b]
}

/// Parses `.mtl` text into materials whose names are stored as `S`.
pub fn load<'a, S: Text<'a>>(input: &'a str) -> Result<Vec<Material<S>>, ParseError> {
  let mut cursor = Cursor::new(input);
  let mut materials: Vec<Material<S>> = Vec::new();

  loop {
    cursor.skip_whitespace_and_comments();
    if cursor.is_eof() {
      break;
    }

    let line = cursor.line_number();
    let keyword = cursor.parse_text();
    if keyword == "newmtl" {
      cursor.skip_space();
      let name = extract(cursor.parse_text(), line)?;
      grow(&mut materials, 1, line)?;
      materials.push(Material::new(name));
      cursor.skip_line();
      continue;
    }

    let field = match FIELDS.iter().find(|field| **field == keyword) {
      Some(field) => *field,
      None => {
        trace!("line {}: skipping `{}`", line, keyword);
        cursor.skip_line();
        continue;
      }
    };

    let current = match materials.last_mut() {
      Some(current) => current,
      None => return Err(cursor.error(ErrorKind::MaterialFieldOutsideBlock { keyword: field })),
    };

    match field {
      "Ka" => current.ambient = parse_color(&mut cursor),
      "Kd" => current.diffuse = parse_color(&mut cursor),
      "Ks" => current.specular = parse_color(&mut cursor),
      "Tr" | "d" => current.opacity = cursor.parse_float(),
      "Ns" | "ns" => current.shininess = cursor.parse_float(),
      _ => {
        cursor.skip_space();
        let path = cursor.parse_text();
        current.diffuse_texture = if path.is_empty() {
          None
        } else {
          Some(extract(path, line)?)
        };
      }
    }
    cursor.skip_line();
  }

  debug!("parsed mtl: {} materials", materials.len());
  Ok(materials)
}

/// Parses a `.mtl` file, copying every name and path out of `input`.
pub fn parse(input: &str) -> Result<Vec<Material<String>>, ParseError> {
  load(input)
}

/// Parses a `.mtl` file, borrowing every name and path from `input`.
pub fn parse_in_situ(input: &str) -> Result<Vec<Material<&str>>, ParseError> {
  load(input)
}
