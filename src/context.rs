use log::debug;

use crate::lex::{grow, ParseError};
use crate::obj::{parse_triplet, Counts, Group, Model, ParseFlags, Statement, Words};
use crate::text::{duplicate, extract, Text};

/// Loader state: the model under construction plus which group new faces
/// land in.
pub(crate) struct Context<S> {
  model: Model<S>,
  current: usize,
  // Name from the most recent `g` line.
  current_name: Option<S>,
}

impl<'a, S: Text<'a>> Context<S> {
  pub(crate) fn new(flags: ParseFlags) -> Result<Self, ParseError> {
    Ok(Context {
      model: Model::new(flags)?,
      current: 0,
      current_name: None,
    })
  }

  pub(crate) fn finish(self) -> Model<S> {
    self.model
  }

  pub(crate) fn apply(&mut self, statement: Statement<'a>, line: usize) -> Result<(), ParseError> {
    match statement {
      Statement::Vertex(v) => {
        grow(&mut self.model.vertices, 3, line)?;
        self.model.vertices.extend_from_slice(&v[..3]);
      }
      Statement::TexCoord(t) => {
        grow(&mut self.model.texcoords, 2, line)?;
        self.model.texcoords.extend_from_slice(&t[..2]);
      }
      Statement::Normal(n) => {
        grow(&mut self.model.normals, 3, line)?;
        self.model.normals.extend_from_slice(&n);
      }
      Statement::Face(corners) => self.add_face(corners, line)?,
      Statement::Group(names) => self.set_group(names, line)?,
      Statement::UseMaterial(Some(name)) => self.set_material(extract(name, line)?, line)?,
      Statement::UseMaterial(None) => debug!("line {}: `usemtl` without a name", line),
      Statement::MaterialLibrary(files) => {
        for file in files {
          grow(&mut self.model.material_libraries, 1, line)?;
          self.model.material_libraries.push(extract(file, line)?);
        }
      }
    }
    Ok(())
  }

  fn counts(&self) -> Counts {
    Counts {
      vertices: self.model.vertex_count(),
      texcoords: self.model.texcoord_count(),
      normals: self.model.normal_count(),
    }
  }

  fn add_face(&mut self, corners: Words<'a>, line: usize) -> Result<(), ParseError> {
    let counts = self.counts();
    let triangulate = self.model.flags.triangulate;
    let group = &mut self.model.groups[self.current];
    let start = group.indices.len();
    let mut num_corners = 0;

    for token in corners {
      let corner = parse_triplet(token, counts);
      if triangulate && num_corners >= 3 {
        // Fan: every extra corner closes a triangle with the first corner
        // and the one before it.
        let first = group.indices[start];
        let previous = group.indices[group.indices.len() - 1];
        grow(&mut group.indices, 3, line)?;
        group.indices.extend_from_slice(&[first, previous, corner]);
        grow(&mut group.face_sizes, 1, line)?;
        group.face_sizes.push(3);
      } else {
        grow(&mut group.indices, 1, line)?;
        group.indices.push(corner);
      }
      num_corners += 1;

      if triangulate && num_corners == 3 {
        grow(&mut group.face_sizes, 1, line)?;
        group.face_sizes.push(3);
      }
    }

    if num_corners > 0 && !(triangulate && num_corners >= 3) {
      grow(&mut group.face_sizes, 1, line)?;
      group.face_sizes.push(num_corners);
    }
    Ok(())
  }

  fn set_group(&mut self, mut names: Words<'a>, line: usize) -> Result<(), ParseError> {
    let first = match names.next() {
      Some(first) => first,
      None => {
        debug!("line {}: `g` without a name", line);
        return Ok(());
      }
    };
    let extra = names.count();
    if extra > 0 {
      debug!("line {}: keeping only `{}`, dropping {} more group names", line, first, extra);
    }

    let name: S = extract(first, line)?;
    self.current_name = Some(duplicate(&name, line)?);

    if self.model.groups[self.current].num_faces() == 0 {
      // Nothing references the empty group yet, so just rename it.
      self.model.groups[self.current].name = Some(name);
    } else {
      self.push_group(Group::new(Some(name)), line)?;
    }
    Ok(())
  }

  fn set_material(&mut self, material: S, line: usize) -> Result<(), ParseError> {
    if self.model.flags.optimize_meshes {
      if let Some(found) = self.find_group(&material) {
        if found != self.current {
          self.retire_current(found);
        }
        self.model.groups[self.current].material = Some(material);
        return Ok(());
      }
    }

    if self.model.groups[self.current].num_faces() > 0 {
      let last = self.model.groups.len() - 1;
      // Spell the name out only if inheriting from the tail would change it.
      let name = match (self.effective_name(self.current), self.effective_name(last)) {
        (Some(name), inherited) if inherited != Some(name) => Some(duplicate(name, line)?),
        _ => None,
      };
      let mut group = Group::new(name);
      group.material = Some(material);
      self.push_group(group, line)?;
    } else {
      self.model.groups[self.current].material = Some(material);
    }
    Ok(())
  }

  /// The first group whose inherited name and material match the current
  /// group name and `material`.
  fn find_group(&self, material: &S) -> Option<usize> {
    let mut last_name = None;
    let mut last_material = None;

    for (index, group) in self.model.groups.iter().enumerate() {
      if group.name.is_some() {
        last_name = group.name.as_ref();
      }
      if group.material.is_some() {
        last_material = group.material.as_ref();
      }
      let name_matches = match &self.current_name {
        None => true,
        Some(current) => last_name == Some(current),
      };
      if name_matches && last_material == Some(material) {
        return Some(index);
      }
    }
    None
  }

  fn effective_name(&self, index: usize) -> Option<&S> {
    self.model.groups[..=index]
      .iter()
      .rev()
      .find_map(|group| group.name.as_ref())
  }

  /// Switches to the group at `next`. An empty group at the tail is dropped
  /// on the way out since no face will ever land in it.
  fn retire_current(&mut self, next: usize) {
    let last = self.model.groups.len() - 1;
    if self.current == last && last > 0 && self.model.groups[last].num_faces() == 0 {
      self.model.groups.pop();
    }
    self.current = next;
  }

  fn push_group(&mut self, group: Group<S>, line: usize) -> Result<(), ParseError> {
    grow(&mut self.model.groups, 1, line)?;
    self.model.groups.push(group);
    self.current = self.model.groups.len() - 1;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use crate::obj::{parse, Model, ParseFlags};

  const QUAD: &str = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\n";

  fn load(body: &str, flags: ParseFlags) -> Model {
    parse(&format!("{}{}", QUAD, body), flags).unwrap()
  }

  fn names(model: &Model) -> Vec<(Option<&str>, Option<&str>, usize)> {
    model
      .groups
      .iter()
      .map(|g| (g.name.as_deref(), g.material.as_deref(), g.num_faces()))
      .collect()
  }

  #[test]
  fn appends_positions_texcoords_and_normals() {
    let model = parse(
      "v 1 2 3\nv 4 5 6 1\nvt 0.25 0.75 0\nvn 0 0 1\n",
      ParseFlags::default(),
    )
    .unwrap();
    assert_eq!(model.vertices, vec![1., 2., 3., 4., 5., 6.]);
    assert_eq!(model.texcoords, vec![0.25, 0.75]);
    assert_eq!(model.normals, vec![0., 0., 1.]);
    assert_eq!(model.vertex_count(), 2);
  }

  #[test]
  fn quad_without_triangulation() {
    let model = load("f 1 2 3 4\n", ParseFlags::default());
    assert_eq!(model.groups[0].face_sizes, vec![4]);
    assert_eq!(model.groups[0].indices.len(), 4);
  }

  #[test]
  fn quad_is_fanned_into_two_triangles() {
    let model = load("f 1 2 3 4\n", ParseFlags::default().with_triangulate(true));
    let group = &model.groups[0];
    assert_eq!(group.face_sizes, vec![3, 3]);
    assert_eq!(
      group.indices,
      vec![
        (0, None, None),
        (1, None, None),
        (2, None, None),
        (0, None, None),
        (2, None, None),
        (3, None, None),
      ]
    );
  }

  #[test]
  fn short_faces_keep_their_size_when_triangulating() {
    let model = load("f 1 2\n", ParseFlags::default().with_triangulate(true));
    assert_eq!(model.groups[0].face_sizes, vec![2]);
    assert_eq!(model.groups[0].indices.len(), 2);
  }

  #[test]
  fn relative_indices_match_absolute_ones() {
    let flags = ParseFlags::default();
    let absolute = load("vt 0 0\nvn 0 0 1\nf 1/1/1 2/1/1 3/1/1\n", flags);
    let relative = load("vt 0 0\nvn 0 0 1\nf -4/-1/-1 -3/-1/-1 -2/-1/-1\n", flags);
    assert_eq!(relative.groups[0].indices[0], (0, Some(0), Some(0)));
    assert_eq!(absolute.groups[0].indices[1], (1, Some(0), Some(0)));
    assert_eq!(relative.groups[0].indices[1], (1, Some(0), Some(0)));
  }

  #[test]
  fn relative_indices_resolve_against_counts_before_the_face() {
    let model = load("f -3 -2 -1\nv 9 9 9\nf -1 -2 -3\n", ParseFlags::default());
    let indices = &model.groups[0].indices;
    assert_eq!(
      indices[..3],
      [(1, None, None), (2, None, None), (3, None, None)]
    );
    assert_eq!(
      indices[3..],
      [(4, None, None), (3, None, None), (2, None, None)]
    );
  }

  #[test]
  fn group_after_empty_group_renames() {
    let model = load("g first\ng second\nf 1 2 3\n", ParseFlags::default());
    assert_eq!(names(&model), vec![(Some("second"), None, 1)]);
  }

  #[test]
  fn group_after_faces_appends() {
    let model = load("g first\nf 1 2 3\ng second\nf 1 3 4\n", ParseFlags::default());
    assert_eq!(
      names(&model),
      vec![(Some("first"), None, 1), (Some("second"), None, 1)]
    );
  }

  #[test]
  fn group_keeps_first_name_only() {
    let model = load("g a b c\nf 1 2 3\n", ParseFlags::default());
    assert_eq!(names(&model), vec![(Some("a"), None, 1)]);
  }

  #[test]
  fn usemtl_twice_on_empty_group_overwrites() {
    let model = load("usemtl red\nusemtl blue\nf 1 2 3\n", ParseFlags::default());
    assert_eq!(names(&model), vec![(None, Some("blue"), 1)]);
  }

  #[test]
  fn usemtl_after_faces_appends() {
    let model = load("usemtl red\nf 1 2 3\nusemtl blue\nf 1 3 4\n", ParseFlags::default());
    assert_eq!(
      names(&model),
      vec![(None, Some("red"), 1), (None, Some("blue"), 1)]
    );
  }

  #[test]
  fn optimize_merges_groups_with_same_material() {
    let body = "g hull\nusemtl red\nf 1 2 3\nusemtl blue\nf 1 3 4\nusemtl red\nf 2 3 4\n";

    let plain = load(body, ParseFlags::default());
    assert_eq!(plain.groups.len(), 3);

    let merged = load(body, ParseFlags::default().with_optimize_meshes(true));
    assert_eq!(
      names(&merged),
      vec![(Some("hull"), Some("red"), 2), (None, Some("blue"), 1)]
    );
  }

  #[test]
  fn optimize_does_not_merge_across_group_names() {
    let body = "g a\nusemtl red\nf 1 2 3\ng b\nusemtl red\nf 1 3 4\n";
    let model = load(body, ParseFlags::default().with_optimize_meshes(true));
    assert_eq!(
      names(&model),
      vec![(Some("a"), Some("red"), 1), (Some("b"), Some("red"), 1)]
    );
  }

  #[test]
  fn optimize_retires_empty_tail_group() {
    let body = "usemtl red\nf 1 2 3\nusemtl blue\nusemtl red\nf 1 3 4\n";
    let model = load(body, ParseFlags::default().with_optimize_meshes(true));
    assert_eq!(names(&model), vec![(None, Some("red"), 2)]);
  }

  #[test]
  fn new_material_group_after_switch_names_itself() {
    let body = "g a\nusemtl red\nf 1 2 3\ng b\nusemtl blue\nf 1 2 3\nusemtl red\n\
                g a\nusemtl red\nf 1 3 4\nusemtl green\nf 2 3 4\n";
    let model = load(body, ParseFlags::default().with_optimize_meshes(true));
    let last = model.groups.last().unwrap();
    assert_eq!(last.name.as_deref(), Some("a"));
    assert_eq!(last.material.as_deref(), Some("green"));
    assert_eq!(model.groups[0].num_faces(), 2);
  }

  #[test]
  fn mtllib_accepts_several_files() {
    let model = parse("mtllib a.mtl b.mtl\nmtllib c.mtl\n", ParseFlags::default()).unwrap();
    assert_eq!(model.material_libraries, vec!["a.mtl", "b.mtl", "c.mtl"]);
  }

  #[test]
  fn unknown_lines_are_inert() {
    let model = load("o thing\ns 1\nl 1 2\nvp 0.5\nf 1 2 3\n", ParseFlags::default());
    assert_eq!(model.groups.len(), 1);
    assert_eq!(model.groups[0].face_sizes, vec![3]);
  }
}
