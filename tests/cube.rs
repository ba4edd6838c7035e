use wavefront_objloader::mtl;
use wavefront_objloader::obj::{self, ParseFlags};
use wavefront_objloader::ErrorKind;

const CUBE_OBJ: &str = r#"# Blender v2.79 OBJ File
mtllib cube.mtl
o Cube
v 1.000000 -1.000000 -1.000000
v 1.000000 -1.000000 1.000000
v -1.000000 -1.000000 1.000000
v -1.000000 -1.000000 -1.000000
v 1.000000 1.000000 -0.999999
v 0.999999 1.000000 1.000001
v -1.000000 1.000000 1.000000
v -1.000000 1.000000 -1.000000
vt 0.0 0.0
vt 1.0 0.0
vt 1.0 1.0
vt 0.0 1.0
vn 0.0000 -1.0000 0.0000
vn 0.0000 1.0000 0.0000
vn 1.0000 0.0000 0.0000
vn -0.0000 -0.0000 1.0000
vn -1.0000 -0.0000 -0.0000
vn 0.0000 0.0000 -1.0000
g Cube_Cube.001
usemtl Material
s off
f 1/1/1 2/2/1 3/3/1 4/4/1
f 5/1/2 8/2/2 7/3/2 6/4/2
f 1/1/3 5/2/3 6/3/3 2/4/3
usemtl Trim
f 2/1/4 6/2/4 7/3/4 3/4/4
f 3/1/5 7/2/5 8/3/5 4/4/5
usemtl Material
f 5/1/6 1/2/6 4/3/6 8/4/6
"#;

const CUBE_MTL: &str = r#"# Blender MTL File: 'None'
# Material Count: 2

newmtl Material
Ns 96.078431
Ka 1.000000 1.000000 1.000000
Kd 0.640000 0.640000 0.640000
Ks 0.500000 0.500000 0.500000
Ke 0.000000 0.000000 0.000000
Ni 1.000000
d 1.000000
illum 2
map_Kd cube.png

newmtl Trim
Ns 10.000000
Kd 0.800000 0.100000 0.100000
Tr 0.750000
illum 1
"#;

#[test]
fn cube_loads_with_attributes() {
  let model = obj::parse(CUBE_OBJ, ParseFlags::default()).unwrap();
  assert_eq!(model.vertex_count(), 8);
  assert_eq!(model.texcoord_count(), 4);
  assert_eq!(model.normal_count(), 6);
  assert_eq!(model.material_libraries, vec!["cube.mtl"]);
  assert_eq!(&model.vertices[12..15], &[1.0, 1.0, -0.999999]);
}

#[test]
fn cube_groups_split_by_material() {
  let model = obj::parse(CUBE_OBJ, ParseFlags::default()).unwrap();
  let summary: Vec<(Option<&str>, Option<&str>, usize)> = model
    .groups
    .iter()
    .map(|g| (g.name.as_deref(), g.material.as_deref(), g.num_faces()))
    .collect();
  assert_eq!(
    summary,
    vec![
      (Some("Cube_Cube.001"), Some("Material"), 3),
      (None, Some("Trim"), 2),
      (None, Some("Material"), 1),
    ]
  );
}

#[test]
fn cube_merges_material_runs_when_optimizing() {
  let flags = ParseFlags::default()
    .with_optimize_meshes(true)
    .with_triangulate(true);
  let model = obj::parse(CUBE_OBJ, flags).unwrap();
  assert_eq!(model.groups.len(), 2);
  assert_eq!(model.groups[0].material.as_deref(), Some("Material"));
  assert_eq!(model.groups[0].num_faces(), 8);
  assert_eq!(model.groups[1].material.as_deref(), Some("Trim"));
  assert_eq!(model.groups[1].num_faces(), 4);
  for group in &model.groups {
    assert!(group.face_sizes.iter().all(|&n| n == 3));
  }
  assert_eq!(model.groups[0].indices[0], (0, Some(0), Some(0)));
}

#[test]
fn cube_materials() {
  let materials = mtl::parse(CUBE_MTL).unwrap();
  assert_eq!(materials.len(), 2);

  let material = &materials[0];
  assert_eq!(material.name, "Material");
  assert_eq!(material.ambient, [1.0, 1.0, 1.0]);
  assert_eq!(material.diffuse, [0.64, 0.64, 0.64]);
  assert_eq!(material.opacity, 1.0);
  assert_eq!(material.diffuse_texture.as_deref(), Some("cube.png"));

  let trim = &materials[1];
  assert_eq!(trim.name, "Trim");
  assert_eq!(trim.shininess, 10.0);
  assert_eq!(trim.opacity, 0.75);
  assert_eq!(trim.specular, [0.0, 0.0, 0.0]);
}

#[test]
fn model_names_resolve_against_materials() {
  let model = obj::parse_in_situ(CUBE_OBJ, ParseFlags::default()).unwrap();
  let materials = mtl::parse_in_situ(CUBE_MTL).unwrap();
  for group in &model.groups {
    let name = group.material.unwrap();
    assert!(materials.iter().any(|m| m.name == name));
  }
}

#[test]
fn material_errors_report_the_line() {
  let err = mtl::parse("\n\nKs 1 1 1\n").unwrap_err();
  assert_eq!(err.line_number, 3);
  assert!(matches!(err.kind, ErrorKind::MaterialFieldOutsideBlock { .. }));
  assert_eq!(err.to_string(), "line 3: `Ks` appears before any `newmtl`");
}
