//! CPU-side body meshes: OBJ loading, the built-in icosphere, tangent
//! generation and the unit circle used for orbit rings.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use glam::{Vec2, Vec3};
use orrery_scene::MeshHandle;

use crate::buffer::{BufferAllocator, LineVertex, MeshBuffer, MeshVertex};

/// Errors raised while loading a mesh from disk.
#[derive(Debug, thiserror::Error)]
pub enum MeshError {
    #[error("failed to open mesh {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse OBJ {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: obj::ObjError,
    },

    /// The file parsed but holds no triangles.
    #[error("mesh {} contains no triangles", .path.display())]
    Empty { path: PathBuf },
}

/// Triangle-list geometry ready for upload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn upload(&self, device: &wgpu::Device, label: &str) -> MeshBuffer {
        BufferAllocator::new(device).create_mesh(label, &self.vertices, &self.indices)
    }
}

/// Uploaded meshes addressed by [`MeshHandle`].
#[derive(Default)]
pub struct MeshStore {
    meshes: Vec<MeshBuffer>,
}

impl MeshStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, mesh: MeshBuffer) -> MeshHandle {
        self.meshes.push(mesh);
        MeshHandle(self.meshes.len() as u32 - 1)
    }

    pub fn get(&self, handle: MeshHandle) -> Option<&MeshBuffer> {
        self.meshes.get(handle.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }
}

/// Loads a triangulated OBJ file and generates tangents for it.
pub fn load_obj(path: &Path) -> Result<MeshData, MeshError> {
    let file = File::open(path).map_err(|source| MeshError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed: obj::Obj<obj::TexturedVertex, u32> =
        obj::load_obj(BufReader::new(file)).map_err(|source| MeshError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    if parsed.indices.len() < 3 {
        return Err(MeshError::Empty {
            path: path.to_path_buf(),
        });
    }

    let vertices = parsed
        .vertices
        .iter()
        .map(|v| MeshVertex {
            position: v.position,
            normal: v.normal,
            uv: [v.texture[0], 1.0 - v.texture[1]],
            tangent: [0.0; 4],
        })
        .collect();
    let mut mesh = MeshData {
        vertices,
        indices: parsed.indices,
    };
    generate_tangents(&mut mesh);
    log::info!(
        "Loaded mesh {} ({} vertices, {} triangles)",
        path.display(),
        mesh.vertices.len(),
        mesh.triangle_count()
    );
    Ok(mesh)
}

/// A unit icosphere with equirectangular UVs and tangents.
///
/// Each subdivision splits every triangle into four; 4 subdivisions give
/// 5120 triangles.
pub fn icosphere(subdivisions: u32) -> MeshData {
    let t = (1.0 + 5.0_f32.sqrt()) / 2.0;
    let mut positions: Vec<Vec3> = [
        (-1.0, t, 0.0),
        (1.0, t, 0.0),
        (-1.0, -t, 0.0),
        (1.0, -t, 0.0),
        (0.0, -1.0, t),
        (0.0, 1.0, t),
        (0.0, -1.0, -t),
        (0.0, 1.0, -t),
        (t, 0.0, -1.0),
        (t, 0.0, 1.0),
        (-t, 0.0, -1.0),
        (-t, 0.0, 1.0),
    ]
    .into_iter()
    .map(|(x, y, z)| Vec3::new(x, y, z).normalize())
    .collect();

    let mut indices: Vec<u32> = vec![
        0, 11, 5, 0, 5, 1, 0, 1, 7, 0, 7, 10, 0, 10, 11, 1, 5, 9, 5, 11, 4, 11, 10, 2, 10, 7, 6, 7,
        1, 8, 3, 9, 4, 3, 4, 2, 3, 2, 6, 3, 6, 8, 3, 8, 9, 4, 9, 5, 2, 4, 11, 6, 2, 10, 8, 6, 7, 9,
        8, 1,
    ];

    for _ in 0..subdivisions {
        subdivide(&mut positions, &mut indices);
    }

    let vertices = positions
        .iter()
        .map(|p| MeshVertex {
            position: p.to_array(),
            normal: p.to_array(),
            uv: [
                0.5 + p.z.atan2(p.x) / std::f32::consts::TAU,
                0.5 - p.y.asin() / std::f32::consts::PI,
            ],
            tangent: [0.0; 4],
        })
        .collect();

    let mut mesh = MeshData { vertices, indices };
    generate_tangents(&mut mesh);
    mesh
}

fn subdivide(positions: &mut Vec<Vec3>, indices: &mut Vec<u32>) {
    let mut midpoints: HashMap<(u32, u32), u32> = HashMap::new();
    let mut midpoint = |a: u32, b: u32, positions: &mut Vec<Vec3>| -> u32 {
        let key = (a.min(b), a.max(b));
        *midpoints.entry(key).or_insert_with(|| {
            positions.push((positions[a as usize] + positions[b as usize]).normalize());
            positions.len() as u32 - 1
        })
    };

    let mut next = Vec::with_capacity(indices.len() * 4);
    for tri in indices.chunks_exact(3) {
        let (a, b, c) = (tri[0], tri[1], tri[2]);
        let ab = midpoint(a, b, positions);
        let bc = midpoint(b, c, positions);
        let ca = midpoint(c, a, positions);
        next.extend_from_slice(&[a, ab, ca, b, bc, ab, c, ca, bc, ab, bc, ca]);
    }
    *indices = next;
}

/// Fills per-vertex tangents from UV derivatives.
///
/// Tangents are accumulated per triangle, then orthogonalized against the
/// normal. `w` carries the bitangent handedness. Degenerate UVs fall back to
/// any vector perpendicular to the normal.
pub fn generate_tangents(mesh: &mut MeshData) {
    let count = mesh.vertices.len();
    let mut tangents = vec![Vec3::ZERO; count];
    let mut bitangents = vec![Vec3::ZERO; count];

    for tri in mesh.indices.chunks_exact(3) {
        let [i0, i1, i2] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        if i0 >= count || i1 >= count || i2 >= count {
            continue;
        }
        let (v0, v1, v2) = (&mesh.vertices[i0], &mesh.vertices[i1], &mesh.vertices[i2]);
        let e1 = Vec3::from(v1.position) - Vec3::from(v0.position);
        let e2 = Vec3::from(v2.position) - Vec3::from(v0.position);
        let d1 = Vec2::from(v1.uv) - Vec2::from(v0.uv);
        let d2 = Vec2::from(v2.uv) - Vec2::from(v0.uv);

        let det = d1.x * d2.y - d2.x * d1.y;
        if det.abs() < f32::EPSILON {
            continue;
        }
        let r = 1.0 / det;
        let tangent = (e1 * d2.y - e2 * d1.y) * r;
        let bitangent = (e2 * d1.x - e1 * d2.x) * r;
        for i in [i0, i1, i2] {
            tangents[i] += tangent;
            bitangents[i] += bitangent;
        }
    }

    for (i, vertex) in mesh.vertices.iter_mut().enumerate() {
        let n = Vec3::from(vertex.normal).normalize_or_zero();
        let t = (tangents[i] - n * n.dot(tangents[i])).normalize_or_zero();
        let t = if t == Vec3::ZERO { n.any_orthonormal_vector() } else { t };
        let handedness = if n.cross(t).dot(bitangents[i]) < 0.0 { -1.0 } else { 1.0 };
        vertex.tangent = t.extend(handedness).to_array();
    }
}

/// Closed unit circle in the XZ plane, `segments + 1` points for a line strip.
pub fn unit_circle(segments: u32) -> Vec<LineVertex> {
    let segments = segments.max(3);
    (0..=segments)
        .map(|i| {
            let angle = std::f32::consts::TAU * i as f32 / segments as f32;
            LineVertex {
                position: [angle.cos(), 0.0, angle.sin()],
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_icosphere_vertices_on_unit_sphere() {
        let mesh = icosphere(3);
        for v in &mesh.vertices {
            let len = Vec3::from(v.position).length();
            assert!((len - 1.0).abs() < 1e-5, "vertex off the sphere: {len}");
        }
    }

    #[test]
    fn test_icosphere_triangle_count() {
        assert_eq!(icosphere(0).triangle_count(), 20);
        assert_eq!(icosphere(4).triangle_count(), 20 * 4usize.pow(4));
    }

    #[test]
    fn test_icosphere_indices_valid() {
        let mesh = icosphere(2);
        let n = mesh.vertices.len() as u32;
        assert!(mesh.indices.iter().all(|&i| i < n));
    }

    #[test]
    fn test_tangents_are_unit_and_perpendicular() {
        let mesh = icosphere(2);
        for v in &mesh.vertices {
            let t = Vec3::new(v.tangent[0], v.tangent[1], v.tangent[2]);
            let n = Vec3::from(v.normal);
            assert!((t.length() - 1.0).abs() < 1e-4);
            assert!(t.dot(n).abs() < 1e-4);
            assert!(v.tangent[3] == 1.0 || v.tangent[3] == -1.0);
        }
    }

    #[test]
    fn test_tangent_follows_u_direction() {
        // A quad in the XY plane with u along +X.
        let mut mesh = MeshData {
            vertices: vec![
                MeshVertex {
                    position: [0.0, 0.0, 0.0],
                    normal: [0.0, 0.0, 1.0],
                    uv: [0.0, 0.0],
                    tangent: [0.0; 4],
                },
                MeshVertex {
                    position: [1.0, 0.0, 0.0],
                    normal: [0.0, 0.0, 1.0],
                    uv: [1.0, 0.0],
                    tangent: [0.0; 4],
                },
                MeshVertex {
                    position: [0.0, 1.0, 0.0],
                    normal: [0.0, 0.0, 1.0],
                    uv: [0.0, 1.0],
                    tangent: [0.0; 4],
                },
            ],
            indices: vec![0, 1, 2],
        };
        generate_tangents(&mut mesh);
        for v in &mesh.vertices {
            assert_eq!(v.tangent, [1.0, 0.0, 0.0, 1.0]);
        }
    }

    #[test]
    fn test_unit_circle_is_closed() {
        let circle = unit_circle(64);
        assert_eq!(circle.len(), 65);
        let first = Vec3::from(circle[0].position);
        let last = Vec3::from(circle[64].position);
        assert!(first.abs_diff_eq(last, 1e-5));
        for p in &circle {
            assert!((Vec3::from(p.position).length() - 1.0).abs() < 1e-5);
            assert_eq!(p.position[1], 0.0);
        }
    }

    #[test]
    fn test_load_obj_triangle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tri.obj");
        let mut file = File::create(&path).unwrap();
        writeln!(
            file,
            "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvt 1 0\nvt 0 1\nvn 0 0 1\nf 1/1/1 2/2/1 3/3/1"
        )
        .unwrap();
        drop(file);

        let mesh = load_obj(&path).unwrap();
        assert_eq!(mesh.vertices.len(), 3);
        assert_eq!(mesh.indices, vec![0, 1, 2]);
        // V is flipped for top-left texture origin.
        assert_eq!(mesh.vertices[2].uv, [0.0, 0.0]);
    }

    #[test]
    fn test_load_obj_missing_file() {
        let result = load_obj(Path::new("/nonexistent/sphere.obj"));
        assert!(matches!(result, Err(MeshError::Io { .. })));
    }
}
