// Procedural meshes for the demo's three shapes: a unit box (ground slab
// and character body) and a unit sphere (obstacles). Per-instance scale
// turns the unit shapes into world-sized geometry.

use glam::Vec3;

// ============================================================================
// GPU VERTEX
// ============================================================================

/// GPU-ready vertex with position and normal.
///   @location(0) position: vec3<f32>
///   @location(1) normal:   vec3<f32>
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl GpuVertex {
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<GpuVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

// ============================================================================
// RENDER MESH
// ============================================================================

/// Triangulated mesh ready for buffer upload.
pub struct RenderMesh {
    pub vertices: Vec<GpuVertex>,
    pub indices: Vec<u32>,
}

impl RenderMesh {
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }
}

// ============================================================================
// UNIT BOX
// ============================================================================

/// Axis-aligned box with half-extent 1 on each axis and flat per-face
/// normals. CCW winding viewed from outside (back-face culling on).
pub fn unit_box() -> RenderMesh {
    let mut mesh = RenderMesh {
        vertices: Vec::with_capacity(24),
        indices: Vec::with_capacity(36),
    };

    let mut quad = |corners: [Vec3; 4], normal: Vec3| {
        let base = mesh.vertices.len() as u32;
        for corner in corners {
            mesh.vertices.push(GpuVertex {
                position: corner.to_array(),
                normal: normal.to_array(),
            });
        }
        mesh.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    };

    let (n, p) = (-1.0, 1.0);
    quad(
        [
            Vec3::new(n, n, p),
            Vec3::new(p, n, p),
            Vec3::new(p, p, p),
            Vec3::new(n, p, p),
        ],
        Vec3::Z,
    );
    quad(
        [
            Vec3::new(p, n, n),
            Vec3::new(n, n, n),
            Vec3::new(n, p, n),
            Vec3::new(p, p, n),
        ],
        Vec3::NEG_Z,
    );
    quad(
        [
            Vec3::new(p, n, p),
            Vec3::new(p, n, n),
            Vec3::new(p, p, n),
            Vec3::new(p, p, p),
        ],
        Vec3::X,
    );
    quad(
        [
            Vec3::new(n, n, n),
            Vec3::new(n, n, p),
            Vec3::new(n, p, p),
            Vec3::new(n, p, n),
        ],
        Vec3::NEG_X,
    );
    quad(
        [
            Vec3::new(n, p, p),
            Vec3::new(p, p, p),
            Vec3::new(p, p, n),
            Vec3::new(n, p, n),
        ],
        Vec3::Y,
    );
    quad(
        [
            Vec3::new(n, n, n),
            Vec3::new(p, n, n),
            Vec3::new(p, n, p),
            Vec3::new(n, n, p),
        ],
        Vec3::NEG_Y,
    );

    mesh
}

// ============================================================================
// UNIT SPHERE
// ============================================================================

/// Latitude/longitude sphere of radius 1 with smooth normals
/// (normal == position on a unit sphere).
pub fn unit_sphere(rings: u32, segments: u32) -> RenderMesh {
    let mut vertices = Vec::with_capacity(((rings + 1) * (segments + 1)) as usize);
    let mut indices = Vec::with_capacity((rings * segments * 6) as usize);

    for ring in 0..=rings {
        let theta = std::f32::consts::PI * ring as f32 / rings as f32;
        let (sin_t, cos_t) = theta.sin_cos();
        for segment in 0..=segments {
            let phi = std::f32::consts::TAU * segment as f32 / segments as f32;
            let (sin_p, cos_p) = phi.sin_cos();
            let position = [sin_t * cos_p, cos_t, sin_t * sin_p];
            vertices.push(GpuVertex {
                position,
                normal: position,
            });
        }
    }

    for ring in 0..rings {
        for segment in 0..segments {
            let a = ring * (segments + 1) + segment;
            let b = a + segments + 1;
            indices.extend_from_slice(&[a, a + 1, b, b, a + 1, b + 1]);
        }
    }

    RenderMesh { vertices, indices }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_has_24_vertices_and_12_triangles() {
        let mesh = unit_box();
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.index_count(), 36);
    }

    #[test]
    fn box_normals_are_axis_aligned_units() {
        for v in unit_box().vertices {
            let n = Vec3::from_array(v.normal);
            assert!((n.length() - 1.0).abs() < 1e-6);
            assert_eq!(n.abs().max_element(), 1.0);
        }
    }

    #[test]
    fn sphere_vertices_sit_on_the_unit_sphere() {
        let mesh = unit_sphere(8, 12);
        for v in &mesh.vertices {
            let p = Vec3::from_array(v.position);
            assert!((p.length() - 1.0).abs() < 1e-5);
        }
        // All indices in range.
        let count = mesh.vertices.len() as u32;
        assert!(mesh.indices.iter().all(|&i| i < count));
    }
}
