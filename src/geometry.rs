use nalgebra::{Point3, Vector3};

/// One cube face: four corners in counter-clockwise order seen from
/// outside the cube.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Square {
    pub a: Point3<f32>,
    pub b: Point3<f32>,
    pub c: Point3<f32>,
    pub d: Point3<f32>,
}

/// Three corners in counter-clockwise order; the unit of renderable
/// geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub a: Point3<f32>,
    pub b: Point3<f32>,
    pub c: Point3<f32>,
}

impl Triangle {
    pub fn new(a: Point3<f32>, b: Point3<f32>, c: Point3<f32>) -> Self {
        Self { a, b, c }
    }

    /// Face normal derived from the winding order; not normalized.
    pub fn normal(&self) -> Vector3<f32> {
        (self.b - self.a).cross(&(self.c - self.a))
    }
}

/// Split each square along the fixed a-d diagonal into the triangles
/// (a, b, d) and (b, c, d).
pub fn triangles_from_squares(squares: &[Square]) -> Vec<Triangle> {
    let mut triangles = Vec::with_capacity(squares.len() * 2);
    for square in squares {
        triangles.push(Triangle::new(square.a, square.b, square.d));
        triangles.push(Triangle::new(square.b, square.c, square.d));
    }
    triangles
}

/// Flat position and normal buffers ready for vertex upload, with the face
/// normal repeated for each of a triangle's three vertices (flat shading).
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MeshBuffers {
    positions: Vec<f32>,
    normals: Vec<f32>,
}

impl MeshBuffers {
    pub fn from_triangles(triangles: &[Triangle]) -> Self {
        let mut buffers = Self::default();
        for triangle in triangles {
            buffers.push_triangle(triangle);
        }
        buffers
    }

    pub fn push_triangle(&mut self, triangle: &Triangle) {
        let normal = triangle
            .normal()
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vector3::zeros);
        for point in [triangle.a, triangle.b, triangle.c] {
            self.positions.extend_from_slice(&[point.x, point.y, point.z]);
        }
        for _ in 0..3 {
            self.normals.extend_from_slice(&[normal.x, normal.y, normal.z]);
        }
    }

    /// Vertex positions, three floats per vertex.
    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    /// Vertex normals, parallel to [`Self::positions`].
    pub fn normals(&self) -> &[f32] {
        &self.normals
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.vertex_count() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Raw bytes of the position buffer, for direct vertex-buffer upload.
    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }

    /// Raw bytes of the normal buffer.
    pub fn normal_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.normals)
    }
}
