/// Static demo geometry, ready for upload as flat position arrays
use crate::backend::PrimitiveTopology;

/// Position components per vertex
pub const COORDS_PER_VERTEX: usize = 3;

/// Color components per vertex (RGBA)
pub const COLOR_COMPONENTS: usize = 4;

const RED: [f32; 4] = [1.0, 0.0, 0.0, 1.0];
const GREEN: [f32; 4] = [0.0, 1.0, 0.0, 1.0];
const BLUE: [f32; 4] = [0.0, 0.0, 1.0, 1.0];
const BLACK: [f32; 4] = [0.0, 0.0, 0.0, 1.0];
const PALE_GREY: [f32; 4] = [0.9, 0.9, 0.9, 1.0];

/// Cube corners: front face (z = +1) then back face (z = -1),
/// each listed top-left, bottom-left, bottom-right, top-right.
const CUBE_CORNERS: [[f32; 3]; 8] = [
    [-1.0, 1.0, 1.0],
    [-1.0, -1.0, 1.0],
    [1.0, -1.0, 1.0],
    [1.0, 1.0, 1.0],
    [-1.0, 1.0, -1.0],
    [-1.0, -1.0, -1.0],
    [1.0, -1.0, -1.0],
    [1.0, 1.0, -1.0],
];

const CUBE_CORNER_COLORS: [[f32; 4]; 8] = [RED, GREEN, BLUE, GREEN, RED, GREEN, BLUE, GREEN];

const CUBE_INDICES: [usize; 36] = [
    0, 3, 2, 0, 2, 1, // front
    0, 1, 5, 0, 5, 4, // left
    0, 7, 3, 0, 4, 7, // top
    6, 7, 4, 6, 4, 5, // back
    6, 3, 7, 6, 2, 3, // right
    6, 5, 1, 6, 1, 2, // bottom
];

/// Non-indexed vertex positions and RGBA colors, plus the topology they are
/// meant to be drawn with
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub positions: Vec<f32>,
    pub colors: Vec<f32>,
    pub topology: PrimitiveTopology,
}

impl Shape {
    pub fn new(positions: Vec<f32>, colors: Vec<f32>, topology: PrimitiveTopology) -> Self {
        Self {
            positions,
            colors,
            topology,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len() / COORDS_PER_VERTEX
    }

    /// Axis-aligned cube with edge length `size`, centered on the origin
    pub fn cube(size: f32) -> Self {
        let half = size / 2.0;
        let positions = CUBE_INDICES
            .iter()
            .flat_map(|&i| CUBE_CORNERS[i].map(|c| c * half))
            .collect();
        let colors = CUBE_INDICES
            .iter()
            .flat_map(|&i| CUBE_CORNER_COLORS[i])
            .collect();
        Self::new(positions, colors, PrimitiveTopology::Triangles)
    }

    /// Regular polygon in the XY plane drawn as a fan around its center.
    ///
    /// The rim starts at +Y and closes on itself, so `sides` segments need
    /// `sides + 2` vertices.
    pub fn circle(radius: f32, sides: usize) -> Self {
        Self::fan([0.0, 0.0, 0.0], PALE_GREY, radius, sides)
    }

    /// Cone standing on a circle in the XY plane with its apex at `(0, 0, height)`.
    ///
    /// The apex is dark and the rim pale, so the slope reads as shaded.
    pub fn cone(radius: f32, height: f32, sides: usize) -> Self {
        Self::fan([0.0, 0.0, height], BLACK, radius, sides)
    }

    fn fan(center: [f32; 3], center_color: [f32; 4], radius: f32, sides: usize) -> Self {
        let sides = sides.max(3);
        let step = std::f32::consts::TAU / sides as f32;

        let mut positions = Vec::with_capacity((sides + 2) * COORDS_PER_VERTEX);
        let mut colors = Vec::with_capacity((sides + 2) * COLOR_COMPONENTS);
        positions.extend_from_slice(&center);
        colors.extend_from_slice(&center_color);
        for i in 0..=sides {
            let angle = step * i as f32;
            positions.extend_from_slice(&[radius * angle.sin(), radius * angle.cos(), 0.0]);
            colors.extend_from_slice(&PALE_GREY);
        }
        Self::new(positions, colors, PrimitiveTopology::TriangleFan)
    }

    /// Single triangle listed counter-clockwise
    pub fn triangle() -> Self {
        Self::new(
            vec![
                0.0, 0.6, 0.0, // top
                -0.6, -0.4, 0.0, // bottom left
                0.6, -0.4, 0.0, // bottom right
            ],
            [GREEN, RED, BLUE].concat(),
            PrimitiveTopology::Triangles,
        )
    }
}
