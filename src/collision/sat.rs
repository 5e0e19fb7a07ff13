//! Separating Axis Theorem over arbitrary convex polygons.
//!
//! Grounded on the teacher's `physics::collision::sat` (`Projection`
//! with `project`/`separated`/`overlap`), generalized from a
//! const-generic `[Vec2<f32>; SIZE]` (the teacher only ever projects a
//! 4-vertex rectangle) to a plain slice so it also covers triangles and
//! arbitrary polygons.

use crate::math::Vector2;

/// Projection of a polygon onto an axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub min: f64,
    pub max: f64,
}

impl Projection {
    pub fn project(vertices: &[Vector2], axis: Vector2) -> Self {
        let mut min = axis.dot(vertices[0]);
        let mut max = min;
        for vertex in &vertices[1..] {
            let proj = axis.dot(*vertex);
            min = min.min(proj);
            max = max.max(proj);
        }
        Self { min, max }
    }

    pub fn separated(&self, other: Self) -> bool {
        other.max < self.min || self.max < other.min
    }

    pub fn overlap(&self, other: Self) -> f64 {
        (self.max.min(other.max) - self.min.max(other.min)).max(0.0)
    }
}

/// Edge normals of a convex polygon given in winding order, pointing
/// outward.
pub fn edge_normals(vertices: &[Vector2]) -> Vec<Vector2> {
    let n = vertices.len();
    (0..n)
        .map(|i| {
            let a = vertices[i];
            let b = vertices[(i + 1) % n];
            let edge = b - a;
            Vector2::new(edge.y, -edge.x).normalized()
        })
        .collect()
}

/// Which polygon's edge produced the separating axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceShape {
    A,
    B,
}

/// Result of a successful SAT test: the minimum translation vector
/// direction (pointing from `a` into `b`) and the overlap depth along it.
#[derive(Debug, Clone, Copy)]
pub struct MinimumTranslation {
    pub axis: Vector2,
    pub overlap: f64,
    pub reference: ReferenceShape,
}

/// Find the minimum-overlap separating axis between two convex polygons,
/// or `None` if some axis separates them entirely.
pub fn minimum_translation(a_vertices: &[Vector2], b_vertices: &[Vector2]) -> Option<MinimumTranslation> {
    let mut best: Option<MinimumTranslation> = None;

    let a_axes = edge_normals(a_vertices)
        .into_iter()
        .map(|axis| (axis, ReferenceShape::A));
    let b_axes = edge_normals(b_vertices)
        .into_iter()
        .map(|axis| (axis, ReferenceShape::B));

    for (axis, reference) in a_axes.chain(b_axes) {
        let a_proj = Projection::project(a_vertices, axis);
        let b_proj = Projection::project(b_vertices, axis);

        if a_proj.separated(b_proj) {
            return None;
        }

        let overlap = a_proj.overlap(b_proj);
        let centered_axis = if a_proj.min < b_proj.min { axis } else { -axis };

        if best.map_or(true, |current| overlap < current.overlap) {
            best = Some(MinimumTranslation {
                axis: centered_axis,
                overlap,
                reference,
            });
        }
    }

    best
}

/// Clip the incident edge of `incident` against the side planes of the
/// reference edge of `reference`, producing up to 2 contact points.
///
/// `axis` points from the reference polygon into the incident polygon.
pub fn clip_contact_points(
    reference: &[Vector2],
    incident: &[Vector2],
    axis: Vector2,
) -> Vec<Vector2> {
    let ref_normals = edge_normals(reference);
    let (ref_edge_index, _) = ref_normals
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| {
            a.dot(axis)
                .partial_cmp(&b.dot(axis))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .expect("reference polygon has at least one edge");

    let inc_normals = edge_normals(incident);
    let (inc_edge_index, _) = inc_normals
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            a.dot(axis)
                .partial_cmp(&b.dot(axis))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .expect("incident polygon has at least one edge");

    let ref_n = reference.len();
    let ref_a = reference[ref_edge_index];
    let ref_b = reference[(ref_edge_index + 1) % ref_n];
    let ref_normal = ref_normals[ref_edge_index];

    let inc_n = incident.len();
    let mut points = vec![
        incident[inc_edge_index],
        incident[(inc_edge_index + 1) % inc_n],
    ];

    let tangent = (ref_b - ref_a).normalized();
    points = clip_against_plane(&points, -tangent, -tangent.dot(ref_a));
    if points.len() < 2 {
        return points;
    }
    points = clip_against_plane(&points, tangent, tangent.dot(ref_b));
    if points.len() < 2 {
        return points;
    }

    points
        .into_iter()
        .filter(|p| ref_normal.dot(*p - ref_a) <= 0.0)
        .collect()
}

fn clip_against_plane(points: &[Vector2], normal: Vector2, offset: f64) -> Vec<Vector2> {
    let mut output = Vec::with_capacity(2);
    for i in 0..points.len() {
        let current = points[i];
        let next = points[(i + 1) % points.len()];
        let current_dist = normal.dot(current) - offset;
        let next_dist = normal.dot(next) - offset;

        if current_dist <= 0.0 {
            output.push(current);
        }
        if (current_dist > 0.0) != (next_dist > 0.0) {
            let t = current_dist / (current_dist - next_dist);
            output.push(current + (next - current) * t);
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(center: Vector2, half: f64) -> Vec<Vector2> {
        vec![
            center + Vector2::new(-half, -half),
            center + Vector2::new(half, -half),
            center + Vector2::new(half, half),
            center + Vector2::new(-half, half),
        ]
    }

    #[test]
    fn overlapping_squares_report_overlap() {
        let a = square(Vector2::new(0.0, 0.0), 5.0);
        let b = square(Vector2::new(8.0, 0.0), 5.0);
        let mtv = minimum_translation(&a, &b).unwrap();
        assert!((mtv.overlap - 2.0).abs() < 1e-9);
    }

    #[test]
    fn separated_squares_report_none() {
        let a = square(Vector2::new(0.0, 0.0), 5.0);
        let b = square(Vector2::new(50.0, 0.0), 5.0);
        assert!(minimum_translation(&a, &b).is_none());
    }
}
