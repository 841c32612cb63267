//! Face mesh data: fixed topology, per-frame tracked shape, and the
//! deformed output mesh handed to renderers and the exporter.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{Point, Point3, Triangle};

/// Vertex count and triangle connectivity of the tracked face mesh.
///
/// Computed once per tracking session and reused for every frame until the
/// session resets. Every triangle index is guaranteed to be `< vertex_count`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topology {
    vertex_count: usize,
    triangles: Vec<Triangle>,
}

impl Topology {
    /// Create a topology from triangles already in output winding order.
    pub fn new(vertex_count: usize, triangles: Vec<Triangle>) -> Result<Self> {
        if vertex_count == 0 {
            return Err(Error::InvalidTopology("vertex count must be non-zero".into()));
        }

        for (i, tri) in triangles.iter().enumerate() {
            if let Some(&bad) = tri.indices().iter().find(|&&v| v as usize >= vertex_count) {
                return Err(Error::InvalidTopology(format!(
                    "triangle {} references vertex {} but the mesh has {} vertices",
                    i, bad, vertex_count
                )));
            }
        }

        Ok(Self {
            vertex_count,
            triangles,
        })
    }

    /// Create a topology from the triangle list reported by the face tracker.
    ///
    /// The tracker winds faces for a Z-toward-sensor frame; each triangle is
    /// reversed so faces point outward once depth is flipped.
    pub fn from_tracker(vertex_count: usize, tracker_triangles: &[Triangle]) -> Result<Self> {
        let triangles = tracker_triangles.iter().map(|t| t.reversed()).collect();
        Self::new(vertex_count, triangles)
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn num_triangles(&self) -> usize {
        self.triangles.len()
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// Flatten to `[a0, b0, c0, a1, b1, c1, ...]`.
    pub fn flat_indices(&self) -> Vec<u32> {
        self.triangles.iter().flat_map(|t| t.indices()).collect()
    }
}

/// One tracking frame's face shape: 3D landmark positions plus their
/// projections into the color image (in pixels).
///
/// Index `i` always refers to the same facial landmark.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ShapeFrame {
    pub points: Vec<Point3>,
    pub projected: Vec<Point>,
}

impl ShapeFrame {
    pub fn new(points: Vec<Point3>, projected: Vec<Point>) -> Self {
        Self { points, projected }
    }

    pub fn num_landmarks(&self) -> usize {
        self.points.len()
    }

    /// Whether the shape covers exactly `vertex_count` landmarks in both the
    /// 3D and the projected sequences.
    pub fn matches(&self, vertex_count: usize) -> bool {
        self.points.len() == vertex_count && self.projected.len() == vertex_count
    }
}

/// Deformed positions, texture coordinates and flat triangle indices.
///
/// Allocated once per session, then overwritten in place every frame.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OutputMesh {
    pub(crate) positions: Vec<Point3>,
    pub(crate) texcoords: Vec<Point>,
    pub(crate) indices: Vec<u32>,
}

impl OutputMesh {
    /// Build a mesh from its parts, checking that they agree with each other.
    pub fn new(positions: Vec<Point3>, texcoords: Vec<Point>, indices: Vec<u32>) -> Result<Self> {
        let mesh = Self {
            positions,
            texcoords,
            indices,
        };
        mesh.validate()?;
        Ok(mesh)
    }

    /// Allocate a zeroed mesh sized for `topology`, with its indices filled in.
    pub fn for_topology(topology: &Topology) -> Self {
        let n = topology.vertex_count();
        Self {
            positions: vec![Point3::zero(); n],
            texcoords: vec![Point::zero(); n],
            indices: topology.flat_indices(),
        }
    }

    pub fn positions(&self) -> &[Point3] {
        &self.positions
    }

    pub fn texcoords(&self) -> &[Point] {
        &self.texcoords
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn num_vertices(&self) -> usize {
        self.positions.len()
    }

    pub fn num_triangles(&self) -> usize {
        self.indices.len() / 3
    }

    /// Iterate over faces as index triples.
    pub fn triangles(&self) -> impl Iterator<Item = Triangle> + '_ {
        self.indices
            .chunks_exact(3)
            .map(|c| Triangle::new(c[0], c[1], c[2]))
    }

    /// Check the cardinality invariants the exporter relies on.
    pub fn validate(&self) -> Result<()> {
        if self.positions.len() != self.texcoords.len() {
            return Err(Error::InconsistentMesh(format!(
                "{} positions but {} texture coordinates",
                self.positions.len(),
                self.texcoords.len()
            )));
        }

        if self.indices.len() % 3 != 0 {
            return Err(Error::InconsistentMesh(format!(
                "index count {} is not a multiple of 3",
                self.indices.len()
            )));
        }

        let n = self.positions.len();
        if let Some(&bad) = self.indices.iter().find(|&&i| i as usize >= n) {
            return Err(Error::InconsistentMesh(format!(
                "index {} out of range for {} vertices",
                bad, n
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topology_rejects_out_of_range_indices() {
        let err = Topology::new(3, vec![Triangle::new(0, 1, 3)]).unwrap_err();
        assert!(matches!(err, Error::InvalidTopology(_)));

        assert!(Topology::new(0, vec![]).is_err());
        assert!(Topology::new(3, vec![Triangle::new(0, 1, 2)]).is_ok());
    }

    #[test]
    fn tracker_triangles_are_reversed() {
        let topology =
            Topology::from_tracker(4, &[Triangle::new(0, 1, 2), Triangle::new(1, 2, 3)]).unwrap();

        assert_eq!(topology.num_triangles(), 2);
        assert_eq!(topology.flat_indices(), vec![2, 1, 0, 3, 2, 1]);
    }

    #[test]
    fn output_mesh_sized_for_topology() {
        let topology = Topology::new(4, vec![Triangle::new(0, 1, 2), Triangle::new(2, 3, 0)]).unwrap();
        let mesh = OutputMesh::for_topology(&topology);

        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(mesh.texcoords().len(), 4);
        assert_eq!(mesh.indices(), &[0, 1, 2, 2, 3, 0]);
        assert_eq!(mesh.num_triangles(), 2);
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn output_mesh_validation() {
        let positions = vec![Point3::zero(); 3];
        let texcoords = vec![Point::zero(); 3];

        assert!(OutputMesh::new(positions.clone(), texcoords.clone(), vec![0, 1, 2]).is_ok());
        assert!(OutputMesh::new(positions.clone(), vec![Point::zero(); 2], vec![0, 1, 2]).is_err());
        assert!(OutputMesh::new(positions.clone(), texcoords.clone(), vec![0, 1]).is_err());
        assert!(OutputMesh::new(positions, texcoords, vec![0, 1, 3]).is_err());
    }

    #[test]
    fn shape_frame_matching() {
        let frame = ShapeFrame::new(vec![Point3::zero(); 2], vec![Point::zero(); 2]);
        assert!(frame.matches(2));
        assert!(!frame.matches(3));

        let lopsided = ShapeFrame::new(vec![Point3::zero(); 2], vec![Point::zero(); 1]);
        assert!(!lopsided.matches(2));
    }
}
