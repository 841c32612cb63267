//! Per-frame mesh deformation.
//!
//! For each vertex `i`:
//!
//! 1. position = `(x, y, -z)` of the tracked point plus the profile offset
//! 2. texture coordinate = projected point divided by the image size
//!
//! Connectivity never changes; only vertices move.

use crate::mesh::{OutputMesh, ShapeFrame, Topology};
use crate::profile::DeformationProfile;
use crate::types::ImageSize;

/// Why a frame produced no output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The tracker flagged the frame as not tracked.
    NotTracked,
    /// The color image has a zero dimension.
    InvalidImageSize,
    /// No topology has been cached and the frame carries no triangle list.
    MissingTopology,
    /// The tracker's triangle list references vertices that don't exist.
    InvalidTopology,
    /// The shape doesn't have one point per topology vertex.
    ShapeMismatch { expected: usize, actual: usize },
}

/// Deform one frame into `output`.
///
/// The frame is validated before anything is written, so a rejected frame
/// leaves the previous output intact. `output` is reshaped to `topology`
/// when its vertex count or indices don't match.
pub fn deform_frame(
    topology: &Topology,
    shape: &ShapeFrame,
    profile: &DeformationProfile,
    image: ImageSize,
    output: &mut OutputMesh,
) -> Result<(), SkipReason> {
    let n = topology.vertex_count();

    if image.is_empty() {
        return Err(SkipReason::InvalidImageSize);
    }

    if !shape.matches(n) {
        log::warn!(
            "Rejecting shape frame: {} points / {} projections for a {}-vertex mesh",
            shape.points.len(),
            shape.projected.len(),
            n
        );
        return Err(SkipReason::ShapeMismatch {
            expected: n,
            actual: shape.points.len().min(shape.projected.len()),
        });
    }

    let same_indices = output
        .indices
        .iter()
        .copied()
        .eq(topology.triangles().iter().flat_map(|t| t.indices()));
    if output.positions.len() != n || output.texcoords.len() != n || !same_indices {
        *output = OutputMesh::for_topology(topology);
    }

    for (i, ((position, texcoord), (point, projected))) in output
        .positions
        .iter_mut()
        .zip(output.texcoords.iter_mut())
        .zip(shape.points.iter().zip(shape.projected.iter()))
        .enumerate()
    {
        *position = point.flip_z() + profile.offset(i);
        *texcoord = image.normalize(*projected);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{Scale, VertexOffset};
    use crate::types::{Point, Point3, Triangle};
    use approx::assert_relative_eq;

    fn fan_topology(n: u32) -> Topology {
        let triangles = (1..n - 1).map(|i| Triangle::new(0, i, i + 1)).collect();
        Topology::new(n as usize, triangles).unwrap()
    }

    fn sample_shape(n: usize) -> ShapeFrame {
        let points = (0..n)
            .map(|i| Point3::new(i as f32 * 0.01, 0.2 - i as f32 * 0.02, 0.5 + i as f32 * 0.001))
            .collect();
        let projected = (0..n)
            .map(|i| Point::new(100.0 + i as f32 * 10.0, 50.0 + i as f32 * 5.0))
            .collect();
        ShapeFrame::new(points, projected)
    }

    #[test]
    fn identity_profile_only_flips_depth() {
        let topology = fan_topology(8);
        let shape = sample_shape(8);
        let mut out = OutputMesh::for_topology(&topology);

        let status = deform_frame(
            &topology,
            &shape,
            &DeformationProfile::identity(),
            ImageSize::new(640, 480),
            &mut out,
        );
        assert_eq!(status, Ok(()));

        for (p, q) in out.positions().iter().zip(&shape.points) {
            assert_eq!(*p, Point3::new(q.x, q.y, -q.z));
        }
    }

    #[test]
    fn single_entry_profile_is_local() {
        let topology = fan_topology(8);
        let mut shape = sample_shape(8);
        shape.points[5] = Point3::new(0.10, 0.20, 0.50);

        let profile = DeformationProfile::new(
            "single",
            Scale { x: 0.01, y: 0.01 },
            vec![VertexOffset(5, 1.0, -2.0)],
        )
        .unwrap();

        let mut out = OutputMesh::for_topology(&topology);
        deform_frame(&topology, &shape, &profile, ImageSize::new(640, 480), &mut out).unwrap();

        let moved = out.positions()[5];
        assert_relative_eq!(moved.x, 0.11, epsilon = 1e-6);
        assert_relative_eq!(moved.y, 0.18, epsilon = 1e-6);
        assert_relative_eq!(moved.z, -0.50, epsilon = 1e-6);

        for (i, (p, q)) in out.positions().iter().zip(&shape.points).enumerate() {
            if i != 5 {
                assert_eq!(*p, q.flip_z());
            }
        }
    }

    #[test]
    fn texcoords_are_normalized_without_clamping() {
        let topology = fan_topology(3);
        let shape = ShapeFrame::new(
            vec![Point3::zero(); 3],
            vec![
                Point::new(320.0, 240.0),
                Point::new(700.0, 500.0),
                Point::new(-64.0, 0.0),
            ],
        );
        let mut out = OutputMesh::for_topology(&topology);
        deform_frame(
            &topology,
            &shape,
            &DeformationProfile::identity(),
            ImageSize::new(640, 480),
            &mut out,
        ).unwrap();

        let uv = out.texcoords();
        assert_relative_eq!(uv[0].x, 0.5);
        assert_relative_eq!(uv[0].y, 0.5);
        assert_relative_eq!(uv[1].x, 700.0 / 640.0);
        assert_relative_eq!(uv[1].y, 500.0 / 480.0);
        assert_relative_eq!(uv[2].x, -0.1);
        assert_relative_eq!(uv[2].y, 0.0);
    }

    #[test]
    fn indices_untouched_by_deformation() {
        let topology = fan_topology(6);
        let mut out = OutputMesh::for_topology(&topology);
        let profile = DeformationProfile::new(
            "wobble",
            Scale { x: 1.0, y: 1.0 },
            vec![VertexOffset(0, 1.0, 1.0), VertexOffset(4, -1.0, 0.5)],
        )
        .unwrap();

        for _ in 0..3 {
            deform_frame(&topology, &sample_shape(6), &profile, ImageSize::new(640, 480), &mut out)
                .unwrap();
            assert_eq!(out.indices(), topology.flat_indices().as_slice());
        }
    }

    #[test]
    fn mismatched_shape_leaves_output_alone() {
        let topology = fan_topology(6);
        let mut out = OutputMesh::for_topology(&topology);
        deform_frame(
            &topology,
            &sample_shape(6),
            &DeformationProfile::identity(),
            ImageSize::new(640, 480),
            &mut out,
        )
        .unwrap();
        let before = out.clone();

        let status = deform_frame(
            &topology,
            &sample_shape(5),
            &DeformationProfile::identity(),
            ImageSize::new(640, 480),
            &mut out,
        );

        assert_eq!(
            status,
            Err(SkipReason::ShapeMismatch {
                expected: 6,
                actual: 5
            })
        );
        assert_eq!(out, before);
    }

    #[test]
    fn empty_image_is_rejected() {
        let topology = fan_topology(3);
        let mut out = OutputMesh::for_topology(&topology);
        let status = deform_frame(
            &topology,
            &sample_shape(3),
            &DeformationProfile::identity(),
            ImageSize::new(640, 0),
            &mut out,
        );
        assert_eq!(status, Err(SkipReason::InvalidImageSize));
    }

    #[test]
    fn stale_indices_are_replaced() {
        let topology = fan_topology(3);
        let mut out =
            OutputMesh::new(vec![Point3::zero(); 3], vec![Point::zero(); 3], vec![]).unwrap();

        let status = deform_frame(
            &topology,
            &sample_shape(3),
            &DeformationProfile::identity(),
            ImageSize::new(640, 480),
            &mut out,
        );

        assert_eq!(status, Ok(()));
        assert_eq!(out.indices(), topology.flat_indices().as_slice());
        assert_eq!(out.positions()[2], sample_shape(3).points[2].flip_z());
    }
}
