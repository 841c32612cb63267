//! # masked-face
//!
//! Real-time face mesh deformation with stylised masks, and export of the
//! resulting mesh to Wavefront OBJ.
//!
//! This crate provides:
//! - **Deformation**: apply a sparse per-vertex offset table ("mask") to a
//!   tracked face shape, producing positions and texture coordinates
//! - **Sessions**: per-tracking-session caching of mesh topology and the
//!   active mask selector
//! - **Export**: deterministic OBJ serialization of the current mesh
//!
//! The face tracker itself is external: each frame it supplies 3D landmark
//! positions, their 2D projections into the color image, and (on the first
//! frame) the mesh triangles.
//!
//! ## Frame Pipeline
//!
//! 1. On the first tracked frame, cache the topology from the tracker's
//!    triangle list
//! 2. Resolve the active profile once for the frame
//! 3. For every vertex: flip Z, add the profile offset, and normalize the
//!    projected point by the color image size
//! 4. On request, write the latest output mesh as OBJ
//!
//! ## Quick Start
//!
//! ```rust
//! use masked_face::{ImageSize, Point, Point3, Session, ShapeFrame, TrackedFrame, Triangle};
//!
//! let mut session = Session::new().unwrap();
//! session.select_profile("mask-A");
//!
//! let shape = ShapeFrame::new(
//!     vec![Point3::new(0.0, 0.0, 1.0), Point3::new(0.1, 0.0, 1.0), Point3::new(0.0, 0.1, 1.0)],
//!     vec![Point::new(320.0, 240.0), Point::new(360.0, 240.0), Point::new(320.0, 200.0)],
//! );
//! let frame = TrackedFrame::new(shape, Some(vec![Triangle::new(0, 1, 2)]));
//!
//! let status = session.process_frame(&frame, ImageSize::new(640, 480));
//! assert!(status.is_deformed());
//!
//! let mesh = session.output().unwrap();
//! println!("{} vertices, {} triangles", mesh.num_vertices(), mesh.num_triangles());
//! ```

mod command;
mod engine;
mod error;
mod export;
mod mesh;
mod profile;
mod recording;
mod session;
mod types;

pub use command::{Command, CONFIDENCE_THRESHOLD};
pub use engine::{deform_frame, SkipReason};
pub use error::{Error, Result};
pub use export::{export_obj, to_obj_string, write_obj};
pub use mesh::{OutputMesh, ShapeFrame, Topology};
pub use profile::{DeformationProfile, ProfileSet, Scale, VertexOffset, IDENTITY_PROFILE};
pub use recording::Recording;
pub use session::{
    Control, FrameStatus, Session, SessionBuilder, SessionConfig, SessionStats, TrackedFrame,
};
pub use types::{ImageSize, Point, Point3, Triangle};
