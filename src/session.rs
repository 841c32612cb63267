use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::command::Command;
use crate::engine::{deform_frame, SkipReason};
use crate::error::{Error, Result};
use crate::export::export_obj;
use crate::mesh::{OutputMesh, ShapeFrame, Topology};
use crate::profile::{DeformationProfile, ProfileSet, IDENTITY_PROFILE};
use crate::types::{ImageSize, Triangle};

/// What the face tracker hands over for one sensor frame.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TrackedFrame {
    /// Whether the tracker locked on to a face this frame.
    pub tracked: bool,
    pub shape: ShapeFrame,
    /// Mesh triangles in tracker winding. Only needed until the session has
    /// cached its topology.
    #[serde(default)]
    pub triangles: Option<Vec<Triangle>>,
}

impl TrackedFrame {
    pub fn new(shape: ShapeFrame, triangles: Option<Vec<Triangle>>) -> Self {
        Self {
            tracked: true,
            shape,
            triangles,
        }
    }

    /// A frame on which the tracker lost the face.
    pub fn lost() -> Self {
        Self::default()
    }
}

/// Outcome of [`Session::process_frame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    /// The output mesh now holds this frame. `first_track` is set on the
    /// frame that cached the topology.
    Deformed { first_track: bool },
    /// The frame was dropped and the previous output, if any, is unchanged.
    Skipped(SkipReason),
}

impl FrameStatus {
    pub fn is_deformed(&self) -> bool {
        matches!(self, FrameStatus::Deformed { .. })
    }
}

/// Session settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Where `Command::Export` writes the mesh.
    pub export_path: PathBuf,
    /// Profile active before any control input arrives.
    pub initial_profile: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            export_path: PathBuf::from("output.obj"),
            initial_profile: IDENTITY_PROFILE.to_string(),
        }
    }
}

impl SessionConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load settings from a JSON file. Missing fields take their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}

/// Frame counters since the session was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionStats {
    pub frames_deformed: u64,
    pub frames_skipped: u64,
}

/// What the host should do after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Exit,
}

/// One face-tracking session.
///
/// Owns the cached topology, the output mesh and the active profile
/// selector. Frames, control commands and exports are all applied through
/// `&mut self`/`&self`, so hosts that share a session across threads wrap it
/// in a mutex and exports can never observe a half-deformed frame.
///
/// # Usage
///
/// ```rust
/// use masked_face::{
///     to_obj_string, FrameStatus, ImageSize, Point, Point3, Session, ShapeFrame, SkipReason,
///     TrackedFrame, Triangle,
/// };
///
/// let mut session = Session::new()?;
/// session.select_profile("mask-A");
///
/// let shape = ShapeFrame::new(
///     vec![Point3::new(0.0, 0.0, 1.0), Point3::new(0.1, 0.0, 1.0), Point3::new(0.0, 0.1, 1.0)],
///     vec![Point::new(320.0, 240.0), Point::new(360.0, 240.0), Point::new(320.0, 200.0)],
/// );
/// let tracker_frames = [
///     TrackedFrame::lost(),
///     TrackedFrame::new(shape.clone(), Some(vec![Triangle::new(0, 1, 2)])),
///     TrackedFrame::new(shape, None),
/// ];
///
/// let statuses: Vec<FrameStatus> = tracker_frames
///     .iter()
///     .map(|frame| session.process_frame(frame, ImageSize::new(640, 480)))
///     .collect();
/// assert_eq!(
///     statuses,
///     [
///         FrameStatus::Skipped(SkipReason::NotTracked),
///         FrameStatus::Deformed { first_track: true },
///         FrameStatus::Deformed { first_track: false },
///     ]
/// );
///
/// let obj = to_obj_string(session.output().unwrap())?;
/// assert!(obj.ends_with("f 1/1 2/2 3/3\n"));
/// # Ok::<(), masked_face::Error>(())
/// ```
#[derive(Debug)]
pub struct Session {
    profiles: ProfileSet,
    config: SessionConfig,
    active: String,
    topology: Option<Topology>,
    output: Option<OutputMesh>,
    stats: SessionStats,
}

impl Session {
    /// A session over the built-in profiles with default settings.
    pub fn new() -> Result<Self> {
        SessionBuilder::new().build()
    }

    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    pub fn profiles(&self) -> &ProfileSet {
        &self.profiles
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn topology(&self) -> Option<&Topology> {
        self.topology.as_ref()
    }

    /// The most recently deformed mesh, if any frame has been tracked.
    pub fn output(&self) -> Option<&OutputMesh> {
        self.output.as_ref()
    }

    /// The selector as last set, which may name an unknown profile.
    pub fn active_name(&self) -> &str {
        &self.active
    }

    /// The profile the next frame will use.
    pub fn active_profile(&self) -> &DeformationProfile {
        self.profiles.get(&self.active)
    }

    /// Change the active mask. Takes effect from the next frame.
    pub fn select_profile(&mut self, name: impl Into<String>) {
        let name = name.into();
        if self.profiles.contains(&name) {
            log::debug!("Active profile: {}", name);
        } else {
            log::debug!("Unknown profile '{}', deforming with identity", name);
        }
        self.active = name;
    }

    /// Forget the cached topology and output mesh.
    ///
    /// Call when the tracker is reset, the tracked person changes, or the
    /// color/depth stream format changes.
    pub fn reset(&mut self) {
        if self.topology.is_some() {
            log::info!("Tracking reset, discarding cached topology");
        }
        self.topology = None;
        self.output = None;
    }

    /// Process one tracker frame.
    pub fn process_frame(&mut self, frame: &TrackedFrame, image: ImageSize) -> FrameStatus {
        let status = self.process(frame, image);
        match status {
            FrameStatus::Deformed { .. } => self.stats.frames_deformed += 1,
            FrameStatus::Skipped(reason) => {
                self.stats.frames_skipped += 1;
                log::debug!("Skipped frame: {:?}", reason);
            }
        }
        status
    }

    fn process(&mut self, frame: &TrackedFrame, image: ImageSize) -> FrameStatus {
        if !frame.tracked {
            return FrameStatus::Skipped(SkipReason::NotTracked);
        }

        if image.is_empty() {
            return FrameStatus::Skipped(SkipReason::InvalidImageSize);
        }

        if self.topology.is_none() {
            return match self.first_track(frame, image) {
                Ok(()) => FrameStatus::Deformed { first_track: true },
                Err(reason) => FrameStatus::Skipped(reason),
            };
        }

        let (Some(topology), Some(output)) = (self.topology.as_ref(), self.output.as_mut()) else {
            if cfg!(debug_assertions) {
                unreachable!("topology cached without an output mesh");
            }
            return FrameStatus::Skipped(SkipReason::MissingTopology);
        };

        // Resolved once so a selector change can't split a frame.
        let profile = self.profiles.get(&self.active);

        match deform_frame(topology, &frame.shape, profile, image, output) {
            Ok(()) => FrameStatus::Deformed { first_track: false },
            Err(reason) => FrameStatus::Skipped(reason),
        }
    }

    /// Derive the topology from the frame and deform into a fresh mesh.
    /// Nothing is cached unless the whole frame is accepted.
    fn first_track(
        &mut self,
        frame: &TrackedFrame,
        image: ImageSize,
    ) -> std::result::Result<(), SkipReason> {
        let Some(triangles) = frame.triangles.as_deref() else {
            return Err(SkipReason::MissingTopology);
        };

        let topology = Topology::from_tracker(frame.shape.num_landmarks(), triangles)
            .map_err(|e| {
                log::warn!("Discarding tracker triangles: {}", e);
                SkipReason::InvalidTopology
            })?;

        let profile = self.profiles.get(&self.active);
        let mut output = OutputMesh::for_topology(&topology);
        deform_frame(&topology, &frame.shape, profile, image, &mut output)?;

        log::info!(
            "Face tracked: caching topology ({} vertices, {} triangles)",
            topology.vertex_count(),
            topology.num_triangles()
        );
        self.topology = Some(topology);
        self.output = Some(output);
        Ok(())
    }

    /// Write the current output mesh to `path` as OBJ.
    pub fn export<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mesh = self.output.as_ref().ok_or(Error::NoOutputMesh)?;
        export_obj(mesh, path.as_ref())?;
        log::info!("Exported face mesh to {}", path.as_ref().display());
        Ok(())
    }

    /// Write the current output mesh to the configured export path.
    pub fn export_default(&self) -> Result<()> {
        self.export(&self.config.export_path)
    }

    /// Apply a control command from the UI or voice input.
    pub fn apply(&mut self, command: &Command) -> Result<Control> {
        match command {
            Command::SelectProfile(name) => {
                self.select_profile(name.clone());
                Ok(Control::Continue)
            }
            Command::Export => {
                self.export_default()?;
                Ok(Control::Continue)
            }
            Command::Exit => Ok(Control::Exit),
        }
    }
}

/// Builder for a [`Session`].
#[derive(Debug, Default)]
pub struct SessionBuilder {
    profiles: Option<ProfileSet>,
    config: SessionConfig,
}

impl SessionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom profile table instead of the built-in masks.
    pub fn profiles(mut self, profiles: ProfileSet) -> Self {
        self.profiles = Some(profiles);
        self
    }

    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn initial_profile(mut self, name: impl Into<String>) -> Self {
        self.config.initial_profile = name.into();
        self
    }

    pub fn export_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.export_path = path.into();
        self
    }

    pub fn build(self) -> Result<Session> {
        let profiles = match self.profiles {
            Some(profiles) => profiles,
            None => ProfileSet::builtin()?,
        };

        if !profiles.contains(&self.config.initial_profile) {
            log::warn!(
                "Initial profile '{}' is not defined, deforming with identity",
                self.config.initial_profile
            );
        }

        Ok(Session {
            active: self.config.initial_profile.clone(),
            profiles,
            config: self.config,
            topology: None,
            output: None,
            stats: SessionStats::default(),
        })
    }
}
