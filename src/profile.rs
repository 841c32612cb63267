//! Deformation profiles ("masks").
//!
//! A profile is a sparse table mapping mesh vertex indices to XY offsets.
//! Offsets are stored as step counts along each axis and multiplied by the
//! profile's per-axis scale, so a whole mask can be resized by editing two
//! numbers. The built-in masks live in `assets/profiles.json`.
//!
//! # Example
//!
//! ```
//! use masked_face::{Point3, ProfileSet};
//!
//! let profiles = ProfileSet::builtin().unwrap();
//! let mask = profiles.get("mask-A");
//! assert_eq!(mask.name, "mask-A");
//!
//! // Unknown names fall back to the identity profile.
//! assert_eq!(profiles.get("no-such-mask").offset(35), Point3::zero());
//! ```

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::Point3;

/// Name of the identity profile every set contains.
pub const IDENTITY_PROFILE: &str = "none";

const BUILTIN_PROFILES: &str = include_str!("../assets/profiles.json");

/// FloralWhite, the neutral light color.
const DEFAULT_TINT: [u8; 3] = [255, 250, 240];

/// Per-axis multipliers applied to a profile's offset steps.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Scale {
    pub x: f32,
    pub y: f32,
}

/// One table entry: `(vertex, x_steps, y_steps)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VertexOffset(pub u32, pub f32, pub f32);

impl VertexOffset {
    pub fn vertex(&self) -> u32 {
        self.0
    }

    pub fn x_steps(&self) -> f32 {
        self.1
    }

    pub fn y_steps(&self) -> f32 {
        self.2
    }
}

/// A named mask: which vertices move, and by how much.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeformationProfile {
    pub name: String,

    /// Voice/menu words that select this profile.
    #[serde(default)]
    pub keywords: Vec<String>,

    /// RGB light color a renderer uses while the profile is active.
    #[serde(default = "default_tint")]
    pub tint: [u8; 3],

    #[serde(default)]
    pub scale: Scale,

    #[serde(default)]
    offsets: Vec<VertexOffset>,

    /// Resolved offsets, keyed by vertex index.
    #[serde(skip)]
    lookup: HashMap<u32, Point3>,
}

fn default_tint() -> [u8; 3] {
    DEFAULT_TINT
}

impl DeformationProfile {
    /// Create a profile and resolve its offset table.
    pub fn new(name: impl Into<String>, scale: Scale, offsets: Vec<VertexOffset>) -> Result<Self> {
        let mut profile = Self {
            name: name.into(),
            keywords: Vec::new(),
            tint: DEFAULT_TINT,
            scale,
            offsets,
            lookup: HashMap::new(),
        };
        profile.prepare()?;
        Ok(profile)
    }

    /// The profile that leaves every vertex in place.
    pub fn identity() -> Self {
        Self {
            name: IDENTITY_PROFILE.to_string(),
            keywords: Vec::new(),
            tint: DEFAULT_TINT,
            scale: Scale::default(),
            offsets: Vec::new(),
            lookup: HashMap::new(),
        }
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_tint(mut self, tint: [u8; 3]) -> Self {
        self.tint = tint;
        self
    }

    pub fn is_identity(&self) -> bool {
        self.lookup.values().all(|o| *o == Point3::zero())
    }

    pub fn entries(&self) -> &[VertexOffset] {
        &self.offsets
    }

    /// Offset for `vertex`; zero when the profile doesn't touch it.
    pub fn offset(&self, vertex: usize) -> Point3 {
        u32::try_from(vertex)
            .ok()
            .and_then(|v| self.lookup.get(&v))
            .copied()
            .unwrap_or_else(Point3::zero)
    }

    /// Whether `word` selects this profile (case-insensitive).
    pub fn answers_to(&self, word: &str) -> bool {
        self.keywords.iter().any(|k| k.eq_ignore_ascii_case(word))
    }

    /// Validate the table and build the vertex lookup.
    fn prepare(&mut self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::InvalidProfile("profile name must not be empty".into()));
        }

        if !self.scale.x.is_finite() || !self.scale.y.is_finite() {
            return Err(Error::InvalidProfile(format!(
                "profile '{}' has a non-finite scale",
                self.name
            )));
        }

        let mut lookup = HashMap::with_capacity(self.offsets.len());
        for entry in &self.offsets {
            if !entry.x_steps().is_finite() || !entry.y_steps().is_finite() {
                return Err(Error::InvalidProfile(format!(
                    "profile '{}' has a non-finite offset for vertex {}",
                    self.name,
                    entry.vertex()
                )));
            }

            let offset = Point3::new(
                entry.x_steps() * self.scale.x,
                entry.y_steps() * self.scale.y,
                0.0,
            );
            if lookup.insert(entry.vertex(), offset).is_some() {
                return Err(Error::InvalidProfile(format!(
                    "profile '{}' lists vertex {} more than once",
                    self.name,
                    entry.vertex()
                )));
            }
        }

        self.lookup = lookup;
        Ok(())
    }
}

#[derive(Serialize, Deserialize)]
struct ProfileFile {
    profiles: Vec<DeformationProfile>,
}

/// The set of masks a session can switch between.
///
/// Always contains the identity profile, which doubles as the fallback for
/// unknown names.
#[derive(Debug, Clone)]
pub struct ProfileSet {
    profiles: Vec<DeformationProfile>,
}

impl ProfileSet {
    /// Build a set, validating every profile.
    pub fn from_profiles(mut profiles: Vec<DeformationProfile>) -> Result<Self> {
        let mut seen = HashSet::new();
        for profile in &mut profiles {
            if !seen.insert(profile.name.clone()) {
                return Err(Error::InvalidProfile(format!(
                    "duplicate profile name '{}'",
                    profile.name
                )));
            }
            profile.prepare()?;
        }

        if !seen.contains(IDENTITY_PROFILE) {
            profiles.insert(0, DeformationProfile::identity());
        }

        Ok(Self { profiles })
    }

    /// The masks shipped with the crate: `none`, `mask-A`, `mask-B`.
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_PROFILES)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let file: ProfileFile = serde_json::from_str(json)?;
        Self::from_profiles(file.profiles)
    }

    /// Load a profile table from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let file: ProfileFile = serde_json::from_reader(reader)?;
        Self::from_profiles(file.profiles)
    }

    /// Save the profile table as JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        let table = ProfileFile {
            profiles: self.profiles.clone(),
        };
        serde_json::to_writer_pretty(&mut writer, &table)?;
        writer.flush()?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeformationProfile> {
        self.profiles.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.iter().map(|p| p.name.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    pub fn find(&self, name: &str) -> Option<&DeformationProfile> {
        self.profiles.iter().find(|p| p.name == name)
    }

    /// Look up a profile by name, falling back to identity.
    pub fn get(&self, name: &str) -> &DeformationProfile {
        self.find(name).unwrap_or_else(|| self.identity())
    }

    pub fn identity(&self) -> &DeformationProfile {
        // `from_profiles` guarantees presence.
        &self.profiles[self
            .profiles
            .iter()
            .position(|p| p.name == IDENTITY_PROFILE)
            .unwrap_or(0)]
    }

    /// Find the profile a spoken or typed keyword selects.
    pub fn by_keyword(&self, word: &str) -> Option<&DeformationProfile> {
        self.profiles.iter().find(|p| p.answers_to(word))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_loads() {
        let set = ProfileSet::builtin().unwrap();
        let names: Vec<_> = set.names().collect();
        assert_eq!(names, vec!["none", "mask-A", "mask-B"]);

        let a = set.get("mask-A");
        assert_eq!(a.entries().len(), 95);
        assert_eq!(a.tint, [34, 139, 34]);

        let b = set.get("mask-B");
        assert_eq!(b.entries().len(), 102);

        assert!(set.get("none").is_identity());
        assert!(!a.is_identity());
    }

    #[test]
    fn builtin_offsets_are_scaled() {
        let set = ProfileSet::builtin().unwrap();
        let a = set.get("mask-A");

        // Vertex 35 drops by three Y steps.
        let o = a.offset(35);
        assert_eq!(o.x, 0.0);
        assert!((o.y - (-3.0 * 0.006689972)).abs() < 1e-7);
        assert_eq!(o.z, 0.0);

        // Untouched vertex.
        assert_eq!(a.offset(120), Point3::zero());
        assert_eq!(a.offset(usize::MAX), Point3::zero());
    }

    #[test]
    fn unknown_name_falls_back_to_identity() {
        let set = ProfileSet::builtin().unwrap();
        assert_eq!(set.get("ogre").name, IDENTITY_PROFILE);
        assert!(!set.contains("ogre"));
        assert!(set.find("ogre").is_none());
    }

    #[test]
    fn keywords_are_case_insensitive() {
        let set = ProfileSet::builtin().unwrap();
        assert_eq!(set.by_keyword("hulk").map(|p| p.name.as_str()), Some("mask-A"));
        assert_eq!(set.by_keyword("Shrek").map(|p| p.name.as_str()), Some("mask-B"));
        assert_eq!(set.by_keyword("BACK").map(|p| p.name.as_str()), Some("none"));
        assert!(set.by_keyword("dragon").is_none());
    }

    #[test]
    fn identity_inserted_when_missing() {
        let mask = DeformationProfile::new(
            "pointy",
            Scale { x: 0.5, y: 0.25 },
            vec![VertexOffset(3, 1.0, -2.0)],
        )
        .unwrap()
        .with_keywords(["POINTY"])
        .with_tint([200, 0, 0]);
        let set = ProfileSet::from_profiles(vec![mask]).unwrap();

        assert_eq!(set.len(), 2);
        assert_eq!(set.identity().name, IDENTITY_PROFILE);
        assert_eq!(set.get("pointy").offset(3), Point3::new(0.5, -0.5, 0.0));
        assert_eq!(set.by_keyword("pointy").map(|p| p.tint), Some([200, 0, 0]));
    }

    #[test]
    fn rejects_duplicate_vertices() {
        let err = DeformationProfile::new(
            "broken",
            Scale { x: 1.0, y: 1.0 },
            vec![VertexOffset(3, 1.0, 0.0), VertexOffset(3, 0.0, 1.0)],
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidProfile(_)));
    }

    #[test]
    fn rejects_duplicate_names() {
        let json = r#"{ "profiles": [ { "name": "x" }, { "name": "x" } ] }"#;
        assert!(matches!(
            ProfileSet::from_json(json),
            Err(Error::InvalidProfile(_))
        ));
    }

    #[test]
    fn rejects_non_finite_scale() {
        let err = DeformationProfile::new("nan", Scale { x: f32::NAN, y: 1.0 }, vec![]).unwrap_err();
        assert!(matches!(err, Error::InvalidProfile(_)));
    }

    #[test]
    fn save_and_load_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profiles.json");

        let set = ProfileSet::builtin().unwrap();
        set.save(&path).unwrap();

        let loaded = ProfileSet::load(&path).unwrap();
        assert_eq!(loaded.len(), set.len());
        assert_eq!(loaded.get("mask-B").offset(116), set.get("mask-B").offset(116));
        assert_eq!(loaded.get("mask-B").keywords, vec!["SHREK".to_string()]);
    }
}
