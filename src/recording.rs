//! Recorded face-tracker output.
//!
//! A recording stands in for a live sensor: it holds the color image size
//! and the sequence of frames the tracker produced. Three encodings are
//! supported, picked by file extension:
//!
//! - `.json` — human-editable, handy for hand-written fixtures
//! - `.bz2` — bincode inside a bzip2 stream
//! - anything else — raw bincode

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use bzip2::read::BzDecoder;
use bzip2::write::BzEncoder;
use bzip2::Compression;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::session::TrackedFrame;
use crate::types::ImageSize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Encoding {
    Json,
    Bincode,
    CompressedBincode,
}

impl Encoding {
    fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Encoding::Json,
            Some("bz2") => Encoding::CompressedBincode,
            _ => Encoding::Bincode,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    pub image: ImageSize,
    pub frames: Vec<TrackedFrame>,
}

impl Recording {
    pub fn new(image: ImageSize, frames: Vec<TrackedFrame>) -> Self {
        Self { image, frames }
    }

    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }

    /// Load a recording, choosing the decoder from the file extension.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let reader = BufReader::new(file);

        match Encoding::for_path(path) {
            Encoding::Json => Ok(serde_json::from_reader(reader)?),
            Encoding::CompressedBincode => Self::from_bincode_reader(BzDecoder::new(reader)),
            Encoding::Bincode => Self::from_bincode_reader(reader),
        }
    }

    /// Decode a bincode recording from an already-opened reader.
    pub fn from_bincode_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Ok(bincode::deserialize(&bytes)?)
    }

    /// Save the recording, choosing the encoder from the file extension.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        match Encoding::for_path(path) {
            Encoding::Json => {
                serde_json::to_writer(&mut writer, self)?;
            }
            Encoding::CompressedBincode => {
                let mut encoder = BzEncoder::new(&mut writer, Compression::default());
                encoder.write_all(&bincode::serialize(self)?)?;
                encoder.finish()?;
            }
            Encoding::Bincode => {
                writer.write_all(&bincode::serialize(self)?)?;
            }
        }

        writer.flush()?;
        Ok(())
    }
}
