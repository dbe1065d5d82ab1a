//! Entity headers and the two-sided version gate.
//!
//! Versions are `u32` values written as `0xMMMMmmmm` (major in the high half,
//! revision in the low half) so that plain integer comparison orders them.

use crate::error::{ChainError, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Format identity of one persisted entity kind, as known to this build.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VersionInfo {
    /// Fixed name of the logical format.
    pub signature: &'static str,
    /// Version this build writes.
    pub version_written: u32,
    /// Oldest reader version able to decode what this build writes.
    pub version_readable: u32,
    /// Oldest written version this build still decodes.
    pub version_we_can_read_back: u32,
    /// Key used to find the loader in a registry.
    pub loader_key: &'static str,
}

impl VersionInfo {
    pub const fn new(
        signature: &'static str,
        version_written: u32,
        version_readable: u32,
        version_we_can_read_back: u32,
        loader_key: &'static str,
    ) -> Self {
        Self {
            signature,
            version_written,
            version_readable,
            version_we_can_read_back,
            loader_key,
        }
    }

    /// Header this build writes for the entity.
    pub fn header(&self) -> ModelHeader {
        ModelHeader {
            signature: self.signature.to_string(),
            version_written: self.version_written,
            version_readable: self.version_readable,
            version_we_can_read_back: self.version_we_can_read_back,
            loader_key: self.loader_key.to_string(),
        }
    }

    /// Decide whether this build can read an entity with `header`.
    ///
    /// # Errors
    /// - [`ChainError::WrongEntityKind`] if the signatures differ.
    /// - [`ChainError::UnsupportedFormatVersion`] if the entity needs a newer
    ///   reader, or was written before the oldest version still decoded here.
    pub fn check(&self, header: &ModelHeader) -> Result<()> {
        if header.signature != self.signature {
            return Err(ChainError::WrongEntityKind {
                expected: self.signature.to_string(),
                found: header.signature.clone(),
            });
        }
        if header.version_readable > self.version_written {
            warn!(
                signature = self.signature,
                readable = header.version_readable,
                supported = self.version_written,
                "rejecting entity written for a newer reader"
            );
            return Err(ChainError::UnsupportedFormatVersion {
                signature: self.signature.to_string(),
                found: header.version_readable,
                supported: self.version_written,
                reason: "entity requires a newer reader".to_string(),
            });
        }
        if header.version_written < self.version_we_can_read_back {
            warn!(
                signature = self.signature,
                written = header.version_written,
                oldest = self.version_we_can_read_back,
                "rejecting entity older than the read-back floor"
            );
            return Err(ChainError::UnsupportedFormatVersion {
                signature: self.signature.to_string(),
                found: header.version_written,
                supported: self.version_we_can_read_back,
                reason: "entity is older than this reader can decode".to_string(),
            });
        }
        Ok(())
    }
}

/// Header as found at the start of every entity section.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelHeader {
    pub signature: String,
    pub version_written: u32,
    pub version_readable: u32,
    pub version_we_can_read_back: u32,
    pub loader_key: String,
}
