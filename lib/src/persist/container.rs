//! Named byte sections and the file they live in.

use crate::error::{ChainError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Leading bytes of a container file.
pub const FILE_MAGIC: [u8; 8] = *b"MLCHAIN1";

/// Section name a model is saved under when none is given.
pub const DEFAULT_MODEL_NAME: &str = "Model";

/// Options for container files.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContainerConfig {
    /// Name of the root section a chain is saved under.
    pub model_name: String,
    /// Files larger than this are refused before being read.
    pub max_file_bytes: u64,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            model_name: DEFAULT_MODEL_NAME.to_string(),
            max_file_bytes: 256 * 1024 * 1024,
        }
    }
}

impl ContainerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the root section name.
    pub fn with_model_name(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = model_name.into();
        self
    }

    /// Set the file size limit.
    pub fn with_max_file_bytes(mut self, max_file_bytes: u64) -> Self {
        self.max_file_bytes = max_file_bytes;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct Section {
    name: String,
    bytes: Vec<u8>,
}

/// Ordered list of named byte sections.
///
/// One section holds one persisted entity: its header followed by its
/// payload. Nested entities live in their own sections, named by joining the
/// parent's name and the child's name with `/`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelContainer {
    sections: Vec<Section>,
}

impl ModelContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Section names in creation order.
    pub fn section_names(&self) -> Vec<&str> {
        self.sections.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Create a section holding `bytes`.
    pub fn write_section(&mut self, name: impl Into<String>, bytes: Vec<u8>) -> Result<()> {
        let index = self.reserve(name)?;
        self.fill(index, bytes);
        Ok(())
    }

    /// Bytes of the named section.
    pub fn open_section(&self, name: &str) -> Result<&[u8]> {
        self.position(name)
            .map(|i| self.sections[i].bytes.as_slice())
            .ok_or_else(|| ChainError::MissingSection(name.to_string()))
    }

    /// Claim a section name so it keeps its place ahead of nested sections
    /// written before it is filled.
    pub(crate) fn reserve(&mut self, name: impl Into<String>) -> Result<usize> {
        let name = name.into();
        if self.contains(&name) {
            return Err(ChainError::DuplicateSection(name));
        }
        self.sections.push(Section {
            name,
            bytes: Vec::new(),
        });
        Ok(self.sections.len() - 1)
    }

    pub(crate) fn fill(&mut self, index: usize, bytes: Vec<u8>) {
        self.sections[index].bytes = bytes;
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.sections.iter().position(|s| s.name == name)
    }

    /// Encode the container with its file magic.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = FILE_MAGIC.to_vec();
        bincode::serialize_into(&mut bytes, self)?;
        Ok(bytes)
    }

    /// Decode bytes produced by [`to_bytes`](ModelContainer::to_bytes).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let Some(body) = bytes.strip_prefix(&FILE_MAGIC[..]) else {
            if bytes.len() < FILE_MAGIC.len() {
                return Err(ChainError::UnexpectedEndOfStream(
                    "container shorter than its file magic".to_string(),
                ));
            }
            return Err(ChainError::Serialization(
                "not a model container: bad file magic".to_string(),
            ));
        };
        let mut reader = body;
        let container: ModelContainer = bincode::deserialize_from(&mut reader)?;
        if !reader.is_empty() {
            return Err(ChainError::Framing {
                section: "<container>".to_string(),
                remaining: reader.len(),
            });
        }
        for (i, section) in container.sections.iter().enumerate() {
            if container.sections[..i].iter().any(|s| s.name == section.name) {
                return Err(ChainError::DuplicateSection(section.name.clone()));
            }
        }
        Ok(container)
    }

    /// Write the container to a file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = self.to_bytes()?;
        debug!(
            path = %path.as_ref().display(),
            sections = self.len(),
            bytes = bytes.len(),
            "writing model container"
        );
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Read a container file, refusing files above `config.max_file_bytes`.
    pub fn load_from_file<P: AsRef<Path>>(path: P, config: &ContainerConfig) -> Result<Self> {
        let path = path.as_ref();
        let size = std::fs::metadata(path)?.len();
        if size > config.max_file_bytes {
            return Err(ChainError::Io(format!(
                "{} is {size} bytes, limit is {}",
                path.display(),
                config.max_file_bytes
            )));
        }
        let bytes = std::fs::read(path)?;
        debug!(path = %path.display(), bytes = bytes.len(), "reading model container");
        Self::from_bytes(&bytes)
    }
}
