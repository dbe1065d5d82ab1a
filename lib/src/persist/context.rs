//! Per-entity read and write cursors over a [`ModelContainer`].

use crate::error::{ChainError, Result};
use crate::persist::container::ModelContainer;
use crate::persist::registry::TransformRegistry;
use crate::persist::version::{ModelHeader, VersionInfo};
use crate::transform::{LoadableTransform, Transform};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, trace};

fn child_section(parent: &str, name: &str) -> String {
    format!("{parent}/{name}")
}

/// Writer for one entity section.
///
/// The header is written when the context is opened; the entity then appends
/// its payload with [`write`](SaveContext::write) and stores nested entities
/// with [`save_model`](SaveContext::save_model).
pub struct SaveContext<'a> {
    container: &'a mut ModelContainer,
    section: String,
    index: usize,
    buf: Vec<u8>,
}

impl<'a> SaveContext<'a> {
    fn open(container: &'a mut ModelContainer, section: String, version: &VersionInfo) -> Result<Self> {
        let index = container.reserve(section.clone())?;
        let mut buf = Vec::new();
        bincode::serialize_into(&mut buf, &version.header())?;
        Ok(Self {
            container,
            section,
            index,
            buf,
        })
    }

    /// Name of the section being written.
    pub fn section(&self) -> &str {
        &self.section
    }

    /// Append a value to the payload.
    pub fn write<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        bincode::serialize_into(&mut self.buf, value)?;
        Ok(())
    }

    /// Save a nested entity in its own section below this one.
    pub fn save_model(&mut self, name: &str, model: &dyn Transform) -> Result<()> {
        let section = child_section(&self.section, name);
        save_entity(self.container, &section, model)
    }

    fn finish(self) {
        trace!(section = %self.section, bytes = self.buf.len(), "section written");
        self.container.fill(self.index, self.buf);
    }
}

/// Save `model` with its header into the section `section`.
///
/// A container whose save failed is incomplete and must be discarded.
pub(crate) fn save_entity(
    container: &mut ModelContainer,
    section: &str,
    model: &dyn Transform,
) -> Result<()> {
    let version = model.version_info();
    debug!(
        section,
        signature = version.signature,
        loader_key = version.loader_key,
        "saving entity"
    );
    let mut ctx = SaveContext::open(container, section.to_string(), &version)?;
    model.save(&mut ctx)?;
    ctx.finish();
    Ok(())
}

/// Reader for one entity section, positioned after the header.
pub struct LoadContext<'a> {
    container: &'a ModelContainer,
    registry: &'a TransformRegistry,
    section: String,
    header: ModelHeader,
    payload: &'a [u8],
}

impl<'a> LoadContext<'a> {
    fn open(
        container: &'a ModelContainer,
        registry: &'a TransformRegistry,
        section: &str,
    ) -> Result<Self> {
        let mut payload = container.open_section(section)?;
        let header: ModelHeader = bincode::deserialize_from(&mut payload)?;
        Ok(Self {
            container,
            registry,
            section: section.to_string(),
            header,
            payload,
        })
    }

    /// Header of the entity being read.
    ///
    /// Loaders branch on `header().version_written` to decode older payloads.
    pub fn header(&self) -> &ModelHeader {
        &self.header
    }

    /// Name of the section being read.
    pub fn section(&self) -> &str {
        &self.section
    }

    /// Read the next value of the payload.
    pub fn read<T: DeserializeOwned>(&mut self) -> Result<T> {
        Ok(bincode::deserialize_from(&mut self.payload)?)
    }

    /// Load a nested entity stored by [`SaveContext::save_model`].
    pub fn load_model(&self, name: &str) -> Result<Arc<dyn Transform>> {
        load_entity(
            self.container,
            self.registry,
            &child_section(&self.section, name),
        )
    }

    fn finish(self) -> Result<()> {
        if !self.payload.is_empty() {
            return Err(ChainError::Framing {
                section: self.section,
                remaining: self.payload.len(),
            });
        }
        Ok(())
    }
}

/// Load whatever entity `section` holds, dispatching on its loader key.
pub(crate) fn load_entity(
    container: &ModelContainer,
    registry: &TransformRegistry,
    section: &str,
) -> Result<Arc<dyn Transform>> {
    let mut ctx = LoadContext::open(container, registry, section)?;
    let registration = registry
        .get(&ctx.header.loader_key)
        .ok_or_else(|| ChainError::UnknownFormat(ctx.header.loader_key.clone()))?;
    registration.version.check(&ctx.header)?;
    debug!(
        section,
        loader_key = %ctx.header.loader_key,
        version = ctx.header.version_written,
        "loading entity"
    );
    let model = (registration.factory)(&mut ctx)?;
    ctx.finish()?;
    Ok(model)
}

/// Load `section` as a `T`, failing if it holds another kind of entity.
pub(crate) fn load_typed<T: LoadableTransform>(
    container: &ModelContainer,
    registry: &TransformRegistry,
    section: &str,
) -> Result<T> {
    let mut ctx = LoadContext::open(container, registry, section)?;
    T::VERSION.check(&ctx.header)?;
    debug!(
        section,
        loader_key = T::VERSION.loader_key,
        version = ctx.header.version_written,
        "loading entity"
    );
    let model = T::load(&mut ctx)?;
    ctx.finish()?;
    Ok(model)
}
