//! Turning decoded images into cache-addressable texture resources.

use std::sync::Arc;
use texture_ingest_common::{DecodedImage, LevelBuffer, TextureFormat};
use tracing::debug;

/// One GPU-upload-ready texture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureResource {
    /// The indexed key, `"{base}-{n}"` with `n` starting at 1.
    pub cache_key: String,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    /// Mip levels, full resolution first.
    pub levels: Vec<LevelBuffer>,
}

/// Resources produced from one container, ready for insertion into a texture cache.
///
/// Image `i` is keyed `"{base}-{i + 1}"`. The first image is also reachable under the bare
/// base key, so a single-image texture resolves by URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredTextures {
    base_key: String,
    resources: Vec<Arc<TextureResource>>,
}

impl RegisteredTextures {
    /// The bare key aliasing the first resource.
    pub fn base_key(&self) -> &str {
        &self.base_key
    }

    /// Resources in image order.
    pub fn resources(&self) -> &[Arc<TextureResource>] {
        &self.resources
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// The resource registered under `key`, alias included.
    pub fn get(&self, key: &str) -> Option<&Arc<TextureResource>> {
        if key == self.base_key {
            return self.resources.first();
        }
        self.resources
            .iter()
            .find(|resource| resource.cache_key == key)
    }

    /// Every `(key, resource)` pair to insert: the alias first, then one per image.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Arc<TextureResource>)> {
        let alias = self
            .resources
            .first()
            .map(|first| (self.base_key.as_str(), first));
        alias.into_iter().chain(
            self.resources
                .iter()
                .map(|resource| (resource.cache_key.as_str(), resource)),
        )
    }

    /// Every key, alias first.
    pub fn keys(&self) -> Vec<String> {
        self.entries().map(|(key, _)| key.to_owned()).collect()
    }

    pub fn into_resources(self) -> Vec<Arc<TextureResource>> {
        self.resources
    }
}

/// Wraps `images` into keyed resources sharing one `format`.
///
/// Returns `None` when `images` is empty: there is nothing to register and the caller may
/// apply its own fallback.
pub fn register(
    base_key: &str,
    format: TextureFormat,
    images: Vec<DecodedImage>,
) -> Option<RegisteredTextures> {
    if images.is_empty() {
        return None;
    }

    let resources: Vec<Arc<TextureResource>> = images
        .into_iter()
        .enumerate()
        .map(|(index, image)| {
            Arc::new(TextureResource {
                cache_key: format!("{base_key}-{}", index + 1),
                width: image.width,
                height: image.height,
                format,
                levels: image.levels,
            })
        })
        .collect();
    debug!(base_key, resources = resources.len(), ?format, "Registered textures");

    Some(RegisteredTextures {
        base_key: base_key.to_owned(),
        resources,
    })
}
