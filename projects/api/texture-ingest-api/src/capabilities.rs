//! Deciding which Basis transcode targets the rendering context can sample.
//!
//! The embedding renderer reports which WebGL compression extensions it has
//! ([`ExtensionSet`]). [`detect_capabilities`] turns that into a [`CapabilityProfile`]: one
//! default target for textures with alpha and one for textures without, or the uncompressed
//! fallback when the context cannot sample a suitable compressed format.

use crate::error::CapabilityError;
use derive_enum_all_values::AllValues;
use parking_lot::Mutex;
use texture_ingest_basis::BasisFormat;
use texture_ingest_common::CompressedFormat;
use tracing::{debug, trace, warn};

/// A WebGL compressed texture extension.
///
/// Declaration order is the scan order used by [`detect_capabilities`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, AllValues)]
pub enum CompressionExtension {
    S3tc,
    S3tcSrgb,
    Etc,
    Etc1,
    Pvrtc,
    Atc,
    Astc,
}

impl CompressionExtension {
    /// Short key, as used in the extension map handed over by the renderer.
    pub const fn key(self) -> &'static str {
        match self {
            CompressionExtension::S3tc => "s3tc",
            CompressionExtension::S3tcSrgb => "s3tc_sRGB",
            CompressionExtension::Etc => "etc",
            CompressionExtension::Etc1 => "etc1",
            CompressionExtension::Pvrtc => "pvrtc",
            CompressionExtension::Atc => "atc",
            CompressionExtension::Astc => "astc",
        }
    }

    /// Extension names a WebGL context may report, vendor prefixed ones included.
    pub const fn webgl_names(self) -> &'static [&'static str] {
        match self {
            CompressionExtension::S3tc => &[
                "WEBGL_compressed_texture_s3tc",
                "MOZ_WEBGL_compressed_texture_s3tc",
                "WEBKIT_WEBGL_compressed_texture_s3tc",
            ],
            CompressionExtension::S3tcSrgb => &["WEBGL_compressed_texture_s3tc_srgb"],
            CompressionExtension::Etc => &["WEBGL_compressed_texture_etc"],
            CompressionExtension::Etc1 => &["WEBGL_compressed_texture_etc1"],
            CompressionExtension::Pvrtc => &[
                "WEBGL_compressed_texture_pvrtc",
                "WEBKIT_WEBGL_compressed_texture_pvrtc",
            ],
            CompressionExtension::Atc => &["WEBGL_compressed_texture_atc"],
            CompressionExtension::Astc => &["WEBGL_compressed_texture_astc"],
        }
    }

    /// Internal formats the extension exposes, in the order the extension lists them.
    pub const fn formats(self) -> &'static [CompressedFormat] {
        match self {
            CompressionExtension::S3tc => &[
                CompressedFormat::RgbS3tcDxt1,
                CompressedFormat::RgbaS3tcDxt1,
                CompressedFormat::RgbaS3tcDxt3,
                CompressedFormat::RgbaS3tcDxt5,
            ],
            CompressionExtension::S3tcSrgb => &[
                CompressedFormat::SrgbS3tcDxt1,
                CompressedFormat::SrgbAlphaS3tcDxt1,
                CompressedFormat::SrgbAlphaS3tcDxt3,
                CompressedFormat::SrgbAlphaS3tcDxt5,
            ],
            CompressionExtension::Etc => &[
                CompressedFormat::R11Eac,
                CompressedFormat::SignedR11Eac,
                CompressedFormat::Rg11Eac,
                CompressedFormat::SignedRg11Eac,
                CompressedFormat::Rgb8Etc2,
                CompressedFormat::Srgb8Etc2,
                CompressedFormat::Rgb8PunchthroughAlpha1Etc2,
                CompressedFormat::Srgb8PunchthroughAlpha1Etc2,
                CompressedFormat::Rgba8Etc2Eac,
                CompressedFormat::Srgb8Alpha8Etc2Eac,
            ],
            CompressionExtension::Etc1 => &[CompressedFormat::RgbEtc1],
            CompressionExtension::Pvrtc => &[
                CompressedFormat::RgbPvrtc4Bppv1,
                CompressedFormat::RgbPvrtc2Bppv1,
                CompressedFormat::RgbaPvrtc4Bppv1,
                CompressedFormat::RgbaPvrtc2Bppv1,
            ],
            CompressionExtension::Atc => &[
                CompressedFormat::RgbAtc,
                CompressedFormat::RgbaAtcExplicitAlpha,
                CompressedFormat::RgbaAtcInterpolatedAlpha,
            ],
            CompressionExtension::Astc => &[CompressedFormat::RgbaAstc4x4],
        }
    }

    /// Resolves a short key or a WebGL extension name. WebGL names match case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::all_values().iter().copied().find(|extension| {
            extension.key() == name
                || extension
                    .webgl_names()
                    .iter()
                    .any(|webgl| webgl.eq_ignore_ascii_case(name))
        })
    }

    const fn bit(self) -> u8 {
        1 << self as u8
    }
}

/// The set of compression extensions a rendering context has.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ExtensionSet(u8);

impl ExtensionSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Every known extension.
    pub fn all() -> Self {
        CompressionExtension::all_values().iter().copied().collect()
    }

    /// Builds a set from short keys and/or WebGL extension names; unknown names are skipped.
    pub fn from_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut set = Self::empty();
        for name in names {
            match CompressionExtension::from_name(name) {
                Some(extension) => set.insert(extension),
                None => trace!(name, "Ignoring unknown extension"),
            }
        }
        set
    }

    pub fn insert(&mut self, extension: CompressionExtension) {
        self.0 |= extension.bit();
    }

    pub fn with(mut self, extension: CompressionExtension) -> Self {
        self.insert(extension);
        self
    }

    pub const fn contains(self, extension: CompressionExtension) -> bool {
        self.0 & extension.bit() != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Present extensions in scan order.
    pub fn iter(self) -> impl Iterator<Item = CompressionExtension> {
        CompressionExtension::all_values()
            .iter()
            .copied()
            .filter(move |extension| self.contains(*extension))
    }

    /// The ordered union of every present extension's formats.
    pub fn supported_formats(self) -> Vec<CompressedFormat> {
        self.iter()
            .flat_map(|extension| extension.formats().iter().copied())
            .collect()
    }
}

impl FromIterator<CompressionExtension> for ExtensionSet {
    fn from_iter<I: IntoIterator<Item = CompressionExtension>>(iter: I) -> Self {
        let mut set = Self::empty();
        for extension in iter {
            set.insert(extension);
        }
        set
    }
}

/// Default Basis transcode targets for one rendering context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CapabilityProfile {
    pub default_format_with_alpha: BasisFormat,
    pub default_format_no_alpha: BasisFormat,
    /// No native compressed target was found for at least one alpha polarity, so both
    /// defaults are [`BasisFormat::FALLBACK`].
    pub fallback_required: bool,
}

impl CapabilityProfile {
    /// The profile used when nothing better is known.
    pub const FALLBACK: CapabilityProfile = CapabilityProfile {
        default_format_with_alpha: BasisFormat::FALLBACK,
        default_format_no_alpha: BasisFormat::FALLBACK,
        fallback_required: true,
    };
}

/// Derives the default transcode targets from the extensions a context supports.
///
/// For each polarity the first Basis-producible format in
/// [`ExtensionSet::supported_formats`] whose alpha classification matches is chosen. If either
/// polarity has no match the whole profile degrades to [`CapabilityProfile::FALLBACK`].
///
/// Pure: the same set always yields the same profile.
pub fn detect_capabilities(extensions: &ExtensionSet) -> CapabilityProfile {
    let candidates: Vec<BasisFormat> = extensions
        .supported_formats()
        .into_iter()
        .filter_map(BasisFormat::from_compressed)
        .collect();
    let first_with_alpha = |alpha: bool| {
        candidates
            .iter()
            .copied()
            .find(|format| format.has_alpha() == alpha)
    };

    match (first_with_alpha(true), first_with_alpha(false)) {
        (Some(with_alpha), Some(no_alpha)) => CapabilityProfile {
            default_format_with_alpha: with_alpha,
            default_format_no_alpha: no_alpha,
            fallback_required: false,
        },
        _ => CapabilityProfile::FALLBACK,
    }
}

/// The embedding renderer's view of its GPU context.
pub trait RenderingContext {
    /// Compression extensions the context currently exposes.
    fn supported_extensions(&self) -> Result<ExtensionSet, CapabilityError>;
}

impl RenderingContext for ExtensionSet {
    fn supported_extensions(&self) -> Result<ExtensionSet, CapabilityError> {
        Ok(*self)
    }
}

/// Memoizes the [`CapabilityProfile`] of the current rendering context.
///
/// The first call detects, concurrent first callers wait for that detection, and later calls
/// return the cached profile. [`CapabilityCache::invalidate`] forgets it when the context is
/// replaced.
#[derive(Debug, Default)]
pub struct CapabilityCache {
    profile: Mutex<Option<CapabilityProfile>>,
}

impl CapabilityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached profile, detecting it from `context` on first use.
    ///
    /// A context that cannot be queried yields [`CapabilityProfile::FALLBACK`], which is cached
    /// like any other result.
    pub fn get_or_detect(&self, context: &dyn RenderingContext) -> CapabilityProfile {
        let mut slot = self.profile.lock();
        if let Some(profile) = *slot {
            return profile;
        }

        let profile = match context.supported_extensions() {
            Ok(extensions) => detect_capabilities(&extensions),
            Err(error) => {
                warn!(%error, "Capability detection failed, using uncompressed fallback");
                CapabilityProfile::FALLBACK
            }
        };
        debug!(?profile, "Detected texture capabilities");
        *slot = Some(profile);
        profile
    }

    /// The cached profile, if one was detected.
    pub fn cached(&self) -> Option<CapabilityProfile> {
        *self.profile.lock()
    }

    /// Forgets the cached profile; the next [`CapabilityCache::get_or_detect`] detects again.
    pub fn invalidate(&self) {
        *self.profile.lock() = None;
    }
}
