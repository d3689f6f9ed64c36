//! Uncompressed pixel layouts described by a GL pixel type and pixel format pair.

/// GL pixel data type (`glType` in a KTX header).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlType {
    Byte,
    UnsignedByte,
    Short,
    UnsignedShort,
    Int,
    UnsignedInt,
    Float,
    HalfFloat,
    HalfFloatOes,
    UnsignedShort565,
    UnsignedShort4444,
    UnsignedShort5551,
    UnsignedInt2101010Rev,
    UnsignedInt10f11f11fRev,
    UnsignedInt5999Rev,
    UnsignedInt248,
}

impl GlType {
    pub fn from_gl(value: u32) -> Option<Self> {
        Some(match value {
            0x1400 => GlType::Byte,
            0x1401 => GlType::UnsignedByte,
            0x1402 => GlType::Short,
            0x1403 => GlType::UnsignedShort,
            0x1404 => GlType::Int,
            0x1405 => GlType::UnsignedInt,
            0x1406 => GlType::Float,
            0x140B => GlType::HalfFloat,
            0x8D61 => GlType::HalfFloatOes,
            0x8363 => GlType::UnsignedShort565,
            0x8033 => GlType::UnsignedShort4444,
            0x8034 => GlType::UnsignedShort5551,
            0x8368 => GlType::UnsignedInt2101010Rev,
            0x8C3B => GlType::UnsignedInt10f11f11fRev,
            0x8C3E => GlType::UnsignedInt5999Rev,
            0x84FA => GlType::UnsignedInt248,
            _ => return None,
        })
    }

    pub const fn to_gl(self) -> u32 {
        match self {
            GlType::Byte => 0x1400,
            GlType::UnsignedByte => 0x1401,
            GlType::Short => 0x1402,
            GlType::UnsignedShort => 0x1403,
            GlType::Int => 0x1404,
            GlType::UnsignedInt => 0x1405,
            GlType::Float => 0x1406,
            GlType::HalfFloat => 0x140B,
            GlType::HalfFloatOes => 0x8D61,
            GlType::UnsignedShort565 => 0x8363,
            GlType::UnsignedShort4444 => 0x8033,
            GlType::UnsignedShort5551 => 0x8034,
            GlType::UnsignedInt2101010Rev => 0x8368,
            GlType::UnsignedInt10f11f11fRev => 0x8C3B,
            GlType::UnsignedInt5999Rev => 0x8C3E,
            GlType::UnsignedInt248 => 0x84FA,
        }
    }

    /// Bytes of one whole pixel for packed types, where all components share one element.
    pub const fn packed_bytes_per_pixel(self) -> Option<u32> {
        match self {
            GlType::UnsignedShort565 | GlType::UnsignedShort4444 | GlType::UnsignedShort5551 => {
                Some(2)
            }
            GlType::UnsignedInt2101010Rev
            | GlType::UnsignedInt10f11f11fRev
            | GlType::UnsignedInt5999Rev
            | GlType::UnsignedInt248 => Some(4),
            _ => None,
        }
    }

    /// Bytes of one component for non-packed types.
    pub const fn bytes_per_component(self) -> Option<u32> {
        match self {
            GlType::Byte | GlType::UnsignedByte => Some(1),
            GlType::Short | GlType::UnsignedShort | GlType::HalfFloat | GlType::HalfFloatOes => {
                Some(2)
            }
            GlType::Int | GlType::UnsignedInt | GlType::Float => Some(4),
            _ => None,
        }
    }
}

/// GL pixel format (`glFormat` in a KTX header).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlFormat {
    Rgba,
    Rgb,
    Rg,
    Red,
    RgbaInteger,
    RgbInteger,
    RgInteger,
    RedInteger,
    Alpha,
    Luminance,
    LuminanceAlpha,
    DepthComponent,
    DepthStencil,
}

impl GlFormat {
    pub fn from_gl(value: u32) -> Option<Self> {
        Some(match value {
            0x1908 => GlFormat::Rgba,
            0x1907 => GlFormat::Rgb,
            0x8227 => GlFormat::Rg,
            0x1903 => GlFormat::Red,
            0x8D99 => GlFormat::RgbaInteger,
            0x8D98 => GlFormat::RgbInteger,
            0x8228 => GlFormat::RgInteger,
            0x8D94 => GlFormat::RedInteger,
            0x1906 => GlFormat::Alpha,
            0x1909 => GlFormat::Luminance,
            0x190A => GlFormat::LuminanceAlpha,
            0x1902 => GlFormat::DepthComponent,
            0x84F9 => GlFormat::DepthStencil,
            _ => return None,
        })
    }

    pub const fn to_gl(self) -> u32 {
        match self {
            GlFormat::Rgba => 0x1908,
            GlFormat::Rgb => 0x1907,
            GlFormat::Rg => 0x8227,
            GlFormat::Red => 0x1903,
            GlFormat::RgbaInteger => 0x8D99,
            GlFormat::RgbInteger => 0x8D98,
            GlFormat::RgInteger => 0x8228,
            GlFormat::RedInteger => 0x8D94,
            GlFormat::Alpha => 0x1906,
            GlFormat::Luminance => 0x1909,
            GlFormat::LuminanceAlpha => 0x190A,
            GlFormat::DepthComponent => 0x1902,
            GlFormat::DepthStencil => 0x84F9,
        }
    }

    pub const fn component_count(self) -> u32 {
        match self {
            GlFormat::Rgba | GlFormat::RgbaInteger => 4,
            GlFormat::Rgb | GlFormat::RgbInteger => 3,
            GlFormat::Rg | GlFormat::RgInteger | GlFormat::LuminanceAlpha => 2,
            GlFormat::DepthStencil => 2,
            GlFormat::Red
            | GlFormat::RedInteger
            | GlFormat::Alpha
            | GlFormat::Luminance
            | GlFormat::DepthComponent => 1,
        }
    }
}

/// An uncompressed pixel layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UncompressedFormat {
    pub gl_type: GlType,
    pub gl_format: GlFormat,
}

impl UncompressedFormat {
    /// `UNSIGNED_BYTE` / `RGBA`
    pub const RGBA8: Self = Self::new(GlType::UnsignedByte, GlFormat::Rgba);
    /// `UNSIGNED_SHORT_5_6_5` / `RGB`, the universal transcode fallback.
    pub const RGB565: Self = Self::new(GlType::UnsignedShort565, GlFormat::Rgb);
    /// `UNSIGNED_SHORT_4_4_4_4` / `RGBA`
    pub const RGBA4444: Self = Self::new(GlType::UnsignedShort4444, GlFormat::Rgba);

    pub const fn new(gl_type: GlType, gl_format: GlFormat) -> Self {
        Self { gl_type, gl_format }
    }

    /// Resolves raw KTX `glType` / `glFormat` values.
    pub fn from_gl(gl_type: u32, gl_format: u32) -> Option<Self> {
        Some(Self::new(GlType::from_gl(gl_type)?, GlFormat::from_gl(gl_format)?))
    }

    /// Bytes of one pixel: the packed size for packed types, otherwise
    /// component size times component count.
    pub const fn bytes_per_pixel(self) -> u32 {
        match self.gl_type.packed_bytes_per_pixel() {
            Some(bytes) => bytes,
            None => match self.gl_type.bytes_per_component() {
                Some(bytes) => bytes * self.gl_format.component_count(),
                None => 0,
            },
        }
    }

    /// Tightly packed byte length of a level; [`None`] if it does not fit in a `usize`.
    pub const fn level_byte_len(self, width: u32, height: u32) -> Option<usize> {
        match (width as usize).checked_mul(height as usize) {
            Some(pixels) => pixels.checked_mul(self.bytes_per_pixel() as usize),
            None => None,
        }
    }
}
