//! Mip chain dimension arithmetic.

/// Longest mip chain a `u32` dimension can have. Header-declared counts above this only
/// repeat 1x1 levels, so it bounds preallocation.
pub const MAX_MIP_LEVELS: u32 = u32::BITS;

/// Dimension of mip `level` for a base dimension: halved per level, floored, minimum 1.
#[inline]
pub const fn mip_dimension(base: u32, level: u32) -> u32 {
    if level >= u32::BITS {
        return 1;
    }
    let value = base >> level;
    if value == 0 {
        1
    } else {
        value
    }
}

/// Width and height of mip `level`.
#[inline]
pub const fn mip_dimensions(width: u32, height: u32, level: u32) -> (u32, u32) {
    (mip_dimension(width, level), mip_dimension(height, level))
}
