//! Decoder configuration.

/// Options that influence how pixel data is decoded.
///
/// The defaults decode any image up to 16384 pixels in each dimension and
/// copy 24-bit pixels in their on-disk order.
#[derive( Debug, Clone, Copy, PartialEq, Eq )]
pub struct DecoderOptions {
    max_width: usize,
    max_height: usize,
    swap_24bit_channels: bool,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        DecoderOptions {
            max_width: 1 << 14,
            max_height: 1 << 14,
            swap_24bit_channels: false,
        }
    }
}

impl DecoderOptions {
    pub fn new() -> DecoderOptions {
        DecoderOptions::default()
    }

    pub const fn get_max_width( &self ) -> usize {
        self.max_width
    }

    pub const fn get_max_height( &self ) -> usize {
        self.max_height
    }

    /// Whether 24-bit rows are reordered from (b, g, r) to (r, g, b).
    pub const fn get_swap_24bit_channels( &self ) -> bool {
        self.swap_24bit_channels
    }

    /// Images wider than this are rejected before any pixel is read.
    pub fn set_max_width( mut self, width: usize ) -> Self {
        self.max_width = width;
        self
    }

    /// Images taller than this are rejected before any pixel is read.
    pub fn set_max_height( mut self, height: usize ) -> Self {
        self.max_height = height;
        self
    }

    /// 24-bit pixels are stored as (b, g, r) on disk and are copied verbatim
    /// unless this is set, in which case the output is (r, g, b) like the
    /// 32-bit path.
    pub fn set_swap_24bit_channels( mut self, yes: bool ) -> Self {
        self.swap_24bit_channels = yes;
        self
    }
}
