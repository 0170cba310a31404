//! Errors produced while reading a bitmap.

use std::io;

use thiserror::Error;

/// Everything that can go wrong while sniffing or decoding a bitmap.
#[derive( Debug, Error )]
#[non_exhaustive]
pub enum BmpError {
    /// The stream does not start with `BM`.
    #[error( "Invalid magic number {0:02X?}, expected \"BM\"" )]
    InvalidMagicNumber( [u8; 2] ),

    /// The DIB header size is not one of the supported layouts.
    #[error( "Unknown bitmap header size {0}" )]
    UnknownHeaderSize( i32 ),

    #[error( "Unexpected number of color planes {0}" )]
    UnexpectedPlaneCount( u16 ),

    #[error( "Invalid image dimensions {width}x{height}" )]
    InvalidDimensions { width: i32, height: i32 },

    #[error( "Unsupported bits per pixel {0}" )]
    UnsupportedBitDepth( u16 ),

    /// Only uncompressed (`BI_RGB`) pixel data can be decoded.
    #[error( "Unsupported compression method {0}" )]
    UnsupportedCompression( u32 ),

    #[error( "Too large {dimension} {found}, limit is {limit}" )]
    TooLargeDimensions { dimension: &'static str, limit: usize, found: usize },

    #[error( "Image size calculation overflowed" )]
    OverflowOccurred,

    #[error( "Invalid pixel data offset {0}" )]
    InvalidOffset( i32 ),

    /// Returned by the encoding side, which does not exist for this format.
    #[error( "Format {0} is not supported for writing" )]
    FormatNotSupported( &'static str ),

    #[error( "I/O error: {0}" )]
    Io( #[from] io::Error ),
}

pub type Result<T> = std::result::Result<T, BmpError>;
