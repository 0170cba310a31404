//! # bmp_rs
//!
//! A bitmap file decoder for uncompressed Microsoft *bmp* files with 1, 24 or
//! 32 bits per pixel.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::fs::File;
//!
//! fn main() -> bmp_rs::Result<()> {
//!     let mut file = File::open( "image.bmp" )?;
//!
//!     // `None` means the file is not a bitmap and has been rewound.
//!     if let Some( image ) = bmp_rs::open( &mut file ) {
//!         println!( "{}x{} {}", image.width(), image.height(), image.meta().source_format );
//!
//!         let decoded = image.load()?;
//!         // Rows in `decoded.pixels` are stored top row first.
//!     }
//!     Ok( () )
//! }
//! ```
//!
extern crate byteorder;

mod error;
mod header;
mod options;
mod pixels;

use std::io::{
    Read,
    Seek,
    SeekFrom,
    Write,
};

use log::debug;

pub use crate::error::{
    BmpError,
    Result,
};
pub use crate::header::{
    BitDepth,
    BitmapDescriptor,
    HeaderSize,
    RowOrder,
};
pub use crate::options::DecoderOptions;
pub use crate::pixels::{
    Decoded,
    Palette,
    PixelBuffer,
    PixelLayout,
    Rgb,
};

/// Name attached to every image opened by this crate.
pub const FORMAT_NAME: &str = "BMP";

/// File extensions handled by this crate.
pub const EXTENSIONS: &[&str] = &[ "bmp" ];

/// Information about where an image came from.
#[derive( Debug, PartialEq, Eq, Clone, Copy )]
pub struct Metadata {
    pub source_format: &'static str,
}

/// A bitmap whose headers have been read but whose pixels have not.
///
/// Holds on to the stream it was opened from until [`Image::load`] is called.
pub struct Image<'a, R: Read + Seek> {
    input: &'a mut R,
    descriptor: BitmapDescriptor,
    options: DecoderOptions,
    meta: Metadata,
}

impl<'a, R: Read + Seek> Image<'a, R> {
    pub fn width( &self ) -> usize {
        self.descriptor.pixel_width()
    }

    pub fn height( &self ) -> usize {
        self.descriptor.pixel_height()
    }

    pub fn descriptor( &self ) -> &BitmapDescriptor {
        &self.descriptor
    }

    pub fn meta( &self ) -> &Metadata {
        &self.meta
    }

    /// Reads the palette and pixels. Any failure from here on is fatal and no
    /// partial image is returned.
    pub fn load( self ) -> Result<Decoded> {
        pixels::read_pixels( self.input, &self.descriptor, &self.options )
    }
}

/// Checks whether `input` looks like a bitmap.
///
/// Returns `None` after rewinding the stream to its start if the headers
/// cannot be read, so the stream can be offered to another decoder.
pub fn open<R: Read + Seek>( input: &mut R ) -> Option<Image<'_, R>> {
    open_with_options( input, DecoderOptions::default() )
}

/// Like [`open`], with options applied when the image is loaded.
pub fn open_with_options<R: Read + Seek>( input: &mut R, options: DecoderOptions )
    -> Option<Image<'_, R>> {

    match header::read_descriptor( input ) {
        Ok( descriptor ) => Some( Image {
            input,
            descriptor,
            options,
            meta: Metadata { source_format: FORMAT_NAME },
        } ),
        Err( e ) => {
            debug!( "Not a bitmap: {}", e );
            if let Err( e ) = input.seek( SeekFrom::Start( 0 ) ) {
                debug!( "Could not rewind stream: {}", e );
            }
            None
        },
    }
}

/// Reads a whole bitmap, reporting header errors instead of treating them as
/// "not a bitmap".
pub fn decode<R: Read + Seek>( input: &mut R ) -> Result<Decoded> {
    decode_with_options( input, &DecoderOptions::default() )
}

pub fn decode_with_options<R: Read + Seek>( input: &mut R, options: &DecoderOptions )
    -> Result<Decoded> {

    let descriptor = header::read_descriptor( input )?;
    pixels::read_pixels( input, &descriptor, options )
}

/// Writing bitmaps is not supported; this always fails.
pub fn save<W: Write>( _pixels: &PixelBuffer, _output: &mut W ) -> Result<()> {
    Err( BmpError::FormatNotSupported( "bmp" ) )
}

/// Checks the start of a file for the `BM` magic and a supported header size
/// without reading any further.
pub fn probe( bytes: &[u8] ) -> bool {
    match ( bytes.get( 0..2 ), bytes.get( 14..18 ) ) {
        ( Some( magic ), Some( size ) ) if magic == b"BM" => {
            let size = i32::from_le_bytes( [ size[0], size[1], size[2], size[3] ] );
            HeaderSize::from_i32( size ).is_ok()
        },
        _ => false,
    }
}
