//! # pixels
//!
//! Reads the palette and the pixel rows described by a [`BitmapDescriptor`].
use std::io;
use std::io::{
    Read,
    Seek,
    SeekFrom,
};

use log::{
    trace,
    warn,
};

use crate::error::{
    BmpError,
    Result,
};
use crate::header::{
    BitDepth,
    BitmapDescriptor,
    RowOrder,
};
use crate::options::DecoderOptions;

/// A palette entry.
#[derive( Debug, PartialEq, Eq, Clone, Copy )]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// The colors indexed by 1-bit pixels, in on-disk order.
#[derive( Debug, PartialEq, Eq, Clone )]
pub struct Palette {
    colors: Vec<Rgb>,
}

impl Palette {
    pub fn colors( &self ) -> &[Rgb] {
        &self.colors
    }

    pub fn get( &self, index: usize ) -> Option<Rgb> {
        self.colors.get( index ).copied()
    }

    pub fn len( &self ) -> usize {
        self.colors.len()
    }

    pub fn is_empty( &self ) -> bool {
        self.colors.is_empty()
    }
}

/// What the bytes of a decoded pixel mean.
#[derive( Debug, PartialEq, Eq, Clone, Copy )]
pub enum PixelLayout {
    /// One palette index per byte.
    Indexed,
    /// Three bytes per pixel in blue, green, red order.
    Bgr,
    /// Three bytes per pixel in red, green, blue order.
    Rgb,
}

/// Decoded pixels, row-major with the top row first.
#[derive( Debug, PartialEq, Eq, Clone )]
pub struct PixelBuffer {
    width: usize,
    height: usize,
    bytes_per_pixel: usize,
    layout: PixelLayout,
    data: Vec<u8>,
}

impl PixelBuffer {
    pub fn width( &self ) -> usize {
        self.width
    }

    pub fn height( &self ) -> usize {
        self.height
    }

    pub fn bytes_per_pixel( &self ) -> usize {
        self.bytes_per_pixel
    }

    pub fn layout( &self ) -> PixelLayout {
        self.layout
    }

    pub fn data( &self ) -> &[u8] {
        &self.data
    }

    /// The bytes of row `y`, counted from the top.
    ///
    /// # Panics
    ///
    /// If `y` is not below the height.
    pub fn row( &self, y: usize ) -> &[u8] {
        let stride = self.width * self.bytes_per_pixel;
        &self.data[ y * stride..( y + 1 ) * stride ]
    }

    pub fn into_vec( self ) -> Vec<u8> {
        self.data
    }
}

/// The result of decoding a bitmap.
#[derive( Debug, PartialEq, Eq, Clone )]
pub struct Decoded {
    pub pixels: PixelBuffer,
    /// `None` when the file has no palette, meaning pixel values are not indices.
    pub palette: Option<Palette>,
}

fn read_palette<R: Read + Seek>( input: &mut R, descriptor: &BitmapDescriptor )
    -> Result<Option<Palette>> {

    if descriptor.color_count == 0 {
        return Ok( None );
    }

    input.seek( SeekFrom::Start( descriptor.palette_offset ) )?;

    let count = descriptor.color_count as usize;
    let mut colors = Vec::with_capacity( count.min( 256 ) );
    let mut entry = [0; 4];

    for _ in 0..count {
        input.read_exact( &mut entry )?;
        colors.push( Rgb {
            b: entry[0],
            g: entry[1],
            r: entry[2],
        } ); // entry[3] is reserved
    }

    Ok( Some( Palette { colors } ) )
}

/// Number of bytes a row of `width` pixels occupies on disk, padding included.
fn stored_row_size( depth: BitDepth, width: usize ) -> Result<usize> {
    let bits = match depth {
        BitDepth::OneBit => Some( width ),
        BitDepth::TwentyFourBit => width.checked_mul( 24 ),
        BitDepth::ThirtyTwoBit => width.checked_mul( 32 ),
    };

    bits.and_then( | bits | bits.checked_add( 31 ) )
        .map( | bits | ( bits / 32 ) * 4 )
        .ok_or( BmpError::OverflowOccurred )
}

type RowDecoder = fn( width: usize, src: &[u8], dst: &mut [u8] );

fn decode_1bpp( width: usize, src: &[u8], dst: &mut [u8] ) {
    let mut x = 0;

    for byte in src {
        for bit in ( 0..8 ).rev() {
            if x >= width {
                return;
            }

            dst[ x ] = ( byte >> bit ) & 0x01;
            x += 1;
        }
    }
}

fn decode_24bpp( width: usize, src: &[u8], dst: &mut [u8] ) {
    let stride = width * 3;
    dst.copy_from_slice( &src[ ..stride ] );
}

fn decode_24bpp_swapped( width: usize, src: &[u8], dst: &mut [u8] ) {
    let pixels = src[ ..width * 3 ].chunks_exact( 3 );

    for ( bytes, out ) in pixels.zip( dst.chunks_exact_mut( 3 ) ) {
        out[0] = bytes[2];
        out[1] = bytes[1];
        out[2] = bytes[0];
    }
}

// Pixels are read as (x, b, g, r) and the first byte is dropped.
fn decode_32bpp( width: usize, src: &[u8], dst: &mut [u8] ) {
    let pixels = src[ ..width * 4 ].chunks_exact( 4 );

    for ( bytes, out ) in pixels.zip( dst.chunks_exact_mut( 3 ) ) {
        out[0] = bytes[3];
        out[1] = bytes[2];
        out[2] = bytes[1];
    }
}

/// Reads exactly `size` bytes of row data, growing the buffer only as bytes
/// arrive.
fn read_stored_rows<R: Read>( input: &mut R, size: usize ) -> Result<Vec<u8>> {
    let mut stored = Vec::new();
    input.take( size as u64 ).read_to_end( &mut stored )?;

    if stored.len() < size {
        return Err( io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!( "Pixel data ends after {} of {} bytes", stored.len(), size ) ).into() );
    }
    Ok( stored )
}

fn check_limit( dimension: &'static str, found: usize, limit: usize ) -> Result<()> {
    if found > limit {
        return Err( BmpError::TooLargeDimensions { dimension, limit, found } );
    }
    Ok( () )
}

/// Reads the palette and every pixel row.
///
/// Nothing is returned unless the whole image could be read.
pub fn read_pixels<R: Read + Seek>(
    input: &mut R, descriptor: &BitmapDescriptor, options: &DecoderOptions ) -> Result<Decoded> {

    if descriptor.compression != 0 {
        return Err( BmpError::UnsupportedCompression( descriptor.compression ) );
    }

    let depth = descriptor.bit_depth()?;
    let width = descriptor.pixel_width();
    let height = descriptor.pixel_height();

    check_limit( "width", width, options.get_max_width() )?;
    check_limit( "height", height, options.get_max_height() )?;

    if descriptor.pixel_data_offset < 0 {
        return Err( BmpError::InvalidOffset( descriptor.pixel_data_offset ) );
    }

    let bytes_per_pixel = depth.bytes_per_pixel();
    let stride = descriptor.row_stride()?;
    let size = stride.checked_mul( height ).ok_or( BmpError::OverflowOccurred )?;
    let row_size = stored_row_size( depth, width )?;

    // Read palette
    let palette = read_palette( input, descriptor )?;
    match ( depth, &palette ) {
        ( BitDepth::OneBit, None ) => warn!( "1-bit bitmap without a palette" ),
        ( BitDepth::OneBit, _ ) => (),
        ( _, Some( _ ) ) => warn!( "Palette on a {}-bit bitmap", descriptor.bits_per_pixel ),
        _ => (),
    }

    let swap = options.get_swap_24bit_channels();
    let decode_row: RowDecoder = match depth {
        BitDepth::OneBit => decode_1bpp,
        BitDepth::TwentyFourBit if swap => decode_24bpp_swapped,
        BitDepth::TwentyFourBit => decode_24bpp,
        BitDepth::ThirtyTwoBit => decode_32bpp,
    };
    let layout = match depth {
        BitDepth::OneBit => PixelLayout::Indexed,
        BitDepth::TwentyFourBit if !swap => PixelLayout::Bgr,
        _ => PixelLayout::Rgb,
    };

    trace!( "Row strategy: {:?} into {:?}", depth, layout );
    trace!( "Stored row size: {}", row_size );
    trace!( "Row order: {:?}", descriptor.row_order() );

    // Read pixel data
    input.seek( SeekFrom::Start( descriptor.pixel_data_offset as u64 ) )?;

    // Stored rows are read in full before the output buffer is allocated.
    let stored_size = row_size.checked_mul( height ).ok_or( BmpError::OverflowOccurred )?;
    let stored = read_stored_rows( input, stored_size )?;

    let mut data = vec![0; size];

    if row_size > 0 {
        for ( index, buffer ) in stored.chunks_exact( row_size ).enumerate() {
            let y = match descriptor.row_order() {
                RowOrder::BottomUp => height - 1 - index,
                RowOrder::TopDown => index,
            };

            decode_row( width, buffer, &mut data[ y * stride..( y + 1 ) * stride ] );
        }
    }

    Ok( Decoded {
        pixels: PixelBuffer {
            width,
            height,
            bytes_per_pixel,
            layout,
            data,
        },
        palette,
    } )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn stored_rows_are_padded_to_four_bytes() {
        assert_eq!( stored_row_size( BitDepth::OneBit, 1 ).unwrap(), 4 );
        assert_eq!( stored_row_size( BitDepth::OneBit, 9 ).unwrap(), 4 );
        assert_eq!( stored_row_size( BitDepth::OneBit, 32 ).unwrap(), 4 );
        assert_eq!( stored_row_size( BitDepth::OneBit, 33 ).unwrap(), 8 );
        assert_eq!( stored_row_size( BitDepth::TwentyFourBit, 1 ).unwrap(), 4 );
        assert_eq!( stored_row_size( BitDepth::TwentyFourBit, 2 ).unwrap(), 8 );
        assert_eq!( stored_row_size( BitDepth::TwentyFourBit, 4 ).unwrap(), 12 );
        assert_eq!( stored_row_size( BitDepth::ThirtyTwoBit, 3 ).unwrap(), 12 );
    }

    #[test]
    fn short_pixel_data_is_an_io_error() {
        let mut input = Cursor::new( vec![ 0; 10 ] );
        match read_stored_rows( &mut input, 1 << 30 ) {
            Err( BmpError::Io( e ) ) => assert_eq!( e.kind(), io::ErrorKind::UnexpectedEof ),
            _ => panic!( "expected an io error" ),
        }
    }

    #[test]
    fn reads_exactly_the_stored_rows() {
        let mut input = Cursor::new( vec![ 7; 12 ] );
        assert_eq!( read_stored_rows( &mut input, 8 ).unwrap(), vec![ 7; 8 ] );
        assert_eq!( input.position(), 8 );
    }

    #[test]
    fn stored_row_size_overflow() {
        assert!( matches!(
            stored_row_size( BitDepth::ThirtyTwoBit, usize::MAX ),
            Err( BmpError::OverflowOccurred ) ) );
    }

    #[test]
    fn unpacks_bits_most_significant_first() {
        let mut dst = [0xFF; 8];
        decode_1bpp( 8, &[0b1011_0010, 0, 0, 0], &mut dst );
        assert_eq!( dst, [1, 0, 1, 1, 0, 0, 1, 0] );
    }

    #[test]
    fn drops_bits_past_the_width() {
        let mut dst = [0xFF; 9];
        decode_1bpp( 9, &[0xFF, 0b0111_1111, 0xFF, 0xFF], &mut dst );
        assert_eq!( dst, [1, 1, 1, 1, 1, 1, 1, 1, 0] );
    }

    #[test]
    fn copies_24bit_rows_verbatim() {
        let mut dst = [0; 6];
        decode_24bpp( 2, &[1, 2, 3, 4, 5, 6, 0, 0], &mut dst );
        assert_eq!( dst, [1, 2, 3, 4, 5, 6] );
    }

    #[test]
    fn swaps_24bit_rows_on_request() {
        let mut dst = [0; 6];
        decode_24bpp_swapped( 2, &[1, 2, 3, 4, 5, 6, 0, 0], &mut dst );
        assert_eq!( dst, [3, 2, 1, 6, 5, 4] );
    }

    #[test]
    fn drops_first_byte_of_32bit_pixels() {
        let mut dst = [0; 6];
        decode_32bpp( 2, &[9, 1, 2, 3, 9, 4, 5, 6], &mut dst );
        assert_eq!( dst, [3, 2, 1, 6, 5, 4] );
    }
}
