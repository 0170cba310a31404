//! # header
//!
//! Reads the 14 byte file header and the DIB header that follows it.
use std::io::{
    Read,
    Seek,
};

use byteorder::{
    ReadBytesExt,
    LittleEndian,
};
use log::trace;

use crate::error::{
    BmpError,
    Result,
};

const MAGIC: [u8; 2] = *b"BM";

const INFO_SIZE: i32 = 40;
const INFO_V2_SIZE: i32 = 52;
const INFO_V3_SIZE: i32 = 56;
const INFO_V4_SIZE: i32 = 108;
const INFO_V5_SIZE: i32 = 124;

/// The DIB header layouts this decoder recognizes, keyed by their size in bytes.
#[derive( Debug, PartialEq, Eq, Clone, Copy )]
pub enum HeaderSize {
    /// `BITMAPINFOHEADER`
    Info = INFO_SIZE as isize,
    /// `BITMAPV2INFOHEADER`, adds rgb masks
    InfoV2 = INFO_V2_SIZE as isize,
    /// `BITMAPV3INFOHEADER`, adds an alpha mask
    InfoV3 = INFO_V3_SIZE as isize,
    /// `BITMAPV4HEADER`, adds colour space and gamma
    InfoV4 = INFO_V4_SIZE as isize,
    /// `BITMAPV5HEADER`, adds an ICC profile
    InfoV5 = INFO_V5_SIZE as isize,
}

/// Reads the layout of one header size. The stream is positioned right after
/// the header size field.
type LayoutReader<R> = fn( &mut R, HeaderSize, Offsets ) -> Result<BitmapDescriptor>;

#[derive( Debug, Clone, Copy )]
struct Offsets {
    pixel_data: i32,
    palette: u64,
}

impl HeaderSize {
    pub fn from_i32( size: i32 ) -> Result<HeaderSize> {
        match size {
            INFO_SIZE => Ok( HeaderSize::Info ),
            INFO_V2_SIZE => Ok( HeaderSize::InfoV2 ),
            INFO_V3_SIZE => Ok( HeaderSize::InfoV3 ),
            INFO_V4_SIZE => Ok( HeaderSize::InfoV4 ),
            INFO_V5_SIZE => Ok( HeaderSize::InfoV5 ),
            x => Err( BmpError::UnknownHeaderSize( x ) ),
        }
    }

    fn from_reader<R: Read>( input: &mut R ) -> Result<HeaderSize> {
        HeaderSize::from_i32( input.read_i32::<LittleEndian>()? )
    }

    /// Size of the header in bytes, including the size field itself.
    pub fn size( self ) -> u32 {
        self as u32
    }

    // Every layout shares the BITMAPINFOHEADER prefix and nothing past it is
    // interpreted yet.
    fn reader<R: Read>( self ) -> LayoutReader<R> {
        match self {
            HeaderSize::Info
            | HeaderSize::InfoV2
            | HeaderSize::InfoV3
            | HeaderSize::InfoV4
            | HeaderSize::InfoV5 => read_info_prefix::<R>,
        }
    }
}

/// The pixel encodings the decoder knows a row strategy for.
#[derive( Debug, PartialEq, Eq, Clone, Copy )]
pub enum BitDepth {
    OneBit,
    TwentyFourBit,
    ThirtyTwoBit,
}

impl BitDepth {
    pub fn from_bpp( bpp: u16 ) -> Result<BitDepth> {
        match bpp {
            1 => Ok( BitDepth::OneBit ),
            24 => Ok( BitDepth::TwentyFourBit ),
            32 => Ok( BitDepth::ThirtyTwoBit ),
            x => Err( BmpError::UnsupportedBitDepth( x ) ),
        }
    }

    /// Bytes per pixel in the decoded output, not on disk. 32-bit pixels lose
    /// their fourth channel.
    pub fn bytes_per_pixel( self ) -> usize {
        match self {
            BitDepth::OneBit => 1,
            BitDepth::TwentyFourBit | BitDepth::ThirtyTwoBit => 3,
        }
    }
}

/// The order in which rows are stored on disk.
#[derive( Debug, PartialEq, Eq, Clone, Copy )]
pub enum RowOrder {
    /// The first stored row is the bottom of the image. Positive height.
    BottomUp,
    /// The first stored row is the top of the image. Negative height.
    TopDown,
}

/// Everything the file and DIB headers say about a bitmap.
#[derive( Debug, PartialEq, Eq, Clone )]
pub struct BitmapDescriptor {
    pub header_size: HeaderSize,
    pub width: i32,
    pub height: i32,
    pub plane_count: u16,
    pub bits_per_pixel: u16,
    pub compression: u32,
    pub bitmap_byte_size: u32,
    pub horizontal_resolution: i32,
    pub vertical_resolution: i32,
    pub color_count: u32,
    pub important_color_count: u32,
    /// Absolute offset of the first pixel row.
    pub pixel_data_offset: i32,
    /// Absolute offset of the first palette entry, the end of the DIB header.
    pub palette_offset: u64,
}

impl BitmapDescriptor {
    pub fn bit_depth( &self ) -> Result<BitDepth> {
        BitDepth::from_bpp( self.bits_per_pixel )
    }

    pub fn bytes_per_pixel( &self ) -> Result<usize> {
        Ok( self.bit_depth()?.bytes_per_pixel() )
    }

    pub fn row_order( &self ) -> RowOrder {
        if self.height < 0 { RowOrder::TopDown } else { RowOrder::BottomUp }
    }

    pub fn pixel_width( &self ) -> usize {
        self.width as usize
    }

    pub fn pixel_height( &self ) -> usize {
        self.height.unsigned_abs() as usize
    }

    /// Bytes in one decoded row, without any padding.
    pub fn row_stride( &self ) -> Result<usize> {
        self.pixel_width()
            .checked_mul( self.bytes_per_pixel()? )
            .ok_or( BmpError::OverflowOccurred )
    }
}

fn read_info_prefix<R: Read>( input: &mut R, header_size: HeaderSize, offsets: Offsets )
    -> Result<BitmapDescriptor> {

    let width = input.read_i32::<LittleEndian>()?;
    let height = input.read_i32::<LittleEndian>()?;
    let plane_count = input.read_u16::<LittleEndian>()?;
    let bits_per_pixel = input.read_u16::<LittleEndian>()?;
    let compression = input.read_u32::<LittleEndian>()?;
    let bitmap_byte_size = input.read_u32::<LittleEndian>()?;
    let horizontal_resolution = input.read_i32::<LittleEndian>()?;
    let vertical_resolution = input.read_i32::<LittleEndian>()?;
    let color_count = input.read_u32::<LittleEndian>()?;
    let important_color_count = input.read_u32::<LittleEndian>()?;

    Ok( BitmapDescriptor {
        header_size,
        width,
        height,
        plane_count,
        bits_per_pixel,
        compression,
        bitmap_byte_size,
        horizontal_resolution,
        vertical_resolution,
        color_count,
        important_color_count,
        pixel_data_offset: offsets.pixel_data,
        palette_offset: offsets.palette,
    } )
}

/// Reads the file header and the DIB header from a stream positioned at the
/// start of a bitmap.
///
/// The stream is left somewhere inside the DIB header; the pixel decoder seeks
/// to the palette and pixel data on its own.
pub fn read_descriptor<R: Read + Seek>( input: &mut R ) -> Result<BitmapDescriptor> {
    // Read file header
    let mut magic = [0; 2];
    input.read_exact( &mut magic )?;
    if magic != MAGIC {
        return Err( BmpError::InvalidMagicNumber( magic ) );
    }

    let file_size = input.read_u32::<LittleEndian>()?;
    input.read_u32::<LittleEndian>()?; // Reserved
    let pixel_data = input.read_i32::<LittleEndian>()?;

    // Read DIB header
    let pre_header = input.stream_position()?;
    let header_size = HeaderSize::from_reader( input )?;
    let offsets = Offsets {
        pixel_data,
        palette: pre_header + u64::from( header_size.size() ),
    };

    let read_layout = header_size.reader::<R>();
    let descriptor = read_layout( input, header_size, offsets )?;

    trace!( "File size: {}", file_size );
    trace!( "Header: {:?}", descriptor.header_size );
    trace!( "Width: {}", descriptor.width );
    trace!( "Height: {}", descriptor.height );
    trace!( "Bits per pixel: {}", descriptor.bits_per_pixel );
    trace!( "Compression: {}", descriptor.compression );
    trace!( "Colors: {}", descriptor.color_count );

    if descriptor.plane_count != 1 {
        return Err( BmpError::UnexpectedPlaneCount( descriptor.plane_count ) );
    }

    if descriptor.width < 0 || descriptor.height == i32::MIN {
        return Err( BmpError::InvalidDimensions {
            width: descriptor.width,
            height: descriptor.height,
        } );
    }

    Ok( descriptor )
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::WriteBytesExt;
    use std::io::Cursor;

    fn header( header_size: i32, planes: u16, bpp: u16 ) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice( b"BM" );
        data.write_u32::<LittleEndian>( 0 ).unwrap();
        data.write_u32::<LittleEndian>( 0 ).unwrap();
        data.write_i32::<LittleEndian>( 14 + header_size ).unwrap();
        data.write_i32::<LittleEndian>( header_size ).unwrap();
        data.write_i32::<LittleEndian>( 3 ).unwrap(); // width
        data.write_i32::<LittleEndian>( -2 ).unwrap(); // height
        data.write_u16::<LittleEndian>( planes ).unwrap();
        data.write_u16::<LittleEndian>( bpp ).unwrap();
        data.write_u32::<LittleEndian>( 0 ).unwrap(); // compression
        data.write_u32::<LittleEndian>( 24 ).unwrap(); // image size
        data.write_i32::<LittleEndian>( 2835 ).unwrap();
        data.write_i32::<LittleEndian>( 2834 ).unwrap();
        data.write_u32::<LittleEndian>( 2 ).unwrap(); // colors
        data.write_u32::<LittleEndian>( 1 ).unwrap(); // important colors
        data.resize( 14 + header_size as usize, 0 );
        data
    }

    #[test]
    fn reads_every_info_field() {
        let mut input = Cursor::new( header( 40, 1, 24 ) );
        let descriptor = read_descriptor( &mut input ).unwrap();

        assert_eq!( descriptor, BitmapDescriptor {
            header_size: HeaderSize::Info,
            width: 3,
            height: -2,
            plane_count: 1,
            bits_per_pixel: 24,
            compression: 0,
            bitmap_byte_size: 24,
            horizontal_resolution: 2835,
            vertical_resolution: 2834,
            color_count: 2,
            important_color_count: 1,
            pixel_data_offset: 54,
            palette_offset: 54,
        } );
        assert_eq!( descriptor.row_order(), RowOrder::TopDown );
        assert_eq!( descriptor.pixel_height(), 2 );
        assert_eq!( descriptor.row_stride().unwrap(), 9 );
    }

    #[test]
    fn palette_follows_the_declared_header_size() {
        for &( size, expected ) in &[
            ( 40, HeaderSize::Info ),
            ( 52, HeaderSize::InfoV2 ),
            ( 56, HeaderSize::InfoV3 ),
            ( 108, HeaderSize::InfoV4 ),
            ( 124, HeaderSize::InfoV5 ),
        ] {
            let mut input = Cursor::new( header( size, 1, 32 ) );
            let descriptor = read_descriptor( &mut input ).unwrap();

            assert_eq!( descriptor.header_size, expected );
            assert_eq!( descriptor.palette_offset, 14 + size as u64 );
            // Only the 40 byte prefix is consumed.
            assert_eq!( input.position(), 54 );
        }
    }

    #[test]
    fn rejects_unknown_header_sizes() {
        let mut input = Cursor::new( header( 12, 1, 24 ) );
        assert!( matches!(
            read_descriptor( &mut input ),
            Err( BmpError::UnknownHeaderSize( 12 ) ) ) );
    }

    #[test]
    fn rejects_bad_magic() {
        let mut data = header( 40, 1, 24 );
        data[1] = b'A';
        assert!( matches!(
            read_descriptor( &mut Cursor::new( data ) ),
            Err( BmpError::InvalidMagicNumber( [b'B', b'A'] ) ) ) );
    }

    #[test]
    fn rejects_multiple_planes() {
        let mut input = Cursor::new( header( 40, 2, 24 ) );
        assert!( matches!(
            read_descriptor( &mut input ),
            Err( BmpError::UnexpectedPlaneCount( 2 ) ) ) );
    }

    #[test]
    fn bit_depth_is_checked_lazily() {
        let mut input = Cursor::new( header( 40, 1, 8 ) );
        let descriptor = read_descriptor( &mut input ).unwrap();

        assert!( matches!(
            descriptor.bit_depth(),
            Err( BmpError::UnsupportedBitDepth( 8 ) ) ) );
    }

    #[test]
    fn truncated_header_is_an_io_error() {
        let mut data = header( 40, 1, 24 );
        data.truncate( 30 );
        assert!( matches!(
            read_descriptor( &mut Cursor::new( data ) ),
            Err( BmpError::Io( _ ) ) ) );
    }

    #[test]
    fn output_bytes_per_pixel() {
        assert_eq!( BitDepth::OneBit.bytes_per_pixel(), 1 );
        assert_eq!( BitDepth::TwentyFourBit.bytes_per_pixel(), 3 );
        assert_eq!( BitDepth::ThirtyTwoBit.bytes_per_pixel(), 3 );
    }
}
