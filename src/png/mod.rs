//! Streaming PNG recompression.
//!
//! * [Portable Network Graphics Specification (Second Edition)][png-spec]
//!
//! [png-spec]: https://www.w3.org/TR/2003/REC-PNG-20031110/
//!
//! A PNG is an 8 byte signature followed by a series of "chunks". Every chunk
//! is a big-endian `u32` length, a 4 byte type, that many bytes of data, and
//! a CRC-32 of the type and data. The first chunk is always the `IHDR`
//! header. The pixels live in one or more `IDAT` chunks, which must all be in
//! a row: together their data forms a single zlib stream, and where one
//! chunk stops and the next starts has no meaning at all.
//!
//! That's what makes recompression possible without touching anything else.
//! The [`Recompressor`] reads the input front to back:
//!
//! * The signature and `IHDR` are checked and copied.
//! * Any other chunk is read into memory, its CRC checked, and then copied.
//! * When the `IDAT` run starts, an [`IdatStream`] presents the run's data as
//!   one byte stream. The [`Inflater`] decodes it while the [`Deflater`]
//!   encodes the result again at the new level, sync flushing after each
//!   window of decoded data. The [`IdatChunker`] cuts the new zlib stream into
//!   fresh `IDAT` chunks.
//! * The header of the chunk that ended the run has already been read by
//!   then, so copying continues from that chunk.
//!
//! Memory use is bounded by the largest non-`IDAT` chunk plus a few fixed
//! buffers, no matter how large the image is.
//!
//! ## Strictness
//!
//! Unlike a viewer, a recompressor can't just skip past bad data, because it
//! would be writing that bad data back out. Every CRC is checked, the `IHDR`
//! must come first with the zlib compression method, and a second `IDAT` run
//! after some other chunk is an error rather than being guessed at.

use core::fmt::Debug;
use std::io::{Read, Write};

use bytemuck::{Pod, Zeroable};
use tracing::{debug, trace};

use crate::{
  int_endian::U32BE,
  parser_helpers::{read_some, read_until_full},
  CompressionLevel, PngLevelError, PngResult, RecompressOptions,
};

/// The first eight bytes of a PNG datastream should match these bytes.
pub const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// The largest data length a chunk may declare, `2^31 - 1`.
pub const MAX_CHUNK_LEN: u32 = i32::MAX as u32;

mod crc32;
pub use crc32::*;

mod chunk_ty;
pub use chunk_ty::*;

mod chunk_header;
pub use chunk_header::*;

mod ihdr;
pub use ihdr::*;

mod raw_chunk;
pub use raw_chunk::*;

mod cursor;
pub use cursor::*;

mod idat_stream;
pub use idat_stream::*;

mod codec;
pub use codec::*;

mod rechunk;
pub use rechunk::*;

mod recompress;
pub use recompress::*;
