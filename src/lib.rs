#![cfg_attr(docs_rs, feature(doc_cfg))]

//! A crate for recompressing PNG files.
//!
//! The image data of a PNG is a zlib stream, and the encoder that wrote it
//! picked some compression level. This crate reads a PNG as a stream and
//! writes it back out with that zlib stream re-encoded at a level of your
//! choosing. Everything else (the header, palette, text, color profile, and
//! any other chunks) comes through unchanged and in the same order, and the
//! decoded pixel data is identical.
//!
//! ```no_run
//! use png_relevel::{CompressionLevel, RecompressOptions, png::Recompressor};
//! # fn main() -> Result<(), png_relevel::PngLevelError> {
//! let png: Vec<u8> = std::fs::read("image.png")?;
//! let mut smaller = Vec::new();
//! let options = RecompressOptions::default().with_level(CompressionLevel::BEST);
//! Recompressor::new(options).recompress(png.as_slice(), &mut smaller)?;
//! # Ok(())
//! # }
//! ```

#[cfg(target_pointer_width = "16")]
compile_error!("this crate assumes 32-bit or bigger pointers!");

mod error;
pub use error::*;

mod options;
pub use options::*;

pub mod int_endian;

mod parser_helpers;

pub mod png;
