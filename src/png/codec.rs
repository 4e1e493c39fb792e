//! Streaming zlib in both directions, on top of `miniz_oxide`'s stream API.

use super::*;

use miniz_oxide::{
  deflate::{
    core::{create_comp_flags_from_zip_params, CompressorOxide},
    stream::deflate,
  },
  inflate::stream::{inflate, InflateState},
  DataFormat, MZError, MZFlush, MZStatus,
};

const INFLATE_INPUT_LEN: usize = 32 * 1024;
const DEFLATE_OUTPUT_LEN: usize = 32 * 1024;

/// A zlib decoder that pulls its compressed input on demand.
pub struct Inflater {
  state: Box<InflateState>,
  input: Box<[u8]>,
  pos: usize,
  filled: usize,
  source_done: bool,
  finished: bool,
}
impl Inflater {
  pub fn new() -> Self {
    Self {
      state: InflateState::new_boxed(DataFormat::Zlib),
      input: vec![0; INFLATE_INPUT_LEN].into_boxed_slice(),
      pos: 0,
      filled: 0,
      source_done: false,
      finished: false,
    }
  }

  /// `true` once the end of the zlib stream (and its checksum) was decoded.
  #[inline]
  #[must_use]
  pub const fn is_finished(&self) -> bool {
    self.finished
  }

  /// `true` if the compressed input ran out before the end of the stream.
  #[inline]
  #[must_use]
  pub const fn is_starved(&self) -> bool {
    self.source_done && self.pos == self.filled && !self.finished
  }

  /// Decodes some bytes into `out`, giving 0 only at the end of the stream.
  ///
  /// When more compressed input is needed it's requested from `fill`, which
  /// should give 0 once it has nothing left. Running out of input before the
  /// zlib stream ends is `CorruptImageStream`.
  pub fn read<F>(&mut self, out: &mut [u8], mut fill: F) -> PngResult<usize>
  where
    F: FnMut(&mut [u8]) -> PngResult<usize>,
  {
    if out.is_empty() || self.finished {
      return Ok(0);
    }
    loop {
      if self.pos == self.filled && !self.source_done {
        self.filled = fill(&mut self.input[..])?;
        self.pos = 0;
        self.source_done = self.filled == 0;
      }
      let res = inflate(&mut self.state, &self.input[self.pos..self.filled], out, MZFlush::None);
      self.pos += res.bytes_consumed;
      match res.status {
        Ok(MZStatus::StreamEnd) => {
          self.finished = true;
          return Ok(res.bytes_written);
        }
        Ok(MZStatus::Ok) | Err(MZError::Buf) => {
          if res.bytes_written > 0 {
            return Ok(res.bytes_written);
          }
          let input_left = self.pos < self.filled;
          if (self.source_done && !input_left) || (input_left && res.bytes_consumed == 0) {
            return Err(PngLevelError::CorruptImageStream);
          }
        }
        Ok(MZStatus::NeedDict) | Err(_) => return Err(PngLevelError::CorruptImageStream),
      }
    }
  }
}
impl Default for Inflater {
  #[inline]
  fn default() -> Self {
    Self::new()
  }
}

/// A zlib encoder that appends its output to a caller's buffer.
pub struct Deflater {
  compressor: Box<CompressorOxide>,
  scratch: Box<[u8]>,
}
impl Deflater {
  pub fn new(level: CompressionLevel) -> Self {
    // positive window bits selects the zlib wrapper
    let flags = create_comp_flags_from_zip_params(i32::from(level.get()), 15, 0);
    Self {
      compressor: Box::new(CompressorOxide::new(flags)),
      scratch: vec![0; DEFLATE_OUTPUT_LEN].into_boxed_slice(),
    }
  }

  /// Compresses all of `input`, appending the output to `sink`.
  ///
  /// With `MZFlush::Sync` everything passed so far is decodable from the
  /// output once this returns. `MZFlush::Finish` also writes the end of the
  /// stream, after which the encoder accepts nothing more.
  pub fn compress(&mut self, mut input: &[u8], flush: MZFlush, sink: &mut Vec<u8>) -> PngResult<()> {
    loop {
      let res = deflate(&mut self.compressor, input, &mut self.scratch[..], flush);
      input = &input[res.bytes_consumed..];
      sink.extend_from_slice(&self.scratch[..res.bytes_written]);
      let out_full = res.bytes_written == self.scratch.len();
      match res.status {
        Ok(MZStatus::StreamEnd) => return Ok(()),
        Ok(_) if flush != MZFlush::Finish && input.is_empty() && !out_full => return Ok(()),
        Ok(_) => (),
        Err(MZError::Buf) if flush == MZFlush::None && input.is_empty() => return Ok(()),
        Err(_) => return Err(PngLevelError::Encoder),
      }
    }
  }
}
