use std::io::Read;

use miniz_oxide::{deflate::compress_to_vec_zlib, inflate::decompress_to_vec_zlib};
use png_relevel::{
  png::{recompress, ChunkTy, RawPngChunkIter, Recompressor, PNG_SIGNATURE},
  CompressionLevel, PngLevelError, RecompressOptions,
};

fn chunk(ty: &[u8; 4], data: &[u8]) -> Vec<u8> {
  let mut hasher = crc32fast::Hasher::new();
  hasher.update(ty);
  hasher.update(data);
  let mut out = (data.len() as u32).to_be_bytes().to_vec();
  out.extend_from_slice(ty);
  out.extend_from_slice(data);
  out.extend_from_slice(&hasher.finalize().to_be_bytes());
  out
}

/// 16x16 RGB8, compression method as given.
fn ihdr(compression_method: u8) -> Vec<u8> {
  chunk(b"IHDR", &[0, 0, 0, 16, 0, 0, 0, 16, 8, 2, compression_method, 0, 0])
}

fn png(chunks: &[Vec<u8>]) -> Vec<u8> {
  let mut out = PNG_SIGNATURE.to_vec();
  for c in chunks {
    out.extend_from_slice(c);
  }
  out
}

/// Filtered scanline data for a 16x16 RGB8 image: 16 lines of a filter byte
/// then 48 bytes.
fn scanlines() -> Vec<u8> {
  let mut out = Vec::new();
  for y in 0..16_u32 {
    out.push(0);
    for x in 0..48_u32 {
      out.push((x * 5 + y * 11) as u8);
    }
  }
  out
}

/// Data that doesn't compress much, to get many output chunks.
fn noisy(len: usize) -> Vec<u8> {
  let mut state = 0x2545_F491_u32;
  (0..len)
    .map(|_| {
      state ^= state << 13;
      state ^= state >> 17;
      state ^= state << 5;
      state as u8
    })
    .collect()
}

fn simple_png(raw: &[u8]) -> Vec<u8> {
  png(&[ihdr(0), chunk(b"IDAT", &compress_to_vec_zlib(raw, 6)), chunk(b"IEND", b"")])
}

fn run(input: &[u8], options: RecompressOptions) -> (Result<(), PngLevelError>, Vec<u8>) {
  let mut out = Vec::new();
  let res = Recompressor::new(options).recompress(input, &mut out).map(|_| ());
  (res, out)
}

fn at_level(level: u8) -> RecompressOptions {
  RecompressOptions::default().with_level(CompressionLevel::new(level).unwrap())
}

/// Checks every CRC against an independent implementation and gives back
/// the decoded IDAT stream.
fn validate_and_decode(png: &[u8]) -> Vec<u8> {
  assert_eq!(&png[..8], &PNG_SIGNATURE);
  let mut idat = Vec::new();
  let mut consumed = 8;
  for c in RawPngChunkIter::new(png) {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&c.ty().0);
    hasher.update(c.data());
    assert_eq!(hasher.finalize(), c.declared_crc(), "bad CRC on {:?}", c.ty());
    if c.ty() == ChunkTy::IDAT {
      idat.extend_from_slice(c.data());
    }
    consumed += 12 + c.data().len();
  }
  assert_eq!(consumed, png.len(), "trailing bytes after the last chunk");
  decompress_to_vec_zlib(&idat).unwrap()
}

fn chunk_types(png: &[u8]) -> Vec<ChunkTy> {
  RawPngChunkIter::new(png).map(|c| c.ty()).collect()
}

/// Hands out one byte per read call.
struct OneByteReader<'a>(&'a [u8]);
impl Read for OneByteReader<'_> {
  fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
    match (self.0.split_first(), buf.first_mut()) {
      (Some((b, rest)), Some(dst)) => {
        *dst = *b;
        self.0 = rest;
        Ok(1)
      }
      _ => Ok(0),
    }
  }
}

#[test]
fn test_end_to_end_level_9_and_level_0() {
  let raw = scanlines();
  let input = simple_png(&raw);

  let (res, out9) = run(&input, at_level(9));
  res.unwrap();
  let (res, out0) = run(&input, at_level(0));
  res.unwrap();

  for out in [&out9, &out0] {
    // signature and the whole IHDR chunk come through untouched
    assert_eq!(&out[..33], &input[..33]);
    assert_eq!(validate_and_decode(out), raw);
    assert_eq!(chunk_types(out).last(), Some(&ChunkTy::IEND));
  }
  assert!(out0.len() > out9.len());
}

#[test]
fn test_all_levels_decode_the_same() {
  let raw = noisy(20_000);
  let input = simple_png(&raw);
  for level in 0..=10 {
    let (res, out) = run(&input, at_level(level));
    res.unwrap();
    assert_eq!(validate_and_decode(&out), raw, "level {level}");
  }
}

#[test]
fn test_other_chunks_are_copied_in_order() {
  let raw = scanlines();
  let compressed = compress_to_vec_zlib(&raw, 1);
  let (a, rest) = compressed.split_at(10);
  let (b, c) = rest.split_at(10);
  let gama = chunk(b"gAMA", &45455_u32.to_be_bytes());
  let text = chunk(b"tEXt", b"Comment\0hello there");
  let time = chunk(b"tIME", &[7, 230, 10, 19, 12, 0, 0]);
  let iend = chunk(b"IEND", b"");
  let input = png(&[
    ihdr(0),
    gama.clone(),
    text.clone(),
    chunk(b"IDAT", a),
    chunk(b"IDAT", b),
    chunk(b"IDAT", c),
    time.clone(),
    iend.clone(),
  ]);

  let mut out = Vec::new();
  let report = recompress(input.as_slice(), &mut out, CompressionLevel::BEST).unwrap();
  assert_eq!(validate_and_decode(&out), raw);

  let types = chunk_types(&out);
  let idat_count = types.iter().filter(|&&t| t == ChunkTy::IDAT).count();
  assert_eq!(types[..3], [ChunkTy::IHDR, ChunkTy(*b"gAMA"), ChunkTy(*b"tEXt")]);
  assert!(types[3..3 + idat_count].iter().all(|&t| t == ChunkTy::IDAT));
  assert_eq!(types[3 + idat_count..], [ChunkTy(*b"tIME"), ChunkTy::IEND]);

  // non-image chunks are byte for byte what went in
  let mut expected_tail = time;
  expected_tail.extend_from_slice(&iend);
  assert!(out.ends_with(&expected_tail));
  assert!(out.starts_with(&png(&[ihdr(0), gama, text])));

  assert_eq!(report.copied_chunks, 5);
  assert_eq!(report.idat_chunks_in, 3);
  assert_eq!(report.idat_chunks_out as usize, idat_count);
  assert_eq!(report.compressed_in, compressed.len() as u64);
  assert_eq!(report.decoded, raw.len() as u64);
}

#[test]
fn test_output_chunks_respect_target_len() {
  let raw = noisy(300_000);
  let input = simple_png(&raw);

  // default target
  let (res, out) = run(&input, at_level(0));
  res.unwrap();
  let lens: Vec<usize> = RawPngChunkIter::new(&out)
    .filter(|c| c.ty() == ChunkTy::IDAT)
    .map(|c| c.data().len())
    .collect();
  assert!(lens.len() >= 4);
  assert!(lens.iter().all(|&l| l <= 1 << 16));
  assert!(lens[..lens.len() - 1].iter().all(|&l| l == 1 << 16));
  assert_eq!(validate_and_decode(&out), raw);

  // tiny target
  let (res, out) = run(&input, at_level(6).with_idat_target_len(1000));
  res.unwrap();
  let lens: Vec<usize> = RawPngChunkIter::new(&out)
    .filter(|c| c.ty() == ChunkTy::IDAT)
    .map(|c| c.data().len())
    .collect();
  assert!(lens.len() > 100);
  assert!(lens[..lens.len() - 1].iter().all(|&l| l == 1000));
  assert!(*lens.last().unwrap() <= 1000);
  assert_eq!(validate_and_decode(&out), raw);
}

#[test]
fn test_one_byte_chunks_and_one_byte_reads() {
  let raw = scanlines();
  let compressed = compress_to_vec_zlib(&raw, 9);
  let mut chunks = vec![ihdr(0)];
  chunks.extend(compressed.iter().map(|b| chunk(b"IDAT", &[*b])));
  chunks.push(chunk(b"IEND", b""));
  let input = png(&chunks);

  let mut out = Vec::new();
  let report = Recompressor::new(at_level(9).with_idat_target_len(64))
    .recompress(OneByteReader(&input), &mut out)
    .unwrap();
  assert_eq!(report.idat_chunks_in as usize, compressed.len());
  assert_eq!(validate_and_decode(&out), raw);
  assert!(RawPngChunkIter::new(&out).all(|c| c.data().len() <= 64));
}

#[test]
fn test_recompressing_twice_is_stable() {
  let raw = noisy(100_000);
  let input = simple_png(&raw);
  let (res, once) = run(&input, at_level(9));
  res.unwrap();
  let (res, twice) = run(&once, at_level(9));
  res.unwrap();
  assert_eq!(once, twice);
}

#[test]
fn test_source_may_end_after_idat() {
  let raw = scanlines();
  let input = png(&[ihdr(0), chunk(b"IDAT", &compress_to_vec_zlib(&raw, 6))]);
  let (res, out) = run(&input, at_level(3));
  res.unwrap();
  assert_eq!(chunk_types(&out).last(), Some(&ChunkTy::IDAT));
  assert_eq!(validate_and_decode(&out), raw);
}

#[test]
fn test_bytes_after_zlib_end_are_ignored() {
  let raw = scanlines();
  let mut data = compress_to_vec_zlib(&raw, 6);
  data.extend_from_slice(b"junk");
  let input = png(&[ihdr(0), chunk(b"IDAT", &data), chunk(b"IEND", b"")]);
  let (res, out) = run(&input, at_level(9));
  res.unwrap();
  assert_eq!(validate_and_decode(&out), raw);
}

#[test]
fn test_corrupt_ancillary_chunk_aborts_before_writing_it() {
  let raw = scanlines();
  let mut text = chunk(b"tEXt", b"Comment\0hello there");
  text[12] ^= 0x20;
  let input = png(&[
    ihdr(0),
    chunk(b"IDAT", &compress_to_vec_zlib(&raw, 6)),
    text,
    chunk(b"IEND", b""),
  ]);
  let (res, out) = run(&input, at_level(9));
  match res {
    Err(PngLevelError::ContainerCrcMismatch { ty, declared, computed }) => {
      assert_eq!(ty, ChunkTy(*b"tEXt"));
      assert_ne!(declared, computed);
    }
    other => panic!("unexpected result: {other:?}"),
  }
  // nothing from the bad chunk onward was written
  assert_eq!(chunk_types(&out).last(), Some(&ChunkTy::IDAT));
}

#[test]
fn test_corrupt_header_crc() {
  let mut header = ihdr(0);
  header[20] ^= 1;
  let input = png(&[header, chunk(b"IEND", b"")]);
  let (res, out) = run(&input, at_level(9));
  assert!(matches!(res, Err(PngLevelError::ContainerCrcMismatch { ty: ChunkTy::IHDR, .. })));
  assert_eq!(out, PNG_SIGNATURE);
}

#[test]
fn test_corrupt_idat_payload() {
  let raw = scanlines();
  // stored blocks, so a flipped byte is still well formed deflate data
  let compressed = compress_to_vec_zlib(&raw, 0);
  let (a, b) = compressed.split_at(40);
  let mut first = chunk(b"IDAT", a);
  first[8 + 17] ^= 0xFF;
  let input = png(&[ihdr(0), first, chunk(b"IDAT", b), chunk(b"IEND", b"")]);
  let (res, _) = run(&input, at_level(9));
  assert!(matches!(res, Err(PngLevelError::ImageDataCrcMismatch { .. })), "{res:?}");
}

#[test]
fn test_corrupt_compressed_idat_byte_writes_no_image_data() {
  let raw = noisy(200_000);
  let compressed = compress_to_vec_zlib(&raw, 6);
  for offset in [5, 100, 1000, 50_000, 150_000] {
    let mut idat = chunk(b"IDAT", &compressed);
    idat[8 + offset] ^= 0x55;
    let input = png(&[ihdr(0), idat, chunk(b"IEND", b"")]);
    let (res, out) = run(&input, at_level(6).with_idat_target_len(1000));
    assert!(
      matches!(res, Err(PngLevelError::ImageDataCrcMismatch { .. })),
      "offset {offset}: {res:?}"
    );
    assert_eq!(chunk_types(&out), [ChunkTy::IHDR], "offset {offset}");
  }
}

#[test]
fn test_corrupt_idat_crc_field() {
  let raw = scanlines();
  let mut idat = chunk(b"IDAT", &compress_to_vec_zlib(&raw, 6));
  let last = idat.len() - 1;
  idat[last] ^= 0x01;
  let input = png(&[ihdr(0), idat, chunk(b"IEND", b"")]);
  let (res, _) = run(&input, at_level(9));
  assert!(matches!(res, Err(PngLevelError::ImageDataCrcMismatch { .. })), "{res:?}");
}

#[test]
fn test_second_idat_run_is_an_error() {
  let raw = scanlines();
  let input = png(&[
    ihdr(0),
    chunk(b"IDAT", &compress_to_vec_zlib(&raw, 6)),
    chunk(b"tEXt", b"Comment\0in the way"),
    chunk(b"IDAT", &compress_to_vec_zlib(&raw, 6)),
    chunk(b"IEND", b""),
  ]);
  let (res, _) = run(&input, at_level(9));
  assert!(matches!(res, Err(PngLevelError::WrongImageDataOrder)), "{res:?}");
}

#[test]
fn test_image_data_split_around_another_chunk() {
  let raw = scanlines();
  let compressed = compress_to_vec_zlib(&raw, 6);
  let (a, b) = compressed.split_at(compressed.len() / 2);
  let input = png(&[
    ihdr(0),
    chunk(b"IDAT", a),
    chunk(b"tEXt", b"Comment\0in the way"),
    chunk(b"IDAT", b),
    chunk(b"IEND", b""),
  ]);
  let (res, _) = run(&input, at_level(9));
  assert!(matches!(res, Err(PngLevelError::WrongImageDataOrder)), "{res:?}");

  // without the rest of the stream anywhere later, it's just cut short
  let input =
    png(&[ihdr(0), chunk(b"IDAT", a), chunk(b"tEXt", b"Comment\0in the way"), chunk(b"IEND", b"")]);
  let (res, _) = run(&input, at_level(9));
  assert!(matches!(res, Err(PngLevelError::CorruptImageStream)), "{res:?}");
}

#[test]
fn test_unsupported_compression_method_fails_first() {
  // the IDAT isn't even zlib, it must never be looked at
  let input = png(&[ihdr(1), chunk(b"IDAT", b"not zlib at all"), chunk(b"IEND", b"")]);
  let (res, out) = run(&input, at_level(9));
  assert!(matches!(res, Err(PngLevelError::UnsupportedCompressionMethod(1))), "{res:?}");
  assert_eq!(out, PNG_SIGNATURE);
}

#[test]
fn test_bad_signature() {
  let mut input = simple_png(&scanlines());
  input[1] = b'Q';
  let (res, out) = run(&input, at_level(9));
  assert!(matches!(res, Err(PngLevelError::NotAPngFile)), "{res:?}");
  assert!(out.is_empty());
}

#[test]
fn test_header_problems() {
  let iend = chunk(b"IEND", b"");

  let input = png(&[chunk(b"gAMA", &[0, 0, 0, 1]), ihdr(0), iend.clone()]);
  assert!(matches!(run(&input, at_level(9)).0, Err(PngLevelError::MissingHeader)));

  let input = png(&[]);
  assert!(matches!(run(&input, at_level(9)).0, Err(PngLevelError::MissingHeader)));

  let input = png(&[chunk(b"IHDR", &[0; 12]), iend]);
  assert!(matches!(run(&input, at_level(9)).0, Err(PngLevelError::BadHeaderLength(12))));
}

#[test]
fn test_truncated_input() {
  let input = simple_png(&scanlines());
  // in the IEND crc, in the IDAT data, in a header, in the signature
  for cut in [input.len() - 2, 60, input.len() - 10, 5] {
    let (res, _) = run(&input[..cut], at_level(9));
    assert!(
      matches!(res, Err(PngLevelError::Truncated) | Err(PngLevelError::CorruptImageStream)),
      "cut at {cut}: {res:?}"
    );
  }
  // cuts outside of the zlib stream are always plain truncation
  for cut in [input.len() - 2, input.len() - 10, 5, 20] {
    let (res, _) = run(&input[..cut], at_level(9));
    assert!(matches!(res, Err(PngLevelError::Truncated)), "cut at {cut}: {res:?}");
  }
}

#[test]
fn test_oversized_chunk_length() {
  let mut input = png(&[ihdr(0)]);
  input.extend_from_slice(&0x8000_0000_u32.to_be_bytes());
  input.extend_from_slice(b"tEXt");
  input.extend_from_slice(&[0; 16]);
  let (res, _) = run(&input, at_level(9));
  assert!(matches!(res, Err(PngLevelError::ChunkTooLarge(0x8000_0000))), "{res:?}");
}

#[test]
fn test_corrupt_zlib_data() {
  let input = png(&[ihdr(0), chunk(b"IDAT", &[0x78, 0x9C, 0xFF, 0xFF, 0xFF]), chunk(b"IEND", b"")]);
  let (res, _) = run(&input, at_level(9));
  assert!(matches!(res, Err(PngLevelError::CorruptImageStream)), "{res:?}");

  let input = png(&[ihdr(0), chunk(b"IDAT", b""), chunk(b"IEND", b"")]);
  let (res, _) = run(&input, at_level(9));
  assert!(matches!(res, Err(PngLevelError::CorruptImageStream)), "{res:?}");
}

#[test]
fn test_random_data_never_panics() {
  for _ in 0..10 {
    let v = super::rand_bytes(1024);
    let _ = run(&v, at_level(9));
    let mut with_signature = PNG_SIGNATURE.to_vec();
    with_signature.extend_from_slice(&v);
    let _ = run(&with_signature, at_level(9));
    let mut with_header = png(&[ihdr(0)]);
    with_header.extend_from_slice(&v);
    let _ = run(&with_header, at_level(9));
    for _ in RawPngChunkIter::new(&v) {
      //
    }
  }
}
