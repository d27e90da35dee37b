//! Transparent decompression of input files.
//!
//! Input files may arrive compressed. [`auto_detect_reader`] picks a codec by
//! file extension first and falls back to sniffing magic bytes, so a
//! `people.csv.gz` and a gzip stream saved as `people.csv` both read as plain
//! text. Each codec sits behind its own cargo feature:
//!
//! | Codec | Extensions | Feature |
//! |---|---|---|
//! | gzip | `.gz`, `.gzip` | `compression-gzip` |
//! | zstd | `.zst`, `.zstd` | `compression-zstd` |
//! | bzip2 | `.bz2`, `.bzip2` | `compression-bzip2` |
//! | xz | `.xz` | `compression-xz` |
//!
//! With every feature disabled the reader is passed through unchanged.

use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// A compression format the line source knows how to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    #[cfg(feature = "compression-gzip")]
    Gzip,
    #[cfg(feature = "compression-zstd")]
    Zstd,
    #[cfg(feature = "compression-bzip2")]
    Bzip2,
    #[cfg(feature = "compression-xz")]
    Xz,
}

impl Codec {
    /// Every codec compiled into this build.
    pub const ENABLED: &'static [Codec] = &[
        #[cfg(feature = "compression-gzip")]
        Codec::Gzip,
        #[cfg(feature = "compression-zstd")]
        Codec::Zstd,
        #[cfg(feature = "compression-bzip2")]
        Codec::Bzip2,
        #[cfg(feature = "compression-xz")]
        Codec::Xz,
    ];

    /// Human-readable codec name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            #[cfg(feature = "compression-gzip")]
            Codec::Gzip => "gzip",
            #[cfg(feature = "compression-zstd")]
            Codec::Zstd => "zstd",
            #[cfg(feature = "compression-bzip2")]
            Codec::Bzip2 => "bzip2",
            #[cfg(feature = "compression-xz")]
            Codec::Xz => "xz",
        }
    }

    fn extensions(self) -> &'static [&'static str] {
        match self {
            #[cfg(feature = "compression-gzip")]
            Codec::Gzip => &[".gz", ".gzip"],
            #[cfg(feature = "compression-zstd")]
            Codec::Zstd => &[".zst", ".zstd"],
            #[cfg(feature = "compression-bzip2")]
            Codec::Bzip2 => &[".bz2", ".bzip2"],
            #[cfg(feature = "compression-xz")]
            Codec::Xz => &[".xz"],
        }
    }

    fn magic(self) -> &'static [u8] {
        match self {
            #[cfg(feature = "compression-gzip")]
            Codec::Gzip => &[0x1f, 0x8b],
            #[cfg(feature = "compression-zstd")]
            Codec::Zstd => &[0x28, 0xb5, 0x2f, 0xfd],
            #[cfg(feature = "compression-bzip2")]
            Codec::Bzip2 => b"BZh",
            #[cfg(feature = "compression-xz")]
            Codec::Xz => &[0xfd, 0x37, 0x7a, 0x58, 0x5a, 0x00],
        }
    }

    /// Match a path against the known extensions, case-insensitively.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Codec> {
        let name = path.to_string_lossy().to_lowercase();
        Self::ENABLED
            .iter()
            .copied()
            .find(|codec| codec.extensions().iter().any(|ext| name.ends_with(ext)))
    }

    /// Match the first bytes of a stream against the known signatures.
    #[must_use]
    pub fn from_magic(head: &[u8]) -> Option<Codec> {
        Self::ENABLED
            .iter()
            .copied()
            .find(|codec| head.starts_with(codec.magic()))
    }

    #[allow(unused_variables, unreachable_code)]
    fn wrap<'a>(self, reader: Box<dyn Read + 'a>) -> std::io::Result<Box<dyn Read + 'a>> {
        Ok(match self {
            #[cfg(feature = "compression-gzip")]
            Codec::Gzip => Box::new(flate2::read::MultiGzDecoder::new(reader)),
            #[cfg(feature = "compression-zstd")]
            Codec::Zstd => Box::new(zstd::stream::read::Decoder::new(reader)?),
            #[cfg(feature = "compression-bzip2")]
            Codec::Bzip2 => Box::new(bzip2::read::MultiBzDecoder::new(reader)),
            #[cfg(feature = "compression-xz")]
            Codec::Xz => Box::new(xz2::read::XzDecoder::new_multi_decoder(reader)),
        })
    }
}

/// Wrap `reader` with a decompressor when the path or content says it is compressed.
///
/// The result is always buffered.
///
/// # Errors
/// Returns an error if the leading bytes cannot be read or the decoder fails
/// to initialize.
pub fn auto_detect_reader<'a, R: Read + 'a>(
    reader: R,
    path_hint: &Path,
) -> std::io::Result<Box<dyn BufRead + 'a>> {
    if let Some(codec) = Codec::from_path(path_hint) {
        return Ok(Box::new(BufReader::new(codec.wrap(Box::new(reader))?)));
    }

    let mut buffered = BufReader::new(reader);
    let sniffed = Codec::from_magic(buffered.fill_buf()?);
    match sniffed {
        Some(codec) => Ok(Box::new(BufReader::new(codec.wrap(Box::new(buffered))?))),
        None => Ok(Box::new(buffered)),
    }
}
