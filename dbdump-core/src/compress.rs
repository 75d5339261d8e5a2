//! Compression strategies keyed by file extension.
//!
//! The registry is exact-match on the final path extension; an unknown
//! extension means the dump is written uncompressed.

use std::fs::File;
use std::io::{self, BufWriter, Write};

use bzip2::write::BzEncoder;
use flate2::write::GzEncoder;

/// Supported compression strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    /// gzip (`.gz`)
    Gzip,
    /// bzip2 (`.bz2`)
    Bzip2,
}

impl Compression {
    /// The file extension this strategy is registered under.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Gzip => "gz",
            Self::Bzip2 => "bz2",
        }
    }

    /// Looks up a strategy by file extension. `None` means uncompressed.
    #[must_use]
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            "gz" => Some(Self::Gzip),
            "bz2" => Some(Self::Bzip2),
            _ => None,
        }
    }
}

impl std::fmt::Display for Compression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Output writer for a dump file, optionally wrapping a compressor.
///
/// Dropping an encoder mid-stream would swallow finalization errors, so the
/// writer is consumed through [`DumpWriter::finish`] once the dump stream
/// is fully copied.
pub enum DumpWriter {
    /// Plain buffered file output
    Plain(BufWriter<File>),
    /// gzip-compressed output
    Gzip(GzEncoder<File>),
    /// bzip2-compressed output
    Bzip2(BzEncoder<File>),
}

impl DumpWriter {
    /// Creates a writer for `file` using the selected compression, if any.
    #[must_use]
    pub fn new(file: File, compression: Option<Compression>) -> Self {
        match compression {
            None => Self::Plain(BufWriter::new(file)),
            Some(Compression::Gzip) => {
                Self::Gzip(GzEncoder::new(file, flate2::Compression::default()))
            }
            Some(Compression::Bzip2) => {
                Self::Bzip2(BzEncoder::new(file, bzip2::Compression::default()))
            }
        }
    }

    /// Flushes buffered data and finalizes the compression stream.
    ///
    /// # Errors
    /// Returns the underlying I/O error if flushing or finalization fails.
    pub fn finish(self) -> io::Result<()> {
        match self {
            Self::Plain(mut writer) => writer.flush(),
            Self::Gzip(encoder) => encoder.finish().map(drop),
            Self::Bzip2(encoder) => encoder.finish().map(drop),
        }
    }
}

impl Write for DumpWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Plain(writer) => writer.write(buf),
            Self::Gzip(encoder) => encoder.write(buf),
            Self::Bzip2(encoder) => encoder.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Plain(writer) => writer.flush(),
            Self::Gzip(encoder) => encoder.flush(),
            Self::Bzip2(encoder) => encoder.flush(),
        }
    }
}
