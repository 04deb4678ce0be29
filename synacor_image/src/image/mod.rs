mod error;

pub use error::Error;

use std::path::{Path, PathBuf};

pub type Result<A> = std::result::Result<A, Error>;

/// The maximum number of words `Memory` can address. An `Image` larger than
/// this can never be loaded in full and is rejected rather than truncated.
pub const MAX_WORDS: usize = 32768;

/// `Image` is the decoded contents of a program file: a flat sequence of
/// 16-bit words, little-endian in the underlying byte stream, ready to be
/// copied into `Memory` starting at address 0.
///
/// Decoding an `Image` never touches `Memory`, the stack, or registers — it
/// is a pure transformation from bytes to words so it can be exercised
/// against an in-memory byte slice without a filesystem.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Image {
    pub words: Vec<u16>,
}

impl Image {
    /// Read a program image from `path` on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Image> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| classify_io_error(path, source))?;

        log::debug!("loaded {} bytes from {:?}", bytes.len(), path);

        Image::from_bytes(&bytes)
    }

    /// Decode a program image from a raw byte stream.
    ///
    /// Each pair of consecutive bytes `(b0, b1)` becomes the word
    /// `b0 | (b1 << 8)` (little-endian). A trailing odd byte is rejected
    /// rather than silently dropped.
    pub fn from_bytes(bytes: &[u8]) -> Result<Image> {
        if bytes.len() % 2 != 0 {
            return Err(Error::TrailingByte);
        }

        let words: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();

        if words.len() > MAX_WORDS {
            return Err(Error::TooLarge {
                word_count: words.len(),
            });
        }

        Ok(Image { words })
    }
}

/// `fs::read` doesn't distinguish "couldn't open" from "couldn't read", but we
/// keep the distinction in our own error type since it's useful for diagnosing
/// permission errors vs. truncated-read errors at the call site.
fn classify_io_error(path: &Path, source: std::io::Error) -> Error {
    let path = PathBuf::from(path);

    match source.kind() {
        std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => {
            Error::Open { path, source }
        }
        _ => Error::Read { path, source },
    }
}
