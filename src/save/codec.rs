//! Save container encoding
//!
//! The editor stores its local levels either as a plain XML document or
//! wrapped as `xor(base64(gzip(xml)))`. Decoding undoes the layers in reverse;
//! plaintext input passes through untouched.

use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;
use flate2::read::{GzDecoder, ZlibDecoder};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::{Read, Write};
use thiserror::Error;

/// Every decoded save starts with this.
pub const PLAINTEXT_HEADER: &str = "<?xml version=\"1.0\"?>";

/// Single-byte key the container is XORed with.
pub const DEFAULT_XOR_KEY: u8 = 11;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Error type for save container decoding and encoding
#[derive(Debug, Error)]
pub enum CodecError {
    /// The XORed payload is not base64
    #[error("save data is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    /// Decompression failed, usually a truncated or corrupt save
    #[error(
        "save file seems to be corrupt ({0})\nMaybe try saving a level in-game to refresh it?"
    )]
    Corrupt(std::io::Error),
    /// The decompressed document is not UTF-8 text
    #[error("decoded save data is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    /// Compressing the document for write-back failed
    #[error("failed to compress save data: {0}")]
    Compress(std::io::Error),
}

/// Encoder/decoder for the save container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveCodec {
    xor_key: u8,
}

impl Default for SaveCodec {
    fn default() -> Self {
        Self::new(DEFAULT_XOR_KEY)
    }
}

impl SaveCodec {
    pub fn new(xor_key: u8) -> Self {
        Self { xor_key }
    }

    /// Whether `raw` is already a decoded document.
    pub fn is_plaintext(raw: &[u8]) -> bool {
        raw.starts_with(PLAINTEXT_HEADER.as_bytes())
    }

    /// Decode raw container bytes into the XML document.
    ///
    /// Already-decoded input is returned unchanged.
    pub fn decode(&self, raw: &[u8]) -> Result<String, CodecError> {
        if Self::is_plaintext(raw) {
            tracing::debug!("save data is already plaintext");
            return Ok(String::from_utf8(raw.to_vec())?);
        }

        let unmasked = xor(raw, self.xor_key);
        let compressed = decode_base64(&unmasked)?;
        tracing::debug!(bytes = compressed.len(), "base64 layer decoded");

        let inflated = inflate(&compressed).map_err(CodecError::Corrupt)?;
        tracing::debug!(bytes = inflated.len(), "save data decompressed");

        Ok(String::from_utf8(inflated)?)
    }

    /// Wrap a document the way the editor stores it.
    pub fn encode(&self, document: &str) -> Result<Vec<u8>, CodecError> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(document.as_bytes()).map_err(CodecError::Compress)?;
        let compressed = encoder.finish().map_err(CodecError::Compress)?;

        let text = URL_SAFE.encode(compressed);
        Ok(xor(text.as_bytes(), self.xor_key))
    }
}

fn xor(data: &[u8], key: u8) -> Vec<u8> {
    data.iter().map(|b| b ^ key).collect()
}

/// Lenient base64: accepts both alphabets, optional padding and stray
/// whitespace or NUL bytes the editor sometimes leaves at the end.
fn decode_base64(data: &[u8]) -> Result<Vec<u8>, base64::DecodeError> {
    let cleaned: Vec<u8> = data
        .iter()
        .filter(|b| !b.is_ascii_whitespace() && **b != 0)
        .map(|&b| match b {
            b'+' => b'-',
            b'/' => b'_',
            other => other,
        })
        .collect();

    let end = cleaned.iter().rposition(|&b| b != b'=').map_or(0, |i| i + 1);
    URL_SAFE_NO_PAD.decode(&cleaned[..end])
}

fn inflate(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut out = Vec::new();
    if data.starts_with(&GZIP_MAGIC) {
        GzDecoder::new(data).read_to_end(&mut out)?;
    } else {
        ZlibDecoder::new(data).read_to_end(&mut out)?;
    }
    Ok(out)
}
