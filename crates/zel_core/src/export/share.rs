//! Compressed share links.
//!
//! # Responsibility
//! - Encode document text into a URL fragment (`#view=<payload>`).
//! - Decode a payload back to the exact original text.
//!
//! # Invariants
//! - Encoding is deterministic: the same text always yields the same link.
//! - `decode_share_payload(encode_share_payload(t)) == t` for every `t`.
//!
//! Payload format: raw DEFLATE at a fixed level, URL-safe base64 without
//! padding.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::{Read, Write};

/// Fragment marker preceding the payload.
pub const SHARE_FRAGMENT_PREFIX: &str = "#view=";

/// Longest link that still renders as a low-correction QR code.
pub const SHARE_LINK_QR_LIMIT: usize = 2800;

const COMPRESSION_LEVEL: u32 = 9;

#[derive(Debug)]
pub enum ShareError {
    Compress(std::io::Error),
    InvalidEncoding(base64::DecodeError),
    Decompress(std::io::Error),
}

impl Display for ShareError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Compress(err) => write!(f, "failed to compress share text: {err}"),
            Self::InvalidEncoding(err) => write!(f, "share payload is not valid base64: {err}"),
            Self::Decompress(err) => write!(f, "share payload is not valid deflate text: {err}"),
        }
    }
}

impl Error for ShareError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Compress(err) | Self::Decompress(err) => Some(err),
            Self::InvalidEncoding(err) => Some(err),
        }
    }
}

/// Compresses `text` into a URL-safe payload.
pub fn encode_share_payload(text: &str) -> Result<String, ShareError> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::new(COMPRESSION_LEVEL));
    encoder
        .write_all(text.as_bytes())
        .map_err(ShareError::Compress)?;
    let compressed = encoder.finish().map_err(ShareError::Compress)?;
    Ok(URL_SAFE_NO_PAD.encode(compressed))
}

/// Restores the text carried by a payload.
pub fn decode_share_payload(payload: &str) -> Result<String, ShareError> {
    let compressed = URL_SAFE_NO_PAD
        .decode(payload.trim())
        .map_err(ShareError::InvalidEncoding)?;
    let mut text = String::new();
    DeflateDecoder::new(compressed.as_slice())
        .read_to_string(&mut text)
        .map_err(ShareError::Decompress)?;
    Ok(text)
}

/// Builds `<base_url without fragment>#view=<payload>`.
pub fn generate_share_link(base_url: &str, text: &str) -> Result<String, ShareError> {
    let base = base_url.split('#').next().unwrap_or_default();
    let payload = encode_share_payload(text)?;
    Ok(format!("{base}{SHARE_FRAGMENT_PREFIX}{payload}"))
}

/// Extracts the payload of a share link, if the link carries one.
pub fn share_payload_from_link(link: &str) -> Option<&str> {
    link.split_once(SHARE_FRAGMENT_PREFIX)
        .map(|(_, payload)| payload)
}

/// Whether a link is short enough to be offered as a QR code.
pub fn fits_qr_code(link: &str) -> bool {
    link.chars().count() <= SHARE_LINK_QR_LIMIT
}
