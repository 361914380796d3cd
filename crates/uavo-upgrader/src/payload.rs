//! Upload payload decoding.
//!
//! Settings dumps may arrive zlib-compressed or raw. Decompression is tried
//! first; if the bytes are not a valid zlib stream they are handed to the
//! importer untouched.

use std::io::Read;

use flate2::read::ZlibDecoder;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// A decoded upload payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload<'a> {
    /// The upload was a zlib stream and has been inflated.
    Decompressed(Vec<u8>),
    /// The upload is passed through as received.
    Raw(&'a [u8]),
}

impl Payload<'_> {
    /// The bytes to import.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Decompressed(bytes) => bytes,
            Self::Raw(bytes) => bytes,
        }
    }

    /// Check if the upload was inflated.
    #[must_use]
    pub fn was_decompressed(&self) -> bool {
        matches!(self, Self::Decompressed(_))
    }
}

/// Decode an upload.
///
/// With `decompress` set, tries to inflate `raw` as zlib and falls back to the
/// raw bytes on any decode failure. Neither the upload nor its inflated form
/// may exceed `max_bytes`.
///
/// # Errors
///
/// Returns [`Error::PayloadTooLarge`] if either size limit is exceeded.
pub fn decode_payload(raw: &[u8], decompress: bool, max_bytes: usize) -> Result<Payload<'_>> {
    if raw.len() > max_bytes {
        return Err(Error::PayloadTooLarge {
            size: raw.len(),
            limit: max_bytes,
        });
    }
    if !decompress {
        return Ok(Payload::Raw(raw));
    }

    let limit = u64::try_from(max_bytes).unwrap_or(u64::MAX).saturating_add(1);
    let mut inflated = Vec::new();
    match ZlibDecoder::new(raw).take(limit).read_to_end(&mut inflated) {
        Ok(_) if inflated.len() > max_bytes => Err(Error::PayloadTooLarge {
            size: inflated.len(),
            limit: max_bytes,
        }),
        Ok(_) => {
            debug!(
                compressed = raw.len(),
                inflated = inflated.len(),
                "payload decompressed"
            );
            Ok(Payload::Decompressed(inflated))
        }
        Err(e) => {
            warn!(error = %e, size = raw.len(), "payload is not zlib, using raw bytes");
            Ok(Payload::Raw(raw))
        }
    }
}
