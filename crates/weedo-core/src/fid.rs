//! # File Identifiers
//!
//! A stored object is addressed by a [`FileId`]: the volume that holds it,
//! a file key unique within that volume, and a cookie that makes ids hard
//! to guess.
//!
//! ## Wire Format
//!
//! ```text
//! {volume-id decimal},{file-key hex}{cookie hex, exactly 8 digits}
//! ```
//!
//! The last 8 hex characters of the segment after the comma are always the
//! cookie and everything before them is the key, however long the segment
//! is. Storage nodes split ids the same way, so this rule is part of the
//! wire contract and must not be replaced by digit-count heuristics.
//!
//! Encoding pads the key to at least 8 hex digits, which keeps the key
//! segment strictly longer than the cookie for every key including `0`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Number of hex characters that make up the cookie at the end of an id.
pub const COOKIE_HEX_LEN: usize = 8;

/// Minimum number of hex digits used when encoding the file key.
const KEY_HEX_MIN_LEN: usize = 8;

// ---------------------------------------------------------------------------
// VolumeId
// ---------------------------------------------------------------------------

/// Identifier of a volume (a replicated group of storage-node slots).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VolumeId(u32);

impl VolumeId {
    /// Wrap a raw volume number.
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// The raw volume number.
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl From<u32> for VolumeId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for VolumeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for VolumeId {
    type Err = ValidationError;

    /// Parse an unsigned decimal volume id.
    ///
    /// Only ASCII digits are accepted: no sign, no whitespace, no empty string.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ValidationError::InvalidVolumeId(s.to_string()));
        }
        s.parse::<u32>()
            .map(Self)
            .map_err(|_| ValidationError::InvalidVolumeId(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// FileId
// ---------------------------------------------------------------------------

/// Address of one stored object.
///
/// Created by the directory service on assignment and immutable afterwards.
/// The only ways to obtain one are parsing its text form or receiving it in
/// an assignment/submit response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FileId {
    volume_id: VolumeId,
    key: u64,
    cookie: u32,
}

impl FileId {
    /// Assemble an identifier from its parts.
    pub const fn new(volume_id: VolumeId, key: u64, cookie: u32) -> Self {
        Self {
            volume_id,
            key,
            cookie,
        }
    }

    /// The volume holding this object.
    pub const fn volume_id(&self) -> VolumeId {
        self.volume_id
    }

    /// The file key, unique within the volume.
    pub const fn key(&self) -> u64 {
        self.key
    }

    /// The anti-guessing cookie.
    pub const fn cookie(&self) -> u32 {
        self.cookie
    }

    /// Path segment for a replica version of this object.
    ///
    /// Version `0` is the object itself; version `n > 0` is `{fid}_{n}`.
    pub fn versioned(&self, version: u32) -> String {
        if version == 0 {
            self.to_string()
        } else {
            format!("{self}_{version}")
        }
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{:0kw$x}{:0cw$x}",
            self.volume_id,
            self.key,
            self.cookie,
            kw = KEY_HEX_MIN_LEN,
            cw = COOKIE_HEX_LEN
        )
    }
}

impl FromStr for FileId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut segments = s.split(',');
        let (volume, key_cookie) = match (segments.next(), segments.next(), segments.next()) {
            (Some(volume), Some(key_cookie), None) => (volume, key_cookie),
            _ => {
                return Err(ValidationError::malformed(
                    s,
                    "expected exactly two comma-separated segments",
                ))
            }
        };

        if key_cookie.len() <= COOKIE_HEX_LEN {
            return Err(ValidationError::malformed(
                s,
                "key segment must be longer than the 8-digit cookie",
            ));
        }
        // Checked up front so the byte split below lands on a char boundary.
        if !key_cookie.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ValidationError::malformed(s, "key segment is not hexadecimal"));
        }

        let volume_id = volume.parse::<VolumeId>().map_err(|_| {
            ValidationError::malformed(s, "volume id is not an unsigned 32-bit decimal")
        })?;

        let split = key_cookie.len() - COOKIE_HEX_LEN;
        let key = u64::from_str_radix(&key_cookie[..split], 16)
            .map_err(|_| ValidationError::malformed(s, "file key does not fit in 64 bits"))?;
        let cookie = u32::from_str_radix(&key_cookie[split..], 16)
            .map_err(|_| ValidationError::malformed(s, "cookie is not 8 hex digits"))?;

        Ok(Self::new(volume_id, key, cookie))
    }
}

impl TryFrom<String> for FileId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FileId> for String {
    fn from(fid: FileId) -> Self {
        fid.to_string()
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Decoding an encoded identifier yields the same identifier.
        #[test]
        fn encode_decode_round_trip(volume in any::<u32>(), key in any::<u64>(), cookie in any::<u32>()) {
            let fid = FileId::new(VolumeId::new(volume), key, cookie);
            let decoded: FileId = fid.to_string().parse().unwrap();
            prop_assert_eq!(decoded, fid);
        }

        /// The last 8 characters of an encoded id are always the cookie.
        #[test]
        fn encoded_suffix_is_cookie(volume in any::<u32>(), key in any::<u64>(), cookie in any::<u32>()) {
            let encoded = FileId::new(VolumeId::new(volume), key, cookie).to_string();
            let suffix = &encoded[encoded.len() - COOKIE_HEX_LEN..];
            prop_assert_eq!(u32::from_str_radix(suffix, 16).unwrap(), cookie);
        }

        /// Arbitrary input never panics the decoder.
        #[test]
        fn decode_never_panics(s in "\\PC{0,40}") {
            let _ = s.parse::<FileId>();
        }
    }
}
