//! # weedo-core -- Foundational Types for the weedo Client
//!
//! Leaf crate of the workspace. It defines the addressing primitives every
//! other crate builds on, with no network or runtime dependencies.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for identifiers.** `VolumeId` and `FileId` are
//!    distinct types with validated parsers. No bare strings or integers
//!    travel between the resolver, the coordinator, and the transport.
//!
//! 2. **One wire codec.** `FileId` has exactly one text encoding
//!    (`Display`) and one decoder (`FromStr`). The cookie is always the
//!    trailing 8 hex characters of the key segment.
//!
//! 3. **Normalized locations.** A `Location` always carries an explicit
//!    scheme, whatever shape the directory service reported it in.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `weedo-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod fid;
pub mod location;

pub use error::ValidationError;
pub use fid::{FileId, VolumeId, COOKIE_HEX_LEN};
pub use location::{normalize_address, Location};
