//! Release records and the binary sidecar metadata format (`.rel`) for
//! simplepypi.
//!
//! Every uploaded artifact is accompanied by a sidecar file holding its
//! [`ReleaseRecord`]. The sidecar is a small framed container around a
//! self-describing payload, so records written by older builds stay readable
//! after fields are added.
//!
//! ## File Layout
//!
//! ```text
//! REL File Layout:
//! ┌──────────────────────────────┐
//! │ Magic: 0x53505200 ("SPR\0") │  4 bytes
//! │ Version: major.minor.patch   │  3 bytes
//! │ Flags                        │  1 byte
//! ├──────────────────────────────┤
//! │ payload_length: u64          │  8 bytes
//! ├──────────────────────────────┤
//! │ JSON payload                 │
//! │   (release record)           │
//! ├──────────────────────────────┤
//! │ Content Hash (SHA-256)       │  32 bytes
//! └──────────────────────────────┘
//! ```

mod format;
mod record;

pub use format::{decode, encode, CodecError, RelFlags, RelVersion};
pub use record::{is_sidecar_for, sidecar_name, ArtifactFormat, ReleaseRecord, METADATA_EXTENSION};
