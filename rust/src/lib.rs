//! micro-uid: short, human-typeable identifiers with an embedded timestamp.
//!
//! A UID is written in a 32-symbol alphabet without look-alike characters
//! and carries the second it was created, a one-symbol checksum and random
//! padding. It is an obfuscation and typo-detection scheme, not a secure
//! token.
//!
//! # Format
//!
//! ```text
//! RAW ::= PREFIX STAMP SUFFIX CHECK
//! UID ::= RAW grouped into runs of 3 and 4 symbols joined by "-"
//! ```
//!
//! # Example
//!
//! ```
//! use micro_uid::{generate, validate};
//!
//! let uid = generate(10, true).expect("clock within range");
//! println!("{}", uid); // e.g., "k3x-9tqa-7mz"
//! assert!(validate(&uid).is_some());
//! ```

mod alphabet;
mod config;
mod format;
mod uid;

pub use alphabet::{ALPHABET, BASE, is_symbol};
pub use config::{ConfigError, LENGTH_ENV, SEPARATOR_ENV, UidConfig};
pub use format::{SEPARATOR, format_with_separator, group_sizes, strip_separators};
pub use uid::{
    DEFAULT_LENGTH, EPOCH, MAX_ELAPSED, MIN_LENGTH, ParsedUid, STAMP_LEN, UidError, UidGen,
    generate, generate_at, is_valid, parse_uid, parse_uid_at, validate, validate_at,
};
