//! UID generation and validation.
//!
//! Raw layout: `<prefix><stamp><suffix><check>`
//!
//! - `stamp` is 6 symbols of seconds since [`EPOCH`], big-endian base 32,
//!   each shifted by the checksum value.
//! - `prefix` and `suffix` are the random symbols, split at half their count.
//! - `check` is the sum of every other symbol value (stamp unshifted) mod 32.
//!
//! Validation returns a uniform `None` on any failure. The failed check is
//! only reported as a `tracing` debug event.

use chrono::{DateTime, FixedOffset, TimeDelta, Utc};
use once_cell::sync::Lazy;
use rand::random_range;
use regex::Regex;
use thiserror::Error;
use tracing::{debug, warn};

use crate::alphabet::{BASE, symbol, value_of};
use crate::config::UidConfig;
use crate::format::{format_with_separator, strip_separators};

/// Unix time (seconds) of the zero point: 2025-01-01T00:00:00Z.
pub const EPOCH: i64 = 1_735_689_600;

/// Symbols in the timestamp segment.
pub const STAMP_LEN: usize = 6;

/// Smallest `length` accepted by [`generate`].
pub const MIN_LENGTH: usize = 8;

/// Default `length` for [`generate`].
pub const DEFAULT_LENGTH: usize = 10;

/// Exclusive upper bound of the seconds a stamp can carry (32^6).
pub const MAX_ELAPSED: i64 = (BASE as i64).pow(STAMP_LEN as u32);

/// Offset of reconstructed timestamps: UTC-4 (America/Manaus, no DST).
const DISPLAY_OFFSET_SECS: i32 = -4 * 3600;

const CHECK_LEN: usize = 1;

static UID_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[1-9a-hjkmnp-z]+$").unwrap());

/// Errors that can occur during UID generation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UidError {
    #[error("Invalid length {0}: must be >= 8")]
    InvalidLength(usize),
    #[error("Current time is outside the representable range ({0}s from epoch)")]
    OutOfRange(i64),
}

/// Why a UID was rejected. Never returned to callers.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    #[error("fewer than 7 symbols")]
    TooShort,
    #[error("symbol outside the alphabet")]
    ForeignSymbol,
    #[error("checksum mismatch")]
    ChecksumMismatch,
    #[error("timestamp is not in the past")]
    FromFuture,
}

/// Parsed UID components.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedUid {
    /// Input as given, separators included.
    pub raw: String,
    /// Input with separators removed.
    pub compact: String,
    /// Seconds since [`EPOCH`].
    pub elapsed: i64,
    pub timestamp: DateTime<FixedOffset>,
}

impl ParsedUid {
    /// Get Unix timestamp in seconds.
    pub fn timestamp_sec(&self) -> i64 {
        self.timestamp.timestamp()
    }
}

/// Where the stamp starts, given the number of random symbols.
///
/// Both encoding and decoding go through here; decoding recovers
/// `random_len` as `body_len - STAMP_LEN`.
#[inline]
fn stamp_offset(random_len: usize) -> usize {
    random_len / 2
}

fn display_offset() -> FixedOffset {
    FixedOffset::east_opt(DISPLAY_OFFSET_SECS).expect("UTC-4 is a valid offset")
}

/// Generate a UID from the system clock and the thread-local CSPRNG.
pub fn generate(length: usize, with_separator: bool) -> Result<String, UidError> {
    generate_at(Utc::now(), length, with_separator, || random_range(0..BASE))
}

/// Generate a UID for a given instant, drawing random symbol values from
/// `next_value`.
///
/// Values returned by `next_value` are reduced modulo 32.
pub fn generate_at<F>(
    now: DateTime<Utc>,
    length: usize,
    with_separator: bool,
    mut next_value: F,
) -> Result<String, UidError>
where
    F: FnMut() -> u32,
{
    if length < MIN_LENGTH {
        warn!(length, "refusing to generate uid: length below minimum");
        return Err(UidError::InvalidLength(length));
    }

    let elapsed = now.timestamp() - EPOCH;
    if !(0..MAX_ELAPSED).contains(&elapsed) {
        warn!(elapsed, "refusing to generate uid: clock outside representable range");
        return Err(UidError::OutOfRange(elapsed));
    }

    let mut sum = 0;
    let mut stamp = [0u32; STAMP_LEN];
    let mut rest = elapsed as u64;
    for slot in stamp.iter_mut().rev() {
        *slot = (rest % BASE as u64) as u32;
        sum = (sum + *slot) % BASE;
        rest /= BASE as u64;
    }

    let random: Vec<u32> = (0..length - STAMP_LEN - CHECK_LEN)
        .map(|_| {
            let v = next_value() % BASE;
            sum = (sum + v) % BASE;
            v
        })
        .collect();

    let mid = stamp_offset(random.len());
    let mut uid = String::with_capacity(length);
    uid.extend(random[..mid].iter().map(|&v| symbol(v)));
    uid.extend(stamp.iter().map(|&v| symbol(v + sum)));
    uid.extend(random[mid..].iter().map(|&v| symbol(v)));
    uid.push(symbol(sum));

    Ok(if with_separator {
        format_with_separator(&uid)
    } else {
        uid
    })
}

fn decode(uid: &str, now: DateTime<Utc>) -> Result<ParsedUid, Rejection> {
    let compact = strip_separators(uid);
    if compact.len() < STAMP_LEN + CHECK_LEN {
        return Err(Rejection::TooShort);
    }
    if !UID_PATTERN.is_match(&compact) {
        return Err(Rejection::ForeignSymbol);
    }

    // every char is a symbol once the pattern matched
    let mut values: Vec<u32> = compact.chars().filter_map(value_of).map(u32::from).collect();
    let check = values.pop().unwrap_or_default();
    let body = values.as_slice();

    let mid = stamp_offset(body.len() - STAMP_LEN);
    let stamp: Vec<u32> = body[mid..mid + STAMP_LEN]
        .iter()
        .map(|&v| (v + BASE - check) % BASE)
        .collect();

    let sum = body[..mid]
        .iter()
        .chain(&stamp)
        .chain(&body[mid + STAMP_LEN..])
        .fold(0, |acc, &v| (acc + v) % BASE);
    if sum != check {
        return Err(Rejection::ChecksumMismatch);
    }

    let elapsed = stamp
        .iter()
        .fold(0i64, |acc, &v| acc * BASE as i64 + v as i64);
    let at = DateTime::<Utc>::UNIX_EPOCH + TimeDelta::seconds(EPOCH + elapsed);
    if at >= now {
        return Err(Rejection::FromFuture);
    }

    Ok(ParsedUid {
        raw: uid.to_string(),
        compact,
        elapsed,
        timestamp: at.with_timezone(&display_offset()),
    })
}

/// Parse a UID against a given instant. `None` for any invalid input.
pub fn parse_uid_at(uid: &str, now: DateTime<Utc>) -> Option<ParsedUid> {
    match decode(uid, now) {
        Ok(parsed) => Some(parsed),
        Err(reason) => {
            debug!(uid, %reason, "rejected uid");
            None
        }
    }
}

/// Parse a UID against the system clock.
pub fn parse_uid(uid: &str) -> Option<ParsedUid> {
    parse_uid_at(uid, Utc::now())
}

/// Recover the creation time of a UID, checked against `now`.
pub fn validate_at(uid: &str, now: DateTime<Utc>) -> Option<DateTime<FixedOffset>> {
    parse_uid_at(uid, now).map(|p| p.timestamp)
}

/// Recover the creation time of a UID. Separators are ignored.
///
/// Returns `None` if the UID is too short, contains foreign symbols, fails
/// its checksum, or decodes to a time that is not in the past.
pub fn validate(uid: &str) -> Option<DateTime<FixedOffset>> {
    validate_at(uid, Utc::now())
}

/// Whether `uid` validates against the system clock.
pub fn is_valid(uid: &str) -> bool {
    validate(uid).is_some()
}

/// UID generator bound to a [`UidConfig`].
#[derive(Debug, Clone)]
pub struct UidGen {
    config: UidConfig,
}

impl UidGen {
    /// Create a generator. Fails if the configured length is below 8.
    pub fn new(config: UidConfig) -> Result<Self, UidError> {
        config.check()?;
        Ok(Self { config })
    }

    /// Create a generator with default parameters (length 10, separated).
    pub fn default_params() -> Self {
        Self {
            config: UidConfig::default(),
        }
    }

    /// Generate the next UID.
    pub fn next_uid(&self) -> Result<String, UidError> {
        generate(self.config.length, self.config.with_separator)
    }

    /// Generate n UIDs.
    pub fn next_n(&self, n: usize) -> Result<Vec<String>, UidError> {
        (0..n).map(|_| self.next_uid()).collect()
    }

    pub fn config(&self) -> &UidConfig {
        &self.config
    }
}

/// Ends once the clock leaves the representable range.
impl Iterator for UidGen {
    type Item = String;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.next_uid().ok()
    }
}
