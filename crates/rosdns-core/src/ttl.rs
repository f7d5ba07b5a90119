//! TTL codec
//!
//! RouterOS reports TTLs as compact duration strings (`"1d"`, `"30m"`,
//! `"1h30m"`, older firmware `"1d 02:00:00"`); ExternalDNS carries them as
//! integer seconds. These two functions convert between the representations.

use crate::error::{Error, Result};

const SECONDS_PER_WEEK: u64 = 604_800;
const SECONDS_PER_DAY: u64 = 86_400;
const SECONDS_PER_HOUR: u64 = 3_600;
const SECONDS_PER_MINUTE: u64 = 60;

/// Units in rendering order, largest first
const UNITS: [(char, u64); 5] = [
    ('w', SECONDS_PER_WEEK),
    ('d', SECONDS_PER_DAY),
    ('h', SECONDS_PER_HOUR),
    ('m', SECONDS_PER_MINUTE),
    ('s', 1),
];

/// Render integer seconds as a RouterOS duration string.
///
/// Largest units first, zero components dropped. Zero renders as `"0s"`.
///
/// ```
/// use rosdns_core::ttl::seconds_to_duration;
///
/// assert_eq!(seconds_to_duration(3600), "1h");
/// assert_eq!(seconds_to_duration(5400), "1h30m");
/// assert_eq!(seconds_to_duration(0), "0s");
/// ```
pub fn seconds_to_duration(seconds: u32) -> String {
    if seconds == 0 {
        return "0s".to_string();
    }

    let mut remaining = u64::from(seconds);
    let mut out = String::new();
    for (unit, size) in UNITS {
        let count = remaining / size;
        if count > 0 {
            out.push_str(&count.to_string());
            out.push(unit);
            remaining %= size;
        }
    }
    out
}

/// Parse a RouterOS duration string into integer seconds.
///
/// Accepted forms:
/// - unit-suffixed components: `"1w2d"`, `"1h30m"`, `"45s"`
/// - a clock tail, optionally after components: `"00:05:00"`, `"1d 02:00:00"`
/// - a bare integer, read as seconds: `"300"`
///
/// # Errors
///
/// Returns [`Error::Format`] if the string is empty, negative, uses an
/// unknown unit, repeats a unit, or does not fit in `u32` seconds.
pub fn duration_to_seconds(duration: &str) -> Result<u32> {
    let input = duration.trim();
    if input.is_empty() {
        return Err(Error::format("TTL cannot be empty"));
    }
    if input.starts_with('-') {
        return Err(Error::format(format!("TTL cannot be negative: {input}")));
    }
    if input.bytes().all(|b| b.is_ascii_digit()) {
        return input
            .parse::<u32>()
            .map_err(|_| Error::format(format!("TTL out of range: {input}")));
    }

    let mut total: u64 = 0;
    let mut seen_units: Vec<char> = Vec::new();
    let mut rest = input;

    while !rest.is_empty() {
        rest = rest.trim_start();
        let digits_end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        if digits_end == 0 {
            return Err(Error::format(format!("expected a number in TTL '{input}'")));
        }

        let (number, tail) = rest.split_at(digits_end);
        if tail.starts_with(':') {
            // clock form consumes the remainder of the string
            let clock = add_checked(total, parse_clock(rest, input)?, input)?;
            return to_u32(clock, input);
        }

        let Some(unit) = tail.chars().next() else {
            return Err(Error::format(format!("TTL '{input}' is missing a unit")));
        };
        let size = UNITS
            .iter()
            .find(|(u, _)| *u == unit)
            .map(|(_, size)| *size)
            .ok_or_else(|| Error::format(format!("unknown unit '{unit}' in TTL '{input}'")))?;
        if seen_units.contains(&unit) {
            return Err(Error::format(format!("unit '{unit}' repeated in TTL '{input}'")));
        }
        seen_units.push(unit);

        let value: u64 = number
            .parse()
            .map_err(|_| Error::format(format!("TTL out of range: {input}")))?;
        let component = value
            .checked_mul(size)
            .ok_or_else(|| Error::format(format!("TTL out of range: {input}")))?;
        total = add_checked(total, component, input)?;
        rest = &tail[unit.len_utf8()..];
    }

    to_u32(total, input)
}

/// Parse `hh:mm:ss` into seconds
fn parse_clock(clock: &str, input: &str) -> Result<u64> {
    let malformed = || Error::format(format!("malformed clock in TTL '{input}'"));

    let parts: Vec<&str> = clock.trim_end().split(':').collect();
    if parts.len() != 3 {
        return Err(malformed());
    }

    let mut fields = [0u64; 3];
    for (slot, part) in fields.iter_mut().zip(&parts) {
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        *slot = part.parse().map_err(|_| malformed())?;
    }

    let [hours, minutes, seconds] = fields;
    if minutes >= 60 || seconds >= 60 {
        return Err(malformed());
    }

    hours
        .checked_mul(SECONDS_PER_HOUR)
        .and_then(|h| h.checked_add(minutes * SECONDS_PER_MINUTE + seconds))
        .ok_or_else(|| Error::format(format!("TTL out of range: {input}")))
}

fn add_checked(total: u64, component: u64, input: &str) -> Result<u64> {
    total
        .checked_add(component)
        .ok_or_else(|| Error::format(format!("TTL out of range: {input}")))
}

fn to_u32(total: u64, input: &str) -> Result<u32> {
    u32::try_from(total).map_err(|_| Error::format(format!("TTL out of range: {input}")))
}
