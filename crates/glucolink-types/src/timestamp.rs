//! Parsing of LibreLinkUp timestamp strings.
//!
//! The upstream API reports times as `M/D/YYYY h:mm:ss AM|PM`, for example
//! `1/1/2026 2:52:27 PM`. There is no offset in the string.
//!
//! # Timezone
//!
//! The `Timestamp` field is the wall-clock time of the patient's phone, so it
//! is really local to the patient's timezone. No per-user timezone is known
//! here, so the parsed value is tagged as UTC without any offset correction.
//! Consumers that need true instants must apply the patient's offset
//! themselves.

use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};

use crate::error::{ParseError, ParseResult};

/// Vendor layout: month, day and hour without leading zeros, 12-hour clock.
const VENDOR_FORMAT: &[BorrowedFormatItem<'_>] = format_description!(
    "[month padding:none]/[day padding:none]/[year] [hour repr:12 padding:none]:[minute]:[second] [period]"
);

/// Parse a vendor timestamp into a UTC instant.
///
/// # Errors
///
/// Returns [`ParseError::Empty`] for an empty string and
/// [`ParseError::InvalidFormat`] for anything that does not match the vendor
/// layout exactly.
///
/// # Examples
///
/// ```
/// use glucolink_types::parse_timestamp;
/// use time::{Month, UtcOffset};
///
/// let ts = parse_timestamp("1/1/2026 1:52:27 PM").unwrap();
/// assert_eq!(ts.month(), Month::January);
/// assert_eq!(ts.hour(), 13);
/// assert_eq!(ts.offset(), UtcOffset::UTC);
///
/// assert!(parse_timestamp("2026-01-01T14:52:27Z").is_err());
/// ```
pub fn parse_timestamp(text: &str) -> ParseResult<OffsetDateTime> {
    if text.is_empty() {
        return Err(ParseError::Empty);
    }

    PrimitiveDateTime::parse(text, VENDOR_FORMAT)
        .map(PrimitiveDateTime::assume_utc)
        .map_err(|source| ParseError::InvalidFormat {
            input: text.to_string(),
            source,
        })
}

/// Parse a timestamp literal that is known to be valid.
///
/// Intended for fixtures and constants only. Never call this on data that came
/// from the network.
///
/// # Panics
///
/// Panics if `text` is not a valid vendor timestamp.
#[track_caller]
pub fn parse_timestamp_trusted(text: &str) -> OffsetDateTime {
    match parse_timestamp(text) {
        Ok(ts) => ts,
        Err(e) => panic!("invalid timestamp literal {text:?}: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::{Month, UtcOffset};

    #[test]
    fn test_parse_afternoon() {
        let ts = parse_timestamp("1/1/2026 1:52:27 PM").unwrap();
        assert_eq!(ts.year(), 2026);
        assert_eq!(ts.month(), Month::January);
        assert_eq!(ts.day(), 1);
        assert_eq!(ts.hour(), 13);
        assert_eq!(ts.minute(), 52);
        assert_eq!(ts.second(), 27);
        assert_eq!(ts.offset(), UtcOffset::UTC);
    }

    #[test]
    fn test_parse_midnight_and_noon() {
        let midnight = parse_timestamp("3/15/2026 12:00:00 AM").unwrap();
        assert_eq!(midnight.hour(), 0);

        let noon = parse_timestamp("3/15/2026 12:30:00 PM").unwrap();
        assert_eq!(noon.hour(), 12);
        assert_eq!(noon.minute(), 30);
    }

    #[test]
    fn test_parse_two_digit_fields() {
        let ts = parse_timestamp("12/31/2025 11:59:59 PM").unwrap();
        assert_eq!(ts.month(), Month::December);
        assert_eq!(ts.day(), 31);
        assert_eq!(ts.hour(), 23);
    }

    #[test]
    fn test_parse_accepts_leading_zeros() {
        let ts = parse_timestamp("01/05/2026 09:05:00 AM").unwrap();
        assert_eq!(ts.day(), 5);
        assert_eq!(ts.hour(), 9);
    }

    #[test]
    fn test_parse_empty_fails() {
        assert!(matches!(parse_timestamp(""), Err(ParseError::Empty)));
    }

    #[test]
    fn test_parse_rfc3339_fails() {
        let err = parse_timestamp("2026-01-01T14:52:27Z").unwrap_err();
        assert!(matches!(err, ParseError::InvalidFormat { .. }));
        assert!(err.to_string().contains("2026-01-01T14:52:27Z"));
    }

    #[test]
    fn test_parse_rejects_missing_period() {
        assert!(parse_timestamp("1/1/2026 13:52:27").is_err());
    }

    #[test]
    fn test_parse_rejects_trailing_text() {
        assert!(parse_timestamp("1/1/2026 1:52:27 PM UTC").is_err());
    }

    #[test]
    fn test_parse_rejects_invalid_date() {
        assert!(parse_timestamp("2/30/2026 1:00:00 PM").is_err());
        assert!(parse_timestamp("13/1/2026 1:00:00 PM").is_err());
    }

    #[test]
    fn test_parse_trusted() {
        let ts = parse_timestamp_trusted("6/7/2026 8:09:10 AM");
        assert_eq!(ts.month(), Month::June);
        assert_eq!(ts.hour(), 8);
    }

    #[test]
    #[should_panic(expected = "invalid timestamp literal")]
    fn test_parse_trusted_panics_on_bad_literal() {
        let _ = parse_timestamp_trusted("not a timestamp");
    }
}
