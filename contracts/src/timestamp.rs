//! Holding timestamps and the lock-in check.
//!
//! Holdings store their subscription time as text. New records are written
//! as RFC 3339 in UTC with nanosecond precision. Records written by the
//! previous host use `2024-03-01 09:30:00.123456789 +0000 UTC`; both parse.

use chrono::{DateTime, SecondsFormat, Utc};

use assetledger_protocol::config::LEGACY_TIMESTAMP_FORMAT;

use crate::error::ContractError;
use crate::records::Asset;

/// Render a transaction timestamp for storage and events.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Parse a stored holding timestamp.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, ContractError> {
    let raw_trimmed = raw.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw_trimmed) {
        return Ok(ts.with_timezone(&Utc));
    }

    // Legacy layout: drop the trailing zone abbreviation, keep the offset.
    let candidate = match raw_trimmed.rsplit_once(' ') {
        Some((head, zone)) if !zone.is_empty() && zone.chars().all(|c| c.is_ascii_alphabetic()) => {
            head
        }
        _ => raw_trimmed,
    };

    DateTime::parse_from_str(candidate, LEGACY_TIMESTAMP_FORMAT)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|_| ContractError::MalformedTimestamp {
            value: raw.to_string(),
        })
}

/// Earliest instant at which a holding subscribed at `subscribed_at` may be
/// redeemed. Lock-ins that reach past the calendar saturate at
/// [`DateTime::<Utc>::MAX_UTC`].
pub fn unlocks_at(asset: &Asset, subscribed_at: DateTime<Utc>) -> DateTime<Utc> {
    subscribed_at
        .checked_add_signed(asset.lock_in_period())
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// `true` once at least the asset's lock-in period has passed between
/// `subscribed_at` and `now`. The boundary itself counts as elapsed.
pub fn lock_in_elapsed(asset: &Asset, subscribed_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now.signed_duration_since(subscribed_at) >= asset.lock_in_period()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Timelike};

    fn asset_with_lock_in(days: u32) -> Asset {
        Asset {
            isin: "A1".into(),
            company_name: "c".into(),
            asset_type: "bond".into(),
            total_units: 100,
            price_per_unit: 10,
            available_units: 100,
            max_allowed_units: 50,
            min_redeem_units: 5,
            lock_in_period_days: days,
        }
    }

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap()
    }

    #[test]
    fn format_then_parse_preserves_nanos() {
        let ts = base().with_nanosecond(123_456_789).unwrap();
        let text = format_timestamp(ts);
        assert_eq!(text, "2024-03-01T09:30:00.123456789Z");
        assert_eq!(parse_timestamp(&text).unwrap(), ts);
    }

    #[test]
    fn parses_rfc3339_with_offset() {
        let ts = parse_timestamp("2024-03-01T15:00:00+05:30").unwrap();
        assert_eq!(ts, base());
    }

    #[test]
    fn parses_legacy_layout_with_fraction() {
        let ts = parse_timestamp("2024-03-01 09:30:00.5 +0000 UTC").unwrap();
        assert_eq!(ts, base() + Duration::milliseconds(500));
    }

    #[test]
    fn parses_legacy_layout_without_fraction() {
        let ts = parse_timestamp("2024-03-01 15:00:00 +0530 IST").unwrap();
        assert_eq!(ts, base());
    }

    #[test]
    fn rejects_garbage() {
        for raw in ["", "yesterday", "2024-13-01T00:00:00Z", "2024-03-01 09:30:00 UTC"] {
            assert!(
                matches!(
                    parse_timestamp(raw),
                    Err(ContractError::MalformedTimestamp { .. })
                ),
                "{raw:?} should not parse"
            );
        }
    }

    #[test]
    fn lock_in_boundary_counts_as_elapsed() {
        let asset = asset_with_lock_in(7);
        let boundary = base() + Duration::days(7);

        assert!(!lock_in_elapsed(&asset, base(), boundary - Duration::nanoseconds(1)));
        assert!(lock_in_elapsed(&asset, base(), boundary));
        assert!(lock_in_elapsed(&asset, base(), boundary + Duration::days(1)));
        assert_eq!(unlocks_at(&asset, base()), boundary);
    }

    #[test]
    fn zero_day_lock_in_is_immediately_elapsed() {
        let asset = asset_with_lock_in(0);
        assert!(lock_in_elapsed(&asset, base(), base()));
    }

    #[test]
    fn future_subscription_is_still_locked() {
        let asset = asset_with_lock_in(0);
        assert!(!lock_in_elapsed(&asset, base() + Duration::seconds(1), base()));
    }

    #[test]
    fn longest_lock_in_saturates_instead_of_overflowing() {
        let asset = asset_with_lock_in(u32::MAX);
        let later = base() + Duration::days(1);

        assert!(!lock_in_elapsed(&asset, base(), later));
        assert_eq!(unlocks_at(&asset, base()), DateTime::<Utc>::MAX_UTC);
    }

    #[test]
    fn lock_in_compares_days_not_raw_counts() {
        // One hour after subscribing to a 1-day lock-in is still locked.
        let asset = asset_with_lock_in(1);
        assert!(!lock_in_elapsed(&asset, base(), base() + Duration::hours(1)));
    }
}
