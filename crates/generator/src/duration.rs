use crate::error::{ErrorKind, Result};
use exn::OptionExt;
use regex::Regex;
use std::sync::LazyLock;
use tracing::instrument;

/// Maximal runs of digits followed by non-digits. Anything before the first
/// digit or after the last unit is ignored.
static PAIRS_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([0-9]+)([^0-9]+)").unwrap());

const DAY_MS: u64 = 86_400_000;
const HOUR_MS: u64 = 3_600_000;
const MINUTE_MS: u64 = 60_000;
const SECOND_MS: u64 = 1_000;

/// Parses a duration such as `"3d"`, `"10h6m"` or `"500u"` into milliseconds.
///
/// Units are `d`ays, `h`ours, `m`inutes, `s`econds and `u` (milliseconds).
/// Every number must be followed by exactly one unit character.
///
/// ```
/// use swgen_generator::parse_duration;
/// assert_eq!(parse_duration("1d2h").unwrap(), 93_600_000);
/// assert!(parse_duration("2 weeks").is_err());
/// ```
#[instrument(level = "trace")]
pub fn parse_duration(text: &str) -> Result<u64> {
    let invalid = || ErrorKind::InvalidDuration(text.to_string());
    let mut total = 0u64;
    let mut pairs = 0usize;
    for captures in PAIRS_REGEX.captures_iter(text) {
        pairs += 1;
        let factor = match &captures[2] {
            "d" => DAY_MS,
            "h" => HOUR_MS,
            "m" => MINUTE_MS,
            "s" => SECOND_MS,
            "u" => 1,
            _ => exn::bail!(invalid()),
        };
        let value: u64 = captures[1].parse().map_err(|_| invalid())?;
        total = value.checked_mul(factor).and_then(|ms| total.checked_add(ms)).ok_or_raise(invalid)?;
    }
    if pairs == 0 {
        exn::bail!(invalid());
    }
    Ok(total)
}
