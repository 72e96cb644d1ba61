use std::sync::LazyLock;

use regex::Regex;

pub const MINUTES_IN_SECONDS: u64 = 60;
pub const HOURS_IN_SECONDS: u64 = MINUTES_IN_SECONDS * 60;
pub const DAYS_IN_SECONDS: u64 = HOURS_IN_SECONDS * 24;

static DURATION_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)(m|h|d)").expect("duration token regex is valid"));

/// Parses a string containing X{m|h|d} where X is an integer greater than 0,
/// returning the total number of seconds.
///
/// Matching is case insensitive and the first token wins; anything around it
/// is ignored. No upper bound is enforced beyond u64 arithmetic.
pub fn parse_duration(s: &str) -> Result<u64, crate::Error> {
    if s.is_empty() {
        return Err("Invalid duration".into());
    }

    let s = s.to_lowercase();

    let Some(caps) = DURATION_TOKEN.captures(&s) else {
        return Err("Invalid duration".into());
    };

    let (Some(number), Some(unit)) = (caps.get(1), caps.get(2)) else {
        return Err("Invalid duration".into());
    };

    // A leading minus sign is not part of the token, reject it explicitly
    if number.start() > 0 && s.as_bytes()[number.start() - 1] == b'-' {
        return Err("Invalid duration".into());
    }

    let value = number.as_str().parse::<u64>().map_err(|_| "Invalid duration")?;

    if value < 1 {
        return Err("Invalid duration".into());
    }

    let unit_seconds = match unit.as_str() {
        "m" => MINUTES_IN_SECONDS,
        "h" => HOURS_IN_SECONDS,
        "d" => DAYS_IN_SECONDS,
        _ => return Err("Invalid duration".into()),
    };

    value
        .checked_mul(unit_seconds)
        .ok_or_else(|| "Duration overflows u64 seconds".into())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_each_unit() {
        assert_eq!(parse_duration("1m").unwrap(), 60);
        assert_eq!(parse_duration("5m").unwrap(), 300);
        assert_eq!(parse_duration("2h").unwrap(), 7200);
        assert_eq!(parse_duration("3d").unwrap(), 259200);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(parse_duration("10M").unwrap(), 600);
        assert_eq!(parse_duration("1H").unwrap(), 3600);
        assert_eq!(parse_duration("1D").unwrap(), 86400);
    }

    #[test]
    fn test_first_token_wins() {
        assert_eq!(parse_duration("1h30m").unwrap(), 3600);
        assert_eq!(parse_duration("ban them for 2d please").unwrap(), 2 * 86400);
    }

    #[test]
    fn test_rejects_malformed_input() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("10").is_err());
        assert!(parse_duration("m").is_err());
        assert!(parse_duration("0m").is_err());
        assert!(parse_duration("00h").is_err());
        assert!(parse_duration("-5m").is_err());
        assert!(parse_duration("ten minutes").is_err());
        assert!(parse_duration("5w").is_err());
    }

    #[test]
    fn test_large_durations_are_accepted() {
        assert_eq!(
            parse_duration("100000d").unwrap(),
            100000 * DAYS_IN_SECONDS
        );
    }
}
