//! Duration strings in the `300ms` / `1.5h` / `2h45m` notation
//!
//! Parsing is done by `humantime`. On top of it a bare `0` is accepted
//! without a unit, fractional components such as `1.5s` are rewritten to
//! whole nanoseconds first, and negative values collapse to zero, which means
//! "no deadline".

use super::ConfigError;
use std::borrow::Cow;
use std::sync::OnceLock;
use std::time::Duration;

const FRACTIONAL: &str = r"([0-9]*\.[0-9]*)(ns|us|ms|s|m|h)";

fn fractional_pattern() -> &'static regex_lite::Regex {
    static PATTERN: OnceLock<regex_lite::Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        regex_lite::Regex::new(FRACTIONAL)
            .unwrap_or_else(|e| panic!("fractional duration pattern is a valid regex: {e}"))
    })
}

fn unit_nanos(unit: &str) -> u128 {
    match unit {
        "ns" => 1,
        "us" => 1_000,
        "ms" => 1_000_000,
        "s" => 1_000_000_000,
        "m" => 60 * 1_000_000_000,
        _ => 3600 * 1_000_000_000,
    }
}

/// Nanoseconds for one fractional component. Digits finer than a nanosecond
/// are truncated.
fn fractional_nanos(number: &str, unit: u128) -> Option<u128> {
    let (int, frac) = number.split_once('.')?;
    if int.is_empty() && frac.is_empty() {
        return None;
    }
    let int: u128 = if int.is_empty() { 0 } else { int.parse().ok()? };
    let mut total = int.checked_mul(unit)?;

    let mut scale = unit;
    for digit in frac.chars() {
        scale /= 10;
        if scale == 0 {
            break;
        }
        total = total.checked_add(u128::from(digit.to_digit(10)?) * scale)?;
    }
    Some(total)
}

/// Rewrite `1.5s` style components as `1500000000ns` so humantime can read them
fn expand_fractions(body: &str) -> Option<Cow<'_, str>> {
    if !body.contains('.') {
        return Some(Cow::Borrowed(body));
    }

    let mut failed = false;
    let rewritten = fractional_pattern().replace_all(body, |caps: &regex_lite::Captures<'_>| {
        match fractional_nanos(&caps[1], unit_nanos(&caps[2])) {
            Some(nanos) => format!("{nanos}ns"),
            None => {
                failed = true;
                String::new()
            }
        }
    });
    if failed {
        return None;
    }
    Some(rewritten)
}

/// Parse a duration such as `30s`, `1m30s` or `0`
pub fn parse_duration(input: &str) -> Result<Duration, ConfigError> {
    let invalid = || ConfigError::InvalidDuration(input.to_string());

    let trimmed = input.trim();
    let (negative, body) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    if body == "0" {
        return Ok(Duration::ZERO);
    }

    // humantime only knows the ASCII spelling of microseconds
    let normalized = body.replace('µ', "u").replace('μ', "u");
    let body = expand_fractions(&normalized).ok_or_else(invalid)?;
    let duration = humantime::parse_duration(&body).map_err(|_| invalid())?;

    if negative {
        return Ok(Duration::ZERO);
    }
    Ok(duration)
}
