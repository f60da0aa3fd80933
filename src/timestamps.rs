//! Time marker extraction and antidelay adjustment.
//!
//! Everything here is pure: no I/O, no clock reads, no shared mutable state.

use std::sync::LazyLock;

use regex::Regex;

const SECONDS_PER_DAY: i64 = 24 * 3600;

// Hour 0-23 (one or two digits) not preceded by another digit, then two minute digits.
static TIME_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[^0-9])([01]?[0-9]|2[0-3]):([0-5][0-9])").unwrap());

/// Finds the first `H:MM`/`HH:MM` marker on every non-blank line and returns
/// them normalized to `HH:MM`, in line order. Lines without a marker are skipped.
pub fn extract_timestamps(text: &str) -> Vec<String> {
    text.split('\n')
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let caps = TIME_MARKER.captures(line)?;
            Some(format!("{:0>2}:{}", &caps[1], &caps[2]))
        })
        .collect()
}

/// Subtracts `seconds_to_subtract` from an `HH:MM` marker and returns `HH:MM:SS`.
///
/// A negative result wraps once to the previous day. Offsets bigger than a day
/// are not wrapped further.
pub fn subtract_seconds_from_timestamp(timestamp: &str, seconds_to_subtract: i64) -> String {
    let mut parts = timestamp.splitn(2, ':');
    let hours: i64 = parts.next().and_then(|h| h.trim().parse().ok()).unwrap_or(0);
    let minutes: i64 = parts.next().and_then(|m| m.trim().parse().ok()).unwrap_or(0);

    let mut total_seconds = hours * 3600 + minutes * 60;
    total_seconds = total_seconds.saturating_sub(seconds_to_subtract);
    if total_seconds < 0 {
        total_seconds += SECONDS_PER_DAY;
    }

    let new_hours = (total_seconds / 3600) % 24;
    let new_minutes = (total_seconds % 3600) / 60;
    let new_seconds = total_seconds % 60;

    format!("{:02}:{:02}:{:02}", new_hours, new_minutes, new_seconds)
}

/// Extracts every marker from `text` and shifts each one back by `antidelay_seconds`.
pub fn process_timestamps(text: &str, antidelay_seconds: i64) -> Vec<String> {
    extract_timestamps(text)
        .iter()
        .map(|timestamp| subtract_seconds_from_timestamp(timestamp, antidelay_seconds))
        .collect()
}

/// Reads a free-text antidelay value the lenient way: leading whitespace and an
/// optional sign, then as many digits as are present. Anything unusable is 0.
pub fn parse_antidelay(input: &str) -> i64 {
    let s = input.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    let value: i64 = match rest[..digits_len].parse() {
        Ok(v) => v,
        Err(_) => return 0,
    };
    if negative {
        -value
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_empty_and_blank() {
        assert!(extract_timestamps("").is_empty());
        assert!(extract_timestamps("   \n\n").is_empty());
        assert!(extract_timestamps("\t\n  \n").is_empty());
    }

    #[test]
    fn test_extract_pads_single_digit_hour() {
        assert_eq!(extract_timestamps("Event at 9:30 today"), vec!["09:30"]);
    }

    #[test]
    fn test_extract_rejects_single_digit_minute() {
        assert_eq!(
            extract_timestamps("9:5 is not valid\n14:45 is valid"),
            vec!["14:45"]
        );
    }

    #[test]
    fn test_extract_rejects_hour_24() {
        assert!(extract_timestamps("Closing at 24:00").is_empty());
        assert!(extract_timestamps("99:10").is_empty());
    }

    #[test]
    fn test_extract_first_match_per_line() {
        assert_eq!(
            extract_timestamps("from 08:15 to 09:45\nlate 23:59, early 0:01"),
            vec!["08:15", "23:59"]
        );
    }

    #[test]
    fn test_extract_keeps_order_and_duplicates() {
        let text = "b 12:00\na 11:00\nb 12:00\n";
        assert_eq!(extract_timestamps(text), vec!["12:00", "11:00", "12:00"]);
    }

    #[test]
    fn test_extract_ignores_trailing_digits() {
        assert_eq!(extract_timestamps("id 12:345"), vec!["12:34"]);
    }

    #[test]
    fn test_extract_handles_crlf() {
        assert_eq!(
            extract_timestamps("BUY 10:01\r\n\r\nSELL 10:02\r\n"),
            vec!["10:01", "10:02"]
        );
    }

    #[test]
    fn test_extract_is_idempotent_on_normalized_markers() {
        for marker in ["00:00", "07:05", "19:59", "23:59"] {
            assert_eq!(extract_timestamps(marker), vec![marker]);
        }
    }

    #[test]
    fn test_subtract_wraps_to_previous_day() {
        assert_eq!(subtract_seconds_from_timestamp("00:10", 700), "23:58:20");
    }

    #[test]
    fn test_subtract_simple() {
        assert_eq!(subtract_seconds_from_timestamp("01:00", 15), "00:59:45");
        assert_eq!(subtract_seconds_from_timestamp("12:34", 0), "12:34:00");
    }

    #[test]
    fn test_subtract_negative_offset_moves_forward() {
        assert_eq!(subtract_seconds_from_timestamp("10:00", -30), "10:00:30");
        assert_eq!(subtract_seconds_from_timestamp("23:59", -60), "00:00:00");
    }

    #[test]
    fn test_subtract_exactly_midnight() {
        assert_eq!(subtract_seconds_from_timestamp("00:01", 60), "00:00:00");
        assert_eq!(subtract_seconds_from_timestamp("00:00", 1), "23:59:59");
    }

    #[test]
    fn test_process_timestamps() {
        assert_eq!(
            process_timestamps("Start 10:00\nignore\nEnd 10:05", 15),
            vec!["09:59:45", "10:04:45"]
        );
        assert!(process_timestamps("nothing here", 15).is_empty());
    }

    #[test]
    fn test_process_length_matches_extract() {
        let text = "a 1:00\nb\nc 2:30 d 3:30\n9:5\n23:15";
        for offset in [-86400, -1, 0, 15, 700, 86400] {
            assert_eq!(
                process_timestamps(text, offset).len(),
                extract_timestamps(text).len()
            );
        }
    }

    #[test]
    fn test_parse_antidelay() {
        assert_eq!(parse_antidelay("15"), 15);
        assert_eq!(parse_antidelay("  15s"), 15);
        assert_eq!(parse_antidelay("-3"), -3);
        assert_eq!(parse_antidelay("+7"), 7);
        assert_eq!(parse_antidelay("abc"), 0);
        assert_eq!(parse_antidelay(""), 0);
        assert_eq!(parse_antidelay("-"), 0);
        assert_eq!(parse_antidelay("99999999999999999999999"), 0);
    }
}
