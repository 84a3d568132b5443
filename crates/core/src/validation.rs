//! Pure validation and sanitization helpers for free-text input.

use std::sync::LazyLock;

use chrono::{DateTime, Duration, Utc};
use regex::Regex;

use crate::error::{DomainError, DomainResult};

/// `TYPE-AGE-NNN-MMYY`: type prefix, literal `AGE`, 3-digit sequence, month+year.
pub const INVENTORY_CODE_PATTERN: &str = r"^[A-Z]+-AGE-[0-9]{3}-[0-9]{4}$";

/// Maximum length kept for a sanitized serial number.
pub const SERIAL_MAX_LEN: usize = 50;

/// Minimum length of a non-empty serial number after sanitization.
pub const SERIAL_MIN_LEN: usize = 3;

/// Default truncation length for free text.
pub const DEFAULT_TEXT_MAX_LEN: usize = 500;

static INVENTORY_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(INVENTORY_CODE_PATTERN).expect("valid regex"));

static HTML_TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex"));

/// Trim, truncate to `max_len` characters and strip HTML tags.
///
/// This is the form stored for free text. Applying it to its own output
/// changes nothing, so values that round-trip through an edit form stay put.
pub fn clean_text(text: &str, max_len: usize) -> String {
    let truncated: String = text.trim().chars().take(max_len).collect();
    HTML_TAG_RE.replace_all(&truncated, "").trim().to_string()
}

/// [`clean_text`] followed by escaping the remaining `<>&"'` characters,
/// for text that ends up inside markup.
pub fn sanitize_text(text: &str, max_len: usize) -> String {
    let stripped = clean_text(text, max_len);

    let mut out = String::with_capacity(stripped.len());
    for c in stripped.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Normalize an inventory code to uppercase and check its shape.
///
/// Returns the normalized code on success.
pub fn validate_inventory_code(code: &str) -> DomainResult<String> {
    let normalized = code.trim().to_uppercase();
    if normalized.is_empty() {
        return Err(DomainError::validation("inventory code is required"));
    }
    if !INVENTORY_CODE_RE.is_match(&normalized) {
        return Err(DomainError::validation(
            "invalid format, use TYPE-AGE-NNN-MMYY",
        ));
    }
    Ok(normalized)
}

/// Validate an optional serial number.
///
/// Absent or blank serials are valid (`Ok(None)`); anything else must keep at
/// least [`SERIAL_MIN_LEN`] characters after sanitization. The returned
/// serial is the [`clean_text`] form.
pub fn validate_serial(serial: Option<&str>) -> DomainResult<Option<String>> {
    let Some(raw) = serial.filter(|s| !s.trim().is_empty()) else {
        return Ok(None);
    };

    if sanitize_text(raw, SERIAL_MAX_LEN).chars().count() < SERIAL_MIN_LEN {
        return Err(DomainError::validation(format!(
            "serial number must have at least {SERIAL_MIN_LEN} characters"
        )));
    }
    Ok(Some(clean_text(raw, SERIAL_MAX_LEN)))
}

/// Simple `local@domain.tld` shape check.
pub fn validate_email(address: &str) -> bool {
    EMAIL_RE.is_match(address)
}

/// True when `date` falls between `now` and `now + days` (inclusive).
pub fn is_due_within(date: DateTime<Utc>, now: DateTime<Utc>, days: i64) -> bool {
    date >= now && date <= now + Duration::days(days)
}

/// Whole days from `start` to `end`, rounded up.
pub fn days_between(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    let secs = (end - start).num_seconds();
    let day = 24 * 60 * 60;
    if secs >= 0 {
        (secs + day - 1) / day
    } else {
        -((-secs) / day)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    #[test]
    fn inventory_code_is_normalized_to_uppercase() {
        assert_eq!(validate_inventory_code("em-age-001-0824").unwrap(), "EM-AGE-001-0824");
        assert_eq!(validate_inventory_code("  equi-age-120-0323 ").unwrap(), "EQUI-AGE-120-0323");
    }

    #[test]
    fn inventory_code_rejects_short_segments() {
        assert!(validate_inventory_code("EM-AGE-1-24").is_err());
        assert!(validate_inventory_code("EM-XYZ-001-0824").is_err());
        assert!(validate_inventory_code("EM1-AGE-001-0824").is_err());
    }

    #[test]
    fn inventory_code_accepts_only_ascii_digits() {
        assert!(validate_inventory_code("EM-AGE-١٢٣-٠٨٢٤").is_err());
        assert!(validate_inventory_code("EM-AGE-１２３-0824").is_err());
        let err = validate_inventory_code("EM-AGE-12-0824").unwrap_err();
        assert_eq!(err.to_string(), "invalid format, use TYPE-AGE-NNN-MMYY");
    }

    #[test]
    fn inventory_code_reports_missing_value() {
        let err = validate_inventory_code("   ").unwrap_err();
        assert_eq!(err.to_string(), "inventory code is required");
    }

    #[test]
    fn serial_is_optional() {
        assert_eq!(validate_serial(None).unwrap(), None);
        assert_eq!(validate_serial(Some("  ")).unwrap(), None);
        assert_eq!(validate_serial(Some(" SN-1234 ")).unwrap(), Some("SN-1234".to_string()));
        assert!(validate_serial(Some("ab")).is_err());
    }

    #[test]
    fn serial_made_only_of_tags_is_too_short() {
        assert!(validate_serial(Some("<b></b>x")).is_err());
    }

    #[test]
    fn sanitize_strips_tags_and_escapes() {
        assert_eq!(sanitize_text("  <b>Scale</b> & co  ", 500), "Scale &amp; co");
        assert_eq!(sanitize_text("it's \"fine\"", 500), "it&#39;s &quot;fine&quot;");
        assert_eq!(sanitize_text("a < b", 500), "a &lt; b");
    }

    #[test]
    fn clean_text_keeps_punctuation_and_is_stable() {
        let once = clean_text("  Doctor's <i>scale</i> & \"co\" ", 500);
        assert_eq!(once, "Doctor's scale & \"co\"");
        assert_eq!(clean_text(&once, 500), once);
    }

    #[test]
    fn serial_is_stored_unescaped() {
        assert_eq!(validate_serial(Some("A&B-01")).unwrap(), Some("A&B-01".to_string()));
    }

    #[test]
    fn sanitize_truncates_before_stripping() {
        assert_eq!(sanitize_text("abcdef", 3), "abc");
        assert_eq!(sanitize_text("ñandú", 2), "ña");
    }

    #[test]
    fn email_shape() {
        assert!(validate_email("admin@clinic.org"));
        assert!(!validate_email("admin@clinic"));
        assert!(!validate_email("ad min@clinic.org"));
        assert!(!validate_email("@clinic.org"));
    }

    #[test]
    fn due_window_is_inclusive_and_future_only() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert!(is_due_within(now + Duration::days(30), now, 30));
        assert!(!is_due_within(now + Duration::days(31), now, 30));
        assert!(!is_due_within(now - Duration::days(1), now, 30));
    }

    #[test]
    fn days_between_rounds_up() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(days_between(now, now + Duration::hours(25)), 2);
        assert_eq!(days_between(now, now + Duration::days(3)), 3);
        assert_eq!(days_between(now, now), 0);
    }

    proptest! {
        #[test]
        fn sanitized_text_never_contains_raw_angle_brackets(s in ".{0,200}") {
            let out = sanitize_text(&s, 500);
            prop_assert!(!out.contains('<'));
            prop_assert!(!out.contains('>'));
        }

        #[test]
        fn clean_text_is_idempotent(s in ".{0,200}") {
            let once = clean_text(&s, 500);
            prop_assert_eq!(clean_text(&once, 500), once);
        }

        #[test]
        fn well_formed_codes_round_trip(prefix in "[a-zA-Z]{1,6}", seq in 0u32..1000, mmyy in 0u32..10000) {
            let code = format!("{prefix}-age-{seq:03}-{mmyy:04}");
            let normalized = validate_inventory_code(&code).unwrap();
            prop_assert_eq!(normalized, code.to_uppercase());
        }
    }
}
