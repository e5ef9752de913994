use bigdecimal::BigDecimal;
use std::fmt;

pub const PHONE_NUMBER_LEN: usize = 11;
pub const PLAN_NAME_MAX_LEN: usize = 100;
pub const BANK_ACCOUNT_LEN: usize = 10;
pub const ALLOWED_NETWORKS: &[&str] = &["MTN", "GLO", "AIRTEL", "9MOBILE"];
pub const ALLOWED_STATUSES: &[&str] = &["processing", "completed", "failed"];

// Nigerian mobile prefixes, keyed by carrier.
const NETWORK_PREFIXES: &[(&str, &[&str])] = &[
    (
        "MTN",
        &[
            "0803", "0806", "0703", "0706", "0813", "0816", "0810", "0814", "0903", "0906",
            "0913", "0916",
        ],
    ),
    (
        "AIRTEL",
        &[
            "0802", "0808", "0708", "0812", "0701", "0902", "0907", "0901", "0912",
        ],
    ),
    (
        "GLO",
        &["0805", "0807", "0705", "0815", "0811", "0905", "0915"],
    ),
    ("9MOBILE", &["0809", "0818", "0817", "0909", "0908"]),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult = Result<(), ValidationError>;

pub fn sanitize_string(value: &str) -> String {
    value
        .chars()
        .filter(|ch| !ch.is_control())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn validate_required(field: &'static str, value: &str) -> ValidationResult {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }

    Ok(())
}

pub fn validate_max_len(field: &'static str, value: &str, max_len: usize) -> ValidationResult {
    if value.len() > max_len {
        return Err(ValidationError::new(
            field,
            format!("must be at most {} characters", max_len),
        ));
    }

    Ok(())
}

pub fn validate_enum(field: &'static str, value: &str, allowed: &[&str]) -> ValidationResult {
    if allowed.iter().all(|candidate| value != *candidate) {
        return Err(ValidationError::new(
            field,
            format!("must be one of: {}", allowed.join(", ")),
        ));
    }

    Ok(())
}

pub fn validate_positive_amount(amount: &BigDecimal) -> ValidationResult {
    if amount <= &BigDecimal::from(0) {
        return Err(ValidationError::new("amount", "must be greater than zero"));
    }

    Ok(())
}

pub fn validate_phone_number(phone_number: &str) -> ValidationResult {
    let phone_number = sanitize_string(phone_number);
    validate_required("phone_number", &phone_number)?;

    if phone_number.len() != PHONE_NUMBER_LEN {
        return Err(ValidationError::new(
            "phone_number",
            format!("must be exactly {} digits", PHONE_NUMBER_LEN),
        ));
    }

    if !phone_number.starts_with('0') {
        return Err(ValidationError::new("phone_number", "must start with '0'"));
    }

    if !phone_number.chars().all(|ch| ch.is_ascii_digit()) {
        return Err(ValidationError::new(
            "phone_number",
            "must contain only digits",
        ));
    }

    Ok(())
}

pub fn validate_network(network: &str) -> ValidationResult {
    validate_enum("network", network, ALLOWED_NETWORKS)
}

pub fn validate_bank_account(account: &str) -> ValidationResult {
    let account = sanitize_string(account);
    validate_required("bank_account", &account)?;

    if account.len() != BANK_ACCOUNT_LEN || !account.chars().all(|ch| ch.is_ascii_digit()) {
        return Err(ValidationError::new(
            "bank_account",
            format!("must be exactly {} digits", BANK_ACCOUNT_LEN),
        ));
    }

    Ok(())
}

pub fn validate_webhook_url(raw: &str) -> ValidationResult {
    let parsed = url::Url::parse(raw)
        .map_err(|_| ValidationError::new("url", "must be a valid URL"))?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(ValidationError::new("url", "must use http or https"));
    }

    Ok(())
}

/// Infers the carrier from the first four digits of a phone number.
/// Returns `None` when the prefix is not recognized.
pub fn detect_network(phone_number: &str) -> Option<&'static str> {
    let digits: String = phone_number
        .chars()
        .filter(|ch| ch.is_ascii_digit())
        .collect();

    if digits.len() < 4 {
        return None;
    }

    let prefix = &digits[..4];
    NETWORK_PREFIXES
        .iter()
        .find(|(_, prefixes)| prefixes.contains(&prefix))
        .map(|(network, _)| *network)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn validates_required_field() {
        assert!(validate_required("field", "value").is_ok());
        assert!(validate_required("field", "   ").is_err());
    }

    #[test]
    fn validates_max_len() {
        assert!(validate_max_len("field", "abc", 3).is_ok());
        assert!(validate_max_len("field", "abcd", 3).is_err());
    }

    #[test]
    fn validates_enum_values() {
        assert!(validate_enum("status", "processing", ALLOWED_STATUSES).is_ok());
        assert!(validate_enum("status", "pending", ALLOWED_STATUSES).is_err());
    }

    #[test]
    fn sanitizes_string() {
        assert_eq!(sanitize_string("  0803\t1234 567  "), "0803 1234 567");
        assert_eq!(sanitize_string("single"), "single");
        assert_eq!(sanitize_string(" \n "), "");
        assert_eq!(sanitize_string("ab\u{0000}cd\u{0007}"), "abcd");
    }

    #[test]
    fn validates_positive_amount() {
        let positive = BigDecimal::from_str("1.23").expect("valid decimal");
        let zero = BigDecimal::from(0);
        let negative = BigDecimal::from(-1);

        assert!(validate_positive_amount(&positive).is_ok());
        assert!(validate_positive_amount(&zero).is_err());
        assert!(validate_positive_amount(&negative).is_err());
    }

    #[test]
    fn validates_phone_number() {
        assert!(validate_phone_number("08031234567").is_ok());
        assert!(validate_phone_number(" 08031234567 ").is_ok());
        assert!(validate_phone_number("8031234567").is_err());
        assert!(validate_phone_number("080312345678").is_err());
        assert!(validate_phone_number("0803123456a").is_err());
        assert!(validate_phone_number("").is_err());
    }

    #[test]
    fn validates_network() {
        assert!(validate_network("MTN").is_ok());
        assert!(validate_network("9MOBILE").is_ok());
        assert!(validate_network("mtn").is_err());
        assert!(validate_network("VODAFONE").is_err());
    }

    #[test]
    fn validates_bank_account() {
        assert!(validate_bank_account("0123456789").is_ok());
        assert!(validate_bank_account("012345678").is_err());
        assert!(validate_bank_account("01234567xy").is_err());
    }

    #[test]
    fn validates_webhook_url() {
        assert!(validate_webhook_url("https://example.com/hooks").is_ok());
        assert!(validate_webhook_url("http://127.0.0.1:8080/hooks").is_ok());
        assert!(validate_webhook_url("ftp://example.com").is_err());
        assert!(validate_webhook_url("not a url").is_err());
    }

    #[test]
    fn detects_network_from_prefix() {
        assert_eq!(detect_network("08031234567"), Some("MTN"));
        assert_eq!(detect_network("08021234567"), Some("AIRTEL"));
        assert_eq!(detect_network("08051234567"), Some("GLO"));
        assert_eq!(detect_network("08091234567"), Some("9MOBILE"));
        assert_eq!(detect_network("08001234567"), None);
        assert_eq!(detect_network("080"), None);
    }

    #[test]
    fn detects_network_ignores_separators() {
        assert_eq!(detect_network("0803 123 4567"), Some("MTN"));
    }
}
