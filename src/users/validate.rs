use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

pub const PASSWORD_MIN_LENGTH: usize = 8;
pub const PHONE_LENGTH: usize = 10;
pub const AADHAAR_LENGTH: usize = 12;
pub const PASSWORD_SPECIALS: &str = "!@#$%^&*(),.?\":{}|<>";

pub const GENDERS: &[&str] = &["Male", "Female", "Other"];
pub const EXPERIENCE_LEVELS: &[&str] = &[
    "Fresher (0-1 years)",
    "Experienced (1-3 years)",
    "Senior (3-5 years)",
    "Expert (5+ years)",
];
pub const COMPANY_TYPES: &[&str] = &[
    "Individual/Family",
    "Small Business",
    "Medium Enterprise",
    "Large Corporation",
    "NGO/Non-Profit",
];
pub const WORK_TYPES: &[&str] = &[
    "Maid",
    "Cook",
    "Driver",
    "Cleaner",
    "Babysitter",
    "Gardener",
    "Security Guard",
    "Electrician",
    "Plumber",
    "Other",
];
pub const AVAILABILITY_OPTIONS: &[&str] =
    &["Full Time", "Part Time", "Weekends Only", "Night Shifts"];
pub const AGE_RANGE: std::ops::RangeInclusive<u8> = 16..=70;
/// Monthly expected salary in rupees.
pub const SALARY_RANGE: std::ops::RangeInclusive<u32> = 5_000..=50_000;

/// First password rule a candidate breaks, checked in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PasswordViolation {
    #[error("Password is required.")]
    Missing,
    #[error("Password must be at least 8 characters long.")]
    TooShort,
    #[error("Password must include at least one uppercase letter.")]
    NoUppercase,
    #[error("Password must include at least one lowercase letter.")]
    NoLowercase,
    #[error("Password must include at least one digit.")]
    NoDigit,
    #[error("Password must include at least one special character.")]
    NoSpecial,
}

/// Canonical 10-digit form of a phone number, accepting a `+91`/`91` prefix.
pub fn normalize_phone(input: &str) -> Option<String> {
    let cleaned: String = input
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect();

    let local = if let Some(rest) = cleaned.strip_prefix("+91") {
        rest
    } else if cleaned.len() == PHONE_LENGTH + 2 && cleaned.starts_with("91") {
        &cleaned[2..]
    } else {
        cleaned.as_str()
    };

    (local.len() == PHONE_LENGTH && local.chars().all(|c| c.is_ascii_digit()))
        .then(|| local.to_string())
}

pub fn validate_phone(input: &str) -> bool {
    normalize_phone(input).is_some()
}

/// Digits of an Aadhaar number when exactly twelve remain after stripping separators.
pub fn normalize_aadhaar(input: &str) -> Option<String> {
    let digits: String = input.chars().filter(|c| c.is_ascii_digit()).collect();
    (digits.len() == AADHAAR_LENGTH).then_some(digits)
}

pub fn validate_aadhaar(input: &str) -> bool {
    normalize_aadhaar(input).is_some()
}

pub fn validate_email(input: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex =
            Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap();
    }
    EMAIL_RE.is_match(input.trim())
}

/// Returns the first unmet rule, or `None` when the password is acceptable.
pub fn validate_password(input: &str) -> Option<PasswordViolation> {
    if input.is_empty() {
        return Some(PasswordViolation::Missing);
    }
    if input.chars().count() < PASSWORD_MIN_LENGTH {
        return Some(PasswordViolation::TooShort);
    }
    if !input.chars().any(|c| c.is_ascii_uppercase()) {
        return Some(PasswordViolation::NoUppercase);
    }
    if !input.chars().any(|c| c.is_ascii_lowercase()) {
        return Some(PasswordViolation::NoLowercase);
    }
    if !input.chars().any(|c| c.is_ascii_digit()) {
        return Some(PasswordViolation::NoDigit);
    }
    if !input.chars().any(|c| PASSWORD_SPECIALS.contains(c)) {
        return Some(PasswordViolation::NoSpecial);
    }
    None
}

pub fn is_option(options: &[&str], value: &str) -> bool {
    options.contains(&value)
}
