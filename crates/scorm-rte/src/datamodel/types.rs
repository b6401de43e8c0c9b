use regex::Regex;
use std::sync::OnceLock;

/// Why a value was refused by its element's type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Violation {
    TypeMismatch(&'static str),
    OutOfRange(String),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DataType {
    /// CMIString255 / CMIString4096.
    CmiString { max_len: usize },
    CharacterString,
    /// characterstring with an optional `{lang=xx}` delimiter.
    LocalizedString,
    /// CMIIdentifier.
    Identifier,
    /// long_identifier_type.
    LongIdentifier,
    /// CMIDecimal / real(10,7), optionally bounded and optionally blank.
    Decimal {
        min: Option<f64>,
        max: Option<f64>,
        allow_blank: bool,
    },
    /// CMISInteger.
    Integer { min: i64, max: i64 },
    Vocabulary(&'static [&'static str]),
    /// An interaction result: a vocabulary word or a decimal.
    VocabularyOrDecimal(&'static [&'static str]),
    /// CMITimespan, `HHHH:MM:SS.SS`.
    Timespan,
    /// CMITime, `HH:MM:SS.SS`.
    TimeOfDay,
    /// ISO 8601 time interval, `PT1H2M3.5S`.
    Duration,
    /// ISO 8601 timestamp.
    Timestamp,
    LanguageTag,
    /// `adl.nav.request` vocabulary.
    NavRequest,
}

impl DataType {
    pub fn name(&self) -> &'static str {
        match self {
            Self::CmiString { .. } => "CMIString",
            Self::CharacterString => "characterstring",
            Self::LocalizedString => "localized_string_type",
            Self::Identifier => "CMIIdentifier",
            Self::LongIdentifier => "long_identifier_type",
            Self::Decimal { .. } => "decimal",
            Self::Integer { .. } => "CMISInteger",
            Self::Vocabulary(_) => "vocabulary token",
            Self::VocabularyOrDecimal(_) => "vocabulary token or decimal",
            Self::Timespan => "CMITimespan",
            Self::TimeOfDay => "CMITime",
            Self::Duration => "timeinterval",
            Self::Timestamp => "time",
            Self::LanguageTag => "language_type",
            Self::NavRequest => "navigation request",
        }
    }

    /// Validates `value` and returns the form that is stored: decimals lose
    /// redundant signs and zeros, everything else is kept exactly as written.
    pub fn normalize(&self, value: &str) -> Result<String, Violation> {
        let mismatch = || Violation::TypeMismatch(self.name());
        match *self {
            Self::CmiString { max_len } => {
                if value.chars().count() > max_len {
                    return Err(mismatch());
                }
                Ok(value.to_string())
            }
            Self::CharacterString => Ok(value.to_string()),
            Self::LocalizedString => {
                if value.starts_with("{lang=") && !matches(&LOCALIZED, LOCALIZED_PATTERN, value) {
                    return Err(mismatch());
                }
                Ok(value.to_string())
            }
            Self::Identifier => {
                if value.is_empty()
                    || value.chars().count() > 255
                    || value.chars().any(char::is_whitespace)
                {
                    return Err(mismatch());
                }
                Ok(value.to_string())
            }
            Self::LongIdentifier => {
                if value.is_empty()
                    || value.chars().count() > 4000
                    || value.chars().any(char::is_whitespace)
                {
                    return Err(mismatch());
                }
                Ok(value.to_string())
            }
            Self::Decimal {
                min,
                max,
                allow_blank,
            } => {
                if value.is_empty() && allow_blank {
                    return Ok(String::new());
                }
                let number = parse_decimal(value).ok_or_else(mismatch)?;
                if min.is_some_and(|min| number < min) || max.is_some_and(|max| number > max) {
                    return Err(Violation::OutOfRange(describe_bounds(value, min, max)));
                }
                Ok(canonical_decimal(value))
            }
            Self::Integer { min, max } => {
                if !matches(&INTEGER, INTEGER_PATTERN, value) {
                    return Err(mismatch());
                }
                let number = value.parse::<i64>().map_err(|_| mismatch())?;
                if number < min || number > max {
                    return Err(Violation::OutOfRange(format!(
                        "{value} is outside {min}..={max}"
                    )));
                }
                Ok(number.to_string())
            }
            Self::Vocabulary(words) => {
                if words.contains(&value) {
                    Ok(value.to_string())
                } else {
                    Err(mismatch())
                }
            }
            Self::VocabularyOrDecimal(words) => {
                if words.contains(&value) {
                    return Ok(value.to_string());
                }
                parse_decimal(value)
                    .map(|_| canonical_decimal(value))
                    .ok_or_else(mismatch)
            }
            Self::Timespan => {
                let captures = captures(&TIMESPAN, TIMESPAN_PATTERN, value).ok_or_else(mismatch)?;
                if captures[1] >= 60 || captures[2] >= 60 {
                    return Err(mismatch());
                }
                Ok(value.to_string())
            }
            Self::TimeOfDay => {
                let captures =
                    captures(&TIME_OF_DAY, TIME_OF_DAY_PATTERN, value).ok_or_else(mismatch)?;
                if captures[0] >= 24 || captures[1] >= 60 || captures[2] >= 60 {
                    return Err(mismatch());
                }
                Ok(value.to_string())
            }
            Self::Duration => {
                if value == "P"
                    || value.ends_with('T')
                    || !matches(&DURATION, DURATION_PATTERN, value)
                {
                    return Err(mismatch());
                }
                Ok(value.to_string())
            }
            Self::Timestamp => {
                if !matches(&TIMESTAMP, TIMESTAMP_PATTERN, value) {
                    return Err(mismatch());
                }
                Ok(value.to_string())
            }
            Self::LanguageTag => {
                if !matches(&LANGUAGE, LANGUAGE_PATTERN, value) {
                    return Err(mismatch());
                }
                Ok(value.to_string())
            }
            Self::NavRequest => {
                if NAV_REQUESTS.contains(&value) || matches(&NAV_TARGET, NAV_TARGET_PATTERN, value)
                {
                    Ok(value.to_string())
                } else {
                    Err(mismatch())
                }
            }
        }
    }
}

pub const NAV_REQUESTS: &[&str] = &[
    "continue",
    "previous",
    "choice",
    "jump",
    "exit",
    "exitAll",
    "abandon",
    "abandonAll",
    "suspendAll",
    "_none_",
];

const DECIMAL_PATTERN: &str = r"^[-+]?(\d+(\.\d*)?|\.\d+)$";
const INTEGER_PATTERN: &str = r"^[-+]?\d+$";
const TIMESPAN_PATTERN: &str = r"^(\d{2,4}):(\d{2}):(\d{2})(\.\d{1,2})?$";
const TIME_OF_DAY_PATTERN: &str = r"^(\d{2}):(\d{2}):(\d{2})(\.\d{1,2})?$";
const DURATION_PATTERN: &str =
    r"^P(\d+Y)?(\d+M)?(\d+D)?(T(\d+H)?(\d+M)?(\d+(\.\d{1,2})?S)?)?$";
const TIMESTAMP_PATTERN: &str = r"^\d{4}(-(0[1-9]|1[0-2])(-(0[1-9]|[12]\d|3[01])(T([01]\d|2[0-3])(:[0-5]\d(:[0-5]\d(\.\d{1,2})?)?)?(Z|[+-]([01]\d|2[0-3])(:[0-5]\d)?)?)?)?)?$";
const LANGUAGE_PATTERN: &str = r"^([A-Za-z]{1,8}(-[A-Za-z0-9]{1,8})*)?$";
const LOCALIZED_PATTERN: &str = r"^\{lang=[A-Za-z]{1,8}(-[A-Za-z0-9]{1,8})*\}";
const NAV_TARGET_PATTERN: &str = r"^\{target=[^\s{}]+\}(choice|jump)$";

static DECIMAL: OnceLock<Option<Regex>> = OnceLock::new();
static INTEGER: OnceLock<Option<Regex>> = OnceLock::new();
static TIMESPAN: OnceLock<Option<Regex>> = OnceLock::new();
static TIME_OF_DAY: OnceLock<Option<Regex>> = OnceLock::new();
static DURATION: OnceLock<Option<Regex>> = OnceLock::new();
static TIMESTAMP: OnceLock<Option<Regex>> = OnceLock::new();
static LANGUAGE: OnceLock<Option<Regex>> = OnceLock::new();
static LOCALIZED: OnceLock<Option<Regex>> = OnceLock::new();
static NAV_TARGET: OnceLock<Option<Regex>> = OnceLock::new();

fn compiled(cell: &'static OnceLock<Option<Regex>>, pattern: &str) -> Option<&'static Regex> {
    cell.get_or_init(|| Regex::new(pattern).ok()).as_ref()
}

fn matches(cell: &'static OnceLock<Option<Regex>>, pattern: &str, value: &str) -> bool {
    compiled(cell, pattern).is_some_and(|regex| regex.is_match(value))
}

/// The first three numeric capture groups of a clock-like value.
fn captures(
    cell: &'static OnceLock<Option<Regex>>,
    pattern: &str,
    value: &str,
) -> Option<[u32; 3]> {
    let captures = compiled(cell, pattern)?.captures(value)?;
    let mut parts = [0u32; 3];
    for (slot, group) in parts.iter_mut().zip(1..=3) {
        *slot = captures.get(group)?.as_str().parse().ok()?;
    }
    Some(parts)
}

fn parse_decimal(value: &str) -> Option<f64> {
    if !matches(&DECIMAL, DECIMAL_PATTERN, value) {
        return None;
    }
    value.parse::<f64>().ok().filter(|number| number.is_finite())
}

/// Canonical text of an already validated decimal. Works on the digits so
/// no precision is lost: `+085.50` becomes `85.5`, `-0.0` becomes `0`.
pub fn canonical_decimal(value: &str) -> String {
    let (negative, unsigned) = match value.as_bytes().first() {
        Some(b'-') => (true, &value[1..]),
        Some(b'+') => (false, &value[1..]),
        _ => (false, value),
    };
    let (whole, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    let whole = whole.trim_start_matches('0');
    let fraction = fraction.trim_end_matches('0');
    if whole.is_empty() && fraction.is_empty() {
        return "0".to_string();
    }

    let mut canonical = String::with_capacity(unsigned.len() + 1);
    if negative {
        canonical.push('-');
    }
    canonical.push_str(if whole.is_empty() { "0" } else { whole });
    if !fraction.is_empty() {
        canonical.push('.');
        canonical.push_str(fraction);
    }
    canonical
}

pub fn canonical_number(number: f64) -> String {
    if number == 0.0 {
        return "0".to_string();
    }
    format!("{number}")
}

fn describe_bounds(value: &str, min: Option<f64>, max: Option<f64>) -> String {
    match (min, max) {
        (Some(min), Some(max)) => format!(
            "{value} is outside {}..={}",
            canonical_number(min),
            canonical_number(max)
        ),
        (Some(min), None) => format!("{value} is below {}", canonical_number(min)),
        (None, Some(max)) => format!("{value} is above {}", canonical_number(max)),
        (None, None) => format!("{value} is out of range"),
    }
}
