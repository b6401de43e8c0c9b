use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;

/// Protocol variant a content package was authored against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScormVersion {
    /// SCORM 1.2, the legacy `LMS*` API.
    Scorm12,
    /// SCORM 2004 (any edition), the `API_1484_11` API.
    Scorm2004,
}

impl ScormVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scorm12 => "scorm12",
            Self::Scorm2004 => "scorm2004",
        }
    }

    /// Name content looks for while walking up its browsing contexts.
    pub fn api_name(&self) -> &'static str {
        match self {
            Self::Scorm12 => "API",
            Self::Scorm2004 => "API_1484_11",
        }
    }
}

impl Display for ScormVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScormVersion {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "scorm12" | "scorm_12" | "1.2" => Ok(Self::Scorm12),
            "scorm2004" | "scorm_2004" | "2004" => Ok(Self::Scorm2004),
            other => Err(format!("unknown SCORM version '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_str_accepts_short_forms() {
        assert_eq!("1.2".parse::<ScormVersion>(), Ok(ScormVersion::Scorm12));
        assert_eq!("SCORM2004".parse::<ScormVersion>(), Ok(ScormVersion::Scorm2004));
        assert!("scorm3".parse::<ScormVersion>().is_err());
    }

    #[test]
    fn api_name_matches_discovery_names() {
        assert_eq!(ScormVersion::Scorm12.api_name(), "API");
        assert_eq!(ScormVersion::Scorm2004.api_name(), "API_1484_11");
    }
}
