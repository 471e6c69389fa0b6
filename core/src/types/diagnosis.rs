use std::fmt;

/// Categorical outcome of a screening
///
/// Serialized as the literal strings `NORMAL` and `PNEUMONIA`, which are also
/// the values stored by the record store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Diagnosis {
    Normal,
    Pneumonia,
}

impl Diagnosis {
    /// Both labels in display order
    pub const ALL: [Diagnosis; 2] = [Diagnosis::Normal, Diagnosis::Pneumonia];

    /// Returns the wire/storage label
    pub fn as_str(&self) -> &'static str {
        match self {
            Diagnosis::Normal => "NORMAL",
            Diagnosis::Pneumonia => "PNEUMONIA",
        }
    }

    /// Parses a diagnosis label
    ///
    /// Matching is case-insensitive and ignores surrounding whitespace.
    /// Returns `None` for anything other than the two labels.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "NORMAL" => Some(Diagnosis::Normal),
            "PNEUMONIA" => Some(Diagnosis::Pneumonia),
            _ => None,
        }
    }
}

impl fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels() {
        assert_eq!(Diagnosis::Normal.as_str(), "NORMAL");
        assert_eq!(Diagnosis::Pneumonia.to_string(), "PNEUMONIA");
    }

    #[test]
    fn test_from_str() {
        assert_eq!(Diagnosis::from_str("NORMAL"), Some(Diagnosis::Normal));
        assert_eq!(Diagnosis::from_str(" pneumonia "), Some(Diagnosis::Pneumonia));
        assert_eq!(Diagnosis::from_str("All"), None);
        assert_eq!(Diagnosis::from_str(""), None);
    }

    #[test]
    fn test_serde_literals() {
        let json = serde_json::to_string(&Diagnosis::Pneumonia).unwrap();
        assert_eq!(json, "\"PNEUMONIA\"");
        let parsed: Diagnosis = serde_json::from_str("\"NORMAL\"").unwrap();
        assert_eq!(parsed, Diagnosis::Normal);
        assert!(serde_json::from_str::<Diagnosis>("\"normal\"").is_err());
    }
}
