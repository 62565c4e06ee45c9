//! The closed set of competitions that accept entries.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::DomainError;

/// Competition a pair may enter.
///
/// The set is closed: adding a competition is a compile-time-visible change,
/// and the entry fee for each is fixed at entry creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompetitionEvent {
    Kent,
    Essex,
}

impl CompetitionEvent {
    /// Canonical wire/storage name.
    pub fn as_str(&self) -> &'static str {
        match self {
            CompetitionEvent::Kent => "KENT",
            CompetitionEvent::Essex => "ESSEX",
        }
    }

    /// Human-readable competition title, used on checkout line items.
    pub fn display_name(&self) -> &'static str {
        match self {
            CompetitionEvent::Kent => "Kent Nines",
            CompetitionEvent::Essex => "Essex Nines",
        }
    }

    /// URL slug for redirect targets on the public site.
    pub fn slug(&self) -> &'static str {
        match self {
            CompetitionEvent::Kent => "kent-nines",
            CompetitionEvent::Essex => "essex-nines",
        }
    }
}

impl fmt::Display for CompetitionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompetitionEvent {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "KENT" => Ok(CompetitionEvent::Kent),
            "ESSEX" => Ok(CompetitionEvent::Essex),
            other => Err(DomainError::UnknownEvent(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_events() {
        assert_eq!("KENT".parse::<CompetitionEvent>().unwrap(), CompetitionEvent::Kent);
        assert_eq!("ESSEX".parse::<CompetitionEvent>().unwrap(), CompetitionEvent::Essex);
    }

    #[test]
    fn unknown_event_fails_to_parse() {
        let err = "SURREY".parse::<CompetitionEvent>().unwrap_err();
        assert!(matches!(err, DomainError::UnknownEvent(ref s) if s == "SURREY"));
    }

    #[test]
    fn parse_is_case_sensitive() {
        assert!("kent".parse::<CompetitionEvent>().is_err());
    }

    #[test]
    fn as_str_roundtrips() {
        for event in [CompetitionEvent::Kent, CompetitionEvent::Essex] {
            assert_eq!(event.as_str().parse::<CompetitionEvent>().unwrap(), event);
        }
    }

    #[test]
    fn serde_uses_screaming_case() {
        let json = serde_json::to_string(&CompetitionEvent::Kent).unwrap();
        assert_eq!(json, r#""KENT""#);
        let back: CompetitionEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, CompetitionEvent::Kent);
    }
}
