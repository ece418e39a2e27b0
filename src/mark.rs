//! Review marks: the closed set of labels a document can carry.

use std::fmt;
use std::str::FromStr;

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classification label attached to a document. Absence means "unmarked".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Mark {
    A,
    B,
}

impl Mark {
    /// Every mark, in display order.
    pub const ALL: [Mark; 2] = [Mark::A, Mark::B];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Diagnostic)]
#[error("unknown mark: \"{value}\"")]
#[diagnostic(code(docmark::mark::unknown), help("Valid marks are A and B."))]
pub struct ParseMarkError {
    pub value: String,
}

impl FromStr for Mark {
    type Err = ParseMarkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "A" | "a" => Ok(Self::A),
            "B" | "b" => Ok(Self::B),
            other => Err(ParseMarkError {
                value: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("A".parse::<Mark>().unwrap(), Mark::A);
        assert_eq!(" b ".parse::<Mark>().unwrap(), Mark::B);
        assert!("C".parse::<Mark>().is_err());
    }

    #[test]
    fn serializes_as_bare_letter() {
        assert_eq!(serde_json::to_string(&Mark::B).unwrap(), "\"B\"");
        let m: Mark = serde_json::from_str("\"A\"").unwrap();
        assert_eq!(m, Mark::A);
    }
}
