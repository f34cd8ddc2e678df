//! The two interchangeable execution engines.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An execution backend a unit of work can run against.
///
/// The set is closed: exactly two engines exist, and each one is the
/// other's alternate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    Playwright,
    Selenium,
}

impl Engine {
    /// All engines, in declaration order.
    pub const ALL: [Engine; 2] = [Engine::Playwright, Engine::Selenium];

    /// The engine to fall back to when this one fails.
    pub fn alternate(self) -> Engine {
        match self {
            Engine::Playwright => Engine::Selenium,
            Engine::Selenium => Engine::Playwright,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Engine::Playwright => "playwright",
            Engine::Selenium => "selenium",
        }
    }

    /// What this engine is good at. Fed to the AI advisor's prompt.
    pub fn strengths(self) -> &'static str {
        match self {
            Engine::Playwright => {
                "modern single-page apps, auto-waiting, network interception, \
                 fast headless execution, multi-tab and iframe handling"
            }
            Engine::Selenium => {
                "legacy applications, broad real-browser coverage, grid and \
                 remote-driver infrastructure, enterprise SSO flows"
            }
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Engine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "playwright" => Ok(Engine::Playwright),
            "selenium" => Ok(Engine::Selenium),
            other => Err(format!("unknown engine '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alternate_is_an_involution() {
        for engine in Engine::ALL {
            assert_ne!(engine.alternate(), engine);
            assert_eq!(engine.alternate().alternate(), engine);
        }
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("Playwright".parse::<Engine>().unwrap(), Engine::Playwright);
        assert_eq!(" SELENIUM ".parse::<Engine>().unwrap(), Engine::Selenium);
        assert!("cypress".parse::<Engine>().is_err());
    }

    #[test]
    fn serializes_lowercase() {
        let json = serde_json::to_string(&Engine::Selenium).unwrap();
        assert_eq!(json, "\"selenium\"");
    }
}
