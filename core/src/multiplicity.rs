//! Multiplicity bounds for association ends.
//!
//! Accepted forms: `N`, `N..M`, `N..*` and `*` (same as `0..*`).

use crate::{ModelError, ModelResult};
use regex_lite::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

const MULTIPLICITY_PATTERN: &str = r"^\s*(?:(\*)|(\d+)(?:\s*\.\.\s*(\d+|\*))?)\s*$";

fn multiplicity_regex() -> ModelResult<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(MULTIPLICITY_PATTERN).ok())
        .as_ref()
        .ok_or_else(|| ModelError::multiplicity("multiplicity pattern failed to compile"))
}

/// Lower/upper bound on the number of links at one association end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Multiplicity {
    /// Minimum number of links.
    pub lower: u32,
    /// Maximum number of links, `None` means unbounded.
    pub upper: Option<u32>,
}

impl Default for Multiplicity {
    fn default() -> Self {
        Self::exactly(1)
    }
}

impl Multiplicity {
    /// Exactly `n` links.
    pub fn exactly(n: u32) -> Self {
        Self {
            lower: n,
            upper: Some(n),
        }
    }

    /// Between `lower` and `upper` links. Fails if `upper < lower`.
    pub fn range(lower: u32, upper: u32) -> ModelResult<Self> {
        if upper < lower {
            return Err(ModelError::multiplicity(format!(
                "upper bound {} is below lower bound {}",
                upper, lower
            )));
        }
        Ok(Self {
            lower,
            upper: Some(upper),
        })
    }

    /// At least `lower` links, no upper bound.
    pub fn at_least(lower: u32) -> Self {
        Self { lower, upper: None }
    }

    /// `*`: any number of links.
    pub fn many() -> Self {
        Self::at_least(0)
    }

    /// Parse a multiplicity string.
    pub fn parse(spec: &str) -> ModelResult<Self> {
        let invalid = || ModelError::multiplicity(format!("malformed multiplicity '{}'", spec));
        let caps = multiplicity_regex()?.captures(spec).ok_or_else(invalid)?;

        if caps.get(1).is_some() {
            return Ok(Self::many());
        }

        let lower: u32 = caps
            .get(2)
            .ok_or_else(invalid)?
            .as_str()
            .parse()
            .map_err(|_| invalid())?;

        match caps.get(3).map(|m| m.as_str()) {
            None => Ok(Self::exactly(lower)),
            Some("*") => Ok(Self::at_least(lower)),
            Some(upper) => {
                let upper: u32 = upper.parse().map_err(|_| invalid())?;
                Self::range(lower, upper)
            }
        }
    }

    /// Returns true if `count` lies within both bounds.
    pub fn allows(&self, count: usize) -> bool {
        !self.below_lower(count) && !self.exceeds_upper(count)
    }

    /// Returns true if `count` is above the upper bound.
    pub fn exceeds_upper(&self, count: usize) -> bool {
        match self.upper {
            Some(upper) => count > upper as usize,
            None => false,
        }
    }

    /// Returns true if `count` is below the lower bound.
    pub fn below_lower(&self, count: usize) -> bool {
        count < self.lower as usize
    }

    /// Returns true if the upper bound is `*`.
    pub fn is_unbounded(&self) -> bool {
        self.upper.is_none()
    }
}

impl FromStr for Multiplicity {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Multiplicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upper {
            None if self.lower == 0 => write!(f, "*"),
            None => write!(f, "{}..*", self.lower),
            Some(upper) if upper == self.lower => write!(f, "{}", upper),
            Some(upper) => write!(f, "{}..{}", self.lower, upper),
        }
    }
}
