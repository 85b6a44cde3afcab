//! Read projection levels.
//!
//! # Invariants
//! - Levels are totally ordered: `NONE < SUMMARY < DETAILS < DEEP`.
//! - Parsing is exact and case-sensitive.
//! - Projections are request-scoped and never persisted.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

/// Requested depth of related-data inclusion for a read.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Projection {
    None,
    Summary,
    Details,
    Deep,
}

/// Serialization field group selected by a projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum View {
    Summary,
    Detail,
}

/// Unknown projection name. Boundary callers map this to a bad request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown projection `{0}`; expected NONE|SUMMARY|DETAILS|DEEP")]
pub struct ProjectionParseError(pub String);

impl Projection {
    /// Lowest level at which lookup values are fetched.
    pub const ATTRIBUTE_THRESHOLD: Projection = Projection::Details;

    pub fn is_at_least(self, other: Projection) -> bool {
        self >= other
    }

    /// Whether reads at this level fetch lookup values.
    pub fn includes_attributes(self) -> bool {
        self.is_at_least(Self::ATTRIBUTE_THRESHOLD)
    }

    pub fn view(self) -> View {
        if self.includes_attributes() {
            View::Detail
        } else {
            View::Summary
        }
    }

    /// Whether fields of the given group are serialized at this level.
    pub fn includes(self, view: View) -> bool {
        view <= self.view()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Summary => "SUMMARY",
            Self::Details => "DETAILS",
            Self::Deep => "DEEP",
        }
    }

    /// Resolves an optional query value, falling back to the operation default.
    pub fn from_query(
        value: Option<&str>,
        default: Projection,
    ) -> Result<Projection, ProjectionParseError> {
        value.map_or(Ok(default), str::parse::<Projection>)
    }
}

impl FromStr for Projection {
    type Err = ProjectionParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "NONE" => Ok(Self::None),
            "SUMMARY" => Ok(Self::Summary),
            "DETAILS" => Ok(Self::Details),
            "DEEP" => Ok(Self::Deep),
            other => Err(ProjectionParseError(other.to_string())),
        }
    }
}

impl Display for Projection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
