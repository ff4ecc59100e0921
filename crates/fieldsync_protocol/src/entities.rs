//! Domain entity types carried by the push protocol.
//!
//! Only the fields the sync plumbing needs to move around are modeled here;
//! the collection forms attach richer data elsewhere.

use serde::{Deserialize, Serialize};

/// Soil observations recorded for one site.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoilData {
    /// Slope steepness in percent, if recorded.
    pub slope_steepness: Option<u32>,
    /// Free-form notes from the field.
    pub notes: Option<String>,
    /// Observed depth intervals, shallowest first.
    pub depth_intervals: Vec<DepthInterval>,
}

/// A contiguous depth range and what was observed in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepthInterval {
    /// Upper bound of the interval in centimeters below the surface.
    pub start_cm: u32,
    /// Lower bound of the interval in centimeters below the surface.
    pub end_cm: u32,
    /// Observed soil texture class, if recorded.
    pub texture: Option<String>,
}

/// Site-level metadata maintained by the user.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteMetadata {
    /// The user's ratings of candidate soil matches for the site.
    pub ratings: Vec<SoilRating>,
}

/// A user's rating of one candidate soil match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoilRating {
    /// Identifier of the rated soil match.
    pub match_id: String,
    /// The user's verdict.
    pub rating: MatchRating,
}

/// A verdict on a candidate soil match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchRating {
    /// The user agrees with the match.
    Agree,
    /// The user disagrees with the match.
    Disagree,
}
