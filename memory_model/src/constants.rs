//! Scoring constants shared across the graph engine.

/// Lowest relevance a node keeps after exponential decay or a boost.
pub const MIN_RELEVANCE: f64 = 0.01;

/// Relevance added to an existing node when an insert is recognised as its duplicate.
pub const DEDUP_BOOST: f64 = 0.1;

/// Relevance added on every explicit access.
pub const REINFORCE_BOOST: f64 = 0.15;

/// Strength added when an identical edge is linked again.
pub const EDGE_STRENGTH_INCREMENT: f64 = 0.5;

/// Upper bound for edge strength.
pub const MAX_EDGE_STRENGTH: f64 = 10.0;

/// Strength given to a freshly created edge.
pub const DEFAULT_EDGE_STRENGTH: f64 = 1.0;

/// Relevance given to a freshly created node.
pub const DEFAULT_RELEVANCE: f64 = 1.0;

/// Confidence used when none is supplied, including on snapshot load.
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Clamp a score into `[min, max]`. NaN maps to `min`.
pub fn clamp_score(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        min
    } else {
        value.clamp(min, max)
    }
}
