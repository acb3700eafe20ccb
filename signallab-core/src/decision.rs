//! Decision gate: regime + confidence + threshold → bias.

use crate::confidence::ConfidenceBreakdown;
use crate::domain::Bias;
use crate::regime::Trend;

/// Directional candidate implied by the trend alone.
pub fn candidate(trend: Trend) -> Bias {
    match trend {
        Trend::Bullish => Bias::Buy,
        Trend::Bearish => Bias::Sell,
        Trend::Sideways => Bias::Hold,
    }
}

/// The candidate survives only when something was evaluable and the score
/// reaches `threshold`; otherwise HOLD.
pub fn decide(trend: Trend, breakdown: &ConfidenceBreakdown, threshold: u8) -> Bias {
    if breakdown.evaluable == 0 || breakdown.score.value() < threshold {
        return Bias::Hold;
    }
    candidate(trend)
}
