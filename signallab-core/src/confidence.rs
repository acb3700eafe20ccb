//! Confidence scoring: six named agreement predicates aggregated into 0..=10.
//!
//! A predicate is `Excluded` when any reading it needs is unavailable, and
//! every trend-directional predicate is `Excluded` when the trend is
//! sideways. Excluded predicates leave both numerator and denominator.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::battery::IndicatorSnapshot;
use crate::config::ScoringThresholds;
use crate::regime::{RegimeLabels, Trend, VolumeFlow};

/// Bounded confidence, always in `0..=10`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct ConfidenceScore(u8);

impl ConfidenceScore {
    pub const MAX: u8 = 10;

    /// Clamps to `MAX`.
    pub fn new(value: u8) -> Self {
        Self(value.min(Self::MAX))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for ConfidenceScore {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if value > Self::MAX {
            Err(format!("confidence {value} exceeds {}", Self::MAX))
        } else {
            Ok(Self(value))
        }
    }
}

impl From<ConfidenceScore> for u8 {
    fn from(score: ConfidenceScore) -> Self {
        score.0
    }
}

impl fmt::Display for ConfidenceScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.0, Self::MAX)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredicateId {
    AdxConfirmsTrend,
    RsiHealthy,
    MacdConfirmsTrend,
    StochasticConfirms,
    CciConfirms,
    VolumeConfirms,
}

impl PredicateId {
    pub const ALL: [PredicateId; 6] = [
        PredicateId::AdxConfirmsTrend,
        PredicateId::RsiHealthy,
        PredicateId::MacdConfirmsTrend,
        PredicateId::StochasticConfirms,
        PredicateId::CciConfirms,
        PredicateId::VolumeConfirms,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PredicateId::AdxConfirmsTrend => "adx_confirms_trend",
            PredicateId::RsiHealthy => "rsi_healthy",
            PredicateId::MacdConfirmsTrend => "macd_confirms_trend",
            PredicateId::StochasticConfirms => "stochastic_confirms",
            PredicateId::CciConfirms => "cci_confirms",
            PredicateId::VolumeConfirms => "volume_confirms",
        }
    }

    /// Directional predicates read the trend and are excluded when sideways.
    pub fn is_directional(self) -> bool {
        !matches!(self, PredicateId::RsiHealthy)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Agree,
    Disagree,
    Excluded,
}

impl Verdict {
    fn from_bool(agree: bool) -> Self {
        if agree {
            Verdict::Agree
        } else {
            Verdict::Disagree
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredicateOutcome {
    pub id: PredicateId,
    pub verdict: Verdict,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfidenceBreakdown {
    pub outcomes: Vec<PredicateOutcome>,
    pub agree: usize,
    pub evaluable: usize,
    pub score: ConfidenceScore,
}

impl ConfidenceBreakdown {
    pub fn verdict(&self, id: PredicateId) -> Option<Verdict> {
        self.outcomes
            .iter()
            .find(|o| o.id == id)
            .map(|o| o.verdict)
    }
}

/// `round_half_up(10 * agree / evaluable)`, computed in integers.
/// No evaluable predicates gives 0.
pub fn aggregate(agree: usize, evaluable: usize) -> ConfidenceScore {
    if evaluable == 0 {
        return ConfidenceScore::new(0);
    }
    let agree = agree.min(evaluable);
    let rounded = (20 * agree + evaluable) / (2 * evaluable);
    ConfidenceScore::new(rounded.min(ConfidenceScore::MAX as usize) as u8)
}

fn evaluate(
    id: PredicateId,
    snapshot: &IndicatorSnapshot,
    regime: &RegimeLabels,
    t: &ScoringThresholds,
) -> Verdict {
    let trend = regime.trend;
    if id.is_directional() && trend == Trend::Sideways {
        return Verdict::Excluded;
    }
    let bullish = trend == Trend::Bullish;

    let agree = match id {
        PredicateId::AdxConfirmsTrend => snapshot.adx.adx.value().map(|adx| adx >= t.adx_strong),
        PredicateId::RsiHealthy => snapshot
            .rsi
            .value()
            .map(|rsi| t.rsi_lower < rsi && rsi < t.rsi_upper),
        PredicateId::MacdConfirmsTrend => snapshot
            .macd
            .line
            .value()
            .zip(snapshot.macd.signal.value())
            .map(|(line, signal)| if bullish { line > signal } else { line < signal }),
        PredicateId::StochasticConfirms => snapshot
            .stochastic
            .k
            .value()
            .zip(snapshot.stochastic.d.value())
            .map(|(k, d)| {
                let crossed = if bullish { k > d } else { k < d };
                crossed && (t.stochastic_lower..=t.stochastic_upper).contains(&k)
            }),
        PredicateId::CciConfirms => snapshot
            .cci
            .value()
            .map(|cci| if bullish { cci > 0.0 } else { cci < 0.0 }),
        PredicateId::VolumeConfirms => match regime.volume_flow {
            VolumeFlow::Unavailable => None,
            VolumeFlow::Positive => Some(bullish),
            VolumeFlow::Negative => Some(!bullish),
        },
    };

    agree.map_or(Verdict::Excluded, Verdict::from_bool)
}

/// Evaluate all predicates and aggregate.
pub fn score(
    snapshot: &IndicatorSnapshot,
    regime: &RegimeLabels,
    thresholds: &ScoringThresholds,
) -> ConfidenceBreakdown {
    let outcomes: Vec<PredicateOutcome> = PredicateId::ALL
        .into_iter()
        .map(|id| PredicateOutcome {
            id,
            verdict: evaluate(id, snapshot, regime, thresholds),
        })
        .collect();

    let agree = outcomes.iter().filter(|o| o.verdict == Verdict::Agree).count();
    let evaluable = outcomes
        .iter()
        .filter(|o| o.verdict != Verdict::Excluded)
        .count();

    ConfidenceBreakdown {
        score: aggregate(agree, evaluable),
        outcomes,
        agree,
        evaluable,
    }
}
