//! Stop-loss / take-profit levels from entry price and ATR.

use crate::config::LevelMultipliers;
use crate::domain::{Bias, PriceLevels};
use crate::indicators::Reading;

/// Levels for a directional bias with a finite, positive ATR; `None`
/// otherwise.
///
/// BUY: stop below entry, targets above. SELL mirrors it.
pub fn compute_levels(
    bias: Bias,
    entry: f64,
    atr: Reading,
    multipliers: &LevelMultipliers,
) -> Option<PriceLevels> {
    let sign = match bias {
        Bias::Buy => 1.0,
        Bias::Sell => -1.0,
        Bias::Hold => return None,
    };
    let atr = atr.value().filter(|v| v.is_finite() && *v > 0.0)?;
    if !entry.is_finite() {
        return None;
    }

    Some(PriceLevels {
        entry,
        stop_loss: entry - sign * multipliers.stop_loss * atr,
        take_profit_1: entry + sign * multipliers.take_profit_1 * atr,
        take_profit_2: entry + sign * multipliers.take_profit_2 * atr,
    })
}
