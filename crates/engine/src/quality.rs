//! Heuristic quality score for a spread opportunity.
//!
//! Combines the spread size with the thinner leg's 24h volume. Wide spreads
//! on illiquid contracts are often stale or untradeable, so volume carries
//! as much weight as the spread itself.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Points awarded once 24h volume reaches `min_volume`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeTier {
    pub min_volume: Decimal,
    pub points: Decimal,
}

impl VolumeTier {
    pub fn new(min_volume: Decimal, points: Decimal) -> Self {
        Self { min_volume, points }
    }
}

/// Tunable weights for [`QualityWeights::score`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityWeights {
    /// Points per percent of spread
    pub spread_points_per_percent: Decimal,
    /// Cap on the spread component
    pub max_spread_points: Decimal,
    /// Volume tiers; the highest tier reached counts
    pub volume_tiers: Vec<VolumeTier>,
    /// Extra points for wide spreads on liquid contracts
    pub bonus_points: Decimal,
    pub bonus_min_volume: Decimal,
    pub bonus_min_spread_percent: Decimal,
}

impl Default for QualityWeights {
    fn default() -> Self {
        Self {
            spread_points_per_percent: Decimal::new(25, 1),
            max_spread_points: Decimal::from(50),
            volume_tiers: vec![
                VolumeTier::new(Decimal::from(10_000_000), Decimal::from(50)),
                VolumeTier::new(Decimal::from(5_000_000), Decimal::from(40)),
                VolumeTier::new(Decimal::from(2_000_000), Decimal::from(30)),
                VolumeTier::new(Decimal::from(1_000_000), Decimal::from(20)),
                VolumeTier::new(Decimal::from(500_000), Decimal::from(10)),
            ],
            bonus_points: Decimal::from(10),
            bonus_min_volume: Decimal::from(2_000_000),
            bonus_min_spread_percent: Decimal::from(15),
        }
    }
}

impl QualityWeights {
    pub const MAX_SCORE: u32 = 100;

    /// Score in `0..=100`, truncated toward zero.
    pub fn score(&self, spread_percent: Decimal, volume_24h: Decimal) -> u32 {
        let spread_points = spread_percent
            .checked_mul(self.spread_points_per_percent)
            .unwrap_or(self.max_spread_points)
            .min(self.max_spread_points)
            .max(Decimal::ZERO);

        let volume_points = self
            .volume_tiers
            .iter()
            .filter(|tier| volume_24h >= tier.min_volume)
            .map(|tier| tier.points)
            .max()
            .unwrap_or(Decimal::ZERO);

        let bonus = if volume_24h >= self.bonus_min_volume
            && spread_percent >= self.bonus_min_spread_percent
        {
            self.bonus_points
        } else {
            Decimal::ZERO
        };

        let total = spread_points
            .checked_add(volume_points)
            .and_then(|t| t.checked_add(bonus))
            .map(|t| t.trunc().to_u32().unwrap_or(if t > Decimal::ZERO { u32::MAX } else { 0 }))
            .unwrap_or(Self::MAX_SCORE);
        total.min(Self::MAX_SCORE)
    }
}
