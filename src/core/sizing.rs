//! Practical Bet Sizing
//!
//! Turns a raw Kelly recommendation into a real-world stake by applying a
//! strict cap chain (expected value, minimum edge, bankroll percentage,
//! absolute maximum, table minimum, rounding), then rebalances a batch of
//! simultaneous bets against a total exposure ceiling.
//!
//! The cap chain is evaluated strictly in order and the reported
//! [`CapReason`] is whichever cap bound last.

use serde::{Deserialize, Serialize};

use super::kelly::{KellyFraction, KellyOutput};

/// Why a bet was capped, reduced, or zeroed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapReason {
    MaxPercent,
    MaxAmount,
    MinAmount,
    NegativeEv,
    BelowEdge,
}

/// Bet sizing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SizingConfig {
    /// Fractional-Kelly strategy applied to the full Kelly fraction
    pub kelly_fraction: KellyFraction,
    /// Maximum single bet as a percent of bankroll
    pub max_bet_percent: f64,
    /// Table minimum; bets below this are raised or zeroed
    pub min_bet_amount: f64,
    /// Absolute single-bet ceiling
    pub max_bet_amount: f64,
    /// Stakes are rounded down to a multiple of this
    pub rounding_increment: f64,
    /// Edges thinner than this percentage are not worth the takeout
    pub min_edge_percent: f64,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            kelly_fraction: KellyFraction::Quarter,
            max_bet_percent: 5.0,
            min_bet_amount: 2.0,
            max_bet_amount: 500.0,
            rounding_increment: 1.0,
            min_edge_percent: 5.0,
        }
    }
}

/// Structured validation result for [`SizingConfig`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValidation {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

/// A single sized bet. Immutable once computed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SizedBet {
    /// Bankroll * full Kelly * strategy multiplier, before any cap
    pub raw_kelly_bet: f64,
    /// After percent/amount caps, before minimum and rounding
    pub capped_bet: f64,
    pub final_bet: f64,
    pub was_cap_applied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cap_reason: Option<CapReason>,
    /// Effective fraction of bankroll the sizing used
    pub kelly_fraction_used: f64,
    pub effective_bet_percent: f64,
}

/// A sized bet after the simultaneous-bet rebalancing pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjustedBet {
    #[serde(flatten)]
    pub bet: SizedBet,
    pub original_bet: f64,
    pub reduction_percent: f64,
    pub bet_index: usize,
}

/// Validate a sizing configuration, collecting every violation
pub fn validate_sizing_config(config: &SizingConfig) -> ConfigValidation {
    let mut errors = Vec::new();

    if !(0.0..=100.0).contains(&config.max_bet_percent) {
        errors.push(format!(
            "max_bet_percent must be within 0-100, got {}",
            config.max_bet_percent
        ));
    }
    if config.min_bet_amount < 0.0 {
        errors.push(format!(
            "min_bet_amount must be non-negative, got {}",
            config.min_bet_amount
        ));
    }
    if config.max_bet_amount < config.min_bet_amount {
        errors.push(format!(
            "max_bet_amount {} is below min_bet_amount {}",
            config.max_bet_amount, config.min_bet_amount
        ));
    }
    if config.rounding_increment <= 0.0 {
        errors.push(format!(
            "rounding_increment must be positive, got {}",
            config.rounding_increment
        ));
    }
    if config.min_edge_percent < 0.0 {
        errors.push(format!(
            "min_edge_percent must be non-negative, got {}",
            config.min_edge_percent
        ));
    }

    ConfigValidation {
        is_valid: errors.is_empty(),
        errors,
    }
}

/// Bankroll-tiered default configuration
///
/// Small bankrolls bet a larger share of themselves (a $2 minimum forces
/// that anyway); large bankrolls tighten the percentage cap and round to
/// larger increments.
pub fn default_config_for_bankroll(bankroll: f64) -> SizingConfig {
    if bankroll < 500.0 {
        SizingConfig {
            max_bet_percent: 8.0,
            max_bet_amount: 50.0,
            ..SizingConfig::default()
        }
    } else if bankroll < 2_000.0 {
        SizingConfig::default()
    } else if bankroll < 10_000.0 {
        SizingConfig {
            max_bet_percent: 4.0,
            max_bet_amount: 1_000.0,
            rounding_increment: 5.0,
            ..SizingConfig::default()
        }
    } else {
        SizingConfig {
            max_bet_percent: 3.0,
            max_bet_amount: 2_500.0,
            rounding_increment: 10.0,
            ..SizingConfig::default()
        }
    }
}

/// Size a single bet from a Kelly recommendation
///
/// Cap chain, in order: negative EV zeroes the bet; edge below the
/// configured minimum zeroes the bet; the raw Kelly stake is capped at
/// `max_bet_percent` of bankroll, then at `max_bet_amount`; a surviving bet
/// below `min_bet_amount` is raised to the minimum unless the bankroll
/// cannot cover it; the result is rounded down to the increment.
pub fn size_bet(kelly: &KellyOutput, bankroll: f64, config: &SizingConfig) -> SizedBet {
    let multiplier = config.kelly_fraction.multiplier();
    let fraction_used = kelly.full_kelly_fraction * multiplier;

    if !kelly.is_positive_ev {
        return zero_bet(fraction_used, CapReason::NegativeEv);
    }
    if kelly.edge_percent < config.min_edge_percent {
        return zero_bet(fraction_used, CapReason::BelowEdge);
    }

    let raw = bankroll * fraction_used;
    let mut bet = raw;
    let mut cap_reason = None;

    let percent_cap = bankroll * config.max_bet_percent / 100.0;
    if bet > percent_cap {
        bet = percent_cap;
        cap_reason = Some(CapReason::MaxPercent);
    }
    if bet > config.max_bet_amount {
        bet = config.max_bet_amount;
        cap_reason = Some(CapReason::MaxAmount);
    }
    let capped = bet;

    if bet > 0.0 && bet < config.min_bet_amount {
        if bankroll >= config.min_bet_amount {
            bet = config.min_bet_amount;
        } else {
            bet = 0.0;
        }
        cap_reason = Some(CapReason::MinAmount);
    }

    let final_bet = round_down(bet, config.rounding_increment);

    SizedBet {
        raw_kelly_bet: raw,
        capped_bet: capped,
        final_bet,
        was_cap_applied: cap_reason.is_some(),
        cap_reason,
        kelly_fraction_used: fraction_used,
        effective_bet_percent: if bankroll > 0.0 {
            final_bet / bankroll * 100.0
        } else {
            0.0
        },
    }
}

/// Rebalance a batch of simultaneous bets against a total exposure ceiling
///
/// Whole-list, atomic pass: if the active total already fits within
/// `bankroll * max_total_exposure_fraction`, every bet comes back unchanged.
/// Otherwise one proportional factor is applied uniformly to every active
/// bet, and reduced stakes are rounded down to whole units so the adjusted
/// total can never exceed the ceiling.
pub fn adjust_for_simultaneous_bets(
    bets: &[SizedBet],
    bankroll: f64,
    max_total_exposure_fraction: f64,
) -> Vec<AdjustedBet> {
    let total = total_exposure(bets);
    let allowed = bankroll * max_total_exposure_fraction;

    if total <= allowed || total <= 0.0 {
        return bets
            .iter()
            .cloned()
            .enumerate()
            .map(|(i, bet)| AdjustedBet {
                original_bet: bet.final_bet,
                reduction_percent: 0.0,
                bet_index: i,
                bet,
            })
            .collect();
    }

    let factor = allowed / total;
    bets.iter()
        .cloned()
        .enumerate()
        .map(|(i, mut bet)| {
            let original = bet.final_bet;
            if original > 0.0 {
                bet.final_bet = round_down(original * factor, 1.0);
                bet.effective_bet_percent = if bankroll > 0.0 {
                    bet.final_bet / bankroll * 100.0
                } else {
                    0.0
                };
            }
            AdjustedBet {
                original_bet: original,
                reduction_percent: if original > 0.0 {
                    (1.0 - factor) * 100.0
                } else {
                    0.0
                },
                bet_index: i,
                bet,
            }
        })
        .collect()
}

/// Sum of all active (> 0) final bets
pub fn total_exposure(bets: &[SizedBet]) -> f64 {
    bets.iter()
        .map(|b| b.final_bet)
        .filter(|&amount| amount > 0.0)
        .sum()
}

/// Active exposure as a percent of bankroll
pub fn exposure_percent(bets: &[SizedBet], bankroll: f64) -> f64 {
    if bankroll > 0.0 {
        total_exposure(bets) / bankroll * 100.0
    } else {
        0.0
    }
}

fn zero_bet(fraction_used: f64, reason: CapReason) -> SizedBet {
    SizedBet {
        raw_kelly_bet: 0.0,
        capped_bet: 0.0,
        final_bet: 0.0,
        was_cap_applied: true,
        cap_reason: Some(reason),
        kelly_fraction_used: fraction_used,
        effective_bet_percent: 0.0,
    }
}

fn round_down(amount: f64, increment: f64) -> f64 {
    if increment <= 0.0 {
        return amount;
    }
    (amount / increment).floor() * increment
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::kelly::calculate_kelly;

    fn positive_kelly() -> KellyOutput {
        // full = 0.10, edge = 50%
        calculate_kelly(0.25, 6.0, 1_000.0)
    }

    #[test]
    fn test_negative_ev_zeroes_any_config() {
        let kelly = calculate_kelly(0.10, 5.0, 1_000.0);
        for config in [
            SizingConfig::default(),
            default_config_for_bankroll(100.0),
            default_config_for_bankroll(50_000.0),
        ] {
            let bet = size_bet(&kelly, 1_000.0, &config);
            assert_eq!(bet.final_bet, 0.0);
            assert_eq!(bet.cap_reason, Some(CapReason::NegativeEv));
        }
    }

    #[test]
    fn test_below_edge_zeroes() {
        let kelly = calculate_kelly(0.22, 5.0, 1_000.0); // edge = 10%
        let config = SizingConfig {
            min_edge_percent: 15.0,
            ..SizingConfig::default()
        };
        let bet = size_bet(&kelly, 1_000.0, &config);
        assert_eq!(bet.final_bet, 0.0);
        assert_eq!(bet.cap_reason, Some(CapReason::BelowEdge));
    }

    #[test]
    fn test_uncapped_quarter_kelly() {
        // raw = 1000 * 0.10 * 0.25 = 25, under the 5% cap of 50
        let bet = size_bet(&positive_kelly(), 1_000.0, &SizingConfig::default());
        assert_eq!(bet.final_bet, 25.0);
        assert!(!bet.was_cap_applied);
        assert!(bet.cap_reason.is_none());
        assert!((bet.effective_bet_percent - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_percent_cap_binds() {
        let config = SizingConfig {
            kelly_fraction: KellyFraction::Full,
            ..SizingConfig::default()
        };
        // raw = 1000 * 0.10 = 100, percent cap = 50
        let bet = size_bet(&positive_kelly(), 1_000.0, &config);
        assert_eq!(bet.final_bet, 50.0);
        assert_eq!(bet.cap_reason, Some(CapReason::MaxPercent));
    }

    #[test]
    fn test_amount_cap_binds_last() {
        let config = SizingConfig {
            kelly_fraction: KellyFraction::Full,
            max_bet_percent: 10.0,
            max_bet_amount: 60.0,
            ..SizingConfig::default()
        };
        // raw = 100 -> percent cap 100 (no bind) ... raw equals cap; amount cap 60 binds
        let bet = size_bet(&positive_kelly(), 1_000.0, &config);
        assert_eq!(bet.final_bet, 60.0);
        assert_eq!(bet.cap_reason, Some(CapReason::MaxAmount));
    }

    #[test]
    fn test_minimum_raise() {
        let kelly = calculate_kelly(0.25, 6.0, 60.0);
        let config = SizingConfig {
            min_bet_amount: 2.0,
            ..SizingConfig::default()
        };
        // raw = 60 * 0.10 * 0.25 = 1.5, below the $2 minimum, bankroll covers it
        let bet = size_bet(&kelly, 60.0, &config);
        assert_eq!(bet.final_bet, 2.0);
        assert_eq!(bet.cap_reason, Some(CapReason::MinAmount));
    }

    #[test]
    fn test_minimum_unaffordable_zeroes() {
        let kelly = positive_kelly();
        let config = SizingConfig {
            min_bet_amount: 5.0,
            ..SizingConfig::default()
        };
        let bet = size_bet(&kelly, 1.0, &config);
        assert_eq!(bet.final_bet, 0.0);
        assert_eq!(bet.cap_reason, Some(CapReason::MinAmount));
    }

    #[test]
    fn test_rounding_increment() {
        let config = SizingConfig {
            rounding_increment: 10.0,
            ..SizingConfig::default()
        };
        // raw = 25 rounds down to 20
        let bet = size_bet(&positive_kelly(), 1_000.0, &config);
        assert_eq!(bet.final_bet, 20.0);
    }

    #[test]
    fn test_adjust_within_budget_unchanged() {
        let kelly = positive_kelly();
        let config = SizingConfig::default();
        let bets: Vec<SizedBet> = (0..3).map(|_| size_bet(&kelly, 1_000.0, &config)).collect();
        // 3 * 25 = 75, within 25% of 1000
        let adjusted = adjust_for_simultaneous_bets(&bets, 1_000.0, 0.25);
        for (i, adj) in adjusted.iter().enumerate() {
            assert_eq!(adj.bet.final_bet, adj.original_bet);
            assert_eq!(adj.reduction_percent, 0.0);
            assert_eq!(adj.bet_index, i);
        }
    }

    #[test]
    fn test_adjust_over_budget_scales_uniformly() {
        let kelly = positive_kelly();
        let config = SizingConfig::default();
        let bets: Vec<SizedBet> = (0..6).map(|_| size_bet(&kelly, 1_000.0, &config)).collect();
        // 6 * 25 = 150 against an allowed 100
        let adjusted = adjust_for_simultaneous_bets(&bets, 1_000.0, 0.10);
        let total: f64 = adjusted.iter().map(|a| a.bet.final_bet).sum();
        assert!(total <= 100.0 + 1.0);
        // Uniform reduction: every active bet shrinks by the same percent
        let first = adjusted[0].reduction_percent;
        assert!(first > 0.0);
        assert!(adjusted
            .iter()
            .all(|a| (a.reduction_percent - first).abs() < 1e-9));
    }

    #[test]
    fn test_adjust_skips_inactive_bets() {
        let kelly = positive_kelly();
        let config = SizingConfig::default();
        let mut bets: Vec<SizedBet> = (0..6).map(|_| size_bet(&kelly, 1_000.0, &config)).collect();
        let dead = size_bet(&calculate_kelly(0.10, 5.0, 1_000.0), 1_000.0, &config);
        bets.push(dead);

        let adjusted = adjust_for_simultaneous_bets(&bets, 1_000.0, 0.10);
        let zeroed = &adjusted[6];
        assert_eq!(zeroed.bet.final_bet, 0.0);
        assert_eq!(zeroed.reduction_percent, 0.0);
    }

    #[test]
    fn test_exposure_helpers() {
        let kelly = positive_kelly();
        let config = SizingConfig::default();
        let bets: Vec<SizedBet> = (0..4).map(|_| size_bet(&kelly, 1_000.0, &config)).collect();
        assert_eq!(total_exposure(&bets), 100.0);
        assert!((exposure_percent(&bets, 1_000.0) - 10.0).abs() < 1e-9);
        assert_eq!(exposure_percent(&bets, 0.0), 0.0);
    }

    #[test]
    fn test_validate_config() {
        assert!(validate_sizing_config(&SizingConfig::default()).is_valid);

        let bad = SizingConfig {
            max_bet_percent: 150.0,
            min_bet_amount: -1.0,
            rounding_increment: 0.0,
            ..SizingConfig::default()
        };
        let v = validate_sizing_config(&bad);
        assert!(!v.is_valid);
        assert!(v.errors.len() >= 3);
    }

    #[test]
    fn test_tiered_defaults() {
        assert!(default_config_for_bankroll(200.0).max_bet_percent > default_config_for_bankroll(50_000.0).max_bet_percent);
        assert_eq!(default_config_for_bankroll(50_000.0).rounding_increment, 10.0);
    }
}
