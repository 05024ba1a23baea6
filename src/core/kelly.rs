//! Kelly Criterion Bet Sizing
//!
//! Optimal stake fraction from estimated win probability and market odds.
//!
//! The Kelly criterion formula:
//!     f* = (b*p - q) / b
//!
//! Where:
//!     f* = fraction of bankroll to bet
//!     b = odds - 1 (net odds)
//!     p = probability of winning
//!     q = 1 - p (probability of losing)
//!
//! Two unrelated quarters live in this module and must not be conflated:
//! [`FULL_KELLY_SAFETY_CAP`] is a hard ceiling on the full-Kelly fraction
//! itself (bankroll-growth safety), while [`KellyFraction::Quarter`] is the
//! quarter-Kelly betting strategy applied on top of the capped fraction.

use serde::{Deserialize, Serialize};

/// Hard ceiling on the full-Kelly fraction (25% of bankroll)
pub const FULL_KELLY_SAFETY_CAP: f64 = 0.25;

/// Bankroll floor below which no bet is recommended
pub const MIN_BANKROLL: f64 = 50.0;

/// Fractional-Kelly strategy selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KellyFraction {
    Full,
    Half,
    Quarter,
    Eighth,
}

impl KellyFraction {
    /// Multiplier applied to the (capped) full-Kelly fraction
    pub fn multiplier(&self) -> f64 {
        match self {
            KellyFraction::Full => 1.0,
            KellyFraction::Half => 0.5,
            KellyFraction::Quarter => 0.25,
            KellyFraction::Eighth => 0.125,
        }
    }
}

impl Default for KellyFraction {
    fn default() -> Self {
        KellyFraction::Quarter
    }
}

/// Inputs to the Kelly calculation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KellyInput {
    /// Estimated win probability, in (0, 1]
    pub probability: f64,
    /// Decimal odds, > 1
    pub decimal_odds: f64,
    /// Current bankroll, >= 0
    pub bankroll: f64,
}

/// Structured validation result for [`KellyInput`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KellyValidation {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

/// Full Kelly staking recommendation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KellyOutput {
    /// Kelly fraction after the safety cap
    pub full_kelly_fraction: f64,
    /// Quarter-Kelly strategy fraction (full * 0.25)
    pub quarter_kelly_fraction: f64,
    /// Quarter-Kelly stake rounded to the nearest whole unit
    pub suggested_bet_size: f64,
    /// p * odds - 1, per $1 staked
    pub expected_value: f64,
    pub implied_probability: f64,
    /// Edge over the market, percent of implied probability
    pub edge_percent: f64,
    pub is_positive_ev: bool,
    pub should_bet: bool,
    pub reason: String,
}

impl KellyOutput {
    fn no_bet(reason: String) -> Self {
        Self {
            full_kelly_fraction: 0.0,
            quarter_kelly_fraction: 0.0,
            suggested_bet_size: 0.0,
            expected_value: 0.0,
            implied_probability: 0.0,
            edge_percent: 0.0,
            is_positive_ev: false,
            should_bet: false,
            reason,
        }
    }
}

/// Fractional-Kelly staking recommendation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FractionalKelly {
    pub kelly: KellyOutput,
    pub fraction: KellyFraction,
    /// Fraction of bankroll after applying the strategy multiplier
    pub fraction_of_bankroll: f64,
    pub bet_size: f64,
}

/// Validate Kelly inputs, returning every violation as a structured list
pub fn validate_kelly_input(input: &KellyInput) -> KellyValidation {
    let mut errors = Vec::new();

    if !input.probability.is_finite() || input.probability <= 0.0 || input.probability > 1.0 {
        errors.push(format!(
            "probability must be in (0, 1], got {}",
            input.probability
        ));
    }
    if !input.decimal_odds.is_finite() || input.decimal_odds <= 1.0 {
        errors.push(format!(
            "decimal odds must be greater than 1, got {}",
            input.decimal_odds
        ));
    }
    if !input.bankroll.is_finite() || input.bankroll < 0.0 {
        errors.push(format!("bankroll must be non-negative, got {}", input.bankroll));
    }

    KellyValidation {
        is_valid: errors.is_empty(),
        errors,
    }
}

/// Calculate a Kelly staking recommendation
///
/// Total function: invalid input yields a zeroed no-bet output carrying the
/// validation message, never a panic.
///
/// # Examples
/// ```
/// use railbird::core::kelly::calculate_kelly;
/// let out = calculate_kelly(0.25, 6.0, 500.0);
/// assert!((out.full_kelly_fraction - 0.10).abs() < 1e-9);
/// assert!((out.quarter_kelly_fraction - 0.025).abs() < 1e-9);
/// assert_eq!(out.suggested_bet_size, 13.0);
/// ```
pub fn calculate_kelly(probability: f64, decimal_odds: f64, bankroll: f64) -> KellyOutput {
    let input = KellyInput {
        probability,
        decimal_odds,
        bankroll,
    };
    let validation = validate_kelly_input(&input);
    if !validation.is_valid {
        return KellyOutput::no_bet(validation.errors.join("; "));
    }

    let b = decimal_odds - 1.0;
    let q = 1.0 - probability;
    let raw_kelly = (b * probability - q) / b;
    let full_kelly = raw_kelly.max(0.0).min(FULL_KELLY_SAFETY_CAP);
    let quarter_kelly = full_kelly * 0.25;
    let suggested = (bankroll * quarter_kelly).round();

    let expected_value = probability * decimal_odds - 1.0;
    let implied = 1.0 / decimal_odds;
    let edge_percent = (probability - implied) / implied * 100.0;
    let is_positive_ev = expected_value > 0.0;

    let (should_bet, reason) = if !is_positive_ev {
        (false, "negative expected value".to_string())
    } else if full_kelly <= 0.0 {
        (false, "no Kelly edge at these odds".to_string())
    } else if bankroll < MIN_BANKROLL {
        (
            false,
            format!("bankroll below minimum of {}", MIN_BANKROLL),
        )
    } else if suggested < 1.0 {
        (false, "stake rounds to zero".to_string())
    } else {
        (
            true,
            format!("positive expected value, {:.1}% edge", edge_percent),
        )
    };

    KellyOutput {
        full_kelly_fraction: full_kelly,
        quarter_kelly_fraction: quarter_kelly,
        suggested_bet_size: if should_bet { suggested } else { 0.0 },
        expected_value,
        implied_probability: implied,
        edge_percent,
        is_positive_ev,
        should_bet,
        reason,
    }
}

/// Apply a fractional-Kelly strategy to a Kelly input
pub fn calculate_fractional_kelly(input: &KellyInput, fraction: KellyFraction) -> FractionalKelly {
    let kelly = calculate_kelly(input.probability, input.decimal_odds, input.bankroll);
    let fraction_of_bankroll = kelly.full_kelly_fraction * fraction.multiplier();
    let bet_size = if kelly.should_bet {
        (input.bankroll * fraction_of_bankroll).round()
    } else {
        0.0
    };

    FractionalKelly {
        kelly,
        fraction,
        fraction_of_bankroll,
        bet_size,
    }
}
