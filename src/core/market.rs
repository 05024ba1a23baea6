//! Market Odds Normalization
//!
//! Parses track odds formats, converts between decimal/fractional/American
//! representations, and strips the market's built-in margin (overround) to
//! recover vig-free win probabilities.
//!
//! Canonical internal form is decimal odds (> 1.0). Every parser here is
//! total: input that cannot be read resolves to [`DEFAULT_DECIMAL_ODDS`]
//! (even money), never an error.

use serde::{Deserialize, Serialize};

/// Fallback decimal odds for unparseable or degenerate input (even money)
pub const DEFAULT_DECIMAL_ODDS: f64 = 2.0;

/// Plausible band for a full field's implied-probability sum.
/// North American pari-mutuel win pools typically carry 10-35% takeout.
pub const PLAUSIBLE_OVERROUND_MIN: f64 = 1.10;
pub const PLAUSIBLE_OVERROUND_MAX: f64 = 1.35;

/// Denominators tried when rendering decimal odds as a clean fraction
const FRACTIONAL_DENOMINATORS: [u32; 10] = [1, 2, 3, 4, 5, 6, 8, 10, 16, 20];

/// Per-horse market view produced by [`normalize_field`]
///
/// `overround` and `takeout_percent` are field-level figures, repeated on
/// every entry of one call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketHorse {
    pub decimal_odds: f64,
    pub implied_prob: f64,
    pub normalized_prob: f64,
    pub overround: f64,
    pub takeout_percent: f64,
}

/// Result of sanity-checking a field's odds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldValidation {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Parse an odds string in any supported track format
///
/// Accepted forms: `"5-1"`, `"5/2"`, `"EVEN"`/`"EVN"`, `"+300"`, `"-150"`,
/// or a bare integer (read as N-1).
///
/// # Returns
/// Decimal odds. Unparseable input resolves to [`DEFAULT_DECIMAL_ODDS`].
///
/// # Examples
/// ```
/// use railbird::core::market::parse_odds;
/// assert_eq!(parse_odds("5-1"), 6.0);
/// assert_eq!(parse_odds("5/2"), 3.5);
/// assert_eq!(parse_odds("EVEN"), 2.0);
/// assert_eq!(parse_odds("+300"), 4.0);
/// assert_eq!(parse_odds("garbage"), 2.0);
/// ```
pub fn parse_odds(raw: &str) -> f64 {
    let s = raw.trim();
    if s.is_empty() {
        return DEFAULT_DECIMAL_ODDS;
    }

    let upper = s.to_ascii_uppercase();
    if upper == "EVEN" || upper == "EVN" {
        return DEFAULT_DECIMAL_ODDS;
    }

    // American format carries an explicit sign prefix
    if let Some(rest) = s.strip_prefix('+') {
        if let Ok(a) = rest.parse::<f64>() {
            return american_to_decimal(a);
        }
        return DEFAULT_DECIMAL_ODDS;
    }
    if let Some(rest) = s.strip_prefix('-') {
        // "-150" is American; "5-1" is handled below
        if let Ok(a) = rest.parse::<f64>() {
            return american_to_decimal(-a);
        }
        return DEFAULT_DECIMAL_ODDS;
    }

    // Fractional with '-' or '/' separator
    for sep in ['-', '/'] {
        if let Some((n, d)) = s.split_once(sep) {
            let n = n.trim().parse::<f64>().unwrap_or(f64::NAN);
            let d = d.trim().parse::<f64>().unwrap_or(f64::NAN);
            return fractional_to_decimal(n, d);
        }
    }

    // Bare number is read as N-1
    match s.parse::<f64>() {
        Ok(n) => fractional_to_decimal(n, 1.0),
        Err(_) => DEFAULT_DECIMAL_ODDS,
    }
}

/// Convert fractional odds N-D to decimal
///
/// decimal = n/d + 1. A zero or non-finite denominator (or non-finite
/// numerator) resolves to even money.
pub fn fractional_to_decimal(numerator: f64, denominator: f64) -> f64 {
    if !numerator.is_finite() || !denominator.is_finite() || denominator == 0.0 {
        return DEFAULT_DECIMAL_ODDS;
    }
    let decimal = numerator / denominator + 1.0;
    if !decimal.is_finite() || decimal <= 1.0 {
        return DEFAULT_DECIMAL_ODDS;
    }
    decimal
}

/// Convert American odds to decimal
///
/// `+300` pays 3-1 (decimal 4.0); `-150` risks 150 to win 100 (decimal 1.667).
/// Zero or non-finite input resolves to even money.
pub fn american_to_decimal(american: f64) -> f64 {
    if !american.is_finite() || american == 0.0 {
        return DEFAULT_DECIMAL_ODDS;
    }
    if american > 0.0 {
        american / 100.0 + 1.0
    } else {
        100.0 / american.abs() + 1.0
    }
}

/// Implied win probability from decimal odds: 1/d, or 0 for degenerate input
pub fn implied_probability(decimal_odds: f64) -> f64 {
    if decimal_odds.is_finite() && decimal_odds > 0.0 {
        1.0 / decimal_odds
    } else {
        0.0
    }
}

/// Sum a field's implied probabilities (the book's overround)
///
/// Non-finite entries are ignored. An empty field reads as a fair book (1.0).
pub fn overround(implied_probs: &[f64]) -> f64 {
    if implied_probs.is_empty() {
        return 1.0;
    }
    implied_probs.iter().filter(|p| p.is_finite()).sum()
}

/// Market takeout as a percentage of the pool: (o-1)/o * 100
pub fn takeout_percent(overround: f64) -> f64 {
    if overround > 0.0 {
        (overround - 1.0) / overround * 100.0
    } else {
        0.0
    }
}

/// Divide each implied probability by the overround so the field sums to 1.0
///
/// Preserves input order. Empty input yields empty output.
pub fn normalize(implied_probs: &[f64]) -> Vec<f64> {
    if implied_probs.is_empty() {
        return Vec::new();
    }
    let total = overround(implied_probs);
    if total <= 0.0 {
        return implied_probs.to_vec();
    }
    implied_probs.iter().map(|p| p / total).collect()
}

/// Normalize a full field of decimal odds in one pass
///
/// # Returns
/// One [`MarketHorse`] per input entry, in input order, with field-level
/// overround/takeout repeated on each.
pub fn normalize_field(decimal_odds: &[f64]) -> Vec<MarketHorse> {
    let implied: Vec<f64> = decimal_odds.iter().map(|&d| implied_probability(d)).collect();
    let field_overround = overround(&implied);
    let takeout = takeout_percent(field_overround);
    let normalized = normalize(&implied);

    decimal_odds
        .iter()
        .zip(implied.iter().zip(normalized.iter()))
        .map(|(&odds, (&imp, &norm))| MarketHorse {
            decimal_odds: odds,
            implied_prob: imp,
            normalized_prob: norm,
            overround: field_overround,
            takeout_percent: takeout,
        })
        .collect()
}

/// Render decimal odds as the nearest clean fractional pair
///
/// 2.0 renders as `"EVEN"`; everything else picks the closest N-D from a
/// fixed denominator ladder and reduces it.
pub fn decimal_to_fractional(decimal_odds: f64) -> String {
    if !decimal_odds.is_finite() || decimal_odds <= 1.0 {
        return "EVEN".to_string();
    }
    let profit = decimal_odds - 1.0;
    if (profit - 1.0).abs() < 1e-9 {
        return "EVEN".to_string();
    }

    let mut best = (1u32, 1u32);
    let mut best_err = f64::MAX;
    for &den in FRACTIONAL_DENOMINATORS.iter() {
        let num = (profit * den as f64).round().max(1.0) as u32;
        let err = (num as f64 / den as f64 - profit).abs();
        if err < best_err {
            best_err = err;
            best = (num, den);
        }
    }

    let g = gcd(best.0, best.1);
    format!("{}-{}", best.0 / g, best.1 / g)
}

/// Render decimal odds in American format. The sign flips at decimal 2.0.
pub fn decimal_to_american(decimal_odds: f64) -> String {
    if !decimal_odds.is_finite() || decimal_odds <= 1.0 {
        return "+100".to_string();
    }
    if decimal_odds >= 2.0 {
        format!("+{}", ((decimal_odds - 1.0) * 100.0).round() as i64)
    } else {
        format!("-{}", (100.0 / (decimal_odds - 1.0)).round() as i64)
    }
}

/// Sanity-check a field's odds before using them for value detection
///
/// A field smaller than two runners is invalid, and each non-finite or
/// non-positive entry is flagged individually. An implied-probability sum
/// outside the plausible takeout band is a warning, not an error: some
/// exotic pools legitimately run hotter.
pub fn validate_field(decimal_odds: &[f64], band: (f64, f64)) -> FieldValidation {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if decimal_odds.len() < 2 {
        errors.push(format!(
            "field requires at least 2 runners, got {}",
            decimal_odds.len()
        ));
    }

    for (i, &odds) in decimal_odds.iter().enumerate() {
        if !odds.is_finite() || odds <= 0.0 {
            errors.push(format!("entry {} has unusable odds {}", i, odds));
        }
    }

    let implied: Vec<f64> = decimal_odds.iter().map(|&d| implied_probability(d)).collect();
    let sum = overround(&implied);
    if sum < band.0 || sum > band.1 {
        warnings.push(format!(
            "implied probability sum {:.3} outside plausible band {:.2}-{:.2}",
            sum, band.0, band.1
        ));
    }

    FieldValidation {
        is_valid: errors.is_empty(),
        errors,
        warnings,
    }
}

/// Default plausible band for [`validate_field`]
pub fn default_plausible_band() -> (f64, f64) {
    (PLAUSIBLE_OVERROUND_MIN, PLAUSIBLE_OVERROUND_MAX)
}

fn gcd(a: u32, b: u32) -> u32 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}
