//! Overlay / Value Analysis
//!
//! Converts the external algorithm score into an estimated win probability,
//! derives fair odds, and compares them to the live market to classify each
//! horse's price as overlay or underlay and compute expected value.
//!
//! The score-to-probability mapping is versioned: exactly one canonical
//! formula+band lives behind [`ProbabilityModel`], so a future revision is a
//! new variant rather than an edited constant.

use serde::{Deserialize, Serialize};

/// Win probability band (percent) for the canonical score mapping
pub const WIN_PROB_FLOOR_PCT: f64 = 5.0;
pub const WIN_PROB_CEILING_PCT: f64 = 50.0;

/// Fair-odds clamp: nothing shorter than 1-100, nothing longer than 99-1
pub const FAIR_ODDS_FLOOR: f64 = 1.01;
pub const FAIR_ODDS_CEILING: f64 = 100.0;

/// Base scores at or above this mark a legitimately strong horse
pub const HIGH_BASE_SCORE: f64 = 160.0;
/// Base scores below this mark a thin-evidence horse
pub const LOW_BASE_SCORE: f64 = 120.0;

const STRONG_POSITIVE_OVERLAY: f64 = 50.0;
const MASSIVE_POSITIVE_OVERLAY: f64 = 100.0;
const STRONG_NEGATIVE_OVERLAY: f64 = -20.0;
const OVERLAY_BONUS: f64 = 8.0;
const MASSIVE_OVERLAY_BONUS: f64 = 12.0;
const OVERLAY_PENALTY: f64 = 8.0;
const LOW_BASE_EXTRA_PENALTY: f64 = 4.0;

/// Score-to-probability formula revision selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProbabilityModel {
    /// Canonical revision: win% = score * 0.25, clamped to [5, 50]
    V3,
}

impl ProbabilityModel {
    /// Estimated win probability (percent) for an algorithm score
    pub fn win_probability(&self, score: f64) -> f64 {
        match self {
            ProbabilityModel::V3 => {
                if !score.is_finite() {
                    return WIN_PROB_FLOOR_PCT;
                }
                (score * 0.25).clamp(WIN_PROB_FLOOR_PCT, WIN_PROB_CEILING_PCT)
            }
        }
    }
}

impl Default for ProbabilityModel {
    fn default() -> Self {
        ProbabilityModel::V3
    }
}

/// Market-price classification, best value first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueClass {
    MassiveOverlay,
    StrongOverlay,
    ModerateOverlay,
    SlightOverlay,
    FairPrice,
    Underlay,
}

/// Wagering action for a recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BetAction {
    BetHeavily,
    BetStandard,
    BetSmall,
    Pass,
    Avoid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    High,
    Medium,
    Low,
    None,
}

/// Betting recommendation derived from a value classification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub action: BetAction,
    pub urgency: Urgency,
    /// Stake multiplier relative to a standard unit
    pub suggested_multiplier: f64,
}

/// Display-score adjustment driven by the market
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierAdjustment {
    pub total_score: f64,
    pub base_score: f64,
    pub overlay_percent: f64,
    pub adjustment: f64,
    pub adjusted_score: f64,
    /// Penalty waived: a high-base favorite going off short is correctly
    /// priced, not a false favorite
    pub high_base_waiver: bool,
    /// Low base score but the market offers a massive overlay
    pub diamond_in_the_rough: bool,
    /// Extra underlay penalty reserved for low-base horses
    pub low_base_underlay_penalty: bool,
}

/// Full overlay analysis for one horse
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlayAnalysis {
    /// Estimated win probability, percent, clamped to the model band
    pub win_probability: f64,
    pub fair_odds_decimal: f64,
    pub actual_odds_decimal: f64,
    pub overlay_percent: f64,
    pub value_class: ValueClass,
    /// Expected profit per $1 staked
    pub ev_per_dollar: f64,
    pub is_positive_ev: bool,
    pub recommendation: Recommendation,
}

/// One horse's market view, as supplied by the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HorseMarketView {
    pub program_number: u8,
    pub score: f64,
    #[serde(default)]
    pub scratched: bool,
    pub decimal_odds: f64,
}

/// A horse whose market price clears the overlay threshold
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuePlay {
    pub program_number: u8,
    pub analysis: OverlayAnalysis,
}

/// Tally of value plays across a race
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuePlaysSummary {
    pub total_plays: usize,
    pub massive_overlays: usize,
    pub strong_overlays: usize,
    pub moderate_overlays: usize,
    pub slight_overlays: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_program_number: Option<u8>,
    pub best_overlay_percent: f64,
    pub total_positive_ev: f64,
}

/// Estimated win probability (percent) using the canonical model
pub fn score_to_win_probability(score: f64) -> f64 {
    ProbabilityModel::default().win_probability(score)
}

/// Fair decimal odds for a win probability given in percent
///
/// Clamped to a 99-1 long-shot ceiling and a 1-100 favorite floor.
pub fn probability_to_decimal_odds(probability_pct: f64) -> f64 {
    if !probability_pct.is_finite() || probability_pct <= 0.0 {
        return FAIR_ODDS_CEILING;
    }
    (100.0 / probability_pct).clamp(FAIR_ODDS_FLOOR, FAIR_ODDS_CEILING)
}

/// Overlay percentage: how far the market price sits above fair
pub fn calculate_overlay_percent(fair_odds: f64, actual_odds: f64) -> f64 {
    if !fair_odds.is_finite() || fair_odds <= 0.0 || !actual_odds.is_finite() {
        return 0.0;
    }
    (actual_odds - fair_odds) / fair_odds * 100.0
}

/// Classify an overlay percentage into one of six contiguous bands
pub fn classify_value(overlay_percent: f64) -> ValueClass {
    if overlay_percent >= MASSIVE_POSITIVE_OVERLAY {
        ValueClass::MassiveOverlay
    } else if overlay_percent >= 50.0 {
        ValueClass::StrongOverlay
    } else if overlay_percent >= 25.0 {
        ValueClass::ModerateOverlay
    } else if overlay_percent >= 10.0 {
        ValueClass::SlightOverlay
    } else if overlay_percent >= -10.0 {
        ValueClass::FairPrice
    } else {
        ValueClass::Underlay
    }
}

/// Expected value per $1 staked: p*(odds-1) - (1-p), probability in percent
pub fn calculate_ev(probability_pct: f64, decimal_odds: f64) -> f64 {
    let p = probability_pct / 100.0;
    p * (decimal_odds - 1.0) - (1.0 - p)
}

/// Map a value classification to a betting recommendation
///
/// A non-positive expected value downgrades any bet action to a pass; the
/// clamped probability band and the raw market price can disagree at the
/// extremes.
pub fn generate_recommendation(value_class: ValueClass, ev: f64) -> Recommendation {
    let (action, urgency, multiplier) = match value_class {
        ValueClass::MassiveOverlay => (BetAction::BetHeavily, Urgency::High, 1.5),
        ValueClass::StrongOverlay => (BetAction::BetStandard, Urgency::High, 1.25),
        ValueClass::ModerateOverlay => (BetAction::BetStandard, Urgency::Medium, 1.0),
        ValueClass::SlightOverlay => (BetAction::BetSmall, Urgency::Low, 0.5),
        ValueClass::FairPrice => (BetAction::Pass, Urgency::None, 0.0),
        ValueClass::Underlay => (BetAction::Avoid, Urgency::None, 0.0),
    };

    if ev <= 0.0 && matches!(action, BetAction::BetHeavily | BetAction::BetStandard | BetAction::BetSmall) {
        return Recommendation {
            action: BetAction::Pass,
            urgency: Urgency::None,
            suggested_multiplier: 0.0,
        };
    }

    Recommendation {
        action,
        urgency,
        suggested_multiplier: multiplier,
    }
}

/// Adjust a display score for what the market is saying
///
/// Strong positive overlays earn a bonus. Strong negative overlays take a
/// penalty, waived entirely once the base score clears [`HIGH_BASE_SCORE`];
/// below [`LOW_BASE_SCORE`] the penalty deepens.
pub fn calculate_tier_adjustment(
    total_score: f64,
    base_score: f64,
    overlay_percent: f64,
) -> TierAdjustment {
    let mut adjustment = 0.0;
    let mut high_base_waiver = false;
    let mut low_base_underlay_penalty = false;

    if overlay_percent >= MASSIVE_POSITIVE_OVERLAY {
        adjustment += MASSIVE_OVERLAY_BONUS;
    } else if overlay_percent >= STRONG_POSITIVE_OVERLAY {
        adjustment += OVERLAY_BONUS;
    } else if overlay_percent <= STRONG_NEGATIVE_OVERLAY {
        if base_score >= HIGH_BASE_SCORE {
            high_base_waiver = true;
        } else {
            adjustment -= OVERLAY_PENALTY;
            if base_score < LOW_BASE_SCORE {
                adjustment -= LOW_BASE_EXTRA_PENALTY;
                low_base_underlay_penalty = true;
            }
        }
    }

    let diamond_in_the_rough =
        base_score < LOW_BASE_SCORE && overlay_percent >= MASSIVE_POSITIVE_OVERLAY;

    TierAdjustment {
        total_score,
        base_score,
        overlay_percent,
        adjustment,
        adjusted_score: total_score + adjustment,
        high_base_waiver,
        diamond_in_the_rough,
        low_base_underlay_penalty,
    }
}

/// Full overlay analysis for one horse's score against its market price
pub fn analyze_overlay(score: f64, actual_odds_decimal: f64) -> OverlayAnalysis {
    let win_probability = score_to_win_probability(score);
    let fair_odds = probability_to_decimal_odds(win_probability);
    let overlay_percent = calculate_overlay_percent(fair_odds, actual_odds_decimal);
    let value_class = classify_value(overlay_percent);
    let ev = calculate_ev(win_probability, actual_odds_decimal);
    let recommendation = generate_recommendation(value_class, ev);

    OverlayAnalysis {
        win_probability,
        fair_odds_decimal: fair_odds,
        actual_odds_decimal,
        overlay_percent,
        value_class,
        ev_per_dollar: ev,
        is_positive_ev: ev > 0.0,
        recommendation,
    }
}

/// Find every non-scratched horse whose overlay clears the threshold
///
/// Sorted descending by overlay percent; ties break on program number so
/// repeated calls order identically.
pub fn detect_value_plays(horses: &[HorseMarketView], min_overlay_pct: f64) -> Vec<ValuePlay> {
    let mut plays: Vec<ValuePlay> = horses
        .iter()
        .filter(|h| !h.scratched)
        .map(|h| ValuePlay {
            program_number: h.program_number,
            analysis: analyze_overlay(h.score, h.decimal_odds),
        })
        .filter(|p| p.analysis.overlay_percent >= min_overlay_pct)
        .collect();

    plays.sort_by(|a, b| {
        b.analysis
            .overlay_percent
            .partial_cmp(&a.analysis.overlay_percent)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.program_number.cmp(&b.program_number))
    });
    plays
}

/// Tally a list of value plays into a race-level summary
pub fn get_value_plays_summary(plays: &[ValuePlay]) -> ValuePlaysSummary {
    let count = |class: ValueClass| plays.iter().filter(|p| p.analysis.value_class == class).count();

    let best = plays.iter().max_by(|a, b| {
        a.analysis
            .overlay_percent
            .partial_cmp(&b.analysis.overlay_percent)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(b.program_number.cmp(&a.program_number))
    });

    ValuePlaysSummary {
        total_plays: plays.len(),
        massive_overlays: count(ValueClass::MassiveOverlay),
        strong_overlays: count(ValueClass::StrongOverlay),
        moderate_overlays: count(ValueClass::ModerateOverlay),
        slight_overlays: count(ValueClass::SlightOverlay),
        best_program_number: best.map(|p| p.program_number),
        best_overlay_percent: best.map(|p| p.analysis.overlay_percent).unwrap_or(0.0),
        total_positive_ev: plays
            .iter()
            .map(|p| p.analysis.ev_per_dollar)
            .filter(|&ev| ev > 0.0)
            .sum(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_mapping_linear_and_clamped() {
        assert_eq!(score_to_win_probability(100.0), 25.0);
        assert_eq!(score_to_win_probability(140.0), 35.0);
        // Band clamps
        assert_eq!(score_to_win_probability(10.0), WIN_PROB_FLOOR_PCT);
        assert_eq!(score_to_win_probability(500.0), WIN_PROB_CEILING_PCT);
        assert_eq!(score_to_win_probability(f64::NAN), WIN_PROB_FLOOR_PCT);
    }

    #[test]
    fn test_probability_to_odds_clamps() {
        assert_eq!(probability_to_decimal_odds(25.0), 4.0);
        assert_eq!(probability_to_decimal_odds(0.5), FAIR_ODDS_CEILING);
        assert_eq!(probability_to_decimal_odds(99.9), FAIR_ODDS_FLOOR);
        assert_eq!(probability_to_decimal_odds(0.0), FAIR_ODDS_CEILING);
    }

    #[test]
    fn test_overlay_percent() {
        assert!((calculate_overlay_percent(4.0, 6.0) - 50.0).abs() < 1e-9);
        assert!((calculate_overlay_percent(4.0, 3.0) + 25.0).abs() < 1e-9);
        assert_eq!(calculate_overlay_percent(0.0, 6.0), 0.0);
    }

    #[test]
    fn test_classify_value_partitions_the_line() {
        // Six contiguous, non-overlapping bands
        assert_eq!(classify_value(150.0), ValueClass::MassiveOverlay);
        assert_eq!(classify_value(100.0), ValueClass::MassiveOverlay);
        assert_eq!(classify_value(99.9), ValueClass::StrongOverlay);
        assert_eq!(classify_value(50.0), ValueClass::StrongOverlay);
        assert_eq!(classify_value(49.9), ValueClass::ModerateOverlay);
        assert_eq!(classify_value(25.0), ValueClass::ModerateOverlay);
        assert_eq!(classify_value(24.9), ValueClass::SlightOverlay);
        assert_eq!(classify_value(10.0), ValueClass::SlightOverlay);
        assert_eq!(classify_value(9.9), ValueClass::FairPrice);
        assert_eq!(classify_value(-10.0), ValueClass::FairPrice);
        assert_eq!(classify_value(-10.1), ValueClass::Underlay);
        assert_eq!(classify_value(-90.0), ValueClass::Underlay);
    }

    #[test]
    fn test_ev_formula_exact() {
        // EV = p*(o-1) - (1-p)
        let ev = calculate_ev(25.0, 6.0);
        assert!((ev - (0.25 * 5.0 - 0.75)).abs() < 1e-12);
        let ev = calculate_ev(10.0, 5.0);
        assert!((ev - (0.10 * 4.0 - 0.90)).abs() < 1e-12);
        assert!(ev < 0.0);
    }

    #[test]
    fn test_recommendation_mapping() {
        let rec = generate_recommendation(ValueClass::MassiveOverlay, 0.8);
        assert_eq!(rec.action, BetAction::BetHeavily);
        assert_eq!(rec.suggested_multiplier, 1.5);

        let rec = generate_recommendation(ValueClass::Underlay, -0.3);
        assert_eq!(rec.action, BetAction::Avoid);

        // Positive class but non-positive EV downgrades to a pass
        let rec = generate_recommendation(ValueClass::SlightOverlay, -0.01);
        assert_eq!(rec.action, BetAction::Pass);
    }

    #[test]
    fn test_tier_adjustment_bonus() {
        let adj = calculate_tier_adjustment(150.0, 130.0, 120.0);
        assert_eq!(adj.adjustment, MASSIVE_OVERLAY_BONUS);
        assert!(!adj.diamond_in_the_rough);

        let adj = calculate_tier_adjustment(150.0, 130.0, 60.0);
        assert_eq!(adj.adjustment, OVERLAY_BONUS);
    }

    #[test]
    fn test_tier_adjustment_penalty_and_waiver() {
        // Mid base score takes the penalty
        let adj = calculate_tier_adjustment(150.0, 140.0, -40.0);
        assert_eq!(adj.adjustment, -OVERLAY_PENALTY);
        assert!(!adj.high_base_waiver);

        // High base: a strong horse going off short is correctly priced
        let adj = calculate_tier_adjustment(180.0, 170.0, -40.0);
        assert_eq!(adj.adjustment, 0.0);
        assert!(adj.high_base_waiver);

        // Low base takes the deeper penalty
        let adj = calculate_tier_adjustment(110.0, 100.0, -40.0);
        assert_eq!(adj.adjustment, -(OVERLAY_PENALTY + LOW_BASE_EXTRA_PENALTY));
        assert!(adj.low_base_underlay_penalty);
    }

    #[test]
    fn test_diamond_in_the_rough() {
        let adj = calculate_tier_adjustment(115.0, 100.0, 140.0);
        assert!(adj.diamond_in_the_rough);
        assert_eq!(adj.adjustment, MASSIVE_OVERLAY_BONUS);
    }

    #[test]
    fn test_analyze_overlay_consistency() {
        // Score 100 -> 25% -> fair 4.0; market 6.0 is a 50% overlay
        let analysis = analyze_overlay(100.0, 6.0);
        assert_eq!(analysis.win_probability, 25.0);
        assert_eq!(analysis.fair_odds_decimal, 4.0);
        assert!((analysis.overlay_percent - 50.0).abs() < 1e-9);
        assert_eq!(analysis.value_class, ValueClass::StrongOverlay);
        assert!(analysis.is_positive_ev);
        assert_eq!(analysis.recommendation.action, BetAction::BetStandard);
    }

    #[test]
    fn test_detect_value_plays_filters_and_sorts() {
        let horses = vec![
            HorseMarketView { program_number: 1, score: 160.0, scratched: false, decimal_odds: 2.2 },
            HorseMarketView { program_number: 2, score: 100.0, scratched: false, decimal_odds: 6.0 },
            HorseMarketView { program_number: 3, score: 100.0, scratched: true, decimal_odds: 12.0 },
            HorseMarketView { program_number: 4, score: 100.0, scratched: false, decimal_odds: 9.0 },
        ];
        let plays = detect_value_plays(&horses, 10.0);
        // Scratched #3 excluded; #1 near fair price excluded
        assert_eq!(plays.len(), 2);
        assert_eq!(plays[0].program_number, 4); // 125% overlay sorts first
        assert_eq!(plays[1].program_number, 2);
    }

    #[test]
    fn test_value_plays_summary() {
        let horses = vec![
            HorseMarketView { program_number: 2, score: 100.0, scratched: false, decimal_odds: 6.0 },
            HorseMarketView { program_number: 4, score: 100.0, scratched: false, decimal_odds: 9.0 },
        ];
        let plays = detect_value_plays(&horses, 10.0);
        let summary = get_value_plays_summary(&plays);
        assert_eq!(summary.total_plays, 2);
        assert_eq!(summary.massive_overlays, 1);
        assert_eq!(summary.strong_overlays, 1);
        assert_eq!(summary.best_program_number, Some(4));
        assert!(summary.total_positive_ev > 0.0);

        let empty = get_value_plays_summary(&[]);
        assert_eq!(empty.total_plays, 0);
        assert_eq!(empty.best_program_number, None);
    }
}
