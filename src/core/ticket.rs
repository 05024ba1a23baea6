//! Ticket Construction
//!
//! Turns the aggregated race-level judgment (favorite status, value horse,
//! race shape) into a named ticket template, a confidence score, and the
//! exacta/trifecta position sets a bettor would actually punch in.
//!
//! Everything here is a pure function of its arguments. Repeated calls with
//! identical inputs produce identical tickets.

use serde::{Deserialize, Serialize};

use super::kelly::{calculate_kelly, KellyOutput};
use super::market::{normalize_field, MarketHorse};
use super::overlay::{
    detect_value_plays, get_value_plays_summary, score_to_win_probability, HorseMarketView,
    ValuePlay, ValuePlaysSummary,
};
use super::signals::{
    assess_favorite_status, identify_value_horse, DetectorSignals, FavoriteStatus, RaceType,
    SignalStrength, ValueHorse,
};
use super::sizing::{default_config_for_bankroll, size_bet, SizedBet, SizingConfig};

/// Default overlay threshold (percent) for highlighting value plays
pub const DEFAULT_MIN_OVERLAY_PCT: f64 = 10.0;

/// Named ticket structure selected per race
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TicketTemplate {
    /// Solid favorite keyed with the value horse
    A,
    /// Vulnerable favorite: value horse on top
    B,
    /// Wide-open race: box the algorithm's top four
    C,
    /// No playable edge
    #[serde(rename = "PASS")]
    Pass,
}

/// Banded classification of wagering evidence strength
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfidenceTier {
    Minimal,
    Low,
    Medium,
    High,
}

impl ConfidenceTier {
    /// Band cutoffs: MINIMAL < 40, LOW 40-59, MEDIUM 60-79, HIGH >= 80
    pub fn from_score(score: u8) -> Self {
        if score >= 80 {
            ConfidenceTier::High
        } else if score >= 60 {
            ConfidenceTier::Medium
        } else if score >= 40 {
            ConfidenceTier::Low
        } else {
            ConfidenceTier::Minimal
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerdictAction {
    Bet,
    Pass,
}

/// Final race-level call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceVerdict {
    pub action: VerdictAction,
    pub summary: String,
}

/// Exacta position sets with the number of distinct combinations they cover
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExactaTicket {
    pub first: Vec<u8>,
    pub second: Vec<u8>,
    pub combinations: usize,
}

/// Trifecta position sets with the number of distinct combinations they cover
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrifectaTicket {
    pub first: Vec<u8>,
    pub second: Vec<u8>,
    pub third: Vec<u8>,
    pub combinations: usize,
}

/// The complete per-race recommendation record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketConstruction {
    pub template: TicketTemplate,
    pub favorite_status: FavoriteStatus,
    pub race_type: RaceType,
    pub confidence_score: u8,
    pub confidence_tier: ConfidenceTier,
    pub value_horse: ValueHorse,
    pub verdict: RaceVerdict,
    /// Plain algorithm rank order, populated even on a pass
    pub algorithm_top4: Vec<u8>,
    pub exacta: ExactaTicket,
    pub trifecta: TrifectaTicket,
}

/// Kelly staking attached to the identified value horse
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueHorseStake {
    pub program_number: u8,
    pub kelly: KellyOutput,
    pub bet: SizedBet,
}

/// Everything the caller gets back for one race
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceRecommendation {
    pub field_size: usize,
    pub market: Vec<MarketHorse>,
    pub overlays: Vec<ValuePlay>,
    pub overlay_summary: ValuePlaysSummary,
    pub ticket: TicketConstruction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub staking: Option<ValueHorseStake>,
}

/// Select the ticket template for a race
///
/// A wide-open shape boxes regardless of the favorite. Otherwise a solid
/// favorite without a value horse is a pass, a solid favorite with one is
/// template A, and a vulnerable favorite is template B whether or not a
/// value horse emerged.
pub fn select_template(
    race_type: RaceType,
    favorite_status: FavoriteStatus,
    value_horse: &ValueHorse,
) -> TicketTemplate {
    if race_type == RaceType::WideOpen {
        return TicketTemplate::C;
    }
    match favorite_status {
        FavoriteStatus::Solid => {
            if value_horse.identified {
                TicketTemplate::A
            } else {
                TicketTemplate::Pass
            }
        }
        FavoriteStatus::Vulnerable => TicketTemplate::B,
    }
}

/// Confidence score from the value-horse evidence
///
/// Pure integer function: a strength bucket fixes the tier band, and bot
/// convergence nudges the score inside it. No randomness, no clock.
pub fn calculate_confidence_score(value_horse: &ValueHorse) -> u8 {
    let (base, band_max) = match value_horse.signal_strength {
        SignalStrength::None => (25u8, 39u8),
        SignalStrength::Weak => (42, 59),
        SignalStrength::Moderate => (62, 79),
        SignalStrength::Strong => (80, 89),
        SignalStrength::VeryStrong => (88, 99),
    };
    let bonus = (value_horse.bot_convergence_count as u8).saturating_mul(3);
    base.saturating_add(bonus).min(band_max)
}

/// Count distinct exacta combinations covered by two position sets
pub fn count_exacta_combinations(first: &[u8], second: &[u8]) -> usize {
    first
        .iter()
        .flat_map(|&a| second.iter().filter(move |&&b| b != a))
        .count()
}

/// Count distinct trifecta combinations covered by three position sets
pub fn count_trifecta_combinations(first: &[u8], second: &[u8], third: &[u8]) -> usize {
    let mut count = 0;
    for &a in first {
        for &b in second {
            if b == a {
                continue;
            }
            for &c in third {
                if c != a && c != b {
                    count += 1;
                }
            }
        }
    }
    count
}

/// Assemble the full ticket record for a race
///
/// `ranking` is the algorithm's rank order of active runners, best first.
/// For template PASS the position sets are empty (zero combinations) while
/// `algorithm_top4` is still populated.
pub fn build_ticket_construction(
    ranking: &[u8],
    race_type: RaceType,
    favorite_status: FavoriteStatus,
    value_horse: ValueHorse,
) -> TicketConstruction {
    let top4: Vec<u8> = ranking.iter().take(4).copied().collect();
    let template = select_template(race_type, favorite_status, &value_horse);
    let confidence_score = calculate_confidence_score(&value_horse);
    let confidence_tier = ConfidenceTier::from_score(confidence_score);

    let favorite = top4.first().copied();
    let (exacta, trifecta) = build_positions(template, &top4, favorite, &value_horse);
    let verdict = build_verdict(template, favorite, &value_horse);

    TicketConstruction {
        template,
        favorite_status,
        race_type,
        confidence_score,
        confidence_tier,
        value_horse,
        verdict,
        algorithm_top4: top4,
        exacta,
        trifecta,
    }
}

fn build_positions(
    template: TicketTemplate,
    top4: &[u8],
    favorite: Option<u8>,
    value_horse: &ValueHorse,
) -> (ExactaTicket, TrifectaTicket) {
    let empty = (
        ExactaTicket {
            first: Vec::new(),
            second: Vec::new(),
            combinations: 0,
        },
        TrifectaTicket {
            first: Vec::new(),
            second: Vec::new(),
            third: Vec::new(),
            combinations: 0,
        },
    );

    let favorite = match favorite {
        Some(f) => f,
        None => return empty,
    };

    // Contender pool: the top four plus the value horse if it sits outside
    let mut contenders = top4.to_vec();
    if let Some(v) = value_horse.program_number {
        if !contenders.contains(&v) {
            contenders.push(v);
        }
    }

    let (ex_first, ex_second, tri_first, tri_second, tri_third) = match template {
        TicketTemplate::Pass => return empty,
        TicketTemplate::A => {
            // Favorite and value horse boxed on top, contenders underneath
            let v = match value_horse.program_number {
                Some(v) => v,
                None => return empty,
            };
            let top_pair = vec![favorite, v];
            let underneath: Vec<u8> = contenders.clone();
            (
                top_pair.clone(),
                top_pair.clone(),
                top_pair.clone(),
                top_pair,
                underneath,
            )
        }
        TicketTemplate::B => {
            // Value horse keyed on top over the rest of the contenders; if
            // no value horse emerged, key the algorithm's second choice
            let key = value_horse
                .program_number
                .or_else(|| top4.get(1).copied())
                .unwrap_or(favorite);
            let others: Vec<u8> = contenders.iter().copied().filter(|&p| p != key).collect();
            (
                vec![key],
                others.clone(),
                vec![key],
                others.clone(),
                others,
            )
        }
        TicketTemplate::C => {
            // Full box of the algorithm top four
            let box_set = top4.to_vec();
            (
                box_set.clone(),
                box_set.clone(),
                box_set.clone(),
                box_set.clone(),
                box_set,
            )
        }
    };

    let exacta = ExactaTicket {
        combinations: count_exacta_combinations(&ex_first, &ex_second),
        first: ex_first,
        second: ex_second,
    };
    let trifecta = TrifectaTicket {
        combinations: count_trifecta_combinations(&tri_first, &tri_second, &tri_third),
        first: tri_first,
        second: tri_second,
        third: tri_third,
    };
    (exacta, trifecta)
}

fn build_verdict(
    template: TicketTemplate,
    favorite: Option<u8>,
    value_horse: &ValueHorse,
) -> RaceVerdict {
    let fav = favorite.unwrap_or(0);
    match template {
        TicketTemplate::Pass => RaceVerdict {
            action: VerdictAction::Pass,
            summary: match favorite {
                Some(fav) => format!(
                    "solid favorite #{} with no qualifying value horse; pass the race",
                    fav
                ),
                None => "no active runners; pass the race".to_string(),
            },
        },
        TicketTemplate::A => RaceVerdict {
            action: VerdictAction::Bet,
            summary: format!(
                "solid favorite #{} keyed with value horse #{}",
                fav,
                value_horse.program_number.unwrap_or(0)
            ),
        },
        TicketTemplate::B => RaceVerdict {
            action: VerdictAction::Bet,
            summary: format!(
                "vulnerable favorite #{}; value horse #{} keyed on top",
                fav,
                value_horse.program_number.unwrap_or(0)
            ),
        },
        TicketTemplate::C => RaceVerdict {
            action: VerdictAction::Bet,
            summary: "wide-open race; boxing the algorithm top four".to_string(),
        },
    }
}

/// One-call race recommendation
///
/// Normalizes the market, runs overlay detection, judges the favorite,
/// elects the value horse, builds the ticket, and (when a bankroll is
/// supplied) sizes a win bet on the value horse.
///
/// Scratched horses are excluded everywhere. Missing detector verdicts are
/// simply absent evidence; with none at all the result degrades to a
/// PASS/MINIMAL recommendation rather than an error.
pub fn recommend_race(
    horses: &[HorseMarketView],
    signals: &DetectorSignals,
    bankroll: Option<f64>,
    sizing: Option<&SizingConfig>,
    min_overlay_pct: f64,
) -> RaceRecommendation {
    let active: Vec<&HorseMarketView> = horses.iter().filter(|h| !h.scratched).collect();

    // Algorithm rank order: score descending, program number as tiebreak
    let mut ranked: Vec<&HorseMarketView> = active.clone();
    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.program_number.cmp(&b.program_number))
    });
    let ranking: Vec<u8> = ranked.iter().map(|h| h.program_number).collect();

    let race_type = signals
        .field_spread
        .as_ref()
        .map(|f| f.race_type)
        .unwrap_or(RaceType::Orthodox);

    let favorite_status = match ranking.first() {
        Some(&favorite) => assess_favorite_status(signals, favorite),
        None => FavoriteStatus::Solid,
    };
    let value_horse = identify_value_horse(signals, &ranking, favorite_status);

    let market = normalize_field(&active.iter().map(|h| h.decimal_odds).collect::<Vec<_>>());
    let overlays = detect_value_plays(horses, min_overlay_pct);
    let overlay_summary = get_value_plays_summary(&overlays);

    let staking = match (bankroll, value_horse.program_number) {
        (Some(bankroll), Some(program)) if value_horse.identified => {
            active.iter().find(|h| h.program_number == program).map(|h| {
                let probability = score_to_win_probability(h.score) / 100.0;
                let kelly = calculate_kelly(probability, h.decimal_odds, bankroll);
                let config = sizing
                    .cloned()
                    .unwrap_or_else(|| default_config_for_bankroll(bankroll));
                let bet = size_bet(&kelly, bankroll, &config);
                ValueHorseStake {
                    program_number: program,
                    kelly,
                    bet,
                }
            })
        }
        _ => None,
    };

    let ticket = build_ticket_construction(&ranking, race_type, favorite_status, value_horse);

    RaceRecommendation {
        field_size: active.len(),
        market,
        overlays,
        overlay_summary,
        ticket,
        staking,
    }
}
