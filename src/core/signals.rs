//! Detector Signal Aggregation
//!
//! Combines the independent detector bots' verdicts (trip trouble, pace
//! scenario, vulnerable favorite, field spread, class drop) into a
//! favorite-status judgment and a single value-horse identification.
//!
//! Every verdict is optional. A missing detector is "no evidence", never an
//! error: as evidence shrinks the aggregation degrades toward a solid
//! favorite and no value horse, which downstream resolves to a pass.

use serde::{Deserialize, Serialize};

/// Flags required before accumulated evidence marks a favorite vulnerable
const VULNERABILITY_FLAG_THRESHOLD: usize = 2;

/// Raw strength a lone source must reach to override a solid favorite
const SOLID_SINGLE_SOURCE_STRENGTH: f64 = 50.0;

/// Detector confidence grade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectorConfidence {
    Low,
    Medium,
    High,
}

/// Projected pace shape of the race
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaceScenario {
    LoneSpeed,
    Honest,
    SpeedDuel,
    Meltdown,
}

/// How contentious the field looks to the spread detector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RaceType {
    Orthodox,
    Contentious,
    WideOpen,
}

/// A horse had a troubled trip last out; the line underrates it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripTroubleVerdict {
    pub program_numbers: Vec<u8>,
    pub reason: String,
    pub confidence: DetectorConfidence,
}

/// Projected pace scenario with the runners it favors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaceVerdict {
    pub scenario: PaceScenario,
    pub advantaged: Vec<u8>,
    pub reason: String,
}

/// Explicit judgment on the morning-line favorite
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VulnerableFavoriteVerdict {
    pub program_number: u8,
    pub vulnerable: bool,
    pub reasons: Vec<String>,
    pub confidence: DetectorConfidence,
}

/// Field-spread reading of the race shape
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpreadVerdict {
    pub race_type: RaceType,
    /// Score gap between the top pair and the rest
    pub spread: f64,
    pub reason: String,
}

/// Horses dropping in class today
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassDropVerdict {
    pub program_numbers: Vec<u8>,
    pub levels: u8,
    pub reason: String,
}

/// The full set of detector outputs for one race, each optional
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectorSignals {
    #[serde(default)]
    pub trip_trouble: Option<TripTroubleVerdict>,
    #[serde(default)]
    pub pace: Option<PaceVerdict>,
    #[serde(default)]
    pub vulnerable_favorite: Option<VulnerableFavoriteVerdict>,
    #[serde(default)]
    pub field_spread: Option<FieldSpreadVerdict>,
    #[serde(default)]
    pub class_drop: Option<ClassDropVerdict>,
}

/// Favorite-status judgment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FavoriteStatus {
    Solid,
    Vulnerable,
}

/// Where a value-horse signal came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalSource {
    TripTrouble,
    PaceAdvantage,
    ClassDrop,
    VulnerableFavoriteBeneficiary,
}

impl SignalSource {
    /// Raw strength contributed by one source of this kind
    pub fn base_strength(&self) -> f64 {
        match self {
            SignalSource::TripTrouble => 30.0,
            SignalSource::PaceAdvantage => 35.0,
            SignalSource::ClassDrop => 30.0,
            SignalSource::VulnerableFavoriteBeneficiary => 45.0,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            SignalSource::TripTrouble => "trip trouble",
            SignalSource::PaceAdvantage => "pace advantage",
            SignalSource::ClassDrop => "class drop",
            SignalSource::VulnerableFavoriteBeneficiary => "vulnerable favorite beneficiary",
        }
    }
}

/// Bucketed signal strength, monotonic in raw strength
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalStrength {
    None,
    Weak,
    Moderate,
    Strong,
    VeryStrong,
}

impl SignalStrength {
    /// Bucket cutoffs: WEAK < 40, MODERATE 40-59, STRONG 60-79, VERY_STRONG >= 80
    pub fn from_raw(raw: f64) -> Self {
        if raw >= 80.0 {
            SignalStrength::VeryStrong
        } else if raw >= 60.0 {
            SignalStrength::Strong
        } else if raw >= 40.0 {
            SignalStrength::Moderate
        } else {
            SignalStrength::Weak
        }
    }
}

/// The single non-favorite a race-level recommendation elects to back
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueHorse {
    pub identified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub program_number: Option<u8>,
    pub signal_strength: SignalStrength,
    pub sources: Vec<SignalSource>,
    pub bot_convergence_count: usize,
    pub raw_strength: f64,
    pub reasoning: String,
}

impl ValueHorse {
    /// No qualifying evidence anywhere in the field
    pub fn none() -> Self {
        Self {
            identified: false,
            program_number: None,
            signal_strength: SignalStrength::None,
            sources: Vec::new(),
            bot_convergence_count: 0,
            raw_strength: 0.0,
            reasoning: "no qualifying detector signals".to_string(),
        }
    }
}

/// Judge the favorite solid or vulnerable from the detector evidence
///
/// An explicit vulnerable verdict at High confidence settles it. Otherwise
/// independent flags accumulate: each stated reason on the verdict, a pace
/// scenario working against the favorite, and a rival dropping in class.
/// Two or more flags mark the favorite vulnerable; a single weak flag
/// leaves it solid.
pub fn assess_favorite_status(signals: &DetectorSignals, favorite: u8) -> FavoriteStatus {
    let mut flags = 0usize;

    if let Some(verdict) = &signals.vulnerable_favorite {
        if verdict.vulnerable && verdict.program_number == favorite {
            if verdict.confidence == DetectorConfidence::High {
                return FavoriteStatus::Vulnerable;
            }
            flags += verdict.reasons.len().max(1);
        }
    }

    if let Some(pace) = &signals.pace {
        let pace_against = matches!(pace.scenario, PaceScenario::SpeedDuel | PaceScenario::Meltdown)
            && !pace.advantaged.contains(&favorite);
        if pace_against {
            flags += 1;
        }
    }

    if let Some(drop) = &signals.class_drop {
        if drop.program_numbers.iter().any(|&p| p != favorite) {
            flags += 1;
        }
    }

    if flags >= VULNERABILITY_FLAG_THRESHOLD {
        FavoriteStatus::Vulnerable
    } else {
        FavoriteStatus::Solid
    }
}

/// The asymmetric evidentiary decision table
///
/// Against a vulnerable favorite any single qualifying source suffices.
/// Against a solid favorite the horse needs converging bots or one
/// heavyweight signal; weak single-source evidence never overrides a
/// well-supported favorite.
fn qualifies(status: FavoriteStatus, convergence: usize, raw_strength: f64) -> bool {
    match status {
        FavoriteStatus::Vulnerable => convergence >= 1,
        FavoriteStatus::Solid => convergence >= 2 || raw_strength >= SOLID_SINGLE_SOURCE_STRENGTH,
    }
}

/// Identify the value horse, if the evidence supports one
///
/// # Arguments
/// * `signals` - detector outputs, each optional
/// * `ranking` - algorithm rank order of active runners, best first
/// * `favorite_status` - output of [`assess_favorite_status`]
///
/// The favorite is `ranking[0]` and is never a value-horse candidate. When
/// the favorite is vulnerable, the top-ranked non-favorite also collects the
/// beneficiary signal.
pub fn identify_value_horse(
    signals: &DetectorSignals,
    ranking: &[u8],
    favorite_status: FavoriteStatus,
) -> ValueHorse {
    if ranking.is_empty() {
        return ValueHorse::none();
    }
    let beneficiary = ranking.get(1).copied();

    let mut best: Option<(usize, f64, Vec<SignalSource>, u8)> = None;

    for (rank_pos, &horse) in ranking.iter().enumerate().skip(1) {
        let mut sources = Vec::new();

        if let Some(trip) = &signals.trip_trouble {
            if trip.program_numbers.contains(&horse) {
                sources.push(SignalSource::TripTrouble);
            }
        }
        if let Some(pace) = &signals.pace {
            if pace.advantaged.contains(&horse) {
                sources.push(SignalSource::PaceAdvantage);
            }
        }
        if let Some(drop) = &signals.class_drop {
            if drop.program_numbers.contains(&horse) {
                sources.push(SignalSource::ClassDrop);
            }
        }
        if favorite_status == FavoriteStatus::Vulnerable && Some(horse) == beneficiary {
            sources.push(SignalSource::VulnerableFavoriteBeneficiary);
        }

        if sources.is_empty() {
            continue;
        }

        let raw: f64 = sources.iter().map(|s| s.base_strength()).sum();
        if !qualifies(favorite_status, sources.len(), raw) {
            continue;
        }

        let better = match &best {
            None => true,
            // Strength first, then earlier ranking position
            Some((best_pos, best_raw, _, _)) => {
                raw > *best_raw || (raw == *best_raw && rank_pos < *best_pos)
            }
        };
        if better {
            best = Some((rank_pos, raw, sources, horse));
        }
    }

    match best {
        Some((_, raw, sources, horse)) => {
            let reasoning = sources
                .iter()
                .map(|s| format!("{} (+{})", s.label(), s.base_strength() as i64))
                .collect::<Vec<_>>()
                .join(", ");
            ValueHorse {
                identified: true,
                program_number: Some(horse),
                signal_strength: SignalStrength::from_raw(raw),
                bot_convergence_count: sources.len(),
                sources,
                raw_strength: raw,
                reasoning,
            }
        }
        None => ValueHorse::none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pace_for(horses: Vec<u8>) -> PaceVerdict {
        PaceVerdict {
            scenario: PaceScenario::LoneSpeed,
            advantaged: horses,
            reason: "lone early speed".to_string(),
        }
    }

    #[test]
    fn test_no_signals_leaves_favorite_solid() {
        let status = assess_favorite_status(&DetectorSignals::default(), 1);
        assert_eq!(status, FavoriteStatus::Solid);
    }

    #[test]
    fn test_high_confidence_verdict_is_decisive() {
        let signals = DetectorSignals {
            vulnerable_favorite: Some(VulnerableFavoriteVerdict {
                program_number: 1,
                vulnerable: true,
                reasons: vec!["poor recent form".to_string()],
                confidence: DetectorConfidence::High,
            }),
            ..Default::default()
        };
        assert_eq!(assess_favorite_status(&signals, 1), FavoriteStatus::Vulnerable);
        // Verdict about a different horse does not touch this favorite
        assert_eq!(assess_favorite_status(&signals, 2), FavoriteStatus::Solid);
    }

    #[test]
    fn test_single_weak_flag_stays_solid() {
        let signals = DetectorSignals {
            vulnerable_favorite: Some(VulnerableFavoriteVerdict {
                program_number: 1,
                vulnerable: true,
                reasons: vec!["short layoff".to_string()],
                confidence: DetectorConfidence::Low,
            }),
            ..Default::default()
        };
        assert_eq!(assess_favorite_status(&signals, 1), FavoriteStatus::Solid);
    }

    #[test]
    fn test_two_flags_accumulate_to_vulnerable() {
        let signals = DetectorSignals {
            vulnerable_favorite: Some(VulnerableFavoriteVerdict {
                program_number: 1,
                vulnerable: true,
                reasons: vec!["short layoff".to_string()],
                confidence: DetectorConfidence::Medium,
            }),
            pace: Some(PaceVerdict {
                scenario: PaceScenario::SpeedDuel,
                advantaged: vec![4],
                reason: "three-way duel up front".to_string(),
            }),
            ..Default::default()
        };
        assert_eq!(assess_favorite_status(&signals, 1), FavoriteStatus::Vulnerable);
    }

    #[test]
    fn test_two_verdict_reasons_count_as_two_flags() {
        let signals = DetectorSignals {
            vulnerable_favorite: Some(VulnerableFavoriteVerdict {
                program_number: 1,
                vulnerable: true,
                reasons: vec!["poor form".to_string(), "bad post".to_string()],
                confidence: DetectorConfidence::Medium,
            }),
            ..Default::default()
        };
        assert_eq!(assess_favorite_status(&signals, 1), FavoriteStatus::Vulnerable);
    }

    #[test]
    fn test_solid_favorite_rejects_single_weak_source() {
        // Single 35-point pace signal against a solid favorite: never enough
        let signals = DetectorSignals {
            pace: Some(pace_for(vec![3])),
            ..Default::default()
        };
        let vh = identify_value_horse(&signals, &[1, 2, 3, 4], FavoriteStatus::Solid);
        assert!(!vh.identified);
        assert_eq!(vh.signal_strength, SignalStrength::None);
    }

    #[test]
    fn test_vulnerable_favorite_accepts_the_same_source() {
        // The identical lone signal that a solid favorite shrugs off
        // qualifies once the favorite is vulnerable
        let signals = DetectorSignals {
            pace: Some(pace_for(vec![3])),
            ..Default::default()
        };
        let vh = identify_value_horse(&signals, &[1, 2, 3, 4], FavoriteStatus::Vulnerable);
        assert!(vh.identified);
        // The pace horse qualifies, but the top-ranked non-favorite carries
        // the heavier beneficiary signal and wins the election
        assert_eq!(vh.program_number, Some(2));

        // With the pace horse also the top non-favorite, the sources stack
        let signals = DetectorSignals {
            pace: Some(pace_for(vec![2])),
            ..Default::default()
        };
        let vh = identify_value_horse(&signals, &[1, 2, 3, 4], FavoriteStatus::Vulnerable);
        assert_eq!(vh.program_number, Some(2));
        assert_eq!(vh.raw_strength, 80.0);
        assert_eq!(vh.signal_strength, SignalStrength::VeryStrong);
    }

    #[test]
    fn test_solid_favorite_accepts_convergence() {
        let signals = DetectorSignals {
            pace: Some(pace_for(vec![3])),
            trip_trouble: Some(TripTroubleVerdict {
                program_numbers: vec![3],
                reason: "blocked in the stretch".to_string(),
                confidence: DetectorConfidence::Medium,
            }),
            ..Default::default()
        };
        let vh = identify_value_horse(&signals, &[1, 2, 3, 4], FavoriteStatus::Solid);
        assert!(vh.identified);
        assert_eq!(vh.program_number, Some(3));
        assert_eq!(vh.bot_convergence_count, 2);
        assert_eq!(vh.raw_strength, 65.0);
        assert_eq!(vh.signal_strength, SignalStrength::Strong);
    }

    #[test]
    fn test_beneficiary_goes_to_top_non_favorite() {
        let vh = identify_value_horse(
            &DetectorSignals::default(),
            &[1, 2, 3, 4],
            FavoriteStatus::Vulnerable,
        );
        assert!(vh.identified);
        assert_eq!(vh.program_number, Some(2));
        assert_eq!(vh.sources, vec![SignalSource::VulnerableFavoriteBeneficiary]);
    }

    #[test]
    fn test_strongest_candidate_wins() {
        let signals = DetectorSignals {
            pace: Some(pace_for(vec![4])),
            trip_trouble: Some(TripTroubleVerdict {
                program_numbers: vec![4],
                reason: "steadied twice".to_string(),
                confidence: DetectorConfidence::Medium,
            }),
            class_drop: Some(ClassDropVerdict {
                program_numbers: vec![2],
                levels: 1,
                reason: "drops out of allowance company".to_string(),
            }),
            ..Default::default()
        };
        // #4 carries 65 points against #2's 30+45
        let vh = identify_value_horse(&signals, &[1, 2, 3, 4], FavoriteStatus::Vulnerable);
        assert_eq!(vh.program_number, Some(2));
        assert_eq!(vh.raw_strength, 75.0);
    }

    #[test]
    fn test_strength_buckets() {
        assert_eq!(SignalStrength::from_raw(0.0), SignalStrength::Weak);
        assert_eq!(SignalStrength::from_raw(39.9), SignalStrength::Weak);
        assert_eq!(SignalStrength::from_raw(40.0), SignalStrength::Moderate);
        assert_eq!(SignalStrength::from_raw(59.9), SignalStrength::Moderate);
        assert_eq!(SignalStrength::from_raw(60.0), SignalStrength::Strong);
        assert_eq!(SignalStrength::from_raw(80.0), SignalStrength::VeryStrong);
    }

    #[test]
    fn test_empty_ranking_degrades_gracefully() {
        let vh = identify_value_horse(&DetectorSignals::default(), &[], FavoriteStatus::Solid);
        assert!(!vh.identified);
    }

    #[test]
    fn test_determinism() {
        let signals = DetectorSignals {
            pace: Some(pace_for(vec![3])),
            ..Default::default()
        };
        let a = identify_value_horse(&signals, &[1, 2, 3, 4], FavoriteStatus::Vulnerable);
        let b = identify_value_horse(&signals, &[1, 2, 3, 4], FavoriteStatus::Vulnerable);
        assert_eq!(a.program_number, b.program_number);
        assert_eq!(a.raw_strength, b.raw_strength);
        assert_eq!(a.reasoning, b.reasoning);
    }
}
