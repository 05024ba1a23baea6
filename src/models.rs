use serde::{Deserialize, Serialize};

use crate::core::market::{parse_odds, MarketHorse};
use crate::core::overlay::{HorseMarketView, ValuePlay, ValuePlaysSummary};
use crate::core::signals::DetectorSignals;
use crate::core::sizing::SizingConfig;
use crate::core::ticket::{RaceRecommendation, TicketConstruction, ValueHorseStake};

/// One horse on the race card as supplied by the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HorseEntry {
    pub program_number: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Raw score from the external algorithm
    pub score: f64,
    #[serde(default)]
    pub scratched: bool,
    /// Odds in any supported format: "5-1", "5/2", "EVEN", "+300", "8"
    pub odds: String,
}

/// Race recommendation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub race_id: Option<String>,
    pub horses: Vec<HorseEntry>,
    #[serde(default)]
    pub detectors: DetectorSignals,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bankroll: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sizing: Option<SizingConfig>,
    /// Overlay threshold (percent) for value-play highlighting
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_overlay: Option<f64>,
}

impl RecommendRequest {
    /// Resolve odds strings into the core's per-horse market view
    pub fn to_market_views(&self) -> Vec<HorseMarketView> {
        self.horses
            .iter()
            .map(|h| HorseMarketView {
                program_number: h.program_number,
                score: h.score,
                scratched: h.scratched,
                decimal_odds: parse_odds(&h.odds),
            })
            .collect()
    }
}

/// Race recommendation response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub race_id: Option<String>,
    pub field_size: usize,
    pub market: Vec<MarketHorse>,
    pub overlays: Vec<ValuePlay>,
    pub overlay_summary: ValuePlaysSummary,
    pub ticket: TicketConstruction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub staking: Option<ValueHorseStake>,
}

impl RecommendResponse {
    pub fn from_recommendation(race_id: Option<String>, rec: RaceRecommendation) -> Self {
        Self {
            race_id,
            field_size: rec.field_size,
            market: rec.market,
            overlays: rec.overlays,
            overlay_summary: rec.overlay_summary,
            ticket: rec.ticket,
            staking: rec.staking,
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub engine: String,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_parses_mixed_odds_formats() {
        let req = RecommendRequest {
            race_id: Some("AQU-3".to_string()),
            horses: vec![
                HorseEntry {
                    program_number: 1,
                    name: Some("Quiet Storm".to_string()),
                    score: 180.0,
                    scratched: false,
                    odds: "EVEN".to_string(),
                },
                HorseEntry {
                    program_number: 2,
                    name: None,
                    score: 140.0,
                    scratched: false,
                    odds: "+300".to_string(),
                },
                HorseEntry {
                    program_number: 3,
                    name: None,
                    score: 120.0,
                    scratched: true,
                    odds: "nonsense".to_string(),
                },
            ],
            detectors: DetectorSignals::default(),
            bankroll: None,
            sizing: None,
            min_overlay: None,
        };

        let views = req.to_market_views();
        assert_eq!(views[0].decimal_odds, 2.0);
        assert_eq!(views[1].decimal_odds, 4.0);
        // Unparseable odds fall back to even money rather than failing
        assert_eq!(views[2].decimal_odds, 2.0);
        assert!(views[2].scratched);
    }

    #[test]
    fn test_request_deserializes_with_defaults() {
        let json = r#"{
            "horses": [
                {"program_number": 1, "score": 160.0, "odds": "5-2"},
                {"program_number": 2, "score": 130.0, "odds": "4-1"}
            ]
        }"#;
        let req: RecommendRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.horses.len(), 2);
        assert!(req.race_id.is_none());
        assert!(req.detectors.pace.is_none());
        assert!(!req.horses[0].scratched);
    }
}
