//! Core wagering-decision modules

pub mod kelly;
pub mod market;
pub mod overlay;
pub mod signals;
pub mod sizing;
pub mod ticket;

// Re-export commonly used types
pub use kelly::{calculate_kelly, KellyFraction, KellyInput, KellyOutput};
pub use market::{normalize_field, parse_odds, MarketHorse};
pub use overlay::{analyze_overlay, detect_value_plays, OverlayAnalysis, ValueClass, ValuePlay};
pub use signals::{DetectorSignals, FavoriteStatus, RaceType, SignalStrength, ValueHorse};
pub use sizing::{adjust_for_simultaneous_bets, size_bet, AdjustedBet, SizedBet, SizingConfig};
pub use ticket::{
    build_ticket_construction, recommend_race, ConfidenceTier, RaceRecommendation,
    TicketConstruction, TicketTemplate,
};
