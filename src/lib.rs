//! Railbird - Horse race wagering decision engine
//!
//! This library provides:
//! - Market odds parsing, overround stripping, and vig-free probabilities
//! - Overlay/value detection from an external algorithm score
//! - Kelly criterion bet sizing with practical caps and exposure limits
//! - Detector-signal aggregation into a ticket recommendation
//!
//! # Example
//!
//! ```
//! use railbird::core::kelly::calculate_kelly;
//! use railbird::core::market::parse_odds;
//!
//! let odds = parse_odds("5-1");
//! let kelly = calculate_kelly(0.25, odds, 500.0);
//! assert!(kelly.should_bet);
//! println!("Suggested stake: {}", kelly.suggested_bet_size);
//! ```

pub mod core;
pub mod data;
pub mod models;

// API-specific modules (only available with api feature)
#[cfg(feature = "api")]
pub mod error;

// Re-export commonly used types
pub use crate::core::kelly::{calculate_kelly, KellyFraction, KellyOutput};
pub use crate::core::market::parse_odds;
pub use crate::core::signals::{DetectorSignals, FavoriteStatus};
pub use crate::core::ticket::{
    recommend_race, RaceRecommendation, TicketConstruction, TicketTemplate,
};
pub use data::{load_batch_file, load_race_file, RaceFileError};
pub use models::{HorseEntry, RecommendRequest, RecommendResponse};
