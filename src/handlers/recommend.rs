use actix_web::{web, HttpResponse};
use std::sync::Arc;
use tracing::info;

use crate::AppState;
use railbird::core::ticket::recommend_race;
use railbird::error::{
    validate_bankroll, validate_field_size, validate_min_overlay, validate_program_numbers,
    AppError,
};
use railbird::models::{RecommendRequest, RecommendResponse};

/// Full race recommendation: market, overlays, ticket, staking
pub async fn recommend(
    state: web::Data<Arc<AppState>>,
    req: web::Json<RecommendRequest>,
) -> Result<HttpResponse, AppError> {
    validate_request(&req)?;

    let min_overlay = req.min_overlay.unwrap_or(state.default_min_overlay);
    let horses = req.to_market_views();
    let recommendation = recommend_race(
        &horses,
        &req.detectors,
        req.bankroll,
        req.sizing.as_ref(),
        min_overlay,
    );

    info!(
        race_id = req.race_id.as_deref().unwrap_or("-"),
        template = ?recommendation.ticket.template,
        confidence = recommendation.ticket.confidence_score,
        "race recommendation"
    );

    let response = RecommendResponse::from_recommendation(req.race_id.clone(), recommendation);
    Ok(HttpResponse::Ok().json(response))
}

/// Overlay analysis only, without the ticket recommendation
pub async fn recommend_overlays(
    state: web::Data<Arc<AppState>>,
    req: web::Json<RecommendRequest>,
) -> Result<HttpResponse, AppError> {
    validate_request(&req)?;

    let min_overlay = req.min_overlay.unwrap_or(state.default_min_overlay);
    let horses = req.to_market_views();
    let recommendation = recommend_race(&horses, &req.detectors, None, None, min_overlay);

    Ok(HttpResponse::Ok().json(recommendation.overlays))
}

fn validate_request(req: &RecommendRequest) -> Result<(), AppError> {
    validate_field_size(req.horses.len())?;
    let programs: Vec<u8> = req.horses.iter().map(|h| h.program_number).collect();
    validate_program_numbers(&programs)?;
    if let Some(bankroll) = req.bankroll {
        validate_bankroll(bankroll)?;
    }
    if let Some(min_overlay) = req.min_overlay {
        validate_min_overlay(min_overlay)?;
    }
    Ok(())
}
