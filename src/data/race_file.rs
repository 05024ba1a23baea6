//! Race-file JSON loading
//!
//! A race file is a serialized [`RecommendRequest`]; a batch file is a JSON
//! array of them. This is a CLI input convenience only; the core consumes
//! in-memory values and owns no file format.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::models::RecommendRequest;

/// Race-file loading failures
#[derive(Debug, Error)]
pub enum RaceFileError {
    #[error("failed to read race file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse race file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid race file: {0}")]
    Invalid(String),
}

/// Load and validate a single-race file
pub fn load_race_file<P: AsRef<Path>>(path: P) -> Result<RecommendRequest, RaceFileError> {
    let content = fs::read_to_string(path)?;
    let request: RecommendRequest = serde_json::from_str(&content)?;
    validate_request(&request)?;
    Ok(request)
}

/// Load and validate a batch file (a JSON array of races)
pub fn load_batch_file<P: AsRef<Path>>(path: P) -> Result<Vec<RecommendRequest>, RaceFileError> {
    let content = fs::read_to_string(path)?;
    let requests: Vec<RecommendRequest> = serde_json::from_str(&content)?;
    for (i, request) in requests.iter().enumerate() {
        validate_request(request)
            .map_err(|e| RaceFileError::Invalid(format!("race {}: {}", i, e)))?;
    }
    Ok(requests)
}

fn validate_request(request: &RecommendRequest) -> Result<(), RaceFileError> {
    if request.horses.len() < 2 {
        return Err(RaceFileError::Invalid(format!(
            "at least 2 horses required, got {}",
            request.horses.len()
        )));
    }

    let mut seen = HashSet::new();
    for horse in &request.horses {
        if horse.program_number == 0 {
            return Err(RaceFileError::Invalid(
                "program numbers start at 1".to_string(),
            ));
        }
        if !seen.insert(horse.program_number) {
            return Err(RaceFileError::Invalid(format!(
                "duplicate program number {}",
                horse.program_number
            )));
        }
    }
    Ok(())
}
