//! Judgment endpoints

use axum::extract::State;

use super::state::AppState;
use super::types::judge::{BulkJudgeItem, BulkJudgeRequest, JudgeRequest, JudgeResponse};
use super::types::{ApiError, Json};

/// Judge a single sentence pair
pub async fn judge(
    State(state): State<AppState>,
    Json(request): Json<JudgeRequest>,
) -> Result<Json<JudgeResponse>, ApiError> {
    let (sentence1, sentence2) = require_pair(&request)?;

    let outcome = state.judge_service.judge(sentence1, sentence2).await?;

    Ok(Json(outcome.into()))
}

/// Judge a batch of sentence pairs, returning results in input order
pub async fn judge_bulk(
    State(state): State<AppState>,
    Json(request): Json<BulkJudgeRequest>,
) -> Result<Json<Vec<BulkJudgeItem>>, ApiError> {
    let pairs = match request.pairs {
        Some(pairs) if !pairs.is_empty() => pairs,
        _ => return Err(ApiError::bad_request("'pairs' must be a non-empty list").with_param("pairs")),
    };

    if pairs.len() > state.max_bulk_pairs {
        return Err(ApiError::bad_request(format!(
            "'pairs' cannot contain more than {} items",
            state.max_bulk_pairs
        ))
        .with_param("pairs"));
    }

    // every pair must be well-formed before any embedding work starts
    let pairs: Vec<(String, String)> = pairs
        .iter()
        .map(|pair| {
            let (s1, s2) = require_pair(pair)?;
            Ok((s1.to_string(), s2.to_string()))
        })
        .collect::<Result<_, ApiError>>()?;

    let outcomes = state.judge_service.judge_bulk(&pairs).await?;

    Ok(Json(outcomes.into_iter().map(Into::into).collect()))
}

fn require_pair(request: &JudgeRequest) -> Result<(&str, &str), ApiError> {
    match (&request.sentence1, &request.sentence2) {
        (Some(s1), Some(s2)) => Ok((s1, s2)),
        _ => Err(ApiError::bad_request(
            "Both 'sentence1' and 'sentence2' are required",
        )),
    }
}
