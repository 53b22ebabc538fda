//! Axum route handlers for the Recommendation API.

use axum::{
    extract::{Multipart, State},
    Json,
};

use crate::errors::AppError;
use crate::recommend::extract::extract_cv;
use crate::recommend::recommender::{
    recommend_jobs, RecommendationReport, DEFAULT_RECOMMENDATION_COUNT,
    MAX_RECOMMENDATION_COUNT,
};
use crate::routes::form::read_upload_form;
use crate::state::AppState;

/// POST /api/v1/recommendations
///
/// `multipart/form-data`: a `cv` file (PDF or plain text), optional
/// `preferences` text and optional `count` (1 – 10).
pub async fn handle_recommend(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<RecommendationReport>, AppError> {
    let mut form = read_upload_form(multipart).await?;

    let count = parse_count(form.field("count"))?;
    let preferences = form.field("preferences").map(str::to_string);
    let cv = form
        .take_files("cv")
        .into_iter()
        .next()
        .ok_or_else(|| AppError::Validation("a `cv` file is required".to_string()))?;

    let cv = extract_cv(cv).await?;
    let report = recommend_jobs(
        state.gateway.as_ref(),
        &state.upload_policy,
        cv,
        preferences.as_deref(),
        count,
    )
    .await?;

    Ok(Json(report))
}

fn parse_count(raw: Option<&str>) -> Result<usize, AppError> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(DEFAULT_RECOMMENDATION_COUNT);
    };
    match raw.parse::<usize>() {
        Ok(n) if (1..=MAX_RECOMMENDATION_COUNT).contains(&n) => Ok(n),
        _ => Err(AppError::Validation(format!(
            "count must be between 1 and {MAX_RECOMMENDATION_COUNT}, got '{raw}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count(None).unwrap(), DEFAULT_RECOMMENDATION_COUNT);
        assert_eq!(parse_count(Some(" ")).unwrap(), DEFAULT_RECOMMENDATION_COUNT);
        assert_eq!(parse_count(Some("3")).unwrap(), 3);
        assert!(parse_count(Some("0")).is_err());
        assert!(parse_count(Some("11")).is_err());
        assert!(parse_count(Some("many")).is_err());
    }
}
