//! Job recommendation pipeline.
//!
//! Flow: CvSource → prompt → assemble (CV document, if any) → generate →
//!       parse JSON report → clamp, rank, truncate.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::chat::prompt::{assemble, UploadPolicy};
use crate::errors::AppError;
use crate::llm_client::prompts::JSON_ONLY_INSTRUCTION;
use crate::llm_client::{strip_json_fences, GatewayError, ModelGateway};
use crate::recommend::extract::CvSource;
use crate::recommend::prompts::{
    CV_ATTACHED_PLACEHOLDER, NO_PREFERENCES, RECOMMEND_PROMPT_TEMPLATE,
};

pub const DEFAULT_RECOMMENDATION_COUNT: usize = 5;
pub const MAX_RECOMMENDATION_COUNT: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecommendation {
    pub title: String,
    #[serde(default)]
    pub seniority: String,
    /// 0 – 100
    pub match_score: u8,
    pub rationale: String,
    #[serde(default)]
    pub matching_skills: Vec<String>,
    #[serde(default)]
    pub skills_to_develop: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationReport {
    pub candidate_summary: String,
    pub recommendations: Vec<JobRecommendation>,
}

/// Wire shape before validation; the model may return fractional or
/// out-of-range scores.
#[derive(Debug, Deserialize)]
struct RawReport {
    candidate_summary: String,
    recommendations: Vec<RawRecommendation>,
}

#[derive(Debug, Deserialize)]
struct RawRecommendation {
    title: String,
    #[serde(default)]
    seniority: String,
    match_score: f64,
    rationale: String,
    #[serde(default)]
    matching_skills: Vec<String>,
    #[serde(default)]
    skills_to_develop: Vec<String>,
}

pub fn build_prompt(cv_text: &str, preferences: Option<&str>, count: usize) -> String {
    let preferences = preferences
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .unwrap_or(NO_PREFERENCES);
    let body = RECOMMEND_PROMPT_TEMPLATE
        .replace("{count}", &count.to_string())
        .replace("{preferences}", preferences)
        .replace("{cv_text}", cv_text);
    format!("{JSON_ONLY_INSTRUCTION}\n\n{body}")
}

/// Parses the model reply, keeping at most `count` recommendations by score.
pub fn parse_report(reply: &str, count: usize) -> Result<RecommendationReport, AppError> {
    let raw: RawReport = serde_json::from_str(strip_json_fences(reply))
        .map_err(|e| AppError::Llm(format!("Recommendation reply was not valid JSON: {e}")))?;

    let mut recommendations: Vec<JobRecommendation> = raw
        .recommendations
        .into_iter()
        .filter(|r| !r.title.trim().is_empty())
        .map(|r| JobRecommendation {
            title: r.title.trim().to_string(),
            seniority: r.seniority,
            match_score: r.match_score.round().clamp(0.0, 100.0) as u8,
            rationale: r.rationale,
            matching_skills: r.matching_skills,
            skills_to_develop: r.skills_to_develop,
        })
        .collect();

    // stable: equal scores keep the model's order
    recommendations.sort_by(|a, b| b.match_score.cmp(&a.match_score));
    recommendations.truncate(count);

    Ok(RecommendationReport {
        candidate_summary: raw.candidate_summary,
        recommendations,
    })
}

pub async fn recommend_jobs(
    gateway: &dyn ModelGateway,
    policy: &UploadPolicy,
    cv: CvSource,
    preferences: Option<&str>,
    count: usize,
) -> Result<RecommendationReport, AppError> {
    if !gateway.status().await.ready {
        return Err(GatewayError::NotConfigured.into());
    }

    let (prompt, attachments) = match cv {
        CvSource::Text(text) => (build_prompt(&text, preferences, count), Vec::new()),
        CvSource::Document(attachment) => (
            build_prompt(CV_ATTACHED_PLACEHOLDER, preferences, count),
            vec![attachment],
        ),
    };

    let content = assemble(&prompt, &attachments, policy, gateway).await?;
    let reply = gateway.generate(&content).await?;
    let report = parse_report(&reply, count)?;

    info!(
        "Generated {} job recommendations",
        report.recommendations.len()
    );
    Ok(report)
}
