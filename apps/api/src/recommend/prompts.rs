// Recommendation prompt templates.

pub const RECOMMEND_PROMPT_TEMPLATE: &str = r#"You are an experienced technical recruiter and career advisor.
Read the candidate's CV and recommend the {count} job roles they are best suited for right now.

CANDIDATE PREFERENCES:
{preferences}

CV:
{cv_text}

OUTPUT SCHEMA (return exactly this structure):
{
  "candidate_summary": "string (2-3 sentences on the candidate's profile)",
  "recommendations": [
    {
      "title": "string (job title)",
      "seniority": "string (e.g. junior, mid, senior, lead)",
      "match_score": number (0-100, how well the CV fits today),
      "rationale": "string (why this role fits, citing the CV)",
      "matching_skills": ["string"],
      "skills_to_develop": ["string"]
    }
  ]
}

RULES:
1. Base every rationale on evidence in the CV. Do NOT invent experience.
2. Respect the candidate preferences when they are given.
3. Order recommendations from best to weakest fit.
4. Return ONLY the JSON object — nothing else, no code fences."#;

/// Stands in for the CV body when the CV is attached as a document instead.
pub const CV_ATTACHED_PLACEHOLDER: &str = "(The CV is attached as a PDF document.)";

pub const NO_PREFERENCES: &str = "None given.";
