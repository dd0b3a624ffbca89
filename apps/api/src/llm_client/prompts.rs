// Shared prompt fragments. Each service that needs agent calls defines its
// own prompts.rs alongside it; this file holds the cross-cutting pieces.

/// Output contract appended to every classification prompt. Kept in sync with
/// `classification::schema`, which enforces it on the way back.
pub const RESULT_SCHEMA_INSTRUCTION: &str = r#"Return the results as a single JSON object with this EXACT schema (no extra text):
{
  "job_classifications": [
    {
      "occupation_code": "NN-NNNN.NN",
      "occupation_title": "exact O*NET-SOC occupation title, at most 80 characters",
      "explanation": "optional, at most 1000 characters"
    }
  ],
  "overall_explanation": "optional, at most 1000 characters"
}
Return at most 3 job_classifications, strongest match first. Return an empty list if no occupation fits."#;

/// Applied to every classification. Mirrors the assistant's standing instructions.
pub const MANAGEMENT_RULE: &str = "Put people manager titles into management occupations.";
