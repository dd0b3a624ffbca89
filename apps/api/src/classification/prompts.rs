// Prompt template for job post classification.
// Reuses cross-cutting fragments from llm_client::prompts.

use crate::llm_client::prompts::{MANAGEMENT_RULE, RESULT_SCHEMA_INSTRUCTION};

/// Classification prompt. Placeholders: `{management_rule}`, `{result_schema}`,
/// `{include_explanation}`, `{hints}`, `{job_post_title}`, `{job_post_description}`.
pub const CLASSIFY_PROMPT_TEMPLATE: &str = "\
Classify the following job post into an O*NET-SOC occupation. Include the occupation code, \
title, and a short one paragraph explanation for the classification. Do not include source \
references. Consider the career pathway and cluster for the occupation. {management_rule}

{result_schema}

agent should include explanation: {include_explanation}

additional hints: {hints}

job post title: {job_post_title}
job post description: {job_post_description}
";

pub struct PromptArgs<'a> {
    pub job_post_title: &'a str,
    pub job_post_description: &'a str,
    pub include_explanation: bool,
    pub hints: Option<&'a str>,
}

/// Fills the template. User-supplied fields are substituted back to front, so
/// each `find` only ever sees template text ahead of its placeholder and
/// placeholder-looking text inside a job post is never expanded.
pub fn build_classify_prompt(args: &PromptArgs<'_>) -> String {
    let hints = args.hints.map(str::trim).unwrap_or_default();

    let mut prompt = CLASSIFY_PROMPT_TEMPLATE
        .replace("{management_rule}", MANAGEMENT_RULE)
        .replace("{result_schema}", RESULT_SCHEMA_INSTRUCTION)
        .replace("{include_explanation}", &args.include_explanation.to_string());

    for (placeholder, value) in [
        ("{job_post_description}", args.job_post_description.trim()),
        ("{job_post_title}", args.job_post_title.trim()),
        ("{hints}", hints),
    ] {
        if let Some(at) = prompt.find(placeholder) {
            prompt.replace_range(at..at + placeholder.len(), value);
        }
    }

    prompt
}
