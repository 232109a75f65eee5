//! LLM mode (spec §4.11.2): a second LLM judges the script against a JSON
//! output contract. Parsing is layered — fenced block, then bare JSON, then
//! a structured-text fallback — generalizing the teacher's
//! `extract_json_output` (which only tried fenced-then-bare) with a third
//! stage, since this contract's failure mode (a chatty model prefacing its
//! JSON with commentary, or skipping the braces entirely) is exactly what
//! the spec calls out as needing a fallback.

use broadcast_core::{IssueSeverity, ValidationIssue, ValidationMode, ValidationReport};
use regex::Regex;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct LlmIssuePayload {
    severity: String,
    category: String,
    message: String,
    #[serde(default)]
    confidence: f32,
}

#[derive(Debug, Deserialize)]
struct LlmValidationPayload {
    is_valid: bool,
    overall_score: f32,
    #[serde(default)]
    issues: Vec<LlmIssuePayload>,
    #[serde(default)]
    feedback: String,
}

fn parse_severity(raw: &str) -> IssueSeverity {
    match raw.to_lowercase().as_str() {
        "critical" => IssueSeverity::Critical,
        "suggestion" => IssueSeverity::Suggestion,
        _ => IssueSeverity::Warning,
    }
}

/// Stage 1: a fenced ```json ... ``` block, same extraction strategy as the
/// teacher's `extract_json_output`.
fn extract_fenced_json(response: &str) -> Option<&str> {
    let fence_start = response.find("```json")?;
    let after_fence = &response[fence_start + "```json".len()..];
    let json_start = after_fence.find(|c: char| !c.is_whitespace())?;
    let json_body = &after_fence[json_start..];
    let fence_end = json_body.find("```")?;
    Some(json_body[..fence_end].trim())
}

/// Stage 2: the first `{` through the last `}` in the response.
fn extract_bare_json(response: &str) -> Option<&str> {
    let trimmed = response.trim();
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end > start {
        Some(&trimmed[start..=end])
    } else {
        None
    }
}

/// Stage 3: structured-text fallback recognising `is_valid: ...`,
/// `score: ...`, and an `issues:` section with `- severity: ..., category:
/// ..., message: ...` bullet lines.
fn parse_structured_text(response: &str) -> Option<LlmValidationPayload> {
    let is_valid_re = Regex::new(r"(?i)is_valid\s*:\s*(true|false)").ok()?;
    let score_re = Regex::new(r"(?i)(?:overall_)?score\s*:\s*([01](?:\.\d+)?)").ok()?;
    let bullet_re = Regex::new(
        r"(?i)-\s*severity\s*:\s*(\w+)\s*,?\s*category\s*:\s*([\w-]+)\s*,?\s*message\s*:\s*([^\n]+)",
    )
    .ok()?;

    let is_valid = is_valid_re.captures(response)?.get(1)?.as_str().eq_ignore_ascii_case("true");
    let overall_score = score_re
        .captures(response)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(if is_valid { 0.7 } else { 0.3 });

    let issues = bullet_re
        .captures_iter(response)
        .map(|c| LlmIssuePayload {
            severity: c[1].to_string(),
            category: c[2].to_string(),
            message: c[3].trim().to_string(),
            confidence: 0.5,
        })
        .collect();

    Some(LlmValidationPayload { is_valid, overall_score, issues, feedback: String::new() })
}

fn parse_llm_validation(response: &str) -> Option<LlmValidationPayload> {
    if let Some(candidate) = extract_fenced_json(response) {
        if let Ok(payload) = serde_json::from_str(candidate) {
            return Some(payload);
        }
    }
    if let Some(candidate) = extract_bare_json(response) {
        if let Ok(payload) = serde_json::from_str(candidate) {
            return Some(payload);
        }
    }
    parse_structured_text(response)
}

/// Converts a raw LLM validator response into a [`ValidationReport`]. A
/// response that fails every parse stage becomes a synthetic valid result
/// carrying one "parser-failure" warning (spec §4.11.2) — this function
/// never returns an error.
pub fn report_from_llm_response(response: &str) -> ValidationReport {
    match parse_llm_validation(response) {
        Some(payload) => ValidationReport {
            mode: ValidationMode::Llm,
            is_valid: payload.is_valid,
            score: Some(payload.overall_score),
            issues: payload
                .issues
                .into_iter()
                .map(|i| ValidationIssue {
                    severity: parse_severity(&i.severity),
                    category: i.category,
                    message: i.message,
                    confidence: i.confidence,
                })
                .collect(),
            flags: vec![],
        },
        None => ValidationReport {
            mode: ValidationMode::Llm,
            is_valid: true,
            score: None,
            issues: vec![ValidationIssue {
                severity: IssueSeverity::Warning,
                category: "parser-failure".to_string(),
                message: "could not parse validator LLM response".to_string(),
                confidence: 0.0,
            }],
            flags: vec!["parser-failure".to_string()],
        },
    }
}

pub fn render_validation_prompt(script: &str, dj_name: &str) -> String {
    format!(
        "You are reviewing a radio script written by {dj_name}. Respond with JSON only: \
{{\"is_valid\": bool, \"overall_score\": number 0-1, \"issues\": \
[{{\"severity\": \"critical|warning|suggestion\", \"category\": string, \"message\": string, \"confidence\": number 0-1}}], \
\"feedback\": string}}.\n\nScript:\n{script}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fenced_json_block() {
        let raw = "Sure thing!\n```json\n{\"is_valid\": true, \"overall_score\": 0.9, \"issues\": [], \"feedback\": \"good\"}\n```";
        let report = report_from_llm_response(raw);
        assert!(report.is_valid);
        assert_eq!(report.score, Some(0.9));
    }

    #[test]
    fn parses_bare_json_without_fence() {
        let raw = "{\"is_valid\": false, \"overall_score\": 0.2, \"issues\": [{\"severity\": \"critical\", \"category\": \"temporal\", \"message\": \"bad year\", \"confidence\": 0.9}], \"feedback\": \"no\"}";
        let report = report_from_llm_response(raw);
        assert!(!report.is_valid);
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].severity, IssueSeverity::Critical);
    }

    #[test]
    fn falls_back_to_structured_text() {
        let raw = "is_valid: false\nscore: 0.4\nissues:\n- severity: warning, category: format, message: too short\n";
        let report = report_from_llm_response(raw);
        assert!(!report.is_valid);
        assert_eq!(report.score, Some(0.4));
        assert_eq!(report.issues.len(), 1);
    }

    #[test]
    fn unparseable_response_becomes_synthetic_valid_with_warning() {
        let report = report_from_llm_response("I refuse to answer in JSON today.");
        assert!(report.is_valid);
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].category, "parser-failure");
    }
}
