//! Hybrid mode (spec §4.11.3, default): rules first, critical short-circuit,
//! then an LLM pass under a wall-clock budget.

use std::time::Duration;

use broadcast_config::ValidationConfig;
use broadcast_core::{Personality, ValidationMode, ValidationReport};
use broadcast_llm::{GenerationClient, GenerationRequest};

use crate::llm_mode::{render_validation_prompt, report_from_llm_response};
use crate::rules::validate_rules;

fn merge(rules: ValidationReport, llm: ValidationReport) -> ValidationReport {
    let is_valid = rules.is_valid && llm.is_valid;
    let mut issues = rules.issues;
    issues.extend(llm.issues);
    let mut flags = rules.flags;
    flags.extend(llm.flags);
    ValidationReport { mode: ValidationMode::Hybrid, is_valid, score: llm.score, issues, flags }
}

/// Runs rules, then conditionally the LLM pass, per spec §4.11.3.
pub async fn validate_hybrid(
    script: &str,
    personality: &Personality,
    config: &ValidationConfig,
    model: &str,
    client: &dyn GenerationClient,
) -> ValidationReport {
    let rules_report = validate_rules(script, personality, config);

    if rules_report.critical_count() >= config.critical_short_circuit_threshold {
        return ValidationReport {
            mode: ValidationMode::Hybrid,
            is_valid: false,
            score: rules_report.score,
            issues: rules_report.issues,
            flags: rules_report.flags,
        };
    }

    let prompt = render_validation_prompt(script, &personality.name);
    let request = GenerationRequest { model: model.to_string(), prompt, temperature: 0.0, max_tokens: 400 };

    let budget = Duration::from_secs(config.llm_budget_secs);
    match tokio::time::timeout(budget, client.generate(&request)).await {
        Ok(Ok(response)) => merge(rules_report, report_from_llm_response(&response.text)),
        Ok(Err(_)) => merge(
            rules_report,
            ValidationReport {
                mode: ValidationMode::Llm,
                is_valid: false,
                score: None,
                issues: vec![broadcast_core::ValidationIssue {
                    severity: broadcast_core::IssueSeverity::Warning,
                    category: "llm-unavailable".to_string(),
                    message: "validation LLM call failed".to_string(),
                    confidence: 0.0,
                }],
                flags: vec!["llm-unavailable".to_string()],
            },
        ),
        Err(_) => merge(
            rules_report,
            ValidationReport {
                mode: ValidationMode::Llm,
                is_valid: false,
                score: None,
                issues: vec![broadcast_core::ValidationIssue {
                    severity: broadcast_core::IssueSeverity::Warning,
                    category: "llm-timeout".to_string(),
                    message: format!("validation LLM exceeded {}s budget", config.llm_budget_secs),
                    confidence: 0.0,
                }],
                flags: vec!["llm-timeout".to_string()],
            },
        ),
    }
}

/// Runs the LLM pass alone, with no rules pass and no short-circuit (spec
/// §4.11.2 pure LLM mode). Shares the timeout/transport-failure handling
/// with [`validate_hybrid`] since both call the same validator model under
/// the same budget.
pub async fn validate_llm(
    script: &str,
    personality: &Personality,
    config: &ValidationConfig,
    model: &str,
    client: &dyn GenerationClient,
) -> ValidationReport {
    let prompt = render_validation_prompt(script, &personality.name);
    let request = GenerationRequest { model: model.to_string(), prompt, temperature: 0.0, max_tokens: 400 };

    let budget = Duration::from_secs(config.llm_budget_secs);
    match tokio::time::timeout(budget, client.generate(&request)).await {
        Ok(Ok(response)) => report_from_llm_response(&response.text),
        Ok(Err(_)) => ValidationReport {
            mode: ValidationMode::Llm,
            is_valid: false,
            score: None,
            issues: vec![broadcast_core::ValidationIssue {
                severity: broadcast_core::IssueSeverity::Warning,
                category: "llm-unavailable".to_string(),
                message: "validation LLM call failed".to_string(),
                confidence: 0.0,
            }],
            flags: vec!["llm-unavailable".to_string()],
        },
        Err(_) => ValidationReport {
            mode: ValidationMode::Llm,
            is_valid: false,
            score: None,
            issues: vec![broadcast_core::ValidationIssue {
                severity: broadcast_core::IssueSeverity::Warning,
                category: "llm-timeout".to_string(),
                message: format!("validation LLM exceeded {}s budget", config.llm_budget_secs),
                confidence: 0.0,
            }],
            flags: vec!["llm-timeout".to_string()],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use broadcast_core::BroadcastError;
    use broadcast_llm::GenerationResponse;

    struct StubClient {
        response_text: String,
    }

    #[async_trait]
    impl GenerationClient for StubClient {
        async fn generate(&self, _request: &GenerationRequest) -> Result<GenerationResponse, BroadcastError> {
            Ok(GenerationResponse { text: self.response_text.clone(), prompt_tokens: 0, completion_tokens: 0 })
        }
    }

    fn personality() -> Personality {
        Personality {
            name: "Julie".to_string(),
            year_dj: 2102,
            region: "appalachia".to_string(),
            forbidden_factions: vec!["enclave".to_string()],
            forbidden_content_types: vec![],
            region_allow: vec!["appalachia".to_string()],
            catchphrases: vec![],
            filler_words: vec![],
            taboo_words: vec![],
            default_mood: vec![],
        }
    }

    #[tokio::test]
    async fn two_critical_rule_issues_short_circuit_the_llm_pass() {
        let config = ValidationConfig::default();
        let client = StubClient { response_text: "{\"is_valid\": true, \"overall_score\": 1.0, \"issues\": [], \"feedback\": \"\"}".to_string() };
        let report = validate_hybrid(
            "Breaking news from 2287: the Enclave is back in town today.",
            &personality(),
            &config,
            "llama3.1:8b",
            &client,
        )
        .await;
        assert!(!report.is_valid);
        assert_eq!(report.mode, ValidationMode::Hybrid);
    }

    #[tokio::test]
    async fn llm_only_mode_ignores_rule_violations() {
        let config = ValidationConfig::default();
        let client = StubClient { response_text: "{\"is_valid\": true, \"overall_score\": 0.8, \"issues\": [], \"feedback\": \"\"}".to_string() };
        let report = validate_llm(
            "Breaking news from 2287: the Enclave is back in town today.",
            &personality(),
            &config,
            "llama3.1:8b",
            &client,
        )
        .await;
        assert!(report.is_valid);
        assert_eq!(report.mode, ValidationMode::Llm);
    }

    #[tokio::test]
    async fn clean_script_merges_rules_and_llm_results() {
        let config = ValidationConfig::default();
        let client = StubClient { response_text: "{\"is_valid\": true, \"overall_score\": 0.95, \"issues\": [], \"feedback\": \"great\"}".to_string() };
        let report = validate_hybrid(
            "The settlers gathered at dusk to share stories and trade goods peacefully.",
            &personality(),
            &config,
            "llama3.1:8b",
            &client,
        )
        .await;
        assert!(report.is_valid);
        assert_eq!(report.score, Some(0.95));
    }
}
