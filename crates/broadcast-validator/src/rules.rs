//! Rule mode (spec §4.11.1): hard checks run in isolation — each is its own
//! function returning its own `Vec<ValidationIssue>` so one rule's bad match
//! can't corrupt another's (spec §9 "exceptions for control flow in
//! validators" → isolated rule functions).

use broadcast_config::ValidationConfig;
use broadcast_core::{IssueSeverity, Personality, ValidationIssue, ValidationMode, ValidationReport};
use regex::Regex;

fn issue(severity: IssueSeverity, category: &str, message: impl Into<String>, confidence: f32) -> ValidationIssue {
    ValidationIssue { severity, category: category.to_string(), message: message.into(), confidence }
}

/// No year token greater than `year_dj` may survive unless it is preceded
/// within `context_window_chars` by a historical marker, or the year itself
/// is on the whitelist.
fn temporal_issues(script: &str, year_dj: i32, config: &ValidationConfig) -> Vec<ValidationIssue> {
    let year_re = Regex::new(r"\b(1[0-9]{3}|2[0-9]{3})\b").expect("valid regex");
    let lower = script.to_lowercase();
    let mut issues = Vec::new();

    for m in year_re.find_iter(script) {
        let year: i32 = m.as_str().parse().unwrap_or(0);
        if year <= year_dj {
            continue;
        }
        if config.year_whitelist.contains(&year) {
            continue;
        }
        let window_start = m.start().saturating_sub(config.temporal_context_window_chars);
        let window = &lower[window_start..m.start()];
        let has_marker = config.historical_markers.iter().any(|marker| window.contains(marker.as_str()));
        if has_marker {
            continue;
        }
        issues.push(issue(
            IssueSeverity::Critical,
            "temporal",
            format!("year {year} exceeds DJ year {year_dj} with no historical marker nearby"),
            0.9,
        ));
    }
    issues
}

/// Forbidden factions/content types absent, word-boundary matched, unless
/// preceded by a negation within the same context window.
fn content_issues(script: &str, forbidden: &[String], context_window_chars: usize) -> Vec<ValidationIssue> {
    const NEGATIONS: &[&str] = &["never", "not", "no longer", "used to be"];
    let lower = script.to_lowercase();
    let mut issues = Vec::new();

    for term in forbidden {
        let term_lower = term.to_lowercase();
        let Ok(re) = Regex::new(&format!(r"\b{}\b", regex::escape(&term_lower))) else {
            continue;
        };
        for m in re.find_iter(&lower) {
            let window_start = m.start().saturating_sub(context_window_chars);
            let window = &lower[window_start..m.start()];
            let negated = NEGATIONS.iter().any(|n| window.contains(n));
            if negated {
                continue;
            }
            issues.push(issue(
                IssueSeverity::Critical,
                "content",
                format!("forbidden term \"{term}\" present"),
                0.85,
            ));
        }
    }
    issues
}

struct AnachronismCategory {
    name: &'static str,
    severity: IssueSeverity,
    terms: &'static [&'static str],
}

const ANACHRONISM_CATEGORIES: &[AnachronismCategory] = &[
    AnachronismCategory {
        name: "technology-critical",
        severity: IssueSeverity::Critical,
        terms: &["smartphone", "internet", "wifi", "satellite tv"],
    },
    AnachronismCategory {
        name: "technology-minor",
        severity: IssueSeverity::Warning,
        terms: &["laptop", "microwave oven", "email"],
    },
    AnachronismCategory {
        name: "cultural-reference",
        severity: IssueSeverity::Warning,
        terms: &["superbowl", "taylor swift", "tiktok"],
    },
    AnachronismCategory {
        name: "modern-slang",
        severity: IssueSeverity::Suggestion,
        terms: &["yeet", "rizz", "no cap"],
    },
];

fn anachronism_issues(script: &str) -> Vec<ValidationIssue> {
    let lower = script.to_lowercase();
    let mut issues = Vec::new();
    for category in ANACHRONISM_CATEGORIES {
        for term in category.terms {
            if lower.contains(term) {
                issues.push(issue(
                    category.severity,
                    category.name,
                    format!("anachronistic term \"{term}\" present"),
                    0.7,
                ));
            }
        }
    }
    issues
}

fn format_issues(script: &str, max_chars: usize) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let trimmed = script.trim();

    if trimmed.is_empty() {
        issues.push(issue(IssueSeverity::Critical, "format", "script is empty", 1.0));
        return issues;
    }

    let word_count = trimmed.split_whitespace().count();
    if word_count < 5 {
        issues.push(issue(IssueSeverity::Critical, "format", "fewer than 5 words", 0.95));
    }

    if !trimmed.ends_with(['.', '!', '?', '"']) {
        issues.push(issue(IssueSeverity::Warning, "format", "does not end with terminal punctuation", 0.6));
    }

    if trimmed.matches('"').count() % 2 != 0 {
        issues.push(issue(IssueSeverity::Warning, "format", "unbalanced quotes", 0.6));
    }

    if trimmed.chars().count() > max_chars {
        issues.push(issue(IssueSeverity::Warning, "format", format!("exceeds {max_chars} character limit"), 0.8));
    }

    let has_repeated_run = trimmed
        .chars()
        .fold((None, 1usize, false), |(prev, run_len, found), c| {
            if found {
                return (Some(c), run_len, true);
            }
            match prev {
                Some(p) if p == c => {
                    let run_len = run_len + 1;
                    (Some(c), run_len, run_len > 5)
                }
                _ => (Some(c), 1, false),
            }
        })
        .2;
    if has_repeated_run {
        issues.push(issue(IssueSeverity::Warning, "format", "run of identical characters longer than 5", 0.7));
    }

    let letters: Vec<char> = trimmed.chars().filter(|c| c.is_alphabetic()).collect();
    if !letters.is_empty() {
        let upper = letters.iter().filter(|c| c.is_uppercase()).count();
        let fraction = upper as f32 / letters.len() as f32;
        if fraction > 0.3 {
            issues.push(issue(IssueSeverity::Warning, "format", "more than 30% of letters are uppercase", 0.6));
        }
    }

    issues
}

pub fn validate_rules(script: &str, personality: &Personality, config: &ValidationConfig) -> ValidationReport {
    let mut issues = temporal_issues(script, personality.year_dj, config);
    issues.extend(content_issues(script, &personality.forbidden_factions, config.temporal_context_window_chars));
    issues.extend(content_issues(script, &personality.taboo_words, config.temporal_context_window_chars));
    issues.extend(anachronism_issues(script));
    issues.extend(format_issues(script, config.max_chars));

    let is_valid = !issues.iter().any(|i| i.severity == IssueSeverity::Critical);

    ValidationReport { mode: ValidationMode::Rules, is_valid, score: None, issues, flags: vec![] }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    #[test]
    fn future_year_without_marker_is_critical() {
        let report = validate_rules(
            "Breaking news from 2287, folks, stay tuned for more.",
            &personality(),
            &ValidationConfig::default(),
        );
        assert!(!report.is_valid);
        assert!(report.issues.iter().any(|i| i.category == "temporal" && i.severity == IssueSeverity::Critical));
    }

    #[test]
    fn future_year_with_historical_marker_is_permitted() {
        let report = validate_rules(
            "Pre-war records from 2287 are mostly gone now, they say.",
            &personality(),
            &ValidationConfig::default(),
        );
        assert!(!report.issues.iter().any(|i| i.category == "temporal"));
    }

    #[test]
    fn whitelisted_year_is_permitted() {
        let report = validate_rules(
            "The bombs fell in 2077, they still tell stories about it.",
            &personality(),
            &ValidationConfig::default(),
        );
        assert!(!report.issues.iter().any(|i| i.category == "temporal"));
    }

    #[test]
    fn forbidden_faction_is_flagged() {
        let report = validate_rules(
            "The Enclave soldiers marched through at dawn today.",
            &personality(),
            &ValidationConfig::default(),
        );
        assert!(report.issues.iter().any(|i| i.category == "content"));
    }

    #[test]
    fn short_script_fails_word_count() {
        let report = validate_rules("Too short.", &personality(), &ValidationConfig::default());
        assert!(!report.is_valid);
    }

    #[test]
    fn anachronistic_slang_is_only_a_suggestion() {
        let report = validate_rules(
            "That raid had some serious rizz, folks, no cap whatsoever today.",
            &personality(),
            &ValidationConfig::default(),
        );
        assert!(report.is_valid);
        assert!(report.issues.iter().any(|i| i.severity == IssueSeverity::Suggestion));
    }
}
