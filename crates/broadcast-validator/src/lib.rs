pub mod hybrid;
pub mod llm_mode;
pub mod rules;

pub use hybrid::{validate_hybrid, validate_llm};
pub use llm_mode::{render_validation_prompt, report_from_llm_response};
pub use rules::validate_rules;
