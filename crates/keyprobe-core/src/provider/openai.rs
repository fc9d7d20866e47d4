//! OpenAI plans.

use serde_json::json;

use crate::Provider;
use crate::plan::{AuthMode, Extraction, Predicate, VerificationPlan, VerificationStep};
use crate::transport::Method;

/// Model used by the completion plan.
pub const COMPLETION_MODEL: &str = "gpt-3.5-turbo";

const RATE_LIMITED: &str = "the key is valid but rate-limited or out of quota";

/// Builds the default read-only plan: list the models visible to the key.
pub fn openai_plan(base_url: &str) -> VerificationPlan {
    let models = VerificationStep::new("models", format!("{base_url}/v1/models"), AuthMode::Bearer)
        .with_predicate(Predicate::is_array("/data"))
        .with_warning_status(429, RATE_LIMITED)
        .with_extract(Extraction::length("model_count", "/data"))
        .with_error_message("/error/message")
        .with_error_code("/error/code")
        .with_error_code("/error/type");

    VerificationPlan::new(Provider::OpenAi).with_step(models)
}

/// Builds a plan that sends a tiny chat completion.
///
/// Unlike [`openai_plan`] this consumes a few tokens of quota.
pub fn openai_completion_plan(base_url: &str, model: &str) -> VerificationPlan {
    let body = json!({
        "model": model,
        "messages": [
            {"role": "user", "content": "Say 'Hello! Your API key is working.'"}
        ],
        "max_tokens": 20,
    });

    let completion = VerificationStep::new(
        "chat_completion",
        format!("{base_url}/v1/chat/completions"),
        AuthMode::Bearer,
    )
    .with_method(Method::Post)
    .with_body(body)
    .with_predicate(Predicate::non_empty("/choices"))
    .with_warning_status(429, RATE_LIMITED)
    .with_extract(Extraction::field("model", "/model"))
    .with_extract(Extraction::field("total_tokens", "/usage/total_tokens"))
    .with_extract(Extraction::field("prompt_tokens", "/usage/prompt_tokens"))
    .with_extract(Extraction::field("completion_tokens", "/usage/completion_tokens"))
    .with_extract(Extraction::field("reply", "/choices/0/message/content"))
    .with_extract(Extraction::field("created", "/created"))
    .with_error_message("/error/message")
    .with_error_code("/error/code")
    .with_error_code("/error/type");

    VerificationPlan::new(Provider::OpenAi).with_step(completion)
}
