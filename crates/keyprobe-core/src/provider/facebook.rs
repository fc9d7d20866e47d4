//! Facebook / Meta Graph API plan.

use crate::Provider;
use crate::plan::{AuthMode, Extraction, Predicate, VerificationPlan, VerificationStep};

/// Graph API version used for the `/me` call.
const GRAPH_VERSION: &str = "v18.0";

/// Builds the Graph API plan: `debug_token` introspection, then `/me`.
///
/// The token introspects itself, so it is sent both as `input_token` and as
/// the app `access_token`.
pub fn facebook_plan(base_url: &str) -> VerificationPlan {
    let debug_token = VerificationStep::new(
        "debug_token",
        format!("{base_url}/debug_token"),
        AuthMode::query(["input_token", "access_token"]),
    )
    .with_envelope("/data")
    .with_predicate(Predicate::equals("/data/is_valid", true))
    .with_extract(Extraction::field("app_id", "/data/app_id"))
    .with_extract(Extraction::field("type", "/data/type"))
    .with_extract(Extraction::field("user_id", "/data/user_id"))
    .with_extract(Extraction::field("expires_at", "/data/expires_at"))
    .with_extract(Extraction::field("scopes", "/data/scopes"));

    let me = VerificationStep::new(
        "me",
        format!("{base_url}/{GRAPH_VERSION}/me"),
        AuthMode::query(["access_token"]),
    )
    .with_query("fields", "id,name")
    .with_predicate(Predicate::present("/id"))
    .with_extract(Extraction::field("id", "/id"))
    .with_extract(Extraction::field("name", "/name"));

    VerificationPlan::new(Provider::Facebook)
        .with_step(with_graph_errors(debug_token))
        .with_step(with_graph_errors(me))
}

fn with_graph_errors(step: VerificationStep) -> VerificationStep {
    step.with_error_message("/error/message")
        .with_error_code("/error/code")
        .with_error_code("/error/type")
}
