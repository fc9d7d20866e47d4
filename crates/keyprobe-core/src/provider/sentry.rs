//! Sentry plan.

use crate::Provider;
use crate::plan::{AuthMode, Extraction, Predicate, VerificationPlan, VerificationStep};

/// Organizations and projects listed in the report.
const SAMPLE_SIZE: usize = 3;

/// Builds the Sentry plan: list organizations, then the first one's projects.
///
/// A 403 on the organization listing still proves the token exists; it only
/// lacks `org:read`. This is specific to Sentry.
pub fn sentry_plan(base_url: &str) -> VerificationPlan {
    let organizations = VerificationStep::new(
        "organizations",
        format!("{base_url}/api/0/organizations/"),
        AuthMode::Bearer,
    )
    .with_predicate(Predicate::is_array(""))
    .with_warning_status(
        403,
        "the token is valid but lacks permissions; consider adding org:read and project:read scopes",
    )
    .with_extract(Extraction::length("organization_count", ""))
    .with_extract(Extraction::field("organization_slug", "/0/slug"))
    .with_extract(Extraction::field("organization_name", "/0/name"))
    .with_extract(Extraction::sample(
        "organizations",
        "",
        SAMPLE_SIZE,
        [("slug", "/slug"), ("name", "/name"), ("id", "/id"), ("status", "/status/name")],
    ))
    .with_error_message("/detail");

    let projects = VerificationStep::new(
        "projects",
        format!("{base_url}/api/0/organizations/{{organization_slug}}/projects/"),
        AuthMode::Bearer,
    )
    .requires("organization_slug")
    .best_effort()
    .with_predicate(Predicate::is_array(""))
    .with_extract(Extraction::length("project_count", ""))
    .with_extract(Extraction::field("project_slug", "/0/slug"))
    .with_extract(Extraction::field("project_platform", "/0/platform"))
    .with_extract(Extraction::sample(
        "projects",
        "",
        SAMPLE_SIZE,
        [("slug", "/slug"), ("name", "/name"), ("platform", "/platform"), ("id", "/id")],
    ))
    .with_error_message("/detail");

    VerificationPlan::new(Provider::Sentry)
        .with_step(organizations)
        .with_step(projects)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde_json::json;

    use super::*;

    #[test]
    fn test_projects_endpoint_uses_first_organization() {
        let plan = sentry_plan("https://sentry.io");
        let context = BTreeMap::from([("organization_slug".to_owned(), json!("acme"))]);
        let request = plan.steps[1].build_request("sntrys_x", &context).unwrap();

        assert_eq!(
            request.url.as_str(),
            "https://sentry.io/api/0/organizations/acme/projects/"
        );
        assert_eq!(request.header("Authorization"), Some("Bearer sntrys_x"));
    }

    #[test]
    fn test_organization_sample() {
        let plan = sentry_plan("https://sentry.io");
        let body = json!([
            {"slug": "a", "name": "A", "id": "1", "status": {"id": "active", "name": "active"}},
            {"slug": "b", "name": "B", "id": "2"},
            {"slug": "c", "name": "C", "id": "3"},
            {"slug": "d", "name": "D", "id": "4"},
        ]);

        let sample = plan.steps[0]
            .extract
            .iter()
            .find(|e| e.key == "organizations")
            .and_then(|e| e.apply(&body))
            .unwrap();

        assert_eq!(sample.as_array().map(Vec::len), Some(3));
        assert_eq!(sample[0]["status"], "active");
        assert_eq!(sample[2]["slug"], "c");
    }

    #[test]
    fn test_only_organizations_step_tolerates_forbidden() {
        let plan = sentry_plan("https://sentry.io");

        assert_eq!(plan.steps[0].warning_status.as_ref().map(|w| w.status), Some(403));
        assert!(plan.steps[1].warning_status.is_none());
        assert!(plan.steps[1].best_effort);
    }
}
