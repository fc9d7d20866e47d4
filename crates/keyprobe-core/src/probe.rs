//! The credential probe engine.
//!
//! [`CredentialProbe`] runs a [`VerificationPlan`] step by step against a
//! [`Transport`] and folds the responses into a single [`ProbeResult`].
//! Everything provider-specific comes from the plan.

use std::collections::BTreeMap;

#[cfg(feature = "config")]
use clap::Args;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::plan::{VerificationPlan, VerificationStep, first_text};
use crate::result::{Cause, ProbeResult, ProbeStatus, StepOutcome, StepReport};
use crate::transport::{HttpRequest, HttpResponse, TlsMode, Transport};
use crate::{CredentialSpec, Error, ErrorKind, Result, TRACING_TARGET_PROBE};

/// Probe behaviour that is not part of a plan.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct ProbeOptions {
    /// Never retry a request without certificate verification
    #[cfg_attr(feature = "config", arg(long = "strict-tls", env = "KEYPROBE_STRICT_TLS"))]
    #[serde(default)]
    pub strict_tls: bool,
}

impl ProbeOptions {
    /// Disables the certificate-relaxed retry.
    #[must_use]
    pub fn with_strict_tls(mut self, strict_tls: bool) -> Self {
        self.strict_tls = strict_tls;
        self
    }
}

/// Runs verification plans against a transport.
#[derive(Debug, Clone)]
pub struct CredentialProbe<T> {
    transport: T,
    options: ProbeOptions,
}

impl<T: Transport> CredentialProbe<T> {
    /// Creates a probe with default options.
    pub fn new(transport: T) -> Self {
        Self::with_options(transport, ProbeOptions::default())
    }

    /// Creates a probe with the given options.
    pub fn with_options(transport: T, options: ProbeOptions) -> Self {
        Self { transport, options }
    }

    /// Returns the underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Returns the probe options.
    pub fn options(&self) -> &ProbeOptions {
        &self.options
    }

    /// Determines whether the credential in `spec` is live.
    ///
    /// Transport failures and unexpected responses are classified inside the
    /// returned [`ProbeResult`].
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Configuration`] without touching the network if
    /// the credential is missing or still holds its placeholder, and
    /// [`ErrorKind::InvalidInput`] if the plan is empty or a step's endpoint
    /// cannot be built.
    pub async fn probe(&self, spec: &CredentialSpec, plan: &VerificationPlan) -> Result<ProbeResult> {
        let secret = spec.secret()?;
        if plan.is_empty() {
            return Err(Error::invalid_input()
                .with_message(format!("verification plan for {} has no steps", plan.provider)));
        }

        tracing::debug!(
            target: TRACING_TARGET_PROBE,
            provider = %plan.provider,
            credential = spec.name(),
            steps = plan.len(),
            "Starting credential probe"
        );

        let mut run = Run::default();

        for step in &plan.steps {
            if let Some(key) = step.missing_requirement(&run.detail) {
                tracing::debug!(
                    target: TRACING_TARGET_PROBE,
                    step = %step.name,
                    missing = key,
                    "Skipping dependent step"
                );
                run.note(format!(
                    "indeterminate for dependent resource '{}': no {key} available",
                    step.name
                ));
                run.report(step, None, StepOutcome::Skipped);
                continue;
            }

            let request = step.build_request(secret, &run.detail)?;
            let response = match self.send(request, &mut run).await {
                Ok(response) => response,
                Err(error) => {
                    tracing::warn!(
                        target: TRACING_TARGET_PROBE,
                        step = %step.name,
                        error = %error,
                        "Verification request failed"
                    );
                    run.report(step, None, StepOutcome::Failed);

                    if step.best_effort && run.live {
                        run.note(format!("{} could not be fetched: {}", step.name, error.describe()));
                        continue;
                    }
                    let cause = Cause::new(error.kind(), error.describe());
                    return Ok(run.finish(plan, ProbeStatus::Indeterminate, Some(cause)));
                }
            };

            run.last_status = Some(response.status);

            match classify(step, &response) {
                Verdict::Passed(body) => {
                    for extraction in &step.extract {
                        if let Some(value) = extraction.apply(&body) {
                            run.detail.insert(extraction.key.clone(), value);
                        }
                    }
                    run.live = true;
                    run.report(step, Some(response.status), StepOutcome::Passed);
                }
                Verdict::Warning(note) => {
                    run.report(step, Some(response.status), StepOutcome::Warning);
                    run.warning = Some(note);
                    return Ok(run.finish(plan, ProbeStatus::ActiveWithWarning, None));
                }
                Verdict::Rejected(cause) => {
                    run.report(step, Some(response.status), StepOutcome::Rejected);

                    if step.best_effort && run.live {
                        run.note(format!("{} could not be fetched: {}", step.name, cause.message));
                        continue;
                    }
                    return Ok(run.finish(plan, ProbeStatus::Inactive, Some(cause)));
                }
            }
        }

        if run.live {
            return Ok(run.finish(plan, ProbeStatus::Active, None));
        }

        let cause = Cause::new(ErrorKind::InvalidInput, "no verification step could run");
        Ok(run.finish(plan, ProbeStatus::Indeterminate, Some(cause)))
    }

    /// Sends a request, retrying once without certificate verification if
    /// the policy allows it and the failure was a TLS failure.
    async fn send(&self, request: HttpRequest, run: &mut Run) -> Result<HttpResponse> {
        let request = request.with_tls(run.tls);

        match self.transport.send(&request).await {
            Err(error)
                if error.kind() == ErrorKind::Tls
                    && run.tls == TlsMode::Verified
                    && !self.options.strict_tls =>
            {
                tracing::warn!(
                    target: TRACING_TARGET_PROBE,
                    error = %error,
                    "Certificate verification failed, retrying without verification"
                );
                run.tls = TlsMode::Unverified;
                run.tls_bypassed = true;
                self.transport
                    .send(&request.with_tls(TlsMode::Unverified))
                    .await
            }
            other => other,
        }
    }
}

/// Mutable state of a single probe invocation.
#[derive(Default)]
struct Run {
    tls: TlsMode,
    tls_bypassed: bool,
    live: bool,
    detail: BTreeMap<String, Value>,
    last_status: Option<u16>,
    warning: Option<String>,
    notes: Vec<String>,
    steps: Vec<StepReport>,
}

impl Run {
    fn note(&mut self, note: String) {
        self.notes.push(note);
    }

    fn report(&mut self, step: &VerificationStep, http_status: Option<u16>, outcome: StepOutcome) {
        self.steps.push(StepReport {
            name: step.name.clone(),
            http_status,
            outcome,
        });
    }

    fn finish(self, plan: &VerificationPlan, status: ProbeStatus, cause: Option<Cause>) -> ProbeResult {
        tracing::info!(
            target: TRACING_TARGET_PROBE,
            provider = %plan.provider,
            status = %status,
            http_status = ?self.last_status,
            tls_bypassed = self.tls_bypassed,
            "Credential probe finished"
        );

        ProbeResult {
            provider: plan.provider,
            status,
            detail: self.detail,
            raw_http_status: self.last_status,
            tls_bypassed: self.tls_bypassed,
            cause,
            warning: self.warning,
            notes: self.notes,
            steps: self.steps,
            checked_at: Timestamp::now(),
        }
    }
}

enum Verdict {
    Passed(Value),
    Warning(String),
    Rejected(Cause),
}

fn classify(step: &VerificationStep, response: &HttpResponse) -> Verdict {
    let status = response.status;

    if status == step.expected_success_status {
        let body = match response.json() {
            Ok(body) => body,
            Err(error) => return Verdict::Rejected(Cause::new(error.kind(), error.describe())),
        };

        if let Some(envelope) = &step.envelope
            && body.pointer(envelope).is_none()
        {
            let message = format!("unexpected response format: missing {envelope}");
            return Verdict::Rejected(Cause::new(ErrorKind::Protocol, message));
        }

        if !step.success_predicate.evaluate(&body) {
            let message = format!(
                "credential rejected: {} did not hold",
                step.success_predicate.describe()
            );
            return Verdict::Rejected(with_provider_error(
                Cause::new(ErrorKind::Authentication, message),
                step,
                &body,
            ));
        }

        return Verdict::Passed(body);
    }

    if let Some(warning) = &step.warning_status
        && warning.status == status
    {
        return Verdict::Warning(warning.note.clone());
    }

    let cause = match status {
        401 => Cause::new(ErrorKind::Authentication, "authentication rejected"),
        403 => Cause::new(ErrorKind::Authorization, "access forbidden"),
        429 => Cause::new(ErrorKind::RateLimited, "rate limit exceeded"),
        _ => Cause::new(ErrorKind::ExternalError, format!("unexpected status code {status}")),
    };

    match response.json() {
        Ok(body) => Verdict::Rejected(with_provider_error(cause, step, &body)),
        Err(_) => Verdict::Rejected(cause),
    }
}

fn with_provider_error(mut cause: Cause, step: &VerificationStep, body: &Value) -> Cause {
    cause.provider_message = first_text(body, &step.error_message);
    cause.provider_code = first_text(body, &step.error_code);
    cause
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::Provider;
    use crate::mock::{MockTransport, Reply};
    use crate::plan::{AuthMode, Predicate};

    const TOKEN: &str = "valid-token";

    fn spec(provider: Provider, value: &str) -> CredentialSpec {
        provider.credential().with_value(value)
    }

    fn single_step_plan() -> VerificationPlan {
        let step = VerificationStep::new("check", "https://api.test/check", AuthMode::Bearer)
            .with_predicate(Predicate::equals("/is_valid", true))
            .with_error_message("/error/message");
        VerificationPlan::new(Provider::OpenAi).with_step(step)
    }

    #[tokio::test]
    async fn test_empty_secret_makes_no_calls() {
        let probe = CredentialProbe::new(MockTransport::new());
        let error = probe
            .probe(&spec(Provider::OpenAi, ""), &single_step_plan())
            .await
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Configuration);
        assert_eq!(probe.transport().call_count(), 0);
    }

    #[tokio::test]
    async fn test_placeholder_secret_makes_no_calls() {
        let probe = CredentialProbe::new(MockTransport::new());
        let credential = spec(Provider::Sentry, Provider::Sentry.placeholder());
        let error = probe
            .probe(&credential, &Provider::Sentry.default_plan())
            .await
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Configuration);
        assert_eq!(probe.transport().call_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_plan_is_invalid() {
        let probe = CredentialProbe::new(MockTransport::new());
        let plan = VerificationPlan::new(Provider::OpenAi);
        let error = probe.probe(&spec(Provider::OpenAi, TOKEN), &plan).await.unwrap_err();

        assert_eq!(error.kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_predicate_true_is_active() {
        let transport = MockTransport::new().on("/check", Reply::json(200, json!({"is_valid": true})));
        let probe = CredentialProbe::new(transport);
        let result = probe
            .probe(&spec(Provider::OpenAi, TOKEN), &single_step_plan())
            .await
            .unwrap();

        assert_eq!(result.status, ProbeStatus::Active);
        assert_eq!(result.raw_http_status, Some(200));
        assert!(!result.tls_bypassed);
        assert!(result.cause.is_none());
    }

    #[tokio::test]
    async fn test_predicate_false_is_inactive() {
        let transport = MockTransport::new().on("/check", Reply::json(200, json!({"is_valid": false})));
        let probe = CredentialProbe::new(transport);
        let result = probe
            .probe(&spec(Provider::OpenAi, "bad-token"), &single_step_plan())
            .await
            .unwrap();

        assert_eq!(result.status, ProbeStatus::Inactive);
        assert_eq!(result.cause_kind(), Some(ErrorKind::Authentication));
    }

    #[tokio::test]
    async fn test_unauthorized_is_inactive_with_provider_message() {
        let body = json!({"error": {"message": "Incorrect API key provided"}});
        let transport = MockTransport::new().on("/check", Reply::json(401, body));
        let probe = CredentialProbe::new(transport);
        let result = probe
            .probe(&spec(Provider::OpenAi, "bad-token"), &single_step_plan())
            .await
            .unwrap();

        assert_eq!(result.status, ProbeStatus::Inactive);
        let cause = result.cause.unwrap();
        assert_eq!(cause.kind, ErrorKind::Authentication);
        assert_eq!(cause.message, "authentication rejected");
        assert_eq!(cause.provider_message.as_deref(), Some("Incorrect API key provided"));
    }

    #[tokio::test]
    async fn test_unparseable_body_is_protocol_failure() {
        let transport = MockTransport::new().on("/check", Reply::text(200, "<html>oops</html>"));
        let probe = CredentialProbe::new(transport);
        let result = probe
            .probe(&spec(Provider::OpenAi, TOKEN), &single_step_plan())
            .await
            .unwrap();

        assert_eq!(result.status, ProbeStatus::Inactive);
        assert_eq!(result.cause_kind(), Some(ErrorKind::Protocol));
    }

    #[tokio::test]
    async fn test_tls_failure_is_retried_once_without_verification() {
        let transport = MockTransport::new()
            .with_broken_certificate()
            .on("/check", Reply::json(200, json!({"is_valid": true})));
        let probe = CredentialProbe::new(transport);
        let result = probe
            .probe(&spec(Provider::OpenAi, TOKEN), &single_step_plan())
            .await
            .unwrap();

        assert_eq!(result.status, ProbeStatus::Active);
        assert!(result.tls_bypassed);

        let requests = probe.transport().requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].tls, TlsMode::Verified);
        assert_eq!(requests[1].tls, TlsMode::Unverified);
    }

    #[tokio::test]
    async fn test_strict_tls_does_not_retry() {
        let transport = MockTransport::new()
            .with_broken_certificate()
            .on("/check", Reply::json(200, json!({"is_valid": true})));
        let options = ProbeOptions::default().with_strict_tls(true);
        let probe = CredentialProbe::with_options(transport, options);
        let result = probe
            .probe(&spec(Provider::OpenAi, TOKEN), &single_step_plan())
            .await
            .unwrap();

        assert_eq!(result.status, ProbeStatus::Indeterminate);
        assert_eq!(result.cause_kind(), Some(ErrorKind::Tls));
        assert_eq!(result.raw_http_status, None);
        assert_eq!(probe.transport().call_count(), 1);
    }

    #[tokio::test]
    async fn test_transport_failure_is_indeterminate() {
        let transport = MockTransport::new().on("/check", Reply::error(ErrorKind::Timeout));
        let probe = CredentialProbe::new(transport);
        let result = probe
            .probe(&spec(Provider::OpenAi, TOKEN), &single_step_plan())
            .await
            .unwrap();

        assert_eq!(result.status, ProbeStatus::Indeterminate);
        assert_eq!(result.cause_kind(), Some(ErrorKind::Timeout));
        assert_eq!(probe.transport().call_count(), 1);
    }

    #[tokio::test]
    async fn test_probe_is_idempotent() {
        let transport = MockTransport::new().on("/check", Reply::json(200, json!({"is_valid": true})));
        let probe = CredentialProbe::new(transport);
        let credential = spec(Provider::OpenAi, TOKEN);
        let plan = single_step_plan();

        let first = probe.probe(&credential, &plan).await.unwrap();
        let second = probe.probe(&credential, &plan).await.unwrap();

        assert_eq!(first.status, second.status);
        assert_eq!(first.detail, second.detail);
        assert_eq!(probe.transport().call_count(), 2);
    }

    #[tokio::test]
    async fn test_facebook_valid_token() {
        let debug = json!({"data": {
            "app_id": "1234",
            "type": "USER",
            "user_id": "42",
            "expires_at": 0,
            "is_valid": true,
            "scopes": ["email", "public_profile"],
        }});
        let transport = MockTransport::new()
            .on("/debug_token", Reply::json(200, debug))
            .on("/me", Reply::json(200, json!({"id": "42", "name": "Test Page"})));
        let probe = CredentialProbe::new(transport);
        let result = probe
            .probe(&spec(Provider::Facebook, "EAAB-live"), &Provider::Facebook.default_plan())
            .await
            .unwrap();

        assert_eq!(result.status, ProbeStatus::Active);
        assert_eq!(result.detail["app_id"], "1234");
        assert_eq!(result.detail["expires_at"], 0);
        assert_eq!(result.detail_text("name").as_deref(), Some("Test Page"));
        assert_eq!(result.steps.len(), 2);
        assert!(result.steps.iter().all(|s| s.outcome == StepOutcome::Passed));

        let requests = probe.transport().requests();
        assert_eq!(requests[0].query_param("input_token").as_deref(), Some("EAAB-live"));
        assert_eq!(requests[1].query_param("fields").as_deref(), Some("id,name"));
    }

    #[tokio::test]
    async fn test_facebook_invalid_token_stops_plan() {
        let debug = json!({"data": {"is_valid": false, "error": {"message": "Session has expired"}}});
        let transport = MockTransport::new().on("/debug_token", Reply::json(200, debug));
        let probe = CredentialProbe::new(transport);
        let result = probe
            .probe(&spec(Provider::Facebook, "EAAB-expired"), &Provider::Facebook.default_plan())
            .await
            .unwrap();

        assert_eq!(result.status, ProbeStatus::Inactive);
        assert_eq!(result.cause_kind(), Some(ErrorKind::Authentication));
        assert_eq!(probe.transport().call_count(), 1);
    }

    #[tokio::test]
    async fn test_tls_bypass_carries_over_to_later_steps() {
        let debug = json!({"data": {"is_valid": true}});
        let transport = MockTransport::new()
            .with_broken_certificate()
            .on("/debug_token", Reply::json(200, debug))
            .on("/me", Reply::json(200, json!({"id": "42"})));
        let probe = CredentialProbe::new(transport);
        let result = probe
            .probe(&spec(Provider::Facebook, "EAAB-live"), &Provider::Facebook.default_plan())
            .await
            .unwrap();

        assert_eq!(result.status, ProbeStatus::Active);
        assert!(result.tls_bypassed);

        let requests = probe.transport().requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[2].tls, TlsMode::Unverified);
    }

    #[tokio::test]
    async fn test_sentry_forbidden_is_active_with_warning() {
        let transport = MockTransport::new().on(
            "/organizations/",
            Reply::json(403, json!({"detail": "You do not have permission"})),
        );
        let probe = CredentialProbe::new(transport);
        let result = probe
            .probe(&spec(Provider::Sentry, "sntrys_scoped"), &Provider::Sentry.default_plan())
            .await
            .unwrap();

        assert_eq!(result.status, ProbeStatus::ActiveWithWarning);
        assert!(result.warning.as_deref().is_some_and(|w| w.contains("org:read")));
        assert!(result.cause.is_none());
        assert_eq!(probe.transport().call_count(), 1);
    }

    #[tokio::test]
    async fn test_sentry_without_organizations_skips_projects() {
        let transport = MockTransport::new().on("/organizations/", Reply::json(200, json!([])));
        let probe = CredentialProbe::new(transport);
        let result = probe
            .probe(&spec(Provider::Sentry, "sntrys_live"), &Provider::Sentry.default_plan())
            .await
            .unwrap();

        assert_eq!(result.status, ProbeStatus::Active);
        assert_eq!(result.detail["organization_count"], 0);
        assert_eq!(result.notes.len(), 1);
        assert_eq!(result.steps[1].outcome, StepOutcome::Skipped);
        assert_eq!(probe.transport().call_count(), 1);
    }

    #[tokio::test]
    async fn test_sentry_project_failure_is_best_effort() {
        let organizations = json!([{"slug": "acme", "name": "Acme"}]);
        let transport = MockTransport::new()
            .on("/organizations/", Reply::json(200, organizations))
            .on("/projects/", Reply::json(500, json!({"detail": "Internal Error"})));
        let probe = CredentialProbe::new(transport);
        let result = probe
            .probe(&spec(Provider::Sentry, "sntrys_live"), &Provider::Sentry.default_plan())
            .await
            .unwrap();

        assert_eq!(result.status, ProbeStatus::Active);
        assert_eq!(result.detail["organization_slug"], "acme");
        assert_eq!(result.notes.len(), 1);
        assert_eq!(result.steps[1].outcome, StepOutcome::Rejected);

        let requests = probe.transport().requests();
        assert!(requests[1].url.path().ends_with("/organizations/acme/projects/"));
    }

    #[tokio::test]
    async fn test_openai_rate_limit_is_active_with_warning() {
        let body = json!({"error": {"message": "Rate limit reached", "type": "requests"}});
        let transport = MockTransport::new().on("/v1/models", Reply::json(429, body));
        let probe = CredentialProbe::new(transport);
        let result = probe
            .probe(&spec(Provider::OpenAi, "sk-live"), &Provider::OpenAi.default_plan())
            .await
            .unwrap();

        assert_eq!(result.status, ProbeStatus::ActiveWithWarning);
        assert_eq!(result.raw_http_status, Some(429));
        assert_eq!(result.steps[0].outcome, StepOutcome::Warning);
    }
}
