use super::common::*;
use crate::config::CompletionConfig;
use crate::ranking::requirement::{EnrichmentStatus, EnrichmentUnavailable, RequirementExtractor};
use crate::ranking::InputError;

const TITLE: &str = "Backend Engineer";
const DESCRIPTION: &str = "We need a Python developer with 5+ years of experience. Remote friendly.";

#[tokio::test]
async fn without_client_enrichment_is_skipped() {
    let extractor = RequirementExtractor::new(CompletionConfig::default());
    let extraction = extractor.extract(TITLE, DESCRIPTION).await.expect("extraction");

    assert!(!extraction.used_enrichment);
    assert_eq!(extraction.enrichment, EnrichmentStatus::Skipped);
    assert_eq!(extraction.requirement.role, TITLE);
    assert!(extraction.requirement.skills.iter().any(|skill| skill == "python"));
    assert_eq!(extraction.requirement.experience.as_deref(), Some("5+ years"));
    assert_eq!(extraction.requirement.location.as_deref(), Some("Remote"));
}

#[tokio::test]
async fn blank_posting_is_rejected_before_any_call() {
    let client = ScriptedClient::replying("{}");
    let extractor = RequirementExtractor::new(fast_completion_config()).with_enrichment(client.clone());

    match extractor.extract("  ", "\n").await {
        Err(InputError::MissingJobText) => {}
        other => panic!("expected missing job text, got {other:?}"),
    }
    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn enrichment_reply_is_merged_over_deterministic_result() {
    let client = ScriptedClient::replying(
        r#"Sure! Here is the JSON:
{"skills": ["Python", "FastAPI", "python"], "seniority": "Senior", "benefits": "remote, meal vouchers"}
Hope this helps."#,
    );
    let extractor = RequirementExtractor::new(fast_completion_config()).with_enrichment(client.clone());

    let extraction = extractor.extract(TITLE, DESCRIPTION).await.expect("extraction");

    assert!(extraction.used_enrichment);
    assert_eq!(extraction.enrichment, EnrichmentStatus::Enriched);
    assert_eq!(client.calls(), 1);
    let requirement = &extraction.requirement;
    assert_eq!(requirement.role, TITLE);
    assert_eq!(requirement.seniority.as_deref(), Some("Senior"));
    assert_eq!(requirement.experience.as_deref(), Some("5+ years"));
    assert_eq!(
        requirement
            .skills
            .iter()
            .filter(|skill| skill.eq_ignore_ascii_case("python"))
            .count(),
        1
    );
    assert!(requirement.skills.iter().any(|skill| skill == "FastAPI"));
    assert_eq!(requirement.benefits, vec!["remote", "meal vouchers"]);

    let request = client.last_request().expect("request recorded");
    assert!(!request.stream);
    assert!(request.prompt.contains(DESCRIPTION));
}

#[tokio::test]
async fn transport_failure_keeps_deterministic_result() {
    let client = ScriptedClient::new(Script::Fail);
    let extractor = RequirementExtractor::new(fast_completion_config()).with_enrichment(client);

    let extraction = extractor.extract(TITLE, DESCRIPTION).await.expect("extraction");
    let baseline = extractor
        .extract_deterministic(TITLE, DESCRIPTION)
        .expect("deterministic");

    assert!(!extraction.used_enrichment);
    assert!(matches!(
        extraction.enrichment,
        EnrichmentStatus::Unavailable(EnrichmentUnavailable::Transport(_))
    ));
    assert_eq!(extraction.requirement, baseline);
}

#[tokio::test]
async fn slow_service_times_out() {
    let client = ScriptedClient::new(Script::Hang);
    let extractor = RequirementExtractor::new(fast_completion_config()).with_enrichment(client);

    let extraction = extractor.extract(TITLE, DESCRIPTION).await.expect("extraction");
    assert_eq!(
        extraction.enrichment,
        EnrichmentStatus::Unavailable(EnrichmentUnavailable::Timeout)
    );
    assert!(!extraction.used_enrichment);
}

#[tokio::test]
async fn prose_reply_is_reported_as_missing_json() {
    let client = ScriptedClient::replying("I could not find any requirements in this posting.");
    let extractor = RequirementExtractor::new(fast_completion_config()).with_enrichment(client);

    let extraction = extractor.extract(TITLE, DESCRIPTION).await.expect("extraction");
    assert_eq!(
        extraction.enrichment,
        EnrichmentStatus::Unavailable(EnrichmentUnavailable::NoJson)
    );
}
