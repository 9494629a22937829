use super::common::*;
use crate::ranking::aggregate::RankAggregator;
use crate::ranking::audit::{AuditOutcome, AuditUnavailable, FairnessAuditor};
use crate::ranking::requirement::{EnrichmentStatus, Extraction};
use crate::ranking::scoring::ScoringEngine;
use crate::ranking::session::{RankingSession, SessionError, SessionState};
use crate::ranking::InputError;

const CLEAN_VERDICT: &str = r#"{"isCorrect": true, "isFair": true, "isSquare": true,
    "issues": [], "adjustments": [], "overallAssessment": "ok", "confidence": 0.9}"#;

fn session() -> RankingSession {
    RankingSession::new(Extraction {
        requirement: backend_requirement(),
        used_enrichment: false,
        enrichment: EnrichmentStatus::Skipped,
    })
}

#[tokio::test]
async fn session_moves_from_draft_through_audits() {
    let engine = ScoringEngine::new(scoring_config());
    let aggregator = RankAggregator::new();
    let mut session = session();
    assert_eq!(session.state(), SessionState::Draft);
    assert!(session.ranking().is_none());

    let ranked = session
        .score(&engine, &aggregator, &records(), Some(2))
        .expect("scored")
        .clone();
    assert_eq!(ranked.len(), 2);
    assert_eq!(session.state(), SessionState::Scored);

    let failing = FairnessAuditor::new(ScriptedClient::new(Script::Fail), fast_completion_config());
    let outcome = session.audit(&failing).await.expect("audit recorded");
    assert!(matches!(
        outcome,
        AuditOutcome::Failed(AuditUnavailable::Transport(_))
    ));
    assert_eq!(session.state(), SessionState::Audited);
    assert!(session.latest_report().is_none());

    let clean = FairnessAuditor::new(ScriptedClient::replying(CLEAN_VERDICT), fast_completion_config());
    session.audit(&clean).await.expect("audit recorded");

    assert_eq!(session.audits().len(), 2);
    assert!(session.latest_report().expect("report").is_clean());
    assert_eq!(session.ranking(), Some(&ranked));
}

#[tokio::test]
async fn audit_before_scoring_is_rejected() {
    let mut session = session();
    let client = ScriptedClient::replying(CLEAN_VERDICT);
    let auditor = FairnessAuditor::new(client.clone(), fast_completion_config());

    match session.audit(&auditor).await {
        Err(SessionError::InvalidTransition { state, .. }) => assert_eq!(state, SessionState::Draft),
        other => panic!("expected invalid transition, got {other:?}"),
    }
    assert_eq!(client.calls(), 0);
    assert_eq!(session.state(), SessionState::Draft);
}

#[test]
fn ranking_is_fixed_once_scored() {
    let engine = ScoringEngine::new(scoring_config());
    let aggregator = RankAggregator::new();
    let mut session = session();
    session
        .score(&engine, &aggregator, &records(), None)
        .expect("scored");

    match session.score(&engine, &aggregator, &records(), None) {
        Err(SessionError::InvalidTransition { state, action }) => {
            assert_eq!(state, SessionState::Scored);
            assert_eq!(action, "score");
        }
        other => panic!("expected invalid transition, got {other:?}"),
    }
    assert!(session
        .attach_ranking(aggregator.rank(Vec::new(), None))
        .is_err());
    assert_eq!(session.ranking().map(|ranking| ranking.len()), Some(3));
}

#[test]
fn scoring_nothing_leaves_session_in_draft() {
    let mut session = session();
    let result = session.score(
        &ScoringEngine::new(scoring_config()),
        &RankAggregator::new(),
        &[],
        None,
    );
    match result {
        Err(SessionError::Input(InputError::EmptyBatch)) => {}
        other => panic!("expected empty batch, got {other:?}"),
    }
    assert_eq!(session.state(), SessionState::Draft);
}
