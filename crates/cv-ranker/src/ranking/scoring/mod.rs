mod matching;
mod rules;

use rayon::prelude::*;
use tracing::debug;

use super::aggregate::resolve_display_name;
use super::candidate::CandidateProfile;
use super::domain::{CandidateRecord, CandidateScore, Points, ScoreCategory, ScoreComponent, SubScores};
use super::requirement::JobRequirement;
use super::InputError;
use crate::config::ScoringConfig;

/// Stateless scorer applying the five-category rubric to one candidate at a time.
///
/// Output depends only on the candidate, the requirement and the `ScoringConfig`, so repeated
/// runs are bit-identical.
#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    config: ScoringConfig,
}

impl ScoringEngine {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn score(&self, candidate: &CandidateRecord, requirement: &JobRequirement) -> CandidateScore {
        let profile = CandidateProfile::from_raw(&candidate.raw);

        let experience = rules::experience_quality(&profile, requirement, &self.config);
        let skills = rules::technical_skills(&profile, requirement);
        let projects = rules::projects_impact(&profile, requirement);
        let education = rules::education_certifications(&profile, requirement);
        let signal = rules::signal_consistency(&profile);

        let assessments = [
            (ScoreCategory::ExperienceQuality, &experience.assessment),
            (ScoreCategory::TechnicalSkills, &skills.assessment),
            (ScoreCategory::ProjectsImpact, &projects),
            (ScoreCategory::EducationCertifications, &education),
            (ScoreCategory::SignalConsistency, &signal),
        ];

        let mut scores = SubScores::default();
        let mut components = Vec::with_capacity(assessments.len());
        for (category, assessment) in assessments {
            let points = Points::clamped(assessment.value, category.cap());
            scores.set(category, points);
            components.push(ScoreComponent {
                category,
                score: points,
                notes: assessment.notes.clone(),
            });
        }

        let explanation = explain(
            &scores,
            requirement,
            experience.best_company.as_deref(),
            skills.matched_required,
        );

        let name = resolve_display_name(&candidate.raw).unwrap_or_else(|| candidate.id.clone());
        debug!(candidate = %candidate.id, total = %scores.total(), "scored candidate");

        CandidateScore::new(
            candidate.id.clone(),
            name,
            scores,
            explanation,
            components,
            candidate.raw.clone(),
        )
    }

    /// Score a whole candidate set in parallel. Output order follows input order.
    pub fn score_batch(
        &self,
        candidates: &[CandidateRecord],
        requirement: &JobRequirement,
    ) -> Result<Vec<CandidateScore>, InputError> {
        if candidates.is_empty() {
            return Err(InputError::EmptyBatch);
        }

        Ok(candidates
            .par_iter()
            .map(|candidate| self.score(candidate, requirement))
            .collect())
    }
}

fn shorten(company: &str) -> String {
    if company.chars().count() > 30 {
        let head: String = company.chars().take(27).collect();
        format!("{head}...")
    } else {
        company.to_string()
    }
}

/// Recruiter-style summary, e.g. `+ Strong experience at Capgemini | - Fewer personal projects`.
fn explain(
    scores: &SubScores,
    requirement: &JobRequirement,
    best_company: Option<&str>,
    matched_required: usize,
) -> String {
    let experience = scores.get(ScoreCategory::ExperienceQuality);
    let technical = scores.get(ScoreCategory::TechnicalSkills);
    let projects = scores.get(ScoreCategory::ProjectsImpact);
    let signal = scores.get(ScoreCategory::SignalConsistency);

    let mut parts = Vec::new();
    match best_company {
        Some(company) if experience >= Points::whole(25) => {
            parts.push(format!("+ Strong experience at {}", shorten(company)))
        }
        Some(company) if experience >= Points::whole(15) => {
            parts.push(format!("+ Good experience at {}", shorten(company)))
        }
        _ if experience < Points::whole(10) => parts.push("- Limited experience".to_string()),
        _ => {}
    }

    if matched_required > 0 && !requirement.skills.is_empty() {
        if technical >= Points::whole(18) {
            let headline = requirement
                .skills
                .iter()
                .take(2)
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join("/");
            parts.push(format!("+ High {headline} relevance"));
        } else if technical >= Points::whole(12) {
            parts.push("+ Good technical skills match".to_string());
        } else {
            parts.push("- Lower technical skills relevance".to_string());
        }
    } else if technical < Points::whole(10) {
        parts.push("- Lower technical skills relevance".to_string());
    }

    if projects >= Points::whole(15) {
        parts.push("+ Strong projects".to_string());
    } else if projects < Points::whole(8) {
        parts.push("- Fewer personal projects".to_string());
    }

    if signal < Points::whole(7) {
        parts.push("- CV consistency issues".to_string());
    }

    if parts.is_empty() {
        "Standard candidate profile".to_string()
    } else {
        parts.join(" | ")
    }
}
