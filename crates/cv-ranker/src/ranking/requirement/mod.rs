//! Job requirement extraction: a deterministic floor plus optional model enrichment.

mod deterministic;
mod enrichment;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::completion::{CompletionClient, CompletionRequest, GenerationOptions};
use super::InputError;
use crate::config::CompletionConfig;

pub use enrichment::EnrichmentUnavailable;

/// Structured view of a job posting. `skills` is always present and de-duplicated
/// case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobRequirement {
    pub role: String,
    pub skills: Vec<String>,
    pub experience: Option<String>,
    pub education: Option<String>,
    pub employment_type: Option<String>,
    pub location: Option<String>,
    pub salary: Option<String>,
    pub seniority: Option<String>,
    pub responsibilities: Vec<String>,
    pub requirements: Vec<String>,
    pub benefits: Vec<String>,
}

impl JobRequirement {
    /// Lower bound of the experience range, e.g. 3 for "3-5 years" or 5 for "5+ years".
    pub fn minimum_years(&self) -> Option<u32> {
        let experience = self.experience.as_deref()?;
        let digits: String = experience
            .chars()
            .skip_while(|c| !c.is_ascii_digit())
            .take_while(char::is_ascii_digit)
            .collect();
        digits.parse().ok()
    }

    /// Append skills that are not already present (case-insensitive).
    pub fn add_skills<I, S>(&mut self, skills: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let incoming: Vec<String> = skills.into_iter().map(Into::into).collect();
        self.skills = union_ci(std::mem::take(&mut self.skills), incoming);
    }
}

/// Union of two lists keeping first occurrences, compared case-insensitively. Blank entries
/// are dropped.
pub(crate) fn union_ci(first: Vec<String>, second: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    first
        .into_iter()
        .chain(second)
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty() && seen.insert(item.to_lowercase()))
        .collect()
}

/// How the extraction result was obtained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum EnrichmentStatus {
    /// Model output was merged over the deterministic result.
    Enriched,
    /// No enrichment was attempted.
    Skipped,
    /// Enrichment was attempted and failed; the deterministic result stands.
    Unavailable(EnrichmentUnavailable),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Extraction {
    pub requirement: JobRequirement,
    pub used_enrichment: bool,
    pub enrichment: EnrichmentStatus,
}

/// Turns posting text into a [`JobRequirement`]. Without an enrichment client the
/// deterministic pass is the whole result.
#[derive(Clone)]
pub struct RequirementExtractor {
    config: CompletionConfig,
    enrichment: Option<Arc<dyn CompletionClient>>,
}

impl RequirementExtractor {
    pub fn new(config: CompletionConfig) -> Self {
        Self {
            config,
            enrichment: None,
        }
    }

    pub fn with_enrichment(mut self, client: Arc<dyn CompletionClient>) -> Self {
        self.enrichment = Some(client);
        self
    }

    /// Deterministic pass only. Never fails once the input check has passed.
    pub fn extract_deterministic(
        &self,
        title: &str,
        description: &str,
    ) -> Result<JobRequirement, InputError> {
        if title.trim().is_empty() && description.trim().is_empty() {
            return Err(InputError::MissingJobText);
        }
        Ok(deterministic::extract(title, description))
    }

    /// Deterministic pass, then at most one bounded enrichment call merged over it.
    ///
    /// Enrichment failures are reported in [`Extraction::enrichment`] and never returned as
    /// errors. Dropping the returned future mid-call leaves nothing partially applied.
    pub async fn extract(&self, title: &str, description: &str) -> Result<Extraction, InputError> {
        let baseline = self.extract_deterministic(title, description)?;

        let Some(client) = &self.enrichment else {
            return Ok(Extraction {
                requirement: baseline,
                used_enrichment: false,
                enrichment: EnrichmentStatus::Skipped,
            });
        };

        let request = CompletionRequest::new(
            self.config.enrichment_model.clone(),
            enrichment::prompt(title, description),
            GenerationOptions {
                temperature: self.config.temperature,
                max_tokens: self.config.enrichment_max_tokens,
            },
        );

        let reply =
            match tokio::time::timeout(self.config.enrichment_timeout, client.complete(&request))
                .await
            {
                Err(_) => Err(EnrichmentUnavailable::Timeout),
                Ok(Err(err)) => Err(EnrichmentUnavailable::Transport(err.to_string())),
                Ok(Ok(text)) => enrichment::parse(&text),
            };

        match reply {
            Ok(payload) => {
                info!(model = %request.model, "merged requirement enrichment");
                Ok(Extraction {
                    requirement: enrichment::merge(baseline, payload),
                    used_enrichment: true,
                    enrichment: EnrichmentStatus::Enriched,
                })
            }
            Err(reason) => {
                warn!(%reason, "requirement enrichment unavailable, using deterministic result");
                Ok(Extraction {
                    requirement: baseline,
                    used_enrichment: false,
                    enrichment: EnrichmentStatus::Unavailable(reason),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimum_years_reads_leading_number() {
        let mut requirement = JobRequirement::default();
        assert_eq!(requirement.minimum_years(), None);
        requirement.experience = Some("3-5 years".to_string());
        assert_eq!(requirement.minimum_years(), Some(3));
        requirement.experience = Some("at least 7+ years".to_string());
        assert_eq!(requirement.minimum_years(), Some(7));
        requirement.experience = Some("some experience".to_string());
        assert_eq!(requirement.minimum_years(), None);
    }

    #[test]
    fn add_skills_dedups_case_insensitively() {
        let mut requirement = JobRequirement {
            skills: vec!["python".to_string()],
            ..JobRequirement::default()
        };
        requirement.add_skills(["Python", "Django", " ", "django"]);
        assert_eq!(requirement.skills, vec!["python", "Django"]);
    }

    #[test]
    fn serializes_camel_case() {
        let requirement = JobRequirement {
            role: "Backend Engineer".to_string(),
            employment_type: Some("Full-time".to_string()),
            ..JobRequirement::default()
        };
        let value = serde_json::to_value(&requirement).expect("serialize");
        assert_eq!(value["employmentType"], "Full-time");
        assert!(value["skills"].as_array().is_some_and(Vec::is_empty));
    }

    #[test]
    fn rejects_empty_job_text() {
        let extractor = RequirementExtractor::new(CompletionConfig::default());
        assert!(matches!(
            extractor.extract_deterministic("  ", ""),
            Err(InputError::MissingJobText)
        ));
    }
}
