use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use super::{union_ci, JobRequirement};
use crate::ranking::completion::extract_json_object;

/// Why an enrichment attempt contributed nothing.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum EnrichmentUnavailable {
    #[error("enrichment timed out")]
    Timeout,
    #[error("enrichment transport failed: {0}")]
    Transport(String),
    #[error("enrichment reply contained no JSON object")]
    NoJson,
    #[error("enrichment reply was not a valid requirement object: {0}")]
    InvalidJson(String),
}

/// Fields read from a model reply. Absent, null and blank values are `None`/empty.
#[derive(Debug, Default, PartialEq)]
pub(super) struct EnrichmentPayload {
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

const KNOWN_KEYS: &[&str] = &[
    "skills", "experience", "education", "employmentType", "employment_type", "location",
    "salary", "seniority", "responsibilities", "requirements", "benefits",
];

pub(super) fn prompt(title: &str, description: &str) -> String {
    format!(
        r#"Extract the structured requirements of this job posting.

Title: {title}
Description:
{description}

Reply with a single JSON object and nothing else, using exactly these keys:
{{
  "skills": ["technical skills, tools and frameworks, lower-case"],
  "experience": "required experience such as \"3-5 years\" or null",
  "education": "required degree or field, or null",
  "employmentType": "Full-time | Part-time | Contract | Internship, or null",
  "location": "Remote | Hybrid | On-site or a city, or null",
  "salary": "salary range as written, or null",
  "seniority": "Intern | Junior | Mid-level | Senior | Lead, or null",
  "responsibilities": ["..."],
  "requirements": ["..."],
  "benefits": ["..."]
}}
Use null or an empty list when the posting does not say."#
    )
}

/// Read the first balanced JSON object of `reply` as a requirement payload.
pub(super) fn parse(reply: &str) -> Result<EnrichmentPayload, EnrichmentUnavailable> {
    let candidate = extract_json_object(reply).ok_or(EnrichmentUnavailable::NoJson)?;
    let value: Value = serde_json::from_str(candidate)
        .map_err(|err| EnrichmentUnavailable::InvalidJson(err.to_string()))?;
    let Value::Object(object) = value else {
        return Err(EnrichmentUnavailable::InvalidJson("not an object".to_string()));
    };
    if !KNOWN_KEYS.iter().any(|key| object.contains_key(*key)) {
        return Err(EnrichmentUnavailable::InvalidJson(
            "no requirement fields present".to_string(),
        ));
    }

    Ok(EnrichmentPayload {
        skills: list(&object, "skills"),
        experience: scalar(&object, &["experience"]),
        education: scalar(&object, &["education"]),
        employment_type: scalar(&object, &["employmentType", "employment_type"]),
        location: scalar(&object, &["location"]),
        salary: scalar(&object, &["salary"]),
        seniority: scalar(&object, &["seniority"]),
        responsibilities: list(&object, "responsibilities"),
        requirements: list(&object, "requirements"),
        benefits: list(&object, "benefits"),
    })
}

/// Scalars prefer enrichment when present; lists are unioned with enrichment entries first.
pub(super) fn merge(base: JobRequirement, payload: EnrichmentPayload) -> JobRequirement {
    JobRequirement {
        role: base.role,
        skills: union_ci(payload.skills, base.skills),
        experience: payload.experience.or(base.experience),
        education: payload.education.or(base.education),
        employment_type: payload.employment_type.or(base.employment_type),
        location: payload.location.or(base.location),
        salary: payload.salary.or(base.salary),
        seniority: payload.seniority.or(base.seniority),
        responsibilities: union_ci(payload.responsibilities, base.responsibilities),
        requirements: union_ci(payload.requirements, base.requirements),
        benefits: union_ci(payload.benefits, base.benefits),
    }
}

fn scalar(object: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| object.get(*key))
        .find_map(|value| match value {
            Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
            Value::Number(number) => Some(number.to_string()),
            _ => None,
        })
}

fn list(object: &Map<String, Value>, key: &str) -> Vec<String> {
    match object.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(text) => Some(text.clone()),
                Value::Number(number) => Some(number.to_string()),
                _ => None,
            })
            .collect(),
        Some(Value::String(text)) => text
            .split(',')
            .map(|part| part.trim().to_string())
            .filter(|part| !part.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wrapped_reply_with_mixed_keys() {
        let reply = r#"Here is the JSON:
```json
{"skills": ["Python", "FastAPI"], "employment_type": "Contract", "salary": null, "benefits": "remote, meal vouchers"}
```"#;
        let payload = parse(reply).expect("payload");
        assert_eq!(payload.skills, vec!["Python", "FastAPI"]);
        assert_eq!(payload.employment_type.as_deref(), Some("Contract"));
        assert_eq!(payload.salary, None);
        assert_eq!(payload.benefits, vec!["remote", "meal vouchers"]);
    }

    #[test]
    fn classifies_unusable_replies() {
        assert_eq!(parse("I cannot help with that."), Err(EnrichmentUnavailable::NoJson));
        assert!(matches!(
            parse("{\"skills\": [python]}"),
            Err(EnrichmentUnavailable::InvalidJson(_))
        ));
        assert!(matches!(
            parse("{\"answer\": 42} {\"skills\": [\"rust\"]}"),
            Err(EnrichmentUnavailable::InvalidJson(_))
        ));
    }

    #[test]
    fn merge_prefers_present_scalars_and_unions_lists() {
        let base = JobRequirement {
            role: "Backend Engineer".to_string(),
            skills: vec!["python".to_string(), "docker".to_string()],
            experience: Some("5+ years".to_string()),
            location: Some("Remote".to_string()),
            ..JobRequirement::default()
        };
        let payload = EnrichmentPayload {
            skills: vec!["FastAPI".to_string(), "Python".to_string()],
            location: None,
            seniority: Some("Senior".to_string()),
            experience: Some("5-8 years".to_string()),
            ..EnrichmentPayload::default()
        };

        let merged = merge(base, payload);
        assert_eq!(merged.role, "Backend Engineer");
        assert_eq!(merged.skills, vec!["FastAPI", "Python", "docker"]);
        assert_eq!(merged.experience.as_deref(), Some("5-8 years"));
        assert_eq!(merged.location.as_deref(), Some("Remote"));
        assert_eq!(merged.seniority.as_deref(), Some("Senior"));
    }
}
