use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::{CompletionConfig, ScoringConfig};
use crate::ranking::completion::{CompletionClient, CompletionError, CompletionRequest};
use crate::ranking::domain::CandidateRecord;
use crate::ranking::requirement::JobRequirement;
use crate::ranking::source::{CvSource, SourceError};

pub(super) fn scoring_config() -> ScoringConfig {
    ScoringConfig {
        reference_year: 2026,
    }
}

/// Completion settings with short bounds so timeout paths finish quickly.
pub(super) fn fast_completion_config() -> CompletionConfig {
    CompletionConfig {
        enrichment_timeout: Duration::from_millis(50),
        audit_timeout: Duration::from_millis(50),
        ..CompletionConfig::default()
    }
}

pub(super) fn backend_requirement() -> JobRequirement {
    JobRequirement {
        role: "Backend Python Developer".to_string(),
        skills: vec![
            "python".to_string(),
            "django".to_string(),
            "postgresql".to_string(),
            "docker".to_string(),
        ],
        experience: Some("3+ years".to_string()),
        education: Some("Computer Science".to_string()),
        ..JobRequirement::default()
    }
}

pub(super) fn strong_cv() -> Value {
    json!({
        "personal_info": {"full_name": "Amina Idrissi", "email": "amina@example.org"},
        "experience": [
            {
                "company": "Capgemini",
                "role": "Senior Backend Developer",
                "period": "2022 - Present",
                "technologies": ["Python", "Django", "PostgreSQL", "Docker"]
            },
            {
                "company": "Orange Business",
                "role": "Junior Developer",
                "period": "2020 - 2022",
                "technologies": ["Python", "Flask"]
            }
        ],
        "projects": [
            {
                "title": "Inventory API",
                "description": "REST API for warehouse inventory with role-based access and audit trails",
                "technologies": ["Django", "PostgreSQL", "Docker"]
            },
            {
                "title": "Log Analyzer",
                "description": "Streaming log analysis pipeline that flags anomalies for on-call engineers",
                "technologies": ["Python", "Kafka", "Docker"]
            }
        ],
        "skills": {
            "programming_languages": ["Python", "SQL"],
            "frameworks": ["Django", "Flask"],
            "databases": ["PostgreSQL"],
            "devops_tools": ["Docker"]
        },
        "education": [
            {"degree": "Master", "field": "Computer Science", "institution": "Université Mohammed V"}
        ],
        "certifications": ["AWS Cloud Practitioner"]
    })
}

pub(super) fn junior_cv() -> Value {
    json!({
        "personal_info": {"full_name": "Omar Alaoui", "email": "omar@example.org"},
        "experience": [
            {
                "company": "Local Agency",
                "role": "Web Intern",
                "period": "June 2024 - September 2024",
                "technologies": ["PHP", "MySQL"]
            }
        ],
        "projects": [
            {"title": "Hello World demo", "description": "tutorial app", "technologies": ["PHP"]}
        ],
        "skills": ["PHP", "MySQL", "HTML"],
        "education": [{"degree": "Licence", "field": "Management", "institution": "ISGA"}]
    })
}

pub(super) fn sparse_cv() -> Value {
    json!({"personal_info": {"full_name": "Sara Kettani"}})
}

pub(super) fn records() -> Vec<CandidateRecord> {
    vec![
        CandidateRecord::new("omar", junior_cv()),
        CandidateRecord::new("amina", strong_cv()),
        CandidateRecord::new("sara", sparse_cv()),
    ]
}

#[derive(Debug, Clone)]
pub(super) enum Script {
    Reply(String),
    Fail,
    Hang,
}

/// Completion double that replays one scripted behaviour and records what it was asked.
pub(super) struct ScriptedClient {
    script: Script,
    calls: AtomicUsize,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedClient {
    pub(super) fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub(super) fn replying(reply: impl Into<String>) -> Arc<Self> {
        Self::new(Script::Reply(reply.into()))
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(super) fn last_request(&self) -> Option<CompletionRequest> {
        self.requests
            .lock()
            .expect("request log mutex poisoned")
            .last()
            .cloned()
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .expect("request log mutex poisoned")
            .push(request.clone());

        match &self.script {
            Script::Reply(reply) => Ok(reply.clone()),
            Script::Fail => Err(CompletionError::Server {
                status: 503,
                body: "model not loaded".to_string(),
            }),
            Script::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(String::new())
            }
        }
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryCvSource {
    records: Arc<Mutex<BTreeMap<String, Value>>>,
    /// Listed identifiers with no stored record.
    dangling: Vec<String>,
}

impl MemoryCvSource {
    pub(super) fn with(records: Vec<CandidateRecord>) -> Self {
        let source = Self::default();
        {
            let mut guard = source.records.lock().expect("source mutex poisoned");
            for record in records {
                guard.insert(record.id, record.raw);
            }
        }
        source
    }

    pub(super) fn listing_missing(mut self, id: &str) -> Self {
        self.dangling.push(id.to_string());
        self
    }
}

impl CvSource for MemoryCvSource {
    fn list(&self) -> Result<Vec<String>, SourceError> {
        let guard = self.records.lock().expect("source mutex poisoned");
        Ok(guard.keys().chain(&self.dangling).cloned().collect())
    }

    fn fetch(&self, id: &str) -> Result<CandidateRecord, SourceError> {
        let guard = self.records.lock().expect("source mutex poisoned");
        guard
            .get(id)
            .map(|raw| CandidateRecord::new(id, raw.clone()))
            .ok_or_else(|| SourceError::NotFound(id.to_string()))
    }
}
