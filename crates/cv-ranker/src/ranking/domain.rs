use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Score value held as integer hundredths of a point.
///
/// Every sub-score is rounded to hundredths once, so totals are exact integer sums and
/// ordering never depends on floating-point summation order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Points(u32);

impl Points {
    pub const ZERO: Points = Points(0);

    pub const fn from_hundredths(value: u32) -> Self {
        Self(value)
    }

    pub const fn whole(value: u32) -> Self {
        Self(value * 100)
    }

    pub const fn hundredths(self) -> u32 {
        self.0
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.0) / 100.0
    }

    /// Round to hundredths and clamp into `[0, cap]`. NaN maps to zero.
    pub fn clamped(value: f64, cap: Points) -> Self {
        Self::clamp_reporting(value, cap).0
    }

    /// Like [`Points::clamped`], also reporting whether the value had to be pulled into range.
    pub fn clamp_reporting(value: f64, cap: Points) -> (Self, bool) {
        if value.is_nan() {
            return (Self::ZERO, true);
        }
        let scaled = (value * 100.0).round();
        if scaled < 0.0 {
            (Self::ZERO, true)
        } else if scaled > f64::from(cap.0) {
            (cap, true)
        } else {
            (Self(scaled as u32), false)
        }
    }
}

impl std::ops::Add for Points {
    type Output = Points;

    fn add(self, rhs: Self) -> Self::Output {
        Points(self.0 + rhs.0)
    }
}

impl fmt::Display for Points {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.as_f64())
    }
}

impl Serialize for Points {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

impl<'de> Deserialize<'de> for Points {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        if !value.is_finite() || value < 0.0 {
            return Err(serde::de::Error::custom(format!(
                "points must be a non-negative number, found {value}"
            )));
        }
        Ok(Points((value * 100.0).round() as u32))
    }
}

/// The five scoring dimensions, declared in tie-break priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreCategory {
    ExperienceQuality,
    TechnicalSkills,
    ProjectsImpact,
    EducationCertifications,
    SignalConsistency,
}

impl ScoreCategory {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::ExperienceQuality,
            Self::TechnicalSkills,
            Self::ProjectsImpact,
            Self::EducationCertifications,
            Self::SignalConsistency,
        ]
    }

    pub const fn cap(self) -> Points {
        match self {
            Self::ExperienceQuality => Points::whole(35),
            Self::TechnicalSkills => Points::whole(25),
            Self::ProjectsImpact => Points::whole(20),
            Self::EducationCertifications => Points::whole(10),
            Self::SignalConsistency => Points::whole(10),
        }
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::ExperienceQuality => "experience_quality",
            Self::TechnicalSkills => "technical_skills",
            Self::ProjectsImpact => "projects_impact",
            Self::EducationCertifications => "education_certifications",
            Self::SignalConsistency => "signal_consistency",
        }
    }

    pub const fn camel_key(self) -> &'static str {
        match self {
            Self::ExperienceQuality => "experienceQuality",
            Self::TechnicalSkills => "technicalSkills",
            Self::ProjectsImpact => "projectsImpact",
            Self::EducationCertifications => "educationCertifications",
            Self::SignalConsistency => "signalConsistency",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::ExperienceQuality => "Experience Quality",
            Self::TechnicalSkills => "Technical Skills",
            Self::ProjectsImpact => "Projects & Impact",
            Self::EducationCertifications => "Education & Certifications",
            Self::SignalConsistency => "Signal & Consistency",
        }
    }
}

/// Bounded per-category scores. Values can only enter through [`SubScores::set`], which clamps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct SubScores {
    experience_quality: Points,
    technical_skills: Points,
    projects_impact: Points,
    education_certifications: Points,
    signal_consistency: Points,
}

impl SubScores {
    pub fn get(&self, category: ScoreCategory) -> Points {
        match category {
            ScoreCategory::ExperienceQuality => self.experience_quality,
            ScoreCategory::TechnicalSkills => self.technical_skills,
            ScoreCategory::ProjectsImpact => self.projects_impact,
            ScoreCategory::EducationCertifications => self.education_certifications,
            ScoreCategory::SignalConsistency => self.signal_consistency,
        }
    }

    /// Store `value` for `category`, clamped to the category cap. Returns true when clamped.
    pub fn set(&mut self, category: ScoreCategory, value: Points) -> bool {
        let cap = category.cap();
        let bounded = value.min(cap);
        let slot = match category {
            ScoreCategory::ExperienceQuality => &mut self.experience_quality,
            ScoreCategory::TechnicalSkills => &mut self.technical_skills,
            ScoreCategory::ProjectsImpact => &mut self.projects_impact,
            ScoreCategory::EducationCertifications => &mut self.education_certifications,
            ScoreCategory::SignalConsistency => &mut self.signal_consistency,
        };
        *slot = bounded;
        bounded != value
    }

    pub fn with(mut self, category: ScoreCategory, value: Points) -> Self {
        self.set(category, value);
        self
    }

    /// Exact sum of the five categories.
    pub fn total(&self) -> Points {
        ScoreCategory::ordered()
            .into_iter()
            .fold(Points::ZERO, |acc, category| acc + self.get(category))
    }
}

/// Where a scored record came from before it was normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Produced by this crate's scoring engine.
    Engine,
    /// Historical ranking documents using `name`/`score` style fields.
    Legacy,
    Imported(String),
}

/// Per-category contribution with the rubric's reasoning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreComponent {
    pub category: ScoreCategory,
    pub score: Points,
    pub notes: String,
}

/// One candidate scored against one requirement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateScore {
    pub candidate_id: String,
    pub name: String,
    scores: SubScores,
    total: Points,
    pub explanation: String,
    pub components: Vec<ScoreComponent>,
    /// Source record, passed through untouched.
    pub raw: serde_json::Value,
}

impl CandidateScore {
    pub fn new(
        candidate_id: impl Into<String>,
        name: impl Into<String>,
        scores: SubScores,
        explanation: impl Into<String>,
        components: Vec<ScoreComponent>,
        raw: serde_json::Value,
    ) -> Self {
        Self {
            candidate_id: candidate_id.into(),
            name: name.into(),
            total: scores.total(),
            scores,
            explanation: explanation.into(),
            components,
            raw,
        }
    }

    pub fn scores(&self) -> &SubScores {
        &self.scores
    }

    pub fn total(&self) -> Points {
        self.total
    }
}

/// A candidate document as handed over by the CV source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub id: String,
    pub raw: serde_json::Value,
}

impl CandidateRecord {
    pub fn new(id: impl Into<String>, raw: serde_json::Value) -> Self {
        Self { id: id.into(), raw }
    }
}
