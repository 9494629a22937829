//! Lenient, read-only view over a raw CV document.
//!
//! Upstream parsers produce CVs of uneven quality: missing sections, `null` where a list is
//! expected, experience entries serialized as JSON strings. Every field here degrades to empty
//! instead of failing so that one sparse record never aborts a scoring run.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::vocabulary::{lookup_skill, SkillKind};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CandidateProfile {
    #[serde(deserialize_with = "lenient")]
    pub personal_info: PersonalInfo,
    #[serde(alias = "experiences", deserialize_with = "lenient_list")]
    pub experience: Vec<Experience>,
    #[serde(deserialize_with = "lenient_list")]
    pub projects: Vec<Project>,
    pub skills: SkillInventory,
    #[serde(deserialize_with = "lenient_list")]
    pub education: Vec<Education>,
    #[serde(deserialize_with = "lenient_list")]
    pub certifications: Vec<String>,
}

impl CandidateProfile {
    pub fn from_raw(raw: &Value) -> Self {
        Self::deserialize(raw).unwrap_or_default()
    }

    /// Technologies mentioned across all experience entries, in document order.
    pub fn experience_technologies(&self) -> Vec<&str> {
        self.experience
            .iter()
            .flat_map(|experience| experience.technologies.iter().map(String::as_str))
            .collect()
    }

    pub fn project_technologies(&self) -> Vec<&str> {
        self.projects
            .iter()
            .flat_map(|project| project.technologies.iter().map(String::as_str))
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PersonalInfo {
    #[serde(alias = "name", deserialize_with = "lenient")]
    pub full_name: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Experience {
    #[serde(deserialize_with = "lenient")]
    pub company: String,
    #[serde(alias = "title", alias = "position", deserialize_with = "lenient")]
    pub role: String,
    #[serde(alias = "dates", deserialize_with = "lenient")]
    pub period: String,
    #[serde(deserialize_with = "lenient")]
    pub duration: Option<String>,
    #[serde(deserialize_with = "text_list")]
    pub technologies: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Project {
    #[serde(alias = "name", deserialize_with = "lenient")]
    pub title: String,
    #[serde(deserialize_with = "lenient")]
    pub description: String,
    #[serde(deserialize_with = "text_list")]
    pub technologies: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Education {
    #[serde(deserialize_with = "lenient")]
    pub degree: String,
    #[serde(deserialize_with = "lenient")]
    pub field: String,
    #[serde(alias = "school", deserialize_with = "lenient")]
    pub institution: String,
}

/// Skill section, either grouped by category or a flat list.
#[derive(Debug, Clone, PartialEq)]
pub enum SkillInventory {
    Categorized(Vec<(String, Vec<String>)>),
    Flat(Vec<String>),
}

const SKILL_CATEGORY_ORDER: &[&str] = &[
    "programming_languages",
    "frameworks",
    "web_technologies",
    "mobile_technologies",
    "databases",
    "devops_tools",
    "data_science",
    "other",
];

impl Default for SkillInventory {
    fn default() -> Self {
        Self::Flat(Vec::new())
    }
}

impl SkillInventory {
    /// Every listed skill. Grouped inventories yield the known categories first, then any
    /// extra categories in key order.
    pub fn all(&self) -> Vec<&str> {
        match self {
            SkillInventory::Flat(skills) => skills.iter().map(String::as_str).collect(),
            SkillInventory::Categorized(groups) => {
                let mut ordered: Vec<&(String, Vec<String>)> = groups.iter().collect();
                ordered.sort_by_key(|(name, _)| {
                    let rank = SKILL_CATEGORY_ORDER
                        .iter()
                        .position(|known| known == name)
                        .unwrap_or(SKILL_CATEGORY_ORDER.len());
                    (rank, name.clone())
                });
                ordered
                    .into_iter()
                    .flat_map(|(_, skills)| skills.iter().map(String::as_str))
                    .collect()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.all().is_empty()
    }

    pub fn has_languages(&self) -> bool {
        self.has_kind("programming_languages", SkillKind::Language)
    }

    pub fn has_frameworks(&self) -> bool {
        self.has_kind("frameworks", SkillKind::Framework)
    }

    fn has_kind(&self, group: &str, kind: SkillKind) -> bool {
        match self {
            SkillInventory::Categorized(groups) => groups
                .iter()
                .any(|(name, skills)| name == group && !skills.is_empty()),
            SkillInventory::Flat(skills) => skills
                .iter()
                .any(|skill| lookup_skill(skill).map(|entry| entry.kind) == Some(kind)),
        }
    }
}

impl<'de> Deserialize<'de> for SkillInventory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::Object(map) => SkillInventory::Categorized(
                map.into_iter()
                    .map(|(name, skills)| (name, string_list(skills)))
                    .collect(),
            ),
            Value::Array(_) => SkillInventory::Flat(string_list(value)),
            _ => SkillInventory::default(),
        })
    }
}

fn string_list(value: Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(text) if !text.trim().is_empty() => Some(text),
                _ => None,
            })
            .collect(),
        Value::String(text) if !text.trim().is_empty() => text
            .split(',')
            .map(|part| part.trim().to_string())
            .filter(|part| !part.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

/// String entries of an array, or a comma separated string split into entries.
fn text_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(string_list(Value::deserialize(deserializer)?))
}

fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Keep the entries that parse, including entries that arrive JSON-encoded as strings.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Array(items) = value else {
        return Ok(Vec::new());
    };

    Ok(items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<T>(item.clone()) {
            Ok(parsed) => Some(parsed),
            Err(_) => match item {
                Value::String(encoded) => serde_json::from_str::<T>(&encoded).ok(),
                _ => None,
            },
        })
        .collect())
}
