//! Fixed dictionaries shared by requirement extraction and the scoring rubric.

use regex::Regex;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SkillKind {
    Language,
    Framework,
    Database,
    Tooling,
    Practice,
}

pub(crate) struct SkillEntry {
    pub(crate) canonical: &'static str,
    pub(crate) kind: SkillKind,
    pub(crate) aliases: &'static [&'static str],
}

// Aliases are matched lower-cased against job text; the canonical token is what lands in
// `JobRequirement::skills`. Bare "c", "r" and "go" are left out: too ambiguous in prose.
pub(crate) const SKILLS: &[SkillEntry] = &[
    SkillEntry { canonical: "python", kind: SkillKind::Language, aliases: &["python", "python3", "py"] },
    SkillEntry { canonical: "javascript", kind: SkillKind::Language, aliases: &["javascript", "js", "ecmascript"] },
    SkillEntry { canonical: "typescript", kind: SkillKind::Language, aliases: &["typescript", "ts"] },
    SkillEntry { canonical: "java", kind: SkillKind::Language, aliases: &["java", "jdk", "jvm"] },
    SkillEntry { canonical: "c++", kind: SkillKind::Language, aliases: &["c++", "cpp", "cplusplus"] },
    SkillEntry { canonical: "c#", kind: SkillKind::Language, aliases: &["c#", "csharp", "c sharp"] },
    SkillEntry { canonical: ".net", kind: SkillKind::Framework, aliases: &[".net", "dotnet", "asp.net"] },
    SkillEntry { canonical: "go", kind: SkillKind::Language, aliases: &["golang"] },
    SkillEntry { canonical: "rust", kind: SkillKind::Language, aliases: &["rust"] },
    SkillEntry { canonical: "php", kind: SkillKind::Language, aliases: &["php"] },
    SkillEntry { canonical: "ruby", kind: SkillKind::Language, aliases: &["ruby"] },
    SkillEntry { canonical: "kotlin", kind: SkillKind::Language, aliases: &["kotlin"] },
    SkillEntry { canonical: "swift", kind: SkillKind::Language, aliases: &["swift"] },
    SkillEntry { canonical: "scala", kind: SkillKind::Language, aliases: &["scala"] },
    SkillEntry { canonical: "dart", kind: SkillKind::Language, aliases: &["dart"] },
    SkillEntry { canonical: "sql", kind: SkillKind::Language, aliases: &["sql"] },
    SkillEntry { canonical: "html", kind: SkillKind::Language, aliases: &["html", "html5"] },
    SkillEntry { canonical: "css", kind: SkillKind::Language, aliases: &["css", "css3", "sass", "scss"] },
    SkillEntry { canonical: "react", kind: SkillKind::Framework, aliases: &["react", "reactjs", "react.js"] },
    SkillEntry { canonical: "react native", kind: SkillKind::Framework, aliases: &["react native", "react-native"] },
    SkillEntry { canonical: "angular", kind: SkillKind::Framework, aliases: &["angular", "angularjs"] },
    SkillEntry { canonical: "vue.js", kind: SkillKind::Framework, aliases: &["vue", "vue.js", "vuejs"] },
    SkillEntry { canonical: "node.js", kind: SkillKind::Framework, aliases: &["node.js", "nodejs", "node"] },
    SkillEntry { canonical: "express", kind: SkillKind::Framework, aliases: &["express", "express.js", "expressjs"] },
    SkillEntry { canonical: "django", kind: SkillKind::Framework, aliases: &["django"] },
    SkillEntry { canonical: "flask", kind: SkillKind::Framework, aliases: &["flask"] },
    SkillEntry { canonical: "fastapi", kind: SkillKind::Framework, aliases: &["fastapi"] },
    SkillEntry { canonical: "spring boot", kind: SkillKind::Framework, aliases: &["spring boot", "springboot", "spring"] },
    SkillEntry { canonical: "laravel", kind: SkillKind::Framework, aliases: &["laravel"] },
    SkillEntry { canonical: "flutter", kind: SkillKind::Framework, aliases: &["flutter"] },
    SkillEntry { canonical: "tensorflow", kind: SkillKind::Framework, aliases: &["tensorflow"] },
    SkillEntry { canonical: "pytorch", kind: SkillKind::Framework, aliases: &["pytorch"] },
    SkillEntry { canonical: "postgresql", kind: SkillKind::Database, aliases: &["postgresql", "postgres"] },
    SkillEntry { canonical: "mysql", kind: SkillKind::Database, aliases: &["mysql", "mariadb"] },
    SkillEntry { canonical: "mongodb", kind: SkillKind::Database, aliases: &["mongodb", "mongo"] },
    SkillEntry { canonical: "redis", kind: SkillKind::Database, aliases: &["redis"] },
    SkillEntry { canonical: "sqlite", kind: SkillKind::Database, aliases: &["sqlite", "sqlite3"] },
    SkillEntry { canonical: "docker", kind: SkillKind::Tooling, aliases: &["docker", "dockerfile"] },
    SkillEntry { canonical: "kubernetes", kind: SkillKind::Tooling, aliases: &["kubernetes", "k8s"] },
    SkillEntry { canonical: "git", kind: SkillKind::Tooling, aliases: &["git", "github", "gitlab"] },
    SkillEntry { canonical: "ci/cd", kind: SkillKind::Tooling, aliases: &["ci/cd", "cicd", "jenkins", "github actions"] },
    SkillEntry { canonical: "aws", kind: SkillKind::Tooling, aliases: &["aws", "amazon web services"] },
    SkillEntry { canonical: "azure", kind: SkillKind::Tooling, aliases: &["azure"] },
    SkillEntry { canonical: "gcp", kind: SkillKind::Tooling, aliases: &["gcp", "google cloud"] },
    SkillEntry { canonical: "linux", kind: SkillKind::Tooling, aliases: &["linux"] },
    SkillEntry { canonical: "terraform", kind: SkillKind::Tooling, aliases: &["terraform"] },
    SkillEntry { canonical: "kafka", kind: SkillKind::Tooling, aliases: &["kafka"] },
    SkillEntry { canonical: "graphql", kind: SkillKind::Practice, aliases: &["graphql"] },
    SkillEntry { canonical: "rest", kind: SkillKind::Practice, aliases: &["rest api", "restful", "rest apis"] },
    SkillEntry { canonical: "agile", kind: SkillKind::Practice, aliases: &["agile", "scrum", "kanban"] },
    SkillEntry { canonical: "machine learning", kind: SkillKind::Practice, aliases: &["machine learning", "ml"] },
];

/// Compiled alias matchers, one per dictionary entry, in dictionary order.
///
/// Boundaries are explicit character classes rather than `\b`, because `\b` cannot see the
/// edge of symbol-bearing tokens such as `c++`, `c#` or `.net`.
pub(crate) fn skill_matchers() -> &'static [(&'static SkillEntry, Regex)] {
    static MATCHERS: OnceLock<Vec<(&'static SkillEntry, Regex)>> = OnceLock::new();
    MATCHERS.get_or_init(|| {
        SKILLS
            .iter()
            .filter_map(|entry| {
                let alternatives = entry
                    .aliases
                    .iter()
                    .map(|alias| regex::escape(alias))
                    .collect::<Vec<_>>()
                    .join("|");
                let pattern = format!(r"(?:^|[^a-z0-9+#.])(?:{alternatives})(?:$|[^a-z0-9+#])");
                Regex::new(&pattern).ok().map(|regex| (entry, regex))
            })
            .collect()
    })
}

/// Dictionary entry for a free-form skill string, if it names a known skill.
pub(crate) fn lookup_skill(skill: &str) -> Option<&'static SkillEntry> {
    let lowered = skill.trim().to_lowercase();
    SKILLS
        .iter()
        .find(|entry| entry.canonical == lowered || entry.aliases.contains(&lowered.as_str()))
}

/// Company reputation tiers with their score multipliers; unknown companies use
/// [`DEFAULT_TIER`].
pub(crate) const COMPANY_TIERS: &[(&str, f64, &[&str])] = &[
    (
        "tier1",
        1.0,
        &[
            "google", "microsoft", "amazon", "apple", "meta", "facebook", "netflix", "oracle",
            "salesforce", "adobe", "nvidia", "intel", "ibm", "cisco", "vmware", "palantir",
            "uber", "airbnb", "linkedin", "twitter", "tesla", "spacex", "spotify", "snapchat",
            "pinterest", "reddit", "dropbox", "twitch", "github", "atlassian", "slack", "zoom",
            "bytedance", "tiktok", "tencent", "alibaba",
        ],
    ),
    (
        "tier2",
        0.8,
        &[
            "capgemini", "accenture", "atos", "cgi", "sopra steria", "deloitte", "pwc", "kpmg",
            "ernst & young", "thales", "dassault", "sopra", "steria", "orange", "bouygues",
            "dell", "lenovo", "siemens", "bosch", "philips",
        ],
    ),
    (
        "tier3",
        0.67,
        &[
            "sap", "red hat", "redhat", "mongodb", "elastic", "databricks", "snowflake",
            "datadog", "splunk", "servicenow", "workday", "zendesk", "shopify", "stripe",
            "square", "paypal", "ebay", "booking", "expedia", "trivago", "delivery hero",
            "doordash", "instacart", "lyft", "grab", "gojek", "yelp", "glassdoor",
        ],
    ),
    (
        "tier4",
        0.47,
        &[
            "criteo", "blablacar", "doctolib", "veepee", "vinted", "mano mano", "backmarket",
            "qonto", "alan", "ledger", "swile", "payfit", "contentsquare", "algolia", "talend",
        ],
    ),
];

pub(crate) const DEFAULT_TIER: (&str, f64) = ("tier5", 0.33);

/// Tier name and multiplier for a company. Short names ("x", "hp", "ey") are deliberately
/// absent: substring matching would hit them inside unrelated names.
pub(crate) fn company_tier(company: &str) -> (&'static str, f64) {
    let normalized = company.trim().to_lowercase();
    if normalized.is_empty() {
        return DEFAULT_TIER;
    }
    COMPANY_TIERS
        .iter()
        .find(|(_, _, companies)| companies.iter().any(|known| normalized.contains(known)))
        .map(|(tier, multiplier, _)| (*tier, *multiplier))
        .unwrap_or(DEFAULT_TIER)
}

pub(crate) const RECOGNIZED_CERTIFICATIONS: &[&str] = &[
    "aws", "azure", "gcp", "google cloud", "kubernetes", "docker", "scrum", "pmp", "cisco",
    "ccna", "ccnp", "comptia", "itil", "oracle", "salesforce", "microsoft", "red hat", "mongodb",
];

pub(crate) const INSTITUTION_KEYWORDS: &[&str] =
    &["engineering", "école", "ecole", "school", "university", "université", "universite"];

pub(crate) const PLACEHOLDER_PROJECT_KEYWORDS: &[&str] =
    &["example", "demo", "test", "tutorial", "hello world"];

pub(crate) const JUNIOR_ROLE_KEYWORDS: &[&str] =
    &["intern", "stage", "junior", "trainee", "stagiaire", "apprentice", "alternant"];

pub(crate) const SENIOR_ROLE_KEYWORDS: &[&str] =
    &["senior", "lead", "leader", "architect", "manager", "chef", "principal", "staff"];

pub(crate) const ONGOING_MARKERS: &[&str] = &["present", "en cours", "in progress", "current"];

/// Employment types in match priority order: (label, keywords).
pub(crate) const EMPLOYMENT_TYPES: &[(&str, &[&str])] = &[
    (
        "Internship",
        &["internship", "stagiaire", "offre de stage", "stage pfe", "stage de fin", "stage d'"],
    ),
    ("Part-time", &["part-time", "part time"]),
    (
        "Contract",
        &[
            "contractor", "freelance", "fixed-term", "contract role", "contract position",
            "contract basis", "cdd",
        ],
    ),
    ("Full-time", &["full-time", "full time", "permanent", "cdi"]),
];

/// Seniority levels in match priority order: (label, keywords).
pub(crate) const SENIORITY_LEVELS: &[(&str, &[&str])] = &[
    ("Lead", &["lead", "principal", "staff engineer", "head of"]),
    ("Senior", &["senior", "sr.", "sr "]),
    ("Mid-level", &["mid-level", "mid level", "intermediate", "confirmed", "confirmé"]),
    ("Junior", &["junior", "jr.", "entry level", "entry-level", "graduate"]),
    ("Intern", &["intern", "internship", "trainee"]),
];

/// Seniority keywords that are also everyday verbs; only trusted in a job title.
pub(crate) const TITLE_ONLY_SENIORITY_TERMS: &[&str] = &["lead"];

/// Work location modes in match priority order: (label, keywords).
pub(crate) const LOCATIONS: &[(&str, &[&str])] = &[
    ("Hybrid", &["hybrid"]),
    ("Remote", &["remote", "work from home", "télétravail", "teletravail"]),
    ("On-site", &["on-site", "onsite", "on site", "in office"]),
];

/// Whole-term containment: an alphanumeric edge of `term` must not be glued to letters or
/// digits. Edges that are punctuation (`sr.`, `stage d'`) match whatever follows.
pub(crate) fn contains_term(haystack: &str, term: &str) -> bool {
    let term = term.trim();
    let (Some(first), Some(last)) = (term.chars().next(), term.chars().next_back()) else {
        return false;
    };
    haystack.match_indices(term).any(|(at, _)| {
        let before = haystack[..at].chars().next_back();
        let after = haystack[at + term.len()..].chars().next();
        let glued_before = first.is_alphanumeric() && before.is_some_and(char::is_alphanumeric);
        let glued_after = last.is_alphanumeric() && after.is_some_and(char::is_alphanumeric);
        !glued_before && !glued_after
    })
}
