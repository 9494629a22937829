use regex::Regex;
use std::sync::OnceLock;

use super::{union_ci, JobRequirement};
use crate::ranking::vocabulary::{
    contains_term, skill_matchers, EMPLOYMENT_TYPES, LOCATIONS, SENIORITY_LEVELS,
    TITLE_ONLY_SENIORITY_TERMS,
};

const EDUCATION_KEYWORDS: &[&str] = &[
    "phd", "doctorate", "master", "msc", "mba", "bachelor", "bsc", "licence", "degree",
    "diploma", "diplôme", "bac+3", "bac+5", "bac + 5", "engineering school",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Responsibilities,
    Requirements,
    Benefits,
}

const SECTION_HEADINGS: &[(Section, &[&str])] = &[
    (
        Section::Responsibilities,
        &["responsibilities", "what you will do", "what you'll do", "your role", "missions", "duties"],
    ),
    (
        Section::Requirements,
        &[
            "requirements", "qualifications", "what we're looking for", "what we are looking for",
            "your profile", "must have", "nice to have",
        ],
    ),
    (Section::Benefits, &["benefits", "perks", "what we offer", "avantages"]),
];

const MAX_HEADING_CHARS: usize = 50;
const MAX_ROLE_CHARS: usize = 100;

fn experience_range_regex() -> &'static Regex {
    static RANGE: OnceLock<Regex> = OnceLock::new();
    RANGE.get_or_init(|| {
        Regex::new(r"(\d{1,2})\s*(?:-|–|to)\s*(\d{1,2})\s*\+?\s*(?:years?|yrs?|ans)\b")
            .expect("experience range pattern is valid")
    })
}

fn experience_minimum_regex() -> &'static Regex {
    static MINIMUM: OnceLock<Regex> = OnceLock::new();
    MINIMUM.get_or_init(|| {
        Regex::new(r"(\d{1,2})\s*(\+|plus)?\s*(?:years?|yrs?|ans)\b")
            .expect("experience pattern is valid")
    })
}

fn salary_regex() -> &'static Regex {
    static SALARY: OnceLock<Regex> = OnceLock::new();
    SALARY.get_or_init(|| {
        Regex::new(
            r"(?i)(?:[$€£]\s?\d[\d,.]*\s?k?(?:\s?(?:-|–|to)\s?[$€£]?\s?\d[\d,.]*\s?k?)?|\b\d[\d,.]*\s?k?(?:\s?(?:-|–|to)\s?\d[\d,.]*\s?k?)?\s?(?:(?:eur|usd|gbp|mad|dhs?)\b|€))",
        )
        .expect("salary pattern is valid")
    })
}

fn duration_mention_regex() -> &'static Regex {
    static DURATION: OnceLock<Regex> = OnceLock::new();
    DURATION.get_or_init(|| {
        Regex::new(r"(?i)\b\d+(?:\s*(?:-|–|to)\s*\d+)?\s*(?:months?|weeks?|mois|semaines)\b")
            .expect("duration mention pattern is valid")
    })
}

fn date_mention_regex() -> &'static Regex {
    static DATE: OnceLock<Regex> = OnceLock::new();
    DATE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(?:(?:jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\s+\d{4}|\d{4}-\d{2}-\d{2}|\d{1,2}/\d{1,2}/\d{2,4})\b",
        )
        .expect("date mention pattern is valid")
    })
}

/// Dictionary and pattern based extraction. Pure function of the text.
pub(super) fn extract(title: &str, description: &str) -> JobRequirement {
    let text = format!("{}\n{}", title.trim(), description.trim());
    let lowered = text.to_lowercase();
    let lowered_title = title.to_lowercase();

    let (responsibilities, mut requirements, benefits) = sections(description);
    requirements = union_ci(requirements, timing_mentions(&text));

    JobRequirement {
        role: role(title, description),
        skills: skills(&lowered),
        experience: experience(&lowered),
        education: education(&text),
        employment_type: first_label(EMPLOYMENT_TYPES, &lowered),
        location: first_label(LOCATIONS, &lowered),
        salary: salary_regex()
            .find(&text)
            .map(|found| found.as_str().trim().to_string()),
        seniority: first_label(SENIORITY_LEVELS, &lowered_title)
            .or_else(|| description_seniority(&lowered)),
        responsibilities,
        requirements,
        benefits,
    }
}

fn role(title: &str, description: &str) -> String {
    let title = title.trim();
    if !title.is_empty() {
        return title.to_string();
    }
    description
        .lines()
        .map(clean_line)
        .find(|line| !line.is_empty())
        .map(|line| line.chars().take(MAX_ROLE_CHARS).collect())
        .unwrap_or_default()
}

/// Canonical dictionary tokens found in `lowered`, in dictionary order.
fn skills(lowered: &str) -> Vec<String> {
    let found = skill_matchers()
        .iter()
        .filter(|(_, matcher)| matcher.is_match(lowered))
        .map(|(entry, _)| entry.canonical.to_string())
        .collect();
    union_ci(found, Vec::new())
}

fn experience(lowered: &str) -> Option<String> {
    if let Some(caps) = experience_range_regex().captures(lowered) {
        return Some(format!("{}-{} years", &caps[1], &caps[2]));
    }

    let caps = experience_minimum_regex().captures(lowered)?;
    let years = &caps[1];
    Some(match (caps.get(2).is_some(), years) {
        (true, _) => format!("{years}+ years"),
        (false, "1") => "1 year".to_string(),
        (false, _) => format!("{years} years"),
    })
}

fn education(text: &str) -> Option<String> {
    text.split(['\n', ';'])
        .flat_map(|line| line.split(". "))
        .map(clean_line)
        .find(|clause| {
            let lowered = clause.to_lowercase();
            EDUCATION_KEYWORDS
                .iter()
                .any(|keyword| contains_term(&lowered, keyword))
        })
        .map(str::to_string)
}

fn first_label(table: &[(&str, &[&str])], lowered: &str) -> Option<String> {
    table
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|keyword| contains_term(lowered, keyword)))
        .map(|(label, _)| label.to_string())
}

/// Seniority read from the whole text, ignoring terms that also work as verbs.
fn description_seniority(lowered: &str) -> Option<String> {
    SENIORITY_LEVELS
        .iter()
        .find(|(_, keywords)| {
            keywords.iter().any(|keyword| {
                !TITLE_ONLY_SENIORITY_TERMS.contains(keyword) && contains_term(lowered, keyword)
            })
        })
        .map(|(label, _)| label.to_string())
}

/// Explicit durations and dates, e.g. `Duration: 6 months`, `Date: March 2025`.
fn timing_mentions(text: &str) -> Vec<String> {
    let durations = duration_mention_regex()
        .find_iter(text)
        .map(|found| format!("Duration: {}", found.as_str()));
    let dates = date_mention_regex()
        .find_iter(text)
        .map(|found| format!("Date: {}", found.as_str()));
    durations.chain(dates).collect()
}

/// Bulleted or plain lines grouped under recognised headings.
fn sections(description: &str) -> (Vec<String>, Vec<String>, Vec<String>) {
    let mut responsibilities = Vec::new();
    let mut requirements = Vec::new();
    let mut benefits = Vec::new();
    let mut current: Option<Section> = None;

    for raw in description.lines() {
        let line = clean_line(raw);
        if line.is_empty() {
            continue;
        }

        if let Some(heading) = heading(raw) {
            current = heading;
            continue;
        }

        let target = match current {
            Some(Section::Responsibilities) => &mut responsibilities,
            Some(Section::Requirements) => &mut requirements,
            Some(Section::Benefits) => &mut benefits,
            None => continue,
        };
        target.push(line.to_string());
    }

    (
        union_ci(responsibilities, Vec::new()),
        union_ci(requirements, Vec::new()),
        union_ci(benefits, Vec::new()),
    )
}

/// `Some(section)` when the line is a heading; `Some(None)` for an unrecognised heading that
/// closes the current section.
fn heading(raw: &str) -> Option<Option<Section>> {
    let trimmed = raw.trim();
    if is_bullet(trimmed) || trimmed.chars().count() > MAX_HEADING_CHARS {
        return None;
    }

    let normalized = trimmed
        .trim_start_matches('#')
        .trim()
        .trim_end_matches(':')
        .trim()
        .to_lowercase();
    let section = SECTION_HEADINGS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|keyword| normalized.contains(keyword)))
        .map(|(section, _)| *section);

    match section {
        Some(section) => Some(Some(section)),
        None if trimmed.ends_with(':') => Some(None),
        None => None,
    }
}

fn is_bullet(line: &str) -> bool {
    line.starts_with(['-', '*', '•', '·'])
        || line
            .split_once(['.', ')'])
            .is_some_and(|(number, _)| !number.is_empty() && number.chars().all(|c| c.is_ascii_digit()))
}

fn clean_line(line: &str) -> &str {
    let trimmed = line.trim();
    let without_bullet = trimmed.trim_start_matches(['-', '*', '•', '·']);
    let without_number = match without_bullet.split_once(['.', ')']) {
        Some((number, rest)) if !number.is_empty() && number.chars().all(|c| c.is_ascii_digit()) => rest,
        _ => without_bullet,
    };
    without_number.trim().trim_end_matches('.').trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_posting_yields_core_fields() {
        let requirement = extract("Backend Engineer, Python, 5+ years, remote", "");
        assert_eq!(requirement.role, "Backend Engineer, Python, 5+ years, remote");
        assert!(requirement.skills.contains(&"python".to_string()));
        assert_eq!(requirement.experience.as_deref(), Some("5+ years"));
        assert_eq!(requirement.location.as_deref(), Some("Remote"));
        assert_eq!(requirement.salary, None);
    }

    #[test]
    fn experience_forms() {
        assert_eq!(experience("3-5 years of experience").as_deref(), Some("3-5 years"));
        assert_eq!(experience("3 to 5 yrs").as_deref(), Some("3-5 years"));
        assert_eq!(experience("at least 2 years").as_deref(), Some("2 years"));
        assert_eq!(experience("1 year minimum").as_deref(), Some("1 year"));
        assert_eq!(experience("no number here"), None);
    }

    #[test]
    fn classifies_type_seniority_and_location() {
        let requirement = extract(
            "Senior Data Engineer",
            "Full-time position, hybrid work from our Casablanca office. You will lead migrations.",
        );
        assert_eq!(requirement.employment_type.as_deref(), Some("Full-time"));
        assert_eq!(requirement.seniority.as_deref(), Some("Senior"));
        assert_eq!(requirement.location.as_deref(), Some("Hybrid"));
    }

    #[test]
    fn everyday_english_does_not_trigger_classifiers() {
        let requirement = extract(
            "Backend Engineer",
            "Join our early-stage startup. You will lead contract testing for our APIs. \
             Full-time, permanent position.",
        );
        assert_eq!(requirement.employment_type.as_deref(), Some("Full-time"));
        assert_eq!(requirement.seniority, None);

        let titled = extract("Lead Platform Engineer", "You will lead the migration.");
        assert_eq!(titled.seniority.as_deref(), Some("Lead"));

        let internship = extract("Stage PFE - Data", "Offre de stage de fin d'études, 6 mois.");
        assert_eq!(internship.employment_type.as_deref(), Some("Internship"));

        let contract = extract("DevOps Engineer", "Six-month contract role, remote.");
        assert_eq!(contract.employment_type.as_deref(), Some("Contract"));
    }

    #[test]
    fn term_matching_respects_word_edges() {
        assert!(contains_term("an internship in paris", "internship"));
        assert!(!contains_term("internal tools team", "intern"));
        assert!(contains_term("sr. developer", "sr."));
        assert!(!contains_term("leadership", "lead"));
        assert!(contains_term("un stage d'ingénieur", "stage d'"));
    }

    #[test]
    fn symbol_skills_are_normalized() {
        let requirement = extract("C++ / C# developer", "Experience with .NET and Node.js");
        for expected in ["c++", "c#", ".net", "node.js"] {
            assert!(
                requirement.skills.contains(&expected.to_string()),
                "missing {expected} in {:?}",
                requirement.skills
            );
        }
        assert!(!requirement.skills.contains(&"java".to_string()));
    }

    #[test]
    fn collects_sections_timing_salary_and_education() {
        let description = "\
We are hiring for a 6 months mission starting March 2025.

Responsibilities:
- Build REST APIs
- Review code

Requirements:
- Master's degree in Computer Science
* Django experience

What we offer:
• Salary: $120k - $150k per year
• Remote fridays";

        let requirement = extract("Python Developer", description);
        assert_eq!(requirement.responsibilities, vec!["Build REST APIs", "Review code"]);
        assert_eq!(
            requirement.requirements,
            vec![
                "Master's degree in Computer Science",
                "Django experience",
                "Duration: 6 months",
                "Date: March 2025",
            ]
        );
        assert_eq!(requirement.benefits, vec!["Salary: $120k - $150k per year", "Remote fridays"]);
        assert_eq!(requirement.salary.as_deref(), Some("$120k - $150k"));
        assert_eq!(
            requirement.education.as_deref(),
            Some("Master's degree in Computer Science")
        );
    }

    #[test]
    fn role_falls_back_to_first_description_line() {
        let requirement = extract("  ", "\n- Frontend Developer (React)\nJoin us.");
        assert_eq!(requirement.role, "Frontend Developer (React)");
        assert!(requirement.skills.contains(&"react".to_string()));
    }

    #[test]
    fn extraction_is_repeatable() {
        let text = "Lead DevOps, Kubernetes, Terraform, AWS, CDI, 4-6 years";
        assert_eq!(extract(text, text), extract(text, text));
    }
}
