use regex::Regex;
use std::sync::OnceLock;

use super::matching::{coverage_ratio, loosely_related, match_skills, normalize_skill};
use crate::config::ScoringConfig;
use crate::ranking::candidate::{CandidateProfile, Experience};
use crate::ranking::requirement::JobRequirement;
use crate::ranking::vocabulary::{
    company_tier, contains_term, INSTITUTION_KEYWORDS, JUNIOR_ROLE_KEYWORDS, ONGOING_MARKERS,
    PLACEHOLDER_PROJECT_KEYWORDS, RECOGNIZED_CERTIFICATIONS, SENIOR_ROLE_KEYWORDS,
};

/// Unclamped rubric output; the engine rounds and clamps it to the category cap.
pub(crate) struct Assessment {
    pub value: f64,
    pub notes: String,
}

pub(crate) struct ExperienceAssessment {
    pub assessment: Assessment,
    pub best_company: Option<String>,
}

pub(crate) struct SkillsAssessment {
    pub assessment: Assessment,
    pub matched_required: usize,
}

const MONTH_NAMES: &[(&str, u32)] = &[
    ("january", 1), ("february", 2), ("march", 3), ("april", 4), ("may", 5), ("june", 6),
    ("july", 7), ("august", 8), ("september", 9), ("october", 10), ("november", 11),
    ("december", 12), ("janvier", 1), ("fevrier", 2), ("février", 2), ("mars", 3),
    ("avril", 4), ("mai", 5), ("juin", 6), ("juillet", 7), ("aout", 8), ("août", 8),
    ("septembre", 9), ("octobre", 10), ("novembre", 11), ("decembre", 12), ("décembre", 12),
];

fn year_regex() -> &'static Regex {
    static YEAR: OnceLock<Regex> = OnceLock::new();
    YEAR.get_or_init(|| Regex::new(r"\b(20\d{2})\b").expect("year pattern is valid"))
}

fn duration_regex() -> &'static Regex {
    static DURATION: OnceLock<Regex> = OnceLock::new();
    DURATION.get_or_init(|| {
        Regex::new(r"(\d+)\s*(mois|months?|years?|ans?)\b").expect("duration pattern is valid")
    })
}

fn is_ongoing(period: &str) -> bool {
    let lowered = period.to_lowercase();
    ONGOING_MARKERS.iter().any(|marker| lowered.contains(marker))
}

fn years_in(period: &str) -> Vec<i32> {
    year_regex()
        .captures_iter(period)
        .filter_map(|caps| caps[1].parse().ok())
        .collect()
}

/// Tenure in months from an explicit duration, else from the period text.
///
/// Unclear periods count as two months so a missing end date never inflates experience.
pub(crate) fn duration_months(experience: &Experience, reference_year: i32) -> f64 {
    if let Some(duration) = experience.duration.as_deref() {
        if let Some(caps) = duration_regex().captures(&duration.to_lowercase()) {
            let amount: f64 = caps[1].parse().unwrap_or(0.0);
            return if caps[2].starts_with('y') || caps[2].starts_with('a') {
                amount * 12.0
            } else {
                amount
            };
        }
    }

    let period = experience.period.trim();
    if period.is_empty() {
        return 0.0;
    }

    let years = years_in(period);
    if is_ongoing(period) {
        return match years.first() {
            Some(start) if *start <= reference_year => {
                (f64::from(reference_year - start) * 12.0).max(2.0)
            }
            _ => 2.0,
        };
    }

    let lowered = period.to_lowercase();
    let mut months: Vec<(usize, u32)> = MONTH_NAMES
        .iter()
        .filter_map(|(name, number)| lowered.find(name).map(|at| (at, *number)))
        .collect();
    months.sort_unstable();
    months.dedup_by_key(|(at, _)| *at);
    let month_delta = if months.len() >= 2 {
        i64::from(months[1].1) - i64::from(months[0].1)
    } else {
        0
    };

    if years.len() >= 2 {
        let span = i64::from(years[1] - years[0]) * 12 + month_delta;
        return span.max(0) as f64;
    }
    if months.len() >= 2 {
        return month_delta.unsigned_abs() as f64;
    }

    2.0
}

fn duration_band(months: f64) -> f64 {
    if months < 3.0 {
        2.0
    } else if months <= 6.0 {
        5.0
    } else if months <= 12.0 {
        7.0
    } else if months <= 24.0 {
        9.0
    } else {
        10.0
    }
}

fn recency_bonus(period: &str, reference_year: i32) -> f64 {
    if period.trim().is_empty() {
        return 0.0;
    }
    if is_ongoing(period) {
        return 2.0;
    }
    match years_in(period).last() {
        Some(end) => {
            let years_ago = reference_year - end;
            if years_ago <= 1 {
                1.5
            } else if years_ago <= 2 {
                1.0
            } else if years_ago >= 5 {
                -1.0
            } else {
                0.0
            }
        }
        None => 0.0,
    }
}

fn keywords(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| word.chars().count() > 3)
        .map(str::to_string)
        .collect()
}

fn role_relevance(experience: &Experience, requirement: &JobRequirement) -> f64 {
    if !requirement.skills.is_empty() && !experience.technologies.is_empty() {
        let (matched, total) = match_skills(&experience.technologies, &requirement.skills);
        return if matched > 0 {
            10.0 * matched as f64 / total as f64
        } else {
            0.0
        };
    }

    let role_words: Vec<String> = requirement
        .role
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect();
    if role_words.is_empty() {
        return 5.0;
    }

    let held = experience.role.to_lowercase();
    let hits = role_words
        .iter()
        .filter(|word| word.chars().count() > 3 && held.contains(word.as_str()))
        .count();
    10.0 * hits as f64 / role_words.len() as f64
}

/// Experience quality, out of 35: reputation, relevance and tenure per job, then blended.
pub(crate) fn experience_quality(
    profile: &CandidateProfile,
    requirement: &JobRequirement,
    config: &ScoringConfig,
) -> ExperienceAssessment {
    if profile.experience.is_empty() {
        return ExperienceAssessment {
            assessment: Assessment {
                value: 0.0,
                notes: "no experience listed".to_string(),
            },
            best_company: None,
        };
    }

    let mut per_job: Vec<(f64, &str)> = Vec::with_capacity(profile.experience.len());
    let mut total_months = 0.0;
    for experience in &profile.experience {
        let (_, multiplier) = company_tier(&experience.company);
        let company_score = 15.0 * multiplier;
        let relevance = role_relevance(experience, requirement);
        let months = duration_months(experience, config.reference_year);
        total_months += months;
        let tenure = (duration_band(months) + recency_bonus(&experience.period, config.reference_year))
            .min(10.0);
        per_job.push((company_score + relevance + tenure, experience.company.as_str()));
    }

    // Stable sort keeps document order among equal jobs, so the highlighted company is fixed.
    per_job.sort_by(|a, b| b.0.total_cmp(&a.0));
    let best = per_job[0];
    let mut value = if per_job.len() == 1 {
        best.0
    } else {
        let others = &per_job[1..];
        let others_mean = others.iter().map(|(score, _)| score).sum::<f64>() / others.len() as f64;
        let extra = (per_job.len() - 1).min(3) as f64;
        best.0 * 0.5 + others_mean * 0.5 + extra * 1.5
    };

    let mut notes = format!("{} experience(s), best at '{}'", per_job.len(), best.1);
    if let Some(minimum) = requirement.minimum_years() {
        let held_years = total_months / 12.0;
        if minimum > 0 && held_years < f64::from(minimum) {
            let shortfall = 5.0 * (1.0 - held_years / f64::from(minimum));
            value -= shortfall;
            notes.push_str(&format!(
                "; {held_years:.1} of {minimum} required years (-{shortfall:.2})"
            ));
        }
    }

    ExperienceAssessment {
        assessment: Assessment { value, notes },
        best_company: Some(best.1.to_string()).filter(|company| !company.trim().is_empty()),
    }
}

/// Technical skills, out of 25: required-skill coverage plus depth.
pub(crate) fn technical_skills(
    profile: &CandidateProfile,
    requirement: &JobRequirement,
) -> SkillsAssessment {
    let listed = profile.skills.all();
    if listed.is_empty() {
        return SkillsAssessment {
            assessment: Assessment {
                value: 0.0,
                notes: "no skills listed".to_string(),
            },
            matched_required: 0,
        };
    }

    let mut matched_required = 0;
    let (mut value, mut notes) = if requirement.skills.is_empty() {
        let base = (listed.len() as f64 * 0.5).min(10.0);
        (base, format!("{} skills listed, no required skills", listed.len()))
    } else {
        let (matched, total) = match_skills(&listed, &requirement.skills);
        matched_required = matched;
        (
            15.0 * matched as f64 / total as f64,
            format!("{matched}/{total} required skills"),
        )
    };

    let experience_tech = profile.experience_technologies();
    let mut depth = if experience_tech.is_empty() {
        0.0
    } else {
        5.0 * coverage_ratio(&listed, &experience_tech)
    };
    if profile.skills.has_languages() && profile.skills.has_frameworks() {
        depth += 2.0;
    }
    let depth = depth.min(5.0);
    value += depth;
    notes.push_str(&format!("; depth {depth:.2}"));

    SkillsAssessment {
        assessment: Assessment { value, notes },
        matched_required,
    }
}

/// Projects and impact, out of 20. No projects is a low score, not zero.
pub(crate) fn projects_impact(profile: &CandidateProfile, requirement: &JobRequirement) -> Assessment {
    if profile.projects.is_empty() {
        return Assessment {
            value: 5.0,
            notes: "no projects listed".to_string(),
        };
    }

    let experience_tech = profile.experience_technologies();
    let mut value = 0.0;
    let mut quality = 0usize;
    let mut relevant = 0usize;
    let mut relevance_bonus: f64 = 0.0;

    for project in &profile.projects {
        let title = project.title.to_lowercase();
        let description = project.description.to_lowercase();
        if PLACEHOLDER_PROJECT_KEYWORDS
            .iter()
            .any(|keyword| title.contains(keyword) || description.contains(keyword))
        {
            value -= 2.0;
            continue;
        }

        if project.description.chars().count() > 50 {
            quality += 1;
        }
        if project.technologies.len() >= 3 {
            quality += 1;
        }

        if !requirement.skills.is_empty() && !project.technologies.is_empty() {
            let (matched, _) = match_skills(&project.technologies, &requirement.skills);
            if matched > 0 {
                relevant += 1;
                quality += 1;
                relevance_bonus += match matched {
                    1 => 1.0,
                    2 => 1.5,
                    _ => 2.5,
                };
            }
        }

        if project
            .technologies
            .iter()
            .any(|tech| experience_tech.iter().any(|used| loosely_related(tech, used)))
        {
            quality += 1;
        }
    }

    let count = profile.projects.len();
    let base = if count >= 3 && quality >= count * 2 {
        15.0
    } else if count >= 3 && quality >= count {
        13.0
    } else if count <= 2 && quality >= count * 2 {
        12.0
    } else if count <= 2 && quality >= count {
        10.0
    } else if count > 5 {
        8.0
    } else {
        6.0
    };
    value += base + relevance_bonus.min(5.0);

    if !requirement.skills.is_empty() {
        if relevant == 0 {
            value -= 6.0;
        } else if (relevant as f64) < count as f64 / 2.0 {
            value -= 3.0;
        }
    }

    Assessment {
        value,
        notes: format!("{count} project(s), {quality} quality indicator(s), {relevant} relevant"),
    }
}

/// Education and certifications, out of 10.
pub(crate) fn education_certifications(
    profile: &CandidateProfile,
    requirement: &JobRequirement,
) -> Assessment {
    let field_words = keywords(requirement.education.as_deref().unwrap_or(&requirement.role));

    let mut degree_score: f64 = 0.0;
    if !profile.education.is_empty() {
        if profile.education.iter().any(|entry| {
            let field = entry.field.to_lowercase();
            field_words.iter().any(|word| field.contains(word.as_str()))
        }) {
            degree_score += 3.0;
        }

        let highest = profile
            .education
            .iter()
            .rev()
            .find(|entry| !entry.degree.trim().is_empty())
            .unwrap_or(&profile.education[0]);
        let degree = highest.degree.to_lowercase();
        degree_score += if degree.contains("master") || degree.contains("phd") || degree.contains("doctor") {
            2.0
        } else if degree.contains("bachelor") || degree.contains("licence") {
            1.5
        } else {
            1.0
        };
    }
    let degree_score = degree_score.min(5.0);

    let institution_score = if profile.education.iter().any(|entry| {
        let institution = entry.institution.to_lowercase();
        INSTITUTION_KEYWORDS
            .iter()
            .any(|keyword| institution.contains(keyword))
    }) {
        1.5
    } else {
        0.0
    };

    let recognized = profile
        .certifications
        .iter()
        .filter(|cert| {
            let lowered = cert.to_lowercase();
            RECOGNIZED_CERTIFICATIONS
                .iter()
                .any(|known| lowered.contains(known))
        })
        .count();
    let cert_score = (recognized as f64 * 0.5).min(2.0);

    Assessment {
        value: degree_score + institution_score + cert_score,
        notes: format!(
            "degree {degree_score:.2}, institution {institution_score:.2}, {recognized} recognized certification(s)"
        ),
    }
}

/// Signal and consistency, out of 10: starts full and loses points for incoherence.
pub(crate) fn signal_consistency(profile: &CandidateProfile) -> Assessment {
    let mut value = 10.0;
    let mut flags: Vec<&str> = Vec::new();

    let listed = profile.skills.all();
    let experience_tech = profile.experience_technologies();
    let project_tech = profile.project_technologies();

    let mut coherence_issues = 0u32;
    if !experience_tech.is_empty() && !listed.is_empty() {
        let ratio = coverage_ratio(&listed, &experience_tech);
        if ratio < 0.3 {
            coherence_issues += 2;
        } else if ratio < 0.5 {
            coherence_issues += 1;
        }
    }
    if !project_tech.is_empty() && !listed.is_empty() && coverage_ratio(&project_tech, &listed) < 0.3 {
        coherence_issues += 1;
    }
    value -= f64::from(coherence_issues).min(5.0);

    let roles = profile
        .experience
        .iter()
        .map(|experience| experience.role.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ");
    let has_junior = JUNIOR_ROLE_KEYWORDS.iter().any(|kw| contains_term(&roles, kw));
    let has_senior = SENIOR_ROLE_KEYWORDS.iter().any(|kw| contains_term(&roles, kw));
    if has_junior && has_senior {
        value += 0.75;
    } else if has_junior && profile.experience.len() > 3 {
        value -= 0.75;
        flags.push("junior roles only across several positions");
    }

    let mut red_flags = 0.0;
    if listed.len() > 10 && profile.experience.is_empty() {
        red_flags += 1.0;
        flags.push("many skills listed without experience");
    }
    let mut distinct: Vec<String> = experience_tech.iter().map(|t| normalize_skill(t)).collect();
    distinct.sort_unstable();
    distinct.dedup();
    if distinct.len() > 15 && profile.experience.len() < 3 {
        red_flags += 1.0;
        flags.push("unusually diverse stack for experience level");
    }
    if profile
        .personal_info
        .email
        .as_deref()
        .map_or(true, |email| email.trim().is_empty())
    {
        red_flags += 0.5;
        flags.push("missing contact information");
    }
    value -= (red_flags * 0.5_f64).min(2.0);

    let notes = if flags.is_empty() {
        format!("{coherence_issues} coherence issue(s)")
    } else {
        format!("{coherence_issues} coherence issue(s); {}", flags.join(", "))
    };

    Assessment {
        value: value.max(0.0),
        notes,
    }
}
