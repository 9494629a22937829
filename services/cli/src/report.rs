use chrono::{DateTime, Utc};
use clap::ValueEnum;
use cv_ranker::error::AppError;
use cv_ranker::ranking::{
    Adjustment, AuditOutcome, AuditReport, EnrichmentStatus, IssueKind, JobRequirement,
    Provenance, RankedResult, RankingSession, ScoreCategory, Severity, SkippedRecord,
};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
    Csv,
}

pub(crate) fn render(
    session: &RankingSession,
    skipped: &[SkippedRecord],
    format: OutputFormat,
    generated_at: DateTime<Utc>,
) -> Result<String, AppError> {
    match format {
        OutputFormat::Text => Ok(render_text(session, skipped, generated_at)),
        OutputFormat::Json => render_json(session, skipped, generated_at),
        OutputFormat::Csv => render_csv(session),
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonReport<'a> {
    generated_at: DateTime<Utc>,
    state: String,
    requirement: &'a JobRequirement,
    used_enrichment: bool,
    enrichment: &'a EnrichmentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    ranking: Option<&'a RankedResult>,
    audits: &'a [AuditOutcome],
    skipped_records: &'a [SkippedRecord],
}

fn render_json(
    session: &RankingSession,
    skipped: &[SkippedRecord],
    generated_at: DateTime<Utc>,
) -> Result<String, AppError> {
    let extraction = session.extraction();
    let report = JsonReport {
        generated_at,
        state: session.state().to_string(),
        requirement: &extraction.requirement,
        used_enrichment: extraction.used_enrichment,
        enrichment: &extraction.enrichment,
        ranking: session.ranking(),
        audits: session.audits(),
        skipped_records: skipped,
    };
    let mut rendered = serde_json::to_string_pretty(&report)?;
    rendered.push('\n');
    Ok(rendered)
}

fn render_csv(session: &RankingSession) -> Result<String, AppError> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header = vec!["rank", "candidate_id", "name", "total"];
    header.extend(ScoreCategory::ordered().into_iter().map(ScoreCategory::key));
    header.extend(["provenance", "explanation"]);
    writer.write_record(&header).map_err(std::io::Error::from)?;

    for entry in session.ranking().into_iter().flat_map(RankedResult::iter) {
        let mut row = vec![
            entry.rank.to_string(),
            entry.score.candidate_id.clone(),
            entry.score.name.clone(),
            entry.score.total().to_string(),
        ];
        row.extend(
            ScoreCategory::ordered()
                .into_iter()
                .map(|category| entry.score.scores().get(category).to_string()),
        );
        row.push(provenance_label(&entry.provenance).to_string());
        row.push(entry.score.explanation.clone());
        writer.write_record(&row).map_err(std::io::Error::from)?;
    }

    let bytes = writer.into_inner().map_err(|err| err.into_error())?;
    String::from_utf8(bytes)
        .map_err(|err| AppError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, err)))
}

fn render_text(
    session: &RankingSession,
    skipped: &[SkippedRecord],
    generated_at: DateTime<Utc>,
) -> String {
    let extraction = session.extraction();
    let requirement = &extraction.requirement;
    let mut lines = vec![
        format!("Ranking for: {}", requirement.role),
        format!("Generated: {}", generated_at.format("%Y-%m-%d %H:%M UTC")),
        format!(
            "Required skills: {}",
            if requirement.skills.is_empty() {
                "none".to_string()
            } else {
                requirement.skills.join(", ")
            }
        ),
    ];
    if let Some(experience) = &requirement.experience {
        lines.push(format!("Experience: {experience}"));
    }
    lines.push(format!("Requirement source: {}", enrichment_label(&extraction.enrichment)));

    let Some(ranking) = session.ranking() else {
        lines.push(String::new());
        lines.push("No ranking yet.".to_string());
        return finish(lines);
    };

    lines.push(format!(
        "Candidates: {} ranked of {} considered",
        ranking.len(),
        ranking.considered()
    ));
    for entry in ranking.iter() {
        lines.push(String::new());
        lines.push(format!(
            "#{} {}  {}/100",
            entry.rank,
            entry.score.name,
            entry.score.total()
        ));
        for category in ScoreCategory::ordered() {
            lines.push(format!(
                "   {:<28} {:>6} / {}",
                category.label(),
                entry.score.scores().get(category).to_string(),
                category.cap().as_f64()
            ));
        }
        if !entry.score.explanation.is_empty() {
            lines.push(format!("   {}", entry.score.explanation));
        }
    }

    if !ranking.omissions().is_empty() {
        lines.push(String::new());
        lines.push(format!("Skipped records: {}", ranking.omissions().len()));
    }
    if !skipped.is_empty() {
        lines.push(String::new());
        lines.push(format!("Unreadable CV files skipped: {}", skipped.len()));
        for record in skipped {
            lines.push(format!("- {}: {}", record.id, record.reason));
        }
    }

    if let Some(outcome) = session.audits().last() {
        lines.push(String::new());
        match outcome {
            AuditOutcome::Report(report) => audit_lines(report, &mut lines),
            AuditOutcome::Unparsed { reason, .. } => {
                lines.push(format!("Audit reply could not be validated: {reason}"))
            }
            AuditOutcome::Failed(reason) => lines.push(format!("Audit unavailable: {reason}")),
        }
    }

    finish(lines)
}

fn audit_lines(report: &AuditReport, lines: &mut Vec<String>) {
    lines.push(format!(
        "Audit: correct {} | fair {} | square {} (confidence {:.2})",
        yes_no(report.is_correct),
        yes_no(report.is_fair),
        yes_no(report.is_square),
        report.confidence
    ));
    for issue in &report.issues {
        let mut line = format!(
            "- [{}] {}: {}",
            severity_label(issue.severity),
            issue_label(issue.kind),
            issue.description
        );
        if !issue.affected_candidates.is_empty() {
            line.push_str(&format!(" ({})", issue.affected_candidates.join(", ")));
        }
        lines.push(line);
    }
    for adjustment in &report.adjustments {
        let changes: Vec<String> = ScoreCategory::ordered()
            .into_iter()
            .filter_map(|category| match adjustment.get(category) {
                Adjustment::NoChange => None,
                Adjustment::Set {
                    value,
                    clamped_from: Some(proposed),
                } => Some(format!("{} -> {value} (proposed {proposed})", category.key())),
                Adjustment::Set { value, .. } => Some(format!("{} -> {value}", category.key())),
            })
            .collect();
        if !changes.is_empty() {
            lines.push(format!("  suggest {}: {}", adjustment.candidate, changes.join(", ")));
        }
    }
    if !report.overall_assessment.is_empty() {
        lines.push(format!("Assessment: {}", report.overall_assessment));
    }
}

fn finish(mut lines: Vec<String>) -> String {
    lines.push(String::new());
    lines.join("\n")
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::High => "high",
        Severity::Medium => "medium",
        Severity::Low => "low",
    }
}

fn issue_label(kind: IssueKind) -> &'static str {
    match kind {
        IssueKind::Bias => "bias",
        IssueKind::Inconsistency => "inconsistency",
        IssueKind::MissingFactor => "missing factor",
        IssueKind::Weighting => "weighting",
    }
}

fn enrichment_label(status: &EnrichmentStatus) -> String {
    match status {
        EnrichmentStatus::Enriched => "deterministic + enrichment".to_string(),
        EnrichmentStatus::Skipped => "deterministic".to_string(),
        EnrichmentStatus::Unavailable(reason) => format!("deterministic ({reason})"),
    }
}

fn provenance_label(provenance: &Provenance) -> &str {
    match provenance {
        Provenance::Engine => "engine",
        Provenance::Legacy => "legacy",
        Provenance::Imported(source) => source,
    }
}
