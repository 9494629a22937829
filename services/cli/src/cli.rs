use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use cv_ranker::config::AppConfig;
use cv_ranker::error::AppError;
use cv_ranker::ranking::{
    CompletionClient, CvSource, FairnessAuditor, InputError, OllamaClient, RankAggregator,
    RankingSession, RequirementExtractor, ScoringEngine,
};
use cv_ranker::telemetry;
use tracing::info;

use crate::infra::FileCvSource;
use crate::report::{self, OutputFormat};

#[derive(Parser, Debug)]
#[command(
    name = "cv-ranker",
    about = "Rank candidate CVs against a job posting and optionally audit the result",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Score and rank CV files against a job posting
    Rank(RankArgs),
    /// Print the structured requirement extracted from a job posting
    Extract(PostingArgs),
}

#[derive(Args, Debug)]
pub(crate) struct PostingArgs {
    /// Job title
    #[arg(long, default_value = "")]
    pub(crate) title: String,
    /// Job description text
    #[arg(long, default_value = "")]
    pub(crate) description: String,
    /// Skip the completion service and use deterministic extraction only
    #[arg(long)]
    pub(crate) no_enrich: bool,
}

#[derive(Args, Debug)]
pub(crate) struct RankArgs {
    #[command(flatten)]
    pub(crate) posting: PostingArgs,
    /// CV JSON file; repeat for several candidates
    #[arg(long = "cv", required_unless_present = "cv_dir", conflicts_with = "cv_dir")]
    pub(crate) cvs: Vec<PathBuf>,
    /// Directory whose *.json files are CVs
    #[arg(long)]
    pub(crate) cv_dir: Option<PathBuf>,
    /// Extra required skills, comma separated
    #[arg(long, value_delimiter = ',')]
    pub(crate) skills: Vec<String>,
    /// Keep only the top N candidates
    #[arg(long)]
    pub(crate) limit: Option<usize>,
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub(crate) format: OutputFormat,
    /// Ask the completion service to audit the final ranking
    #[arg(long)]
    pub(crate) audit: bool,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    info!(environment = ?config.environment, "configuration loaded");

    match cli.command {
        Command::Rank(args) => run_rank(&config, args).await,
        Command::Extract(args) => run_extract(&config, args).await,
    }
}

fn completion_client(config: &AppConfig) -> Arc<dyn CompletionClient> {
    Arc::new(OllamaClient::from_config(&config.completion))
}

fn extractor(config: &AppConfig, posting: &PostingArgs) -> RequirementExtractor {
    let extractor = RequirementExtractor::new(config.completion.clone());
    if posting.no_enrich {
        extractor
    } else {
        extractor.with_enrichment(completion_client(config))
    }
}

async fn run_extract(config: &AppConfig, args: PostingArgs) -> Result<(), AppError> {
    let extraction = extractor(config, &args)
        .extract(&args.title, &args.description)
        .await?;
    println!("{}", serde_json::to_string_pretty(&extraction)?);
    Ok(())
}

async fn run_rank(config: &AppConfig, args: RankArgs) -> Result<(), AppError> {
    let mut extraction = extractor(config, &args.posting)
        .extract(&args.posting.title, &args.posting.description)
        .await?;
    extraction.requirement.add_skills(args.skills.iter());

    let source = match &args.cv_dir {
        Some(dir) => FileCvSource::from_dir(dir)?,
        None => FileCvSource::from_files(&args.cvs),
    };
    let loaded = source.load_all()?;
    info!(
        candidates = loaded.records.len(),
        skipped = loaded.skipped.len(),
        "loaded candidate records"
    );
    if loaded.records.is_empty() {
        return Err(InputError::EmptyBatch.into());
    }

    let engine = ScoringEngine::new(config.scoring);
    let mut session = RankingSession::new(extraction);
    session.score(&engine, &RankAggregator::new(), &loaded.records, args.limit)?;

    if args.audit {
        let auditor = FairnessAuditor::new(completion_client(config), config.completion.clone());
        session.audit(&auditor).await?;
    }

    let rendered = report::render(&session, &loaded.skipped, args.format, chrono::Utc::now())?;
    print!("{rendered}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_accepts_repeated_cv_files_and_skill_list() {
        let cli = Cli::try_parse_from([
            "cv-ranker", "rank", "--title", "Backend Engineer", "--cv", "a.json", "--cv", "b.json",
            "--skills", "python,django", "--limit", "5", "--format", "csv", "--no-enrich",
        ])
        .expect("valid arguments");

        match cli.command {
            Command::Rank(args) => {
                assert_eq!(args.cvs.len(), 2);
                assert_eq!(args.skills, vec!["python", "django"]);
                assert_eq!(args.limit, Some(5));
                assert_eq!(args.format, OutputFormat::Csv);
                assert!(args.posting.no_enrich);
                assert!(!args.audit);
            }
            other => panic!("expected rank command, got {other:?}"),
        }
    }

    #[test]
    fn rank_requires_a_cv_source() {
        assert!(Cli::try_parse_from(["cv-ranker", "rank", "--title", "Dev"]).is_err());
        assert!(Cli::try_parse_from([
            "cv-ranker", "rank", "--title", "Dev", "--cv", "a.json", "--cv-dir", "cvs",
        ])
        .is_err());
    }
}
