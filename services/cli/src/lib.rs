mod cli;
mod infra;
mod report;

use cv_ranker::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
