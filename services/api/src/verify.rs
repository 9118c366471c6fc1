use crate::infra::{build_runner, override_snapshot};
use bar_verify::config::AppConfig;
use bar_verify::error::AppError;
use bar_verify::telemetry;
use bar_verify::workflows::verification::{
    ingest, ApiCredential, ColumnMapping, JobError, JobId, JobRunner, JobState, JobStore,
    JobSubmission, Jurisdiction, ResultRow, RESULT_COLUMNS,
};
use clap::Args;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

const POLL_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Args, Debug)]
pub(crate) struct VerifyArgs {
    /// Directory to verify against: georgia or california
    #[arg(long)]
    pub(crate) state: Jurisdiction,
    /// Input CSV with first name, last name, and admit date columns
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Results CSV path (defaults to stdout; logs then go to stderr)
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
    /// Gemini API key used for name cleaning
    #[arg(long, env = "GEMINI_API_KEY", default_value = "", hide_env_values = true)]
    pub(crate) api_key: String,
    /// Directory snapshot JSON (overrides DIRECTORY_SNAPSHOT_PATH)
    #[arg(long)]
    pub(crate) snapshot: Option<PathBuf>,
    /// Header of the first name column
    #[arg(long, default_value = ingest::FIRST_NAME_KEY)]
    pub(crate) first_name_column: String,
    /// Header of the last name column
    #[arg(long, default_value = ingest::LAST_NAME_KEY)]
    pub(crate) last_name_column: String,
    /// Header of the admit date column
    #[arg(long, default_value = ingest::ADMIT_DATE_KEY)]
    pub(crate) admit_date_column: String,
}

impl VerifyArgs {
    fn mapping(&self) -> ColumnMapping {
        ColumnMapping {
            first_name: self.first_name_column.clone(),
            last_name: self.last_name_column.clone(),
            admit_date: self.admit_date_column.clone(),
        }
    }
}

pub(crate) async fn run(mut args: VerifyArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;
    override_snapshot(&mut config, args.snapshot.take());
    telemetry::init(&config.telemetry)?;

    let records = ingest::parse_path(&args.input, &args.mapping())?;
    info!(input = %args.input.display(), records = records.len(), "loaded verification input");

    let runner = build_runner(&config)?;
    let handle = runner.submit(JobSubmission {
        jurisdiction: args.state,
        records,
        credential: ApiCredential::new(args.api_key.as_str()),
    })?;
    let id = handle.id();

    let rows = match args.output.as_ref() {
        Some(_) => follow(&runner, &id, std::io::stdout()).await?,
        None => follow(&runner, &id, std::io::stderr()).await?,
    };
    handle.wait().await?;

    match args.output {
        Some(path) => {
            write_results(std::fs::File::create(&path)?, &rows)?;
            info!(output = %path.display(), rows = rows.len(), "results written");
        }
        None => write_results(std::io::stdout(), &rows)?,
    }
    Ok(())
}

/// Echoes new job log lines until the job is terminal; Ctrl-C requests a stop.
async fn follow<S, W>(runner: &JobRunner<S>, id: &JobId, mut log: W) -> Result<Vec<ResultRow>, AppError>
where
    S: JobStore + 'static,
    W: Write,
{
    let mut printed = 0;
    let mut stop_requested = false;
    let mut ticker = tokio::time::interval(POLL_INTERVAL);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            signal = tokio::signal::ctrl_c(), if !stop_requested => {
                signal?;
                stop_requested = runner.cancel(id)?;
            }
        }

        let view = runner.poll(id)?;
        for line in &view.logs[printed..] {
            writeln!(log, "{line}")?;
        }
        printed = view.logs.len();

        if view.state == JobState::Failed.label() {
            let message = view.error.unwrap_or_else(|| "verification failed".to_string());
            return Err(JobError::Task(message).into());
        }
        if view.state == JobState::Finished.label() {
            if let Some(summary) = view.summary {
                info!(
                    total = summary.total,
                    matched = summary.matched,
                    not_found = summary.not_found,
                    unverified = summary.unverified,
                    errors = summary.errors,
                    "verification finished"
                );
            }
            return Ok(view.results.unwrap_or_default());
        }
    }
}

pub(crate) fn write_results<W: Write>(writer: W, rows: &[ResultRow]) -> Result<(), AppError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    writer.write_record(RESULT_COLUMNS)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
