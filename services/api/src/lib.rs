mod cli;
mod infra;
mod routes;
mod server;
mod verify;

use bar_verify::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
