use anyhow::Result;
use authgate::cli::{self, telemetry};

// Main function
#[tokio::main]
async fn main() -> Result<()> {
    // Start the program
    let action = cli::start()?;

    // Handle the action
    let result = action.execute().await;

    telemetry::shutdown_tracer();

    result
}
