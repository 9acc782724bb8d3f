use anyhow::Result;
use semaforo::cli::{actions, actions::Action, start, telemetry};

#[tokio::main]
async fn main() -> Result<()> {
    let action = start()?;

    match action {
        Action::Server(args) => actions::server::execute(args).await?,
    }

    telemetry::shutdown_tracer();

    Ok(())
}
