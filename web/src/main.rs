use anyhow::Context;
use newsletter::configuration::{get_configuration, Settings};
use newsletter::startup::Application;
use telemetry::{get_subscriber, init_subscriber, init_tracer, shutdown_tracer};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let configuration = get_configuration().context("Failed to read configuration")?;

    let tracer = init_tracer(&configuration.telemetry)?;
    let subscriber = get_subscriber(
        configuration.telemetry.dataset_name.clone(),
        "info".into(),
        std::io::stdout,
        &configuration.telemetry,
        &tracer,
    );
    init_subscriber(subscriber);

    let outcome = serve(configuration).await;

    // Also on startup failure, so buffered spans are exported before exit.
    shutdown_tracer(tracer).await;

    outcome
}

async fn serve(configuration: Settings) -> anyhow::Result<()> {
    let application = match Application::build(configuration).await {
        Ok(application) => application,
        Err(e) => {
            tracing::error!(error = ?e, "Failed to start the application");
            return Err(e);
        }
    };
    tracing::info!(port = application.port(), "Listening for requests");

    application.run_until_stopped().await?;

    Ok(())
}
