use anyhow::Context;
use freshfolds::configuration::get_configuration;
use freshfolds::startup::{Application, Collaborators};
use freshfolds::telemetry::{get_subscriber, init_subscriber};

#[rocket::main]
async fn main() -> Result<(), anyhow::Error> {
    let subscriber = get_subscriber("freshfolds".into(), "info".into(), std::io::stdout);
    init_subscriber(subscriber)?;

    let configuration = get_configuration().context("Failed to read configuration.")?;
    let collaborators = Collaborators::from_settings(&configuration).await?;
    let application = Application::build(&configuration, collaborators).await?;
    let _ = application.server.launch().await?;
    Ok(())
}
