use legends::app::App;
use legends::chat::ChatSession;
use legends::settings::SettingsStore;
use legends_llm::create_gateway;
use snafu::{ResultExt, Whatever};
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

#[snafu::report]
#[tokio::main]
async fn main() -> Result<(), Whatever> {
    // stdout carries the conversation.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let settings_store = SettingsStore::load();
    let settings = settings_store.settings();
    if !settings.is_valid() {
        tracing::warn!(
            config_path = ?settings_store.config_path(),
            "no API key configured; questions fail until API_KEY is set or one is saved with /key"
        );
    }

    let gateway = create_gateway(settings.to_provider_config())
        .whatever_context("failed to set up the model gateway")?;
    tracing::info!(provider = gateway.id(), model = gateway.model(), "gateway ready");

    let mut app = App::with_settings(ChatSession::new(gateway), settings_store);
    let mut stdout = tokio::io::stdout();
    app.run(BufReader::new(tokio::io::stdin()), &mut stdout)
        .await
        .whatever_context("terminal session failed")?;

    Ok(())
}
