use std::sync::Arc;

mod gemini;
mod persona;
mod provider;
mod wire;

pub use gemini::{
    DEFAULT_GEMINI_ENDPOINT, DEFAULT_GEMINI_MODEL, GEMINI_PROVIDER_ID, GeminiGateway,
};
pub use persona::SYSTEM_INSTRUCTION;
pub use provider::{
    Attachment, BoxFuture, GENERATION_FAILED_MESSAGE, GenerationOutput, MISSING_API_KEY_MESSAGE,
    ProviderConfig, ProviderError, QueryError, QueryGateway, QueryRequest, QueryResult, Source,
};

/// Error raised while selecting a gateway implementation.
#[derive(Debug, snafu::Snafu)]
pub enum GatewaySetupError {
    #[snafu(display("provider '{provider_id}' is not supported"))]
    UnsupportedProvider {
        stage: &'static str,
        provider_id: String,
    },
}

pub fn create_gateway(
    mut config: ProviderConfig,
) -> Result<Arc<dyn QueryGateway>, GatewaySetupError> {
    if config.provider_id.is_empty() {
        config.provider_id = GEMINI_PROVIDER_ID.to_string();
    }

    match config.provider_id.as_str() {
        "gemini" | "google" => {
            config.provider_id = GEMINI_PROVIDER_ID.to_string();
            Ok(Arc::new(GeminiGateway::new(config)))
        }
        _ => Err(GatewaySetupError::UnsupportedProvider {
            stage: "create-gateway",
            provider_id: config.provider_id,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_provider_defaults_to_gemini() {
        let gateway = create_gateway(ProviderConfig::new("", "key", "", ""))
            .expect("gemini is supported");
        assert_eq!(gateway.id(), GEMINI_PROVIDER_ID);
        assert_eq!(gateway.model(), DEFAULT_GEMINI_MODEL);
        assert!(gateway.has_credential());
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let result = create_gateway(ProviderConfig::new("openai", "key", "", ""));
        assert!(matches!(
            result,
            Err(GatewaySetupError::UnsupportedProvider { provider_id, .. }) if provider_id == "openai"
        ));
    }
}
