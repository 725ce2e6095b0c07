// Infrastructure layer modules
pub mod anthropic;
pub mod app_config;
pub mod logging;
pub mod queue_publisher;
pub mod secrets;

// Re-exports
pub use anthropic::{AnthropicExtractor, ExtractionError, UserExtractor};
pub use app_config::{AppConfig, AppConfigError, LangfuseConfig};
pub use logging::init_logging;
pub use queue_publisher::{QueuePublishError, QueuePublisher, SqsQueuePublisher};
pub use secrets::{
    EnvSecretSource, SecretResolver, SecretResolverError, SecretSource, SecretSourceError,
    SecretSpec, SecretsManagerSecretSource, SECRET_PREFIX,
};
