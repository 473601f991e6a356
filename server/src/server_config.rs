use config::Config;
use lazy_static::lazy_static;
use serde::Deserialize;
use std::{env, path::Path};
use url::Url;

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Chat completions API key.
    pub key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    pub id: String,
    pub endpoint: Url,
    pub temperature: f64,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IngestConfig {
    /// Bucket the upstream email-receiving service writes raw messages to.
    pub bucket: String,
    /// Static key presented by that service in the x-api-key header.
    pub api_key: String,
    pub default_ticket_title: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedbackConfig {
    pub batch_size: u64,
    /// Six-field cron expression for the feedback scan job.
    pub scan_schedule: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    pub default_max_concurrent_tickets: i32,
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    api: ApiConfig,
    model: ModelConfig,
    ingest: IngestConfig,
    feedback: FeedbackConfig,
    agents: AgentConfig,
}

#[derive(Debug)]
pub struct ServerConfig {
    pub api: ApiConfig,
    pub model: ModelConfig,
    pub ingest: IngestConfig,
    pub feedback: FeedbackConfig,
    pub agents: AgentConfig,
}

impl std::fmt::Display for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Server Config:\nModel: {} @ {}\nIngest bucket: {}\nFeedback: batch {} on \"{}\"\nAgent defaults: {:?}",
            self.model.id,
            self.model.endpoint,
            self.ingest.bucket,
            self.feedback.batch_size,
            self.feedback.scan_schedule,
            self.agents,
        )
    }
}

lazy_static! {
    pub static ref cfg: ServerConfig = {
        let root = env::var("APP_DIR").unwrap_or_else(|_| {
            let dir =
                env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR or APP_DIR is required");
            let dir = Path::new(&dir).parent().unwrap().display().to_string();
            format!("{}/config", dir)
        });
        let path = format!("{root}/config.toml");
        let cfg_file: ConfigFile = Config::builder()
            .add_source(config::File::with_name(&path))
            .build()
            .expect("config.toml is required")
            .try_deserialize()
            .expect("config.toml is invalid");

        let ConfigFile {
            mut api,
            model,
            mut ingest,
            feedback,
            agents,
        } = cfg_file;

        // Deployment secrets come from the environment, not the file.
        if let Ok(key) = env::var("MODEL_API_KEY") {
            api.key = key;
        }
        if let Ok(key) = env::var("INGEST_API_KEY") {
            ingest.api_key = key;
        }

        ServerConfig {
            api,
            model,
            ingest,
            feedback,
            agents,
        }
    };
}
