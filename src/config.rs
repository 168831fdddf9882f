use clap::Parser;

/// Address of the original FastAPI backend when run locally with uvicorn.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8000";

/// Where the inference service lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub endpoint: String,
}

impl ClientConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        let endpoint: String = endpoint.into();
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }

    pub fn predict_url(&self) -> String {
        format!("{}/predict", self.endpoint)
    }

    pub fn health_url(&self) -> String {
        format!("{}/health", self.endpoint)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT)
    }
}

/// Upload a plant image and get pest/disease predictions from an inference service.
#[derive(Debug, Parser)]
#[command(name = "pest-classifier", version, about)]
pub struct Cli {
    /// Base URL of the inference service (`/predict` is appended)
    #[arg(long, env = "PEST_CLASSIFIER_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long)]
    pub verbose: bool,

    /// Image to open as soon as the session starts
    pub image: Option<std::path::PathBuf>,
}

impl Cli {
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(self.endpoint.as_str())
    }
}
