use std::path::PathBuf;

const DEFAULT_API_URL: &str = "http://localhost:5000";

/// Where the client talks to and where it keeps its on-device state.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: String,
    pub state_dir: PathBuf,
}

impl ClientConfig {
    /// `SHAREBIN_API_URL` and `SHAREBIN_STATE_DIR`, falling back to
    /// localhost and the platform data directory.
    pub fn from_env() -> Self {
        let api_url = std::env::var("SHAREBIN_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.into());
        let state_dir = std::env::var_os("SHAREBIN_STATE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(default_state_dir);
        Self { api_url, state_dir }
    }
}

fn default_state_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sharebin")
}
