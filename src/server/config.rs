use std::env;
use std::path::PathBuf;

const DEFAULT_PORT: u16 = 3001;
const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_FROM_EMAIL: &str = "PagePulse <notifications@pagepulse.dev>";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub data_dir: PathBuf,
    /// Email delivery is skipped when unset.
    pub resend_api_key: Option<String>,
    pub from_email: String,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, String> {
        let port = match env::var("PORT") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| format!("PORT must be a number, got {raw:?}"))?,
            Err(_) => DEFAULT_PORT,
        };

        let data_dir = env::var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR));

        let resend_api_key = env::var("RESEND_API_KEY").ok().filter(|k| !k.is_empty());
        let from_email =
            env::var("FROM_EMAIL").unwrap_or_else(|_| DEFAULT_FROM_EMAIL.to_string());

        Ok(ServerConfig {
            port,
            data_dir,
            resend_api_key,
            from_email,
        })
    }
}
