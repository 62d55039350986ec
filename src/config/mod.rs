use std::env;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_service_key: String,
    pub invite_token_secret: String,
    pub notify_webhook_url: String,
    pub server_host: String,
    pub server_port: u16,
    pub api_base_uri: String,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        dotenv::dotenv().ok();

        Ok(Config {
            supabase_url: env::var("SUPABASE_URL")?,
            supabase_anon_key: env::var("SUPABASE_ANON_KEY")?,
            supabase_service_key: env::var("SUPABASE_SERVICE_KEY")?,
            invite_token_secret: env::var("INVITE_TOKEN_SECRET")?,
            notify_webhook_url: env::var("NOTIFY_WEBHOOK_URL")?,
            server_host: env::var("SERVER_HOST")?,
            server_port: env::var("SERVER_PORT")?.parse().unwrap_or(3000),
            api_base_uri: env::var("API_BASE_URI").unwrap_or_else(|_| "/api".into()),
        })
    }
}
