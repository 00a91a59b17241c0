use std::env;
use std::time::Duration;

/// Tuning for the background evaluation loop.
#[derive(Debug, Clone)]
pub struct EvaluatorConfig {
    pub interval: Duration,
    pub batch_size: u64,
    pub max_concurrent_fetches: usize,
    pub pass_timeout: Duration,
    /// Restrict evaluation to one account's alerts; None means all accounts.
    pub account_scope: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub server_host: String,
    pub server_port: u16,
    pub graph_url: String,
    pub oracle_timeout: Duration,
    pub fcm_server_key: String,
    pub evaluator: EvaluatorConfig,
}

const DEFAULT_GRAPH_URL: &str = "https://api.thegraph.com/subgraphs/name/uniswap/uniswap-v2";

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenv::dotenv().ok();

        let database_url = env::var("DATABASE_URL")?;
        let db_max_connections = parse_var("DB_MAX_CONNECTIONS", 50)?;
        let db_min_connections = parse_var("DB_MIN_CONNECTIONS", 5)?;

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let server_port = parse_var("SERVER_PORT", 8080)?;

        let graph_url = env::var("GRAPH_URL").unwrap_or_else(|_| DEFAULT_GRAPH_URL.to_string());
        let oracle_timeout = Duration::from_secs(parse_var("ORACLE_TIMEOUT_SECS", 10)?);

        // The push credential never ships in the binary; refusing to start
        // without it beats sending nothing at runtime.
        let fcm_server_key = env::var("FCM_SERVER_KEY")
            .map_err(|_| "FCM_SERVER_KEY must be set")?;

        let account_scope = match env::var("EVAL_ACCOUNT_SCOPE") {
            Ok(raw) => Some(
                raw.parse::<i64>()
                    .map_err(|_| "EVAL_ACCOUNT_SCOPE must be an account id")?,
            ),
            Err(_) => None,
        };

        let evaluator = EvaluatorConfig {
            interval: Duration::from_secs(parse_var("EVAL_INTERVAL_SECS", 5)?),
            batch_size: parse_var("EVAL_BATCH_SIZE", 50)?,
            max_concurrent_fetches: parse_var("EVAL_MAX_CONCURRENT_FETCHES", 8)?,
            pass_timeout: Duration::from_secs(parse_var("EVAL_PASS_TIMEOUT_SECS", 30)?),
            account_scope,
        };

        Ok(Config {
            database_url,
            db_max_connections,
            db_min_connections,
            server_host,
            server_port,
            graph_url,
            oracle_timeout,
            fcm_server_key,
            evaluator,
        })
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, default: T) -> Result<T, Box<dyn std::error::Error>> {
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|_| format!("{} must be a number", key).into()),
        Err(_) => Ok(default),
    }
}
