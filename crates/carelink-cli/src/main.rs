// # carelink - Command-Line Client
//
// Thin binary over the carelink access layer: it reads configuration from
// environment variables, builds the shared client, and issues one request
// (or one diagnostic round). All discovery, retry, and auth behavior lives
// in carelink-core / carelink-http; nothing is decided here.
//
// ## Usage
//
// ```bash
// carelink request GET /hospitals/
// carelink request POST /users/login/ '{"email": "a@b.c", "password": "pw"}'
// carelink status
// ```
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// ### Endpoints
// - `CARELINK_OVERRIDE_URL`: Base URL override; skips discovery
// - `CARELINK_PRODUCTION_URL`: Deployed production base URL
// - `CARELINK_LAN_URLS`: Comma-separated LAN candidate base URLs
// - `CARELINK_FALLBACK_URL`: Base URL used when every probe fails
//
// ### Requests
// - `CARELINK_REQUEST_TIMEOUT_SECS`: Per-request timeout
// - `CARELINK_PROBE_TIMEOUT_SECS`: Per-candidate probe timeout
//
// ### Credential Store
// - `CARELINK_CREDENTIAL_STORE_TYPE`: Store type (file, memory)
// - `CARELINK_CREDENTIAL_STORE_PATH`: Path to credential file (for file store)
//
// ### Logging
// - `CARELINK_LOG_LEVEL`: trace, debug, info, warn, error

use anyhow::Result;
use std::env;
use std::process::ExitCode;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

use carelink_core::config::{ClientConfig, CredentialStoreConfig};
use carelink_core::{ApiError, ErrorKind, Method, RequestOptions};

/// Exit codes for different termination scenarios
#[derive(Debug, Clone, Copy)]
enum CliExitCode {
    /// Request completed with a success status
    Success = 0,
    /// Configuration or usage error
    ConfigError = 1,
    /// The request failed (network, HTTP error status, runtime)
    RequestFailed = 2,
}

impl From<CliExitCode> for ExitCode {
    fn from(code: CliExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// What the invocation asked for
enum Command {
    /// Issue one request through the dispatcher
    Request {
        method: Method,
        path: String,
        body: Option<serde_json::Value>,
    },
    /// One connectivity check plus the resolved endpoint
    Status,
}

impl Command {
    fn from_args(args: &[String]) -> Result<Self> {
        match args.first().map(String::as_str) {
            Some("request") => {
                let method = args
                    .get(1)
                    .ok_or_else(|| anyhow::anyhow!("missing METHOD argument"))?;
                let method = parse_method(method)?;
                let path = args
                    .get(2)
                    .ok_or_else(|| anyhow::anyhow!("missing PATH argument"))?
                    .clone();
                let body = match args.get(3) {
                    Some(raw) => Some(serde_json::from_str(raw).map_err(|e| {
                        anyhow::anyhow!("request body is not valid JSON: {}", e)
                    })?),
                    None => None,
                };
                Ok(Command::Request { method, path, body })
            }
            Some("status") => Ok(Command::Status),
            Some(other) => anyhow::bail!(
                "unknown command '{}'. Usage: carelink request <METHOD> <PATH> [JSON_BODY] | carelink status",
                other
            ),
            None => anyhow::bail!(
                "Usage: carelink request <METHOD> <PATH> [JSON_BODY] | carelink status"
            ),
        }
    }
}

fn parse_method(raw: &str) -> Result<Method> {
    match raw.to_uppercase().as_str() {
        "GET" => Ok(Method::Get),
        "POST" => Ok(Method::Post),
        "PUT" => Ok(Method::Put),
        "PATCH" => Ok(Method::Patch),
        "DELETE" => Ok(Method::Delete),
        _ => anyhow::bail!(
            "unsupported method '{}'. Supported: GET, POST, PUT, PATCH, DELETE",
            raw
        ),
    }
}

/// Build the access-layer configuration from environment variables
fn config_from_env() -> Result<ClientConfig> {
    let mut config = ClientConfig::new();

    config.endpoint.override_url = env::var("CARELINK_OVERRIDE_URL").ok();
    config.endpoint.production_url = env::var("CARELINK_PRODUCTION_URL").ok();
    if let Ok(urls) = env::var("CARELINK_LAN_URLS") {
        config.endpoint.lan_urls = urls
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }
    if let Ok(url) = env::var("CARELINK_FALLBACK_URL") {
        config.endpoint.fallback_url = url;
    }
    if let Ok(secs) = env::var("CARELINK_REQUEST_TIMEOUT_SECS") {
        config.request.timeout_secs = secs
            .parse()
            .map_err(|_| anyhow::anyhow!("CARELINK_REQUEST_TIMEOUT_SECS must be a number"))?;
    }
    if let Ok(secs) = env::var("CARELINK_PROBE_TIMEOUT_SECS") {
        config.endpoint.probe_timeout_secs = secs
            .parse()
            .map_err(|_| anyhow::anyhow!("CARELINK_PROBE_TIMEOUT_SECS must be a number"))?;
    }

    let store_type = env::var("CARELINK_CREDENTIAL_STORE_TYPE")
        .unwrap_or_else(|_| "memory".to_string());
    config.credential_store = match store_type.as_str() {
        "memory" => CredentialStoreConfig::Memory,
        "file" => {
            let path = env::var("CARELINK_CREDENTIAL_STORE_PATH").map_err(|_| {
                anyhow::anyhow!(
                    "CARELINK_CREDENTIAL_STORE_PATH is required when \
                     CARELINK_CREDENTIAL_STORE_TYPE=file"
                )
            })?;
            CredentialStoreConfig::File { path }
        }
        other => anyhow::bail!(
            "CARELINK_CREDENTIAL_STORE_TYPE '{}' is not supported. \
             Supported types: file, memory",
            other
        ),
    };

    config.validate()?;
    Ok(config)
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();
    let command = match Command::from_args(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{}", e);
            return CliExitCode::ConfigError.into();
        }
    };

    let config = match config_from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return CliExitCode::ConfigError.into();
        }
    };

    let log_level = match env::var("CARELINK_LOG_LEVEL")
        .unwrap_or_else(|_| "warn".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return CliExitCode::ConfigError.into();
    }

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return CliExitCode::RequestFailed.into();
        }
    };

    rt.block_on(async {
        match run(command, config).await {
            Ok(code) => code,
            Err(e) => {
                error!("carelink error: {}", e);
                CliExitCode::RequestFailed
            }
        }
    })
    .into()
}

async fn run(command: Command, config: ClientConfig) -> Result<CliExitCode> {
    let dispatcher = carelink_core::client::shared()
        .get_or_init(|| async { carelink_http::build_dispatcher(&config).await })
        .await?;

    match command {
        Command::Request { method, path, body } => {
            let result = dispatcher
                .request(method, &path, body, RequestOptions::default())
                .await;
            match result {
                Ok(response) => {
                    info!("request completed with status {}", response.status);
                    println!("{}", response.text());
                    Ok(CliExitCode::Success)
                }
                Err(e) => {
                    report_failure(&e);
                    Ok(CliExitCode::RequestFailed)
                }
            }
        }
        Command::Status => {
            let monitor = carelink_http::build_monitor(&config);
            monitor.check_now().await;
            let state = monitor.state();

            let base_url = dispatcher.resolver().base_url().await;
            let resolved = dispatcher.resolver().current().await;

            println!("endpoint: {}", base_url);
            if let Some(resolved) = resolved {
                println!("source: {:?}", resolved.source);
                println!("confidence: {:?}", resolved.confidence);
            }
            println!("connected: {}", state.is_connected);
            if let Some(reachable) = state.is_internet_reachable {
                println!("internet reachable: {}", reachable);
            }
            Ok(CliExitCode::Success)
        }
    }
}

fn report_failure(error: &ApiError) {
    match error.kind() {
        ErrorKind::Network | ErrorKind::Timeout => {
            eprintln!("network failure: {}", error);
        }
        ErrorKind::Unauthorized => {
            eprintln!("authentication required: {}", error);
        }
        _ => {
            if let Some(status) = error.http_status() {
                eprintln!("request failed (HTTP {}): {}", status, error);
            } else {
                eprintln!("request failed: {}", error);
            }
        }
    }
    if let Some(payload) = error.payload() {
        eprintln!("{}", payload);
    }
}
