// # whereamid - Location Query Runner
//
// Thin integration layer only. All resolution logic (provider chain,
// caching, single-flight coordination) lives in whereami-core; this
// binary reads configuration from environment variables, wires the
// components together, runs one query, and prints the result entries
// the way the host would display them.
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// ### Providers
// - `WHEREAMI_PROVIDERS`: Comma-separated fallback chain
//   (default: ip_api,ipwhois,ipapi_co)
// - `WHEREAMI_PROVIDER_TIMEOUT_SECS`: Per-provider call timeout
//
// ### Cache
// - `WHEREAMI_CACHE_TTL_SECS`: Cache TTL in seconds (default: 300)
// - `WHEREAMI_CACHE_PATH`: Persistent cache file; memory-only when unset
//
// ### Fetch
// - `WHEREAMI_OUTER_TIMEOUT_SECS`: Bound on one full chain pass
//
// ### Display
// - `WHEREAMI_SHOW_REGION`, `WHEREAMI_SHOW_FLAG`, `WHEREAMI_SHOW_IP`
// - `WHEREAMI_COPY_FORMAT`: city, city+country, city+region+country, ip
// - `WHEREAMI_ICON_DIR`: Directory holding icon.png/error.png/loading.png
//
// ### Logging
// - `WHEREAMI_LOG_LEVEL`: trace, debug, info, warn, error
//
// ## Example
//
// ```bash
// export WHEREAMI_PROVIDERS=ip_api,ipwhois
// export WHEREAMI_CACHE_PATH=~/.cache/whereami/location.json
// export WHEREAMI_SHOW_FLAG=true
//
// whereamid
// ```

use std::env;
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::Result;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

use whereami_core::config::{
    CacheConfig, CacheTierConfig, DisplayConfig, FetchConfig, ProviderConfig, ResolverConfig,
};
use whereami_core::coordinator::{CoordinatorEvent, ResolutionCoordinator};
use whereami_core::host::{
    DirIconResolver, EntryAction, QueryPreferences, ResultEntry, render_error, render_location,
    render_pending,
};
use whereami_core::location::CopyFormat;
use whereami_core::{
    CacheStore, FileCacheTier, ProviderChain, ProviderRegistry, QuerySessionTracker,
};

/// Exit codes for different termination scenarios
///
/// - 0: Query answered (including provider-exhaustion answers)
/// - 1: Configuration error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum AppExitCode {
    Answered = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<AppExitCode> for ExitCode {
    fn from(code: AppExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Environment-derived application configuration
struct Config {
    providers: Vec<String>,
    provider_timeout_secs: u64,
    cache_ttl_secs: u64,
    cache_path: Option<String>,
    outer_timeout_secs: Option<u64>,
    show_region: bool,
    show_flag: bool,
    show_ip: bool,
    copy_format: String,
    icon_dir: String,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Self {
        let flag = |key: &str| {
            env::var(key)
                .map(|v| matches!(v.trim().to_lowercase().as_str(), "true" | "yes" | "1"))
                .unwrap_or(false)
        };

        Self {
            providers: env::var("WHEREAMI_PROVIDERS")
                .unwrap_or_else(|_| "ip_api,ipwhois,ipapi_co".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            provider_timeout_secs: env::var("WHEREAMI_PROVIDER_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3),
            cache_ttl_secs: env::var("WHEREAMI_CACHE_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(300),
            cache_path: env::var("WHEREAMI_CACHE_PATH").ok().filter(|s| !s.is_empty()),
            outer_timeout_secs: env::var("WHEREAMI_OUTER_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .or(Some(8)),
            show_region: flag("WHEREAMI_SHOW_REGION"),
            show_flag: flag("WHEREAMI_SHOW_FLAG"),
            show_ip: flag("WHEREAMI_SHOW_IP"),
            copy_format: env::var("WHEREAMI_COPY_FORMAT")
                .unwrap_or_else(|_| "city+country".to_string()),
            icon_dir: env::var("WHEREAMI_ICON_DIR").unwrap_or_else(|_| "images".to_string()),
            log_level: env::var("WHEREAMI_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        }
    }

    /// Build the typed resolver configuration
    fn resolver_config(&self) -> Result<ResolverConfig> {
        let mut providers = Vec::new();
        for name in &self.providers {
            let provider = match name.as_str() {
                "ip_api" => ProviderConfig::IpApi {
                    base_url: None,
                    timeout_secs: self.provider_timeout_secs,
                },
                "ipwhois" => ProviderConfig::Ipwhois {
                    base_url: None,
                    timeout_secs: self.provider_timeout_secs,
                },
                "ipapi_co" => ProviderConfig::IpapiCo {
                    base_url: None,
                    timeout_secs: self.provider_timeout_secs,
                },
                other => anyhow::bail!(
                    "WHEREAMI_PROVIDERS contains unknown provider '{}'. \
                    Supported providers: ip_api, ipwhois, ipapi_co",
                    other
                ),
            };
            providers.push(provider);
        }

        let copy_format = CopyFormat::from_str(&self.copy_format).map_err(|_| {
            anyhow::anyhow!(
                "WHEREAMI_COPY_FORMAT '{}' is not valid. \
                Valid formats: city, city+country, city+region+country, ip",
                self.copy_format
            )
        })?;

        let config = ResolverConfig {
            providers,
            cache: CacheConfig {
                ttl_secs: self.cache_ttl_secs,
                tier: match &self.cache_path {
                    Some(path) => CacheTierConfig::File { path: path.clone() },
                    None => CacheTierConfig::Memory,
                },
            },
            fetch: FetchConfig {
                outer_timeout_secs: self.outer_timeout_secs,
                ..FetchConfig::default()
            },
            display: DisplayConfig {
                show_region: self.show_region,
                show_flag: self.show_flag,
                show_ip: self.show_ip,
                copy_format,
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn log_level(&self) -> Result<Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(Level::TRACE),
            "debug" => Ok(Level::DEBUG),
            "info" => Ok(Level::INFO),
            "warn" => Ok(Level::WARN),
            "error" => Ok(Level::ERROR),
            other => anyhow::bail!(
                "WHEREAMI_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                other
            ),
        }
    }
}

fn main() -> ExitCode {
    let config = Config::from_env();

    let log_level = match config.log_level() {
        Ok(level) => level,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return AppExitCode::ConfigError.into();
        }
    };

    let resolver_config = match config.resolver_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return AppExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return AppExitCode::ConfigError.into();
    }

    info!(
        "Starting whereamid with {} provider(s)",
        resolver_config.providers.len()
    );

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return AppExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        match run_query(&config, resolver_config).await {
            Ok(()) => AppExitCode::Answered,
            Err(e) => {
                error!("Query error: {}", e);
                AppExitCode::RuntimeError
            }
        }
    });

    result.into()
}

/// Run one location query end to end
async fn run_query(config: &Config, resolver_config: ResolverConfig) -> Result<()> {
    let registry = ProviderRegistry::new();

    #[cfg(feature = "http")]
    {
        let client = reqwest::Client::builder()
            .user_agent(resolver_config.fetch.user_agent.clone())
            .build()?;
        whereami_provider_http::register(&registry, client, &resolver_config.fetch);
        debug!("Registered HTTP providers: {:?}", registry.list_adapters());
    }

    let mut adapters = Vec::new();
    for provider in &resolver_config.providers {
        adapters.push(registry.create_adapter(provider)?);
    }
    let chain = ProviderChain::new(adapters)?;

    let cache = match &resolver_config.cache.tier {
        CacheTierConfig::File { path } => {
            let tier = FileCacheTier::new(path).await?;
            CacheStore::new(resolver_config.cache.ttl(), Some(Box::new(tier)))
        }
        CacheTierConfig::Memory => CacheStore::memory_only(resolver_config.cache.ttl()),
    };

    let tracker = Arc::new(QuerySessionTracker::new());
    let (coordinator, events) =
        ResolutionCoordinator::new(chain, cache, Arc::clone(&tracker), &resolver_config.fetch);

    // Event channel feeds logging only; the host UI never sees it
    tokio::spawn(log_events(ReceiverStream::new(events)));

    let icons = DirIconResolver::new(
        &config.icon_dir,
        std::path::Path::new(&config.icon_dir).join("icon.png"),
    );
    let prefs = QueryPreferences::from_display_config(&resolver_config.display);

    let generation = tracker.next_generation();
    let resolution = coordinator.resolve(generation).await;

    if !resolution.is_cached() {
        print_entries(&render_pending(&icons));
    }

    match resolution.outcome().await {
        Some(delivery) => match delivery.result {
            Ok(location) => {
                info!(
                    generation = delivery.generation,
                    provider = %location.provider,
                    "Location resolved"
                );
                print_entries(&render_location(&location, &prefs, &icons));
            }
            Err(e) => {
                warn!(generation = delivery.generation, "Resolution failed: {}", e);
                print_entries(&render_error(&e, &icons));
            }
        },
        // A single-query run issues one generation, so supersession
        // indicates a coordinator bug rather than normal operation.
        None => anyhow::bail!("resolution was superseded with no newer query pending"),
    }

    Ok(())
}

/// Log coordinator diagnostics as they arrive
async fn log_events(mut events: ReceiverStream<CoordinatorEvent>) {
    while let Some(event) = events.next().await {
        match event {
            CoordinatorEvent::CacheHit { generation } => {
                debug!(generation, "Cache hit");
            }
            CoordinatorEvent::FetchStarted { generation } => {
                debug!(generation, "Fetch started");
            }
            CoordinatorEvent::WaiterAttached { generation } => {
                debug!(generation, "Waiter attached to in-flight fetch");
            }
            CoordinatorEvent::Delivered {
                generation,
                provider,
            } => {
                debug!(generation, %provider, "Result delivered");
            }
            CoordinatorEvent::FetchFailed { generation, error } => {
                warn!(generation, "Fetch failed: {}", error);
            }
            CoordinatorEvent::Superseded { generation } => {
                debug!(generation, "Fetch superseded by newer query");
            }
        }
    }
}

/// Print result entries the way the host would display them
fn print_entries(entries: &[ResultEntry]) {
    for entry in entries {
        println!("{}", entry.title);
        println!("  {}", entry.subtitle);
        match &entry.action {
            EntryAction::CopyToClipboard(text) => println!("  [copy] {}", text),
            EntryAction::OpenUrl(url) => println!("  [open] {}", url),
            EntryAction::None => {}
        }
    }
}
