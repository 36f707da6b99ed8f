use std::path::PathBuf;
use std::sync::OnceLock;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("pass in path to serve")]
    MissingServePath,
    #[error("--{flag} is not a valid url ({value}): {reason}")]
    BadStoreUrl {
        flag: &'static str,
        value: String,
        reason: String,
    },
}

/// Immutable server configuration, built once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory that is both the cache and the document root.
    pub serve_root: PathBuf,
    /// Primary backing store base url. `None` disables remote fallback.
    pub backing: Option<String>,
    /// Only consulted after the primary failed.
    pub secondary: Option<String>,
    pub port: u16,
}

impl Config {
    pub fn from_args(args: &crate::Args) -> Result<Config, ConfigError> {
        let serve_root = expand_serve_path(&args.arg_path, |name| std::env::var(name).ok());
        if serve_root.is_empty() {
            return Err(ConfigError::MissingServePath);
        }
        let config = Config {
            serve_root: PathBuf::from(serve_root),
            backing: store_url("backing", &args.flag_backing)?,
            secondary: store_url("secondary", &args.flag_secondary)?,
            port: args.flag_port,
        };
        if config.backing.is_none() && config.secondary.is_some() {
            warn!("--secondary is ignored without --backing");
        }
        Ok(config)
    }
}

/// Empty means "not configured". Anything else has to parse as a url.
fn store_url(flag: &'static str, value: &str) -> Result<Option<String>, ConfigError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    reqwest::Url::parse(value).map_err(|e| ConfigError::BadStoreUrl {
        flag,
        value: value.to_string(),
        reason: e.to_string(),
    })?;
    Ok(Some(value.to_string()))
}

fn env_var_pattern() -> &'static regex::Regex {
    static PATTERN: OnceLock<regex::Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        regex::Regex::new(r"\$(?:\{([A-Za-z_][A-Za-z0-9_]*)\}|([A-Za-z_][A-Za-z0-9_]*))")
            .expect("env var pattern compiles")
    })
}

/// Turns the serve path argument into a usable directory path:
/// `~` becomes `$HOME`, `$VAR` and `${VAR}` are substituted (unset is empty)
/// and a trailing slash is dropped.
pub fn expand_serve_path<F>(raw: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let raw = match raw.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => format!("$HOME{}", rest),
        _ => raw.to_string(),
    };
    let expanded = env_var_pattern().replace_all(&raw, |caps: &regex::Captures| {
        let name = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
        lookup(name).unwrap_or_default()
    });
    match expanded.strip_suffix('/') {
        Some(trimmed) if !trimmed.is_empty() => trimmed.to_string(),
        _ => expanded.into_owned(),
    }
}
