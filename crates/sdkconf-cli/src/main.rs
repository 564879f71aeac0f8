use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use base64::{engine::general_purpose, Engine as _};
use sdkconf_core::crypto::{generate_salt, CookieCipher};
use sdkconf_core::diagnostics::{JsonlSink, MemorySink, TeeSink, TracingSink};
use sdkconf_core::fields::ConfigField;
use sdkconf_core::paths::settings_path;
use sdkconf_core::secure_storage::{delete_cookie_key, store_cookie_key};
use sdkconf_core::settings::Settings;
use sdkconf_core::{
    assemble_and_initialize, preflight, AssemblyMode, CookieJar, CookieKey, Outcome,
};
use serde_json::json;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod host;

use crate::host::DryRunSdk;

#[derive(Parser, Debug)]
#[command(name = "sdkconf")]
#[command(author, version, about = "Assemble SDK configuration from encrypted cookies", long_about = None)]
struct Cli {
    /// Settings file (defaults to $SDKCONF_CONFIG or the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a new cookie key
    Keygen {
        /// Store the key in the OS keyring under this account instead of printing it
        #[arg(long, conflicts_with = "salt")]
        keyring: Option<String>,

        /// Print a fresh base64 salt for a passphrase key source instead of a key
        #[arg(long)]
        salt: bool,
    },

    /// Remove a cookie key from the OS keyring
    ForgetKey {
        /// Keyring account the key was stored under
        #[arg(long)]
        keyring: String,
    },

    /// Seal plaintext values into cookie tokens
    Seal {
        /// JSON object keyed by SDK property name (apiKey, authDomain, ...)
        #[arg(long, conflicts_with_all = ["field", "value"])]
        from_json: Option<PathBuf>,

        /// SDK property name of a single field
        #[arg(long, requires = "value")]
        field: Option<String>,

        #[arg(long, requires = "field")]
        value: Option<String>,

        /// Print one `Cookie:` header value instead of one cookie per line
        #[arg(long)]
        header: bool,
    },

    /// Decrypt, validate and hand the config to a dry-run SDK host
    Assemble {
        /// Raw `Cookie:` header value
        #[arg(long, conflicts_with = "cookie_file")]
        cookie_header: Option<String>,

        /// File holding a cookie header or a JSON name→value object
        #[arg(long)]
        cookie_file: Option<PathBuf>,

        /// Simulate a host where the SDK library is not loaded
        #[arg(long)]
        sdk_missing: bool,

        /// Number of app instances the SDK already holds
        #[arg(long, default_value_t = 0)]
        apps: usize,

        /// Decrypt fields on the rayon pool
        #[arg(long)]
        parallel: bool,

        /// Append diagnostics to this JSON-lines file
        #[arg(long)]
        diagnostics_log: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config.as_deref();
    match cli.command {
        Commands::Keygen { keyring, salt } => keygen_command(keyring, salt),
        Commands::ForgetKey { keyring } => forget_key_command(&keyring),
        Commands::Seal {
            from_json,
            field,
            value,
            header,
        } => seal_command(&load_settings(config)?, from_json, field, value, header),
        Commands::Assemble {
            cookie_header,
            cookie_file,
            sdk_missing,
            apps,
            parallel,
            diagnostics_log,
        } => assemble_command(
            &load_settings(config)?,
            AssembleArgs {
                cookie_header,
                cookie_file,
                sdk_missing,
                apps,
                parallel,
                diagnostics_log,
            },
        ),
    }
}

fn load_settings(config: Option<&Path>) -> Result<Settings> {
    match config {
        Some(path) => Settings::load(path),
        None => Settings::load(settings_path()?),
    }
}

fn keygen_command(keyring: Option<String>, salt: bool) -> Result<()> {
    if salt {
        println!("{}", general_purpose::STANDARD.encode(generate_salt()));
        return Ok(());
    }
    let key = CookieKey::generate();
    match keyring {
        Some(account) => {
            store_cookie_key(&account, &key)?;
            info!(account = %account, key_id = %key.fingerprint(), "cookie key stored in keyring");
            println!("{}", key.fingerprint());
        }
        None => {
            println!("{}", key.to_base64().as_str());
        }
    }
    Ok(())
}

fn forget_key_command(account: &str) -> Result<()> {
    delete_cookie_key(account)?;
    info!(account = %account, "cookie key removed from keyring");
    Ok(())
}

fn seal_command(
    settings: &Settings,
    from_json: Option<PathBuf>,
    field: Option<String>,
    value: Option<String>,
    header: bool,
) -> Result<()> {
    let values: BTreeMap<String, String> = match (from_json, field, value) {
        (Some(path), _, _) => {
            let bytes =
                std::fs::read(&path).with_context(|| format!("read {}", path.display()))?;
            let raw: BTreeMap<String, Option<String>> = serde_json::from_slice(&bytes)
                .with_context(|| format!("parse {}", path.display()))?;
            raw.into_iter()
                .filter_map(|(k, v)| v.map(|v| (k, v)))
                .collect()
        }
        (None, Some(field), Some(value)) => BTreeMap::from([(field, value)]),
        _ => bail!("provide --from-json or --field with --value"),
    };

    for name in values.keys() {
        if ConfigField::from_property(name).is_none() {
            return Err(anyhow!("unknown config field: {name}"));
        }
    }

    let key = settings.key_source.resolve()?;
    let cipher = CookieCipher::new(&key);
    let mut cookies = Vec::new();
    for field in ConfigField::ALL {
        let Some(plaintext) = values.get(field.property()) else {
            continue;
        };
        if plaintext.is_empty() {
            continue;
        }
        let token = cipher.seal(field.cookie_name(), plaintext)?;
        cookies.push(format!("{}={}", field.cookie_name(), token));
    }
    info!(key_id = cipher.key_id(), count = cookies.len(), "sealed cookies");

    if header {
        println!("{}", cookies.join("; "));
    } else {
        for cookie in cookies {
            println!("{cookie}");
        }
    }
    Ok(())
}

struct AssembleArgs {
    cookie_header: Option<String>,
    cookie_file: Option<PathBuf>,
    sdk_missing: bool,
    apps: usize,
    parallel: bool,
    diagnostics_log: Option<PathBuf>,
}

fn load_jar(args: &AssembleArgs) -> Result<CookieJar> {
    if let Some(header) = &args.cookie_header {
        return Ok(CookieJar::from_header(header));
    }
    if let Some(path) = &args.cookie_file {
        let text =
            std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        if text.trim_start().starts_with('{') {
            let map: HashMap<String, String> = serde_json::from_str(&text)
                .with_context(|| format!("parse {}", path.display()))?;
            return Ok(map.into_iter().collect());
        }
        return Ok(CookieJar::from_header(text.trim()));
    }
    bail!("provide --cookie-header or --cookie-file")
}

fn assemble_command(settings: &Settings, args: AssembleArgs) -> Result<()> {
    let memory = Arc::new(MemorySink::new());
    let mut sink = TeeSink::new().with(TracingSink).with(memory.clone());
    let log_path = match args.diagnostics_log.clone() {
        Some(path) => Some(path),
        None => settings.diagnostics_path()?,
    };
    if let Some(path) = log_path {
        sink = sink.with(JsonlSink::new(path));
    }
    let sdk = DryRunSdk::new(!args.sdk_missing, args.apps);

    // The key and cookies are only needed once the host can take a config.
    let outcome = match preflight(&sdk, &sink) {
        Some(outcome) => outcome,
        None => {
            let jar = load_jar(&args)?;
            let key = settings.key_source.resolve()?;
            let cipher = CookieCipher::new(&key);
            info!(key_id = cipher.key_id(), cookies = jar.len(), "assembling config");
            let mode = if args.parallel {
                AssemblyMode::Parallel
            } else {
                settings.assembly_mode()
            };
            assemble_and_initialize(&jar, &cipher, &sdk, &sink, mode)
        }
    };
    print_report(outcome, &sdk, &memory)
}

fn print_report(outcome: Outcome, sdk: &DryRunSdk, memory: &MemorySink) -> Result<()> {
    let report = json!({
        "outcome": outcome,
        "config": sdk.take_initialized(),
        "diagnostics": memory.entries(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
