//! Marlin CLI - inspect what the bridge would see.
//!
//!   marlin parse <uri> [--network <net>]      → parsed payment request
//!       [--bip21-prefix <scheme>]
//!   marlin payment-uri <address> <prefix>     → companion payment URI
//!   marlin vault status [--app <name>]        → whether a secret is stored
//!   marlin companion show [--app <name>]      → persisted companion state
//!
//! Output is JSON; pretty when stdout is a terminal or with --pretty.

use anyhow::{anyhow, bail, Context};
use async_trait::async_trait;
use marlin_bridge::companion::{FileStateStore, StateStore};
use marlin_bridge::config::DEFAULT_SERVICE;
use marlin_bridge::intent::payment_uri;
use marlin_bridge::logging::init_logging;
use marlin_bridge::vault::{AuthPrompt, VaultKey, VaultResult};
use marlin_bridge::{parse_bip21, AuthGate, BridgeConfig, CashAddrValidator, FileVault, Network, VaultError};
use serde_json::{json, Value};
use std::env;
use std::io::IsTerminal;
use std::sync::Arc;

fn main() {
    init_logging();

    let args: Vec<String> = env::args().collect();
    let opts = ParsedArgs::parse(&args[1..]);

    if opts.help {
        print_usage();
        return;
    }

    if opts.version {
        println!("marlin {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    let result = match opts.command.as_deref() {
        Some("parse") => cmd_parse(&opts),
        Some("payment-uri") => cmd_payment_uri(&opts),
        Some("vault") => cmd_vault(&opts),
        Some("companion") => cmd_companion(&opts),
        Some(cmd) => Err(anyhow!("Unknown command: {}", cmd)),
        None => {
            print_usage();
            return;
        }
    };

    let pretty = opts.pretty || std::io::stdout().is_terminal();
    match result {
        Ok(output) => println!("{}", render(&output, pretty)),
        Err(e) => {
            eprintln!("{}", render(&json!({"error": format!("{e:#}")}), pretty));
            std::process::exit(1);
        }
    }
}

fn render(value: &Value, pretty: bool) -> String {
    let rendered = if pretty { serde_json::to_string_pretty(value) } else { serde_json::to_string(value) };
    rendered.unwrap_or_else(|_| value.to_string())
}

#[derive(Default)]
struct ParsedArgs {
    command: Option<String>,
    args: Vec<String>,
    app: Option<String>,
    network: Option<String>,
    data_dir: Option<String>,
    service: Option<String>,
    bip21_prefix: Option<String>,
    pretty: bool,
    help: bool,
    version: bool,
}

impl ParsedArgs {
    fn parse(args: &[String]) -> Self {
        let mut opts = ParsedArgs::default();
        let mut positional = Vec::new();
        let mut i = 0;

        while i < args.len() {
            let arg = &args[i];
            match arg.as_str() {
                "--help" | "-h" => opts.help = true,
                "--version" | "-V" => opts.version = true,
                "--pretty" => opts.pretty = true,
                "--app" | "-a" => {
                    if i + 1 < args.len() {
                        opts.app = Some(args[i + 1].clone());
                        i += 1;
                    }
                }
                "--network" | "-n" => {
                    if i + 1 < args.len() {
                        opts.network = Some(args[i + 1].clone());
                        i += 1;
                    }
                }
                "--data-dir" | "-d" => {
                    if i + 1 < args.len() {
                        opts.data_dir = Some(args[i + 1].clone());
                        i += 1;
                    }
                }
                "--service" | "-s" => {
                    if i + 1 < args.len() {
                        opts.service = Some(args[i + 1].clone());
                        i += 1;
                    }
                }
                "--bip21-prefix" => {
                    if i + 1 < args.len() {
                        opts.bip21_prefix = Some(args[i + 1].clone());
                        i += 1;
                    }
                }
                _ => positional.push(arg.clone()),
            }
            i += 1;
        }

        let mut positional = positional.into_iter();
        opts.command = positional.next();
        opts.args = positional.collect();
        opts
    }

    fn arg(&self, index: usize, name: &str) -> anyhow::Result<&str> {
        self.args.get(index).map(String::as_str).with_context(|| format!("missing <{name}>"))
    }

    fn network(&self) -> anyhow::Result<Network> {
        match self.network.as_deref() {
            None => Ok(Network::Mainnet),
            Some(value) => Network::from_str(value).with_context(|| format!("unknown network: {value}")),
        }
    }

    fn config(&self) -> anyhow::Result<BridgeConfig> {
        let mut config = BridgeConfig::new(self.network()?);
        if let Some(app) = &self.app {
            config = config.with_app(app);
        }
        if let Some(service) = &self.service {
            config = config.with_service(service);
        }
        if let Some(prefix) = &self.bip21_prefix {
            config = config.with_bip21_prefix(prefix);
        }
        if let Some(dir) = &self.data_dir {
            config = config.with_data_dir(dir);
        }
        Ok(config)
    }
}

fn cmd_parse(opts: &ParsedArgs) -> anyhow::Result<Value> {
    let uri = opts.arg(0, "uri")?;
    let config = opts.config()?;
    let validator = CashAddrValidator::for_prefix(config.address_prefix());
    let request = parse_bip21(uri, &config, &validator).with_context(|| format!("not a valid payment URI: {uri}"))?;
    Ok(serde_json::to_value(request)?)
}

fn cmd_payment_uri(opts: &ParsedArgs) -> anyhow::Result<Value> {
    let address = opts.arg(0, "address")?;
    let prefix = opts.arg(1, "prefix")?;
    Ok(json!({ "uri": payment_uri(address, prefix) }))
}

/// The CLI never reads secrets.
struct NoAuthenticator;

#[async_trait]
impl AuthGate for NoAuthenticator {
    async fn challenge(&self, _prompt: &AuthPrompt) -> VaultResult<VaultKey> {
        Err(VaultError::Unavailable("no authenticator on the command line".into()))
    }
}

fn cmd_vault(opts: &ParsedArgs) -> anyhow::Result<Value> {
    match opts.arg(0, "subcommand")? {
        "status" => {
            let config = opts.config()?;
            let vault = FileVault::new(config.vault_path(), config.service.clone(), Arc::new(NoAuthenticator));
            Ok(json!({
                "service": config.service,
                "default_service": config.service == DEFAULT_SERVICE,
                "path": vault.path().display().to_string(),
                "stored": vault.exists(),
            }))
        }
        other => bail!("Unknown vault subcommand: {}", other),
    }
}

fn cmd_companion(opts: &ParsedArgs) -> anyhow::Result<Value> {
    match opts.arg(0, "subcommand")? {
        "show" => {
            let config = opts.config()?;
            let store = FileStateStore::new(config.companion_state_path());
            let state = store.load().context("reading companion state")?;
            Ok(match state {
                Some(state) => json!({
                    "address": state.address,
                    "bip21_prefix": state.uri_prefix,
                    "payment_uri": state.payment_uri(),
                    "updated_at": state.updated_at.to_rfc3339(),
                }),
                None => json!({ "state": null, "path": store.path().display().to_string() }),
            })
        }
        other => bail!("Unknown companion subcommand: {}", other),
    }
}

fn print_usage() {
    println!(
        r#"marlin - wallet bridge inspector

USAGE:
    marlin <command> [args] [options]

COMMANDS:
    parse <uri>                     Parse a payment URI
    payment-uri <address> <prefix>  Build the companion payment URI
    vault status                    Whether a secret is stored (never reads it)
    companion show                  Persisted companion state

OPTIONS:
    --network, -n <net>     mainnet|ecash or testnet|ectest (default: mainnet)
    --app, -a <name>        Application name (default: marlin)
    --service, -s <name>    Vault service (default: eCashWallet)
    --bip21-prefix <scheme> Payment URI scheme (default: ecash: or ectest:)
    --data-dir, -d <path>   Data root (env: MARLIN_ROOT)
    --pretty                Pretty-print JSON
    --version, -V           Print version

ENVIRONMENT:
    RUST_LOG                Log filter (default: info)
    MARLIN_LOG_JSON=1       JSON log lines on stderr
"#
    );
}
