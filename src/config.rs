//! Bridge configuration - passed from the host shell

use std::path::PathBuf;
use std::time::Duration;

/// Default keychain service identifier for the wallet secret.
pub const DEFAULT_SERVICE: &str = "eCashWallet";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
        }
    }

    /// CashAddr human-readable prefix, without the colon.
    pub fn address_prefix(&self) -> &'static str {
        match self {
            Network::Mainnet => "ecash",
            Network::Testnet => "ectest",
        }
    }

    /// Default BIP21 scheme prefix, with the colon.
    pub fn bip21_prefix(&self) -> &'static str {
        match self {
            Network::Mainnet => "ecash:",
            Network::Testnet => "ectest:",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mainnet" | "ecash" | "main" => Some(Network::Mainnet),
            "testnet" | "ectest" | "test" => Some(Network::Testnet),
            _ => None,
        }
    }
}

/// Deferred intent polling policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntentConfig {
    /// Delay between readiness polls.
    pub poll_interval: Duration,
    /// Consecutive reachable polls required before emitting.
    pub min_ready_polls: u32,
    /// Total polls before the intent expires.
    pub max_attempts: u32,
}

impl Default for IntentConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(200),
            min_ready_polls: 5,
            max_attempts: 30,
        }
    }
}

impl IntentConfig {
    /// Upper bound on how long a pending intent waits for the runtime.
    pub fn budget(&self) -> Duration {
        self.poll_interval * self.max_attempts
    }
}

/// Bridge configuration. Higher layers construct this.
#[derive(Debug, Clone, Default)]
pub struct BridgeConfig {
    pub app: String,
    pub network: Network,
    /// Payment URI scheme with the colon. Defaults to the network's.
    pub bip21_prefix: String,
    pub service: String,
    pub data_dir: Option<PathBuf>,
    pub intent: IntentConfig,
}

impl BridgeConfig {
    pub fn new(network: Network) -> Self {
        Self {
            app: "marlin".into(),
            network,
            bip21_prefix: network.bip21_prefix().into(),
            service: DEFAULT_SERVICE.into(),
            ..Default::default()
        }
    }
    pub fn with_app(mut self, app: impl Into<String>) -> Self { self.app = app.into(); self }
    /// Override the payment URI scheme. A missing trailing colon is added.
    pub fn with_bip21_prefix(mut self, prefix: impl Into<String>) -> Self {
        let mut prefix = prefix.into();
        if !prefix.ends_with(':') {
            prefix.push(':');
        }
        self.bip21_prefix = prefix;
        self
    }
    pub fn with_service(mut self, service: impl Into<String>) -> Self { self.service = service.into(); self }
    pub fn with_data_dir(mut self, path: impl Into<PathBuf>) -> Self { self.data_dir = Some(path.into()); self }
    pub fn with_intent(mut self, intent: IntentConfig) -> Self { self.intent = intent; self }

    pub fn address_prefix(&self) -> &'static str { self.network.address_prefix() }
    pub fn bip21_prefix(&self) -> &str { &self.bip21_prefix }

    /// Root directory for this app's persisted files.
    pub fn app_dir(&self) -> PathBuf {
        let root = self.data_dir.clone().unwrap_or_else(data_root);
        root.join(&self.app)
    }

    pub fn vault_path(&self) -> PathBuf {
        self.app_dir().join("vault").join(format!("{}.json", self.service))
    }

    pub fn companion_state_path(&self) -> PathBuf {
        self.app_dir().join("companion").join("state.json")
    }
}

fn data_root() -> PathBuf {
    std::env::var("MARLIN_ROOT")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs::data_local_dir().unwrap_or_else(|| PathBuf::from(".")))
}
