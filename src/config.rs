use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub tabular: TabularConfig,
    #[serde(default)]
    pub presentation: PresentationConfig,
}

/// Which schema properties and nested identifier kinds become nodes and edges
#[derive(Debug, Clone, Deserialize)]
pub struct GraphConfig {
    #[serde(default = "default_accepted_labels")]
    pub accepted_labels: Vec<String>,
    #[serde(default = "default_accepted_output_kinds")]
    pub accepted_output_kinds: Vec<String>,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            accepted_labels: default_accepted_labels(),
            accepted_output_kinds: default_accepted_output_kinds(),
        }
    }
}

impl GraphConfig {
    pub fn label_set(&self) -> HashSet<String> {
        self.accepted_labels.iter().cloned().collect()
    }

    pub fn output_kind_set(&self) -> HashSet<String> {
        self.accepted_output_kinds.iter().cloned().collect()
    }
}

fn default_accepted_labels() -> Vec<String> {
    [
        "bts:related_to",
        "bts:associatedWith",
        "bts:physically_interacts_with",
        "bts:treats",
        "bts:affects",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_accepted_output_kinds() -> Vec<String> {
    [
        "bts:entrez",
        "bts:ensembl",
        "bts:symbol",
        "bts:mondo",
        "bts:doid",
        "bts:umls",
        "bts:chembl",
        "bts:drugbank",
        "bts:name",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// External identifier resolver settings
#[derive(Debug, Clone, Deserialize)]
pub struct ResolverConfig {
    /// HTTP endpoint of the identifier conversion service. None = no remote resolution.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// LRU capacity for resolved nodes (0 disables caching)
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_secs: default_timeout_secs(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_cache_capacity() -> usize {
    1000
}

/// Identifier and name selection for tabular output
#[derive(Debug, Clone, Deserialize)]
pub struct TabularConfig {
    /// Entity type -> identifier kinds in order of preference
    #[serde(default = "default_id_rank")]
    pub id_rank: HashMap<String, Vec<String>>,
    #[serde(default = "default_name_kinds")]
    pub name_kinds: Vec<String>,
}

impl Default for TabularConfig {
    fn default() -> Self {
        Self {
            id_rank: default_id_rank(),
            name_kinds: default_name_kinds(),
        }
    }
}

fn default_id_rank() -> HashMap<String, Vec<String>> {
    let rank = |kinds: &[&str]| kinds.iter().map(|s| s.to_string()).collect::<Vec<_>>();
    let mut map = HashMap::new();
    map.insert(
        "Gene".to_string(),
        rank(&["bts:entrez", "bts:ensembl", "bts:symbol", "bts:umls"]),
    );
    map.insert(
        "DiseaseOrPhenotypicFeature".to_string(),
        rank(&["bts:mondo", "bts:doid", "bts:umls", "bts:mesh"]),
    );
    map.insert(
        "Disease".to_string(),
        rank(&["bts:mondo", "bts:doid", "bts:umls", "bts:mesh"]),
    );
    map.insert(
        "ChemicalSubstance".to_string(),
        rank(&["bts:chembl", "bts:drugbank", "bts:pubchem", "bts:name"]),
    );
    map
}

fn default_name_kinds() -> Vec<String> {
    vec!["bts:symbol".to_string(), "bts:name".to_string()]
}

/// Visualization payload settings
#[derive(Debug, Clone, Deserialize)]
pub struct PresentationConfig {
    #[serde(default = "default_level_colors")]
    pub level_colors: BTreeMap<String, String>,
}

impl PresentationConfig {
    pub fn color_for(&self, level: u32) -> Option<&str> {
        self.level_colors.get(&level.to_string()).map(String::as_str)
    }
}

impl Default for PresentationConfig {
    fn default() -> Self {
        Self {
            level_colors: default_level_colors(),
        }
    }
}

fn default_level_colors() -> BTreeMap<String, String> {
    let mut colors = BTreeMap::new();
    colors.insert("1".to_string(), "green".to_string());
    colors.insert("2".to_string(), "red".to_string());
    // orange
    colors.insert("3".to_string(), "rgba(255,168,7)".to_string());
    colors
}

impl Config {
    /// Load configuration from file
    ///
    /// Loads environment variables from .env file (if present) before loading config.
    /// Looks for config file in this order:
    /// 1. Path specified in BIOGRAPH_CONFIG environment variable
    /// 2. ./biograph.toml in current directory
    pub fn load() -> Result<Self> {
        let _ = dotenv::dotenv();

        let config_path = std::env::var("BIOGRAPH_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("biograph.toml"));

        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        Self::from_toml(&config_str)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse biograph.toml")?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.graph.accepted_labels.is_empty() {
            anyhow::bail!("graph.accepted_labels must not be empty");
        }

        if self.graph.accepted_output_kinds.is_empty() {
            anyhow::bail!("graph.accepted_output_kinds must not be empty");
        }

        if let Some(endpoint) = &self.resolver.endpoint {
            url::Url::parse(endpoint)
                .with_context(|| format!("resolver.endpoint is not a valid URL: {}", endpoint))?;
        }

        if self.resolver.timeout_secs == 0 {
            anyhow::bail!("resolver.timeout_secs must be greater than 0");
        }

        Ok(())
    }
}
