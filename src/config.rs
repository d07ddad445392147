//! Configuration for the content gateway.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (CMS_URL / STRAPI_URL, CORS_ORIGINS,
//!    BEEHIIV_API_KEY, BEEHIIV_PUBLICATION_ID, CMS_REVALIDATE_SECONDS)
//! 2. Config file (.contentgw/config.yaml)
//! 3. Defaults (local Strapi on port 1337)
//!
//! Config file discovery:
//! - Searches current directory and parents for .contentgw/config.yaml
//! - Provider credentials are never read from the file, only from the
//!   environment

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

/// Collection names probed by default, most likely REST slug first.
/// These track the renames the content store has gone through.
pub const DEFAULT_COLLECTIONS: &[&str] = &[
    "adhd-guides",
    "adhdGuide",
    "adhdGuides",
    "main-guides",
    "blog-posts",
];

/// Collection names probed by default when listing front-page records.
/// The main-page collection went through its own renames, separate from
/// the per-record ones above.
pub const DEFAULT_LIST_COLLECTIONS: &[&str] = &[
    "mainPageGuides",
    "main-page-guides",
    "MainPageGuides",
];

/// Candidate slug-like field names, checked in order.
pub const DEFAULT_SLUG_FIELDS: &[&str] = &["slug", "uid", "handle", "permalink"];

/// Origins always allowed for cross-origin requests (local dev servers).
pub const DEFAULT_CORS_ORIGINS: &[&str] = &[
    "http://localhost:3000",
    "http://127.0.0.1:3000",
    "http://localhost:3001",
    "http://localhost:3002",
    "http://localhost:3003",
];

const DEFAULT_CMS_URL: &str = "http://localhost:1337";
const DEFAULT_REVALIDATE_SECONDS: u64 = 60;

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub cms: CmsSection,
    #[serde(default)]
    pub cors: CorsSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CmsSection {
    /// Base URL of the content API
    pub url: Option<String>,
    /// Response reuse window in seconds
    pub revalidate_seconds: Option<u64>,
    /// Ordered collection candidates to probe for single records
    pub collections: Option<Vec<String>>,
    /// Ordered collection candidates to probe when listing
    pub list_collections: Option<Vec<String>>,
    /// Ordered slug-like field candidates
    pub slug_fields: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CorsSection {
    /// Extra allowed origins, appended to the local-dev defaults
    pub origins: Option<Vec<String>>,
}

/// Newsletter provider credentials (environment only)
#[derive(Debug, Clone)]
pub struct BeehiivCredentials {
    pub api_key: String,
    pub publication_id: String,
}

/// Resolved configuration
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Content API base URL, trailing slashes stripped
    pub cms_url: String,
    /// Response reuse window in seconds
    pub revalidate_seconds: u64,
    /// Ordered collection candidates to probe for single records
    pub collections: Vec<String>,
    /// Ordered collection candidates to probe when listing
    pub list_collections: Vec<String>,
    /// Ordered slug-like field candidates
    pub slug_fields: Vec<String>,
    /// Extra allowed CORS origins (beyond the local-dev defaults)
    pub extra_origins: Vec<String>,
    /// Newsletter provider credentials, if configured
    pub beehiiv: Option<BeehiivCredentials>,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

impl ResolvedConfig {
    /// All allowed CORS origins: local-dev defaults plus configured extras.
    pub fn allowed_origins(&self) -> Vec<String> {
        DEFAULT_CORS_ORIGINS
            .iter()
            .map(|s| s.to_string())
            .chain(self.extra_origins.iter().cloned())
            .collect()
    }
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".contentgw").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Strip trailing slashes from a base URL
fn clean_base_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

/// Split a comma-separated list, trimming and dropping empty entries
fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// A configured candidate list, or the built-in default when absent or
/// empty
fn list_or_default(configured: Option<Vec<String>>, defaults: &[&str]) -> Vec<String> {
    configured
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| defaults.iter().map(|s| s.to_string()).collect())
}

/// Read newsletter provider credentials from the environment.
/// Both variables must be present; a partial configuration counts as none.
fn load_beehiiv_credentials() -> Option<BeehiivCredentials> {
    let api_key = std::env::var("BEEHIIV_API_KEY")
        .ok()
        .filter(|s| !s.is_empty())?;
    let publication_id = std::env::var("BEEHIIV_PUBLICATION_ID")
        .ok()
        .filter(|s| !s.is_empty())?;

    Some(BeehiivCredentials {
        api_key,
        publication_id,
    })
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let config_file = find_config_file();
    let file = match &config_file {
        Some(path) => Some(load_config_file(path)?),
        None => None,
    };
    let cms = file.as_ref().map(|f| f.cms.clone()).unwrap_or_default();
    let cors = file.as_ref().map(|f| f.cors.clone()).unwrap_or_default();

    // CMS_URL is preferred; STRAPI_URL kept for parity with older deploys
    let cms_url = std::env::var("CMS_URL")
        .or_else(|_| std::env::var("STRAPI_URL"))
        .ok()
        .or(cms.url)
        .unwrap_or_else(|| DEFAULT_CMS_URL.to_string());

    let revalidate_seconds = std::env::var("CMS_REVALIDATE_SECONDS")
        .ok()
        .and_then(|s| s.parse().ok())
        .or(cms.revalidate_seconds)
        .unwrap_or(DEFAULT_REVALIDATE_SECONDS);

    let collections = list_or_default(cms.collections, DEFAULT_COLLECTIONS);
    let list_collections = list_or_default(cms.list_collections, DEFAULT_LIST_COLLECTIONS);
    let slug_fields = list_or_default(cms.slug_fields, DEFAULT_SLUG_FIELDS);

    let extra_origins = std::env::var("CORS_ORIGINS")
        .ok()
        .map(|v| split_csv(&v))
        .or(cors.origins)
        .unwrap_or_default();

    Ok(ResolvedConfig {
        cms_url: clean_base_url(&cms_url),
        revalidate_seconds,
        collections,
        list_collections,
        slug_fields,
        extra_origins,
        beehiiv: load_beehiiv_credentials(),
        config_file,
    })
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Force reload configuration (useful for testing)
pub fn reload_config() -> Result<ResolvedConfig> {
    load_config()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_clean_base_url() {
        assert_eq!(clean_base_url("http://localhost:1337"), "http://localhost:1337");
        assert_eq!(clean_base_url("http://localhost:1337/"), "http://localhost:1337");
        assert_eq!(clean_base_url("https://cms.audhd.co///"), "https://cms.audhd.co");
    }

    #[test]
    fn test_split_csv() {
        assert_eq!(
            split_csv("https://a.example, https://b.example ,"),
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
        assert!(split_csv("").is_empty());
        assert!(split_csv(" , ,").is_empty());
    }

    #[test]
    fn test_config_file_parsing() {
        let temp = TempDir::new().unwrap();
        let cfg_dir = temp.path().join(".contentgw");
        std::fs::create_dir_all(&cfg_dir).unwrap();

        let config_path = cfg_dir.join("config.yaml");
        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(
            file,
            r#"
version: "1.0"
cms:
  url: https://cms.audhd.co/
  revalidate_seconds: 30
  collections:
    - adhd-guides
    - blog-posts
  list_collections:
    - main-page-guides
cors:
  origins:
    - https://audhd.co
"#
        )
        .unwrap();

        let config = load_config_file(&config_path).unwrap();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.cms.url, Some("https://cms.audhd.co/".to_string()));
        assert_eq!(config.cms.revalidate_seconds, Some(30));
        assert_eq!(
            config.cms.collections,
            Some(vec!["adhd-guides".to_string(), "blog-posts".to_string()])
        );
        assert_eq!(
            config.cms.list_collections,
            Some(vec!["main-page-guides".to_string()])
        );
        assert_eq!(config.cors.origins, Some(vec!["https://audhd.co".to_string()]));
        // slug fields not set in file; resolution falls back to defaults
        assert!(config.cms.slug_fields.is_none());
    }

    #[test]
    fn test_list_or_default() {
        assert_eq!(
            list_or_default(Some(vec!["guides".to_string()]), DEFAULT_COLLECTIONS),
            vec!["guides".to_string()]
        );
        // absent or empty both fall back
        assert_eq!(
            list_or_default(None, DEFAULT_SLUG_FIELDS),
            vec!["slug", "uid", "handle", "permalink"]
        );
        assert_eq!(
            list_or_default(Some(vec![]), DEFAULT_SLUG_FIELDS),
            vec!["slug", "uid", "handle", "permalink"]
        );
    }

    #[test]
    fn test_default_list_collections_cover_main_page_renames() {
        // Listing probes its own candidate set, separate from the
        // per-record collections
        let listed = list_or_default(None, DEFAULT_LIST_COLLECTIONS);
        assert_eq!(
            listed,
            vec!["mainPageGuides", "main-page-guides", "MainPageGuides"]
        );
        for name in &listed {
            assert!(!DEFAULT_COLLECTIONS.contains(&name.as_str()));
        }
    }

    #[test]
    fn test_allowed_origins_includes_defaults_and_extras() {
        let cfg = ResolvedConfig {
            cms_url: DEFAULT_CMS_URL.to_string(),
            revalidate_seconds: DEFAULT_REVALIDATE_SECONDS,
            collections: vec![],
            list_collections: vec![],
            slug_fields: vec![],
            extra_origins: vec!["https://audhd.co".to_string()],
            beehiiv: None,
            config_file: None,
        };

        let origins = cfg.allowed_origins();
        assert!(origins.contains(&"http://localhost:3000".to_string()));
        assert_eq!(origins.last(), Some(&"https://audhd.co".to_string()));
    }
}
