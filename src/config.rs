use serde::{de::Visitor, Deserialize};
use std::{
    net::SocketAddr,
    num::{NonZeroU32, NonZeroUsize},
    ops::Deref,
    path::{Path, PathBuf},
    time::Duration,
};
use url::Url;

use crate::date::Locale;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration")]
    Parse(#[from] toml::de::Error),
}

#[derive(Deserialize, Debug)]
pub struct PrismicConfig {
    pub endpoint: Url,
    pub access_token: Option<String>,
    #[serde(default = "default_document_type")]
    pub document_type: String,
    /// Posts per listing page.
    #[serde(default = "default_page_size")]
    pub page_size: NonZeroU32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Deserialize, Debug)]
pub struct NetConfig {
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,
    #[serde(default)]
    pub base_path: String,
    pub static_dir: Option<ValidPath>,
}

#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FallbackMode {
    /// Serve a loading page while the post is generated in the background.
    #[default]
    Placeholder,
    /// Hold the request until the post is generated.
    Blocking,
}

#[derive(Deserialize, Debug)]
pub struct SiteConfig {
    #[serde(default = "default_site_name")]
    pub name: String,
    #[serde(default)]
    pub locale: Locale,
    #[serde(default = "default_words_per_minute")]
    pub words_per_minute: NonZeroU32,
    #[serde(default = "default_revalidate_secs")]
    pub revalidate_secs: u64,
    #[serde(default)]
    pub fallback: FallbackMode,
    #[serde(default = "default_max_listing_pages")]
    pub max_listing_pages: NonZeroU32,
    #[serde(default = "default_prerender_page_size")]
    pub prerender_page_size: NonZeroU32,
    #[serde(default = "default_prerender_concurrency")]
    pub prerender_concurrency: usize,
    /// Generated pages kept in memory; the oldest are dropped past this.
    #[serde(default = "default_max_cached_pages")]
    pub max_cached_pages: NonZeroUsize,
}

#[derive(Deserialize, Debug)]
pub struct Config {
    pub prismic: PrismicConfig,
    #[serde(default)]
    pub net: NetConfig,
    #[serde(default)]
    pub site: SiteConfig,
}

fn default_document_type() -> String {
    "posts".into()
}

fn default_page_size() -> NonZeroU32 {
    NonZeroU32::MIN
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3000))
}

fn default_site_name() -> String {
    "spacetraveling".into()
}

fn default_words_per_minute() -> NonZeroU32 {
    NonZeroU32::new(150).unwrap_or(NonZeroU32::MIN)
}

fn default_revalidate_secs() -> u64 {
    30 * 60
}

fn default_max_listing_pages() -> NonZeroU32 {
    NonZeroU32::new(50).unwrap_or(NonZeroU32::MIN)
}

fn default_prerender_page_size() -> NonZeroU32 {
    NonZeroU32::new(20).unwrap_or(NonZeroU32::MIN)
}

fn default_prerender_concurrency() -> usize {
    4
}

fn default_max_cached_pages() -> NonZeroUsize {
    NonZeroUsize::new(1000).unwrap_or(NonZeroUsize::MIN)
}

impl Default for NetConfig {
    fn default() -> Self {
        NetConfig {
            bind: default_bind(),
            base_path: String::new(),
            static_dir: None,
        }
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        SiteConfig {
            name: default_site_name(),
            locale: Locale::default(),
            words_per_minute: default_words_per_minute(),
            revalidate_secs: default_revalidate_secs(),
            fallback: FallbackMode::default(),
            max_listing_pages: default_max_listing_pages(),
            prerender_page_size: default_prerender_page_size(),
            prerender_concurrency: default_prerender_concurrency(),
            max_cached_pages: default_max_cached_pages(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&raw)?)
    }
}

impl PrismicConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl NetConfig {
    /// `base_path` without a trailing slash; empty when serving from the root.
    pub fn base_path(&self) -> String {
        let trimmed = self.base_path.trim_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{trimmed}")
        }
    }
}

impl SiteConfig {
    pub fn revalidate(&self) -> Duration {
        Duration::from_secs(self.revalidate_secs)
    }
}

#[derive(Debug)]
pub struct ValidPath(PathBuf);

impl<'de> Deserialize<'de> for ValidPath {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct ValidPathVisitor;
        impl Visitor<'_> for ValidPathVisitor {
            type Value = ValidPath;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(formatter, "a valid path")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(ValidPath(
                    PathBuf::from(v).canonicalize().map_err(E::custom)?,
                ))
            }
        }

        deserializer.deserialize_str(ValidPathVisitor)
    }
}

impl Deref for ValidPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        self.0.as_path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [prismic]
            endpoint = "https://spacetraveling.cdn.prismic.io/api/v2"
            "#,
        )
        .unwrap();

        assert_eq!(config.prismic.document_type, "posts");
        assert_eq!(config.prismic.page_size.get(), 1);
        assert_eq!(config.prismic.access_token, None);
        assert_eq!(config.net.bind, "127.0.0.1:3000".parse().unwrap());
        assert_eq!(config.net.base_path(), "");
        assert_eq!(config.site.words_per_minute.get(), 150);
        assert_eq!(config.site.locale, Locale::PtBr);
        assert_eq!(config.site.fallback, FallbackMode::Placeholder);
        assert_eq!(config.site.revalidate(), Duration::from_secs(1800));
        assert_eq!(config.site.max_cached_pages.get(), 1000);
    }

    #[test]
    fn full_config() {
        let config: Config = toml::from_str(
            r#"
            [prismic]
            endpoint = "https://repo.cdn.prismic.io/api/v2"
            access_token = "token"
            document_type = "articles"
            page_size = 5
            timeout_secs = 3

            [net]
            bind = "0.0.0.0:8080"
            base_path = "/blog/"
            static_dir = "."

            [site]
            name = "space"
            locale = "en-US"
            words_per_minute = 200
            revalidate_secs = 60
            fallback = "blocking"
            max_listing_pages = 10
            max_cached_pages = 64
            "#,
        )
        .unwrap();

        assert_eq!(config.prismic.access_token.as_deref(), Some("token"));
        assert_eq!(config.prismic.page_size.get(), 5);
        assert_eq!(config.prismic.timeout(), Duration::from_secs(3));
        assert_eq!(config.net.base_path(), "/blog");
        assert!(config.net.static_dir.unwrap().is_absolute());
        assert_eq!(config.site.locale, Locale::EnUs);
        assert_eq!(config.site.fallback, FallbackMode::Blocking);
        assert_eq!(config.site.max_listing_pages.get(), 10);
        assert_eq!(config.site.max_cached_pages.get(), 64);
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let result: Result<Config, _> = toml::from_str(
            r#"
            [prismic]
            endpoint = "https://repo.cdn.prismic.io/api/v2"
            page_size = 0
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn missing_static_dir_is_rejected() {
        let result: Result<Config, _> = toml::from_str(
            r#"
            [prismic]
            endpoint = "https://repo.cdn.prismic.io/api/v2"

            [net]
            static_dir = "/definitely/not/here"
            "#,
        );
        assert!(result.is_err());
    }
}
