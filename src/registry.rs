use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::error::ConfigError;
use crate::fetcher::{build_client, JikiuFetcher, PageFetcher};
use crate::parser::{Extractor, JikiuExtractor};
use crate::settings::Settings;

pub const JIKIU: &str = "jikiu";

/// Fetch + extract capability for one brand.
#[derive(Clone)]
pub struct Source {
    pub fetcher: Arc<dyn PageFetcher>,
    pub extractor: Arc<dyn Extractor>,
}

/// Supported brands, keyed by lower-case brand identifier.
#[derive(Clone, Default)]
pub struct Registry {
    sources: HashMap<String, Source>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every brand this build knows how to scrape.
    pub fn with_defaults(settings: &Settings) -> Result<Self, ConfigError> {
        let client = build_client(Duration::from_secs(settings.timeout_secs))?;
        let mut registry = Self::new();
        registry.register(
            JIKIU,
            Source {
                fetcher: Arc::new(JikiuFetcher::new(client, &settings.jikiu_base_url)?),
                extractor: Arc::new(JikiuExtractor),
            },
        );
        Ok(registry)
    }

    pub fn register(&mut self, brand: &str, source: Source) {
        self.sources.insert(brand.to_lowercase(), source);
    }

    pub fn resolve(&self, brand: &str) -> Result<&Source, ConfigError> {
        self.sources
            .get(&brand.to_lowercase())
            .ok_or_else(|| ConfigError::UnsupportedBrand(brand.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Overrides;

    fn registry() -> Registry {
        Registry::with_defaults(&Settings::load(Overrides::default()).unwrap()).unwrap()
    }

    #[test]
    fn jikiu_resolves_case_insensitively() {
        let r = registry();
        assert!(r.resolve("jikiu").is_ok());
        assert!(r.resolve("JIKIU").is_ok());
    }

    #[test]
    fn unknown_brand_is_config_error() {
        let r = registry();
        match r.resolve("Bosch") {
            Err(ConfigError::UnsupportedBrand(b)) => assert_eq!(b, "Bosch"),
            _ => panic!("expected UnsupportedBrand"),
        }
    }
}
