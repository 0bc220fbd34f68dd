use std::path::PathBuf;

use serde::Deserialize;

use crate::error::ConfigError;

pub const BRAND_PLACEHOLDER: &str = "%%brand%%";
pub const ENV_PREFIX: &str = "CATALOGUE";

/// Immutable run settings. Built once in `main` and handed to the driver.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub input: PathBuf,
    /// Image directory template; `%%brand%%` is replaced per brand.
    pub image_dir: String,
    pub out_dir: PathBuf,
    pub errors_path: PathBuf,
    pub concurrency: usize,
    pub timeout_secs: u64,
    pub jikiu_base_url: String,
}

/// Values given explicitly on the command line. `None` falls through to the
/// environment, then to the defaults.
#[derive(Debug, Default)]
pub struct Overrides {
    pub input: Option<String>,
    pub image_dir: Option<String>,
    pub out_dir: Option<String>,
    pub errors_path: Option<String>,
    pub concurrency: Option<u64>,
    pub timeout_secs: Option<u64>,
}

impl Settings {
    pub fn load(overrides: Overrides) -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .set_default("input", "all.csv")?
            .set_default("image_dir", "out/%%brand%%/img")?
            .set_default("out_dir", "out")?
            .set_default("errors_path", "errors.csv")?
            .set_default("concurrency", 8i64)?
            .set_default("timeout_secs", 30i64)?
            .set_default("jikiu_base_url", "https://www.jikiu.com")?
            .add_source(config::Environment::with_prefix(ENV_PREFIX))
            .set_override_option("input", overrides.input)?
            .set_override_option("image_dir", overrides.image_dir)?
            .set_override_option("out_dir", overrides.out_dir)?
            .set_override_option("errors_path", overrides.errors_path)?
            .set_override_option("concurrency", overrides.concurrency)?
            .set_override_option("timeout_secs", overrides.timeout_secs)?
            .build()?;

        let mut settings: Settings = settings.try_deserialize()?;
        settings.concurrency = settings.concurrency.max(1);
        Ok(settings)
    }

    /// `{out_dir}/{brand}` — where a brand's CSV tables live.
    pub fn brand_dir(&self, brand: &str) -> PathBuf {
        self.out_dir.join(brand)
    }

    pub fn image_dir_for(&self, brand: &str) -> PathBuf {
        PathBuf::from(self.image_dir.replace(BRAND_PLACEHOLDER, brand))
    }

    /// Settings rooted under a scratch directory.
    #[cfg(test)]
    pub fn rooted(root: &std::path::Path, input: PathBuf, base_url: &str) -> Self {
        let out_dir = root.join("out");
        Settings {
            input,
            image_dir: out_dir.join(BRAND_PLACEHOLDER).join("img").to_string_lossy().into_owned(),
            out_dir,
            errors_path: root.join("errors.csv"),
            concurrency: 4,
            timeout_secs: 5,
            jikiu_base_url: base_url.to_string(),
        }
    }
}
