use std::{
    collections::BTreeMap,
    env, fs, io,
    path::{Component, Path, PathBuf},
};

use serde::Deserialize;

use crate::error::BuildError;

/// Declarative description of the site: named HTML entry points and the
/// static output layout they assemble into.
#[derive(Debug, Clone)]
pub struct SiteSettings {
    /// Base path prefix the output is hosted under. Relative (`"./"`) keeps
    /// the output servable from any sub-path.
    pub base: String,
    pub out_dir: PathBuf,
    /// Shared-assets subdirectory name under `out_dir`.
    pub assets_dir: String,
    /// Clear `out_dir` before assembling.
    pub empty_out_dir: bool,
    /// Optional source directory copied under the shared assets
    /// subdirectory.
    pub assets_src: Option<PathBuf>,
    /// Entry name -> source HTML document.
    pub entries: BTreeMap<String, PathBuf>,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            base: "./".into(),
            out_dir: "docs".into(),
            assets_dir: "assets".into(),
            empty_out_dir: true,
            assets_src: None,
            entries: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    base: Option<String>,
    out_dir: Option<PathBuf>,
    assets_dir: Option<String>,
    empty_out_dir: Option<bool>,
    assets_src: Option<PathBuf>,
    #[serde(default)]
    entries: BTreeMap<String, PathBuf>,
}

/// Layer settings from defaults, then the TOML file at `path` (skipped when
/// missing), then environment overrides.
pub fn load_settings(path: &Path) -> Result<SiteSettings, BuildError> {
    let mut settings = SiteSettings::default();

    match fs::read_to_string(path) {
        Ok(raw) => {
            let file_cfg: SettingsFile =
                toml::from_str(&raw).map_err(|source| BuildError::Config {
                    path: path.to_path_buf(),
                    source,
                })?;
            apply_file(&mut settings, file_cfg);
        }
        Err(error) if error.kind() == io::ErrorKind::NotFound => {}
        Err(source) => return Err(BuildError::io(path, source)),
    }

    if let Ok(v) = env::var("SCROLLY_BASE") {
        settings.base = v;
    }
    if let Ok(v) = env::var("SCROLLY_OUT_DIR") {
        settings.out_dir = PathBuf::from(v);
    }
    if let Ok(v) = env::var("SCROLLY_ASSETS_DIR") {
        settings.assets_dir = v;
    }
    if let Ok(v) = env::var("SCROLLY_EMPTY_OUT_DIR") {
        if let Ok(parsed) = v.parse::<bool>() {
            settings.empty_out_dir = parsed;
        }
    }

    Ok(settings)
}

fn apply_file(settings: &mut SiteSettings, file_cfg: SettingsFile) {
    if let Some(v) = file_cfg.base {
        settings.base = v;
    }
    if let Some(v) = file_cfg.out_dir {
        settings.out_dir = v;
    }
    if let Some(v) = file_cfg.assets_dir {
        settings.assets_dir = v;
    }
    if let Some(v) = file_cfg.empty_out_dir {
        settings.empty_out_dir = v;
    }
    if let Some(v) = file_cfg.assets_src {
        settings.assets_src = Some(v);
    }
    settings.entries.extend(file_cfg.entries);
}

impl SiteSettings {
    pub fn validate(&self) -> Result<(), BuildError> {
        if self.entries.is_empty() {
            return Err(BuildError::NoEntryPoints);
        }
        if !is_single_normal_component(&self.assets_dir) {
            return Err(BuildError::InvalidAssetsDir {
                dir: self.assets_dir.clone(),
            });
        }
        for (name, html) in &self.entries {
            if !is_valid_entry_name(name) {
                return Err(BuildError::InvalidEntryName { name: name.clone() });
            }
            if html.extension().and_then(|ext| ext.to_str()) != Some("html") {
                return Err(BuildError::EntryNotHtml {
                    name: name.clone(),
                    path: html.clone(),
                });
            }
            if !html.is_file() {
                return Err(BuildError::EntryHtmlMissing {
                    name: name.clone(),
                    path: html.clone(),
                });
            }
        }
        Ok(())
    }
}

fn is_valid_entry_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn is_single_normal_component(dir: &str) -> bool {
    let mut components = Path::new(dir).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
