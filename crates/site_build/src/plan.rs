use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::{config::SiteSettings, error::BuildError};

/// Computed output layout for one entry point. Each bundle loads
/// independently; bundles share only the assets subdirectory.
#[derive(Debug, Clone, Serialize)]
pub struct BundlePlan {
    pub name: String,
    pub source_html: PathBuf,
    /// Directory whose sibling files travel with the entry HTML.
    pub source_dir: PathBuf,
    pub output_dir: PathBuf,
    pub output_html: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildPlan {
    pub base: String,
    pub out_dir: PathBuf,
    pub assets_out: PathBuf,
    pub assets_src: Option<PathBuf>,
    pub empty_out_dir: bool,
    pub bundles: Vec<BundlePlan>,
}

impl BuildPlan {
    /// Pure planning step; nothing is written until
    /// [`assemble`](crate::assemble::assemble).
    pub fn from_settings(settings: &SiteSettings) -> Result<Self, BuildError> {
        settings.validate()?;

        let mut bundles = Vec::with_capacity(settings.entries.len());
        for (name, html) in &settings.entries {
            let source_dir = html
                .parent()
                .filter(|parent| !parent.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."))
                .to_path_buf();
            if source_dir == settings.out_dir {
                return Err(BuildError::OutputOverlapsSource {
                    name: name.clone(),
                    out_dir: settings.out_dir.clone(),
                });
            }

            let output_dir = settings.out_dir.join(name);
            bundles.push(BundlePlan {
                name: name.clone(),
                source_html: html.clone(),
                source_dir,
                output_html: output_dir.join("index.html"),
                output_dir,
            });
        }

        Ok(Self {
            base: settings.base.clone(),
            out_dir: settings.out_dir.clone(),
            assets_out: settings.out_dir.join(&settings.assets_dir),
            assets_src: settings.assets_src.clone(),
            empty_out_dir: settings.empty_out_dir,
            bundles,
        })
    }
}
