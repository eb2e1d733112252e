use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::{
    error::BuildError,
    plan::{BuildPlan, BundlePlan},
};

#[derive(Debug, Clone, Serialize)]
pub struct BundleReport {
    pub name: String,
    /// Paths relative to the output directory.
    pub files_written: Vec<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    pub out_dir: PathBuf,
    pub bundles: Vec<BundleReport>,
    pub asset_files: usize,
}

#[derive(Debug, Serialize)]
struct Manifest<'a> {
    base: &'a str,
    generated_at: DateTime<Utc>,
    bundles: &'a [BundleReport],
}

/// Execute a [`BuildPlan`]: one independently loadable bundle directory per
/// entry, shared assets under the assets subdirectory, and a
/// `manifest.json` describing what was written.
pub fn assemble(plan: &BuildPlan) -> Result<BuildReport, BuildError> {
    if plan.empty_out_dir && plan.out_dir.exists() {
        remove_dir_contents(&plan.out_dir)?;
    }
    fs::create_dir_all(&plan.out_dir).map_err(|e| BuildError::io(&plan.out_dir, e))?;

    let mut bundles = Vec::with_capacity(plan.bundles.len());
    for bundle in &plan.bundles {
        bundles.push(assemble_bundle(plan, bundle)?);
    }

    let mut asset_files = 0;
    if let Some(assets_src) = &plan.assets_src {
        fs::create_dir_all(&plan.assets_out).map_err(|e| BuildError::io(&plan.assets_out, e))?;
        asset_files = copy_tree(assets_src, &plan.assets_out, None)?.len();
    }

    write_manifest(plan, &bundles)?;
    info!(
        out_dir = %plan.out_dir.display(),
        bundles = bundles.len(),
        asset_files,
        "site assembled"
    );

    Ok(BuildReport {
        out_dir: plan.out_dir.clone(),
        bundles,
        asset_files,
    })
}

fn assemble_bundle(plan: &BuildPlan, bundle: &BundlePlan) -> Result<BundleReport, BuildError> {
    fs::create_dir_all(&bundle.output_dir).map_err(|e| BuildError::io(&bundle.output_dir, e))?;
    fs::copy(&bundle.source_html, &bundle.output_html)
        .map_err(|e| BuildError::io(&bundle.source_html, e))?;

    let siblings = copy_tree(
        &bundle.source_dir,
        &bundle.output_dir,
        Some(&bundle.source_html),
    )?;

    let mut files_written = vec![relative_to(&bundle.output_html, &plan.out_dir)];
    files_written.extend(siblings.iter().map(|path| relative_to(path, &plan.out_dir)));

    Ok(BundleReport {
        name: bundle.name.clone(),
        files_written,
    })
}

fn write_manifest(plan: &BuildPlan, bundles: &[BundleReport]) -> Result<(), BuildError> {
    let manifest = Manifest {
        base: &plan.base,
        generated_at: Utc::now(),
        bundles,
    };
    let path = plan.out_dir.join("manifest.json");
    let body =
        serde_json::to_string_pretty(&manifest).map_err(|e| BuildError::io(&path, e.into()))?;
    fs::write(&path, body).map_err(|e| BuildError::io(&path, e))?;
    Ok(())
}

/// Copy `src` into `dst` recursively, skipping `skip_file`. Returns the
/// destination path of every file copied.
fn copy_tree(src: &Path, dst: &Path, skip_file: Option<&Path>) -> Result<Vec<PathBuf>, BuildError> {
    let mut copied = Vec::new();
    let entries = fs::read_dir(src).map_err(|e| BuildError::io(src, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| BuildError::io(src, e))?;
        let from = entry.path();
        if Some(from.as_path()) == skip_file {
            continue;
        }
        let to = dst.join(entry.file_name());
        let file_type = entry.file_type().map_err(|e| BuildError::io(&from, e))?;
        if file_type.is_dir() {
            fs::create_dir_all(&to).map_err(|e| BuildError::io(&to, e))?;
            copied.extend(copy_tree(&from, &to, skip_file)?);
        } else {
            fs::copy(&from, &to).map_err(|e| BuildError::io(&from, e))?;
            copied.push(to);
        }
    }
    Ok(copied)
}

fn remove_dir_contents(dir: &Path) -> Result<(), BuildError> {
    let entries = fs::read_dir(dir).map_err(|e| BuildError::io(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| BuildError::io(dir, e))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| BuildError::io(&path, e))?;
        if file_type.is_dir() {
            fs::remove_dir_all(&path).map_err(|e| BuildError::io(&path, e))?;
        } else {
            fs::remove_file(&path).map_err(|e| BuildError::io(&path, e))?;
        }
    }
    Ok(())
}

fn relative_to(path: &Path, root: &Path) -> PathBuf {
    path.strip_prefix(root).unwrap_or(path).to_path_buf()
}
