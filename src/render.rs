use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde_json::Value;
use tracing::{debug, info};

/// An evaluated configuration: a map of output filenames to the Terraform
/// JSON documents they will contain. This is the boundary contract with the
/// template-evaluation engine; the engine itself lives outside this tool.
#[derive(Debug, Clone, Default)]
pub struct RenderedConfig {
    files: BTreeMap<String, Value>,
}

impl RenderedConfig {
    /// Load an evaluated configuration document: a single JSON object whose
    /// keys are output filenames.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            bail!("{} does not exist", path.display());
        }

        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let document: Value = serde_json::from_str(&raw)
            .with_context(|| format!("Error parsing configuration file {}", path.display()))?;

        let Value::Object(entries) = document else {
            bail!(
                "{} must contain a JSON object mapping filenames to documents",
                path.display()
            );
        };

        Ok(Self {
            files: entries.into_iter().collect(),
        })
    }

    /// Add or replace one output document
    pub fn insert(&mut self, filename: &str, document: Value) {
        self.files.insert(filename.to_string(), document);
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn filenames(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }
}

/// Writes rendered documents into the directory Terraform will run in
#[derive(Debug, Clone)]
pub struct Renderer {
    render_path: PathBuf,
    clean_before_render: bool,
}

impl Renderer {
    pub fn new(render_path: &Path, clean_before_render: bool) -> Self {
        Self {
            render_path: render_path.to_path_buf(),
            clean_before_render,
        }
    }

    pub fn render_path(&self) -> &Path {
        &self.render_path
    }

    /// Write every document, creating the render directory and (optionally)
    /// removing stale generated files first. Returns the written paths.
    pub fn write(&self, config: &RenderedConfig) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(&self.render_path).with_context(|| {
            format!(
                "Render path {} could not be created",
                self.render_path.display()
            )
        })?;

        if self.clean_before_render {
            self.remove_stale_files()
                .context("Failed to remove generated files from the render path")?;
        }

        let mut written = Vec::with_capacity(config.files.len());

        for (filename, document) in &config.files {
            let output_path = self.render_path.join(filename);
            let pretty = serde_json::to_string_pretty(document)
                .with_context(|| format!("Failed to serialize {filename}"))?;

            std::fs::write(&output_path, pretty)
                .with_context(|| format!("Failed to write {}", output_path.display()))?;

            info!("  {}", output_path.display());
            written.push(output_path);
        }

        Ok(written)
    }

    /// Only files this tool generates are removed; anything else in the
    /// render directory is left alone.
    fn remove_stale_files(&self) -> Result<()> {
        for entry in std::fs::read_dir(&self.render_path)? {
            let entry = entry?;
            let name = entry.file_name();

            if name.to_string_lossy().ends_with(".tf.json") {
                debug!("Removing stale {}", entry.path().display());
                std::fs::remove_file(entry.path())?;
            }
        }

        Ok(())
    }
}
