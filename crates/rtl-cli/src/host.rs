//! Filesystem host: a build output directory as an artifact table and units

use std::collections::HashSet;
use std::hash::Hasher;

use camino::{Utf8Path, Utf8PathBuf};
use eyre::{Result, WrapErr, eyre};
use ignore::WalkBuilder;
use rapidhash::fast::RapidHasher;
use rtl_pipeline::{
    ArtifactStore, AssetTable, BuildPlugin, Emit, PipelineError, PipelineReport, Source, Unit,
    UnitId,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

/// Manifest written when there is no input manifest.
pub const DEFAULT_MANIFEST_OUT: &str = "units.rtl.json";

/// One entry of a unit manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestUnit {
    pub id: ManifestId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub files: Vec<String>,
    #[serde(default)]
    pub runtime: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ManifestId {
    Index(u64),
    Named(String),
}

impl From<ManifestId> for UnitId {
    fn from(id: ManifestId) -> Self {
        match id {
            ManifestId::Index(index) => UnitId::Index(index),
            ManifestId::Named(name) => UnitId::Named(name),
        }
    }
}

impl From<&UnitId> for ManifestId {
    fn from(id: &UnitId) -> Self {
        match id {
            UnitId::Index(index) => ManifestId::Index(*index),
            UnitId::Named(name) => ManifestId::Named(name.clone()),
        }
    }
}

/// A build output directory, plus an optional unit manifest.
#[derive(Debug, Clone)]
pub struct BuildDir {
    root: Utf8PathBuf,
    manifest: Option<Utf8PathBuf>,
}

impl BuildDir {
    pub fn new(root: impl Into<Utf8PathBuf>, manifest: Option<Utf8PathBuf>) -> Self {
        Self {
            root: root.into(),
            manifest,
        }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Where the updated manifest goes: `<stem>.rtl.json` next to the input
    /// manifest, or `units.rtl.json` in the build directory.
    pub fn manifest_out(&self) -> Utf8PathBuf {
        match &self.manifest {
            Some(manifest) => {
                let stem = manifest.file_stem().unwrap_or("units");
                manifest.with_file_name(format!("{stem}.rtl.json"))
            }
            None => self.root.join(DEFAULT_MANIFEST_OUT),
        }
    }

    /// Read every text file under the root into a table keyed by relative path.
    pub fn load_assets(&self) -> Result<AssetTable> {
        let assets = AssetTable::new();
        let walker = WalkBuilder::new(&self.root)
            .standard_filters(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .build();

        for entry in walker {
            let entry = entry.wrap_err_with(|| format!("failed to walk {}", self.root))?;
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            let Some(path) = Utf8Path::from_path(entry.path()) else {
                warn!(path = %entry.path().display(), "skipping non UTF-8 path");
                continue;
            };
            let Some(name) = self.asset_name(path) else {
                continue;
            };
            let bytes = fs_err::read(path)?;
            match String::from_utf8(bytes) {
                Ok(text) => assets.insert(name, text),
                Err(_) => debug!(%name, "skipping binary file"),
            }
        }

        debug!(assets = assets.len(), root = %self.root, "loaded build output");
        Ok(assets)
    }

    /// `/`-separated path of `path` relative to the root.
    fn asset_name(&self, path: &Utf8Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let parts: Vec<&str> = relative.components().map(|c| c.as_str()).collect();
        (!parts.is_empty()).then(|| parts.join("/"))
    }

    /// Units from the manifest, or one unit per stylesheet.
    pub fn load_units(&self, assets: &AssetTable) -> Result<Vec<Unit>> {
        let entries = match &self.manifest {
            Some(path) => {
                let text = fs_err::read_to_string(path)?;
                serde_json::from_str::<Vec<ManifestUnit>>(&text)
                    .wrap_err_with(|| format!("invalid unit manifest {path}"))?
            }
            None => stylesheet_units(assets, &self.previous_outputs()),
        };

        let units = entries
            .into_iter()
            .map(|entry| {
                for file in &entry.files {
                    if !assets.has(file) {
                        warn!(unit = ?entry.id, %file, "manifest names a file that is not in the build");
                    }
                }
                let hash = unit_hash(assets, &entry.files);
                let mut unit = Unit::new(entry.id, hash)
                    .with_files(entry.files)
                    .with_runtime(entry.runtime);
                if let Some(name) = entry.name {
                    unit = unit.with_name(name);
                }
                unit
            })
            .collect();
        Ok(units)
    }

    /// RTL outputs recorded by the previous pass: every file of a written
    /// manifest entry after its source.
    fn previous_outputs(&self) -> HashSet<String> {
        let path = self.manifest_out();
        let Ok(text) = fs_err::read_to_string(&path) else {
            return HashSet::new();
        };
        match serde_json::from_str::<Vec<ManifestUnit>>(&text) {
            Ok(entries) => entries
                .into_iter()
                .flat_map(|entry| entry.files.into_iter().skip(1))
                .collect(),
            Err(error) => {
                warn!(%path, %error, "ignoring unreadable manifest from a previous pass");
                HashSet::new()
            }
        }
    }

    /// Let the plugin patch the loaders of runtime units.
    pub fn patch_runtime<P: BuildPlugin>(&self, plugin: &P, assets: &AssetTable, units: &[Unit]) {
        let loaders = units
            .iter()
            .filter(|unit| unit.runtime)
            .flat_map(|unit| unit.files.iter())
            .filter(|file| file.ends_with(".js"));
        for loader in loaders {
            let Some(source) = assets.text(loader) else {
                continue;
            };
            if let Some(patched) = plugin.runtime_template(&source) {
                debug!(%loader, "patched runtime loader");
                assets.set(loader, Source::from(patched));
            }
        }
    }

    /// Persist every asset written since the last call. Returns how many
    /// files actually changed on disk.
    pub fn write_back(&self, assets: &AssetTable) -> Result<usize> {
        let mut changed = 0;
        for name in assets.take_written() {
            let Some(text) = assets.text(&name) else {
                continue;
            };
            if write_if_changed(&self.root.join(&name), &text)? {
                changed += 1;
            }
        }
        Ok(changed)
    }

    pub fn write_manifest(&self, units: &[Unit]) -> Result<Utf8PathBuf> {
        let entries: Vec<ManifestUnit> = units
            .iter()
            .map(|unit| ManifestUnit {
                id: ManifestId::from(&unit.id),
                name: unit.name.clone(),
                files: unit.files.clone(),
                runtime: unit.runtime,
            })
            .collect();
        let mut json = serde_json::to_string_pretty(&entries)?;
        json.push('\n');
        let path = self.manifest_out();
        write_if_changed(&path, &json)?;
        Ok(path)
    }
}

/// Without a manifest: each stylesheet is a unit identified by its path and
/// named after its stem. RTL outputs, by the default suffix or as listed by
/// the previous pass, are not units.
fn stylesheet_units(assets: &AssetTable, outputs: &HashSet<String>) -> Vec<ManifestUnit> {
    assets
        .names()
        .into_iter()
        .filter(|name| {
            rtl_pipeline::unit::is_stylesheet(name)
                && !name.ends_with(".rtl.css")
                && !outputs.contains(name)
        })
        .map(|name| ManifestUnit {
            id: ManifestId::Named(name.clone()),
            name: Utf8Path::new(&name).file_stem().map(str::to_string),
            files: vec![name],
            runtime: false,
        })
        .collect()
}

/// Hash of a unit's member names and contents.
pub fn unit_hash(assets: &AssetTable, files: &[String]) -> String {
    let mut hasher = RapidHasher::default();
    for file in files {
        hasher.write(file.as_bytes());
        hasher.write_u64(assets.digest(file).unwrap_or_default());
    }
    format!("{:016x}", hasher.finish())
}

/// Write `contents` unless the file already holds exactly these bytes.
pub fn write_if_changed(path: &Utf8Path, contents: &str) -> Result<bool> {
    if let Ok(existing) = fs_err::read(path)
        && existing == contents.as_bytes()
    {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        fs_err::create_dir_all(parent)?;
    }
    fs_err::write(path, contents)?;
    debug!(%path, "wrote");
    Ok(true)
}

/// Load, emit, persist: one full pass over the directory.
///
/// Successful writes are persisted even when some assets failed.
pub async fn run_pass<P: BuildPlugin>(plugin: &mut P, dir: &BuildDir) -> Result<PipelineReport> {
    let assets = dir.load_assets()?;
    let mut units = dir.load_units(&assets)?;

    dir.patch_runtime(plugin, &assets, &units);
    let outcome = plugin.emit(Emit::new(&assets, &mut units)).await;

    let changed = dir.write_back(&assets)?;
    let manifest = dir.write_manifest(&units)?;
    info!(units = units.len(), changed, %manifest, "build output updated");

    match outcome {
        Ok(report) => Ok(report),
        Err(PipelineError::AssetsFailed(report)) => {
            for failure in &report.failures {
                error!("{failure}");
            }
            Err(eyre!("{} asset(s) failed", report.failures.len()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_out() {
        let dir = BuildDir::new("dist", Some("dist/meta/chunks.json".into()));
        assert_eq!(dir.manifest_out(), "dist/meta/chunks.rtl.json");
        let dir = BuildDir::new("dist", None);
        assert_eq!(dir.manifest_out(), "dist/units.rtl.json");
    }

    #[test]
    fn test_unit_hash_tracks_content() {
        let assets = AssetTable::new();
        assets.insert("a.css", "a{}");
        let files = vec!["a.css".to_string()];
        let before = unit_hash(&assets, &files);
        assert_eq!(before, unit_hash(&assets, &files));

        assets.set("a.css", Source::from("a{color:red}"));
        assert_ne!(before, unit_hash(&assets, &files));
    }

    #[test]
    fn test_stylesheet_units_skip_outputs() {
        let assets = AssetTable::new();
        for name in ["a.css", "a.rtl.css", "a-rtl.css", "b.css", "x.js"] {
            assets.insert(name, "");
        }
        let outputs = HashSet::from(["a-rtl.css".to_string()]);
        let units = stylesheet_units(&assets, &outputs);

        let ids: Vec<_> = units.iter().map(|unit| unit.id.clone()).collect();
        assert_eq!(
            ids,
            [
                ManifestId::Named("a.css".to_string()),
                ManifestId::Named("b.css".to_string())
            ]
        );
        assert_eq!(units[1].name.as_deref(), Some("b"));
    }

    #[test]
    fn test_manifest_ids() {
        let units: Vec<ManifestUnit> =
            serde_json::from_str(r#"[{ "id": 3, "files": [] }, { "id": "main", "name": "Main", "files": ["a.css"], "runtime": true }]"#)
                .unwrap();
        assert_eq!(UnitId::from(units[0].id.clone()), UnitId::Index(3));
        assert_eq!(UnitId::from(units[1].id.clone()), UnitId::from("main"));
        assert!(units[1].runtime && !units[0].runtime);
    }
}
