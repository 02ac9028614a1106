// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The `Assets.toml` build manifest.

use crate::builder::{AssetFilter, DependencyTable};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Default manifest file name, looked up in the working directory.
pub const MANIFEST_FILE: &str = "Assets.toml";

/// A directory to scan and the file pattern to match inside it.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SourceDirectory {
    /// Directory relative to the project root.
    pub path: PathBuf,
    /// Glob matched against file names, e.g. `*.prefab`.
    pub pattern: String,
}

impl SourceDirectory {
    /// Creates a source entry.
    pub fn new(path: impl Into<PathBuf>, pattern: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            pattern: pattern.into(),
        }
    }
}

/// Represents the structure of the `Assets.toml` manifest file.
///
/// Every field is optional; missing ones take the defaults below.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct AssetManifest {
    /// Root that source paths and scan directories are relative to.
    pub project_root: PathBuf,
    /// Directories scanned for root assets.
    pub sources: Vec<SourceDirectory>,
    /// Directory the dependency maps are written to.
    pub map_dir: PathBuf,
    /// File name of the binary map. The text map uses the same stem.
    pub map_name: String,
    /// Directory packs are written to, one subdirectory per platform.
    pub output_dir: PathBuf,
    /// Exclusion policy.
    pub filter: AssetFilter,
    /// Direct dependency edges: asset path to the assets it references.
    pub dependencies: BTreeMap<String, Vec<String>>,
}

impl Default for AssetManifest {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
            sources: vec![
                SourceDirectory::new("Assets/L10N", "*.txt"),
                SourceDirectory::new("Assets/Res/Prefabs", "*.prefab"),
            ],
            map_dir: PathBuf::from("DependenciesMap"),
            map_name: "dependenciesMap.ab".to_string(),
            output_dir: PathBuf::from("AssetBundles"),
            filter: AssetFilter::default(),
            dependencies: BTreeMap::new(),
        }
    }
}

impl AssetManifest {
    /// Parses a manifest from TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse asset manifest")
    }

    /// Loads the manifest at `path`, or the defaults if the file does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::info!("No '{}' found, using the default configuration", path.display());
            return Ok(Self::default());
        }
        log::info!("Loading asset manifest from '{}'", path.display());
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest file at '{}'", path.display()))?;
        toml::from_str(&text)
            .with_context(|| format!("Failed to parse TOML from '{}'", path.display()))
    }

    /// The dependency source described by this manifest. Files found below
    /// the project root are known leaves.
    pub fn dependency_table(&self) -> DependencyTable {
        self.dependencies.iter().fold(
            DependencyTable::new().with_project_root(&self.project_root),
            |table, (asset, dependencies)| table.with(asset.clone(), dependencies.iter().cloned()),
        )
    }

    /// Path of the binary dependency map.
    pub fn map_path(&self) -> PathBuf {
        self.project_root.join(&self.map_dir).join(&self.map_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::DependencySource;

    #[test]
    fn partial_manifest_keeps_defaults() {
        let manifest = AssetManifest::from_toml(
            r#"
            output_dir = "Build/Bundles"

            [[sources]]
            path = "Assets/Res/UI"
            pattern = "*.prefab"

            [filter]
            excluded_suffixes = [".cs"]

            [dependencies]
            "Assets/Res/UI/Main.prefab" = ["Assets/Res/Common/Button.prefab"]
            "#,
        )
        .unwrap();

        assert_eq!(manifest.output_dir, PathBuf::from("Build/Bundles"));
        assert_eq!(manifest.sources, [SourceDirectory::new("Assets/Res/UI", "*.prefab")]);
        assert_eq!(manifest.map_name, "dependenciesMap.ab");
        assert_eq!(manifest.filter.excluded_suffixes, [".cs"]);
        assert_eq!(manifest.filter.excluded_prefixes, ["Assets/Plugins"]);

        let table = manifest.dependency_table();
        assert_eq!(
            table.direct_dependencies("Assets/Res/UI/Main.prefab"),
            Some(vec!["Assets/Res/Common/Button.prefab".to_string()])
        );
    }

    #[test]
    fn missing_manifest_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = AssetManifest::load(dir.path().join(MANIFEST_FILE)).unwrap();
        assert_eq!(manifest, AssetManifest::default());
        assert_eq!(
            manifest.map_path(),
            PathBuf::from("./DependenciesMap/dependenciesMap.ab")
        );
    }
}
