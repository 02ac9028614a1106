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

//! The dependency map: the persisted contract between the build step and
//! the runtime loader.
//!
//! A [`DependencyMap`] is produced from a [`GraphBuilder`] and its closures.
//! It assigns every package an index, records package-to-package edges as
//! index lists and maps every member asset's name hash to its package
//! index. [`DependencyMap::encode`] writes the binary form; [`decode`] reads
//! it back as a [`ResolvedGraph`] for the runtime. The text form written by
//! [`DependencyMap::encode_text`] is for humans and diff tools only.

mod binary;
mod text;

pub use binary::decode;

use crate::builder::{ClosureMap, DependencySource, GraphBuilder};
use arca_core::asset::naming;
use arca_core::vfs::{PackageNode, ResolvedGraph};
use indexmap::IndexMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while reading or writing a dependency map.
#[derive(Debug, Error)]
pub enum MapError {
    /// The bytes are not a well-formed map.
    #[error("corrupt dependency map at byte {offset}: {reason}")]
    Corrupt {
        /// Offset at which decoding stopped.
        offset: usize,
        /// What was wrong.
        reason: String,
    },
    /// The map file does not exist.
    #[error("dependency map not found: {0}")]
    NotFound(PathBuf),
    /// A count does not fit the format's 32-bit fields.
    #[error("{what} count {count} does not fit in the map format")]
    Overflow {
        /// Which count overflowed.
        what: &'static str,
        /// The offending value.
        count: usize,
    },
    /// Any other I/O failure.
    #[error("dependency map I/O error: {0}")]
    Io(#[from] io::Error),
}

/// One row of the asset lookup table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRow {
    /// Source path of the asset.
    pub asset_path: String,
    /// Lookup hash of the asset's logical name.
    pub name_hash: i32,
    /// Path of the owning package.
    pub package_path: String,
    /// Index of the owning package.
    pub package_index: i32,
}

/// Packages with index-based edges plus the asset lookup table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyMap {
    packages: Vec<PackageNode>,
    assets: Vec<AssetRow>,
}

impl DependencyMap {
    /// Assigns package indices and turns asset closures into package edges.
    ///
    /// Indices follow first discovery while walking `closures`. Packages that
    /// only show up as dependency targets come next, then any remaining
    /// builder packages (the ones left out of the closure pass), so every
    /// index written to the map refers to an existing entry. A package's
    /// edges are the union of its members' closures and include the package
    /// itself when a member is in its own closure.
    pub fn resolve<D: DependencySource>(builder: &GraphBuilder<D>, closures: &ClosureMap) -> Self {
        let mut edges: IndexMap<String, Vec<String>> = IndexMap::new();
        for (asset_path, closure) in closures {
            let Some(owner) = naming::package_path(asset_path) else {
                log::warn!("'{}' has no package, its closure is dropped", asset_path);
                continue;
            };
            let targets = edges.entry(owner).or_default();
            for dependency in closure {
                match naming::package_path(dependency) {
                    Some(target) if !targets.contains(&target) => targets.push(target),
                    Some(_) => {}
                    None => log::warn!("Dependency '{}' has no package, edge dropped", dependency),
                }
            }
        }

        let targets: Vec<String> = edges.values().flatten().cloned().collect();
        for target in targets {
            edges.entry(target).or_default();
        }
        for package in builder.packages() {
            edges.entry(package.package_path.clone()).or_default();
        }

        let packages: Vec<PackageNode> = edges
            .iter()
            .map(|(package_path, targets)| {
                let mut node = builder
                    .package(package_path)
                    .cloned()
                    .unwrap_or_else(|| PackageNode::new(package_path.clone()));
                node.dependency_indices = targets
                    .iter()
                    .filter_map(|target| edges.get_index_of(target))
                    .map(|index| index as i32)
                    .collect();
                node
            })
            .collect();

        let mut assets = Vec::new();
        for (position, package) in packages.iter().enumerate() {
            for member in &package.members {
                assets.push(AssetRow {
                    asset_path: member.asset_path.clone(),
                    name_hash: member.name_hash,
                    package_path: package.package_path.clone(),
                    package_index: position as i32,
                });
            }
        }

        log::info!(
            "Dependency map resolved: {} packages, {} assets",
            packages.len(),
            assets.len()
        );
        Self { packages, assets }
    }

    /// Packages in index order, with their dependency indices.
    pub fn packages(&self) -> &[PackageNode] {
        &self.packages
    }

    /// The asset lookup table.
    pub fn assets(&self) -> &[AssetRow] {
        &self.assets
    }

    /// The runtime view of this map, as [`decode`] would return it.
    pub fn to_graph(&self) -> ResolvedGraph {
        let packages = self
            .packages
            .iter()
            .map(|package| {
                let mut node = PackageNode::new(package.package_path.clone());
                node.dependency_indices = package.dependency_indices.clone();
                node
            })
            .collect();
        let table = self
            .assets
            .iter()
            .map(|row| (row.name_hash, row.package_index))
            .collect();
        ResolvedGraph::new(packages, table)
    }

    /// Writes the binary form.
    pub fn encode(&self) -> Result<Vec<u8>, MapError> {
        binary::encode(self)
    }

    /// Writes the text form.
    pub fn encode_text(&self) -> String {
        text::encode_text(self)
    }
}

/// Reads and decodes the binary map at `path`.
pub fn read_map_file(path: impl AsRef<Path>) -> Result<ResolvedGraph, MapError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => MapError::NotFound(path.to_path_buf()),
        _ => MapError::Io(e),
    })?;
    decode(&bytes)
}

/// Writes the binary map as `<dir>/<name>` and the text map next to it with
/// a `.txt` extension. Creates `dir` if needed.
///
/// Returns the paths of the binary and text files.
pub fn write_map_files(
    dir: impl AsRef<Path>,
    name: &str,
    map: &DependencyMap,
) -> Result<(PathBuf, PathBuf), MapError> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    let binary_path = dir.join(name);
    let text_path = binary_path.with_extension("txt");
    fs::write(&binary_path, map.encode()?)?;
    fs::write(&text_path, map.encode_text())?;

    log::info!(
        "Wrote dependency map to {} and {}",
        binary_path.display(),
        text_path.display()
    );
    Ok((binary_path, text_path))
}
