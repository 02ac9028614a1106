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

//! In-memory model of packages, their member assets, and the resolved
//! package graph.
//!
//! The build tooling fills [`PackageNode`]s while it walks source assets; the
//! runtime gets the same nodes back by decoding the dependency map into a
//! [`ResolvedGraph`]. The resolved graph is read-only once constructed: it is
//! the primary source of truth for the `AssetAgent` when it needs to decide
//! which packages to load for a requested asset.

use crate::asset::{naming, AssetError};
use std::collections::HashMap;

/// One source asset inside a package.
#[derive(Debug, Clone, Eq)]
pub struct AssetNode {
    /// Source-relative path, e.g. `Assets/Res/UI/Main/MainWindow.prefab`.
    pub asset_path: String,
    /// Path of the owning package.
    pub package_path: String,
    /// Root- and extension-stripped name, e.g. `Res/UI/Main/MainWindow`.
    pub logical_name: String,
    /// Case-insensitive hash of `logical_name`.
    pub name_hash: i32,
}

impl AssetNode {
    /// Creates a node, deriving the logical name and its hash from `asset_path`.
    pub fn new(asset_path: impl Into<String>, package_path: impl Into<String>) -> Self {
        let asset_path = asset_path.into();
        let logical_name = naming::logical_name(&asset_path);
        let name_hash = naming::name_hash(&logical_name);
        Self {
            asset_path,
            package_path: package_path.into(),
            logical_name,
            name_hash,
        }
    }
}

// Identity is the (package, asset) pair; the derived fields follow from it.
impl PartialEq for AssetNode {
    fn eq(&self, other: &Self) -> bool {
        self.package_path == other.package_path && self.asset_path == other.asset_path
    }
}

/// One deployable package.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageNode {
    /// Normalized lowercase path ending in the package suffix.
    pub package_path: String,
    /// Variant name. Always empty in this version of the format.
    pub variant: String,
    /// Member assets, unique by (package, asset) pair, in discovery order.
    pub members: Vec<AssetNode>,
    /// Indices of the packages this one depends on. Filled during graph
    /// resolution; raw map values, validated when used.
    pub dependency_indices: Vec<i32>,
}

impl PackageNode {
    /// Creates an empty package.
    pub fn new(package_path: impl Into<String>) -> Self {
        Self {
            package_path: package_path.into(),
            ..Default::default()
        }
    }

    /// Adds `asset_path` as a member unless an equal entry is already present.
    ///
    /// Returns `true` if the member was added. Empty paths are ignored.
    pub fn add_member(&mut self, asset_path: &str) -> bool {
        if asset_path.is_empty() {
            return false;
        }
        let candidate = AssetNode::new(asset_path, self.package_path.clone());
        if self.members.contains(&candidate) {
            return false;
        }
        self.members.push(candidate);
        true
    }

    /// Returns `true` if `asset_path` is already a member.
    pub fn contains_member(&self, asset_path: &str) -> bool {
        self.members
            .iter()
            .any(|member| member.asset_path == asset_path)
    }

    /// Appends a dependency edge.
    pub fn add_dependency_index(&mut self, index: i32) {
        self.dependency_indices.push(index);
    }
}

/// The runtime view of the dependency map.
///
/// `packages` is indexed by the integers stored in dependency edges and in
/// the asset lookup table. Indices are not validated on construction; every
/// accessor checks them and reports [`AssetError::IndexOutOfRange`] instead.
#[derive(Debug, Clone, Default)]
pub struct ResolvedGraph {
    packages: Vec<PackageNode>,
    asset_table: Vec<(i32, i32)>,
    lookup: HashMap<i32, i32>,
    package_indices: HashMap<String, usize>,
}

impl ResolvedGraph {
    /// Builds the graph from its package list and its `(hash, package index)`
    /// table. For a hash listed more than once, the first entry wins.
    pub fn new(packages: Vec<PackageNode>, asset_table: Vec<(i32, i32)>) -> Self {
        let mut lookup = HashMap::with_capacity(asset_table.len());
        for &(hash, index) in &asset_table {
            if lookup.contains_key(&hash) {
                log::debug!("Duplicate asset hash {hash} in dependency map; keeping first entry.");
                continue;
            }
            lookup.insert(hash, index);
        }

        let package_indices = packages
            .iter()
            .enumerate()
            .map(|(index, package)| (package.package_path.clone(), index))
            .collect();

        Self {
            packages,
            asset_table,
            lookup,
            package_indices,
        }
    }

    /// All packages in index order.
    pub fn packages(&self) -> &[PackageNode] {
        &self.packages
    }

    /// The `(hash, package index)` table in stored order, duplicates included.
    pub fn asset_table(&self) -> &[(i32, i32)] {
        &self.asset_table
    }

    /// The effective hash → package index map.
    pub fn lookup(&self) -> &HashMap<i32, i32> {
        &self.lookup
    }

    /// Number of packages.
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    /// Returns `true` if the graph has no packages.
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Returns the package at a raw map index.
    pub fn package(&self, index: i32) -> Result<&PackageNode, AssetError> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.packages.get(i))
            .ok_or(AssetError::IndexOutOfRange {
                index,
                len: self.packages.len(),
            })
    }

    /// Returns the index of the package stored at `package_path`.
    pub fn index_of(&self, package_path: &str) -> Option<usize> {
        self.package_indices.get(package_path).copied()
    }

    /// Finds the package that owns `asset_path`.
    ///
    /// The path may be a source path (`Assets/Res/UI/Main.prefab`) or a
    /// logical name (`Res/UI/Main`); both hash the same.
    pub fn locate(&self, asset_path: &str) -> Result<&PackageNode, AssetError> {
        let hash = naming::lookup_hash(asset_path);
        let index = self
            .lookup
            .get(&hash)
            .copied()
            .ok_or_else(|| AssetError::Unresolved {
                asset_path: asset_path.to_string(),
                hash,
            })?;
        self.package(index)
    }

    /// Dependency packages of `package`, skipping invalid indices (logged).
    pub fn dependencies_of<'a>(&'a self, package: &'a PackageNode) -> Vec<&'a PackageNode> {
        package
            .dependency_indices
            .iter()
            .filter_map(|&index| match self.package(index) {
                Ok(dependency) => Some(dependency),
                Err(e) => {
                    log::error!("Package '{}': {e}", package.package_path);
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn members_are_unique_by_package_and_path() {
        let mut package = PackageNode::new("res/ui.ab");
        assert!(package.add_member("Assets/Res/UI/Main.prefab"));
        assert!(!package.add_member("Assets/Res/UI/Main.prefab"));
        assert!(!package.add_member(""));
        assert!(package.add_member("Assets/Res/UI/Other.prefab"));
        assert_eq!(package.members.len(), 2);
        assert_eq!(package.members[0].logical_name, "Res/UI/Main");
        assert_eq!(
            package.members[0].name_hash,
            naming::name_hash("res/ui/main")
        );
    }

    #[test]
    fn locate_resolves_through_the_hash_table() {
        let graph = ResolvedGraph::new(
            vec![PackageNode::new("res/ui.ab"), PackageNode::new("res/common.ab")],
            vec![(naming::name_hash("Res/UI/Main"), 0)],
        );

        assert_eq!(
            graph.locate("Res/UI/Main.prefab").map(|p| p.package_path.as_str()),
            Ok("res/ui.ab")
        );
        assert!(matches!(
            graph.locate("Res/UI/Missing"),
            Err(AssetError::Unresolved { .. })
        ));
        assert_eq!(graph.index_of("res/common.ab"), Some(1));
    }

    #[test]
    fn out_of_range_indices_are_reported_lazily() {
        let mut package = PackageNode::new("a.ab");
        package.add_dependency_index(0);
        package.add_dependency_index(9);
        package.add_dependency_index(-1);
        let graph = ResolvedGraph::new(vec![package], vec![(1, 5)]);

        assert_eq!(
            graph.package(5),
            Err(AssetError::IndexOutOfRange { index: 5, len: 1 })
        );
        let first = &graph.packages()[0];
        assert_eq!(graph.dependencies_of(first).len(), 1);
    }

    #[test]
    fn first_duplicate_hash_wins() {
        let graph = ResolvedGraph::new(
            vec![PackageNode::new("a.ab"), PackageNode::new("b.ab")],
            vec![(42, 1), (42, 0)],
        );
        assert_eq!(graph.lookup().get(&42), Some(&1));
        assert_eq!(graph.asset_table().len(), 2);
    }
}
