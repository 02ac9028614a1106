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

use super::{AssetFilter, BuildError, DependencySource};
use arca_core::asset::naming;
use arca_core::vfs::PackageNode;
use indexmap::{IndexMap, IndexSet};
use std::collections::HashSet;

/// Asset path → transitive closure of that asset, in discovery order.
pub type ClosureMap = IndexMap<String, IndexSet<String>>;

/// Collects packages from source assets and computes dependency closures.
///
/// Packages are kept in first-discovery order so that index assignment in
/// the serialized map is deterministic for a given scan.
#[derive(Debug)]
pub struct GraphBuilder<D: DependencySource> {
    source: D,
    filter: AssetFilter,
    packages: IndexMap<String, PackageNode>,
}

impl<D: DependencySource> GraphBuilder<D> {
    /// Creates a builder using the default exclusion policy.
    pub fn new(source: D) -> Self {
        Self::with_filter(source, AssetFilter::default())
    }

    /// Creates a builder with an explicit exclusion policy.
    pub fn with_filter(source: D, filter: AssetFilter) -> Self {
        Self {
            source,
            filter,
            packages: IndexMap::new(),
        }
    }

    /// The exclusion policy in use.
    pub fn filter(&self) -> &AssetFilter {
        &self.filter
    }

    /// The dependency source in use.
    pub fn source(&self) -> &D {
        &self.source
    }

    /// Packages discovered so far, in discovery order.
    pub fn packages(&self) -> impl Iterator<Item = &PackageNode> {
        self.packages.values()
    }

    /// Looks up a discovered package by path.
    pub fn package(&self, package_path: &str) -> Option<&PackageNode> {
        self.packages.get(package_path)
    }

    /// Number of discovered packages.
    pub fn package_count(&self) -> usize {
        self.packages.len()
    }

    /// Forgets every discovered package.
    pub fn clear(&mut self) {
        self.packages.clear();
    }

    /// Maps `asset_path` to its package, then does the same for each of its
    /// direct dependencies.
    ///
    /// Assigning an asset that is already a member of its package does
    /// nothing, which also stops the recursion on dependency cycles.
    /// Failures on dependencies are logged and do not fail the root.
    pub fn assign_package(&mut self, asset_path: &str) -> Result<(), BuildError> {
        let asset_path = naming::normalize_separators(asset_path);

        if !self.filter.allows(&asset_path) {
            return Err(BuildError::IllegalAssetPath {
                path: asset_path,
                reason: "excluded by filter",
            });
        }
        if asset_path.contains(' ') {
            log::warn!("Asset path '{}' contains a blank space, skipping", asset_path);
            return Err(BuildError::IllegalAssetPath {
                path: asset_path,
                reason: "contains a blank space",
            });
        }

        let dependencies = self
            .source
            .direct_dependencies(&asset_path)
            .ok_or_else(|| BuildError::MissingImporter(asset_path.clone()))?;
        let package_path = naming::package_path(&asset_path)
            .ok_or_else(|| BuildError::NoPackageDirectory(asset_path.clone()))?;

        let package = self
            .packages
            .entry(package_path.clone())
            .or_insert_with(|| {
                log::debug!("New package '{}'", package_path);
                PackageNode::new(package_path.clone())
            });
        if !package.add_member(&asset_path) {
            return Ok(());
        }
        log::trace!("'{}' -> '{}'", asset_path, package_path);

        for dependency in dependencies {
            if dependency == asset_path {
                continue;
            }
            match self.assign_package(&dependency) {
                Ok(()) => {}
                Err(BuildError::IllegalAssetPath { .. }) => {}
                Err(e) => log::warn!("Dependency of '{}' not assigned: {}", asset_path, e),
            }
        }
        Ok(())
    }

    /// Assigns every path in `asset_paths`, logging the ones that fail.
    ///
    /// Returns the number of root assets that were assigned.
    pub fn assign_all<I, S>(&mut self, asset_paths: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut assigned = 0;
        for asset_path in asset_paths {
            match self.assign_package(asset_path.as_ref()) {
                Ok(()) => assigned += 1,
                Err(e @ BuildError::IllegalAssetPath { .. }) => log::debug!("{}", e),
                Err(e) => log::error!("{}", e),
            }
        }
        assigned
    }

    /// Every asset `asset_path` depends on, directly or not, plus the asset
    /// itself.
    ///
    /// Excluded assets are still walked through but never appear in the
    /// result. Assets the dependency source does not know are logged and
    /// left out.
    pub fn compute_closure(&self, asset_path: &str) -> IndexSet<String> {
        let mut visited = HashSet::new();
        let mut closure = IndexSet::new();
        self.collect_closure(
            &naming::normalize_separators(asset_path),
            &mut visited,
            &mut closure,
        );
        closure
    }

    fn collect_closure(
        &self,
        asset_path: &str,
        visited: &mut HashSet<String>,
        closure: &mut IndexSet<String>,
    ) {
        if !visited.insert(asset_path.to_string()) {
            return;
        }
        let Some(dependencies) = self.source.direct_dependencies(asset_path) else {
            log::warn!("Dependency '{}' is missing, ignoring it", asset_path);
            return;
        };
        if self.filter.allows(asset_path) {
            closure.insert(asset_path.to_string());
        }
        for dependency in dependencies {
            self.collect_closure(&naming::normalize_separators(&dependency), visited, closure);
        }
    }

    /// Computes the closure of every member of every package that is not
    /// itself excluded.
    pub fn build_dependency_map(&self) -> ClosureMap {
        let mut map = ClosureMap::new();
        for package in self.packages.values() {
            if self.filter.excludes_package(&package.package_path) {
                log::debug!("Package '{}' left out of the map", package.package_path);
                continue;
            }
            for member in &package.members {
                if !map.contains_key(&member.asset_path) {
                    let closure = self.compute_closure(&member.asset_path);
                    map.insert(member.asset_path.clone(), closure);
                }
            }
        }
        log::info!(
            "Computed dependency closures for {} assets in {} packages",
            map.len(),
            self.packages.len()
        );
        map
    }
}
