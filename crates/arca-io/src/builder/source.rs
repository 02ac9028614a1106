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

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

/// Supplies one level of dependency edges per asset.
///
/// This is the host's asset-import subsystem as seen by the builder.
pub trait DependencySource {
    /// Direct dependencies of `asset_path`, or `None` if the asset is unknown.
    fn direct_dependencies(&self, asset_path: &str) -> Option<Vec<String>>;
}

impl<T: DependencySource + ?Sized> DependencySource for &T {
    fn direct_dependencies(&self, asset_path: &str) -> Option<Vec<String>> {
        (**self).direct_dependencies(asset_path)
    }
}

/// A table of declared dependency edges.
///
/// An asset is known if it has an entry, appears as somebody's dependency,
/// or (when a project root is set) exists on disk below that root. Known
/// assets without an entry have no dependencies.
#[derive(Debug, Clone, Default)]
pub struct DependencyTable {
    edges: HashMap<String, Vec<String>>,
    known: HashSet<String>,
    project_root: Option<PathBuf>,
}

impl DependencyTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Also treats any file below `project_root` as a known leaf asset.
    pub fn with_project_root(mut self, project_root: impl Into<PathBuf>) -> Self {
        self.project_root = Some(project_root.into());
        self
    }

    /// Declares the direct dependencies of `asset_path`, replacing earlier ones.
    pub fn insert<I, S>(&mut self, asset_path: impl Into<String>, dependencies: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let dependencies: Vec<String> = dependencies.into_iter().map(Into::into).collect();
        self.known.extend(dependencies.iter().cloned());
        self.edges.insert(asset_path.into(), dependencies);
    }

    /// Builder-style [`DependencyTable::insert`].
    pub fn with<I, S>(mut self, asset_path: impl Into<String>, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(asset_path, dependencies);
        self
    }

    /// Number of assets with declared edges.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Returns `true` if no edges are declared.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

impl DependencySource for DependencyTable {
    fn direct_dependencies(&self, asset_path: &str) -> Option<Vec<String>> {
        if let Some(dependencies) = self.edges.get(asset_path) {
            return Some(dependencies.clone());
        }
        if self.known.contains(asset_path) {
            return Some(Vec::new());
        }
        match &self.project_root {
            Some(root) if root.join(asset_path).is_file() => Some(Vec::new()),
            _ => None,
        }
    }
}
