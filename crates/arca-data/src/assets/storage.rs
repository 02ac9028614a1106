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

//! A path-keyed cache of loaded asset handles.

use arca_core::asset::{Asset, AssetHandle};
use std::collections::HashMap;

/// A central, in-memory cache for assets of type `A`, keyed by the asset
/// path they were requested with.
///
/// The cache holds the canonical handle of each asset; callers receive
/// clones of it. Inserting under an existing path replaces the entry.
/// Entries are never evicted.
pub struct Assets<A: Asset> {
    storage: HashMap<String, AssetHandle<A>>,
}

impl<A: Asset> Default for Assets<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Asset> Clone for Assets<A> {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
        }
    }
}

impl<A: Asset> Assets<A> {
    /// Creates a new, empty asset cache.
    pub fn new() -> Self {
        Self {
            storage: HashMap::new(),
        }
    }

    /// Inserts a handle under `asset_path`, replacing any previous entry.
    ///
    /// Returns the replaced handle, if there was one.
    pub fn insert(
        &mut self,
        asset_path: impl Into<String>,
        handle: AssetHandle<A>,
    ) -> Option<AssetHandle<A>> {
        let asset_path = asset_path.into();
        let replaced = self.storage.insert(asset_path.clone(), handle);
        if replaced.is_some() {
            log::debug!("Replaced cached asset '{asset_path}'.");
        }
        replaced
    }

    /// Retrieves the handle cached under `asset_path`.
    pub fn get(&self, asset_path: &str) -> Option<&AssetHandle<A>> {
        self.storage.get(asset_path)
    }

    /// Checks if an asset is cached under `asset_path`.
    pub fn contains(&self, asset_path: &str) -> bool {
        self.storage.contains_key(asset_path)
    }

    /// Number of cached assets.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }
}
