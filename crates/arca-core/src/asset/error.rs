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

use super::AssetKind;
use thiserror::Error;

/// Errors reported while resolving an asset path against the loaded graph.
///
/// These are contained to the single request that triggered them.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AssetError {
    /// No dependency map has been loaded yet, or the last load failed.
    #[error("no dependency map is loaded")]
    NoMapLoaded,
    /// The asset's lookup hash is absent from the dependency map.
    #[error("asset '{asset_path}' (hash {hash}) is not in the dependency map")]
    Unresolved {
        /// The requested path.
        asset_path: String,
        /// The lookup hash computed for it.
        hash: i32,
    },
    /// The map points at a package index that does not exist.
    #[error("package index {index} is out of range ({len} packages)")]
    IndexOutOfRange {
        /// The offending index as stored in the map.
        index: i32,
        /// Number of packages in the map.
        len: usize,
    },
    /// The requested kind cannot be extracted.
    #[error("asset '{asset_path}' requested as unsupported kind '{kind}'")]
    UnsupportedKind {
        /// The requested path.
        asset_path: String,
        /// The requested kind.
        kind: AssetKind,
    },
}
