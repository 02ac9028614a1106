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

//! Assigns source assets to packages and computes their dependency closures.
//!
//! The builder is fed the assets found by a source scan. Each one is mapped to
//! its package, and every direct dependency is pulled in the same way, so the
//! package set covers everything the scanned assets need. Afterwards
//! [`GraphBuilder::build_dependency_map`] expands each member asset into its
//! transitive dependency closure.

mod filter;
mod graph;
mod source;

pub use filter::*;
pub use graph::*;
pub use source::*;

use thiserror::Error;

/// Errors raised while assigning assets to packages.
///
/// None of these abort a build: the offending asset is skipped and the
/// error is logged by the caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// The path is excluded by the asset filter or is otherwise unusable.
    #[error("illegal asset path '{path}': {reason}")]
    IllegalAssetPath {
        /// The rejected path.
        path: String,
        /// Why it was rejected.
        reason: &'static str,
    },
    /// The dependency source does not know the asset.
    #[error("no importer for asset '{0}'")]
    MissingImporter(String),
    /// The asset sits at the project root and cannot be mapped to a package.
    #[error("asset '{0}' has no directory to derive a package from")]
    NoPackageDirectory(String),
    /// The packaging step failed.
    #[error("package build failed: {0}")]
    Pipeline(String),
}
