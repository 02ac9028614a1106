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

//! Provides the foundational traits and primitive types for Arca's asset system.
//!
//! This module defines the "common language" for every package-related
//! operation: what an asset is, how asset paths map to packages and lookup
//! hashes, and the narrow interface through which packages are opened and
//! objects extracted. It has no knowledge of how packages are stored on disk.
//!
//! The key components are:
//! - The [`Asset`] trait: A marker for all types that can be treated as assets.
//! - [`AssetHandle`]: shared ownership of a loaded asset.
//! - [`naming`]: the pure path → package and path → hash functions.
//! - [`PackageSource`]: the asynchronous package-loading contract.

mod error;
mod handle;
pub mod naming;
mod object;
mod source;

pub use error::*;
pub use handle::*;
pub use object::*;
pub use source::*;

/// A marker trait for types that can be managed by the asset system.
///
/// This trait's primary purpose is to categorize a type, making it eligible for
/// use within the asset infrastructure (e.g., in an `AssetHandle<T>`).
///
/// The supertraits enforce critical safety guarantees:
/// - `Send` + `Sync`: The asset type can be safely shared and sent between threads,
///   even though the loader itself runs on a single thread.
/// - `'static`: The asset type does not contain any non-static references, ensuring
///   it can be stored in the cache for the lifetime of the application.
///
/// # Examples
///
/// ```
/// use arca_core::asset::Asset;
///
/// // A simple struct representing a localisation table.
/// struct StringTable {
///     // ... fields
/// }
///
/// // By implementing Asset, `StringTable` can now be used by the asset system.
/// impl Asset for StringTable {}
/// ```
pub trait Asset: Send + Sync + 'static {}
