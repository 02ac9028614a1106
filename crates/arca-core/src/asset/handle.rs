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

use super::Asset;
use std::{ops::Deref, sync::Arc};

/// A shared, reference-counted handle to a loaded asset.
///
/// Loading happens on one thread, but the handle is backed by an `Arc` so a
/// delivered asset (which is `Send + Sync`) can still be passed to other
/// threads by the code that received it.
///
/// This acts as a smart pointer, providing shared ownership of an asset's data.
/// Cloning a handle is cheap, as it only increments the reference count
/// and does not duplicate the underlying asset data. The asset cache holds one
/// handle and every caller that received the asset holds another.
///
/// The asset data is automatically deallocated when the last handle is dropped.
#[derive(Debug)]
pub struct AssetHandle<T: Asset>(Arc<T>);

impl<T: Asset> AssetHandle<T> {
    /// Creates a new `AssetHandle` that takes ownership of the asset data.
    ///
    /// This is typically called by the `AssetAgent` once an object has been
    /// extracted from its package.
    pub fn new(asset: T) -> Self {
        Self(Arc::new(asset))
    }

    /// Returns `true` if both handles point at the same allocation.
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        Arc::ptr_eq(&this.0, &other.0)
    }
}

impl<T: Asset + Clone> AssetHandle<T> {
    /// Produces an independent copy of the asset behind a fresh handle.
    ///
    /// The canonical handle stays untouched, so the cache keeps serving the
    /// original while the caller owns its own instance.
    pub fn instantiate(&self) -> Self {
        Self::new(T::clone(&self.0))
    }
}

impl<T: Asset> Clone for AssetHandle<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: Asset> Deref for AssetHandle<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
