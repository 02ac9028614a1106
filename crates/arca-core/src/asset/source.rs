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

use super::{AssetHandle, AssetKind, AssetObject};
use crate::task::Promise;
use std::rc::Rc;

/// The asynchronous primitives the loader uses to open packages and pull
/// objects out of them.
///
/// Implementations may complete immediately or several scheduler ticks later.
/// Failures are reported by resolving with `None`; a returned promise must
/// always resolve eventually, otherwise every request waiting on it stalls.
pub trait PackageSource {
    /// The opened package. Ownership passes to the load unit that requested it.
    type Package: 'static;

    /// Opens the package stored at `package_path`.
    fn load_package(&self, package_path: &str) -> Promise<Option<Rc<Self::Package>>>;

    /// Extracts the object stored under `object_name` from an open package.
    fn extract_asset(
        &self,
        package: &Rc<Self::Package>,
        object_name: &str,
        kind: &AssetKind,
    ) -> Promise<Option<AssetHandle<AssetObject>>>;
}
