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

use anyhow::{Context, Result};
use arca_core::asset::{AssetHandle, AssetKind, AssetObject, PackageSource};
use arca_core::task::{Promise, Scheduler};
use arca_io::pack::PackFile;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// A "Lane" responsible for the I/O side of package loading: finding a pack
/// file among its roots, reading it, and extracting objects from it.
///
/// Roots are searched in order, so a writable data directory placed first
/// shadows the packages bundled with the application. Every operation
/// completes on the next scheduler tick.
pub struct PackLoadingLane {
    roots: Rc<[PathBuf]>,
    scheduler: Rc<Scheduler>,
}

impl PackLoadingLane {
    /// Creates a lane that searches `roots` in order.
    pub fn new(roots: impl IntoIterator<Item = PathBuf>, scheduler: Rc<Scheduler>) -> Self {
        Self {
            roots: roots.into_iter().collect(),
            scheduler,
        }
    }

    /// The search roots, in priority order.
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Returns the first existing file for `package_path` under the roots.
    pub fn locate(&self, package_path: &str) -> Option<PathBuf> {
        locate_in(&self.roots, package_path)
    }

    /// Reads and parses the pack for `package_path` synchronously.
    pub fn read_package(&self, package_path: &str) -> Result<PackFile> {
        read_package_in(&self.roots, package_path)
    }
}

fn locate_in(roots: &[PathBuf], package_path: &str) -> Option<PathBuf> {
    roots
        .iter()
        .map(|root| root.join(Path::new(package_path)))
        .find(|candidate| candidate.is_file())
}

fn read_package_in(roots: &[PathBuf], package_path: &str) -> Result<PackFile> {
    let path = locate_in(roots, package_path).with_context(|| {
        format!(
            "Package '{}' not found in any of {} root(s)",
            package_path,
            roots.len()
        )
    })?;
    PackFile::open(&path).with_context(|| format!("Failed to open pack '{}'", path.display()))
}

impl PackageSource for PackLoadingLane {
    type Package = PackFile;

    fn load_package(&self, package_path: &str) -> Promise<Option<Rc<PackFile>>> {
        let promise = Promise::new();
        let pending = promise.clone();
        let roots = Rc::clone(&self.roots);
        let package_path = package_path.to_string();

        self.scheduler.defer(move || {
            match read_package_in(&roots, &package_path) {
                Ok(pack) => {
                    log::debug!(
                        "Opened package '{}' ({} objects)",
                        package_path,
                        pack.entries().len()
                    );
                    pending.resolve(Some(Rc::new(pack)));
                }
                Err(e) => {
                    log::error!("{:#}", e);
                    pending.resolve(None);
                }
            }
        });
        promise
    }

    fn extract_asset(
        &self,
        package: &Rc<PackFile>,
        object_name: &str,
        kind: &AssetKind,
    ) -> Promise<Option<AssetHandle<AssetObject>>> {
        let promise = Promise::new();
        let pending = promise.clone();
        let package = Rc::clone(package);
        let object_name = object_name.to_string();
        let kind = kind.clone();

        self.scheduler.defer(move || match package.extract(&object_name, &kind) {
            Ok(object) => pending.resolve(Some(AssetHandle::new(object))),
            Err(e) => {
                log::error!("Failed to extract '{}': {}", object_name, e);
                pending.resolve(None);
            }
        });
        promise
    }
}
