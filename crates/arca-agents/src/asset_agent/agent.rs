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

//! The AssetAgent turns asset requests into package loads.
//!
//! It owns the resolved dependency map, one load unit per package and the
//! asset cache. A request is resolved to its owning package through the
//! map, that package and its dependencies are loaded at most once each, and
//! the object is extracted, cached and handed to the caller's callback.
//! Everything runs on one thread: "waiting" always means registering a
//! continuation on a promise that the package source resolves on a later
//! scheduler tick.

use std::cell::{Cell, RefCell};
use std::path::Path;
use std::rc::Rc;

use arca_core::asset::{naming, AssetError, AssetHandle, AssetKind, AssetObject, PackageSource};
use arca_core::task::Promise;
use arca_core::vfs::ResolvedGraph;
use arca_data::assets::Assets;
use arca_io::map::{self, MapError};

use super::unit::{Claim, LoadState, PackagePromise, Role, UnitId, UnitRegistry};

struct Inner<S: PackageSource> {
    source: S,
    graph: RefCell<Option<ResolvedGraph>>,
    /// Bumped on every successful map install.
    generation: Cell<u64>,
    units: RefCell<UnitRegistry<S::Package>>,
    cache: RefCell<Assets<AssetObject>>,
}

/// The AssetAgent is responsible for resolving, loading and caching assets.
///
/// Cloning an agent yields another handle to the same state.
pub struct AssetAgent<S: PackageSource + 'static> {
    inner: Rc<Inner<S>>,
}

impl<S: PackageSource + 'static> Clone for AssetAgent<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S: PackageSource + 'static> AssetAgent<S> {
    /// Creates an agent with no map loaded. Every request fails with
    /// [`AssetError::NoMapLoaded`] until [`AssetAgent::load_dependency_map`]
    /// succeeds.
    pub fn new(source: S) -> Self {
        Self {
            inner: Rc::new(Inner {
                source,
                graph: RefCell::new(None),
                generation: Cell::new(0),
                units: RefCell::new(UnitRegistry::new()),
                cache: RefCell::new(Assets::new()),
            }),
        }
    }

    /// The package source this agent loads through.
    pub fn source(&self) -> &S {
        &self.inner.source
    }

    /// Decodes a binary dependency map and makes it the active one.
    ///
    /// On failure the agent is left without a map, never with a partial one.
    pub fn load_dependency_map(&self, bytes: &[u8]) -> Result<(), MapError> {
        self.install(map::decode(bytes))
    }

    /// Reads and installs the dependency map stored at `path`.
    pub fn load_dependency_map_file(&self, path: impl AsRef<Path>) -> Result<(), MapError> {
        self.install(map::read_map_file(path))
    }

    fn install(&self, decoded: Result<ResolvedGraph, MapError>) -> Result<(), MapError> {
        match decoded {
            Ok(graph) => {
                log::info!(
                    "Dependency map loaded: {} packages, {} assets",
                    graph.len(),
                    graph.lookup().len()
                );
                *self.inner.graph.borrow_mut() = Some(graph);
                self.inner.generation.set(self.inner.generation.get() + 1);
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to load dependency map: {}", e);
                *self.inner.graph.borrow_mut() = None;
                Err(e)
            }
        }
    }

    /// Returns `true` if a dependency map is active.
    pub fn has_map(&self) -> bool {
        self.inner.graph.borrow().is_some()
    }

    /// Number of packages in the active map.
    pub fn package_count(&self) -> usize {
        self.inner.graph.borrow().as_ref().map_or(0, ResolvedGraph::len)
    }

    /// Finds the load unit of the package that owns `asset_path`.
    ///
    /// The same path always yields the same unit.
    pub fn resolve(&self, asset_path: &str) -> Result<UnitId, AssetError> {
        resolve(&self.inner, asset_path)
    }

    /// State of a load unit.
    pub fn unit_state(&self, id: UnitId) -> Option<LoadState> {
        self.inner.units.borrow().get(id).map(|unit| unit.state)
    }

    /// Package path of a load unit.
    pub fn unit_path(&self, id: UnitId) -> Option<String> {
        self.inner
            .units
            .borrow()
            .get(id)
            .map(|unit| unit.model.package_path.clone())
    }

    /// The unit created for `package_path`, if any request has touched it.
    pub fn unit_for_package(&self, package_path: &str) -> Option<UnitId> {
        self.inner.units.borrow().id_of(package_path)
    }

    /// Number of load units created so far.
    pub fn unit_count(&self) -> usize {
        self.inner.units.borrow().len()
    }

    /// Number of cached assets.
    pub fn cached_asset_count(&self) -> usize {
        self.inner.cache.borrow().len()
    }

    /// The cached handle for `asset_path`, if it was loaded before.
    pub fn cached(&self, asset_path: &str) -> Option<AssetHandle<AssetObject>> {
        self.inner.cache.borrow().get(asset_path).cloned()
    }

    /// Loads the package owning `asset_path` and every package it depends on.
    ///
    /// The promise resolves with the owning package once it and all its
    /// dependencies have settled, or with `None` if the owning package
    /// failed or the path does not resolve.
    pub fn load_main_and_dependencies(
        &self,
        asset_path: &str,
    ) -> Promise<Option<Rc<S::Package>>> {
        match resolve(&self.inner, asset_path) {
            Ok(id) => load_with_dependencies(&self.inner, id),
            Err(e) => {
                log::error!("Cannot load '{}': {}", asset_path, e);
                Promise::resolved(None)
            }
        }
    }

    /// Requests the object at `asset_path` and passes it to `callback`.
    ///
    /// Cached objects are delivered immediately without touching any package.
    /// Otherwise `callback` runs once the owning package and its dependencies
    /// are loaded and the object has been extracted. It receives `None` on
    /// any failure. With `instantiate` the caller gets its own copy; the cache
    /// always keeps the original.
    pub fn load_asset<F>(&self, asset_path: &str, kind: AssetKind, instantiate: bool, callback: F)
    where
        F: FnOnce(Option<AssetHandle<AssetObject>>) + 'static,
    {
        let respond = move |object: Option<AssetHandle<AssetObject>>| {
            callback(object.map(|handle| {
                if instantiate {
                    handle.instantiate()
                } else {
                    handle
                }
            }))
        };

        if let Some(handle) = self.cached(asset_path) {
            log::trace!("'{}' served from cache", asset_path);
            respond(Some(handle));
            return;
        }

        if kind == AssetKind::Scene {
            let e = AssetError::UnsupportedKind {
                asset_path: asset_path.to_string(),
                kind,
            };
            log::error!("{}", e);
            respond(None);
            return;
        }

        let id = match resolve(&self.inner, asset_path) {
            Ok(id) => id,
            Err(e) => {
                log::error!("Cannot load '{}': {}", asset_path, e);
                respond(None);
                return;
            }
        };

        let extractor = Rc::clone(&self.inner);
        let cache_owner = Rc::clone(&self.inner);
        let object_name = naming::object_name(asset_path);
        let asset_path = asset_path.to_string();
        load_with_dependencies(&self.inner, id)
            .continue_with(move |package| {
                Some(match package {
                    Some(package) => extractor
                        .source
                        .extract_asset(&package, &object_name, &kind),
                    None => Promise::resolved(None),
                })
            })
            .then(move |object| match object {
                Some(handle) => {
                    cache_owner
                        .cache
                        .borrow_mut()
                        .insert(asset_path.clone(), handle.clone());
                    respond(Some(handle.clone()));
                }
                None => {
                    log::error!("Failed to load asset '{}'", asset_path);
                    respond(None);
                }
            });
    }
}

fn resolve<S: PackageSource>(inner: &Inner<S>, asset_path: &str) -> Result<UnitId, AssetError> {
    let graph = inner.graph.borrow();
    let graph = graph.as_ref().ok_or(AssetError::NoMapLoaded)?;
    let package = graph.locate(asset_path)?;
    Ok(inner.units.borrow_mut().get_or_insert(package))
}

/// Starts opening the unit's own package unless that already happened.
/// Returns the promise of the open either way.
fn open<S: PackageSource + 'static>(
    inner: &Rc<Inner<S>>,
    id: UnitId,
    role: Role,
) -> PackagePromise<S::Package> {
    let (package_path, opened) = {
        let mut units = inner.units.borrow_mut();
        let Some(unit) = units.get_mut(id) else {
            log::error!("Unknown load unit {}", id);
            return Promise::resolved(None);
        };
        if !unit.begin(role) {
            return unit.opened.clone();
        }
        (unit.model.package_path.clone(), unit.opened.clone())
    };

    log::debug!("Loading package '{}' as {:?}", package_path, role);
    let owner = Rc::clone(inner);
    inner
        .source
        .load_package(&package_path)
        .then(move |package| on_opened(&owner, id, package.clone()));
    opened
}

/// Runs once the unit's own package is open (or failed to open).
///
/// Dependency-only units and failures settle immediately. Owners settle once
/// every dependency package has settled too. The open promise is resolved
/// after that bookkeeping, so its waiters see the unit settled whenever
/// nothing was left in flight.
fn on_opened<S: PackageSource + 'static>(
    inner: &Rc<Inner<S>>,
    id: UnitId,
    package: Option<Rc<S::Package>>,
) {
    let (opened, settles_now) = {
        let mut units = inner.units.borrow_mut();
        let Some(unit) = units.get_mut(id) else {
            log::error!("Unknown load unit {}", id);
            return;
        };
        if package.is_none() {
            log::error!("Failed to load package '{}'", unit.model.package_path);
        }
        (unit.opened.clone(), unit.record_open(package.clone()))
    };

    if settles_now {
        finish(inner, id, package.clone());
    } else {
        let finisher = Rc::clone(inner);
        let loaded = package.clone();
        ensure_dependencies(inner, id).then(move |_| finish(&finisher, id, loaded));
    }
    opened.resolve(package);
}

fn finish<S: PackageSource>(inner: &Inner<S>, id: UnitId, package: Option<Rc<S::Package>>) {
    let pending = {
        let mut units = inner.units.borrow_mut();
        let Some(unit) = units.get_mut(id) else {
            log::error!("Unknown load unit {}", id);
            return;
        };
        unit.finish(package.clone())
    };
    if let Some(pending) = pending {
        pending.resolve(package);
    }
}

/// Opens every dependency package of `id` that is not open yet and waits
/// for all of them. A failed dependency is logged by its own unit and does
/// not fail the wait.
fn ensure_dependencies<S: PackageSource + 'static>(
    inner: &Rc<Inner<S>>,
    id: UnitId,
) -> Promise<Vec<Option<Rc<S::Package>>>> {
    let waits = dependencies_of(inner, id)
        .into_iter()
        .map(|dependency| open(inner, dependency, Role::Dependency))
        .collect::<Vec<_>>();
    Promise::all(waits)
}

/// Loads the unit's package, then every dependency of it, and resolves with
/// the unit's package once all of them have settled.
fn load_with_dependencies<S: PackageSource + 'static>(
    inner: &Rc<Inner<S>>,
    id: UnitId,
) -> PackagePromise<S::Package> {
    let (claim, pending) = {
        let mut units = inner.units.borrow_mut();
        let Some(unit) = units.get_mut(id) else {
            log::error!("Unknown load unit {}", id);
            return Promise::resolved(None);
        };
        (unit.claim(), unit.pending.clone())
    };

    match claim {
        Claim::Open => {
            open(inner, id, Role::Owner);
            pending
        }
        Claim::Wait => pending,
        Claim::Refresh(package) => ensure_dependencies(inner, id)
            .continue_with(move |_| Some(Promise::resolved(Some(package)))),
    }
}

/// The dependency units of `id`, excluding itself. Remembered per map
/// generation, so installing a new map recomputes them.
fn dependencies_of<S: PackageSource>(inner: &Inner<S>, id: UnitId) -> Vec<UnitId> {
    let generation = inner.generation.get();
    let package_path = {
        let units = inner.units.borrow();
        match units.get(id) {
            Some(unit) => match &unit.dependencies {
                Some((computed_for, known)) if *computed_for == generation => {
                    return known.clone()
                }
                _ => unit.model.package_path.clone(),
            },
            None => return Vec::new(),
        }
    };

    let graph = inner.graph.borrow();
    let Some(graph) = graph.as_ref() else {
        return Vec::new();
    };
    let Some(node) = graph.index_of(&package_path).and_then(|i| graph.packages().get(i)) else {
        log::warn!("Package '{}' is no longer in the dependency map", package_path);
        return Vec::new();
    };

    let mut units = inner.units.borrow_mut();
    let mut dependencies = Vec::new();
    for dependency in graph.dependencies_of(node) {
        if dependency.package_path == package_path {
            continue;
        }
        let dependency = units.get_or_insert(dependency);
        if !dependencies.contains(&dependency) {
            dependencies.push(dependency);
        }
    }
    if let Some(unit) = units.get_mut(id) {
        unit.model = node.clone();
        unit.dependencies = Some((generation, dependencies.clone()));
    }
    dependencies
}
