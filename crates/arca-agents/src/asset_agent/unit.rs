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

//! Per-package load state and the registry that owns it.

use arca_core::task::Promise;
use arca_core::vfs::PackageNode;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Stable identifier of a load unit. Units are never removed, so an id stays
/// valid for the lifetime of the agent that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(pub(crate) usize);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unit#{}", self.0)
    }
}

/// Where a package is in its load lifecycle.
///
/// Transitions run `NotStarted → Loading → Loaded | Failed`, once each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadState {
    /// Nothing has asked for the package yet.
    NotStarted,
    /// The package primitive is in flight.
    Loading,
    /// The package is open and held by the unit.
    Loaded,
    /// The package could not be opened. Not retried.
    Failed,
}

impl LoadState {
    /// Returns `true` for `Loaded` and `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, LoadState::Loaded | LoadState::Failed)
    }
}

pub(crate) type PackagePromise<P> = Promise<Option<Rc<P>>>;

/// Why a unit was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Role {
    /// Some request needs an object from this package, so its dependencies
    /// must settle before the unit does.
    Owner,
    /// Only needed as another package's dependency. Settles with its own
    /// package.
    Dependency,
}

/// What a request for an owning package has to do next.
pub(crate) enum Claim<P> {
    /// Nothing started yet; the caller opens the package.
    Open,
    /// Already in flight; the terminal promise covers the dependencies.
    Wait,
    /// Loaded earlier. The caller still makes sure the dependencies listed by
    /// the current map are loaded.
    Refresh(Rc<P>),
}

/// Tracks one package: its map entry, its state, the open package once
/// loaded, and the promises requesters wait on.
pub(crate) struct PackageLoadUnit<P> {
    pub(crate) model: PackageNode,
    pub(crate) state: LoadState,
    pub(crate) role: Role,
    pub(crate) package: Option<Rc<P>>,
    /// Dependency units and the map generation they were computed for.
    pub(crate) dependencies: Option<(u64, Vec<UnitId>)>,
    /// Resolves when the unit's own package has been opened (or failed).
    pub(crate) opened: PackagePromise<P>,
    /// Resolves on the terminal transition.
    pub(crate) pending: PackagePromise<P>,
}

impl<P: 'static> PackageLoadUnit<P> {
    fn new(model: PackageNode) -> Self {
        Self {
            model,
            state: LoadState::NotStarted,
            role: Role::Dependency,
            package: None,
            dependencies: None,
            opened: Promise::new(),
            pending: Promise::new(),
        }
    }

    /// Moves to `Loading`. Returns `false` if the unit was already started;
    /// callers then wait on the existing promises instead.
    pub(crate) fn begin(&mut self, role: Role) -> bool {
        if self.state != LoadState::NotStarted {
            return false;
        }
        self.state = LoadState::Loading;
        self.role = role;
        true
    }

    /// Registers a request that needs an object from this package.
    ///
    /// A unit still loading as someone's dependency becomes an owner, so it
    /// will not settle before its own dependencies do.
    pub(crate) fn claim(&mut self) -> Claim<P> {
        match self.state {
            LoadState::NotStarted => Claim::Open,
            LoadState::Loading => {
                self.role = Role::Owner;
                Claim::Wait
            }
            LoadState::Loaded => match &self.package {
                Some(package) => Claim::Refresh(Rc::clone(package)),
                None => Claim::Wait,
            },
            LoadState::Failed => Claim::Wait,
        }
    }

    /// Records the outcome of opening the package. Returns `true` when the
    /// terminal transition follows right away, that is on failure or for a
    /// dependency-only unit.
    pub(crate) fn record_open(&mut self, package: Option<Rc<P>>) -> bool {
        let settles_now = package.is_none() || self.role == Role::Dependency;
        self.package = package;
        settles_now
    }

    /// Applies the terminal transition. Returns the promise to resolve, or
    /// `None` if the unit was not `Loading` (logged as an error).
    pub(crate) fn finish(&mut self, package: Option<Rc<P>>) -> Option<PackagePromise<P>> {
        if self.state != LoadState::Loading {
            log::error!(
                "Package '{}' is {:?}, refusing a second terminal transition",
                self.model.package_path,
                self.state
            );
            return None;
        }
        self.state = if package.is_some() {
            LoadState::Loaded
        } else {
            LoadState::Failed
        };
        self.package = package;
        Some(self.pending.clone())
    }
}

/// Append-only arena of load units, keyed by package path.
pub(crate) struct UnitRegistry<P> {
    units: Vec<PackageLoadUnit<P>>,
    by_path: HashMap<String, UnitId>,
}

impl<P: 'static> UnitRegistry<P> {
    pub(crate) fn new() -> Self {
        Self {
            units: Vec::new(),
            by_path: HashMap::new(),
        }
    }

    /// Returns the unit for `model`'s package, creating it on first use.
    pub(crate) fn get_or_insert(&mut self, model: &PackageNode) -> UnitId {
        if let Some(&id) = self.by_path.get(&model.package_path) {
            return id;
        }
        let id = UnitId(self.units.len());
        self.units.push(PackageLoadUnit::new(model.clone()));
        self.by_path.insert(model.package_path.clone(), id);
        log::trace!("Created {} for '{}'", id, model.package_path);
        id
    }

    pub(crate) fn id_of(&self, package_path: &str) -> Option<UnitId> {
        self.by_path.get(package_path).copied()
    }

    pub(crate) fn get(&self, id: UnitId) -> Option<&PackageLoadUnit<P>> {
        self.units.get(id.0)
    }

    pub(crate) fn get_mut(&mut self, id: UnitId) -> Option<&mut PackageLoadUnit<P>> {
        self.units.get_mut(id.0)
    }

    pub(crate) fn len(&self) -> usize {
        self.units.len()
    }
}
