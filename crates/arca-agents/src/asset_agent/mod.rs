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

//! Acts as the **[A]gent** for packaged assets.
//!
//! This module provides the tactical logic of asset loading: mapping a
//! requested path to its package through the dependency map, loading each
//! package at most once, and caching extracted objects. The byte-level work
//! is delegated to a [`PackageSource`](arca_core::asset::PackageSource),
//! typically the pack-loading lane.

pub mod agent;
mod unit;

pub use agent::AssetAgent;
pub use unit::{LoadState, UnitId};
