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

//! # Arca IO
//!
//! Build-time services and the persisted-state contract between build and
//! run time:
//! - [`builder`] walks source assets, assigns them to packages, and computes
//!   dependency closures.
//! - [`map`] encodes the resolved package graph into the binary dependency
//!   map (and its plain-text twin) and decodes it back.
//! - [`pack`] is the package file format the runtime loads objects from.
//! - [`manifest`] and [`pipeline`] tie these together for the tooling.

pub mod builder;
pub mod manifest;
pub mod map;
pub mod pack;
pub mod pipeline;
pub mod scan;
