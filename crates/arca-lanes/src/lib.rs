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

//! # Arca Lanes
//!
//! Workers that perform the byte-level side of loading: locating pack files,
//! reading and parsing them, and extracting objects. They do their work on
//! the tick [`Scheduler`](arca_core::task::Scheduler) and report results
//! through promises, so callers never block.

#![warn(missing_docs)]

pub mod asset_lane;
