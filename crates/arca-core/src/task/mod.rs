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

//! Single-threaded asynchronous primitives.
//!
//! Every asynchronous operation in Arca is expressed as a [`Promise`] that
//! some later scheduler tick resolves. Nothing here is `Send`: all resolution
//! and every continuation run on the thread that owns the [`Scheduler`].

mod promise;
mod scheduler;

pub use promise::*;
pub use scheduler::*;
