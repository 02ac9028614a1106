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
use std::fmt;

/// The kind of object a caller expects to extract from a package.
///
/// Kinds are matched against the type name recorded for each packaged object
/// (the source file extension, e.g. `prefab` or `txt`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum AssetKind {
    /// Accept whatever object is stored under the requested name.
    #[default]
    Any,
    /// Accept only objects recorded with this type name.
    Typed(String),
    /// A scene. Scene extraction is not supported by the loader.
    Scene,
}

impl AssetKind {
    /// Convenience constructor for [`AssetKind::Typed`].
    pub fn of(type_name: impl Into<String>) -> Self {
        Self::Typed(type_name.into())
    }

    /// Returns `true` if an object recorded as `type_name` satisfies this kind.
    pub fn matches(&self, type_name: &str) -> bool {
        match self {
            AssetKind::Any => true,
            AssetKind::Typed(expected) => expected.eq_ignore_ascii_case(type_name),
            AssetKind::Scene => false,
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetKind::Any => write!(f, "any"),
            AssetKind::Typed(name) => write!(f, "{name}"),
            AssetKind::Scene => write!(f, "scene"),
        }
    }
}

/// An object extracted from a package.
///
/// The loader treats the payload as opaque bytes; decoding them into engine
/// types is the caller's concern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetObject {
    /// The in-package name the object was extracted by.
    pub name: String,
    /// The recorded type name (source extension).
    pub type_name: String,
    /// The raw object data.
    pub bytes: Vec<u8>,
}

impl Asset for AssetObject {}
