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

use arca_core::asset::naming::PACKAGE_SUFFIX;
use serde::Deserialize;

/// Decides which source assets may be packaged and which packages take part
/// in the dependency map.
///
/// Deserialized from the `[filter]` table of `Assets.toml`; missing fields
/// fall back to the defaults below.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AssetFilter {
    /// Paths ending with any of these are rejected (compiled code, sidecars).
    pub excluded_suffixes: Vec<String>,
    /// Paths starting with any of these are rejected (protected plugin roots).
    pub excluded_prefixes: Vec<String>,
    /// Paths containing any of these anywhere are rejected.
    pub excluded_segments: Vec<String>,
    /// Packages whose suffix-less path equals, or lies under, any of these
    /// are left out of the dependency map.
    pub excluded_packages: Vec<String>,
}

impl Default for AssetFilter {
    fn default() -> Self {
        Self {
            excluded_suffixes: vec![".cs".into(), ".meta".into()],
            excluded_prefixes: vec!["Assets/Plugins".into()],
            excluded_segments: vec!["Scripts".into(), "Packages".into()],
            excluded_packages: vec!["dependencies".into(), "assets".into()],
        }
    }
}

impl AssetFilter {
    /// Returns `true` if `asset_path` may become a package member.
    pub fn allows(&self, asset_path: &str) -> bool {
        !(self
            .excluded_suffixes
            .iter()
            .any(|suffix| asset_path.ends_with(suffix.as_str()))
            || self
                .excluded_prefixes
                .iter()
                .any(|prefix| asset_path.starts_with(prefix.as_str()))
            || self
                .excluded_segments
                .iter()
                .any(|fragment| asset_path.contains(fragment.as_str())))
    }

    /// Returns `true` if the package at `package_path` is kept out of the map.
    pub fn excludes_package(&self, package_path: &str) -> bool {
        let stem = package_path
            .strip_suffix(PACKAGE_SUFFIX)
            .unwrap_or(package_path);
        self.excluded_packages.iter().any(|excluded| {
            stem == excluded
                || stem
                    .strip_prefix(excluded.as_str())
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_rejects_code_and_plugins() {
        let filter = AssetFilter::default();
        assert!(filter.allows("Assets/Res/UI/Main.prefab"));
        assert!(!filter.allows("Assets/Res/UI/Main.cs"));
        assert!(!filter.allows("Assets/Res/UI/Main.prefab.meta"));
        assert!(!filter.allows("Assets/Plugins/tool/icon.png"));
        assert!(!filter.allows("Assets/Game/Scripts/icon.png"));
        assert!(!filter.allows("Packages/com.vendor/icon.png"));
    }

    #[test]
    fn excluded_packages_match_whole_segments() {
        let filter = AssetFilter::default();
        assert!(filter.excludes_package("dependencies.ab"));
        assert!(filter.excludes_package("dependencies/shared.ab"));
        assert!(filter.excludes_package("assets.ab"));
        assert!(!filter.excludes_package("dependencies_extra.ab"));
        assert!(!filter.excludes_package("res/ui.ab"));
    }
}
