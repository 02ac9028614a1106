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

//! Pure functions mapping source asset paths to package paths, logical
//! names, and lookup hashes.
//!
//! Build tooling and the runtime loader must agree on every function in this
//! module: the build writes hashes and package paths into the dependency map,
//! and the runtime recomputes them from the paths clients request.

/// Suffix appended to every package path.
pub const PACKAGE_SUFFIX: &str = ".ab";

/// Root folder prefix of source asset paths.
pub const ASSET_ROOT: &str = "Assets/";

/// Computes the 32-bit case-insensitive hash used as the asset lookup key.
///
/// The hash runs over UTF-16 code units; only ASCII `A`-`Z` are folded to
/// lowercase. Collisions are neither detected nor resolved.
pub fn name_hash(name: &str) -> i32 {
    name.encode_utf16().fold(0i32, |hash, unit| {
        let unit = if (u16::from(b'A')..=u16::from(b'Z')).contains(&unit) {
            unit + 32
        } else {
            unit
        };
        let hash = hash ^ i32::from(unit);
        hash.wrapping_add(
            (hash << 1)
                .wrapping_add(hash << 4)
                .wrapping_add(hash << 7)
                .wrapping_add(hash << 8)
                .wrapping_add(hash << 24),
        )
    })
}

/// Converts OS separators to forward slashes.
pub fn normalize_separators(path: &str) -> String {
    path.replace('\\', "/")
}

/// Maps a source asset path to the path of the package that owns it.
///
/// The package is the asset's directory, lowercased, with the `assets/` root
/// stripped and [`PACKAGE_SUFFIX`] appended:
/// `Assets/Res/UI/Main/MainWindow.prefab` → `res/ui/main.ab`.
///
/// Returns `None` for a path without a directory component.
pub fn package_path(asset_path: &str) -> Option<String> {
    let lowered = normalize_separators(asset_path).to_lowercase();
    let directory = &lowered[..lowered.rfind('/')?];
    let directory = directory.strip_prefix("assets/").unwrap_or(directory);
    Some(format!("{directory}{PACKAGE_SUFFIX}"))
}

/// Strips the asset root and the extension:
/// `Assets/Res/UI/Main/MainWindow.prefab` → `Res/UI/Main/MainWindow`.
///
/// The extension starts at the first `.` of the file component, so
/// `icon.atlas.png` becomes `icon`. Already-logical names pass through.
pub fn logical_name(asset_path: &str) -> String {
    let path = normalize_separators(asset_path);
    let trimmed = path.strip_prefix(ASSET_ROOT).unwrap_or(&path);
    let file_start = trimmed.rfind('/').map_or(0, |slash| slash + 1);
    match trimmed[file_start..].find('.') {
        Some(dot) => trimmed[..file_start + dot].to_string(),
        None => trimmed.to_string(),
    }
}

/// The name an object is stored under inside its package: the lowercased
/// final component of the logical name.
pub fn object_name(asset_path: &str) -> String {
    let logical = logical_name(asset_path);
    let file = logical.rsplit('/').next().unwrap_or(&logical);
    file.to_lowercase()
}

/// Lookup hash of the asset at `asset_path`, computed over its logical name.
pub fn lookup_hash(asset_path: &str) -> i32 {
    name_hash(&logical_name(asset_path))
}
