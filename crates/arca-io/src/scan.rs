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

//! Source tree scanning.

use anyhow::{Context, Result};
use globset::Glob;
use std::path::Path;
use walkdir::WalkDir;

/// Finds the files below `project_root/dir` whose name matches `pattern`.
///
/// Returned paths are relative to `project_root`, use forward slashes and
/// are sorted. A missing directory yields an empty list.
pub fn scan_source_tree(
    project_root: impl AsRef<Path>,
    dir: impl AsRef<Path>,
    pattern: &str,
) -> Result<Vec<String>> {
    let project_root = project_root.as_ref();
    let scan_root = project_root.join(dir.as_ref());
    if !scan_root.is_dir() {
        log::warn!("Source directory '{}' does not exist", scan_root.display());
        return Ok(Vec::new());
    }

    let matcher = Glob::new(pattern)
        .with_context(|| format!("Invalid source pattern '{pattern}'"))?
        .compile_matcher();

    let mut found = Vec::new();
    for entry in WalkDir::new(&scan_root) {
        let entry = entry
            .with_context(|| format!("Failed to walk '{}'", scan_root.display()))?;
        if !entry.file_type().is_file() || !matcher.is_match(entry.file_name()) {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(project_root)
            .with_context(|| format!("'{}' is outside the project", entry.path().display()))?;
        let relative = relative
            .to_str()
            .with_context(|| format!("'{}' is not valid UTF-8", relative.display()))?;
        found.push(relative.replace('\\', "/"));
    }
    found.sort();
    log::debug!(
        "Found {} files matching '{}' in '{}'",
        found.len(),
        pattern,
        scan_root.display()
    );
    Ok(found)
}
