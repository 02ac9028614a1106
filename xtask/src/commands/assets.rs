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

use crate::helpers::*;
use anyhow::Result;
use arca_io::manifest::AssetManifest;
use arca_io::pack::{PackWriter, TargetPlatform};
use arca_io::pipeline::{build_all, generate_dependency_map};
use std::path::Path;

/// Writes the binary and text dependency maps.
pub fn map(manifest_path: &Path) -> Result<()> {
    print_task_start("Generating Dependency Map", MAP, CYAN);
    let manifest = AssetManifest::load(manifest_path)?;
    let report = build_all(&manifest, None)?;

    print_success(&format!(
        "Wrote '{}' and '{}'",
        report.map_path.display(),
        report.text_path.display()
    ));
    Ok(())
}

/// Writes the dependency maps, then one pack file per package.
pub fn pack(manifest_path: &Path, target: TargetPlatform) -> Result<()> {
    print_task_start("Packing Assets", PACKAGE, MAGENTA);
    let manifest = AssetManifest::load(manifest_path)?;
    print_info("Target", &target.to_string());

    let writer = PackWriter::new(&manifest.project_root);
    let report = build_all(&manifest, Some((&writer, target)))?;

    if report.package_paths.is_empty() {
        print_success("No packages found to build.");
        return Ok(());
    }
    for path in &report.package_paths {
        println!("  {}{}{} {}", GREEN, CHECK, RESET, path.display());
    }
    print_success(&format!(
        "Built {} packages, dependency map at '{}'",
        report.package_paths.len(),
        report.map_path.display()
    ));
    Ok(())
}

/// Prints every package with its members and dependencies.
pub fn list(manifest_path: &Path) -> Result<()> {
    print_task_start("Listing Packages", MAGNIFIER, YELLOW);
    let manifest = AssetManifest::load(manifest_path)?;
    let generated = generate_dependency_map(&manifest)?;

    for (index, package) in generated.map.packages().iter().enumerate() {
        println!(
            "{}[{}] {}{} -> {:?}",
            BOLD, index, package.package_path, RESET, package.dependency_indices
        );
        for member in &package.members {
            println!("      {} ({})", member.asset_path, member.name_hash);
        }
    }
    print_info(
        "Total",
        &format!(
            "{} packages, {} assets, map is {} bytes",
            generated.map.packages().len(),
            generated.map.assets().len(),
            generated.binary.len()
        ),
    );
    Ok(())
}
