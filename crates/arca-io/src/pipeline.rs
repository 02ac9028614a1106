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

//! Build entry points: scan the manifest's sources, resolve the dependency
//! map, write it out and optionally build the packages.

use crate::builder::{DependencySource, GraphBuilder};
use crate::manifest::AssetManifest;
use crate::map::{write_map_files, DependencyMap, MapError};
use crate::pack::{PackageBuilder, PackageSpec, TargetPlatform};
use crate::scan::scan_source_tree;
use anyhow::{Context, Result};
use std::path::PathBuf;

/// Everything produced by one dependency map build.
#[derive(Debug, Clone)]
pub struct GeneratedMap {
    /// The resolved map.
    pub map: DependencyMap,
    /// Binary encoding of `map`.
    pub binary: Vec<u8>,
    /// Text encoding of `map`.
    pub text: String,
    /// Every package found, with its members, ready for packaging.
    pub packages: Vec<PackageSpec>,
}

/// Assigns `roots` to packages, computes closures and encodes the result.
///
/// Roots that cannot be assigned are logged and skipped.
pub fn generate_from_roots<D, S>(
    mut builder: GraphBuilder<D>,
    roots: &[S],
) -> Result<GeneratedMap, MapError>
where
    D: DependencySource,
    S: AsRef<str>,
{
    let assigned = builder.assign_all(roots);
    log::info!(
        "Assigned {}/{} root assets to {} packages",
        assigned,
        roots.len(),
        builder.package_count()
    );

    let closures = builder.build_dependency_map();
    let map = DependencyMap::resolve(&builder, &closures);
    let binary = map.encode()?;
    let text = map.encode_text();
    let packages = builder
        .packages()
        .map(|package| PackageSpec {
            package_path: package.package_path.clone(),
            members: package
                .members
                .iter()
                .map(|member| member.asset_path.clone())
                .collect(),
        })
        .collect();

    Ok(GeneratedMap {
        map,
        binary,
        text,
        packages,
    })
}

/// Scans every source directory of `manifest` and builds the dependency map.
pub fn generate_dependency_map(manifest: &AssetManifest) -> Result<GeneratedMap> {
    let mut roots = Vec::new();
    for source in &manifest.sources {
        roots.extend(scan_source_tree(
            &manifest.project_root,
            &source.path,
            &source.pattern,
        )?);
    }
    let builder = GraphBuilder::with_filter(manifest.dependency_table(), manifest.filter.clone());
    generate_from_roots(builder, &roots).context("Failed to generate the dependency map")
}

/// Output locations of a full build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    /// Binary dependency map.
    pub map_path: PathBuf,
    /// Text dependency map.
    pub text_path: PathBuf,
    /// Package files, empty when packaging was skipped.
    pub package_paths: Vec<PathBuf>,
}

/// Generates the dependency map, writes both forms to the manifest's map
/// directory and, if a packager is given, builds every package for `target`.
pub fn build_all(
    manifest: &AssetManifest,
    packager: Option<(&dyn PackageBuilder, TargetPlatform)>,
) -> Result<BuildReport> {
    let generated = generate_dependency_map(manifest)?;
    let map_dir = manifest.project_root.join(&manifest.map_dir);
    let (map_path, text_path) = write_map_files(&map_dir, &manifest.map_name, &generated.map)
        .with_context(|| format!("Failed to write the dependency map to '{}'", map_dir.display()))?;

    let package_paths = match packager {
        Some((packager, target)) => {
            let output_dir = manifest.project_root.join(&manifest.output_dir);
            packager
                .build_packages(&output_dir, &generated.packages, target)
                .context("Failed to build packages")?
        }
        None => Vec::new(),
    };

    Ok(BuildReport {
        map_path,
        text_path,
        package_paths,
    })
}
