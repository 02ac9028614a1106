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

use super::{encode_pack, PackInput};
use crate::builder::BuildError;
use arca_core::asset::naming;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Platforms packages can be built for. Each gets its own output directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TargetPlatform {
    /// 64-bit Windows desktop.
    #[default]
    Windows64,
    /// 64-bit Linux desktop.
    Linux64,
    /// macOS desktop.
    MacOs,
    /// Android devices.
    Android,
    /// iOS devices.
    Ios,
}

impl TargetPlatform {
    /// Every supported platform.
    pub const ALL: [TargetPlatform; 5] = [
        TargetPlatform::Windows64,
        TargetPlatform::Linux64,
        TargetPlatform::MacOs,
        TargetPlatform::Android,
        TargetPlatform::Ios,
    ];

    /// Name of the platform's output directory.
    pub fn dir_name(self) -> &'static str {
        match self {
            TargetPlatform::Windows64 => "StandaloneWindows64",
            TargetPlatform::Linux64 => "StandaloneLinux64",
            TargetPlatform::MacOs => "StandaloneOSX",
            TargetPlatform::Android => "Android",
            TargetPlatform::Ios => "iOS",
        }
    }
}

impl fmt::Display for TargetPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

impl FromStr for TargetPlatform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "windows" | "windows64" | "standalonewindows64" => Ok(TargetPlatform::Windows64),
            "linux" | "linux64" | "standalonelinux64" => Ok(TargetPlatform::Linux64),
            "macos" | "osx" | "standaloneosx" => Ok(TargetPlatform::MacOs),
            "android" => Ok(TargetPlatform::Android),
            "ios" => Ok(TargetPlatform::Ios),
            other => Err(format!("unknown target platform '{other}'")),
        }
    }
}

/// A package to build and the source assets it contains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSpec {
    /// Package path relative to the platform directory, e.g. `res/ui.ab`.
    pub package_path: String,
    /// Source paths of the members, relative to the project root.
    pub members: Vec<String>,
}

/// The packaging step: turns package specs into files under `output_dir`.
pub trait PackageBuilder {
    /// Builds every package and returns the written paths.
    fn build_packages(
        &self,
        output_dir: &Path,
        packages: &[PackageSpec],
        target: TargetPlatform,
    ) -> Result<Vec<PathBuf>, BuildError>;
}

/// Writes packages as pack files, reading member sources below a project root.
#[derive(Debug, Clone)]
pub struct PackWriter {
    project_root: PathBuf,
}

impl PackWriter {
    /// Creates a writer reading sources relative to `project_root`.
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
        }
    }

    fn read_member(&self, member: &str) -> Result<PackInput, BuildError> {
        let source = self.project_root.join(member);
        let bytes = fs::read(&source).map_err(|e| {
            BuildError::Pipeline(format!("cannot read '{}': {}", source.display(), e))
        })?;
        let type_name = Path::new(member)
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        Ok(PackInput {
            name: naming::object_name(member),
            type_name,
            bytes,
        })
    }
}

impl PackageBuilder for PackWriter {
    fn build_packages(
        &self,
        output_dir: &Path,
        packages: &[PackageSpec],
        target: TargetPlatform,
    ) -> Result<Vec<PathBuf>, BuildError> {
        let platform_dir = output_dir.join(target.dir_name());
        let mut written = Vec::with_capacity(packages.len());

        for package in packages {
            let objects = package
                .members
                .iter()
                .map(|member| self.read_member(member))
                .collect::<Result<Vec<_>, _>>()?;
            let bytes =
                encode_pack(&objects).map_err(|e| BuildError::Pipeline(e.to_string()))?;

            let path = platform_dir.join(&package.package_path);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|e| {
                    BuildError::Pipeline(format!("cannot create '{}': {}", parent.display(), e))
                })?;
            }
            fs::write(&path, &bytes).map_err(|e| {
                BuildError::Pipeline(format!("cannot write '{}': {}", path.display(), e))
            })?;
            log::debug!(
                "Packed {} objects into {} ({} bytes)",
                objects.len(),
                path.display(),
                bytes.len()
            );
            written.push(path);
        }

        log::info!(
            "Built {} packages for {} in {}",
            written.len(),
            target,
            platform_dir.display()
        );
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pack::PackFile;
    use arca_core::asset::AssetKind;

    #[test]
    fn platforms_parse_from_common_names() {
        assert_eq!("linux".parse::<TargetPlatform>(), Ok(TargetPlatform::Linux64));
        assert_eq!("StandaloneOSX".parse::<TargetPlatform>(), Ok(TargetPlatform::MacOs));
        assert!("amiga".parse::<TargetPlatform>().is_err());
        for platform in TargetPlatform::ALL {
            assert_eq!(platform.to_string().parse::<TargetPlatform>(), Ok(platform));
        }
    }

    #[test]
    fn packs_land_under_the_platform_directory() {
        let project = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        fs::create_dir_all(project.path().join("Assets/Res/UI")).unwrap();
        fs::write(project.path().join("Assets/Res/UI/Main.prefab"), b"window").unwrap();

        let written = PackWriter::new(project.path())
            .build_packages(
                out.path(),
                &[PackageSpec {
                    package_path: "res/ui.ab".into(),
                    members: vec!["Assets/Res/UI/Main.prefab".into()],
                }],
                TargetPlatform::Linux64,
            )
            .unwrap();

        assert_eq!(written, [out.path().join("StandaloneLinux64/res/ui.ab")]);
        let pack = PackFile::open(&written[0]).unwrap();
        let object = pack.extract("main", &AssetKind::of("prefab")).unwrap();
        assert_eq!(object.bytes, b"window");
    }

    #[test]
    fn missing_sources_fail_the_pipeline() {
        let project = tempfile::tempdir().unwrap();
        let result = PackWriter::new(project.path()).build_packages(
            project.path(),
            &[PackageSpec {
                package_path: "res/ui.ab".into(),
                members: vec!["Assets/Res/UI/Gone.prefab".into()],
            }],
            TargetPlatform::default(),
        );
        assert!(matches!(result, Err(BuildError::Pipeline(_))));
    }
}
