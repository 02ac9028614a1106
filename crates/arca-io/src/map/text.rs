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

use super::DependencyMap;

/// One record per line: the package count, then each package's path,
/// dependency count and comma-terminated index list, then the asset count
/// and one `path,hash,package,index` line per asset.
pub(super) fn encode_text(map: &DependencyMap) -> String {
    let mut lines = Vec::with_capacity(2 + map.packages.len() * 3 + map.assets.len());
    lines.push(map.packages.len().to_string());
    for package in &map.packages {
        lines.push(package.package_path.clone());
        lines.push(package.dependency_indices.len().to_string());
        lines.push(
            package
                .dependency_indices
                .iter()
                .map(|index| format!("{index},"))
                .collect(),
        );
    }
    lines.push(map.assets.len().to_string());
    lines.extend(map.assets.iter().map(|row| {
        format!(
            "{},{},{},{}",
            row.asset_path, row.name_hash, row.package_path, row.package_index
        )
    }));

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::AssetRow;
    use arca_core::vfs::PackageNode;

    #[test]
    fn empty_dependency_lists_leave_a_blank_line() {
        let mut ui = PackageNode::new("res/ui.ab");
        ui.add_dependency_index(0);
        ui.add_dependency_index(1);
        let map = DependencyMap {
            packages: vec![ui, PackageNode::new("res/common.ab")],
            assets: vec![AssetRow {
                asset_path: "Assets/Res/UI/Main.prefab".into(),
                name_hash: 42,
                package_path: "res/ui.ab".into(),
                package_index: 0,
            }],
        };

        assert_eq!(
            encode_text(&map),
            "2\nres/ui.ab\n2\n0,1,\nres/common.ab\n0\n\n1\nAssets/Res/UI/Main.prefab,42,res/ui.ab,0\n"
        );
    }
}
