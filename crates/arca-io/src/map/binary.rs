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

//! Binary map codec.
//!
//! Every integer is a little-endian `i32`. Strings are a 7-bit encoded
//! byte length followed by UTF-8 bytes.

use super::{DependencyMap, MapError};
use arca_core::vfs::{PackageNode, ResolvedGraph};

pub(super) fn encode(map: &DependencyMap) -> Result<Vec<u8>, MapError> {
    let mut writer = MapWriter::default();
    writer.count("package", map.packages.len())?;
    for package in &map.packages {
        writer.string(&package.package_path);
        writer.count("dependency", package.dependency_indices.len())?;
        for &index in &package.dependency_indices {
            writer.i32(index);
        }
    }
    writer.count("asset", map.assets.len())?;
    for row in &map.assets {
        writer.i32(row.name_hash);
        writer.i32(row.package_index);
    }
    Ok(writer.bytes)
}

/// Decodes a binary dependency map.
///
/// Any truncation, negative count or invalid string fails the whole decode
/// with [`MapError::Corrupt`]; nothing partial is returned. Index bounds are
/// not checked here. A hash that appears twice keeps its first package.
pub fn decode(bytes: &[u8]) -> Result<ResolvedGraph, MapError> {
    let mut reader = MapReader { bytes, offset: 0 };

    let package_count = reader.count()?;
    let mut packages = Vec::with_capacity(package_count.min(bytes.len()));
    for _ in 0..package_count {
        let mut package = PackageNode::new(reader.string()?);
        let dependency_count = reader.count()?;
        for _ in 0..dependency_count {
            package.add_dependency_index(reader.i32()?);
        }
        packages.push(package);
    }

    let asset_count = reader.count()?;
    let mut table = Vec::with_capacity(asset_count.min(bytes.len() / 8));
    for _ in 0..asset_count {
        let hash = reader.i32()?;
        let index = reader.i32()?;
        table.push((hash, index));
    }

    if reader.remaining() > 0 {
        log::warn!(
            "Ignoring {} trailing bytes after the dependency map",
            reader.remaining()
        );
    }
    log::debug!(
        "Decoded dependency map: {} packages, {} assets",
        packages.len(),
        table.len()
    );
    Ok(ResolvedGraph::new(packages, table))
}

#[derive(Default)]
struct MapWriter {
    bytes: Vec<u8>,
}

impl MapWriter {
    fn i32(&mut self, value: i32) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    fn count(&mut self, what: &'static str, count: usize) -> Result<(), MapError> {
        let value = i32::try_from(count).map_err(|_| MapError::Overflow { what, count })?;
        self.i32(value);
        Ok(())
    }

    fn string(&mut self, value: &str) {
        let mut length = value.len();
        while length >= 0x80 {
            self.bytes.push((length as u8 & 0x7f) | 0x80);
            length >>= 7;
        }
        self.bytes.push(length as u8);
        self.bytes.extend_from_slice(value.as_bytes());
    }
}

struct MapReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl MapReader<'_> {
    fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }

    fn corrupt(&self, reason: impl Into<String>) -> MapError {
        MapError::Corrupt {
            offset: self.offset,
            reason: reason.into(),
        }
    }

    fn take(&mut self, len: usize) -> Result<&[u8], MapError> {
        if self.remaining() < len {
            return Err(self.corrupt(format!(
                "needed {} bytes, {} left",
                len,
                self.remaining()
            )));
        }
        let slice = &self.bytes[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }

    fn i32(&mut self) -> Result<i32, MapError> {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(self.take(4)?);
        Ok(i32::from_le_bytes(raw))
    }

    fn count(&mut self) -> Result<usize, MapError> {
        let value = self.i32()?;
        usize::try_from(value).map_err(|_| self.corrupt(format!("negative count {value}")))
    }

    fn string(&mut self) -> Result<String, MapError> {
        let mut length = 0usize;
        let mut shift = 0;
        loop {
            let byte = self.take(1)?[0];
            length |= usize::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                break;
            }
            shift += 7;
            if shift > 28 {
                return Err(self.corrupt("string length prefix is too long"));
            }
        }
        let raw = self.take(length)?.to_vec();
        String::from_utf8(raw).map_err(|e| self.corrupt(format!("invalid UTF-8: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DependencyMap {
        let mut ui = PackageNode::new("res/ui.ab");
        ui.add_member("Assets/Res/UI/Main.prefab");
        ui.add_dependency_index(1);
        let common = PackageNode::new("res/common.ab");
        let assets = vec![super::super::AssetRow {
            asset_path: "Assets/Res/UI/Main.prefab".into(),
            name_hash: ui.members[0].name_hash,
            package_path: "res/ui.ab".into(),
            package_index: 0,
        }];
        DependencyMap {
            packages: vec![ui, common],
            assets,
        }
    }

    #[test]
    fn layout_matches_the_wire_format() {
        let bytes = encode(&sample()).unwrap();
        assert_eq!(&bytes[..4], &2i32.to_le_bytes());
        assert_eq!(bytes[4], 9);
        assert_eq!(&bytes[5..14], b"res/ui.ab");
        assert_eq!(&bytes[14..18], &1i32.to_le_bytes());
        assert_eq!(&bytes[18..22], &1i32.to_le_bytes());
    }

    #[test]
    fn long_strings_use_multi_byte_prefixes() {
        let mut writer = MapWriter::default();
        let long = "x".repeat(300);
        writer.string(&long);
        assert_eq!(&writer.bytes[..2], &[0xac, 0x02]);

        let mut reader = MapReader {
            bytes: &writer.bytes,
            offset: 0,
        };
        assert_eq!(reader.string().unwrap(), long);
    }

    #[test]
    fn every_truncation_is_reported_as_corrupt() {
        let bytes = encode(&sample()).unwrap();
        for len in 0..bytes.len() {
            assert!(
                matches!(decode(&bytes[..len]), Err(MapError::Corrupt { .. })),
                "prefix of {len} bytes decoded"
            );
        }
        assert!(decode(&bytes).is_ok());
    }

    #[test]
    fn negative_counts_are_corrupt() {
        assert!(matches!(
            decode(&(-1i32).to_le_bytes()),
            Err(MapError::Corrupt { .. })
        ));
    }

    #[test]
    fn trailing_bytes_are_ignored() {
        let mut bytes = encode(&sample()).unwrap();
        bytes.extend_from_slice(&[1, 2, 3]);
        assert_eq!(decode(&bytes).unwrap().len(), 2);
    }
}
