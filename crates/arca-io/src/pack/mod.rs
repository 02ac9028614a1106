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

//! Pack files: the on-disk form of a package.
//!
//! ```text
//! "ARCA" | u32 version | u32 table length | table | data
//! ```
//!
//! The table is a bincode-encoded list of [`PackEntry`]. Each entry's data is
//! an LZ4 block stored at `offset` (relative to the start of the data
//! section) and checked against a BLAKE3 hash of the uncompressed bytes.

mod writer;

pub use writer::*;

use arca_core::asset::{AssetKind, AssetObject};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Leading bytes of every pack file.
pub const PACK_MAGIC: &[u8; 4] = b"ARCA";
/// Current pack format version.
pub const PACK_VERSION: u32 = 1;

const HEADER_LEN: usize = 12;

/// Why a pack file could not be read or an object could not be extracted.
#[derive(Debug, Error)]
pub enum PackError {
    /// The file does not start with [`PACK_MAGIC`].
    #[error("not a pack file (bad magic)")]
    BadMagic,
    /// The version field is not [`PACK_VERSION`].
    #[error("unsupported pack version {0}")]
    UnsupportedVersion(u32),
    /// The header, table or an object lies past the end of the file.
    #[error("pack file is truncated")]
    Truncated,
    /// The table could not be decoded.
    #[error("pack table is unreadable: {0}")]
    Table(#[from] bincode::error::DecodeError),
    /// The table could not be encoded.
    #[error("pack table could not be written: {0}")]
    TableEncode(#[from] bincode::error::EncodeError),
    /// No entry has the requested name.
    #[error("no object named '{0}' in pack")]
    MissingEntry(String),
    /// The entry exists but has another type.
    #[error("object '{name}' is a {actual}, expected {expected}")]
    KindMismatch {
        /// Entry name.
        name: String,
        /// Requested kind.
        expected: AssetKind,
        /// Recorded type name.
        actual: String,
    },
    /// The LZ4 block is malformed.
    #[error("object '{0}' failed to decompress: {1}")]
    Decompress(String, lz4_flex::block::DecompressError),
    /// The decompressed bytes do not hash to the recorded value.
    #[error("object '{0}' does not match its recorded checksum")]
    ChecksumMismatch(String),
    /// Reading the file failed.
    #[error("pack I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Table entry describing one packed object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackEntry {
    /// Lookup name: the lowercased file stem of the source asset.
    pub name: String,
    /// Type name: the lowercased source extension.
    pub type_name: String,
    /// Offset of the compressed block within the data section.
    pub offset: u64,
    /// Compressed block size.
    pub size: u64,
    /// Size after decompression.
    pub uncompressed_size: u64,
    /// BLAKE3 hash of the uncompressed bytes.
    pub hash: [u8; 32],
}

/// An object to be written into a pack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackInput {
    /// Lookup name.
    pub name: String,
    /// Type name.
    pub type_name: String,
    /// Uncompressed data.
    pub bytes: Vec<u8>,
}

/// Serializes `objects` into pack file bytes.
pub fn encode_pack(objects: &[PackInput]) -> Result<Vec<u8>, PackError> {
    let mut entries = Vec::with_capacity(objects.len());
    let mut data = Vec::new();
    for object in objects {
        let block = lz4_flex::block::compress(&object.bytes);
        entries.push(PackEntry {
            name: object.name.clone(),
            type_name: object.type_name.clone(),
            offset: data.len() as u64,
            size: block.len() as u64,
            uncompressed_size: object.bytes.len() as u64,
            hash: *blake3::hash(&object.bytes).as_bytes(),
        });
        data.extend_from_slice(&block);
    }

    let table = bincode::serde::encode_to_vec(&entries, bincode::config::standard())?;
    let mut bytes = Vec::with_capacity(HEADER_LEN + table.len() + data.len());
    bytes.extend_from_slice(PACK_MAGIC);
    bytes.extend_from_slice(&PACK_VERSION.to_le_bytes());
    bytes.extend_from_slice(&(table.len() as u32).to_le_bytes());
    bytes.extend_from_slice(&table);
    bytes.extend_from_slice(&data);
    Ok(bytes)
}

/// A pack file held in memory.
#[derive(Debug)]
pub struct PackFile {
    entries: Vec<PackEntry>,
    bytes: Vec<u8>,
    data_start: usize,
}

impl PackFile {
    /// Parses the header and table of a pack. Object data is only touched by
    /// [`PackFile::extract`].
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, PackError> {
        if bytes.len() < HEADER_LEN {
            return Err(PackError::Truncated);
        }
        if &bytes[..4] != PACK_MAGIC {
            return Err(PackError::BadMagic);
        }
        let version = read_u32(&bytes[4..8]);
        if version != PACK_VERSION {
            return Err(PackError::UnsupportedVersion(version));
        }
        let table_len = read_u32(&bytes[8..12]) as usize;
        let data_start = HEADER_LEN
            .checked_add(table_len)
            .filter(|&end| end <= bytes.len())
            .ok_or(PackError::Truncated)?;

        let (entries, _): (Vec<PackEntry>, usize) = bincode::serde::decode_from_slice(
            &bytes[HEADER_LEN..data_start],
            bincode::config::standard(),
        )?;
        Ok(Self {
            entries,
            bytes,
            data_start,
        })
    }

    /// Reads and parses the pack at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PackError> {
        Self::from_bytes(std::fs::read(path)?)
    }

    /// The table of contents.
    pub fn entries(&self) -> &[PackEntry] {
        &self.entries
    }

    /// Finds an entry by name, ignoring case.
    pub fn entry(&self, name: &str) -> Option<&PackEntry> {
        self.entries
            .iter()
            .find(|entry| entry.name.eq_ignore_ascii_case(name))
    }

    /// Finds the entry stored under `name` whose type satisfies `kind`.
    ///
    /// Several objects may share a name inside one package (a prefab and a
    /// texture with the same stem), so the kind takes part in the lookup.
    pub fn entry_of_kind(&self, name: &str, kind: &AssetKind) -> Option<&PackEntry> {
        self.entries
            .iter()
            .find(|entry| {
                entry.name.eq_ignore_ascii_case(name) && kind.matches(&entry.type_name)
            })
    }

    /// Decompresses and verifies the object stored under `name`.
    ///
    /// Fails with [`PackError::KindMismatch`] only when some entry carries the
    /// name but none of them has a matching type.
    pub fn extract(&self, name: &str, kind: &AssetKind) -> Result<AssetObject, PackError> {
        let entry = match self.entry_of_kind(name, kind) {
            Some(entry) => entry,
            None => {
                return Err(match self.entry(name) {
                    Some(named) => PackError::KindMismatch {
                        name: named.name.clone(),
                        expected: kind.clone(),
                        actual: named.type_name.clone(),
                    },
                    None => PackError::MissingEntry(name.to_string()),
                })
            }
        };

        let start = usize::try_from(entry.offset)
            .ok()
            .and_then(|offset| self.data_start.checked_add(offset))
            .ok_or(PackError::Truncated)?;
        let end = usize::try_from(entry.size)
            .ok()
            .and_then(|size| start.checked_add(size))
            .filter(|&end| end <= self.bytes.len())
            .ok_or(PackError::Truncated)?;
        let uncompressed_size =
            usize::try_from(entry.uncompressed_size).map_err(|_| PackError::Truncated)?;

        let bytes = lz4_flex::block::decompress(&self.bytes[start..end], uncompressed_size)
            .map_err(|e| PackError::Decompress(entry.name.clone(), e))?;
        if blake3::hash(&bytes).as_bytes() != &entry.hash {
            return Err(PackError::ChecksumMismatch(entry.name.clone()));
        }

        Ok(AssetObject {
            name: entry.name.clone(),
            type_name: entry.type_name.clone(),
            bytes,
        })
    }
}

fn read_u32(bytes: &[u8]) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(bytes);
    u32::from_le_bytes(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(name: &str, type_name: &str, bytes: &[u8]) -> PackInput {
        PackInput {
            name: name.into(),
            type_name: type_name.into(),
            bytes: bytes.to_vec(),
        }
    }

    #[test]
    fn extracts_objects_by_name_and_kind() {
        let bytes = encode_pack(&[
            input("main", "prefab", b"main window"),
            input("strings", "txt", &[7; 512]),
        ])
        .unwrap();
        let pack = PackFile::from_bytes(bytes).unwrap();

        assert_eq!(pack.entries().len(), 2);
        let main = pack.extract("Main", &AssetKind::of("prefab")).unwrap();
        assert_eq!(main.bytes, b"main window");
        assert_eq!(pack.extract("strings", &AssetKind::Any).unwrap().bytes, vec![7; 512]);
        assert!(matches!(
            pack.extract("strings", &AssetKind::of("prefab")),
            Err(PackError::KindMismatch { .. })
        ));
        assert!(matches!(
            pack.extract("missing", &AssetKind::Any),
            Err(PackError::MissingEntry(_))
        ));
    }

    #[test]
    fn same_name_objects_are_told_apart_by_kind() {
        let bytes = encode_pack(&[
            input("main", "prefab", b"main window"),
            input("main", "png", b"\x89PNG pixels"),
        ])
        .unwrap();
        let pack = PackFile::from_bytes(bytes).unwrap();

        let texture = pack.extract("main", &AssetKind::of("png")).unwrap();
        assert_eq!(texture.type_name, "png");
        assert_eq!(texture.bytes, b"\x89PNG pixels");
        let prefab = pack.extract("MAIN", &AssetKind::of("prefab")).unwrap();
        assert_eq!(prefab.bytes, b"main window");

        match pack.extract("main", &AssetKind::of("txt")) {
            Err(PackError::KindMismatch { actual, .. }) => assert_eq!(actual, "prefab"),
            other => panic!("expected a kind mismatch, got {:?}", other.map(|o| o.type_name)),
        }
    }

    #[test]
    fn rejects_foreign_and_short_files() {
        assert!(matches!(
            PackFile::from_bytes(b"ARC".to_vec()),
            Err(PackError::Truncated)
        ));
        assert!(matches!(
            PackFile::from_bytes(b"ZIP\0\x01\0\0\0\0\0\0\0".to_vec()),
            Err(PackError::BadMagic)
        ));
    }

    #[test]
    fn detects_corrupted_data() {
        let mut bytes = encode_pack(&[input("main", "prefab", b"aaaaaaaaaaaaaaaa")]).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        let pack = PackFile::from_bytes(bytes).unwrap();
        assert!(matches!(
            pack.extract("main", &AssetKind::Any),
            Err(PackError::ChecksumMismatch(_) | PackError::Decompress(..))
        ));
    }
}
