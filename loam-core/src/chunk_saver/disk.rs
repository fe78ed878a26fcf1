//! Disk persistence.
//!
//! Layout under the world directory:
//!
//! ```text
//! level.json                      world settings
//! players/<uuid>.json             player spawn positions
//! <dimension>/chunks/<x>.<z>.zst  zstd compressed JSON column data
//! ```
//!
//! Every file is written to a temporary sibling first and renamed into place,
//! so a crash never leaves a half written file behind.

use std::{
    fs,
    io::{self, Read, Write},
    path::{Path, PathBuf},
};

use loam_utils::{BlockPos, ChunkPos};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Provider, ProviderError};
use crate::chunk::ColumnData;
use crate::world::{Dimension, Settings};

const COMPRESSION_LEVEL: i32 = 3;

#[derive(Serialize, Deserialize)]
struct PlayerData {
    spawn: BlockPos,
}

/// Stores a world in a directory.
pub struct DiskProvider {
    root: PathBuf,
}

impl DiskProvider {
    /// Opens or creates a world directory.
    ///
    /// # Errors
    /// Returns an error if the directories cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, ProviderError> {
        let root = root.into();
        fs::create_dir_all(root.join("players"))?;
        log::debug!("Opened world directory {}", root.display());
        Ok(Self { root })
    }

    /// The world directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn column_path(&self, pos: ChunkPos, dimension: Dimension) -> PathBuf {
        self.root
            .join(dimension.name())
            .join("chunks")
            .join(format!("{}.{}.zst", pos.x(), pos.z()))
    }

    fn player_path(&self, id: Uuid) -> PathBuf {
        self.root.join("players").join(format!("{id}.json"))
    }
}

fn read_optional(path: &Path) -> Result<Option<Vec<u8>>, ProviderError> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ProviderError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn compress(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = zstd::Encoder::new(Vec::new(), COMPRESSION_LEVEL)?;
    encoder.write_all(data)?;
    encoder.finish()
}

fn decompress(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut decoder = zstd::Decoder::new(data)?;
    let mut buf = Vec::new();
    decoder.read_to_end(&mut buf)?;
    Ok(buf)
}

impl Provider for DiskProvider {
    fn settings(&self) -> Result<Option<Settings>, ProviderError> {
        match read_optional(&self.root.join("level.json"))? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn save_settings(&self, settings: &Settings) -> Result<(), ProviderError> {
        let bytes = serde_json::to_vec_pretty(settings)?;
        write_atomic(&self.root.join("level.json"), &bytes)
    }

    fn load_column(
        &self,
        pos: ChunkPos,
        dimension: Dimension,
    ) -> Result<Option<ColumnData>, ProviderError> {
        match read_optional(&self.column_path(pos, dimension))? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&decompress(&bytes)?)?)),
            None => Ok(None),
        }
    }

    fn store_column(
        &self,
        pos: ChunkPos,
        dimension: Dimension,
        data: &ColumnData,
    ) -> Result<(), ProviderError> {
        let json = serde_json::to_vec(data)?;
        write_atomic(&self.column_path(pos, dimension), &compress(&json)?)
    }

    fn load_player_spawn(&self, id: Uuid) -> Result<Option<BlockPos>, ProviderError> {
        match read_optional(&self.player_path(id))? {
            Some(bytes) => Ok(Some(serde_json::from_slice::<PlayerData>(&bytes)?.spawn)),
            None => Ok(None),
        }
    }

    fn save_player_spawn(&self, id: Uuid, pos: BlockPos) -> Result<(), ProviderError> {
        let bytes = serde_json::to_vec_pretty(&PlayerData { spawn: pos })?;
        write_atomic(&self.player_path(id), &bytes)
    }

    fn close(&self) -> Result<(), ProviderError> {
        log::debug!("Closed world directory {}", self.root.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::{BlockEntityData, EntityData};
    use loam_utils::Identifier;

    #[test]
    fn test_open_creates_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let provider = DiskProvider::open(tmp.path().join("world")).unwrap();
        assert!(provider.root().join("players").is_dir());
        assert!(provider.settings().unwrap().is_none());
    }

    #[test]
    fn test_column_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let provider = DiskProvider::open(tmp.path()).unwrap();
        let pos = ChunkPos::new(-3, 7);
        let data = ColumnData {
            sub_chunks: Vec::new(),
            block_entities: vec![BlockEntityData {
                pos: BlockPos::new(-40, 70, 120),
                data: serde_json::json!({ "items": 3 }),
            }],
            entities: vec![EntityData {
                kind: Identifier::vanilla_static("pig"),
                data: serde_json::json!([1.0, 2.0, 3.0]),
            }],
        };

        assert!(provider.load_column(pos, Dimension::Overworld).unwrap().is_none());
        provider.store_column(pos, Dimension::Overworld, &data).unwrap();
        assert_eq!(
            provider.load_column(pos, Dimension::Overworld).unwrap(),
            Some(data)
        );
        assert!(provider.load_column(pos, Dimension::Nether).unwrap().is_none());
    }

    #[test]
    fn test_settings_and_players_persist() {
        let tmp = tempfile::tempdir().unwrap();
        let id = Uuid::new_v4();
        {
            let provider = DiskProvider::open(tmp.path()).unwrap();
            let settings = Settings {
                name: "Loam".to_owned(),
                time: 1234,
                ..Settings::default()
            };
            provider.save_settings(&settings).unwrap();
            provider.save_player_spawn(id, BlockPos::new(5, 80, -5)).unwrap();
        }
        let provider = DiskProvider::open(tmp.path()).unwrap();
        let settings = provider.settings().unwrap().expect("saved");
        assert_eq!(settings.name, "Loam");
        assert_eq!(settings.time, 1234);
        assert_eq!(
            provider.load_player_spawn(id).unwrap(),
            Some(BlockPos::new(5, 80, -5))
        );
        assert!(provider.load_player_spawn(Uuid::new_v4()).unwrap().is_none());
    }
}
