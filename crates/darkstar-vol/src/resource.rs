//! Search across loose directories and mounted volumes.

use std::fs;
use std::path::{Path, PathBuf};

use darkstar_common::MemStream;
use darkstar_persist::{PersistObject, Registry};

use crate::{Error, Result, Volume};

/// A file found by [`ResourceManager::enumerate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundFile {
    pub name: String,
    /// Index of the mount holding the file.
    pub mount: usize,
}

/// Ordered set of mounts. Directories are searched before volumes, each in
/// the order they were added.
#[derive(Debug, Default)]
pub struct ResourceManager {
    directories: Vec<PathBuf>,
    volumes: Vec<Volume>,
}

impl ResourceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a directory of loose files.
    pub fn add_directory(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.directories.push(path.into());
        self
    }

    /// Open and mount a volume file.
    pub fn add_volume_file(&mut self, path: impl AsRef<Path>) -> Result<&mut Self> {
        let volume = Volume::open(path)?;
        Ok(self.add_volume(volume))
    }

    /// Mount an already opened volume.
    pub fn add_volume(&mut self, volume: Volume) -> &mut Self {
        self.volumes.push(volume);
        self
    }

    /// Number of mounts.
    pub fn mount_count(&self) -> usize {
        self.directories.len() + self.volumes.len()
    }

    /// Name of mount `index`.
    pub fn mount_name(&self, index: usize) -> Option<String> {
        if let Some(path) = self.directories.get(index) {
            return Some(path.display().to_string());
        }
        self.volumes
            .get(index - self.directories.len())
            .map(|volume| volume.name().to_string())
    }

    /// Read `name` from the first mount holding it, or only from mount
    /// `only` when given.
    pub fn open_file(&self, name: &str, only: Option<usize>) -> Result<Vec<u8>> {
        let wanted = |index: usize| only.map_or(true, |only| only == index);

        for (index, dir) in self.directories.iter().enumerate() {
            if !wanted(index) {
                continue;
            }
            let path = dir.join(name);
            if path.is_file() {
                log::debug!("loaded {} from {}", name, dir.display());
                return Ok(fs::read(path)?);
            }
        }

        let base = self.directories.len();
        for (index, volume) in self.volumes.iter().enumerate() {
            if !wanted(base + index) {
                continue;
            }
            if let Some(entry) = volume.find(name) {
                log::debug!("loaded {} from volume {}", name, volume.name());
                return volume.read(entry);
            }
        }

        Err(Error::EntryNotFound(name.to_string()))
    }

    /// Read `name` and rebuild the persisted object it holds.
    pub fn open_object(&self, name: &str, registry: &Registry, only: Option<usize>) -> Result<Box<dyn PersistObject>> {
        let data = self.open_file(name, only)?;
        Ok(registry.create_from_stream(&mut MemStream::new(&data[..]))?)
    }

    /// List files, optionally restricted to one mount or one extension.
    pub fn enumerate(&self, only: Option<usize>, ext: Option<&str>) -> Result<Vec<FoundFile>> {
        let wanted = |index: usize| only.map_or(true, |only| only == index);
        let matches_ext = |name: &str| match ext {
            None => true,
            Some(ext) => Path::new(name)
                .extension()
                .and_then(|own| own.to_str())
                .is_some_and(|own| own.eq_ignore_ascii_case(ext.trim_start_matches('.'))),
        };

        let mut found = Vec::new();
        for (index, dir) in self.directories.iter().enumerate() {
            if !wanted(index) {
                continue;
            }
            for item in fs::read_dir(dir)? {
                let item = item?;
                let file_name = item.file_name();
                let Some(name) = file_name.to_str().map(str::to_string) else {
                    continue;
                };
                if item.file_type()?.is_file() && matches_ext(&name) {
                    found.push(FoundFile { name, mount: index });
                }
            }
        }

        let base = self.directories.len();
        for (index, volume) in self.volumes.iter().enumerate() {
            if !wanted(base + index) {
                continue;
            }
            found.extend(volume.enumerate(ext).map(|entry| FoundFile {
                name: entry.name.clone(),
                mount: base + index,
            }));
        }
        Ok(found)
    }

    /// Mounts in search order.
    pub fn mounts(&self) -> impl Iterator<Item = String> + '_ {
        (0..self.mount_count()).filter_map(|index| self.mount_name(index))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::volume::tests::{build_volume, TestFile};

    fn temp_dir() -> PathBuf {
        static NEXT: AtomicUsize = AtomicUsize::new(0);
        let dir = std::env::temp_dir().join(format!(
            "darkstar-vol-{}-{}",
            std::process::id(),
            NEXT.fetch_add(1, Ordering::Relaxed)
        ));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn manager(dir: &Path) -> ResourceManager {
        let volume = Volume::from_bytes(
            "base.vol",
            build_volume(&[
                TestFile::plain("shared.txt", b"from volume"),
                TestFile::plain("only.bmp", b"volume bitmap"),
            ]),
        )
        .unwrap();

        let mut manager = ResourceManager::new();
        manager.add_directory(dir).add_volume(volume);
        manager
    }

    #[test]
    fn test_directories_searched_first() {
        let dir = temp_dir();
        fs::write(dir.join("shared.txt"), b"from disk").unwrap();
        let manager = manager(&dir);

        assert_eq!(manager.open_file("shared.txt", None).unwrap(), b"from disk");
        assert_eq!(manager.open_file("shared.txt", Some(1)).unwrap(), b"from volume");
        assert_eq!(manager.open_file("ONLY.bmp", None).unwrap(), b"volume bitmap");
        assert!(matches!(
            manager.open_file("only.bmp", Some(0)),
            Err(Error::EntryNotFound(_))
        ));
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_enumerate_mounts() {
        let dir = temp_dir();
        fs::write(dir.join("loose.bmp"), b"x").unwrap();
        let manager = manager(&dir);

        let mut bitmaps = manager.enumerate(None, Some("bmp")).unwrap();
        bitmaps.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(
            bitmaps,
            [
                FoundFile { name: "loose.bmp".into(), mount: 0 },
                FoundFile { name: "only.bmp".into(), mount: 1 },
            ]
        );
        assert_eq!(manager.enumerate(Some(1), None).unwrap().len(), 2);
        assert_eq!(manager.mounts().last().as_deref(), Some("base.vol"));
        assert_eq!(manager.mount_name(2), None);
        fs::remove_dir_all(dir).unwrap();
    }
}
