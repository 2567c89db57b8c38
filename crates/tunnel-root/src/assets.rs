use std::fs::File;
use std::io::Read;
use std::path::{Component, Path, PathBuf};

use tunnel_backend::AssetStore;

/// Serves bundled binaries from a directory laid out as `<abi>/<name>.bin`.
#[derive(Debug, Clone)]
pub struct DirAssetStore {
    root: PathBuf,
}

impl DirAssetStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, key: &str) -> std::io::Result<PathBuf> {
        let relative = Path::new(key);
        let is_contained = !key.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !is_contained {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("asset key {key:?} escapes the asset directory"),
            ));
        }
        Ok(self.root.join(relative))
    }
}

impl AssetStore for DirAssetStore {
    fn open(&self, key: &str) -> std::io::Result<Box<dyn Read + Send>> {
        let file = File::open(self.resolve(key)?)?;
        Ok(Box::new(file))
    }

    fn size(&self, key: &str) -> std::io::Result<u64> {
        let metadata = std::fs::metadata(self.resolve(key)?)?;
        if !metadata.is_file() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("asset {key} is not a regular file"),
            ));
        }
        Ok(metadata.len())
    }
}
