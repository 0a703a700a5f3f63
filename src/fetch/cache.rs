use std::path::{Path, PathBuf};

use crate::sources::SourceKind;

/// Extensión de los assets publicados (opus dentro de webm).
pub const ASSET_EXT: &str = "webm";

/// Clave determinista de un asset, derivada de `(fuente, id)`. Dos
/// referencias con la misma clave comparten el mismo artefacto en disco.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetKey {
    kind: SourceKind,
    id: String,
}

impl AssetKey {
    pub fn new(kind: SourceKind, id: impl Into<String>) -> Self {
        Self { kind, id: id.into() }
    }

    /// Nombre de archivo bajo la raíz del caché: `<fuente>-<id>.<ext>`.
    pub fn file_name(&self) -> String {
        format!("{}-{}.{}", self.kind.as_str(), self.id, ASSET_EXT)
    }
}

/// Referencia a un asset ya materializado y legible.
#[derive(Debug, Clone)]
pub struct AssetHandle {
    path: PathBuf,
}

impl AssetHandle {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Caché de assets respaldado por disco. No hace trabajo de red: sólo el
/// esquema de direccionamiento y la comprobación de existencia. El contenido
/// sobrevive reinicios del proceso.
#[derive(Debug)]
pub struct AssetCache {
    root: PathBuf,
}

impl AssetCache {
    pub fn new(root: impl Into<PathBuf>) -> std::io::Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, key: &AssetKey) -> PathBuf {
        self.root.join(key.file_name())
    }

    /// Devuelve el asset si existe y es legible. Un artefacto ausente o
    /// ilegible es un miss, nunca un error: el llamador pasa a descargar.
    pub async fn lookup(&self, key: &AssetKey) -> Option<AssetHandle> {
        let path = self.path_for(key);
        match tokio::fs::File::open(&path).await {
            Ok(_) => Some(AssetHandle::new(path)),
            Err(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> AssetKey {
        AssetKey::new(SourceKind::Youtube, "dQw4w9WgXcQ")
    }

    #[test]
    fn file_name_follows_the_layout() {
        assert_eq!(key().file_name(), "youtube-dQw4w9WgXcQ.webm");
    }

    #[tokio::test]
    async fn absent_artifact_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = AssetCache::new(dir.path()).unwrap();
        assert!(cache.lookup(&key()).await.is_none());
    }

    #[tokio::test]
    async fn published_artifact_is_a_hit() {
        let dir = tempfile::tempdir().unwrap();
        let cache = AssetCache::new(dir.path()).unwrap();
        std::fs::write(cache.path_for(&key()), b"webm").unwrap();

        let handle = cache.lookup(&key()).await.expect("debería ser un hit");
        assert_eq!(handle.path(), cache.path_for(&key()));
    }

    #[tokio::test]
    async fn distinct_ids_address_distinct_files() {
        let dir = tempfile::tempdir().unwrap();
        let cache = AssetCache::new(dir.path()).unwrap();
        let other = AssetKey::new(SourceKind::Youtube, "otro_id_123");

        std::fs::write(cache.path_for(&key()), b"webm").unwrap();
        assert!(cache.lookup(&key()).await.is_some());
        assert!(cache.lookup(&other).await.is_none());
    }
}
