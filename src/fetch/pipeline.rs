use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::sources::TrackRef;

use super::cache::AssetCache;
use super::fetcher::AssetFetcher;

/// Resultado pendiente de una descarga encolada. Se resuelve a `true` cuando
/// el asset quedó materializado y a `false` si esa descarga falló.
#[derive(Debug)]
pub struct DownloadHandle {
    rx: oneshot::Receiver<bool>,
}

impl DownloadHandle {
    pub async fn wait(self) -> bool {
        self.rx.await.unwrap_or(false)
    }

    #[cfg(test)]
    pub(crate) fn resolved(ok: bool) -> Self {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(ok);
        Self { rx }
    }
}

struct Job {
    track: TrackRef,
    done: oneshot::Sender<bool>,
}

/// Serializador de descargas: una cola sin límite drenada por un único
/// worker, así que los fetches corren de a uno y en orden de envío aunque
/// los productores compitan. El fallo de un trabajo no afecta a los
/// siguientes. Subir la concurrencia sería agregar workers sobre el mismo
/// canal.
#[derive(Clone)]
pub struct DownloadPipeline {
    tx: mpsc::UnboundedSender<Job>,
}

impl DownloadPipeline {
    pub fn spawn(fetcher: Arc<dyn AssetFetcher>, cache: Arc<AssetCache>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(worker(rx, fetcher, cache));
        Self { tx }
    }

    /// Encola una descarga y devuelve su resultado pendiente. Si el worker
    /// ya no existe el handle se resuelve a `false`.
    pub fn submit(&self, track: TrackRef) -> DownloadHandle {
        let (done, rx) = oneshot::channel();
        if self.tx.send(Job { track, done }).is_err() {
            warn!("⚠️ El worker de descargas ya no está activo");
        }
        DownloadHandle { rx }
    }
}

async fn worker(
    mut rx: mpsc::UnboundedReceiver<Job>,
    fetcher: Arc<dyn AssetFetcher>,
    cache: Arc<AssetCache>,
) {
    while let Some(job) = rx.recv().await {
        let key = job.track.asset_key();
        let ok = if cache.lookup(&key).await.is_some() {
            debug!("📦 Asset ya en caché: {}", key.file_name());
            true
        } else {
            match fetcher.fetch(&job.track).await {
                Ok(_) => true,
                Err(e) => {
                    warn!("❌ Descarga fallida para {}: {}", job.track.display_title(), e);
                    false
                }
            }
        };
        // El consumidor pudo soltar su handle; no es un error.
        let _ = job.done.send(ok);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlayError;
    use crate::fetch::AssetHandle;
    use crate::sources::{Destination, SourceKind};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use serenity::all::{ChannelId, GuildId, UserId};
    use std::collections::HashSet;
    use std::time::Duration;

    struct FakeFetcher {
        cache: Arc<AssetCache>,
        calls: parking_lot::Mutex<Vec<String>>,
        failing: HashSet<String>,
    }

    #[async_trait]
    impl AssetFetcher for FakeFetcher {
        async fn fetch(&self, track: &TrackRef) -> Result<AssetHandle, PlayError> {
            self.calls.lock().push(track.source_id().to_string());
            tokio::time::sleep(Duration::from_millis(10)).await;
            if self.failing.contains(track.source_id()) {
                return Err(PlayError::Transcode("fallo simulado".into()));
            }
            let path = self.cache.path_for(&track.asset_key());
            std::fs::write(&path, b"webm").unwrap();
            Ok(AssetHandle::new(path))
        }
    }

    fn track(id: &str) -> TrackRef {
        let dest = Destination {
            guild: GuildId::new(1),
            text_channel: ChannelId::new(2),
            voice_channel: ChannelId::new(3),
        };
        TrackRef::new(SourceKind::Youtube, id, dest, UserId::new(9))
    }

    fn harness(failing: &[&str]) -> (DownloadPipeline, Arc<FakeFetcher>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let cache = Arc::new(AssetCache::new(dir.path()).unwrap());
        let fetcher = Arc::new(FakeFetcher {
            cache: cache.clone(),
            calls: parking_lot::Mutex::new(Vec::new()),
            failing: failing.iter().map(|s| s.to_string()).collect(),
        });
        let pipeline = DownloadPipeline::spawn(fetcher.clone(), cache);
        (pipeline, fetcher, dir)
    }

    #[tokio::test]
    async fn downloads_run_in_submission_order() {
        let (pipeline, fetcher, _dir) = harness(&[]);

        let handles: Vec<_> = ["aaa111", "bbb222", "ccc333"]
            .into_iter()
            .map(|id| pipeline.submit(track(id)))
            .collect();
        for handle in handles {
            assert!(handle.wait().await);
        }

        assert_eq!(*fetcher.calls.lock(), vec!["aaa111", "bbb222", "ccc333"]);
    }

    #[tokio::test]
    async fn a_failure_does_not_poison_the_chain() {
        let (pipeline, fetcher, _dir) = harness(&["malo99"]);

        let bad = pipeline.submit(track("malo99"));
        let good = pipeline.submit(track("bueno1"));

        assert!(!bad.wait().await);
        assert!(good.wait().await);
        assert_eq!(fetcher.calls.lock().len(), 2);
    }

    #[tokio::test]
    async fn same_key_downloads_exactly_once() {
        let (pipeline, fetcher, _dir) = harness(&[]);

        let first = pipeline.submit(track("mismo1"));
        let second = pipeline.submit(track("mismo1"));

        assert!(first.wait().await);
        assert!(second.wait().await);
        assert_eq!(fetcher.calls.lock().len(), 1);
    }
}
