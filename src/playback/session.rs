use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{oneshot, Notify};
use tracing::{debug, info, warn};

use crate::fetch::AssetCache;
use crate::ui::notices::Notices;

use super::queue::{PlaybackQueue, QueueItem};
use super::transport::Transport;

/// Estado compartido de una sesión de reproducción (un guild): la cola, el
/// despertador del runner y la ranura de cancelación de un solo disparo.
///
/// Los productores sólo tienen dos operaciones, [`submit`](Session::submit)
/// y [`cancel`](Session::cancel); todo lo demás es del runner. La ranura de
/// cancelación se arma al arrancar cada track y la consume quien llegue
/// primero: el fin natural o un cancel explícito.
pub struct Session {
    queue: Mutex<PlaybackQueue>,
    wake: Notify,
    cancel: Mutex<Option<oneshot::Sender<bool>>>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(PlaybackQueue::new()),
            wake: Notify::new(),
            cancel: Mutex::new(None),
        }
    }

    /// Agrega un lote al final de la cola y despierta al runner si estaba
    /// ocioso. `Notify` guarda el permiso si el runner aún no espera, así
    /// que no hay carrera entre encolar y dormirse.
    pub fn submit(&self, items: Vec<QueueItem>) {
        if items.is_empty() {
            return;
        }
        let pending = {
            let mut queue = self.queue.lock();
            queue.append(items);
            queue.len()
        };
        debug!("📥 Cola con {} elementos tras el envío", pending);
        self.wake.notify_one();
    }

    /// Dispara la señal de cancelación del track en vuelo, si hay uno.
    /// Con `clear_all` además vacía la cola antes de disparar, de modo que
    /// todo lo enviado después de que esta llamada retorne sí se acepta.
    /// Devuelve `false` (sin tocar nada) si no hay nada reproduciéndose.
    pub fn cancel(&self, clear_all: bool) -> bool {
        let Some(tx) = self.cancel.lock().take() else {
            return false;
        };
        if clear_all {
            let dropped = self.queue.lock().clear();
            if dropped > 0 {
                info!("🗑️ {} elementos descartados de la cola", dropped);
            }
        }
        let _ = tx.send(clear_all);
        true
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    fn arm(&self) -> oneshot::Receiver<bool> {
        let (tx, rx) = oneshot::channel();
        *self.cancel.lock() = Some(tx);
        rx
    }

    fn disarm(&self) {
        self.cancel.lock().take();
    }

    fn pop(&self) -> Option<QueueItem> {
        self.queue.lock().pop()
    }

    fn drain(&self) -> usize {
        self.queue.lock().clear()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// El único consumidor de una sesión: saca tracks de a uno, espera su
/// descarga, los reproduce y corre la carrera fin-natural contra cancel.
/// Nunca hay dos tracks de la misma sesión sonando a la vez.
pub struct QueueRunner {
    session: Arc<Session>,
    cache: Arc<AssetCache>,
    transport: Arc<dyn Transport>,
    notices: Arc<dyn Notices>,
}

impl QueueRunner {
    pub fn new(
        session: Arc<Session>,
        cache: Arc<AssetCache>,
        transport: Arc<dyn Transport>,
        notices: Arc<dyn Notices>,
    ) -> Self {
        Self {
            session,
            cache,
            transport,
            notices,
        }
    }

    pub fn spawn(self) {
        tokio::spawn(self.run());
    }

    async fn run(self) {
        loop {
            let Some(item) = self.session.pop() else {
                // Ocioso hasta el próximo lote.
                self.session.wake.notified().await;
                continue;
            };
            self.step(item).await;
        }
    }

    /// Procesa un track de punta a punta. Los fallos por-elemento se
    /// reportan a su canal de origen y no detienen la cola; un fallo al
    /// entrar al canal de voz descarta el lote completo.
    async fn step(&self, item: QueueItem) {
        let QueueItem {
            track,
            download,
            placeholder,
            ..
        } = item;
        let dest = track.dest();

        if !download.wait().await {
            self.notices.track_failed(&track, placeholder).await;
            return;
        }
        let Some(asset) = self.cache.lookup(&track.asset_key()).await else {
            warn!("⚠️ Asset ausente tras descarga exitosa: {}", track.source_id());
            self.notices.track_failed(&track, placeholder).await;
            return;
        };

        if let Err(e) = self.transport.join(dest).await {
            warn!("🚫 {}", e);
            let dropped = self.session.drain();
            if dropped > 0 {
                debug!("🗑️ {} elementos descartados por fallo de conexión", dropped);
            }
            self.notices.join_failed(dest).await;
            return;
        }

        let active = match self.transport.play(dest.guild, &asset).await {
            Ok(active) => active,
            Err(e) => {
                warn!("🚫 No se pudo arrancar {}: {}", track.display_title(), e);
                self.notices.track_failed(&track, placeholder).await;
                return;
            }
        };

        let cancel_rx = self.session.arm();
        self.notices.now_playing(&track, placeholder).await;
        info!("🎵 Reproduciendo: {}", track.display_title());

        let (ended, stop) = active.into_parts();
        tokio::select! {
            _ = ended => {
                self.session.disarm();
                debug!("🏁 Fin natural: {}", track.display_title());
            }
            signal = cancel_rx => {
                let clear_all = signal.unwrap_or(false);
                stop();
                if clear_all {
                    info!("⏹️ Reproducción detenida: {}", track.display_title());
                } else {
                    info!("⏭️ Track saltado: {}", track.display_title());
                }
            }
        }

        if self.session.is_empty() {
            self.transport.leave(dest.guild).await;
        }
    }
}
