use std::sync::Arc;

use dashmap::DashMap;
use serenity::all::GuildId;
use tracing::info;

use crate::error::PlayError;
use crate::fetch::{AssetCache, DownloadPipeline};
use crate::sources::TrackRef;
use crate::ui::notices::Notices;

use super::queue::QueueItem;
use super::session::{QueueRunner, Session};
use super::transport::Transport;

/// Superficie que el front-end usa para manejar la reproducción: encolar,
/// saltar y detener. Mantiene una sesión (cola + runner) por guild; el caché
/// y el pipeline de descargas son compartidos entre todas.
pub struct Player {
    sessions: DashMap<GuildId, Arc<Session>>,
    cache: Arc<AssetCache>,
    pipeline: DownloadPipeline,
    transport: Arc<dyn Transport>,
    notices: Arc<dyn Notices>,
}

impl Player {
    pub fn new(
        cache: Arc<AssetCache>,
        pipeline: DownloadPipeline,
        transport: Arc<dyn Transport>,
        notices: Arc<dyn Notices>,
    ) -> Self {
        Self {
            sessions: DashMap::new(),
            cache,
            pipeline,
            transport,
            notices,
        }
    }

    fn session(&self, guild: GuildId) -> Arc<Session> {
        self.sessions
            .entry(guild)
            .or_insert_with(|| {
                info!("🆕 Nueva sesión de reproducción para guild {}", guild);
                let session = Arc::new(Session::new());
                QueueRunner::new(
                    session.clone(),
                    self.cache.clone(),
                    self.transport.clone(),
                    self.notices.clone(),
                )
                .spawn();
                session
            })
            .clone()
    }

    /// Encola un lote de referencias. Cada una publica su placeholder y
    /// entra al pipeline de descargas antes de sumarse a la cola, así el
    /// siguiente track puede bajar mientras suena el actual.
    pub async fn enqueue(&self, tracks: Vec<TrackRef>) -> Result<usize, PlayError> {
        let Some(first) = tracks.first() else {
            return Err(PlayError::EmptyResult);
        };
        let session = self.session(first.dest().guild);

        let mut items = Vec::with_capacity(tracks.len());
        for track in tracks {
            let placeholder = self.notices.queued(&track).await;
            let download = self.pipeline.submit(track.clone());
            items.push(QueueItem::new(track, download, placeholder));
        }

        let count = items.len();
        session.submit(items);
        info!("📥 {} track(s) encolados", count);
        Ok(count)
    }

    /// Salta el track en vuelo. Devuelve `false` si no había nada sonando.
    pub fn skip(&self, guild: GuildId) -> bool {
        self.sessions
            .get(&guild)
            .map(|session| session.cancel(false))
            .unwrap_or(false)
    }

    /// Detiene el track en vuelo y vacía la cola de la sesión.
    pub fn stop_all(&self, guild: GuildId) -> bool {
        self.sessions
            .get(&guild)
            .map(|session| session.cancel(true))
            .unwrap_or(false)
    }

    /// Limpieza de cierre: cancela todas las sesiones y abandona los
    /// canales de voz. Mejor esfuerzo, para el apagado del proceso.
    pub async fn disconnect_all(&self) {
        let guilds: Vec<GuildId> = self
            .sessions
            .iter()
            .map(|entry| *entry.key())
            .collect();
        for guild in &guilds {
            if let Some(session) = self.sessions.get(guild) {
                session.cancel(true);
            }
        }
        for guild in guilds {
            self.transport.leave(guild).await;
        }
        info!("🔌 Sesiones de voz desconectadas");
    }
}
