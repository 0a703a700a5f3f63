use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serenity::all::GuildId;
use songbird::{Event, EventContext, EventHandler as VoiceEventHandler, Songbird, TrackEvent};
use tokio::sync::oneshot;
use tracing::debug;

use crate::error::PlayError;
use crate::fetch::AssetHandle;
use crate::sources::Destination;

/// Un track sonando: un futuro de fin natural y un botón de stop.
pub struct ActiveTrack {
    ended: oneshot::Receiver<()>,
    stop: Box<dyn Fn() + Send>,
}

impl ActiveTrack {
    pub fn new(ended: oneshot::Receiver<()>, stop: impl Fn() + Send + 'static) -> Self {
        Self {
            ended,
            stop: Box::new(stop),
        }
    }

    pub fn into_parts(self) -> (oneshot::Receiver<()>, Box<dyn Fn() + Send>) {
        (self.ended, self.stop)
    }
}

/// Frontera con el transporte de voz. El runner sólo necesita entrar a un
/// canal, arrancar un asset local y enterarse de cuándo terminó.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn join(&self, dest: Destination) -> Result<(), PlayError>;
    async fn play(&self, guild: GuildId, asset: &AssetHandle) -> Result<ActiveTrack, PlayError>;
    async fn leave(&self, guild: GuildId);
}

/// Transporte real sobre songbird.
pub struct SongbirdTransport {
    manager: Arc<Songbird>,
}

impl SongbirdTransport {
    pub fn new(manager: Arc<Songbird>) -> Self {
        Self { manager }
    }
}

#[async_trait]
impl Transport for SongbirdTransport {
    async fn join(&self, dest: Destination) -> Result<(), PlayError> {
        self.manager
            .join(dest.guild, dest.voice_channel)
            .await
            .map(|_| ())
            .map_err(|e| PlayError::Join(e.to_string()))
    }

    async fn play(&self, guild: GuildId, asset: &AssetHandle) -> Result<ActiveTrack, PlayError> {
        let call = self
            .manager
            .get(guild)
            .ok_or_else(|| PlayError::Join("sin conexión de voz activa".into()))?;

        let input = songbird::input::File::new(asset.path().to_path_buf());
        let handle = call.lock().await.play_input(input.into());

        let (tx, rx) = oneshot::channel();
        let slot = Arc::new(Mutex::new(Some(tx)));
        // End y Error completan la misma carrera; si el track ya murió antes
        // de registrar el evento, despachamos el final de inmediato.
        for event in [TrackEvent::End, TrackEvent::Error] {
            let notifier = EndNotifier { slot: slot.clone() };
            if handle.add_event(Event::Track(event), notifier).is_err() {
                if let Some(tx) = slot.lock().take() {
                    let _ = tx.send(());
                }
            }
        }

        let stopper = handle.clone();
        Ok(ActiveTrack::new(rx, move || {
            let _ = stopper.stop();
        }))
    }

    async fn leave(&self, guild: GuildId) {
        if let Err(e) = self.manager.remove(guild).await {
            debug!("🔌 Al salir del canal de voz de {}: {}", guild, e);
        }
    }
}

/// Dispara el fin de pista una sola vez, venga de End o de Error.
struct EndNotifier {
    slot: Arc<Mutex<Option<oneshot::Sender<()>>>>,
}

#[async_trait]
impl VoiceEventHandler for EndNotifier {
    async fn act(&self, _ctx: &EventContext<'_>) -> Option<Event> {
        if let Some(tx) = self.slot.lock().take() {
            let _ = tx.send(());
        }
        None
    }
}
