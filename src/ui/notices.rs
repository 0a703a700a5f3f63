use std::sync::Arc;

use async_trait::async_trait;
use serenity::all::{ChannelId, MessageId};
use serenity::builder::EditMessage;
use serenity::http::Http;
use tracing::warn;

use crate::sources::{Destination, TrackRef};

use super::messages;

/// Avisos al canal de texto de origen de cada petición. El runner los emite
/// sin conocer el front-end concreto.
#[async_trait]
pub trait Notices: Send + Sync {
    /// Publica el placeholder de "en cola" y devuelve su id para editarlo
    /// cuando el track arranque o falle.
    async fn queued(&self, track: &TrackRef) -> Option<MessageId>;
    async fn now_playing(&self, track: &TrackRef, placeholder: Option<MessageId>);
    async fn track_failed(&self, track: &TrackRef, placeholder: Option<MessageId>);
    async fn join_failed(&self, dest: Destination);
}

/// Avisos reales vía la API de Discord.
pub struct DiscordNotices {
    http: Arc<Http>,
}

impl DiscordNotices {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }

    async fn post(&self, channel: ChannelId, text: String) -> Option<MessageId> {
        match channel.say(&self.http, text).await {
            Ok(message) => Some(message.id),
            Err(e) => {
                warn!("📨 No se pudo publicar el aviso: {}", e);
                None
            }
        }
    }

    async fn post_or_edit(&self, channel: ChannelId, placeholder: Option<MessageId>, text: String) {
        if let Some(message_id) = placeholder {
            let edit = EditMessage::new().content(text.clone());
            if channel.edit_message(&self.http, message_id, edit).await.is_ok() {
                return;
            }
            warn!("📨 No se pudo editar el placeholder, publicando aparte");
        }
        self.post(channel, text).await;
    }
}

#[async_trait]
impl Notices for DiscordNotices {
    async fn queued(&self, track: &TrackRef) -> Option<MessageId> {
        self.post(track.dest().text_channel, messages::pending(track))
            .await
    }

    async fn now_playing(&self, track: &TrackRef, placeholder: Option<MessageId>) {
        self.post_or_edit(
            track.dest().text_channel,
            placeholder,
            messages::now_playing(track),
        )
        .await;
    }

    async fn track_failed(&self, track: &TrackRef, placeholder: Option<MessageId>) {
        self.post_or_edit(
            track.dest().text_channel,
            placeholder,
            messages::track_failed(track),
        )
        .await;
    }

    async fn join_failed(&self, dest: Destination) {
        self.post(dest.text_channel, messages::join_failed()).await;
    }
}
