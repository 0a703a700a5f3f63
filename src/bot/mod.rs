//! # Bot Module
//!
//! Front-end de Discord: traduce mensajes entrantes a operaciones del
//! reproductor (`enqueue` / `skip` / `stop_all`) y responde con los avisos
//! correspondientes. Cada mensaje se atiende en su propio task del gateway;
//! nada de lo que pasa aquí espera a que termine una reproducción.

use std::sync::{Arc, OnceLock};

use anyhow::Result;
use serenity::all::{Context, EventHandler, Message, Ready};
use serenity::async_trait;
use tracing::{error, info, warn};

pub mod commands;

use commands::Command;

use crate::error::PlayError;
use crate::fetch::{AssetCache, DownloadPipeline};
use crate::playback::player::Player;
use crate::playback::transport::SongbirdTransport;
use crate::sources::{self, Destination};
use crate::ui::messages;
use crate::ui::notices::DiscordNotices;

/// Handler principal del gateway. El [`Player`] se construye recién en
/// `ready`, cuando songbird y el cliente HTTP ya existen; la ranura es
/// compartida con `main` para la limpieza de cierre.
pub struct CadenzaBot {
    cache: Arc<AssetCache>,
    pipeline: DownloadPipeline,
    player: Arc<OnceLock<Arc<Player>>>,
    resolver_version: String,
}

impl CadenzaBot {
    pub fn new(
        cache: Arc<AssetCache>,
        pipeline: DownloadPipeline,
        player: Arc<OnceLock<Arc<Player>>>,
        resolver_version: String,
    ) -> Self {
        Self {
            cache,
            pipeline,
            player,
            resolver_version,
        }
    }

    fn player(&self) -> Option<&Arc<Player>> {
        let player = self.player.get();
        if player.is_none() {
            warn!("⚠️ Comando recibido antes de que el bot esté listo");
        }
        player
    }

    async fn handle_play(&self, ctx: &Context, msg: &Message, urls: Vec<String>) -> Result<()> {
        let Some(guild_id) = msg.guild_id else {
            return Ok(());
        };
        let Some(player) = self.player() else {
            return Ok(());
        };

        // El que pide tiene que estar en un canal de voz.
        let voice_channel = msg
            .guild(&ctx.cache)
            .and_then(|guild| guild.voice_states.get(&msg.author.id).and_then(|vs| vs.channel_id));
        let Some(voice_channel) = voice_channel else {
            msg.channel_id.say(&ctx.http, messages::not_in_voice()).await?;
            return Ok(());
        };

        let dest = Destination {
            guild: guild_id,
            text_channel: msg.channel_id,
            voice_channel,
        };
        let tracks: Vec<_> = urls
            .iter()
            .filter_map(|url| sources::parse_request(url, dest, msg.author.id))
            .collect();

        match player.enqueue(tracks).await {
            Ok(count) => info!("🎶 Petición aceptada: {} track(s)", count),
            Err(PlayError::EmptyResult) => {
                msg.channel_id.say(&ctx.http, messages::empty_request()).await?;
            }
            Err(e) => error!("❌ Error al encolar: {}", e),
        }
        Ok(())
    }

    async fn handle_skip(&self, ctx: &Context, msg: &Message) -> Result<()> {
        let Some(guild_id) = msg.guild_id else {
            return Ok(());
        };
        let Some(player) = self.player() else {
            return Ok(());
        };
        let text = if player.skip(guild_id) {
            messages::skipped()
        } else {
            messages::nothing_playing()
        };
        msg.channel_id.say(&ctx.http, text).await?;
        Ok(())
    }

    async fn handle_stop(&self, ctx: &Context, msg: &Message) -> Result<()> {
        let Some(guild_id) = msg.guild_id else {
            return Ok(());
        };
        let Some(player) = self.player() else {
            return Ok(());
        };
        let text = if player.stop_all(guild_id) {
            messages::stopped()
        } else {
            messages::nothing_playing()
        };
        msg.channel_id.say(&ctx.http, text).await?;
        Ok(())
    }

    async fn handle_version(&self, ctx: &Context, msg: &Message) -> Result<()> {
        let text = messages::version(env!("CARGO_PKG_VERSION"), &self.resolver_version);
        msg.channel_id.say(&ctx.http, text).await?;
        Ok(())
    }
}

#[async_trait]
impl EventHandler for CadenzaBot {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("🤖 Conectado como {}", ready.user.name);

        let Some(manager) = songbird::get(&ctx).await else {
            error!("❌ Songbird no está registrado en el cliente");
            return;
        };
        let transport = Arc::new(SongbirdTransport::new(manager));
        let notices = Arc::new(DiscordNotices::new(ctx.http.clone()));
        let player = Arc::new(Player::new(
            self.cache.clone(),
            self.pipeline.clone(),
            transport,
            notices,
        ));
        // En reconexiones `ready` vuelve a llegar; el primer player gana.
        let _ = self.player.set(player);
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot || msg.guild_id.is_none() {
            return;
        }

        let bot_id = ctx.cache.current_user().id;
        let Some(command) = commands::parse(&msg.content, bot_id) else {
            return;
        };

        let result = match command {
            Command::Play(urls) => self.handle_play(&ctx, &msg, urls).await,
            Command::Skip => self.handle_skip(&ctx, &msg).await,
            Command::Stop => self.handle_stop(&ctx, &msg).await,
            Command::Version => self.handle_version(&ctx, &msg).await,
        };
        if let Err(e) = result {
            error!("❌ Error al atender el comando: {:?}", e);
        }
    }
}
