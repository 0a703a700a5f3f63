use anyhow::Result;
use serenity::{all::GatewayIntents, Client};
use songbird::SerenityInit;
use std::sync::{Arc, OnceLock};
use tracing::{error, info};

mod bot;
mod config;
mod error;
mod fetch;
mod playback;
mod sources;
mod ui;

use crate::bot::CadenzaBot;
use crate::config::Config;
use crate::fetch::{AssetCache, DownloadPipeline, Fetcher};

#[tokio::main]
async fn main() -> Result<()> {
    // Inicializar logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("cadenza=debug".parse()?)
                .add_directive("serenity=info".parse()?)
                .add_directive("songbird=info".parse()?),
        )
        .init();

    info!("🎻 Iniciando Cadenza v{}", env!("CARGO_PKG_VERSION"));

    if std::env::args().any(|arg| arg == "--health-check") {
        return health_check().await;
    }

    let config = Config::load()?;
    info!("{}", config.summary());

    // Sondas de arranque: sin resolvedor o transcodificador no hay bot.
    let resolver_version = tool_probe(&config.ytdlp_bin, "--version").await?;
    info!("🎬 {} {}", config.ytdlp_bin, resolver_version);
    tool_probe(&config.ffmpeg_bin, "-version").await?;
    info!("🎛️ {} disponible", config.ffmpeg_bin);

    // Caché y pipeline de descargas, compartidos por todas las sesiones.
    let cache = Arc::new(AssetCache::new(&config.cache_dir)?);
    let fetcher = Arc::new(Fetcher::new(&config, cache.clone())?);
    let pipeline = DownloadPipeline::spawn(fetcher, cache.clone());

    let player_slot = Arc::new(OnceLock::new());
    let handler = CadenzaBot::new(cache, pipeline, player_slot.clone(), resolver_version);

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_VOICE_STATES
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let mut client = Client::builder(&config.discord_token, intents)
        .event_handler(handler)
        .register_songbird()
        .await?;

    // Apagado ordenado: salir de los canales de voz y cerrar el gateway.
    let shard_manager = client.shard_manager.clone();
    let player_for_shutdown = player_slot.clone();
    tokio::spawn(async move {
        wait_for_termination().await;
        info!("⚠️ Señal de apagado recibida, cerrando...");
        if let Some(player) = player_for_shutdown.get() {
            player.disconnect_all().await;
        }
        shard_manager.shutdown_all().await;
    });

    info!("🚀 Bot iniciado");
    if let Err(why) = client.start().await {
        error!("Error al ejecutar el cliente: {:?}", why);
    }

    Ok(())
}

/// SIGINT o SIGTERM, lo que llegue primero.
async fn wait_for_termination() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term =
            signal(SignalKind::terminate()).expect("Error al registrar el handler de SIGTERM");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = term.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

/// Ejecuta `<bin> <arg>` y devuelve la primera línea de su salida.
async fn tool_probe(bin: &str, arg: &str) -> Result<String> {
    let output = async_process::Command::new(bin)
        .arg(arg)
        .output()
        .await
        .map_err(|e| anyhow::anyhow!("no se pudo ejecutar {}: {}", bin, e))?;

    if !output.status.success() {
        anyhow::bail!("{} no está disponible", bin);
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(stdout.lines().next().unwrap_or("").trim().to_string())
}

/// Verificación de dependencias críticas, para el chequeo de salud del
/// contenedor. No requiere token ni configuración completa.
async fn health_check() -> Result<()> {
    let ytdlp = std::env::var("YTDLP_BIN").unwrap_or_else(|_| "yt-dlp".to_string());
    let ffmpeg = std::env::var("FFMPEG_BIN").unwrap_or_else(|_| "ffmpeg".to_string());

    tool_probe(&ytdlp, "--version").await?;
    tool_probe(&ffmpeg, "-version").await?;

    println!("OK");
    Ok(())
}
