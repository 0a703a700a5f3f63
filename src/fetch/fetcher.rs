use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::PlayError;
use crate::sources::TrackRef;

use super::cache::{AssetCache, AssetHandle, ASSET_EXT};

/// Productor de assets: resuelve una referencia a su stream de origen y lo
/// materializa en el caché.
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    async fn fetch(&self, track: &TrackRef) -> Result<AssetHandle, PlayError>;
}

/// Implementación real: `yt-dlp` para resolver, HTTP para descargar y
/// `ffmpeg` para transcodificar a opus normalizado.
pub struct Fetcher {
    cache: Arc<AssetCache>,
    http: reqwest::Client,
    ytdlp_bin: String,
    ffmpeg_bin: String,
    opus_bitrate: u32,
}

impl Fetcher {
    pub fn new(config: &Config, cache: Arc<AssetCache>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            cache,
            http,
            ytdlp_bin: config.ytdlp_bin.clone(),
            ffmpeg_bin: config.ffmpeg_bin.clone(),
            opus_bitrate: config.opus_bitrate,
        })
    }

    /// Resuelve la referencia a una URL de audio directa. Una URL
    /// pre-resuelta en la referencia evita el subproceso.
    async fn resolve(&self, track: &TrackRef) -> Result<String, PlayError> {
        if let Some(url) = track.direct_url() {
            debug!("🔗 URL directa ya resuelta para {}", track.source_id());
            return Ok(url);
        }

        let output = Command::new(&self.ytdlp_bin)
            .args(["--no-playlist", "-x", "-g"])
            .arg(track.watch_url())
            .output()
            .await
            .map_err(|e| {
                PlayError::Resolution(format!("no se pudo ejecutar {}: {}", self.ytdlp_bin, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PlayError::Resolution(first_line(&stderr).to_string()));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        stdout
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                PlayError::Resolution("el resolvedor no devolvió ninguna URL de audio".into())
            })
    }

    /// Descarga el stream de origen a través de ffmpeg y publica el
    /// resultado de forma atómica: el archivo temporal sólo se renombra a su
    /// nombre final cuando la transcodificación completa terminó bien. Un
    /// artefacto a medias nunca es visible como hit de caché.
    async fn transcode(&self, track: &TrackRef, source_url: &str) -> Result<AssetHandle, PlayError> {
        let response = self
            .http
            .get(source_url)
            .send()
            .await
            .map_err(|e| PlayError::Resolution(format!("descarga de la fuente: {}", e)))?;

        if !response.status().is_success() {
            return Err(PlayError::Resolution(format!(
                "estado HTTP {} al descargar la fuente",
                response.status()
            )));
        }

        let tmp = tempfile::Builder::new()
            .prefix(".partial-")
            .suffix(&format!(".{ASSET_EXT}"))
            .tempfile_in(self.cache.root())
            .map_err(|e| PlayError::Transcode(format!("archivo temporal: {}", e)))?;

        let mut child = Command::new(&self.ffmpeg_bin)
            .args(["-hide_banner", "-loglevel", "error", "-y", "-i", "pipe:0"])
            .args(["-vn", "-af", "loudnorm", "-c:a", "libopus"])
            .args(["-b:a", &self.opus_bitrate.to_string(), "-f", "webm"])
            .arg(tmp.path())
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                PlayError::Transcode(format!("no se pudo ejecutar {}: {}", self.ffmpeg_bin, e))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| PlayError::Transcode("ffmpeg sin stdin".into()))?;

        // Alimentar el cuerpo HTTP al stdin de ffmpeg. Un corte del stream o
        // un pipe roto se registra y se decide tras recoger al subproceso.
        let mut feed_error = None;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(bytes) => {
                    if let Err(e) = stdin.write_all(&bytes).await {
                        feed_error = Some(format!("escritura a ffmpeg: {}", e));
                        break;
                    }
                }
                Err(e) => {
                    feed_error = Some(format!("flujo de descarga interrumpido: {}", e));
                    break;
                }
            }
        }
        let _ = stdin.shutdown().await;
        drop(stdin);

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| PlayError::Transcode(format!("esperando a ffmpeg: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PlayError::Transcode(format!(
                "ffmpeg terminó con {}: {}",
                output.status,
                first_line(&stderr)
            )));
        }
        if let Some(e) = feed_error {
            // ffmpeg pudo salir con 0 tras un EOF prematuro; el artefacto
            // estaría truncado, así que no se publica.
            return Err(PlayError::Transcode(e));
        }

        let key = track.asset_key();
        let final_path = self.cache.path_for(&key);
        tmp.persist(&final_path)
            .map_err(|e| PlayError::Transcode(format!("no se pudo publicar el asset: {}", e)))?;

        info!("💾 Asset publicado: {}", final_path.display());
        Ok(AssetHandle::new(final_path))
    }
}

#[async_trait]
impl AssetFetcher for Fetcher {
    async fn fetch(&self, track: &TrackRef) -> Result<AssetHandle, PlayError> {
        info!("🎼 Preparando asset para {}", track.display_title());
        let source_url = self.resolve(track).await?;
        debug!("🔗 Fuente resuelta para {}", track.source_id());
        self.transcode(track, &source_url).await
    }
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or("").trim()
}
