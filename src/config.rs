use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    // Discord
    pub discord_token: String,

    // Paths
    pub data_dir: PathBuf,
    pub cache_dir: PathBuf,

    // Herramientas externas
    pub ytdlp_bin: String,
    pub ffmpeg_bin: String,

    // Audio y red
    pub opus_bitrate: u32,
    pub max_redirects: usize,
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let data_dir: PathBuf = std::env::var("DATA_DIR")
            .unwrap_or_else(|_| "/var/lib/cadenza".to_string())
            .into();
        let cache_dir: PathBuf = match std::env::var("CACHE_DIR") {
            Ok(dir) => dir.into(),
            Err(_) => data_dir.join("music"),
        };

        let config = Self {
            discord_token: std::env::var("DISCORD_TOKEN")?,
            data_dir,
            cache_dir,
            ytdlp_bin: std::env::var("YTDLP_BIN").unwrap_or_else(|_| "yt-dlp".to_string()),
            ffmpeg_bin: std::env::var("FFMPEG_BIN").unwrap_or_else(|_| "ffmpeg".to_string()),
            opus_bitrate: std::env::var("OPUS_BITRATE")
                .unwrap_or_else(|_| "96000".to_string()) // 96kbps
                .parse()?,
            max_redirects: std::env::var("MAX_REDIRECTS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()?,
        };

        std::fs::create_dir_all(&config.data_dir)?;
        std::fs::create_dir_all(&config.cache_dir)?;

        config.validate()?;

        Ok(config)
    }

    /// Chequeos de sanidad sobre los valores cargados.
    pub fn validate(&self) -> Result<()> {
        if self.discord_token.trim().is_empty() {
            anyhow::bail!("DISCORD_TOKEN no puede estar vacío");
        }

        if self.opus_bitrate > 510_000 {
            anyhow::bail!(
                "El bitrate opus no puede superar 510kbps, se recibió: {}",
                self.opus_bitrate
            );
        }
        if self.opus_bitrate < 8_000 {
            anyhow::bail!(
                "Bitrate opus demasiado bajo, mínimo 8kbps, se recibió: {}",
                self.opus_bitrate
            );
        }

        if self.max_redirects == 0 || self.max_redirects > 10 {
            anyhow::bail!(
                "max_redirects debe estar entre 1 y 10, se recibió: {}",
                self.max_redirects
            );
        }

        Ok(())
    }

    /// Resumen apto para logs: sin token.
    pub fn summary(&self) -> String {
        format!(
            "Config: cache en {}, {} + {}, opus {}kbps, hasta {} redirecciones",
            self.cache_dir.display(),
            self.ytdlp_bin,
            self.ffmpeg_bin,
            self.opus_bitrate / 1000,
            self.max_redirects
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            discord_token: String::new(),
            data_dir: "/var/lib/cadenza".into(),
            cache_dir: "/var/lib/cadenza/music".into(),
            ytdlp_bin: "yt-dlp".to_string(),
            ffmpeg_bin: "ffmpeg".to_string(),
            opus_bitrate: 96_000,
            max_redirects: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_token() -> Config {
        Config {
            discord_token: "token-de-prueba".to_string(),
            ..Config::default()
        }
    }

    #[test]
    fn default_values_validate_once_a_token_is_set() {
        assert!(Config::default().validate().is_err());
        assert!(with_token().validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_bitrate_and_redirects() {
        let mut config = with_token();
        config.opus_bitrate = 600_000;
        assert!(config.validate().is_err());

        let mut config = with_token();
        config.opus_bitrate = 4_000;
        assert!(config.validate().is_err());

        let mut config = with_token();
        config.max_redirects = 0;
        assert!(config.validate().is_err());
    }
}
