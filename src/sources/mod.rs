use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serenity::all::{ChannelId, GuildId, UserId};
use url::Url;

use crate::fetch::AssetKey;

static YOUTUBE_HOST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(www\.|m\.|music\.)?youtube\.com$").unwrap());
static VIDEO_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{6,64}$").unwrap());

/// Tipos de fuentes soportadas. Agregar una fuente nueva significa agregar
/// una variante aquí y un caso en el fetcher, nada más.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Youtube,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Youtube => "youtube",
        }
    }
}

/// Destino de una petición: de qué guild vino, dónde responder y dónde sonar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Destination {
    pub guild: GuildId,
    pub text_channel: ChannelId,
    pub voice_channel: ChannelId,
}

/// Identidad y enrutamiento de un track pedido, antes de resolver su asset.
/// Inmutable una vez creado.
#[derive(Debug, Clone)]
pub struct TrackRef {
    kind: SourceKind,
    source_id: String,
    direct_url: Option<String>,
    title: Option<String>,
    dest: Destination,
    requested_by: UserId,
    requested_at: DateTime<Utc>,
}

impl TrackRef {
    pub fn new(
        kind: SourceKind,
        source_id: impl Into<String>,
        dest: Destination,
        requested_by: UserId,
    ) -> Self {
        Self {
            kind,
            source_id: source_id.into(),
            direct_url: None,
            title: None,
            dest,
            requested_by,
            requested_at: Utc::now(),
        }
    }

    #[allow(dead_code)]
    pub fn with_direct_url(mut self, url: impl Into<String>) -> Self {
        self.direct_url = Some(url.into());
        self
    }

    #[allow(dead_code)]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub fn direct_url(&self) -> Option<String> {
        self.direct_url.clone()
    }

    pub fn dest(&self) -> Destination {
        self.dest
    }

    #[allow(dead_code)]
    pub fn requested_by(&self) -> UserId {
        self.requested_by
    }

    #[allow(dead_code)]
    pub fn requested_at(&self) -> DateTime<Utc> {
        self.requested_at
    }

    /// URL canónica de la página del track, apta para el resolvedor.
    pub fn watch_url(&self) -> String {
        match self.kind {
            SourceKind::Youtube => {
                format!("https://www.youtube.com/watch?v={}", self.source_id)
            }
        }
    }

    /// Nombre presentable: el título si se conoce, la URL canónica si no.
    pub fn display_title(&self) -> String {
        self.title.clone().unwrap_or_else(|| self.watch_url())
    }

    pub fn asset_key(&self) -> AssetKey {
        AssetKey::new(self.kind, self.source_id.clone())
    }
}

/// Interpreta un argumento de petición como referencia de track. Devuelve
/// `None` para todo lo que no sea una URL de video reconocida.
pub fn parse_request(raw: &str, dest: Destination, requested_by: UserId) -> Option<TrackRef> {
    let url = Url::parse(raw).ok()?;
    let host = url.host_str()?;

    let id = if host == "youtu.be" {
        url.path_segments()?.next().map(str::to_string)
    } else if YOUTUBE_HOST.is_match(host) && url.path() == "/watch" {
        url.query_pairs()
            .find(|(k, _)| k == "v")
            .map(|(_, v)| v.into_owned())
    } else {
        None
    }?;

    if !VIDEO_ID.is_match(&id) {
        return None;
    }

    Some(TrackRef::new(SourceKind::Youtube, id, dest, requested_by))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dest() -> Destination {
        Destination {
            guild: GuildId::new(1),
            text_channel: ChannelId::new(2),
            voice_channel: ChannelId::new(3),
        }
    }

    #[test]
    fn parses_watch_urls() {
        for raw in [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtube.com/watch?v=dQw4w9WgXcQ",
            "https://music.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://m.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ",
        ] {
            let track = parse_request(raw, dest(), UserId::new(9)).expect(raw);
            assert_eq!(track.kind(), SourceKind::Youtube);
            assert_eq!(track.source_id(), "dQw4w9WgXcQ");
        }
    }

    #[test]
    fn rejects_foreign_and_malformed_urls() {
        for raw in [
            "https://example.com/watch?v=dQw4w9WgXcQ",
            "https://www.youtube.com/playlist?list=abc",
            "https://evilyoutube.com/watch?v=dQw4w9WgXcQ",
            "https://www.youtube.com/watch",
            "https://www.youtube.com/watch?v=inv@lid!!",
            "no es una url",
        ] {
            assert!(parse_request(raw, dest(), UserId::new(9)).is_none(), "{raw}");
        }
    }

    #[test]
    fn watch_url_round_trips_the_id() {
        let track = parse_request("https://youtu.be/abc123xyz_-", dest(), UserId::new(9)).unwrap();
        assert_eq!(track.watch_url(), "https://www.youtube.com/watch?v=abc123xyz_-");
        assert_eq!(track.display_title(), track.watch_url());
    }

    #[test]
    fn a_preresolved_url_travels_with_the_reference() {
        let track = parse_request("https://youtu.be/abc123xyz_-", dest(), UserId::new(9))
            .unwrap()
            .with_direct_url("https://cdn.example/audio.webm");
        assert_eq!(
            track.direct_url().as_deref(),
            Some("https://cdn.example/audio.webm")
        );
    }

    #[test]
    fn title_wins_over_url_when_present() {
        let track = parse_request("https://youtu.be/abc123xyz_-", dest(), UserId::new(9))
            .unwrap()
            .with_title("Mi canción");
        assert_eq!(track.display_title(), "Mi canción");
    }
}
