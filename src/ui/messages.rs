use crate::sources::TrackRef;

/// Textos que el bot publica en el canal de texto de origen.

pub fn pending(track: &TrackRef) -> String {
    format!("⏳ En cola: {}", track.display_title())
}

pub fn now_playing(track: &TrackRef) -> String {
    format!("🎵 Reproduciendo: {}", track.display_title())
}

pub fn track_failed(track: &TrackRef) -> String {
    format!("❌ No se pudo preparar: {}", track.display_title())
}

pub fn join_failed() -> String {
    "❌ No se pudo entrar al canal de voz; petición descartada.".to_string()
}

pub fn not_in_voice() -> String {
    "❌ Primero entra a un canal de voz.".to_string()
}

pub fn empty_request() -> String {
    "❌ La petición no contiene ningún enlace reproducible.".to_string()
}

pub fn skipped() -> String {
    "⏭️ Saltando al siguiente.".to_string()
}

pub fn stopped() -> String {
    "⏹️ Reproducción detenida y cola vaciada.".to_string()
}

pub fn nothing_playing() -> String {
    "🤷 No hay nada reproduciéndose.".to_string()
}

pub fn version(crate_version: &str, resolver_version: &str) -> String {
    format!("Versión `{}`\n\n`yt-dlp` {}", crate_version, resolver_version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{Destination, SourceKind};
    use serenity::all::{ChannelId, GuildId, UserId};

    #[test]
    fn pending_names_the_track() {
        let dest = Destination {
            guild: GuildId::new(1),
            text_channel: ChannelId::new(2),
            voice_channel: ChannelId::new(3),
        };
        let track = TrackRef::new(SourceKind::Youtube, "abc123", dest, UserId::new(9))
            .with_title("Tema de prueba");
        assert_eq!(pending(&track), "⏳ En cola: Tema de prueba");
    }
}
