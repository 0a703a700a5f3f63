use serenity::all::UserId;

/// Acciones que el front-end sabe despachar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Encolar los enlaces pedidos, en el orden en que vinieron.
    Play(Vec<String>),
    Skip,
    Stop,
    Version,
}

/// Parsea un mensaje dirigido al bot. Sólo cuentan los mensajes cuyo primer
/// token es una mención al bot (`<@id>` o `<@!id>`); todo lo demás se
/// ignora en silencio.
pub fn parse(content: &str, bot_id: UserId) -> Option<Command> {
    let mut tokens = content.split_whitespace();
    let first = tokens.next()?;

    let mention = format!("<@{}>", bot_id);
    let mention_nick = format!("<@!{}>", bot_id);
    if first != mention && first != mention_nick {
        return None;
    }

    let rest: Vec<&str> = tokens.collect();
    match rest.as_slice() {
        [] => None,
        ["skip"] => Some(Command::Skip),
        ["stop"] => Some(Command::Stop),
        ["version"] => Some(Command::Version),
        urls => Some(Command::Play(urls.iter().map(|s| s.to_string()).collect())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOT: UserId = UserId::new(42);

    #[test]
    fn ignores_messages_without_a_leading_mention() {
        assert_eq!(parse("hola que tal", BOT), None);
        assert_eq!(parse("skip <@42>", BOT), None);
        assert_eq!(parse("<@99> skip", BOT), None);
        assert_eq!(parse("", BOT), None);
    }

    #[test]
    fn a_bare_mention_is_not_a_command() {
        assert_eq!(parse("<@42>", BOT), None);
    }

    #[test]
    fn parses_control_words() {
        assert_eq!(parse("<@42> skip", BOT), Some(Command::Skip));
        assert_eq!(parse("<@!42> stop", BOT), Some(Command::Stop));
        assert_eq!(parse("<@42> version", BOT), Some(Command::Version));
    }

    #[test]
    fn everything_else_is_a_play_request() {
        assert_eq!(
            parse("<@42> https://youtu.be/aaa111 https://youtu.be/bbb222", BOT),
            Some(Command::Play(vec![
                "https://youtu.be/aaa111".to_string(),
                "https://youtu.be/bbb222".to_string(),
            ]))
        );
    }

    #[test]
    fn tolerates_extra_whitespace() {
        assert_eq!(parse("  <@42>   skip  ", BOT), Some(Command::Skip));
    }
}
