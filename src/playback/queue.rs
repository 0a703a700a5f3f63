use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serenity::all::MessageId;

use crate::fetch::DownloadHandle;
use crate::sources::TrackRef;

/// Un track en espera de reproducción: la referencia, su descarga pendiente
/// y el mensaje placeholder que se editará al arrancar o fallar. Lo crea un
/// productor y sólo lo toca el runner que lo saca de la cola.
#[derive(Debug)]
pub struct QueueItem {
    pub track: TrackRef,
    pub download: DownloadHandle,
    pub placeholder: Option<MessageId>,
    #[allow(dead_code)]
    pub queued_at: DateTime<Utc>,
}

impl QueueItem {
    pub fn new(track: TrackRef, download: DownloadHandle, placeholder: Option<MessageId>) -> Self {
        Self {
            track,
            download,
            placeholder,
            queued_at: Utc::now(),
        }
    }
}

/// Cola FIFO de una sesión. Los productores sólo agregan al final; el único
/// runner de la sesión es quien saca por el frente. El vaciado completo es
/// la única mutación externa permitida (stop con limpieza).
#[derive(Debug, Default)]
pub struct PlaybackQueue {
    items: VecDeque<QueueItem>,
}

impl PlaybackQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, items: impl IntoIterator<Item = QueueItem>) {
        self.items.extend(items);
    }

    pub fn pop(&mut self) -> Option<QueueItem> {
        self.items.pop_front()
    }

    /// Descarta todo lo pendiente y devuelve cuántos elementos cayeron.
    pub fn clear(&mut self) -> usize {
        let dropped = self.items.len();
        self.items.clear();
        dropped
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{Destination, SourceKind};
    use serenity::all::{ChannelId, GuildId, UserId};

    fn item(id: &str) -> QueueItem {
        let dest = Destination {
            guild: GuildId::new(1),
            text_channel: ChannelId::new(2),
            voice_channel: ChannelId::new(3),
        };
        let track = TrackRef::new(SourceKind::Youtube, id, dest, UserId::new(9));
        QueueItem::new(track, DownloadHandle::resolved(true), None)
    }

    #[test]
    fn pops_in_append_order() {
        let mut queue = PlaybackQueue::new();
        queue.append([item("aaa111"), item("bbb222")]);
        queue.append([item("ccc333")]);

        let order: Vec<String> = std::iter::from_fn(|| queue.pop())
            .map(|i| i.track.source_id().to_string())
            .collect();
        assert_eq!(order, vec!["aaa111", "bbb222", "ccc333"]);
    }

    #[test]
    fn clear_reports_dropped_items() {
        let mut queue = PlaybackQueue::new();
        queue.append([item("aaa111"), item("bbb222")]);

        assert_eq!(queue.clear(), 2);
        assert!(queue.is_empty());
        assert_eq!(queue.clear(), 0);
    }
}
