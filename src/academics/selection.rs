use uuid::Uuid;

use super::repo_types::Stream;

/// Streams whose owning class is `class_id`, in their original order.
pub fn streams_for_class(streams: &[Stream], class_id: Uuid) -> Vec<Stream> {
    streams
        .iter()
        .filter(|s| s.class_id == class_id)
        .cloned()
        .collect()
}

/// Cascading class -> stream choice behind the allocation and admission
/// forms. Changing the class always clears the stream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassStreamSelection {
    class_id: Option<Uuid>,
    stream_id: Option<Uuid>,
}

impl ClassStreamSelection {
    /// Replays a submitted form: class first, then stream. Yields the stream
    /// id only when it is one of the options for that class.
    pub fn resolve(streams: &[Stream], class_id: Uuid, stream_id: Uuid) -> Option<Uuid> {
        let mut selection = Self::default();
        selection.select_class(Some(class_id));
        selection.select_stream(streams, stream_id);
        selection.stream_id()
    }

    pub fn stream_id(&self) -> Option<Uuid> {
        self.stream_id
    }

    pub fn select_class(&mut self, class_id: Option<Uuid>) {
        self.class_id = class_id;
        self.stream_id = None;
    }

    /// Accepts the stream only when it is one of the options for the
    /// selected class. Returns whether the selection changed.
    pub fn select_stream(&mut self, streams: &[Stream], stream_id: Uuid) -> bool {
        let Some(class_id) = self.class_id else {
            return false;
        };
        let belongs = streams
            .iter()
            .any(|s| s.id == stream_id && s.class_id == class_id);
        if belongs {
            self.stream_id = Some(stream_id);
        }
        belongs
    }
}
