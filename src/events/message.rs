use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Уровень диагностического сообщения для хоста
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MessageType {
    Debug = 0,
    Info = 1,
    Warning = 2,
    Error = 3,
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MessageType::Debug => "DEBUG",
            MessageType::Info => "INFO",
            MessageType::Warning => "WARNING",
            MessageType::Error => "ERROR",
        };
        f.write_str(name)
    }
}

type SinkFn = dyn Fn(MessageType, &str) + Send + Sync;

/// Канал сообщений к хосту. Каждое сообщение также уходит в tracing,
/// поэтому без callback-а ничего не теряется.
#[derive(Clone, Default)]
pub struct Messenger {
    sink: Option<Arc<SinkFn>>,
}

impl Messenger {
    pub fn new<F>(sink: F) -> Self
    where
        F: Fn(MessageType, &str) + Send + Sync + 'static,
    {
        Self {
            sink: Some(Arc::new(sink)),
        }
    }

    /// Только tracing, без хостового callback-а
    pub fn silent() -> Self {
        Self { sink: None }
    }

    pub fn send(&self, kind: MessageType, message: &str) {
        match kind {
            MessageType::Debug => debug!("{}", message),
            MessageType::Info => info!("{}", message),
            MessageType::Warning => warn!("{}", message),
            MessageType::Error => error!("{}", message),
        }

        if let Some(sink) = &self.sink {
            sink(kind, message);
        }
    }

    pub fn error(&self, message: &str) {
        self.send(MessageType::Error, message);
    }

    pub fn warning(&self, message: &str) {
        self.send(MessageType::Warning, message);
    }
}

impl fmt::Debug for Messenger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Messenger")
            .field("sink", &self.sink.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_messenger_forwards_to_sink() {
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = received.clone();
        let messenger = Messenger::new(move |kind, msg| sink.lock().push((kind, msg.to_string())));

        messenger.warning("нет обработчика");
        messenger.error("сбой");

        let received = received.lock();
        assert_eq!(received.len(), 2);
        assert_eq!(received[0], (MessageType::Warning, "нет обработчика".to_string()));
        assert_eq!(received[1].0, MessageType::Error);
    }

    #[test]
    fn test_silent_messenger() {
        let messenger = Messenger::silent();
        messenger.error("никуда");
        assert_eq!(format!("{:?}", messenger), "Messenger { sink: false }");
    }
}
