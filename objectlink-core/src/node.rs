//! Shared node behavior: callback slots, outbound writes, inbound dispatch.

use crate::types::{LogFn, LogLevel, WriteMessageFn};
use objectlink_protocol::{Message, MessageConverter, MsgType};
use std::sync::{Arc, RwLock};

/// State shared by client and remote nodes: the write callback handed in
/// by the transport, the optional log callback and the wire converter.
///
/// The protocol is not buffered in the node. An outbound message produced
/// while no writer is set is dropped with a warning, and any state change
/// that accompanied it stands.
pub struct BaseNode {
    converter: MessageConverter,
    writer: RwLock<Option<WriteMessageFn>>,
    logger: RwLock<Option<LogFn>>,
}

impl BaseNode {
    pub fn new() -> Self {
        Self {
            converter: MessageConverter::default(),
            writer: RwLock::new(None),
            logger: RwLock::new(None),
        }
    }

    /// Installs the write callback used for outbound frames.
    pub fn on_write(&self, func: impl Fn(String) + Send + Sync + 'static) {
        *self.writer.write().unwrap() = Some(Arc::new(func));
    }

    /// Installs the log callback.
    pub fn on_log(&self, func: impl Fn(LogLevel, String) + Send + Sync + 'static) {
        *self.logger.write().unwrap() = Some(Arc::new(func));
    }

    /// Emits a line on the log channel and mirrors it to `tracing`.
    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            LogLevel::Debug => tracing::debug!("{message}"),
            LogLevel::Info => tracing::info!("{message}"),
            LogLevel::Warning => tracing::warn!("{message}"),
            LogLevel::Error => tracing::error!("{message}"),
        }
        // clone the slot so a callback may re-enter the node
        let logger = self.logger.read().unwrap().clone();
        if let Some(logger) = logger {
            logger(level, message);
        }
    }

    /// Encodes a message and hands it to the write callback.
    pub fn emit_write(&self, message: Message) {
        let writer = self.writer.read().unwrap().clone();
        let Some(writer) = writer else {
            self.log(LogLevel::Warning, "no writer set, can not write");
            return;
        };
        match self.converter.to_string(&message) {
            Ok(raw) => {
                self.log(LogLevel::Debug, format!("write message: {raw}"));
                writer(raw);
            }
            Err(err) => self.log(
                LogLevel::Error,
                format!("failed to encode {} message: {err}", message.msg_type()),
            ),
        }
    }

    /// Returns the wire converter in use.
    pub fn converter(&self) -> &MessageConverter {
        &self.converter
    }
}

impl Default for BaseNode {
    fn default() -> Self {
        Self::new()
    }
}

/// Inbound dispatch shared by both node kinds.
///
/// [`MessageHandler::handle_message`] decodes a frame and switches on the
/// message kind. The per-kind methods default to logging an error and
/// dropping the frame, so each endpoint overrides only the kinds it
/// speaks: a client handles init, property changes, signals, invoke
/// replies and errors; a remote handles link, unlink, set-property and
/// invoke.
pub trait MessageHandler {
    /// The shared plumbing of this node.
    fn base(&self) -> &BaseNode;

    /// Decodes a raw frame and dispatches it to the matching handler.
    /// Undecodable frames are logged and dropped; the connection stays up.
    fn handle_message(&self, raw: &str) {
        let base = self.base();
        base.log(LogLevel::Debug, format!("handle message: {raw}"));
        let message = match base.converter().from_string(raw) {
            Ok(message) => message,
            Err(err) => {
                base.log(LogLevel::Error, format!("failed to decode message: {err}"));
                return;
            }
        };
        match message {
            Message::Link { object_id } => self.handle_link(&object_id),
            Message::Init { object_id, props } => self.handle_init(&object_id, props),
            Message::Unlink { object_id } => self.handle_unlink(&object_id),
            Message::SetProperty { property_id, value } => {
                self.handle_set_property(&property_id, value)
            }
            Message::PropertyChange { property_id, value } => {
                self.handle_property_change(&property_id, value)
            }
            Message::Invoke {
                request_id,
                method_id,
                args,
            } => self.handle_invoke(request_id, &method_id, args),
            Message::InvokeReply {
                request_id,
                method_id,
                value,
            } => self.handle_invoke_reply(request_id, &method_id, value),
            Message::Signal { signal_id, args } => self.handle_signal(&signal_id, args),
            Message::Error {
                msg_type,
                request_id,
                error,
            } => self.handle_error(msg_type, request_id, &error),
        }
    }

    fn handle_link(&self, _object_id: &str) {
        self.unhandled(MsgType::Link);
    }

    fn handle_init(&self, _object_id: &str, _props: serde_json::Value) {
        self.unhandled(MsgType::Init);
    }

    fn handle_unlink(&self, _object_id: &str) {
        self.unhandled(MsgType::Unlink);
    }

    fn handle_set_property(&self, _property_id: &str, _value: serde_json::Value) {
        self.unhandled(MsgType::SetProperty);
    }

    fn handle_property_change(&self, _property_id: &str, _value: serde_json::Value) {
        self.unhandled(MsgType::PropertyChange);
    }

    fn handle_invoke(&self, _request_id: u64, _method_id: &str, _args: serde_json::Value) {
        self.unhandled(MsgType::Invoke);
    }

    fn handle_invoke_reply(&self, _request_id: u64, _method_id: &str, _value: serde_json::Value) {
        self.unhandled(MsgType::InvokeReply);
    }

    fn handle_signal(&self, _signal_id: &str, _args: serde_json::Value) {
        self.unhandled(MsgType::Signal);
    }

    fn handle_error(&self, _msg_type: MsgType, _request_id: u64, _error: &str) {
        self.unhandled(MsgType::Error);
    }

    /// Logs a message kind this endpoint does not speak.
    fn unhandled(&self, msg_type: MsgType) {
        self.base()
            .log(LogLevel::Error, format!("message type not handled: {msg_type}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct TestNode {
        base: BaseNode,
        signals: Mutex<Vec<(String, serde_json::Value)>>,
    }

    impl TestNode {
        fn new() -> Self {
            Self {
                base: BaseNode::new(),
                signals: Mutex::new(Vec::new()),
            }
        }
    }

    impl MessageHandler for TestNode {
        fn base(&self) -> &BaseNode {
            &self.base
        }

        fn handle_signal(&self, signal_id: &str, args: serde_json::Value) {
            self.signals
                .lock()
                .unwrap()
                .push((signal_id.to_string(), args));
        }
    }

    fn capture_logs(node: &TestNode) -> Arc<Mutex<Vec<(LogLevel, String)>>> {
        let logs = Arc::new(Mutex::new(Vec::new()));
        let sink = logs.clone();
        node.base.on_log(move |level, message| {
            sink.lock().unwrap().push((level, message));
        });
        logs
    }

    #[test]
    fn test_emit_write_without_writer() {
        let node = TestNode::new();
        let logs = capture_logs(&node);

        node.base.emit_write(Message::link("tests.sink1"));

        let logs = logs.lock().unwrap();
        assert_eq!(
            logs.as_slice(),
            [(
                LogLevel::Warning,
                "no writer set, can not write".to_string()
            )]
        );
    }

    #[test]
    fn test_emit_write_encodes_frame() {
        let node = TestNode::new();
        let frames = Arc::new(Mutex::new(Vec::new()));
        let sink = frames.clone();
        node.base.on_write(move |raw| sink.lock().unwrap().push(raw));

        node.base.emit_write(Message::link("tests.sink1"));

        let frames = frames.lock().unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(
            serde_json::from_str::<serde_json::Value>(&frames[0]).unwrap(),
            serde_json::json!([10, "tests.sink1"])
        );
    }

    #[test]
    fn test_dispatch_to_overridden_handler() {
        let node = TestNode::new();
        node.handle_message(r#"[40, "tests.sink1.done", {"ok": true}]"#);

        let signals = node.signals.lock().unwrap();
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].0, "tests.sink1.done");
        assert_eq!(signals[0].1, serde_json::json!({"ok": true}));
    }

    #[test]
    fn test_unhandled_kind_is_logged_and_dropped() {
        let node = TestNode::new();
        let logs = capture_logs(&node);

        node.handle_message(r#"[10, "tests.sink1"]"#);

        let logs = logs.lock().unwrap();
        assert!(logs
            .iter()
            .any(|(level, message)| *level == LogLevel::Error
                && message == "message type not handled: link"));
        assert!(node.signals.lock().unwrap().is_empty());
    }

    #[test]
    fn test_decode_failure_is_logged_and_dropped() {
        let node = TestNode::new();
        let logs = capture_logs(&node);

        node.handle_message("[99,");

        let logs = logs.lock().unwrap();
        assert!(logs
            .iter()
            .any(|(level, message)| *level == LogLevel::Error
                && message.starts_with("failed to decode message")));
    }
}
