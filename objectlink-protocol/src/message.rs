//! Wire message types.
//!
//! On the wire every message is a JSON array whose first element is the
//! numeric message kind, followed by the kind-specific fields. Property
//! values, invocation arguments and return values are arbitrary JSON and
//! pass through the runtime untouched.

use serde::de::{self, Deserialize, Deserializer, SeqAccess, Visitor};
use serde::ser::{Serialize, SerializeSeq, Serializer};
use serde_json::Value;
use std::fmt;

/// Numeric message kinds. The exact values are part of the wire contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MsgType {
    Link = 10,
    Init = 11,
    Unlink = 12,
    SetProperty = 20,
    PropertyChange = 21,
    Invoke = 30,
    InvokeReply = 31,
    Signal = 40,
    Error = 90,
}

impl MsgType {
    /// Returns the wire code of this kind.
    pub fn code(self) -> u64 {
        self as u64
    }

    /// Maps a wire code back to a kind.
    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            10 => Some(MsgType::Link),
            11 => Some(MsgType::Init),
            12 => Some(MsgType::Unlink),
            20 => Some(MsgType::SetProperty),
            21 => Some(MsgType::PropertyChange),
            30 => Some(MsgType::Invoke),
            31 => Some(MsgType::InvokeReply),
            40 => Some(MsgType::Signal),
            90 => Some(MsgType::Error),
            _ => None,
        }
    }
}

impl fmt::Display for MsgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MsgType::Link => write!(f, "link"),
            MsgType::Init => write!(f, "init"),
            MsgType::Unlink => write!(f, "unlink"),
            MsgType::SetProperty => write!(f, "setProperty"),
            MsgType::PropertyChange => write!(f, "propertyChange"),
            MsgType::Invoke => write!(f, "invoke"),
            MsgType::InvokeReply => write!(f, "invokeReply"),
            MsgType::Signal => write!(f, "signal"),
            MsgType::Error => write!(f, "error"),
        }
    }
}

/// A single wire message as a tagged tuple.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// `[10, objectId]`: request a link to a remote object.
    Link { object_id: String },
    /// `[11, objectId, props]`: initial property state after a link.
    Init { object_id: String, props: Value },
    /// `[12, objectId]`: release a link.
    Unlink { object_id: String },
    /// `[20, propertyId, value]`: request a property change.
    SetProperty { property_id: String, value: Value },
    /// `[21, propertyId, value]`: notify a property change.
    PropertyChange { property_id: String, value: Value },
    /// `[30, requestId, methodId, args]`: invoke a method.
    Invoke {
        request_id: u64,
        method_id: String,
        args: Value,
    },
    /// `[31, requestId, methodId, value]`: reply to an invocation.
    InvokeReply {
        request_id: u64,
        method_id: String,
        value: Value,
    },
    /// `[40, signalId, args]`: notify a signal.
    Signal { signal_id: String, args: Value },
    /// `[90, msgType, requestId, error]`: report a failure to the peer.
    Error {
        msg_type: MsgType,
        request_id: u64,
        error: String,
    },
}

impl Message {
    pub fn link(object_id: impl Into<String>) -> Self {
        Message::Link {
            object_id: object_id.into(),
        }
    }

    pub fn init(object_id: impl Into<String>, props: Value) -> Self {
        Message::Init {
            object_id: object_id.into(),
            props,
        }
    }

    pub fn unlink(object_id: impl Into<String>) -> Self {
        Message::Unlink {
            object_id: object_id.into(),
        }
    }

    pub fn set_property(property_id: impl Into<String>, value: Value) -> Self {
        Message::SetProperty {
            property_id: property_id.into(),
            value,
        }
    }

    pub fn property_change(property_id: impl Into<String>, value: Value) -> Self {
        Message::PropertyChange {
            property_id: property_id.into(),
            value,
        }
    }

    pub fn invoke(request_id: u64, method_id: impl Into<String>, args: Value) -> Self {
        Message::Invoke {
            request_id,
            method_id: method_id.into(),
            args,
        }
    }

    pub fn invoke_reply(request_id: u64, method_id: impl Into<String>, value: Value) -> Self {
        Message::InvokeReply {
            request_id,
            method_id: method_id.into(),
            value,
        }
    }

    pub fn signal(signal_id: impl Into<String>, args: Value) -> Self {
        Message::Signal {
            signal_id: signal_id.into(),
            args,
        }
    }

    pub fn error(msg_type: MsgType, request_id: u64, error: impl Into<String>) -> Self {
        Message::Error {
            msg_type,
            request_id,
            error: error.into(),
        }
    }

    /// Returns the kind of this message.
    pub fn msg_type(&self) -> MsgType {
        match self {
            Message::Link { .. } => MsgType::Link,
            Message::Init { .. } => MsgType::Init,
            Message::Unlink { .. } => MsgType::Unlink,
            Message::SetProperty { .. } => MsgType::SetProperty,
            Message::PropertyChange { .. } => MsgType::PropertyChange,
            Message::Invoke { .. } => MsgType::Invoke,
            Message::InvokeReply { .. } => MsgType::InvokeReply,
            Message::Signal { .. } => MsgType::Signal,
            Message::Error { .. } => MsgType::Error,
        }
    }
}

impl Serialize for Message {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Message::Link { object_id } | Message::Unlink { object_id } => {
                let mut seq = serializer.serialize_seq(Some(2))?;
                seq.serialize_element(&self.msg_type().code())?;
                seq.serialize_element(object_id)?;
                seq.end()
            }
            Message::Init { object_id, props } => {
                let mut seq = serializer.serialize_seq(Some(3))?;
                seq.serialize_element(&MsgType::Init.code())?;
                seq.serialize_element(object_id)?;
                seq.serialize_element(props)?;
                seq.end()
            }
            Message::SetProperty { property_id, value }
            | Message::PropertyChange { property_id, value } => {
                let mut seq = serializer.serialize_seq(Some(3))?;
                seq.serialize_element(&self.msg_type().code())?;
                seq.serialize_element(property_id)?;
                seq.serialize_element(value)?;
                seq.end()
            }
            Message::Invoke {
                request_id,
                method_id,
                args,
            } => {
                let mut seq = serializer.serialize_seq(Some(4))?;
                seq.serialize_element(&MsgType::Invoke.code())?;
                seq.serialize_element(request_id)?;
                seq.serialize_element(method_id)?;
                seq.serialize_element(args)?;
                seq.end()
            }
            Message::InvokeReply {
                request_id,
                method_id,
                value,
            } => {
                let mut seq = serializer.serialize_seq(Some(4))?;
                seq.serialize_element(&MsgType::InvokeReply.code())?;
                seq.serialize_element(request_id)?;
                seq.serialize_element(method_id)?;
                seq.serialize_element(value)?;
                seq.end()
            }
            Message::Signal { signal_id, args } => {
                let mut seq = serializer.serialize_seq(Some(3))?;
                seq.serialize_element(&MsgType::Signal.code())?;
                seq.serialize_element(signal_id)?;
                seq.serialize_element(args)?;
                seq.end()
            }
            Message::Error {
                msg_type,
                request_id,
                error,
            } => {
                let mut seq = serializer.serialize_seq(Some(4))?;
                seq.serialize_element(&MsgType::Error.code())?;
                seq.serialize_element(&msg_type.code())?;
                seq.serialize_element(request_id)?;
                seq.serialize_element(error)?;
                seq.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Message {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MessageVisitor;

        fn element<'de, A, T>(seq: &mut A, index: usize) -> Result<T, A::Error>
        where
            A: SeqAccess<'de>,
            T: Deserialize<'de>,
        {
            seq.next_element::<T>()?
                .ok_or_else(|| de::Error::invalid_length(index, &"a complete message tuple"))
        }

        impl<'de> Visitor<'de> for MessageVisitor {
            type Value = Message;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a message tuple starting with a numeric kind")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Message, A::Error> {
                let code: u64 = element(&mut seq, 0)?;
                let kind = MsgType::from_code(code)
                    .ok_or_else(|| de::Error::custom(format!("unknown message type: {code}")))?;
                match kind {
                    MsgType::Link => Ok(Message::Link {
                        object_id: element(&mut seq, 1)?,
                    }),
                    MsgType::Init => Ok(Message::Init {
                        object_id: element(&mut seq, 1)?,
                        props: element(&mut seq, 2)?,
                    }),
                    MsgType::Unlink => Ok(Message::Unlink {
                        object_id: element(&mut seq, 1)?,
                    }),
                    MsgType::SetProperty => Ok(Message::SetProperty {
                        property_id: element(&mut seq, 1)?,
                        value: element(&mut seq, 2)?,
                    }),
                    MsgType::PropertyChange => Ok(Message::PropertyChange {
                        property_id: element(&mut seq, 1)?,
                        value: element(&mut seq, 2)?,
                    }),
                    MsgType::Invoke => Ok(Message::Invoke {
                        request_id: element(&mut seq, 1)?,
                        method_id: element(&mut seq, 2)?,
                        args: element(&mut seq, 3)?,
                    }),
                    MsgType::InvokeReply => Ok(Message::InvokeReply {
                        request_id: element(&mut seq, 1)?,
                        method_id: element(&mut seq, 2)?,
                        value: element(&mut seq, 3)?,
                    }),
                    MsgType::Signal => Ok(Message::Signal {
                        signal_id: element(&mut seq, 1)?,
                        args: element(&mut seq, 2)?,
                    }),
                    MsgType::Error => {
                        let raw: u64 = element(&mut seq, 1)?;
                        let msg_type = MsgType::from_code(raw).ok_or_else(|| {
                            de::Error::custom(format!("unknown message type: {raw}"))
                        })?;
                        Ok(Message::Error {
                            msg_type,
                            request_id: element(&mut seq, 2)?,
                            error: element(&mut seq, 3)?,
                        })
                    }
                }
            }
        }

        deserializer.deserialize_seq(MessageVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder_tuple_shapes() {
        let cases = [
            (Message::link("tests.sink1"), json!([10, "tests.sink1"])),
            (Message::unlink("tests.sink1"), json!([12, "tests.sink1"])),
            (
                Message::init("tests.sink1", json!({"speed": 9})),
                json!([11, "tests.sink1", {"speed": 9}]),
            ),
            (
                Message::set_property("tests.sink1.speed", json!([[8]])),
                json!([20, "tests.sink1.speed", [[8]]]),
            ),
            (
                Message::property_change("tests.sink1.speed", json!([[115]])),
                json!([21, "tests.sink1.speed", [[115]]]),
            ),
            (
                Message::invoke(7, "tests.sink1.run", json!(["now"])),
                json!([30, 7, "tests.sink1.run", ["now"]]),
            ),
            (
                Message::invoke_reply(7, "tests.sink1.run", json!(17)),
                json!([31, 7, "tests.sink1.run", 17]),
            ),
            (
                Message::signal("tests.sink1.done", json!({"ok": true})),
                json!([40, "tests.sink1.done", {"ok": true}]),
            ),
            (
                Message::error(MsgType::Invoke, 7, "boom"),
                json!([90, 30, 7, "boom"]),
            ),
        ];
        for (message, expected) in cases {
            assert_eq!(serde_json::to_value(&message).unwrap(), expected);
        }
    }

    #[test]
    fn test_msg_type_codes() {
        for kind in [
            MsgType::Link,
            MsgType::Init,
            MsgType::Unlink,
            MsgType::SetProperty,
            MsgType::PropertyChange,
            MsgType::Invoke,
            MsgType::InvokeReply,
            MsgType::Signal,
            MsgType::Error,
        ] {
            assert_eq!(MsgType::from_code(kind.code()), Some(kind));
        }
        assert_eq!(MsgType::from_code(0), None);
        assert_eq!(MsgType::from_code(91), None);
    }

    #[test]
    fn test_decode_unknown_kind() {
        let err = serde_json::from_str::<Message>(r#"[99, "x"]"#).unwrap_err();
        assert!(err.to_string().contains("unknown message type: 99"));
    }

    #[test]
    fn test_decode_not_a_tuple() {
        assert!(serde_json::from_str::<Message>(r#"{"kind": 10}"#).is_err());
        assert!(serde_json::from_str::<Message>(r#""link""#).is_err());
    }

    #[test]
    fn test_decode_wrong_arity() {
        // missing fields
        assert!(serde_json::from_str::<Message>("[10]").is_err());
        assert!(serde_json::from_str::<Message>(r#"[30, 1, "m"]"#).is_err());
        // trailing fields
        assert!(serde_json::from_str::<Message>(r#"[10, "a", "b"]"#).is_err());
    }

    #[test]
    fn test_decode_non_numeric_kind() {
        assert!(serde_json::from_str::<Message>(r#"["link", "a"]"#).is_err());
        assert!(serde_json::from_str::<Message>(r#"[-10, "a"]"#).is_err());
    }

    #[test]
    fn test_payloads_pass_through() {
        let raw = r#"[40, "tests.sink2.exampleSingal", {"arg1": "some_string", "arg2": false}]"#;
        let message: Message = serde_json::from_str(raw).unwrap();
        match &message {
            Message::Signal { signal_id, args } => {
                assert_eq!(signal_id, "tests.sink2.exampleSingal");
                assert_eq!(args, &json!({"arg1": "some_string", "arg2": false}));
            }
            other => panic!("expected signal, got {other:?}"),
        }
    }
}
