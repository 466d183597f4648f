//! What a caller hands to a log call.

use serde::Serialize;
use serde_json::Value;
use std::error::Error as StdError;

use crate::event::capture;
use crate::event::Fields;

/// The body of a log call before it becomes a [`LogEvent`](crate::event::LogEvent).
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Literal text, printed verbatim.
    Message(String),
    /// Structured fields, printed per kind.
    Fields(Fields),
}

impl Payload {
    /// Render an error and its `source()` chain as a raw message.
    pub fn error(err: &(dyn StdError + 'static)) -> Self {
        Payload::Message(describe_error(err))
    }

    /// Copy any serializable value into owned fields.
    ///
    /// Never fails: values that cannot be represented are replaced by
    /// placeholders, see [`capture::to_value`].
    pub fn capture<T: Serialize + ?Sized>(value: &T) -> Self {
        Payload::from(capture::to_value(value))
    }
}

/// An error's message followed by its `source()` chain, one cause per line.
pub fn describe_error(err: &(dyn StdError + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str("\n    caused by: ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

impl From<&str> for Payload {
    fn from(message: &str) -> Self {
        Payload::Message(message.to_string())
    }
}

impl From<String> for Payload {
    fn from(message: String) -> Self {
        Payload::Message(message)
    }
}

impl From<Fields> for Payload {
    fn from(fields: Fields) -> Self {
        Payload::Fields(fields)
    }
}

/// Objects become fields directly; any other value is stored under `value`.
impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(fields) => Payload::Fields(fields),
            other => {
                let mut fields = Fields::new();
                fields.insert("value".to_string(), other);
                Payload::Fields(fields)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fmt;

    #[derive(Debug)]
    struct Outer(Inner);
    #[derive(Debug)]
    struct Inner;

    impl fmt::Display for Outer {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "simulated database error")
        }
    }
    impl fmt::Display for Inner {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "connection reset")
        }
    }
    impl StdError for Inner {}
    impl StdError for Outer {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn test_error_chain_message() {
        let payload = Payload::error(&Outer(Inner));
        assert_eq!(
            payload,
            Payload::Message("simulated database error\n    caused by: connection reset".into())
        );
    }

    #[test]
    fn test_scalar_value_wrapped() {
        match Payload::from(json!(3)) {
            Payload::Fields(fields) => assert_eq!(fields.get("value"), Some(&json!(3))),
            other => panic!("unexpected payload {:?}", other),
        }
    }
}
