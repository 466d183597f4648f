//! Owned, bounded copy of caller data.
//!
//! Log payloads are arbitrary `Serialize` values owned by the caller. They are
//! copied into a `serde_json::Value` tree at the log call so buffered events
//! never alias caller state. Unlike `serde_json::to_value` the copy never
//! fails and its cost is bounded:
//! - a value revisited while it is still being copied (a cycle through `Rc`,
//!   `Arc` or references) becomes [`CIRCULAR`]; so does anything nested
//!   deeper than [`MAX_DEPTH`]
//! - once [`MAX_NODES`] values have been copied the rest become [`TRUNCATED`]
//! - a child whose `Serialize` impl errors becomes an `[Unrepresentable: ..]`
//!   string, its siblings are kept
//! - non-string map keys are stringified

use serde::ser::{
    self, Serialize, SerializeMap, SerializeSeq, SerializeStruct, SerializeStructVariant,
    SerializeTuple, SerializeTupleStruct, SerializeTupleVariant, Serializer,
};
use serde_json::{Map, Number, Value};
use std::any::type_name;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::mem::size_of_val;

/// Nesting depth after which values are replaced by [`CIRCULAR`].
pub const MAX_DEPTH: usize = 32;

/// Values copied per capture before the remainder is replaced by [`TRUNCATED`].
pub const MAX_NODES: usize = 10_000;

/// Placeholder for cyclic or too deeply nested data.
pub const CIRCULAR: &str = "[Circular]";

/// Placeholder for data past the [`MAX_NODES`] budget.
pub const TRUNCATED: &str = "[Unrepresentable: payload too large]";

/// Copy `value` into an owned JSON tree.
pub fn to_value<T: Serialize + ?Sized>(value: &T) -> Value {
    Walk::default().child(value, 0)
}

/// State shared by every level of one capture.
#[derive(Default)]
struct Walk {
    /// Address and type of each value on the current path.
    ancestors: RefCell<Vec<(*const (), &'static str)>>,
    nodes: Cell<usize>,
}

impl Walk {
    fn child<T: Serialize + ?Sized>(&self, value: &T, depth: usize) -> Value {
        if depth > MAX_DEPTH {
            return Value::String(CIRCULAR.to_string());
        }

        let nodes = self.nodes.get() + 1;
        self.nodes.set(nodes);
        if nodes > MAX_NODES {
            return Value::String(TRUNCATED.to_string());
        }

        // Zero-sized values share addresses with their neighbours.
        let tracked = size_of_val(value) > 0;
        let entry = (value as *const T as *const (), type_name::<T>());
        if tracked {
            if self.ancestors.borrow().contains(&entry) {
                return Value::String(CIRCULAR.to_string());
            }
            self.ancestors.borrow_mut().push(entry);
        }

        let copied = value
            .serialize(Capture { depth, walk: self })
            .unwrap_or_else(|err| Value::String(format!("[Unrepresentable: {}]", err)));

        if tracked {
            self.ancestors.borrow_mut().pop();
        }
        copied
    }
}

fn key_string(key: Value) -> String {
    match key {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Error raised by a payload's own `Serialize` impl.
#[derive(Debug)]
pub struct CaptureError(String);

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for CaptureError {}

impl ser::Error for CaptureError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        CaptureError(msg.to_string())
    }
}

struct Capture<'a> {
    depth: usize,
    walk: &'a Walk,
}

impl<'a> Serializer for Capture<'a> {
    type Ok = Value;
    type Error = CaptureError;
    type SerializeSeq = SeqCapture<'a>;
    type SerializeTuple = SeqCapture<'a>;
    type SerializeTupleStruct = SeqCapture<'a>;
    type SerializeTupleVariant = VariantSeqCapture<'a>;
    type SerializeMap = MapCapture<'a>;
    type SerializeStruct = MapCapture<'a>;
    type SerializeStructVariant = VariantMapCapture<'a>;

    fn serialize_bool(self, v: bool) -> Result<Value, CaptureError> {
        Ok(Value::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<Value, CaptureError> {
        Ok(Value::from(v))
    }

    fn serialize_i16(self, v: i16) -> Result<Value, CaptureError> {
        Ok(Value::from(v))
    }

    fn serialize_i32(self, v: i32) -> Result<Value, CaptureError> {
        Ok(Value::from(v))
    }

    fn serialize_i64(self, v: i64) -> Result<Value, CaptureError> {
        Ok(Value::from(v))
    }

    fn serialize_i128(self, v: i128) -> Result<Value, CaptureError> {
        Ok(i64::try_from(v)
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(v.to_string())))
    }

    fn serialize_u8(self, v: u8) -> Result<Value, CaptureError> {
        Ok(Value::from(v))
    }

    fn serialize_u16(self, v: u16) -> Result<Value, CaptureError> {
        Ok(Value::from(v))
    }

    fn serialize_u32(self, v: u32) -> Result<Value, CaptureError> {
        Ok(Value::from(v))
    }

    fn serialize_u64(self, v: u64) -> Result<Value, CaptureError> {
        Ok(Value::from(v))
    }

    fn serialize_u128(self, v: u128) -> Result<Value, CaptureError> {
        Ok(u64::try_from(v)
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(v.to_string())))
    }

    fn serialize_f32(self, v: f32) -> Result<Value, CaptureError> {
        self.serialize_f64(f64::from(v))
    }

    fn serialize_f64(self, v: f64) -> Result<Value, CaptureError> {
        Ok(Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null))
    }

    fn serialize_char(self, v: char) -> Result<Value, CaptureError> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Value, CaptureError> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Value, CaptureError> {
        Ok(Value::Array(v.iter().map(|b| Value::from(*b)).collect()))
    }

    fn serialize_none(self) -> Result<Value, CaptureError> {
        Ok(Value::Null)
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<Value, CaptureError> {
        Ok(self.walk.child(value, self.depth + 1))
    }

    fn serialize_unit(self) -> Result<Value, CaptureError> {
        Ok(Value::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Value, CaptureError> {
        Ok(Value::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Value, CaptureError> {
        Ok(Value::String(variant.to_string()))
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<Value, CaptureError> {
        Ok(self.walk.child(value, self.depth + 1))
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Value, CaptureError> {
        let mut map = Map::new();
        map.insert(variant.to_string(), self.walk.child(value, self.depth + 1));
        Ok(Value::Object(map))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SeqCapture<'a>, CaptureError> {
        Ok(SeqCapture {
            depth: self.depth,
            walk: self.walk,
            items: Vec::with_capacity(len.unwrap_or(0)),
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<SeqCapture<'a>, CaptureError> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<SeqCapture<'a>, CaptureError> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<VariantSeqCapture<'a>, CaptureError> {
        Ok(VariantSeqCapture {
            variant,
            seq: SeqCapture {
                depth: self.depth,
                walk: self.walk,
                items: Vec::with_capacity(len),
            },
        })
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<MapCapture<'a>, CaptureError> {
        Ok(MapCapture {
            depth: self.depth,
            walk: self.walk,
            map: Map::new(),
            next_key: None,
        })
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<MapCapture<'a>, CaptureError> {
        self.serialize_map(Some(len))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<VariantMapCapture<'a>, CaptureError> {
        Ok(VariantMapCapture {
            variant,
            inner: MapCapture {
                depth: self.depth,
                walk: self.walk,
                map: Map::new(),
                next_key: None,
            },
        })
    }
}

struct SeqCapture<'a> {
    depth: usize,
    walk: &'a Walk,
    items: Vec<Value>,
}

impl SerializeSeq for SeqCapture<'_> {
    type Ok = Value;
    type Error = CaptureError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), CaptureError> {
        self.items.push(self.walk.child(value, self.depth + 1));
        Ok(())
    }

    fn end(self) -> Result<Value, CaptureError> {
        Ok(Value::Array(self.items))
    }
}

impl SerializeTuple for SeqCapture<'_> {
    type Ok = Value;
    type Error = CaptureError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), CaptureError> {
        SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Value, CaptureError> {
        SerializeSeq::end(self)
    }
}

impl SerializeTupleStruct for SeqCapture<'_> {
    type Ok = Value;
    type Error = CaptureError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), CaptureError> {
        SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Value, CaptureError> {
        SerializeSeq::end(self)
    }
}

struct VariantSeqCapture<'a> {
    variant: &'static str,
    seq: SeqCapture<'a>,
}

impl SerializeTupleVariant for VariantSeqCapture<'_> {
    type Ok = Value;
    type Error = CaptureError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), CaptureError> {
        SerializeSeq::serialize_element(&mut self.seq, value)
    }

    fn end(self) -> Result<Value, CaptureError> {
        let mut map = Map::new();
        map.insert(self.variant.to_string(), SerializeSeq::end(self.seq)?);
        Ok(Value::Object(map))
    }
}

struct MapCapture<'a> {
    depth: usize,
    walk: &'a Walk,
    map: Map<String, Value>,
    next_key: Option<String>,
}

impl SerializeMap for MapCapture<'_> {
    type Ok = Value;
    type Error = CaptureError;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> Result<(), CaptureError> {
        // Keys are scalars in practice; a fresh depth keeps them out of the cut.
        self.next_key = Some(key_string(self.walk.child(key, 0)));
        Ok(())
    }

    fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), CaptureError> {
        let key = self.next_key.take().unwrap_or_default();
        self.map.insert(key, self.walk.child(value, self.depth + 1));
        Ok(())
    }

    fn end(self) -> Result<Value, CaptureError> {
        Ok(Value::Object(self.map))
    }
}

impl SerializeStruct for MapCapture<'_> {
    type Ok = Value;
    type Error = CaptureError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), CaptureError> {
        self.map.insert(key.to_string(), self.walk.child(value, self.depth + 1));
        Ok(())
    }

    fn end(self) -> Result<Value, CaptureError> {
        Ok(Value::Object(self.map))
    }
}

struct VariantMapCapture<'a> {
    variant: &'static str,
    inner: MapCapture<'a>,
}

impl SerializeStructVariant for VariantMapCapture<'_> {
    type Ok = Value;
    type Error = CaptureError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), CaptureError> {
        SerializeStruct::serialize_field(&mut self.inner, key, value)
    }

    fn end(self) -> Result<Value, CaptureError> {
        let mut map = Map::new();
        map.insert(self.variant.to_string(), Value::Object(self.inner.map));
        Ok(Value::Object(map))
    }
}
