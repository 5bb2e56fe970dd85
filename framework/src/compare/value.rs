//! Reflected value model
//!
//! The comparator does not inspect Rust values directly; it operates on
//! [`ReflectValue`] trees obtained by serializing any `serde::Serialize` value
//! through a private [`serde::Serializer`] implementation. This is the
//! framework's substitute for runtime field reflection: everything the
//! `#[derive(Serialize)]` machinery knows about a type (struct names, field
//! names, collection shapes) is captured in the tree, and nothing else.
//!
//! Unlike a plain JSON value, the model keeps structs and maps apart, so a
//! `HashMap` field and a struct field produce different difference nodes.

use serde::ser::{self, Serialize};
use std::fmt;

use crate::error::AttestError;

/// A value reflected into the comparison model
///
/// Built once per comparison via [`ReflectValue::from_serialize`]; read-only
/// afterwards.
#[derive(Debug, Clone)]
pub enum ReflectValue {
    /// `None`, unit, or a serialized `null`
    Null,
    /// A boolean
    Bool(bool),
    /// A signed integer
    Int(i64),
    /// An unsigned integer that does not fit `i64`
    UInt(u64),
    /// A floating point number
    Float(f64),
    /// A string, `char`, or unit enum variant
    String(String),
    /// A sequence, tuple, or byte string
    Seq(Vec<ReflectValue>),
    /// A map, in serialization order
    Map(Vec<(ReflectValue, ReflectValue)>),
    /// A struct or struct-like enum variant
    Struct {
        /// The struct or variant name
        name: &'static str,
        /// Named fields in declaration order; tuple-like variants use "0", "1", ...
        fields: Vec<(&'static str, ReflectValue)>,
    },
}

/// Coarse kind of a reflected value, used for type-mismatch detection and
/// matching scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Null,
    Bool,
    Number,
    String,
    Seq,
    Map,
    Struct,
}

impl ReflectValue {
    /// Reflect any serializable value into the model.
    ///
    /// `max_depth` bounds the nesting the reflector will follow; going past it
    /// returns [`AttestError::DepthExceeded`]. This is what keeps a
    /// self-referential graph (e.g. an `Rc` cycle serialized through a custom
    /// `Serialize` impl) from recursing without bound.
    pub fn from_serialize<T>(value: &T, max_depth: usize) -> Result<Self, AttestError>
    where
        T: Serialize + ?Sized,
    {
        value
            .serialize(Reflector {
                depth: 0,
                max_depth,
            })
            .map_err(|err| match err {
                ReflectError::DepthExceeded => AttestError::DepthExceeded { max_depth },
                ReflectError::Message(reason) => AttestError::Reflection { reason },
            })
    }

    /// The coarse kind of this value
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Null => ValueKind::Null,
            Self::Bool(_) => ValueKind::Bool,
            Self::Int(_) | Self::UInt(_) | Self::Float(_) => ValueKind::Number,
            Self::String(_) => ValueKind::String,
            Self::Seq(_) => ValueKind::Seq,
            Self::Map(_) => ValueKind::Map,
            Self::Struct { .. } => ValueKind::Struct,
        }
    }

    /// True if this is the model's "default" value: null, `false` or
    /// numeric zero. These are the values the ignore-defaults leniency skips
    /// on the expected side.
    pub fn is_default(&self) -> bool {
        match self {
            Self::Null | Self::Bool(false) => true,
            Self::Int(value) => *value == 0,
            Self::UInt(value) => *value == 0,
            Self::Float(value) => *value == 0.0,
            _ => false,
        }
    }

    /// True if this value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

fn numbers_equal(left: &ReflectValue, right: &ReflectValue) -> Option<bool> {
    use ReflectValue::*;
    let equal = match (left, right) {
        (Int(a), Int(b)) => a == b,
        (UInt(a), UInt(b)) => a == b,
        (Float(a), Float(b)) => a == b,
        (Int(a), UInt(b)) | (UInt(b), Int(a)) => *a >= 0 && *a as u64 == *b,
        (Int(a), Float(b)) | (Float(b), Int(a)) => *a as f64 == *b,
        (UInt(a), Float(b)) | (Float(b), UInt(a)) => *a as f64 == *b,
        _ => return None,
    };
    Some(equal)
}

impl PartialEq for ReflectValue {
    /// Structural equality. Numbers compare numerically across the integer
    /// and float representations, so `1u8` and `1i64` reflect equal.
    fn eq(&self, other: &Self) -> bool {
        if let Some(equal) = numbers_equal(self, other) {
            return equal;
        }
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Seq(a), Self::Seq(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            (
                Self::Struct { name: a, fields: af },
                Self::Struct { name: b, fields: bf },
            ) => a == b && af == bf,
            _ => false,
        }
    }
}

impl fmt::Display for ReflectValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(value) => write!(f, "{}", value),
            Self::Int(value) => write!(f, "{}", value),
            Self::UInt(value) => write!(f, "{}", value),
            Self::Float(value) => write!(f, "{}", value),
            Self::String(value) => write!(f, "{:?}", value),
            Self::Seq(elements) => {
                write!(f, "[")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", element)?;
                }
                write!(f, "]")
            }
            Self::Map(entries) => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
            Self::Struct { name, fields } => {
                let tuple_like = !fields.is_empty()
                    && fields.iter().all(|(key, _)| key.bytes().all(|b| b.is_ascii_digit()));
                if tuple_like {
                    write!(f, "{}(", name)?;
                    for (i, (_, value)) in fields.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{}", value)?;
                    }
                    write!(f, ")")
                } else if fields.is_empty() {
                    write!(f, "{}", name)
                } else {
                    write!(f, "{} {{ ", name)?;
                    for (i, (key, value)) in fields.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{}: {}", key, value)?;
                    }
                    write!(f, " }}")
                }
            }
        }
    }
}

/// Internal serializer error
#[derive(Debug)]
pub enum ReflectError {
    DepthExceeded,
    Message(String),
}

impl fmt::Display for ReflectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DepthExceeded => write!(f, "maximum reflection depth exceeded"),
            Self::Message(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for ReflectError {}

impl ser::Error for ReflectError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Self::Message(msg.to_string())
    }
}

/// The serializer that builds [`ReflectValue`] trees
struct Reflector {
    depth: usize,
    max_depth: usize,
}

impl Reflector {
    fn descend(&self) -> Result<Reflector, ReflectError> {
        if self.depth >= self.max_depth {
            return Err(ReflectError::DepthExceeded);
        }
        Ok(Reflector {
            depth: self.depth + 1,
            max_depth: self.max_depth,
        })
    }
}

impl ser::Serializer for Reflector {
    type Ok = ReflectValue;
    type Error = ReflectError;

    type SerializeSeq = SeqCollector;
    type SerializeTuple = SeqCollector;
    type SerializeTupleStruct = SeqCollector;
    type SerializeTupleVariant = VariantSeqCollector;
    type SerializeMap = MapCollector;
    type SerializeStruct = StructCollector;
    type SerializeStructVariant = StructCollector;

    fn serialize_bool(self, v: bool) -> Result<ReflectValue, ReflectError> {
        Ok(ReflectValue::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<ReflectValue, ReflectError> {
        Ok(ReflectValue::Int(v as i64))
    }

    fn serialize_i16(self, v: i16) -> Result<ReflectValue, ReflectError> {
        Ok(ReflectValue::Int(v as i64))
    }

    fn serialize_i32(self, v: i32) -> Result<ReflectValue, ReflectError> {
        Ok(ReflectValue::Int(v as i64))
    }

    fn serialize_i64(self, v: i64) -> Result<ReflectValue, ReflectError> {
        Ok(ReflectValue::Int(v))
    }

    fn serialize_u8(self, v: u8) -> Result<ReflectValue, ReflectError> {
        Ok(ReflectValue::Int(v as i64))
    }

    fn serialize_u16(self, v: u16) -> Result<ReflectValue, ReflectError> {
        Ok(ReflectValue::Int(v as i64))
    }

    fn serialize_u32(self, v: u32) -> Result<ReflectValue, ReflectError> {
        Ok(ReflectValue::Int(v as i64))
    }

    fn serialize_u64(self, v: u64) -> Result<ReflectValue, ReflectError> {
        if let Ok(value) = i64::try_from(v) {
            Ok(ReflectValue::Int(value))
        } else {
            Ok(ReflectValue::UInt(v))
        }
    }

    fn serialize_f32(self, v: f32) -> Result<ReflectValue, ReflectError> {
        Ok(ReflectValue::Float(v as f64))
    }

    fn serialize_f64(self, v: f64) -> Result<ReflectValue, ReflectError> {
        Ok(ReflectValue::Float(v))
    }

    fn serialize_char(self, v: char) -> Result<ReflectValue, ReflectError> {
        Ok(ReflectValue::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<ReflectValue, ReflectError> {
        Ok(ReflectValue::String(v.to_string()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<ReflectValue, ReflectError> {
        Ok(ReflectValue::Seq(
            v.iter().map(|b| ReflectValue::Int(*b as i64)).collect(),
        ))
    }

    fn serialize_none(self) -> Result<ReflectValue, ReflectError> {
        Ok(ReflectValue::Null)
    }

    fn serialize_some<T>(self, value: &T) -> Result<ReflectValue, ReflectError>
    where
        T: Serialize + ?Sized,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<ReflectValue, ReflectError> {
        Ok(ReflectValue::Null)
    }

    fn serialize_unit_struct(self, name: &'static str) -> Result<ReflectValue, ReflectError> {
        Ok(ReflectValue::Struct {
            name,
            fields: Vec::new(),
        })
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<ReflectValue, ReflectError> {
        Ok(ReflectValue::String(variant.to_string()))
    }

    fn serialize_newtype_struct<T>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<ReflectValue, ReflectError>
    where
        T: Serialize + ?Sized,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<ReflectValue, ReflectError>
    where
        T: Serialize + ?Sized,
    {
        let inner = value.serialize(self.descend()?)?;
        Ok(ReflectValue::Struct {
            name: variant,
            fields: vec![("0", inner)],
        })
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SeqCollector, ReflectError> {
        let next = self.descend()?;
        Ok(SeqCollector {
            elements: Vec::with_capacity(len.unwrap_or(0)),
            reflector: next,
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<SeqCollector, ReflectError> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<SeqCollector, ReflectError> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<VariantSeqCollector, ReflectError> {
        let next = self.descend()?;
        Ok(VariantSeqCollector {
            name: variant,
            elements: Vec::with_capacity(len),
            reflector: next,
        })
    }

    fn serialize_map(self, len: Option<usize>) -> Result<MapCollector, ReflectError> {
        let next = self.descend()?;
        Ok(MapCollector {
            entries: Vec::with_capacity(len.unwrap_or(0)),
            pending_key: None,
            reflector: next,
        })
    }

    fn serialize_struct(
        self,
        name: &'static str,
        len: usize,
    ) -> Result<StructCollector, ReflectError> {
        let next = self.descend()?;
        Ok(StructCollector {
            name,
            fields: Vec::with_capacity(len),
            reflector: next,
        })
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<StructCollector, ReflectError> {
        self.serialize_struct(variant, len)
    }
}

struct SeqCollector {
    elements: Vec<ReflectValue>,
    reflector: Reflector,
}

impl SeqCollector {
    fn push<T>(&mut self, value: &T) -> Result<(), ReflectError>
    where
        T: Serialize + ?Sized,
    {
        let element = value.serialize(Reflector {
            depth: self.reflector.depth,
            max_depth: self.reflector.max_depth,
        })?;
        self.elements.push(element);
        Ok(())
    }
}

impl ser::SerializeSeq for SeqCollector {
    type Ok = ReflectValue;
    type Error = ReflectError;

    fn serialize_element<T>(&mut self, value: &T) -> Result<(), ReflectError>
    where
        T: Serialize + ?Sized,
    {
        self.push(value)
    }

    fn end(self) -> Result<ReflectValue, ReflectError> {
        Ok(ReflectValue::Seq(self.elements))
    }
}

impl ser::SerializeTuple for SeqCollector {
    type Ok = ReflectValue;
    type Error = ReflectError;

    fn serialize_element<T>(&mut self, value: &T) -> Result<(), ReflectError>
    where
        T: Serialize + ?Sized,
    {
        self.push(value)
    }

    fn end(self) -> Result<ReflectValue, ReflectError> {
        Ok(ReflectValue::Seq(self.elements))
    }
}

impl ser::SerializeTupleStruct for SeqCollector {
    type Ok = ReflectValue;
    type Error = ReflectError;

    fn serialize_field<T>(&mut self, value: &T) -> Result<(), ReflectError>
    where
        T: Serialize + ?Sized,
    {
        self.push(value)
    }

    fn end(self) -> Result<ReflectValue, ReflectError> {
        Ok(ReflectValue::Seq(self.elements))
    }
}

struct VariantSeqCollector {
    name: &'static str,
    elements: Vec<ReflectValue>,
    reflector: Reflector,
}

impl ser::SerializeTupleVariant for VariantSeqCollector {
    type Ok = ReflectValue;
    type Error = ReflectError;

    fn serialize_field<T>(&mut self, value: &T) -> Result<(), ReflectError>
    where
        T: Serialize + ?Sized,
    {
        let element = value.serialize(Reflector {
            depth: self.reflector.depth,
            max_depth: self.reflector.max_depth,
        })?;
        self.elements.push(element);
        Ok(())
    }

    fn end(self) -> Result<ReflectValue, ReflectError> {
        const INDEX_NAMES: [&str; 8] = ["0", "1", "2", "3", "4", "5", "6", "7"];
        let fields = self
            .elements
            .into_iter()
            .enumerate()
            .map(|(i, element)| (*INDEX_NAMES.get(i).unwrap_or(&"+"), element))
            .collect();
        Ok(ReflectValue::Struct {
            name: self.name,
            fields,
        })
    }
}

struct MapCollector {
    entries: Vec<(ReflectValue, ReflectValue)>,
    pending_key: Option<ReflectValue>,
    reflector: Reflector,
}

impl ser::SerializeMap for MapCollector {
    type Ok = ReflectValue;
    type Error = ReflectError;

    fn serialize_key<T>(&mut self, key: &T) -> Result<(), ReflectError>
    where
        T: Serialize + ?Sized,
    {
        let key = key.serialize(Reflector {
            depth: self.reflector.depth,
            max_depth: self.reflector.max_depth,
        })?;
        self.pending_key = Some(key);
        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<(), ReflectError>
    where
        T: Serialize + ?Sized,
    {
        let key = self
            .pending_key
            .take()
            .ok_or_else(|| ser::Error::custom("map value serialized before its key"))?;
        let value = value.serialize(Reflector {
            depth: self.reflector.depth,
            max_depth: self.reflector.max_depth,
        })?;
        self.entries.push((key, value));
        Ok(())
    }

    fn end(self) -> Result<ReflectValue, ReflectError> {
        Ok(ReflectValue::Map(self.entries))
    }
}

struct StructCollector {
    name: &'static str,
    fields: Vec<(&'static str, ReflectValue)>,
    reflector: Reflector,
}

impl StructCollector {
    fn push<T>(&mut self, key: &'static str, value: &T) -> Result<(), ReflectError>
    where
        T: Serialize + ?Sized,
    {
        let value = value.serialize(Reflector {
            depth: self.reflector.depth,
            max_depth: self.reflector.max_depth,
        })?;
        self.fields.push((key, value));
        Ok(())
    }
}

impl ser::SerializeStruct for StructCollector {
    type Ok = ReflectValue;
    type Error = ReflectError;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<(), ReflectError>
    where
        T: Serialize + ?Sized,
    {
        self.push(key, value)
    }

    fn end(self) -> Result<ReflectValue, ReflectError> {
        Ok(ReflectValue::Struct {
            name: self.name,
            fields: self.fields,
        })
    }
}

impl ser::SerializeStructVariant for StructCollector {
    type Ok = ReflectValue;
    type Error = ReflectError;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<(), ReflectError>
    where
        T: Serialize + ?Sized,
    {
        self.push(key, value)
    }

    fn end(self) -> Result<ReflectValue, ReflectError> {
        Ok(ReflectValue::Struct {
            name: self.name,
            fields: self.fields,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde::Serialize;
    use std::collections::BTreeMap;

    #[derive(Serialize)]
    struct Point {
        x: i32,
        y: i32,
    }

    #[test]
    fn reflects_structs_with_names_and_fields() {
        let value = ReflectValue::from_serialize(&Point { x: 1, y: 2 }, 16).unwrap();
        match value {
            ReflectValue::Struct { name, fields } => {
                assert_eq!(name, "Point");
                assert_eq!(fields.len(), 2);
                assert_eq!(fields[0].0, "x");
                assert_eq!(fields[0].1, ReflectValue::Int(1));
            }
            other => panic!("expected a struct, got {}", other),
        }
    }

    #[test]
    fn maps_and_structs_are_distinct_kinds() {
        let mut map = BTreeMap::new();
        map.insert("x", 1);
        let map_value = ReflectValue::from_serialize(&map, 16).unwrap();
        let struct_value = ReflectValue::from_serialize(&Point { x: 1, y: 2 }, 16).unwrap();
        assert_eq!(map_value.kind(), ValueKind::Map);
        assert_eq!(struct_value.kind(), ValueKind::Struct);
    }

    #[test]
    fn numbers_compare_numerically_across_representations() {
        assert_eq!(ReflectValue::Int(1), ReflectValue::Float(1.0));
        assert_eq!(ReflectValue::Int(7), ReflectValue::UInt(7));
        assert_ne!(ReflectValue::Int(1), ReflectValue::Float(1.5));
    }

    #[test]
    fn depth_bound_rejects_deep_nesting() {
        let deep = vec![vec![vec![vec![1]]]];
        let err = ReflectValue::from_serialize(&deep, 2).unwrap_err();
        assert!(matches!(err, AttestError::DepthExceeded { max_depth: 2 }));
    }

    #[test]
    fn default_values_are_detected() {
        assert!(ReflectValue::Null.is_default());
        assert!(ReflectValue::Bool(false).is_default());
        assert!(ReflectValue::Int(0).is_default());
        assert!(!ReflectValue::String(String::new()).is_default());
    }

    #[test]
    fn displays_compact_literals() {
        let value = ReflectValue::from_serialize(&Point { x: 1, y: 2 }, 16).unwrap();
        assert_eq!(value.to_string(), "Point { x: 1, y: 2 }");
        let list = ReflectValue::from_serialize(&vec!["a", "b"], 16).unwrap();
        assert_eq!(list.to_string(), r#"["a", "b"]"#);
    }
}
