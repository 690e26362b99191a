//! Value serialization.
//!
//! Every value handed to a store goes through a [`Codec`] on its way to and
//! from the engine. Two codecs exist: [`Json`] (text) and [`Bincode`]
//! (compact binary). [`MarshalFormat`] picks one of them at construction time.

use std::fmt;
use std::str::FromStr;

use bincode::Options as _;
use failure::Fail;
use serde::de::DeserializeOwned;
use serde::ser::{self, Impossible};
use serde::{Deserialize, Serialize};

#[derive(Fail, Debug)]
pub enum CodecError {
    #[fail(display = "{}", _0)]
    Json(#[fail(cause)] serde_json::Error),

    #[fail(display = "{}", _0)]
    Bincode(#[fail(cause)] bincode::Error),

    #[fail(display = "non-finite float {} has no JSON representation", _0)]
    NonFinite(f64),
}

impl From<serde_json::Error> for CodecError {
    fn from(err: serde_json::Error) -> CodecError {
        CodecError::Json(err)
    }
}

impl From<bincode::Error> for CodecError {
    fn from(err: bincode::Error) -> CodecError {
        CodecError::Bincode(err)
    }
}

/// Converts values to bytes and back.
///
/// Implementations hold no state between calls.
pub trait Codec {
    fn marshal<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, CodecError>;
    fn unmarshal<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CodecError>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Json;

impl Codec for Json {
    fn marshal<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        // serde_json writes NaN and infinities as `null`, which reads back as
        // a different value.
        if let Err(ProbeError::NonFinite(v)) = value.serialize(FiniteProbe) {
            return Err(CodecError::NonFinite(v));
        }
        Ok(serde_json::to_vec(value)?)
    }

    fn unmarshal<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CodecError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Bincode;

impl Codec for Bincode {
    fn marshal<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        Ok(bincode_options().serialize(value)?)
    }

    fn unmarshal<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CodecError> {
        Ok(bincode_options().deserialize(bytes)?)
    }
}

// Leftover bytes mean the destination type does not match what was stored.
fn bincode_options() -> impl bincode::Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .reject_trailing_bytes()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarshalFormat {
    Json,
    Bincode,
}

impl Default for MarshalFormat {
    fn default() -> Self {
        MarshalFormat::Json
    }
}

impl Codec for MarshalFormat {
    fn marshal<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        match self {
            MarshalFormat::Json => Json.marshal(value),
            MarshalFormat::Bincode => Bincode.marshal(value),
        }
    }

    fn unmarshal<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CodecError> {
        match self {
            MarshalFormat::Json => Json.unmarshal(bytes),
            MarshalFormat::Bincode => Bincode.unmarshal(bytes),
        }
    }
}

impl fmt::Display for MarshalFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MarshalFormat::Json => "json",
            MarshalFormat::Bincode => "bincode",
        })
    }
}

impl FromStr for MarshalFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(MarshalFormat::Json),
            "bincode" => Ok(MarshalFormat::Bincode),
            _ => Err(format!("unknown marshal format: {}", s)),
        }
    }
}

/// Returns true if `value` serializes as nothing at the top level,
/// i.e. it is `None` or `()`.
pub fn is_nil<T: Serialize + ?Sized>(value: &T) -> bool {
    value.serialize(NilProbe).is_ok()
}

// A serializer that only succeeds on `none` and `unit`.
struct NilProbe;

#[derive(Debug)]
struct NotNil;

impl fmt::Display for NotNil {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("value is not nil")
    }
}

impl std::error::Error for NotNil {}

impl ser::Error for NotNil {
    fn custom<T: fmt::Display>(_msg: T) -> Self {
        NotNil
    }
}

macro_rules! not_nil {
    ($($method:ident($($arg:ty),*);)*) => {
        $(
            fn $method(self, $(_: $arg),*) -> Result<Self::Ok, Self::Error> {
                Err(NotNil)
            }
        )*
    };
}

impl ser::Serializer for NilProbe {
    type Ok = ();
    type Error = NotNil;
    type SerializeSeq = Impossible<(), NotNil>;
    type SerializeTuple = Impossible<(), NotNil>;
    type SerializeTupleStruct = Impossible<(), NotNil>;
    type SerializeTupleVariant = Impossible<(), NotNil>;
    type SerializeMap = Impossible<(), NotNil>;
    type SerializeStruct = Impossible<(), NotNil>;
    type SerializeStructVariant = Impossible<(), NotNil>;

    fn serialize_none(self) -> Result<(), NotNil> {
        Ok(())
    }

    fn serialize_unit(self) -> Result<(), NotNil> {
        Ok(())
    }

    not_nil! {
        serialize_bool(bool);
        serialize_i8(i8);
        serialize_i16(i16);
        serialize_i32(i32);
        serialize_i64(i64);
        serialize_u8(u8);
        serialize_u16(u16);
        serialize_u32(u32);
        serialize_u64(u64);
        serialize_f32(f32);
        serialize_f64(f64);
        serialize_char(char);
        serialize_str(&str);
        serialize_bytes(&[u8]);
        serialize_unit_struct(&'static str);
        serialize_unit_variant(&'static str, u32, &'static str);
    }

    fn serialize_some<T: Serialize + ?Sized>(self, _value: &T) -> Result<(), NotNil> {
        Err(NotNil)
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _value: &T,
    ) -> Result<(), NotNil> {
        Err(NotNil)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<(), NotNil> {
        Err(NotNil)
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq, NotNil> {
        Err(NotNil)
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple, NotNil> {
        Err(NotNil)
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct, NotNil> {
        Err(NotNil)
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant, NotNil> {
        Err(NotNil)
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap, NotNil> {
        Err(NotNil)
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStruct, NotNil> {
        Err(NotNil)
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant, NotNil> {
        Err(NotNil)
    }
}

// A serializer that walks the whole value and fails on NaN or infinity.
struct FiniteProbe;

#[derive(Debug)]
enum ProbeError {
    NonFinite(f64),
    Custom,
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeError::NonFinite(v) => write!(f, "non-finite float {}", v),
            ProbeError::Custom => f.write_str("custom serialization error"),
        }
    }
}

impl std::error::Error for ProbeError {}

impl ser::Error for ProbeError {
    fn custom<T: fmt::Display>(_msg: T) -> Self {
        ProbeError::Custom
    }
}

fn check_finite(v: f64) -> Result<(), ProbeError> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(ProbeError::NonFinite(v))
    }
}

macro_rules! finite {
    ($($method:ident($($arg:ty),*);)*) => {
        $(
            fn $method(self, $(_: $arg),*) -> Result<Self::Ok, Self::Error> {
                Ok(())
            }
        )*
    };
}

impl ser::Serializer for FiniteProbe {
    type Ok = ();
    type Error = ProbeError;
    type SerializeSeq = FiniteProbe;
    type SerializeTuple = FiniteProbe;
    type SerializeTupleStruct = FiniteProbe;
    type SerializeTupleVariant = FiniteProbe;
    type SerializeMap = FiniteProbe;
    type SerializeStruct = FiniteProbe;
    type SerializeStructVariant = FiniteProbe;

    fn serialize_f32(self, v: f32) -> Result<(), ProbeError> {
        check_finite(f64::from(v))
    }

    fn serialize_f64(self, v: f64) -> Result<(), ProbeError> {
        check_finite(v)
    }

    finite! {
        serialize_bool(bool);
        serialize_i8(i8);
        serialize_i16(i16);
        serialize_i32(i32);
        serialize_i64(i64);
        serialize_u8(u8);
        serialize_u16(u16);
        serialize_u32(u32);
        serialize_u64(u64);
        serialize_char(char);
        serialize_str(&str);
        serialize_bytes(&[u8]);
        serialize_none();
        serialize_unit();
        serialize_unit_struct(&'static str);
        serialize_unit_variant(&'static str, u32, &'static str);
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<(), ProbeError> {
        value.serialize(self)
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<(), ProbeError> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        value: &T,
    ) -> Result<(), ProbeError> {
        value.serialize(self)
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self, ProbeError> {
        Ok(self)
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self, ProbeError> {
        Ok(self)
    }

    fn serialize_tuple_struct(self, _name: &'static str, _len: usize) -> Result<Self, ProbeError> {
        Ok(self)
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self, ProbeError> {
        Ok(self)
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self, ProbeError> {
        Ok(self)
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self, ProbeError> {
        Ok(self)
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self, ProbeError> {
        Ok(self)
    }
}

macro_rules! finite_elements {
    ($($trait:ident::$method:ident;)*) => {
        $(
            impl ser::$trait for FiniteProbe {
                type Ok = ();
                type Error = ProbeError;

                fn $method<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), ProbeError> {
                    value.serialize(FiniteProbe)
                }

                fn end(self) -> Result<(), ProbeError> {
                    Ok(())
                }
            }
        )*
    };
}

finite_elements! {
    SerializeSeq::serialize_element;
    SerializeTuple::serialize_element;
    SerializeTupleStruct::serialize_field;
    SerializeTupleVariant::serialize_field;
}

impl ser::SerializeMap for FiniteProbe {
    type Ok = ();
    type Error = ProbeError;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> Result<(), ProbeError> {
        key.serialize(FiniteProbe)
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), ProbeError> {
        value.serialize(FiniteProbe)
    }

    fn end(self) -> Result<(), ProbeError> {
        Ok(())
    }
}

impl ser::SerializeStruct for FiniteProbe {
    type Ok = ();
    type Error = ProbeError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        _key: &'static str,
        value: &T,
    ) -> Result<(), ProbeError> {
        value.serialize(FiniteProbe)
    }

    fn end(self) -> Result<(), ProbeError> {
        Ok(())
    }
}

impl ser::SerializeStructVariant for FiniteProbe {
    type Ok = ();
    type Error = ProbeError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        _key: &'static str,
        value: &T,
    ) -> Result<(), ProbeError> {
        value.serialize(FiniteProbe)
    }

    fn end(self) -> Result<(), ProbeError> {
        Ok(())
    }
}
