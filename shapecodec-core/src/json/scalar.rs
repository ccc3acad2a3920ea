// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! JSON forms of primitive values.

use crate::buffer::Writer;
use crate::descriptor::{PrimitiveKind, PrimitiveType};
use crate::error::Error;
use crate::json::{unexpected, JsonFragment};
use crate::value::{DateTime, DateTimeOffset, Decimal, Uri, Value};
use serde_json::Value as Json;
use std::io::Write;
use uuid::Uuid;

type WriteScalar = fn(&Value, &mut Writer) -> Result<(), Error>;
type ReadScalar = fn(&Json) -> Result<Value, Error>;

#[cold]
fn mismatch(expected: &'static str, actual: &Value) -> Error {
    Error::value_mismatch(expected, actual.type_name())
}

pub(crate) fn emit_str(writer: &mut Writer, s: &str) -> Result<(), Error> {
    serde_json::to_writer(writer, s).map_err(|e| Error::encode_error(e.to_string()))
}

fn integer<T>(json: &Json, expected: &'static str) -> Result<T, Error>
where
    T: TryFrom<i64> + TryFrom<u64>,
{
    let Json::Number(n) = json else {
        return Err(unexpected(expected, json));
    };
    let fits = if let Some(v) = n.as_i64() {
        <T as TryFrom<i64>>::try_from(v).ok()
    } else if let Some(v) = n.as_u64() {
        <T as TryFrom<u64>>::try_from(v).ok()
    } else {
        None
    };
    fits.ok_or_else(|| {
        Error::invalid_data(format!("JSON number {} is not a valid {}", n, expected))
    })
}

fn string<'a>(json: &'a Json, expected: &'static str) -> Result<&'a str, Error> {
    match json {
        Json::String(s) => Ok(s),
        other => Err(unexpected(expected, other)),
    }
}

macro_rules! json_integer {
    ($($name:ident: $variant:ident, $ty:ty);* $(;)?) => {
        paste::paste! {
            $(
                fn [<write_ $name>](value: &Value, writer: &mut Writer) -> Result<(), Error> {
                    match value {
                        Value::$variant(v) => Ok(write!(writer, "{}", v)?),
                        other => Err(mismatch(stringify!($variant), other)),
                    }
                }

                fn [<read_ $name>](json: &Json) -> Result<Value, Error> {
                    Ok(Value::$variant(integer::<$ty>(json, stringify!($variant))?))
                }
            )*
        }
    };
}

macro_rules! json_enum {
    ($($name:ident: $variant:ident, $ty:ty);* $(;)?) => {
        paste::paste! {
            $(
                fn [<write_enum_ $name>](value: &Value, writer: &mut Writer) -> Result<(), Error> {
                    match value {
                        Value::Enum(n) => {
                            let v = <$ty>::try_from(*n).map_err(|_| {
                                Error::encode_error(format!(
                                    "Enum value {} does not fit its underlying type {}",
                                    n,
                                    stringify!($variant)
                                ))
                            })?;
                            Ok(write!(writer, "{}", v)?)
                        }
                        other => Err(mismatch("Enum", other)),
                    }
                }

                fn [<read_enum_ $name>](json: &Json) -> Result<Value, Error> {
                    Ok(Value::Enum(integer::<$ty>(json, stringify!($variant))? as i128))
                }
            )*
        }
    };
}

json_integer!(
    int8: Int8, i8;
    uint8: UInt8, u8;
    int16: Int16, i16;
    uint16: UInt16, u16;
    int32: Int32, i32;
    uint32: UInt32, u32;
    int64: Int64, i64;
    uint64: UInt64, u64;
    time_span: TimeSpan, i64;
);

json_enum!(
    int8: Int8, i8;
    uint8: UInt8, u8;
    int16: Int16, i16;
    uint16: UInt16, u16;
    int32: Int32, i32;
    uint32: UInt32, u32;
    int64: Int64, i64;
    uint64: UInt64, u64;
);

fn write_unit(value: &Value, writer: &mut Writer) -> Result<(), Error> {
    match value {
        Value::Unit => {
            writer.write_bytes(b"null");
            Ok(())
        }
        other => Err(mismatch("Unit", other)),
    }
}

fn read_unit(json: &Json) -> Result<Value, Error> {
    match json {
        Json::Null => Ok(Value::Unit),
        other => Err(unexpected("Unit", other)),
    }
}

fn write_bool(value: &Value, writer: &mut Writer) -> Result<(), Error> {
    match value {
        Value::Bool(true) => {
            writer.write_bytes(b"true");
            Ok(())
        }
        Value::Bool(false) => {
            writer.write_bytes(b"false");
            Ok(())
        }
        other => Err(mismatch("Bool", other)),
    }
}

fn read_bool(json: &Json) -> Result<Value, Error> {
    match json {
        Json::Bool(b) => Ok(Value::Bool(*b)),
        other => Err(unexpected("Bool", other)),
    }
}

fn write_finite(writer: &mut Writer, v: f64, shown: &dyn std::fmt::Display) -> Result<(), Error> {
    if !v.is_finite() {
        return Err(Error::encode_error(format!(
            "Non-finite number {} has no JSON form",
            shown
        )));
    }
    Ok(write!(writer, "{}", shown)?)
}

fn write_float32(value: &Value, writer: &mut Writer) -> Result<(), Error> {
    match value {
        Value::Float32(v) => write_finite(writer, *v as f64, v),
        other => Err(mismatch("Float32", other)),
    }
}

fn write_float64(value: &Value, writer: &mut Writer) -> Result<(), Error> {
    match value {
        Value::Float64(v) => write_finite(writer, *v, v),
        other => Err(mismatch("Float64", other)),
    }
}

fn float(json: &Json, expected: &'static str) -> Result<f64, Error> {
    match json {
        Json::Number(n) => n.as_f64().ok_or_else(|| unexpected(expected, json)),
        other => Err(unexpected(expected, other)),
    }
}

fn read_float32(json: &Json) -> Result<Value, Error> {
    Ok(Value::Float32(float(json, "Float32")? as f32))
}

fn read_float64(json: &Json) -> Result<Value, Error> {
    Ok(Value::Float64(float(json, "Float64")?))
}

fn write_decimal(value: &Value, writer: &mut Writer) -> Result<(), Error> {
    match value {
        Value::Decimal(d) => emit_str(writer, &d.to_string()),
        other => Err(mismatch("Decimal", other)),
    }
}

fn read_decimal(json: &Json) -> Result<Value, Error> {
    Ok(Value::Decimal(string(json, "Decimal")?.parse::<Decimal>()?))
}

fn write_char(value: &Value, writer: &mut Writer) -> Result<(), Error> {
    match value {
        Value::Char(c) => emit_str(writer, c.encode_utf8(&mut [0u8; 4])),
        other => Err(mismatch("Char", other)),
    }
}

fn read_char(json: &Json) -> Result<Value, Error> {
    let s = string(json, "Char")?;
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(Value::Char(c)),
        _ => Err(Error::invalid_data(format!(
            "Expected a single character, found {:?}",
            s
        ))),
    }
}

fn write_string(value: &Value, writer: &mut Writer) -> Result<(), Error> {
    match value {
        Value::String(s) => emit_str(writer, s),
        other => Err(mismatch("String", other)),
    }
}

fn read_string(json: &Json) -> Result<Value, Error> {
    Ok(Value::String(string(json, "String")?.to_owned()))
}

fn write_date_time(value: &Value, writer: &mut Writer) -> Result<(), Error> {
    match value {
        Value::DateTime(dt) => emit_str(writer, &dt.to_iso8601()?),
        other => Err(mismatch("DateTime", other)),
    }
}

fn read_date_time(json: &Json) -> Result<Value, Error> {
    Ok(Value::DateTime(DateTime::parse_iso8601(string(
        json, "DateTime",
    )?)?))
}

fn write_date_time_offset(value: &Value, writer: &mut Writer) -> Result<(), Error> {
    match value {
        Value::DateTimeOffset(dto) => emit_str(writer, &dto.to_iso8601()?),
        other => Err(mismatch("DateTimeOffset", other)),
    }
}

fn read_date_time_offset(json: &Json) -> Result<Value, Error> {
    Ok(Value::DateTimeOffset(DateTimeOffset::parse_iso8601(
        string(json, "DateTimeOffset")?,
    )?))
}

fn write_guid(value: &Value, writer: &mut Writer) -> Result<(), Error> {
    match value {
        Value::Guid(g) => emit_str(writer, &g.hyphenated().to_string()),
        other => Err(mismatch("Guid", other)),
    }
}

fn read_guid(json: &Json) -> Result<Value, Error> {
    let s = string(json, "Guid")?;
    Uuid::parse_str(s)
        .map(Value::Guid)
        .map_err(|e| Error::invalid_data(format!("Invalid Guid {:?}: {}", s, e)))
}

fn write_uri(value: &Value, writer: &mut Writer) -> Result<(), Error> {
    match value {
        Value::Uri(uri) => emit_str(writer, uri.as_str()),
        other => Err(mismatch("Uri", other)),
    }
}

fn read_uri(json: &Json) -> Result<Value, Error> {
    Ok(Value::Uri(Uri::new(string(json, "Uri")?)))
}

fn lookup(kind: &PrimitiveKind) -> Option<(WriteScalar, ReadScalar)> {
    macro_rules! entry {
        ($name:ident) => {
            paste::paste! { ([<write_ $name>] as WriteScalar, [<read_ $name>] as ReadScalar) }
        };
        (enum $name:ident) => {
            paste::paste! { ([<write_enum_ $name>] as WriteScalar, [<read_enum_ $name>] as ReadScalar) }
        };
    }
    let codec = match kind {
        PrimitiveKind::Unit => entry!(unit),
        PrimitiveKind::Int8 => entry!(int8),
        PrimitiveKind::UInt8 => entry!(uint8),
        PrimitiveKind::Int16 => entry!(int16),
        PrimitiveKind::UInt16 => entry!(uint16),
        PrimitiveKind::Int32 => entry!(int32),
        PrimitiveKind::UInt32 => entry!(uint32),
        PrimitiveKind::Int64 => entry!(int64),
        PrimitiveKind::UInt64 => entry!(uint64),
        PrimitiveKind::Float32 => entry!(float32),
        PrimitiveKind::Float64 => entry!(float64),
        PrimitiveKind::Decimal => entry!(decimal),
        PrimitiveKind::Bool => entry!(bool),
        PrimitiveKind::Char => entry!(char),
        PrimitiveKind::String => entry!(string),
        PrimitiveKind::DateTime => entry!(date_time),
        PrimitiveKind::DateTimeOffset => entry!(date_time_offset),
        PrimitiveKind::TimeSpan => entry!(time_span),
        PrimitiveKind::Guid => entry!(guid),
        PrimitiveKind::Uri => entry!(uri),
        PrimitiveKind::Enum(underlying) => match underlying {
            PrimitiveKind::Int8 => entry!(enum int8),
            PrimitiveKind::UInt8 => entry!(enum uint8),
            PrimitiveKind::Int16 => entry!(enum int16),
            PrimitiveKind::UInt16 => entry!(enum uint16),
            PrimitiveKind::Int32 => entry!(enum int32),
            PrimitiveKind::UInt32 => entry!(enum uint32),
            PrimitiveKind::Int64 => entry!(enum int64),
            PrimitiveKind::UInt64 => entry!(enum uint64),
            _ => return None,
        },
    };
    Some(codec)
}

pub(crate) fn compile(ty: &PrimitiveType) -> Result<JsonFragment, Error> {
    let (write, read) = lookup(&ty.kind)
        .ok_or_else(|| Error::unsupported(format!("Unsupported primitive type {}", ty.kind)))?;
    let kind = ty.kind;
    let nullable = ty.nullable;
    Ok(JsonFragment::new(
        move |value, context, _| {
            if value.is_null() {
                if !nullable {
                    return Err(Error::encode_error(format!(
                        "Null value for non-nullable {}",
                        kind
                    )));
                }
                context.writer.write_bytes(b"null");
                return Ok(());
            }
            write(value, &mut context.writer)
        },
        move |json, _, _| {
            if nullable && json.is_null() {
                return Ok(Value::Null);
            }
            read(json)
        },
    ))
}
