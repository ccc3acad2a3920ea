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

//! Primitive codec table.
//!
//! Each table entry only knows its kind code and how to move its payload. Tags,
//! nullability and null values are handled once, by [`compile`].

use crate::buffer::{Reader, Writer};
use crate::descriptor::{PrimitiveKind, PrimitiveType};
use crate::error::Error;
use crate::serializer::BinaryFragment;
use crate::types::{expected_tag, null_tag, read_tag, TypeCode};
use crate::value::{DateTime, DateTimeOffset, Decimal, Uri, Value};
use uuid::Uuid;

type WritePayload = fn(&Value, &mut Writer) -> Result<(), Error>;
type ReadPayload = fn(&mut Reader<'_>) -> Result<Value, Error>;

#[derive(Clone, Copy)]
pub(crate) struct PrimitiveCodec {
    pub code: TypeCode,
    pub write: WritePayload,
    pub read: ReadPayload,
}

#[cold]
fn mismatch(expected: &'static str, actual: &Value) -> Error {
    Error::value_mismatch(expected, actual.type_name())
}

macro_rules! fixed_payload {
    ($($name:ident: $variant:ident, $write:ident, $read:ident);* $(;)?) => {
        paste::paste! {
            $(
                #[inline(always)]
                fn [<write_ $name>](value: &Value, writer: &mut Writer) -> Result<(), Error> {
                    match value {
                        Value::$variant(v) => {
                            writer.$write(*v);
                            Ok(())
                        }
                        other => Err(mismatch(stringify!($variant), other)),
                    }
                }

                #[inline(always)]
                fn [<read_ $name>](reader: &mut Reader<'_>) -> Result<Value, Error> {
                    Ok(Value::$variant(reader.$read()?))
                }
            )*
        }
    };
}

macro_rules! integer_payload {
    ($($name:ident: $variant:ident, $ty:ty, $write:ident, $read:ident);* $(;)?) => {
        fixed_payload!($($name: $variant, $write, $read);*);

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
                            writer.$write(v);
                            Ok(())
                        }
                        other => Err(mismatch("Enum", other)),
                    }
                }

                fn [<read_enum_ $name>](reader: &mut Reader<'_>) -> Result<Value, Error> {
                    Ok(Value::Enum(reader.$read()? as i128))
                }
            )*
        }
    };
}

integer_payload!(
    int8: Int8, i8, write_i8, read_i8;
    uint8: UInt8, u8, write_u8, read_u8;
    int16: Int16, i16, write_i16, read_i16;
    uint16: UInt16, u16, write_u16, read_u16;
    int32: Int32, i32, write_i32, read_i32;
    uint32: UInt32, u32, write_u32, read_u32;
    int64: Int64, i64, write_i64, read_i64;
    uint64: UInt64, u64, write_u64, read_u64;
);

fixed_payload!(
    bool: Bool, write_bool, read_bool;
    float32: Float32, write_f32, read_f32;
    float64: Float64, write_f64, read_f64;
    time_span: TimeSpan, write_i64, read_i64;
);

fn write_unit(value: &Value, _: &mut Writer) -> Result<(), Error> {
    match value {
        Value::Unit => Ok(()),
        other => Err(mismatch("Unit", other)),
    }
}

fn read_unit(_: &mut Reader<'_>) -> Result<Value, Error> {
    Ok(Value::Unit)
}

fn write_decimal(value: &Value, writer: &mut Writer) -> Result<(), Error> {
    match value {
        Value::Decimal(d) => {
            for word in d.to_parts() {
                writer.write_u32(word);
            }
            Ok(())
        }
        other => Err(mismatch("Decimal", other)),
    }
}

fn read_decimal(reader: &mut Reader<'_>) -> Result<Value, Error> {
    let lo = reader.read_u32()?;
    let mid = reader.read_u32()?;
    let hi = reader.read_u32()?;
    let flags = reader.read_u32()?;
    Ok(Value::Decimal(Decimal::from_parts(lo, mid, hi, flags)?))
}

fn write_char(value: &Value, writer: &mut Writer) -> Result<(), Error> {
    match value {
        Value::Char(c) => {
            writer.write_u32(*c as u32);
            Ok(())
        }
        other => Err(mismatch("Char", other)),
    }
}

fn read_char(reader: &mut Reader<'_>) -> Result<Value, Error> {
    let position = reader.get_cursor();
    let scalar = reader.read_u32()?;
    char::from_u32(scalar).map(Value::Char).ok_or_else(|| {
        Error::invalid_data(format!(
            "Invalid char scalar 0x{:X} at position {}",
            scalar, position
        ))
    })
}

fn write_string(value: &Value, writer: &mut Writer) -> Result<(), Error> {
    match value {
        Value::String(s) => writer.write_utf16_string(s),
        other => Err(mismatch("String", other)),
    }
}

fn read_string(reader: &mut Reader<'_>) -> Result<Value, Error> {
    Ok(Value::String(reader.read_utf16_string()?))
}

fn write_date_time(value: &Value, writer: &mut Writer) -> Result<(), Error> {
    match value {
        Value::DateTime(dt) => {
            writer.write_i64(dt.to_binary());
            Ok(())
        }
        other => Err(mismatch("DateTime", other)),
    }
}

fn read_date_time(reader: &mut Reader<'_>) -> Result<Value, Error> {
    Ok(Value::DateTime(DateTime::from_binary(reader.read_i64()?)?))
}

fn write_date_time_offset(value: &Value, writer: &mut Writer) -> Result<(), Error> {
    match value {
        Value::DateTimeOffset(dto) => {
            writer.write_i64(dto.clock().to_binary());
            writer.write_i16(dto.offset_minutes());
            Ok(())
        }
        other => Err(mismatch("DateTimeOffset", other)),
    }
}

fn read_date_time_offset(reader: &mut Reader<'_>) -> Result<Value, Error> {
    let clock = DateTime::from_binary(reader.read_i64()?)?;
    let offset = reader.read_i16()?;
    Ok(Value::DateTimeOffset(DateTimeOffset::new(
        clock.ticks(),
        offset,
    )?))
}

fn write_guid(value: &Value, writer: &mut Writer) -> Result<(), Error> {
    match value {
        Value::Guid(g) => {
            writer.write_bytes(&g.to_bytes_le());
            Ok(())
        }
        other => Err(mismatch("Guid", other)),
    }
}

fn read_guid(reader: &mut Reader<'_>) -> Result<Value, Error> {
    let bytes = reader.read_bytes(16)?;
    let mut raw = [0u8; 16];
    raw.copy_from_slice(bytes);
    Ok(Value::Guid(Uuid::from_bytes_le(raw)))
}

fn write_uri(value: &Value, writer: &mut Writer) -> Result<(), Error> {
    match value {
        Value::Uri(uri) => {
            writer.write_utf16_string(uri.as_str())?;
            writer.write_bool(uri.is_absolute());
            Ok(())
        }
        other => Err(mismatch("Uri", other)),
    }
}

fn read_uri(reader: &mut Reader<'_>) -> Result<Value, Error> {
    let text = reader.read_utf16_string()?;
    let absolute = reader.read_bool()?;
    Ok(Value::Uri(Uri::from_parts(text, absolute)))
}

macro_rules! entry {
    ($code:ident, $name:ident) => {
        paste::paste! {
            PrimitiveCodec {
                code: TypeCode::$code,
                write: [<write_ $name>],
                read: [<read_ $name>],
            }
        }
    };
    (enum $code:ident, $name:ident) => {
        paste::paste! {
            PrimitiveCodec {
                code: TypeCode::$code,
                write: [<write_enum_ $name>],
                read: [<read_enum_ $name>],
            }
        }
    };
}

/// Table lookup. `None` means the kind has no encoding.
pub(crate) fn lookup(kind: &PrimitiveKind) -> Option<PrimitiveCodec> {
    let codec = match kind {
        PrimitiveKind::Unit => entry!(Unit, unit),
        PrimitiveKind::Int8 => entry!(Int8, int8),
        PrimitiveKind::UInt8 => entry!(UInt8, uint8),
        PrimitiveKind::Int16 => entry!(Int16, int16),
        PrimitiveKind::UInt16 => entry!(UInt16, uint16),
        PrimitiveKind::Int32 => entry!(Int32, int32),
        PrimitiveKind::UInt32 => entry!(UInt32, uint32),
        PrimitiveKind::Int64 => entry!(Int64, int64),
        PrimitiveKind::UInt64 => entry!(UInt64, uint64),
        PrimitiveKind::Float32 => entry!(Float32, float32),
        PrimitiveKind::Float64 => entry!(Float64, float64),
        PrimitiveKind::Decimal => entry!(Decimal, decimal),
        PrimitiveKind::Bool => entry!(Bool, bool),
        PrimitiveKind::Char => entry!(Char, char),
        PrimitiveKind::String => entry!(String, string),
        PrimitiveKind::DateTime => entry!(DateTime, date_time),
        PrimitiveKind::DateTimeOffset => entry!(DateTimeOffset, date_time_offset),
        PrimitiveKind::TimeSpan => entry!(TimeSpan, time_span),
        PrimitiveKind::Guid => entry!(Guid, guid),
        PrimitiveKind::Uri => entry!(Uri, uri),
        PrimitiveKind::Enum(underlying) => match underlying {
            PrimitiveKind::Int8 => entry!(enum Int8, int8),
            PrimitiveKind::UInt8 => entry!(enum UInt8, uint8),
            PrimitiveKind::Int16 => entry!(enum Int16, int16),
            PrimitiveKind::UInt16 => entry!(enum UInt16, uint16),
            PrimitiveKind::Int32 => entry!(enum Int32, int32),
            PrimitiveKind::UInt32 => entry!(enum UInt32, uint32),
            PrimitiveKind::Int64 => entry!(enum Int64, int64),
            PrimitiveKind::UInt64 => entry!(enum UInt64, uint64),
            _ => return None,
        },
    };
    Some(codec)
}

/// Compiles a primitive shape: the table entry wrapped with tag handling.
pub(crate) fn compile(ty: &PrimitiveType) -> Result<BinaryFragment, Error> {
    let codec = lookup(&ty.kind)
        .ok_or_else(|| Error::unsupported(format!("Unsupported primitive type {}", ty.kind)))?;
    let kind = ty.kind;
    let nullable = ty.nullable;
    let code = codec.code;
    let tag = expected_tag(code, nullable);
    let null = null_tag(code);
    Ok(BinaryFragment::new(
        move |value, context, _| {
            if value.is_null() {
                if !nullable {
                    return Err(Error::encode_error(format!(
                        "Null value for non-nullable {}",
                        kind
                    )));
                }
                context.writer.write_u8(null);
                return Ok(());
            }
            context.writer.write_u8(tag);
            (codec.write)(value, &mut context.writer)
        },
        move |reader, _, _| {
            if read_tag(reader, code, nullable)? {
                return Ok(Value::Null);
            }
            (codec.read)(reader).map_err(|e| Error::enhance_invalid_data(e, code))
        },
    ))
}
