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

//! Wire protocol constants: kind codes, tag flags and tag validation.
//!
//! Every encoded value starts with one tag byte:
//!
//! ```text
//! bit  7          6          5..0
//!      NULL_VALUE NULLABLE   kind code
//! ```
//!
//! The format is not self-describing beyond that byte; a reader must know the shape it
//! expects and only checks that the tag agrees with it.

use crate::buffer::Reader;
use crate::error::Error;
use num_enum::{IntoPrimitive, TryFromPrimitive};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum TypeCode {
    Unit = 0,
    Int8 = 1,
    UInt8 = 2,
    Int16 = 3,
    UInt16 = 4,
    Int32 = 5,
    UInt32 = 6,
    Int64 = 7,
    UInt64 = 8,
    Float32 = 9,
    Float64 = 10,
    Decimal = 11,
    Bool = 12,
    Char = 13,
    String = 14,
    DateTime = 15,
    DateTimeOffset = 16,
    TimeSpan = 17,
    Guid = 18,
    Uri = 19,
    Array = 20,
    Structural = 21,
    Quotation = 22,
}

impl TypeCode {
    pub fn name(self) -> &'static str {
        match self {
            TypeCode::Unit => "Unit",
            TypeCode::Int8 => "Int8",
            TypeCode::UInt8 => "UInt8",
            TypeCode::Int16 => "Int16",
            TypeCode::UInt16 => "UInt16",
            TypeCode::Int32 => "Int32",
            TypeCode::UInt32 => "UInt32",
            TypeCode::Int64 => "Int64",
            TypeCode::UInt64 => "UInt64",
            TypeCode::Float32 => "Float32",
            TypeCode::Float64 => "Float64",
            TypeCode::Decimal => "Decimal",
            TypeCode::Bool => "Bool",
            TypeCode::Char => "Char",
            TypeCode::String => "String",
            TypeCode::DateTime => "DateTime",
            TypeCode::DateTimeOffset => "DateTimeOffset",
            TypeCode::TimeSpan => "TimeSpan",
            TypeCode::Guid => "Guid",
            TypeCode::Uri => "Uri",
            TypeCode::Array => "Array",
            TypeCode::Structural => "Structural",
            TypeCode::Quotation => "Quotation",
        }
    }
}

pub mod tag_flags {
    pub const KIND_MASK: u8 = 0x3F;
    /// The static shape admits null.
    pub const NULLABLE: u8 = 1 << 6;
    /// The value is absent; no payload follows.
    pub const NULL_VALUE: u8 = 1 << 7;
}

use tag_flags::{KIND_MASK, NULLABLE, NULL_VALUE};

#[inline(always)]
pub const fn expected_tag(code: TypeCode, nullable: bool) -> u8 {
    let mut tag = code as u8;
    if nullable {
        tag |= NULLABLE;
    }
    tag
}

#[inline(always)]
pub const fn null_tag(code: TypeCode) -> u8 {
    code as u8 | NULLABLE | NULL_VALUE
}

/// Reads a tag byte and validates it against the expected kind and nullability.
///
/// Returns `true` when the tag marks an absent value, in which case no payload follows.
#[inline(always)]
pub fn read_tag(reader: &mut Reader, code: TypeCode, nullable: bool) -> Result<bool, Error> {
    let position = reader.get_cursor();
    let tag = reader.read_u8()?;
    check_tag(tag, code, nullable, position)
}

#[inline(always)]
pub fn check_tag(tag: u8, code: TypeCode, nullable: bool, position: usize) -> Result<bool, Error> {
    let expected = expected_tag(code, nullable);
    if tag & (KIND_MASK | NULLABLE) != expected {
        return Err(Error::unexpected_type_code(expected, tag, position));
    }
    let is_null = tag & NULL_VALUE != 0;
    if is_null && !nullable {
        return Err(Error::invalid_data(format!(
            "Null value flag set on non-nullable {} at position {}",
            code.name(),
            position
        )));
    }
    Ok(is_null)
}
