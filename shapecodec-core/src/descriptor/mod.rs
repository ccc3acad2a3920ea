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

//! Data-shape descriptors consumed by the codec compiler.
//!
//! A [`DataType`] is an immutable tree. Structural shapes are referenced by [`TypeKey`] and
//! resolved through a [`TypeRegistry`], which is what lets a shape refer to itself.

mod registry;

pub use registry::TypeRegistry;

use std::borrow::Cow;
use std::fmt;

/// Stable identity of a structural shape. Two occurrences with the same key are the same
/// shape, never two coincidentally equal ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeKey(pub(crate) u32);

impl TypeKey {
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Unit,
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float32,
    Float64,
    Decimal,
    Bool,
    Char,
    String,
    DateTime,
    DateTimeOffset,
    TimeSpan,
    Guid,
    Uri,
    /// An enum backed by an integer kind, e.g. `Enum(&PrimitiveKind::Int32)`.
    Enum(&'static PrimitiveKind),
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimitiveKind::Enum(underlying) => write!(f, "Enum<{}>", underlying),
            other => fmt::Debug::fmt(other, f),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PrimitiveType {
    pub kind: PrimitiveKind,
    pub nullable: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ArrayType {
    pub element: DataType,
    /// Decode as a growable list rather than a fixed array.
    pub is_list: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum DataType {
    Primitive(PrimitiveType),
    Array(Box<ArrayType>),
    Structural(TypeKey),
    /// An embedded expression tree whose payload type is handed to the expression codec.
    Quotation(Box<DataType>),
    OpenGenericParameter(Cow<'static, str>),
    Custom(Cow<'static, str>),
}

impl DataType {
    pub fn primitive(kind: PrimitiveKind) -> DataType {
        DataType::Primitive(PrimitiveType {
            kind,
            nullable: false,
        })
    }

    pub fn nullable(kind: PrimitiveKind) -> DataType {
        DataType::Primitive(PrimitiveType {
            kind,
            nullable: true,
        })
    }

    pub fn array(element: DataType) -> DataType {
        DataType::Array(Box::new(ArrayType {
            element,
            is_list: false,
        }))
    }

    pub fn list(element: DataType) -> DataType {
        DataType::Array(Box::new(ArrayType {
            element,
            is_list: true,
        }))
    }

    pub fn structural(key: TypeKey) -> DataType {
        DataType::Structural(key)
    }

    pub fn quotation(payload: DataType) -> DataType {
        DataType::Quotation(Box::new(payload))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum StructuralKind {
    Tuple,
    Anonymous,
    Entity,
    Record,
    /// A kind the compiler has no layout for.
    Other(Cow<'static, str>),
}

impl StructuralKind {
    pub fn is_supported(&self) -> bool {
        !matches!(self, StructuralKind::Other(_))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Property {
    pub name: String,
    pub data_type: DataType,
}

impl Property {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Property {
        Property {
            name: name.into(),
            data_type,
        }
    }
}

#[derive(Clone, Debug)]
pub struct StructuralType {
    pub key: TypeKey,
    pub name: String,
    pub kind: StructuralKind,
    /// Ordered; the order is the field emission order on the wire.
    pub properties: Vec<Property>,
}
