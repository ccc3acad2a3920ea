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

//! # Shapecodec Core
//!
//! A type-directed binary codec compiler. Given a descriptor of a data shape, it produces
//! a serializer/deserializer pair specialised for exactly that shape, including shapes
//! that refer to themselves directly or through other shapes.
//!
//! ## Architecture
//!
//! - **`types`**: wire protocol constants and tag validation
//! - **`buffer`**: bounds-checked little-endian `Writer`/`Reader` and compact lengths
//! - **`value`**: the dynamically typed `Value` model the codecs operate on
//! - **`descriptor`**: data type descriptors and the structural `TypeRegistry`
//! - **`walker`**: recursion-safe depth-first walk that drives a `DataTypeVisitor`
//! - **`serializer`**: the binary visitor and the per-kind fragment builders
//! - **`json`**: the JSON text visitor over the same walker
//! - **`compiler`**: `CodecCompiler`, the registry + config + compiled-codec cache
//! - **`codec`**: compiled codecs and their exclusive and shared tiers
//! - **`resolver`**: per-call contexts, the object-graph cycle guard and context pools
//! - **`error`**: the crate error type and the `ensure!` macro
//!
//! ## Recursion
//!
//! Type-level recursion is resolved while compiling: a structural shape reached again
//! while it is being built becomes a forward reference to a slot in the codec's fragment
//! table, and the finished shape is bound to that slot as a fixed point. Object-level
//! cycles are caught while encoding: fixed-point fragments track the identity of every
//! object they are inside of and fail with [`Error::CycleDetected`] instead of recursing
//! forever. Shapes that are not recursive pay for neither.
//!
//! ## Usage
//!
//! ```rust
//! use shapecodec_core::descriptor::{DataType, PrimitiveKind, Property, StructuralKind};
//! use shapecodec_core::value::Value;
//! use shapecodec_core::CodecCompiler;
//!
//! let mut compiler = CodecCompiler::default();
//! let node = compiler.declare("Node", StructuralKind::Record).unwrap();
//! compiler
//!     .define(
//!         node,
//!         vec![
//!             Property::new("value", DataType::primitive(PrimitiveKind::Int32)),
//!             Property::new("next", DataType::structural(node)),
//!         ],
//!     )
//!     .unwrap();
//! let codec = compiler.compile(&DataType::structural(node)).unwrap();
//! assert_eq!(codec.recursive_slots(), 1);
//!
//! let tail = Value::object([("value", Value::Int32(2)), ("next", Value::Null)]);
//! let head = Value::object([("value", Value::Int32(1)), ("next", tail)]);
//! let bytes = codec.serialize(&head).unwrap();
//! assert_eq!(codec.deserialize(&bytes).unwrap(), head);
//! ```

pub mod buffer;
pub mod codec;
pub mod compiler;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod json;
pub mod resolver;
pub mod serializer;
pub mod types;
pub mod value;
pub mod walker;

pub use buffer::{Reader, Writer};
pub use codec::{Codec, ExclusiveCodec, SharedCodec};
pub use compiler::CodecCompiler;
pub use config::Config;
pub use descriptor::{DataType, PrimitiveKind, Property, StructuralKind, TypeKey, TypeRegistry};
pub use error::{Error, ErrorKind};
pub use json::JsonCodec;
pub use serializer::ExpressionCodec;
pub use types::TypeCode;
pub use value::{ObjectRef, Value};
