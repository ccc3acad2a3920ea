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

//! # Shapecodec
//!
//! Shapecodec compiles a description of a data shape into a specialised binary codec (and,
//! on request, a JSON codec) for values of that shape. Nothing about the shape is looked up
//! while encoding or decoding: the compiler resolves it once and the codec only runs the
//! fragments built for it.
//!
//! ## Key Features
//!
//! - **Compiled per shape**: primitives, nullable primitives, arrays and lists, records,
//!   entities, anonymous records, tuples, enums and quotations
//! - **Recursive shapes**: self- and mutually-recursive records compile to a finite codec
//! - **Cycle-safe**: an object graph that loops back on itself fails with a cycle error
//!   instead of recursing until the stack overflows
//! - **Forward-compatible**: every field is length-prefixed, so older readers skip fields
//!   they do not know
//! - **Two concurrency tiers**: an exclusive codec for one caller, a pooled shared codec
//!   for many threads
//!
//! ## Describing Shapes
//!
//! Closed shapes are registered in one step. Recursive shapes are declared first so their
//! key can appear in their own properties, and defined afterwards.
//!
//! ```rust
//! use shapecodec::{CodecCompiler, DataType, PrimitiveKind, Property, StructuralKind, Value};
//!
//! # fn main() -> Result<(), shapecodec::Error> {
//! let mut compiler = CodecCompiler::default();
//! let person = compiler.register(
//!     "Person",
//!     StructuralKind::Record,
//!     vec![
//!         Property::new("name", DataType::primitive(PrimitiveKind::String)),
//!         Property::new("age", DataType::nullable(PrimitiveKind::Int32)),
//!         Property::new("tags", DataType::list(DataType::primitive(PrimitiveKind::String))),
//!     ],
//! )?;
//! let codec = compiler.compile(&DataType::structural(person))?;
//!
//! let alice = Value::object([
//!     ("name", Value::from("Alice")),
//!     ("age", Value::Null),
//!     ("tags", Value::List(vec![Value::from("admin")])),
//! ]);
//! let bytes = codec.serialize(&alice)?;
//! assert_eq!(codec.deserialize(&bytes)?, alice);
//! # Ok(())
//! # }
//! ```
//!
//! ## Wire Format
//!
//! Every value starts with a tag byte: the kind code in the low six bits, a "nullable"
//! bit for shapes that admit null and a "null value" bit for absent values. Fixed-width
//! payloads are little-endian, lengths are LEB128 compact integers and strings are UTF-16.
//!
//! ```rust
//! use shapecodec::{CodecCompiler, DataType, PrimitiveKind, Value};
//!
//! let compiler = CodecCompiler::default();
//! let int32 = compiler.compile(&DataType::primitive(PrimitiveKind::Int32)).unwrap();
//! assert_eq!(int32.serialize(&Value::Int32(42)).unwrap(), [0x05, 42, 0, 0, 0]);
//!
//! let maybe = compiler.compile(&DataType::nullable(PrimitiveKind::Int32)).unwrap();
//! assert_eq!(maybe.serialize(&Value::Null).unwrap(), [0xC5]);
//! ```
//!
//! ## Concurrency
//!
//! A [`Codec`] can be cloned freely. [`Codec::exclusive`] gives a codec that reuses its
//! buffers and takes `&mut self`; [`Codec::shared`] gives a `Send + Sync` codec that checks
//! per-call state out of a pool.
//!
//! ## Error Handling
//!
//! All fallible operations return [`Error`]; [`Error::kind`] sorts an error into shape,
//! format, cycle, value or external failures. No operation retries internally.
//!
//! ```rust
//! use shapecodec::{CodecCompiler, DataType, ErrorKind, PrimitiveKind};
//!
//! let compiler = CodecCompiler::default();
//! let codec = compiler.compile(&DataType::primitive(PrimitiveKind::Int32)).unwrap();
//! let err = codec.deserialize(&[0x0E, 0]).unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::Format);
//! ```

pub use shapecodec_core::{
    buffer, codec, compiler, config, descriptor, ensure, error, json, types, value,
    walker, Codec, CodecCompiler, Config, DataType, Error, ErrorKind, ExclusiveCodec,
    ExpressionCodec, JsonCodec, ObjectRef, PrimitiveKind, Property, Reader, SharedCodec,
    StructuralKind, TypeCode, TypeKey, TypeRegistry, Value, Writer,
};
