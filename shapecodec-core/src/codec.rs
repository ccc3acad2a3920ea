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

//! Compiled codecs and their concurrency tiers.
//!
//! A [`Codec`] is a cheap handle to an immutable compiled codec. It can be used directly,
//! with fresh per-call state, or turned into one of two tiers that reuse that state:
//!
//! - [`ExclusiveCodec`] owns one write and one read context. Its methods take `&mut self`,
//!   so single-writer use is enforced by the borrow checker.
//! - [`SharedCodec`] is `Send + Sync` and checks a context out of a segmented pool for each
//!   call, returning it on every exit path.
//!
//! All tiers run the same fragments and produce the same bytes.

use crate::buffer::Reader;
use crate::config::Config;
use crate::descriptor::DataType;
use crate::error::Error;
use crate::resolver::context::{ReadContext, WriteContext};
use crate::resolver::pool::Pool;
use crate::serializer::BinaryFragment;
use crate::value::Value;
use std::io;
use std::sync::Arc;

pub(crate) struct CompiledCodec {
    pub(crate) data_type: DataType,
    pub(crate) config: Config,
    pub(crate) root: BinaryFragment,
    pub(crate) table: Box<[BinaryFragment]>,
}

/// Lends the caller's output vector to a write context and takes it back on drop. Unless
/// the write is kept, `out` is cut back to its original length, so the vector is restored
/// and the context reset even when a fragment panics.
struct LentOutput<'a> {
    context: &'a mut WriteContext,
    out: &'a mut Vec<u8>,
    start: usize,
    keep: bool,
}

impl<'a> LentOutput<'a> {
    fn new(context: &'a mut WriteContext, out: &'a mut Vec<u8>) -> LentOutput<'a> {
        let start = out.len();
        std::mem::swap(&mut context.writer.bf, out);
        LentOutput {
            context,
            out,
            start,
            keep: false,
        }
    }
}

impl Drop for LentOutput<'_> {
    fn drop(&mut self) {
        std::mem::swap(&mut self.context.writer.bf, self.out);
        if !self.keep {
            self.out.truncate(self.start);
        }
        self.context.reset();
    }
}

impl CompiledCodec {
    /// Appends the encoding of `value` to `out`; on error `out` is left as it was.
    fn write_into(
        &self,
        value: &Value,
        context: &mut WriteContext,
        out: &mut Vec<u8>,
    ) -> Result<(), Error> {
        let mut lent = LentOutput::new(context, out);
        let result = self.root.write(value, lent.context, &self.table);
        lent.keep = result.is_ok();
        result
    }

    fn write_to<W: io::Write>(
        &self,
        value: &Value,
        context: &mut WriteContext,
        mut sink: W,
    ) -> Result<(), Error> {
        // an unwound earlier call may have left state behind
        context.reset();
        let result = self
            .root
            .write(value, context, &self.table)
            .and_then(|()| Ok(sink.write_all(context.writer.as_slice())?));
        context.reset();
        result
    }

    fn read_from(&self, reader: &mut Reader<'_>, context: &mut ReadContext) -> Result<Value, Error> {
        context.reset();
        let result = self.root.read(reader, context, &self.table);
        context.reset();
        result
    }

    fn read_all(&self, bytes: &[u8], context: &mut ReadContext) -> Result<Value, Error> {
        let mut reader = Reader::new(bytes);
        let value = self.read_from(&mut reader, context)?;
        if reader.remaining() != 0 {
            return Err(Error::trailing_bytes(
                reader.remaining(),
                reader.get_cursor(),
            ));
        }
        Ok(value)
    }
}

/// Handle to a compiled binary codec. Clones share the compiled fragments.
#[derive(Clone)]
pub struct Codec {
    inner: Arc<CompiledCodec>,
}

impl Codec {
    pub(crate) fn new(compiled: CompiledCodec) -> Codec {
        Codec {
            inner: Arc::new(compiled),
        }
    }

    /// The shape this codec was compiled for.
    pub fn data_type(&self) -> &DataType {
        &self.inner.data_type
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Whether both handles share one compiled codec.
    pub fn ptr_eq(&self, other: &Codec) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Number of recursive shapes bound in the fragment table.
    pub fn recursive_slots(&self) -> usize {
        self.inner.table.len()
    }

    pub fn exclusive(&self) -> ExclusiveCodec {
        ExclusiveCodec {
            codec: self.inner.clone(),
            write_context: WriteContext::new(self.inner.config.clone()),
            read_context: ReadContext::new(self.inner.config.clone()),
        }
    }

    pub fn shared(&self) -> SharedCodec {
        let write_config = self.inner.config.clone();
        let read_config = self.inner.config.clone();
        SharedCodec {
            codec: self.inner.clone(),
            write_contexts: Arc::new(Pool::new(
                move || WriteContext::new(write_config.clone()),
                WriteContext::reset,
            )),
            read_contexts: Arc::new(Pool::new(
                move || ReadContext::new(read_config.clone()),
                ReadContext::reset,
            )),
        }
    }

    pub fn serialize(&self, value: &Value) -> Result<Vec<u8>, Error> {
        let mut out = Vec::new();
        self.serialize_into(value, &mut out)?;
        Ok(out)
    }

    pub fn serialize_into(&self, value: &Value, out: &mut Vec<u8>) -> Result<(), Error> {
        let mut context = WriteContext::new(self.inner.config.clone());
        self.inner.write_into(value, &mut context, out)
    }

    pub fn serialize_to<W: io::Write>(&self, value: &Value, sink: W) -> Result<(), Error> {
        let mut context = WriteContext::new(self.inner.config.clone());
        self.inner.write_to(value, &mut context, sink)
    }

    pub fn deserialize(&self, bytes: &[u8]) -> Result<Value, Error> {
        let mut context = ReadContext::new(self.inner.config.clone());
        self.inner.read_all(bytes, &mut context)
    }

    pub fn deserialize_from(&self, reader: &mut Reader<'_>) -> Result<Value, Error> {
        let mut context = ReadContext::new(self.inner.config.clone());
        self.inner.read_from(reader, &mut context)
    }
}

/// Single-caller codec that reuses one set of buffers across calls.
///
/// # Examples
///
/// ```rust
/// use shapecodec_core::descriptor::{DataType, PrimitiveKind};
/// use shapecodec_core::value::Value;
/// use shapecodec_core::CodecCompiler;
///
/// let compiler = CodecCompiler::default();
/// let mut codec = compiler
///     .compile(&DataType::primitive(PrimitiveKind::Int32))
///     .unwrap()
///     .exclusive();
/// let bytes = codec.serialize(&Value::Int32(42)).unwrap();
/// assert_eq!(bytes, [5, 42, 0, 0, 0]);
/// assert_eq!(codec.deserialize(&bytes).unwrap(), Value::Int32(42));
/// ```
pub struct ExclusiveCodec {
    codec: Arc<CompiledCodec>,
    write_context: WriteContext,
    read_context: ReadContext,
}

impl ExclusiveCodec {
    pub fn serialize(&mut self, value: &Value) -> Result<Vec<u8>, Error> {
        let mut out = Vec::new();
        self.serialize_into(value, &mut out)?;
        Ok(out)
    }

    pub fn serialize_into(&mut self, value: &Value, out: &mut Vec<u8>) -> Result<(), Error> {
        self.codec.write_into(value, &mut self.write_context, out)
    }

    /// Encodes `value` completely before anything reaches `sink`.
    pub fn serialize_to<W: io::Write>(&mut self, value: &Value, sink: W) -> Result<(), Error> {
        self.codec.write_to(value, &mut self.write_context, sink)
    }

    /// Decodes one value that must span all of `bytes`.
    pub fn deserialize(&mut self, bytes: &[u8]) -> Result<Value, Error> {
        self.codec.read_all(bytes, &mut self.read_context)
    }

    /// Decodes one value and leaves `reader` right after it.
    pub fn deserialize_from(&mut self, reader: &mut Reader<'_>) -> Result<Value, Error> {
        self.codec.read_from(reader, &mut self.read_context)
    }
}

/// Thread-safe codec backed by pools of per-call contexts.
#[derive(Clone)]
pub struct SharedCodec {
    codec: Arc<CompiledCodec>,
    write_contexts: Arc<Pool<WriteContext>>,
    read_contexts: Arc<Pool<ReadContext>>,
}

impl SharedCodec {
    pub fn serialize(&self, value: &Value) -> Result<Vec<u8>, Error> {
        let mut out = Vec::new();
        self.serialize_into(value, &mut out)?;
        Ok(out)
    }

    pub fn serialize_into(&self, value: &Value, out: &mut Vec<u8>) -> Result<(), Error> {
        self.write_contexts
            .borrow_mut(|context| self.codec.write_into(value, context, out))
    }

    /// Encodes `value` completely before anything reaches `sink`.
    pub fn serialize_to<W: io::Write>(&self, value: &Value, sink: W) -> Result<(), Error> {
        self.write_contexts
            .borrow_mut(|context| self.codec.write_to(value, context, sink))
    }

    /// Decodes one value that must span all of `bytes`.
    pub fn deserialize(&self, bytes: &[u8]) -> Result<Value, Error> {
        self.read_contexts
            .borrow_mut(|context| self.codec.read_all(bytes, context))
    }

    /// Decodes one value and leaves `reader` right after it.
    pub fn deserialize_from(&self, reader: &mut Reader<'_>) -> Result<Value, Error> {
        self.read_contexts
            .borrow_mut(|context| self.codec.read_from(reader, context))
    }
}
