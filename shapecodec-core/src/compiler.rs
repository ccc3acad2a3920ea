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

use crate::codec::{Codec, CompiledCodec};
use crate::config::Config;
use crate::descriptor::{DataType, Property, StructuralKind, TypeKey, TypeRegistry};
use crate::error::Error;
use crate::json::{CompiledJson, JsonCodec, JsonCompiler};
use crate::serializer::{BinaryCompiler, ExpressionCodec};
use crate::walker::Walker;
use log::{debug, trace};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Entry point: owns the type registry and configuration, and compiles descriptors into
/// cached codecs.
///
/// Compiled codecs are cached per descriptor. The cache lock is only taken to look up and
/// to publish a codec, never while a descriptor is being walked, so concurrent compiles of
/// different shapes do not serialize on each other.
///
/// # Examples
///
/// ```rust
/// use shapecodec_core::descriptor::{DataType, PrimitiveKind, Property, StructuralKind};
/// use shapecodec_core::value::Value;
/// use shapecodec_core::CodecCompiler;
///
/// let mut compiler = CodecCompiler::default().omit_null_fields(true);
/// let point = compiler
///     .register(
///         "Point",
///         StructuralKind::Record,
///         vec![
///             Property::new("x", DataType::primitive(PrimitiveKind::Int32)),
///             Property::new("y", DataType::primitive(PrimitiveKind::Int32)),
///         ],
///     )
///     .unwrap();
/// let codec = compiler.compile(&DataType::structural(point)).unwrap();
/// let value = Value::object([("x", Value::Int32(1)), ("y", Value::Int32(2))]);
/// let bytes = codec.serialize(&value).unwrap();
/// assert_eq!(codec.deserialize(&bytes).unwrap(), value);
/// ```
#[derive(Default)]
pub struct CodecCompiler {
    registry: TypeRegistry,
    config: Config,
    expression_codec: Option<Arc<dyn ExpressionCodec>>,
    binary_cache: Mutex<HashMap<DataType, Codec>>,
    json_cache: Mutex<HashMap<DataType, JsonCodec>>,
}

impl CodecCompiler {
    /// Sets the maximum nesting depth through recursive shapes.
    pub fn max_depth(mut self, max_depth: u32) -> Self {
        self.config.max_depth = max_depth;
        self.clear_caches();
        self
    }

    /// Sets whether unknown fields are skipped on decode.
    pub fn skip_unknown_fields(mut self, skip_unknown_fields: bool) -> Self {
        self.config.skip_unknown_fields = skip_unknown_fields;
        self.clear_caches();
        self
    }

    /// Sets whether null object fields are left out of the encoding.
    pub fn omit_null_fields(mut self, omit_null_fields: bool) -> Self {
        self.config.omit_null_fields = omit_null_fields;
        self.clear_caches();
        self
    }

    /// Installs the collaborator that encodes quotation payloads.
    pub fn expression_codec(mut self, codec: Arc<dyn ExpressionCodec>) -> Self {
        self.expression_codec = Some(codec);
        self.clear_caches();
        self
    }

    fn clear_caches(&mut self) {
        self.binary_cache.get_mut().clear();
        self.json_cache.get_mut().clear();
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn register(
        &mut self,
        name: &str,
        kind: StructuralKind,
        properties: Vec<Property>,
    ) -> Result<TypeKey, Error> {
        self.registry.register(name, kind, properties)
    }

    pub fn declare(&mut self, name: &str, kind: StructuralKind) -> Result<TypeKey, Error> {
        self.registry.declare(name, kind)
    }

    pub fn define(&mut self, key: TypeKey, properties: Vec<Property>) -> Result<(), Error> {
        self.registry.define(key, properties)
    }

    /// Compiles (or fetches from the cache) the binary codec for `data_type`.
    ///
    /// Fails with a shape error when the descriptor contains an unsupported primitive, an
    /// unsupported structural kind, an open generic parameter, a custom type, a
    /// declared-but-undefined shape, or a quotation with no expression codec installed.
    pub fn compile(&self, data_type: &DataType) -> Result<Codec, Error> {
        if let Some(codec) = self.binary_cache.lock().get(data_type) {
            trace!("codec cache hit for {:?}", data_type);
            return Ok(codec.clone());
        }
        let mut walker = Walker::new(
            &self.registry,
            BinaryCompiler::new(self.expression_codec.clone()),
        );
        let root = walker.walk(data_type)?;
        let table = walker.into_visitor().finish()?;
        debug!(
            "compiled binary codec for {:?} with {} recursive slot(s)",
            data_type,
            table.len()
        );
        let codec = Codec::new(CompiledCodec {
            data_type: data_type.clone(),
            config: self.config.clone(),
            root,
            table,
        });
        // A concurrent compile of the same descriptor may have won; keep the first one.
        Ok(self
            .binary_cache
            .lock()
            .entry(data_type.clone())
            .or_insert(codec)
            .clone())
    }

    /// Compiles (or fetches from the cache) the JSON codec for `data_type`.
    pub fn compile_json(&self, data_type: &DataType) -> Result<JsonCodec, Error> {
        if let Some(codec) = self.json_cache.lock().get(data_type) {
            trace!("JSON codec cache hit for {:?}", data_type);
            return Ok(codec.clone());
        }
        let mut walker = Walker::new(&self.registry, JsonCompiler::new());
        let root = walker.walk(data_type)?;
        let table = walker.into_visitor().finish()?;
        debug!(
            "compiled JSON codec for {:?} with {} recursive slot(s)",
            data_type,
            table.len()
        );
        let codec = JsonCodec::new(CompiledJson {
            data_type: data_type.clone(),
            config: self.config.clone(),
            root,
            table,
        });
        Ok(self
            .json_cache
            .lock()
            .entry(data_type.clone())
            .or_insert(codec)
            .clone())
    }
}
