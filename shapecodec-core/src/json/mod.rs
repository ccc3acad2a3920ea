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

//! JSON text codec built over the same walker as the binary codec.
//!
//! Structural values are JSON objects keyed by property name, emitted in property order.
//! Member names are dispatched through a per-shape name table; unknown members are
//! skipped unless `skip_unknown_fields` is off. Recursive shapes get the same fixed points,
//! depth limit and object-graph cycle guard as their binary counterparts.

mod scalar;

use crate::config::Config;
use crate::descriptor::{ArrayType, DataType, PrimitiveType, Property, StructuralKind, StructuralType};
use crate::ensure;
use crate::error::Error;
use crate::resolver::context::{ReadContext, WriteContext};
use crate::value::{ObjectRef, Value};
use crate::walker::{DataTypeVisitor, Slot};
use log::{debug, trace};
use serde::Deserialize;
use serde_json::Value as Json;
use std::collections::HashMap;
use std::sync::Arc;

type WriteFn =
    dyn Fn(&Value, &mut WriteContext, &[JsonFragment]) -> Result<(), Error> + Send + Sync;
type ReadFn = dyn Fn(&Json, &mut ReadContext, &[JsonFragment]) -> Result<Value, Error> + Send + Sync;

#[derive(Clone)]
pub struct JsonFragment {
    write: Arc<WriteFn>,
    read: Arc<ReadFn>,
}

impl JsonFragment {
    pub fn new<W, R>(write: W, read: R) -> JsonFragment
    where
        W: Fn(&Value, &mut WriteContext, &[JsonFragment]) -> Result<(), Error>
            + Send
            + Sync
            + 'static,
        R: Fn(&Json, &mut ReadContext, &[JsonFragment]) -> Result<Value, Error>
            + Send
            + Sync
            + 'static,
    {
        JsonFragment {
            write: Arc::new(write),
            read: Arc::new(read),
        }
    }

    #[inline(always)]
    fn write(
        &self,
        value: &Value,
        context: &mut WriteContext,
        table: &[JsonFragment],
    ) -> Result<(), Error> {
        (self.write)(value, context, table)
    }

    #[inline(always)]
    fn read(
        &self,
        json: &Json,
        context: &mut ReadContext,
        table: &[JsonFragment],
    ) -> Result<Value, Error> {
        (self.read)(json, context, table)
    }
}

fn json_kind(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "a boolean",
        Json::Number(_) => "a number",
        Json::String(_) => "a string",
        Json::Array(_) => "an array",
        Json::Object(_) => "an object",
    }
}

#[cold]
pub(crate) fn unexpected(expected: &str, found: &Json) -> Error {
    Error::invalid_data(format!(
        "Expected {} in JSON, found {}",
        expected,
        json_kind(found)
    ))
}

#[cold]
fn unbound_slot(slot: usize) -> Error {
    Error::type_error(format!("Recursion slot {} is not bound", slot))
}

pub(crate) struct JsonField {
    name: String,
    /// Quoted and escaped member name.
    encoded_name: Box<[u8]>,
    fragment: JsonFragment,
}

pub(crate) struct JsonCompiler {
    slots: Vec<Option<JsonFragment>>,
}

impl JsonCompiler {
    pub(crate) fn new() -> JsonCompiler {
        JsonCompiler { slots: Vec::new() }
    }

    pub(crate) fn finish(self) -> Result<Box<[JsonFragment]>, Error> {
        self.slots
            .into_iter()
            .enumerate()
            .map(|(i, slot)| slot.ok_or_else(|| unbound_slot(i)))
            .collect()
    }
}

impl DataTypeVisitor for JsonCompiler {
    type Fragment = JsonFragment;
    type Field = JsonField;

    fn visit_primitive(&mut self, ty: &PrimitiveType) -> Result<JsonFragment, Error> {
        scalar::compile(ty)
    }

    fn visit_array(&mut self, ty: &ArrayType, element: JsonFragment) -> Result<JsonFragment, Error> {
        let is_list = ty.is_list;
        let write_element = element.clone();
        Ok(JsonFragment::new(
            move |value, context, table| match value {
                Value::Null => {
                    context.writer.write_bytes(b"null");
                    Ok(())
                }
                Value::Array(items) | Value::List(items) => {
                    context.writer.write_u8(b'[');
                    for (i, item) in items.iter().enumerate() {
                        if i > 0 {
                            context.writer.write_u8(b',');
                        }
                        write_element.write(item, context, table)?;
                    }
                    context.writer.write_u8(b']');
                    Ok(())
                }
                other => Err(Error::value_mismatch(
                    if is_list { "List" } else { "Array" },
                    other.type_name(),
                )),
            },
            move |json, context, table| match json {
                Json::Null => Ok(Value::Null),
                Json::Array(items) => {
                    let items = items
                        .iter()
                        .map(|item| element.read(item, context, table))
                        .collect::<Result<Vec<_>, _>>()?;
                    Ok(if is_list {
                        Value::List(items)
                    } else {
                        Value::Array(items)
                    })
                }
                other => Err(unexpected("an array", other)),
            },
        ))
    }

    fn visit_property(
        &mut self,
        _owner: &StructuralType,
        property: &Property,
        fragment: JsonFragment,
    ) -> Result<JsonField, Error> {
        let encoded_name = serde_json::to_vec(&property.name)
            .map_err(|e| Error::type_error(format!("Invalid property name: {}", e)))?;
        Ok(JsonField {
            name: property.name.clone(),
            encoded_name: encoded_name.into_boxed_slice(),
            fragment,
        })
    }

    fn visit_structural(
        &mut self,
        ty: &StructuralType,
        fields: Vec<JsonField>,
    ) -> Result<JsonFragment, Error> {
        let index = fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.name.clone(), i))
            .collect();
        let layout = Arc::new(JsonLayout {
            type_name: ty.name.clone(),
            is_tuple: ty.kind == StructuralKind::Tuple,
            fields,
            index,
        });
        let read_layout = layout.clone();
        Ok(JsonFragment::new(
            move |value, context, table| layout.write(value, context, table),
            move |json, context, table| read_layout.read(json, context, table),
        ))
    }

    fn visit_quotation(&mut self, payload: &DataType) -> Result<JsonFragment, Error> {
        Err(Error::unsupported(format!(
            "Quotation of {:?} has no JSON form",
            payload
        )))
    }

    fn forward_ref(&mut self, _ty: &StructuralType, slot: Slot) -> Result<JsonFragment, Error> {
        let Slot(index) = slot;
        Ok(JsonFragment::new(
            move |value, context, table| match table.get(index) {
                Some(fragment) => fragment.write(value, context, table),
                None => Err(unbound_slot(index)),
            },
            move |json, context, table| match table.get(index) {
                Some(fragment) => fragment.read(json, context, table),
                None => Err(unbound_slot(index)),
            },
        ))
    }

    fn fixed_point(
        &mut self,
        ty: &StructuralType,
        slot: Slot,
        body: JsonFragment,
    ) -> Result<JsonFragment, Error> {
        let type_name = ty.name.clone();
        let read_body = body.clone();
        let fragment = JsonFragment::new(
            move |value, context, table| {
                if value.is_null() {
                    return body.write(value, context, table);
                }
                let identity = context.enter_recursive(value, &type_name)?;
                let result = body.write(value, context, table);
                context.exit_recursive(identity);
                result
            },
            move |json, context, table| {
                if json.is_null() {
                    return read_body.read(json, context, table);
                }
                context.inc_depth()?;
                let result = read_body.read(json, context, table);
                context.dec_depth();
                result
            },
        );
        let Slot(index) = slot;
        if self.slots.len() <= index {
            self.slots.resize(index + 1, None);
        }
        self.slots[index] = Some(fragment.clone());
        debug!("bound recursive type '{}' to JSON slot {}", ty.name, index);
        Ok(fragment)
    }
}

struct JsonLayout {
    type_name: String,
    is_tuple: bool,
    fields: Vec<JsonField>,
    index: HashMap<String, usize>,
}

impl JsonLayout {
    fn write(
        &self,
        value: &Value,
        context: &mut WriteContext,
        table: &[JsonFragment],
    ) -> Result<(), Error> {
        match value {
            Value::Null => {
                context.writer.write_bytes(b"null");
                Ok(())
            }
            Value::Tuple(items) if self.is_tuple => {
                if items.len() != self.fields.len() {
                    return Err(Error::encode_error(format!(
                        "Tuple '{}' has {} items, expected {}",
                        self.type_name,
                        items.len(),
                        self.fields.len()
                    )));
                }
                self.write_members(context, table, |i| Some(&items[i]))
            }
            Value::Object(object) if !self.is_tuple => {
                let object = object.read();
                self.write_members(context, table, |i| object.fields.get(&self.fields[i].name))
            }
            other => Err(Error::value_mismatch(
                if self.is_tuple { "Tuple" } else { "Object" },
                other.type_name(),
            )),
        }
    }

    fn write_members<'v>(
        &self,
        context: &mut WriteContext,
        table: &[JsonFragment],
        field_value: impl Fn(usize) -> Option<&'v Value>,
    ) -> Result<(), Error> {
        let omit_null = context.config().omit_null_fields;
        context.writer.write_u8(b'{');
        let mut first = true;
        for (i, field) in self.fields.iter().enumerate() {
            let Some(value) = field_value(i) else {
                continue;
            };
            if omit_null && value.is_null() {
                continue;
            }
            if !first {
                context.writer.write_u8(b',');
            }
            first = false;
            context.writer.write_bytes(&field.encoded_name);
            context.writer.write_u8(b':');
            field.fragment.write(value, context, table)?;
        }
        context.writer.write_u8(b'}');
        Ok(())
    }

    fn read(
        &self,
        json: &Json,
        context: &mut ReadContext,
        table: &[JsonFragment],
    ) -> Result<Value, Error> {
        let members = match json {
            Json::Null => return Ok(Value::Null),
            Json::Object(members) => members,
            other => return Err(unexpected("an object", other)),
        };
        let mut values: Vec<Option<Value>> = vec![None; self.fields.len()];
        for (name, member) in members {
            let Some(&i) = self.index.get(name) else {
                ensure!(
                    context.config().skip_unknown_fields,
                    "Unknown member '{}' of '{}'",
                    name,
                    self.type_name
                );
                trace!("skipping unknown member '{}' of '{}'", name, self.type_name);
                continue;
            };
            values[i] = Some(self.fields[i].fragment.read(member, context, table)?);
        }
        if self.is_tuple {
            return Ok(Value::Tuple(
                values.into_iter().map(|v| v.unwrap_or(Value::Null)).collect(),
            ));
        }
        Ok(Value::Object(ObjectRef::from_fields(
            self.fields
                .iter()
                .zip(values)
                .filter_map(|(field, value)| value.map(|v| (field.name.clone(), v))),
        )))
    }
}

pub(crate) struct CompiledJson {
    pub(crate) data_type: DataType,
    pub(crate) config: Config,
    pub(crate) root: JsonFragment,
    pub(crate) table: Box<[JsonFragment]>,
}

/// Handle to a compiled JSON codec. Clones share the compiled fragments, and every call
/// uses fresh per-call state, so a `JsonCodec` can be used from many threads at once.
///
/// # Examples
///
/// ```rust
/// use shapecodec_core::descriptor::{DataType, PrimitiveKind};
/// use shapecodec_core::value::Value;
/// use shapecodec_core::CodecCompiler;
///
/// let compiler = CodecCompiler::default();
/// let codec = compiler
///     .compile_json(&DataType::list(DataType::nullable(PrimitiveKind::Int32)))
///     .unwrap();
/// let value = Value::List(vec![Value::Int32(1), Value::Null]);
/// assert_eq!(codec.to_json(&value).unwrap(), "[1,null]");
/// assert_eq!(codec.from_json("[1, null]").unwrap(), value);
/// ```
#[derive(Clone)]
pub struct JsonCodec {
    inner: Arc<CompiledJson>,
}

impl JsonCodec {
    pub(crate) fn new(compiled: CompiledJson) -> JsonCodec {
        JsonCodec {
            inner: Arc::new(compiled),
        }
    }

    pub fn data_type(&self) -> &DataType {
        &self.inner.data_type
    }

    pub fn to_json(&self, value: &Value) -> Result<String, Error> {
        let mut context = WriteContext::new(self.inner.config.clone());
        self.inner.root.write(value, &mut context, &self.inner.table)?;
        String::from_utf8(context.writer.dump())
            .map_err(|e| Error::encode_error(format!("JSON output is not UTF-8: {}", e)))
    }

    /// Parses `text` and decodes it. Documents nested deeper than twice `max_depth` (and
    /// at least [`MIN_JSON_NESTING`]) are rejected before they are parsed.
    pub fn from_json(&self, text: &str) -> Result<Value, Error> {
        let limit = (self.inner.config.max_depth as usize)
            .saturating_mul(2)
            .max(MIN_JSON_NESTING);
        check_nesting(text, limit)?;
        let mut deserializer = serde_json::Deserializer::from_str(text);
        deserializer.disable_recursion_limit();
        let json = Json::deserialize(&mut deserializer).map_err(invalid_json)?;
        deserializer.end().map_err(invalid_json)?;
        let mut context = ReadContext::new(self.inner.config.clone());
        self.inner.root.read(&json, &mut context, &self.inner.table)
    }
}

/// Nesting every JSON codec accepts regardless of `max_depth`.
pub const MIN_JSON_NESTING: usize = 128;

#[cold]
fn invalid_json(e: serde_json::Error) -> Error {
    Error::invalid_data(format!(
        "Invalid JSON at line {} column {}: {}",
        e.line(),
        e.column(),
        e
    ))
}

/// Bracket nesting of `text`, checked without building anything.
fn check_nesting(text: &str, limit: usize) -> Result<(), Error> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (position, b) in text.bytes().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'[' | b'{' => {
                depth += 1;
                ensure!(
                    depth <= limit,
                    "JSON nests deeper than {} levels at byte {}",
                    limit,
                    position
                );
            }
            b']' | b'}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    Ok(())
}
