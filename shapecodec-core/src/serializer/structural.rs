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

//! Records, entities, anonymous records and tuples.
//!
//! ```text
//! tag | compact field count | ( utf16 name | compact payload length | payload )*
//! ```
//!
//! Only fields that are actually written are counted. Every payload is length-prefixed so
//! a reader can step over fields it does not know.

use crate::buffer::{Reader, Writer};
use crate::descriptor::{StructuralKind, StructuralType};
use crate::ensure;
use crate::error::Error;
use crate::resolver::context::{ReadContext, WriteContext};
use crate::serializer::BinaryFragment;
use crate::types::{expected_tag, null_tag, read_tag, TypeCode};
use crate::value::{ObjectRef, Value};
use log::trace;
use std::collections::HashMap;
use std::sync::Arc;

/// Smallest possible encoded field: an empty name and an empty payload length.
const MIN_FIELD_SIZE: usize = 2;

pub(crate) struct BinaryField {
    name: String,
    /// The name as written on the wire, length prefix included.
    encoded_name: Box<[u8]>,
    fragment: BinaryFragment,
}

impl BinaryField {
    pub(crate) fn new(name: &str, fragment: BinaryFragment) -> Result<BinaryField, Error> {
        let mut writer = Writer::default();
        writer.write_utf16_string(name)?;
        Ok(BinaryField {
            name: name.to_owned(),
            encoded_name: writer.dump().into_boxed_slice(),
            fragment,
        })
    }
}

struct Layout {
    type_name: String,
    is_tuple: bool,
    fields: Vec<BinaryField>,
    index: HashMap<Box<[u16]>, usize>,
}

pub(crate) fn compile(ty: &StructuralType, fields: Vec<BinaryField>) -> BinaryFragment {
    let index = fields
        .iter()
        .enumerate()
        .map(|(i, f)| (f.name.encode_utf16().collect::<Box<[u16]>>(), i))
        .collect();
    let layout = Arc::new(Layout {
        type_name: ty.name.clone(),
        is_tuple: ty.kind == StructuralKind::Tuple,
        fields,
        index,
    });
    let read_layout = layout.clone();
    BinaryFragment::new(
        move |value, context, table| layout.write(value, context, table),
        move |reader, context, table| read_layout.read(reader, context, table),
    )
}

impl Layout {
    fn write(
        &self,
        value: &Value,
        context: &mut WriteContext,
        table: &[BinaryFragment],
    ) -> Result<(), Error> {
        match value {
            Value::Null => {
                context.writer.write_u8(null_tag(TypeCode::Structural));
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
                self.write_fields(context, table, |i| Some(&items[i]))
            }
            Value::Object(object) if !self.is_tuple => {
                let object = object.read();
                self.write_fields(context, table, |i| object.fields.get(&self.fields[i].name))
            }
            other => Err(Error::value_mismatch(
                if self.is_tuple { "Tuple" } else { "Object" },
                other.type_name(),
            )),
        }
    }

    fn write_fields<'v>(
        &self,
        context: &mut WriteContext,
        table: &[BinaryFragment],
        field_value: impl Fn(usize) -> Option<&'v Value>,
    ) -> Result<(), Error> {
        let omit_null = context.config().omit_null_fields;
        let present = |i: usize| field_value(i).filter(|v| !(omit_null && v.is_null()));
        let count = (0..self.fields.len()).filter(|&i| present(i).is_some()).count();

        context
            .writer
            .write_u8(expected_tag(TypeCode::Structural, true));
        context.writer.write_varuint32(count as u32);
        for (i, field) in self.fields.iter().enumerate() {
            let Some(value) = present(i) else {
                continue;
            };
            context.writer.write_bytes(&field.encoded_name);
            context.write_staged(|context| field.fragment.write(value, context, table))?;
        }
        Ok(())
    }

    fn read(
        &self,
        reader: &mut Reader<'_>,
        context: &mut ReadContext,
        table: &[BinaryFragment],
    ) -> Result<Value, Error> {
        if read_tag(reader, TypeCode::Structural, true)? {
            return Ok(Value::Null);
        }
        let count = reader.read_length(MIN_FIELD_SIZE)?;
        let mut values: Vec<Option<Value>> = vec![None; self.fields.len()];
        for _ in 0..count {
            let name_position = reader.get_cursor();
            reader.read_utf16_units(&mut context.name_scratch)?;
            let len = reader.read_length(1)?;
            let Some(i) = self.index.get(context.name_scratch.as_slice()).copied() else {
                self.skip_unknown(reader, context, len, name_position)?;
                continue;
            };
            let field = &self.fields[i];
            ensure!(
                values[i].is_none(),
                "Duplicate field '{}' of '{}' at position {}",
                field.name,
                self.type_name,
                name_position
            );
            let start = reader.get_cursor();
            let value = field.fragment.read(reader, context, table)?;
            let consumed = reader.get_cursor() - start;
            ensure!(
                consumed == len,
                "Field '{}' of '{}' declares {} bytes but its payload has {} at position {}",
                field.name,
                self.type_name,
                len,
                consumed,
                start
            );
            values[i] = Some(value);
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

    fn skip_unknown(
        &self,
        reader: &mut Reader<'_>,
        context: &ReadContext,
        len: usize,
        name_position: usize,
    ) -> Result<(), Error> {
        let name = String::from_utf16_lossy(&context.name_scratch);
        ensure!(
            context.config().skip_unknown_fields,
            "Unknown field '{}' of '{}' at position {}",
            name,
            self.type_name,
            name_position
        );
        trace!(
            "skipping unknown field '{}' of '{}' ({} bytes)",
            name,
            self.type_name,
            len
        );
        reader.skip(len)
    }
}
