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

//! Binary codec construction.
//!
//! [`BinaryCompiler`] is the [`DataTypeVisitor`] that turns each descriptor node into a
//! [`BinaryFragment`]: a pair of closures specialised for that node. Fragments never hold
//! the fragment table of their own codec; recursive shapes reach it through the `table`
//! argument every fragment receives, so compiled codecs contain no reference cycles.

mod array;
pub(crate) mod primitive;
mod quotation;
mod structural;

pub use quotation::ExpressionCodec;

use crate::buffer::Reader;
use crate::descriptor::{ArrayType, DataType, PrimitiveType, Property, StructuralType};
use crate::error::Error;
use crate::resolver::context::{ReadContext, WriteContext};
use crate::types::tag_flags::NULL_VALUE;
use crate::value::Value;
use crate::walker::{DataTypeVisitor, Slot};
use log::debug;
use std::sync::Arc;
use structural::BinaryField;

type WriteFn = dyn Fn(&Value, &mut WriteContext, &[BinaryFragment]) -> Result<(), Error>
    + Send
    + Sync;
type ReadFn = dyn Fn(&mut Reader<'_>, &mut ReadContext, &[BinaryFragment]) -> Result<Value, Error>
    + Send
    + Sync;

/// Compiled encoder/decoder pair for one descriptor node.
#[derive(Clone)]
pub struct BinaryFragment {
    write: Arc<WriteFn>,
    read: Arc<ReadFn>,
}

impl BinaryFragment {
    pub fn new<W, R>(write: W, read: R) -> BinaryFragment
    where
        W: Fn(&Value, &mut WriteContext, &[BinaryFragment]) -> Result<(), Error>
            + Send
            + Sync
            + 'static,
        R: Fn(&mut Reader<'_>, &mut ReadContext, &[BinaryFragment]) -> Result<Value, Error>
            + Send
            + Sync
            + 'static,
    {
        BinaryFragment {
            write: Arc::new(write),
            read: Arc::new(read),
        }
    }

    #[inline(always)]
    pub fn write(
        &self,
        value: &Value,
        context: &mut WriteContext,
        table: &[BinaryFragment],
    ) -> Result<(), Error> {
        (self.write)(value, context, table)
    }

    #[inline(always)]
    pub fn read(
        &self,
        reader: &mut Reader<'_>,
        context: &mut ReadContext,
        table: &[BinaryFragment],
    ) -> Result<Value, Error> {
        (self.read)(reader, context, table)
    }
}

#[cold]
fn unbound_slot(slot: usize) -> Error {
    Error::type_error(format!("Recursion slot {} is not bound", slot))
}

pub(crate) struct BinaryCompiler {
    expression_codec: Option<Arc<dyn ExpressionCodec>>,
    slots: Vec<Option<BinaryFragment>>,
}

impl BinaryCompiler {
    pub fn new(expression_codec: Option<Arc<dyn ExpressionCodec>>) -> BinaryCompiler {
        BinaryCompiler {
            expression_codec,
            slots: Vec::new(),
        }
    }

    /// The fragment table indexed by recursion slot.
    pub fn finish(self) -> Result<Box<[BinaryFragment]>, Error> {
        self.slots
            .into_iter()
            .enumerate()
            .map(|(i, slot)| slot.ok_or_else(|| unbound_slot(i)))
            .collect()
    }
}

impl DataTypeVisitor for BinaryCompiler {
    type Fragment = BinaryFragment;
    type Field = BinaryField;

    fn visit_primitive(&mut self, ty: &PrimitiveType) -> Result<BinaryFragment, Error> {
        primitive::compile(ty)
    }

    fn visit_array(
        &mut self,
        ty: &ArrayType,
        element: BinaryFragment,
    ) -> Result<BinaryFragment, Error> {
        Ok(array::compile(ty, element))
    }

    fn visit_property(
        &mut self,
        _owner: &StructuralType,
        property: &Property,
        fragment: BinaryFragment,
    ) -> Result<BinaryField, Error> {
        BinaryField::new(&property.name, fragment)
    }

    fn visit_structural(
        &mut self,
        ty: &StructuralType,
        fields: Vec<BinaryField>,
    ) -> Result<BinaryFragment, Error> {
        Ok(structural::compile(ty, fields))
    }

    fn visit_quotation(&mut self, payload: &DataType) -> Result<BinaryFragment, Error> {
        quotation::compile(self.expression_codec.as_ref(), payload)
    }

    fn forward_ref(&mut self, _ty: &StructuralType, slot: Slot) -> Result<BinaryFragment, Error> {
        let Slot(index) = slot;
        Ok(BinaryFragment::new(
            move |value, context, table| match table.get(index) {
                Some(fragment) => fragment.write(value, context, table),
                None => Err(unbound_slot(index)),
            },
            move |reader, context, table| match table.get(index) {
                Some(fragment) => fragment.read(reader, context, table),
                None => Err(unbound_slot(index)),
            },
        ))
    }

    fn fixed_point(
        &mut self,
        ty: &StructuralType,
        slot: Slot,
        body: BinaryFragment,
    ) -> Result<BinaryFragment, Error> {
        let fragment = guarded(ty.name.clone(), body);
        let Slot(index) = slot;
        if self.slots.len() <= index {
            self.slots.resize(index + 1, None);
        }
        self.slots[index] = Some(fragment.clone());
        debug!("bound recursive type '{}' to slot {}", ty.name, index);
        Ok(fragment)
    }
}

/// Wraps the body of a recursive shape with the depth limit and, for objects, the
/// object-graph cycle guard. A null reference ends the recursion and is not a level.
fn guarded(type_name: String, body: BinaryFragment) -> BinaryFragment {
    let read_body = body.clone();
    BinaryFragment::new(
        move |value, context, table| {
            if value.is_null() {
                return body.write(value, context, table);
            }
            let identity = context.enter_recursive(value, &type_name)?;
            let result = body.write(value, context, table);
            context.exit_recursive(identity);
            result
        },
        move |reader, context, table| {
            if reader.peek_u8().is_some_and(|tag| tag & NULL_VALUE != 0) {
                return read_body.read(reader, context, table);
            }
            context.inc_depth()?;
            let result = read_body.read(reader, context, table);
            context.dec_depth();
            result
        },
    )
}
