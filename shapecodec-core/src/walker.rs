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

//! Depth-first walk over a [`DataType`] with recursion-safe structural handling.
//!
//! The walker owns the per-compile recursion state; visitors only decide what a fragment
//! is. When a structural shape is reached again while it is still being built, the walker
//! hands the visitor a [`Slot`] to refer to instead of descending again. Once the shape is
//! finished, a shape whose slot was taken is closed over itself through
//! [`DataTypeVisitor::fixed_point`].

use crate::descriptor::{
    ArrayType, DataType, PrimitiveType, Property, StructuralType, TypeKey, TypeRegistry,
};
use crate::error::Error;
use std::collections::HashMap;

/// Index of a recursive shape's fragment in the compiled fragment table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Slot(pub usize);

pub trait DataTypeVisitor {
    type Fragment: Clone;
    type Field;

    fn visit_primitive(&mut self, ty: &PrimitiveType) -> Result<Self::Fragment, Error>;

    fn visit_array(
        &mut self,
        ty: &ArrayType,
        element: Self::Fragment,
    ) -> Result<Self::Fragment, Error>;

    fn visit_property(
        &mut self,
        owner: &StructuralType,
        property: &Property,
        fragment: Self::Fragment,
    ) -> Result<Self::Field, Error>;

    /// Combines the field contributions, in property order, into one fragment.
    fn visit_structural(
        &mut self,
        ty: &StructuralType,
        fields: Vec<Self::Field>,
    ) -> Result<Self::Fragment, Error>;

    fn visit_quotation(&mut self, payload: &DataType) -> Result<Self::Fragment, Error>;

    fn visit_open_generic_parameter(&mut self, name: &str) -> Result<Self::Fragment, Error> {
        Err(Error::type_error(format!(
            "Open generic parameter '{}' cannot have instances",
            name
        )))
    }

    fn visit_custom(&mut self, name: &str) -> Result<Self::Fragment, Error> {
        Err(Error::unsupported(format!(
            "Unsupported custom type '{}'",
            name
        )))
    }

    /// A fragment that dispatches to whatever ends up in `slot`.
    fn forward_ref(&mut self, ty: &StructuralType, slot: Slot) -> Result<Self::Fragment, Error>;

    /// Binds `slot` to the finished `body` of a shape that referred to itself.
    fn fixed_point(
        &mut self,
        ty: &StructuralType,
        slot: Slot,
        body: Self::Fragment,
    ) -> Result<Self::Fragment, Error>;
}

/// Placeholder for a structural shape under construction. It counts as used exactly when
/// a slot has been handed out for it.
#[derive(Default)]
struct ForwardRef {
    slot: Option<Slot>,
}

pub struct Walker<'r, V: DataTypeVisitor> {
    registry: &'r TypeRegistry,
    visitor: V,
    visited: HashMap<TypeKey, ForwardRef>,
    built: HashMap<TypeKey, V::Fragment>,
    next_slot: usize,
}

impl<'r, V: DataTypeVisitor> Walker<'r, V> {
    pub fn new(registry: &'r TypeRegistry, visitor: V) -> Self {
        Walker {
            registry,
            visitor,
            visited: HashMap::new(),
            built: HashMap::new(),
            next_slot: 0,
        }
    }

    /// Number of recursion slots handed out so far.
    pub fn slot_count(&self) -> usize {
        self.next_slot
    }

    pub fn into_visitor(self) -> V {
        self.visitor
    }

    pub fn walk(&mut self, ty: &DataType) -> Result<V::Fragment, Error> {
        match ty {
            DataType::Primitive(primitive) => self.visitor.visit_primitive(primitive),
            DataType::Array(array) => {
                let element = self.walk(&array.element)?;
                self.visitor.visit_array(array, element)
            }
            DataType::Structural(key) => self.walk_structural(*key),
            DataType::Quotation(payload) => self.visitor.visit_quotation(payload),
            DataType::OpenGenericParameter(name) => {
                self.visitor.visit_open_generic_parameter(name)
            }
            DataType::Custom(name) => self.visitor.visit_custom(name),
        }
    }

    fn walk_structural(&mut self, key: TypeKey) -> Result<V::Fragment, Error> {
        if let Some(fragment) = self.built.get(&key) {
            return Ok(fragment.clone());
        }
        let registry = self.registry;
        let ty = registry.get(key)?;

        if let Some(forward) = self.visited.get_mut(&key) {
            let slot = match forward.slot {
                Some(slot) => slot,
                None => {
                    let slot = Slot(self.next_slot);
                    self.next_slot += 1;
                    forward.slot = Some(slot);
                    slot
                }
            };
            return self.visitor.forward_ref(ty, slot);
        }

        if !ty.kind.is_supported() {
            return Err(Error::unsupported(format!(
                "Unsupported structural kind {:?} of type '{}'",
                ty.kind, ty.name
            )));
        }

        self.visited.insert(key, ForwardRef::default());
        let result = self.build_structural(ty);
        // the entry goes away whether or not the build succeeded
        let forward = self.visited.remove(&key).unwrap_or_default();
        let body = result?;

        let fragment = match forward.slot {
            Some(slot) => self.visitor.fixed_point(ty, slot, body)?,
            None => body,
        };
        self.built.insert(key, fragment.clone());
        Ok(fragment)
    }

    fn build_structural(&mut self, ty: &StructuralType) -> Result<V::Fragment, Error> {
        let mut fields = Vec::with_capacity(ty.properties.len());
        for property in &ty.properties {
            let fragment = self.walk(&property.data_type)?;
            fields.push(self.visitor.visit_property(ty, property, fragment)?);
        }
        self.visitor.visit_structural(ty, fields)
    }
}
