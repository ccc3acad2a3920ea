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

use super::{Property, StructuralKind, StructuralType, TypeKey};
use crate::error::Error;
use std::collections::{HashMap, HashSet};

struct Entry {
    ty: StructuralType,
    defined: bool,
}

/// Registry of structural shapes, keyed by [`TypeKey`].
///
/// Closed shapes are added in one step with [`register`](Self::register). Self- and
/// mutually-recursive shapes are first [`declare`](Self::declare)d, so their keys can be
/// used inside property types, and then [`define`](Self::define)d.
///
/// # Examples
///
/// ```rust
/// use shapecodec_core::descriptor::{DataType, PrimitiveKind, Property, StructuralKind, TypeRegistry};
///
/// let mut registry = TypeRegistry::default();
/// let node = registry.declare("Node", StructuralKind::Record).unwrap();
/// registry
///     .define(
///         node,
///         vec![
///             Property::new("value", DataType::primitive(PrimitiveKind::Int32)),
///             Property::new("children", DataType::list(DataType::structural(node))),
///         ],
///     )
///     .unwrap();
/// assert_eq!(registry.get(node).unwrap().properties.len(), 2);
/// ```
#[derive(Default)]
pub struct TypeRegistry {
    entries: Vec<Entry>,
    by_name: HashMap<String, TypeKey>,
}

impl TypeRegistry {
    pub fn register(
        &mut self,
        name: &str,
        kind: StructuralKind,
        properties: Vec<Property>,
    ) -> Result<TypeKey, Error> {
        let key = self.declare(name, kind)?;
        self.define(key, properties)?;
        Ok(key)
    }

    pub fn declare(&mut self, name: &str, kind: StructuralKind) -> Result<TypeKey, Error> {
        if self.by_name.contains_key(name) {
            return Err(Error::type_error(format!(
                "Type '{}' has been registered already",
                name
            )));
        }
        let key = TypeKey(u32::try_from(self.entries.len()).map_err(|_| {
            Error::type_error("Too many structural types registered")
        })?);
        self.entries.push(Entry {
            ty: StructuralType {
                key,
                name: name.to_owned(),
                kind,
                properties: Vec::new(),
            },
            defined: false,
        });
        self.by_name.insert(name.to_owned(), key);
        Ok(key)
    }

    pub fn define(&mut self, key: TypeKey, properties: Vec<Property>) -> Result<(), Error> {
        let entry = self
            .entries
            .get_mut(key.0 as usize)
            .ok_or_else(|| Error::type_error(format!("Type {} not found in registry", key)))?;
        if entry.defined {
            return Err(Error::type_error(format!(
                "Type '{}' has been defined already",
                entry.ty.name
            )));
        }
        {
            let mut names = HashSet::with_capacity(properties.len());
            for property in &properties {
                if !names.insert(property.name.as_str()) {
                    return Err(Error::type_error(format!(
                        "Duplicate property '{}' in type '{}'",
                        property.name, entry.ty.name
                    )));
                }
            }
        }
        entry.ty.properties = properties;
        entry.defined = true;
        Ok(())
    }

    /// Resolves a key to its definition. Unknown and declared-but-undefined keys are
    /// type errors.
    pub fn get(&self, key: TypeKey) -> Result<&StructuralType, Error> {
        match self.entries.get(key.0 as usize) {
            Some(entry) if entry.defined => Ok(&entry.ty),
            Some(entry) => Err(Error::type_error(format!(
                "Type '{}' was declared but never defined",
                entry.ty.name
            ))),
            None => Err(Error::type_error(format!(
                "Type {} not found in registry, maybe you forgot to register it",
                key
            ))),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
