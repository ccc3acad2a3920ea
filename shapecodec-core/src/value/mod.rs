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

//! Runtime values the compiled codecs operate on.
//!
//! [`Value`] is dynamically typed; a compiled codec checks that the variants it is handed
//! agree with its shape. Records, entities and anonymous records are shared, lockable
//! [`ObjectRef`]s whose pointer identity is what the object-graph cycle guard tracks.

mod decimal;
mod temporal;

pub use decimal::{Decimal, MAX_SCALE};
pub use temporal::{
    DateTime, DateTimeKind, DateTimeOffset, MAX_OFFSET_MINUTES, MAX_TICKS, TICKS_PER_MINUTE,
    TICKS_PER_SECOND,
};

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Unit,
    Bool(bool),
    Int8(i8),
    UInt8(u8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Float32(f32),
    Float64(f64),
    Decimal(Decimal),
    Char(char),
    String(String),
    DateTime(DateTime),
    DateTimeOffset(DateTimeOffset),
    /// Signed count of 100 ns ticks.
    TimeSpan(i64),
    Guid(Uuid),
    Uri(Uri),
    /// Numeric value of an enum case; it must fit the enum's underlying integer kind.
    Enum(i128),
    Array(Vec<Value>),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    Object(ObjectRef),
    /// An expression tree, opaque to the compiler.
    Quotation(Box<Value>),
}

impl Value {
    /// Short variant name used in mismatch diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Unit => "Unit",
            Value::Bool(_) => "Bool",
            Value::Int8(_) => "Int8",
            Value::UInt8(_) => "UInt8",
            Value::Int16(_) => "Int16",
            Value::UInt16(_) => "UInt16",
            Value::Int32(_) => "Int32",
            Value::UInt32(_) => "UInt32",
            Value::Int64(_) => "Int64",
            Value::UInt64(_) => "UInt64",
            Value::Float32(_) => "Float32",
            Value::Float64(_) => "Float64",
            Value::Decimal(_) => "Decimal",
            Value::Char(_) => "Char",
            Value::String(_) => "String",
            Value::DateTime(_) => "DateTime",
            Value::DateTimeOffset(_) => "DateTimeOffset",
            Value::TimeSpan(_) => "TimeSpan",
            Value::Guid(_) => "Guid",
            Value::Uri(_) => "Uri",
            Value::Enum(_) => "Enum",
            Value::Array(_) => "Array",
            Value::List(_) => "List",
            Value::Tuple(_) => "Tuple",
            Value::Object(_) => "Object",
            Value::Quotation(_) => "Quotation",
        }
    }

    #[inline(always)]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Builds a fresh object from `(name, value)` pairs.
    pub fn object<I, K>(fields: I) -> Value
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Value::Object(ObjectRef::from_fields(fields))
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }
}

macro_rules! impl_from_for_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v.into())
                }
            }
        )*
    };
}

impl_from_for_value!(
    bool => Bool,
    i8 => Int8,
    u8 => UInt8,
    i16 => Int16,
    u16 => UInt16,
    i32 => Int32,
    u32 => UInt32,
    i64 => Int64,
    u64 => UInt64,
    f32 => Float32,
    f64 => Float64,
    char => Char,
    String => String,
    &str => String,
    Decimal => Decimal,
    DateTime => DateTime,
    DateTimeOffset => DateTimeOffset,
    Uuid => Guid,
    Uri => Uri,
    ObjectRef => Object,
);

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// A URI in its original textual form.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Uri {
    text: String,
    absolute: bool,
}

impl Uri {
    /// Wraps `text`, classifying it as absolute when it starts with a scheme.
    pub fn new(text: impl Into<String>) -> Uri {
        let text = text.into();
        let absolute = has_scheme(&text);
        Uri { text, absolute }
    }

    /// Rebuilds a URI exactly as it was encoded.
    pub fn from_parts(text: String, absolute: bool) -> Uri {
        Uri { text, absolute }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_absolute(&self) -> bool {
        self.absolute
    }
}

impl From<&str> for Uri {
    fn from(s: &str) -> Self {
        Uri::new(s)
    }
}

// scheme = ALPHA *( ALPHA / DIGIT / "+" / "-" / "." ) ":"
fn has_scheme(text: &str) -> bool {
    let Some((scheme, _)) = text.split_once(':') else {
        return false;
    };
    let mut bytes = scheme.bytes();
    matches!(bytes.next(), Some(b) if b.is_ascii_alphabetic())
        && bytes.all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'-' | b'.'))
}

/// Field storage of a record, entity or anonymous record.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Object {
    pub fields: BTreeMap<String, Value>,
}

/// Shared handle to an [`Object`]. Clones alias the same object.
#[derive(Clone, Default)]
pub struct ObjectRef(Arc<RwLock<Object>>);

impl ObjectRef {
    pub fn new(object: Object) -> ObjectRef {
        ObjectRef(Arc::new(RwLock::new(object)))
    }

    pub fn from_fields<I, K>(fields: I) -> ObjectRef
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        ObjectRef::new(Object {
            fields: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        })
    }

    /// Pointer identity of the shared object.
    #[inline(always)]
    pub fn identity(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }

    #[inline(always)]
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Takes a read lock; re-entrant on the same thread, so nested reads of one object
    /// through a reference path never deadlock.
    #[inline(always)]
    pub fn read(&self) -> RwLockReadGuard<'_, Object> {
        self.0.read_recursive()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Object> {
        self.0.write()
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.read().fields.get(name).cloned()
    }

    pub fn set(&self, name: impl Into<String>, value: impl Into<Value>) {
        self.write().fields.insert(name.into(), value.into());
    }
}

thread_local! {
    static DEBUG_STACK: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
    static EQ_STACK: RefCell<Vec<(usize, usize)>> = const { RefCell::new(Vec::new()) };
}

/// Pops the pair pushed for one object comparison, also during unwinding.
struct EqFrame;

impl Drop for EqFrame {
    fn drop(&mut self) {
        EQ_STACK.with(|stack| stack.borrow_mut().pop());
    }
}

/// Structural equality. A pair of objects met again while it is still being compared is
/// taken as equal, so two cyclic graphs compare equal when they unfold the same way.
impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        let pair = (self.identity(), other.identity());
        let reentered = EQ_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.contains(&pair) {
                true
            } else {
                stack.push(pair);
                false
            }
        });
        if reentered {
            return true;
        }
        let _frame = EqFrame;
        *self.read() == *other.read()
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = self.identity();
        let reentered = DEBUG_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.contains(&id) {
                true
            } else {
                stack.push(id);
                false
            }
        });
        if reentered {
            return write!(f, "ObjectRef(0x{:x}, ..)", id);
        }
        let result = f.debug_map().entries(self.read().fields.iter()).finish();
        DEBUG_STACK.with(|stack| stack.borrow_mut().pop());
        result
    }
}
