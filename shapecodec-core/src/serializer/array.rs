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

use crate::descriptor::ArrayType;
use crate::error::Error;
use crate::serializer::BinaryFragment;
use crate::types::{expected_tag, null_tag, read_tag, TypeCode};
use crate::value::Value;

/// Arrays and lists: tag, compact element count, then the elements back to back.
pub(crate) fn compile(ty: &ArrayType, element: BinaryFragment) -> BinaryFragment {
    let is_list = ty.is_list;
    let write_element = element.clone();
    BinaryFragment::new(
        move |value, context, table| match value {
            Value::Null => {
                context.writer.write_u8(null_tag(TypeCode::Array));
                Ok(())
            }
            Value::Array(items) | Value::List(items) => {
                let len = u32::try_from(items.len()).map_err(|_| {
                    Error::encode_error(format!("Array of {} elements is too long", items.len()))
                })?;
                context.writer.write_u8(expected_tag(TypeCode::Array, true));
                context.writer.write_varuint32(len);
                for item in items {
                    write_element.write(item, context, table)?;
                }
                Ok(())
            }
            other => Err(Error::value_mismatch(
                if is_list { "List" } else { "Array" },
                other.type_name(),
            )),
        },
        move |reader, context, table| {
            if read_tag(reader, TypeCode::Array, true)? {
                return Ok(Value::Null);
            }
            // every element carries at least its tag byte
            let len = reader.read_length(1)?;
            let mut items = Vec::with_capacity(len);
            for _ in 0..len {
                items.push(element.read(reader, context, table)?);
            }
            Ok(if is_list {
                Value::List(items)
            } else {
                Value::Array(items)
            })
        },
    )
}
