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

use crate::buffer::{Reader, Writer};
use crate::descriptor::DataType;
use crate::error::Error;
use crate::serializer::BinaryFragment;
use crate::types::{expected_tag, null_tag, read_tag, TypeCode};
use crate::value::Value;
use std::sync::Arc;

/// Encodes expression trees embedded as quotations.
///
/// The compiler writes the quotation tag and hands the payload over whole; it never looks
/// inside the expression or its function type. Implementations report their own failures
/// through [`Error::Other`], e.g. `Err(anyhow::anyhow!("unknown node").into())`.
pub trait ExpressionCodec: Send + Sync {
    fn write(&self, writer: &mut Writer, payload: &DataType, expression: &Value)
        -> Result<(), Error>;

    fn read(&self, reader: &mut Reader<'_>, payload: &DataType) -> Result<Value, Error>;
}

pub(crate) fn compile(
    codec: Option<&Arc<dyn ExpressionCodec>>,
    payload: &DataType,
) -> Result<BinaryFragment, Error> {
    let codec = codec.cloned().ok_or_else(|| {
        Error::unsupported(format!(
            "Quotation of {:?} needs an expression codec, none is installed",
            payload
        ))
    })?;
    let write_codec = codec.clone();
    let write_payload = payload.clone();
    let read_payload = payload.clone();
    Ok(BinaryFragment::new(
        move |value, context, _| match value {
            Value::Null => {
                context.writer.write_u8(null_tag(TypeCode::Quotation));
                Ok(())
            }
            Value::Quotation(expression) => {
                context
                    .writer
                    .write_u8(expected_tag(TypeCode::Quotation, true));
                write_codec.write(&mut context.writer, &write_payload, expression)
            }
            other => Err(Error::value_mismatch("Quotation", other.type_name())),
        },
        move |reader, _, _| {
            if read_tag(reader, TypeCode::Quotation, true)? {
                return Ok(Value::Null);
            }
            Ok(Value::Quotation(Box::new(
                codec.read(reader, &read_payload)?,
            )))
        },
    ))
}
