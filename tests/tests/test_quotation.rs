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

use shapecodec_core::buffer::{Reader, Writer};
use shapecodec_core::descriptor::{DataType, PrimitiveKind, Property, StructuralKind};
use shapecodec_core::error::{Error, ErrorKind};
use shapecodec_core::value::Value;
use shapecodec_core::{CodecCompiler, ExpressionCodec};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Stores expressions as their source text.
#[derive(Default)]
struct SourceText {
    writes: AtomicUsize,
}

impl ExpressionCodec for SourceText {
    fn write(&self, writer: &mut Writer, payload: &DataType, expression: &Value) -> Result<(), Error> {
        assert_eq!(payload, &DataType::primitive(PrimitiveKind::Bool));
        self.writes.fetch_add(1, Ordering::Relaxed);
        match expression {
            Value::String(source) => writer.write_utf16_string(source),
            other => Err(anyhow::anyhow!("cannot encode expression {:?}", other).into()),
        }
    }

    fn read(&self, reader: &mut Reader<'_>, _payload: &DataType) -> Result<Value, Error> {
        Ok(Value::String(reader.read_utf16_string()?))
    }
}

/// Writes part of the text, then panics on an empty expression.
struct Truncating;

impl ExpressionCodec for Truncating {
    fn write(&self, writer: &mut Writer, _payload: &DataType, expression: &Value) -> Result<(), Error> {
        writer.write_utf16_string("partial")?;
        match expression {
            Value::String(source) if source.is_empty() => panic!("empty expression"),
            Value::String(source) => writer.write_utf16_string(source),
            other => Err(anyhow::anyhow!("cannot encode expression {:?}", other).into()),
        }
    }

    fn read(&self, reader: &mut Reader<'_>, _payload: &DataType) -> Result<Value, Error> {
        reader.read_utf16_string()?;
        Ok(Value::String(reader.read_utf16_string()?))
    }
}

fn predicate() -> DataType {
    DataType::quotation(DataType::primitive(PrimitiveKind::Bool))
}

#[test]
fn test_quotation_is_delegated() {
    let expressions = Arc::new(SourceText::default());
    let compiler = CodecCompiler::default().expression_codec(expressions.clone());
    let codec = compiler.compile(&predicate()).unwrap();
    let value = Value::Quotation(Box::new(Value::from("x > 1")));
    let bytes = codec.serialize(&value).unwrap();
    assert_eq!(&bytes[..2], [0x56, 5]);
    assert_eq!(codec.deserialize(&bytes).unwrap(), value);
    assert_eq!(expressions.writes.load(Ordering::Relaxed), 1);

    assert_eq!(codec.serialize(&Value::Null).unwrap(), [0xD6]);
    assert_eq!(codec.deserialize(&[0xD6]).unwrap(), Value::Null);
}

#[test]
fn test_quotation_inside_record() {
    let mut compiler =
        CodecCompiler::default().expression_codec(Arc::new(SourceText::default()));
    let key = compiler
        .register(
            "Rule",
            StructuralKind::Record,
            vec![
                Property::new("name", DataType::primitive(PrimitiveKind::String)),
                Property::new("when", predicate()),
            ],
        )
        .unwrap();
    let codec = compiler.compile(&DataType::structural(key)).unwrap();
    let rule = Value::object([
        ("name", Value::from("adult")),
        ("when", Value::Quotation(Box::new(Value::from("age >= 18")))),
    ]);
    let bytes = codec.serialize(&rule).unwrap();
    assert_eq!(codec.deserialize(&bytes).unwrap(), rule);
}

#[test]
fn test_collaborator_failure_is_external() {
    let compiler = CodecCompiler::default().expression_codec(Arc::new(SourceText::default()));
    let codec = compiler.compile(&predicate()).unwrap();
    let err = codec
        .serialize(&Value::Quotation(Box::new(Value::Int32(1))))
        .unwrap_err();
    assert!(matches!(err, Error::Other(_)));
    assert_eq!(err.kind(), ErrorKind::External);
}

#[test]
fn test_quotation_without_expression_codec() {
    let compiler = CodecCompiler::default();
    let err = compiler.compile(&predicate()).err().unwrap();
    assert!(matches!(err, Error::Unsupported(_)));
    assert_eq!(err.kind(), ErrorKind::Shape);
}

#[test]
fn test_collaborator_panic_leaves_exclusive_codec_usable() {
    let mut compiler = CodecCompiler::default().expression_codec(Arc::new(Truncating));
    let key = compiler
        .register(
            "Rule",
            StructuralKind::Record,
            vec![
                Property::new("name", DataType::primitive(PrimitiveKind::String)),
                Property::new("when", predicate()),
            ],
        )
        .unwrap();
    let codec = compiler.compile(&DataType::structural(key)).unwrap();
    let rule = |source: &str| {
        Value::object([
            ("name", Value::from("r")),
            ("when", Value::Quotation(Box::new(Value::from(source)))),
        ])
    };
    let expected = codec.serialize(&rule("a || b")).unwrap();

    let mut exclusive = codec.exclusive();
    let mut out = vec![1, 2, 3];
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        exclusive.serialize_into(&rule(""), &mut out)
    }));
    assert!(outcome.is_err());
    assert_eq!(out, [1, 2, 3]);

    assert_eq!(exclusive.serialize(&rule("a || b")).unwrap(), expected);
    exclusive.serialize_into(&rule("a || b"), &mut out).unwrap();
    assert_eq!(&out[..3], [1, 2, 3]);
    assert_eq!(&out[3..], &expected[..]);
    assert_eq!(exclusive.deserialize(&expected).unwrap(), rule("a || b"));
}
