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

use chrono::{TimeZone, Utc};
use shapecodec_core::descriptor::{DataType, PrimitiveKind, Property, StructuralKind};
use shapecodec_core::error::{Error, ErrorKind};
use shapecodec_core::value::{DateTime, DateTimeOffset, Decimal, ObjectRef, Uri, Value};
use shapecodec_core::CodecCompiler;
use uuid::Uuid;

fn scalar_json(kind: PrimitiveKind, value: Value) -> String {
    let compiler = CodecCompiler::default();
    let codec = compiler.compile_json(&DataType::primitive(kind)).unwrap();
    let text = codec.to_json(&value).unwrap();
    assert_eq!(codec.from_json(&text).unwrap(), value);
    text
}

#[test]
fn test_scalar_mapping() {
    assert_eq!(scalar_json(PrimitiveKind::Int32, Value::Int32(-7)), "-7");
    assert_eq!(
        scalar_json(PrimitiveKind::UInt64, Value::UInt64(u64::MAX)),
        "18446744073709551615"
    );
    assert_eq!(scalar_json(PrimitiveKind::Bool, Value::Bool(false)), "false");
    assert_eq!(scalar_json(PrimitiveKind::Float64, Value::Float64(0.25)), "0.25");
    assert_eq!(scalar_json(PrimitiveKind::Unit, Value::Unit), "null");
    assert_eq!(scalar_json(PrimitiveKind::Char, Value::Char('é')), "\"é\"");
    assert_eq!(
        scalar_json(PrimitiveKind::String, Value::from("say \"hi\"\n")),
        r#""say \"hi\"\n""#
    );
    assert_eq!(
        scalar_json(
            PrimitiveKind::Decimal,
            Value::Decimal(Decimal::new(-1250, 2).unwrap())
        ),
        "\"-12.50\""
    );
    assert_eq!(
        scalar_json(PrimitiveKind::TimeSpan, Value::TimeSpan(36_000_000_000)),
        "36000000000"
    );
    assert_eq!(
        scalar_json(
            PrimitiveKind::Enum(&PrimitiveKind::Int16),
            Value::Enum(-3)
        ),
        "-3"
    );
}

#[test]
fn test_string_shaped_scalars() {
    let guid = Uuid::parse_str("00112233-4455-6677-8899-aabbccddeeff").unwrap();
    assert_eq!(
        scalar_json(PrimitiveKind::Guid, Value::Guid(guid)),
        "\"00112233-4455-6677-8899-aabbccddeeff\""
    );

    let epoch = DateTime::from_utc(Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap()).unwrap();
    assert_eq!(
        scalar_json(PrimitiveKind::DateTime, Value::DateTime(epoch)),
        "\"1970-01-01T00:00:00.0000000Z\""
    );

    let noon = DateTime::from_utc(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()).unwrap();
    let dto = DateTimeOffset::new(noon.ticks(), 120).unwrap();
    assert_eq!(
        scalar_json(PrimitiveKind::DateTimeOffset, Value::DateTimeOffset(dto)),
        "\"2024-05-01T12:00:00.0000000+02:00\""
    );
}

#[test]
fn test_scalar_errors() {
    let compiler = CodecCompiler::default();
    let float = compiler
        .compile_json(&DataType::primitive(PrimitiveKind::Float32))
        .unwrap();
    assert!(matches!(
        float.to_json(&Value::Float32(f32::NAN)),
        Err(Error::EncodeError(_))
    ));

    let int8 = compiler
        .compile_json(&DataType::primitive(PrimitiveKind::Int8))
        .unwrap();
    assert!(matches!(int8.from_json("300"), Err(Error::InvalidData(_))));
    assert!(matches!(int8.from_json("\"1\""), Err(Error::InvalidData(_))));
    assert!(matches!(int8.from_json("null"), Err(Error::InvalidData(_))));
    assert!(matches!(int8.to_json(&Value::Null), Err(Error::EncodeError(_))));

    let err = int8.from_json("[1,").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Format);
    assert!(err.to_string().contains("line 1"));
}

#[test]
fn test_record_as_object() {
    let mut compiler = CodecCompiler::default();
    let key = compiler
        .register(
            "User",
            StructuralKind::Record,
            vec![
                Property::new("id", DataType::primitive(PrimitiveKind::Int64)),
                Property::new("name", DataType::nullable(PrimitiveKind::String)),
                Property::new(
                    "scores",
                    DataType::array(DataType::primitive(PrimitiveKind::Float64)),
                ),
            ],
        )
        .unwrap();
    let codec = compiler.compile_json(&DataType::structural(key)).unwrap();
    let value = Value::object([
        ("scores", Value::Array(vec![Value::Float64(1.5)])),
        ("name", Value::Null),
        ("id", Value::Int64(9)),
    ]);
    // members follow property order
    let text = codec.to_json(&value).unwrap();
    assert_eq!(text, r#"{"id":9,"name":null,"scores":[1.5]}"#);
    assert_eq!(codec.from_json(&text).unwrap(), value);

    // unknown members are skipped, order does not matter, absent members stay absent
    let decoded = codec
        .from_json(r#"{"extra": {"deep": [1, 2]}, "scores": [], "id": 1}"#)
        .unwrap();
    assert_eq!(
        decoded,
        Value::object([("id", Value::Int64(1)), ("scores", Value::Array(vec![]))])
    );
    assert_eq!(codec.from_json("null").unwrap(), Value::Null);
    assert!(matches!(codec.from_json("[]"), Err(Error::InvalidData(_))));
}

#[test]
fn test_json_config_options() {
    let mut compiler = CodecCompiler::default()
        .omit_null_fields(true)
        .skip_unknown_fields(false);
    let key = compiler
        .register(
            "Tag",
            StructuralKind::Anonymous,
            vec![
                Property::new("label", DataType::primitive(PrimitiveKind::String)),
                Property::new("color", DataType::nullable(PrimitiveKind::String)),
            ],
        )
        .unwrap();
    let codec = compiler.compile_json(&DataType::structural(key)).unwrap();
    let value = Value::object([("label", Value::from("x")), ("color", Value::Null)]);
    assert_eq!(codec.to_json(&value).unwrap(), r#"{"label":"x"}"#);
    let err = codec.from_json(r#"{"label":"x","size":3}"#).unwrap_err();
    assert!(err.to_string().contains("Unknown member 'size'"));
}

#[test]
fn test_tuple_as_object() {
    let mut compiler = CodecCompiler::default();
    let key = compiler
        .register(
            "Pair",
            StructuralKind::Tuple,
            vec![
                Property::new("Item1", DataType::primitive(PrimitiveKind::Int32)),
                Property::new("Item2", DataType::primitive(PrimitiveKind::String)),
            ],
        )
        .unwrap();
    let codec = compiler.compile_json(&DataType::structural(key)).unwrap();
    let value = Value::Tuple(vec![Value::Int32(1), Value::from("one")]);
    let text = codec.to_json(&value).unwrap();
    assert_eq!(text, r#"{"Item1":1,"Item2":"one"}"#);
    assert_eq!(codec.from_json(&text).unwrap(), value);
    assert_eq!(
        codec.from_json(r#"{"Item2":"two"}"#).unwrap(),
        Value::Tuple(vec![Value::Null, Value::from("two")])
    );
}

#[test]
fn test_recursive_shape_and_cycle() {
    let mut compiler = CodecCompiler::default().max_depth(16);
    let node = compiler.declare("Node", StructuralKind::Record).unwrap();
    compiler
        .define(
            node,
            vec![
                Property::new("name", DataType::primitive(PrimitiveKind::String)),
                Property::new("next", DataType::structural(node)),
            ],
        )
        .unwrap();
    let codec = compiler.compile_json(&DataType::structural(node)).unwrap();

    let tail = Value::object([("name", Value::from("b")), ("next", Value::Null)]);
    let head = Value::object([("name", Value::from("a")), ("next", tail)]);
    let text = codec.to_json(&head).unwrap();
    assert_eq!(text, r#"{"name":"a","next":{"name":"b","next":null}}"#);
    assert_eq!(codec.from_json(&text).unwrap(), head);

    let looped = ObjectRef::from_fields([("name", Value::from("self"))]);
    looped.set("next", Value::Object(looped.clone()));
    assert!(matches!(
        codec.to_json(&Value::Object(looped)),
        Err(Error::CycleDetected(_))
    ));

    let deep = "{\"name\":\"x\",\"next\":".repeat(20) + "null" + &"}".repeat(20);
    assert!(matches!(codec.from_json(&deep), Err(Error::DepthExceed(_))));
}

#[test]
fn test_quotation_has_no_json_form() {
    let compiler = CodecCompiler::default();
    let err = compiler
        .compile_json(&DataType::quotation(DataType::primitive(PrimitiveKind::Int32)))
        .err()
        .unwrap();
    assert!(matches!(err, Error::Unsupported(_)));
}

#[test]
fn test_deep_chain_round_trips() {
    let mut compiler = CodecCompiler::default();
    let link = compiler.declare("Link", StructuralKind::Entity).unwrap();
    compiler
        .define(
            link,
            vec![
                Property::new("id", DataType::primitive(PrimitiveKind::Int32)),
                Property::new("next", DataType::structural(link)),
            ],
        )
        .unwrap();
    let codec = compiler.compile_json(&DataType::structural(link)).unwrap();

    let chain = (0..200).rev().fold(Value::Null, |next, id| {
        Value::object([("id", Value::Int32(id)), ("next", next)])
    });
    let text = codec.to_json(&chain).unwrap();
    assert_eq!(codec.from_json(&text).unwrap(), chain);

    // nesting is bounded before the document is parsed
    let hostile = "[".repeat(100_000);
    let err = codec.from_json(&hostile).unwrap_err();
    assert!(matches!(err, Error::InvalidData(_)));
    assert!(err.to_string().contains("nests deeper than 512 levels"));
}

#[test]
fn test_uri_absoluteness_comes_from_text() {
    let compiler = CodecCompiler::default();
    let codec = compiler
        .compile_json(&DataType::primitive(PrimitiveKind::Uri))
        .unwrap();
    let text = codec
        .to_json(&Value::Uri(Uri::from_parts("mailto:x".into(), false)))
        .unwrap();
    assert_eq!(text, "\"mailto:x\"");
    let Value::Uri(uri) = codec.from_json(&text).unwrap() else {
        panic!("expected a Uri");
    };
    assert_eq!(uri.as_str(), "mailto:x");
    assert!(uri.is_absolute());
}
