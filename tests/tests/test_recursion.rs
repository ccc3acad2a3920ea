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

use shapecodec_core::descriptor::{DataType, PrimitiveKind, Property, StructuralKind, TypeKey};
use shapecodec_core::error::{Error, ErrorKind};
use shapecodec_core::value::{ObjectRef, Value};
use shapecodec_core::{CodecCompiler, Config};

fn tree(compiler: &mut CodecCompiler) -> TypeKey {
    let node = compiler.declare("Node", StructuralKind::Record).unwrap();
    compiler
        .define(
            node,
            vec![
                Property::new("value", DataType::primitive(PrimitiveKind::Int32)),
                Property::new("children", DataType::list(DataType::structural(node))),
            ],
        )
        .unwrap();
    node
}

fn linked(compiler: &mut CodecCompiler) -> TypeKey {
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
    link
}

fn leaf(value: i32) -> Value {
    Value::object([("value", Value::Int32(value)), ("children", Value::List(vec![]))])
}

fn chain(len: i32) -> Value {
    (0..len).rev().fold(Value::Null, |next, id| {
        Value::object([("id", Value::Int32(id)), ("next", next)])
    })
}

#[test]
fn test_self_recursive_tree() {
    let mut compiler = CodecCompiler::default();
    let node = tree(&mut compiler);
    let codec = compiler.compile(&DataType::structural(node)).unwrap();
    assert_eq!(codec.recursive_slots(), 1);

    let value = Value::object([
        ("value", Value::Int32(1)),
        (
            "children",
            Value::List(vec![
                leaf(2),
                Value::object([
                    ("value", Value::Int32(3)),
                    ("children", Value::List(vec![leaf(4)])),
                ]),
            ]),
        ),
    ]);
    let bytes = codec.serialize(&value).unwrap();
    assert_eq!(codec.deserialize(&bytes).unwrap(), value);
}

#[test]
fn test_mutually_recursive_shapes() {
    let mut compiler = CodecCompiler::default();
    let person = compiler.declare("Person", StructuralKind::Record).unwrap();
    let company = compiler.declare("Company", StructuralKind::Record).unwrap();
    compiler
        .define(
            person,
            vec![
                Property::new("name", DataType::primitive(PrimitiveKind::String)),
                Property::new("employer", DataType::structural(company)),
            ],
        )
        .unwrap();
    compiler
        .define(
            company,
            vec![
                Property::new("name", DataType::primitive(PrimitiveKind::String)),
                Property::new("staff", DataType::list(DataType::structural(person))),
            ],
        )
        .unwrap();

    let people = compiler.compile(&DataType::structural(person)).unwrap();
    let companies = compiler.compile(&DataType::structural(company)).unwrap();
    // only the shape first reached again gets a slot
    assert_eq!(people.recursive_slots(), 1);
    assert_eq!(companies.recursive_slots(), 1);

    let acme = Value::object([
        ("name", Value::from("Acme")),
        (
            "staff",
            Value::List(vec![Value::object([
                ("name", Value::from("Bob")),
                ("employer", Value::Null),
            ])]),
        ),
    ]);
    let alice = Value::object([("name", Value::from("Alice")), ("employer", acme.clone())]);
    let bytes = people.serialize(&alice).unwrap();
    assert_eq!(people.deserialize(&bytes).unwrap(), alice);
    let bytes = companies.serialize(&acme).unwrap();
    assert_eq!(companies.deserialize(&bytes).unwrap(), acme);
}

#[test]
fn test_acyclic_shapes_take_no_slots() {
    let mut compiler = CodecCompiler::default();
    let inner = compiler
        .register(
            "Inner",
            StructuralKind::Record,
            vec![Property::new("v", DataType::primitive(PrimitiveKind::UInt8))],
        )
        .unwrap();
    let outer = compiler
        .register(
            "Outer",
            StructuralKind::Record,
            vec![
                Property::new("left", DataType::structural(inner)),
                Property::new("right", DataType::structural(inner)),
            ],
        )
        .unwrap();
    let codec = compiler.compile(&DataType::structural(outer)).unwrap();
    assert_eq!(codec.recursive_slots(), 0);
}

#[test]
fn test_shared_object_is_not_a_cycle() {
    let mut compiler = CodecCompiler::default();
    let node = tree(&mut compiler);
    let codec = compiler.compile(&DataType::structural(node)).unwrap();
    let shared = leaf(7);
    let value = Value::object([
        ("value", Value::Int32(0)),
        ("children", Value::List(vec![shared.clone(), shared])),
    ]);
    let bytes = codec.serialize(&value).unwrap();
    // shared objects are written by value; they come back as two equal objects
    let decoded = codec.deserialize(&bytes).unwrap();
    assert_eq!(decoded, value);
}

#[test]
fn test_object_cycle_is_detected() {
    let mut compiler = CodecCompiler::default();
    let node = tree(&mut compiler);
    let codec = compiler.compile(&DataType::structural(node)).unwrap();

    let root = ObjectRef::from_fields([("value", Value::Int32(1))]);
    let child = ObjectRef::from_fields([("value", Value::Int32(2))]);
    child.set("children", Value::List(vec![Value::Object(root.clone())]));
    root.set("children", Value::List(vec![Value::Object(child)]));

    let err = codec.serialize(&Value::Object(root.clone())).unwrap_err();
    assert!(matches!(err, Error::CycleDetected(_)));
    assert_eq!(err.kind(), ErrorKind::Cycle);
    assert!(err.to_string().contains("Node"));

    // debug output of a cyclic graph terminates
    let rendered = format!("{:?}", root);
    assert!(rendered.contains("ObjectRef(0x"));

    // break the cycle and the same codec succeeds
    root.set("children", Value::List(vec![]));
    assert!(codec.serialize(&Value::Object(root)).is_ok());
}

#[test]
fn test_mutual_object_cycle_is_detected() {
    let mut compiler = CodecCompiler::default();
    let a = compiler.declare("A", StructuralKind::Record).unwrap();
    let b = compiler.declare("B", StructuralKind::Record).unwrap();
    compiler
        .define(a, vec![Property::new("b", DataType::structural(b))])
        .unwrap();
    compiler
        .define(b, vec![Property::new("a", DataType::structural(a))])
        .unwrap();
    let codec = compiler.compile(&DataType::structural(a)).unwrap();

    let first = ObjectRef::default();
    let second = ObjectRef::from_fields([("a", Value::Object(first.clone()))]);
    first.set("b", Value::Object(second));
    assert!(matches!(
        codec.serialize(&Value::Object(first)),
        Err(Error::CycleDetected(_))
    ));
}

#[test]
fn test_depth_limit_on_encode() {
    let mut compiler = CodecCompiler::default().max_depth(3);
    let link = linked(&mut compiler);
    let codec = compiler.compile(&DataType::structural(link)).unwrap();
    assert!(codec.serialize(&chain(3)).is_ok());
    assert!(matches!(
        codec.serialize(&chain(4)),
        Err(Error::DepthExceed(_))
    ));
}

#[test]
fn test_depth_limit_on_decode() {
    let mut permissive = CodecCompiler::default();
    let link = linked(&mut permissive);
    let bytes = permissive
        .compile(&DataType::structural(link))
        .unwrap()
        .serialize(&chain(10))
        .unwrap();

    let mut strict = CodecCompiler::default().max_depth(5);
    let link = linked(&mut strict);
    let codec = strict.compile(&DataType::structural(link)).unwrap();
    let err = codec.deserialize(&bytes).unwrap_err();
    assert!(matches!(err, Error::DepthExceed(_)));
    assert_eq!(err.kind(), ErrorKind::Cycle);
}

#[test]
fn test_depth_resets_between_calls() {
    let mut compiler = CodecCompiler::default().max_depth(4);
    let link = linked(&mut compiler);
    let codec = compiler.compile(&DataType::structural(link)).unwrap();
    let mut exclusive = codec.exclusive();
    for _ in 0..10 {
        let bytes = exclusive.serialize(&chain(4)).unwrap();
        assert_eq!(exclusive.deserialize(&bytes).unwrap(), chain(4));
    }
}

#[test]
fn test_shape_errors() {
    let mut compiler = CodecCompiler::default();
    let err = compiler
        .compile(&DataType::OpenGenericParameter("T".into()))
        .err()
        .unwrap();
    assert!(matches!(err, Error::TypeError(_)));

    let err = compiler
        .compile(&DataType::list(DataType::Custom("Handle".into())))
        .err()
        .unwrap();
    assert!(matches!(err, Error::Unsupported(_)));

    let pending = compiler.declare("Pending", StructuralKind::Record).unwrap();
    let err = compiler
        .compile(&DataType::structural(pending))
        .err()
        .unwrap();
    assert!(err.to_string().contains("never defined"));
}

#[test]
fn test_failed_member_does_not_poison_later_compiles() {
    let mut compiler = CodecCompiler::default();
    let node = compiler.declare("Broken", StructuralKind::Record).unwrap();
    compiler
        .define(
            node,
            vec![
                Property::new("next", DataType::structural(node)),
                Property::new("handle", DataType::Custom("Handle".into())),
            ],
        )
        .unwrap();
    assert!(compiler.compile(&DataType::structural(node)).is_err());
    assert!(compiler.compile(&DataType::structural(node)).is_err());

    let good = tree(&mut compiler);
    assert!(compiler.compile(&DataType::structural(good)).is_ok());
}

#[test]
fn test_two_node_ring_is_detected() {
    let mut compiler = CodecCompiler::default();
    let link = linked(&mut compiler);
    let codec = compiler.compile(&DataType::structural(link)).unwrap();

    let a = ObjectRef::from_fields([("id", Value::Int32(1))]);
    let b = ObjectRef::from_fields([("id", Value::Int32(2))]);
    a.set("next", b.clone());
    b.set("next", a.clone());
    assert!(matches!(
        codec.serialize(&Value::Object(a.clone())),
        Err(Error::CycleDetected(_))
    ));

    b.set("next", Value::Null);
    let bytes = codec.serialize(&Value::Object(a.clone())).unwrap();
    assert_eq!(codec.deserialize(&bytes).unwrap(), Value::Object(a));
}

#[test]
fn test_chain_at_default_depth_round_trips() {
    let max_depth = Config::default().max_depth as i32;
    let mut compiler = CodecCompiler::default();
    let link = linked(&mut compiler);
    let codec = compiler.compile(&DataType::structural(link)).unwrap();

    let value = chain(max_depth);
    let bytes = codec.serialize(&value).unwrap();
    assert_eq!(codec.deserialize(&bytes).unwrap(), value);
    assert!(matches!(
        codec.serialize(&chain(max_depth + 1)),
        Err(Error::DepthExceed(_))
    ));
}

#[test]
fn test_reused_tiers_recover_after_errors() {
    let mut compiler = CodecCompiler::default().max_depth(4);
    let link = linked(&mut compiler);
    let codec = compiler.compile(&DataType::structural(link)).unwrap();

    let a = ObjectRef::from_fields([("id", Value::Int32(1))]);
    let b = ObjectRef::from_fields([("id", Value::Int32(2))]);
    a.set("next", b.clone());
    b.set("next", a.clone());
    let ring = Value::Object(a);

    let mut permissive = CodecCompiler::default();
    let link = linked(&mut permissive);
    let too_deep = permissive
        .compile(&DataType::structural(link))
        .unwrap()
        .serialize(&chain(6))
        .unwrap();

    let short = codec.serialize(&chain(2)).unwrap();
    let full = codec.serialize(&chain(4)).unwrap();

    let mut exclusive = codec.exclusive();
    for _ in 0..3 {
        let mut out = vec![0xAB];
        assert!(matches!(
            exclusive.serialize_into(&ring, &mut out),
            Err(Error::CycleDetected(_))
        ));
        assert_eq!(out, [0xAB]);
        assert_eq!(exclusive.serialize(&chain(2)).unwrap(), short);
        assert!(matches!(
            exclusive.serialize(&chain(5)),
            Err(Error::DepthExceed(_))
        ));
        assert_eq!(exclusive.serialize(&chain(4)).unwrap(), full);
        assert!(matches!(
            exclusive.deserialize(&too_deep),
            Err(Error::DepthExceed(_))
        ));
        assert_eq!(exclusive.deserialize(&full).unwrap(), chain(4));
    }

    let shared = codec.shared();
    for _ in 0..3 {
        assert!(matches!(
            shared.serialize(&ring),
            Err(Error::CycleDetected(_))
        ));
        assert_eq!(shared.serialize(&chain(2)).unwrap(), short);
        assert!(matches!(
            shared.serialize(&chain(5)),
            Err(Error::DepthExceed(_))
        ));
        assert_eq!(shared.serialize(&chain(4)).unwrap(), full);
        assert!(matches!(
            shared.deserialize(&too_deep),
            Err(Error::DepthExceed(_))
        ));
        assert_eq!(shared.deserialize(&full).unwrap(), chain(4));
    }

    // break the ring so it is freed
    b.set("next", Value::Null);
}
