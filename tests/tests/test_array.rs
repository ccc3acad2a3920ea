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

use shapecodec_core::descriptor::{DataType, PrimitiveKind};
use shapecodec_core::error::Error;
use shapecodec_core::value::Value;
use shapecodec_core::CodecCompiler;

fn ints(values: &[i32]) -> Vec<Value> {
    values.iter().copied().map(Value::Int32).collect()
}

#[test]
fn test_array_layout() {
    let compiler = CodecCompiler::default();
    let codec = compiler
        .compile(&DataType::array(DataType::primitive(PrimitiveKind::Int32)))
        .unwrap();
    let bytes = codec.serialize(&Value::Array(ints(&[1, 2, 3]))).unwrap();
    assert_eq!(
        bytes,
        [0x54, 3, 5, 1, 0, 0, 0, 5, 2, 0, 0, 0, 5, 3, 0, 0, 0]
    );
    assert_eq!(codec.deserialize(&bytes).unwrap(), Value::Array(ints(&[1, 2, 3])));
}

#[test]
fn test_array_and_list_flavors() {
    let compiler = CodecCompiler::default();
    let element = DataType::primitive(PrimitiveKind::Int32);
    let array = compiler.compile(&DataType::array(element.clone())).unwrap();
    let list = compiler.compile(&DataType::list(element)).unwrap();

    // either flavor is accepted on encode and the bytes are identical
    let from_list = array.serialize(&Value::List(ints(&[7]))).unwrap();
    let from_array = list.serialize(&Value::Array(ints(&[7]))).unwrap();
    assert_eq!(from_list, from_array);

    // decode materializes what the descriptor asks for
    assert_eq!(array.deserialize(&from_list).unwrap(), Value::Array(ints(&[7])));
    assert_eq!(list.deserialize(&from_list).unwrap(), Value::List(ints(&[7])));
}

#[test]
fn test_null_and_empty_array() {
    let compiler = CodecCompiler::default();
    let codec = compiler
        .compile(&DataType::list(DataType::primitive(PrimitiveKind::String)))
        .unwrap();
    assert_eq!(codec.serialize(&Value::Null).unwrap(), [0xD4]);
    assert_eq!(codec.deserialize(&[0xD4]).unwrap(), Value::Null);
    assert_eq!(codec.serialize(&Value::List(vec![])).unwrap(), [0x54, 0]);
    assert_eq!(codec.deserialize(&[0x54, 0]).unwrap(), Value::List(vec![]));
}

#[test]
fn test_nested_arrays_with_nullable_elements() {
    let compiler = CodecCompiler::default();
    let codec = compiler
        .compile(&DataType::list(DataType::list(DataType::nullable(
            PrimitiveKind::Int16,
        ))))
        .unwrap();
    let value = Value::List(vec![
        Value::List(vec![Value::Int16(1), Value::Null]),
        Value::Null,
        Value::List(vec![]),
    ]);
    let bytes = codec.serialize(&value).unwrap();
    assert_eq!(codec.deserialize(&bytes).unwrap(), value);
}

#[test]
fn test_length_larger_than_input_is_rejected() {
    let compiler = CodecCompiler::default();
    let codec = compiler
        .compile(&DataType::list(DataType::primitive(PrimitiveKind::Int8)))
        .unwrap();
    // claims 0x0FFFFFFF elements, carries two bytes
    let bytes = [0x54, 0xFF, 0xFF, 0xFF, 0x7F, 1, 5];
    assert!(matches!(
        codec.deserialize(&bytes),
        Err(Error::BufferOutOfBound(..))
    ));
}

#[test]
fn test_malformed_compact_length() {
    let compiler = CodecCompiler::default();
    let codec = compiler
        .compile(&DataType::list(DataType::primitive(PrimitiveKind::Int8)))
        .unwrap();
    // six continuation bytes
    let too_long = [0x54, 0x80, 0x80, 0x80, 0x80, 0x80, 0x00];
    assert!(matches!(codec.deserialize(&too_long), Err(Error::InvalidData(_))));
    // fifth byte carries more than four bits
    let overflow = [0x54, 0x80, 0x80, 0x80, 0x80, 0x10];
    assert!(matches!(codec.deserialize(&overflow), Err(Error::InvalidData(_))));
}

#[test]
fn test_element_mismatch_fails_whole_encode() {
    let compiler = CodecCompiler::default();
    let codec = compiler
        .compile(&DataType::array(DataType::primitive(PrimitiveKind::Int32)))
        .unwrap();
    let value = Value::Array(vec![Value::Int32(1), Value::Bool(true)]);
    let mut out = vec![0xAB];
    assert!(matches!(
        codec.serialize_into(&value, &mut out),
        Err(Error::ValueMismatch { .. })
    ));
    assert_eq!(out, [0xAB]);
    assert!(matches!(
        codec.serialize(&Value::Int32(1)),
        Err(Error::ValueMismatch { .. })
    ));
}
