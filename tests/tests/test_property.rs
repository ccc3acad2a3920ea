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

use proptest::prelude::*;
use shapecodec_core::buffer::{Reader, Writer};
use shapecodec_core::descriptor::{DataType, PrimitiveKind, Property, StructuralKind};
use shapecodec_core::value::Value;
use shapecodec_core::CodecCompiler;

proptest! {
    #[test]
    fn compact_length_round_trips(n in any::<u32>()) {
        let mut writer = Writer::default();
        writer.write_varuint32(n);
        let expected_len = match n {
            0..=0x7F => 1,
            0x80..=0x3FFF => 2,
            0x4000..=0x1F_FFFF => 3,
            0x20_0000..=0x0FFF_FFFF => 4,
            _ => 5,
        };
        prop_assert_eq!(writer.len(), expected_len);
        let mut reader = Reader::new(writer.as_slice());
        prop_assert_eq!(reader.read_varuint32().unwrap(), n);
        prop_assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn decoding_arbitrary_bytes_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..64)) {
        let mut compiler = CodecCompiler::default();
        let node = compiler.declare("Node", StructuralKind::Record).unwrap();
        compiler
            .define(
                node,
                vec![
                    Property::new("label", DataType::nullable(PrimitiveKind::String)),
                    Property::new("kids", DataType::list(DataType::structural(node))),
                ],
            )
            .unwrap();
        let codec = compiler.compile(&DataType::structural(node)).unwrap();
        let _ = codec.deserialize(&bytes);
    }

    #[test]
    fn strings_round_trip(s in any::<String>()) {
        let compiler = CodecCompiler::default();
        let codec = compiler.compile(&DataType::primitive(PrimitiveKind::String)).unwrap();
        let value = Value::String(s);
        let bytes = codec.serialize(&value).unwrap();
        prop_assert_eq!(codec.deserialize(&bytes).unwrap(), value);
    }

    #[test]
    fn nullable_int64_lists_round_trip(items in proptest::collection::vec(proptest::option::of(any::<i64>()), 0..32)) {
        let compiler = CodecCompiler::default();
        let codec = compiler
            .compile(&DataType::list(DataType::nullable(PrimitiveKind::Int64)))
            .unwrap();
        let value = Value::List(items.into_iter().map(Value::from).collect());
        let bytes = codec.serialize(&value).unwrap();
        prop_assert_eq!(codec.deserialize(&bytes).unwrap(), value);
    }
}
