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

/// Configuration for compiled codecs.
///
/// This struct holds the options that control how compiled codecs encode and decode
/// values. It is carried by the `CodecCompiler`, copied into every compiled codec and
/// handed to the `WriteContext`/`ReadContext` of each invocation.
#[derive(Clone, Debug)]
pub struct Config {
    /// Maximum nesting depth through recursive shapes, checked on encode and decode.
    ///
    /// Decoding recurses once per level, so this also bounds the stack a hostile input
    /// can consume. The default fits a 2 MiB thread stack in unoptimized builds; raise
    /// it only for callers running on larger stacks. JSON input may nest at most twice
    /// this deep (and never less than 128 levels).
    pub max_depth: u32,
    /// Whether an unknown field is skipped on decode. When disabled it is a format error.
    pub skip_unknown_fields: bool,
    /// Whether object fields holding `Value::Null` are left out of the encoding.
    pub omit_null_fields: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_depth: 256,
            skip_unknown_fields: true,
            omit_null_fields: false,
        }
    }
}

impl Config {
    /// Creates a new Config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get maximum nesting depth.
    #[inline(always)]
    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// Check if unknown fields are skipped.
    #[inline(always)]
    pub fn is_skip_unknown_fields(&self) -> bool {
        self.skip_unknown_fields
    }

    /// Check if null object fields are omitted.
    #[inline(always)]
    pub fn is_omit_null_fields(&self) -> bool {
        self.omit_null_fields
    }
}
