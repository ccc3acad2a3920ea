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

use crate::buffer::Writer;
use crate::config::Config;
use crate::error::Error;
use crate::resolver::cycle_guard::CycleGuard;
use crate::value::Value;
use log::debug;

/// Mutable state of one encode call.
///
/// Compiled fragments write to `writer`. Structural fields are staged through
/// [`write_staged`](Self::write_staged), which temporarily swaps in a scratch writer so the
/// payload can be measured before it is length-prefixed into the enclosing stream.
pub struct WriteContext {
    pub writer: Writer,
    staging: Vec<Writer>,
    pub guard: CycleGuard,
    config: Config,
    current_depth: u32,
}

impl WriteContext {
    pub fn new(config: Config) -> WriteContext {
        WriteContext {
            writer: Writer::default(),
            staging: Vec::new(),
            guard: CycleGuard::new(),
            config,
            current_depth: 0,
        }
    }

    #[inline(always)]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs `f` against an empty scratch writer, then appends the compact byte length of
    /// what it wrote followed by the bytes themselves. Nothing is appended on error.
    pub fn write_staged(
        &mut self,
        f: impl FnOnce(&mut WriteContext) -> Result<(), Error>,
    ) -> Result<(), Error> {
        let mut scratch = self.staging.pop().unwrap_or_default();
        scratch.reset();
        std::mem::swap(&mut self.writer, &mut scratch);
        let result = f(self);
        std::mem::swap(&mut self.writer, &mut scratch);
        let result = result.and_then(|()| {
            let len = u32::try_from(scratch.len()).map_err(|_| {
                Error::encode_error(format!("Field payload of {} bytes is too large", scratch.len()))
            })?;
            self.writer.write_varuint32(len);
            self.writer.write_bytes(scratch.as_slice());
            Ok(())
        });
        self.staging.push(scratch);
        result
    }

    pub fn inc_depth(&mut self) -> Result<(), Error> {
        self.current_depth += 1;
        if self.current_depth > self.config.max_depth {
            return Err(depth_error(self.config.max_depth, self.current_depth));
        }
        Ok(())
    }

    #[inline(always)]
    pub fn dec_depth(&mut self) {
        self.current_depth = self.current_depth.saturating_sub(1);
    }

    #[inline(always)]
    pub fn depth(&self) -> u32 {
        self.current_depth
    }

    /// Enters one level of a recursive shape: bumps the depth and, for objects, puts the
    /// object on the cycle guard. Pair with [`exit_recursive`](Self::exit_recursive) using
    /// the returned identity.
    pub fn enter_recursive(
        &mut self,
        value: &Value,
        type_name: &str,
    ) -> Result<Option<usize>, Error> {
        self.inc_depth()?;
        let Value::Object(object) = value else {
            return Ok(None);
        };
        let identity = object.identity();
        if !self.guard.enter(identity) {
            debug!(
                "object reference cycle through '{}' at depth {}",
                type_name, self.current_depth
            );
            self.dec_depth();
            return Err(Error::cycle_detected(format!(
                "Object reference cycle detected while writing '{}'",
                type_name
            )));
        }
        Ok(Some(identity))
    }

    #[inline(always)]
    pub fn exit_recursive(&mut self, identity: Option<usize>) {
        if let Some(identity) = identity {
            self.guard.exit(identity);
        }
        self.dec_depth();
    }

    /// Clears per-call state, keeping buffer capacity.
    pub fn reset(&mut self) {
        self.writer.reset();
        self.guard.clear();
        self.current_depth = 0;
    }
}

/// Mutable state of one decode call. The input itself is held by the `Reader` that is
/// passed alongside.
pub struct ReadContext {
    /// Reused buffer for field names read off the wire.
    pub name_scratch: Vec<u16>,
    config: Config,
    current_depth: u32,
}

impl ReadContext {
    pub fn new(config: Config) -> ReadContext {
        ReadContext {
            name_scratch: Vec::new(),
            config,
            current_depth: 0,
        }
    }

    #[inline(always)]
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn inc_depth(&mut self) -> Result<(), Error> {
        self.current_depth += 1;
        if self.current_depth > self.config.max_depth {
            return Err(depth_error(self.config.max_depth, self.current_depth));
        }
        Ok(())
    }

    #[inline(always)]
    pub fn dec_depth(&mut self) {
        self.current_depth = self.current_depth.saturating_sub(1);
    }

    pub fn reset(&mut self) {
        self.name_scratch.clear();
        self.current_depth = 0;
    }
}

#[cold]
fn depth_error(max_depth: u32, current_depth: u32) -> Error {
    Error::depth_exceed(format!(
        "Maximum nesting depth ({}) exceeded. Current depth: {}. \
        Consider increasing max_depth if this is expected.",
        max_depth, current_depth
    ))
}
