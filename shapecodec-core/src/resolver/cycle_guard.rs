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

use std::collections::HashSet;

/// Set of objects currently being written, keyed by pointer address.
///
/// A compiled recursive shape enters an object before writing its fields and exits it
/// afterwards, so the set only ever holds the objects on the current path from the root.
/// Reaching an object that is still on the path is a reference cycle; reaching one that
/// was already finished through a sibling branch is not.
///
/// # Examples
///
/// ```rust
/// use shapecodec_core::resolver::cycle_guard::CycleGuard;
/// use shapecodec_core::value::ObjectRef;
///
/// let mut guard = CycleGuard::new();
/// let shared = ObjectRef::default();
///
/// assert!(guard.enter(shared.identity()));
/// // still on the path: a cycle
/// assert!(!guard.enter(shared.identity()));
/// guard.exit(shared.identity());
/// // finished: a second visit through another branch is fine
/// assert!(guard.enter(shared.identity()));
/// ```
#[derive(Default, Debug)]
pub struct CycleGuard {
    in_progress: HashSet<usize>,
}

impl CycleGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `identity` as in progress. Returns `false` if it already was.
    #[inline(always)]
    pub fn enter(&mut self, identity: usize) -> bool {
        self.in_progress.insert(identity)
    }

    #[inline(always)]
    pub fn exit(&mut self, identity: usize) {
        self.in_progress.remove(&identity);
    }

    pub fn is_empty(&self) -> bool {
        self.in_progress.is_empty()
    }

    pub fn len(&self) -> usize {
        self.in_progress.len()
    }

    /// Clear all tracked identities.
    ///
    /// This is useful for reusing the guard for multiple serialization operations.
    pub fn clear(&mut self) {
        self.in_progress.clear();
    }
}
