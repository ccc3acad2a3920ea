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

use parking_lot::Mutex;
use std::cell::Cell;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};

/// Number of segments in the pool. Using 16 segments to reduce contention.
const NUM_SEGMENTS: usize = 16;

/// Global counter to assign unique IDs to threads for segment selection.
static THREAD_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

thread_local! {
    /// Cached segment index for the current thread.
    static SEGMENT_INDEX: Cell<usize> = Cell::new(
        (THREAD_ID_COUNTER.fetch_add(1, Ordering::Relaxed) as usize) % NUM_SEGMENTS
    );
}

struct Segment<T> {
    items: Mutex<Vec<T>>,
}

impl<T> Segment<T> {
    fn new() -> Self {
        Segment {
            items: Mutex::new(Vec::new()),
        }
    }

    #[inline(always)]
    fn get(&self, factory: &dyn Fn() -> T) -> T {
        // release the lock before running the factory
        let pooled = self.items.lock().pop();
        pooled.unwrap_or_else(factory)
    }

    #[inline(always)]
    fn put(&self, item: T) {
        self.items.lock().push(item);
    }
}

/// A segmented object pool that reduces lock contention by distributing
/// access across multiple segments based on thread ID.
///
/// Items are reset before they go back, so a borrower always sees a clean item whether
/// it was freshly built or reused.
pub struct Pool<T> {
    segments: [Segment<T>; NUM_SEGMENTS],
    factory: Box<dyn Fn() -> T + Send + Sync>,
    reset: fn(&mut T),
}

impl<T> Pool<T> {
    pub fn new<F>(factory: F, reset: fn(&mut T)) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Pool {
            segments: std::array::from_fn(|_| Segment::new()),
            factory: Box::new(factory),
            reset,
        }
    }

    /// Checks an item out of the pool. It is reset and returned when the guard drops,
    /// including during unwinding.
    #[inline(always)]
    pub fn acquire(&self) -> PoolGuard<'_, T> {
        let segment_idx = SEGMENT_INDEX.with(|idx| idx.get());
        let segment = &self.segments[segment_idx];
        PoolGuard {
            item: Some(segment.get(&*self.factory)),
            segment,
            reset: self.reset,
        }
    }

    /// Borrows an item from the pool, executes the handler, and returns the item to the pool.
    #[inline(always)]
    pub fn borrow_mut<R>(&self, handler: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = self.acquire();
        handler(&mut guard)
    }

    /// Number of idle items across all segments.
    pub fn idle_count(&self) -> usize {
        self.segments.iter().map(|s| s.items.lock().len()).sum()
    }
}

pub struct PoolGuard<'a, T> {
    item: Option<T>,
    segment: &'a Segment<T>,
    reset: fn(&mut T),
}

impl<T> Deref for PoolGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        match &self.item {
            Some(item) => item,
            None => unreachable!("pooled item taken before drop"),
        }
    }
}

impl<T> DerefMut for PoolGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        match &mut self.item {
            Some(item) => item,
            None => unreachable!("pooled item taken before drop"),
        }
    }
}

impl<T> Drop for PoolGuard<'_, T> {
    fn drop(&mut self) {
        if let Some(mut item) = self.item.take() {
            (self.reset)(&mut item);
            self.segment.put(item);
        }
    }
}
