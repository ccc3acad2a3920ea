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

//! # PERFORMANCE CRITICAL MODULE
//!
//! Error constructors sit on every buffer read and every tag check. They are marked
//! `#[cold]` so that the successful paths of the compiled codecs stay tight; keep the
//! attributes when adding new constructors.

use std::borrow::Cow;

use thiserror::Error;

use crate::types::TypeCode;

/// Set SHAPECODEC_PANIC_ON_ERROR=1 at compile time to panic where an error is created.
pub const PANIC_ON_ERROR: bool = option_env!("SHAPECODEC_PANIC_ON_ERROR").is_some();

/// Coarse classification of an [`enum@Error`].
///
/// Every failure in this crate is deterministic for a given input, so the kind tells a
/// caller what has to change before a retry can succeed: the shape, the bytes, the object
/// graph, the value, or an external collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// The descriptor cannot be compiled.
    Shape,
    /// The input bytes are not a valid encoding of the expected shape.
    Format,
    /// The object graph contains a reference cycle or nests too deeply.
    Cycle,
    /// The value handed to an encoder does not fit the compiled shape.
    Value,
    /// An expression codec or an I/O sink failed.
    External,
}

/// Error type for codec compilation, encoding and decoding.
///
/// # Always use the constructor functions
///
/// Build errors through [`Error::unexpected_type_code`], [`Error::invalid_data`] and
/// friends rather than the variants. The constructors take anything convertible into
/// `Cow<'static, str>`, and they honour `SHAPECODEC_PANIC_ON_ERROR`:
///
/// ```bash
/// RUST_BACKTRACE=1 SHAPECODEC_PANIC_ON_ERROR=1 cargo test
/// ```
///
/// ```rust
/// use shapecodec_core::error::{Error, ErrorKind};
///
/// let err = Error::invalid_data(format!("bad field at position {}", 7));
/// assert_eq!(err.kind(), ErrorKind::Format);
/// ```
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The tag byte at `position` does not carry the statically expected kind/nullability.
    #[error("Unexpected type code at position {position}: expected 0x{expected:02X}, found 0x{actual:02X}")]
    UnexpectedTypeCode {
        expected: u8,
        actual: u8,
        position: usize,
    },

    /// Read past the end of the input.
    #[error("Buffer out of bound: {0} + {1} > {2}")]
    BufferOutOfBound(usize, usize, usize),

    /// Malformed or inconsistent encoded data.
    #[error("{0}")]
    InvalidData(Cow<'static, str>),

    /// A whole-buffer decode finished before the end of the input.
    #[error("{remaining} trailing byte(s) after the decoded value at position {position}")]
    TrailingBytes { remaining: usize, position: usize },

    /// A value cannot be encoded (null for a non-nullable shape, enum out of range, ...).
    #[error("{0}")]
    EncodeError(Cow<'static, str>),

    /// A value variant does not match the compiled shape.
    #[error("Expected a {expected} value, got {actual}")]
    ValueMismatch {
        expected: Cow<'static, str>,
        actual: Cow<'static, str>,
    },

    /// The descriptor uses a feature this compiler cannot handle.
    #[error("{0}")]
    Unsupported(Cow<'static, str>),

    /// The descriptor is ill-formed or refers to an unknown type.
    #[error("{0}")]
    TypeError(Cow<'static, str>),

    /// The same object was reached again while it was still being encoded.
    #[error("{0}")]
    CycleDetected(Cow<'static, str>),

    /// Maximum nesting depth exceeded.
    #[error("{0}")]
    DepthExceed(Cow<'static, str>),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Failure reported by a collaborator such as an expression codec.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Unsupported(_) | Error::TypeError(_) => ErrorKind::Shape,
            Error::UnexpectedTypeCode { .. }
            | Error::BufferOutOfBound(..)
            | Error::InvalidData(_)
            | Error::TrailingBytes { .. } => ErrorKind::Format,
            Error::CycleDetected(_) | Error::DepthExceed(_) => ErrorKind::Cycle,
            Error::EncodeError(_) | Error::ValueMismatch { .. } => ErrorKind::Value,
            Error::Io(_) | Error::Other(_) => ErrorKind::External,
        }
    }

    /// Creates a new [`Error::UnexpectedTypeCode`].
    ///
    /// # Example
    /// ```
    /// use shapecodec_core::error::Error;
    ///
    /// let err = Error::unexpected_type_code(0x05, 0x0E, 12);
    /// assert!(err.to_string().contains("position 12"));
    /// ```
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn unexpected_type_code(expected: u8, actual: u8, position: usize) -> Self {
        let err = Error::UnexpectedTypeCode {
            expected,
            actual,
            position,
        };
        if PANIC_ON_ERROR {
            panic!("SHAPECODEC_PANIC_ON_ERROR: {}", err);
        }
        err
    }

    /// Creates a new [`Error::BufferOutOfBound`] with the given bounds.
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn buffer_out_of_bound(offset: usize, length: usize, capacity: usize) -> Self {
        let err = Error::BufferOutOfBound(offset, length, capacity);
        if PANIC_ON_ERROR {
            panic!("SHAPECODEC_PANIC_ON_ERROR: {}", err);
        }
        err
    }

    /// Creates a new [`Error::InvalidData`] from a string or static message.
    ///
    /// # Example
    /// ```
    /// use shapecodec_core::error::Error;
    ///
    /// let err = Error::invalid_data("Invalid data format");
    /// let err = Error::invalid_data(format!("Invalid data at position {}", 42));
    /// ```
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn invalid_data<S: Into<Cow<'static, str>>>(s: S) -> Self {
        let err = Error::InvalidData(s.into());
        if PANIC_ON_ERROR {
            panic!("SHAPECODEC_PANIC_ON_ERROR: {}", err);
        }
        err
    }

    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn trailing_bytes(remaining: usize, position: usize) -> Self {
        let err = Error::TrailingBytes {
            remaining,
            position,
        };
        if PANIC_ON_ERROR {
            panic!("SHAPECODEC_PANIC_ON_ERROR: {}", err);
        }
        err
    }

    /// Creates a new [`Error::EncodeError`] from a string or static message.
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn encode_error<S: Into<Cow<'static, str>>>(s: S) -> Self {
        let err = Error::EncodeError(s.into());
        if PANIC_ON_ERROR {
            panic!("SHAPECODEC_PANIC_ON_ERROR: {}", err);
        }
        err
    }

    /// Creates a new [`Error::ValueMismatch`].
    ///
    /// # Example
    /// ```
    /// use shapecodec_core::error::Error;
    ///
    /// let err = Error::value_mismatch("Int32", "String");
    /// assert_eq!(err.to_string(), "Expected a Int32 value, got String");
    /// ```
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn value_mismatch<E, A>(expected: E, actual: A) -> Self
    where
        E: Into<Cow<'static, str>>,
        A: Into<Cow<'static, str>>,
    {
        let err = Error::ValueMismatch {
            expected: expected.into(),
            actual: actual.into(),
        };
        if PANIC_ON_ERROR {
            panic!("SHAPECODEC_PANIC_ON_ERROR: {}", err);
        }
        err
    }

    /// Creates a new [`Error::Unsupported`] from a string or static message.
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn unsupported<S: Into<Cow<'static, str>>>(s: S) -> Self {
        let err = Error::Unsupported(s.into());
        if PANIC_ON_ERROR {
            panic!("SHAPECODEC_PANIC_ON_ERROR: {}", err);
        }
        err
    }

    /// Creates a new [`Error::TypeError`] from a string or static message.
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn type_error<S: Into<Cow<'static, str>>>(s: S) -> Self {
        let err = Error::TypeError(s.into());
        if PANIC_ON_ERROR {
            panic!("SHAPECODEC_PANIC_ON_ERROR: {}", err);
        }
        err
    }

    /// Creates a new [`Error::CycleDetected`] from a string or static message.
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn cycle_detected<S: Into<Cow<'static, str>>>(s: S) -> Self {
        let err = Error::CycleDetected(s.into());
        if PANIC_ON_ERROR {
            panic!("SHAPECODEC_PANIC_ON_ERROR: {}", err);
        }
        err
    }

    /// Creates a new [`Error::DepthExceed`] from a string or static message.
    ///
    /// # Example
    /// ```
    /// use shapecodec_core::error::Error;
    ///
    /// let err = Error::depth_exceed(format!("Depth {} exceeds max {}", 100, 64));
    /// ```
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn depth_exceed<S: Into<Cow<'static, str>>>(s: S) -> Self {
        let err = Error::DepthExceed(s.into());
        if PANIC_ON_ERROR {
            panic!("SHAPECODEC_PANIC_ON_ERROR: {}", err);
        }
        err
    }

    /// Appends the type code name to an [`Error::InvalidData`] message.
    #[inline(never)]
    pub fn enhance_invalid_data(err: Error, code: TypeCode) -> Error {
        if let Error::InvalidData(s) = err {
            let mut msg = s.to_string();
            msg.push_str(" (while reading ");
            msg.push_str(code.name());
            msg.push(')');
            Error::invalid_data(msg)
        } else {
            err
        }
    }
}

/// Ensures a condition is true; otherwise returns an [`enum@Error`].
///
/// # Examples
/// ```
/// use shapecodec_core::ensure;
/// use shapecodec_core::error::Error;
///
/// fn check_len(n: usize) -> Result<(), Error> {
///     ensure!(n > 0, Error::invalid_data("length must be positive"));
///     ensure!(n < 10, "length {} too large", n);
///     Ok(())
/// }
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $msg:literal) => {
        if !$cond {
            return Err($crate::error::Error::invalid_data($msg));
        }
    };
    ($cond:expr, $err:expr) => {
        if !$cond {
            return Err($err);
        }
    };
    ($cond:expr, $fmt:expr, $($arg:tt)*) => {
        if !$cond {
            return Err($crate::error::Error::invalid_data(format!($fmt, $($arg)*)));
        }
    };
}
