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

use crate::error::Error;
use std::fmt;
use std::str::FromStr;

/// Largest scale a [`Decimal`] can carry.
pub const MAX_SCALE: u8 = 28;

const MAX_MANTISSA: u128 = (1u128 << 96) - 1;
const SCALE_SHIFT: u32 = 16;
const SIGN_MASK: u32 = 0x8000_0000;

/// A 128-bit decimal: 96-bit unsigned magnitude, a power-of-ten scale and a sign.
///
/// The value is `(-1)^negative * mantissa / 10^scale`. Equality is representational, so
/// `1.0` and `1.00` are different values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Decimal {
    lo: u32,
    mid: u32,
    hi: u32,
    flags: u32,
}

impl Decimal {
    pub const ZERO: Decimal = Decimal {
        lo: 0,
        mid: 0,
        hi: 0,
        flags: 0,
    };

    /// Builds a decimal from a signed mantissa and a scale.
    pub fn new(mantissa: i128, scale: u8) -> Result<Decimal, Error> {
        if scale > MAX_SCALE {
            return Err(Error::encode_error(format!(
                "Decimal scale {} exceeds {}",
                scale, MAX_SCALE
            )));
        }
        let magnitude = mantissa.unsigned_abs();
        if magnitude > MAX_MANTISSA {
            return Err(Error::encode_error(format!(
                "Decimal mantissa {} does not fit in 96 bits",
                mantissa
            )));
        }
        let mut flags = (scale as u32) << SCALE_SHIFT;
        if mantissa < 0 {
            flags |= SIGN_MASK;
        }
        Ok(Decimal {
            lo: magnitude as u32,
            mid: (magnitude >> 32) as u32,
            hi: (magnitude >> 64) as u32,
            flags,
        })
    }

    /// Rebuilds a decimal from its four binary words, validating the flags word.
    pub fn from_parts(lo: u32, mid: u32, hi: u32, flags: u32) -> Result<Decimal, Error> {
        let scale = (flags >> SCALE_SHIFT) & 0xFF;
        if flags & !(SIGN_MASK | (0xFF << SCALE_SHIFT)) != 0 || scale > MAX_SCALE as u32 {
            return Err(Error::invalid_data(format!(
                "Invalid decimal flags 0x{:08X}",
                flags
            )));
        }
        Ok(Decimal { lo, mid, hi, flags })
    }

    /// The four binary words `lo, mid, hi, flags`.
    pub fn to_parts(&self) -> [u32; 4] {
        [self.lo, self.mid, self.hi, self.flags]
    }

    pub fn mantissa(&self) -> i128 {
        let magnitude =
            (self.lo as i128) | ((self.mid as i128) << 32) | ((self.hi as i128) << 64);
        if self.is_sign_negative() {
            -magnitude
        } else {
            magnitude
        }
    }

    pub fn scale(&self) -> u8 {
        ((self.flags >> SCALE_SHIFT) & 0xFF) as u8
    }

    pub fn is_sign_negative(&self) -> bool {
        self.flags & SIGN_MASK != 0
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let magnitude = self.mantissa().unsigned_abs().to_string();
        let scale = self.scale() as usize;
        if self.is_sign_negative() {
            f.write_str("-")?;
        }
        if scale == 0 {
            return f.write_str(&magnitude);
        }
        if magnitude.len() <= scale {
            f.write_str("0.")?;
            for _ in magnitude.len()..scale {
                f.write_str("0")?;
            }
            f.write_str(&magnitude)
        } else {
            let (int_part, frac_part) = magnitude.split_at(magnitude.len() - scale);
            write!(f, "{}.{}", int_part, frac_part)
        }
    }
}

impl FromStr for Decimal {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::invalid_data(format!("Invalid decimal literal {:?}", s));
        let (negative, body) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };
        let (int_part, frac_part) = match body.split_once('.') {
            Some((i, f)) => (i, f),
            None => (body, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }
        if !int_part.bytes().chain(frac_part.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        if frac_part.len() > MAX_SCALE as usize {
            return Err(invalid());
        }
        let mut magnitude: u128 = 0;
        for b in int_part.bytes().chain(frac_part.bytes()) {
            magnitude = magnitude
                .checked_mul(10)
                .and_then(|m| m.checked_add((b - b'0') as u128))
                .filter(|m| *m <= MAX_MANTISSA)
                .ok_or_else(invalid)?;
        }
        let mantissa = if negative {
            -(magnitude as i128)
        } else {
            magnitude as i128
        };
        let mut decimal = Decimal::new(mantissa, frac_part.len() as u8).map_err(|_| invalid())?;
        // keep the sign of "-0.0"
        if negative {
            decimal.flags |= SIGN_MASK;
        }
        Ok(decimal)
    }
}
