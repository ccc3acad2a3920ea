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
use chrono::{FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Utc};
use num_enum::{IntoPrimitive, TryFromPrimitive};

pub const TICKS_PER_SECOND: i64 = 10_000_000;
pub const TICKS_PER_MINUTE: i64 = 60 * TICKS_PER_SECOND;

/// Ticks of 9999-12-31T23:59:59.9999999.
pub const MAX_TICKS: i64 = 3_155_378_975_999_999_999;

/// Largest UTC offset a [`DateTimeOffset`] accepts, in minutes.
pub const MAX_OFFSET_MINUTES: i16 = 14 * 60;

const TICKS_MASK: u64 = (1 << 62) - 1;
const KIND_SHIFT: u32 = 62;

pub const EPOCH: NaiveDate = match NaiveDate::from_ymd_opt(1, 1, 1) {
    None => {
        panic!("Unreachable code")
    }
    Some(epoch) => epoch,
};

const MIDNIGHT: NaiveTime = match NaiveTime::from_hms_opt(0, 0, 0) {
    None => {
        panic!("Unreachable code")
    }
    Some(t) => t,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum DateTimeKind {
    #[default]
    Unspecified = 0,
    Utc = 1,
    Local = 2,
}

/// A calendar instant counted in 100 ns ticks since 0001-01-01T00:00:00.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct DateTime {
    ticks: i64,
    kind: DateTimeKind,
}

impl DateTime {
    pub fn new(ticks: i64, kind: DateTimeKind) -> Result<DateTime, Error> {
        if !(0..=MAX_TICKS).contains(&ticks) {
            return Err(Error::invalid_data(format!(
                "DateTime ticks {} out of range",
                ticks
            )));
        }
        Ok(DateTime { ticks, kind })
    }

    pub fn from_naive(naive: NaiveDateTime, kind: DateTimeKind) -> Result<DateTime, Error> {
        let delta = naive.signed_duration_since(NaiveDateTime::new(EPOCH, MIDNIGHT));
        let ticks = delta
            .num_seconds()
            .checked_mul(TICKS_PER_SECOND)
            .and_then(|t| t.checked_add((delta.subsec_nanos() / 100) as i64))
            .ok_or_else(|| Error::invalid_data(format!("DateTime {} out of range", naive)))?;
        DateTime::new(ticks, kind)
    }

    pub fn from_utc(utc: chrono::DateTime<Utc>) -> Result<DateTime, Error> {
        DateTime::from_naive(utc.naive_utc(), DateTimeKind::Utc)
    }

    pub fn to_naive(&self) -> Result<NaiveDateTime, Error> {
        let seconds = TimeDelta::try_seconds(self.ticks / TICKS_PER_SECOND);
        let nanos = TimeDelta::nanoseconds((self.ticks % TICKS_PER_SECOND) * 100);
        seconds
            .and_then(|s| NaiveDateTime::new(EPOCH, MIDNIGHT).checked_add_signed(s + nanos))
            .ok_or_else(|| {
                Error::invalid_data(format!("DateTime ticks {} out of range", self.ticks))
            })
    }

    /// Packs ticks and kind into one 64-bit word: `ticks | kind << 62`.
    pub fn to_binary(&self) -> i64 {
        (self.ticks as u64 | ((u8::from(self.kind) as u64) << KIND_SHIFT)) as i64
    }

    pub fn from_binary(data: i64) -> Result<DateTime, Error> {
        let raw = data as u64;
        let kind = DateTimeKind::try_from((raw >> KIND_SHIFT) as u8).map_err(|_| {
            Error::invalid_data(format!("Invalid DateTime kind bits in 0x{:016X}", raw))
        })?;
        DateTime::new((raw & TICKS_MASK) as i64, kind)
    }

    pub fn ticks(&self) -> i64 {
        self.ticks
    }

    pub fn kind(&self) -> DateTimeKind {
        self.kind
    }

    /// ISO-8601 with seven fractional digits; UTC instants carry a `Z` suffix.
    pub fn to_iso8601(&self) -> Result<String, Error> {
        let naive = self.to_naive()?;
        let mut s = format!(
            "{}.{:07}",
            naive.format("%Y-%m-%dT%H:%M:%S"),
            self.ticks % TICKS_PER_SECOND
        );
        if self.kind == DateTimeKind::Utc {
            s.push('Z');
        }
        Ok(s)
    }

    pub fn parse_iso8601(s: &str) -> Result<DateTime, Error> {
        let (body, kind) = match s.strip_suffix('Z') {
            Some(body) => (body, DateTimeKind::Utc),
            None => (s, DateTimeKind::Unspecified),
        };
        let naive = NaiveDateTime::parse_from_str(body, "%Y-%m-%dT%H:%M:%S%.f")
            .map_err(|e| Error::invalid_data(format!("Invalid DateTime {:?}: {}", s, e)))?;
        DateTime::from_naive(naive, kind)
    }
}

/// A local clock time plus its offset from UTC.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct DateTimeOffset {
    clock_ticks: i64,
    offset_minutes: i16,
}

impl DateTimeOffset {
    pub fn new(clock_ticks: i64, offset_minutes: i16) -> Result<DateTimeOffset, Error> {
        DateTime::new(clock_ticks, DateTimeKind::Unspecified)?;
        if offset_minutes.unsigned_abs() > MAX_OFFSET_MINUTES as u16 {
            return Err(Error::invalid_data(format!(
                "DateTimeOffset offset of {} minutes out of range",
                offset_minutes
            )));
        }
        let utc_ticks = clock_ticks - offset_minutes as i64 * TICKS_PER_MINUTE;
        if !(0..=MAX_TICKS).contains(&utc_ticks) {
            return Err(Error::invalid_data(format!(
                "DateTimeOffset ticks {} with offset {} out of range",
                clock_ticks, offset_minutes
            )));
        }
        Ok(DateTimeOffset {
            clock_ticks,
            offset_minutes,
        })
    }

    pub fn from_chrono(dt: &chrono::DateTime<FixedOffset>) -> Result<DateTimeOffset, Error> {
        let offset_seconds = dt.offset().local_minus_utc();
        if offset_seconds % 60 != 0 {
            return Err(Error::encode_error(format!(
                "DateTimeOffset offset {} is not a whole number of minutes",
                dt.offset()
            )));
        }
        let clock = DateTime::from_naive(dt.naive_local(), DateTimeKind::Unspecified)?;
        DateTimeOffset::new(clock.ticks(), (offset_seconds / 60) as i16)
    }

    pub fn to_chrono(&self) -> Result<chrono::DateTime<FixedOffset>, Error> {
        let offset = FixedOffset::east_opt(self.offset_minutes as i32 * 60).ok_or_else(|| {
            Error::invalid_data(format!("Invalid offset {} minutes", self.offset_minutes))
        })?;
        let naive = self.clock().to_naive()?;
        naive
            .and_local_timezone(offset)
            .single()
            .ok_or_else(|| Error::invalid_data(format!("Invalid local time {}", naive)))
    }

    /// The local clock component, with kind unspecified.
    pub fn clock(&self) -> DateTime {
        DateTime {
            ticks: self.clock_ticks,
            kind: DateTimeKind::Unspecified,
        }
    }

    pub fn offset_minutes(&self) -> i16 {
        self.offset_minutes
    }

    pub fn to_iso8601(&self) -> Result<String, Error> {
        let mut s = self.clock().to_iso8601()?;
        let sign = if self.offset_minutes < 0 { '-' } else { '+' };
        let abs = self.offset_minutes.unsigned_abs();
        s.push_str(&format!("{}{:02}:{:02}", sign, abs / 60, abs % 60));
        Ok(s)
    }

    pub fn parse_iso8601(s: &str) -> Result<DateTimeOffset, Error> {
        let dt = chrono::DateTime::parse_from_rfc3339(s)
            .map_err(|e| Error::invalid_data(format!("Invalid DateTimeOffset {:?}: {}", s, e)))?;
        DateTimeOffset::from_chrono(&dt)
    }
}
