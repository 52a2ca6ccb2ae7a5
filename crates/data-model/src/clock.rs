// Copyright 2024 The rp-shell authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Time source of the session state machine.

use chrono::{DateTime, TimeZone, Utc};

/// Gives the time at which state transitions happen
pub trait Clock: Send + Sync {
    /// The current date and time
    fn now(&self) -> DateTime<Utc>;
}

/// Reads the system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always gives the same instant, so tests get stable timestamps and
/// identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockClock {
    instant: DateTime<Utc>,
}

impl MockClock {
    /// A clock stopped at the given instant
    #[must_use]
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self { instant }
    }
}

impl Default for MockClock {
    fn default() -> Self {
        let instant = Utc
            .with_ymd_and_hms(2024, 3, 11, 9, 30, 0)
            .single()
            .unwrap_or_default();
        Self::new(instant)
    }
}

impl Clock for MockClock {
    fn now(&self) -> DateTime<Utc> {
        self.instant
    }
}
