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

//! A `log` implementation that records formatted messages per thread, so tests running in
//! parallel only observe their own output.

use log::{LevelFilter, Log, Metadata, Record};
use std::cell::RefCell;
use std::sync::Once;

struct TestLogger;

static LOGGER: TestLogger = TestLogger;
static INSTALL: Once = Once::new();

thread_local! {
    static LOG_MESSAGES: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

impl Log for TestLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        let message = record.args().to_string();
        LOG_MESSAGES.with(|messages| messages.borrow_mut().push(message));
    }

    fn flush(&self) {}
}

pub(crate) fn install() {
    INSTALL.call_once(|| {
        // Another logger may already be installed by the test binary, nothing to do then.
        if log::set_logger(&LOGGER).is_ok() {
            log::set_max_level(LevelFilter::Trace);
        }
    });
}

/// Asserts that `expected` was logged on the current thread and forgets it.
#[track_caller]
pub fn assert_logged(expected: &str) {
    let found = LOG_MESSAGES.with(|messages| {
        let mut messages = messages.borrow_mut();
        match messages.iter().position(|message| message == expected) {
            Some(index) => {
                messages.remove(index);
                true
            }
            None => false,
        }
    });
    assert!(found, "Expected log message '{expected}' was not logged");
}

/// Asserts that `unexpected` was not logged on the current thread.
#[track_caller]
pub fn assert_not_logged(unexpected: &str) {
    LOG_MESSAGES.with(|messages| {
        assert!(
            !messages.borrow().iter().any(|message| message == unexpected),
            "Unexpected log message '{unexpected}' was logged"
        );
    });
}
