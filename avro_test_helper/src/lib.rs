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

//! Helpers shared by the unit and integration tests of `avrolight`.

pub mod logger;

use std::fmt::{Debug, Display};

/// Installs the capturing logger used by [`logger::assert_logged`].
///
/// Safe to call from every test; only the first call has an effect.
pub fn init() {
    logger::install();
}

/// An error type for tests.
///
/// Any error converted into it makes the test panic right away, pointing at the line where
/// the `?` operator was used and printing the full error instead of a bare `Err(..)`.
#[derive(Debug)]
pub struct TestError;

impl<T> From<T> for TestError
where
    T: Debug + Display + Send + 'static + std::error::Error,
{
    #[track_caller]
    fn from(value: T) -> Self {
        panic!("{value:?}")
    }
}

/// The result type returned by tests.
pub type TestResult = Result<(), TestError>;
