// SPDX-License-Identifier: Apache-2.0

//! HTTP surface. Handlers are thin async shells over sync `Result` cores
//! dispatched through `support::run_blocking` so rusqlite work stays off
//! the runtime workers; `support::finish` does error mapping, metrics,
//! and request-id stamping uniformly.

pub(crate) mod ai;
pub(crate) mod ops;
pub(crate) mod progress;
pub(crate) mod sessions;
pub(crate) mod students;
pub(crate) mod subjects;
pub(crate) mod support;
pub(crate) mod tutors;
