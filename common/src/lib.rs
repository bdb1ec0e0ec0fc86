// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.

//! Record types shared by the CRM store and its front ends.
//!
//! Three independent kinds of record exist:
//! - [`Client`]: a customer, unique by email.
//! - [`Task`]: billable work for a client, with a [`TaskStatus`].
//! - [`UserConfig`]: the singleton profile and preferences.
//!
//! Each one knows how to build itself from a lenient JSON object
//! (`from_value`) and how to check its own invariants (`validate`).
pub mod fields;
pub mod validation;

mod client;
mod task;
mod user;

pub use client::{Client, DEFAULT_ALERT_DAYS};
pub use task::{Task, TaskStatus};
pub use user::{Preferences, UserConfig, MAX_ALERT_DAYS, MIN_ALERT_DAYS, USER_ID};
pub use validation::is_valid_email;
