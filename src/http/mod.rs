// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Moim

//! # HTTP Client Wrapper
//!
//! Outbound API surface of the client. Injects the bearer token on
//! non-public paths and recovers transparently from an expired token
//! mid-flight: on a 401/403 the wrapper refreshes once and replays the
//! original request once, so the caller never observes the
//! intermediate rejection. A failed refresh escalates to silent logout.
//!
//! Non-auth failures pass through unchanged.

mod client;

pub use client::ApiClient;
