// SPDX-FileCopyrightText: 2026 Calsync Developers
//
// SPDX-License-Identifier: Apache-2.0

//! REST gateways that deliver local changes to a calendar service and fetch remote deltas.

#![warn(
    trivial_casts,
    trivial_numeric_casts,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unsafe_code,
    unstable_features,
    unused_import_braces,
    unused_qualifications,
    clippy::dbg_macro,
    clippy::indexing_slicing,
    clippy::pedantic
)]
#![allow(clippy::module_name_repetitions)]

mod client;
mod config;
mod error;
mod http;
mod wire;

pub use crate::client::{RestGateway, resource_name};
pub use crate::config::{AuthMethod, RemoteConfig};
pub use crate::error::HttpError;
pub use crate::http::HttpClient;
pub use crate::wire::DeltaBody;
