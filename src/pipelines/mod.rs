// SPDX-License-Identifier: GPL-3.0-only

//! Capture pipelines
//!
//! # Modules
//!
//! - [`photo`]: Still capture sequencing and file output

pub mod photo;
