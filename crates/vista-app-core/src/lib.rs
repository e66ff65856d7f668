// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared application services for Vista tools (config, prefs, toasts).
//! Keeps the viewer core and its hosts thin and framework-agnostic.

pub mod config;
pub mod config_port;
pub mod prefs;
pub mod toast;
