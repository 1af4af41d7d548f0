// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Personal machine fit-out.
//!
//! Fitout moves a desktop from a Windows installation to a fresh Debian one
//! in two halves:
//!
//! 1. The [`collect`] half runs against the Windows side and stages fonts and
//!    wallpapers into a flat, collision-safe directory tree.
//! 2. The [`provision`] half runs on Debian and applies a catalogue of
//!    idempotent steps: packages, bootloader defaults, staged theme assets,
//!    and desktop preferences.
//!
//! Both halves read the optional [`config`] file, whose default location is
//! given by [`path`].

pub mod collect;
pub mod config;
pub mod path;
pub mod provision;
