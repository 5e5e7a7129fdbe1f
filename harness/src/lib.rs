// SPDX-License-Identifier: GPL-3.0-or-later

pub mod args;
pub mod binding;
pub mod catalog;
pub mod config;
pub mod context;
pub mod environment;
pub mod execution;
pub mod matcher;
pub mod modes;
pub mod patch;
pub mod platform;
pub mod runner;
pub mod scenario;
pub mod suites;
