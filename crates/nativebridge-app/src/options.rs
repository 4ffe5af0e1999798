// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line options for the demo host.

use std::path::PathBuf;

use clap::Parser;

use nativebridge_core::BridgeConfig;
use nativebridge_core::error::Result;

/// Load `native-lib` and show the text its greeting function returns
#[derive(Parser, Debug, Default, PartialEq, Eq)]
#[command(name = "nativebridge-demo")]
#[command(version)]
pub struct Options {
    /// Serve `native-lib` from the copy linked into this executable
    #[arg(long)]
    pub linked: bool,

    /// Print the registry's module table as JSON after running
    #[arg(long)]
    pub modules: bool,

    /// Bridge configuration file (JSON)
    #[arg(value_name = "CONFIG")]
    pub config: Option<PathBuf>,
}

impl Options {
    /// The configuration file's contents, or defaults without one.
    pub fn bridge_config(&self) -> Result<BridgeConfig> {
        match &self.config {
            Some(path) => BridgeConfig::load(path),
            None => Ok(BridgeConfig::default()),
        }
    }
}
