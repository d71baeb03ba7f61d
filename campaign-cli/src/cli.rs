// Copyright (c) The Campaign Engine Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command-line surface (§4.K, §6): four required flags.

use camino::Utf8PathBuf;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "campaign-cli", about = "Runs a campaign test list against a resource pool")]
pub struct Cli {
    /// Root directory of the static setting store.
    #[arg(long)]
    pub setting: Utf8PathBuf,

    /// Path to the top-level test list file.
    #[arg(long)]
    pub testlist: Utf8PathBuf,

    /// Path to the resource pool file.
    #[arg(long)]
    pub resource: Utf8PathBuf,

    /// Identity used to reserve/load the resource pool.
    #[arg(long)]
    pub user: String,

    /// Start the REST facade on this address instead of running synchronously
    /// (§4.K "REST"). Not one of the four required flags; an optional extra mode.
    #[arg(long)]
    pub serve: Option<std::net::SocketAddr>,
}
