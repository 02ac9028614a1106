// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Asset build tooling for Arca
// Run with: cargo xtask assets <map|pack|list>

mod commands;
mod helpers;

use anyhow::Result;
use arca_io::manifest::MANIFEST_FILE;
use arca_io::pack::TargetPlatform;
use clap::{Parser, Subcommand};
use env_logger::{Builder, Env};
use helpers::print_error;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "xtask", version, about = "Arca build automation", long_about = None)]
struct Cli {
    /// Asset manifest to read.
    #[arg(long, global = true, default_value = MANIFEST_FILE)]
    manifest: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Asset pipeline commands.
    Assets {
        #[command(subcommand)]
        action: AssetsCommand,
    },
}

#[derive(Subcommand, Debug)]
enum AssetsCommand {
    /// Scan sources and write the binary and text dependency maps.
    Map,
    /// Write the dependency maps and build every package.
    Pack {
        /// Target platform.
        #[arg(long, short, default_value = "windows64")]
        target: TargetPlatform,
    },
    /// Print every package and its members.
    List,
}

fn main() {
    Builder::from_env(Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Assets { action } => match action {
            AssetsCommand::Map => commands::assets::map(&cli.manifest),
            AssetsCommand::Pack { target } => commands::assets::pack(&cli.manifest, target),
            AssetsCommand::List => commands::assets::list(&cli.manifest),
        },
    }
}
