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

//! Arca runtime host.
//!
//! Loads a dependency map, requests each asset given on the command line
//! through the asset agent, and ticks the scheduler until every request has
//! settled.

use anyhow::{bail, Context, Result};
use arca_agents::asset_agent::AssetAgent;
use arca_core::asset::AssetKind;
use arca_core::task::Scheduler;
use arca_lanes::asset_lane::PackLoadingLane;
use clap::Parser;
use env_logger::{Builder, Env};
use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;

#[derive(Parser, Debug)]
#[command(name = "arca-runtime", version, about = "Loads packaged assets")]
struct Args {
    /// Binary dependency map.
    #[arg(long)]
    map: PathBuf,

    /// Package roots, searched in the order given.
    #[arg(long = "data", required = true)]
    data: Vec<PathBuf>,

    /// Upper bound on scheduler ticks.
    #[arg(long, default_value_t = 10_000)]
    max_ticks: u64,

    /// Asset paths to load, e.g. `Res/UI/Main.prefab`.
    #[arg(required = true)]
    assets: Vec<String>,
}

fn main() -> Result<()> {
    Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let scheduler = Rc::new(Scheduler::new());
    let lane = PackLoadingLane::new(args.data, Rc::clone(&scheduler));
    let agent = AssetAgent::new(lane);
    agent
        .load_dependency_map_file(&args.map)
        .with_context(|| format!("Failed to load dependency map '{}'", args.map.display()))?;

    let failures = Rc::new(Cell::new(0usize));
    for asset_path in &args.assets {
        let failures = Rc::clone(&failures);
        let requested = asset_path.clone();
        agent.load_asset(asset_path, AssetKind::Any, false, move |object| match object {
            Some(object) => log::info!(
                "Loaded '{}' as {} ({} bytes)",
                requested,
                object.type_name,
                object.bytes.len()
            ),
            None => {
                log::error!("Could not load '{}'", requested);
                failures.set(failures.get() + 1);
            }
        });
    }

    let ticks = scheduler.run_until_idle(args.max_ticks);
    log::info!(
        "Settled after {} ticks: {} assets cached, {} load units",
        ticks,
        agent.cached_asset_count(),
        agent.unit_count()
    );

    if !scheduler.is_idle() {
        bail!("Requests still pending after {} ticks", ticks);
    }
    if failures.get() > 0 {
        bail!("{} of {} assets failed to load", failures.get(), args.assets.len());
    }
    Ok(())
}
