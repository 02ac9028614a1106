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

use arca_agents::asset_agent::{AssetAgent, LoadState};
use arca_core::asset::naming::name_hash;
use arca_core::asset::{AssetError, AssetHandle, AssetKind, AssetObject, PackageSource};
use arca_core::task::{Promise, Scheduler};
use arca_io::builder::{DependencyTable, GraphBuilder};
use arca_io::map::{write_map_files, MapError};
use arca_io::pack::{PackWriter, PackageBuilder, TargetPlatform};
use arca_io::pipeline::generate_from_roots;
use arca_lanes::asset_lane::PackLoadingLane;
use std::cell::RefCell;
use std::collections::HashSet;
use std::fs;
use std::rc::Rc;

// --- Test Setup: a package source that completes on the next tick ---

struct CountingSource {
    scheduler: Rc<Scheduler>,
    failing: HashSet<String>,
    loads: RefCell<Vec<String>>,
    extractions: RefCell<Vec<String>>,
}

impl CountingSource {
    fn new(scheduler: &Rc<Scheduler>) -> Self {
        Self {
            scheduler: Rc::clone(scheduler),
            failing: HashSet::new(),
            loads: RefCell::new(Vec::new()),
            extractions: RefCell::new(Vec::new()),
        }
    }

    fn failing(mut self, package_path: &str) -> Self {
        self.failing.insert(package_path.to_string());
        self
    }

    fn load_count(&self, package_path: &str) -> usize {
        self.loads
            .borrow()
            .iter()
            .filter(|loaded| *loaded == package_path)
            .count()
    }
}

impl PackageSource for CountingSource {
    type Package = String;

    fn load_package(&self, package_path: &str) -> Promise<Option<Rc<String>>> {
        self.loads.borrow_mut().push(package_path.to_string());
        let promise = Promise::new();
        let pending = promise.clone();
        let package = (!self.failing.contains(package_path)).then(|| Rc::new(package_path.to_string()));
        self.scheduler.defer(move || pending.resolve(package));
        promise
    }

    fn extract_asset(
        &self,
        package: &Rc<String>,
        object_name: &str,
        _kind: &AssetKind,
    ) -> Promise<Option<AssetHandle<AssetObject>>> {
        self.extractions.borrow_mut().push(object_name.to_string());
        let promise = Promise::new();
        let pending = promise.clone();
        let object = AssetObject {
            name: object_name.to_string(),
            type_name: "prefab".to_string(),
            bytes: format!("{package}:{object_name}").into_bytes(),
        };
        self.scheduler
            .defer(move || pending.resolve(Some(AssetHandle::new(object))));
        promise
    }
}

/// Hand-encodes a dependency map; asset names are logical names.
fn encode_map(packages: &[(&str, &[i32])], assets: &[(&str, i32)]) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&(packages.len() as i32).to_le_bytes());
    for (path, dependencies) in packages {
        bytes.push(path.len() as u8);
        bytes.extend_from_slice(path.as_bytes());
        bytes.extend_from_slice(&(dependencies.len() as i32).to_le_bytes());
        for index in *dependencies {
            bytes.extend_from_slice(&index.to_le_bytes());
        }
    }
    bytes.extend_from_slice(&(assets.len() as i32).to_le_bytes());
    for (name, index) in assets {
        bytes.extend_from_slice(&name_hash(name).to_le_bytes());
        bytes.extend_from_slice(&index.to_le_bytes());
    }
    bytes
}

type Received = Rc<RefCell<Vec<Option<AssetHandle<AssetObject>>>>>;

fn request(agent: &AssetAgent<CountingSource>, asset_path: &str, received: &Received) {
    let received = Rc::clone(received);
    agent.load_asset(asset_path, AssetKind::Any, false, move |object| {
        received.borrow_mut().push(object)
    });
}

fn ui_and_common() -> Vec<u8> {
    encode_map(
        &[("res/ui.ab", &[]), ("res/common.ab", &[])],
        &[("Res/UI/Main", 0)],
    )
}

// ---

#[test]
fn request_loads_only_the_owning_package() {
    let scheduler = Rc::new(Scheduler::new());
    let agent = AssetAgent::new(CountingSource::new(&scheduler));
    agent.load_dependency_map(&ui_and_common()).unwrap();

    let received: Received = Rc::default();
    request(&agent, "Res/UI/Main.prefab", &received);
    assert!(received.borrow().is_empty());
    scheduler.run_until_idle(16);

    assert_eq!(agent.source().load_count("res/ui.ab"), 1);
    assert_eq!(agent.source().load_count("res/common.ab"), 0);
    let received = received.borrow();
    assert_eq!(received.len(), 1);
    let object = received[0].as_ref().unwrap();
    assert_eq!(object.name, "main");
    assert_eq!(object.bytes, b"res/ui.ab:main");
}

#[test]
fn concurrent_requests_share_one_package_load() {
    let scheduler = Rc::new(Scheduler::new());
    let agent = AssetAgent::new(CountingSource::new(&scheduler));
    agent.load_dependency_map(&ui_and_common()).unwrap();

    let received: Received = Rc::default();
    request(&agent, "Res/UI/Main.prefab", &received);
    request(&agent, "Res/UI/Main.prefab", &received);
    scheduler.run_until_idle(16);

    assert_eq!(agent.source().load_count("res/ui.ab"), 1);
    let received = received.borrow();
    assert_eq!(received.len(), 2);
    assert_eq!(
        received[0].as_ref().unwrap().bytes,
        received[1].as_ref().unwrap().bytes
    );
}

#[test]
fn cached_assets_are_served_without_loading() {
    let scheduler = Rc::new(Scheduler::new());
    let agent = AssetAgent::new(CountingSource::new(&scheduler));
    agent.load_dependency_map(&ui_and_common()).unwrap();

    let received: Received = Rc::default();
    request(&agent, "Res/UI/Main.prefab", &received);
    scheduler.run_until_idle(16);
    assert_eq!(agent.cached_asset_count(), 1);

    request(&agent, "Res/UI/Main.prefab", &received);
    assert_eq!(received.borrow().len(), 2, "cache hit must be synchronous");
    assert!(scheduler.is_idle());
    assert_eq!(agent.source().load_count("res/ui.ab"), 1);
    assert_eq!(agent.source().extractions.borrow().len(), 1);

    let received = received.borrow();
    assert!(AssetHandle::ptr_eq(
        received[0].as_ref().unwrap(),
        received[1].as_ref().unwrap()
    ));
}

#[test]
fn instantiated_requests_get_their_own_copy() {
    let scheduler = Rc::new(Scheduler::new());
    let agent = AssetAgent::new(CountingSource::new(&scheduler));
    agent.load_dependency_map(&ui_and_common()).unwrap();

    let copy = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&copy);
    agent.load_asset("Res/UI/Main.prefab", AssetKind::Any, true, move |object| {
        *sink.borrow_mut() = object
    });
    scheduler.run_until_idle(16);

    let copy = copy.borrow().clone().unwrap();
    let cached = agent.cached("Res/UI/Main.prefab").unwrap();
    assert!(!AssetHandle::ptr_eq(&copy, &cached));
    assert_eq!(*copy, *cached);
}

type Observed = Rc<RefCell<Vec<(String, Vec<Option<LoadState>>)>>>;

/// Requests `asset_path` and records, at delivery time, the state of each of
/// `packages` (the owner and the dependencies it must wait for).
fn request_observing(
    agent: &AssetAgent<CountingSource>,
    asset_path: &str,
    packages: &'static [&'static str],
    seen: &Observed,
) {
    let observer = agent.clone();
    let seen = Rc::clone(seen);
    let label = asset_path.to_string();
    agent.load_asset(asset_path, AssetKind::Any, false, move |object| {
        assert!(object.is_some(), "'{}' was not delivered", label);
        let states = packages
            .iter()
            .map(|package| {
                observer
                    .unit_for_package(package)
                    .and_then(|unit| observer.unit_state(unit))
            })
            .collect();
        seen.borrow_mut().push((label, states));
    });
}

fn settled(seen: &[(String, Vec<Option<LoadState>>)]) -> bool {
    seen.iter().all(|(_, states)| {
        states
            .iter()
            .all(|state| state.is_some_and(LoadState::is_terminal))
    })
}

#[test]
fn dependencies_load_once_and_settle_before_delivery() {
    let scheduler = Rc::new(Scheduler::new());
    let agent = AssetAgent::new(CountingSource::new(&scheduler));
    let map = encode_map(
        &[("res/ui.ab", &[0, 1, 2]), ("res/common.ab", &[]), ("res/hud.ab", &[1])],
        &[("Res/UI/Main", 0), ("Res/Common/Button", 1)],
    );
    agent.load_dependency_map(&map).unwrap();

    let seen: Observed = Rc::default();
    let closure = &["res/ui.ab", "res/common.ab", "res/hud.ab"];
    request_observing(&agent, "Res/UI/Main.prefab", closure, &seen);
    request_observing(&agent, "Res/Common/Button.prefab", &["res/common.ab"], &seen);

    scheduler.tick();
    let ui = agent.unit_for_package("res/ui.ab").unwrap();
    assert_eq!(
        agent.unit_state(ui),
        Some(LoadState::Loading),
        "the owner stays loading while its dependencies are in flight"
    );
    scheduler.run_until_idle(16);

    assert_eq!(agent.source().load_count("res/ui.ab"), 1);
    assert_eq!(agent.source().load_count("res/common.ab"), 1);
    assert_eq!(agent.source().load_count("res/hud.ab"), 1);
    let seen = seen.borrow();
    assert_eq!(seen.len(), 2);
    assert!(settled(&seen), "delivered before dependencies settled: {:?}", *seen);
}

#[test]
fn request_waits_for_a_dependency_already_in_flight() {
    let scheduler = Rc::new(Scheduler::new());
    let agent = AssetAgent::new(CountingSource::new(&scheduler));
    let map = encode_map(
        &[("res/ui.ab", &[1]), ("res/common.ab", &[]), ("res/hud.ab", &[1])],
        &[("Res/UI/Main", 0), ("Res/HUD/Bar", 2)],
    );
    agent.load_dependency_map(&map).unwrap();

    let seen: Observed = Rc::default();
    request_observing(&agent, "Res/UI/Main.prefab", &["res/ui.ab", "res/common.ab"], &seen);
    request_observing(&agent, "Res/HUD/Bar.prefab", &["res/hud.ab", "res/common.ab"], &seen);

    // Both owners are open; the shared dependency was started by the first
    // and the second is waiting on it.
    scheduler.tick();
    let common = agent.unit_for_package("res/common.ab").unwrap();
    let hud = agent.unit_for_package("res/hud.ab").unwrap();
    assert_eq!(agent.unit_state(common), Some(LoadState::Loading));
    assert_eq!(agent.unit_state(hud), Some(LoadState::Loading));
    assert_eq!(agent.source().load_count("res/common.ab"), 1);

    scheduler.run_until_idle(16);

    assert_eq!(agent.source().load_count("res/common.ab"), 1);
    let seen = seen.borrow();
    assert_eq!(seen.len(), 2);
    assert!(settled(&seen), "delivered before dependencies settled: {:?}", *seen);
}

#[test]
fn owner_requested_while_loading_as_a_dependency_waits_for_its_own_dependencies() {
    let scheduler = Rc::new(Scheduler::new());
    let agent = AssetAgent::new(CountingSource::new(&scheduler));
    let map = encode_map(
        &[("res/ui.ab", &[1]), ("res/common.ab", &[2]), ("res/hud.ab", &[])],
        &[("Res/UI/Main", 0), ("Res/Common/Button", 1)],
    );
    agent.load_dependency_map(&map).unwrap();

    let seen: Observed = Rc::default();
    request_observing(&agent, "Res/UI/Main.prefab", &["res/ui.ab"], &seen);
    scheduler.tick();
    // common is now loading as ui's dependency.
    let common = agent.unit_for_package("res/common.ab").unwrap();
    assert_eq!(agent.unit_state(common), Some(LoadState::Loading));
    request_observing(
        &agent,
        "Res/Common/Button.prefab",
        &["res/common.ab", "res/hud.ab"],
        &seen,
    );
    scheduler.run_until_idle(16);

    assert_eq!(agent.source().load_count("res/common.ab"), 1);
    assert_eq!(agent.source().load_count("res/hud.ab"), 1);
    let seen = seen.borrow();
    assert_eq!(seen.len(), 2);
    assert!(settled(&seen), "delivered before dependencies settled: {:?}", *seen);
}

#[test]
fn reloading_the_map_recomputes_dependencies() {
    let scheduler = Rc::new(Scheduler::new());
    let agent = AssetAgent::new(CountingSource::new(&scheduler));
    let before = encode_map(
        &[("res/ui.ab", &[])],
        &[("Res/UI/Main", 0), ("Res/UI/Other", 0)],
    );
    agent.load_dependency_map(&before).unwrap();

    let received: Received = Rc::default();
    request(&agent, "Res/UI/Main.prefab", &received);
    scheduler.run_until_idle(16);
    assert_eq!(agent.source().load_count("res/hud.ab"), 0);

    let after = encode_map(
        &[("res/ui.ab", &[1]), ("res/hud.ab", &[])],
        &[("Res/UI/Main", 0), ("Res/UI/Other", 0)],
    );
    agent.load_dependency_map(&after).unwrap();
    request(&agent, "Res/UI/Other.prefab", &received);
    scheduler.run_until_idle(16);

    assert_eq!(agent.source().load_count("res/ui.ab"), 1);
    assert_eq!(agent.source().load_count("res/hud.ab"), 1);
    assert_eq!(received.borrow().len(), 2);
    assert!(received.borrow().iter().all(Option::is_some));
    let hud = agent.unit_for_package("res/hud.ab").unwrap();
    assert_eq!(agent.unit_state(hud), Some(LoadState::Loaded));
}

#[test]
fn failed_package_delivers_none_and_is_not_retried() {
    let scheduler = Rc::new(Scheduler::new());
    let agent = AssetAgent::new(CountingSource::new(&scheduler).failing("res/ui.ab"));
    agent.load_dependency_map(&ui_and_common()).unwrap();

    let received: Received = Rc::default();
    request(&agent, "Res/UI/Main.prefab", &received);
    scheduler.run_until_idle(16);
    request(&agent, "Res/UI/Main.prefab", &received);
    scheduler.run_until_idle(16);

    assert_eq!(agent.source().load_count("res/ui.ab"), 1);
    assert_eq!(received.borrow().len(), 2);
    assert!(received.borrow().iter().all(Option::is_none));
    let unit = agent.resolve("Res/UI/Main.prefab").unwrap();
    assert_eq!(agent.unit_state(unit), Some(LoadState::Failed));
    assert_eq!(agent.cached_asset_count(), 0);
}

#[test]
fn failed_dependency_does_not_block_the_request() {
    let scheduler = Rc::new(Scheduler::new());
    let agent = AssetAgent::new(CountingSource::new(&scheduler).failing("res/common.ab"));
    let map = encode_map(
        &[("res/ui.ab", &[1]), ("res/common.ab", &[])],
        &[("Res/UI/Main", 0)],
    );
    agent.load_dependency_map(&map).unwrap();

    let received: Received = Rc::default();
    request(&agent, "Res/UI/Main.prefab", &received);
    scheduler.run_until_idle(16);

    assert!(received.borrow()[0].is_some());
    let common = agent.unit_for_package("res/common.ab").unwrap();
    assert_eq!(agent.unit_state(common), Some(LoadState::Failed));
}

#[test]
fn resolve_is_identity_stable() {
    let scheduler = Rc::new(Scheduler::new());
    let agent = AssetAgent::new(CountingSource::new(&scheduler));
    agent.load_dependency_map(&ui_and_common()).unwrap();

    let first = agent.resolve("Res/UI/Main.prefab").unwrap();
    assert_eq!(agent.resolve("Res/UI/Main.prefab").unwrap(), first);
    assert_eq!(agent.resolve("Res/UI/Main").unwrap(), first);
    assert_eq!(agent.unit_path(first).as_deref(), Some("res/ui.ab"));
    assert_eq!(agent.unit_state(first), Some(LoadState::NotStarted));
    assert_eq!(agent.unit_count(), 1);
}

#[test]
fn unresolved_and_unsupported_requests_deliver_none() {
    let scheduler = Rc::new(Scheduler::new());
    let agent = AssetAgent::new(CountingSource::new(&scheduler));
    agent.load_dependency_map(&ui_and_common()).unwrap();

    assert!(matches!(
        agent.resolve("Res/UI/Missing.prefab"),
        Err(AssetError::Unresolved { .. })
    ));

    let received: Received = Rc::default();
    request(&agent, "Res/UI/Missing.prefab", &received);
    let sink = Rc::clone(&received);
    agent.load_asset("Res/UI/Main.unity", AssetKind::Scene, false, move |object| {
        sink.borrow_mut().push(object)
    });

    assert_eq!(received.borrow().len(), 2);
    assert!(received.borrow().iter().all(Option::is_none));
    assert!(agent.source().loads.borrow().is_empty());
}

#[test]
fn corrupt_map_leaves_the_agent_without_a_map() {
    let scheduler = Rc::new(Scheduler::new());
    let agent = AssetAgent::new(CountingSource::new(&scheduler));
    agent.load_dependency_map(&ui_and_common()).unwrap();
    assert_eq!(agent.package_count(), 2);

    let bytes = ui_and_common();
    assert!(matches!(
        agent.load_dependency_map(&bytes[..bytes.len() - 3]),
        Err(MapError::Corrupt { .. })
    ));
    assert!(!agent.has_map());
    assert_eq!(agent.package_count(), 0);
    assert_eq!(
        agent.resolve("Res/UI/Main.prefab"),
        Err(AssetError::NoMapLoaded)
    );

    assert!(matches!(
        agent.load_dependency_map(&[]),
        Err(MapError::Corrupt { .. })
    ));
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        agent.load_dependency_map_file(dir.path().join("missing.ab")),
        Err(MapError::NotFound(_))
    ));
}

#[test]
fn loads_real_packs_through_the_lane() {
    let project = tempfile::tempdir().unwrap();
    let root = project.path();
    for (path, bytes) in [
        ("Assets/Res/UI/Main.prefab", &b"main window"[..]),
        ("Assets/Res/Common/Atlas.png", &b"atlas"[..]),
    ] {
        let full = root.join(path);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(full, bytes).unwrap();
    }

    let table = DependencyTable::new()
        .with("Assets/Res/UI/Main.prefab", ["Assets/Res/Common/Atlas.png"]);
    let generated =
        generate_from_roots(GraphBuilder::new(table), &["Assets/Res/UI/Main.prefab"]).unwrap();
    let (map_path, _) =
        write_map_files(root.join("DependenciesMap"), "dependenciesMap.ab", &generated.map)
            .unwrap();
    let out = root.join("AssetBundles");
    PackWriter::new(root)
        .build_packages(&out, &generated.packages, TargetPlatform::Linux64)
        .unwrap();

    let scheduler = Rc::new(Scheduler::new());
    let lane = PackLoadingLane::new([out.join("StandaloneLinux64")], Rc::clone(&scheduler));
    let agent = AssetAgent::new(lane);
    agent.load_dependency_map_file(&map_path).unwrap();

    let loaded = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&loaded);
    agent.load_asset(
        "Assets/Res/UI/Main.prefab",
        AssetKind::of("prefab"),
        false,
        move |object| *sink.borrow_mut() = object,
    );
    scheduler.run_until_idle(32);

    let object = loaded.borrow().clone().unwrap();
    assert_eq!(object.bytes, b"main window");
    let common = agent.unit_for_package("res/common.ab").unwrap();
    assert_eq!(agent.unit_state(common), Some(LoadState::Loaded));
}
