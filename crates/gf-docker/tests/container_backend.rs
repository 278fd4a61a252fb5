//! Container backend tests against an in-memory runtime fake.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::NaiveDate;
use gf_core::{HydrusId, ModflowId, ProjectId, ShapeId};
use gf_docker::{
    ContainerInfo, ContainerRuntime, ContainerSolverRunner, ContainerSpec, ImageInfo, MountPoint,
    RuntimeResult, SolverDeployer, resolve_workspace_volume,
};
use gf_project::{
    ModflowMetadata, ModflowStep, ProjectMetadata, ShapeAssignment, SimulationMode, StepKind,
    WorkspacePaths,
};

#[derive(Default)]
struct State {
    images: HashSet<String>,
    pulled: Vec<(String, String)>,
    containers: HashMap<String, ContainerSpec>,
    started: Vec<String>,
    exit_code: i64,
    mounts: Vec<MountPoint>,
}

#[derive(Default)]
struct MockRuntime {
    state: Mutex<State>,
    waiting: AtomicUsize,
    peak_waiting: AtomicUsize,
}

impl MockRuntime {
    fn with_image(image: &str) -> Self {
        let runtime = Self::default();
        runtime.state.lock().unwrap().images.insert(image.to_owned());
        runtime
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    fn peak_waiting(&self) -> usize {
        self.peak_waiting.load(Ordering::SeqCst)
    }
}

impl ContainerRuntime for MockRuntime {
    fn inspect_image(&self, image: &str) -> RuntimeResult<Option<ImageInfo>> {
        Ok(self.state().images.contains(image).then(|| ImageInfo {
            id: image.to_owned(),
        }))
    }

    fn pull_image(&self, repository: &str, tag: &str) -> RuntimeResult<()> {
        let mut state = self.state();
        state.pulled.push((repository.to_owned(), tag.to_owned()));
        state.images.insert(repository.to_owned());
        Ok(())
    }

    fn inspect_container(&self, name: &str) -> RuntimeResult<Option<ContainerInfo>> {
        let state = self.state();
        Ok(state.containers.contains_key(name).then(|| ContainerInfo {
            name: name.to_owned(),
            running: state.started.iter().any(|started| started == name),
        }))
    }

    fn create_container(&self, spec: &ContainerSpec) -> RuntimeResult<()> {
        self.state().containers.insert(spec.name.clone(), spec.clone());
        Ok(())
    }

    fn start_container(&self, name: &str) -> RuntimeResult<()> {
        self.state().started.push(name.to_owned());
        Ok(())
    }

    fn wait_for_exit(&self, _name: &str) -> RuntimeResult<i64> {
        // Track how many waits overlap, so tests can pin the fan-out cap.
        let waiting = self.waiting.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_waiting.fetch_max(waiting, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(20));
        self.waiting.fetch_sub(1, Ordering::SeqCst);
        Ok(self.state().exit_code)
    }

    fn container_mounts(&self, _name: &str) -> RuntimeResult<Vec<MountPoint>> {
        Ok(self.state().mounts.clone())
    }
}

fn metadata(mode: SimulationMode) -> ProjectMetadata {
    ProjectMetadata {
        project_id: ProjectId::new("p1"),
        start_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
        spin_up: 0,
        simulation_mode: mode,
        modflow_metadata: Some(ModflowMetadata {
            modflow_id: ModflowId::new("mf1"),
            grid_unit: "m".to_owned(),
            steps_info: vec![ModflowStep {
                kind: StepKind::SteadyState,
                duration_days: 10,
            }],
        }),
        shapes_to_hydrus: BTreeMap::from([
            ("s1".into(), ShapeAssignment::Hydrus(HydrusId::new("h1"))),
            ("s2".into(), ShapeAssignment::Hydrus(HydrusId::new("h2"))),
        ]),
        hydrus_to_weather: BTreeMap::new(),
        finished: false,
    }
}

fn runner(runtime: Arc<MockRuntime>, workspace: impl Into<PathBuf>) -> ContainerSolverRunner {
    ContainerSolverRunner::new(runtime, WorkspacePaths::new(workspace), "/srv/workspace")
}

fn temp_workspace(tag: &str) -> PathBuf {
    std::env::temp_dir().join(format!("gf-docker-{tag}-{}", std::process::id()))
}

#[test]
fn missing_image_is_pulled_before_deploy() {
    let runtime = Arc::new(MockRuntime::default());
    let mut metadata = metadata(SimulationMode::SimpleCoupling);
    metadata.shapes_to_hydrus.remove(&ShapeId::new("s2"));

    runner(runtime.clone(), "ws").run_hydrus_models(&metadata).unwrap();

    assert_eq!(
        runtime.state().pulled,
        vec![("watermodelling/hydrus-1d-docker".to_owned(), "latest".to_owned())]
    );
}

#[test]
fn present_image_is_not_pulled() {
    let runtime = Arc::new(MockRuntime::with_image("watermodelling/hydrus-1d-docker"));

    runner(runtime.clone(), "ws")
        .run_hydrus_models(&metadata(SimulationMode::SimpleCoupling))
        .unwrap();

    assert!(runtime.state().pulled.is_empty());
}

#[test]
fn hydrus_fan_out_deploys_one_container_per_model() {
    let runtime = Arc::new(MockRuntime::with_image("watermodelling/hydrus-1d-docker"));

    runner(runtime.clone(), "ws")
        .run_hydrus_models(&metadata(SimulationMode::SimpleCoupling))
        .unwrap();

    let state = runtime.state();
    assert_eq!(state.containers.len(), 2);
    assert_eq!(state.started.len(), 2);
    for model in ["h1", "h2"] {
        let spec = state
            .containers
            .values()
            .find(|spec| spec.name.ends_with(&format!("-hydrus-{model}")))
            .unwrap();
        assert_eq!(spec.image, "watermodelling/hydrus-1d-docker:latest");
        assert_eq!(spec.binds.len(), 1);
        assert_eq!(
            spec.binds[0].host_path,
            format!("/srv/workspace/p1/simulation/hydrus/{model}")
        );
        assert_eq!(spec.binds[0].container_path, "/workspace");
        assert!(!spec.binds[0].read_only);
        assert_eq!(spec.command, None);
    }
}

#[test]
fn hydrus_fan_out_never_exceeds_the_supervision_cap() {
    let runtime = Arc::new(MockRuntime::with_image("watermodelling/hydrus-1d-docker"));
    let mut metadata = metadata(SimulationMode::SimpleCoupling);
    metadata.shapes_to_hydrus = (0..12)
        .map(|i| {
            (
                ShapeId::new(format!("s{i:02}")),
                ShapeAssignment::Hydrus(HydrusId::new(format!("h{i:02}"))),
            )
        })
        .collect();

    runner(runtime.clone(), "ws").run_hydrus_models(&metadata).unwrap();

    assert_eq!(runtime.state().containers.len(), 12);
    let peak = runtime.peak_waiting();
    assert!(peak <= 8, "supervised {peak} containers at once");
}

#[test]
fn feedback_mode_deploys_compound_models() {
    let runtime = Arc::new(MockRuntime::with_image("watermodelling/hydrus-1d-docker"));

    runner(runtime.clone(), "ws")
        .run_hydrus_models(&metadata(SimulationMode::WithFeedback))
        .unwrap();

    let state = runtime.state();
    assert!(
        state
            .containers
            .values()
            .any(|spec| spec.name.ends_with("-hydrus-h1--s1"))
    );
    assert!(
        state
            .containers
            .values()
            .any(|spec| spec.name.ends_with("-hydrus-h2--s2"))
    );
}

#[test]
fn modflow_container_runs_the_solver_against_the_nam_file() {
    let workspace = temp_workspace("modflow");
    let model_dir = workspace.join("p1/simulation/modflow/mf1");
    std::fs::create_dir_all(&model_dir).unwrap();
    std::fs::write(model_dir.join("model.nam"), "").unwrap();

    let runtime = Arc::new(MockRuntime::with_image("mjstealey/docker-modflow"));
    ContainerSolverRunner::new(
        runtime.clone(),
        WorkspacePaths::new(&workspace),
        "/srv/workspace",
    )
    .run_modflow(&metadata(SimulationMode::SimpleCoupling))
    .unwrap();

    let state = runtime.state();
    assert_eq!(state.containers.len(), 1);
    let spec = state.containers.values().next().unwrap();
    assert!(spec.name.ends_with("-modflow-mf1"));
    assert_eq!(spec.image, "mjstealey/docker-modflow:latest");
    assert_eq!(
        spec.command,
        Some(vec!["mf2005".to_owned(), "model.nam".to_owned()])
    );
    assert_eq!(
        spec.binds[0].host_path,
        "/srv/workspace/p1/simulation/modflow/mf1"
    );

    std::fs::remove_dir_all(&workspace).ok();
}

#[test]
fn nonzero_exit_fails_the_stage() {
    let runtime = Arc::new(MockRuntime::with_image("watermodelling/hydrus-1d-docker"));
    runtime.state().exit_code = 137;

    let err = runner(runtime, "ws")
        .run_hydrus_models(&metadata(SimulationMode::SimpleCoupling))
        .unwrap_err();
    assert!(err.to_string().contains("exited with code 137"));
}

#[test]
fn redeploying_through_the_same_deployer_is_idempotent() {
    let runtime = Arc::new(MockRuntime::with_image("watermodelling/hydrus-1d-docker"));
    let deployer = SolverDeployer::new(
        runtime.clone(),
        "watermodelling/hydrus-1d-docker",
        "hydrus",
        "h1",
        "/srv/workspace",
        "p1/simulation/hydrus/h1",
        None,
    );

    deployer.deploy().unwrap();
    deployer.deploy().unwrap();

    let state = runtime.state();
    assert_eq!(state.containers.len(), 1);
    assert_eq!(state.started.len(), 1);
}

#[test]
fn explicit_override_wins_workspace_resolution() {
    let runtime = MockRuntime::default();
    let volume =
        resolve_workspace_volume(&runtime, Some(Path::new("/srv/override")), Some("self"))
            .unwrap();
    assert_eq!(volume, "/srv/override");
}

#[test]
fn own_mounts_are_scanned_past_the_control_socket() {
    let runtime = MockRuntime::default();
    runtime.state().mounts = vec![
        MountPoint {
            source: "/var/run/docker.sock".to_owned(),
            destination: "/var/run/docker.sock".to_owned(),
        },
        MountPoint {
            source: "/home/user/workspace".to_owned(),
            destination: "/workspace".to_owned(),
        },
    ];

    let volume = resolve_workspace_volume(&runtime, None, Some("self")).unwrap();
    assert_eq!(volume, "/home/user/workspace");
}

#[test]
fn resolution_fails_without_any_workspace_mount() {
    let runtime = MockRuntime::default();
    runtime.state().mounts = vec![MountPoint {
        source: "/var/run/docker.sock".to_owned(),
        destination: "/var/run/docker.sock".to_owned(),
    }];

    assert!(resolve_workspace_volume(&runtime, None, Some("self")).is_err());
}
