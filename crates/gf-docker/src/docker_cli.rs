//! [`ContainerRuntime`] backed by the `docker` command-line client.
//!
//! Used by the headless runner, which talks to a local engine; serious
//! deployments inject their own runtime implementation.

use std::process::Command;

use serde_json::Value;
use tracing::debug;

use crate::runtime::{
    ContainerInfo, ContainerRuntime, ContainerSpec, ImageInfo, MountPoint, RuntimeError,
    RuntimeResult,
};

#[derive(Debug, Default, Clone)]
pub struct DockerCli;

impl DockerCli {
    pub fn new() -> Self {
        Self
    }

    fn run(&self, args: &[&str]) -> RuntimeResult<String> {
        debug!(?args, "docker");
        let output = Command::new("docker")
            .args(args)
            .output()
            .map_err(|err| RuntimeError::new(format!("failed to run docker: {err}")))?;
        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            Err(RuntimeError::new(format!(
                "docker {} failed ({}): {}",
                args.first().copied().unwrap_or_default(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )))
        }
    }

    /// Inspect subcommands exit non-zero for a missing object; map that to
    /// absence instead of an error.
    fn inspect(&self, args: &[&str]) -> RuntimeResult<Option<String>> {
        match self.run(args) {
            Ok(stdout) => Ok(Some(stdout)),
            Err(_) => Ok(None),
        }
    }
}

fn parse_image_id(inspect_json: &str) -> RuntimeResult<String> {
    let value: Value = serde_json::from_str(inspect_json)
        .map_err(|err| RuntimeError::new(format!("malformed image inspect output: {err}")))?;
    value[0]["Id"]
        .as_str()
        .map(str::to_owned)
        .ok_or_else(|| RuntimeError::new("image inspect output carries no id"))
}

fn parse_container_running(inspect_json: &str) -> RuntimeResult<bool> {
    let value: Value = serde_json::from_str(inspect_json)
        .map_err(|err| RuntimeError::new(format!("malformed container inspect output: {err}")))?;
    Ok(value[0]["State"]["Running"].as_bool().unwrap_or(false))
}

fn parse_mounts(mounts_json: &str) -> RuntimeResult<Vec<MountPoint>> {
    let value: Value = serde_json::from_str(mounts_json)
        .map_err(|err| RuntimeError::new(format!("malformed mount list: {err}")))?;
    let mounts = value
        .as_array()
        .ok_or_else(|| RuntimeError::new("mount list is not an array"))?;
    Ok(mounts
        .iter()
        .filter_map(|mount| {
            Some(MountPoint {
                source: mount["Source"].as_str()?.to_owned(),
                destination: mount["Destination"].as_str()?.to_owned(),
            })
        })
        .collect())
}

impl ContainerRuntime for DockerCli {
    fn inspect_image(&self, image: &str) -> RuntimeResult<Option<ImageInfo>> {
        match self.inspect(&["image", "inspect", image])? {
            Some(stdout) => Ok(Some(ImageInfo {
                id: parse_image_id(&stdout)?,
            })),
            None => Ok(None),
        }
    }

    fn pull_image(&self, repository: &str, tag: &str) -> RuntimeResult<()> {
        self.run(&["pull", &format!("{repository}:{tag}")])?;
        Ok(())
    }

    fn inspect_container(&self, name: &str) -> RuntimeResult<Option<ContainerInfo>> {
        match self.inspect(&["container", "inspect", name])? {
            Some(stdout) => Ok(Some(ContainerInfo {
                name: name.to_owned(),
                running: parse_container_running(&stdout)?,
            })),
            None => Ok(None),
        }
    }

    fn create_container(&self, spec: &ContainerSpec) -> RuntimeResult<()> {
        let mut args = vec!["create".to_owned(), "--name".to_owned(), spec.name.clone()];
        for bind in &spec.binds {
            let mode = if bind.read_only { "ro" } else { "rw" };
            args.push("-v".to_owned());
            args.push(format!("{}:{}:{mode}", bind.host_path, bind.container_path));
        }
        args.push(spec.image.clone());
        if let Some(command) = &spec.command {
            args.extend(command.iter().cloned());
        }
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        self.run(&args)?;
        Ok(())
    }

    fn start_container(&self, name: &str) -> RuntimeResult<()> {
        self.run(&["start", name])?;
        Ok(())
    }

    fn wait_for_exit(&self, name: &str) -> RuntimeResult<i64> {
        let stdout = self.run(&["wait", name])?;
        stdout
            .trim()
            .parse()
            .map_err(|_| RuntimeError::new(format!("unexpected wait output: {stdout:?}")))
    }

    fn container_mounts(&self, name: &str) -> RuntimeResult<Vec<MountPoint>> {
        let stdout = self.run(&[
            "container",
            "inspect",
            name,
            "--format",
            "{{json .Mounts}}",
        ])?;
        parse_mounts(&stdout)
    }
}
