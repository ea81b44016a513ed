use crate::config::EvalSettings;
use crate::model::{RunFailure, RunOutcome};
use crate::parser;
use anyhow::Context;
use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, KillContainerOptions, RemoveContainerOptions,
    StartContainerOptions, WaitContainerOptions,
};
use bollard::Docker;
use futures_util::stream::StreamExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Fixed in-container paths forming the script contract: the sandboxed
/// process reads the input artifact, writes predictions to the output
/// artifact, and may append to the log artifact.
pub const SCRIPT_MOUNT: &str = "/var/model.py";
pub const INPUT_MOUNT: &str = "/var/test_file.csv";
pub const OUTPUT_MOUNT: &str = "/var/submission.csv";
pub const LOG_MOUNT: &str = "/var/logs.txt";

const OUTPUT_HEADER: &str = "id,predicted_run\n";

/// Capability seam over the opaque submitted script: the engine only
/// knows the file-based I/O contract, never the script's internals.
#[async_trait]
pub trait ModelRunner: Send + Sync {
    /// Run one script against one input artifact. Never errors: every
    /// failure mode is classified and carried inside the outcome.
    async fn run(&self, script_path: &Path, input_csv: &Path) -> RunOutcome;
}

/// Runs submissions inside containers created from the one shared base
/// image, with hard resource ceilings and networking disabled.
pub struct DockerSandbox {
    docker: Docker,
    settings: EvalSettings,
}

impl DockerSandbox {
    pub fn connect(settings: EvalSettings) -> anyhow::Result<Self> {
        let docker =
            Docker::connect_with_local_defaults().context("failed to connect to docker daemon")?;
        Ok(Self { docker, settings })
    }

    pub async fn ping(&self) -> anyhow::Result<()> {
        self.docker
            .ping()
            .await
            .context("docker daemon unreachable")?;
        Ok(())
    }

    pub async fn has_base_image(&self) -> bool {
        self.docker.inspect_image(&self.settings.base_image).await.is_ok()
    }

    pub fn base_image(&self) -> &str {
        &self.settings.base_image
    }

    async fn create_container(
        &self,
        script_path: &Path,
        scratch: &Scratch,
    ) -> anyhow::Result<String> {
        let script = script_path.canonicalize().with_context(|| {
            format!("failed to resolve script path {}", script_path.display())
        })?;

        // Script and input are read-only; output and log pre-exist and
        // are writable so the sandboxed process never needs create
        // permission on the host side.
        let binds = vec![
            format!("{}:{}:ro", script.display(), SCRIPT_MOUNT),
            format!("{}:{}:ro", scratch.input.display(), INPUT_MOUNT),
            format!("{}:{}", scratch.output.display(), OUTPUT_MOUNT),
            format!("{}:{}", scratch.log.display(), LOG_MOUNT),
        ];

        let config = Config {
            image: Some(self.settings.base_image.clone()),
            network_disabled: Some(true),
            host_config: Some(bollard::models::HostConfig {
                memory: Some(self.settings.memory_bytes),
                nano_cpus: Some(self.settings.nano_cpus),
                pids_limit: Some(self.settings.pids_limit),
                network_mode: Some("none".to_string()),
                auto_remove: Some(false),
                binds: Some(binds),
                ..Default::default()
            }),
            ..Default::default()
        };

        let name = format!("scorebox-{}", &scratch.run_id[..8]);
        let created = self
            .docker
            .create_container(
                Some(CreateContainerOptions {
                    name: name.as_str(),
                    platform: None,
                }),
                config,
            )
            .await
            .context("failed to create container")?;
        Ok(created.id)
    }

    async fn wait_exit(&self, container_id: &str) -> anyhow::Result<i64> {
        let mut stream = self.docker.wait_container(
            container_id,
            Some(WaitContainerOptions {
                condition: "not-running",
            }),
        );
        match stream.next().await {
            Some(Ok(response)) => Ok(response.status_code),
            // bollard surfaces non-zero exit codes as a dedicated error
            Some(Err(bollard::errors::Error::DockerContainerWaitError { code, .. })) => Ok(code),
            Some(Err(e)) => Err(e).context("container wait failed"),
            None => anyhow::bail!("container wait stream ended unexpectedly"),
        }
    }

    async fn execute(&self, container_id: &str, scratch: &Scratch, start: Instant) -> RunOutcome {
        if let Err(e) = self
            .docker
            .start_container(container_id, None::<StartContainerOptions<String>>)
            .await
        {
            return RunOutcome::failed(
                RunFailure::Runtime(format!("failed to start container: {}", e)),
                "",
                start.elapsed().as_millis() as u64,
            );
        }

        let budget = Duration::from_secs(self.settings.timeout_seconds);
        let exit_code = match tokio::time::timeout(budget, self.wait_exit(container_id)).await {
            Err(_) => {
                // Timed out: force-kill, discard partial output.
                if let Err(e) = self
                    .docker
                    .kill_container(container_id, None::<KillContainerOptions<String>>)
                    .await
                {
                    tracing::warn!(container_id, error = %e, "kill after timeout failed");
                }
                return RunOutcome::failed(
                    RunFailure::Timeout,
                    format!(
                        "container exceeded {}-second timeout and was killed",
                        self.settings.timeout_seconds
                    ),
                    start.elapsed().as_millis() as u64,
                );
            }
            Ok(Err(e)) => {
                return RunOutcome::failed(
                    RunFailure::Runtime(e.to_string()),
                    "",
                    start.elapsed().as_millis() as u64,
                );
            }
            Ok(Ok(code)) => code,
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        let log = std::fs::read_to_string(&scratch.log).unwrap_or_default();

        if exit_code != 0 {
            let detail = if log.is_empty() {
                format!("container exited with code {}", exit_code)
            } else {
                log
            };
            return RunOutcome::failed(RunFailure::ExitCode(exit_code), detail, duration_ms);
        }

        let predictions = parser::parse_output_csv(&scratch.output);
        if predictions.is_empty() {
            let detail = if log.is_empty() {
                "no predictions found in output artifact".to_string()
            } else {
                log
            };
            return RunOutcome::failed(RunFailure::EmptySubmission, detail, duration_ms);
        }

        RunOutcome {
            predictions,
            log,
            duration_ms,
            failure: None,
        }
    }
}

#[async_trait]
impl ModelRunner for DockerSandbox {
    async fn run(&self, script_path: &Path, input_csv: &Path) -> RunOutcome {
        let start = Instant::now();

        if !script_path.exists() {
            return RunOutcome::failed(
                RunFailure::ModelNotFound,
                "no prediction script found for this team",
                0,
            );
        }

        let scratch = match Scratch::prepare(input_csv) {
            Ok(s) => s,
            Err(e) => {
                return RunOutcome::failed(
                    RunFailure::Runtime(e.to_string()),
                    "",
                    start.elapsed().as_millis() as u64,
                );
            }
        };

        let container_id = match self.create_container(script_path, &scratch).await {
            Ok(id) => id,
            Err(e) => {
                return RunOutcome::failed(
                    RunFailure::Runtime(e.to_string()),
                    "",
                    start.elapsed().as_millis() as u64,
                );
            }
        };

        let outcome = self.execute(&container_id, &scratch, start).await;

        // Cleanup epilogue, taken on every path once a container exists.
        // Failures here are logged and suppressed so they never mask the
        // primary result; the scratch dir is removed by its drop guard.
        if let Err(e) = self
            .docker
            .remove_container(
                &container_id,
                Some(RemoveContainerOptions {
                    force: true,
                    ..Default::default()
                }),
            )
            .await
        {
            tracing::warn!(container_id, error = %e, "container removal failed");
        }

        outcome
    }
}

/// Per-invocation scratch directory: the copied input plus pre-created
/// writable output and log artifacts. Uniquely named, exclusively owned,
/// removed on drop.
struct Scratch {
    run_id: String,
    dir: PathBuf,
    input: PathBuf,
    output: PathBuf,
    log: PathBuf,
}

impl Scratch {
    fn prepare(input_csv: &Path) -> anyhow::Result<Self> {
        let run_id = uuid::Uuid::new_v4().simple().to_string();
        let dir = std::env::temp_dir().join(format!("scorebox-run-{}", &run_id[..8]));
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create scratch dir {}", dir.display()))?;

        let input = dir.join("test_file.csv");
        std::fs::copy(input_csv, &input).with_context(|| {
            format!("failed to copy input artifact {}", input_csv.display())
        })?;

        let output = dir.join("submission.csv");
        std::fs::write(&output, OUTPUT_HEADER).context("failed to pre-create output artifact")?;

        let log = dir.join("logs.txt");
        std::fs::write(&log, "").context("failed to pre-create log artifact")?;

        Ok(Self {
            run_id,
            dir,
            input,
            output,
            log,
        })
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_dir_all(&self.dir) {
            tracing::warn!(dir = %self.dir.display(), error = %e, "failed to remove scratch dir");
        }
    }
}
