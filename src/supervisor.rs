use crate::error::{JenkenvError, Result};
use std::io::{pipe, BufRead, BufReader, PipeReader};
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;

/// How long the shutdown sweep gives a child to exit before killing it
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

const SWEEP_POLL_INTERVAL: Duration = Duration::from_secs(1);

struct SupervisedProcess {
    child: Arc<Mutex<Child>>,
    command: String,
    started_at: Instant,
}

/// Every spawned child is tracked here for the lifetime of the invocation.
///
/// `spawn` appends, the shutdown sweep drains; the registry is owned by the
/// composition root and `drain_and_cleanup` is called once on the way out.
#[derive(Clone, Default)]
pub struct ProcessRegistry {
    processes: Arc<Mutex<Vec<SupervisedProcess>>>,
}

impl ProcessRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    async fn register(&self, process: SupervisedProcess) {
        tracing::debug!(command = %process.command, "registering supervised process");
        self.processes.lock().await.push(process);
    }

    /// Give every still-running child the full grace period, then kill it.
    ///
    /// Exit is re-checked every second so a child that finishes during the
    /// grace period is never killed.
    pub async fn drain_and_cleanup(&self) {
        self.sweep(SHUTDOWN_GRACE).await;
    }

    async fn sweep(&self, grace: Duration) {
        let drained: Vec<SupervisedProcess> = {
            let mut processes = self.processes.lock().await;
            processes.drain(..).collect()
        };

        for process in drained {
            let mut waited = Duration::ZERO;
            loop {
                let exited = matches!(process.child.lock().await.try_wait(), Ok(Some(_)));
                if exited {
                    break;
                }
                if waited >= grace {
                    tracing::warn!(
                        command = %process.command,
                        ran_for = ?process.started_at.elapsed(),
                        "child did not exit within grace period; killing"
                    );
                    let _ = process.child.lock().await.kill().await;
                    break;
                }
                tokio::time::sleep(SWEEP_POLL_INTERVAL).await;
                waited += SWEEP_POLL_INTERVAL;
            }
        }
    }
}

/// Handle returned by `spawn`: the merged output stream plus a shared
/// reference to the child for the final wait
pub struct ProcessHandle {
    child: Arc<Mutex<Child>>,
    output: PipeReader,
}

/// Spawns child processes, streams their combined output and propagates
/// their exit status.
pub struct ProcessSupervisor {
    registry: ProcessRegistry,
}

impl ProcessSupervisor {
    pub fn new(registry: ProcessRegistry) -> Self {
        Self { registry }
    }

    /// Start a child with stderr merged into stdout, registering it for the
    /// shutdown sweep before returning.
    ///
    /// Both streams write to the same pipe, so the merged output carries
    /// lines in the order the child produced them.
    pub async fn spawn(
        &self,
        program: &str,
        args: &[String],
        envs: &[(String, String)],
    ) -> Result<ProcessHandle> {
        let command_line = std::iter::once(program.to_string())
            .chain(args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ");

        let (output, writer) = pipe()?;
        let stderr_writer = writer.try_clone()?;

        let mut command = Command::new(program);
        command
            .args(args)
            .stdout(Stdio::from(writer))
            .stderr(Stdio::from(stderr_writer));
        for (key, value) in envs {
            command.env(key, value);
        }

        let child = command.spawn().map_err(|e| JenkenvError::SpawnFailed {
            command: command_line.clone(),
            source: e,
        })?;

        let child = Arc::new(Mutex::new(child));
        self.registry
            .register(SupervisedProcess {
                child: Arc::clone(&child),
                command: command_line,
                started_at: Instant::now(),
            })
            .await;

        Ok(ProcessHandle { child, output })
    }

    /// Forward the child's merged output to the sink line by line as it
    /// arrives, then wait for the child and return its exit status.
    ///
    /// The read loop runs on a blocking task and delivers lines over a
    /// channel; nothing is buffered beyond a single line.
    pub async fn stream_and_wait(
        &self,
        handle: ProcessHandle,
        mut sink: impl FnMut(&str),
    ) -> Result<ExitStatus> {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

        let output = handle.output;
        let reader_task = tokio::task::spawn_blocking(move || -> std::io::Result<()> {
            for line in BufReader::new(output).lines() {
                if tx.send(line?).is_err() {
                    break;
                }
            }
            Ok(())
        });

        while let Some(line) = rx.recv().await {
            sink(&line);
        }

        reader_task.await.map_err(std::io::Error::other)??;

        let status = handle.child.lock().await.wait().await?;
        Ok(status)
    }
}
