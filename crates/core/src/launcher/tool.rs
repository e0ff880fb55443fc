//! Runs the external download tool against a fetched torrent payload.

use reqwest::Client;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::BufReader;
use tokio::process::{Child, ChildStdout, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::{CatalogConfig, DownloaderConfig};
use crate::correlator::TorrentRecord;
use crate::progress::{monitor_output, DownloadProgress, DownloadSession};

use super::error::LaunchError;

/// How long the tool's output may stay open after the tool itself has
/// exited or been killed.
const OUTPUT_DRAIN: Duration = Duration::from_secs(5);

/// A started download tool with its output ready for reading.
#[derive(Debug)]
pub struct RunningDownload {
    child: Child,
    stdout: BufReader<ChildStdout>,
}

impl RunningDownload {
    /// OS process id, if the process is still running.
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Splits into the process handle and its buffered stdout.
    pub fn into_parts(self) -> (Child, BufReader<ChildStdout>) {
        (self.child, self.stdout)
    }
}

/// Result of a download run that exited successfully.
#[derive(Debug, Clone)]
pub struct DownloadOutcome {
    /// Final progress counters.
    pub session: DownloadSession,
    /// Tool exit status.
    pub status: ExitStatus,
}

impl DownloadOutcome {
    pub fn progress(&self) -> DownloadProgress {
        self.session.progress()
    }
}

/// Fetches torrent payloads and drives the download tool.
pub struct DownloadLauncher {
    client: Client,
    config: DownloaderConfig,
}

impl DownloadLauncher {
    /// Creates a launcher whose payload requests follow the catalog's
    /// timeout and user agent.
    pub fn new(config: DownloaderConfig, catalog: &CatalogConfig) -> Result<Self, LaunchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(catalog.timeout_secs as u64))
            .user_agent(catalog.user_agent.clone())
            .build()
            .map_err(|e| LaunchError::Client(e.to_string()))?;

        Ok(Self::with_client(config, client))
    }

    /// Creates a launcher using an existing HTTP client.
    pub fn with_client(config: DownloaderConfig, client: Client) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &DownloaderConfig {
        &self.config
    }

    /// Downloads the .torrent payload behind `record`.
    pub async fn fetch_payload(&self, record: &TorrentRecord) -> Result<Vec<u8>, LaunchError> {
        if record.link.is_empty() {
            return Err(LaunchError::MissingLink);
        }

        info!(url = %record.link, "Requesting");
        let response = self
            .client
            .get(&record.link)
            .send()
            .await
            .map_err(|e| LaunchError::payload_fetch(&record.link, e))?;

        let status = response.status();
        info!(url = %record.link, status = status.as_u16(), "Response");

        if !status.is_success() {
            return Err(LaunchError::PayloadStatus {
                url: record.link.clone(),
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| LaunchError::payload_fetch(&record.link, e))?;

        Ok(body.to_vec())
    }

    /// Writes the payload to the scratch file, replacing any previous one.
    pub async fn write_scratch(&self, payload: &[u8]) -> Result<PathBuf, LaunchError> {
        let path = self.config.scratch_path();

        tokio::fs::create_dir_all(&self.config.scratch_dir)
            .await
            .map_err(|source| LaunchError::ScratchWrite {
                path: self.config.scratch_dir.clone(),
                source,
            })?;

        tokio::fs::write(&path, payload)
            .await
            .map_err(|source| LaunchError::ScratchWrite {
                path: path.clone(),
                source,
            })?;

        debug!(path = %path.display(), bytes = payload.len(), "Scratch file written");
        Ok(path)
    }

    /// Tool arguments: the configured ones followed by the scratch file name.
    fn build_args(&self) -> Vec<String> {
        let mut args = self.config.args.clone();
        args.push(self.config.scratch_file.clone());
        args
    }

    /// Spawns the tool in the scratch directory.
    fn spawn_tool(&self) -> Result<RunningDownload, LaunchError> {
        let args = self.build_args();
        info!(
            program = %self.config.program.display(),
            args = ?args,
            dir = %self.config.scratch_dir.display(),
            "Starting download tool"
        );

        let mut command = Command::new(&self.config.program);
        command
            .args(&args)
            .current_dir(&self.config.scratch_dir)
            .stdin(Stdio::inherit())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        // Own process group, so a timeout can take down helpers the tool
        // spawned (npx runs node as a grandchild).
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                LaunchError::ToolNotFound {
                    program: self.config.program.clone(),
                }
            } else {
                LaunchError::Io(e)
            }
        })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| LaunchError::Io(std::io::Error::other("tool stdout not captured")))?;

        Ok(RunningDownload {
            child,
            stdout: BufReader::new(stdout),
        })
    }

    /// Fetches the payload, writes the scratch file and starts the tool.
    ///
    /// Returns as soon as the process is running.
    pub async fn launch(&self, record: &TorrentRecord) -> Result<RunningDownload, LaunchError> {
        let payload = self.fetch_payload(record).await?;
        self.write_scratch(&payload).await?;
        self.spawn_tool()
    }

    /// Runs a full download: launch, monitor the output until it closes,
    /// wait for the tool to exit.
    ///
    /// Progress updates go to `progress_tx` as they are parsed. A non-zero
    /// exit is an error carrying the last progress seen.
    pub async fn download(
        &self,
        record: &TorrentRecord,
        progress_tx: Option<mpsc::Sender<DownloadProgress>>,
    ) -> Result<DownloadOutcome, LaunchError> {
        let (mut child, stdout) = self.launch(record).await?.into_parts();
        let pid = child.id();

        let monitor = tokio::spawn(monitor_output(stdout, DownloadSession::new(), progress_tx));

        let status = match self.config.timeout_secs {
            Some(timeout_secs) => {
                match timeout(Duration::from_secs(timeout_secs), child.wait()).await {
                    Ok(status) => status?,
                    Err(_) => {
                        warn!(timeout_secs = timeout_secs, "Download tool timed out, killing it");
                        kill_tool(&mut child, pid).await;
                        if let Err(e) = join_monitor(monitor, pid).await {
                            warn!(error = %e, "Progress monitor did not finish after kill");
                        }
                        return Err(LaunchError::Timeout { timeout_secs });
                    }
                }
            }
            None => child.wait().await?,
        };

        let session = join_monitor(monitor, pid).await?;

        info!(
            code = ?status.code(),
            expected_kb = session.expected_kb(),
            downloaded_kb = session.downloaded_kb(),
            percent = ?session.percent(),
            "Download tool exited"
        );

        if !status.success() {
            return Err(LaunchError::ToolFailed {
                code: status.code(),
                progress: session.progress(),
            });
        }

        Ok(DownloadOutcome { session, status })
    }
}

/// Kills the tool and everything in its process group.
async fn kill_tool(child: &mut Child, pid: Option<u32>) {
    kill_process_group(pid);
    if let Err(e) = child.kill().await {
        warn!(error = %e, "Failed to kill download tool");
    }
}

#[cfg(unix)]
fn kill_process_group(pid: Option<u32>) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let Some(pid) = pid else {
        return;
    };
    match killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
        Ok(()) => debug!(pgid = pid, "Tool process group killed"),
        // Nothing left in the group.
        Err(nix::errno::Errno::ESRCH) => {}
        Err(e) => warn!(pgid = pid, error = %e, "Failed to kill tool process group"),
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: Option<u32>) {}

/// Waits for the monitor to reach the end of the tool's output.
///
/// Leftover processes holding the output open are killed after
/// `OUTPUT_DRAIN`; if the output still does not close the monitor is
/// aborted.
async fn join_monitor(
    mut monitor: JoinHandle<DownloadSession>,
    pid: Option<u32>,
) -> Result<DownloadSession, LaunchError> {
    let joined = timeout(OUTPUT_DRAIN, &mut monitor).await;
    if let Ok(joined) = joined {
        return joined.map_err(|e| LaunchError::Monitor(e.to_string()));
    }

    warn!(pgid = ?pid, "Tool output still open, killing leftover processes");
    kill_process_group(pid);

    let joined = timeout(OUTPUT_DRAIN, &mut monitor).await;
    match joined {
        Ok(joined) => joined.map_err(|e| LaunchError::Monitor(e.to_string())),
        Err(_) => {
            monitor.abort();
            Err(LaunchError::Monitor("tool output did not close".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn record(link: &str) -> TorrentRecord {
        TorrentRecord {
            link: link.to_string(),
            quality: "1080p".to_string(),
            seeds: Some(12),
        }
    }

    fn launcher_in(dir: &TempDir, config: DownloaderConfig) -> DownloadLauncher {
        let config = DownloaderConfig {
            scratch_dir: dir.path().join("movies"),
            ..config
        };
        DownloadLauncher::new(config, &CatalogConfig::default()).unwrap()
    }

    #[test]
    fn test_build_args_appends_scratch_file() {
        let dir = TempDir::new().unwrap();
        let launcher = launcher_in(&dir, DownloaderConfig::default());
        assert_eq!(
            launcher.build_args(),
            vec!["torrent-dl", "--verbose", "--input", "temp.torrent"]
        );
    }

    #[tokio::test]
    async fn test_fetch_payload_and_write_scratch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/torrent/download/AAA"))
            .respond_with(
                ResponseTemplate::new(200).set_body_bytes(b"d4:infod4:name3:abcee".to_vec()),
            )
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let launcher = launcher_in(&dir, DownloaderConfig::default());

        let payload = launcher
            .fetch_payload(&record(&format!("{}/torrent/download/AAA", server.uri())))
            .await
            .unwrap();
        assert_eq!(payload, b"d4:infod4:name3:abcee");

        let written = launcher.write_scratch(&payload).await.unwrap();
        assert_eq!(written, dir.path().join("movies").join("temp.torrent"));
        assert_eq!(std::fs::read(&written).unwrap(), payload);

        // A second run overwrites the same file.
        launcher.write_scratch(b"new").await.unwrap();
        assert_eq!(std::fs::read(&written).unwrap(), b"new");
    }

    #[tokio::test]
    async fn test_fetch_payload_rejects_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let launcher = launcher_in(&dir, DownloaderConfig::default());
        let err = launcher
            .fetch_payload(&record(&format!("{}/missing", server.uri())))
            .await
            .unwrap_err();
        assert!(matches!(err, LaunchError::PayloadStatus { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_fetch_payload_without_link() {
        let dir = TempDir::new().unwrap();
        let launcher = launcher_in(&dir, DownloaderConfig::default());
        let err = launcher.fetch_payload(&record("")).await.unwrap_err();
        assert!(matches!(err, LaunchError::MissingLink));
    }

    #[tokio::test]
    async fn test_missing_tool_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"payload".to_vec()))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let launcher = launcher_in(
            &dir,
            DownloaderConfig {
                program: PathBuf::from("reelgrab-test-no-such-tool"),
                ..DownloaderConfig::default()
            },
        );
        let err = launcher
            .launch(&record(&format!("{}/t", server.uri())))
            .await
            .unwrap_err();
        assert!(matches!(err, LaunchError::ToolNotFound { .. }));
    }
}
