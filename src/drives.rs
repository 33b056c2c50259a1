use std::{
    fmt,
    io::{Read, Write},
    path::{Path, PathBuf},
    process::{Command, Stdio},
    sync::mpsc::{self, Receiver, Sender},
    thread,
    time::{Duration, Instant},
};

use serde::Deserialize;

use crate::{
    error::{Error, Result},
    util::format_size,
};

const LSBLK_COLUMNS: &str = "NAME,PATH,TYPE,SIZE,FSUSED,MOUNTPOINT,LABEL,MODEL,FSTYPE";

/// Poll interval while waiting on a helper process
const CHILD_POLL: Duration = Duration::from_millis(25);

// ============================================================================
// Drive model
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Drive {
    pub device: PathBuf,
    pub name: String,
    pub mount_point: Option<PathBuf>,
    pub label: Option<String>,
    pub model: Option<String>,
    pub fs_type: Option<String>,
    pub capacity: u64,
    pub used: Option<u64>,
}

impl Drive {
    pub fn is_mounted(&self) -> bool {
        self.mount_point.is_some()
    }

    pub fn display_name(&self) -> &str {
        self.label
            .as_deref()
            .or(self.model.as_deref())
            .unwrap_or(&self.name)
    }

    pub fn usage_percent(&self) -> Option<u8> {
        let used = self.used?;
        if self.capacity == 0 {
            return None;
        }
        Some(((used as f64 / self.capacity as f64) * 100.0).round().min(100.0) as u8)
    }

    /// `label  size  used%` line for the drives panel
    pub fn summary(&self) -> String {
        let size = if self.capacity == 0 {
            "N/A".to_owned()
        } else {
            format_size(self.capacity)
        };
        match self.usage_percent() {
            Some(pct) if self.is_mounted() => format!("{} {} {}%", self.display_name(), size, pct),
            _ => format!("{} {}", self.display_name(), size),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriveScan {
    pub drives: Vec<Drive>,
    /// The block device tool was missing, refused or timed out
    pub degraded: bool,
}

// ============================================================================
// lsblk parsing
// ============================================================================

#[derive(Deserialize)]
struct LsblkOutput {
    #[serde(default)]
    blockdevices: Vec<LsblkDevice>,
}

/// Older lsblk releases print every column as a string, newer ones use numbers.
#[derive(Deserialize)]
#[serde(untagged)]
enum Bytes {
    Number(u64),
    Text(String),
}

impl Bytes {
    fn value(&self) -> Option<u64> {
        match self {
            Bytes::Number(n) => Some(*n),
            Bytes::Text(s) => s.trim().parse().ok(),
        }
    }
}

#[derive(Deserialize)]
struct LsblkDevice {
    name: String,
    path: Option<String>,
    #[serde(rename = "type")]
    kind: String,
    size: Option<Bytes>,
    fsused: Option<Bytes>,
    mountpoint: Option<String>,
    label: Option<String>,
    model: Option<String>,
    fstype: Option<String>,
    #[serde(default)]
    children: Vec<LsblkDevice>,
}

impl LsblkDevice {
    fn is_listed(&self) -> bool {
        match self.kind.as_str() {
            "part" | "crypt" | "lvm" => true,
            "loop" => self.fstype.is_some(),
            "disk" => self.children.is_empty() && self.fstype.is_some(),
            _ => false,
        }
    }

    fn to_drive(&self) -> Drive {
        let non_empty = |s: &Option<String>| {
            s.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
        };
        Drive {
            device: self
                .path
                .as_deref()
                .map(PathBuf::from)
                .unwrap_or_else(|| Path::new("/dev").join(&self.name)),
            name: self.name.clone(),
            mount_point: non_empty(&self.mountpoint).map(PathBuf::from),
            label: non_empty(&self.label),
            model: non_empty(&self.model),
            fs_type: non_empty(&self.fstype),
            capacity: self.size.as_ref().and_then(Bytes::value).unwrap_or(0),
            used: self.fsused.as_ref().and_then(Bytes::value),
        }
    }

    fn collect(&self, out: &mut Vec<Drive>) {
        if self.is_listed() {
            out.push(self.to_drive());
        }
        for child in &self.children {
            child.collect(out);
        }
    }
}

pub fn parse_lsblk(json: &str) -> Result<Vec<Drive>> {
    let output: LsblkOutput = serde_json::from_str(json)
        .map_err(|e| Error::Unavailable(format!("unexpected lsblk output: {}", e)))?;

    let mut drives = Vec::new();
    for device in &output.blockdevices {
        device.collect(&mut drives);
    }
    drives.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(drives)
}

/// List block devices. Never fails; a broken tool yields a degraded empty scan.
pub fn enumerate(runner: &dyn CommandRunner, timeout: Duration) -> DriveScan {
    let args = ["-J", "-b", "-o", LSBLK_COLUMNS].map(str::to_owned);
    let output = match runner.run("lsblk", &args, None, timeout) {
        Ok(output) if output.success() => output,
        Ok(output) => {
            tracing::warn!("lsblk exited with {:?}: {}", output.code, output.stderr.trim());
            return DriveScan {
                drives: Vec::new(),
                degraded: true,
            };
        }
        Err(e) => {
            tracing::warn!("lsblk unavailable: {}", e);
            return DriveScan {
                drives: Vec::new(),
                degraded: true,
            };
        }
    };

    match parse_lsblk(&output.stdout) {
        Ok(mut drives) => {
            // older lsblk has no FSUSED column
            for drive in drives.iter_mut().filter(|d| d.used.is_none()) {
                let usage = drive.mount_point.as_deref().and_then(disk_usage);
                if let Some((total, available)) = usage {
                    drive.used = Some(total.saturating_sub(available));
                }
            }
            DriveScan {
                drives,
                degraded: false,
            }
        }
        Err(e) => {
            tracing::warn!("{}", e);
            DriveScan {
                drives: Vec::new(),
                degraded: true,
            }
        }
    }
}

/// Total and available bytes of the filesystem holding `path`
#[cfg(unix)]
pub fn disk_usage(path: &Path) -> Option<(u64, u64)> {
    use std::{ffi::CString, mem::MaybeUninit, os::unix::ffi::OsStrExt};

    let c_path = CString::new(path.as_os_str().as_bytes()).ok()?;
    let mut stat: MaybeUninit<libc::statvfs> = MaybeUninit::uninit();
    // SAFETY: c_path is a valid NUL-terminated string and stat is writable
    let result = unsafe { libc::statvfs(c_path.as_ptr(), stat.as_mut_ptr()) };
    if result != 0 {
        return None;
    }
    // SAFETY: statvfs returned 0, so the struct is initialized
    let stat = unsafe { stat.assume_init() };
    let total = stat.f_blocks as u64 * stat.f_frsize as u64;
    let available = stat.f_bavail as u64 * stat.f_frsize as u64;
    Some((total, available))
}

#[cfg(not(unix))]
pub fn disk_usage(_path: &Path) -> Option<(u64, u64)> {
    None
}

// ============================================================================
// Process execution
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs external programs. Swapped out in tests.
pub trait CommandRunner: Send + Sync {
    fn run(
        &self,
        program: &str,
        args: &[String],
        stdin: Option<&str>,
        timeout: Duration,
    ) -> Result<CommandOutput>;
}

/// Spawns real processes with piped stdio and a hard deadline.
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(
        &self,
        program: &str,
        args: &[String],
        stdin: Option<&str>,
        timeout: Duration,
    ) -> Result<CommandOutput> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::Unavailable(format!("{}: {}", program, e)))?;

        if let Some(mut pipe) = child.stdin.take() {
            if let Some(input) = stdin {
                let _ = pipe.write_all(input.as_bytes());
                let _ = pipe.write_all(b"\n");
            }
            // dropping the pipe closes stdin
        }

        let stdout = spawn_reader(child.stdout.take());
        let stderr = spawn_reader(child.stderr.take());

        let deadline = Instant::now() + timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if Instant::now() >= deadline => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(Error::Timeout(format!(
                        "{} did not finish within {}s",
                        program,
                        timeout.as_secs()
                    )));
                }
                Ok(None) => thread::sleep(CHILD_POLL),
                Err(e) => return Err(Error::Unavailable(format!("{}: {}", program, e))),
            }
        };

        Ok(CommandOutput {
            code: status.code(),
            stdout: stdout.join().unwrap_or_default(),
            stderr: stderr.join().unwrap_or_default(),
        })
    }
}

fn spawn_reader<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut text = String::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_string(&mut text);
        }
        text
    })
}

// ============================================================================
// Privileged mount helper
// ============================================================================

/// A password typed into the mount modal. Never printed.
pub struct Secret(String);

impl Secret {
    pub fn new(text: String) -> Self {
        Self(text)
    }

    fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountAction {
    Mount,
    Unmount,
}

impl MountAction {
    fn verb(self) -> &'static str {
        match self {
            MountAction::Mount => "mount",
            MountAction::Unmount => "unmount",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MountResult {
    Succeeded(Option<PathBuf>),
    Failed { code: Option<i32>, diagnostic: String },
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HelperOutcome {
    Done(MountResult),
    /// No cached sudo credential; ask the user
    NeedsPassword,
}

pub struct MountHelper<'a> {
    runner: &'a dyn CommandRunner,
    timeout: Duration,
}

impl<'a> MountHelper<'a> {
    pub fn new(runner: &'a dyn CommandRunner, timeout: Duration) -> Self {
        Self { runner, timeout }
    }

    fn udisks_args(action: MountAction, drive: &Drive) -> Vec<String> {
        vec![
            action.verb().to_owned(),
            "--block-device".to_owned(),
            drive.device.display().to_string(),
            "--no-user-interaction".to_owned(),
        ]
    }

    /// Run one helper step. With no secret this tries udisksctl, then a cached
    /// sudo credential. With a secret it feeds it to `sudo -S` exactly once.
    pub fn run(&self, action: MountAction, drive: &Drive, secret: Option<Secret>) -> HelperOutcome {
        let udisks = Self::udisks_args(action, drive);

        if let Some(secret) = secret {
            let mut args: Vec<String> = ["-S", "-k", "-p", "", "udisksctl"]
                .map(str::to_owned)
                .to_vec();
            args.extend(udisks);
            tracing::info!("sudo udisksctl {} {}", action.verb(), drive.device.display());
            let result = self.invoke("sudo", &args, Some(secret.expose()), action, drive);
            drop(secret);
            return HelperOutcome::Done(result);
        }

        tracing::info!("udisksctl {} {}", action.verb(), drive.device.display());
        let first = match self.runner.run("udisksctl", &udisks, None, self.timeout) {
            Ok(output) => output,
            Err(e) => return HelperOutcome::Done(failure_from_error(e)),
        };
        if first.success() {
            return HelperOutcome::Done(success(action, drive, &first.stdout));
        }
        if !is_authorization_failure(&first.stderr) {
            return HelperOutcome::Done(MountResult::Failed {
                code: first.code,
                diagnostic: first_line(&first.stderr),
            });
        }

        let probe = ["-n", "true"].map(str::to_owned);
        let cached = matches!(
            self.runner.run("sudo", &probe, None, self.timeout),
            Ok(output) if output.success()
        );
        if !cached {
            return HelperOutcome::NeedsPassword;
        }

        let mut args = vec!["-n".to_owned(), "udisksctl".to_owned()];
        args.extend(udisks);
        tracing::info!("sudo -n udisksctl {} {}", action.verb(), drive.device.display());
        HelperOutcome::Done(self.invoke("sudo", &args, None, action, drive))
    }

    fn invoke(
        &self,
        program: &str,
        args: &[String],
        stdin: Option<&str>,
        action: MountAction,
        drive: &Drive,
    ) -> MountResult {
        match self.runner.run(program, args, stdin, self.timeout) {
            Ok(output) if output.success() => success(action, drive, &output.stdout),
            Ok(output) => MountResult::Failed {
                code: output.code,
                diagnostic: if is_bad_password(&output.stderr) {
                    "incorrect password".to_owned()
                } else {
                    first_line(&output.stderr)
                },
            },
            Err(e) => failure_from_error(e),
        }
    }
}

fn success(action: MountAction, drive: &Drive, stdout: &str) -> MountResult {
    match action {
        MountAction::Mount => MountResult::Succeeded(parse_mount_point(stdout)),
        MountAction::Unmount => MountResult::Succeeded(drive.mount_point.clone()),
    }
}

fn failure_from_error(e: Error) -> MountResult {
    MountResult::Failed {
        code: None,
        diagnostic: e.to_string(),
    }
}

/// `Mounted /dev/sdb1 at /media/user/USB.` -> `/media/user/USB`
pub fn parse_mount_point(stdout: &str) -> Option<PathBuf> {
    let (_, rest) = stdout.trim().rsplit_once(" at ")?;
    let path = rest.trim().trim_end_matches('.');
    (!path.is_empty()).then(|| PathBuf::from(path))
}

fn is_authorization_failure(stderr: &str) -> bool {
    let lower = stderr.to_lowercase();
    lower.contains("not authorized")
        || lower.contains("notauthorized")
        || lower.contains("permission denied")
        || lower.contains("authentication")
}

fn is_bad_password(stderr: &str) -> bool {
    let lower = stderr.to_lowercase();
    lower.contains("incorrect password")
        || lower.contains("try again")
        || lower.contains("authentication failure")
}

fn first_line(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("helper failed")
        .to_owned()
}

// ============================================================================
// Drive worker
// ============================================================================

pub enum DriveRequest {
    Rescan,
    Run {
        action: MountAction,
        drive: Drive,
        secret: Option<Secret>,
    },
}

#[derive(Debug)]
pub enum DriveReply {
    Scanned(DriveScan),
    NeedsPassword {
        action: MountAction,
        drive: Drive,
    },
    Finished {
        action: MountAction,
        drive: Drive,
        result: MountResult,
        /// Fresh drive list after a successful operation
        scan: Option<DriveScan>,
    },
}

/// Serialises mount, unmount and rescan requests on one background thread.
pub struct DriveWorker {
    request_tx: Sender<DriveRequest>,
    reply_rx: Receiver<DriveReply>,
    busy: usize,
}

impl DriveWorker {
    pub fn spawn(runner: Box<dyn CommandRunner>, timeout: Duration) -> Self {
        let (request_tx, request_rx) = mpsc::channel::<DriveRequest>();
        let (reply_tx, reply_rx) = mpsc::channel();

        thread::spawn(move || {
            for request in request_rx {
                let reply = handle_request(runner.as_ref(), timeout, request);
                if reply_tx.send(reply).is_err() {
                    break;
                }
            }
        });

        Self {
            request_tx,
            reply_rx,
            busy: 0,
        }
    }

    pub fn submit(&mut self, request: DriveRequest) {
        if self.request_tx.send(request).is_ok() {
            self.busy += 1;
        }
    }

    pub fn poll(&mut self) -> Vec<DriveReply> {
        let replies: Vec<_> = self.reply_rx.try_iter().collect();
        self.busy = self.busy.saturating_sub(replies.len());
        replies
    }

    pub fn is_busy(&self) -> bool {
        self.busy > 0
    }
}

fn handle_request(runner: &dyn CommandRunner, timeout: Duration, request: DriveRequest) -> DriveReply {
    match request {
        DriveRequest::Rescan => DriveReply::Scanned(enumerate(runner, timeout)),
        DriveRequest::Run {
            action,
            drive,
            secret,
        } => match MountHelper::new(runner, timeout).run(action, &drive, secret) {
            HelperOutcome::NeedsPassword => DriveReply::NeedsPassword { action, drive },
            HelperOutcome::Done(result) => {
                let scan = matches!(result, MountResult::Succeeded(_))
                    .then(|| enumerate(runner, timeout));
                DriveReply::Finished {
                    action,
                    drive,
                    result,
                    scan,
                }
            }
        },
    }
}
