use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::mpsc::{self, Receiver, Sender},
    thread,
    time::Instant,
};

use crate::ops::{self, ClipboardMode, OpReport, Resolution};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct JobId(u64);

#[cfg(test)]
impl JobId {
    pub fn for_test(n: u64) -> Self {
        JobId(n)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum JobKind {
    Paste(ClipboardMode),
    Delete,
}

impl JobKind {
    pub fn verb(self) -> &'static str {
        match self {
            JobKind::Paste(ClipboardMode::Copy) => "copied",
            JobKind::Paste(ClipboardMode::Cut) => "moved",
            JobKind::Delete => "deleted",
        }
    }
}

#[derive(Clone, Debug)]
pub struct Job {
    pub id: JobId,
    pub kind: JobKind,
    pub description: String,
    pub current: Option<String>,
    pub started_at: Instant,
}

pub enum JobUpdate {
    Progress { job_id: JobId, current: String },
    Conflict { job_id: JobId, path: PathBuf },
    Finished { job_id: JobId, report: OpReport },
}

/// What the foreground has to act on after draining updates
#[derive(Debug)]
pub enum JobEvent {
    Conflict {
        job_id: JobId,
        path: PathBuf,
    },
    Finished {
        kind: JobKind,
        report: OpReport,
    },
}

struct WorkerHandle {
    conflict_tx: Sender<Resolution>,
}

pub struct JobManager {
    jobs: HashMap<JobId, Job>,
    progress_rx: Receiver<JobUpdate>,
    progress_tx: Sender<JobUpdate>,
    workers: HashMap<JobId, WorkerHandle>,
    next_id: u64,
}

impl Default for JobManager {
    fn default() -> Self {
        Self::new()
    }
}

impl JobManager {
    pub fn new() -> Self {
        let (progress_tx, progress_rx) = mpsc::channel();
        Self {
            jobs: HashMap::new(),
            progress_rx,
            progress_tx,
            workers: HashMap::new(),
            next_id: 0,
        }
    }

    fn register(&mut self, kind: JobKind, description: String) -> (JobId, Receiver<Resolution>) {
        let id = JobId(self.next_id);
        self.next_id += 1;

        tracing::info!("job {:?} started: {}", id, description);
        self.jobs.insert(
            id,
            Job {
                id,
                kind,
                description,
                current: None,
                started_at: Instant::now(),
            },
        );

        let (conflict_tx, conflict_rx) = mpsc::channel();
        self.workers.insert(id, WorkerHandle { conflict_tx });
        (id, conflict_rx)
    }

    pub fn start_paste(&mut self, sources: Vec<PathBuf>, mode: ClipboardMode, dest_dir: PathBuf) -> JobId {
        let action = match mode {
            ClipboardMode::Copy => "Copying",
            ClipboardMode::Cut => "Moving",
        };
        let description = format!(
            "{} {} to {}",
            action,
            describe_items(&sources),
            dest_dir.display()
        );

        let (id, conflict_rx) = self.register(JobKind::Paste(mode), description);
        let progress_tx = self.progress_tx.clone();

        thread::spawn(move || {
            let conflict_tx = progress_tx.clone();
            let report = ops::paste(
                &sources,
                mode,
                &dest_dir,
                |path| {
                    // Block until the foreground answers
                    let asked = conflict_tx.send(JobUpdate::Conflict {
                        job_id: id,
                        path: path.to_path_buf(),
                    });
                    if asked.is_err() {
                        return Resolution::Cancel;
                    }
                    conflict_rx.recv().unwrap_or(Resolution::Cancel)
                },
                |path| send_progress(&progress_tx, id, path),
            );
            let _ = progress_tx.send(JobUpdate::Finished { job_id: id, report });
        });

        id
    }

    pub fn start_delete(&mut self, paths: Vec<PathBuf>) -> JobId {
        let description = format!("Deleting {}", describe_items(&paths));
        let (id, _conflict_rx) = self.register(JobKind::Delete, description);
        let progress_tx = self.progress_tx.clone();

        thread::spawn(move || {
            let report = ops::delete(&paths, |path| send_progress(&progress_tx, id, path));
            let _ = progress_tx.send(JobUpdate::Finished { job_id: id, report });
        });

        id
    }

    pub fn send_conflict_resolution(&self, job_id: JobId, resolution: Resolution) {
        if let Some(handle) = self.workers.get(&job_id) {
            let _ = handle.conflict_tx.send(resolution);
        }
    }

    /// Drain the update channel. Finished jobs are forgotten here.
    pub fn process_updates(&mut self) -> Vec<JobEvent> {
        let mut events = Vec::new();

        while let Ok(update) = self.progress_rx.try_recv() {
            match update {
                JobUpdate::Progress { job_id, current } => {
                    if let Some(job) = self.jobs.get_mut(&job_id) {
                        job.current = Some(current);
                    }
                }
                JobUpdate::Conflict { job_id, path } => {
                    events.push(JobEvent::Conflict { job_id, path });
                }
                JobUpdate::Finished { job_id, report } => {
                    self.workers.remove(&job_id);
                    if let Some(job) = self.jobs.remove(&job_id) {
                        tracing::info!(
                            "job {:?} finished in {:?}: {}",
                            job_id,
                            job.started_at.elapsed(),
                            report.summary(job.kind.verb())
                        );
                        events.push(JobEvent::Finished {
                            kind: job.kind,
                            report,
                        });
                    }
                }
            }
        }

        events
    }

    /// Running jobs, oldest first
    pub fn running(&self) -> Vec<&Job> {
        let mut jobs: Vec<_> = self.jobs.values().collect();
        jobs.sort_by_key(|j| j.id.0);
        jobs
    }
}

fn send_progress(tx: &Sender<JobUpdate>, job_id: JobId, path: &Path) {
    let _ = tx.send(JobUpdate::Progress {
        job_id,
        current: ops::display_name(path),
    });
}

fn describe_items(paths: &[PathBuf]) -> String {
    match paths {
        [single] => format!("'{}'", ops::display_name(single)),
        _ => format!("{} items", paths.len()),
    }
}

#[cfg(test)]
mod tests {
    use std::{fs, time::Duration};

    use super::*;

    /// Poll until the job finishes, answering conflicts with `answer`
    fn run_to_completion(manager: &mut JobManager, answer: Resolution) -> (Vec<PathBuf>, OpReport) {
        let mut conflicts = Vec::new();
        for _ in 0..500 {
            for event in manager.process_updates() {
                match event {
                    JobEvent::Conflict { job_id, path } => {
                        conflicts.push(path);
                        manager.send_conflict_resolution(job_id, answer);
                    }
                    JobEvent::Finished { report, .. } => return (conflicts, report),
                }
            }
            thread::sleep(Duration::from_millis(10));
        }
        panic!("job did not finish");
    }

    #[test]
    fn test_paste_job_hands_conflicts_to_foreground() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        fs::create_dir_all(&src).unwrap();
        fs::create_dir_all(&dst).unwrap();
        fs::write(src.join("a"), b"new").unwrap();
        fs::write(dst.join("a"), b"old").unwrap();

        let mut manager = JobManager::new();
        manager.start_paste(vec![src.join("a")], ClipboardMode::Copy, dst.clone());
        assert_eq!(manager.running().len(), 1);

        let (conflicts, report) = run_to_completion(&mut manager, Resolution::Rename);
        assert_eq!(conflicts, vec![dst.join("a")]);
        assert_eq!(report.succeeded, vec![dst.join("a (2)")]);
        assert_eq!(manager.running().len(), 0);
    }

    #[test]
    fn test_delete_job_reports_removed_paths() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("tree/leaf")).unwrap();

        let mut manager = JobManager::new();
        manager.start_delete(vec![tmp.path().join("tree")]);
        let (conflicts, report) = run_to_completion(&mut manager, Resolution::Skip);

        assert!(conflicts.is_empty());
        assert_eq!(report.moved, vec![tmp.path().join("tree")]);
        assert!(!tmp.path().join("tree").exists());
    }

    #[test]
    fn test_describe_items() {
        assert_eq!(describe_items(&[PathBuf::from("/x/a.txt")]), "'a.txt'");
        assert_eq!(
            describe_items(&[PathBuf::from("/a"), PathBuf::from("/b")]),
            "2 items"
        );
    }
}
