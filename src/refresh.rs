use std::{
    path::PathBuf,
    sync::mpsc::{self, Receiver, RecvTimeoutError, Sender},
    thread,
    time::{Duration, Instant},
};

use crate::{
    drives::{self, CommandRunner, DriveScan},
    error::Result,
    fs_ops::{self, Entry},
};

enum RefreshRequest {
    Watch(Vec<PathBuf>),
    Now,
}

/// One tick's worth of fresh data
pub struct RefreshResult {
    pub listings: Vec<(PathBuf, Result<Vec<Entry>>)>,
    pub drives: DriveScan,
}

/// Background ticker that re-lists watched directories and rescans drives.
/// It only produces data; the foreground decides what to apply.
pub struct Refresher {
    request_tx: Sender<RefreshRequest>,
    result_rx: Receiver<RefreshResult>,
    watched: Vec<PathBuf>,
}

impl Refresher {
    pub fn spawn(
        interval: Duration,
        runner: Box<dyn CommandRunner>,
        helper_timeout: Duration,
    ) -> Self {
        let (request_tx, request_rx) = mpsc::channel();
        let (result_tx, result_rx) = mpsc::channel();

        thread::spawn(move || {
            refresh_loop(interval, runner.as_ref(), helper_timeout, request_rx, result_tx)
        });

        Self {
            request_tx,
            result_rx,
            watched: Vec::new(),
        }
    }

    /// Replace the watched set. Nothing is sent when it did not change.
    pub fn watch(&mut self, dirs: Vec<PathBuf>) {
        if dirs != self.watched {
            self.watched = dirs.clone();
            let _ = self.request_tx.send(RefreshRequest::Watch(dirs));
        }
    }

    /// Tick immediately instead of waiting for the interval
    pub fn refresh_now(&self) {
        let _ = self.request_tx.send(RefreshRequest::Now);
    }

    pub fn poll(&self) -> Vec<RefreshResult> {
        self.result_rx.try_iter().collect()
    }
}

fn refresh_loop(
    interval: Duration,
    runner: &dyn CommandRunner,
    helper_timeout: Duration,
    request_rx: Receiver<RefreshRequest>,
    result_tx: Sender<RefreshResult>,
) {
    let mut watched: Vec<PathBuf> = Vec::new();
    let mut next_tick = Instant::now() + interval;

    loop {
        let wait = next_tick.saturating_duration_since(Instant::now());
        let tick_now = match request_rx.recv_timeout(wait) {
            Ok(RefreshRequest::Watch(dirs)) => {
                watched = dirs;
                false
            }
            Ok(RefreshRequest::Now) => true,
            Err(RecvTimeoutError::Timeout) => true,
            Err(RecvTimeoutError::Disconnected) => break,
        };
        if !tick_now {
            continue;
        }

        let result = RefreshResult {
            listings: watched
                .iter()
                .map(|dir| (dir.clone(), fs_ops::list_dir(dir)))
                .collect(),
            drives: drives::enumerate(runner, helper_timeout),
        };
        if result_tx.send(result).is_err() {
            break;
        }
        next_tick = Instant::now() + interval;
    }

    tracing::debug!("refresh loop stopped");
}
