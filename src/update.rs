use std::{
    cmp::Ordering,
    sync::mpsc::{self, Receiver},
    thread,
    time::Duration,
};

use serde::Deserialize;

use crate::error::{Error, Result};

pub const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateInfo {
    /// `None` when the repository has no published release
    pub latest: Option<String>,
}

pub trait UpdateSource: Send {
    fn check_latest(&self) -> Result<UpdateInfo>;
}

pub struct GithubReleases {
    repo: String,
}

impl GithubReleases {
    pub fn new(repo: impl Into<String>) -> Self {
        Self { repo: repo.into() }
    }

    fn url(&self) -> String {
        format!("https://api.github.com/repos/{}/releases/latest", self.repo)
    }
}

#[derive(Deserialize)]
struct Release {
    tag_name: String,
}

impl UpdateSource for GithubReleases {
    fn check_latest(&self) -> Result<UpdateInfo> {
        let url = self.url();
        tracing::info!("checking for updates at {}", url);

        let response = match ureq::get(&url)
            .set("User-Agent", concat!("burrow/", env!("CARGO_PKG_VERSION")))
            .set("Accept", "application/vnd.github+json")
            .timeout(REQUEST_TIMEOUT)
            .call()
        {
            Ok(response) => response,
            Err(ureq::Error::Status(404, _)) => return Ok(UpdateInfo { latest: None }),
            Err(ureq::Error::Status(code, _)) => {
                return Err(Error::Unavailable(format!("release server answered {}", code)));
            }
            Err(e) => return Err(Error::Unavailable(format!("cannot reach release server: {}", e))),
        };

        let body = response
            .into_string()
            .map_err(|e| Error::Unavailable(format!("cannot read release info: {}", e)))?;
        parse_release(&body)
    }
}

fn parse_release(body: &str) -> Result<UpdateInfo> {
    let release: Release = serde_json::from_str(body)
        .map_err(|e| Error::Unavailable(format!("unexpected release info: {}", e)))?;
    let tag = release.tag_name.trim().trim_start_matches('v');
    Ok(UpdateInfo {
        latest: (!tag.is_empty()).then(|| tag.to_owned()),
    })
}

/// Compare dotted version strings numerically, component by component.
/// Missing components count as zero, so `1.2` equals `1.2.0`.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let parts = |v: &str| -> Vec<u64> {
        v.trim()
            .trim_start_matches('v')
            .split('.')
            .map(|part| {
                let digits: String = part.chars().take_while(char::is_ascii_digit).collect();
                digits.parse().unwrap_or(0)
            })
            .collect()
    };

    let (a, b) = (parts(a), parts(b));
    let len = a.len().max(b.len());
    (0..len)
        .map(|i| {
            let x = a.get(i).copied().unwrap_or(0);
            let y = b.get(i).copied().unwrap_or(0);
            x.cmp(&y)
        })
        .find(|ord| ord.is_ne())
        .unwrap_or(Ordering::Equal)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateStatus {
    Available(String),
    UpToDate,
    NoReleases,
}

impl UpdateStatus {
    pub fn from_info(info: &UpdateInfo, current: &str) -> Self {
        match &info.latest {
            None => UpdateStatus::NoReleases,
            Some(latest) if compare_versions(latest, current) == Ordering::Greater => {
                UpdateStatus::Available(latest.clone())
            }
            Some(_) => UpdateStatus::UpToDate,
        }
    }

    pub fn message(&self) -> String {
        match self {
            UpdateStatus::Available(latest) => {
                format!("New version available: {} (current {})", latest, CURRENT_VERSION)
            }
            UpdateStatus::UpToDate => format!("You're up to date (v{})", CURRENT_VERSION),
            UpdateStatus::NoReleases => "No updates available".to_owned(),
        }
    }
}

/// One-shot background update check
pub struct UpdateTask {
    rx: Receiver<Result<UpdateStatus>>,
}

impl UpdateTask {
    pub fn spawn(source: Box<dyn UpdateSource>) -> Self {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let status = source
                .check_latest()
                .map(|info| UpdateStatus::from_info(&info, CURRENT_VERSION));
            let _ = tx.send(status);
        });
        Self { rx }
    }

    pub fn poll(&self) -> Option<Result<UpdateStatus>> {
        self.rx.try_recv().ok()
    }
}
