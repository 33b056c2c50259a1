use std::{
    fs,
    io::Read,
    path::{Path, PathBuf},
    sync::mpsc::{self, Receiver, Sender},
    thread,
};

use crate::{
    error::{Error, Result},
    fs_ops::{self, EntryKind},
    util::format_bytes,
};

/// Bytes sniffed for binary detection and text preview
const SNIFF_BYTES: usize = 8192;

const TAB_WIDTH: usize = 4;

/// Darkest to brightest
const ASCII_RAMP: &[u8] = b" .:-=+*#%@";

/// Terminal cells are roughly twice as tall as they are wide
const CELL_ASPECT: f64 = 2.2;

pub trait PreviewRenderer: Send {
    fn render_preview(&self, path: &Path, kind: EntryKind, width: u16, height: u16) -> Result<Vec<String>>;
}

pub struct DefaultRenderer;

impl PreviewRenderer for DefaultRenderer {
    fn render_preview(&self, path: &Path, kind: EntryKind, width: u16, height: u16) -> Result<Vec<String>> {
        let (width, height) = (width as usize, height as usize);
        match kind {
            EntryKind::Directory => directory_preview(path, height),
            EntryKind::Symlink => symlink_preview(path),
            EntryKind::Special => Ok(vec!["[special file]".to_owned()]),
            EntryKind::File if is_image_file(path) => image_preview(path, width, height),
            EntryKind::File => file_preview(path, width, height),
        }
    }
}

pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .is_some_and(|ext| {
            matches!(
                ext.as_str(),
                "png" | "jpg" | "jpeg" | "gif" | "bmp" | "webp" | "ico" | "tiff" | "tif"
            )
        })
}

/// NUL bytes or more than 30% control characters
pub fn looks_binary(bytes: &[u8]) -> bool {
    if bytes.is_empty() {
        return false;
    }
    let nul = bytes.contains(&0);
    let control = bytes
        .iter()
        .filter(|&&b| b < 0x09 || (b > 0x0d && b < 0x20 && b != 0x1b))
        .count();
    nul || control as f32 / bytes.len() as f32 > 0.3
}

fn file_preview(path: &Path, width: usize, height: usize) -> Result<Vec<String>> {
    let mut file = fs::File::open(path).map_err(|e| Error::from_io(&e, path))?;
    let mut buf = Vec::with_capacity(SNIFF_BYTES);
    file.by_ref()
        .take(SNIFF_BYTES as u64)
        .read_to_end(&mut buf)
        .map_err(|e| Error::from_io(&e, path))?;

    if looks_binary(&buf) {
        let size = file.metadata().map(|m| m.len()).unwrap_or(buf.len() as u64);
        return Ok(binary_summary(&buf, size));
    }

    let text = String::from_utf8_lossy(&buf);
    Ok(text
        .lines()
        .take(height)
        .map(|line| expand_tabs(line).chars().take(width).collect())
        .collect())
}

fn binary_summary(head: &[u8], size: u64) -> Vec<String> {
    let hex: Vec<String> = head.iter().take(16).map(|b| format!("{:02x}", b)).collect();
    vec![
        "[binary file]".to_owned(),
        format!("size: {}", format_bytes(size)),
        format!("head: {}", hex.join(" ")),
    ]
}

pub fn expand_tabs(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut column = 0;
    for c in line.chars() {
        if c == '\t' {
            let pad = TAB_WIDTH - column % TAB_WIDTH;
            out.extend(std::iter::repeat_n(' ', pad));
            column += pad;
        } else {
            out.push(c);
            column += 1;
        }
    }
    out
}

fn directory_preview(path: &Path, height: usize) -> Result<Vec<String>> {
    let entries = fs_ops::list_dir(path)?;
    let total = entries.len();
    let mut lines = vec![format!("{} item(s)", total)];
    lines.extend(
        entries
            .iter()
            .take(height.saturating_sub(1))
            .map(|e| if e.is_dir() { format!("{}/", e.name) } else { e.name.clone() }),
    );
    Ok(lines)
}

fn symlink_preview(path: &Path) -> Result<Vec<String>> {
    let target = fs::read_link(path).map_err(|e| Error::from_io(&e, path))?;
    let mut lines = vec![format!("-> {}", target.display())];
    if fs::metadata(path).is_err() {
        lines.push("[broken link]".to_owned());
    }
    Ok(lines)
}

/// Scale an image of `w`x`h` pixels into at most `width`x`height` cells.
pub fn fit_cells(w: u32, h: u32, width: usize, height: usize) -> (u32, u32) {
    if w == 0 || h == 0 || width == 0 || height == 0 {
        return (0, 0);
    }
    let aspect = w as f64 / h as f64;
    let mut rows = height as f64;
    let mut cols = aspect * rows * CELL_ASPECT;
    if cols > width as f64 {
        cols = width as f64;
        rows = cols / (aspect * CELL_ASPECT);
    }
    ((cols as u32).max(1), (rows as u32).max(1))
}

/// Map an 8-bit luminance onto the ASCII ramp
pub fn luma_to_ascii(luma: u8) -> char {
    let index = (luma as usize * ASCII_RAMP.len() / 256).min(ASCII_RAMP.len() - 1);
    ASCII_RAMP[index] as char
}

#[cfg(feature = "image-preview")]
fn image_preview(path: &Path, width: usize, height: usize) -> Result<Vec<String>> {
    let img = image::open(path).map_err(|e| Error::Unavailable(format!("cannot decode image: {}", e)))?;
    let (cols, rows) = fit_cells(img.width(), img.height(), width, height);
    if cols == 0 {
        return Ok(Vec::new());
    }

    let gray = img
        .resize_exact(cols, rows, image::imageops::FilterType::Triangle)
        .to_luma8();
    Ok(gray
        .rows()
        .map(|row| row.map(|pixel| luma_to_ascii(pixel.0[0])).collect())
        .collect())
}

#[cfg(not(feature = "image-preview"))]
fn image_preview(_path: &Path, _width: usize, _height: usize) -> Result<Vec<String>> {
    Err(Error::Unavailable("image preview not built in".to_owned()))
}

// ============================================================================
// Background worker
// ============================================================================

pub struct PreviewRequest {
    pub path: PathBuf,
    pub kind: EntryKind,
    pub width: u16,
    pub height: u16,
}

pub struct PreviewResult {
    pub path: PathBuf,
    pub lines: Result<Vec<String>>,
}

/// Renders previews off the UI thread. Requests that pile up while a render is
/// in flight collapse into the most recent one.
pub struct PreviewWorker {
    request_tx: Sender<PreviewRequest>,
    result_rx: Receiver<PreviewResult>,
}

impl PreviewWorker {
    pub fn spawn(renderer: Box<dyn PreviewRenderer>) -> Self {
        let (request_tx, request_rx) = mpsc::channel::<PreviewRequest>();
        let (result_tx, result_rx) = mpsc::channel();

        thread::spawn(move || {
            while let Ok(first) = request_rx.recv() {
                let request = request_rx.try_iter().last().unwrap_or(first);
                let lines = renderer.render_preview(&request.path, request.kind, request.width, request.height);
                let result = PreviewResult {
                    path: request.path,
                    lines,
                };
                if result_tx.send(result).is_err() {
                    break;
                }
            }
        });

        Self {
            request_tx,
            result_rx,
        }
    }

    pub fn request(&self, request: PreviewRequest) {
        let _ = self.request_tx.send(request);
    }

    pub fn poll(&self) -> Option<PreviewResult> {
        self.result_rx.try_iter().last()
    }
}
