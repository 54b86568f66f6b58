//! JSON loaders resolving paths under the workspace `data/` directory.

use crate::configs::follow_target::FollowTarget;
use crate::oneshot::OneShotConfig;
use crate::FollowCameraConfig;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

fn data_root() -> PathBuf {
    // Prefer the top-level workspace `data/` so tests can run from any crate.
    let here = std::path::Path::new(env!("CARGO_MANIFEST_DIR"));
    let ws = here.join("../../data");
    if ws.is_dir() { ws } else { here.join("data") }
}

/// Read a raw JSON file under `data/` and return its string.
pub fn read_json(rel: impl AsRef<Path>) -> Result<String> {
    let path = data_root().join(rel);
    let s = fs::read_to_string(&path).with_context(|| format!("read data: {}", path.display()))?;
    Ok(s)
}

/// Load and validate a follow camera config (from data/shots/*).
pub fn load_follow_camera(rel: impl AsRef<Path>) -> Result<FollowCameraConfig> {
    let txt = read_json(rel)?;
    let cfg: FollowCameraConfig =
        serde_json::from_str(&txt).context("parse follow camera json")?;
    cfg.validate().map_err(anyhow::Error::from)?;
    Ok(cfg)
}

pub fn load_follow_target(rel: impl AsRef<Path>) -> Result<FollowTarget> {
    let txt = read_json(rel)?;
    let t: FollowTarget = serde_json::from_str(&txt).context("parse follow target json")?;
    Ok(t)
}

pub fn load_one_shot(rel: impl AsRef<Path>) -> Result<OneShotConfig> {
    let txt = read_json(rel)?;
    let shot: OneShotConfig = serde_json::from_str(&txt).context("parse one-shot json")?;
    Ok(shot)
}
