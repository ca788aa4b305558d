// 该文件是 Shouyin （手音） 项目的一部分。
// src/output/directory_record.rs - 目录记录输出
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Datelike, Utc};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
  FromUrl, FromUrlWithScheme,
  hand::LandmarkFrame,
  output::Render,
  pipeline::FrameResult,
};

#[derive(Error, Debug)]
pub enum DirectoryRecordOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("JSON 错误: {0}")]
  JsonError(#[from] serde_json::Error),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
}

/// 按日期分目录，把每帧参数追加写入 JSON Lines 文件
pub struct DirectoryRecordOutput {
  directory: PathBuf,
  frame_counters: Arc<Mutex<u64>>,
  always: bool,
}

impl FromUrlWithScheme for DirectoryRecordOutput {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn from_url(uri: &url::Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(DirectoryRecordOutputError::SchemeMismatch);
    }

    let always = uri.query_pairs().any(|(k, _)| k == "always");
    let directory = PathBuf::from(crate::url_file_path(uri));
    info!("记录参数到目录: {} (always = {})", directory.display(), always);

    Ok(DirectoryRecordOutput {
      directory,
      frame_counters: Arc::new(Mutex::new(0)),
      always,
    })
  }
}

impl DirectoryRecordOutput {
  fn frame_id(&self) -> u64 {
    let mut counter = match self.frame_counters.lock() {
      Ok(guard) => guard,
      Err(poisoned) => poisoned.into_inner(),
    };
    *counter += 1;
    *counter
  }

  fn record_path(&self, now: &DateTime<Utc>) -> Result<PathBuf, DirectoryRecordOutputError> {
    let directory = self
      .directory
      .join(now.year().to_string())
      .join(format!("{:02}", now.month()))
      .join(format!("{:02}", now.day()));
    if !directory.exists() {
      std::fs::create_dir_all(&directory)?;
    }

    Ok(directory.join(format!("params-{}.jsonl", now.format("%H"))))
  }

  fn record_line(
    &self,
    frame: &LandmarkFrame,
    result: &FrameResult,
    now: &DateTime<Utc>,
  ) -> serde_json::Value {
    let hands: Vec<_> = result
      .hands
      .iter()
      .map(|h| {
        json!({
          "side": h.gesture.side.to_string(),
          "gesture": h.gesture.name(),
          "confidence": h.gesture.confidence,
          "params": h.params,
        })
      })
      .collect();

    json!({
      "record": self.frame_id(),
      "frame": result.index,
      "timestamp_ms": result.timestamp_ms,
      "recorded_at": now.to_rfc3339(),
      "detected_hands": frame.hands.len(),
      "hands": hands,
      "params": result.params(),
    })
  }
}

impl Render<LandmarkFrame, FrameResult> for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn render_result(&self, frame: &LandmarkFrame, result: &FrameResult) -> Result<(), Self::Error> {
    if !self.always && result.is_empty() {
      return Ok(());
    }

    let now = Utc::now();
    let path = self.record_path(&now)?;
    let line = serde_json::to_string(&self.record_line(frame, result, &now))?;

    let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
    writeln!(file, "{}", line)?;
    debug!("记录帧 {} 到 {}", result.index, path.display());
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    hand::Side,
    mapping::ParameterSet,
    model::Gesture,
    pipeline::HandResult,
  };

  fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("shouyin-{}-{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
  }

  fn output(dir: &PathBuf, always: bool) -> DirectoryRecordOutput {
    let query = if always { "?always" } else { "" };
    let url = url::Url::parse(&format!("folder://{}{}", dir.display(), query)).unwrap();
    DirectoryRecordOutput::from_url(&url).unwrap()
  }

  fn result(index: u64) -> FrameResult {
    FrameResult {
      index,
      timestamp_ms: Some(index * 33),
      hands: vec![HandResult {
        gesture: Gesture::unknown(Side::Left),
        params: ParameterSet {
          volume: 0.5,
          pitch: 440.0,
          tempo: 130.0,
          reverb: 0.5,
          sound: None,
          hand_size: 0.2,
        },
      }],
    }
  }

  fn recorded_lines(dir: &PathBuf) -> Vec<serde_json::Value> {
    let mut lines = Vec::new();
    let mut stack = vec![dir.clone()];
    while let Some(path) = stack.pop() {
      for entry in std::fs::read_dir(&path).unwrap() {
        let entry = entry.unwrap().path();
        if entry.is_dir() {
          stack.push(entry);
        } else {
          let text = std::fs::read_to_string(&entry).unwrap();
          lines.extend(text.lines().map(|l| serde_json::from_str(l).unwrap()));
        }
      }
    }
    lines
  }

  #[test]
  fn records_frames_with_hands() {
    let dir = temp_dir("record");
    let out = output(&dir, false);
    let frame = LandmarkFrame::default();
    out.render_result(&frame, &result(1)).unwrap();
    out.render_result(&frame, &FrameResult::default()).unwrap();
    out.render_result(&frame, &result(2)).unwrap();

    let lines = recorded_lines(&dir);
    assert_eq!(lines.len(), 2);
    let frames: Vec<u64> = lines.iter().map(|l| l["frame"].as_u64().unwrap()).collect();
    assert!(frames.contains(&1) && frames.contains(&2));
    assert_eq!(lines[0]["hands"][0]["gesture"], "unknown");
    assert!(lines[0]["params"].get("sound").is_none());
    let _ = std::fs::remove_dir_all(&dir);
  }

  #[test]
  fn always_records_empty_frames() {
    let dir = temp_dir("always");
    let out = output(&dir, true);
    out
      .render_result(&LandmarkFrame::default(), &FrameResult::default())
      .unwrap();
    let lines = recorded_lines(&dir);
    assert_eq!(lines.len(), 1);
    assert!(lines[0]["params"].is_null());
    let _ = std::fs::remove_dir_all(&dir);
  }
}
