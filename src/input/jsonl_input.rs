// 该文件是 Shouyin （手音） 项目的一部分。
// src/input/jsonl_input.rs - JSON Lines 关键点输入
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

use std::fs::File;
use std::io::{BufRead, BufReader};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  hand::{Hand, HandError, LandmarkFrame, Side},
};

#[derive(Error, Debug)]
pub enum JsonLinesInputError {
  #[error("URI scheme mismatch")]
  SchemeMismatch,
  #[error("I/O error: {0}")]
  IoError(#[from] std::io::Error),
  #[error("line {line}: parse error: {source}")]
  ParseError {
    line: usize,
    source: serde_json::Error,
  },
  #[error("line {line}: hand {hand}: {source}")]
  HandError {
    line: usize,
    hand: usize,
    source: HandError,
  },
}

/// 每行一帧：`{"timestamp_ms": 33, "hands": [{"label": "Left", "landmarks": [[x, y, z], ...]}]}`
#[derive(Deserialize, Debug)]
struct FrameJson {
  #[serde(default)]
  timestamp_ms: Option<u64>,
  #[serde(default)]
  hands: Vec<HandJson>,
}

#[derive(Deserialize, Debug)]
struct HandJson {
  label: Side,
  landmarks: Vec<[f32; 3]>,
}

pub struct JsonLinesInput {
  reader: Box<dyn BufRead + Send>,
  line: usize,
  frame_index: u64,
  finished: bool,
}

impl FromUrlWithScheme for JsonLinesInput {
  const SCHEME: &'static str = "jsonl";
}

impl FromUrl for JsonLinesInput {
  type Error = JsonLinesInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(JsonLinesInputError::SchemeMismatch);
    }

    let path = crate::url_file_path(url);
    info!("打开关键点文件: {}", path);
    let file = File::open(&path)?;
    Ok(Self::from_reader(BufReader::new(file)))
  }
}

impl JsonLinesInput {
  pub fn from_reader<R: BufRead + Send + 'static>(reader: R) -> Self {
    Self {
      reader: Box::new(reader),
      line: 0,
      frame_index: 0,
      finished: false,
    }
  }

  fn parse_frame(&mut self, text: &str) -> Result<LandmarkFrame, JsonLinesInputError> {
    let line = self.line;
    let json: FrameJson =
      serde_json::from_str(text).map_err(|source| JsonLinesInputError::ParseError { line, source })?;

    let hands = json
      .hands
      .into_iter()
      .enumerate()
      .map(|(hand, h)| {
        Hand::try_from((h.label, h.landmarks))
          .map_err(|source| JsonLinesInputError::HandError { line, hand, source })
      })
      .collect::<Result<Vec<_>, _>>()?;

    let frame = LandmarkFrame {
      index: self.frame_index,
      timestamp_ms: json.timestamp_ms,
      hands,
    };
    self.frame_index += 1;
    debug!("读取帧 {}: {} 只手", frame.index, frame.hands.len());
    Ok(frame)
  }
}

impl Iterator for JsonLinesInput {
  type Item = Result<LandmarkFrame, JsonLinesInputError>;

  fn next(&mut self) -> Option<Self::Item> {
    if self.finished {
      return None;
    }

    let mut buf = String::new();
    loop {
      buf.clear();
      match self.reader.read_line(&mut buf) {
        Ok(0) => {
          info!("关键点输入结束，共 {} 帧", self.frame_index);
          self.finished = true;
          return None;
        }
        Ok(_) => {
          self.line += 1;
          let text = buf.trim();
          if text.is_empty() {
            continue;
          }
          let result = self.parse_frame(text);
          if result.is_err() {
            self.finished = true;
          }
          return Some(result);
        }
        Err(e) => {
          self.finished = true;
          return Some(Err(e.into()));
        }
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Cursor;

  fn hand_json(label: &str, n: usize) -> String {
    let points: Vec<String> = (0..n)
      .map(|i| format!("[{:.2}, 0.5, 0.0]", i as f32 * 0.01))
      .collect();
    format!(r#"{{"label": "{}", "landmarks": [{}]}}"#, label, points.join(", "))
  }

  #[test]
  fn reads_frames_and_skips_blank_lines() {
    let text = format!(
      "{{\"timestamp_ms\": 10, \"hands\": [{}]}}\n\n{{\"hands\": []}}\n{{\"hands\": [{}, {}]}}\n",
      hand_json("Left", 21),
      hand_json("Left", 21),
      hand_json("Right", 21)
    );
    let frames: Vec<_> = JsonLinesInput::from_reader(Cursor::new(text))
      .collect::<Result<_, _>>()
      .unwrap();
    assert_eq!(frames.len(), 3);
    assert_eq!(frames[0].timestamp_ms, Some(10));
    assert_eq!(frames[0].hands[0].side(), Side::Left);
    assert!(frames[1].is_empty());
    assert_eq!(frames[2].index, 2);
    assert_eq!(frames[2].hands[1].side(), Side::Right);
  }

  #[test]
  fn wrong_landmark_count_is_fatal() {
    let text = format!("{{\"hands\": [{}]}}\n{{\"hands\": []}}\n", hand_json("Right", 20));
    let mut input = JsonLinesInput::from_reader(Cursor::new(text));
    match input.next() {
      Some(Err(JsonLinesInputError::HandError { line: 1, hand: 0, source })) => {
        assert_eq!(
          source,
          HandError::LandmarkCount {
            expected: 21,
            actual: 20
          }
        );
      }
      other => panic!("unexpected: {:?}", other.map(|r| r.map(|f| f.index))),
    }
    assert!(input.next().is_none());
  }

  #[test]
  fn malformed_json_reports_line() {
    let mut input = JsonLinesInput::from_reader(Cursor::new("\n{not json}\n"));
    assert!(matches!(
      input.next(),
      Some(Err(JsonLinesInputError::ParseError { line: 2, .. }))
    ));
  }

  #[test]
  fn rejects_other_schemes() {
    let url = Url::parse("osc://127.0.0.1:4560").unwrap();
    assert!(matches!(
      JsonLinesInput::from_url(&url),
      Err(JsonLinesInputError::SchemeMismatch)
    ));
  }
}
