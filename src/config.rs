// 该文件是 Shouyin （手音） 项目的一部分。
// src/config.rs - 映射参数配置
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

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info};

use crate::{
  feature::{DEFAULT_FINGER_EXTENSION, DEFAULT_THUMB_EXTENSION, FeatureExtractor},
  model::GestureKind,
};

#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("配置解析错误: {0}")]
  ParseError(#[from] serde_json::Error),
  #[error("配置无效: {0}")]
  Invalid(String),
}

/// 输出参数的取值区间
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Span {
  pub min: f32,
  pub max: f32,
}

impl Span {
  pub const fn new(min: f32, max: f32) -> Self {
    Self { min, max }
  }

  pub fn midpoint(&self) -> f32 {
    (self.min + self.max) / 2.0
  }
}

/// 手部质心参与映射的活动区域（图像归一化坐标）
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ActiveRegion {
  pub x_min: f32,
  pub x_max: f32,
  pub y_min: f32,
  pub y_max: f32,
}

impl Default for ActiveRegion {
  fn default() -> Self {
    Self {
      x_min: 0.1,
      x_max: 0.9,
      y_min: 0.1,
      y_max: 0.9,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct OutputRanges {
  pub volume: Span,
  /// Hz
  pub pitch: Span,
  /// BPM
  pub tempo: Span,
  pub reverb: Span,
}

impl Default for OutputRanges {
  fn default() -> Self {
    Self {
      volume: Span::new(0.0, 1.0),
      pitch: Span::new(50.0, 2000.0),
      tempo: Span::new(60.0, 200.0),
      reverb: Span::new(0.0, 1.0),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct Thresholds {
  pub thumb_extension: f32,
  pub finger_extension: f32,
  /// 置信度超过该值的手势才会记录并输出 sound
  pub gesture_confidence_min: f32,
}

impl Default for Thresholds {
  fn default() -> Self {
    Self {
      thumb_extension: DEFAULT_THUMB_EXTENSION,
      finger_extension: DEFAULT_FINGER_EXTENSION,
      gesture_confidence_min: 0.6,
    }
  }
}

/// 手势到音色编号
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct InstrumentTable {
  pub open_palm: u32,
  pub fist: u32,
  pub peace_sign: u32,
  pub thumbs_up: u32,
  pub pointing: u32,
  pub unknown: u32,
}

impl Default for InstrumentTable {
  fn default() -> Self {
    Self {
      open_palm: 0,
      fist: 1,
      peace_sign: 2,
      thumbs_up: 3,
      pointing: 4,
      unknown: 0,
    }
  }
}

impl InstrumentTable {
  pub fn lookup(&self, kind: Option<GestureKind>) -> u32 {
    match kind {
      Some(GestureKind::OpenPalm) => self.open_palm,
      Some(GestureKind::Fist) => self.fist,
      Some(GestureKind::PeaceSign) => self.peace_sign,
      Some(GestureKind::ThumbsUp) => self.thumbs_up,
      Some(GestureKind::Pointing) => self.pointing,
      None => self.unknown,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
  pub smoothing_window: usize,
  pub history_capacity: usize,
  pub max_hands: usize,
  pub active_region: ActiveRegion,
  pub ranges: OutputRanges,
  /// 平滑后 z 的映射输入区间
  pub depth_range: Span,
  /// 帧间位移的映射输入区间
  pub motion_range: Span,
  pub hand_size_scale: f32,
  pub thresholds: Thresholds,
  pub instruments: InstrumentTable,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      smoothing_window: 5,
      history_capacity: 5,
      max_hands: 2,
      active_region: ActiveRegion::default(),
      ranges: OutputRanges::default(),
      depth_range: Span::new(-0.5, 0.5),
      motion_range: Span::new(0.0, 0.1),
      hand_size_scale: 0.2,
      thresholds: Thresholds::default(),
      instruments: InstrumentTable::default(),
    }
  }
}

impl Config {
  pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    info!("加载配置文件: {}", path.display());
    let data = std::fs::read_to_string(path)?;
    let config: Config = serde_json::from_str(&data)?;
    config.validate()?;
    Ok(config)
  }

  /// 未指定文件时使用默认配置
  pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
    match path {
      Some(path) => Self::from_path(path),
      None => Ok(Self::default()),
    }
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    let invalid = |msg: String| {
      error!("{}", msg);
      Err(ConfigError::Invalid(msg))
    };

    if self.smoothing_window == 0 {
      return invalid("平滑窗口不能为 0".to_string());
    }
    if self.history_capacity == 0 {
      return invalid("手势历史容量不能为 0".to_string());
    }
    let region = &self.active_region;
    if !(region.x_min <= region.x_max) || !(region.y_min <= region.y_max) {
      return invalid(format!("活动区域无效: {:?}", region));
    }
    let threshold = self.thresholds.gesture_confidence_min;
    if !(0.0..=1.0).contains(&threshold) {
      return invalid(format!("手势置信度阈值超出 [0, 1]: {}", threshold));
    }
    if !(self.thresholds.thumb_extension > 0.0 && self.thresholds.finger_extension > 0.0) {
      return invalid(format!("伸展阈值必须为正: {:?}", self.thresholds));
    }
    if !(self.hand_size_scale > 0.0) {
      return invalid(format!("hand_size 归一化常数必须为正: {}", self.hand_size_scale));
    }

    Ok(())
  }

  pub fn feature_extractor(&self) -> FeatureExtractor {
    FeatureExtractor::new(
      self.thresholds.thumb_extension,
      self.thresholds.finger_extension,
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn default_config_is_valid() {
    let config = Config::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.ranges.tempo.midpoint(), 130.0);
  }

  #[test]
  fn partial_json_keeps_defaults() {
    let config: Config =
      serde_json::from_str(r#"{"smoothing_window": 8, "ranges": {"pitch": {"min": 100, "max": 800}}}"#)
        .unwrap();
    assert_eq!(config.smoothing_window, 8);
    assert_eq!(config.ranges.pitch, Span::new(100.0, 800.0));
    assert_eq!(config.ranges.volume, Span::new(0.0, 1.0));
    assert_eq!(config.instruments.fist, 1);
  }

  #[test]
  fn rejects_bad_values() {
    let mut config = Config::default();
    config.smoothing_window = 0;
    assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

    let mut config = Config::default();
    config.active_region.x_min = 0.95;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.thresholds.gesture_confidence_min = 1.5;
    assert!(config.validate().is_err());
  }

  #[test]
  fn instrument_lookup_falls_back_for_unknown() {
    let table = InstrumentTable::default();
    assert_eq!(table.lookup(Some(GestureKind::Pointing)), 4);
    assert_eq!(table.lookup(None), 0);
  }
}
