// 该文件是 Shouyin （手音） 项目的一部分。
// src/mapping/params.rs - 合成器参数映射
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

use serde::Serialize;
use tracing::debug;

use crate::{
  config::Config,
  hand::{Hand, Landmark},
  mapping::{GestureHistory, PositionSmoother, map_range},
  model::{Gesture, GestureKind},
};

/// 单手单帧输出给合成器的参数。
///
/// `sound` 只在手势置信度超过阈值时给出，缺省表示沿用上一次的音色。
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParameterSet {
  pub volume: f32,
  pub pitch: f32,
  pub tempo: f32,
  pub reverb: f32,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub sound: Option<u32>,
  pub hand_size: f32,
}

impl ParameterSet {
  pub const KEYS: [&'static str; 6] = ["volume", "pitch", "tempo", "reverb", "sound", "hand_size"];

  pub fn get(&self, key: &str) -> Option<f32> {
    match key {
      "volume" => Some(self.volume),
      "pitch" => Some(self.pitch),
      "tempo" => Some(self.tempo),
      "reverb" => Some(self.reverb),
      "sound" => self.sound.map(|s| s as f32),
      "hand_size" => Some(self.hand_size),
      _ => None,
    }
  }

  /// 按名字遍历存在的参数
  pub fn iter(&self) -> impl Iterator<Item = (&'static str, f32)> + '_ {
    Self::KEYS
      .iter()
      .filter_map(|k| self.get(k).map(|v| (*k, v)))
  }
}

/// 单只手的映射状态：位置平滑窗口与手势历史
#[derive(Debug, Clone)]
pub struct ParameterMapper {
  config: Config,
  smoother: PositionSmoother,
  history: GestureHistory,
}

impl ParameterMapper {
  pub fn new(config: Config) -> Self {
    let smoother = PositionSmoother::new(config.smoothing_window);
    let history = GestureHistory::new(config.history_capacity);
    Self {
      config,
      smoother,
      history,
    }
  }

  pub fn map(&mut self, hand: &Hand, gesture: &Gesture) -> ParameterSet {
    let config = &self.config;
    let smoothed = self.smoother.push(hand.center());

    let region = &config.active_region;
    let x = smoothed.x.clamp(region.x_min, region.x_max);
    let y = smoothed.y.clamp(region.y_min, region.y_max);

    let ranges = &config.ranges;
    // 输出区间反向：手越高（y 越小）音量越大
    let volume = map_range(y, region.y_min, region.y_max, ranges.volume.max, ranges.volume.min);
    let pitch = map_range(x, region.x_min, region.x_max, ranges.pitch.min, ranges.pitch.max);
    let reverb = map_range(
      smoothed.z,
      config.depth_range.min,
      config.depth_range.max,
      ranges.reverb.min,
      ranges.reverb.max,
    );

    let sound = if gesture.confidence > config.thresholds.gesture_confidence_min {
      if let Some(kind) = gesture.kind {
        self.history.push(kind);
      }
      Some(config.instruments.lookup(gesture.kind))
    } else {
      None
    };

    let tempo = match self.smoother.motion() {
      Some(motion) => map_range(
        motion,
        config.motion_range.min,
        config.motion_range.max,
        ranges.tempo.min,
        ranges.tempo.max,
      ),
      None => ranges.tempo.midpoint(),
    };

    let hand_size = (fingertip_deviation(&hand.finger_tips()) / config.hand_size_scale).min(1.0);

    let params = ParameterSet {
      volume,
      pitch,
      tempo,
      reverb,
      sound,
      hand_size,
    };
    debug!("{} 手参数: {:?}", hand.side(), params);
    params
  }

  pub fn gesture_history(&self) -> &GestureHistory {
    &self.history
  }

  pub fn most_common_gesture(&self) -> Option<GestureKind> {
    self.history.most_common()
  }

  pub fn smoothed_position(&self) -> Option<Landmark> {
    self.smoother.smoothed()
  }

  pub fn reset(&mut self) {
    self.smoother.reset();
    self.history.reset();
  }
}

/// 指尖全部坐标分量的总体标准差
fn fingertip_deviation(tips: &[Landmark]) -> f32 {
  let values: Vec<f32> = tips.iter().flat_map(|p| [p.x, p.y, p.z]).collect();
  if values.is_empty() {
    return 0.0;
  }
  let n = values.len() as f32;
  let mean = values.iter().sum::<f32>() / n;
  let variance = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f32>() / n;
  variance.sqrt()
}
