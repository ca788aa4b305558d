// 该文件是 Shouyin （手音） 项目的一部分。
// src/hand.rs - 手部关键点与帧定义
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

use std::fmt;

use serde::Deserialize;
use thiserror::Error;

/// 21 点手部骨架的关键点索引
pub mod landmarks {
  pub const WRIST: usize = 0;
  pub const THUMB_MCP: usize = 2;
  pub const THUMB_TIP: usize = 4;
  pub const INDEX_MCP: usize = 5;
  pub const INDEX_TIP: usize = 8;
  pub const MIDDLE_MCP: usize = 9;
  pub const MIDDLE_TIP: usize = 12;
  pub const RING_MCP: usize = 13;
  pub const RING_TIP: usize = 16;
  pub const PINKY_MCP: usize = 17;
  pub const PINKY_TIP: usize = 20;

  /// 拇指到小指的指尖
  pub const FINGER_TIPS: [usize; 5] = [THUMB_TIP, INDEX_TIP, MIDDLE_TIP, RING_TIP, PINKY_TIP];
  /// 伸展判定用的指根关节，拇指取 2 号点
  pub const FINGER_BASES: [usize; 5] = [THUMB_MCP, INDEX_MCP, MIDDLE_MCP, RING_MCP, PINKY_MCP];
}

pub const LANDMARK_COUNT: usize = 21;

#[derive(Error, Debug, PartialEq)]
pub enum HandError {
  #[error("关键点数量不匹配: 期望 {expected}, 实际 {actual}")]
  LandmarkCount { expected: usize, actual: usize },
  #[error("第 {0} 个关键点坐标不是有限数")]
  NonFinite(usize),
}

/// 图像归一化坐标系下的三维点，z 为相对深度
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Landmark {
  pub x: f32,
  pub y: f32,
  pub z: f32,
}

impl Landmark {
  pub const fn new(x: f32, y: f32, z: f32) -> Self {
    Self { x, y, z }
  }

  pub fn distance(&self, other: &Landmark) -> f32 {
    let dx = self.x - other.x;
    let dy = self.y - other.y;
    let dz = self.z - other.z;
    (dx * dx + dy * dy + dz * dz).sqrt()
  }

  pub fn is_finite(&self) -> bool {
    self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
  }

  /// 多个点的算术平均，空输入返回原点
  pub fn mean<'a, I>(points: I) -> Landmark
  where
    I: IntoIterator<Item = &'a Landmark>,
  {
    let mut sum = Landmark::default();
    let mut count = 0usize;
    for p in points {
      sum.x += p.x;
      sum.y += p.y;
      sum.z += p.z;
      count += 1;
    }
    if count == 0 {
      return sum;
    }
    let n = count as f32;
    Landmark::new(sum.x / n, sum.y / n, sum.z / n)
  }
}

impl From<[f32; 3]> for Landmark {
  fn from([x, y, z]: [f32; 3]) -> Self {
    Landmark { x, y, z }
  }
}

/// 左右手标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum Side {
  Left,
  Right,
}

impl fmt::Display for Side {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Side::Left => write!(f, "Left"),
      Side::Right => write!(f, "Right"),
    }
  }
}

/// 单只手：固定 21 个关键点加左右标签
#[derive(Debug, Clone)]
pub struct Hand {
  landmarks: [Landmark; LANDMARK_COUNT],
  side: Side,
}

impl Hand {
  pub fn new(side: Side, points: &[Landmark]) -> Result<Self, HandError> {
    let landmarks: [Landmark; LANDMARK_COUNT] =
      points.try_into().map_err(|_| HandError::LandmarkCount {
        expected: LANDMARK_COUNT,
        actual: points.len(),
      })?;

    if let Some(idx) = landmarks.iter().position(|p| !p.is_finite()) {
      return Err(HandError::NonFinite(idx));
    }

    Ok(Self { landmarks, side })
  }

  pub fn side(&self) -> Side {
    self.side
  }

  pub fn landmarks(&self) -> &[Landmark; LANDMARK_COUNT] {
    &self.landmarks
  }

  pub fn landmark(&self, idx: usize) -> &Landmark {
    &self.landmarks[idx]
  }

  pub fn wrist(&self) -> &Landmark {
    &self.landmarks[landmarks::WRIST]
  }

  pub fn finger_tips(&self) -> [Landmark; 5] {
    landmarks::FINGER_TIPS.map(|i| self.landmarks[i])
  }

  /// 全部 21 个点的质心
  pub fn center(&self) -> Landmark {
    Landmark::mean(self.landmarks.iter())
  }
}

impl TryFrom<(Side, Vec<[f32; 3]>)> for Hand {
  type Error = HandError;

  fn try_from((side, points): (Side, Vec<[f32; 3]>)) -> Result<Self, Self::Error> {
    let points: Vec<Landmark> = points.into_iter().map(Landmark::from).collect();
    Hand::new(side, &points)
  }
}

/// 检测器给出的一帧：零只或多只手
#[derive(Debug, Clone, Default)]
pub struct LandmarkFrame {
  pub index: u64,
  pub timestamp_ms: Option<u64>,
  pub hands: Vec<Hand>,
}

impl LandmarkFrame {
  pub fn is_empty(&self) -> bool {
    self.hands.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn points(n: usize) -> Vec<[f32; 3]> {
    (0..n).map(|i| [i as f32 * 0.01, 0.5, 0.0]).collect()
  }

  #[test]
  fn rejects_wrong_landmark_count() {
    let err = Hand::try_from((Side::Left, points(20))).unwrap_err();
    assert_eq!(
      err,
      HandError::LandmarkCount {
        expected: 21,
        actual: 20
      }
    );
  }

  #[test]
  fn rejects_non_finite_points() {
    let mut pts = points(21);
    pts[7][1] = f32::NAN;
    assert_eq!(
      Hand::try_from((Side::Right, pts)).unwrap_err(),
      HandError::NonFinite(7)
    );
  }

  #[test]
  fn center_is_mean_of_all_points() {
    let hand = Hand::try_from((Side::Right, points(21))).unwrap();
    let c = hand.center();
    assert!((c.x - 0.1).abs() < 1e-6);
    assert!((c.y - 0.5).abs() < 1e-6);
    assert_eq!(hand.finger_tips()[1], *hand.landmark(landmarks::INDEX_TIP));
  }
}
