// 该文件是 Shouyin （手音） 项目的一部分。
// src/feature.rs - 手部几何特征提取
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

//! 从一只手的 21 个关键点得到尺度无关的特征向量。
//!
//! 所有距离都以中指指尖到手腕的距离（`hand_size`）归一化，伸展判定使用
//! 指尖与指根到手腕距离的比值，因此与手离镜头远近无关。

use thiserror::Error;
use tracing::debug;

use crate::hand::{Hand, Landmark, landmarks};

pub const DEFAULT_THUMB_EXTENSION: f32 = 1.3;
pub const DEFAULT_FINGER_EXTENSION: f32 = 1.4;

// 指尖两两距离均值的归一化常数
const SPREAD_SCALE: f32 = 0.5;
// 指尖到掌心平均距离的归一化常数
const CURL_SCALE: f32 = 0.3;
// 掌心取前 9 个关键点的均值
const PALM_POINTS: usize = 9;
// 小于该值的手部尺寸视为退化
const MIN_HAND_SIZE: f32 = 1e-6;

#[derive(Error, Debug, PartialEq)]
pub enum FeatureError {
  #[error("手部尺寸退化: {hand_size}")]
  DegenerateHand { hand_size: f32 },
}

/// 特征名
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
  ThumbDist,
  IndexDist,
  MiddleDist,
  RingDist,
  PinkyDist,
  FingerSpread,
  FingerCurl,
  ThumbExtended,
  IndexExtended,
  MiddleExtended,
  RingExtended,
  PinkyExtended,
  FingersExtended,
  OtherFingersClosed,
  RingPinkyClosed,
  IndexMiddleSpread,
  ThumbPointingUp,
  IndexPointing,
}

impl Feature {
  pub const ALL: [Feature; 18] = [
    Feature::ThumbDist,
    Feature::IndexDist,
    Feature::MiddleDist,
    Feature::RingDist,
    Feature::PinkyDist,
    Feature::FingerSpread,
    Feature::FingerCurl,
    Feature::ThumbExtended,
    Feature::IndexExtended,
    Feature::MiddleExtended,
    Feature::RingExtended,
    Feature::PinkyExtended,
    Feature::FingersExtended,
    Feature::OtherFingersClosed,
    Feature::RingPinkyClosed,
    Feature::IndexMiddleSpread,
    Feature::ThumbPointingUp,
    Feature::IndexPointing,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      Feature::ThumbDist => "thumb_dist",
      Feature::IndexDist => "index_dist",
      Feature::MiddleDist => "middle_dist",
      Feature::RingDist => "ring_dist",
      Feature::PinkyDist => "pinky_dist",
      Feature::FingerSpread => "finger_spread",
      Feature::FingerCurl => "finger_curl",
      Feature::ThumbExtended => "thumb_extended",
      Feature::IndexExtended => "index_extended",
      Feature::MiddleExtended => "middle_extended",
      Feature::RingExtended => "ring_extended",
      Feature::PinkyExtended => "pinky_extended",
      Feature::FingersExtended => "fingers_extended",
      Feature::OtherFingersClosed => "other_fingers_closed",
      Feature::RingPinkyClosed => "ring_pinky_closed",
      Feature::IndexMiddleSpread => "index_middle_spread",
      Feature::ThumbPointingUp => "thumb_pointing_up",
      Feature::IndexPointing => "index_pointing",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeatureValue {
  Bool(bool),
  Scalar(f32),
}

/// 单帧单手的特征向量，每次调用重新计算
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureVector {
  /// 归一化分母：中指指尖到手腕的距离
  pub hand_size: f32,
  /// 拇指到小指，指尖到手腕距离 / hand_size
  pub tip_distances: [f32; 5],
  pub finger_spread: f32,
  pub finger_curl: f32,
  /// 拇指到小指的伸展标志
  pub extended: [bool; 5],
  pub fingers_extended: bool,
  pub other_fingers_closed: bool,
  pub ring_pinky_closed: bool,
  pub index_middle_spread: f32,
  pub thumb_pointing_up: bool,
  pub index_pointing: bool,
}

impl FeatureVector {
  pub fn get(&self, feature: Feature) -> FeatureValue {
    use FeatureValue::{Bool, Scalar};
    match feature {
      Feature::ThumbDist => Scalar(self.tip_distances[0]),
      Feature::IndexDist => Scalar(self.tip_distances[1]),
      Feature::MiddleDist => Scalar(self.tip_distances[2]),
      Feature::RingDist => Scalar(self.tip_distances[3]),
      Feature::PinkyDist => Scalar(self.tip_distances[4]),
      Feature::FingerSpread => Scalar(self.finger_spread),
      Feature::FingerCurl => Scalar(self.finger_curl),
      Feature::ThumbExtended => Bool(self.extended[0]),
      Feature::IndexExtended => Bool(self.extended[1]),
      Feature::MiddleExtended => Bool(self.extended[2]),
      Feature::RingExtended => Bool(self.extended[3]),
      Feature::PinkyExtended => Bool(self.extended[4]),
      Feature::FingersExtended => Bool(self.fingers_extended),
      Feature::OtherFingersClosed => Bool(self.other_fingers_closed),
      Feature::RingPinkyClosed => Bool(self.ring_pinky_closed),
      Feature::IndexMiddleSpread => Scalar(self.index_middle_spread),
      Feature::ThumbPointingUp => Bool(self.thumb_pointing_up),
      Feature::IndexPointing => Bool(self.index_pointing),
    }
  }

  /// 按特征名遍历，便于日志输出
  pub fn iter(&self) -> impl Iterator<Item = (&'static str, FeatureValue)> + '_ {
    Feature::ALL.iter().map(|f| (f.as_str(), self.get(*f)))
  }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureExtractor {
  thumb_extension: f32,
  finger_extension: f32,
}

impl Default for FeatureExtractor {
  fn default() -> Self {
    Self {
      thumb_extension: DEFAULT_THUMB_EXTENSION,
      finger_extension: DEFAULT_FINGER_EXTENSION,
    }
  }
}

impl FeatureExtractor {
  pub fn new(thumb_extension: f32, finger_extension: f32) -> Self {
    Self {
      thumb_extension,
      finger_extension,
    }
  }

  pub fn extract(&self, hand: &Hand) -> Result<FeatureVector, FeatureError> {
    let wrist = hand.wrist();
    let hand_size = hand.landmark(landmarks::MIDDLE_TIP).distance(wrist);
    if !hand_size.is_finite() || hand_size <= MIN_HAND_SIZE {
      return Err(FeatureError::DegenerateHand { hand_size });
    }

    let tips = hand.finger_tips();
    let bases = landmarks::FINGER_BASES.map(|i| *hand.landmark(i));

    let tip_to_wrist = tips.map(|t| t.distance(wrist));
    let tip_distances = tip_to_wrist.map(|d| d / hand_size);

    let mut extended = [false; 5];
    for (finger, flag) in extended.iter_mut().enumerate() {
      let ratio = if finger == 0 {
        self.thumb_extension
      } else {
        self.finger_extension
      };
      *flag = tip_to_wrist[finger] > bases[finger].distance(wrist) * ratio;
    }

    let [_, index, middle, ring, pinky] = extended;
    let extended_count = [index, middle, ring, pinky].iter().filter(|e| **e).count();

    let [thumb_tip, index_tip, middle_tip, _, _] = tips;

    let features = FeatureVector {
      hand_size,
      tip_distances,
      finger_spread: finger_spread(&tips),
      finger_curl: finger_curl(hand),
      extended,
      fingers_extended: extended_count >= 4,
      other_fingers_closed: !middle && !ring && !pinky,
      ring_pinky_closed: !ring && !pinky,
      index_middle_spread: index_tip.distance(&middle_tip) / hand_size,
      // 图像坐标 y 轴向下
      thumb_pointing_up: thumb_tip.y < wrist.y,
      index_pointing: index_tip.y < middle_tip.y,
    };

    debug!(
      "{} 手特征: {:?}",
      hand.side(),
      features.iter().collect::<Vec<_>>()
    );
    Ok(features)
  }
}

/// 指尖两两欧氏距离的均值，归一化到 [0, 1]
pub fn finger_spread(tips: &[Landmark]) -> f32 {
  if tips.len() < 2 {
    return 0.0;
  }

  let mut sum = 0.0f32;
  let mut pairs = 0usize;
  for (i, a) in tips.iter().enumerate() {
    for b in &tips[i + 1..] {
      sum += a.distance(b);
      pairs += 1;
    }
  }

  (sum / pairs as f32 / SPREAD_SCALE).clamp(0.0, 1.0)
}

/// 指尖越靠近掌心，卷曲度越接近 1
pub fn finger_curl(hand: &Hand) -> f32 {
  let palm = Landmark::mean(hand.landmarks()[..PALM_POINTS].iter());
  let tips = hand.finger_tips();
  let avg = tips.iter().map(|t| t.distance(&palm)).sum::<f32>() / tips.len() as f32;
  1.0 - (avg / CURL_SCALE).min(1.0)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::hand::Side;

  /// 以手腕为圆心的扇形手：每根手指 4 个关节从 base_r 线性伸到 tip_r
  fn fan_hand(tip_r: f32, base_r: f32, step: f32) -> Hand {
    let wrist = Landmark::new(0.5, 0.8, 0.0);
    let mut points = vec![wrist];
    for finger in 0..5 {
      let theta = -std::f32::consts::FRAC_PI_2 + (finger as f32 - 2.0) * step;
      for k in 0..4 {
        let r = base_r + (tip_r - base_r) * k as f32 / 3.0;
        points.push(Landmark::new(
          wrist.x + r * theta.cos(),
          wrist.y + r * theta.sin(),
          0.0,
        ));
      }
    }
    Hand::new(Side::Right, &points).unwrap()
  }

  #[test]
  fn open_fan_has_all_fingers_extended() {
    let features = FeatureExtractor::default()
      .extract(&fan_hand(0.4, 0.1, 0.55))
      .unwrap();
    assert_eq!(features.extended, [true; 5]);
    assert!(features.fingers_extended);
    assert!(!features.other_fingers_closed);
    assert!(features.thumb_pointing_up);
    assert!((features.finger_spread - 0.802).abs() < 0.01);
    assert!((features.hand_size - 0.4).abs() < 1e-5);
    assert!((features.tip_distances[2] - 1.0).abs() < 1e-5);
  }

  #[test]
  fn curled_fan_has_no_finger_extended() {
    let features = FeatureExtractor::default()
      .extract(&fan_hand(0.08, 0.1, 0.3))
      .unwrap();
    assert_eq!(features.extended, [false; 5]);
    assert!(!features.fingers_extended);
    assert!(features.other_fingers_closed);
    assert!(features.ring_pinky_closed);
    assert!(features.finger_spread < 0.3);
    assert!(features.finger_curl > 0.5);
  }

  #[test]
  fn coincident_landmarks_are_degenerate() {
    let hand = Hand::new(Side::Left, &[Landmark::new(0.3, 0.3, 0.0); 21]).unwrap();
    assert!(matches!(
      FeatureExtractor::default().extract(&hand),
      Err(FeatureError::DegenerateHand { .. })
    ));
  }

  #[test]
  fn spread_needs_two_tips() {
    assert_eq!(finger_spread(&[]), 0.0);
    assert_eq!(finger_spread(&[Landmark::new(0.1, 0.1, 0.0)]), 0.0);
    let far = [Landmark::new(0.0, 0.0, 0.0), Landmark::new(2.0, 0.0, 0.0)];
    assert_eq!(finger_spread(&far), 1.0);
  }

  #[test]
  fn lookup_matches_fields() {
    let features = FeatureExtractor::default()
      .extract(&fan_hand(0.4, 0.1, 0.55))
      .unwrap();
    assert_eq!(features.get(Feature::IndexExtended), FeatureValue::Bool(true));
    assert_eq!(
      features.get(Feature::FingerSpread),
      FeatureValue::Scalar(features.finger_spread)
    );
    assert_eq!(features.iter().count(), 18);
  }
}
