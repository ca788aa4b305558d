// 该文件是 Shouyin （手音） 项目的一部分。
// src/pipeline.rs - 逐帧处理流水线
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

use std::collections::HashMap;
use std::convert::Infallible;

use tracing::{debug, warn};

use crate::{
  config::Config,
  feature::FeatureError,
  hand::{Hand, LandmarkFrame, Side},
  mapping::{ParameterMapper, ParameterSet},
  model::{Gesture, HeuristicModel, Model},
};

/// 有状态的逐帧处理
pub trait Process {
  type Input;
  type Output;
  type Error;

  fn process(&mut self, input: &Self::Input) -> Result<Self::Output, Self::Error>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct HandResult {
  pub gesture: Gesture,
  pub params: ParameterSet,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameResult {
  pub index: u64,
  pub timestamp_ms: Option<u64>,
  /// 按处理顺序
  pub hands: Vec<HandResult>,
}

impl FrameResult {
  /// 本帧输出的参数：最后处理的那只手
  pub fn params(&self) -> Option<&ParameterSet> {
    self.hands.last().map(|h| &h.params)
  }

  pub fn is_empty(&self) -> bool {
    self.hands.is_empty()
  }
}

/// 手势识别加参数映射，平滑窗口与手势历史按左右手分开保存
#[derive(Debug, Clone)]
pub struct GesturePipeline<M = HeuristicModel> {
  config: Config,
  model: M,
  mappers: HashMap<Side, ParameterMapper>,
}

impl GesturePipeline<HeuristicModel> {
  pub fn new(config: Config) -> Self {
    let model = HeuristicModel::new(config.feature_extractor());
    Self::with_model(config, model)
  }
}

impl<M> GesturePipeline<M>
where
  M: Model<Input = Hand, Output = Gesture, Error = FeatureError>,
{
  pub fn with_model(config: Config, model: M) -> Self {
    Self {
      config,
      model,
      mappers: HashMap::with_capacity(2),
    }
  }

  pub fn classify(&self, hand: &Hand) -> Gesture {
    match self.model.infer(hand) {
      Ok(gesture) => gesture,
      Err(FeatureError::DegenerateHand { hand_size }) => {
        warn!(
          "{} 手关键点退化 (hand_size = {}), 本帧手势视为 unknown",
          hand.side(),
          hand_size
        );
        Gesture::unknown(hand.side())
      }
    }
  }

  pub fn process_hand(&mut self, hand: &Hand) -> HandResult {
    let gesture = self.classify(hand);
    debug!("识别结果: {}", gesture);

    let config = &self.config;
    let mapper = self
      .mappers
      .entry(hand.side())
      .or_insert_with(|| ParameterMapper::new(config.clone()));
    let params = mapper.map(hand, &gesture);

    HandResult { gesture, params }
  }

  pub fn mapper(&self, side: Side) -> Option<&ParameterMapper> {
    self.mappers.get(&side)
  }

  pub fn reset(&mut self) {
    self.mappers.clear();
  }
}

impl<M> Process for GesturePipeline<M>
where
  M: Model<Input = Hand, Output = Gesture, Error = FeatureError>,
{
  type Input = LandmarkFrame;
  type Output = FrameResult;
  type Error = Infallible;

  fn process(&mut self, frame: &Self::Input) -> Result<Self::Output, Self::Error> {
    if frame.hands.len() > self.config.max_hands {
      warn!(
        "帧 {} 检测到 {} 只手，仅处理前 {} 只",
        frame.index,
        frame.hands.len(),
        self.config.max_hands
      );
    }

    let hands = frame
      .hands
      .iter()
      .take(self.config.max_hands)
      .map(|hand| self.process_hand(hand))
      .collect();

    Ok(FrameResult {
      index: frame.index,
      timestamp_ms: frame.timestamp_ms,
      hands,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::hand::Landmark;

  fn hand_at(side: Side, x: f32, y: f32) -> Hand {
    let mut points = [Landmark::new(x, y, 0.0); 21];
    points[12].y -= 0.1;
    Hand::new(side, &points).unwrap()
  }

  fn frame(index: u64, hands: Vec<Hand>) -> LandmarkFrame {
    LandmarkFrame {
      index,
      timestamp_ms: None,
      hands,
    }
  }

  #[test]
  fn degenerate_hand_is_unknown_but_still_mapped() {
    let mut pipeline = GesturePipeline::new(Config::default());
    let hand = Hand::new(Side::Left, &[Landmark::new(0.5, 0.5, 0.0); 21]).unwrap();
    let result = pipeline.process(&frame(0, vec![hand])).unwrap();
    let hand = &result.hands[0];
    assert_eq!(hand.gesture, Gesture::unknown(Side::Left));
    assert_eq!(hand.params.sound, None);
    assert!((hand.params.volume - 0.5).abs() < 1e-6);
  }

  #[test]
  fn last_hand_wins_but_state_is_per_side() {
    let mut pipeline = GesturePipeline::new(Config::default());
    let result = pipeline
      .process(&frame(
        0,
        vec![hand_at(Side::Left, 0.2, 0.2), hand_at(Side::Right, 0.8, 0.8)],
      ))
      .unwrap();
    assert_eq!(result.hands.len(), 2);
    assert_eq!(result.params(), Some(&result.hands[1].params));

    // 两只手都是各自的第一帧
    assert_eq!(result.hands[0].params.tempo, 130.0);
    assert_eq!(result.hands[1].params.tempo, 130.0);

    let left = pipeline.mapper(Side::Left).unwrap().smoothed_position().unwrap();
    let right = pipeline.mapper(Side::Right).unwrap().smoothed_position().unwrap();
    assert!(left.x < 0.3 && right.x > 0.7);
  }

  #[test]
  fn extra_hands_are_dropped() {
    let mut config = Config::default();
    config.max_hands = 1;
    let mut pipeline = GesturePipeline::new(config);
    let result = pipeline
      .process(&frame(
        3,
        vec![hand_at(Side::Left, 0.2, 0.2), hand_at(Side::Right, 0.8, 0.8)],
      ))
      .unwrap();
    assert_eq!(result.index, 3);
    assert_eq!(result.hands.len(), 1);
    assert!(pipeline.mapper(Side::Right).is_none());
  }

  #[test]
  fn reset_forgets_every_side() {
    let mut pipeline = GesturePipeline::new(Config::default());
    pipeline
      .process(&frame(
        0,
        vec![hand_at(Side::Left, 0.2, 0.2), hand_at(Side::Right, 0.8, 0.8)],
      ))
      .unwrap();
    pipeline.reset();
    assert!(pipeline.mapper(Side::Left).is_none());
    assert!(pipeline.mapper(Side::Right).is_none());

    let result = pipeline
      .process(&frame(1, vec![hand_at(Side::Left, 0.9, 0.9)]))
      .unwrap();
    assert_eq!(result.params().unwrap().tempo, 130.0);
  }

  #[test]
  fn empty_frame_has_no_params() {
    let mut pipeline = GesturePipeline::new(Config::default());
    let result = pipeline.process(&frame(0, vec![])).unwrap();
    assert!(result.is_empty());
    assert_eq!(result.params(), None);
  }
}
