// 该文件是 Shouyin （手音） 项目的一部分。
// src/model/scorer.rs - 规则匹配评分
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

use tracing::debug;

use crate::{
  feature::{FeatureError, FeatureExtractor, FeatureValue, FeatureVector},
  hand::{Hand, Side},
  model::{Expect, Gesture, GestureKind, Model, Rule, WithLabel},
};

// 区间外每偏离 1 个单位扣除的分数
const OUT_OF_RANGE_PENALTY: f32 = 2.0;

#[derive(Debug, Clone, Default)]
pub struct GestureScorer;

impl GestureScorer {
  pub fn new() -> Self {
    Self
  }

  /// 单条规则得分，取值 [0, 1]
  pub fn rule_score(rule: &Rule, features: &FeatureVector) -> f32 {
    match (rule.expect, features.get(rule.feature)) {
      (Expect::Bool(expected), FeatureValue::Bool(actual)) => {
        if expected == actual {
          1.0
        } else {
          0.0
        }
      }
      (Expect::Range(min, max), FeatureValue::Scalar(actual)) => {
        if (min..=max).contains(&actual) {
          1.0
        } else {
          let distance = if actual < min {
            min - actual
          } else {
            actual - max
          };
          // NaN 落入 max 得 0
          (1.0 - distance * OUT_OF_RANGE_PENALTY).max(0.0)
        }
      }
      _ => 0.0,
    }
  }

  /// 手势总分为规则得分之和除以规则数
  pub fn profile_score(kind: GestureKind, features: &FeatureVector) -> f32 {
    let rules = kind.rules();
    if rules.is_empty() {
      return 0.0;
    }
    let score: f32 = rules.iter().map(|r| Self::rule_score(r, features)).sum();
    score / rules.len() as f32
  }

  /// 按表序取严格最高分，平分时先出现者胜；最高分为 0 时为 unknown
  pub fn score(&self, features: &FeatureVector, side: Side) -> Gesture {
    let mut best: Option<GestureKind> = None;
    let mut best_score = 0.0f32;

    for kind in GestureKind::ALL {
      let score = Self::profile_score(kind, features);
      debug!("手势 {} 得分 {:.3}", kind.to_label_str(), score);
      if score > best_score {
        best_score = score;
        best = Some(kind);
      }
    }

    match best {
      Some(kind) => Gesture {
        kind: Some(kind),
        confidence: best_score.clamp(0.0, 1.0),
        side,
      },
      None => Gesture::unknown(side),
    }
  }
}

/// 特征提取加规则评分
#[derive(Debug, Clone, Default)]
pub struct HeuristicModel {
  extractor: FeatureExtractor,
  scorer: GestureScorer,
}

impl HeuristicModel {
  pub fn new(extractor: FeatureExtractor) -> Self {
    Self {
      extractor,
      scorer: GestureScorer::new(),
    }
  }
}

impl Model for HeuristicModel {
  type Input = Hand;
  type Output = Gesture;
  type Error = FeatureError;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    let features = self.extractor.extract(input)?;
    Ok(self.scorer.score(&features, input.side()))
  }
}
