// 该文件是 Shouyin （手音） 项目的一部分。
// src/model.rs - 手势模型
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

use crate::hand::Side;

pub trait Model {
  type Input;
  type Output;
  type Error;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error>;
}

pub trait WithLabel: Sized + std::fmt::Debug {
  fn to_label_str(&self) -> &'static str;
}

/// 内置的五种手势，顺序即评分时的遍历顺序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GestureKind {
  OpenPalm,
  Fist,
  PeaceSign,
  ThumbsUp,
  Pointing,
}

impl GestureKind {
  pub const ALL: [GestureKind; 5] = [
    GestureKind::OpenPalm,
    GestureKind::Fist,
    GestureKind::PeaceSign,
    GestureKind::ThumbsUp,
    GestureKind::Pointing,
  ];
}

impl WithLabel for GestureKind {
  fn to_label_str(&self) -> &'static str {
    match self {
      GestureKind::OpenPalm => "open_palm",
      GestureKind::Fist => "fist",
      GestureKind::PeaceSign => "peace_sign",
      GestureKind::ThumbsUp => "thumbs_up",
      GestureKind::Pointing => "pointing",
    }
  }

}

pub const UNKNOWN_GESTURE: &str = "unknown";

/// 单手单帧的识别结果；`kind` 为 `None` 表示未匹配任何手势
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gesture {
  pub kind: Option<GestureKind>,
  pub confidence: f32,
  pub side: Side,
}

impl Gesture {
  pub fn unknown(side: Side) -> Self {
    Self {
      kind: None,
      confidence: 0.0,
      side,
    }
  }

  pub fn name(&self) -> &'static str {
    self
      .kind
      .map(|k| k.to_label_str())
      .unwrap_or(UNKNOWN_GESTURE)
  }
}

impl fmt::Display for Gesture {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} ({:.2}) - {}", self.name(), self.confidence, self.side)
  }
}

mod profile;
mod scorer;
pub use self::profile::{Expect, Rule};
pub use self::scorer::{GestureScorer, HeuristicModel};
