// 该文件是 Shouyin （手音） 项目的一部分。
// src/model/profile.rs - 手势规则表
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

use crate::{feature::Feature, model::GestureKind};

/// 规则期望：布尔值相等，或落在闭区间内
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Expect {
  Bool(bool),
  Range(f32, f32),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rule {
  pub feature: Feature,
  pub expect: Expect,
}

const fn is(feature: Feature, value: bool) -> Rule {
  Rule {
    feature,
    expect: Expect::Bool(value),
  }
}

const fn within(feature: Feature, min: f32, max: f32) -> Rule {
  Rule {
    feature,
    expect: Expect::Range(min, max),
  }
}

const OPEN_PALM: [Rule; 3] = [
  within(Feature::FingerSpread, 0.6, 1.0),
  is(Feature::ThumbExtended, true),
  is(Feature::FingersExtended, true),
];

const FIST: [Rule; 3] = [
  within(Feature::FingerSpread, 0.0, 0.3),
  is(Feature::ThumbExtended, false),
  is(Feature::FingersExtended, false),
];

const PEACE_SIGN: [Rule; 4] = [
  is(Feature::IndexExtended, true),
  is(Feature::MiddleExtended, true),
  is(Feature::RingPinkyClosed, true),
  within(Feature::FingerSpread, 0.4, 0.8),
];

const THUMBS_UP: [Rule; 3] = [
  is(Feature::ThumbExtended, true),
  is(Feature::OtherFingersClosed, true),
  is(Feature::ThumbPointingUp, true),
];

const POINTING: [Rule; 3] = [
  is(Feature::IndexExtended, true),
  is(Feature::OtherFingersClosed, true),
  is(Feature::IndexPointing, true),
];

impl GestureKind {
  pub fn rules(&self) -> &'static [Rule] {
    match self {
      GestureKind::OpenPalm => &OPEN_PALM,
      GestureKind::Fist => &FIST,
      GestureKind::PeaceSign => &PEACE_SIGN,
      GestureKind::ThumbsUp => &THUMBS_UP,
      GestureKind::Pointing => &POINTING,
    }
  }
}
