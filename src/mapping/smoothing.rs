// 该文件是 Shouyin （手音） 项目的一部分。
// src/mapping/smoothing.rs - 位置平滑与手势历史
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

use std::collections::VecDeque;

use crate::{hand::Landmark, model::GestureKind};

/// 定长先进先出窗口，满时淘汰最旧元素，构造后不再分配内存
#[derive(Debug, Clone)]
pub struct RollingWindow<T> {
  items: VecDeque<T>,
  capacity: usize,
}

impl<T> RollingWindow<T> {
  pub fn new(capacity: usize) -> Self {
    let capacity = capacity.max(1);
    Self {
      items: VecDeque::with_capacity(capacity),
      capacity,
    }
  }

  /// 追加元素，返回被淘汰的最旧元素
  pub fn push(&mut self, item: T) -> Option<T> {
    let evicted = if self.items.len() == self.capacity {
      self.items.pop_front()
    } else {
      None
    };
    self.items.push_back(item);
    evicted
  }

  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  /// 从旧到新
  pub fn iter(&self) -> impl Iterator<Item = &T> {
    self.items.iter()
  }

  /// 倒数第 `n` 个元素，`n = 0` 为最新
  pub fn nth_back(&self, n: usize) -> Option<&T> {
    self
      .items
      .len()
      .checked_sub(n + 1)
      .and_then(|i| self.items.get(i))
  }

  pub fn clear(&mut self) {
    self.items.clear();
  }
}

/// 手部质心的滑动平均
#[derive(Debug, Clone)]
pub struct PositionSmoother {
  window: RollingWindow<Landmark>,
}

impl PositionSmoother {
  pub fn new(capacity: usize) -> Self {
    Self {
      window: RollingWindow::new(capacity),
    }
  }

  /// 追加原始位置并返回平滑后的位置
  pub fn push(&mut self, point: Landmark) -> Landmark {
    self.window.push(point);
    Landmark::mean(self.window.iter())
  }

  /// 窗口均值；窗口为空时为 `None`
  pub fn smoothed(&self) -> Option<Landmark> {
    if self.window.is_empty() {
      None
    } else {
      Some(Landmark::mean(self.window.iter()))
    }
  }

  /// 平滑位置与上一个原始样本的距离，样本不足 2 个时为 `None`
  pub fn motion(&self) -> Option<f32> {
    let previous = self.window.nth_back(1)?;
    let current = self.smoothed()?;
    Some(current.distance(previous))
  }

  pub fn len(&self) -> usize {
    self.window.len()
  }

  pub fn is_empty(&self) -> bool {
    self.window.is_empty()
  }

  pub fn reset(&mut self) {
    self.window.clear();
  }
}

/// 最近若干个高置信度手势
#[derive(Debug, Clone)]
pub struct GestureHistory {
  window: RollingWindow<GestureKind>,
}

impl GestureHistory {
  pub fn new(capacity: usize) -> Self {
    Self {
      window: RollingWindow::new(capacity),
    }
  }

  pub fn push(&mut self, kind: GestureKind) {
    self.window.push(kind);
  }

  /// 出现次数最多的手势；并列时取在窗口中最先出现者
  pub fn most_common(&self) -> Option<GestureKind> {
    // 按首次出现的顺序计数
    let mut tally: Vec<(GestureKind, usize)> = Vec::with_capacity(self.window.len());
    for kind in self.window.iter() {
      match tally.iter_mut().find(|(k, _)| k == kind) {
        Some(entry) => entry.1 += 1,
        None => tally.push((*kind, 1)),
      }
    }

    let mut best: Option<(GestureKind, usize)> = None;
    for (kind, count) in tally {
      if best.is_none_or(|(_, c)| count > c) {
        best = Some((kind, count));
      }
    }
    best.map(|(kind, _)| kind)
  }

  /// 从旧到新
  pub fn iter(&self) -> impl Iterator<Item = GestureKind> + '_ {
    self.window.iter().copied()
  }

  pub fn len(&self) -> usize {
    self.window.len()
  }

  pub fn is_empty(&self) -> bool {
    self.window.is_empty()
  }

  pub fn reset(&mut self) {
    self.window.clear();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use GestureKind::{Fist, OpenPalm, PeaceSign};

  #[test]
  fn window_evicts_oldest() {
    let mut w = RollingWindow::new(3);
    assert_eq!(w.push(1), None);
    w.push(2);
    w.push(3);
    assert_eq!(w.push(4), Some(1));
    assert_eq!(w.iter().copied().collect::<Vec<_>>(), vec![2, 3, 4]);
    assert_eq!(w.len(), 3);
    assert_eq!(w.nth_back(0), Some(&4));
    assert_eq!(w.nth_back(2), Some(&2));
    assert_eq!(w.nth_back(3), None);
  }

  #[test]
  fn smoother_keeps_last_k_samples() {
    let k = 5;
    let mut s = PositionSmoother::new(k);
    // 第一个样本远离其他样本，淘汰后不应影响均值
    s.push(Landmark::new(100.0, 100.0, 100.0));
    for i in 1..=k {
      s.push(Landmark::new(i as f32, 0.0, 0.0));
    }
    assert_eq!(s.len(), k);
    let p = s.smoothed().unwrap();
    assert!((p.x - 3.0).abs() < 1e-6);
    assert_eq!(p.y, 0.0);
  }

  #[test]
  fn motion_needs_two_samples() {
    let mut s = PositionSmoother::new(5);
    assert_eq!(s.smoothed(), None);
    s.push(Landmark::new(0.5, 0.5, 0.0));
    assert_eq!(s.motion(), None);
    s.push(Landmark::new(0.7, 0.5, 0.0));
    // 平滑位置 (0.6, 0.5) 与上一个原始样本 (0.5, 0.5) 相距 0.1
    assert!((s.motion().unwrap() - 0.1).abs() < 1e-6);
  }

  #[test]
  fn most_common_counts_votes() {
    let mut h = GestureHistory::new(5);
    assert_eq!(h.most_common(), None);
    for k in [OpenPalm, OpenPalm, Fist] {
      h.push(k);
    }
    assert_eq!(h.most_common(), Some(OpenPalm));
  }

  #[test]
  fn most_common_tie_goes_to_earliest_label() {
    let mut h = GestureHistory::new(5);
    for k in [OpenPalm, Fist, OpenPalm, Fist] {
      h.push(k);
    }
    assert_eq!(h.most_common(), Some(OpenPalm));

    let mut h = GestureHistory::new(5);
    for k in [Fist, PeaceSign, PeaceSign, Fist] {
      h.push(k);
    }
    assert_eq!(h.most_common(), Some(Fist));

    // 淘汰后以窗口内的首次出现为准
    let mut h = GestureHistory::new(4);
    for k in [OpenPalm, PeaceSign, Fist, Fist, PeaceSign] {
      h.push(k);
    }
    assert_eq!(h.most_common(), Some(PeaceSign));
  }

  #[test]
  fn reset_empties_history_and_smoother() {
    let mut h = GestureHistory::new(3);
    h.push(Fist);
    h.reset();
    assert!(h.is_empty());
    assert_eq!(h.most_common(), None);

    let mut s = PositionSmoother::new(3);
    s.push(Landmark::new(0.2, 0.2, 0.0));
    s.reset();
    assert!(s.is_empty());
    assert_eq!(s.smoothed(), None);
  }

  #[test]
  fn history_is_bounded() {
    let mut h = GestureHistory::new(5);
    for _ in 0..3 {
      h.push(Fist);
    }
    for _ in 0..4 {
      h.push(PeaceSign);
    }
    assert_eq!(h.len(), 5);
    assert_eq!(h.most_common(), Some(PeaceSign));
  }
}
