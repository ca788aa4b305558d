// 该文件是 Shouyin （手音） 项目的一部分。
// src/mapping/range.rs - 线性区间映射
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

/// 将 `value` 从输入区间线性映射到输出区间，超出输入区间的值先截断。
///
/// `out_min > out_max` 时映射单调递减；输入区间退化（`in_min == in_max`）时
/// 取中点。
pub fn map_range(value: f32, in_min: f32, in_max: f32, out_min: f32, out_max: f32) -> f32 {
  let lo = in_min.min(in_max);
  let hi = in_min.max(in_max);
  let value = value.clamp(lo, hi);

  let t = if in_max == in_min {
    0.5
  } else {
    (value - in_min) / (in_max - in_min)
  };

  out_min + t * (out_max - out_min)
}
