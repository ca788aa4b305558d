// 该文件是 Shouyin （手音） 项目的一部分。
// src/output/console_output.rs - 控制台参数输出
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

use std::sync::Mutex;

use thiserror::Error;
use tracing::{error, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  hand::LandmarkFrame,
  mapping::ParameterSet,
  output::Render,
  pipeline::FrameResult,
};

// 任一参数变化超过该值才打印
const CHANGE_THRESHOLD: f32 = 0.05;

#[derive(Error, Debug)]
pub enum ConsoleOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
}

#[derive(Debug, Default)]
struct ConsoleState {
  last_params: Option<ParameterSet>,
  last_sound: Option<u32>,
}

/// 不连接合成器，只把参数打印到日志
#[derive(Debug, Default)]
pub struct ConsoleOutput {
  state: Mutex<ConsoleState>,
}

impl FromUrlWithScheme for ConsoleOutput {
  const SCHEME: &'static str = "console";
}

impl FromUrl for ConsoleOutput {
  type Error = ConsoleOutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(ConsoleOutputError::SchemeMismatch);
    }
    info!("使用控制台输出（不发送到合成器）");
    Ok(Self::default())
  }
}

fn changed(last: Option<&ParameterSet>, params: &ParameterSet) -> bool {
  let Some(last) = last else {
    return true;
  };
  params.iter().any(|(key, value)| match last.get(key) {
    Some(previous) => (previous - value).abs() > CHANGE_THRESHOLD,
    None => true,
  })
}

impl ConsoleOutput {
  /// 参数有明显变化时打印并返回 true
  pub fn show(&self, params: &ParameterSet) -> bool {
    let mut state = match self.state.lock() {
      Ok(guard) => guard,
      Err(poisoned) => poisoned.into_inner(),
    };

    if params.sound.is_some() {
      state.last_sound = params.sound;
    }

    if !changed(state.last_params.as_ref(), params) {
      return false;
    }

    info!(
      "参数: Vol={:.2}, Pitch={:.0}Hz, Tempo={:.0}BPM, Sound={}, Reverb={:.2}, HandSize={:.2}",
      params.volume,
      params.pitch,
      params.tempo,
      state.last_sound.unwrap_or_default(),
      params.reverb,
      params.hand_size
    );
    state.last_params = Some(*params);
    true
  }
}

impl Render<LandmarkFrame, FrameResult> for ConsoleOutput {
  type Error = ConsoleOutputError;

  fn render_result(&self, frame: &LandmarkFrame, result: &FrameResult) -> Result<(), Self::Error> {
    for hand in &result.hands {
      info!("帧 {}: {}", frame.index, hand.gesture);
    }
    if let Some(params) = result.params() {
      self.show(params);
    }
    Ok(())
  }
}
