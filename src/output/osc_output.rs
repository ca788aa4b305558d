// 该文件是 Shouyin （手音） 项目的一部分。
// src/output/osc_output.rs - OSC 合成器参数输出
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

use std::net::UdpSocket;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use rosc::{OscMessage, OscPacket, OscType, encoder};
use thiserror::Error;
use tracing::{debug, error, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  hand::LandmarkFrame,
  mapping::ParameterSet,
  output::Render,
  pipeline::FrameResult,
};

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 4560;
const DEFAULT_RATE: f64 = 30.0;
// 频率无效时使用中央 C
const FALLBACK_MIDI_NOTE: i32 = 60;

#[derive(Error, Debug)]
pub enum OscOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("OSC 编码错误: {0}")]
  EncodeError(#[from] rosc::OscError),
  #[error("参数无效: {0}")]
  InvalidParameter(String),
}

/// 频率（Hz）转 MIDI 音符号，A4 = 440 Hz = 69
pub fn frequency_to_midi(frequency: f32) -> i32 {
  if frequency.is_nan() || frequency <= 0.0 {
    return FALLBACK_MIDI_NOTE;
  }
  (69.0 + 12.0 * (frequency / 440.0).log2()).round() as i32
}

/// 以 OSC 消息把参数发送给外部合成器
pub struct OscOutput {
  socket: UdpSocket,
  target: String,
  min_interval: Duration,
  last_update: Mutex<Option<Instant>>,
}

impl FromUrlWithScheme for OscOutput {
  const SCHEME: &'static str = "osc";
}

impl FromUrl for OscOutput {
  type Error = OscOutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(OscOutputError::SchemeMismatch);
    }

    let query_pairs: std::collections::HashMap<_, _> = url.query_pairs().collect();
    let rate: f64 = query_pairs
      .get("rate")
      .and_then(|v| v.parse().ok())
      .unwrap_or(DEFAULT_RATE);
    if !(rate > 0.0) {
      return Err(OscOutputError::InvalidParameter(format!("rate = {}", rate)));
    }

    let host = url
      .host_str()
      .filter(|h| !h.is_empty())
      .unwrap_or(DEFAULT_HOST);
    let port = url.port().unwrap_or(DEFAULT_PORT);

    Self::connect(&format!("{}:{}", host, port), rate)
  }
}

impl OscOutput {
  pub fn connect(target: &str, rate: f64) -> Result<Self, OscOutputError> {
    let socket = UdpSocket::bind("0.0.0.0:0")?;
    info!("OSC 输出目标: {} ({} 次/秒)", target, rate);
    Ok(Self {
      socket,
      target: target.to_string(),
      min_interval: Duration::from_secs_f64(1.0 / rate),
      last_update: Mutex::new(None),
    })
  }

  fn send(&self, addr: &str, arg: OscType) -> Result<(), OscOutputError> {
    let packet = OscPacket::Message(OscMessage {
      addr: addr.to_string(),
      args: vec![arg],
    });
    let data = encoder::encode(&packet)?;
    self.socket.send_to(&data, &self.target)?;
    Ok(())
  }

  /// 发送 `/test 1` 以确认合成器端在监听
  pub fn send_test_signal(&self) -> Result<(), OscOutputError> {
    self.send("/test", OscType::Int(1))?;
    info!("测试信号已发送到 {}", self.target);
    Ok(())
  }

  /// 距上次发送不足最小间隔时返回 false
  fn acquire_slot(&self) -> bool {
    let mut last = match self.last_update.lock() {
      Ok(guard) => guard,
      Err(poisoned) => poisoned.into_inner(),
    };
    let now = Instant::now();
    if last.is_some_and(|t| now.duration_since(t) < self.min_interval) {
      return false;
    }
    *last = Some(now);
    true
  }

  pub fn send_parameters(&self, params: &ParameterSet) -> Result<(), OscOutputError> {
    if !self.acquire_slot() {
      debug!("距上次发送过近，跳过本次参数");
      return Ok(());
    }

    self.send("/volume", OscType::Float(params.volume))?;
    self.send("/pitch", OscType::Float(params.pitch))?;
    self.send("/note", OscType::Int(frequency_to_midi(params.pitch)))?;
    self.send("/tempo", OscType::Float(params.tempo))?;
    self.send("/reverb", OscType::Float(params.reverb))?;
    // 缺省时不发送，合成器保持当前音色
    if let Some(sound) = params.sound {
      self.send("/sound", OscType::Int(sound as i32))?;
    }
    self.send("/hand_size", OscType::Float(params.hand_size))?;
    Ok(())
  }
}

impl Render<LandmarkFrame, FrameResult> for OscOutput {
  type Error = OscOutputError;

  fn render_result(&self, _frame: &LandmarkFrame, result: &FrameResult) -> Result<(), Self::Error> {
    match result.params() {
      Some(params) => self.send_parameters(params),
      None => Ok(()),
    }
  }
}
