// 该文件是 Shouyin （手音） 项目的一部分。
// src/output.rs - 输出定义
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

use crate::FromUrl;
#[cfg(any(feature = "osc_output", feature = "console_output", feature = "directory_record"))]
use crate::FromUrlWithScheme;
use crate::hand::LandmarkFrame;
use crate::pipeline::FrameResult;
use thiserror::Error;
use url::Url;

pub trait Render<Frame, Output>: Sized {
  type Error;
  fn render_result(&self, frame: &Frame, result: &Output) -> Result<(), Self::Error>;
}

#[cfg(feature = "osc_output")]
mod osc_output;
#[cfg(feature = "osc_output")]
pub use self::osc_output::{OscOutput, OscOutputError, frequency_to_midi};

#[cfg(feature = "console_output")]
mod console_output;
#[cfg(feature = "console_output")]
pub use self::console_output::{ConsoleOutput, ConsoleOutputError};

#[cfg(feature = "directory_record")]
mod directory_record;
#[cfg(feature = "directory_record")]
pub use self::directory_record::{DirectoryRecordOutput, DirectoryRecordOutputError};

#[derive(Error, Debug)]
pub enum OutputError {
  #[cfg(feature = "osc_output")]
  #[error("OSC 输出错误: {0}")]
  OscOutputError(#[from] OscOutputError),
  #[cfg(feature = "console_output")]
  #[error("控制台输出错误: {0}")]
  ConsoleOutputError(#[from] ConsoleOutputError),
  #[cfg(feature = "directory_record")]
  #[error("目录记录输出错误: {0}")]
  DirectoryRecordOutputError(#[from] DirectoryRecordOutputError),
  #[error("URI 方案不匹配")]
  SchemeMismatch,
}

pub enum OutputWrapper {
  #[cfg(feature = "osc_output")]
  OscOutput(OscOutput),
  #[cfg(feature = "console_output")]
  ConsoleOutput(ConsoleOutput),
  #[cfg(feature = "directory_record")]
  DirectoryRecordOutput(DirectoryRecordOutput),
}

impl FromUrl for OutputWrapper {
  type Error = OutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    match url.scheme() {
      #[cfg(feature = "osc_output")]
      OscOutput::SCHEME => {
        let output = OscOutput::from_url(url)?;
        Ok(OutputWrapper::OscOutput(output))
      }
      #[cfg(feature = "console_output")]
      ConsoleOutput::SCHEME => {
        let output = ConsoleOutput::from_url(url)?;
        Ok(OutputWrapper::ConsoleOutput(output))
      }
      #[cfg(feature = "directory_record")]
      DirectoryRecordOutput::SCHEME => {
        let output = DirectoryRecordOutput::from_url(url)?;
        Ok(OutputWrapper::DirectoryRecordOutput(output))
      }
      _ => Err(OutputError::SchemeMismatch),
    }
  }
}

impl OutputWrapper {
  /// 只有 OSC 输出会真正发送测试信号
  pub fn send_test_signal(&self) -> Result<(), OutputError> {
    match self {
      #[cfg(feature = "osc_output")]
      OutputWrapper::OscOutput(output) => Ok(output.send_test_signal()?),
      #[allow(unreachable_patterns)]
      _ => Ok(()),
    }
  }
}

impl Render<LandmarkFrame, FrameResult> for OutputWrapper {
  type Error = OutputError;

  fn render_result(&self, frame: &LandmarkFrame, result: &FrameResult) -> Result<(), Self::Error> {
    match self {
      #[cfg(feature = "osc_output")]
      OutputWrapper::OscOutput(output) => output
        .render_result(frame, result)
        .map_err(OutputError::from),
      #[cfg(feature = "console_output")]
      OutputWrapper::ConsoleOutput(output) => output
        .render_result(frame, result)
        .map_err(OutputError::from),
      #[cfg(feature = "directory_record")]
      OutputWrapper::DirectoryRecordOutput(output) => output
        .render_result(frame, result)
        .map_err(OutputError::from),
    }
  }
}
