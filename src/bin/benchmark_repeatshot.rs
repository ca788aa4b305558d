// 该文件是 Shouyin （手音） 项目的一部分。
// src/bin/benchmark_repeatshot.rs - 重复处理单帧，测量平均耗时
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

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use url::Url;

use shouyin::{
  FromUrl,
  config::Config,
  input::InputWrapper,
  output::OutputWrapper,
  pipeline::GesturePipeline,
  task::{RepeatShotTask, Task},
};
use tracing::info;

/// Shouyin 基准测试参数
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 关键点输入来源
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,
  /// 参数输出
  #[arg(long, value_name = "OUTPUT")]
  pub output: Url,
  /// JSON 配置文件
  #[arg(long, value_name = "CONFIG")]
  pub config: Option<PathBuf>,
  /// 重复次数
  #[arg(long, value_name = "TIMES", default_value_t = 1000)]
  pub repeat_times: usize,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("输入来源: {}", args.input);
  info!("输出路径: {}", args.output);

  let config = Config::load(args.config.as_deref())?;
  let input = InputWrapper::from_url(&args.input)?;
  let pipeline = GesturePipeline::new(config);
  let output = OutputWrapper::from_url(&args.output)?;

  RepeatShotTask::default()
    .with_repeat_times(args.repeat_times)
    .run_task(input, pipeline, output)?;

  Ok(())
}
