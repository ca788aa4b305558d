// 该文件是 Shouyin （手音） 项目的一部分。
// src/task.rs - 任务驱动：单帧、重复基准与连续处理
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

use std::{
  thread,
  time::{Duration, Instant},
};
use tracing::{info, warn};

use crate::{output::Render, pipeline::Process};

/// 30 FPS 下每帧可用的处理时间
pub const FRAME_BUDGET: Duration = Duration::from_millis(33);

pub trait Task<I, P, O>: Sized {
  type Error;
  fn run_task(self, input: I, pipeline: P, output: O) -> Result<(), Self::Error>;
}

/// 只处理第一帧
pub struct OneShotTask;

impl<F, D, IE, PE, RE, I, P, O> Task<I, P, O> for OneShotTask
where
  IE: std::error::Error + Sync + Send + 'static,
  PE: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = Result<F, IE>>,
  P: Process<Input = F, Output = D, Error = PE>,
  O: Render<F, D, Error = RE>,
{
  type Error = anyhow::Error;

  fn run_task(self, mut input: I, mut pipeline: P, output: O) -> Result<(), Self::Error> {
    info!("开始任务...");
    let frame = input.next().ok_or_else(|| anyhow::anyhow!("没有输入帧"))??;
    info!("输入帧获取成功，开始处理...");
    let now = Instant::now();
    let result = pipeline.process(&frame)?;
    let elapsed = now.elapsed();
    info!("处理完成，耗时: {:.2?}", elapsed);
    output.render_result(&frame, &result)?;
    info!("输出完成，耗时: {:.2?}", now.elapsed());

    Ok(())
  }
}

/// 对第一帧重复处理，统计平均耗时
#[derive(Debug)]
pub struct RepeatShotTask {
  repeat_times: usize,
}

impl Default for RepeatShotTask {
  fn default() -> Self {
    Self { repeat_times: 1000 }
  }
}

impl RepeatShotTask {
  pub fn with_repeat_times(mut self, repeat_times: usize) -> Self {
    self.repeat_times = repeat_times.max(1);
    self
  }
}

/// 平均耗时，跳过前两次预热
pub fn mean_latency(times: &[Duration]) -> Option<Duration> {
  let skip = if times.len() > 2 { 2 } else { 0 };
  let measured = &times[skip..];
  if measured.is_empty() {
    return None;
  }
  Some(measured.iter().sum::<Duration>() / measured.len() as u32)
}

impl<F, D, IE, PE, RE, I, P, O> Task<I, P, O> for RepeatShotTask
where
  IE: std::error::Error + Sync + Send + 'static,
  PE: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = Result<F, IE>>,
  P: Process<Input = F, Output = D, Error = PE>,
  O: Render<F, D, Error = RE>,
{
  type Error = anyhow::Error;

  fn run_task(self, mut input: I, mut pipeline: P, output: O) -> Result<(), Self::Error> {
    info!("开始任务...");
    let frame = input.next().ok_or_else(|| anyhow::anyhow!("没有输入帧"))??;
    info!("输入帧获取成功，重复处理 {} 次...", self.repeat_times);
    let mut times = Vec::with_capacity(self.repeat_times);
    for i in 0..self.repeat_times {
      let now = Instant::now();
      let result = pipeline.process(&frame)?;
      let elapsed = now.elapsed();
      info!("({})处理完成，耗时: {:.2?}", i, elapsed);
      output.render_result(&frame, &result)?;
      times.push(elapsed);
    }

    if let Some(mean) = mean_latency(&times) {
      warn!("平均处理时间: {:.2?} (每帧预算 {:.2?})", mean, FRAME_BUDGET);
      if mean > FRAME_BUDGET {
        warn!("平均处理时间超出每帧预算");
      }
    }

    Ok(())
  }
}

/// 逐帧处理直到输入结束、达到帧数或收到 Ctrl-C
#[derive(Default, Debug)]
pub struct ContinuousTask {
  frame_number: Option<usize>,
}

impl ContinuousTask {
  pub fn with_frame_number(mut self, frame_number: Option<usize>) -> Self {
    self.frame_number = frame_number;
    self
  }
}

impl<F, D, IE, PE, RE, I, P, O> Task<I, P, O> for ContinuousTask
where
  IE: std::error::Error + Sync + Send + 'static,
  PE: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = Result<F, IE>>,
  P: Process<Input = F, Output = D, Error = PE>,
  O: Render<F, D, Error = RE>,
{
  type Error = anyhow::Error;

  fn run_task(self, input: I, mut pipeline: P, output: O) -> Result<(), Self::Error> {
    info!("开始任务...");
    let (tx, rx) = std::sync::mpsc::channel();

    let handler = ctrlc::set_handler(move || {
      info!("收到中断信号，准备退出...");
      let _ = tx.send(());
      thread::spawn(|| {
        thread::sleep(Duration::from_secs(30));
        warn!("强制退出程序");
        std::process::exit(1);
      });
    });
    if let Err(e) = handler {
      warn!("无法设置 Ctrl-C 处理: {}", e);
    }

    let mut frame_count = 0usize;
    let mut over_budget = 0usize;
    for frame in input {
      let frame = frame?;
      frame_count += 1;
      let now = Instant::now();
      let result = pipeline.process(&frame)?;
      let elapsed_a = now.elapsed();
      output.render_result(&frame, &result)?;
      let elapsed_b = now.elapsed();
      info!("第 {} 帧处理完成，耗时: {:.2?} / {:.2?}", frame_count, elapsed_a, elapsed_b);
      if elapsed_b > FRAME_BUDGET {
        over_budget += 1;
      }
      if self.frame_number.is_some_and(|n| frame_count >= n) {
        info!("达到指定帧数 {}, 退出任务循环", frame_count);
        break;
      }
      if rx.try_recv().is_ok() {
        warn!("中断信号接收，退出任务循环");
        break;
      }
    }

    if over_budget > 0 {
      warn!("{} / {} 帧超出每帧预算 {:.2?}", over_budget, frame_count, FRAME_BUDGET);
    }
    info!("任务完成，共处理 {} 帧，退出", frame_count);
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::cell::RefCell;
  use std::convert::Infallible;
  use std::io;

  struct Doubler;

  impl Process for Doubler {
    type Input = u32;
    type Output = u32;
    type Error = Infallible;

    fn process(&mut self, input: &u32) -> Result<u32, Infallible> {
      Ok(input * 2)
    }
  }

  #[derive(Default)]
  struct Collect(RefCell<Vec<(u32, u32)>>);

  impl Render<u32, u32> for &Collect {
    type Error = Infallible;

    fn render_result(&self, frame: &u32, result: &u32) -> Result<(), Infallible> {
      self.0.borrow_mut().push((*frame, *result));
      Ok(())
    }
  }

  fn frames(values: &[u32]) -> impl Iterator<Item = Result<u32, io::Error>> + '_ {
    values.iter().map(|v| Ok(*v))
  }

  #[test]
  fn one_shot_uses_first_frame() {
    let sink = Collect::default();
    OneShotTask.run_task(frames(&[3, 4]), Doubler, &sink).unwrap();
    assert_eq!(*sink.0.borrow(), vec![(3, 6)]);
  }

  #[test]
  fn one_shot_without_frames_fails() {
    let sink = Collect::default();
    assert!(OneShotTask.run_task(frames(&[]), Doubler, &sink).is_err());
  }

  #[test]
  fn repeat_shot_repeats_first_frame() {
    let sink = Collect::default();
    RepeatShotTask::default()
      .with_repeat_times(5)
      .run_task(frames(&[7, 8]), Doubler, &sink)
      .unwrap();
    assert_eq!(*sink.0.borrow(), vec![(7, 14); 5]);
  }

  #[test]
  fn mean_latency_skips_warmup() {
    let ms = Duration::from_millis;
    assert_eq!(mean_latency(&[ms(100), ms(50), ms(2), ms(4)]), Some(ms(3)));
    assert_eq!(mean_latency(&[ms(6)]), Some(ms(6)));
    assert_eq!(mean_latency(&[]), None);
  }

  #[test]
  fn continuous_stops_at_frame_number_and_on_error() {
    let sink = Collect::default();
    ContinuousTask::default()
      .with_frame_number(Some(2))
      .run_task(frames(&[1, 2, 3]), Doubler, &sink)
      .unwrap();
    assert_eq!(*sink.0.borrow(), vec![(1, 2), (2, 4)]);

    let sink = Collect::default();
    let input: Vec<Result<u32, io::Error>> = vec![Ok(1), Err(io::Error::other("坏帧")), Ok(3)];
    assert!(
      ContinuousTask::default()
        .run_task(input.into_iter(), Doubler, &sink)
        .is_err()
    );
    assert_eq!(*sink.0.borrow(), vec![(1, 2)]);
  }
}
