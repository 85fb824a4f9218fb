// 该文件是 Shanan （山南西风） 项目的一部分。
// src/task.rs - 质检任务
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

use std::time::Instant;

use tracing::{info, warn};

use crate::{
  classify::{Classifier, Verdict},
  frame::InspectTensor,
  input::UploadedImage,
  model::{Model, RawModelOutput},
  output::Render,
  preprocess::preprocess,
  session::InspectionSession,
};

pub trait Task<I, M, O>: Sized {
  type Error;
  fn run_task(self, input: I, model: M, output: O) -> Result<InspectionSession, Self::Error>;
}

fn inspect_one<M, ME>(
  model: &M,
  classifier: &Classifier,
  upload: &UploadedImage,
) -> anyhow::Result<Verdict>
where
  ME: std::error::Error + Sync + Send + 'static,
  M: Model<Input = InspectTensor, Output = RawModelOutput, Error = ME>,
{
  let tensor = preprocess(&upload.image);
  let now = Instant::now();
  let output = model.infer(&tensor)?;
  let elapsed = now.elapsed();
  let verdict = classifier.classify(&output)?;
  info!(
    "{}: {} 置信度 {:.2}% 原始分数 {:.4} (推理耗时 {:.2?})",
    upload.display_name(),
    verdict.label(),
    verdict.confidence * 100.0,
    verdict.raw_probability,
    elapsed
  );
  if let Some((name, score)) = verdict.displayed_defect() {
    info!("  - 缺陷类别: {} ({:.2}%)", name, score * 100.0);
  }
  Ok(verdict)
}

/// 对单张图像质检
pub struct OneShotTask {
  classifier: Classifier,
  model_name: String,
}

impl OneShotTask {
  pub fn new(classifier: Classifier, model_name: impl Into<String>) -> Self {
    Self {
      classifier,
      model_name: model_name.into(),
    }
  }
}

impl<
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: IntoIterator<Item = UploadedImage>,
  M: Model<Input = InspectTensor, Output = RawModelOutput, Error = ME>,
  O: Render<InspectionSession, Error = RE>,
> Task<I, M, O> for OneShotTask
{
  type Error = anyhow::Error;

  fn run_task(self, input: I, model: M, output: O) -> Result<InspectionSession, Self::Error> {
    info!("开始任务...");
    let upload = input
      .into_iter()
      .next()
      .ok_or_else(|| anyhow::anyhow!("没有输入图像"))?;
    let verdict = inspect_one(&model, &self.classifier, &upload)?;

    let mut session = InspectionSession::new(self.model_name);
    session.push(upload, verdict);
    output.render_result(&session)?;
    info!("渲染完成");

    Ok(session)
  }
}

/// 依次质检一次上传的全部图像，再统一交给输出渲染。
/// 任一图像推理或判定失败都会中止整个会话。
pub struct SessionTask {
  classifier: Classifier,
  model_name: String,
}

impl SessionTask {
  pub fn new(classifier: Classifier, model_name: impl Into<String>) -> Self {
    Self {
      classifier,
      model_name: model_name.into(),
    }
  }
}

impl<
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: IntoIterator<Item = UploadedImage>,
  M: Model<Input = InspectTensor, Output = RawModelOutput, Error = ME>,
  O: Render<InspectionSession, Error = RE>,
> Task<I, M, O> for SessionTask
{
  type Error = anyhow::Error;

  fn run_task(self, input: I, model: M, output: O) -> Result<InspectionSession, Self::Error> {
    info!("开始质检会话...");
    let mut session = InspectionSession::new(self.model_name);
    let now = Instant::now();

    for (index, upload) in input.into_iter().enumerate() {
      info!("处理第 {} 张图像: {}", index + 1, upload.display_name());
      let verdict = inspect_one(&model, &self.classifier, &upload)?;
      session.push(upload, verdict);
    }

    if session.is_empty() {
      warn!("没有可质检的图像");
    }

    info!(
      "质检完成: 共 {} 张, 异常 {} 张, 耗时 {:.2?}",
      session.len(),
      session.anomaly_count(),
      now.elapsed()
    );

    output.render_result(&session)?;
    info!("渲染完成");

    Ok(session)
  }
}
