// 该文件是 Shanan （山南西风） 项目的一部分。
// src/bin/inspect_oneshot.rs - 单张图像质检
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

use shanan_inspect::{
  FromUrl,
  classify::{Classifier, ClassifyMode},
  config::InspectConfig,
  frame::InspectTensor,
  input::InputWrapper,
  model::AnomalyNetBuilder,
  output::OutputWrapper,
  task::{OneShotTask, Task},
};
use tracing::info;

/// Shanan 单张质检参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// RKNN 模型文件路径
  #[arg(long, value_name = "MODEL")]
  pub model: Url,
  /// 输入图片
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,
  /// 输出路径
  #[arg(long, value_name = "OUTPUT", default_value = "console://")]
  pub output: Url,
  /// 质检配置文件
  #[arg(long, value_name = "FILE")]
  pub config: Option<PathBuf>,
  /// 判定模式
  #[arg(long, value_enum, default_value_t = ClassifyMode::Binary)]
  pub mode: ClassifyMode,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("模型文件路径: {}", args.model);
  info!("输入来源: {}", args.input);
  info!("输出路径: {}", args.output);

  let config = args
    .config
    .as_ref()
    .map(InspectConfig::load)
    .transpose()?
    .unwrap_or_default();

  let builder = AnomalyNetBuilder::from_url(&args.model)?.class_count(config.class_names.len());
  let model_name = builder.model_name();
  let model = builder.build::<InspectTensor>()?;

  let input = InputWrapper::from_url(&args.input)?;
  let output = OutputWrapper::from_url(&args.output)?;

  let classifier = Classifier::new(config, args.mode);
  info!(
    "判定模式: {:?}, 阈值: {}",
    classifier.mode(),
    classifier.config().threshold
  );

  let session = OneShotTask::new(classifier, model_name).run_task(input, model, output)?;
  if let Some(record) = session.all().first() {
    info!(
      "{}: {} ({:.2}%)",
      record.upload.display_name(),
      record.verdict.label(),
      record.verdict.confidence * 100.0
    );
  }

  Ok(())
}
