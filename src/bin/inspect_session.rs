// 该文件是 Shanan （山南西风） 项目的一部分。
// src/bin/inspect_session.rs - 批量图像质检
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
  output::MultiOutput,
  task::{SessionTask, Task},
};
use tracing::info;

/// Shanan 质检参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// RKNN 模型文件路径，例如 rknn:///opt/models/anomaly.rknn
  #[arg(long, value_name = "MODEL")]
  pub model: Url,
  /// 输入来源，可重复指定
  /// - 单张图片: image:///path/to/a.png
  /// - 上传目录: folder:///path/to/uploads
  #[arg(long, value_name = "SOURCE", required = true)]
  pub input: Vec<Url>,
  /// 输出路径，可重复指定
  /// - 控制台: console://
  /// - HTML 报告: html:///path/to/report
  /// - 目录记录: folder:///path/to/records[?record][&always]
  #[arg(long, value_name = "OUTPUT", default_value = "console://")]
  pub output: Vec<Url>,
  /// 质检配置文件（阈值与缺陷类别）
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
  for input in &args.input {
    info!("输入来源: {}", input);
  }
  for output in &args.output {
    info!("输出路径: {}", output);
  }

  let config = match &args.config {
    Some(path) => InspectConfig::load(path)?,
    None => InspectConfig::default(),
  };
  let builder = AnomalyNetBuilder::from_url(&args.model)?.class_count(config.class_names.len());
  let model_name = builder.model_name();
  let model = builder.build::<InspectTensor>()?;

  let uploads = InputWrapper::open_all(&args.input)?;
  info!("共上传 {} 张图像", uploads.len());
  let output = MultiOutput::from_urls(&args.output)?;

  let classifier = Classifier::new(config, args.mode);
  info!(
    "判定模式: {:?}, 阈值: {}, 缺陷类别: {:?}",
    classifier.mode(),
    classifier.config().threshold,
    classifier.config().class_names.names()
  );
  SessionTask::new(classifier, model_name).run_task(uploads, model, output)?;

  Ok(())
}
