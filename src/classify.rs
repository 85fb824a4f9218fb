// 该文件是 Shanan （山南西风） 项目的一部分。
// src/classify.rs - 异常判定逻辑
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

use thiserror::Error;
use tracing::{debug, error};

use crate::{config::InspectConfig, model::RawModelOutput};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassifyError {
  #[error("多分类输出宽度与缺陷类别数量不一致: 期望 {expected}, 实际 {actual}")]
  ConfigMismatch { expected: usize, actual: usize },
}

/// 单张图像的判定结果
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
  pub is_anomaly: bool,
  /// 对所给标签的置信度，而非异常概率
  pub confidence: f32,
  pub raw_probability: f32,
  pub defect_name: Option<String>,
  pub defect_score: Option<f32>,
}

impl Verdict {
  pub fn label(&self) -> &'static str {
    if self.is_anomaly { "ANOMALY" } else { "NORMAL" }
  }

  /// 仅在二分类头判定为异常时展示的缺陷标签
  pub fn displayed_defect(&self) -> Option<(&str, f32)> {
    if !self.is_anomaly {
      return None;
    }
    match (&self.defect_name, self.defect_score) {
      (Some(name), Some(score)) => Some((name.as_str(), score)),
      _ => None,
    }
  }
}

pub fn classify_binary(raw_probability: f32, threshold: f32) -> Verdict {
  let is_anomaly = raw_probability > threshold;
  let confidence = if is_anomaly {
    raw_probability
  } else {
    1.0 - raw_probability
  };

  Verdict {
    is_anomaly,
    confidence,
    raw_probability,
    defect_name: None,
    defect_score: None,
  }
}

/// 二分类头决定是否异常，多分类头给出 top-1 缺陷类别。
/// 两个头的结论不做任何调和。
pub fn classify_multi<S: AsRef<str>>(
  binary_probability: f32,
  multiclass_logits: &[f32],
  class_names: &[S],
  threshold: f32,
) -> Result<Verdict, ClassifyError> {
  if multiclass_logits.len() != class_names.len() {
    error!(
      "多分类输出宽度 {} 与缺陷类别数量 {} 不一致",
      multiclass_logits.len(),
      class_names.len()
    );
    return Err(ClassifyError::ConfigMismatch {
      expected: class_names.len(),
      actual: multiclass_logits.len(),
    });
  }

  let mut verdict = classify_binary(binary_probability, threshold);

  let probs = softmax(multiclass_logits);
  if let Some((index, score)) = argmax(&probs) {
    debug!(
      "多分类 top-1: {} ({}) = {:.4}",
      class_names[index].as_ref(),
      index,
      score
    );
    verdict.defect_name = Some(class_names[index].as_ref().to_string());
    verdict.defect_score = Some(score);
  }

  Ok(verdict)
}

/// 减去最大值后再取指数，避免大幅值 logits 溢出
pub fn softmax(logits: &[f32]) -> Vec<f32> {
  let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
  let exps: Vec<f32> = logits.iter().map(|&x| (x - max).exp()).collect();
  let sum: f32 = exps.iter().sum();
  exps.into_iter().map(|e| e / sum).collect()
}

/// 最大值相同时取最先出现的下标
pub fn argmax(values: &[f32]) -> Option<(usize, f32)> {
  let mut best: Option<(usize, f32)> = None;
  for (index, &value) in values.iter().enumerate() {
    match best {
      Some((_, current)) if value <= current => {}
      _ => best = Some((index, value)),
    }
  }
  best
}

/// 判定模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ClassifyMode {
  /// 仅使用二分类头
  #[default]
  Binary,
  /// 二分类头 + 缺陷类别头
  Multi,
}

/// 持有部署配置的判定器
#[derive(Debug, Clone)]
pub struct Classifier {
  config: InspectConfig,
  mode: ClassifyMode,
}

impl Classifier {
  pub fn new(config: InspectConfig, mode: ClassifyMode) -> Self {
    Self { config, mode }
  }

  pub fn config(&self) -> &InspectConfig {
    &self.config
  }

  pub fn mode(&self) -> ClassifyMode {
    self.mode
  }

  pub fn classify(&self, output: &RawModelOutput) -> Result<Verdict, ClassifyError> {
    match self.mode {
      ClassifyMode::Binary => Ok(classify_binary(
        output.binary_probability,
        self.config.threshold,
      )),
      ClassifyMode::Multi => classify_multi(
        output.binary_probability,
        &output.multiclass_logits,
        self.config.class_names.names(),
        self.config.threshold,
      ),
    }
  }
}
