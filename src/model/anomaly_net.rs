// 该文件是 Shanan （山南西风） 项目的一部分。
// src/model/anomaly_net.rs - 双头异常检测模型
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

use rknpu::{Context, InitFlags, TensorFormat, TensorType};
use thiserror::Error;
use tracing::{debug, error, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme, url_file_path,
  config::DEFAULT_CLASS_NAMES,
  frame::{AsNchwTensor, INSPECT_INPUT_H, INSPECT_INPUT_W},
  model::{Model, RawModelOutput},
};

const ANOMALY_NET_NUM_INPUTS: u32 = 1;
const ANOMALY_NET_NUM_OUTPUTS: u32 = 2;
const ANOMALY_NET_BINARY_WIDTH: usize = 1;

pub struct AnomalyNet<Tensor> {
  context: Context,
  class_count: usize,
  _phantom: std::marker::PhantomData<Tensor>,
}

#[derive(Error, Debug)]
pub enum AnomalyNetError {
  #[error("模型加载错误: {0}")]
  ModelLoadError(std::io::Error),
  #[error("模型无效: {0}, 错误: {1}")]
  ModelInvalid(String, rknpu::Error),
  #[error("RKNN 错误: {0}")]
  RknnError(rknpu::Error),
  #[error("模型路径错误: {0}")]
  ModelPathError(String),
  #[error("模型输出错误: {0}")]
  OutputError(String),
  #[error("多分类输出宽度不匹配: 期望 {expected}, 实际 {actual}")]
  ClassWidthMismatch { expected: usize, actual: usize },
}

impl From<std::io::Error> for AnomalyNetError {
  fn from(err: std::io::Error) -> Self {
    AnomalyNetError::ModelLoadError(err)
  }
}

impl From<rknpu::Error> for AnomalyNetError {
  fn from(err: rknpu::Error) -> Self {
    AnomalyNetError::RknnError(err)
  }
}

impl AnomalyNetError {
  pub fn invalid(msg: &str, e: rknpu::Error) -> Self {
    AnomalyNetError::ModelInvalid(msg.to_string(), e)
  }
}

pub struct AnomalyNetBuilder {
  model_path: PathBuf,
  flags: InitFlags,
  class_count: usize,
}

impl FromUrlWithScheme for AnomalyNetBuilder {
  const SCHEME: &'static str = "rknn";
}

impl FromUrl for AnomalyNetBuilder {
  type Error = AnomalyNetError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(AnomalyNetError::ModelPathError(format!(
        "模型路径必须使用 {} 方案",
        Self::SCHEME
      )));
    }

    Ok(AnomalyNetBuilder {
      model_path: url_file_path(url),
      flags: InitFlags::default(),
      class_count: DEFAULT_CLASS_NAMES.len(),
    })
  }
}

impl AnomalyNetBuilder {
  pub fn flags(mut self, flags: InitFlags) -> Self {
    self.flags = flags;
    self
  }

  /// 模型文件名（不含扩展名），用于报告展示
  pub fn model_name(&self) -> String {
    self
      .model_path
      .file_stem()
      .map(|stem| stem.to_string_lossy().into_owned())
      .unwrap_or_else(|| self.model_path.display().to_string())
  }

  /// 多分类头应输出的类别数，需与配置中的缺陷类别列表一致
  pub fn class_count(mut self, class_count: usize) -> Self {
    self.class_count = class_count;
    self
  }

  pub fn build<Tensor>(self) -> Result<AnomalyNet<Tensor>, AnomalyNetError> {
    info!("加载模型文件: {}", self.model_path.display());
    let model_data = std::fs::read(&self.model_path)?;
    debug!(
      "模型文件大小: {:.2} MB",
      model_data.len() as f64 / (1024.0 * 1024.0)
    );

    info!("创建 RKNN 推理上下文");
    let context = Context::new(&model_data, self.flags)?;

    match context.sdk_version() {
      Ok(version) => {
        if let Ok(api_ver) = version.api_version() {
          debug!("模型 API 版本: {}", api_ver);
        }
        if let Ok(drv_ver) = version.driver_version() {
          debug!("模型驱动版本: {}", drv_ver);
        }
      }
      Err(e) => {
        error!("查询 SDK 版本失败: {}", e);
        return Err(AnomalyNetError::invalid("无法查询 SDK 版本", e));
      }
    }

    let num_inputs = context
      .num_inputs()
      .map_err(|e| AnomalyNetError::invalid("无法获取输入数量", e))?;
    let num_outputs = context
      .num_outputs()
      .map_err(|e| AnomalyNetError::invalid("无法获取输出数量", e))?;

    if num_inputs != ANOMALY_NET_NUM_INPUTS {
      let msg = format!(
        "预期模型输入数量为 {}, 实际为 {}",
        ANOMALY_NET_NUM_INPUTS, num_inputs
      );
      error!("{}", msg);
      return Err(AnomalyNetError::invalid(&msg, rknpu::Error::InvalidModel));
    }

    if num_outputs != ANOMALY_NET_NUM_OUTPUTS {
      let msg = format!(
        "预期模型输出数量为 {}, 实际为 {}",
        ANOMALY_NET_NUM_OUTPUTS, num_outputs
      );
      error!("{}", msg);
      return Err(AnomalyNetError::invalid(&msg, rknpu::Error::InvalidModel));
    }

    info!(
      "模型加载完成: 输入 {}x{}, 缺陷类别 {}",
      INSPECT_INPUT_W, INSPECT_INPUT_H, self.class_count
    );

    Ok(AnomalyNet {
      context,
      class_count: self.class_count,
      _phantom: std::marker::PhantomData,
    })
  }
}

/// 根据张量大小区分二分类头与多分类头，返回 (binary, multiclass)
fn match_binary_multiclass_tensors<'a>(
  tensor1: &'a [f32],
  tensor2: &'a [f32],
  class_count: usize,
) -> Result<(&'a [f32], &'a [f32]), AnomalyNetError> {
  match (tensor1.len(), tensor2.len()) {
    (ANOMALY_NET_BINARY_WIDTH, n) if n == class_count => Ok((tensor1, tensor2)),
    (n, ANOMALY_NET_BINARY_WIDTH) if n == class_count => {
      debug!("输出顺序交换: 索引 0 是多分类头，索引 1 是二分类头");
      Ok((tensor2, tensor1))
    }
    (ANOMALY_NET_BINARY_WIDTH, actual) | (actual, ANOMALY_NET_BINARY_WIDTH) => {
      error!(
        "多分类输出宽度不匹配: 期望 {}, 实际 {}",
        class_count, actual
      );
      Err(AnomalyNetError::ClassWidthMismatch {
        expected: class_count,
        actual,
      })
    }
    (a, b) => Err(AnomalyNetError::OutputError(format!(
      "无法识别模型输出: 张量1 {} 个元素, 张量2 {} 个元素",
      a, b
    ))),
  }
}

impl<Tensor: AsNchwTensor<INSPECT_INPUT_W, INSPECT_INPUT_H>> Model for AnomalyNet<Tensor> {
  type Input = Tensor;
  type Output = RawModelOutput;
  type Error = AnomalyNetError;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    debug!("设置模型输入");
    let bytes: Vec<u8> = input
      .as_nchw()
      .iter()
      .flat_map(|v| v.to_ne_bytes())
      .collect();
    self
      .context
      .set_input(0, &bytes, TensorFormat::NCHW, TensorType::Float32)?;

    debug!("执行模型推理");
    self.context.run()?;

    debug!("获取模型输出");
    let output = self.context.get_outputs()?;

    let tensor1 = output
      .get_f32(0)
      .map_err(|e| AnomalyNetError::OutputError(format!("获取第 0 个输出失败: {}", e)))?;
    let tensor2 = output
      .get_f32(1)
      .map_err(|e| AnomalyNetError::OutputError(format!("获取第 1 个输出失败: {}", e)))?;

    let (binary, multiclass) =
      match_binary_multiclass_tensors(tensor1, tensor2, self.class_count)?;

    let result = RawModelOutput {
      binary_probability: binary[0],
      multiclass_logits: multiclass.to_vec(),
    };
    debug!("模型推理结果: {:?}", result);

    Ok(result)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn heads_are_matched_by_width() {
    let binary = [0.8f32];
    let logits = [0.0f32; 9];
    let (b, m) = match_binary_multiclass_tensors(&binary, &logits, 9).unwrap();
    assert_eq!(b, &binary);
    assert_eq!(m.len(), 9);

    let (b, m) = match_binary_multiclass_tensors(&logits, &binary, 9).unwrap();
    assert_eq!(b, &binary);
    assert_eq!(m.len(), 9);
  }

  #[test]
  fn wrong_class_width_is_fatal() {
    let binary = [0.8f32];
    let logits = [0.0f32; 8];
    let err = match_binary_multiclass_tensors(&binary, &logits, 9).unwrap_err();
    assert!(matches!(
      err,
      AnomalyNetError::ClassWidthMismatch {
        expected: 9,
        actual: 8
      }
    ));
  }

  #[test]
  fn unknown_layout_is_rejected() {
    let a = [0.0f32; 3];
    let b = [0.0f32; 4];
    assert!(matches!(
      match_binary_multiclass_tensors(&a, &b, 9),
      Err(AnomalyNetError::OutputError(_))
    ));
  }

  #[test]
  fn builder_requires_rknn_scheme() {
    let url = Url::parse("rknn:///opt/models/anomaly.rknn").unwrap();
    let builder = AnomalyNetBuilder::from_url(&url).unwrap().class_count(5);
    assert_eq!(builder.model_path, PathBuf::from("/opt/models/anomaly.rknn"));
    assert_eq!(builder.class_count, 5);
    assert_eq!(builder.model_name(), "anomaly");

    let url = Url::parse("file:///opt/models/anomaly.rknn").unwrap();
    assert!(matches!(
      AnomalyNetBuilder::from_url(&url),
      Err(AnomalyNetError::ModelPathError(_))
    ));
  }
}
