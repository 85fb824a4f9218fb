// 该文件是 Shanan （山南西风） 项目的一部分。
// src/config.rs - 质检配置
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

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

/// 默认异常判定阈值
pub const DEFAULT_THRESHOLD: f32 = 0.5;

/// 默认缺陷类别，第一个类别表示“无缺陷”
pub const DEFAULT_CLASS_NAMES: [&str; 9] = [
  "good",
  "crack",
  "scratch",
  "hole",
  "contamination",
  "color",
  "cut",
  "fold",
  "print",
];

/// 表示“无缺陷”的约定类别名
pub const NO_DEFECT_CLASS: &str = "good";

#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("配置解析错误: {0}")]
  ParseError(#[from] serde_json::Error),
  #[error("阈值必须位于 [0, 1] 区间, 实际为 {0}")]
  ThresholdOutOfRange(f32),
  #[error("缺陷类别列表不能为空")]
  EmptyClassSet,
}

/// 有序的缺陷类别集合，下标与多分类头的输出位置一一对应
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct DefectClassSet {
  names: Box<[String]>,
}

impl DefectClassSet {
  pub fn new<I, S>(names: I) -> Result<Self, ConfigError>
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    let names: Box<[String]> = names.into_iter().map(Into::into).collect();
    let set = Self { names };
    set.validate()?;
    Ok(set)
  }

  fn validate(&self) -> Result<(), ConfigError> {
    if self.names.is_empty() {
      return Err(ConfigError::EmptyClassSet);
    }
    if self.names[0] != NO_DEFECT_CLASS {
      warn!(
        "缺陷类别列表的第一个类别为 '{}', 约定应为 '{}'",
        self.names[0], NO_DEFECT_CLASS
      );
    }
    Ok(())
  }

  pub fn len(&self) -> usize {
    self.names.len()
  }

  pub fn is_empty(&self) -> bool {
    self.names.is_empty()
  }

  pub fn name(&self, index: usize) -> Option<&str> {
    self.names.get(index).map(String::as_str)
  }

  pub fn names(&self) -> &[String] {
    &self.names
  }
}

impl TryFrom<Vec<String>> for DefectClassSet {
  type Error = ConfigError;

  fn try_from(names: Vec<String>) -> Result<Self, Self::Error> {
    Self::new(names)
  }
}

impl From<DefectClassSet> for Vec<String> {
  fn from(set: DefectClassSet) -> Self {
    set.names.into_vec()
  }
}

impl Default for DefectClassSet {
  fn default() -> Self {
    Self {
      names: DEFAULT_CLASS_NAMES.iter().map(|s| s.to_string()).collect(),
    }
  }
}

/// 部署相关的判定配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InspectConfig {
  pub threshold: f32,
  pub class_names: DefectClassSet,
}

impl Default for InspectConfig {
  fn default() -> Self {
    Self {
      threshold: DEFAULT_THRESHOLD,
      class_names: DefectClassSet::default(),
    }
  }
}

impl InspectConfig {
  /// 从 JSON 文件加载配置，缺省字段使用默认值
  pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    info!("加载质检配置: {}", path.display());
    let text = std::fs::read_to_string(path)?;
    Self::from_json(&text)
  }

  pub fn from_json(text: &str) -> Result<Self, ConfigError> {
    let config: InspectConfig = serde_json::from_str(text)?;
    config.validate()?;
    Ok(config)
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&self.threshold) {
      return Err(ConfigError::ThresholdOutOfRange(self.threshold));
    }
    self.class_names.validate()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn default_config_has_nine_classes_good_first() {
    let config = InspectConfig::default();
    assert_eq!(config.threshold, 0.5);
    assert_eq!(config.class_names.len(), 9);
    assert_eq!(config.class_names.name(0), Some("good"));
  }

  #[test]
  fn parses_partial_json_with_defaults() {
    let config = InspectConfig::from_json(r#"{ "threshold": 0.7 }"#).unwrap();
    assert_eq!(config.threshold, 0.7);
    assert_eq!(config.class_names, DefectClassSet::default());
  }

  #[test]
  fn parses_class_names_as_plain_list() {
    let config =
      InspectConfig::from_json(r#"{ "class_names": ["good", "dent", "burr"] }"#).unwrap();
    assert_eq!(config.class_names.len(), 3);
    assert_eq!(config.class_names.name(2), Some("burr"));
    assert_eq!(config.threshold, DEFAULT_THRESHOLD);
  }

  #[test]
  fn rejects_out_of_range_threshold() {
    let err = InspectConfig::from_json(r#"{ "threshold": 1.5 }"#).unwrap_err();
    assert!(matches!(err, ConfigError::ThresholdOutOfRange(_)));
  }

  #[test]
  fn rejects_empty_class_set() {
    let err = InspectConfig::from_json(r#"{ "class_names": [] }"#).unwrap_err();
    assert!(matches!(err, ConfigError::ParseError(_)));
    assert!(err.to_string().contains("缺陷类别列表不能为空"));
    assert!(matches!(
      DefectClassSet::new(Vec::<String>::new()),
      Err(ConfigError::EmptyClassSet)
    ));
  }

  #[test]
  fn class_set_serializes_as_plain_list() {
    let json = serde_json::to_string(&InspectConfig::default()).unwrap();
    let back = InspectConfig::from_json(&json).unwrap();
    assert_eq!(back, InspectConfig::default());
    assert!(json.contains(r#""class_names":["good","crack""#));
  }

  #[test]
  fn loads_shipped_label_file() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/labels/defects.json");
    let config = InspectConfig::load(path).unwrap();
    assert_eq!(config, InspectConfig::default());
  }
}
