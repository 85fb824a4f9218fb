// 该文件是 Shanan （山南西风） 项目的一部分。
// src/session.rs - 质检会话结果
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

use chrono::{DateTime, Local};

use crate::{classify::Verdict, input::UploadedImage};

/// 一张图像及其判定结果
#[derive(Debug, Clone)]
pub struct InspectionRecord {
  pub upload: UploadedImage,
  pub verdict: Verdict,
}

/// 一次上传会话的全部结果，按上传顺序保存
#[derive(Debug, Clone)]
pub struct InspectionSession {
  started_at: DateTime<Local>,
  model_name: String,
  records: Vec<InspectionRecord>,
}

impl InspectionSession {
  pub fn new(model_name: impl Into<String>) -> Self {
    Self {
      started_at: Local::now(),
      model_name: model_name.into(),
      records: Vec::new(),
    }
  }

  pub fn push(&mut self, upload: UploadedImage, verdict: Verdict) {
    self.records.push(InspectionRecord { upload, verdict });
  }

  pub fn started_at(&self) -> DateTime<Local> {
    self.started_at
  }

  pub fn model_name(&self) -> &str {
    &self.model_name
  }

  pub fn len(&self) -> usize {
    self.records.len()
  }

  pub fn is_empty(&self) -> bool {
    self.records.is_empty()
  }

  pub fn all(&self) -> &[InspectionRecord] {
    &self.records
  }

  pub fn anomalies(&self) -> impl Iterator<Item = &InspectionRecord> {
    self.records.iter().filter(|r| r.verdict.is_anomaly)
  }

  pub fn normals(&self) -> impl Iterator<Item = &InspectionRecord> {
    self.records.iter().filter(|r| !r.verdict.is_anomaly)
  }

  pub fn anomaly_count(&self) -> usize {
    self.anomalies().count()
  }
}
