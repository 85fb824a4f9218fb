// 该文件是 Shanan （山南西风） 项目的一部分。
// src/output/directory_record.rs - 目录记录输出
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

use chrono::{DateTime, Datelike, Local};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU16, Ordering};
use thiserror::Error;
use tracing::{debug, info};

use crate::{
  FromUrl, FromUrlWithScheme,
  output::{Render, draw::Draw},
  session::{InspectionRecord, InspectionSession},
  url_file_path,
};

#[derive(Error, Debug)]
pub enum DirectoryRecordOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("图像错误: {0}")]
  ImageError(#[from] image::ImageError),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
}

pub struct Record;

impl Record {
  /// 记录行: 文件名, 判定, 置信度, 原始分数, 缺陷类别, 缺陷分数。
  /// 合格图像的缺陷列为 `-`
  pub fn line(record: &InspectionRecord) -> String {
    let verdict = &record.verdict;
    let (defect, score) = match verdict.displayed_defect() {
      Some((name, score)) => (name, format!("{:.4}", score)),
      None => ("-", "-".to_string()),
    };
    format!(
      "{}, {}, {:.4}, {:.4}, {}, {}",
      record.upload.display_name(),
      verdict.label(),
      verdict.confidence,
      verdict.raw_probability,
      defect,
      score
    )
  }

  pub fn record(&self, record: &InspectionRecord, path: &Path) -> Result<(), std::io::Error> {
    std::fs::write(path.with_extension("txt"), Self::line(record))
  }
}

pub enum DrawWrapper<'a> {
  Draw(Box<Draw<'a>>),
  Record(Record),
}

impl DrawWrapper<'_> {
  pub fn save_result(
    &self,
    path: &Path,
    record: &InspectionRecord,
  ) -> Result<(), DirectoryRecordOutputError> {
    match self {
      DrawWrapper::Draw(draw) => {
        draw.draw_verdict(record).save(path)?;
      }
      DrawWrapper::Record(recorder) => {
        record.upload.image.to_rgb8().save(path)?;
        recorder.record(record, path)?;
      }
    };

    Ok(())
  }

  pub fn with(record: bool) -> Self {
    if record {
      DrawWrapper::Record(Record)
    } else {
      DrawWrapper::Draw(Box::default())
    }
  }
}

/// 按日期目录保存图像，`folder:///path/to/records`。
/// 默认只保存异常图像，`?always` 保存全部；`?record` 保存原图和文本记录，否则保存标注图。
pub struct DirectoryRecordOutput {
  directory: PathBuf,
  draw: DrawWrapper<'static>,
  frame_counter: AtomicU16,
  always: bool,
}

impl FromUrlWithScheme for DirectoryRecordOutput {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn from_url(uri: &url::Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(DirectoryRecordOutputError::SchemeMismatch);
    }

    let record = uri.query_pairs().any(|(k, _)| k == "record");
    let always = uri.query_pairs().any(|(k, _)| k == "always");

    Ok(DirectoryRecordOutput {
      directory: url_file_path(uri),
      draw: DrawWrapper::with(record),
      frame_counter: AtomicU16::new(0),
      always,
    })
  }
}

impl DirectoryRecordOutput {
  fn frame_id(&self) -> u16 {
    self.frame_counter.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
  }

  fn frame_path(
    &self,
    now: DateTime<Local>,
    record: &InspectionRecord,
  ) -> Result<PathBuf, DirectoryRecordOutputError> {
    let directory = self
      .directory
      .join(now.year().to_string())
      .join(format!("{:02}", now.month()))
      .join(format!("{:02}", now.day()));
    std::fs::create_dir_all(&directory)?;

    let kind = if record.verdict.is_anomaly {
      "anomaly"
    } else {
      "normal"
    };
    Ok(directory.join(format!(
      "{}-{:04X}-{}.png",
      now.format("%H-%M-%S"),
      self.frame_id(),
      kind
    )))
  }
}

impl Render<InspectionSession> for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn render_result(&self, session: &InspectionSession) -> Result<(), Self::Error> {
    let now = Local::now();
    let mut saved = 0usize;
    for record in session.all() {
      if !(self.always || record.verdict.is_anomaly) {
        continue;
      }
      let path = self.frame_path(now, record)?;
      debug!("保存 {} -> {}", record.upload.display_name(), path.display());
      self.draw.save_result(&path, record)?;
      saved += 1;
    }
    info!("已保存 {} 张图像到 {}", saved, self.directory.display());
    Ok(())
  }
}
