// 该文件是 Shanan （山南西风） 项目的一部分。
// src/output/console.rs - 控制台输出
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

use std::io::Write;

use thiserror::Error;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  output::Render,
  session::{InspectionRecord, InspectionSession},
};

#[derive(Error, Debug)]
pub enum ConsoleOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
}

/// 在标准输出打印结果汇总，`console://`
pub struct ConsoleOutput;

impl FromUrlWithScheme for ConsoleOutput {
  const SCHEME: &'static str = "console";
}

impl FromUrl for ConsoleOutput {
  type Error = ConsoleOutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(ConsoleOutputError::SchemeMismatch);
    }
    Ok(ConsoleOutput)
  }
}

fn format_record(record: &InspectionRecord) -> String {
  let verdict = &record.verdict;
  let mut line = format!(
    "{:<32} {:<8} 置信度 {:>7.2}%  原始分数 {:.4}",
    record.upload.display_name(),
    verdict.label(),
    verdict.confidence * 100.0,
    verdict.raw_probability
  );
  if let Some((name, score)) = verdict.displayed_defect() {
    line.push_str(&format!("  缺陷 {} ({:.2}%)", name, score * 100.0));
  }
  line
}

impl ConsoleOutput {
  pub fn write_session<W: Write>(
    &self,
    out: &mut W,
    session: &InspectionSession,
  ) -> Result<(), ConsoleOutputError> {
    writeln!(out, "质检结果 ({})", session.model_name())?;
    writeln!(out, "==================")?;
    if session.is_empty() {
      writeln!(out, "没有可显示的图像")?;
    }
    for record in session.all() {
      writeln!(out, "{}", format_record(record))?;
    }
    writeln!(out)?;
    writeln!(out, "总图像数: {}", session.len())?;
    writeln!(out, "异常: {}", session.anomaly_count())?;
    writeln!(out, "合格: {}", session.len() - session.anomaly_count())?;
    Ok(())
  }
}

impl Render<InspectionSession> for ConsoleOutput {
  type Error = ConsoleOutputError;

  fn render_result(&self, session: &InspectionSession) -> Result<(), Self::Error> {
    let stdout = std::io::stdout();
    let mut lock = stdout.lock();
    self.write_session(&mut lock, session)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    classify::{classify_binary, classify_multi},
    config::DEFAULT_CLASS_NAMES,
    input::UploadedImage,
  };
  use image::{DynamicImage, RgbImage};

  #[test]
  fn summary_lists_each_image_and_counts() {
    let image = DynamicImage::ImageRgb8(RgbImage::new(1, 1));
    let mut session = InspectionSession::new("EfficientNetB0");
    let mut logits = [0f32; 9];
    logits[2] = 6.0;
    session.push(
      UploadedImage::new(Some("bad.png".into()), image.clone()),
      classify_multi(0.82, &logits, &DEFAULT_CLASS_NAMES, 0.5).unwrap(),
    );
    session.push(
      UploadedImage::new(Some("ok.png".into()), image),
      classify_multi(0.1, &logits, &DEFAULT_CLASS_NAMES, 0.5).unwrap(),
    );
    session.push(
      UploadedImage::new(None, DynamicImage::ImageRgb8(RgbImage::new(1, 1))),
      classify_binary(0.6, 0.5),
    );

    let mut buffer = Vec::new();
    ConsoleOutput.write_session(&mut buffer, &session).unwrap();
    let text = String::from_utf8(buffer).unwrap();

    assert!(text.contains("bad.png"));
    assert!(text.contains("缺陷 scratch"));
    // 正常图像不显示缺陷类别
    let ok_line = text.lines().find(|l| l.starts_with("ok.png")).unwrap();
    assert!(ok_line.contains("NORMAL"));
    assert!(ok_line.contains("90.00%"));
    assert!(!ok_line.contains("缺陷"));
    assert!(text.contains("<unnamed>"));
    assert!(text.contains("异常: 2"));
    assert!(text.contains("合格: 1"));
  }
}
