// 该文件是 Shanan （山南西风） 项目的一部分。
// src/output/html_report.rs - HTML 质检报告
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
  fmt::Write as _,
  path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::{info, warn};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  output::{Render, palette::*},
  session::{InspectionRecord, InspectionSession},
  url_file_path,
};

const REPORT_FILE: &str = "index.html";
const IMAGE_DIR: &str = "images";
const THUMBNAIL_SIZE: u32 = 512;
const GRID_COLUMNS: usize = 4;

#[derive(Error, Debug)]
pub enum HtmlReportOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("图像错误: {0}")]
  ImageError(#[from] image::ImageError),
  #[error("格式化错误: {0}")]
  FormatError(#[from] std::fmt::Error),
}

/// 将一次会话写成带标签页的静态网页，`html:///path/to/report`
pub struct HtmlReportOutput {
  directory: PathBuf,
}

impl FromUrlWithScheme for HtmlReportOutput {
  const SCHEME: &'static str = "html";
}

impl FromUrl for HtmlReportOutput {
  type Error = HtmlReportOutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(HtmlReportOutputError::SchemeMismatch);
    }
    Ok(HtmlReportOutput {
      directory: url_file_path(url),
    })
  }
}

fn escape_html(text: &str) -> String {
  let mut escaped = String::with_capacity(text.len());
  for ch in text.chars() {
    match ch {
      '&' => escaped.push_str("&amp;"),
      '<' => escaped.push_str("&lt;"),
      '>' => escaped.push_str("&gt;"),
      '"' => escaped.push_str("&quot;"),
      '\'' => escaped.push_str("&#39;"),
      _ => escaped.push(ch),
    }
  }
  escaped
}

fn image_file_name(index: usize, record: &InspectionRecord) -> String {
  let stem = record
    .upload
    .name
    .as_deref()
    .and_then(|name| Path::new(name).file_stem())
    .map(|stem| stem.to_string_lossy().into_owned())
    .unwrap_or_else(|| "upload".to_string());
  format!("{:04}-{}.png", index + 1, stem)
}

fn stylesheet() -> String {
  format!(
    r#"
body {{
  margin: 0;
  padding: 2rem;
  background: linear-gradient(135deg, {BACKGROUND_DARK} 0%, {BACKGROUND_LIGHT} 100%);
  font-family: 'Inter', sans-serif;
  color: {TEXT_COLOR};
  min-height: 100vh;
}}
h1 {{
  background: linear-gradient(90deg, {GRADIENT_START}, {GRADIENT_END});
  -webkit-background-clip: text;
  -webkit-text-fill-color: transparent;
  background-clip: text;
  font-weight: 700;
  font-size: 3rem;
  margin-bottom: 1rem;
}}
.subtitle {{ font-size: 1.2rem; opacity: 0.8; }}
.tabs > input {{ display: none; }}
.tabs > label {{
  display: inline-block;
  margin-right: 8px;
  background: rgba(255, 255, 255, 0.05);
  border-radius: 10px;
  padding: 10px 20px;
  font-weight: 600;
  cursor: pointer;
  border: 1px solid rgba(255, 255, 255, 0.1);
}}
.tabs > input:checked + label {{
  background: linear-gradient(90deg, {PRIMARY_COLOR}, {SECONDARY_COLOR});
  border: none;
}}
.panel {{ display: none; padding-top: 1rem; }}
#tab-all:checked ~ #panel-all,
#tab-anomalies:checked ~ #panel-anomalies,
#tab-normals:checked ~ #panel-normals {{ display: block; }}
.grid {{
  display: grid;
  grid-template-columns: repeat({GRID_COLUMNS}, 1fr);
  gap: 20px;
}}
.result-card {{
  padding: 20px;
  border-radius: 15px;
  background: rgba(255, 255, 255, 0.05);
  border: 1px solid rgba(255, 255, 255, 0.1);
  text-align: center;
  box-shadow: 0 8px 32px 0 rgba(31, 38, 135, 0.37);
}}
.result-card img {{ width: 100%; border-radius: 10px; }}
.label {{ font-weight: bold; font-size: 1.1rem; }}
.anomaly-label {{ color: {DANGER_COLOR}; text-shadow: 0 0 10px {DANGER_COLOR}; }}
.normal-label {{ color: {SUCCESS_COLOR}; text-shadow: 0 0 10px {SUCCESS_COLOR}; }}
.caption {{ opacity: 0.8; font-size: 0.9rem; margin: 4px 0; }}
.info {{
  background: rgba(78, 205, 196, 0.1);
  border-left: 4px solid {SECONDARY_COLOR};
  border-radius: 8px;
  padding: 12px;
}}
.footer {{
  text-align: center;
  padding: 30px;
  margin-top: 50px;
  background: rgba(255, 255, 255, 0.03);
  border-top: 1px solid rgba(255, 255, 255, 0.1);
  font-weight: 300;
  border-radius: 15px;
}}
"#
  )
}

impl HtmlReportOutput {
  fn write_card(
    &self,
    html: &mut String,
    record: &InspectionRecord,
    image_name: &str,
  ) -> Result<(), HtmlReportOutputError> {
    let verdict = &record.verdict;
    let (label, class) = if verdict.is_anomaly {
      ("🚨 ANOMALY", "anomaly-label")
    } else {
      ("✅ NORMAL", "normal-label")
    };

    writeln!(html, "<div class=\"result-card\">")?;
    writeln!(
      html,
      "<img src=\"{}/{}\" alt=\"{}\">",
      IMAGE_DIR,
      urlencoding::encode(image_name),
      escape_html(record.upload.display_name())
    )?;
    writeln!(html, "<p class=\"label {}\">{}</p>", class, label)?;
    writeln!(
      html,
      "<p class=\"caption\">📁 {}</p>",
      escape_html(record.upload.display_name())
    )?;
    writeln!(
      html,
      "<p class=\"caption\">📊 置信度: {:.2}%</p>",
      verdict.confidence * 100.0
    )?;
    writeln!(
      html,
      "<p class=\"caption\">🎯 原始分数: {:.4}</p>",
      verdict.raw_probability
    )?;
    if let Some((name, score)) = verdict.displayed_defect() {
      writeln!(
        html,
        "<p class=\"caption\">🔧 缺陷类别: {} ({:.2}%)</p>",
        escape_html(name),
        score * 100.0
      )?;
    }
    writeln!(html, "</div>")?;
    Ok(())
  }

  fn write_grid<'r>(
    &self,
    html: &mut String,
    records: impl Iterator<Item = (&'r InspectionRecord, &'r String)>,
  ) -> Result<(), HtmlReportOutputError> {
    let mut empty = true;
    for (record, image_name) in records {
      if empty {
        writeln!(html, "<div class=\"grid\">")?;
        empty = false;
      }
      self.write_card(html, record, image_name)?;
    }
    if empty {
      writeln!(html, "<p class=\"info\">🔍 没有可显示的图像。</p>")?;
    } else {
      writeln!(html, "</div>")?;
    }
    Ok(())
  }

  /// 生成报告页面，`image_names` 与会话记录一一对应
  pub fn render_page(
    &self,
    session: &InspectionSession,
    image_names: &[String],
  ) -> Result<String, HtmlReportOutputError> {
    let entries: Vec<(&InspectionRecord, &String)> =
      session.all().iter().zip(image_names.iter()).collect();
    let anomalies = session.anomaly_count();
    let normals = session.len() - anomalies;

    let mut html = String::new();
    writeln!(html, "<!DOCTYPE html>")?;
    writeln!(html, "<html lang=\"zh\">")?;
    writeln!(html, "<head>")?;
    writeln!(html, "<meta charset=\"utf-8\">")?;
    writeln!(html, "<title>异常检测报告</title>")?;
    writeln!(html, "<style>{}</style>", stylesheet())?;
    writeln!(html, "</head>")?;
    writeln!(html, "<body>")?;
    writeln!(html, "<h1>🔍 AI 质量检测</h1>")?;
    writeln!(
      html,
      "<p class=\"subtitle\">基于深度学习的异常检测 · {}</p>",
      session.started_at().format("%Y-%m-%d %H:%M:%S")
    )?;

    writeln!(html, "<div class=\"tabs\">")?;
    writeln!(
      html,
      "<input type=\"radio\" name=\"tabs\" id=\"tab-all\" checked><label for=\"tab-all\">📊 全部 ({})</label>",
      session.len()
    )?;
    writeln!(
      html,
      "<input type=\"radio\" name=\"tabs\" id=\"tab-anomalies\"><label for=\"tab-anomalies\">🚨 异常 ({})</label>",
      anomalies
    )?;
    writeln!(
      html,
      "<input type=\"radio\" name=\"tabs\" id=\"tab-normals\"><label for=\"tab-normals\">✅ 合格 ({})</label>",
      normals
    )?;

    writeln!(html, "<div class=\"panel\" id=\"panel-all\">")?;
    writeln!(html, "<h3>全部已分析图像</h3>")?;
    self.write_grid(&mut html, entries.iter().copied())?;
    writeln!(html, "</div>")?;

    writeln!(html, "<div class=\"panel\" id=\"panel-anomalies\">")?;
    writeln!(
      html,
      "<h3 style=\"color:{};\">检测到的异常 ({})</h3>",
      DANGER_COLOR, anomalies
    )?;
    self.write_grid(
      &mut html,
      entries.iter().copied().filter(|(r, _)| r.verdict.is_anomaly),
    )?;
    writeln!(html, "</div>")?;

    writeln!(html, "<div class=\"panel\" id=\"panel-normals\">")?;
    writeln!(
      html,
      "<h3 style=\"color:{};\">合格图像 ({})</h3>",
      SUCCESS_COLOR, normals
    )?;
    self.write_grid(
      &mut html,
      entries.iter().copied().filter(|(r, _)| !r.verdict.is_anomaly),
    )?;
    writeln!(html, "</div>")?;
    writeln!(html, "</div>")?;

    writeln!(html, "<div class=\"footer\">")?;
    writeln!(
      html,
      "<p style=\"font-size:1.1rem; margin-bottom:10px;\">🤖 模型: <b>{}</b></p>",
      escape_html(session.model_name())
    )?;
    writeln!(
      html,
      "<p style=\"opacity:0.7;\">实时分析 | 深度学习 | 计算机视觉</p>"
    )?;
    writeln!(html, "</div>")?;
    writeln!(html, "</body>")?;
    writeln!(html, "</html>")?;

    Ok(html)
  }
}

impl Render<InspectionSession> for HtmlReportOutput {
  type Error = HtmlReportOutputError;

  fn render_result(&self, session: &InspectionSession) -> Result<(), Self::Error> {
    let image_dir = self.directory.join(IMAGE_DIR);
    std::fs::create_dir_all(&image_dir)?;

    let mut image_names = Vec::with_capacity(session.len());
    for (index, record) in session.all().iter().enumerate() {
      let name = image_file_name(index, record);
      record
        .upload
        .image
        .thumbnail(THUMBNAIL_SIZE, THUMBNAIL_SIZE)
        .to_rgb8()
        .save(image_dir.join(&name))?;
      image_names.push(name);
    }

    if session.is_empty() {
      warn!("会话中没有图像, 报告为空");
    }

    let html = self.render_page(session, &image_names)?;
    let report = self.directory.join(REPORT_FILE);
    std::fs::write(&report, html)?;
    info!("质检报告已写入: {}", report.display());

    Ok(())
  }
}
