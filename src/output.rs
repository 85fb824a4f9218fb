// 该文件是 Shanan （山南西风） 项目的一部分。
// src/output.rs - 输出定义
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
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, session::InspectionSession};

pub trait Render<Output>: Sized {
  type Error;
  fn render_result(&self, result: &Output) -> Result<(), Self::Error>;
}

/// 界面配色
pub mod palette {
  pub const PRIMARY_COLOR: &str = "#6C63FF";
  pub const SECONDARY_COLOR: &str = "#4ECDC4";
  pub const BACKGROUND_DARK: &str = "#1a1a2e";
  pub const BACKGROUND_LIGHT: &str = "#16213e";
  pub const TEXT_COLOR: &str = "#eaeaea";
  pub const SUCCESS_COLOR: &str = "#00d9ff";
  pub const DANGER_COLOR: &str = "#ff006e";
  pub const GRADIENT_START: &str = "#667eea";
  pub const GRADIENT_END: &str = "#764ba2";

  pub const SUCCESS_RGB: [u8; 3] = [0x00, 0xd9, 0xff];
  pub const DANGER_RGB: [u8; 3] = [0xff, 0x00, 0x6e];
}

mod console;
pub use self::console::{ConsoleOutput, ConsoleOutputError};

#[cfg(feature = "directory_record")]
pub mod draw;

#[cfg(feature = "html_report")]
mod html_report;
#[cfg(feature = "html_report")]
pub use self::html_report::{HtmlReportOutput, HtmlReportOutputError};

#[cfg(feature = "directory_record")]
mod directory_record;
#[cfg(feature = "directory_record")]
pub use self::directory_record::{DirectoryRecordOutput, DirectoryRecordOutputError};

#[derive(Error, Debug)]
pub enum OutputError {
  #[error("控制台输出错误: {0}")]
  ConsoleOutputError(#[from] ConsoleOutputError),
  #[cfg(feature = "html_report")]
  #[error("HTML 报告输出错误: {0}")]
  HtmlReportOutputError(#[from] HtmlReportOutputError),
  #[cfg(feature = "directory_record")]
  #[error("目录记录输出错误: {0}")]
  DirectoryRecordOutputError(#[from] DirectoryRecordOutputError),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

pub enum OutputWrapper {
  Console(ConsoleOutput),
  #[cfg(feature = "html_report")]
  HtmlReport(HtmlReportOutput),
  #[cfg(feature = "directory_record")]
  DirectoryRecord(DirectoryRecordOutput),
}

impl FromUrl for OutputWrapper {
  type Error = OutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    match url.scheme() {
      ConsoleOutput::SCHEME => Ok(OutputWrapper::Console(ConsoleOutput::from_url(url)?)),
      #[cfg(feature = "html_report")]
      HtmlReportOutput::SCHEME => Ok(OutputWrapper::HtmlReport(HtmlReportOutput::from_url(
        url,
      )?)),
      #[cfg(feature = "directory_record")]
      DirectoryRecordOutput::SCHEME => Ok(OutputWrapper::DirectoryRecord(
        DirectoryRecordOutput::from_url(url)?,
      )),
      other => Err(OutputError::SchemeMismatch(other.to_string())),
    }
  }
}

impl Render<InspectionSession> for OutputWrapper {
  type Error = OutputError;

  fn render_result(&self, session: &InspectionSession) -> Result<(), Self::Error> {
    match self {
      OutputWrapper::Console(output) => output.render_result(session).map_err(OutputError::from),
      #[cfg(feature = "html_report")]
      OutputWrapper::HtmlReport(output) => {
        output.render_result(session).map_err(OutputError::from)
      }
      #[cfg(feature = "directory_record")]
      OutputWrapper::DirectoryRecord(output) => {
        output.render_result(session).map_err(OutputError::from)
      }
    }
  }
}

/// 同时渲染到多个输出
pub struct MultiOutput {
  outputs: Vec<OutputWrapper>,
}

impl MultiOutput {
  pub fn from_urls(urls: &[Url]) -> Result<Self, OutputError> {
    let outputs = urls
      .iter()
      .map(OutputWrapper::from_url)
      .collect::<Result<Vec<_>, _>>()?;
    Ok(Self { outputs })
  }
}

impl Render<InspectionSession> for MultiOutput {
  type Error = OutputError;

  fn render_result(&self, session: &InspectionSession) -> Result<(), Self::Error> {
    for output in &self.outputs {
      output.render_result(session)?;
    }
    Ok(())
  }
}
