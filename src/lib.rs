// 该文件是 Shanan （山南西风） 项目的一部分。
// src/lib.rs - 库主文件
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

pub mod classify;
pub mod config;
pub mod frame;
pub mod input;
pub mod model;
pub mod output;
pub mod preprocess;
pub mod session;
pub mod task;

pub trait FromUrl {
  type Error;
  fn from_url(url: &url::Url) -> Result<Self, Self::Error>
  where
    Self: Sized;
}

pub trait FromUrlWithScheme: FromUrl {
  const SCHEME: &'static str;
}

/// URL 中的路径部分，经过百分号解码，文件名可以包含空格或中文
pub fn url_file_path(url: &url::Url) -> std::path::PathBuf {
  let decoded = urlencoding::decode_binary(url.path().as_bytes());
  std::path::PathBuf::from(String::from_utf8_lossy(&decoded).into_owned())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn url_path_is_percent_decoded() {
    let url = url::Url::parse("image:///tmp/part a/零件.png").unwrap();
    assert_eq!(url.path(), "/tmp/part%20a/%E9%9B%B6%E4%BB%B6.png");
    assert_eq!(
      url_file_path(&url),
      std::path::PathBuf::from("/tmp/part a/零件.png")
    );

    let url = url::Url::parse("folder:///data/uploads").unwrap();
    assert_eq!(url_file_path(&url), std::path::PathBuf::from("/data/uploads"));
  }
}
