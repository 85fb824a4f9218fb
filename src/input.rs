// 该文件是 Shanan （山南西风） 项目的一部分。
// src/input.rs - 上传图像输入
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

use image::DynamicImage;
use thiserror::Error;

use crate::FromUrl;

/// 一张上传的图像，仅在一次质检会话内存在
#[derive(Debug, Clone)]
pub struct UploadedImage {
  /// 原始文件名
  pub name: Option<String>,
  pub image: DynamicImage,
}

impl UploadedImage {
  pub fn new(name: Option<String>, image: DynamicImage) -> Self {
    Self { name, image }
  }

  pub fn display_name(&self) -> &str {
    self.name.as_deref().unwrap_or("<unnamed>")
  }
}

#[cfg(feature = "read_image_file")]
mod read_image_file;
#[cfg(feature = "read_image_file")]
pub use self::read_image_file::{ImageFileInput, ImageFileInputError, ImageFolderInput};

#[derive(Error, Debug)]
pub enum InputError {
  #[cfg(feature = "read_image_file")]
  #[error("Image file input error: {0}")]
  ImageFileInputError(#[from] ImageFileInputError),
  #[error("URI scheme mismatch: {0}")]
  SchemeMismatch(String),
}

pub enum InputWrapper {
  #[cfg(feature = "read_image_file")]
  ReadImageFile(ImageFileInput),
  #[cfg(feature = "read_image_file")]
  ImageFolder(ImageFolderInput),
}

impl FromUrl for InputWrapper {
  type Error = InputError;

  fn from_url(url: &url::Url) -> Result<Self, Self::Error> {
    #[cfg(feature = "read_image_file")]
    {
      use crate::FromUrlWithScheme;

      if url.scheme() == ImageFileInput::SCHEME {
        let input = ImageFileInput::from_url(url)?;
        return Ok(InputWrapper::ReadImageFile(input));
      }
      if url.scheme() == ImageFolderInput::SCHEME {
        let input = ImageFolderInput::from_url(url)?;
        return Ok(InputWrapper::ImageFolder(input));
      }
    }
    Err(InputError::SchemeMismatch(url.scheme().to_string()))
  }
}

impl InputWrapper {
  /// 依次打开多个输入来源，按给定顺序拼接
  pub fn open_all(urls: &[url::Url]) -> Result<Vec<UploadedImage>, InputError> {
    let mut uploads = Vec::new();
    for url in urls {
      uploads.extend(InputWrapper::from_url(url)?);
    }
    Ok(uploads)
  }
}

impl IntoIterator for InputWrapper {
  type Item = UploadedImage;
  type IntoIter = std::vec::IntoIter<UploadedImage>;

  fn into_iter(self) -> Self::IntoIter {
    match self {
      #[cfg(feature = "read_image_file")]
      InputWrapper::ReadImageFile(input) => input.into_uploads().into_iter(),
      #[cfg(feature = "read_image_file")]
      InputWrapper::ImageFolder(input) => input.into_uploads().into_iter(),
    }
  }
}

#[cfg(all(test, feature = "read_image_file"))]
mod tests {
  use super::*;
  use image::{Rgb, RgbImage};
  use std::path::Path;
  use url::Url;

  fn url_for(scheme: &str, path: &Path) -> Url {
    Url::parse(&format!("{}://{}", scheme, path.display())).unwrap()
  }

  #[test]
  fn dispatches_by_scheme() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.png");
    RgbImage::from_pixel(4, 4, Rgb([1, 1, 1])).save(&path).unwrap();

    assert!(matches!(
      InputWrapper::from_url(&url_for("image", &path)),
      Ok(InputWrapper::ReadImageFile(_))
    ));
    assert!(matches!(
      InputWrapper::from_url(&url_for("folder", dir.path())),
      Ok(InputWrapper::ImageFolder(_))
    ));
    assert!(matches!(
      InputWrapper::from_url(&url_for("v4l", &path)),
      Err(InputError::SchemeMismatch(scheme)) if scheme == "v4l"
    ));
  }

  #[test]
  fn open_all_concatenates_in_flag_order() {
    let dir = tempfile::tempdir().unwrap();
    let folder = dir.path().join("uploads");
    std::fs::create_dir(&folder).unwrap();
    for name in ["b.png", "a.png"] {
      RgbImage::from_pixel(4, 4, Rgb([2, 2, 2]))
        .save(folder.join(name))
        .unwrap();
    }
    let single = dir.path().join("z.png");
    RgbImage::from_pixel(4, 4, Rgb([3, 3, 3])).save(&single).unwrap();

    let uploads =
      InputWrapper::open_all(&[url_for("image", &single), url_for("folder", &folder)]).unwrap();
    let names: Vec<_> = uploads.iter().map(|u| u.display_name()).collect();
    assert_eq!(names, ["z.png", "a.png", "b.png"]);

    assert!(InputWrapper::open_all(&[]).unwrap().is_empty());
  }

  #[test]
  fn open_all_stops_at_first_bad_source() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.png");
    let result = InputWrapper::open_all(&[url_for("image", &missing)]);
    assert!(matches!(result, Err(InputError::ImageFileInputError(_))));
  }
}
