// 该文件是 Shanan （山南西风） 项目的一部分。
// src/input/read_image_file.rs - 图像文件输入
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

use std::path::{Path, PathBuf};

use image::ImageReader;
use thiserror::Error;
use tracing::{debug, error, info};
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, input::UploadedImage, url_file_path};

/// 上传目录中接受的图像扩展名
const UPLOAD_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

#[derive(Error, Debug)]
pub enum ImageFileInputError {
  #[error("URI schema mismatch")]
  SchemaMismatch,
  #[error("I/O error: {0}")]
  IoError(std::io::Error),
  #[error("Image loading error ({0}): {1}")]
  ImageLoadError(PathBuf, image::ImageError),
}

impl From<std::io::Error> for ImageFileInputError {
  fn from(err: std::io::Error) -> Self {
    ImageFileInputError::IoError(err)
  }
}

fn decode_upload(path: &Path) -> Result<UploadedImage, ImageFileInputError> {
  debug!("解码图像文件: {}", path.display());
  let image = ImageReader::open(path)?
    .with_guessed_format()?
    .decode()
    .map_err(|e| ImageFileInputError::ImageLoadError(path.to_path_buf(), e))?;
  let name = path
    .file_name()
    .map(|name| name.to_string_lossy().into_owned());
  Ok(UploadedImage::new(name, image))
}

fn is_upload_file(path: &Path) -> bool {
  path.is_file()
    && path
      .extension()
      .map(|ext| ext.to_string_lossy().to_lowercase())
      .is_some_and(|ext| UPLOAD_EXTENSIONS.contains(&ext.as_str()))
}

/// 单个图像文件，`image:///path/to/file.png`
pub struct ImageFileInput {
  image: Option<UploadedImage>,
}

impl FromUrlWithScheme for ImageFileInput {
  const SCHEME: &'static str = "image";
}

impl FromUrl for ImageFileInput {
  type Error = ImageFileInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(ImageFileInputError::SchemaMismatch);
    }

    let upload = decode_upload(&url_file_path(url))?;
    Ok(ImageFileInput {
      image: Some(upload),
    })
  }
}

impl ImageFileInput {
  pub fn into_uploads(self) -> Vec<UploadedImage> {
    self.image.into_iter().collect()
  }
}

/// 目录中的全部 png/jpg/jpeg 文件，按文件名排序，`folder:///path/to/uploads`
pub struct ImageFolderInput {
  images: Vec<UploadedImage>,
}

impl FromUrlWithScheme for ImageFolderInput {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for ImageFolderInput {
  type Error = ImageFileInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(ImageFileInputError::SchemaMismatch);
    }

    let directory = url_file_path(url);
    let directory = directory.as_path();
    let mut paths = std::fs::read_dir(directory)?
      .map(|entry| entry.map(|entry| entry.path()))
      .collect::<Result<Vec<_>, _>>()?;
    paths.retain(|path| is_upload_file(path));
    paths.sort();

    info!(
      "上传目录 {} 中找到 {} 张图像",
      directory.display(),
      paths.len()
    );

    let images = paths
      .iter()
      .map(|path| decode_upload(path))
      .collect::<Result<Vec<_>, _>>()?;

    Ok(ImageFolderInput { images })
  }
}

impl ImageFolderInput {
  pub fn into_uploads(self) -> Vec<UploadedImage> {
    self.images
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::{GrayImage, Luma, Rgb, RgbImage};

  fn url_for(scheme: &str, path: &Path) -> Url {
    Url::parse(&format!("{}://{}", scheme, path.display())).unwrap()
  }

  #[test]
  fn reads_single_image_with_name() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("part-01.png");
    RgbImage::from_pixel(8, 6, Rgb([1, 2, 3])).save(&path).unwrap();

    let uploads = ImageFileInput::from_url(&url_for("image", &path))
      .unwrap()
      .into_uploads();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].name.as_deref(), Some("part-01.png"));
    assert_eq!(uploads[0].image.width(), 8);
    assert_eq!(uploads[0].image.height(), 6);
  }

  #[test]
  fn reads_file_names_with_spaces_and_cjk() {
    let dir = tempfile::tempdir().unwrap();
    let folder = dir.path().join("批次 01");
    std::fs::create_dir(&folder).unwrap();
    let path = folder.join("part a.png");
    RgbImage::from_pixel(5, 5, Rgb([7, 7, 7])).save(&path).unwrap();

    let url = url_for("image", &path);
    assert!(url.path().contains("%20"));
    let uploads = ImageFileInput::from_url(&url).unwrap().into_uploads();
    assert_eq!(uploads[0].display_name(), "part a.png");

    let uploads = ImageFolderInput::from_url(&url_for("folder", &folder))
      .unwrap()
      .into_uploads();
    assert_eq!(uploads.len(), 1);
  }

  #[test]
  fn folder_keeps_only_uploads_sorted() {
    let dir = tempfile::tempdir().unwrap();
    GrayImage::from_pixel(4, 4, Luma([10]))
      .save(dir.path().join("b.png"))
      .unwrap();
    RgbImage::from_pixel(4, 4, Rgb([9, 9, 9]))
      .save(dir.path().join("a.JPG"))
      .unwrap();
    std::fs::write(dir.path().join("notes.txt"), "skip me").unwrap();

    let uploads = ImageFolderInput::from_url(&url_for("folder", dir.path()))
      .unwrap()
      .into_uploads();
    let names: Vec<_> = uploads.iter().map(|u| u.display_name()).collect();
    assert_eq!(names, ["a.JPG", "b.png"]);
  }

  #[test]
  fn undecodable_file_is_an_input_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.png");
    std::fs::write(&path, b"not an image").unwrap();

    let err = ImageFileInput::from_url(&url_for("image", &path))
      .err()
      .unwrap();
    assert!(matches!(err, ImageFileInputError::ImageLoadError(_, _)));
  }

  #[test]
  fn wrong_scheme_is_rejected() {
    let url = Url::parse("video:///tmp/a.png").unwrap();
    assert!(matches!(
      ImageFileInput::from_url(&url),
      Err(ImageFileInputError::SchemaMismatch)
    ));
  }
}
