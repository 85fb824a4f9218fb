// 该文件是 Shanan （山南西风） 项目的一部分。
// src/preprocess.rs - 图像预处理
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

//! 将任意图像转换为模型输入张量。
//!
//! 处理顺序固定为：转换为 RGB、双线性缩放（`FilterType::Triangle`）、
//! 除以 255 映射到 [0, 1]、增加批次维度。这里不做均值/方差归一化，
//! 模型训练时的输入同样只缩放到 [0, 1]。

use image::{DynamicImage, RgbImage, imageops::FilterType};
use tracing::debug;

use crate::frame::{InspectTensor, RgbNchwTensor};

/// 缩放使用的插值方式
pub const RESIZE_FILTER: FilterType = FilterType::Triangle;

pub fn preprocess(image: &DynamicImage) -> InspectTensor {
  preprocess_to(image)
}

pub fn preprocess_to<const W: u32, const H: u32>(image: &DynamicImage) -> RgbNchwTensor<W, H> {
  debug!(
    "预处理图像: {}x{} {:?} -> {}x{}",
    image.width(),
    image.height(),
    image.color(),
    W,
    H
  );
  let rgb = image.to_rgb8();
  let resized = image::imageops::resize(&rgb, W, H, RESIZE_FILTER);
  RgbNchwTensor::from(&resized)
}

impl<const W: u32, const H: u32> From<&RgbImage> for RgbNchwTensor<W, H> {
  fn from(image: &RgbImage) -> Self {
    let mut tensor = RgbNchwTensor::<W, H>::default();

    let channels = tensor.channels();
    let height = tensor.height().min(image.height() as usize);
    let width = tensor.width().min(image.width() as usize);
    let plane = tensor.height() * tensor.width();
    let row = tensor.width();
    let slice = tensor.as_mut();

    for c in 0..channels {
      for h in 0..height {
        for w in 0..width {
          let pixel = image.get_pixel(w as u32, h as u32);
          slice[c * plane + h * row + w] = f32::from(pixel[c]) / 255.0;
        }
      }
    }
    tensor
  }
}
