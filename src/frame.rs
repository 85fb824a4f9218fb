// 该文件是 Shanan （山南西风） 项目的一部分。
// src/frame.rs - NCHW 浮点张量定义
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

const RGB_CHANNELS: usize = 3;
const BATCH_SIZE: usize = 1;

/// 模型输入宽度
pub const INSPECT_INPUT_W: u32 = 224;
/// 模型输入高度
pub const INSPECT_INPUT_H: u32 = 224;

/// 质检模型使用的输入张量
pub type InspectTensor = RgbNchwTensor<INSPECT_INPUT_W, INSPECT_INPUT_H>;

pub trait AsNchwTensor<const W: u32, const H: u32> {
  fn as_nchw(&self) -> &[f32];
}

/// 形状为 (1, 3, H, W) 的 RGB 浮点张量，数值范围 [0, 1]
#[derive(Debug, Clone)]
pub struct RgbNchwTensor<const W: u32, const H: u32> {
  data: Box<[f32]>,
}

impl<const W: u32, const H: u32> RgbNchwTensor<W, H> {
  const LEN: usize = BATCH_SIZE * RGB_CHANNELS * (W as usize) * (H as usize);

  pub fn height(&self) -> usize {
    H as usize
  }

  pub fn width(&self) -> usize {
    W as usize
  }

  pub fn channels(&self) -> usize {
    RGB_CHANNELS
  }

  /// 张量形状 [N, C, H, W]
  pub fn shape(&self) -> [usize; 4] {
    [BATCH_SIZE, RGB_CHANNELS, H as usize, W as usize]
  }

  pub fn get(&self, c: usize, y: usize, x: usize) -> f32 {
    let plane = (W as usize) * (H as usize);
    self.data[c * plane + y * (W as usize) + x]
  }
}

impl<const W: u32, const H: u32> Default for RgbNchwTensor<W, H> {
  fn default() -> Self {
    let data = vec![0f32; Self::LEN].into_boxed_slice();
    Self { data }
  }
}

impl<const W: u32, const H: u32> AsMut<[f32]> for RgbNchwTensor<W, H> {
  fn as_mut(&mut self) -> &mut [f32] {
    &mut self.data
  }
}

impl<const W: u32, const H: u32> AsNchwTensor<W, H> for RgbNchwTensor<W, H> {
  fn as_nchw(&self) -> &[f32] {
    &self.data
  }
}
