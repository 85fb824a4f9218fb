// 该文件是 Shanan （山南西风） 项目的一部分。
// src/output/draw.rs - 质检结果标注
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

use ab_glyph::{FontRef, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;

use crate::{
  classify::Verdict,
  output::palette::{DANGER_RGB, SUCCESS_RGB},
  session::InspectionRecord,
};

const MIN_FONT_SIZE: f32 = 14.0;
// 字号占图像宽度的比例
const FONT_SIZE_RATIO: f32 = 0.05;
const BANNER_PADDING: i32 = 4;
const BORDER_THICKNESS: u32 = 3;
const TEXT_COLOR: [u8; 3] = [255, 255, 255];

pub struct Draw<'a> {
  font: FontRef<'a>,
}

impl<'a> Default for Draw<'a> {
  fn default() -> Self {
    let font_data = include_bytes!("../../assets/DejaVuSans.ttf");
    let font = FontRef::try_from_slice(font_data).expect("无法加载嵌入的字体文件");
    Self { font }
  }
}

/// 标注文字，缺陷类别只在判定为异常时出现
pub fn verdict_caption(verdict: &Verdict) -> String {
  let mut caption = format!("{} {:.2}%", verdict.label(), verdict.confidence * 100.0);
  if let Some((name, score)) = verdict.displayed_defect() {
    caption.push_str(&format!(" | {} {:.2}", name, score));
  }
  caption
}

impl Draw<'_> {
  /// 在图像四周画出判定颜色的边框，并在顶部绘制结果横幅
  pub fn draw_verdict(&self, record: &InspectionRecord) -> RgbImage {
    let mut image = record.upload.image.to_rgb8();
    let (w, h) = image.dimensions();
    let color = if record.verdict.is_anomaly {
      DANGER_RGB
    } else {
      SUCCESS_RGB
    };

    for t in 0..BORDER_THICKNESS.min(w / 2).min(h / 2) {
      let width = w - 2 * t;
      let height = h - 2 * t;
      if width == 0 || height == 0 {
        break;
      }
      let rect = Rect::at(t as i32, t as i32).of_size(width, height);
      draw_hollow_rect_mut(&mut image, rect, Rgb(color));
    }

    let font_size = (w as f32 * FONT_SIZE_RATIO).max(MIN_FONT_SIZE);
    let banner_height = (font_size as i32 + 2 * BANNER_PADDING).min(h as i32) as u32;
    if w > 0 && banner_height > 0 {
      let banner = Rect::at(0, 0).of_size(w, banner_height);
      draw_filled_rect_mut(&mut image, banner, Rgb(color));
      draw_text_mut(
        &mut image,
        Rgb(TEXT_COLOR),
        BANNER_PADDING,
        BANNER_PADDING,
        PxScale::from(font_size),
        &self.font,
        &verdict_caption(&record.verdict),
      );
    }

    image
  }
}
