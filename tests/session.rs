// 该文件是 Shanan （山南西风） 项目的一部分。
// tests/session.rs - 质检会话集成测试
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

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use image::{DynamicImage, Rgb, RgbImage};
use thiserror::Error;

use shanan_inspect::{
  classify::{Classifier, ClassifyMode},
  config::InspectConfig,
  frame::InspectTensor,
  input::UploadedImage,
  model::{Model, RawModelOutput},
  output::Render,
  session::InspectionSession,
  task::{OneShotTask, SessionTask, Task},
};

#[derive(Error, Debug)]
#[error("stub model failure")]
struct StubModelError;

/// 按图像平均亮度给出异常概率，并返回固定的多分类 logits
struct BrightnessModel {
  logits: Vec<f32>,
  calls: Rc<Cell<usize>>,
}

impl BrightnessModel {
  fn new(logits: Vec<f32>) -> Self {
    Self {
      logits,
      calls: Rc::new(Cell::new(0)),
    }
  }
}

impl Model for BrightnessModel {
  type Input = InspectTensor;
  type Output = RawModelOutput;
  type Error = StubModelError;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    use shanan_inspect::frame::AsNchwTensor;
    self.calls.set(self.calls.get() + 1);
    let data = input.as_nchw();
    if data.len() != 3 * 224 * 224 {
      return Err(StubModelError);
    }
    let mean = data.iter().sum::<f32>() / data.len() as f32;
    Ok(RawModelOutput {
      binary_probability: mean,
      multiclass_logits: self.logits.clone(),
    })
  }
}

#[derive(Error, Debug)]
#[error("stub render failure")]
struct StubRenderError;

#[derive(Default, Clone)]
struct CaptureRender {
  rendered: Rc<RefCell<Vec<(usize, usize)>>>,
}

impl Render<InspectionSession> for CaptureRender {
  type Error = StubRenderError;

  fn render_result(&self, session: &InspectionSession) -> Result<(), Self::Error> {
    self
      .rendered
      .borrow_mut()
      .push((session.len(), session.anomaly_count()));
    Ok(())
  }
}

fn solid(name: &str, value: u8) -> UploadedImage {
  UploadedImage::new(
    Some(name.to_string()),
    DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 48, Rgb([value, value, value]))),
  )
}

#[test]
fn session_partitions_uploads_by_verdict() {
  let render = CaptureRender::default();
  let model = BrightnessModel::new(vec![0.0; 9]);
  let calls = model.calls.clone();
  let classifier = Classifier::new(InspectConfig::default(), ClassifyMode::Binary);

  let uploads = vec![
    solid("white.png", 255),
    solid("black.png", 0),
    solid("light.png", 230),
  ];
  let session = SessionTask::new(classifier, "EfficientNetB0")
    .run_task(uploads, model, render.clone())
    .unwrap();

  assert_eq!(calls.get(), 3);
  assert_eq!(session.len(), 3);
  assert_eq!(session.model_name(), "EfficientNetB0");
  assert_eq!(session.anomaly_count(), 2);
  let anomalies: Vec<&str> = session
    .anomalies()
    .map(|r| r.upload.display_name())
    .collect();
  assert_eq!(anomalies, ["white.png", "light.png"]);
  let normals: Vec<&str> = session.normals().map(|r| r.upload.display_name()).collect();
  assert_eq!(normals, ["black.png"]);

  // 正常图像的置信度为 1 - p
  let black = &session.all()[1].verdict;
  assert!(!black.is_anomaly);
  assert!((black.confidence - 1.0).abs() < 1e-6);

  assert_eq!(*render.rendered.borrow(), [(3, 2)]);
}

#[test]
fn multi_mode_sets_defect_but_hides_it_for_normal() {
  let mut logits = vec![0.0f32; 9];
  logits[1] = 4.0;
  let model = BrightnessModel::new(logits);
  let classifier = Classifier::new(InspectConfig::default(), ClassifyMode::Multi);

  let session = SessionTask::new(classifier, "EfficientNetB0")
    .run_task(
      vec![solid("white.png", 255), solid("black.png", 0)],
      model,
      CaptureRender::default(),
    )
    .unwrap();

  let white = &session.all()[0].verdict;
  let black = &session.all()[1].verdict;
  assert_eq!(white.defect_name.as_deref(), Some("crack"));
  assert_eq!(black.defect_name.as_deref(), Some("crack"));
  assert_eq!(white.displayed_defect().map(|(name, _)| name), Some("crack"));
  assert!(black.displayed_defect().is_none());
}

#[test]
fn mismatched_class_count_aborts_session() {
  let render = CaptureRender::default();
  let model = BrightnessModel::new(vec![0.0; 4]);
  let classifier = Classifier::new(InspectConfig::default(), ClassifyMode::Multi);

  let result = SessionTask::new(classifier, "EfficientNetB0").run_task(
    vec![solid("a.png", 255)],
    model,
    render.clone(),
  );

  assert!(result.is_err());
  assert!(render.rendered.borrow().is_empty());
}

#[test]
fn empty_session_still_renders() {
  let render = CaptureRender::default();
  let classifier = Classifier::new(InspectConfig::default(), ClassifyMode::Binary);

  let session = SessionTask::new(classifier, "EfficientNetB0")
    .run_task(
      Vec::<UploadedImage>::new(),
      BrightnessModel::new(vec![0.0; 9]),
      render.clone(),
    )
    .unwrap();

  assert!(session.is_empty());
  assert_eq!(*render.rendered.borrow(), [(0, 0)]);
}

#[test]
fn oneshot_inspects_first_upload_only() {
  let model = BrightnessModel::new(vec![0.0; 9]);
  let calls = model.calls.clone();
  let classifier = Classifier::new(InspectConfig::default(), ClassifyMode::Binary);

  let session = OneShotTask::new(classifier, "EfficientNetB0")
    .run_task(
      vec![solid("first.png", 0), solid("second.png", 255)],
      model,
      CaptureRender::default(),
    )
    .unwrap();

  assert_eq!(calls.get(), 1);
  assert_eq!(session.len(), 1);
  assert_eq!(session.all()[0].upload.display_name(), "first.png");
}

#[test]
fn oneshot_without_input_fails() {
  let classifier = Classifier::new(InspectConfig::default(), ClassifyMode::Binary);
  let result = OneShotTask::new(classifier, "EfficientNetB0").run_task(
    Vec::<UploadedImage>::new(),
    BrightnessModel::new(vec![0.0; 9]),
    CaptureRender::default(),
  );
  assert!(result.is_err());
}
