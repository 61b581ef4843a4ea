//! Single-sample evaluation: model forward pass, heatmap decoding, figure.

use crate::io::{EvalConfig, EvalIoError, EvaluationReport, LandmarkReport};
use crate::visualize::{Figure, VisualizeError};
use eyemark_core::{mean_maps, DecodeError, DecodedLandmark, Heatmap, HeatmapDecoder};
use eyemark_posenet::{load_optional, ModelError, ModelSource, PoseModel};
use eyemark_unityeyes::{DatasetError, Sample, UnityEyesDataset};
use std::path::Path;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Errors that abort an evaluation run.
#[derive(thiserror::Error, Debug)]
pub enum EvalError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Visualize(#[from] VisualizeError),

    #[error(transparent)]
    Io(#[from] EvalIoError),

    #[error("model produced no stacks")]
    NoStacks,
}

/// Everything one evaluation produces.
#[derive(Clone, Debug)]
pub struct Evaluation {
    /// One entry per channel of the last stack, in channel order.
    pub decoded: Vec<DecodedLandmark>,
    /// Sum of the ground-truth heatmaps.
    pub ground_truth_sum: Heatmap,
    /// Mean of the re-rendered predictions.
    pub prediction_mean: Heatmap,
    pub nstack: usize,
    /// `(width, height)` of the raw network heatmaps.
    pub heatmap_size: (usize, usize),
}

impl Evaluation {
    /// Run the model on `sample.img` and decode the last stack.
    #[cfg_attr(feature = "tracing", instrument(level = "info", skip_all))]
    pub fn run<M: PoseModel + ?Sized>(
        model: &M,
        sample: &Sample,
        decoder: &HeatmapDecoder,
    ) -> Result<Self, EvalError> {
        let output = model.forward(&sample.img)?;
        let nstack = output.len();
        let last = output.into_last().ok_or(EvalError::NoStacks)?;
        let heatmap_size = last.size();

        let decoded = decoder.decode_stack(&last)?;
        debug_assert_eq!(decoded.len(), last.len());
        if decoded.len() != sample.heatmaps.len() {
            log::warn!(
                "model predicts {} channels, ground truth has {}",
                decoded.len(),
                sample.heatmaps.len()
            );
        }

        let prediction_mean = mean_maps(decoded.iter().map(|d| &d.rendered))?;
        Ok(Self {
            decoded,
            ground_truth_sum: sample.heatmaps.sum(),
            prediction_mean,
            nstack,
            heatmap_size,
        })
    }

    /// Per-channel report rows, paired with ground truth by channel index.
    pub fn landmark_reports(&self, sample: &Sample, decoder: &HeatmapDecoder) -> Vec<LandmarkReport> {
        let (img_w, img_h) = sample.img.size();
        let sx = decoder.params.output_width as f32 / img_w as f32;
        let sy = decoder.params.output_height as f32 / img_h as f32;
        self.decoded
            .iter()
            .map(|d| {
                let predicted = [d.centroid.row, d.centroid.col];
                let gt = sample
                    .landmarks
                    .get(d.channel)
                    .map(|p| [p.y * sy, p.x * sx]);
                let error_px = gt.map(|[r, c]| {
                    let dr = r - predicted[0] as f32;
                    let dc = c - predicted[1] as f32;
                    (dr * dr + dc * dc).sqrt()
                });
                LandmarkReport {
                    channel: d.channel,
                    predicted,
                    ground_truth: gt,
                    error_px,
                }
            })
            .collect()
    }

    /// Original image, network input, summed ground truth, averaged prediction.
    pub fn figure(&self, sample: &Sample, panel_height: u32) -> Result<Figure, VisualizeError> {
        let mut fig = Figure::new(panel_height);
        fig.push(&sample.full_img)?;
        fig.push_heatmap(&sample.img)?;
        fig.push_heatmap(&self.ground_truth_sum)?;
        fig.push_heatmap(&self.prediction_mean)?;
        Ok(fig)
    }
}

fn mean_error(rows: &[LandmarkReport]) -> Option<f32> {
    let errors: Vec<f32> = rows.iter().filter_map(|r| r.error_px).collect();
    if errors.is_empty() {
        return None;
    }
    Some(errors.iter().sum::<f32>() / errors.len() as f32)
}

/// Execute a full run described by `cfg` and return its report.
///
/// Writes the figure to `cfg.output_path()` and, when configured, the report
/// to `cfg.report_path`.
pub fn run(cfg: &EvalConfig) -> Result<EvaluationReport, EvalError> {
    let dataset = UnityEyesDataset::open(&cfg.dataset_dir, cfg.preprocess)?;
    let sample = dataset.get(cfg.sample_index)?;

    let (model, source) = load_optional(Path::new(&cfg.checkpoint_path), cfg.model, cfg.seed)?;
    if let ModelSource::RandomInit { seed } = &source {
        log::warn!("no checkpoint found, model is randomly initialized (seed={seed})");
    }

    let decoder = HeatmapDecoder::new(cfg.decode);
    let eval = Evaluation::run(&model, &sample, &decoder)?;

    let figure_path = cfg.output_path();
    eval.figure(&sample, cfg.panel_height)?.save(&figure_path)?;
    log::info!("wrote figure to {}", figure_path.display());

    let landmarks = eval.landmark_reports(&sample, &decoder);
    let report = EvaluationReport {
        dataset_dir: cfg.dataset_dir.clone(),
        sample_index: cfg.sample_index,
        model_source: match source {
            ModelSource::Checkpoint(_) => "checkpoint",
            ModelSource::RandomInit { .. } => "random_init",
        }
        .to_string(),
        checkpoint_path: match &source {
            ModelSource::Checkpoint(p) => Some(p.to_string_lossy().into_owned()),
            ModelSource::RandomInit { .. } => None,
        },
        nstack: eval.nstack,
        channels: eval.decoded.len(),
        heatmap_size: [eval.heatmap_size.0, eval.heatmap_size.1],
        output_size: [decoder.params.output_width, decoder.params.output_height],
        mean_error_px: mean_error(&landmarks),
        landmarks,
        figure_path: Some(figure_path.to_string_lossy().into_owned()),
    };

    if let Some(path) = &cfg.report_path {
        report.write_json(path)?;
        log::info!("wrote report to {path}");
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use eyemark_core::{render_gaussian_at, HeatmapStack};
    use eyemark_posenet::{PoseNetConfig, PriorHeadNet, StackOutput};
    use nalgebra::Point2;

    /// Emits fixed stacks regardless of input.
    struct FixedModel {
        config: PoseNetConfig,
        stacks: Vec<HeatmapStack>,
    }

    impl PoseModel for FixedModel {
        fn config(&self) -> &PoseNetConfig {
            &self.config
        }

        fn forward(&self, _img: &Heatmap) -> Result<StackOutput, ModelError> {
            Ok(StackOutput {
                stacks: self.stacks.clone(),
            })
        }
    }

    fn fixed(stacks: Vec<HeatmapStack>) -> FixedModel {
        FixedModel {
            config: PoseNetConfig::default(),
            stacks,
        }
    }

    fn sample() -> Sample {
        // Landmarks in 160x96 crop pixels, heatmaps at half resolution.
        let landmarks = vec![Point2::new(40.0, 20.0), Point2::new(120.0, 70.0)];
        let heatmaps = HeatmapStack::new(
            landmarks
                .iter()
                .map(|p| render_gaussian_at(80, 48, p.y / 2.0, p.x / 2.0, 2.0))
                .collect(),
        )
        .unwrap();
        Sample {
            full_img: image::RgbImage::new(64, 48),
            img: Heatmap::zeros(160, 96),
            heatmaps,
            landmarks,
        }
    }

    #[test]
    fn decodes_last_stack_and_pairs_ground_truth() {
        let s = sample();
        let noise = HeatmapStack::new(vec![
            render_gaussian_at(80, 48, 40.0, 5.0, 2.0),
            render_gaussian_at(80, 48, 5.0, 70.0, 2.0),
        ])
        .unwrap();
        let model = fixed(vec![noise, s.heatmaps.clone()]);
        let decoder = HeatmapDecoder::default();

        let eval = Evaluation::run(&model, &s, &decoder).unwrap();
        assert_eq!(eval.nstack, 2);
        assert_eq!(eval.heatmap_size, (80, 48));
        assert_eq!(eval.decoded.len(), 2);
        assert_eq!(eval.prediction_mean.size(), (150, 90));
        assert_eq!(eval.ground_truth_sum.size(), (80, 48));

        let rows = eval.landmark_reports(&s, &decoder);
        assert_eq!(rows.len(), 2);
        for row in &rows {
            let err = row.error_px.expect("ground truth present");
            assert!(err < 2.0, "channel {} error {err}", row.channel);
        }
        assert!(mean_error(&rows).unwrap() < 2.0);
    }

    #[test]
    fn empty_model_output_is_an_error() {
        let model = fixed(vec![]);
        let err = Evaluation::run(&model, &sample(), &HeatmapDecoder::default()).unwrap_err();
        assert!(matches!(err, EvalError::NoStacks));
    }

    #[test]
    fn degenerate_channel_aborts_the_run() {
        let stack = HeatmapStack::new(vec![
            render_gaussian_at(80, 48, 10.0, 10.0, 2.0),
            Heatmap::zeros(80, 48),
        ])
        .unwrap();
        let model = fixed(vec![stack]);
        let err = Evaluation::run(&model, &sample(), &HeatmapDecoder::default()).unwrap_err();
        assert!(matches!(
            err,
            EvalError::Decode(DecodeError::EmptyMask { channel: 1 })
        ));
    }

    #[test]
    fn random_network_decodes_every_channel() {
        let model = PriorHeadNet::random(PoseNetConfig::default(), 11).unwrap();
        let s = sample();
        let decoder = HeatmapDecoder::default();
        let eval = Evaluation::run(&model, &s, &decoder).unwrap();
        assert_eq!(eval.decoded.len(), 32);
        assert_eq!(eval.nstack, 8);
        for d in &eval.decoded {
            assert!(d.centroid.row < 90 && d.centroid.col < 150);
        }
        // Only two ground-truth landmarks exist.
        let rows = eval.landmark_reports(&s, &decoder);
        assert_eq!(rows.iter().filter(|r| r.ground_truth.is_some()).count(), 2);

        let fig = eval.figure(&s, 60).unwrap();
        assert_eq!(fig.len(), 4);
        assert_eq!(fig.render().unwrap().height(), 60);
    }
}
