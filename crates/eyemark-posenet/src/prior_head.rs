//! Stacked prior-head heatmap network.
//!
//! Every stack emits, per channel `c`,
//! `weight[c] * x + bias[c] + G(mean[c], sigma[c]) + refine[c] * prev[c]`
//! where `x` is the input resized to the heatmap resolution, `G` a unit-peak
//! Gaussian (mean in normalized `(row, col)`, sigma as a fraction of the
//! heatmap height) and `prev` the previous stack's output.

use crate::{Checkpoint, ModelError, PoseModel, PoseNetConfig, StackOutput, StateDict, TensorData};
use eyemark_core::{render_gaussian_at, resize_bilinear, Heatmap, HeatmapStack};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::{Path, PathBuf};

#[cfg(feature = "tracing")]
use tracing::instrument;

#[derive(Clone, Debug, PartialEq)]
struct StackParams {
    weight: Vec<f32>,
    bias: Vec<f32>,
    mean: Vec<[f32; 2]>,
    sigma: Vec<f32>,
    refine: Vec<f32>,
}

impl StackParams {
    fn random(rng: &mut StdRng, channels: usize) -> Self {
        Self {
            weight: (0..channels).map(|_| rng.gen_range(-0.1..0.1)).collect(),
            bias: (0..channels).map(|_| rng.gen_range(-0.05..0.05)).collect(),
            mean: (0..channels)
                .map(|_| [rng.gen_range(0.2..0.8), rng.gen_range(0.2..0.8)])
                .collect(),
            sigma: (0..channels).map(|_| rng.gen_range(0.05..0.12)).collect(),
            refine: (0..channels).map(|_| rng.gen_range(0.0..0.5)).collect(),
        }
    }
}

fn key(stack: usize, name: &str) -> String {
    format!("stacks.{stack}.{name}")
}

/// Where the parameters of a model came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModelSource {
    Checkpoint(PathBuf),
    RandomInit { seed: u64 },
}

impl ModelSource {
    pub fn is_checkpoint(&self) -> bool {
        matches!(self, ModelSource::Checkpoint(_))
    }
}

#[derive(Clone, Debug)]
pub struct PriorHeadNet {
    config: PoseNetConfig,
    stacks: Vec<StackParams>,
}

fn validate_config(config: &PoseNetConfig) -> Result<(), ModelError> {
    if config.nstack == 0 || config.oup_dim == 0 {
        return Err(ModelError::InvalidConfig(format!(
            "nstack={} and oup_dim={} must be positive",
            config.nstack, config.oup_dim
        )));
    }
    if config.heatmap_width == 0 || config.heatmap_height == 0 {
        return Err(ModelError::InvalidConfig(format!(
            "heatmap size {}x{} must be positive",
            config.heatmap_width, config.heatmap_height
        )));
    }
    Ok(())
}

impl PriorHeadNet {
    /// Randomly initialized network, reproducible for a given `seed`.
    pub fn random(config: PoseNetConfig, seed: u64) -> Result<Self, ModelError> {
        validate_config(&config)?;
        let mut rng = StdRng::seed_from_u64(seed);
        let stacks = (0..config.nstack)
            .map(|_| StackParams::random(&mut rng, config.oup_dim))
            .collect();
        Ok(Self { config, stacks })
    }

    /// Build the network from a checkpoint's `model_state_dict`.
    pub fn from_checkpoint(config: PoseNetConfig, ckpt: &Checkpoint) -> Result<Self, ModelError> {
        validate_config(&config)?;
        let c = config.oup_dim;
        let mut stacks = Vec::with_capacity(config.nstack);
        for s in 0..config.nstack {
            let mean = ckpt.param(&key(s, "prior.mean"), &[c, 2])?;
            let params = StackParams {
                weight: ckpt.param(&key(s, "head.weight"), &[c])?.data.clone(),
                bias: ckpt.param(&key(s, "head.bias"), &[c])?.data.clone(),
                mean: mean.data.chunks_exact(2).map(|m| [m[0], m[1]]).collect(),
                sigma: ckpt.param(&key(s, "prior.sigma"), &[c])?.data.clone(),
                refine: ckpt.param(&key(s, "refine"), &[c])?.data.clone(),
            };
            if let Some(ch) = params.sigma.iter().position(|v| !(*v > 0.0 && v.is_finite())) {
                return Err(ModelError::InvalidConfig(format!(
                    "{}[{ch}] must be positive and finite",
                    key(s, "prior.sigma")
                )));
            }
            stacks.push(params);
        }
        Ok(Self { config, stacks })
    }

    /// Export the parameters in checkpoint form.
    pub fn to_checkpoint(&self) -> Checkpoint {
        let c = self.config.oup_dim;
        let mut dict = StateDict::new();
        for (s, p) in self.stacks.iter().enumerate() {
            dict.insert(
                key(s, "head.weight"),
                TensorData::new(vec![c], p.weight.clone()),
            );
            dict.insert(key(s, "head.bias"), TensorData::new(vec![c], p.bias.clone()));
            dict.insert(
                key(s, "prior.mean"),
                TensorData::new(vec![c, 2], p.mean.iter().flatten().copied().collect()),
            );
            dict.insert(
                key(s, "prior.sigma"),
                TensorData::new(vec![c], p.sigma.clone()),
            );
            dict.insert(key(s, "refine"), TensorData::new(vec![c], p.refine.clone()));
        }
        Checkpoint::new(dict)
    }

    fn stack_forward(
        &self,
        params: &StackParams,
        x: &Heatmap,
        prev: Option<&HeatmapStack>,
    ) -> Vec<Heatmap> {
        let w = self.config.heatmap_width;
        let h = self.config.heatmap_height;
        (0..self.config.oup_dim)
            .map(|c| {
                let [mu_r, mu_c] = params.mean[c];
                let sigma_px = params.sigma[c] * h as f32;
                let mut out = render_gaussian_at(
                    w,
                    h,
                    mu_r * h as f32 - 0.5,
                    mu_c * w as f32 - 0.5,
                    sigma_px,
                );
                let (wc, bc) = (params.weight[c], params.bias[c]);
                for (o, &xv) in out.data.iter_mut().zip(&x.data) {
                    *o += wc * xv + bc;
                }
                if let Some(prev) = prev {
                    let rc = params.refine[c];
                    for (o, &pv) in out.data.iter_mut().zip(&prev.channels()[c].data) {
                        *o += rc * pv;
                    }
                }
                out
            })
            .collect()
    }
}

impl PoseModel for PriorHeadNet {
    fn config(&self) -> &PoseNetConfig {
        &self.config
    }

    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, img), fields(width = img.width, height = img.height))
    )]
    fn forward(&self, img: &Heatmap) -> Result<StackOutput, ModelError> {
        let x = resize_bilinear(img, self.config.heatmap_width, self.config.heatmap_height)?;
        let mut stacks: Vec<HeatmapStack> = Vec::with_capacity(self.stacks.len());
        for params in &self.stacks {
            let channels = self.stack_forward(params, &x, stacks.last());
            stacks.push(HeatmapStack::new(channels)?);
        }
        log::debug!(
            "forward pass produced {} stacks of {} channels",
            stacks.len(),
            self.config.oup_dim
        );
        Ok(StackOutput { stacks })
    }
}

/// Load `path` if it exists, otherwise fall back to a seeded random network.
///
/// A missing checkpoint is not an error.
pub fn load_optional(
    path: &Path,
    config: PoseNetConfig,
    seed: u64,
) -> Result<(PriorHeadNet, ModelSource), ModelError> {
    if path.exists() {
        let ckpt = Checkpoint::load_json(path)?;
        let net = PriorHeadNet::from_checkpoint(config, &ckpt)?;
        log::info!("loaded checkpoint from {}", path.display());
        Ok((net, ModelSource::Checkpoint(path.to_path_buf())))
    } else {
        log::debug!(
            "no checkpoint at {}, using random initialization (seed={seed})",
            path.display()
        );
        let net = PriorHeadNet::random(config, seed)?;
        Ok((net, ModelSource::RandomInit { seed }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CheckpointError;
    use approx::assert_abs_diff_eq;

    fn small_config() -> PoseNetConfig {
        PoseNetConfig {
            nstack: 3,
            oup_dim: 4,
            heatmap_width: 40,
            heatmap_height: 24,
        }
    }

    fn input() -> Heatmap {
        Heatmap::from_fn(160, 96, |r, c| ((r + c) % 7) as f32 / 7.0)
    }

    #[test]
    fn forward_shapes_follow_config() {
        let net = PriorHeadNet::random(PoseNetConfig::default(), 0).unwrap();
        let out = net.forward(&input()).unwrap();
        assert_eq!(out.len(), 8);
        let last = out.last().unwrap();
        assert_eq!(last.len(), 32);
        assert_eq!(last.size(), (80, 48));
    }

    #[test]
    fn random_init_is_reproducible() {
        let a = PriorHeadNet::random(small_config(), 42).unwrap();
        let b = PriorHeadNet::random(small_config(), 42).unwrap();
        let c = PriorHeadNet::random(small_config(), 43).unwrap();
        assert_eq!(a.stacks, b.stacks);
        assert_ne!(a.stacks, c.stacks);
    }

    #[test]
    fn checkpoint_round_trip_preserves_outputs() {
        let net = PriorHeadNet::random(small_config(), 7).unwrap();
        let restored = PriorHeadNet::from_checkpoint(small_config(), &net.to_checkpoint()).unwrap();
        let a = net.forward(&input()).unwrap();
        let b = restored.forward(&input()).unwrap();
        for (sa, sb) in a.stacks.iter().zip(&b.stacks) {
            assert_eq!(sa, sb);
        }
    }

    #[test]
    fn prior_peak_follows_mean() {
        let cfg = PoseNetConfig {
            nstack: 1,
            oup_dim: 1,
            heatmap_width: 40,
            heatmap_height: 20,
        };
        let mut dict = StateDict::new();
        dict.insert(key(0, "head.weight"), TensorData::new(vec![1], vec![0.0]));
        dict.insert(key(0, "head.bias"), TensorData::new(vec![1], vec![0.0]));
        // Pixel center (5, 30): row (5 + 0.5) / 20, col (30 + 0.5) / 40.
        dict.insert(
            key(0, "prior.mean"),
            TensorData::new(vec![1, 2], vec![5.5 / 20.0, 30.5 / 40.0]),
        );
        dict.insert(key(0, "prior.sigma"), TensorData::new(vec![1], vec![0.1]));
        dict.insert(key(0, "refine"), TensorData::new(vec![1], vec![0.0]));
        let net = PriorHeadNet::from_checkpoint(cfg, &Checkpoint::new(dict)).unwrap();

        let out = net.forward(&Heatmap::zeros(40, 20)).unwrap();
        let map = &out.last().unwrap().channels()[0];
        assert_eq!(map.argmax(), Some((5, 30)));
        assert_abs_diff_eq!(map.get(5, 30), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn incomplete_checkpoint_is_rejected() {
        let mut ckpt = PriorHeadNet::random(small_config(), 1).unwrap().to_checkpoint();
        ckpt.model_state_dict.remove("stacks.2.refine");
        let err = PriorHeadNet::from_checkpoint(small_config(), &ckpt).unwrap_err();
        assert!(matches!(
            err,
            ModelError::Checkpoint(CheckpointError::MissingKey(ref k)) if k == "stacks.2.refine"
        ));
    }

    #[test]
    fn non_positive_sigma_is_rejected() {
        let mut ckpt = PriorHeadNet::random(small_config(), 1).unwrap().to_checkpoint();
        ckpt.model_state_dict
            .get_mut("stacks.0.prior.sigma")
            .unwrap()
            .data[1] = 0.0;
        assert!(matches!(
            PriorHeadNet::from_checkpoint(small_config(), &ckpt),
            Err(ModelError::InvalidConfig(_))
        ));
    }

    #[test]
    fn zero_sized_config_is_rejected() {
        let cfg = PoseNetConfig {
            nstack: 0,
            ..PoseNetConfig::default()
        };
        assert!(matches!(
            PriorHeadNet::random(cfg, 0),
            Err(ModelError::InvalidConfig(_))
        ));
    }

    #[test]
    fn missing_checkpoint_falls_back_to_random_init() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checkpoint");
        let (net, source) = load_optional(&path, small_config(), 9).unwrap();
        assert_eq!(source, ModelSource::RandomInit { seed: 9 });
        assert_eq!(net.config(), &small_config());
    }

    #[test]
    fn present_checkpoint_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checkpoint");
        let saved = PriorHeadNet::random(small_config(), 5).unwrap();
        saved.to_checkpoint().write_json(&path).unwrap();

        let (net, source) = load_optional(&path, small_config(), 0).unwrap();
        assert!(source.is_checkpoint());
        let expected = saved.to_checkpoint().model_state_dict;
        let got = net.to_checkpoint().model_state_dict;
        assert_eq!(got.len(), expected.len());
        for (name, t) in &expected {
            let g = &got[name];
            assert_eq!(g.shape, t.shape, "{name}");
            for (a, b) in g.data.iter().zip(&t.data) {
                assert_abs_diff_eq!(*a, *b, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn corrupt_checkpoint_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checkpoint");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            load_optional(&path, small_config(), 0),
            Err(ModelError::Checkpoint(CheckpointError::Json(_)))
        ));
    }
}
