//! Multi-layer perceptron regressor.
//!
//! Dense ReLU hidden layers, identity output, squared loss with L2 penalty,
//! trained with Adam on shuffled mini-batches. All randomness comes from one
//! seeded `StdRng`, so a fit is reproducible for a given `random_state`.

use anyhow::{Result, bail, ensure};
use ndarray::{Array1, Array2, Axis, Dimension, Zip};
use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};

use crate::config::{DF, constants::bitcoin::mlp};
use crate::models::Regressor;

#[derive(Debug, Clone)]
pub struct MlpConfig {
    pub hidden_layers: Vec<usize>,
    pub learning_rate: f64,
    /// L2 penalty strength.
    pub alpha: f64,
    pub max_iter: usize,
    /// `None` means `min(200, n_samples)`.
    pub batch_size: Option<usize>,
    pub tol: f64,
    pub n_iter_no_change: usize,
    pub random_state: u64,
    /// Inverted dropout after the first hidden layer, training only.
    pub dropout: Option<f64>,
    pub beta1: f64,
    pub beta2: f64,
    pub epsilon: f64,
}

impl Default for MlpConfig {
    fn default() -> Self {
        Self {
            hidden_layers: mlp::HIDDEN_LAYERS.to_vec(),
            learning_rate: mlp::LEARNING_RATE,
            alpha: mlp::L2_ALPHA,
            max_iter: mlp::MAX_ITER,
            batch_size: None,
            tol: mlp::TOL,
            n_iter_no_change: mlp::N_ITER_NO_CHANGE,
            random_state: mlp::RANDOM_STATE,
            dropout: None,
            beta1: mlp::BETA1,
            beta2: mlp::BETA2,
            epsilon: mlp::EPSILON,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TrainingSummary {
    pub epochs: usize,
    pub final_loss: f64,
    pub loss_curve: Vec<f64>,
    /// True when training stopped on the no-improvement rule before `max_iter`.
    pub converged: bool,
}

#[derive(Debug, Clone)]
struct DenseLayer {
    weights: Array2<f64>,
    biases: Array1<f64>,
}

#[derive(Debug, Clone)]
struct AdamMoments {
    m_w: Array2<f64>,
    v_w: Array2<f64>,
    m_b: Array1<f64>,
    v_b: Array1<f64>,
}

type Gradients = Vec<(Array2<f64>, Array1<f64>)>;

#[derive(Debug, Clone)]
pub struct MlpRegressor {
    config: MlpConfig,
    layers: Vec<DenseLayer>,
}

impl MlpRegressor {
    pub fn new(config: MlpConfig) -> Self {
        Self {
            config,
            layers: Vec::new(),
        }
    }

    pub fn is_fitted(&self) -> bool {
        !self.layers.is_empty()
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<TrainingSummary> {
        let (n_samples, n_features) = x.dim();
        ensure!(n_samples > 0, "cannot train on zero samples");
        ensure!(
            n_samples == y.len(),
            "dimension mismatch: {} rows vs {} targets",
            n_samples,
            y.len()
        );
        ensure!(n_features > 0, "cannot train on zero features");
        if let Some(p) = self.config.dropout {
            ensure!((0.0..1.0).contains(&p), "dropout must be in [0, 1), got {}", p);
        }

        let cfg = self.config.clone();
        let mut rng = StdRng::seed_from_u64(cfg.random_state);

        let mut sizes = Vec::with_capacity(cfg.hidden_layers.len() + 2);
        sizes.push(n_features);
        sizes.extend(cfg.hidden_layers.iter().copied());
        sizes.push(1);

        self.layers = sizes
            .windows(2)
            .map(|w| glorot_uniform(w[0], w[1], &mut rng))
            .collect();
        let mut moments: Vec<AdamMoments> = self
            .layers
            .iter()
            .map(|l| AdamMoments {
                m_w: Array2::zeros(l.weights.dim()),
                v_w: Array2::zeros(l.weights.dim()),
                m_b: Array1::zeros(l.biases.len()),
                v_b: Array1::zeros(l.biases.len()),
            })
            .collect();

        let batch_size = cfg
            .batch_size
            .unwrap_or(mlp::MAX_BATCH_SIZE)
            .clamp(1, n_samples);

        let mut indices: Vec<usize> = (0..n_samples).collect();
        let mut loss_curve = Vec::with_capacity(cfg.max_iter);
        let mut best_loss = f64::INFINITY;
        let mut no_improvement = 0;
        let mut step: i32 = 0;
        let mut converged = false;

        for epoch in 0..cfg.max_iter {
            indices.shuffle(&mut rng);
            let mut accumulated = 0.0;

            for chunk in indices.chunks(batch_size) {
                let xb = x.select(Axis(0), chunk);
                let yb = y.select(Axis(0), chunk);
                let (loss, grads) = self.backprop(&xb, &yb, &mut rng);
                accumulated += loss * chunk.len() as f64;

                step += 1;
                let lr_t = cfg.learning_rate * (1.0 - cfg.beta2.powi(step)).sqrt()
                    / (1.0 - cfg.beta1.powi(step));
                for ((layer, m), (gw, gb)) in
                    self.layers.iter_mut().zip(moments.iter_mut()).zip(&grads)
                {
                    adam_step(&mut layer.weights, &mut m.m_w, &mut m.v_w, gw, lr_t, &cfg);
                    adam_step(&mut layer.biases, &mut m.m_b, &mut m.v_b, gb, lr_t, &cfg);
                }
            }

            let epoch_loss = accumulated / n_samples as f64;
            if !epoch_loss.is_finite() {
                bail!("training diverged at epoch {} (loss {})", epoch + 1, epoch_loss);
            }
            loss_curve.push(epoch_loss);

            if DF.log_training_progress && (epoch + 1) % DF.training_log_every.max(1) == 0 {
                log::info!("epoch {:>4}: loss {:.6}", epoch + 1, epoch_loss);
            }

            if epoch_loss > best_loss - cfg.tol {
                no_improvement += 1;
            } else {
                no_improvement = 0;
            }
            if epoch_loss < best_loss {
                best_loss = epoch_loss;
            }
            if no_improvement > cfg.n_iter_no_change {
                converged = true;
                break;
            }
        }

        Ok(TrainingSummary {
            epochs: loss_curve.len(),
            final_loss: loss_curve.last().copied().unwrap_or(f64::NAN),
            loss_curve,
            converged,
        })
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let Some(first) = self.layers.first() else {
            bail!("model has not been fitted yet");
        };
        ensure!(
            x.ncols() == first.weights.nrows(),
            "expected {} features, got {}",
            first.weights.nrows(),
            x.ncols()
        );

        let last = self.layers.len() - 1;
        let mut a = x.to_owned();
        for (i, layer) in self.layers.iter().enumerate() {
            let z = a.dot(&layer.weights) + &layer.biases;
            a = if i == last { z } else { z.mapv(relu) };
        }
        Ok(a.column(0).to_owned())
    }

    /// One forward and backward pass over a batch. Returns the penalised loss and
    /// per-layer (weight, bias) gradients.
    fn backprop(&self, xb: &Array2<f64>, yb: &Array1<f64>, rng: &mut StdRng) -> (f64, Gradients) {
        let n = xb.nrows() as f64;
        let last = self.layers.len() - 1;

        let mut activations: Vec<Array2<f64>> = Vec::with_capacity(self.layers.len() + 1);
        let mut masks: Vec<Option<Array2<f64>>> = Vec::with_capacity(self.layers.len());
        activations.push(xb.to_owned());

        for (i, layer) in self.layers.iter().enumerate() {
            let z = activations[i].dot(&layer.weights) + &layer.biases;
            if i == last {
                masks.push(None);
                activations.push(z);
                continue;
            }
            let mut a = z.mapv(relu);
            match self.config.dropout {
                Some(p) if i == 0 && p > 0.0 => {
                    let keep = 1.0 / (1.0 - p);
                    let mask = Array2::from_shape_fn(a.dim(), |_| {
                        if rng.gen_range(0.0..1.0) < p { 0.0 } else { keep }
                    });
                    a = a * &mask;
                    masks.push(Some(mask));
                }
                _ => masks.push(None),
            }
            activations.push(a);
        }

        let output = activations[last + 1].column(0).to_owned();
        let diff = &output - yb;
        let penalty: f64 = self
            .layers
            .iter()
            .map(|l| l.weights.mapv(|w| w * w).sum())
            .sum();
        let loss = diff.mapv(|d| d * d).sum() / (2.0 * n) + 0.5 * self.config.alpha * penalty / n;

        let mut delta = diff.insert_axis(Axis(1)) / n;
        let mut grads: Gradients = Vec::with_capacity(self.layers.len());

        for i in (0..self.layers.len()).rev() {
            let layer = &self.layers[i];
            let grad_w =
                activations[i].t().dot(&delta) + &(&layer.weights * (self.config.alpha / n));
            let grad_b = delta.sum_axis(Axis(0));

            if i > 0 {
                let mut upstream = delta.dot(&layer.weights.t());
                if let Some(mask) = &masks[i - 1] {
                    upstream = upstream * mask;
                }
                // ReLU derivative: the hidden output is positive exactly where z > 0
                Zip::from(&mut upstream)
                    .and(&activations[i])
                    .for_each(|g, &a| {
                        if a <= 0.0 {
                            *g = 0.0;
                        }
                    });
                delta = upstream;
            }
            grads.push((grad_w, grad_b));
        }
        grads.reverse();

        (loss, grads)
    }
}

impl Regressor for MlpRegressor {
    fn predict_one(&self, x: &[f64]) -> Result<f64> {
        let row = Array2::from_shape_vec((1, x.len()), x.to_vec())?;
        let out = self.predict(&row)?;
        Ok(out[0])
    }
}

fn relu(v: f64) -> f64 {
    v.max(0.0)
}

/// Weights and biases drawn from U(-b, b) with b = sqrt(6 / (fan_in + fan_out)).
fn glorot_uniform(fan_in: usize, fan_out: usize, rng: &mut StdRng) -> DenseLayer {
    let bound = (6.0 / (fan_in + fan_out) as f64).sqrt();
    let weights = Array2::from_shape_fn((fan_in, fan_out), |_| rng.gen_range(-bound..bound));
    let biases = Array1::from_shape_fn(fan_out, |_| rng.gen_range(-bound..bound));
    DenseLayer { weights, biases }
}

fn adam_step<D: Dimension>(
    param: &mut ndarray::Array<f64, D>,
    m: &mut ndarray::Array<f64, D>,
    v: &mut ndarray::Array<f64, D>,
    grad: &ndarray::Array<f64, D>,
    lr_t: f64,
    cfg: &MlpConfig,
) {
    Zip::from(param)
        .and(m)
        .and(v)
        .and(grad)
        .for_each(|p, m, v, &g| {
            *m = cfg.beta1 * *m + (1.0 - cfg.beta1) * g;
            *v = cfg.beta2 * *v + (1.0 - cfg.beta2) * g * g;
            *p -= lr_t * *m / (v.sqrt() + cfg.epsilon);
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn toy_data() -> (Array2<f64>, Array1<f64>) {
        let n = 60;
        let x = Array2::from_shape_fn((n, 2), |(i, j)| {
            let t = i as f64 / n as f64;
            if j == 0 { t } else { 1.0 - t * t }
        });
        let y = x.map_axis(Axis(1), |r| 0.6 * r[0] + 0.3 * r[1] + 0.05);
        (x, y)
    }

    fn small_config() -> MlpConfig {
        MlpConfig {
            hidden_layers: vec![16, 8],
            max_iter: 300,
            learning_rate: 1e-2,
            ..MlpConfig::default()
        }
    }

    #[test]
    fn loss_decreases_on_simple_target() {
        let (x, y) = toy_data();
        let mut model = MlpRegressor::new(small_config());
        let summary = model.fit(&x, &y).unwrap();

        assert!(summary.epochs >= 1 && summary.epochs <= 300);
        let first = summary.loss_curve[0];
        assert!(summary.final_loss < first);
        assert!(summary.final_loss.is_finite());
    }

    #[test]
    fn same_seed_same_model() {
        let (x, y) = toy_data();
        let mut a = MlpRegressor::new(small_config());
        let mut b = MlpRegressor::new(small_config());
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        let row = [0.4, 0.84];
        assert_relative_eq!(a.predict_one(&row).unwrap(), b.predict_one(&row).unwrap());
    }

    #[test]
    fn dropout_training_still_fits() {
        let (x, y) = toy_data();
        let mut model = MlpRegressor::new(MlpConfig {
            dropout: Some(0.2),
            ..small_config()
        });
        let summary = model.fit(&x, &y).unwrap();
        assert!(summary.final_loss.is_finite());
        assert!(model.predict(&x).unwrap().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn rejects_bad_input() {
        let mut model = MlpRegressor::new(small_config());
        assert!(model.predict_one(&[1.0, 2.0]).is_err());

        let x = Array2::zeros((3, 2));
        let y = Array1::zeros(2);
        assert!(model.fit(&x, &y).is_err());

        let mut bad_dropout = MlpRegressor::new(MlpConfig {
            dropout: Some(1.5),
            ..small_config()
        });
        assert!(bad_dropout.fit(&x, &Array1::zeros(3)).is_err());
    }

    #[test]
    fn predict_checks_feature_count() {
        let (x, y) = toy_data();
        let mut model = MlpRegressor::new(small_config());
        model.fit(&x, &y).unwrap();
        assert!(model.is_fitted());
        assert!(model.predict_one(&[1.0, 2.0, 3.0]).is_err());
    }
}
