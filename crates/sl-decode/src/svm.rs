//! Binary C-support vector classification (SMO solver).
//!
//! Dual problem (`Q_ij = y_i y_j K(x_i, x_j)`):
//!
//! `min_a 0.5 aᵀQa - eᵀa  s.t.  0 <= a_i <= C,  yᵀa = 0`
//!
//! solved by sequential minimal optimisation with maximal-violating-pair
//! working-set selection. Decision function:
//! `f(x) = Σ a_i y_i K(x_i, x) - rho`; `f(x) > 0` predicts the larger class index.

use nalgebra::DMatrix;
use sl_core::{Classifier, Result};

use crate::dataset::{binary_classes, total_variance, validate_predict, validate_xy};

const TAU: f64 = 1e-12;

/// Kernel function.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Kernel {
    /// `K(u, v) = u·v`
    Linear,
    /// `K(u, v) = exp(-gamma |u - v|²)`; `None` selects
    /// `gamma = 1 / (n_features * Var(X))` from the training data.
    Rbf {
        /// Fixed gamma, or `None` for the data-scaled default
        gamma: Option<f64>,
    },
}

/// Solver configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SvcConfig {
    /// Kernel
    pub kernel: Kernel,
    /// Box constraint
    pub c: f64,
    /// KKT violation tolerance
    pub tol: f64,
    /// Iteration cap
    pub max_iter: usize,
}

impl SvcConfig {
    /// Linear kernel, C = 1.
    pub fn linear() -> Self {
        Self { kernel: Kernel::Linear, ..Self::default() }
    }

    /// RBF kernel with data-scaled gamma, C = 1.
    pub fn rbf() -> Self {
        Self::default()
    }
}

impl Default for SvcConfig {
    fn default() -> Self {
        Self { kernel: Kernel::Rbf { gamma: None }, c: 1.0, tol: 1e-3, max_iter: 10_000_000 }
    }
}

/// Fitted state.
#[derive(Debug, Clone)]
struct SvcModel {
    classes: [usize; 2],
    support: DMatrix<f64>,
    dual_coef: Vec<f64>,
    rho: f64,
    gamma: f64,
}

/// C-SVC for two classes.
#[derive(Debug, Clone)]
pub struct SupportVectorClassifier {
    config: SvcConfig,
    model: Option<SvcModel>,
}

impl SupportVectorClassifier {
    /// Unfitted classifier.
    pub fn new(config: SvcConfig) -> Self {
        Self { config, model: None }
    }

    /// Number of support vectors (0 before fit).
    pub fn n_support(&self) -> usize {
        self.model.as_ref().map(|m| m.support.nrows()).unwrap_or(0)
    }

    /// Offset `rho` of the decision function (`None` before fit).
    pub fn rho(&self) -> Option<f64> {
        self.model.as_ref().map(|m| m.rho)
    }

    /// Raw decision values `f(x)` for each row of `x`.
    pub fn decision_function(&self, x: &DMatrix<f64>) -> Result<Vec<f64>> {
        let n_features = self.model.as_ref().map(|m| m.support.ncols()).unwrap_or(0);
        validate_predict(x, n_features, self.name())?;
        let Some(m) = self.model.as_ref() else {
            return Ok(Vec::new());
        };
        let k = kernel_matrix(self.config.kernel, m.gamma, x, &m.support);
        Ok((0..x.nrows())
            .map(|r| {
                let s: f64 = (0..m.support.nrows()).map(|c| m.dual_coef[c] * k[(r, c)]).sum();
                s - m.rho
            })
            .collect())
    }
}

impl Classifier for SupportVectorClassifier {
    fn fit(&mut self, x: &DMatrix<f64>, y: &[usize]) -> Result<()> {
        validate_xy(x, y)?;
        let classes = binary_classes(y, self.name())?;
        let ys: Vec<f64> = y.iter().map(|&c| if c == classes[1] { 1.0 } else { -1.0 }).collect();

        let gamma = match self.config.kernel {
            Kernel::Linear => 0.0,
            Kernel::Rbf { gamma: Some(g) } => g,
            Kernel::Rbf { gamma: None } => {
                let var = total_variance(x);
                if var > 0.0 { 1.0 / (x.ncols() as f64 * var) } else { 1.0 }
            }
        };

        let gram = kernel_matrix(self.config.kernel, gamma, x, x);
        let (alpha, rho) = solve_smo(&gram, &ys, &self.config);

        let sv: Vec<usize> = (0..alpha.len()).filter(|&i| alpha[i] > 0.0).collect();
        let support = x.select_rows(sv.iter());
        let dual_coef = sv.iter().map(|&i| alpha[i] * ys[i]).collect();

        self.model = Some(SvcModel { classes, support, dual_coef, rho, gamma });
        Ok(())
    }

    fn predict(&self, x: &DMatrix<f64>) -> Result<Vec<usize>> {
        let f = self.decision_function(x)?;
        let Some(m) = self.model.as_ref() else {
            return Ok(Vec::new());
        };
        Ok(f.into_iter().map(|v| if v > 0.0 { m.classes[1] } else { m.classes[0] }).collect())
    }

    fn name(&self) -> &str {
        match self.config.kernel {
            Kernel::Linear => "SVClin",
            Kernel::Rbf { .. } => "SVCrbf",
        }
    }
}

/// `K[r, c] = K(a_r, b_c)`.
fn kernel_matrix(kernel: Kernel, gamma: f64, a: &DMatrix<f64>, b: &DMatrix<f64>) -> DMatrix<f64> {
    let dot = a * b.transpose();
    match kernel {
        Kernel::Linear => dot,
        Kernel::Rbf { .. } => {
            let na: Vec<f64> = a.row_iter().map(|r| r.norm_squared()).collect();
            let nb: Vec<f64> = b.row_iter().map(|r| r.norm_squared()).collect();
            DMatrix::from_fn(a.nrows(), b.nrows(), |r, c| {
                let d2 = (na[r] + nb[c] - 2.0 * dot[(r, c)]).max(0.0);
                (-gamma * d2).exp()
            })
        }
    }
}

/// Returns `(alpha, rho)`.
fn solve_smo(k: &DMatrix<f64>, ys: &[f64], cfg: &SvcConfig) -> (Vec<f64>, f64) {
    let n = ys.len();
    let c = cfg.c;
    let q = |i: usize, j: usize| ys[i] * ys[j] * k[(i, j)];

    let mut alpha = vec![0.0; n];
    let mut grad = vec![-1.0; n];
    let mut iter = 0usize;

    loop {
        // i maximises -y_t G_t over I_up, j maximises y_t G_t over I_low.
        let mut gmax = f64::NEG_INFINITY;
        let mut gmax2 = f64::NEG_INFINITY;
        let mut sel_i = None;
        let mut sel_j = None;
        for t in 0..n {
            let (up, low) = if ys[t] > 0.0 {
                (alpha[t] < c, alpha[t] > 0.0)
            } else {
                (alpha[t] > 0.0, alpha[t] < c)
            };
            let yg = ys[t] * grad[t];
            if up && -yg >= gmax {
                gmax = -yg;
                sel_i = Some(t);
            }
            if low && yg >= gmax2 {
                gmax2 = yg;
                sel_j = Some(t);
            }
        }
        let (Some(i), Some(j)) = (sel_i, sel_j) else { break };
        if gmax + gmax2 < cfg.tol {
            break;
        }
        if iter >= cfg.max_iter {
            tracing::warn!(iter, gap = gmax + gmax2, "SMO reached max_iter before convergence");
            break;
        }
        iter += 1;

        let (old_ai, old_aj) = (alpha[i], alpha[j]);
        if ys[i] != ys[j] {
            let quad = (q(i, i) + q(j, j) + 2.0 * q(i, j)).max(TAU);
            let delta = (-grad[i] - grad[j]) / quad;
            let diff = alpha[i] - alpha[j];
            alpha[i] += delta;
            alpha[j] += delta;
            if diff > 0.0 {
                if alpha[j] < 0.0 {
                    alpha[j] = 0.0;
                    alpha[i] = diff;
                }
            } else if alpha[i] < 0.0 {
                alpha[i] = 0.0;
                alpha[j] = -diff;
            }
            if diff > 0.0 {
                if alpha[i] > c {
                    alpha[i] = c;
                    alpha[j] = c - diff;
                }
            } else if alpha[j] > c {
                alpha[j] = c;
                alpha[i] = c + diff;
            }
        } else {
            let quad = (q(i, i) + q(j, j) - 2.0 * q(i, j)).max(TAU);
            let delta = (grad[i] - grad[j]) / quad;
            let sum = alpha[i] + alpha[j];
            alpha[i] -= delta;
            alpha[j] += delta;
            if sum > c {
                if alpha[i] > c {
                    alpha[i] = c;
                    alpha[j] = sum - c;
                }
            } else if alpha[j] < 0.0 {
                alpha[j] = 0.0;
                alpha[i] = sum;
            }
            if sum > c {
                if alpha[j] > c {
                    alpha[j] = c;
                    alpha[i] = sum - c;
                }
            } else if alpha[i] < 0.0 {
                alpha[i] = 0.0;
                alpha[j] = sum;
            }
        }

        let (dai, daj) = (alpha[i] - old_ai, alpha[j] - old_aj);
        if dai != 0.0 || daj != 0.0 {
            for (t, g) in grad.iter_mut().enumerate() {
                *g += q(t, i) * dai + q(t, j) * daj;
            }
        }
    }

    let rho = compute_rho(&alpha, &grad, ys, c);
    (alpha, rho)
}

fn compute_rho(alpha: &[f64], grad: &[f64], ys: &[f64], c: f64) -> f64 {
    let mut ub = f64::INFINITY;
    let mut lb = f64::NEG_INFINITY;
    let mut sum_free = 0.0;
    let mut n_free = 0usize;
    for t in 0..alpha.len() {
        let yg = ys[t] * grad[t];
        if alpha[t] >= c {
            if ys[t] < 0.0 { ub = ub.min(yg) } else { lb = lb.max(yg) }
        } else if alpha[t] <= 0.0 {
            if ys[t] > 0.0 { ub = ub.min(yg) } else { lb = lb.max(yg) }
        } else {
            n_free += 1;
            sum_free += yg;
        }
    }
    if n_free > 0 { sum_free / n_free as f64 } else { (ub + lb) / 2.0 }
}
