use ndarray::{Array1, Array2, ArrayView1, Axis};
use rayon::prelude::*;

use crate::binarize::UNKNOWN;
use crate::config::{ModelConfig, ModelType};
use crate::data_handling::validate_features;
use crate::error::{Result, WeldError};
use crate::models::classifier_trait::{FitSummary, SemiSupervisedModel};

/// Graph-based label propagation (Zhu & Ghahramani).
///
/// Builds a similarity graph over all samples, then repeatedly diffuses the
/// class distributions of the labeled samples along the row-normalized graph
/// while clamping the labeled samples to their known class.
pub struct LabelPropagation {
    params: ModelConfig,
    state: Option<FittedGraph>,
}

struct FittedGraph {
    x: Array2<f64>,
    classes: Vec<i32>,
    label_distributions: Array2<f64>,
    transduction: Array1<i32>,
}

/// Row-normalized transition matrix used for diffusion.
///
/// The knn graph is kept as neighbor lists, each neighbor weighing `1 / k`,
/// so memory and every sweep stay linear in `n * k`.
enum Graph {
    Knn(Vec<Vec<usize>>),
    Dense(Array2<f64>),
}

impl Graph {
    /// One diffusion step, `T · F`.
    fn propagate(&self, distributions: &Array2<f64>) -> Array2<f64> {
        match self {
            Graph::Knn(neighbors) => {
                let rows: Vec<Array1<f64>> = neighbors
                    .par_iter()
                    .map(|row| mean_of_rows(distributions, row))
                    .collect();
                stack_rows(rows, distributions.ncols())
            }
            Graph::Dense(matrix) => matrix.dot(distributions),
        }
    }
}

impl LabelPropagation {
    pub fn new(params: ModelConfig) -> Self {
        LabelPropagation {
            params,
            state: None,
        }
    }

    pub fn params(&self) -> &ModelConfig {
        &self.params
    }

    /// Distinct labels seen during the last fit, ascending.
    pub fn classes(&self) -> Option<&[i32]> {
        self.state.as_ref().map(|s| s.classes.as_slice())
    }

    /// Per-sample class distributions from the last fit.
    pub fn label_distributions(&self) -> Option<&Array2<f64>> {
        self.state.as_ref().map(|s| &s.label_distributions)
    }

    fn fitted(&self) -> Result<&FittedGraph> {
        self.state.as_ref().ok_or_else(|| WeldError::State {
            expected: "fitted classifier".to_string(),
            found: "unfitted classifier".to_string(),
        })
    }

    /// Affinity graph over the training samples, rows normalized.
    fn build_graph(&self, x: &Array2<f64>) -> Result<Graph> {
        let n = x.nrows();
        match self.params.model_type {
            ModelType::Knn { n_neighbors } => {
                let k = resolve_k(n_neighbors, n)?;
                let neighbors: Vec<Vec<usize>> = (0..n)
                    .into_par_iter()
                    .map(|i| nearest_neighbors(x, x.row(i), k))
                    .collect();
                Ok(Graph::Knn(neighbors))
            }
            ModelType::Rbf { gamma } => {
                let rows: Vec<Array1<f64>> = (0..n)
                    .into_par_iter()
                    .map(|i| rbf_weights(x, x.row(i), gamma))
                    .collect();
                let mut graph = stack_rows(rows, n);
                normalize_rows(&mut graph);
                Ok(Graph::Dense(graph))
            }
        }
    }

    fn validate_labels(x: &Array2<f64>, y: &Array1<i32>) -> Result<Vec<i32>> {
        if x.nrows() != y.len() {
            return Err(WeldError::shape("propagation labels", x.nrows(), y.len()));
        }
        if let Some(bad) = y.iter().find(|&&l| !(-1..=1).contains(&l)) {
            return Err(WeldError::precondition(
                "label propagation",
                format!("label {} is not one of -1, 0, 1", bad),
            ));
        }

        let mut classes: Vec<i32> = y.iter().copied().filter(|&l| l != UNKNOWN).collect();
        classes.sort_unstable();
        classes.dedup();
        if classes.is_empty() {
            return Err(WeldError::propagation(
                "",
                "no labeled sample to propagate from",
            ));
        }
        Ok(classes)
    }
}

impl SemiSupervisedModel for LabelPropagation {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<i32>) -> Result<FitSummary> {
        validate_features(x, "label propagation fit")?;
        let classes = Self::validate_labels(x, y)?;

        let n_samples = x.nrows();
        let n_classes = classes.len();
        let graph = self.build_graph(x)?;

        let mut clamped = Array2::<f64>::zeros((n_samples, n_classes));
        let labeled: Vec<usize> = (0..n_samples).filter(|&i| y[i] != UNKNOWN).collect();
        for &i in &labeled {
            let class_idx = classes.iter().position(|&c| c == y[i]).unwrap_or(0);
            clamped[(i, class_idx)] = 1.0;
        }

        log::trace!(
            "Propagating {} classes from {} labeled of {} samples",
            n_classes,
            labeled.len(),
            n_samples
        );

        let mut distributions = clamped.clone();
        let mut previous = Array2::<f64>::zeros((n_samples, n_classes));
        let mut n_iterations = 0;
        let mut converged = false;

        while n_iterations < self.params.max_iter {
            let delta = (&distributions - &previous).mapv(f64::abs).sum();
            if delta < self.params.tol {
                converged = true;
                break;
            }

            previous = distributions;
            distributions = graph.propagate(&previous);
            normalize_rows(&mut distributions);
            for &i in &labeled {
                distributions.row_mut(i).assign(&clamped.row(i));
            }

            n_iterations += 1;
            log::trace!("Propagation iteration {}: delta {:.6}", n_iterations, delta);
        }

        if !converged {
            log::warn!(
                "Label propagation did not converge after {} iterations (tol {})",
                self.params.max_iter,
                self.params.tol
            );
        }

        normalize_rows(&mut distributions);
        let transduction = argmax_labels(&distributions, &classes);

        self.state = Some(FittedGraph {
            x: x.to_owned(),
            classes,
            label_distributions: distributions,
            transduction,
        });

        Ok(FitSummary {
            n_iterations,
            converged,
        })
    }

    fn transduction(&self) -> Result<Array1<i32>> {
        Ok(self.fitted()?.transduction.clone())
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let state = self.fitted()?;
        validate_features(x, "label propagation predict")?;
        if x.ncols() != state.x.ncols() {
            return Err(WeldError::shape("prediction feature columns", state.x.ncols(), x.ncols()));
        }

        let rows: Vec<Array1<f64>> = match self.params.model_type {
            ModelType::Knn { n_neighbors } => {
                let k = resolve_k(n_neighbors, state.x.nrows())?;
                (0..x.nrows())
                    .into_par_iter()
                    .map(|i| {
                        nearest_neighbors(&state.x, x.row(i), k)
                            .into_iter()
                            .fold(Array1::<f64>::zeros(state.classes.len()), |acc, j| {
                                acc + &state.label_distributions.row(j)
                            })
                    })
                    .collect()
            }
            ModelType::Rbf { gamma } => (0..x.nrows())
                .into_par_iter()
                .map(|i| rbf_weights(&state.x, x.row(i), gamma).dot(&state.label_distributions))
                .collect(),
        };

        let mut probabilities = stack_rows(rows, state.classes.len());
        normalize_rows(&mut probabilities);
        Ok(probabilities)
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<i32>> {
        let probabilities = self.predict_proba(x)?;
        Ok(argmax_labels(&probabilities, &self.fitted()?.classes))
    }

    fn name(&self) -> &str {
        match self.params.model_type {
            ModelType::Knn { .. } => "label_propagation_knn",
            ModelType::Rbf { .. } => "label_propagation_rbf",
        }
    }
}

/// Number of neighbors actually used: `n_neighbors` capped at the sample count.
fn resolve_k(n_neighbors: usize, n_samples: usize) -> Result<usize> {
    if n_neighbors == 0 {
        return Err(WeldError::precondition(
            "label propagation",
            "n_neighbors must be at least 1",
        ));
    }
    Ok(n_neighbors.min(n_samples))
}

fn stack_rows(rows: Vec<Array1<f64>>, ncols: usize) -> Array2<f64> {
    let mut matrix = Array2::<f64>::zeros((rows.len(), ncols));
    for (i, row) in rows.into_iter().enumerate() {
        matrix.row_mut(i).assign(&row);
    }
    matrix
}

fn mean_of_rows(matrix: &Array2<f64>, indices: &[usize]) -> Array1<f64> {
    let mut total = Array1::<f64>::zeros(matrix.ncols());
    for &j in indices {
        total += &matrix.row(j);
    }
    if !indices.is_empty() {
        total /= indices.len() as f64;
    }
    total
}

fn squared_distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Indices of the `k` rows of `data` closest to `query`, ties broken by index.
fn nearest_neighbors(data: &Array2<f64>, query: ArrayView1<f64>, k: usize) -> Vec<usize> {
    let mut distances: Vec<(f64, usize)> = data
        .axis_iter(Axis(0))
        .enumerate()
        .map(|(j, row)| (squared_distance(row, query), j))
        .collect();
    distances.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
    distances.into_iter().take(k).map(|(_, j)| j).collect()
}

fn rbf_weights(data: &Array2<f64>, query: ArrayView1<f64>, gamma: f64) -> Array1<f64> {
    data.axis_iter(Axis(0))
        .map(|row| (-gamma * squared_distance(row, query)).exp())
        .collect()
}

/// Scale each row to sum to one. All-zero rows are left untouched.
fn normalize_rows(matrix: &mut Array2<f64>) {
    for mut row in matrix.axis_iter_mut(Axis(0)) {
        let total = row.sum();
        if total > 0.0 {
            row /= total;
        }
    }
}

/// Class with the highest weight per row; ties go to the smaller label.
fn argmax_labels(distributions: &Array2<f64>, classes: &[i32]) -> Array1<i32> {
    distributions
        .axis_iter(Axis(0))
        .map(|row| {
            let mut best = 0;
            for (idx, &value) in row.iter().enumerate() {
                if value > row[best] {
                    best = idx;
                }
            }
            classes[best]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn two_clusters() -> Array2<f64> {
        array![
            [0.0, 0.0],
            [0.1, 0.0],
            [0.0, 0.1],
            [0.1, 0.1],
            [5.0, 5.0],
            [5.1, 5.0],
            [5.0, 5.1],
            [5.1, 5.1],
        ]
    }

    fn knn(k: usize) -> LabelPropagation {
        LabelPropagation::new(ModelConfig::new(ModelType::Knn { n_neighbors: k }))
    }

    #[test]
    fn knn_resolves_unlabeled_by_cluster() {
        let x = two_clusters();
        let y = array![0, -1, -1, -1, 1, -1, -1, -1];
        let mut model = knn(3);
        let summary = model.fit(&x, &y).unwrap();

        assert!(summary.converged);
        assert_eq!(model.transduction().unwrap(), array![0, 0, 0, 0, 1, 1, 1, 1]);
        assert_eq!(model.classes(), Some(&[0, 1][..]));
    }

    #[test]
    fn rbf_resolves_unlabeled_by_cluster() {
        let x = two_clusters();
        let y = array![0, -1, -1, -1, -1, -1, 1, -1];
        let mut model = LabelPropagation::new(ModelConfig::new(ModelType::Rbf { gamma: 1.0 }));
        model.fit(&x, &y).unwrap();
        assert_eq!(model.transduction().unwrap(), array![0, 0, 0, 0, 1, 1, 1, 1]);
    }

    #[test]
    fn labeled_samples_are_clamped() {
        let x = two_clusters();
        // an isolated "pass" label inside the fail cluster must survive
        let y = array![0, 1, 0, 0, 1, 1, 1, 1];
        let mut model = knn(4);
        model.fit(&x, &y).unwrap();
        assert_eq!(model.transduction().unwrap(), y);
    }

    #[test]
    fn predict_uses_training_neighbors() {
        let x = two_clusters();
        let y = array![0, 0, -1, -1, 1, 1, -1, -1];
        let mut model = knn(3);
        model.fit(&x, &y).unwrap();

        let queries = array![[0.05, 0.05], [4.9, 5.2]];
        assert_eq!(model.predict(&queries).unwrap(), array![0, 1]);

        let proba = model.predict_proba(&queries).unwrap();
        assert_eq!(proba.dim(), (2, 2));
        for row in proba.axis_iter(Axis(0)) {
            assert!((row.sum() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn neighbor_count_is_capped_at_sample_count() {
        let x = array![[0.0], [1.0], [2.0]];
        let y = array![0, -1, 1];
        let mut model = knn(25);
        assert!(model.fit(&x, &y).is_ok());
        assert_eq!(model.transduction().unwrap().len(), 3);
    }

    #[test]
    fn knn_graph_keeps_k_neighbors_per_row() {
        let x = two_clusters();
        let graph = knn(3).build_graph(&x).unwrap();
        let Graph::Knn(neighbors) = &graph else {
            panic!("knn kernel must build neighbor lists");
        };
        assert_eq!(neighbors.len(), 8);
        assert!(neighbors.iter().all(|row| row.len() == 3));
        assert!(neighbors.iter().enumerate().all(|(i, row)| row.contains(&i)));

        // one sweep over the lists equals the dense row-normalized product
        let mut dense = Array2::<f64>::zeros((8, 8));
        for (i, row) in neighbors.iter().enumerate() {
            for &j in row {
                dense[(i, j)] = 1.0 / 3.0;
            }
        }
        let f = array![
            [1.0, 0.0],
            [0.0, 0.0],
            [0.0, 0.0],
            [0.5, 0.5],
            [0.0, 1.0],
            [0.0, 0.0],
            [0.2, 0.8],
            [0.0, 0.0],
        ];
        let sparse = graph.propagate(&f);
        let expected = dense.dot(&f);
        for (a, b) in sparse.iter().zip(expected.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn single_class_resolves_everything_to_it() {
        let x = array![[0.0], [1.0], [2.0]];
        let y = array![1, -1, -1];
        let mut model = knn(2);
        model.fit(&x, &y).unwrap();
        assert_eq!(model.transduction().unwrap(), array![1, 1, 1]);
    }

    #[test]
    fn fit_rejects_invalid_inputs() {
        let mut model = knn(2);
        let nan_x = array![[0.0], [f64::NAN]];
        assert!(matches!(
            model.fit(&nan_x, &array![0, 1]),
            Err(WeldError::Precondition { .. })
        ));
        assert!(matches!(
            model.fit(&array![[0.0], [1.0]], &array![0]),
            Err(WeldError::Shape { .. })
        ));
        assert!(matches!(
            model.fit(&array![[0.0], [1.0]], &array![-1, -1]),
            Err(WeldError::Propagation { .. })
        ));
        assert!(matches!(
            model.fit(&array![[0.0], [1.0]], &array![2, 0]),
            Err(WeldError::Precondition { .. })
        ));
        assert!(matches!(
            knn(0).fit(&array![[0.0]], &array![1]),
            Err(WeldError::Precondition { .. })
        ));
    }

    #[test]
    fn unfitted_model_reports_state_error() {
        let model = knn(2);
        assert!(matches!(model.transduction(), Err(WeldError::State { .. })));
        assert!(matches!(model.predict(&array![[0.0]]), Err(WeldError::State { .. })));
    }

    #[test]
    fn predict_rejects_feature_count_mismatch() {
        let mut model = knn(2);
        model.fit(&array![[0.0, 1.0], [1.0, 0.0]], &array![0, 1]).unwrap();
        assert!(matches!(model.predict(&array![[0.0]]), Err(WeldError::Shape { .. })));
    }
}
