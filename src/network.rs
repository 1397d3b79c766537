//! Scoring models for the neural-weighted selection policy.
//!
//! The search only needs one capability from a model: given a batch of encoded
//! positions, return one scalar per position ([`ScoringModel`]). Models are
//! loaded once per board configuration and shared through a [`ModelCache`].
//!
//! [`LinearModel`] is the model shipped with the crate. Its weights file is plain
//! text: whitespace separated floats, one weight per encoded input followed by
//! the bias.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use log::{debug, info};

use crate::board::Board;
use crate::error::ModelError;
use crate::state::{GameState, Side, StateEncoder};

/// Cache key: `(board size, pawns per side)`.
pub type ModelKey = (usize, usize);

/// Scores a batch of encoded positions.
pub trait ScoringModel: Send + Sync {
    /// One score per input vector, in input order.
    fn score_batch(&self, batch: &[Vec<f32>]) -> Result<Vec<f32>, ModelError>;
}

/// `score = w · x + b`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearModel {
    weights: Vec<f32>,
    bias: f32,
}

impl LinearModel {
    pub fn new(weights: Vec<f32>, bias: f32) -> Self {
        Self { weights, bias }
    }

    /// Model of the right width for `board_size` with every weight zero.
    pub fn zeros(board_size: usize) -> Self {
        Self::new(vec![0.0; BoardEncoder::width(board_size)], 0.0)
    }

    pub fn input_width(&self) -> usize {
        self.weights.len()
    }

    /// Parse weights followed by the bias.
    pub fn from_text(text: &str) -> Result<Self, ModelError> {
        let mut values = text
            .split_whitespace()
            .enumerate()
            .map(|(index, token)| {
                token.parse::<f32>().map_err(|_| ModelError::Parse {
                    index,
                    token: token.to_string(),
                })
            })
            .collect::<Result<Vec<f32>, _>>()?;
        let bias = values.pop().ok_or(ModelError::Empty)?;
        Ok(Self::new(values, bias))
    }

    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let text = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let model = Self::from_text(&text)?;
        info!(
            "loaded linear model with {} inputs from {}",
            model.input_width(),
            path.display()
        );
        Ok(model)
    }
}

impl ScoringModel for LinearModel {
    fn score_batch(&self, batch: &[Vec<f32>]) -> Result<Vec<f32>, ModelError> {
        batch
            .iter()
            .map(|x| {
                if x.len() != self.weights.len() {
                    return Err(ModelError::Dimension {
                        expected: self.weights.len(),
                        actual: x.len(),
                    });
                }
                let dot: f32 = self.weights.iter().zip(x).map(|(w, v)| w * v).sum();
                Ok(dot + self.bias)
            })
            .collect()
    }
}

/// Encodes a [`Board`] as two occupancy planes plus a side-to-move flag.
///
/// Layout: `size * size` cells for side one, `size * size` cells for side two
/// (row-major, 1.0 where a pawn stands), then 1.0 if side two is to move.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoardEncoder;

impl BoardEncoder {
    pub fn width(board_size: usize) -> usize {
        2 * board_size * board_size + 1
    }
}

impl StateEncoder<Board> for BoardEncoder {
    fn encode(&self, state: &Board) -> Result<Vec<f32>, ModelError> {
        let n = state.size;
        let mut out = vec![0.0; Self::width(n)];
        for (plane, side) in [Side::One, Side::Two].into_iter().enumerate() {
            for &(row, col) in state.pawns(side) {
                if row >= n || col >= n {
                    return Err(ModelError::Encoding(format!(
                        "pawn at ({row}, {col}) outside a {n}x{n} board"
                    )));
                }
                out[plane * n * n + row * n + col] = 1.0;
            }
        }
        if Side::to_move(state.total_moves()) == Side::Two {
            out[2 * n * n] = 1.0;
        }
        Ok(out)
    }
}

/// Encoder and model used together by the neural-weighted policy.
pub struct NeuralGuide<S> {
    encoder: Arc<dyn StateEncoder<S>>,
    model: Arc<dyn ScoringModel>,
}

impl<S> Clone for NeuralGuide<S> {
    fn clone(&self) -> Self {
        Self {
            encoder: Arc::clone(&self.encoder),
            model: Arc::clone(&self.model),
        }
    }
}

impl<S> NeuralGuide<S> {
    pub fn new(encoder: Arc<dyn StateEncoder<S>>, model: Arc<dyn ScoringModel>) -> Self {
        Self { encoder, model }
    }

    /// Score every state in one batch.
    pub fn evaluate<'s>(
        &self,
        states: impl Iterator<Item = &'s S>,
    ) -> Result<Vec<f64>, ModelError>
    where
        S: 's,
    {
        let batch = states
            .map(|s| self.encoder.encode(s))
            .collect::<Result<Vec<_>, _>>()?;
        let scores = self.model.score_batch(&batch)?;
        if scores.len() != batch.len() {
            return Err(ModelError::BatchSize {
                expected: batch.len(),
                actual: scores.len(),
            });
        }
        if scores.iter().any(|s| !s.is_finite()) {
            return Err(ModelError::NonFinite);
        }
        Ok(scores.into_iter().map(f64::from).collect())
    }
}

/// Loaded models keyed by board configuration.
///
/// A model is loaded on the first request for its key and handed out as a
/// shared handle afterwards. Use [`ModelCache::global`] for one cache per
/// process, or build a private one (tests inject fakes this way).
#[derive(Default)]
pub struct ModelCache {
    models: Mutex<HashMap<ModelKey, Arc<dyn ScoringModel>>>,
}

impl ModelCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide cache.
    pub fn global() -> &'static ModelCache {
        static CACHE: OnceLock<ModelCache> = OnceLock::new();
        CACHE.get_or_init(ModelCache::new)
    }

    /// Return the model for `key`, running `loader` if it is not cached yet.
    ///
    /// The lock is held while loading so a key is never loaded twice. A failed
    /// load leaves the cache unchanged.
    pub fn get_or_load<F>(&self, key: ModelKey, loader: F) -> Result<Arc<dyn ScoringModel>, ModelError>
    where
        F: FnOnce() -> Result<Arc<dyn ScoringModel>, ModelError>,
    {
        let mut models = self.models.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(model) = models.get(&key) {
            return Ok(Arc::clone(model));
        }
        debug!("loading scoring model for board {}x{} with {} pawns", key.0, key.0, key.1);
        let model = loader()?;
        models.insert(key, Arc::clone(&model));
        Ok(model)
    }

    pub fn get(&self, key: ModelKey) -> Option<Arc<dyn ScoringModel>> {
        let models = self.models.lock().unwrap_or_else(|e| e.into_inner());
        models.get(&key).cloned()
    }

    pub fn insert(&self, key: ModelKey, model: Arc<dyn ScoringModel>) {
        let mut models = self.models.lock().unwrap_or_else(|e| e.into_inner());
        models.insert(key, model);
    }

    pub fn len(&self) -> usize {
        self.models.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// File name of the weights for a board configuration.
pub fn model_file_name(board_size: usize, num_of_pawns: usize) -> String {
    format!("model{board_size}_{num_of_pawns}.txt")
}

pub fn model_path(dir: &Path, board_size: usize, num_of_pawns: usize) -> PathBuf {
    dir.join(model_file_name(board_size, num_of_pawns))
}

/// Build a [`NeuralGuide`] for `board`'s configuration, loading a
/// [`LinearModel`] from `dir` through `cache` if needed.
pub fn board_guide(cache: &ModelCache, dir: &Path, board: &Board) -> Result<NeuralGuide<Board>, ModelError> {
    let key = (board.board_size(), board.pawn_count());
    let model = cache.get_or_load(key, || {
        let model = LinearModel::load(&model_path(dir, key.0, key.1))?;
        let expected = BoardEncoder::width(key.0);
        if model.input_width() != expected {
            return Err(ModelError::Dimension {
                expected,
                actual: model.input_width(),
            });
        }
        Ok(Arc::new(model) as Arc<dyn ScoringModel>)
    })?;
    Ok(NeuralGuide::new(Arc::new(BoardEncoder), model))
}
