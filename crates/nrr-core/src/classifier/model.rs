use candle_core::{Result, Tensor};
use candle_nn::{Linear, Module, VarBuilder};

use crate::features::FEATURE_DIM;

/// Width of the first hidden layer.
pub const HIDDEN_1: usize = 64;
/// Width of the second hidden layer.
pub const HIDDEN_2: usize = 32;

/// Feed-forward match classifier: 4 -> 64 -> 32 -> 1 with ReLU activations.
///
/// Parameter names follow the trained artifact: `fc1`, `fc2`, `fc3`, each
/// with `weight` and `bias`.
pub struct MlpModel {
    pub fc1: Linear,
    pub fc2: Linear,
    pub fc3: Linear,
}

impl MlpModel {
    /// Loads the three layers, failing on any missing or mis-shaped tensor.
    pub fn load(vb: VarBuilder) -> Result<Self> {
        let fc1 = candle_nn::linear(FEATURE_DIM, HIDDEN_1, vb.pp("fc1"))?;
        let fc2 = candle_nn::linear(HIDDEN_1, HIDDEN_2, vb.pp("fc2"))?;
        let fc3 = candle_nn::linear(HIDDEN_2, 1, vb.pp("fc3"))?;
        Ok(Self { fc1, fc2, fc3 })
    }

    /// Raw logits.
    /// `features`: [batch_size, 4]
    /// returns: [batch_size, 1]
    pub fn forward(&self, features: &Tensor) -> Result<Tensor> {
        let hidden = self.fc1.forward(features)?.relu()?;
        let hidden = self.fc2.forward(&hidden)?.relu()?;
        self.fc3.forward(&hidden)
    }
}
