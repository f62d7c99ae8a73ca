//! Checkpoint save/load for deep belief networks.
//!
//! Serializes everything needed to reconstruct an equivalent network to
//! JSON: the ordered layer descriptors, the arena's flat parameter buffer,
//! and the three training-phase flags. Unit kinds are stored by name so the
//! files stay readable.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::arena::WeightArena;
use crate::dbn::DeepBeliefNet;
use crate::layer::Layer;

/// Serializable checkpoint data.
#[derive(Debug, Serialize, Deserialize)]
pub struct CheckpointData {
    /// Layer descriptors in stack order.
    pub layers: Vec<LayerData>,
    /// Flat parameter buffer in arena layout.
    pub weights: Vec<f64>,
    pub pretrained: bool,
    pub unrolled: bool,
    pub finetuned: bool,
}

/// One serialized layer: unit count plus the unit kind's string form.
#[derive(Debug, Serialize, Deserialize)]
pub struct LayerData {
    pub size: usize,
    pub kind: String,
}

/// Save a network checkpoint to a JSON file.
///
/// # Errors
///
/// Returns an error if the file cannot be written or the data cannot be
/// serialized.
pub fn save_checkpoint(network: &DeepBeliefNet, path: &Path) -> Result<(), String> {
    let data = CheckpointData {
        layers: network
            .layers()
            .iter()
            .map(|layer| LayerData {
                size: layer.size(),
                kind: layer.kind().to_string(),
            })
            .collect(),
        weights: network.data().to_vec(),
        pretrained: network.is_pretrained(),
        unrolled: network.is_unrolled(),
        finetuned: network.is_finetuned(),
    };

    let json = serde_json::to_string_pretty(&data)
        .map_err(|e| format!("Failed to serialize checkpoint: {e}"))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create checkpoint directory: {e}"))?;
    }

    std::fs::write(path, json)
        .map_err(|e| format!("Failed to write checkpoint to {}: {e}", path.display()))
}

/// Load a network checkpoint from a JSON file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, a unit kind name
/// is unknown, or the buffer does not match the layer sequence.
pub fn load_checkpoint(path: &Path) -> Result<DeepBeliefNet, String> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read checkpoint from {}: {e}", path.display()))?;

    let data: CheckpointData =
        serde_json::from_str(&json).map_err(|e| format!("Failed to parse checkpoint: {e}"))?;

    let mut layers = Vec::with_capacity(data.layers.len());
    for layer in &data.layers {
        layers.push(
            Layer::from_kind_str(layer.size, &layer.kind)
                .map_err(|e| format!("Bad layer in checkpoint: {e}"))?,
        );
    }

    DeepBeliefNet::from_parts(
        layers,
        WeightArena::from_vec(data.weights),
        data.pretrained,
        data.unrolled,
        data.finetuned,
    )
    .map_err(|e| format!("Failed to reconstruct network: {e}"))
}
