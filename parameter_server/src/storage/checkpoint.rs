//! Persistence of parameter sets in the safetensors format.

use std::{fs, path::Path};

use log::info;
use machine_learning::ParameterSet;
use ndarray::{ArrayD, IxDyn};
use safetensors::{Dtype, SafeTensors, tensor::TensorView};

use crate::{Result, ServerErr};

/// Writes `params` to `path`, one f32 tensor per entry.
pub fn save<P: AsRef<Path>>(params: &ParameterSet, path: P) -> Result<()> {
    let path = path.as_ref();

    let buffers: Vec<(String, Vec<usize>, Vec<u8>)> = params
        .iter()
        .map(|(name, tensor)| {
            let bytes = tensor.iter().flat_map(|v| v.to_le_bytes()).collect();
            (name.clone(), tensor.shape().to_vec(), bytes)
        })
        .collect();

    let views = buffers
        .iter()
        .map(|(name, shape, bytes)| {
            TensorView::new(Dtype::F32, shape.clone(), bytes)
                .map(|view| (name.as_str(), view))
                .map_err(checkpoint_err)
        })
        .collect::<Result<Vec<_>>>()?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    safetensors::serialize_to_file(views, &None, path).map_err(checkpoint_err)?;
    info!(path:? = path, params = params.num_params(); "saved checkpoint");
    Ok(())
}

/// Reads a parameter set previously written with `save`.
pub fn load<P: AsRef<Path>>(path: P) -> Result<ParameterSet> {
    let bytes = fs::read(path.as_ref())?;
    let tensors = SafeTensors::deserialize(&bytes).map_err(checkpoint_err)?;

    tensors
        .tensors()
        .into_iter()
        .map(|(name, view)| {
            if view.dtype() != Dtype::F32 {
                return Err(ServerErr::Checkpoint(format!(
                    "{name} has dtype {:?}, expected F32",
                    view.dtype()
                )));
            }

            let values = view
                .data()
                .chunks_exact(4)
                .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                .collect();

            let tensor = ArrayD::from_shape_vec(IxDyn(view.shape()), values)
                .map_err(|e| ServerErr::Checkpoint(format!("{name}: {e}")))?;

            Ok((name, tensor))
        })
        .collect()
}

fn checkpoint_err<E: std::fmt::Display>(e: E) -> ServerErr {
    ServerErr::Checkpoint(e.to_string())
}
