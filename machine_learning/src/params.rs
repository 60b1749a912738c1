use std::collections::{BTreeMap, btree_map};

use ndarray::{ArrayD, Dimension, IntoDimension};

use crate::{MlErr, Result};

/// A named collection of parameter tensors, the unit exchanged between the
/// global model and the local trainers.
///
/// Entries are kept ordered by name, so two sets with the same layout always
/// iterate in the same order. Cloning deep copies every tensor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSet {
    tensors: BTreeMap<String, ArrayD<f32>>,
}

impl ParameterSet {
    /// Creates a new empty `ParameterSet`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a tensor, replacing any previous tensor with the same name.
    ///
    /// # Arguments
    /// * `name` - The name of the parameter.
    /// * `tensor` - The parameter values, of any dimensionality.
    ///
    /// # Returns
    /// The replaced tensor, if there was one.
    pub fn insert<S, D>(&mut self, name: S, tensor: ndarray::Array<f32, D>) -> Option<ArrayD<f32>>
    where
        S: Into<String>,
        D: Dimension,
    {
        self.tensors.insert(name.into(), tensor.into_dyn())
    }

    /// Returns the tensor named `name`.
    pub fn get(&self, name: &str) -> Option<&ArrayD<f32>> {
        self.tensors.get(name)
    }

    /// Returns the tensor named `name` or a `MissingParam` error.
    pub fn require(&self, name: &str) -> Result<&ArrayD<f32>> {
        self.get(name).ok_or_else(|| MlErr::MissingParam {
            name: name.to_string(),
        })
    }

    /// Returns the tensor named `name`, checking it has the expected shape.
    ///
    /// # Arguments
    /// * `name` - The name of the parameter.
    /// * `shape` - The shape the caller expects.
    ///
    /// # Returns
    /// The tensor or an error if it is missing or has a different shape.
    pub fn require_shaped<Sh>(&self, name: &str, shape: Sh) -> Result<&ArrayD<f32>>
    where
        Sh: IntoDimension,
    {
        let tensor = self.require(name)?;
        let expected = shape.into_dimension();

        if tensor.shape() != expected.slice() {
            return Err(MlErr::ShapeMismatch {
                name: name.to_string(),
                got: tensor.shape().to_vec(),
                expected: expected.slice().to_vec(),
            });
        }

        Ok(tensor)
    }

    /// The amount of named tensors.
    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }

    /// The total amount of scalar parameters across all tensors.
    pub fn num_params(&self) -> usize {
        self.tensors.values().map(|t| t.len()).sum()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.tensors.keys().map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, ArrayD<f32>> {
        self.tensors.iter()
    }

    /// Whether `other` has exactly the same names and shapes as `self`.
    pub fn same_layout(&self, other: &ParameterSet) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .zip(other.iter())
                .all(|((ka, ta), (kb, tb))| ka == kb && ta.shape() == tb.shape())
    }
}

impl<'a> IntoIterator for &'a ParameterSet {
    type Item = (&'a String, &'a ArrayD<f32>);
    type IntoIter = btree_map::Iter<'a, String, ArrayD<f32>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<(String, ArrayD<f32>)> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = (String, ArrayD<f32>)>>(iter: I) -> Self {
        Self {
            tensors: iter.into_iter().collect(),
        }
    }
}
