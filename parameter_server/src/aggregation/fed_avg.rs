use machine_learning::ParameterSet;
use ndarray::ArrayD;
use rayon::prelude::*;

use super::Aggregator;
use crate::{Result, ServerErr};

/// Federated averaging: the element-wise arithmetic mean of every tensor,
/// each participant weighing the same.
#[derive(Debug, Default, Clone, Copy)]
pub struct FedAvg;

impl FedAvg {
    pub fn new() -> Self {
        Self
    }
}

impl Aggregator for FedAvg {
    fn aggregate(&self, params: &[ParameterSet]) -> Result<ParameterSet> {
        let (first, rest) = params.split_first().ok_or(ServerErr::EmptyAggregation)?;

        for (i, other) in rest.iter().enumerate() {
            check_layout(first, other, i + 1)?;
        }

        let n = params.len() as f32;
        let entries: Vec<(&String, &ArrayD<f32>)> = first.iter().collect();

        let averaged = entries
            .into_par_iter()
            .map(|(key, tensor)| -> Result<(String, ArrayD<f32>)> {
                let mut acc = tensor.clone();

                for (i, other) in rest.iter().enumerate() {
                    let other = other.get(key).ok_or_else(|| ServerErr::KeyMismatch {
                        key: key.clone(),
                        entry: i + 1,
                    })?;
                    acc += other;
                }

                acc.mapv_inplace(|v| v / n);
                Ok((key.clone(), acc))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(averaged.into_iter().collect())
    }
}

/// Checks that `other` has the same keys and shapes as `first`.
///
/// # Arguments
/// * `first` - The reference parameter set.
/// * `other` - The parameter set to validate.
/// * `entry` - The position of `other` in the aggregated list.
fn check_layout(first: &ParameterSet, other: &ParameterSet, entry: usize) -> Result<()> {
    if let Some(key) = other.keys().find(|key| first.get(key).is_none()) {
        return Err(ServerErr::KeyMismatch {
            key: key.to_string(),
            entry,
        });
    }

    for (key, expected) in first {
        let Some(got) = other.get(key) else {
            return Err(ServerErr::KeyMismatch {
                key: key.clone(),
                entry,
            });
        };

        if got.shape() != expected.shape() {
            return Err(ServerErr::ShapeMismatch {
                key: key.clone(),
                entry,
                got: got.shape().to_vec(),
                expected: expected.shape().to_vec(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use ndarray::{Array2, array};

    use super::*;

    fn scalar(value: f32) -> ParameterSet {
        let mut params = ParameterSet::new();
        params.insert("a", array![value]);
        params
    }

    #[test]
    fn averages_element_wise() {
        let avg = FedAvg.aggregate(&[scalar(2.0), scalar(4.0)]).unwrap();
        assert_eq!(avg, scalar(3.0));
    }

    #[test]
    fn single_entry_is_returned_unchanged() {
        let mut params = ParameterSet::new();
        params.insert("w", array![[1.0, -2.0], [0.5, 8.0]]);
        params.insert("b", array![3.0]);

        let input = [params.clone()];
        let avg = FedAvg.aggregate(&input).unwrap();
        assert_eq!(avg, params);
    }

    #[test]
    fn averages_every_key_of_multidimensional_tensors() {
        let mut a = ParameterSet::new();
        a.insert("w", Array2::<f32>::ones((2, 3)));
        a.insert("b", array![0.0, 6.0]);

        let mut b = ParameterSet::new();
        b.insert("w", Array2::<f32>::from_elem((2, 3), 3.0));
        b.insert("b", array![3.0, 0.0]);

        let avg = FedAvg.aggregate(&[a, b]).unwrap();
        assert_eq!(avg.get("w").unwrap(), &Array2::from_elem((2, 3), 2.0).into_dyn());
        assert_eq!(avg.get("b").unwrap().as_slice().unwrap(), &[1.5, 3.0]);
    }

    #[test]
    fn inputs_are_not_mutated() {
        let input = [scalar(1.0), scalar(2.0), scalar(6.0)];

        let first = FedAvg.aggregate(&input).unwrap();
        let second = FedAvg.aggregate(&input).unwrap();

        assert_eq!(first, second);
        assert_eq!(input[0], scalar(1.0));
        assert_eq!(first, scalar(3.0));
    }

    #[test]
    fn empty_input_fails() {
        assert!(matches!(
            FedAvg.aggregate(&[]),
            Err(ServerErr::EmptyAggregation)
        ));
    }

    #[test]
    fn mismatched_keys_fail() {
        let mut other = ParameterSet::new();
        other.insert("b", array![1.0]);

        assert!(matches!(
            FedAvg.aggregate(&[scalar(1.0), other]),
            Err(ServerErr::KeyMismatch { entry: 1, .. })
        ));
    }

    #[test]
    fn extra_keys_fail() {
        let mut other = scalar(1.0);
        other.insert("extra", array![1.0]);

        assert!(matches!(
            FedAvg.aggregate(&[scalar(1.0), other]),
            Err(ServerErr::KeyMismatch { .. })
        ));
    }

    #[test]
    fn mismatched_shapes_fail() {
        let mut other = ParameterSet::new();
        other.insert("a", array![1.0, 2.0]);

        assert!(matches!(
            FedAvg.aggregate(&[scalar(1.0), other]),
            Err(ServerErr::ShapeMismatch { .. })
        ));
    }
}
