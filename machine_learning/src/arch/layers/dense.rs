use ndarray::{linalg, prelude::*};

use crate::{
    MlErr, ParameterSet, Result, arch::activations::ActFn, optimization::Optimizer,
};

/// A fully connected layer, `a = act_fn(x · w + b)`.
///
/// The layer owns a working copy of its weights, they are seeded from a
/// `ParameterSet` with `load` and written back with `store`.
#[derive(Debug, Clone)]
pub struct Dense {
    dim: (usize, usize),
    act_fn: Option<ActFn>,

    w: Array2<f32>,
    b: Array1<f32>,

    // Forward metadata
    x: Array2<f32>,
    z: Array2<f32>,

    // Backward metadata
    dw: Array2<f32>,
    db: Array1<f32>,
}

impl Dense {
    /// Creates a new `Dense` layer with every parameter set to zero.
    ///
    /// # Arguments
    /// * `dim` - The (input, output) dimensions of the layer.
    /// * `act_fn` - An optional activation function applied to the output.
    pub fn new(dim: (usize, usize), act_fn: Option<ActFn>) -> Self {
        let empty = Array2::zeros((0, 0));

        Self {
            dim,
            act_fn,
            w: Array2::zeros(dim),
            b: Array1::zeros(dim.1),
            x: empty.clone(),
            z: empty,
            dw: Array2::zeros(dim),
            db: Array1::zeros(dim.1),
        }
    }

    /// Returns the size of this layer.
    ///
    /// # Returns
    /// The amount of parameters this layer has.
    pub fn size(&self) -> usize {
        (self.dim.0 + 1) * self.dim.1
    }

    pub fn dim(&self) -> (usize, usize) {
        self.dim
    }

    /// Copies this layer's weights and biases out of `params`.
    ///
    /// # Arguments
    /// * `params` - The parameter set to read from.
    /// * `prefix` - The name prefix of this layer's entries.
    ///
    /// # Returns
    /// An error if any entry is missing or has the wrong shape.
    pub fn load(&mut self, params: &ParameterSet, prefix: &str) -> Result<()> {
        let w_name = format!("{prefix}.weight");
        let b_name = format!("{prefix}.bias");

        let w = params.require_shaped(&w_name, [self.dim.0, self.dim.1])?;
        let b = params.require_shaped(&b_name, [self.dim.1])?;

        self.w = w
            .view()
            .into_dimensionality::<Ix2>()
            .map_err(|_| shape_err(w_name, w.shape(), &[self.dim.0, self.dim.1]))?
            .as_standard_layout()
            .into_owned();

        self.b = b
            .view()
            .into_dimensionality::<Ix1>()
            .map_err(|_| shape_err(b_name, b.shape(), &[self.dim.1]))?
            .as_standard_layout()
            .into_owned();

        Ok(())
    }

    /// Writes this layer's weights and biases into `params`.
    pub fn store(&self, params: &mut ParameterSet, prefix: &str) {
        params.insert(format!("{prefix}.weight"), self.w.clone());
        params.insert(format!("{prefix}.bias"), self.b.clone());
    }

    /// Forward pass that keeps the metadata needed by `backward`.
    pub fn forward(&mut self, x: ArrayView2<f32>) -> Array2<f32> {
        let mut z = Array2::zeros((x.nrows(), self.dim.1));
        linalg::general_mat_mul(1.0, &x, &self.w, 0.0, &mut z);
        z += &self.b;

        self.x = x.to_owned();
        self.z = z;

        self.activate(&self.z)
    }

    /// Forward pass without keeping any metadata.
    pub fn infer(&self, x: ArrayView2<f32>) -> Array2<f32> {
        let z = x.dot(&self.w) + &self.b;
        self.activate(&z)
    }

    /// Backward pass, stores the gradient of this layer's parameters and returns
    /// the delta for the previous layer.
    ///
    /// # Arguments
    /// * `d` - The delta of the loss with respect to this layer's output.
    pub fn backward(&mut self, mut d: Array2<f32>) -> Array2<f32> {
        if let Some(act_fn) = &self.act_fn {
            d.zip_mut_with(&self.z, |d, &z| *d *= act_fn.df(z));
        }

        linalg::general_mat_mul(1.0, &self.x.t(), &d, 0.0, &mut self.dw);
        self.db.assign(&d.sum_axis(Axis(0)));

        d.dot(&self.w.t())
    }

    /// Applies the last computed gradient to the layer's parameters.
    pub fn optimize<O: Optimizer>(&mut self, optimizer: &mut O) -> Result<()> {
        let (Some(w), Some(dw)) = (self.w.as_slice_mut(), self.dw.as_slice()) else {
            return Err(MlErr::SizeMismatch {
                what: "dense weight layout",
                got: 0,
                expected: self.dim.0 * self.dim.1,
            });
        };
        optimizer.update_params(w, dw);

        let (Some(b), Some(db)) = (self.b.as_slice_mut(), self.db.as_slice()) else {
            return Err(MlErr::SizeMismatch {
                what: "dense bias layout",
                got: 0,
                expected: self.dim.1,
            });
        };
        optimizer.update_params(b, db);

        Ok(())
    }

    fn activate(&self, z: &Array2<f32>) -> Array2<f32> {
        match &self.act_fn {
            Some(act_fn) => z.mapv(|z| act_fn.f(z)),
            None => z.clone(),
        }
    }
}

fn shape_err(name: String, got: &[usize], expected: &[usize]) -> MlErr {
    MlErr::ShapeMismatch {
        name,
        got: got.to_vec(),
        expected: expected.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;
    use crate::optimization::GradientDescent;

    fn identity_layer() -> Dense {
        let mut params = ParameterSet::new();
        params.insert("l.weight", array![[1.0, 0.0], [0.0, 1.0]]);
        params.insert("l.bias", array![0.5, -0.5]);

        let mut layer = Dense::new((2, 2), None);
        layer.load(&params, "l").unwrap();
        layer
    }

    #[test]
    fn forward_matches_infer() {
        let mut layer = identity_layer();
        let x = array![[1.0, 2.0]];

        let y = layer.forward(x.view());
        assert_eq!(y, array![[1.5, 1.5]]);
        assert_eq!(layer.infer(x.view()), y);
    }

    #[test]
    fn load_rejects_wrong_shapes() {
        let mut params = ParameterSet::new();
        params.insert("l.weight", array![[1.0, 0.0]]);
        params.insert("l.bias", array![0.0, 0.0]);

        let mut layer = Dense::new((2, 2), None);
        assert!(matches!(
            layer.load(&params, "l"),
            Err(MlErr::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn store_round_trips_through_load() {
        let layer = identity_layer();
        let mut params = ParameterSet::new();
        layer.store(&mut params, "l");

        assert_eq!(params.get("l.bias").unwrap().as_slice().unwrap(), &[0.5, -0.5]);
        assert_eq!(params.num_params(), layer.size());
    }

    #[test]
    fn backward_then_optimize_moves_parameters() {
        let mut layer = identity_layer();
        let x = array![[1.0, 1.0]];
        layer.forward(x.view());

        let d = layer.backward(array![[1.0, 0.0]]);
        assert_eq!(d, array![[1.0, 0.0]]);

        layer.optimize(&mut GradientDescent::new(1.0)).unwrap();
        let mut params = ParameterSet::new();
        layer.store(&mut params, "l");

        let w = params.get("l.weight").unwrap();
        assert_eq!(w.as_slice().unwrap(), &[0.0, 0.0, -1.0, 1.0]);
        assert_eq!(params.get("l.bias").unwrap().as_slice().unwrap(), &[-0.5, -0.5]);
    }
}
