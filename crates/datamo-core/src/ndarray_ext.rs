//! [`Materialize`] for `ndarray` arrays.
//!
//! Elements are read in logical row-major order, so transposed views and
//! other non-standard layouts are logged the way they index, not the way
//! they sit in memory.

use ndarray::{ArrayBase, Data, Dimension};

use crate::error::Result;
use crate::models::{Materialize, Tensor};

impl<S, D> Materialize for ArrayBase<S, D>
where
    S: Data,
    S::Elem: Copy + Into<f64>,
    D: Dimension,
{
    fn materialize(&self) -> Result<Tensor> {
        let data = self.iter().map(|&value| value.into()).collect();
        Tensor::new(self.shape(), data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Item;
    use ndarray::{array, Array2, Array3};

    #[test]
    fn shape_becomes_descriptor() {
        let weights = Array2::<f32>::zeros((10, 2));
        let tensor = weights.materialize().unwrap();
        assert_eq!(tensor.descriptor(), &[2, 10, 2]);
        assert_eq!(Item::from_tensor("w", tensor).payload_size(), 172);
    }

    #[test]
    fn views_are_read_in_logical_order() {
        let a = array![[1.0_f64, 2.0], [3.0, 4.0]];
        let tensor = a.t().materialize().unwrap();
        assert_eq!(tensor.data(), &[1.0, 3.0, 2.0, 4.0]);
    }

    #[test]
    fn integer_elements_are_widened() {
        let counts = array![[1_i32, 2, 3]];
        let item = Item::tensor("counts", &counts).unwrap();
        assert_eq!(item.payload_size(), 3 * 8 + 3 * 4);
    }

    #[test]
    fn zero_dimensional_array() {
        let a = ndarray::arr0(2.5_f64);
        let tensor = a.materialize().unwrap();
        assert_eq!(tensor.descriptor(), &[0]);
        assert_eq!(tensor.data(), &[2.5]);
    }

    #[test]
    fn higher_rank() {
        let a = Array3::<f64>::ones((2, 3, 4));
        let tensor = a.materialize().unwrap();
        assert_eq!(tensor.descriptor(), &[3, 2, 3, 4]);
        assert_eq!(tensor.data().len(), 24);
    }
}
