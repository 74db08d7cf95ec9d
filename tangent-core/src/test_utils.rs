//! Fixtures shared by the unit tests.

use crate::array::Array;
use crate::differentiable;

/// Installs a test logger once; later calls are no-ops.
pub(crate) fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// `a` and `d` are opaque, `b` and `c` are leaves.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Model {
    pub a: i64,
    pub b: Array,
    pub c: Array,
    pub d: String,
}

differentiable! {
    impl Differentiable<f64> for Model {
        opaque a,
        leaf b,
        leaf c,
        opaque d,
    }
}

impl Model {
    pub(crate) fn new(b: Vec<f64>, c: Vec<f64>) -> Self {
        Model {
            a: 1,
            b: Array::from_vec(b),
            c: Array::from_vec(c),
            d: "value".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Layer {
    pub weight: Array,
    pub name: String,
}

differentiable! {
    impl Differentiable<f64> for Layer {
        leaf weight,
        opaque name,
    }
}

/// Holds a nested differentiable `Layer`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Network {
    pub steps: usize,
    pub layer: Layer,
    pub bias: Array,
}

differentiable! {
    impl Differentiable<f64> for Network {
        opaque steps,
        composite layer,
        leaf bias,
    }
}

impl Network {
    pub(crate) fn new(weight: Vec<f64>, bias: Vec<f64>) -> Self {
        Network {
            steps: 0,
            layer: Layer {
                weight: Array::from_vec(weight),
                name: "hidden".to_string(),
            },
            bias: Array::from_vec(bias),
        }
    }
}
