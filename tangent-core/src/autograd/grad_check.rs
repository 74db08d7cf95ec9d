use crate::array::{Array, Element};
use crate::autograd::Var;
use crate::differentiable::Differentiable;
use crate::engine::GradEngine;
use crate::error::TangentError;
use crate::tangent::{Tangent, TreeDef};
use log::debug;
use thiserror::Error;

/// Error type specifically for gradient checking failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GradCheckError {
    #[error("Gradient check failed for leaf {leaf_index}, element {element_index}: analytical grad {analytical:?} != numerical grad {numerical:?}. Difference: {difference:?}")]
    GradientMismatch {
        leaf_index: usize,
        element_index: usize,
        analytical: f64,
        numerical: f64,
        difference: f64,
    },

    #[error("Numerical gradient is NaN or infinite for leaf {leaf_index}, element {element_index}. Loss+: {loss_plus:?}, Loss-: {loss_minus:?}")]
    NumericalGradNotFinite {
        leaf_index: usize,
        element_index: usize,
        loss_plus: f64,
        loss_minus: f64,
    },

    #[error("Error during gradient check: {0}")]
    Tangent(#[from] TangentError),
}

/// Step size and tolerance of a finite-difference check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradCheckConfig {
    /// Finite-difference step. `None` uses the cube root of the element
    /// type's machine epsilon (about 6e-6 for `f64`, 5e-3 for `f32`).
    pub epsilon: Option<f64>,
    pub tolerance: f64,
}

impl Default for GradCheckConfig {
    fn default() -> Self {
        GradCheckConfig {
            epsilon: None,
            tolerance: 1e-4,
        }
    }
}

impl GradCheckConfig {
    /// The step used for elements of type `T`.
    pub fn step<T: Element>(&self) -> Result<T, TangentError> {
        match self.epsilon {
            Some(epsilon) => cast(epsilon),
            None => Ok(T::epsilon().cbrt()),
        }
    }
}

/// Checks the engine's gradient of `loss` at `instance` against central finite differences.
///
/// Every element of every leaf is perturbed by `±epsilon` in turn while the
/// others stay put. The difference quotient divides by the step actually
/// representable in `T`. A mismatch is reported when both the absolute and
/// the relative difference exceed `tolerance`.
pub fn check_grad<T, D, F>(
    engine: &GradEngine<T>,
    loss: F,
    instance: &D,
    config: GradCheckConfig,
) -> Result<(), GradCheckError>
where
    T: Element,
    D: Differentiable<T> + ?Sized,
    F: Fn(&Tangent<Var<T>>) -> Result<Var<T>, TangentError>,
{
    let analytical_leaves = engine.grad(&loss, instance)?.into_leaves();
    let (leaves, def) = engine.registry().flatten(instance)?;
    let epsilon = config.step::<T>()?;

    for (leaf_index, leaf) in leaves.iter().enumerate() {
        let analytical_data = analytical_leaves[leaf_index].data();
        for element_index in 0..leaf.numel() {
            let x = leaf.data()[element_index];
            let (x_plus, x_minus) = (x + epsilon, x - epsilon);
            let step = to_f64(x_plus)? - to_f64(x_minus)?;

            let loss_plus = perturbed_loss(&loss, &def, &leaves, leaf_index, element_index, x_plus)?;
            let loss_minus = perturbed_loss(&loss, &def, &leaves, leaf_index, element_index, x_minus)?;
            let numerical = (loss_plus - loss_minus) / step;
            if !numerical.is_finite() {
                return Err(GradCheckError::NumericalGradNotFinite {
                    leaf_index,
                    element_index,
                    loss_plus,
                    loss_minus,
                });
            }

            let analytical = to_f64(analytical_data[element_index])?;
            let difference = (analytical - numerical).abs();
            if difference > config.tolerance
                && difference / (analytical.abs() + step) > config.tolerance
            {
                return Err(GradCheckError::GradientMismatch {
                    leaf_index,
                    element_index,
                    analytical,
                    numerical,
                    difference,
                });
            }
        }
    }
    debug!("Gradient check passed for {} leaves", leaves.len());
    Ok(())
}

/// Loss with one element replaced by `value`; every leaf is a constant.
fn perturbed_loss<T, F>(
    loss: &F,
    def: &TreeDef,
    leaves: &[Array<T>],
    leaf_index: usize,
    element_index: usize,
    value: T,
) -> Result<f64, TangentError>
where
    T: Element,
    F: Fn(&Tangent<Var<T>>) -> Result<Var<T>, TangentError>,
{
    let vars: Vec<Var<T>> = leaves
        .iter()
        .enumerate()
        .map(|(i, leaf)| {
            let mut perturbed = leaf.clone();
            if i == leaf_index {
                perturbed.data_mut()[element_index] = value;
            }
            Var::constant(perturbed)
        })
        .collect();
    let inputs = def.unflatten(vars)?;
    to_f64(loss(&inputs)?.item()?)
}

fn cast<T: Element>(value: f64) -> Result<T, TangentError> {
    <T as num_traits::NumCast>::from(value)
        .ok_or_else(|| TangentError::InternalError(format!("{} does not fit the element type", value)))
}

fn to_f64<T: Element>(value: T) -> Result<f64, TangentError> {
    value
        .to_f64()
        .ok_or_else(|| TangentError::InternalError(format!("{:?} has no f64 representation", value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::Array;
    use crate::differentiable;
    use crate::test_utils::{Layer, Model, Network};

    /// The demo record in single precision.
    #[derive(Debug, Clone, PartialEq)]
    struct SingleModel {
        b: Array<f32>,
        c: Array<f32>,
        d: String,
    }

    differentiable! {
        impl Differentiable<f32> for SingleModel {
            leaf b,
            leaf c,
            opaque d,
        }
    }

    fn single_loss(t: &Tangent<Var<f32>>) -> Result<Var<f32>, TangentError> {
        let b = t.leaf("b")?.sum()?.mul_scalar(3.0)?;
        b.add(&t.leaf("c")?.sum()?.mul_scalar(5.0)?)
    }

    fn engine_for_network() -> GradEngine {
        let mut engine: GradEngine = GradEngine::new();
        engine.register_type::<Layer>().unwrap();
        engine.register_type::<Network>().unwrap();
        engine
    }

    #[test]
    fn test_check_grad_passes_for_engine_ops() {
        let engine = engine_for_network();
        let net = Network::new(vec![0.5, -1.5, 2.0], vec![0.25]);
        let loss = |t: &Tangent<Var>| -> Result<Var, TangentError> {
            let w = t.node("layer")?.leaf("weight")?;
            let b = t.leaf("bias")?;
            let shifted = w.sub(b)?.add_scalar(1.0)?;
            shifted.mul(&shifted)?.neg()?.mean()
        };
        check_grad(&engine, loss, &net, GradCheckConfig::default()).unwrap();
    }

    #[test]
    fn test_check_grad_on_weighted_sums() {
        let mut engine: GradEngine = GradEngine::new();
        engine.register_type::<Model>().unwrap();
        let model = Model::new(vec![1.0], vec![1.0, 1.0]);
        let loss = |t: &Tangent<Var>| -> Result<Var, TangentError> {
            let b = t.leaf("b")?.sum()?.mul_scalar(3.0)?;
            b.add(&t.leaf("c")?.sum()?.mul_scalar(5.0)?)
        };
        check_grad(&engine, loss, &model, GradCheckConfig::default()).unwrap();
    }

    #[test]
    fn test_check_grad_reports_tangent_errors() {
        let engine: GradEngine = GradEngine::new();
        let model = Model::new(vec![1.0], vec![1.0]);
        let err = check_grad(&engine, |t| t.leaf("b")?.sum(), &model, GradCheckConfig::default())
            .unwrap_err();
        assert!(matches!(
            err,
            GradCheckError::Tangent(TangentError::UnregisteredType { .. })
        ));
    }

    #[test]
    fn test_single_precision_gradient_checks() {
        let mut engine: GradEngine<f32> = GradEngine::new();
        engine.register_type::<SingleModel>().unwrap();
        let model = SingleModel {
            b: Array::from_vec(vec![1.0]),
            c: Array::from_vec(vec![1.0, 1.0]),
            d: "value".to_string(),
        };

        let grad = engine.grad(single_loss, &model).unwrap();
        assert_eq!(grad.to_string(), "SingleModelTangent(b=[3.0], c=[5.0, 5.0])");
        let moved = model.move_along(&grad).unwrap();
        assert_eq!(moved.leaf("c").unwrap().data(), &[6.0f32, 6.0]);
        assert_eq!(model.d, "value");

        check_grad(&engine, single_loss, &model, GradCheckConfig::default()).unwrap();
    }

    #[test]
    fn test_explicit_step_is_rounded_to_the_element_type() {
        // 1e-6 is not representable next to 1.0 in f32; the quotient must use the rounded step
        let mut engine: GradEngine<f32> = GradEngine::new();
        engine.register_type::<SingleModel>().unwrap();
        let model = SingleModel {
            b: Array::from_vec(vec![1.0]),
            c: Array::from_vec(vec![0.0, 0.0]),
            d: String::new(),
        };
        let config = GradCheckConfig {
            epsilon: Some(1e-6),
            tolerance: 1e-4,
        };
        check_grad(&engine, |t| t.leaf("b")?.sum(), &model, config).unwrap();
    }

    #[test]
    fn test_default_config() {
        let config = GradCheckConfig::default();
        assert_eq!(config.epsilon, None);
        assert_eq!(config.tolerance, 1e-4);
        assert_eq!(config.step::<f64>().unwrap(), f64::EPSILON.cbrt());
        assert_eq!(config.step::<f32>().unwrap(), f32::EPSILON.cbrt());
        let explicit = GradCheckConfig {
            epsilon: Some(1e-3),
            ..config
        };
        assert_eq!(explicit.step::<f64>().unwrap(), 1e-3);
    }
}
