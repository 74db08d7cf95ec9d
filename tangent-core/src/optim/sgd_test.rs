use super::*;
use crate::autograd::Var;
use crate::engine::GradEngine;
use crate::test_utils::{init_logger, Layer, Model, Network};
use approx::assert_relative_eq;

fn quadratic(t: &Tangent<Var>) -> Result<Var, TangentError> {
    let w = t.node("layer")?.leaf("weight")?;
    let b = t.leaf("bias")?;
    w.mul(w)?.sum()?.add(&b.mul(b)?.sum()?)
}

#[test]
fn test_new_rejects_bad_learning_rates() {
    assert_eq!(Sgd::new(0.1).unwrap().lr(), 0.1);
    for lr in [0.0, -1.0, f64::NAN, f64::INFINITY] {
        assert!(matches!(
            Sgd::new(lr),
            Err(TangentError::Configuration { .. })
        ));
    }
}

#[test]
fn test_step_moves_against_gradient() {
    init_logger();
    let sgd = Sgd::new(0.5).unwrap();
    let mut model = Model::new(vec![1.0], vec![1.0, 1.0]);
    let point = model.point().unwrap();
    let grad = point.map_leaves(|_| Ok(Array::scalar(2.0))).unwrap();

    let next = sgd.step(&mut model, &grad).unwrap();
    assert_eq!(next.leaf("b").unwrap().data(), &[0.0]);
    assert_eq!(model.b.data(), &[0.0]);
    assert_eq!(model.c.data(), &[0.0, 0.0]);
    assert_eq!(model.a, 1);
    assert_eq!(model.d, "value");
}

#[test]
fn test_step_pure_leaves_instance_untouched() {
    let sgd = Sgd::new(0.1).unwrap();
    let net = Network::new(vec![1.0, 2.0], vec![3.0]);
    let grad = net.point().unwrap();

    let stepped = sgd.step_pure(&net, &grad).unwrap();
    assert_eq!(net, Network::new(vec![1.0, 2.0], vec![3.0]));
    assert_relative_eq!(stepped.layer.weight, Array::from_vec(vec![0.9, 1.8]));
    assert_relative_eq!(stepped.bias, Array::from_vec(vec![2.7]));
    assert_eq!(stepped.layer.name, "hidden");
}

#[test]
fn test_step_with_foreign_gradient_fails_without_mutation() {
    let sgd = Sgd::new(0.1).unwrap();
    let mut net = Network::new(vec![1.0], vec![1.0]);
    let foreign = Model::new(vec![1.0], vec![1.0]).point().unwrap();
    assert!(matches!(
        sgd.step(&mut net, &foreign),
        Err(TangentError::TypeMismatch { .. })
    ));
    assert_eq!(net, Network::new(vec![1.0], vec![1.0]));
}

#[test]
fn test_descent_reduces_quadratic_loss() {
    let mut engine: GradEngine = GradEngine::new();
    engine.register_type::<Layer>().unwrap();
    engine.register_type::<Network>().unwrap();
    let sgd = Sgd::new(0.1).unwrap();
    let mut net = Network::new(vec![1.0, -2.0], vec![0.5]);

    let mut previous = f64::INFINITY;
    for _ in 0..10 {
        let (loss, grad) = engine.value_and_grad(quadratic, &net).unwrap();
        assert!(loss < previous);
        previous = loss;
        sgd.step(&mut net, &grad).unwrap();
    }
    // each step scales every leaf by (1 - 2 * lr)
    assert_relative_eq!(net.bias.data()[0], 0.5 * 0.8f64.powi(10), epsilon = 1e-12);
}
