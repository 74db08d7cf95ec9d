use super::*;
use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;

#[test]
fn test_new_checks_length() {
    let ok = Array::new(vec![1.0, 2.0, 3.0, 4.0], vec![2, 2]);
    assert!(ok.is_ok());

    let err = Array::new(vec![1.0, 2.0, 3.0], vec![2, 2]).unwrap_err();
    assert_eq!(
        err,
        TangentError::ArrayCreation {
            data_len: 3,
            shape: vec![2, 2]
        }
    );
}

#[test]
fn test_add_same_shape() {
    let a = Array::from_vec(vec![1.0, 1.0]);
    let b = Array::from_vec(vec![5.0, 5.0]);
    let c = a.add(&b).unwrap();
    assert_eq!(c.shape(), &[2]);
    assert_eq!(c.data(), &[6.0, 6.0]);
}

#[test]
fn test_add_broadcast_scalar_and_row() {
    let m = Array::new(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], vec![2, 3]).unwrap();
    let row = Array::from_vec(vec![10.0, 20.0, 30.0]);
    let sum = m.add(&row).unwrap();
    assert_eq!(sum.shape(), &[2, 3]);
    assert_eq!(sum.data(), &[11.0, 22.0, 33.0, 14.0, 25.0, 36.0]);

    let shifted = m.add(&Array::scalar(0.5)).unwrap();
    assert_eq!(shifted.data(), &[1.5, 2.5, 3.5, 4.5, 5.5, 6.5]);
}

#[test]
fn test_add_incompatible_shapes() {
    let a = Array::<f64>::zeros(&[2]);
    let b = Array::<f64>::zeros(&[3]);
    assert!(matches!(
        a.add(&b),
        Err(TangentError::BroadcastError { .. })
    ));
}

#[test]
fn test_sub_mul_neg_scale() {
    let a = Array::from_vec(vec![4.0, 6.0]);
    let b = Array::from_vec(vec![1.0, 2.0]);
    assert_eq!(a.sub(&b).unwrap().data(), &[3.0, 4.0]);
    assert_eq!(a.mul(&b).unwrap().data(), &[4.0, 12.0]);
    assert_eq!(a.neg().data(), &[-4.0, -6.0]);
    assert_eq!(a.scale(0.5).data(), &[2.0, 3.0]);
    assert_eq!(a.add_scalar(1.0).data(), &[5.0, 7.0]);
}

#[test]
fn test_reductions() {
    let a = Array::new(vec![1.0, 2.0, 3.0, 4.0], vec![2, 2]).unwrap();
    assert_eq!(a.sum(), 10.0);
    assert_eq!(a.mean(), 2.5);
    assert_eq!(a.sum_all().shape(), &[] as &[usize]);
    assert_eq!(a.sum_all().item().unwrap(), 10.0);
}

#[test]
fn test_item_requires_single_element() {
    assert_eq!(Array::scalar(3.0).item().unwrap(), 3.0);
    assert_eq!(Array::from_vec(vec![7.0]).item().unwrap(), 7.0);
    assert!(matches!(
        Array::from_vec(vec![1.0, 2.0]).item(),
        Err(TangentError::NotAScalar { .. })
    ));
}

#[test]
fn test_creation_helpers() {
    let z = Array::<f32>::zeros(&[2, 3]);
    assert_eq!(z.numel(), 6);
    assert!(z.data().iter().all(|&x| x == 0.0));

    let o = Array::<f64>::ones(&[4]);
    assert_eq!(o.sum(), 4.0);

    let f = Array::full(&[2], 2.5f64);
    assert_eq!(Array::zeros_like(&f).shape(), f.shape());
}

#[test]
fn test_randn_is_seeded_and_finite() {
    let mut rng1 = StdRng::seed_from_u64(7);
    let mut rng2 = StdRng::seed_from_u64(7);
    let a = Array::<f64>::randn(&[3, 4], &mut rng1);
    let b = Array::<f64>::randn(&[3, 4], &mut rng2);
    assert_eq!(a.shape(), &[3, 4]);
    assert!(a.is_finite());
    assert_eq!(a, b);
}

#[test]
fn test_display() {
    assert_eq!(Array::from_vec(vec![4.0, 6.0]).to_string(), "[4.0, 6.0]");
    assert_eq!(Array::scalar(1.5).to_string(), "1.5");
    let m = Array::new(vec![1.0, 2.0], vec![1, 2]).unwrap();
    assert_eq!(m.to_string(), "Array(shape=[1, 2], data=[1.0, 2.0])");
}

#[test]
fn test_relative_eq() {
    let a = Array::from_vec(vec![0.1 + 0.2, 1.0]);
    let b = Array::from_vec(vec![0.3, 1.0]);
    assert_ne!(a, b);
    assert_relative_eq!(a, b, epsilon = 1e-12);
}
