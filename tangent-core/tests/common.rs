use tangent_core::{differentiable, Array, GradEngine};

// Shared fixtures for the integration tests.
// Added allow(dead_code) because usage across different test crates isn't detected easily.

#[allow(dead_code)]
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// The record from the original demo script: two opaque fields, two leaves.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
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

#[allow(dead_code)]
pub fn demo_model() -> Model {
    Model {
        a: 1,
        b: Array::from_vec(vec![1.0]),
        c: Array::from_vec(vec![1.0, 1.0]),
        d: "value".to_string(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Encoder {
    pub scale: Array,
    pub label: String,
}

differentiable! {
    impl Differentiable<f64> for Encoder {
        leaf scale,
        opaque label,
    }
}

/// Two levels of nesting: `Pipeline` holds an `Encoder` and a `Model`.
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    pub encoder: Encoder,
    pub head: Model,
    pub offset: Array,
    pub epoch: u32,
}

differentiable! {
    impl Differentiable<f64> for Pipeline {
        composite encoder,
        composite head,
        leaf offset,
        opaque epoch,
    }
}

#[allow(dead_code)]
pub fn demo_pipeline() -> Pipeline {
    Pipeline {
        encoder: Encoder {
            scale: Array::from_vec(vec![2.0, 3.0]),
            label: "enc".to_string(),
        },
        head: demo_model(),
        offset: Array::scalar(0.5),
        epoch: 3,
    }
}

#[allow(dead_code)]
pub fn engine_for_pipeline() -> GradEngine {
    let mut engine: GradEngine = GradEngine::new();
    engine.register_type::<Encoder>().unwrap();
    engine.register_type::<Model>().unwrap();
    engine.register_type::<Pipeline>().unwrap();
    engine
}
