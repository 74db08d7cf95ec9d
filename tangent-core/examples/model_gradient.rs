// Gradient of a weighted sum with respect to a record with opaque fields,
// followed by one move along that gradient and an update of the record.
//
// Run with `RUST_LOG=debug` to see registration and update logs.

use tangent_core::{differentiable, Array, Differentiable, GradEngine, Tangent, TangentError, Var};

#[derive(Debug, Clone)]
struct Model {
    a: i64,
    b: Array,
    c: Array,
    d: String,
}

differentiable! {
    impl Differentiable<f64> for Model {
        opaque a,
        leaf b,
        leaf c,
        opaque d,
    }
}

// loss = 3 * sum(b) + 5 * sum(c)
fn loss(t: &Tangent<Var>) -> Result<Var, TangentError> {
    let b = t.leaf("b")?.sum()?.mul_scalar(3.0)?;
    let c = t.leaf("c")?.sum()?.mul_scalar(5.0)?;
    b.add(&c)
}

fn main() -> Result<(), TangentError> {
    env_logger::init();

    let mut engine: GradEngine = GradEngine::new();
    engine.register_type::<Model>()?;

    let mut model = Model {
        a: 1,
        b: Array::from_vec(vec![1.0]),
        c: Array::from_vec(vec![1.0, 1.0]),
        d: "value".to_string(),
    };
    println!("model:   {:?}", model);

    let grad = engine.grad(loss, &model)?;
    println!("grad:    {}", grad);

    let moved = model.move_along(&grad)?;
    println!("moved:   {}", moved);

    model.update_in_place(&moved)?;
    println!("updated: {:?}", model);
    println!("a = {}, d = {:?} (unchanged)", model.a, model.d);

    Ok(())
}
