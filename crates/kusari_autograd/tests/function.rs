mod utils;

use kusari_autograd::{
    apply, config, ops, ApplyContext, ArgInfo, BackwardContext, Function, Variable,
};
use kusari_core::{error::Result, DType, Error, NdArray};
use utils::{grad_vec, setup_device, setup_var};

/// Fused multiply-add with a fused backward-accumulate: each returned slot is
/// `local_grad + pending` computed as a single muladd where possible.
struct MulAdd;

impl MulAdd {
    fn eval(a: &Variable, b: &Variable, c: Option<&Variable>) -> Result<Variable> {
        let prod = ops::mul(a, b)?;
        match c {
            Some(c) => ops::add(&prod, c),
            None => Ok(prod),
        }
    }
}

impl Function for MulAdd {
    fn name(&self) -> &'static str {
        "muladd"
    }

    fn check_type_forward(&self, in_types: &[ArgInfo]) -> Result<()> {
        if in_types.len() != 3 {
            return Err(Error::InvalidArgument(format!(
                "expected 3 inputs, got {}",
                in_types.len()
            )));
        }
        Ok(())
    }

    fn forward(&self, ctx: &mut ApplyContext, inputs: &[NdArray]) -> Result<Vec<NdArray>> {
        ctx.retain_inputs(&[0, 1]);
        Ok(vec![inputs[0].mul(&inputs[1])?.add(&inputs[2])?])
    }

    fn backward_accumulate(
        &self,
        ctx: &BackwardContext<'_>,
        grad_inputs: &[Option<Variable>],
    ) -> Result<Vec<Option<Variable>>> {
        let Some(gy) = ctx.grad_output(0) else {
            return Ok(vec![None, None, None]);
        };
        let a = ctx.retained_input(0)?;
        let b = ctx.retained_input(1)?;

        let ga = Self::eval(gy, &b, grad_inputs[0].as_ref())?;
        let gb = Self::eval(&a, gy, grad_inputs[1].as_ref())?;
        let gc = match &grad_inputs[2] {
            Some(pending) => ops::add(gy, pending)?,
            None => gy.clone(),
        };
        Ok(vec![Some(ga), Some(gb), Some(gc)])
    }
}

fn muladd(a: &Variable, b: &Variable, c: &Variable) -> Result<Variable> {
    Ok(apply(MulAdd, &[a.clone(), b.clone(), c.clone()])?.remove(0))
}

#[test]
fn fused_muladd_matches_decomposed_gradients() -> Result<()> {
    setup_device();
    let data_a = vec![0.5, -1.25, 2.0, 3.5];
    let data_b = vec![1.5, 2.5, -0.75, 0.25];
    let data_c = vec![-2.0, 0.0, 1.0, 4.0];

    let a1 = setup_var(data_a.clone(), &[4], DType::F32)?;
    let b1 = setup_var(data_b.clone(), &[4], DType::F32)?;
    let c1 = setup_var(data_c.clone(), &[4], DType::F32)?;
    let fused = muladd(&a1, &b1, &c1)?.sum()?;
    fused.backward()?;

    let a2 = setup_var(data_a, &[4], DType::F32)?;
    let b2 = setup_var(data_b, &[4], DType::F32)?;
    let c2 = setup_var(data_c, &[4], DType::F32)?;
    let plain = a2.mul(&b2)?.add(&c2)?.sum()?;
    plain.backward()?;

    for (fused, plain) in [(&a1, &a2), (&b1, &b2), (&c1, &c2)] {
        assert!(fused
            .grad()
            .unwrap()
            .allclose(&plain.grad().unwrap(), 1e-4, 1e-4)?);
    }
    Ok(())
}

#[test]
fn fused_accumulate_folds_the_pending_gradient() -> Result<()> {
    setup_device();
    // a feeds both muladd slots 0 and 1, so its two local gradients plus the
    // pending sum all flow through the fused path
    let a = setup_var(vec![2.0, 3.0], &[2], DType::F32)?;
    let c = setup_var(vec![1.0, 1.0], &[2], DType::F32)?;

    let y = muladd(&a, &a, &c)?.sum()?;
    y.backward()?;

    // d(a*a + c)/da = 2a
    assert_eq!(grad_vec(&a), vec![4.0, 6.0]);
    assert_eq!(grad_vec(&c), vec![1.0, 1.0]);
    Ok(())
}

#[test]
fn type_check_failure_names_the_operation() -> Result<()> {
    setup_device();
    let a = setup_var(vec![1.0], &[1], DType::F32)?;
    let result = apply(MulAdd, &[a.clone(), a.clone()]);

    match result {
        Err(Error::TypeCheckFailed { op, .. }) => assert_eq!(op, "muladd"),
        other => panic!("expected TypeCheckFailed, got {:?}", other.map(|_| ())),
    }
    Ok(())
}

#[test]
fn mismatched_operands_fail_the_type_check() -> Result<()> {
    setup_device();
    let a = setup_var(vec![1.0], &[1], DType::F32)?;
    let b = setup_var(vec![1.0], &[1], DType::F64)?;
    assert!(matches!(
        ops::add(&a, &b),
        Err(Error::TypeCheckFailed { .. })
    ));
    Ok(())
}

#[test]
fn uninitialized_input_is_rejected() {
    setup_device();
    let a = Variable::uninitialized();
    let b = Variable::uninitialized();
    assert!(matches!(
        ops::add(&a, &b),
        Err(Error::Uninitialized { .. })
    ));
}

struct BadShapeGrad;

impl Function for BadShapeGrad {
    fn name(&self) -> &'static str {
        "bad_shape_grad"
    }

    fn forward(&self, _ctx: &mut ApplyContext, inputs: &[NdArray]) -> Result<Vec<NdArray>> {
        Ok(vec![inputs[0].clone()])
    }

    fn backward(&self, _ctx: &BackwardContext<'_>) -> Result<Vec<Option<Variable>>> {
        let wrong = NdArray::from_vec(vec![1.0f32], &[1])?;
        Ok(vec![Some(Variable::constant(wrong))])
    }
}

#[test]
fn wrong_gradient_shape_is_reported_with_the_op_name() -> Result<()> {
    setup_device();
    let x = setup_var(vec![1.0, 2.0], &[2], DType::F32)?;
    let y = apply(BadShapeGrad, &[x.clone()])?.remove(0);
    y.set_grad(Some(NdArray::ones_like(&y.array().unwrap())?))?;

    match y.backward() {
        Err(Error::GradShapeMismatch { op, expected, got }) => {
            assert_eq!(op, "bad_shape_grad");
            assert_eq!(expected, vec![2]);
            assert_eq!(got, vec![1]);
        }
        other => panic!("expected GradShapeMismatch, got {:?}", other.map(|_| ())),
    }
    Ok(())
}

struct BadDTypeGrad;

impl Function for BadDTypeGrad {
    fn name(&self) -> &'static str {
        "bad_dtype_grad"
    }

    fn forward(&self, _ctx: &mut ApplyContext, inputs: &[NdArray]) -> Result<Vec<NdArray>> {
        Ok(vec![inputs[0].clone()])
    }

    fn backward(&self, ctx: &BackwardContext<'_>) -> Result<Vec<Option<Variable>>> {
        let shape = ctx.input_shape(0)?;
        let wrong = NdArray::ones(&shape, DType::F64)?;
        Ok(vec![Some(Variable::constant(wrong))])
    }
}

#[test]
fn wrong_gradient_dtype_is_reported_with_the_op_name() -> Result<()> {
    setup_device();
    let x = setup_var(vec![1.0], &[], DType::F32)?;
    let y = apply(BadDTypeGrad, &[x.clone()])?.remove(0);

    match y.backward() {
        Err(Error::GradDTypeMismatch { op, expected, got }) => {
            assert_eq!(op, "bad_dtype_grad");
            assert_eq!(expected, DType::F32);
            assert_eq!(got, DType::F64);
        }
        other => panic!("expected GradDTypeMismatch, got {:?}", other.map(|_| ())),
    }
    Ok(())
}

#[test]
fn debug_mode_attaches_a_creation_traceback() -> Result<()> {
    setup_device();
    let _guard = config::with_debug_mode();
    let x = setup_var(vec![1.0], &[], DType::F32)?;
    let y = apply(BadDTypeGrad, &[x])?.remove(0);

    match y.backward() {
        Err(Error::Traced { traceback, source }) => {
            assert!(!traceback.is_empty());
            assert!(matches!(*source, Error::GradDTypeMismatch { .. }));
        }
        other => panic!("expected Traced, got {:?}", other.map(|_| ())),
    }
    Ok(())
}

#[test]
fn ranks_grow_along_the_chain() -> Result<()> {
    setup_device();
    let x = setup_var(vec![1.0], &[], DType::F32)?;
    let a = x.square()?;
    let b = a.exp()?;
    let c = b.add(&a)?;

    assert_eq!(x.rank(), 0);
    assert_eq!(a.rank(), 1);
    assert_eq!(b.rank(), 2);
    // add sits above its deepest input
    assert_eq!(c.rank(), 3);
    assert_eq!(c.creator().unwrap().rank(), 2);
    Ok(())
}

#[test]
fn identity_passes_many_values_through() -> Result<()> {
    setup_device();
    let a = setup_var(vec![1.0], &[], DType::F32)?;
    let b = setup_var(vec![2.0], &[], DType::F32)?;

    let outs = ops::identity(&[a.clone(), b.clone()])?;
    assert_eq!(outs.len(), 2);

    let y = outs[0].add(&outs[1])?;
    y.backward()?;
    assert_eq!(grad_vec(&a), vec![1.0]);
    assert_eq!(grad_vec(&b), vec![1.0]);
    Ok(())
}

#[test]
fn dropped_sibling_output_does_not_break_backward() -> Result<()> {
    setup_device();
    let a = setup_var(vec![3.0], &[], DType::F32)?;
    let b = setup_var(vec![4.0], &[], DType::F32)?;

    let mut outs = ops::identity(&[a.clone(), b.clone()])?;
    let kept = outs.remove(0);
    drop(outs);

    let y = kept.square()?;
    y.backward()?;
    assert_eq!(grad_vec(&a), vec![6.0]);
    assert!(b.grad().is_none());
    Ok(())
}

#[test]
fn retained_output_is_recoverable_from_the_creator() -> Result<()> {
    setup_device();
    let x = setup_var(vec![2.0], &[], DType::F32)?;
    let y = x.exp()?;
    let creator = y.creator().unwrap();

    let recovered = creator.retained_output(0)?;
    assert!(recovered.node().ptr_eq(y.node()));
    assert!(recovered
        .array()
        .unwrap()
        .allclose(&y.array().unwrap(), 1e-6, 1e-6)?);
    Ok(())
}

struct NoBackward;

impl Function for NoBackward {
    fn name(&self) -> &'static str {
        "no_backward"
    }

    fn forward(&self, _ctx: &mut ApplyContext, inputs: &[NdArray]) -> Result<Vec<NdArray>> {
        Ok(vec![inputs[0].clone()])
    }
}

#[test]
fn missing_backward_surfaces_as_an_internal_error() -> Result<()> {
    setup_device();
    let x = setup_var(vec![1.0], &[], DType::F32)?;
    let y = apply(NoBackward, &[x])?.remove(0);
    assert!(matches!(y.backward(), Err(Error::Internal { .. })));
    Ok(())
}
