use crate::{
	params::{Sbox, Spec},
	FieldExt,
};
use halo2::{halo2curves::bn256::Fr, plonk::Expression};

/// Poseidon parameters for a width-5 state absorbing 4 words per permutation,
/// with the x^5 S-box.
#[derive(Clone, Copy, Debug)]
pub struct Params;

impl Sbox for Params {
	fn sbox_expr<F: FieldExt>(exp: Expression<F>) -> Expression<F> {
		let exp2 = exp.clone() * exp.clone();
		exp2.clone() * exp2 * exp
	}

	fn sbox_f<F: FieldExt>(f: F) -> F {
		f.square().square() * f
	}
}

impl Spec<Fr, 5, 4> for Params {
	fn full_rounds() -> usize {
		8
	}

	fn partial_rounds() -> usize {
		60
	}

	fn secure_mds() -> usize {
		0
	}
}
