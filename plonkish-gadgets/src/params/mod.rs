/// Grain LFSR stream for round constants and MDS seeds
pub mod grain;
/// Poseidon parameter sets for concrete fields and widths
pub mod hasher;
/// Cauchy MDS matrix search and inversion
pub mod mds;

use crate::FieldExt;
use grain::{Grain, SboxType};
use halo2::plonk::Expression;
use std::fmt::Debug;

/// Poseidon state of `T` words
pub type State<F, const T: usize> = [F; T];
/// Partially filled sponge buffer of `RATE` words
pub type SpongeRate<F, const RATE: usize> = [Option<F>; RATE];
/// Square `T x T` matrix
pub type Mds<F, const T: usize> = [[F; T]; T];

/// Trait definition of Sbox function of Poseidon
pub trait Sbox {
	/// Returns the S-box applied to an expression.
	fn sbox_expr<F: FieldExt>(exp: Expression<F>) -> Expression<F>;
	/// Returns the S-box applied to a field element.
	fn sbox_f<F: FieldExt>(f: F) -> F;
}

/// Poseidon parameters for a state of width `T` absorbing `RATE` words per
/// permutation.
pub trait Spec<F: FieldExt, const T: usize, const RATE: usize>: Sbox + Debug + Sized {
	/// Returns a number of full rounds. Must be even.
	fn full_rounds() -> usize;
	/// Returns a number of partial rounds.
	fn partial_rounds() -> usize;
	/// Index of the MDS candidate to use, counting from the first candidate
	/// drawn from the Grain stream.
	fn secure_mds() -> usize;

	/// Returns the number of rows of round constants.
	fn round_constants_count() -> usize {
		Self::full_rounds() + Self::partial_rounds()
	}

	/// Returns `(round_constants, mds, mds_inv)`.
	fn constants() -> (Vec<[F; T]>, Mds<F, T>, Mds<F, T>) {
		generate_constants::<F, Self, T, RATE>()
	}
}

/// Panics unless the full rounds can be split evenly around the partial
/// rounds.
pub fn check_rounds<F: FieldExt, S: Spec<F, T, RATE>, const T: usize, const RATE: usize>() {
	let r_f = S::full_rounds();
	assert!(r_f % 2 == 0, "Number of full rounds must be even, got {}", r_f);
}

/// Derives the round constants and the MDS matrix (with its inverse) from the
/// Grain stream seeded by the field size, `T` and the round counts.
pub fn generate_constants<F: FieldExt, S: Spec<F, T, RATE>, const T: usize, const RATE: usize>(
) -> (Vec<[F; T]>, Mds<F, T>, Mds<F, T>) {
	let r_f = S::full_rounds();
	let r_p = S::partial_rounds();
	check_rounds::<F, S, T, RATE>();
	assert!(0 < RATE && RATE < T, "Rate must be in range (0, {}), got {}", T, RATE);

	let mut grain = Grain::<F>::new(SboxType::Pow, T as u16, r_f as u16, r_p as u16);

	let round_constants: Vec<[F; T]> = (0..S::round_constants_count())
		.map(|_| {
			let mut rc_row = [F::ZERO; T];
			for rc in rc_row.iter_mut() {
				*rc = grain.next_field_element();
			}
			rc_row
		})
		.collect();

	let (mds, mds_inv) = mds::generate_mds::<F, T>(&mut grain, S::secure_mds());
	log::debug!(
		"generated poseidon constants: t = {}, r_f = {}, r_p = {}, secure_mds = {}",
		T,
		r_f,
		r_p,
		S::secure_mds()
	);

	(round_constants, mds, mds_inv)
}

/// Returns congruent field element for the given hex string.
pub fn hex_to_field<F: FieldExt>(s: &str) -> F {
	let s = &s[2..];
	let mut bytes = hex::decode(s).expect("Invalid params");
	bytes.reverse();
	let mut bytes_wide: [u8; 64] = [0; 64];
	bytes_wide[..bytes.len()].copy_from_slice(&bytes[..]);
	F::from_uniform_bytes(&bytes_wide)
}

#[cfg(test)]
mod test {
	use super::{generate_constants, hex_to_field, Sbox, Spec};
	use crate::FieldExt;
	use halo2::{halo2curves::bn256::Fr, plonk::Expression};

	#[derive(Debug)]
	struct OddRounds;

	impl Sbox for OddRounds {
		fn sbox_expr<F: FieldExt>(exp: Expression<F>) -> Expression<F> {
			exp
		}

		fn sbox_f<F: FieldExt>(f: F) -> F {
			f
		}
	}

	impl Spec<Fr, 3, 2> for OddRounds {
		fn full_rounds() -> usize {
			7
		}

		fn partial_rounds() -> usize {
			3
		}

		fn secure_mds() -> usize {
			0
		}
	}

	#[test]
	#[should_panic(expected = "Number of full rounds must be even")]
	fn test_odd_full_rounds() {
		generate_constants::<Fr, OddRounds, 3, 2>();
	}

	#[test]
	fn test_hex_to_field() {
		let one: Fr = hex_to_field("0x01");
		assert_eq!(one, Fr::from(1));

		let x: Fr = hex_to_field("0x0100");
		assert_eq!(x, Fr::from(256));
	}
}
