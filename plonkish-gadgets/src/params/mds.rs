use super::{grain::Grain, Mds};
use crate::FieldExt;
use itertools::Itertools;

/// Draws Cauchy matrices `1 / (x_i + y_j)` from the Grain stream, skipping
/// the first `select` candidates, and returns the chosen matrix together with
/// its inverse.
pub fn generate_mds<F: FieldExt, const T: usize>(
	grain: &mut Grain<F>, mut select: usize,
) -> (Mds<F, T>, Mds<F, T>) {
	let (xs, ys) = loop {
		let mut xs: Vec<F> =
			(0..2 * T).map(|_| grain.next_field_element_without_rejection()).collect();
		// All 2T seeds must be distinct and every x_i + y_j invertible
		let distinct = xs.iter().tuple_combinations().all(|(a, b)| a != b);
		let ys = xs.split_off(T);
		let invertible = xs
			.iter()
			.cartesian_product(ys.iter())
			.all(|(x, y)| !bool::from((*x + y).is_zero()));
		if !(distinct && invertible) {
			continue;
		}

		if select == 0 {
			break (xs, ys);
		}
		select -= 1;
	};

	let mut mds = [[F::ZERO; T]; T];
	for i in 0..T {
		for j in 0..T {
			mds[i][j] = (xs[i] + ys[j]).invert().unwrap_or(F::ZERO);
		}
	}

	(mds, cauchy_inverse(&xs, &ys))
}

/// Lagrange basis polynomial `l_j` over `points`, evaluated at `x`.
fn lagrange<F: FieldExt>(points: &[F], j: usize, x: F) -> F {
	let x_j = points[j];
	points.iter().enumerate().filter(|(m, _)| *m != j).fold(F::ONE, |acc, (_, x_m)| {
		// Points are distinct, so the denominator is never zero
		let denominator = (x_j - x_m).invert().unwrap_or(F::ZERO);
		acc * (x - x_m) * denominator
	})
}

/// Inverse of the Cauchy matrix `1 / (x_i + y_j)`, with entries
/// `(x_j + y_i) * A_j(-y_i) * B_i(x_j)` where `A` and `B` are the Lagrange
/// bases over `xs` and `-ys`.
fn cauchy_inverse<F: FieldExt, const T: usize>(xs: &[F], ys: &[F]) -> Mds<F, T> {
	let neg_ys: Vec<F> = ys.iter().map(|y| -*y).collect();

	let mut mds_inv = [[F::ZERO; T]; T];
	for i in 0..T {
		for j in 0..T {
			mds_inv[i][j] = (xs[j] - neg_ys[i])
				* lagrange(xs, j, neg_ys[i])
				* lagrange(&neg_ys, i, xs[j]);
		}
	}
	mds_inv
}

#[cfg(test)]
mod test {
	use super::generate_mds;
	use crate::params::{
		grain::{Grain, SboxType},
		Mds,
	};
	use halo2::halo2curves::{bn256::Fr, ff::Field};

	fn mul<const T: usize>(a: &Mds<Fr, T>, b: &Mds<Fr, T>) -> Mds<Fr, T> {
		let mut c = [[Fr::ZERO; T]; T];
		for i in 0..T {
			for j in 0..T {
				for k in 0..T {
					c[i][j] += a[i][k] * b[k][j];
				}
			}
		}
		c
	}

	fn identity<const T: usize>() -> Mds<Fr, T> {
		let mut id = [[Fr::ZERO; T]; T];
		for i in 0..T {
			id[i][i] = Fr::ONE;
		}
		id
	}

	#[test]
	fn test_mds_inverse() {
		let mut grain = Grain::<Fr>::new(SboxType::Pow, 3, 8, 57);
		let (mds, mds_inv) = generate_mds::<Fr, 3>(&mut grain, 0);
		assert_eq!(mul(&mds, &mds_inv), identity::<3>());

		let mut grain = Grain::<Fr>::new(SboxType::Pow, 5, 8, 60);
		let (mds, mds_inv) = generate_mds::<Fr, 5>(&mut grain, 2);
		assert_eq!(mul(&mds_inv, &mds), identity::<5>());
	}

	#[test]
	fn test_mds_selection() {
		let mut first = Grain::<Fr>::new(SboxType::Pow, 3, 8, 57);
		let mut second = Grain::<Fr>::new(SboxType::Pow, 3, 8, 57);
		let (mds_0, _) = generate_mds::<Fr, 3>(&mut first, 0);
		let (mds_1, _) = generate_mds::<Fr, 3>(&mut second, 1);
		assert_ne!(mds_0, mds_1);
	}
}
