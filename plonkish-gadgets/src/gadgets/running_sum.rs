//! Decomposes a field element into `WINDOW_NUM_BITS`-bit windows with a
//! running sum
//!
//! z_0 = value
//! z_{i + 1} = (z_i - k_i) / 2^K
//!
//! Each window `k_i = z_i - 2^K * z_{i + 1}` is range checked in-circuit with
//! the product polynomial over `[0, 2^K)`, so `WINDOW_NUM_BITS` is kept small.

use crate::{
	utils::{decompose_word, inverse, range_check},
	CommonConfig, FieldExt, RegionCtx,
};
use halo2::{
	circuit::{AssignedCell, Value},
	plonk::{Advice, Column, ConstraintSystem, Constraints, Error, Selector},
	poly::Rotation,
};
use std::{marker::PhantomData, ops::Deref};

/// The running sum `[z_0, ..., z_W]`. If created in strict mode, `z_W = 0`.
#[derive(Clone, Debug)]
pub struct RunningSum<F: FieldExt>(Vec<AssignedCell<F, F>>);

impl<F: FieldExt> RunningSum<F> {
	pub(crate) fn new(zs: Vec<AssignedCell<F, F>>) -> Self {
		Self(zs)
	}
}

impl<F: FieldExt> Deref for RunningSum<F> {
	type Target = Vec<AssignedCell<F, F>>;

	fn deref(&self) -> &Vec<AssignedCell<F, F>> {
		&self.0
	}
}

/// Configuration of the running sum decomposition
#[derive(Clone, Copy, Debug)]
pub struct RunningSumConfig<F: FieldExt, const WINDOW_NUM_BITS: usize> {
	q_range_check: Selector,
	z: Column<Advice>,
	_marker: PhantomData<F>,
}

impl<F: FieldExt, const WINDOW_NUM_BITS: usize> RunningSumConfig<F, WINDOW_NUM_BITS> {
	/// Selector enabled on every window row
	pub fn q_range_check(&self) -> Selector {
		self.q_range_check
	}

	/// Configures the window range check gate on the first advice column.
	pub fn configure(common: &CommonConfig, meta: &mut ConstraintSystem<F>) -> Self {
		assert!(WINDOW_NUM_BITS > 0, "Windows must be at least one bit wide");
		assert!(
			WINDOW_NUM_BITS <= 3,
			"Window width {} makes the range check degree too high",
			WINDOW_NUM_BITS
		);

		let q_range_check = meta.selector();
		let z = common.advice[0];

		meta.create_gate("range check", |meta| {
			let q_range_check = meta.query_selector(q_range_check);
			let z_cur = meta.query_advice(z, Rotation::cur());
			let z_next = meta.query_advice(z, Rotation::next());
			// z_i = 2^K * z_{i + 1} + k_i => k_i = z_i - 2^K * z_{i + 1}
			let word = z_cur - z_next * F::from(1 << WINDOW_NUM_BITS);

			Constraints::with_selector(
				q_range_check,
				Some(range_check(word, 1 << WINDOW_NUM_BITS)),
			)
		});
		log::debug!("configured running sum with {}-bit windows", WINDOW_NUM_BITS);

		Self { q_range_check, z, _marker: PhantomData }
	}

	/// Witnesses `value` at the current row and decomposes it. In strict mode
	/// the final `z_W` is constrained to zero, proving `value < 2^(K * W)`.
	pub fn witness_decompose(
		&self, ctx: &mut RegionCtx<'_, F>, value: Value<F>, strict: bool, word_num_bits: usize,
		num_windows: usize,
	) -> Result<RunningSum<F>, Error> {
		Self::check_windows(word_num_bits, num_windows);
		let z_0 = ctx.assign_advice(self.z, value)?;
		self.decompose(ctx, z_0, strict, word_num_bits, num_windows)
	}

	/// Copies `cell` to the current row and decomposes it.
	pub fn copy_decompose(
		&self, ctx: &mut RegionCtx<'_, F>, cell: AssignedCell<F, F>, strict: bool,
		word_num_bits: usize, num_windows: usize,
	) -> Result<RunningSum<F>, Error> {
		Self::check_windows(word_num_bits, num_windows);
		let z_0 = ctx.copy_assign(self.z, cell)?;
		self.decompose(ctx, z_0, strict, word_num_bits, num_windows)
	}

	fn check_windows(word_num_bits: usize, num_windows: usize) {
		// Every window must cover at least one bit of the word
		assert!(
			WINDOW_NUM_BITS * num_windows < word_num_bits + WINDOW_NUM_BITS,
			"{} windows of {} bits leave empty windows for a {}-bit word",
			num_windows,
			WINDOW_NUM_BITS,
			word_num_bits
		);
	}

	/// `z_0` must already be assigned at the current row.
	fn decompose(
		&self, ctx: &mut RegionCtx<'_, F>, z_0: AssignedCell<F, F>, strict: bool,
		word_num_bits: usize, num_windows: usize,
	) -> Result<RunningSum<F>, Error> {
		// Windows are computed off-circuit. The word may have more windows
		// than are decomposed here.
		let words: Vec<Value<u8>> = z_0
			.value()
			.map(|word| {
				decompose_word(word, word_num_bits, WINDOW_NUM_BITS)
					.into_iter()
					.take(num_windows)
					.collect::<Vec<_>>()
			})
			.transpose_vec(num_windows);

		let two_pow_k_inv = Value::known(inverse(F::from(1 << WINDOW_NUM_BITS))?);

		let mut zs = vec![z_0.clone()];
		let mut z = z_0;
		for word in words {
			ctx.enable(self.q_range_check)?;
			// z_{i + 1} = (z_i - k_i) / 2^K
			let z_next = (z.value().copied() - word.map(|w| F::from(u64::from(w)))) * two_pow_k_inv;
			ctx.next();
			z = ctx.assign_advice(self.z, z_next)?;
			zs.push(z.clone());
		}
		assert_eq!(zs.len(), num_windows + 1);

		if strict {
			ctx.constrain_to_constant(z, F::ZERO)?;
		}
		log::trace!("decomposed into {} windows, strict: {}", num_windows, strict);

		Ok(RunningSum::new(zs))
	}
}
