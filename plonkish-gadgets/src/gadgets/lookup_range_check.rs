//! Range checks against a `K`-bit lookup table
//!
//! Long values are decomposed with a running sum whose `K`-bit windows are
//! looked up. Values shorter than `K` bits are looked up directly, together
//! with a copy shifted left by `K - num_bits`, so both are known to fit.

use super::running_sum::RunningSum;
use crate::{
	utils::{bitrange_subset, fe_to_le_bits, inverse, lebs2ip},
	CommonConfig, FieldExt, RegionCtx,
};
use halo2::{
	circuit::{AssignedCell, Layouter, Value},
	plonk::{
		Advice, Column, ConstraintSystem, Constraints, Error, Expression, Selector, TableColumn,
	},
	poly::Rotation,
};
use std::{marker::PhantomData, ops::Range};

/// A value together with the number of bits it is known to fit in
#[derive(Clone, Copy, Debug)]
pub struct RangeConstrained<F: FieldExt, T: Clone> {
	inner: T,
	num_bits: usize,
	_phantom: PhantomData<F>,
}

impl<F: FieldExt, T: Clone> RangeConstrained<F, T> {
	/// Returns the range-constrained inner type.
	pub fn inner(&self) -> &T {
		&self.inner
	}

	/// Returns the number of bits to which this cell is constrained.
	pub fn num_bits(&self) -> usize {
		self.num_bits
	}
}

impl<F: FieldExt> RangeConstrained<F, Value<F>> {
	/// Extracts the range-constrained value at the given bit range.
	pub fn bitrange_of(value: Value<&F>, bitrange: Range<usize>) -> Self {
		let num_bits = bitrange.len();
		Self {
			inner: value.map(|value| bitrange_subset(value, bitrange)),
			num_bits,
			_phantom: PhantomData,
		}
	}
}

impl<F: FieldExt> RangeConstrained<F, AssignedCell<F, F>> {
	/// Witnesses the bits of `value` in `bitrange` and constrains them to be
	/// exactly that many bits.
	pub fn witness_short<const K: usize>(
		lookup_config: &LookupRangeCheckConfig<F, K>, layouter: impl Layouter<F>,
		value: Value<&F>, bitrange: Range<usize>,
	) -> Result<Self, Error> {
		let num_bits = bitrange.len();
		assert!(num_bits < K, "Bit range of {} bits is too long for a short check", num_bits);

		let subset = value.map(|value| bitrange_subset(value, bitrange));
		lookup_config
			.witness_short_check(layouter, subset, num_bits)
			.map(|inner| Self { inner, num_bits, _phantom: PhantomData })
	}

	/// Wraps a cell without constraining it. The caller must prove the width
	/// some other way.
	pub fn unsound_unchecked(cell: AssignedCell<F, F>, num_bits: usize) -> Self {
		Self { inner: cell, num_bits, _phantom: PhantomData }
	}

	/// Value of the cell, with the same bit width.
	pub fn value(&self) -> RangeConstrained<F, Value<F>> {
		RangeConstrained {
			inner: self.inner.value().copied(),
			num_bits: self.num_bits,
			_phantom: PhantomData,
		}
	}
}

/// Configuration of the lookup range check
#[derive(Clone, Copy, Debug)]
pub struct LookupRangeCheckConfig<F: FieldExt, const K: usize> {
	q_lookup: Selector,
	q_running: Selector,
	q_bitshift: Selector,
	running_sum: Column<Advice>,
	table_idx: TableColumn,
	_marker: PhantomData<F>,
}

impl<F: FieldExt, const K: usize> LookupRangeCheckConfig<F, K> {
	/// Registers the combined lookup and the bitshift gate. The running sum
	/// lives in the first advice column.
	pub fn configure(common: &CommonConfig, meta: &mut ConstraintSystem<F>) -> Self {
		let q_lookup = meta.complex_selector();
		let q_running = meta.complex_selector();
		let q_bitshift = meta.selector();
		let running_sum = common.advice[0];
		let table_idx = common.table;

		meta.lookup("lookup range check", |meta| {
			let q_lookup = meta.query_selector(q_lookup);
			let q_running = meta.query_selector(q_running);
			let z_cur = meta.query_advice(running_sum, Rotation::cur());

			// Running sum: z_i = 2^K * z_{i + 1} + a_i => a_i = z_i - 2^K * z_{i + 1}
			let running_sum_lookup = {
				let z_next = meta.query_advice(running_sum, Rotation::next());
				let running_sum_word = z_cur.clone() - z_next * F::from(1 << K);
				q_running.clone() * running_sum_word
			};

			// Short lookup: the word is witnessed directly
			let short_lookup = {
				let q_short = Expression::Constant(F::ONE) - q_running;
				q_short * z_cur
			};

			vec![(q_lookup * (running_sum_lookup + short_lookup), table_idx)]
		});

		meta.create_gate("Short lookup bitshift", |meta| {
			let q_bitshift = meta.query_selector(q_bitshift);
			let word = meta.query_advice(running_sum, Rotation::prev());
			let shifted_word = meta.query_advice(running_sum, Rotation::cur());
			let inv_two_pow_s = meta.query_advice(running_sum, Rotation::next());

			// shifted_word = word * 2^(K - s) = word * 2^K * inv_two_pow_s
			let two_pow_k = F::from(1 << K);
			Constraints::with_selector(
				q_bitshift,
				Some(word * two_pow_k * inv_two_pow_s - shifted_word),
			)
		});
		log::debug!("configured lookup range check with a {}-bit table", K);

		Self {
			q_lookup,
			q_running,
			q_bitshift,
			running_sum,
			table_idx,
			_marker: PhantomData,
		}
	}

	/// Fills the table with `[0, 2^K)`. Must run once, before any check.
	pub fn load(&self, layouter: &mut impl Layouter<F>) -> Result<(), Error> {
		layouter.assign_table(
			|| "table_idx",
			|mut table| {
				for index in 0..(1 << K) {
					table.assign_cell(
						|| "table_idx",
						self.table_idx,
						index,
						|| Value::known(F::from(index as u64)),
					)?;
				}
				Ok(())
			},
		)?;
		log::debug!("loaded {} lookup table rows", 1 << K);
		Ok(())
	}

	/// Range checks the low `num_words * K` bits of a copied cell. Strict
	/// mode also proves the cell has no higher bits.
	pub fn copy_check(
		&self, mut layouter: impl Layouter<F>, element: AssignedCell<F, F>, num_words: usize,
		strict: bool,
	) -> Result<RunningSum<F>, Error> {
		Self::check_capacity(num_words);
		layouter.assign_region(
			|| format!("{} words range check", num_words),
			|region| {
				let mut ctx = RegionCtx::new(region, 0);
				let z_0 = ctx.copy_assign(self.running_sum, element.clone())?;
				self.range_check(&mut ctx, z_0, num_words, strict)
			},
		)
	}

	/// Witnesses `value` and range checks it like [`Self::copy_check`].
	pub fn witness_check(
		&self, mut layouter: impl Layouter<F>, value: Value<F>, num_words: usize, strict: bool,
	) -> Result<RunningSum<F>, Error> {
		Self::check_capacity(num_words);
		layouter.assign_region(
			|| "Witness element",
			|region| {
				let mut ctx = RegionCtx::new(region, 0);
				let z_0 = ctx.assign_advice(self.running_sum, value)?;
				self.range_check(&mut ctx, z_0, num_words, strict)
			},
		)
	}

	fn check_capacity(num_words: usize) {
		assert!(
			num_words * K <= F::CAPACITY as usize,
			"{} words of {} bits exceed the field capacity",
			num_words,
			K
		);
	}

	/// `element` must be assigned to `self.running_sum` at the current row.
	fn range_check(
		&self, ctx: &mut RegionCtx<'_, F>, element: AssignedCell<F, F>, num_words: usize,
		strict: bool,
	) -> Result<RunningSum<F>, Error> {
		let words: Vec<Value<F>> = element
			.value()
			.map(|element| {
				fe_to_le_bits(element)
					.chunks(K)
					.take(num_words)
					.map(|chunk| F::from(lebs2ip(chunk)))
					.collect::<Vec<_>>()
			})
			.transpose_vec(num_words);

		let inv_two_pow_k = Value::known(inverse(F::from(1 << K))?);

		let mut zs = vec![element.clone()];
		let mut z = element;
		for word in words {
			ctx.enable(self.q_lookup)?;
			ctx.enable(self.q_running)?;

			// z_next = (z_cur - word) / 2^K
			let z_next = (z.value().copied() - word) * inv_two_pow_k;
			ctx.next();
			z = ctx.assign_advice(self.running_sum, z_next)?;
			zs.push(z.clone());
		}

		if strict {
			ctx.constrain_to_constant(z, F::ZERO)?;
		}
		log::trace!("range checked {} words of {} bits, strict: {}", num_words, K, strict);

		Ok(RunningSum::new(zs))
	}

	/// Constrains a copied cell to fit in exactly `num_bits < K` bits.
	pub fn copy_short_check(
		&self, mut layouter: impl Layouter<F>, element: AssignedCell<F, F>, num_bits: usize,
	) -> Result<(), Error> {
		Self::check_short(num_bits);
		layouter.assign_region(
			|| format!("Range check {} bits", num_bits),
			|region| {
				let mut ctx = RegionCtx::new(region, 0);
				let element = ctx.copy_assign(self.running_sum, element.clone())?;
				self.short_range_check(&mut ctx, element, num_bits)
			},
		)
	}

	/// Witnesses `element` and constrains it to fit in exactly `num_bits < K`
	/// bits.
	pub fn witness_short_check(
		&self, mut layouter: impl Layouter<F>, element: Value<F>, num_bits: usize,
	) -> Result<AssignedCell<F, F>, Error> {
		Self::check_short(num_bits);
		layouter.assign_region(
			|| format!("Range check {} bits", num_bits),
			|region| {
				let mut ctx = RegionCtx::new(region, 0);
				let element = ctx.assign_advice(self.running_sum, element)?;
				self.short_range_check(&mut ctx, element.clone(), num_bits)?;
				Ok(element)
			},
		)
	}

	fn check_short(num_bits: usize) {
		assert!(num_bits < K, "Short check of {} bits needs a table wider than {}", num_bits, K);
	}

	/// `element` must be assigned to `self.running_sum` at the current row.
	fn short_range_check(
		&self, ctx: &mut RegionCtx<'_, F>, element: AssignedCell<F, F>, num_bits: usize,
	) -> Result<(), Error> {
		// Witness layout:
		// | running_sum     | q_lookup | q_bitshift |
		// | --------------- | -------- | ---------- |
		// | element         | 1        | 0          |
		// | shifted         | 1        | 1          |
		// | inv_two_pow_s   | 0        | 0          |
		ctx.enable(self.q_lookup)?;

		ctx.next();
		ctx.enable(self.q_lookup)?;
		ctx.enable(self.q_bitshift)?;
		let shift = F::from(1 << (K - num_bits));
		ctx.assign_advice(self.running_sum, element.value().map(|element| *element * shift))?;

		ctx.next();
		let inv_two_pow_s = inverse(F::from(1 << num_bits))?;
		ctx.assign_from_constant(self.running_sum, inv_two_pow_s)?;

		Ok(())
	}
}
