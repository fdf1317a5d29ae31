//! PLONKish gadgets: Poseidon hashing, running-sum decomposition, lookup range
//! checks and conditional swap, built on top of halo2.

// Rustc
#![warn(trivial_casts)]
#![deny(
	absolute_paths_not_starting_with_crate, deprecated, future_incompatible, missing_docs,
	nonstandard_style, unreachable_code, unreachable_patterns
)]
#![forbid(unsafe_code)]
// Clippy
#![allow(clippy::tabs_in_doc_comments, clippy::needless_range_loop, clippy::new_without_default)]
#![deny(
	// Complexity
	clippy::unnecessary_cast,
	clippy::needless_question_mark,
	clippy::clone_on_copy,
	// Pedantic
	clippy::cast_lossless,
	clippy::cast_possible_wrap,
	// Perf
	clippy::redundant_clone,
	// Restriction
	clippy::panic,
	// Style
	clippy::let_and_return,
	clippy::needless_borrow
)]

use halo2::{
	circuit::{AssignedCell, Layouter, Region, Value},
	halo2curves::{
		bn256::{Fq as BnBase, Fr as BnScalar},
		ff::{FromUniformBytes, PrimeField},
		pasta::{Fp as PallasBase, Fq as VestaBase},
		secp256k1::{Fp as SecpBase, Fq as SecpScalar},
	},
	plonk::{Advice, Column, ConstraintSystem, Error, Fixed, Instance, Selector, TableColumn},
};

pub use halo2;

/// Error types shared by the gadgets
pub mod error;
/// Range checks, decompositions and the conditional swap
pub mod gadgets;
/// Poseidon parameters: round counts, S-box, round constants and MDS matrices
pub mod params;
/// Poseidon hash function gadgets + native version
pub mod poseidon;
/// Bit helpers, gate expressions and utilities for proving and verifying
pub mod utils;

/// Extention to the traits provided by halo2
pub trait FieldExt: PrimeField + FromUniformBytes<64> {}
impl FieldExt for BnBase {}
impl FieldExt for BnScalar {}
impl FieldExt for SecpBase {}
impl FieldExt for SecpScalar {}
impl FieldExt for PallasBase {}
impl FieldExt for VestaBase {}

/// Hasher trait
pub trait Hasher<F: FieldExt, const WIDTH: usize> {
	/// Creates a new hasher
	fn new(inputs: [F; WIDTH]) -> Self;
	/// Finalize the hasher
	fn finalize(&self) -> [F; WIDTH];
}

#[derive(Debug)]
/// Region Context struct for managing region assignments
pub struct RegionCtx<'a, F: FieldExt> {
	/// Region struct
	region: Region<'a, F>,
	/// Current row offset
	offset: usize,
}

impl<'a, F: FieldExt> RegionCtx<'a, F> {
	/// Construct new Region Context
	pub fn new(region: Region<'a, F>, offset: usize) -> RegionCtx<'a, F> {
		RegionCtx { region, offset }
	}

	/// Return current row offset
	pub fn offset(&self) -> usize {
		self.offset
	}

	/// Assign value to a fixed column
	pub fn assign_fixed(
		&mut self, column: Column<Fixed>, value: F,
	) -> Result<AssignedCell<F, F>, Error> {
		self.region.assign_fixed(
			|| format!("fixed_{}", self.offset),
			column,
			self.offset,
			|| Value::known(value),
		)
	}

	/// Assign a constant to an advice column, fixing it through the
	/// constant-enabled fixed columns
	pub fn assign_from_constant(
		&mut self, advice: Column<Advice>, constant: F,
	) -> Result<AssignedCell<F, F>, Error> {
		self.region.assign_advice_from_constant(
			|| format!("advice_{}", self.offset),
			advice,
			self.offset,
			constant,
		)
	}

	/// Assign value to an advice column
	pub fn assign_advice(
		&mut self, column: Column<Advice>, value: Value<F>,
	) -> Result<AssignedCell<F, F>, Error> {
		self.region.assign_advice(
			|| format!("advice_{}", self.offset),
			column,
			self.offset,
			|| value,
		)
	}

	/// Copy value from passed assigned cell into an advice column
	pub fn copy_assign(
		&mut self, column: Column<Advice>, value: AssignedCell<F, F>,
	) -> Result<AssignedCell<F, F>, Error> {
		value.copy_advice(
			|| format!("advice_{}", self.offset),
			&mut self.region,
			column,
			self.offset,
		)
	}

	/// Constrain a cell to be equal to a constant
	pub fn constrain_to_constant(
		&mut self, a_cell: AssignedCell<F, F>, constant: F,
	) -> Result<(), Error> {
		self.region.constrain_constant(a_cell.cell(), constant)
	}

	/// Enable selector at the current row offset
	pub fn enable(&mut self, selector: Selector) -> Result<(), Error> {
		selector.enable(&mut self.region, self.offset)
	}

	/// Increment the row offset
	pub fn next(&mut self) {
		self.offset += 1
	}
}

/// Number of advice columns in common config
pub const ADVICE: usize = 5;
/// Number of fixed columns in common config
pub const FIXED: usize = 5;

/// Common config for the whole circuit
#[derive(Clone, Debug)]
pub struct CommonConfig {
	/// Advice columns
	advice: [Column<Advice>; ADVICE],
	/// Fixed columns
	fixed: [Column<Fixed>; FIXED],
	/// Table column
	table: TableColumn,
	/// Instance column
	instance: Column<Instance>,
}

impl CommonConfig {
	/// Create a new `CommonConfig` columns
	pub fn new<F: FieldExt>(meta: &mut ConstraintSystem<F>) -> Self {
		let advice = [(); ADVICE].map(|_| meta.advice_column());
		let fixed = [(); FIXED].map(|_| meta.fixed_column());
		let table = meta.lookup_table_column();
		let instance = meta.instance_column();

		advice.map(|c| meta.enable_equality(c));
		fixed.map(|c| meta.enable_constant(c));
		meta.enable_equality(instance);

		Self { advice, fixed, table, instance }
	}
}

/// Trait for an atomic chip implementation
/// Each chip uses common config columns, but has its own selector
pub trait Chip<F: FieldExt> {
	/// Output of the synthesis
	type Output: Clone;
	/// Gate configuration, using common config columns
	fn configure(common: &CommonConfig, meta: &mut ConstraintSystem<F>) -> Selector;
	/// Chip synthesis. This function can return an assigned cell to be used
	/// elsewhere in the circuit
	fn synthesize(
		self, common: &CommonConfig, selector: &Selector, layouter: impl Layouter<F>,
	) -> Result<Self::Output, Error>;
}

/// Chipset uses a collection of chips as primitives to build more abstract
/// circuits
pub trait Chipset<F: FieldExt> {
	/// Config used for synthesis
	type Config: Clone;
	/// Output of the synthesis
	type Output: Clone;
	/// Chipset synthesis. This function can have multiple smaller chips
	/// synthesised inside. Also can returns an assigned cell.
	fn synthesize(
		self, common: &CommonConfig, config: &Self::Config, layouter: impl Layouter<F>,
	) -> Result<Self::Output, Error>;
}
