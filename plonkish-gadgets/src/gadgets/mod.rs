/// Conditional swap of a pair of cells
pub mod cond_swap;
/// Range checks using a lookup table
pub mod lookup_range_check;
/// Running sum decomposition into small windows
pub mod running_sum;

use crate::{FieldExt, RegionCtx};
use halo2::{
	circuit::{AssignedCell, Layouter, Value},
	plonk::{Advice, Column, Error},
};

/// Witnesses a free value in `column`.
pub fn load_private<F: FieldExt>(
	mut layouter: impl Layouter<F>, column: Column<Advice>, value: Value<F>,
) -> Result<AssignedCell<F, F>, Error> {
	layouter.assign_region(
		|| "load private",
		|region| {
			let mut ctx = RegionCtx::new(region, 0);
			ctx.assign_advice(column, value)
		},
	)
}
