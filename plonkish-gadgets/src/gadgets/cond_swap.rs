use crate::{
	utils::{bool_check, ternary},
	Chip, CommonConfig, FieldExt, RegionCtx,
};
use halo2::{
	circuit::{AssignedCell, Layouter, Value},
	plonk::{ConstraintSystem, Constraints, Error, Selector},
	poly::Rotation,
};

/// Swaps `(a, b)` into `(b, a)` when `swap` is set
#[derive(Clone, Debug)]
pub struct CondSwapChip<F: FieldExt> {
	a: AssignedCell<F, F>,
	b: Value<F>,
	swap: Value<bool>,
}

impl<F: FieldExt> CondSwapChip<F> {
	/// Create a new chip.
	pub fn new(a: AssignedCell<F, F>, b: Value<F>, swap: Value<bool>) -> Self {
		Self { a, b, swap }
	}

	/// Assigns the pair in its new order. `b` and `swap` are witnessed here.
	pub fn swap(
		&self, common: &CommonConfig, selector: &Selector, mut layouter: impl Layouter<F>,
	) -> Result<(AssignedCell<F, F>, AssignedCell<F, F>), Error> {
		// Witness layout:
		// | A   | B   | C         | D         | E    |
		// | --- | --- | --------- | --------- | ---- |
		// | a   | b   | a_swapped | b_swapped | swap |
		layouter.assign_region(
			|| "swap",
			|region| {
				let mut ctx = RegionCtx::new(region, 0);
				ctx.enable(*selector)?;

				let a = ctx.copy_assign(common.advice[0], self.a.clone())?;
				let b = ctx.assign_advice(common.advice[1], self.b)?;

				let swap_value = self.swap.map(|swap| F::from(u64::from(swap)));
				ctx.assign_advice(common.advice[4], swap_value)?;

				let (a_swapped, b_swapped) = a
					.value()
					.zip(b.value())
					.zip(self.swap)
					.map(|((a, b), swap)| if swap { (*b, *a) } else { (*a, *b) })
					.unzip();

				let a_swapped = ctx.assign_advice(common.advice[2], a_swapped)?;
				let b_swapped = ctx.assign_advice(common.advice[3], b_swapped)?;

				Ok((a_swapped, b_swapped))
			},
		)
	}
}

impl<F: FieldExt> Chip<F> for CondSwapChip<F> {
	type Output = (AssignedCell<F, F>, AssignedCell<F, F>);

	fn configure(common: &CommonConfig, meta: &mut ConstraintSystem<F>) -> Selector {
		let selector = meta.selector();

		// a' = b * swap + a * (1 - swap)
		// b' = a * swap + b * (1 - swap)
		meta.create_gate("cond swap", |v_cells| {
			let q_swap = v_cells.query_selector(selector);

			let a = v_cells.query_advice(common.advice[0], Rotation::cur());
			let b = v_cells.query_advice(common.advice[1], Rotation::cur());
			let a_swapped = v_cells.query_advice(common.advice[2], Rotation::cur());
			let b_swapped = v_cells.query_advice(common.advice[3], Rotation::cur());
			let swap = v_cells.query_advice(common.advice[4], Rotation::cur());

			let a_check = a_swapped - ternary(swap.clone(), b.clone(), a.clone());
			let b_check = b_swapped - ternary(swap.clone(), a, b);
			let bool_check = bool_check(swap);

			Constraints::with_selector(
				q_swap,
				[("a check", a_check), ("b check", b_check), ("swap is bool", bool_check)],
			)
		});

		selector
	}

	fn synthesize(
		self, common: &CommonConfig, selector: &Selector, layouter: impl Layouter<F>,
	) -> Result<Self::Output, Error> {
		self.swap(common, selector, layouter)
	}
}

#[cfg(test)]
mod test {
	use super::CondSwapChip;
	use crate::{gadgets::load_private, Chip, CommonConfig, RegionCtx};
	use halo2::{
		circuit::{Layouter, SimpleFloorPlanner, Value},
		dev::MockProver,
		halo2curves::{bn256::Fr, ff::Field},
		plonk::{Circuit, ConstraintSystem, Error, Selector},
	};
	use rand::thread_rng;

	#[derive(Clone)]
	struct TestConfig {
		common: CommonConfig,
		swap_selector: Selector,
	}

	#[derive(Clone)]
	struct TestCircuit {
		a: Value<Fr>,
		b: Value<Fr>,
		swap: Value<bool>,
	}

	impl TestCircuit {
		fn new(a: Fr, b: Fr, swap: bool) -> Self {
			Self { a: Value::known(a), b: Value::known(b), swap: Value::known(swap) }
		}
	}

	impl Circuit<Fr> for TestCircuit {
		type Config = TestConfig;
		type FloorPlanner = SimpleFloorPlanner;

		fn without_witnesses(&self) -> Self {
			Self { a: Value::unknown(), b: Value::unknown(), swap: Value::unknown() }
		}

		fn configure(meta: &mut ConstraintSystem<Fr>) -> TestConfig {
			let common = CommonConfig::new(meta);
			let swap_selector = CondSwapChip::configure(&common, meta);
			TestConfig { common, swap_selector }
		}

		fn synthesize(
			&self, config: TestConfig, mut layouter: impl Layouter<Fr>,
		) -> Result<(), Error> {
			let a = load_private(layouter.namespace(|| "load a"), config.common.advice[0], self.a)?;

			let chip = CondSwapChip::new(a, self.b, self.swap);
			let (a_swapped, b_swapped) = chip.synthesize(
				&config.common,
				&config.swap_selector,
				layouter.namespace(|| "swap"),
			)?;

			layouter.constrain_instance(a_swapped.cell(), config.common.instance, 0)?;
			layouter.constrain_instance(b_swapped.cell(), config.common.instance, 1)?;
			Ok(())
		}
	}

	/// Lays out the swap row by hand, with a field element as the flag.
	#[derive(Clone)]
	struct RawSwapCircuit {
		row: [Fr; 5],
	}

	impl Circuit<Fr> for RawSwapCircuit {
		type Config = TestConfig;
		type FloorPlanner = SimpleFloorPlanner;

		fn without_witnesses(&self) -> Self {
			self.clone()
		}

		fn configure(meta: &mut ConstraintSystem<Fr>) -> TestConfig {
			let common = CommonConfig::new(meta);
			let swap_selector = CondSwapChip::configure(&common, meta);
			TestConfig { common, swap_selector }
		}

		fn synthesize(
			&self, config: TestConfig, mut layouter: impl Layouter<Fr>,
		) -> Result<(), Error> {
			layouter.assign_region(
				|| "raw swap",
				|region| {
					let mut ctx = RegionCtx::new(region, 0);
					ctx.enable(config.swap_selector)?;
					for (i, value) in self.row.iter().enumerate() {
						ctx.assign_advice(config.common.advice[i], Value::known(*value))?;
					}
					Ok(())
				},
			)
		}
	}

	#[test]
	fn test_cond_swap() {
		let rng = &mut thread_rng();
		let a = Fr::random(&mut *rng);
		let b = Fr::random(&mut *rng);

		let circuit = TestCircuit::new(a, b, false);
		let prover = MockProver::run(5, &circuit, vec![vec![a, b]]).unwrap();
		assert_eq!(prover.verify(), Ok(()));

		let circuit = TestCircuit::new(a, b, true);
		let prover = MockProver::run(5, &circuit, vec![vec![b, a]]).unwrap();
		assert_eq!(prover.verify(), Ok(()));

		// The swapped pair does not match the unswapped output
		let prover = MockProver::run(5, &circuit, vec![vec![a, b]]).unwrap();
		assert!(prover.verify().is_err());
	}

	#[test]
	fn test_swap_not_bool() {
		let a = Fr::from(3);
		let b = Fr::from(5);

		let valid = RawSwapCircuit { row: [a, b, b, a, Fr::ONE] };
		let prover = MockProver::run(5, &valid, vec![vec![]]).unwrap();
		assert_eq!(prover.verify(), Ok(()));

		// swap = 2 with the pair left as is
		let two = Fr::from(2);
		let invalid = RawSwapCircuit { row: [a, b, a, b, two] };
		let prover = MockProver::run(5, &invalid, vec![vec![]]).unwrap();
		assert!(prover.verify().is_err());

		// a' and b' consistent with the ternary, still not boolean
		let a_swapped = two * b + (Fr::ONE - two) * a;
		let b_swapped = two * a + (Fr::ONE - two) * b;
		let invalid = RawSwapCircuit { row: [a, b, a_swapped, b_swapped, two] };
		let prover = MockProver::run(5, &invalid, vec![vec![]]).unwrap();
		assert!(prover.verify().is_err());
	}
}
