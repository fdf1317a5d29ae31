/// Native implementation
pub mod native;
/// Sponge and fixed-length hash gadgets
pub mod sponge;

use crate::{
	params::{check_rounds, Mds, Sbox, Spec},
	Chipset, CommonConfig, FieldExt, RegionCtx, ADVICE, FIXED,
};
use halo2::{
	circuit::{AssignedCell, Layouter, Value},
	plonk::{ConstraintSystem, Error, Expression, Selector},
	poly::Rotation,
};
use native::{is_partial_round, round_trace};
use std::marker::PhantomData;

/// Selectors and constants for the permutation gates
#[derive(Clone, Debug)]
pub struct PoseidonConfig<F: FieldExt, const T: usize> {
	full_round_selector: Selector,
	partial_round_selector: Selector,
	round_constants: Vec<[F; T]>,
	mds: Mds<F, T>,
}

/// Registers a round gate over the first `T` advice columns. The round
/// constants are read from the fixed columns of the same row and the MDS
/// matrix is part of the polynomial.
fn round_gate<F: FieldExt, S: Sbox, const T: usize>(
	common: &CommonConfig, meta: &mut ConstraintSystem<F>, name: &'static str, selector: Selector,
	mds: Mds<F, T>, partial: bool,
) {
	meta.create_gate(name, |v_cells| {
		let s = v_cells.query_selector(selector);

		// Add round constants
		let mut exprs: [Expression<F>; T] = std::array::from_fn(|i| {
			let state = v_cells.query_advice(common.advice[i], Rotation::cur());
			let round_constant = v_cells.query_fixed(common.fixed[i], Rotation::cur());
			state + round_constant
		});

		if partial {
			exprs[0] = S::sbox_expr(exprs[0].clone());
		} else {
			exprs = exprs.map(|exp| S::sbox_expr(exp));
		}

		// It should be equal to the state in next row after the MDS mix
		let mut constraints = Vec::with_capacity(T);
		for i in 0..T {
			let mixed = (0..T).fold(Expression::Constant(F::ZERO), |acc, j| {
				acc + exprs[j].clone() * mds[i][j]
			});
			let next_state = v_cells.query_advice(common.advice[i], Rotation::next());
			constraints.push(s.clone() * (mixed - next_state));
		}
		constraints
	});
}

/// Constrains the Poseidon permutation of `T` assigned cells
#[derive(Clone, Debug)]
pub struct PoseidonChipset<F: FieldExt, S, const T: usize, const RATE: usize>
where
	S: Spec<F, T, RATE>,
{
	inputs: [AssignedCell<F, F>; T],
	_params: PhantomData<S>,
}

impl<F: FieldExt, S, const T: usize, const RATE: usize> PoseidonChipset<F, S, T, RATE>
where
	S: Spec<F, T, RATE>,
{
	/// Create a new chipset.
	pub fn new(inputs: [AssignedCell<F, F>; T]) -> Self {
		Self { inputs, _params: PhantomData }
	}

	/// Configures the full and partial round gates. The round constants and
	/// the MDS matrix are derived here, once.
	pub fn configure(common: &CommonConfig, meta: &mut ConstraintSystem<F>) -> PoseidonConfig<F, T> {
		assert!(
			T <= ADVICE && T <= FIXED,
			"State width {} exceeds the common column pool",
			T
		);

		check_rounds::<F, S, T, RATE>();

		let (round_constants, mds, _) = S::constants();
		let full_round_selector = meta.selector();
		let partial_round_selector = meta.selector();

		round_gate::<F, S, T>(common, meta, "full_round", full_round_selector, mds, false);
		round_gate::<F, S, T>(common, meta, "partial_round", partial_round_selector, mds, true);
		log::debug!("configured poseidon gates for width {}", T);

		PoseidonConfig { full_round_selector, partial_round_selector, round_constants, mds }
	}
}

impl<F: FieldExt, S, const T: usize, const RATE: usize> Chipset<F>
	for PoseidonChipset<F, S, T, RATE>
where
	S: Spec<F, T, RATE>,
{
	type Config = PoseidonConfig<F, T>;
	type Output = [AssignedCell<F, F>; T];

	fn synthesize(
		self, common: &CommonConfig, config: &PoseidonConfig<F, T>, mut layouter: impl Layouter<F>,
	) -> Result<Self::Output, Error> {
		let full_rounds = S::full_rounds();
		let partial_rounds = S::partial_rounds();

		// Compute every intermediate state off-circuit first
		let inputs: Value<Vec<F>> = self.inputs.iter().map(|cell| cell.value().copied()).collect();
		let trace = inputs.map(|inputs| {
			let mut state = [F::ZERO; T];
			state.copy_from_slice(&inputs);
			round_trace::<F, S, T, RATE>(state, &config.mds, &config.round_constants)
		});

		layouter.assign_region(
			|| "permute",
			|region| {
				let mut ctx = RegionCtx::new(region, 0);

				let mut state = Vec::with_capacity(T);
				for (i, cell) in self.inputs.iter().enumerate() {
					state.push(ctx.copy_assign(common.advice[i], cell.clone())?);
				}

				for (round, round_constants) in config.round_constants.iter().enumerate() {
					let selector = if is_partial_round(round, full_rounds, partial_rounds) {
						config.partial_round_selector
					} else {
						config.full_round_selector
					};
					ctx.enable(selector)?;
					for i in 0..T {
						ctx.assign_fixed(common.fixed[i], round_constants[i])?;
					}

					ctx.next();
					state.clear();
					for i in 0..T {
						let value = trace.as_ref().map(|trace| trace[round + 1][i]);
						state.push(ctx.assign_advice(common.advice[i], value)?);
					}
				}

				state.try_into().map_err(|_| Error::Synthesis)
			},
		)
	}
}

#[cfg(test)]
mod test {
	use super::{PoseidonChipset, PoseidonConfig};
	use crate::{
		params::{hasher::poseidon_bn254_3x2::Params, hex_to_field, Spec},
		poseidon::native::{
			permute,
			test::{OddRoundsSpec, ToySpec},
		},
		utils::{generate_params, prove_and_verify},
		Chipset, CommonConfig, RegionCtx,
	};
	use halo2::{
		circuit::{Layouter, SimpleFloorPlanner, Value},
		dev::MockProver,
		halo2curves::bn256::Fr,
		plonk::{Circuit, ConstraintSystem, Error},
	};
	use rand::thread_rng;
	use std::marker::PhantomData;

	#[derive(Clone)]
	struct PoseidonTesterConfig {
		common: CommonConfig,
		poseidon: PoseidonConfig<Fr, 3>,
	}

	#[derive(Clone)]
	struct PoseidonTester<S: Spec<Fr, 3, 2>> {
		inputs: [Value<Fr>; 3],
		_params: PhantomData<S>,
	}

	impl<S: Spec<Fr, 3, 2>> PoseidonTester<S> {
		fn new(inputs: [Fr; 3]) -> Self {
			Self { inputs: inputs.map(Value::known), _params: PhantomData }
		}
	}

	impl<S: Spec<Fr, 3, 2> + Clone> Circuit<Fr> for PoseidonTester<S> {
		type Config = PoseidonTesterConfig;
		type FloorPlanner = SimpleFloorPlanner;

		fn without_witnesses(&self) -> Self {
			Self { inputs: [Value::unknown(); 3], _params: PhantomData }
		}

		fn configure(meta: &mut ConstraintSystem<Fr>) -> PoseidonTesterConfig {
			let common = CommonConfig::new(meta);
			let poseidon = PoseidonChipset::<Fr, S, 3, 2>::configure(&common, meta);
			PoseidonTesterConfig { common, poseidon }
		}

		fn synthesize(
			&self, config: PoseidonTesterConfig, mut layouter: impl Layouter<Fr>,
		) -> Result<(), Error> {
			let inputs = layouter.assign_region(
				|| "load_state",
				|region| {
					let mut ctx = RegionCtx::new(region, 0);
					let mut cells = Vec::new();
					for i in 0..3 {
						cells.push(ctx.assign_advice(config.common.advice[i], self.inputs[i])?);
					}
					Ok(cells)
				},
			)?;

			let inputs: [_; 3] = inputs.try_into().map_err(|_| Error::Synthesis)?;
			let poseidon = PoseidonChipset::<Fr, S, 3, 2>::new(inputs);
			let result_state = poseidon.synthesize(
				&config.common,
				&config.poseidon,
				layouter.namespace(|| "poseidon"),
			)?;
			for i in 0..3 {
				layouter.constrain_instance(result_state[i].cell(), config.common.instance, i)?;
			}
			Ok(())
		}
	}

	#[test]
	fn test_poseidon_x5_3() {
		let _ = env_logger::builder().is_test(true).try_init();
		let inputs: [Fr; 3] = [0, 1, 2].map(Fr::from);

		let outputs: [Fr; 3] = [
			"0x115cc0f5e7d690413df64c6b9662e9cf2a3617f2743245519e19607a4417189a",
			"0x0fca49b798923ab0239de1c9e7a4a9a2210312b6a2f616d18b5a87f9b628ae29",
			"0x0e7ae82e40091e63cbd4f16a6d16310b3729d4b6e138fcf54110e2867045a30c",
		]
		.map(|n| hex_to_field(n));

		let poseidon_tester = PoseidonTester::<Params>::new(inputs);

		let k = 8;
		let prover = MockProver::run(k, &poseidon_tester, vec![outputs.to_vec()]).unwrap();
		assert_eq!(prover.verify(), Ok(()));
	}

	#[test]
	fn test_poseidon_toy_spec() {
		let inputs = [1, 2, 0].map(Fr::from);
		let (round_constants, mds, _) = ToySpec::constants();
		let mut outputs = inputs;
		permute::<_, ToySpec, 3, 2>(&mut outputs, &mds, &round_constants);

		let poseidon_tester = PoseidonTester::<ToySpec>::new(inputs);

		let k = 5;
		let prover = MockProver::run(k, &poseidon_tester, vec![outputs.to_vec()]).unwrap();
		assert_eq!(prover.verify(), Ok(()));

		// Any other output is rejected
		outputs[2] += Fr::from(1);
		let prover = MockProver::run(k, &poseidon_tester, vec![outputs.to_vec()]).unwrap();
		assert!(prover.verify().is_err());
	}

	#[test]
	#[should_panic(expected = "Number of full rounds must be even")]
	fn test_poseidon_odd_full_rounds() {
		let mut meta = ConstraintSystem::<Fr>::default();
		let common = CommonConfig::new(&mut meta);
		let _ = PoseidonChipset::<Fr, OddRoundsSpec, 3, 2>::configure(&common, &mut meta);
	}

	#[test]
	fn test_poseidon_x5_3_production() {
		let inputs = [0, 1, 2].map(Fr::from);
		let (round_constants, mds, _) = Params::constants();
		let mut outputs = inputs;
		permute::<_, Params, 3, 2>(&mut outputs, &mds, &round_constants);

		let poseidon_tester = PoseidonTester::<Params>::new(inputs);

		let k = 8;
		let rng = &mut thread_rng();
		let params = generate_params(k);
		let res = prove_and_verify(params, poseidon_tester, &[&outputs[..]], rng).unwrap();

		assert!(res);
	}
}
