use super::{
	native::{
		hash::Domain,
		sponge::{Absorbing, SpongeMode, Squeezing},
	},
	PoseidonChipset, PoseidonConfig,
};
use crate::{params::Spec, Chip, Chipset, CommonConfig, FieldExt, RegionCtx};
use halo2::{
	circuit::{AssignedCell, Layouter},
	plonk::{ConstraintSystem, Error, Selector},
	poly::Rotation,
};
use std::marker::PhantomData;

/// Absorbing mode of the in-circuit sponge
pub type AbsorbingCells<F, const RATE: usize> = Absorbing<AssignedCell<F, F>, RATE>;
/// Squeezing mode of the in-circuit sponge
pub type SqueezingCells<F, const RATE: usize> = Squeezing<AssignedCell<F, F>, RATE>;

/// Adds a chunk of words into the sponge state
#[derive(Clone, Debug)]
pub struct AbsorbChip<F: FieldExt, const T: usize, const RATE: usize> {
	prev_state: [AssignedCell<F, F>; T],
	inputs: [Option<AssignedCell<F, F>>; RATE],
}

impl<F: FieldExt, const T: usize, const RATE: usize> AbsorbChip<F, T, RATE> {
	/// Create a new chip. Empty input slots are absorbed as zero.
	pub fn new(
		prev_state: [AssignedCell<F, F>; T], inputs: [Option<AssignedCell<F, F>>; RATE],
	) -> Self {
		Self { prev_state, inputs }
	}
}

impl<F: FieldExt, const T: usize, const RATE: usize> Chip<F> for AbsorbChip<F, T, RATE> {
	type Output = [AssignedCell<F, F>; T];

	fn configure(common: &CommonConfig, meta: &mut ConstraintSystem<F>) -> Selector {
		let selector = meta.selector();

		meta.create_gate("absorb", |v_cells| {
			let s = v_cells.query_selector(selector);
			(0..T)
				.map(|i| {
					let prev = v_cells.query_advice(common.advice[i], Rotation::cur());
					let input = v_cells.query_advice(common.advice[i], Rotation::next());
					let next = v_cells.query_advice(common.advice[i], Rotation(2));
					s.clone() * (prev + input - next)
				})
				.collect::<Vec<_>>()
		});

		selector
	}

	fn synthesize(
		self, common: &CommonConfig, selector: &Selector, mut layouter: impl Layouter<F>,
	) -> Result<Self::Output, Error> {
		// Witness layout (T = 3, RATE = 2):
		// | A      | B      | C      |
		// | ------ | ------ | ------ |
		// | prev_0 | prev_1 | prev_2 |
		// | in_0   | in_1   | 0      |
		// | next_0 | next_1 | next_2 |
		layouter.assign_region(
			|| "absorb",
			|region| {
				let mut ctx = RegionCtx::new(region, 0);
				ctx.enable(*selector)?;

				let mut prev = Vec::with_capacity(T);
				for (i, cell) in self.prev_state.iter().enumerate() {
					prev.push(ctx.copy_assign(common.advice[i], cell.clone())?);
				}

				ctx.next();
				let mut inputs = Vec::with_capacity(T);
				for i in 0..T {
					// Capacity words are never written to
					let cell = match self.inputs.get(i).cloned().flatten() {
						Some(cell) => ctx.copy_assign(common.advice[i], cell)?,
						None => ctx.assign_from_constant(common.advice[i], F::ZERO)?,
					};
					inputs.push(cell);
				}

				ctx.next();
				let mut next = Vec::with_capacity(T);
				for i in 0..T {
					let sum = prev[i].value().cloned() + inputs[i].value();
					next.push(ctx.assign_advice(common.advice[i], sum)?);
				}

				next.try_into().map_err(|_| Error::Synthesis)
			},
		)
	}
}

/// Selectors of the in-circuit sponge
#[derive(Clone, Debug)]
pub struct SpongeConfig<F: FieldExt, const T: usize> {
	poseidon: PoseidonConfig<F, T>,
	absorb_selector: Selector,
}

impl<F: FieldExt, const T: usize> SpongeConfig<F, T> {
	/// Initialization function for SpongeConfig
	pub fn new(poseidon: PoseidonConfig<F, T>, absorb_selector: Selector) -> Self {
		Self { poseidon, absorb_selector }
	}
}

/// Absorbs the pending words into the state (if any), permutes, and returns
/// the first `RATE` words of the new state for squeezing.
fn poseidon_sponge<F: FieldExt, S: Spec<F, T, RATE>, const T: usize, const RATE: usize>(
	common: &CommonConfig, config: &SpongeConfig<F, T>, mut layouter: impl Layouter<F>,
	state: &mut [AssignedCell<F, F>; T], input: Option<&AbsorbingCells<F, RATE>>,
) -> Result<SqueezingCells<F, RATE>, Error> {
	if let Some(Absorbing(input)) = input {
		let absorb_chip = AbsorbChip::<F, T, RATE>::new(state.clone(), input.clone());
		*state = absorb_chip.synthesize(
			common,
			&config.absorb_selector,
			layouter.namespace(|| "absorb"),
		)?;
	}

	let poseidon = PoseidonChipset::<F, S, T, RATE>::new(state.clone());
	*state = poseidon.synthesize(common, &config.poseidon, layouter.namespace(|| "permute"))?;

	Ok(Squeezing(std::array::from_fn(|i| Some(state[i].clone()))))
}

/// In-circuit Poseidon sponge. Like the native one, the mode is part of the
/// type.
#[derive(Clone, Debug)]
pub struct SpongeChipset<F: FieldExt, S, M, const T: usize, const RATE: usize>
where
	S: Spec<F, T, RATE>,
	M: SpongeMode,
{
	mode: M,
	state: [AssignedCell<F, F>; T],
	_params: PhantomData<S>,
}

impl<F: FieldExt, S, const T: usize, const RATE: usize>
	SpongeChipset<F, S, AbsorbingCells<F, RATE>, T, RATE>
where
	S: Spec<F, T, RATE>,
{
	/// Assigns the initial state: zeros, with `initial_capacity_element` at
	/// index `RATE`.
	pub fn new(
		common: &CommonConfig, initial_capacity_element: F, mut layouter: impl Layouter<F>,
	) -> Result<Self, Error> {
		let state = layouter.assign_region(
			|| "sponge_init",
			|region| {
				let mut ctx = RegionCtx::new(region, 0);
				let mut state = Vec::with_capacity(T);
				for i in 0..T {
					let word = if i == RATE { initial_capacity_element } else { F::ZERO };
					state.push(ctx.assign_from_constant(common.advice[i], word)?);
				}
				state.try_into().map_err(|_| Error::Synthesis)
			},
		)?;

		Ok(Self { mode: Absorbing(std::array::from_fn(|_| None)), state, _params: PhantomData })
	}

	/// Absorbs a cell into the sponge.
	pub fn absorb(
		&mut self, common: &CommonConfig, config: &SpongeConfig<F, T>,
		layouter: impl Layouter<F>, value: AssignedCell<F, F>,
	) -> Result<(), Error> {
		if let Some(slot) = self.mode.0.iter_mut().find(|slot| slot.is_none()) {
			*slot = Some(value);
			return Ok(());
		}

		// The rate is full
		let _ = poseidon_sponge::<F, S, T, RATE>(
			common,
			config,
			layouter,
			&mut self.state,
			Some(&self.mode),
		)?;
		let mut rate: [Option<AssignedCell<F, F>>; RATE] = std::array::from_fn(|_| None);
		rate[0] = Some(value);
		self.mode = Absorbing(rate);

		Ok(())
	}

	/// Transitions the sponge into its squeezing state.
	pub fn finish_absorbing(
		mut self, common: &CommonConfig, config: &SpongeConfig<F, T>, layouter: impl Layouter<F>,
	) -> Result<SpongeChipset<F, S, SqueezingCells<F, RATE>, T, RATE>, Error> {
		let mode = poseidon_sponge::<F, S, T, RATE>(
			common,
			config,
			layouter,
			&mut self.state,
			Some(&self.mode),
		)?;

		Ok(SpongeChipset { mode, state: self.state, _params: PhantomData })
	}
}

impl<F: FieldExt, S, const T: usize, const RATE: usize>
	SpongeChipset<F, S, SqueezingCells<F, RATE>, T, RATE>
where
	S: Spec<F, T, RATE>,
{
	/// Squeezes a cell from the sponge.
	pub fn squeeze(
		&mut self, common: &CommonConfig, config: &SpongeConfig<F, T>,
		mut layouter: impl Layouter<F>,
	) -> Result<AssignedCell<F, F>, Error> {
		loop {
			if let Some(cell) = self.mode.0.iter_mut().find_map(|slot| slot.take()) {
				return Ok(cell);
			}

			self.mode = poseidon_sponge::<F, S, T, RATE>(
				common,
				config,
				layouter.namespace(|| "squeeze"),
				&mut self.state,
				None,
			)?;
		}
	}
}

/// Hashes `L` assigned cells in the domain `D`
#[derive(Clone, Debug)]
pub struct PoseidonHashChipset<F: FieldExt, S, D, const T: usize, const RATE: usize, const L: usize>
where
	S: Spec<F, T, RATE>,
	D: Domain<F, RATE>,
{
	message: [AssignedCell<F, F>; L],
	_params: PhantomData<(S, D)>,
}

impl<F: FieldExt, S, D, const T: usize, const RATE: usize, const L: usize>
	PoseidonHashChipset<F, S, D, T, RATE, L>
where
	S: Spec<F, T, RATE>,
	D: Domain<F, RATE>,
{
	/// Create a new chipset.
	pub fn new(message: [AssignedCell<F, F>; L]) -> Self {
		Self { message, _params: PhantomData }
	}
}

impl<F: FieldExt, S, D, const T: usize, const RATE: usize, const L: usize> Chipset<F>
	for PoseidonHashChipset<F, S, D, T, RATE, L>
where
	S: Spec<F, T, RATE>,
	D: Domain<F, RATE>,
{
	type Config = SpongeConfig<F, T>;
	type Output = AssignedCell<F, F>;

	fn synthesize(
		self, common: &CommonConfig, config: &SpongeConfig<F, T>, mut layouter: impl Layouter<F>,
	) -> Result<Self::Output, Error> {
		let mut sponge = SpongeChipset::<F, S, AbsorbingCells<F, RATE>, T, RATE>::new(
			common,
			D::initial_capacity_element(),
			layouter.namespace(|| "init"),
		)?;

		let padding_words: Vec<F> = D::padding(L).into_iter().collect();
		let padding = layouter.assign_region(
			|| "padding",
			|region| {
				let mut ctx = RegionCtx::new(region, 0);
				let mut cells = Vec::with_capacity(padding_words.len());
				for word in &padding_words {
					cells.push(ctx.assign_from_constant(common.advice[0], *word)?);
					ctx.next();
				}
				Ok(cells)
			},
		)?;

		for cell in self.message.into_iter().chain(padding) {
			sponge.absorb(common, config, layouter.namespace(|| "absorb"), cell)?;
		}
		log::trace!("hashing {} cells in domain {}", L, D::name());

		let mut sponge = sponge.finish_absorbing(common, config, layouter.namespace(|| "finish"))?;
		sponge.squeeze(common, config, layouter.namespace(|| "squeeze"))
	}
}
