use super::permute;
use crate::{
	params::{Mds, Spec, SpongeRate, State},
	FieldExt,
};
use std::marker::PhantomData;

mod private {
	pub trait SealedSpongeMode {}
	impl<F, const RATE: usize> SealedSpongeMode for super::Absorbing<F, RATE> {}
	impl<F, const RATE: usize> SealedSpongeMode for super::Squeezing<F, RATE> {}
}

/// The state of the sponge. Implemented only by [`Absorbing`] and
/// [`Squeezing`].
pub trait SpongeMode: private::SealedSpongeMode {}

/// The absorbing state of the sponge
#[derive(Debug)]
pub struct Absorbing<F, const RATE: usize>(pub(crate) SpongeRate<F, RATE>);

/// The squeezing state of the sponge
#[derive(Debug)]
pub struct Squeezing<F, const RATE: usize>(pub(crate) SpongeRate<F, RATE>);

impl<F, const RATE: usize> SpongeMode for Absorbing<F, RATE> {}
impl<F, const RATE: usize> SpongeMode for Squeezing<F, RATE> {}

impl<F: Copy, const RATE: usize> Absorbing<F, RATE> {
	/// Fresh rate holding `value` in the first slot
	pub(crate) fn init_with(value: F) -> Self {
		let mut rate = [None; RATE];
		rate[0] = Some(value);
		Self(rate)
	}
}

/// Adds the absorbed words (if any) into the rate part of the state,
/// permutes, and exposes the first `RATE` words for squeezing.
fn poseidon_sponge<F: FieldExt, S: Spec<F, T, RATE>, const T: usize, const RATE: usize>(
	state: &mut State<F, T>, input: Option<&Absorbing<F, RATE>>, mds: &Mds<F, T>,
	round_constants: &[[F; T]],
) -> Squeezing<F, RATE> {
	if let Some(Absorbing(input)) = input {
		for (word, value) in state.iter_mut().zip(input.iter()) {
			*word += value.unwrap_or(F::ZERO);
		}
	}

	permute::<F, S, T, RATE>(state, mds, round_constants);

	let mut output = [None; RATE];
	for (word, value) in output.iter_mut().zip(state.iter()) {
		*word = Some(*value);
	}
	Squeezing(output)
}

/// Poseidon sponge. The mode is part of the type, so only an absorbing sponge
/// can absorb and only a squeezing sponge can squeeze.
#[derive(Debug)]
pub struct Sponge<F: FieldExt, S, M, const T: usize, const RATE: usize>
where
	S: Spec<F, T, RATE>,
	M: SpongeMode,
{
	mode: M,
	state: State<F, T>,
	mds_matrix: Mds<F, T>,
	round_constants: Vec<[F; T]>,
	_params: PhantomData<S>,
}

impl<F: FieldExt, S, const T: usize, const RATE: usize> Sponge<F, S, Absorbing<F, RATE>, T, RATE>
where
	S: Spec<F, T, RATE>,
{
	/// Constructs a new sponge for the given Poseidon specification.
	pub fn new(initial_capacity_element: F) -> Self {
		let (round_constants, mds_matrix, _) = S::constants();

		let mut state = [F::ZERO; T];
		state[RATE] = initial_capacity_element;

		Self {
			mode: Absorbing([None; RATE]),
			state,
			mds_matrix,
			round_constants,
			_params: PhantomData,
		}
	}

	/// Absorbs an element into the sponge.
	pub fn absorb(&mut self, value: F) {
		if let Some(slot) = self.mode.0.iter_mut().find(|slot| slot.is_none()) {
			*slot = Some(value);
			return;
		}

		// We've already absorbed as many elements as we can
		let _ = poseidon_sponge::<F, S, T, RATE>(
			&mut self.state,
			Some(&self.mode),
			&self.mds_matrix,
			&self.round_constants,
		);
		self.mode = Absorbing::init_with(value);
	}

	/// Transitions the sponge into its squeezing state.
	pub fn finish_absorbing(mut self) -> Sponge<F, S, Squeezing<F, RATE>, T, RATE> {
		let mode = poseidon_sponge::<F, S, T, RATE>(
			&mut self.state,
			Some(&self.mode),
			&self.mds_matrix,
			&self.round_constants,
		);

		Sponge {
			mode,
			state: self.state,
			mds_matrix: self.mds_matrix,
			round_constants: self.round_constants,
			_params: PhantomData,
		}
	}
}

impl<F: FieldExt, S, const T: usize, const RATE: usize> Sponge<F, S, Squeezing<F, RATE>, T, RATE>
where
	S: Spec<F, T, RATE>,
{
	/// Squeezes an element from the sponge.
	pub fn squeeze(&mut self) -> F {
		loop {
			if let Some(value) = self.mode.0.iter_mut().find_map(|slot| slot.take()) {
				return value;
			}

			// We've already squeezed out all available elements
			self.mode = poseidon_sponge::<F, S, T, RATE>(
				&mut self.state,
				None,
				&self.mds_matrix,
				&self.round_constants,
			);
		}
	}
}
