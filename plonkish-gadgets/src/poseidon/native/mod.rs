/// Fixed-length hashing domain and the one-shot hasher
pub mod hash;
/// Absorb/squeeze sponge over the permutation
pub mod sponge;

use crate::{
	params::{check_rounds, Mds, Spec, State},
	FieldExt, Hasher,
};
use std::marker::PhantomData;

/// Whether `round` falls in the partial-round band between the two halves of
/// full rounds.
pub(crate) fn is_partial_round(round: usize, full_rounds: usize, partial_rounds: usize) -> bool {
	let half_full_rounds = full_rounds / 2;
	round >= half_full_rounds && round < half_full_rounds + partial_rounds
}

/// Multiplies the state by the MDS matrix.
fn mix<F: FieldExt, const T: usize>(state: &mut State<F, T>, mds: &Mds<F, T>) {
	let mut new_state = [F::ZERO; T];
	for i in 0..T {
		for j in 0..T {
			new_state[i] += mds[i][j] * state[j];
		}
	}
	*state = new_state;
}

/// Applies a single round: add round constants, S-box (every word, or only
/// the first one in a partial round) and the MDS mix.
pub(crate) fn round<F: FieldExt, S: Spec<F, T, RATE>, const T: usize, const RATE: usize>(
	state: &mut State<F, T>, mds: &Mds<F, T>, round_constants: &[F; T], partial: bool,
) {
	for (word, rc) in state.iter_mut().zip(round_constants) {
		*word += rc;
	}
	if partial {
		state[0] = S::sbox_f(state[0]);
	} else {
		for word in state.iter_mut() {
			*word = S::sbox_f(*word);
		}
	}
	mix(state, mds);
}

/// States before the first round and after every round, `r_f + r_p + 1`
/// entries in total.
pub(crate) fn round_trace<F: FieldExt, S: Spec<F, T, RATE>, const T: usize, const RATE: usize>(
	mut state: State<F, T>, mds: &Mds<F, T>, round_constants: &[[F; T]],
) -> Vec<State<F, T>> {
	check_rounds::<F, S, T, RATE>();
	let full_rounds = S::full_rounds();
	let partial_rounds = S::partial_rounds();
	assert_eq!(round_constants.len(), full_rounds + partial_rounds);

	let mut trace = Vec::with_capacity(round_constants.len() + 1);
	trace.push(state);
	for (i, rc) in round_constants.iter().enumerate() {
		let partial = is_partial_round(i, full_rounds, partial_rounds);
		round::<F, S, T, RATE>(&mut state, mds, rc, partial);
		trace.push(state);
	}
	trace
}

/// Runs the Poseidon permutation in place: half of the full rounds, the
/// partial rounds, then the remaining full rounds, consuming one row of
/// round constants per round.
pub fn permute<F: FieldExt, S: Spec<F, T, RATE>, const T: usize, const RATE: usize>(
	state: &mut State<F, T>, mds: &Mds<F, T>, round_constants: &[[F; T]],
) {
	check_rounds::<F, S, T, RATE>();
	let full_rounds = S::full_rounds();
	let partial_rounds = S::partial_rounds();
	assert_eq!(round_constants.len(), full_rounds + partial_rounds);

	for (i, rc) in round_constants.iter().enumerate() {
		let partial = is_partial_round(i, full_rounds, partial_rounds);
		round::<F, S, T, RATE>(state, mds, rc, partial);
	}
}

/// Native Poseidon permutation over a `T`-word state
#[derive(Clone, Debug)]
pub struct Poseidon<F: FieldExt, S, const T: usize, const RATE: usize>
where
	S: Spec<F, T, RATE>,
{
	inputs: State<F, T>,
	_params: PhantomData<S>,
}

impl<F: FieldExt, S, const T: usize, const RATE: usize> Poseidon<F, S, T, RATE>
where
	S: Spec<F, T, RATE>,
{
	/// Permutes the inputs with freshly derived constants.
	pub fn permute(&self) -> State<F, T> {
		let (round_constants, mds, _) = S::constants();
		let mut state = self.inputs;
		permute::<F, S, T, RATE>(&mut state, &mds, &round_constants);
		state
	}
}

impl<F: FieldExt, S, const T: usize, const RATE: usize> Hasher<F, T> for Poseidon<F, S, T, RATE>
where
	S: Spec<F, T, RATE>,
{
	fn new(inputs: [F; T]) -> Self {
		Self { inputs, _params: PhantomData }
	}

	fn finalize(&self) -> [F; T] {
		self.permute()
	}
}
