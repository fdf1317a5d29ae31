use crate::{error::GadgetError, FieldExt};
use halo2::{
	dev::MockProver,
	halo2curves::{
		bn256::{Bn256, Fr, G1Affine},
		ff::PrimeField,
	},
	plonk::{create_proof, keygen_pk, keygen_vk, verify_proof, Circuit, Error, Expression},
	poly::{
		kzg::{
			commitment::{KZGCommitmentScheme, ParamsKZG},
			multiopen::{ProverSHPLONK, VerifierSHPLONK},
			strategy::AccumulatorStrategy,
		},
		VerificationStrategy,
	},
	transcript::{
		Blake2bRead, Blake2bWrite, Challenge255, TranscriptReadBuffer, TranscriptWriterBuffer,
	},
};
use itertools::Itertools;
use num_bigint::BigUint;
use num_traits::One;
use rand::Rng;
use std::ops::Range;

/// Returns the `F::NUM_BITS` little-endian bits of a field element.
/// Assumes a little-endian byte representation, which holds for the curves
/// re-exported by halo2.
pub fn fe_to_le_bits<F: PrimeField>(fe: &F) -> Vec<bool> {
	let repr = fe.to_repr();
	repr.as_ref()
		.iter()
		.flat_map(|byte| (0..8).map(move |i| (byte >> i) & 1 == 1))
		.take(F::NUM_BITS as usize)
		.collect()
}

/// Little-endian bits to integer. At most 64 bits.
pub fn lebs2ip(bits: &[bool]) -> u64 {
	assert!(bits.len() <= 64);
	bits.iter().enumerate().fold(0u64, |acc, (i, bit)| if *bit { acc + (1 << i) } else { acc })
}

/// Integer to `NUM_BITS` little-endian bits.
pub fn i2lebsp<const NUM_BITS: usize>(int: u64) -> [bool; NUM_BITS] {
	assert!(NUM_BITS <= 64);
	let mut bits = [false; NUM_BITS];
	for (i, bit) in bits.iter_mut().enumerate() {
		*bit = (int >> i) & 1 == 1;
	}
	bits
}

/// Splits the low `word_num_bits` bits of `word` into `window_num_bits`-bit
/// little-endian windows. The last window is zero-padded.
pub fn decompose_word<F: PrimeField>(
	word: &F, word_num_bits: usize, window_num_bits: usize,
) -> Vec<u8> {
	assert!(0 < window_num_bits && window_num_bits <= 8);

	let padding = (window_num_bits - (word_num_bits % window_num_bits)) % window_num_bits;
	let bits: Vec<bool> = fe_to_le_bits(word)
		.into_iter()
		.take(word_num_bits)
		.chain(std::iter::repeat(false).take(padding))
		.collect();
	assert_eq!(bits.len(), word_num_bits + padding);

	bits.chunks_exact(window_num_bits).map(|window| lebs2ip(window) as u8).collect()
}

/// Returns [`BigUint`] representation for the given [`FieldExt`].
pub fn fe_to_big<F: FieldExt>(fe: F) -> BigUint {
	BigUint::from_bytes_le(fe.to_repr().as_ref())
}

/// Returns [`FieldExt`] for the given [`BigUint`], reduced by the modulus.
pub fn big_to_fe<F: FieldExt>(e: BigUint) -> F {
	let le_bytes = e.to_bytes_le();
	assert!(le_bytes.len() <= 64, "integer wider than 512 bits");
	let mut bytes_wide = [0u8; 64];
	bytes_wide[..le_bytes.len()].copy_from_slice(&le_bytes);
	F::from_uniform_bytes(&bytes_wide)
}

/// Integer value of the bits of `fe` in `bitrange`, shifted down to bit zero.
pub fn bitrange_subset<F: FieldExt>(fe: &F, bitrange: Range<usize>) -> F {
	assert!(bitrange.start <= bitrange.end);
	assert!(bitrange.end <= F::NUM_BITS as usize);

	let mask = (BigUint::one() << (bitrange.end - bitrange.start)) - 1u32;
	big_to_fe((fe_to_big(*fe) >> bitrange.start) & mask)
}

/// Multiplicative inverse, failing on zero.
pub fn inverse<F: FieldExt>(value: F) -> Result<F, GadgetError> {
	Option::<F>::from(value.invert())
		.ok_or_else(|| GadgetError::InvalidWitness("inverse of zero requested".to_string()))
}

/// `value * (1 - value)`, zero iff `value` is boolean.
pub fn bool_check<F: FieldExt>(value: Expression<F>) -> Expression<F> {
	range_check(value, 2)
}

/// `cond * when_true + (1 - cond) * when_false`
pub fn ternary<F: FieldExt>(
	cond: Expression<F>, when_true: Expression<F>, when_false: Expression<F>,
) -> Expression<F> {
	let one_minus_cond = Expression::Constant(F::ONE) - cond.clone();
	cond * when_true + one_minus_cond * when_false
}

/// Product `word * (1 - word) * ... * (range - 1 - word)`, zero iff
/// `word` is in `[0, range)`.
pub fn range_check<F: FieldExt>(word: Expression<F>, range: usize) -> Expression<F> {
	(1..range).fold(word.clone(), |acc, i| {
		acc * (Expression::Constant(F::from(i as u64)) - word.clone())
	})
}

/// Runs the mock prover and reports unsatisfied constraints as an error.
pub fn check_satisfied<F: FieldExt + Ord, C: Circuit<F>>(
	k: u32, circuit: &C, instances: Vec<Vec<F>>,
) -> Result<(), GadgetError> {
	let prover = MockProver::run(k, circuit, instances)?;
	prover.verify().map_err(|failures| GadgetError::Unsatisfiable(failures.iter().join("; ")))
}

/// Generate KZG parameters for circuits of `2^k` rows
pub fn generate_params(k: u32) -> ParamsKZG<Bn256> {
	ParamsKZG::<Bn256>::setup(k, rand::thread_rng())
}

/// Proves and verifies the circuit with the given public inputs
pub fn prove_and_verify<C: Circuit<Fr>, R: Rng>(
	params: ParamsKZG<Bn256>, circuit: C, pub_ins: &[&[Fr]], rng: &mut R,
) -> Result<bool, Error> {
	let vk = keygen_vk(&params, &circuit)?;
	let pk = keygen_pk(&params, vk, &circuit)?;

	let mut transcript = Blake2bWrite::<_, G1Affine, Challenge255<_>>::init(vec![]);
	create_proof::<KZGCommitmentScheme<Bn256>, ProverSHPLONK<_>, _, _, _, _>(
		&params,
		&pk,
		&[circuit],
		&[pub_ins],
		rng,
		&mut transcript,
	)?;
	let proof = transcript.finalize();
	log::debug!("proof size: {} bytes", proof.len());

	let strategy = AccumulatorStrategy::new(&params);
	let mut transcript = Blake2bRead::<_, G1Affine, Challenge255<_>>::init(&proof[..]);
	let output = verify_proof::<KZGCommitmentScheme<Bn256>, VerifierSHPLONK<Bn256>, _, _, _>(
		&params,
		pk.get_vk(),
		strategy,
		&[pub_ins],
		&mut transcript,
	)?;

	Ok(output.finalize())
}
