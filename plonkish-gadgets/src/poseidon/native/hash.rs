use super::sponge::{Absorbing, Sponge};
use crate::{params::Spec, FieldExt};
use std::{
	iter::{self, Repeat, Take},
	marker::PhantomData,
};

/// Domain separation and padding policy of a hash function
pub trait Domain<F: FieldExt, const RATE: usize> {
	/// Iterator over the padding words
	type Padding: IntoIterator<Item = F>;

	/// Human-readable name of the domain
	fn name() -> String;

	/// Capacity element the sponge is initialised with
	fn initial_capacity_element() -> F;

	/// Padding appended to a message of `input_len` words
	fn padding(input_len: usize) -> Self::Padding;
}

/// Hashing of messages of exactly `L` field elements
#[derive(Clone, Copy, Debug)]
pub struct ConstantLength<const L: usize>;

impl<F: FieldExt, const RATE: usize, const L: usize> Domain<F, RATE> for ConstantLength<L> {
	type Padding = Take<Repeat<F>>;

	fn name() -> String {
		format!("ConstantLength<{}>", L)
	}

	fn initial_capacity_element() -> F {
		// L * 2^64 + (number of outputs - 1), with a single output
		F::from_u128((L as u128) << 64)
	}

	fn padding(input_len: usize) -> Self::Padding {
		assert_eq!(input_len, L, "Message length does not match the domain");
		// Pad up to the next multiple of RATE
		let k = (L + RATE - 1) / RATE;
		iter::repeat(F::ZERO).take(k * RATE - L)
	}
}

/// One-shot Poseidon hash over a sponge initialised for domain `D`
#[derive(Debug)]
pub struct Hash<F: FieldExt, S, D, const T: usize, const RATE: usize>
where
	S: Spec<F, T, RATE>,
	D: Domain<F, RATE>,
{
	sponge: Sponge<F, S, Absorbing<F, RATE>, T, RATE>,
	_domain: PhantomData<D>,
}

impl<F: FieldExt, S, D, const T: usize, const RATE: usize> Hash<F, S, D, T, RATE>
where
	S: Spec<F, T, RATE>,
	D: Domain<F, RATE>,
{
	/// Initializes a new hasher.
	pub fn init() -> Self {
		Self { sponge: Sponge::new(D::initial_capacity_element()), _domain: PhantomData }
	}
}

impl<F: FieldExt, S, const T: usize, const RATE: usize, const L: usize>
	Hash<F, S, ConstantLength<L>, T, RATE>
where
	S: Spec<F, T, RATE>,
{
	/// Hashes the given input.
	pub fn hash(mut self, message: [F; L]) -> F {
		let padding = <ConstantLength<L> as Domain<F, RATE>>::padding(L);
		for value in message.into_iter().chain(padding) {
			self.sponge.absorb(value);
		}
		log::trace!("hashing {} words in domain ConstantLength<{}>", L, L);
		self.sponge.finish_absorbing().squeeze()
	}
}

#[cfg(test)]
mod test {
	use super::{ConstantLength, Domain, Hash};
	use crate::params::{
		hasher::{poseidon_bn254_3x2, poseidon_bn254_5x4},
		hex_to_field,
	};
	use halo2::halo2curves::{
		bn256::Fr,
		ff::{Field, PrimeField},
	};
	use rand::thread_rng;

	type Hash3x2<const L: usize> = Hash<Fr, poseidon_bn254_3x2::Params, ConstantLength<L>, 3, 2>;
	type Hash5x4<const L: usize> = Hash<Fr, poseidon_bn254_5x4::Params, ConstantLength<L>, 5, 4>;

	fn check_stable_and_distinct<const L: usize>() {
		let rng = &mut thread_rng();
		let a = [(); L].map(|_| Fr::random(&mut *rng));
		let mut b = a;
		if let Some(last) = b.last_mut() {
			*last += Fr::ONE;
		}

		let digest_a = Hash3x2::<L>::init().hash(a);
		assert_eq!(digest_a, Hash3x2::<L>::init().hash(a));
		if L > 0 {
			assert_ne!(digest_a, Hash3x2::<L>::init().hash(b));
		}
	}

	#[test]
	fn test_hash_stability() {
		// L in {0, 1, RATE, RATE + 1}
		check_stable_and_distinct::<0>();
		check_stable_and_distinct::<1>();
		check_stable_and_distinct::<2>();
		check_stable_and_distinct::<3>();
	}

	#[test]
	fn test_hash_reference() {
		let digest = Hash3x2::<2>::init().hash([Fr::from(1), Fr::from(2)]);
		let expected: Fr =
			hex_to_field("0x26b7315bd6d42b2814e4780ee403594fb789099bffb05c29d1b118c1e2160c74");
		assert_eq!(digest, expected);

		let digest = Hash3x2::<0>::init().hash([]);
		let expected: Fr =
			hex_to_field("0x2098f5fb9e239eab3ceac3f27b81e481dc3124d55ffed523a839ee8446b64864");
		assert_eq!(digest, expected);
	}

	#[test]
	fn test_length_is_domain_separated() {
		let short = Hash3x2::<1>::init().hash([Fr::from(3)]);
		let padded = Hash3x2::<2>::init().hash([Fr::from(3), Fr::ZERO]);
		assert_ne!(short, padded);

		let wide = Hash5x4::<5>::init().hash([1, 2, 3, 4, 5].map(Fr::from));
		assert_ne!(wide, Hash5x4::<5>::init().hash([1, 2, 3, 4, 6].map(Fr::from)));
	}

	#[test]
	fn test_domain() {
		assert_eq!(<ConstantLength<3> as Domain<Fr, 2>>::padding(3).count(), 1);
		assert_eq!(<ConstantLength<4> as Domain<Fr, 2>>::padding(4).count(), 0);
		assert_eq!(<ConstantLength<1> as Domain<Fr, 4>>::padding(1).count(), 3);
		assert_eq!(<ConstantLength<3> as Domain<Fr, 2>>::name(), "ConstantLength<3>");

		let capacity = <ConstantLength<3> as Domain<Fr, 2>>::initial_capacity_element();
		assert_eq!(capacity, Fr::from_u128(3 << 64));
	}

	#[test]
	#[should_panic(expected = "Message length does not match the domain")]
	fn test_padding_length_mismatch() {
		let _ = <ConstantLength<3> as Domain<Fr, 2>>::padding(2);
	}
}
