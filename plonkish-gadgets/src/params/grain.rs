use crate::FieldExt;
use std::marker::PhantomData;

/// Width of the LFSR state in bits
const STATE_BITS: usize = 80;
/// Raw bits discarded after seeding
const WARMUP_BITS: usize = 160;

/// S-box identifier encoded into the Grain seed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SboxType {
	/// x^alpha
	Pow,
	/// x^-1
	Inv,
}

impl SboxType {
	fn seed_bits(self) -> u16 {
		match self {
			SboxType::Pow => 0,
			SboxType::Inv => 1,
		}
	}
}

/// Self-shrinking 80-bit Grain LFSR, seeded with the permutation parameters.
///
/// Produces the same stream as the reference Poseidon parameter generator, so
/// round constants and MDS matrices are reproducible across implementations.
#[derive(Debug, Clone)]
pub struct Grain<F: FieldExt> {
	state: [bool; STATE_BITS],
	_field: PhantomData<F>,
}

impl<F: FieldExt> Grain<F> {
	/// Seeds the LFSR with the field size, S-box, width and round counts.
	pub fn new(sbox: SboxType, t: u16, r_f: u16, r_p: u16) -> Self {
		// Header fields, most significant bit first. Unused bits stay set.
		let mut state = [true; STATE_BITS];
		let mut offset = 0;
		let header = [
			(2, 1), // prime field
			(4, sbox.seed_bits()),
			(12, F::NUM_BITS as u16),
			(12, t),
			(10, r_f),
			(10, r_p),
		];
		for (len, value) in header {
			for i in 0..len {
				state[offset + i] = (value >> (len - 1 - i)) & 1 == 1;
			}
			offset += len;
		}

		let mut grain = Self { state, _field: PhantomData };
		for _ in 0..WARMUP_BITS {
			grain.clock();
		}
		grain
	}

	/// Shifts the register by one bit and returns the new bit.
	fn clock(&mut self) -> bool {
		let s = &self.state;
		let bit = s[62] ^ s[51] ^ s[38] ^ s[23] ^ s[13] ^ s[0];
		self.state.rotate_left(1);
		self.state[STATE_BITS - 1] = bit;
		bit
	}

	/// Reads `F::NUM_BITS` stream bits, most significant first, into a
	/// little-endian byte buffer of `N` bytes.
	fn next_bytes<const N: usize>(&mut self) -> [u8; N] {
		let num_bits = F::NUM_BITS as usize;
		let mut bytes = [0u8; N];
		for (i, bit) in self.by_ref().take(num_bits).enumerate() {
			let pos = num_bits - 1 - i;
			if bit {
				bytes[pos / 8] |= 1 << (pos % 8);
			}
		}
		bytes
	}

	/// Next field element, rejecting non-canonical encodings.
	pub fn next_field_element(&mut self) -> F {
		loop {
			let bytes = self.next_bytes::<64>();
			let mut repr = F::Repr::default();
			let len = repr.as_ref().len();
			repr.as_mut().copy_from_slice(&bytes[..len]);
			if let Some(fe) = Option::<F>::from(F::from_repr(repr)) {
				return fe;
			}
		}
	}

	/// Next field element, reducing modulo the field size instead of
	/// rejecting.
	pub fn next_field_element_without_rejection(&mut self) -> F {
		F::from_uniform_bytes(&self.next_bytes::<64>())
	}
}

impl<F: FieldExt> Iterator for Grain<F> {
	type Item = bool;

	fn next(&mut self) -> Option<bool> {
		// Emit the second bit of each pair whose first bit is set
		loop {
			let keep = self.clock();
			let bit = self.clock();
			if keep {
				return Some(bit);
			}
		}
	}
}

#[cfg(test)]
mod test {
	use super::{Grain, SboxType};
	use crate::params::hex_to_field;
	use halo2::halo2curves::bn256::Fr;

	#[test]
	fn test_grain_deterministic() {
		let mut a = Grain::<Fr>::new(SboxType::Pow, 3, 8, 57);
		let mut b = Grain::<Fr>::new(SboxType::Pow, 3, 8, 57);
		for _ in 0..10 {
			assert_eq!(a.next_field_element(), b.next_field_element());
		}

		let mut c = Grain::<Fr>::new(SboxType::Pow, 3, 8, 56);
		let mut a = Grain::<Fr>::new(SboxType::Pow, 3, 8, 57);
		assert_ne!(a.next_field_element(), c.next_field_element());
	}

	#[test]
	fn test_grain_first_constants() {
		let mut grain = Grain::<Fr>::new(SboxType::Pow, 3, 8, 57);
		let expected: [Fr; 2] = [
			"0x0ee9a592ba9a9518d05986d656f40c2114c4993c11bb29938d21d47304cd8e6e",
			"0x00f1445235f2148c5986587169fc1bcd887b08d4d00868df5696fff40956e864",
		]
		.map(hex_to_field);

		assert_eq!(grain.next_field_element(), expected[0]);
		assert_eq!(grain.next_field_element(), expected[1]);
	}
}
