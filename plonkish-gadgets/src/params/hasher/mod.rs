/// Poseidon over the bn254 scalar field with width 3 and rate 2
pub mod poseidon_bn254_3x2;
/// Poseidon over the bn254 scalar field with width 5 and rate 4
pub mod poseidon_bn254_5x4;
