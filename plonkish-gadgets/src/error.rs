use halo2::plonk::Error as PlonkError;
use thiserror::Error;

/// The error type for gadget witnessing and circuit checks.
#[derive(Debug, Error)]
pub enum GadgetError {
	/// The witness cannot be computed, e.g. an inverse of zero was requested.
	#[error("InvalidWitness: {0}")]
	InvalidWitness(String),
	/// Synthesis succeeded, but the assignment does not satisfy the constraints.
	#[error("Unsatisfiable: {0}")]
	Unsatisfiable(String),
	/// The layouter rejected the circuit.
	#[error("SynthesisError: {0}")]
	Synthesis(#[from] PlonkError),
}

impl From<GadgetError> for PlonkError {
	fn from(err: GadgetError) -> Self {
		match err {
			GadgetError::Synthesis(err) => err,
			err => {
				log::error!("{}", err);
				PlonkError::Synthesis
			},
		}
	}
}
