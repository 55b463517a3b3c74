//! LineageError: unified error type for the correspondence core.

use thiserror::Error;

use super::level::LevelId;

/// Errors raised while loading, decoding or rendering hierarchy artifacts.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LineageError {
	/// No level artifact exists for this identity.
	#[error("no level artifact for {0}")]
	LevelNotFound(LevelId),
	/// No permutation table exists for this identity.
	#[error("no permutation table for {0}")]
	PermutationNotFound(LevelId),
	/// An artifact name that does not encode a level.
	#[error("malformed level token `{0}`")]
	MalformedLevelToken(String),
	/// A permutation table that is not a bijection onto its render slots.
	#[error("invalid permutation: {0}")]
	InvalidPermutation(String),
	/// A level document that could not be parsed.
	#[error("malformed level document `{name}`: {reason}")]
	MalformedDocument {
		/// Artifact name of the offending document.
		name: String,
		/// Parser message.
		reason: String,
	},
	/// The rendering surface refused a request.
	#[error("rendering surface error: {0}")]
	Surface(String),
}
