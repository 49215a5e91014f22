// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Dragonscale Team

use thiserror::Error;

use crate::graph::traversal::Direction;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SimilarityError {
    /// A configuration value is out of range or malformed.
    #[error("Argument '{arg}' is invalid: {message}")]
    InvalidArgument { arg: String, message: String },

    /// The traversal direction cannot produce sorted neighbor vectors.
    #[error("Direction {direction:?} is not supported by node similarity")]
    UnsupportedDirection { direction: Direction },

    /// The requested output cannot be produced for this combination of options.
    #[error("Invalid output mode: {message}")]
    InvalidOutputMode { message: String },

    /// The run was aborted through its termination flag. No result exists.
    #[error("Node similarity computation was terminated")]
    Terminated,
}

impl SimilarityError {
    pub(crate) fn invalid_argument(arg: &str, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            arg: arg.to_string(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SimilarityError>;
