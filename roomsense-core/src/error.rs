// Copyright 2025 Roomsense Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Enhancer error types

use thiserror::Error;

/// Result type for enhancer operations
pub type EnhancerResult<T> = Result<T, EnhancerError>;

/// Errors that can occur in the enrichment engine
#[derive(Debug, Error)]
pub enum EnhancerError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Snapshot load/save error
    #[error("Snapshot error: {0}")]
    Snapshot(String),

    /// Caption generation error
    #[error("Caption error: {0}")]
    Caption(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("Enhancer error: {0}")]
    Other(String),
}

impl From<serde_json::Error> for EnhancerError {
    fn from(e: serde_json::Error) -> Self {
        EnhancerError::Serialization(e.to_string())
    }
}
