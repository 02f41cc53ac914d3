// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

/// Boxed error type used to carry transport-specific failures through [`ApiError`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A remote call failed.
///
/// Harvesters do not inspect the variants: any error means "no data this cycle" for the
/// affected resource type. The variants exist so the failure is logged usefully.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request could not be sent or the response could not be read.
    #[error("transport error: {0}")]
    Transport(#[source] BoxError),
    /// The server answered with a non-success status.
    #[error("unexpected status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, possibly truncated
        body: String,
    },
    /// The response body did not have the expected shape.
    #[error("failed to decode response: {0}")]
    Decode(#[source] BoxError),
    /// The call did not complete within its bound.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}

impl ApiError {
    pub fn transport(err: impl Into<BoxError>) -> Self {
        Self::Transport(err.into())
    }

    pub fn decode(err: impl Into<BoxError>) -> Self {
        Self::Decode(err.into())
    }
}

/// The harvester configuration cannot be used.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("`{0}` must be greater than zero")]
    Zero(&'static str),
    #[error("`namespace` must not be empty")]
    EmptyNamespace,
    #[error("invalid config file: {0}")]
    Parse(String),
}
