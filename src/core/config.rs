// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Platform and codec configuration.
//!
//! The platform conventions (wide character width, native byte order) are
//! resolved once per process by [`PlatformConfig::host`] and then passed
//! explicitly to encoders, cursors and marshallers. Overriding them is how
//! callers talk to a peer with different conventions, and how tests exercise
//! both wide-character widths on one machine.
//!
//! Configuration can be loaded from TOML:
//!
//! ```
//! use cdrbridge::core::config::{CodecConfig, WCharWidth};
//!
//! let config = CodecConfig::from_toml_str(
//!     r#"
//!     max_depth = 8
//!
//!     [platform]
//!     wchar_width = "utf16"
//!     "#,
//! ).unwrap();
//! assert_eq!(config.max_depth, 8);
//! assert_eq!(config.platform.wchar_width, WCharWidth::Utf16);
//! ```

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default initial capacity for encoder buffers.
pub const DEFAULT_INITIAL_CAPACITY: usize = 16;

/// Maximum sequence length accepted while decoding.
pub const DEFAULT_MAX_SEQUENCE_LENGTH: usize = 10_000_000;

/// Maximum nesting depth of composite values.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Width of a wide character code unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WCharWidth {
    /// 16-bit UTF-16 code units (Windows family)
    Utf16,
    /// 32-bit UTF-32 code units (everything else)
    Utf32,
}

impl WCharWidth {
    /// Width used by the platform this crate was compiled for.
    #[must_use]
    pub const fn host() -> Self {
        if cfg!(windows) {
            WCharWidth::Utf16
        } else {
            WCharWidth::Utf32
        }
    }

    /// Size of one code unit in bytes.
    #[must_use]
    pub const fn bytes(self) -> usize {
        match self {
            WCharWidth::Utf16 => 2,
            WCharWidth::Utf32 => 4,
        }
    }
}

/// Byte order of native memory blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ByteOrderKind {
    /// Least significant byte first
    Little,
    /// Most significant byte first
    Big,
}

impl ByteOrderKind {
    /// Byte order of the compilation target.
    #[must_use]
    pub const fn host() -> Self {
        if cfg!(target_endian = "little") {
            ByteOrderKind::Little
        } else {
            ByteOrderKind::Big
        }
    }

    /// Check if this is little endian.
    #[must_use]
    pub const fn is_little(self) -> bool {
        matches!(self, ByteOrderKind::Little)
    }
}

/// Platform conventions threaded through the codec and the marshaller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Width of `wchar` and wide string code units
    pub wchar_width: WCharWidth,
    /// Byte order used for counts and elements in native blocks
    pub native_byte_order: ByteOrderKind,
}

impl PlatformConfig {
    /// Detect the conventions of the compilation target.
    #[must_use]
    pub const fn detect() -> Self {
        Self {
            wchar_width: WCharWidth::host(),
            native_byte_order: ByteOrderKind::host(),
        }
    }

    /// Host conventions, detected on first use and cached for the process.
    pub fn host() -> PlatformConfig {
        static HOST: OnceLock<PlatformConfig> = OnceLock::new();
        *HOST.get_or_init(|| {
            let config = PlatformConfig::detect();
            tracing::debug!(
                wchar_width = ?config.wchar_width,
                native_byte_order = ?config.native_byte_order,
                "resolved host platform conventions"
            );
            config
        })
    }

    /// Return a copy with a different wide character width.
    #[must_use]
    pub const fn with_wchar_width(mut self, width: WCharWidth) -> Self {
        self.wchar_width = width;
        self
    }

    /// Return a copy with a different native byte order.
    #[must_use]
    pub const fn with_native_byte_order(mut self, order: ByteOrderKind) -> Self {
        self.native_byte_order = order;
        self
    }
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self::host()
    }
}

/// Limits and sizing for the CDR codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Initial capacity of encoder buffers when the size is not precomputed
    pub initial_capacity: usize,
    /// Largest sequence length accepted while decoding
    pub max_sequence_length: usize,
    /// Deepest nesting of composite values accepted on either path
    pub max_depth: usize,
    /// Platform conventions
    pub platform: PlatformConfig,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            max_sequence_length: DEFAULT_MAX_SEQUENCE_LENGTH,
            max_depth: DEFAULT_MAX_DEPTH,
            platform: PlatformConfig::host(),
        }
    }
}

impl CodecConfig {
    /// Parse and validate a configuration from TOML text.
    ///
    /// Missing keys take their default values.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: CodecConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that limits are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_depth == 0 {
            return Err(ConfigError::Invalid {
                field: "max_depth",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.max_sequence_length > u32::MAX as usize {
            return Err(ConfigError::Invalid {
                field: "max_sequence_length",
                reason: format!("must not exceed {}", u32::MAX),
            });
        }
        Ok(())
    }

    /// Return a copy with different platform conventions.
    #[must_use]
    pub const fn with_platform(mut self, platform: PlatformConfig) -> Self {
        self.platform = platform;
        self
    }
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The TOML text could not be parsed
    #[error("failed to parse codec config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range
    #[error("invalid codec config field '{field}': {reason}")]
    Invalid {
        /// Offending field
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },
}
