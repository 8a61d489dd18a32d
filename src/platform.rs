//! # Platform-specific utilities
//!
//! Questo modulo centralizza la logica cross-platform per i tool esterni
//! usati dal probe video (ffmpeg, ffprobe). Su iOS e Android non è possibile
//! avviare processi esterni: lì ogni richiesta fallisce con `UnsupportedPlatform`.

use crate::error::{MediaError, MediaResult};
use crate::tool_resolver::{ToolPathResolver, VIDEO_TOOLS};
use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::info;

/// Platform-aware command manager with tool resolution
#[derive(Debug, Clone)]
pub struct PlatformCommands {
    tool_resolver: ToolPathResolver,
}

impl PlatformCommands {
    pub fn new(tools_dir: Option<&Path>) -> Self {
        Self {
            tool_resolver: ToolPathResolver::new(tools_dir),
        }
    }

    /// Whether this target can spawn external processes at all
    pub fn supports_subprocesses() -> bool {
        !cfg!(any(target_os = "ios", target_os = "android"))
    }

    /// Resolve the executable for a tool, or explain why it cannot be used
    pub fn command(&self, base_name: &str) -> MediaResult<PathBuf> {
        if !Self::supports_subprocesses() {
            return Err(MediaError::UnsupportedPlatform);
        }

        self.tool_resolver.resolve_tool(base_name).ok_or_else(|| {
            MediaError::MissingDependency(format!(
                "{} is required for video probing ({})",
                base_name,
                ToolPathResolver::install_instructions(base_name)
            ))
        })
    }

    /// Check if a command is available on the system or bundled
    pub fn is_command_available(&self, base_name: &str) -> bool {
        Self::supports_subprocesses() && self.tool_resolver.is_tool_available(base_name)
    }

    /// Check that every video tool is available
    pub fn check_dependencies(&self) -> Result<()> {
        info!("🔧 Checking video tool dependencies on {}...", Self::system_info());

        for tool in VIDEO_TOOLS {
            self.command(tool)
                .map_err(|e| anyhow::anyhow!("{}", e))?;
        }

        info!("✅ Video tools available: {}", VIDEO_TOOLS.join(", "));
        Ok(())
    }

    /// Get system information for debugging
    pub fn system_info() -> SystemInfo {
        SystemInfo {
            os: std::env::consts::OS,
            arch: std::env::consts::ARCH,
            family: std::env::consts::FAMILY,
        }
    }
}

/// System information structure
#[derive(Debug, Clone)]
pub struct SystemInfo {
    pub os: &'static str,
    pub arch: &'static str,
    pub family: &'static str,
}

impl std::fmt::Display for SystemInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} ({})", self.os, self.arch, self.family)
    }
}
