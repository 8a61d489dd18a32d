//! # Tool Path Resolver
//!
//! Finds the external video tools (`ffmpeg`, `ffprobe`) used by the probe:
//! - An explicitly configured tools directory
//! - `MEDIA_PICKER_TOOLS_DIR` environment variable
//! - A `tools/` directory bundled next to the host executable
//! - System PATH

use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Tools the probe knows how to drive
pub const VIDEO_TOOLS: [&str; 2] = ["ffmpeg", "ffprobe"];

/// Tool path resolver for bundled and system-installed tools
#[derive(Debug, Clone, Default)]
pub struct ToolPathResolver {
    /// Directories searched before PATH, in priority order
    search_dirs: Vec<PathBuf>,
}

impl ToolPathResolver {
    /// Create a resolver, optionally searching `tools_dir` first
    pub fn new(tools_dir: Option<&Path>) -> Self {
        let mut search_dirs = Vec::new();

        if let Some(dir) = tools_dir {
            search_dirs.push(dir.to_path_buf());
        }

        if let Ok(dir) = env::var("MEDIA_PICKER_TOOLS_DIR") {
            search_dirs.push(PathBuf::from(dir));
        }

        if let Some(bundled) = Self::detect_bundled_tools_dir() {
            search_dirs.push(bundled);
        }

        debug!("Tool search directories: {:?}", search_dirs);
        Self { search_dirs }
    }

    /// Look for a `tools/` directory shipped next to the host executable
    fn detect_bundled_tools_dir() -> Option<PathBuf> {
        let exe_path = env::current_exe().ok()?;
        let app_dir = exe_path.parent()?;

        [app_dir.join("tools"), app_dir.join("resources").join("tools")]
            .into_iter()
            .find(|path| path.is_dir())
    }

    fn executable_name(tool_name: &str) -> String {
        if cfg!(windows) {
            format!("{}.exe", tool_name)
        } else {
            tool_name.to_string()
        }
    }

    /// Resolve the path to a specific tool
    pub fn resolve_tool(&self, tool_name: &str) -> Option<PathBuf> {
        let executable = Self::executable_name(tool_name);

        for dir in &self.search_dirs {
            // tools/{tool} or tools/{tool}/{tool}
            let candidates = [dir.join(&executable), dir.join(tool_name).join(&executable)];
            if let Some(found) = candidates.into_iter().find(|path| path.is_file()) {
                debug!("Using bundled tool: {} -> {:?}", tool_name, found);
                return Some(found);
            }
        }

        if let Some(system_path) = Self::find_in_system_path(&executable) {
            debug!("Using system tool: {} -> {:?}", tool_name, system_path);
            return Some(system_path);
        }

        warn!("Tool not found: {}", tool_name);
        None
    }

    /// Find tool in system PATH
    fn find_in_system_path(executable: &str) -> Option<PathBuf> {
        let path_var = env::var_os("PATH")?;
        env::split_paths(&path_var)
            .map(|dir| dir.join(executable))
            .find(|path| path.is_file())
    }

    /// Check if a specific tool is available
    pub fn is_tool_available(&self, tool_name: &str) -> bool {
        self.resolve_tool(tool_name).is_some()
    }

    /// Get installation instructions for a missing tool
    pub fn install_instructions(tool_name: &str) -> String {
        match tool_name {
            "ffmpeg" | "ffprobe" => {
                if cfg!(target_os = "macos") {
                    "brew install ffmpeg".to_string()
                } else if cfg!(target_os = "linux") {
                    "sudo apt-get install ffmpeg".to_string()
                } else {
                    "download a build from https://ffmpeg.org/download.html".to_string()
                }
            }
            _ => format!("install {} and make sure it is on PATH", tool_name),
        }
    }

    /// Get a report of tool availability
    pub fn get_tools_report(&self) -> String {
        let mut report = String::from("Tool Path Resolver Report\n");
        report.push_str(&format!("Search directories: {:?}\n", self.search_dirs));

        for tool in VIDEO_TOOLS {
            match self.resolve_tool(tool) {
                Some(path) => report.push_str(&format!("  ✅ {} -> {:?}\n", tool, path)),
                None => report.push_str(&format!(
                    "  ❌ {} (install with: {})\n",
                    tool,
                    Self::install_instructions(tool)
                )),
            }
        }

        report
    }
}
