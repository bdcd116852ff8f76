use std::process::Command;

#[derive(Debug, Clone, PartialEq)]
pub enum ToolType {
    Ffmpeg,
}

impl ToolType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolType::Ffmpeg => "ffmpeg",
        }
    }

    fn version_arg(&self) -> &'static str {
        match self {
            ToolType::Ffmpeg => "-version",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ToolInfo {
    pub name: String,
    pub tool_type: ToolType,
    pub version: Option<String>,
    pub path: Option<String>,
    pub is_available: bool,
}

pub struct ToolManager;

impl ToolManager {
    pub fn new() -> Self {
        Self
    }

    pub fn get_tool_info(&self, tool_type: ToolType) -> ToolInfo {
        let name = tool_type.as_str().to_string();
        let (path, version) = self.detect_tool(&tool_type);

        ToolInfo {
            name,
            tool_type,
            is_available: path.is_some(),
            version,
            path,
        }
    }

    fn detect_tool(&self, tool_type: &ToolType) -> (Option<String>, Option<String>) {
        let binary_name = tool_type.as_str();

        // 1. Try common paths first
        let common_paths = [
            format!("/opt/homebrew/bin/{}", binary_name),
            format!("/usr/local/bin/{}", binary_name),
            format!("/usr/bin/{}", binary_name),
        ];

        for path in common_paths {
            if std::path::Path::new(&path).exists() {
                let version = self.get_version(&path, tool_type);
                return (Some(path), version);
            }
        }

        // 2. Try PATH
        if let Ok(output) = Command::new("which").arg(binary_name).output() {
            if output.status.success() {
                let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !path.is_empty() {
                    let version = self.get_version(&path, tool_type);
                    return (Some(path), version);
                }
            }
        }

        (None, None)
    }

    fn get_version(&self, path: &str, tool_type: &ToolType) -> Option<String> {
        match Command::new(path).arg(tool_type.version_arg()).output() {
            Ok(output) if output.status.success() => {
                parse_version_line(&String::from_utf8_lossy(&output.stdout))
            }
            _ => None,
        }
    }
}

impl Default for ToolManager {
    fn default() -> Self {
        Self::new()
    }
}

/// `ffmpeg version 6.1.1 Copyright (c) ...` -> `6.1.1`
fn parse_version_line(output: &str) -> Option<String> {
    let first = output.lines().next()?.trim();
    let mut words = first.split_whitespace();
    while let Some(word) = words.next() {
        if word == "version" {
            return words.next().map(str::to_string);
        }
    }
    if first.is_empty() {
        None
    } else {
        Some(first.to_string())
    }
}
