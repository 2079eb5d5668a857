//! File editor tool: view, create and edit files by exact string replacement.
//!
//! Sent to the model as the native `text_editor_20241022` tool type under the
//! name `str_replace_editor`. Keeps a per-file history so the last edit can be
//! undone.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use deskpilot_core::error::ToolError;
use deskpilot_core::tool::{Tool, ToolDefinition, ToolOutput};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::debug;

const TOOL_NAME: &str = "str_replace_editor";
const API_TYPE: &str = "text_editor_20241022";
const SNIPPET_LINES: usize = 4;

#[derive(Debug, Deserialize)]
struct EditInput {
    command: String,
    path: String,
    #[serde(default)]
    file_text: Option<String>,
    #[serde(default)]
    view_range: Option<Vec<i64>>,
    #[serde(default)]
    old_str: Option<String>,
    #[serde(default)]
    new_str: Option<String>,
    #[serde(default)]
    insert_line: Option<usize>,
}

#[derive(Default)]
pub struct EditTool {
    history: Mutex<HashMap<PathBuf, Vec<String>>>,
}

impl EditTool {
    pub fn new() -> Self {
        Self::default()
    }

    async fn view(&self, path: &Path, view_range: Option<Vec<i64>>) -> Result<ToolOutput, ToolError> {
        if path.is_dir() {
            if view_range.is_some() {
                return Err(invalid(
                    "The `view_range` parameter is not allowed when `path` points to a directory.",
                ));
            }
            let listing = list_dir(path, 2).await?;
            return Ok(ToolOutput::text(format!(
                "Here's the files and directories up to 2 levels deep in {}, excluding hidden items:\n{}\n",
                path.display(),
                listing.join("\n")
            )));
        }

        let content = read_file(path).await?;
        let Some(range) = view_range else {
            return Ok(ToolOutput::text(numbered(&content, &path.display().to_string(), 1)));
        };

        let lines: Vec<&str> = content.split('\n').collect();
        let n = lines.len() as i64;
        let &[start, end] = range.as_slice() else {
            return Err(invalid("Invalid `view_range`. It should be a list of two integers."));
        };
        if start < 1 || start > n {
            return Err(invalid(format!(
                "Invalid `view_range`: {range:?}. Its first element `{start}` should be within the range of lines of the file: [1, {n}]"
            )));
        }
        if end != -1 && (end < start || end > n) {
            return Err(invalid(format!(
                "Invalid `view_range`: {range:?}. Its second element `{end}` should be -1 or within [{start}, {n}]"
            )));
        }
        let end = if end == -1 { n } else { end };
        let slice = lines[(start - 1) as usize..end as usize].join("\n");
        Ok(ToolOutput::text(numbered(
            &slice,
            &path.display().to_string(),
            start as usize,
        )))
    }

    async fn str_replace(
        &self,
        path: &Path,
        old_str: Option<String>,
        new_str: Option<String>,
    ) -> Result<ToolOutput, ToolError> {
        let old_str = old_str.ok_or_else(|| invalid("Parameter `old_str` is required for command: str_replace"))?;
        let new_str = new_str.unwrap_or_default();
        let content = expand_tabs(&read_file(path).await?);
        let old_str = expand_tabs(&old_str);
        let new_str = expand_tabs(&new_str);

        let occurrences: Vec<usize> = content.match_indices(&old_str).map(|(i, _)| i).collect();
        match occurrences.len() {
            0 => {
                return Err(invalid(format!(
                    "No replacement was performed, old_str `{old_str}` did not appear verbatim in {}.",
                    path.display()
                )));
            }
            1 => {}
            _ => {
                let lines: Vec<usize> = occurrences
                    .iter()
                    .map(|&i| content[..i].matches('\n').count() + 1)
                    .collect();
                return Err(invalid(format!(
                    "No replacement was performed. Multiple occurrences of old_str `{old_str}` in lines {lines:?}. Please ensure it is unique"
                )));
            }
        }

        let new_content = content.replacen(&old_str, &new_str, 1);
        write_file(path, &new_content).await?;
        self.remember(path, content.clone()).await;

        let replacement_line = content[..occurrences[0]].matches('\n').count();
        let start = replacement_line.saturating_sub(SNIPPET_LINES);
        let end = replacement_line + SNIPPET_LINES + new_str.matches('\n').count();
        let snippet = new_content
            .split('\n')
            .skip(start)
            .take(end - start + 1)
            .collect::<Vec<_>>()
            .join("\n");

        Ok(ToolOutput::text(format!(
            "The file {} has been edited. {}Review the changes and make sure they are as expected. Edit the file again if necessary.",
            path.display(),
            numbered(&snippet, &format!("a snippet of {}", path.display()), start + 1)
        )))
    }

    async fn insert(
        &self,
        path: &Path,
        insert_line: Option<usize>,
        new_str: Option<String>,
    ) -> Result<ToolOutput, ToolError> {
        let insert_line =
            insert_line.ok_or_else(|| invalid("Parameter `insert_line` is required for command: insert"))?;
        let new_str = new_str.ok_or_else(|| invalid("Parameter `new_str` is required for command: insert"))?;
        let content = expand_tabs(&read_file(path).await?);
        let new_str = expand_tabs(&new_str);

        let lines: Vec<&str> = content.split('\n').collect();
        if insert_line > lines.len() {
            return Err(invalid(format!(
                "Invalid `insert_line` parameter: {insert_line}. It should be within the range of lines of the file: [0, {}]",
                lines.len()
            )));
        }

        let new_lines: Vec<&str> = new_str.split('\n').collect();
        let mut updated: Vec<&str> = Vec::with_capacity(lines.len() + new_lines.len());
        updated.extend_from_slice(&lines[..insert_line]);
        updated.extend_from_slice(&new_lines);
        updated.extend_from_slice(&lines[insert_line..]);
        let new_content = updated.join("\n");

        let start = insert_line.saturating_sub(SNIPPET_LINES);
        let end = (insert_line + new_lines.len() + SNIPPET_LINES).min(updated.len());
        let snippet = updated[start..end].join("\n");

        write_file(path, &new_content).await?;
        self.remember(path, content.clone()).await;

        Ok(ToolOutput::text(format!(
            "The file {} has been edited. {}Review the changes and make sure they are as expected (correct indentation, no duplicate lines, etc). Edit the file again if necessary.",
            path.display(),
            numbered(&snippet, "a snippet of the edited file", start + 1)
        )))
    }

    async fn undo_edit(&self, path: &Path) -> Result<ToolOutput, ToolError> {
        let previous = {
            let mut history = self.history.lock().await;
            history.get_mut(path).and_then(Vec::pop)
        };
        let Some(previous) = previous else {
            return Err(invalid(format!("No edit history found for {}.", path.display())));
        };

        write_file(path, &previous).await?;
        Ok(ToolOutput::text(format!(
            "Last edit to {} undone successfully. {}",
            path.display(),
            numbered(&previous, &path.display().to_string(), 1)
        )))
    }

    async fn remember(&self, path: &Path, content: String) {
        self.history
            .lock()
            .await
            .entry(path.to_path_buf())
            .or_default()
            .push(content);
    }
}

#[async_trait]
impl Tool for EditTool {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition::Native {
            api_type: API_TYPE.into(),
            name: TOOL_NAME.into(),
            options: serde_json::Map::new(),
        }
    }

    async fn execute(&self, input: serde_json::Value) -> Result<ToolOutput, ToolError> {
        let input: EditInput =
            serde_json::from_value(input).map_err(|e| ToolError::InvalidArguments(e.to_string()))?;
        let path = PathBuf::from(&input.path);
        validate_path(&input.command, &path)?;

        debug!(command = %input.command, path = %path.display(), "Editor command");

        match input.command.as_str() {
            "view" => self.view(&path, input.view_range).await,
            "create" => {
                let file_text = input
                    .file_text
                    .ok_or_else(|| invalid("Parameter `file_text` is required for command: create"))?;
                write_file(&path, &file_text).await?;
                self.remember(&path, file_text).await;
                Ok(ToolOutput::text(format!("File created successfully at: {}", path.display())))
            }
            "str_replace" => self.str_replace(&path, input.old_str, input.new_str).await,
            "insert" => self.insert(&path, input.insert_line, input.new_str).await,
            "undo_edit" => self.undo_edit(&path).await,
            other => Err(invalid(format!(
                "Unrecognized command {other}. The allowed commands for the {TOOL_NAME} tool are: view, create, str_replace, insert, undo_edit"
            ))),
        }
    }
}

fn invalid(message: impl Into<String>) -> ToolError {
    ToolError::InvalidArguments(message.into())
}

fn io_failed(path: &Path, e: std::io::Error) -> ToolError {
    ToolError::ExecutionFailed {
        tool_name: TOOL_NAME.into(),
        reason: format!("{}: {e}", path.display()),
    }
}

fn validate_path(command: &str, path: &Path) -> Result<(), ToolError> {
    if !path.is_absolute() {
        return Err(invalid(format!(
            "The path {} is not an absolute path, it should start with `/`.",
            path.display()
        )));
    }
    if !path.exists() && command != "create" {
        return Err(invalid(format!("The path {} does not exist. Please provide a valid path.", path.display())));
    }
    if path.exists() && command == "create" {
        return Err(invalid(format!(
            "File already exists at: {}. Cannot overwrite files using command `create`.",
            path.display()
        )));
    }
    if path.is_dir() && command != "view" {
        return Err(invalid(format!(
            "The path {} is a directory and only the `view` command can be used on directories",
            path.display()
        )));
    }
    Ok(())
}

async fn read_file(path: &Path) -> Result<String, ToolError> {
    tokio::fs::read_to_string(path).await.map_err(|e| io_failed(path, e))
}

async fn write_file(path: &Path, content: &str) -> Result<(), ToolError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(|e| io_failed(parent, e))?;
    }
    tokio::fs::write(path, content).await.map_err(|e| io_failed(path, e))
}

/// Non-hidden entries below `root`, up to `depth` levels, sorted.
async fn list_dir(root: &Path, depth: usize) -> Result<Vec<String>, ToolError> {
    let mut entries = vec![root.display().to_string()];
    let mut pending = vec![(root.to_path_buf(), 0usize)];

    while let Some((dir, level)) = pending.pop() {
        if level >= depth {
            continue;
        }
        let mut reader = tokio::fs::read_dir(&dir).await.map_err(|e| io_failed(&dir, e))?;
        while let Some(entry) = reader.next_entry().await.map_err(|e| io_failed(&dir, e))? {
            if entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }
            let path = entry.path();
            entries.push(path.display().to_string());
            if path.is_dir() {
                pending.push((path, level + 1));
            }
        }
    }

    entries.sort();
    Ok(entries)
}

fn expand_tabs(text: &str) -> String {
    text.replace('\t', "        ")
}

/// Render `content` the way `cat -n` would, starting at `first_line`.
fn numbered(content: &str, descriptor: &str, first_line: usize) -> String {
    let body = expand_tabs(content)
        .split('\n')
        .enumerate()
        .map(|(i, line)| format!("{:6}\t{line}", i + first_line))
        .collect::<Vec<_>>()
        .join("\n");
    format!("Here's the result of running `cat -n` on {descriptor}:\n{body}\n")
}
