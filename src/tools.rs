//! The tool surface callers discover and invoke.
//!
//! Each gateway operation is wrapped as a [`Tool`] carrying a JSON
//! Schema, so an agent-side framework can auto-discover the operations
//! and route free-form instructions to them. Argument parsing happens
//! here; the protection policy lives entirely in [`crate::gateway`].

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Value, json};
use std::fmt;
use std::sync::Arc;

use crate::gateway::{Gateway, Outcome, Payload};

/// Schema advertised for one tool: the contract a natural-language
/// router targets.
#[derive(Debug, Clone, Serialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn schema(&self) -> ToolSchema;

    /// Run the tool. `Err` means the arguments were malformed; every
    /// storage or policy result is inside the returned [`Outcome`].
    async fn execute(&self, arguments: &str) -> Result<Outcome>;
}

/// All gateway tools, in discovery order.
pub fn create_gateway_tools(gateway: Arc<Gateway>) -> Vec<Box<dyn Tool>> {
    vec![
        Box::new(ListDirectoryTool::new(gateway.clone())),
        Box::new(GetFileContentTool::new(gateway.clone())),
        Box::new(WriteFileTool::new(gateway.clone())),
        Box::new(CreateDirectoryTool::new(gateway.clone())),
        Box::new(DeleteFileTool::new(gateway.clone())),
        Box::new(VerifySecretTool::new(gateway)),
    ]
}

impl fmt::Display for Payload {
    /// Render a payload the way the wire contract describes it:
    /// listings as a JSON array, content and confirmations verbatim,
    /// the verification result as `"True"` / `"False"`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Listing(names) => {
                write!(f, "{}", serde_json::to_string(names).map_err(|_| fmt::Error)?)
            }
            Payload::Content(text) | Payload::Message(text) => write!(f, "{}", text),
            Payload::Match(true) => write!(f, "True"),
            Payload::Match(false) => write!(f, "False"),
        }
    }
}

fn required_str<'a>(args: &'a Value, key: &str) -> Result<&'a str> {
    args[key]
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("Missing {}", key))
}

// List Directory Tool
pub struct ListDirectoryTool {
    gateway: Arc<Gateway>,
}

impl ListDirectoryTool {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl Tool for ListDirectoryTool {
    fn name(&self) -> &str {
        "list_directory"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "list_directory".to_string(),
            description: "List all files and directories in the given directory".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "directory": {
                        "type": "string",
                        "description": "The absolute or relative path to the directory (example: '.' or 'home/user/docs')"
                    }
                },
                "required": ["directory"]
            }),
        }
    }

    async fn execute(&self, arguments: &str) -> Result<Outcome> {
        let args: Value = serde_json::from_str(arguments)?;
        let directory = required_str(&args, "directory")?;
        Ok(self.gateway.list_directory(directory))
    }
}

// Get File Content Tool
pub struct GetFileContentTool {
    gateway: Arc<Gateway>,
}

impl GetFileContentTool {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl Tool for GetFileContentTool {
    fn name(&self) -> &str {
        "get_file_content"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_file_content".to_string(),
            description: "Read and return the full text content of a specified file".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "The full path to the file you want to read (example: 'src/main.rs')"
                    }
                },
                "required": ["path"]
            }),
        }
    }

    async fn execute(&self, arguments: &str) -> Result<Outcome> {
        let args: Value = serde_json::from_str(arguments)?;
        let path = required_str(&args, "path")?;
        Ok(self.gateway.read_file(path))
    }
}

// Write File Tool
pub struct WriteFileTool {
    gateway: Arc<Gateway>,
}

impl WriteFileTool {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> &str {
        "write_file"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "write_file".to_string(),
            description: "Write or overwrite content to a specified file".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "The full path to the file you want to write to (example: 'files/notes.txt')"
                    },
                    "content": {
                        "type": "string",
                        "description": "The text content to write into the file"
                    }
                },
                "required": ["path", "content"]
            }),
        }
    }

    async fn execute(&self, arguments: &str) -> Result<Outcome> {
        let args: Value = serde_json::from_str(arguments)?;
        let path = required_str(&args, "path")?;
        let content = required_str(&args, "content")?;
        Ok(self.gateway.write_file(path, content))
    }
}

// Create Directory Tool
pub struct CreateDirectoryTool {
    gateway: Arc<Gateway>,
}

impl CreateDirectoryTool {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl Tool for CreateDirectoryTool {
    fn name(&self) -> &str {
        "create_directory"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "create_directory".to_string(),
            description: "Create a new directory at the specified path, including missing parents"
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "The path where the new directory should be created (example: 'new_project/src')"
                    }
                },
                "required": ["path"]
            }),
        }
    }

    async fn execute(&self, arguments: &str) -> Result<Outcome> {
        let args: Value = serde_json::from_str(arguments)?;
        let path = required_str(&args, "path")?;
        Ok(self.gateway.create_directory(path))
    }
}

// Delete File Tool
pub struct DeleteFileTool {
    gateway: Arc<Gateway>,
}

impl DeleteFileTool {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl Tool for DeleteFileTool {
    fn name(&self) -> &str {
        "delete_file"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "delete_file".to_string(),
            description: "Delete a specified file. The caller must confirm with the user first"
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "The full path to the file you want to delete"
                    }
                },
                "required": ["path"]
            }),
        }
    }

    async fn execute(&self, arguments: &str) -> Result<Outcome> {
        let args: Value = serde_json::from_str(arguments)?;
        let path = required_str(&args, "path")?;
        Ok(self.gateway.delete_file(path))
    }
}

// Verify Secret Tool
pub struct VerifySecretTool {
    gateway: Arc<Gateway>,
}

impl VerifySecretTool {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl Tool for VerifySecretTool {
    fn name(&self) -> &str {
        "verify_secret"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "verify_secret".to_string(),
            description:
                "Check whether a guess matches the protected secret. Returns only True or False"
                    .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "guess": {
                        "type": "string",
                        "description": "The candidate secret value to check"
                    }
                },
                "required": ["guess"]
            }),
        }
    }

    async fn execute(&self, arguments: &str) -> Result<Outcome> {
        let args: Value = serde_json::from_str(arguments)?;
        let guess = required_str(&args, "guess")?;
        Ok(self.gateway.verify_secret(guess))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::FailureKind;
    use std::fs;

    fn fixture() -> (tempfile::TempDir, Vec<Box<dyn Tool>>) {
        let tmp = tempfile::tempdir().unwrap();
        let flag = tmp.path().join("flag.txt");
        fs::write(&flag, "hunter2\n").unwrap();
        let state_dir = tmp.path().join("state");
        fs::create_dir_all(&state_dir).unwrap();
        let gateway = Arc::new(Gateway::new(flag, state_dir));
        (tmp, create_gateway_tools(gateway))
    }

    fn tool<'a>(tools: &'a [Box<dyn Tool>], name: &str) -> &'a dyn Tool {
        tools
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
            .unwrap_or_else(|| panic!("no tool named {}", name))
    }

    #[test]
    fn all_six_operations_advertised() {
        let (_tmp, tools) = fixture();
        let names: Vec<&str> = tools.iter().map(|t| t.name()).collect();
        assert_eq!(
            names,
            vec![
                "list_directory",
                "get_file_content",
                "write_file",
                "create_directory",
                "delete_file",
                "verify_secret"
            ]
        );

        for t in &tools {
            let schema = t.schema();
            assert_eq!(schema.name, t.name());
            assert!(schema.parameters["required"].is_array());
        }
    }

    #[tokio::test]
    async fn missing_argument_is_an_error_not_an_outcome() {
        let (_tmp, tools) = fixture();
        let err = tool(&tools, "get_file_content")
            .execute("{}")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Missing path"));
    }

    #[tokio::test]
    async fn write_then_read_through_tools() {
        let (tmp, tools) = fixture();
        let path = tmp.path().join("notes.txt");
        let args = json!({"path": path.to_str().unwrap(), "content": "hello world"}).to_string();

        let outcome = tool(&tools, "write_file").execute(&args).await.unwrap();
        assert!(outcome.is_ok());

        let args = json!({"path": path.to_str().unwrap()}).to_string();
        let outcome = tool(&tools, "get_file_content").execute(&args).await.unwrap();
        match outcome {
            Outcome::Ok {
                payload: Payload::Content(text),
            } => assert_eq!(text, "hello world"),
            other => panic!("expected content, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn verify_renders_string_encoded_boolean() {
        let (_tmp, tools) = fixture();
        let verify = tool(&tools, "verify_secret");

        let outcome = verify
            .execute(&json!({"guess": "hunter2"}).to_string())
            .await
            .unwrap();
        match outcome {
            Outcome::Ok { payload } => assert_eq!(payload.to_string(), "True"),
            other => panic!("expected ok, got {:?}", other),
        }

        let outcome = verify
            .execute(&json!({"guess": "WRONGGUESS"}).to_string())
            .await
            .unwrap();
        match outcome {
            Outcome::Ok { payload } => assert_eq!(payload.to_string(), "False"),
            other => panic!("expected ok, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn protected_file_denied_via_tools() {
        let (tmp, tools) = fixture();
        let flag = tmp.path().join("FLAG.TXT");
        let args = json!({"path": flag.to_str().unwrap()}).to_string();

        let outcome = tool(&tools, "get_file_content").execute(&args).await.unwrap();
        assert!(outcome.is_denied());

        let args = json!({"path": flag.to_str().unwrap(), "content": "x"}).to_string();
        let outcome = tool(&tools, "write_file").execute(&args).await.unwrap();
        assert!(outcome.is_denied());
    }

    #[tokio::test]
    async fn delete_missing_file_fails_via_tools() {
        let (tmp, tools) = fixture();
        let path = tmp.path().join("nope.txt");
        let args = json!({"path": path.to_str().unwrap()}).to_string();

        let outcome = tool(&tools, "delete_file").execute(&args).await.unwrap();
        match outcome {
            Outcome::Failed { kind, .. } => assert_eq!(kind, FailureKind::NotFound),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn listing_payload_renders_as_json_array() {
        let payload = Payload::Listing(vec!["a.txt".to_string(), "b".to_string()]);
        assert_eq!(payload.to_string(), r#"["a.txt","b"]"#);
    }
}
