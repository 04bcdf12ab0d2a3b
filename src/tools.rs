//! Callable tools exposed to a conversational front-end.
//!
//! A chat loop with function calling discovers tools through
//! [`ToolRegistry::tools`] (name, description, JSON Schema) and invokes
//! them with JSON parameters via [`Tool::execute`]. Two tools are built in:
//!
//! | Tool | Purpose |
//! |------|---------|
//! | `ingest_code_directory` | Index a directory into a collection; returns a status string |
//! | `code_doc_search` | Ranked lines for a free-text query |
//!
//! # Example
//!
//! ```rust,no_run
//! # use std::sync::Arc;
//! # use vectordocs::tools::{ToolContext, ToolRegistry};
//! # async fn example(ctx: ToolContext) -> anyhow::Result<()> {
//! let tools = ToolRegistry::with_builtins();
//! let ingest = tools.find("ingest_code_directory").unwrap();
//! let status = ingest
//!     .execute(serde_json::json!({ "directoryPath": "./src" }), &ctx)
//!     .await?;
//! println!("{}", status);
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::{json, Value};

use vectordocs_core::ingest::Ingestor;
use vectordocs_core::search::{SearchHit, SearchService};
use vectordocs_core::Error;

use crate::config::Config;

/// A tool that agents can discover and call.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Lowercase identifier with underscores (e.g. `"code_doc_search"`).
    fn name(&self) -> &str;

    /// One-line description for agent discovery.
    fn description(&self) -> &str;

    /// OpenAI function-calling JSON Schema for the parameters.
    fn parameters_schema(&self) -> Value;

    /// Execute the tool. `params` is always a JSON object.
    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value>;
}

/// Shared services handed to every tool invocation.
pub struct ToolContext {
    config: Arc<Config>,
    ingestor: Arc<Ingestor>,
    search: Arc<SearchService>,
}

impl ToolContext {
    pub fn new(config: Arc<Config>, ingestor: Arc<Ingestor>, search: Arc<SearchService>) -> Self {
        Self {
            config,
            ingestor,
            search,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Ingest `directory` and describe the outcome in one sentence.
    ///
    /// A missing directory is reported in the returned status rather than
    /// as an error; every other failure is an error.
    pub async fn ingest_code_directory(
        &self,
        directory: &str,
        extensions: &str,
        collection: &str,
    ) -> Result<String> {
        match self
            .ingestor
            .ingest(Path::new(directory), extensions, collection)
            .await
        {
            Ok(report) => Ok(format!(
                "Successfully ingested {} documentation chunks from {} files into collection '{}'.",
                report.chunk_count, report.file_count, report.collection
            )),
            Err(Error::NotFound { .. }) => Ok(format!("Directory not found: {}", directory)),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn search(&self, query: &str, collection: &str, limit: usize) -> Result<Vec<SearchHit>> {
        Ok(self.search.search(query, collection, limit).await?)
    }
}

/// Built-in ingest tool. Delegates to [`ToolContext::ingest_code_directory`].
pub struct IngestCodeDirectoryTool;

#[async_trait]
impl Tool for IngestCodeDirectoryTool {
    fn name(&self) -> &str {
        "ingest_code_directory"
    }

    fn description(&self) -> &str {
        "Ingests all code files from a directory into the vector store"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "directoryPath": { "type": "string", "description": "Directory to ingest" },
                "extensions": {
                    "type": "string",
                    "description": "File extensions to include, e.g. '.cs,.js'",
                    "default": ".cs"
                },
                "collectionName": {
                    "type": "string",
                    "description": "Collection name to use",
                    "default": "code_documentation"
                }
            },
            "required": ["directoryPath"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let directory = params["directoryPath"].as_str().unwrap_or("");
        if directory.trim().is_empty() {
            bail!("directoryPath must not be empty");
        }
        let extensions = params["extensions"]
            .as_str()
            .unwrap_or(&ctx.config().ingest.extensions);
        let collection = params["collectionName"]
            .as_str()
            .unwrap_or(&ctx.config().ingest.collection);

        let status = ctx
            .ingest_code_directory(directory, extensions, collection)
            .await?;
        Ok(Value::String(status))
    }
}

/// Built-in search tool. Delegates to [`ToolContext::search`].
pub struct CodeSearchTool;

#[async_trait]
impl Tool for CodeSearchTool {
    fn name(&self) -> &str {
        "code_doc_search"
    }

    fn description(&self) -> &str {
        "Search indexed code for lines relevant to a question"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "Search query" },
                "limit": { "type": "integer", "description": "Max results", "default": 5 },
                "collectionName": {
                    "type": "string",
                    "description": "Collection to search",
                    "default": "code_documentation"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let query = params["query"].as_str().unwrap_or("");
        if query.trim().is_empty() {
            bail!("query must not be empty");
        }
        let limit = params["limit"]
            .as_u64()
            .map(|l| l as usize)
            .unwrap_or(ctx.config().search.limit);
        let collection = params["collectionName"]
            .as_str()
            .unwrap_or(&ctx.config().ingest.collection);

        let results = ctx.search(query, collection, limit).await?;
        Ok(json!({ "results": results }))
    }
}

/// Registry of callable tools.
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// A registry holding `ingest_code_directory` and `code_doc_search`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(IngestCodeDirectoryTool));
        registry.register(Box::new(CodeSearchTool));
        registry
    }

    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.push(tool);
    }

    pub fn tools(&self) -> &[Box<dyn Tool>] {
        &self.tools
    }

    pub fn find(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
    }

    /// Name, description, and parameter schema of every tool, in
    /// function-calling format.
    pub fn definitions(&self) -> Value {
        Value::Array(
            self.tools
                .iter()
                .map(|t| {
                    json!({
                        "type": "function",
                        "function": {
                            "name": t.name(),
                            "description": t.description(),
                            "parameters": t.parameters_schema()
                        }
                    })
                })
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
