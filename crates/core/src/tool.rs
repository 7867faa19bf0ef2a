//! Tool trait, parameter schemas, and the static tool registry.
//!
//! A tool is declared by a [`ToolSpec`]: a unique name, a one-line description
//! and an ordered list of typed parameters with defaults. The `ToolSpec` produces the
//! JSON Schema sent to the LLM and validates the arguments the LLM sends back,
//! so every tool receives already-bound [`ToolArgs`].

use crate::error::ToolError;
use crate::provider::ToolDefinition;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// A request to execute a tool, as decided by the LLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique call ID (matches the LLM's tool_call.id)
    pub id: String,

    pub name: String,

    /// Raw arguments as a JSON value
    pub arguments: Value,
}

/// The result of a tool execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// The call ID this result is for
    pub call_id: String,

    /// Whether the underlying operation succeeded
    pub success: bool,

    /// Text fed back to the LLM
    pub output: String,

    /// Optional structured data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ToolResult {
    pub fn text(success: bool, output: impl Into<String>) -> Self {
        Self {
            call_id: String::new(),
            success,
            output: output.into(),
            data: None,
        }
    }

    /// A successful result whose output is the pretty-printed value.
    pub fn json(data: Value) -> Self {
        Self {
            call_id: String::new(),
            success: true,
            output: serde_json::to_string_pretty(&data).unwrap_or_default(),
            data: Some(data),
        }
    }
}

/// Semantic type of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    String,
    Integer,
    Boolean,
    /// A list of strings
    StringList,
}

impl ParamType {
    fn json_type(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::StringList => "array",
        }
    }

    /// Coerce an LLM-supplied value into this type.
    ///
    /// Models routinely send numbers as strings and lists as comma-separated
    /// text, so both are accepted.
    fn coerce(self, value: &Value) -> Option<Value> {
        match (self, value) {
            (Self::String, Value::String(_)) => Some(value.clone()),
            (Self::String, Value::Number(n)) => Some(Value::String(n.to_string())),
            (Self::String, Value::Bool(b)) => Some(Value::String(b.to_string())),
            (Self::Integer, Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
                .map(Value::from),
            (Self::Integer, Value::String(s)) => s.trim().parse::<i64>().ok().map(Value::from),
            (Self::Boolean, Value::Bool(_)) => Some(value.clone()),
            (Self::Boolean, Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Some(Value::Bool(true)),
                "false" => Some(Value::Bool(false)),
                _ => None,
            },
            (Self::StringList, Value::Array(items)) => items
                .iter()
                .map(|item| item.as_str().map(|s| Value::String(s.to_string())))
                .collect::<Option<Vec<_>>>()
                .map(Value::Array),
            (Self::StringList, Value::String(s)) => Some(Value::Array(
                s.split(',')
                    .map(str::trim)
                    .filter(|part| !part.is_empty())
                    .map(|part| Value::String(part.to_string()))
                    .collect(),
            )),
            _ => None,
        }
    }
}

/// Whether a parameter must be supplied, and what it falls back to.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamDefault {
    Required,
    /// Optional with no default: absent unless supplied
    Absent,
    Value(Value),
}

/// One declared parameter of a tool.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamType,
    pub default: ParamDefault,
    pub description: String,
}

impl ParamSpec {
    pub fn required(name: impl Into<String>, kind: ParamType, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            default: ParamDefault::Required,
            description: description.into(),
        }
    }

    pub fn optional(name: impl Into<String>, kind: ParamType, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            default: ParamDefault::Absent,
            description: description.into(),
        }
    }

    pub fn with_default(
        name: impl Into<String>,
        kind: ParamType,
        default: impl Into<Value>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            default: ParamDefault::Value(default.into()),
            description: description.into(),
        }
    }

    fn json_schema(&self) -> Value {
        let mut schema = serde_json::json!({
            "type": self.kind.json_type(),
            "description": self.description,
        });
        if self.kind == ParamType::StringList {
            schema["items"] = serde_json::json!({ "type": "string" });
        }
        if let ParamDefault::Value(default) = &self.default {
            schema["default"] = default.clone();
        }
        schema
    }
}

/// Immutable description of a tool.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub params: Vec<ParamSpec>,
}

impl ToolSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            params: Vec::new(),
        }
    }

    /// Append a parameter (declaration order is preserved in the schema).
    pub fn param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    /// JSON Schema object for the parameter list.
    pub fn json_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for param in &self.params {
            properties.insert(param.name.clone(), param.json_schema());
            if param.default == ParamDefault::Required {
                required.push(Value::String(param.name.clone()));
            }
        }
        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    pub fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name.clone(),
            description: self.description.clone(),
            parameters: self.json_schema(),
        }
    }

    /// Validate raw LLM arguments against the declared parameters.
    ///
    /// Unknown keys are ignored, `null` means "not supplied", and defaults
    /// are filled in for every optional parameter that has one.
    pub fn bind(&self, arguments: &Value) -> Result<ToolArgs, ToolError> {
        let supplied = match arguments {
            Value::Object(map) => map.clone(),
            Value::Null => Map::new(),
            other => {
                return Err(ToolError::InvalidArguments(format!(
                    "arguments for '{}' must be a JSON object, got {other}",
                    self.name
                )));
            }
        };

        let mut bound = Map::new();
        for param in &self.params {
            match supplied.get(&param.name).filter(|v| !v.is_null()) {
                Some(value) => {
                    let coerced = param.kind.coerce(value).ok_or_else(|| {
                        ToolError::InvalidArguments(format!(
                            "parameter '{}' of '{}' must be of type {}, got {value}",
                            param.name,
                            self.name,
                            param.kind.json_type()
                        ))
                    })?;
                    bound.insert(param.name.clone(), coerced);
                }
                None => match &param.default {
                    ParamDefault::Required => {
                        return Err(ToolError::InvalidArguments(format!(
                            "missing required parameter '{}' for '{}'",
                            param.name, self.name
                        )));
                    }
                    ParamDefault::Absent => {}
                    ParamDefault::Value(default) => {
                        bound.insert(param.name.clone(), default.clone());
                    }
                },
            }
        }

        Ok(ToolArgs(bound))
    }
}

/// Arguments after binding against a [`ToolSpec`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolArgs(Map<String, Value>);

impl ToolArgs {
    pub fn str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    pub fn string(&self, name: &str) -> Option<String> {
        self.str(name).map(str::to_string)
    }

    pub fn i64(&self, name: &str) -> Option<i64> {
        self.0.get(name).and_then(Value::as_i64)
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        self.0.get(name).and_then(Value::as_bool)
    }

    pub fn list(&self, name: &str) -> Option<Vec<String>> {
        self.0.get(name).and_then(Value::as_array).map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
    }

    /// A required string parameter (guaranteed present after binding).
    pub fn require_str(&self, name: &str) -> Result<&str, ToolError> {
        self.str(name)
            .ok_or_else(|| ToolError::InvalidArguments(format!("missing parameter '{name}'")))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }
}

/// An operation the agent can invoke by name.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The declared schema of this tool.
    fn spec(&self) -> &ToolSpec;

    /// Execute with arguments already bound against [`Tool::spec`].
    async fn execute(&self, args: ToolArgs) -> Result<ToolResult, ToolError>;

    fn name(&self) -> &str {
        &self.spec().name
    }

    fn to_definition(&self) -> ToolDefinition {
        self.spec().to_definition()
    }
}

/// A static registry of tools keyed by unique name.
///
/// Built once at startup, then shared read-only behind an `Arc`.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    order: Vec<String>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Register a tool. Names must be unique.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<(), ToolError> {
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            return Err(ToolError::DuplicateName(name));
        }
        debug!(tool = %name, "Registered tool");
        self.order.push(name.clone());
        self.tools.insert(name, tool);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    /// Tool definitions in registration order (for sending to the LLM).
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|t| t.to_definition())
            .collect()
    }

    /// Resolve, bind, and execute a tool call.
    pub async fn execute(&self, call: &ToolCall) -> Result<ToolResult, ToolError> {
        let tool = self
            .tools
            .get(&call.name)
            .ok_or_else(|| ToolError::NotFound(call.name.clone()))?;
        let args = tool.spec().bind(&call.arguments)?;
        let mut result = tool.execute(args).await?;
        result.call_id = call.id.clone();
        Ok(result)
    }

    /// Registered tool names, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.order.iter().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoTool {
        spec: ToolSpec,
    }

    impl EchoTool {
        fn new() -> Self {
            Self {
                spec: ToolSpec::new("echo", "Echoes back the input")
                    .param(ParamSpec::required("text", ParamType::String, "Text to echo"))
                    .param(ParamSpec::with_default(
                        "times",
                        ParamType::Integer,
                        1,
                        "Repetitions",
                    )),
            }
        }
    }

    #[async_trait]
    impl Tool for EchoTool {
        fn spec(&self) -> &ToolSpec {
            &self.spec
        }

        async fn execute(&self, args: ToolArgs) -> Result<ToolResult, ToolError> {
            let text = args.require_str("text")?;
            let times = args.i64("times").unwrap_or(1).max(0) as usize;
            Ok(ToolResult::text(true, text.repeat(times)))
        }
    }

    fn sample_spec() -> ToolSpec {
        ToolSpec::new("sample", "A sample")
            .param(ParamSpec::required("id", ParamType::String, "Identifier"))
            .param(ParamSpec::with_default("count", ParamType::Integer, 20, "How many"))
            .param(ParamSpec::optional("since", ParamType::String, "Lower bound"))
            .param(ParamSpec::with_default("deleted", ParamType::Boolean, false, "Include deleted"))
            .param(ParamSpec::optional("emails", ParamType::StringList, "Addresses"))
    }

    #[test]
    fn schema_lists_required_and_defaults() {
        let schema = sample_spec().json_schema();
        assert_eq!(schema["required"], json!(["id"]));
        assert_eq!(schema["properties"]["count"]["type"], "integer");
        assert_eq!(schema["properties"]["count"]["default"], 20);
        assert!(schema["properties"]["since"].get("default").is_none());
        assert_eq!(schema["properties"]["emails"]["items"]["type"], "string");
    }

    #[test]
    fn bind_fills_defaults_and_skips_absent() {
        let args = sample_spec().bind(&json!({"id": "x"})).unwrap();
        assert_eq!(args.str("id"), Some("x"));
        assert_eq!(args.i64("count"), Some(20));
        assert_eq!(args.bool("deleted"), Some(false));
        assert!(!args.contains("since"));
        assert!(args.list("emails").is_none());
    }

    #[test]
    fn bind_coerces_loose_llm_values() {
        let args = sample_spec()
            .bind(&json!({
                "id": 42,
                "count": "10",
                "deleted": "TRUE",
                "emails": "a@x.com, b@y.com",
                "since": null,
                "unexpected": "ignored"
            }))
            .unwrap();
        assert_eq!(args.str("id"), Some("42"));
        assert_eq!(args.i64("count"), Some(10));
        assert_eq!(args.bool("deleted"), Some(true));
        assert_eq!(
            args.list("emails"),
            Some(vec!["a@x.com".to_string(), "b@y.com".to_string()])
        );
        assert!(!args.contains("since"));
        assert!(!args.contains("unexpected"));
    }

    #[test]
    fn bind_rejects_missing_required() {
        let err = sample_spec().bind(&json!({})).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(ref m) if m.contains("'id'")));
    }

    #[test]
    fn bind_rejects_bad_types() {
        let err = sample_spec()
            .bind(&json!({"id": "x", "count": "many"}))
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(ref m) if m.contains("'count'")));

        let err = sample_spec().bind(&json!(["not", "an", "object"])).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[test]
    fn registry_register_and_lookup() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool::new())).unwrap();
        assert!(registry.get("echo").is_some());
        assert!(registry.get("nonexistent").is_none());
        assert_eq!(registry.names(), vec!["echo"]);
    }

    #[test]
    fn registry_rejects_duplicate_names() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool::new())).unwrap();
        let err = registry.register(Arc::new(EchoTool::new())).unwrap_err();
        assert!(matches!(err, ToolError::DuplicateName(ref n) if n == "echo"));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn registry_execute_tool() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool::new())).unwrap();

        let call = ToolCall {
            id: "call_1".into(),
            name: "echo".into(),
            arguments: json!({"text": "ab", "times": 2}),
        };
        let result = registry.execute(&call).await.unwrap();
        assert!(result.success);
        assert_eq!(result.output, "abab");
        assert_eq!(result.call_id, "call_1");
    }

    #[tokio::test]
    async fn registry_execute_missing_tool() {
        let registry = ToolRegistry::new();
        let call = ToolCall {
            id: "call_1".into(),
            name: "nonexistent".into(),
            arguments: json!({}),
        };
        let err = registry.execute(&call).await.unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
    }
}
