//! Tool System
//!
//! Named, schema-described operations that the server and the router invoke.
//! A tool receives a [`ToolCall`] with loosely-typed JSON arguments and answers
//! with a [`ToolResult`] whose `data` carries the structured payload.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::error::{AgentError, Result};

/// Tool invocation
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ToolCall {
    /// Tool identifier
    pub name: String,

    /// Arguments as key-value pairs
    #[serde(default)]
    pub arguments: HashMap<String, Value>,

    /// Optional call ID for tracking
    #[serde(default)]
    pub id: Option<String>,
}

impl ToolCall {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }

    /// String argument, if present and a string
    pub fn str_arg(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(Value::as_str)
    }

    /// Numeric argument, accepting integers and floats
    pub fn f64_arg(&self, key: &str) -> Option<f64> {
        self.arguments.get(key).and_then(Value::as_f64)
    }

    pub fn u64_arg(&self, key: &str) -> Option<u64> {
        self.arguments.get(key).and_then(Value::as_u64)
    }

    pub fn bool_arg(&self, key: &str) -> Option<bool> {
        self.arguments.get(key).and_then(Value::as_bool)
    }

    /// Array of strings; non-string entries are skipped
    pub fn str_list_arg(&self, key: &str) -> Option<Vec<String>> {
        self.arguments.get(key).and_then(Value::as_array).map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(ToString::to_string)
                .collect()
        })
    }

    /// Required string argument
    pub fn require_str(&self, key: &str) -> Result<&str> {
        self.str_arg(key)
            .ok_or_else(|| AgentError::ToolValidation(format!("Missing required parameter: {key}")))
    }
}

/// Result of a tool execution
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolResult {
    /// Tool that was called
    pub name: String,

    /// Call ID, echoed from the request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub success: bool,

    /// Short summary or error message
    pub output: String,

    /// Structured payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ToolResult {
    pub fn success(name: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            success: true,
            output: output.into(),
            data: None,
        }
    }

    pub fn failure(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            success: false,
            output: error.into(),
            data: None,
        }
    }

    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    #[must_use]
    pub fn with_id(mut self, id: Option<String>) -> Self {
        self.id = id;
        self
    }
}

/// Parameter definition
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParameterSchema {
    pub name: String,

    /// JSON Schema type (string, number, boolean, object, array)
    #[serde(rename = "type")]
    pub param_type: String,

    pub description: String,

    #[serde(default)]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// Allowed values
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
}

impl ParameterSchema {
    pub fn required(
        name: impl Into<String>,
        param_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            param_type: param_type.into(),
            description: description.into(),
            required: true,
            default: None,
            enum_values: None,
        }
    }

    pub fn optional(
        name: impl Into<String>,
        param_type: impl Into<String>,
        description: impl Into<String>,
        default: Option<Value>,
    ) -> Self {
        Self {
            required: false,
            default,
            ..Self::required(name, param_type, description)
        }
    }

    #[must_use]
    pub fn one_of(mut self, values: &[&str]) -> Self {
        self.enum_values = Some(values.iter().map(|v| Value::from(*v)).collect());
        self
    }
}

/// Tool definition schema
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Unique tool identifier
    pub name: String,

    pub description: String,

    pub parameters: Vec<ParameterSchema>,

    /// Category for grouping (routing, analysis, orchestration)
    #[serde(default)]
    pub category: Option<String>,

    #[serde(default)]
    pub has_side_effects: bool,
}

/// A named operation
#[async_trait]
pub trait Tool: Send + Sync {
    fn schema(&self) -> ToolSchema;

    async fn execute(&self, call: &ToolCall) -> Result<ToolResult>;

    /// Check required parameters and enum constraints before execution
    fn validate(&self, call: &ToolCall) -> Result<()> {
        for param in self.schema().parameters {
            match call.arguments.get(&param.name) {
                None if param.required => {
                    return Err(AgentError::ToolValidation(format!(
                        "Missing required parameter: {}",
                        param.name
                    )));
                }
                Some(value) => {
                    if let Some(allowed) = &param.enum_values {
                        if !allowed.contains(value) {
                            return Err(AgentError::ToolValidation(format!(
                                "Invalid value for {}: {value}",
                                param.name
                            )));
                        }
                    }
                }
                None => {}
            }
        }
        Ok(())
    }
}

/// Registry for available tools, ordered by name
#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        self.register_boxed(Arc::new(tool));
    }

    pub fn register_boxed(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.schema().name;
        if self.tools.insert(name.clone(), tool).is_some() {
            tracing::warn!(tool = %name, "Replacing previously registered tool");
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Look up, validate, then execute
    pub async fn execute(&self, call: &ToolCall) -> Result<ToolResult> {
        let tool = self
            .get(&call.name)
            .ok_or_else(|| AgentError::ToolNotFound(call.name.clone()))?;

        tool.validate(call)?;

        let result = tool.execute(call).await?;
        Ok(result.with_id(call.id.clone()))
    }

    pub fn schemas(&self) -> Vec<ToolSchema> {
        self.tools.values().map(|t| t.schema()).collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoSymbol;

    #[async_trait]
    impl Tool for EchoSymbol {
        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: "echo_symbol".into(),
                description: "Returns the symbol it was given".into(),
                parameters: vec![
                    ParameterSchema::required("symbol", "string", "Ticker symbol"),
                    ParameterSchema::optional("timeframe", "string", "Candle timeframe", None)
                        .one_of(&["1h", "4h", "1d"]),
                ],
                category: Some("testing".into()),
                has_side_effects: false,
            }
        }

        async fn execute(&self, call: &ToolCall) -> Result<ToolResult> {
            let symbol = call.require_str("symbol")?;
            Ok(ToolResult::success("echo_symbol", symbol).with_data(json!({ "symbol": symbol })))
        }
    }

    #[tokio::test]
    async fn test_registry_executes_and_echoes_id() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoSymbol);

        let mut call = ToolCall::new("echo_symbol").arg("symbol", "BTC");
        call.id = Some("call-1".into());

        let result = registry.execute(&call).await.unwrap();
        assert!(result.success);
        assert_eq!(result.output, "BTC");
        assert_eq!(result.id.as_deref(), Some("call-1"));
        assert_eq!(result.data.unwrap()["symbol"], "BTC");
    }

    #[tokio::test]
    async fn test_registry_rejects_missing_and_invalid_arguments() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoSymbol);

        let missing = registry.execute(&ToolCall::new("echo_symbol")).await;
        assert!(matches!(missing, Err(AgentError::ToolValidation(_))));

        let bad_enum = ToolCall::new("echo_symbol")
            .arg("symbol", "ETH")
            .arg("timeframe", "7m");
        assert!(matches!(
            registry.execute(&bad_enum).await,
            Err(AgentError::ToolValidation(_))
        ));

        let unknown = registry.execute(&ToolCall::new("nope")).await;
        assert!(matches!(unknown, Err(AgentError::ToolNotFound(_))));
    }

    #[test]
    fn test_call_argument_accessors() {
        let call = ToolCall::new("batch_analysis")
            .arg("symbols", json!(["BTC", 3, "ETH"]))
            .arg("position_size", 2.5)
            .arg("lookback", 100)
            .arg("verbose", true);

        assert_eq!(
            call.str_list_arg("symbols").unwrap(),
            vec!["BTC".to_string(), "ETH".to_string()]
        );
        assert_eq!(call.f64_arg("position_size"), Some(2.5));
        assert_eq!(call.f64_arg("lookback"), Some(100.0));
        assert_eq!(call.u64_arg("lookback"), Some(100));
        assert_eq!(call.bool_arg("verbose"), Some(true));
        assert!(call.str_arg("missing").is_none());
    }
}
