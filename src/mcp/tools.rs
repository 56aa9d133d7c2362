use crate::types::sheets::CellValue;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use thiserror::Error as ThisError;

/// The fixed catalog of callable tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    ReadRange,
    WriteRange,
    AppendRow,
}

impl Tool {
    pub const ALL: [Tool; 3] = [Tool::ReadRange, Tool::WriteRange, Tool::AppendRow];

    pub fn name(self) -> &'static str {
        match self {
            Tool::ReadRange => "sheets.read_range",
            Tool::WriteRange => "sheets.write_range",
            Tool::AppendRow => "sheets.append_row",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    pub fn description(self) -> &'static str {
        match self {
            Tool::ReadRange => "Read values from a Google Sheet range",
            Tool::WriteRange => "Write values to a Google Sheet range",
            Tool::AppendRow => "Append a new row to a Google Sheet",
        }
    }

    pub fn input_schema(self) -> Value {
        let cell = json!({"type": "string"});
        match self {
            Tool::ReadRange => json!({
                "type": "object",
                "properties": {
                    "spreadsheet_id": {"type": "string"},
                    "range": {"type": "string"},
                },
                "required": ["spreadsheet_id", "range"],
            }),
            Tool::WriteRange => json!({
                "type": "object",
                "properties": {
                    "spreadsheet_id": {"type": "string"},
                    "range": {"type": "string"},
                    "values": {
                        "type": "array",
                        "items": {"type": "array", "items": cell},
                    },
                },
                "required": ["spreadsheet_id", "range", "values"],
            }),
            Tool::AppendRow => json!({
                "type": "object",
                "properties": {
                    "spreadsheet_id": {"type": "string"},
                    "range": {"type": "string"},
                    "values": {"type": "array", "items": cell},
                },
                "required": ["spreadsheet_id", "range", "values"],
            }),
        }
    }

    /// Catalog entry as listed by `tools/list`.
    pub fn descriptor(self) -> Value {
        json!({
            "name": self.name(),
            "description": self.description(),
            "inputSchema": self.input_schema(),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReadRangeArgs {
    pub spreadsheet_id: String,
    pub range: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WriteRangeArgs {
    pub spreadsheet_id: String,
    pub range: String,
    pub values: Vec<Vec<CellValue>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppendRowArgs {
    pub spreadsheet_id: String,
    pub range: String,
    pub values: Vec<CellValue>,
}

/// A validated tool invocation.
#[derive(Debug, Clone)]
pub enum ToolCall {
    ReadRange(ReadRangeArgs),
    WriteRange(WriteRangeArgs),
    AppendRow(AppendRowArgs),
}

#[derive(Debug, ThisError)]
pub enum ToolCallError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for {tool}: {source}")]
    InvalidArguments {
        tool: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid arguments for {tool}: `{field}` must not be empty")]
    EmptyField {
        tool: &'static str,
        field: &'static str,
    },
}

impl ToolCall {
    /// Resolve `name` against the catalog and check `arguments` against its shape.
    pub fn parse(name: &str, arguments: Value) -> Result<Self, ToolCallError> {
        let tool =
            Tool::from_name(name).ok_or_else(|| ToolCallError::UnknownTool(name.to_string()))?;
        let call = match tool {
            Tool::ReadRange => ToolCall::ReadRange(decode(tool, arguments)?),
            Tool::WriteRange => ToolCall::WriteRange(decode(tool, arguments)?),
            Tool::AppendRow => ToolCall::AppendRow(decode(tool, arguments)?),
        };
        call.check_non_empty()?;
        Ok(call)
    }

    pub fn tool(&self) -> Tool {
        match self {
            ToolCall::ReadRange(_) => Tool::ReadRange,
            ToolCall::WriteRange(_) => Tool::WriteRange,
            ToolCall::AppendRow(_) => Tool::AppendRow,
        }
    }

    fn check_non_empty(&self) -> Result<(), ToolCallError> {
        let (spreadsheet_id, range, has_values) = match self {
            ToolCall::ReadRange(a) => (&a.spreadsheet_id, &a.range, true),
            ToolCall::WriteRange(a) => (&a.spreadsheet_id, &a.range, !a.values.is_empty()),
            ToolCall::AppendRow(a) => (&a.spreadsheet_id, &a.range, !a.values.is_empty()),
        };
        let tool = self.tool().name();
        let empty = |field| Err(ToolCallError::EmptyField { tool, field });
        if spreadsheet_id.trim().is_empty() {
            return empty("spreadsheet_id");
        }
        if range.trim().is_empty() {
            return empty("range");
        }
        if !has_values {
            return empty("values");
        }
        Ok(())
    }
}

fn decode<T: DeserializeOwned>(tool: Tool, arguments: Value) -> Result<T, ToolCallError> {
    let arguments = if arguments.is_null() {
        Value::Object(Default::default())
    } else {
        arguments
    };
    serde_json::from_value(arguments).map_err(|source| ToolCallError::InvalidArguments {
        tool: tool.name(),
        source,
    })
}
