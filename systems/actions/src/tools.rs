//! Named tool calls issued by language-model agents.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;
use turngrid_core::{ElementId, Event, GridCoordinate, ItemType, ViewDirection};
use turngrid_world::World;

use crate::{execute_action, GameAction};

/// Names of every tool an agent may call.
pub const TOOL_NAMES: [&str; 8] = [
    "move",
    "talk",
    "flip",
    "pickup_item",
    "drop_item",
    "give_item",
    "attack",
    "look",
];

/// A tool invocation requested by an agent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Identifier echoed back in the response.
    pub id: String,
    /// Name of the tool.
    pub name: String,
    /// Named arguments.
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

impl ToolCall {
    /// Creates a call. Non-object arguments are treated as no arguments.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        let arguments = match arguments {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// Reply relayed back to the agent after a tool call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResponse {
    /// Identifier of the call being answered.
    pub tool_call_id: String,
    /// Natural-language result or error.
    pub content: String,
    /// Whether the tool took effect.
    pub success: bool,
}

impl ToolResponse {
    fn failure(call: &ToolCall, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: call.id.clone(),
            content: content.into(),
            success: false,
        }
    }
}

/// Reasons a tool call cannot be turned into a game action.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ToolError {
    /// No tool with the name exists.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),
    /// A required argument was not supplied.
    #[error("Missing required argument: {0}")]
    MissingArgument(&'static str),
    /// An argument had the wrong shape.
    #[error("Argument {name} must be {expected}")]
    InvalidArgument {
        /// Argument name.
        name: &'static str,
        /// Description of the accepted values.
        expected: &'static str,
    },
    /// The item type is not one of the known types.
    #[error("Invalid item type: {0}")]
    InvalidItemType(String),
    /// The direction is not one of left, right, up or down.
    #[error("Invalid direction: {0}")]
    InvalidDirection(String),
}

/// Reports whether a tool with the name exists.
#[must_use]
pub fn is_tool_supported(name: &str) -> bool {
    TOOL_NAMES.contains(&name)
}

/// Reports whether the call names a known tool with well-formed arguments.
#[must_use]
pub fn validate(call: &ToolCall) -> bool {
    parse_tool_call(call).is_ok()
}

/// Translates a tool call into the game action it requests.
///
/// # Errors
///
/// Returns a [`ToolError`] when the tool is unknown or an argument is missing
/// or malformed.
pub fn parse_tool_call(call: &ToolCall) -> Result<GameAction, ToolError> {
    let arguments = &call.arguments;
    match call.name.as_str() {
        "move" => Ok(GameAction::Move {
            to: GridCoordinate::new(
                coordinate_argument(arguments, "row")?,
                coordinate_argument(arguments, "col")?,
            ),
        }),
        "talk" => Ok(GameAction::Talk {
            message: string_argument(arguments, "message")?.to_owned(),
        }),
        "flip" => Ok(GameAction::Flip),
        "pickup_item" => Ok(GameAction::Pickup {
            item: id_argument(arguments, "itemId")?,
        }),
        "drop_item" => Ok(GameAction::Drop {
            item_type: item_type_argument(arguments, "itemType")?,
        }),
        "give_item" => Ok(GameAction::Give {
            to: id_argument(arguments, "targetCharacterId")?,
            item_type: item_type_argument(arguments, "itemType")?,
        }),
        "attack" => Ok(GameAction::Attack {
            target: id_argument(arguments, "targetId")?,
        }),
        "look" => Ok(GameAction::Look {
            direction: direction_argument(arguments, "direction")?,
        }),
        other => Err(ToolError::UnknownTool(other.to_owned())),
    }
}

fn integer_argument(arguments: &Map<String, Value>, name: &'static str) -> Result<i64, ToolError> {
    let value = arguments
        .get(name)
        .ok_or(ToolError::MissingArgument(name))?;
    value
        .as_i64()
        .or_else(|| {
            value
                .as_f64()
                .filter(|number| number.fract() == 0.0)
                .map(|number| number as i64)
        })
        .or_else(|| value.as_str().and_then(|text| text.trim().parse().ok()))
        .ok_or(ToolError::InvalidArgument {
            name,
            expected: "an integer",
        })
}

fn coordinate_argument(arguments: &Map<String, Value>, name: &'static str) -> Result<i32, ToolError> {
    i32::try_from(integer_argument(arguments, name)?).map_err(|_| ToolError::InvalidArgument {
        name,
        expected: "a grid index",
    })
}

fn id_argument(arguments: &Map<String, Value>, name: &'static str) -> Result<ElementId, ToolError> {
    u32::try_from(integer_argument(arguments, name)?)
        .map(ElementId::new)
        .map_err(|_| ToolError::InvalidArgument {
            name,
            expected: "a non-negative element id",
        })
}

fn string_argument<'a>(
    arguments: &'a Map<String, Value>,
    name: &'static str,
) -> Result<&'a str, ToolError> {
    arguments
        .get(name)
        .ok_or(ToolError::MissingArgument(name))?
        .as_str()
        .ok_or(ToolError::InvalidArgument {
            name,
            expected: "a string",
        })
}

fn item_type_argument(
    arguments: &Map<String, Value>,
    name: &'static str,
) -> Result<ItemType, ToolError> {
    let text = string_argument(arguments, name)?;
    text.parse()
        .map_err(|_| ToolError::InvalidItemType(text.to_owned()))
}

fn direction_argument(
    arguments: &Map<String, Value>,
    name: &'static str,
) -> Result<Option<ViewDirection>, ToolError> {
    match arguments.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(_) => {
            let text = string_argument(arguments, name)?;
            text.parse()
                .map(Some)
                .map_err(|_| ToolError::InvalidDirection(text.to_owned()))
        }
    }
}

/// Executes tool calls on behalf of one character.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ToolDispatcher {
    actor: ElementId,
}

impl ToolDispatcher {
    /// Creates a dispatcher acting as `actor`.
    #[must_use]
    pub const fn new(actor: ElementId) -> Self {
        Self { actor }
    }

    /// Character the dispatcher acts for.
    #[must_use]
    pub const fn actor(&self) -> ElementId {
        self.actor
    }

    /// Runs the call against the world, forwarding emitted events to `out_events`.
    ///
    /// Malformed calls never reach the world; their error is returned as the
    /// response content.
    pub fn execute(
        &self,
        world: &mut World,
        call: &ToolCall,
        out_events: &mut Vec<Event>,
    ) -> ToolResponse {
        debug!("{} calls {} {:?}", self.actor, call.name, call.arguments);
        let action = match parse_tool_call(call) {
            Ok(action) => action,
            Err(error) => {
                warn!("rejected tool call {} from {}: {error}", call.name, self.actor);
                return ToolResponse::failure(call, error.to_string());
            }
        };

        let outcome = execute_action(world, self.actor, action);
        out_events.extend(outcome.events);
        ToolResponse {
            tool_call_id: call.id.clone(),
            content: outcome.message,
            success: outcome.success,
        }
    }
}

/// Function definitions for every tool, in the JSON shape chat-completion
/// APIs expect.
#[must_use]
pub fn tool_catalog() -> Value {
    let item_types: Vec<String> = ItemType::ALL
        .iter()
        .map(|item_type| item_type.to_string())
        .collect();

    Value::Array(vec![
        function(
            "move",
            "Move your character to a cell of the grid.",
            json!({
                "row": { "type": "integer", "description": "Destination row." },
                "col": { "type": "integer", "description": "Destination column." }
            }),
            &["row", "col"],
        ),
        function(
            "talk",
            "Say something out loud to the characters around you.",
            json!({
                "message": { "type": "string", "description": "What to say." }
            }),
            &["message"],
        ),
        function(
            "flip",
            "Turn around to face the opposite direction.",
            json!({}),
            &[],
        ),
        function(
            "pickup_item",
            "Pick up an item within reach.",
            json!({
                "itemId": { "type": "integer", "description": "Identifier of the item." }
            }),
            &["itemId"],
        ),
        function(
            "drop_item",
            "Drop an item from your inventory onto your cell.",
            json!({
                "itemType": { "type": "string", "enum": item_types, "description": "Item to drop." }
            }),
            &["itemType"],
        ),
        function(
            "give_item",
            "Give an item from your inventory to a nearby character.",
            json!({
                "targetCharacterId": { "type": "integer", "description": "Receiving character." },
                "itemType": { "type": "string", "enum": item_types, "description": "Item to give." }
            }),
            &["targetCharacterId", "itemType"],
        ),
        function(
            "attack",
            "Attack an adjacent character or destructible obstacle.",
            json!({
                "targetId": { "type": "integer", "description": "Element to attack." }
            }),
            &["targetId"],
        ),
        function(
            "look",
            "Look in a direction, or straight ahead when none is given.",
            json!({
                "direction": {
                    "type": "string",
                    "enum": ["left", "right", "up", "down"],
                    "description": "Direction to look in."
                }
            }),
            &[],
        ),
    ])
}

fn function(name: &str, description: &str, properties: Value, required: &[&str]) -> Value {
    json!({
        "type": "function",
        "function": {
            "name": name,
            "description": description,
            "parameters": {
                "type": "object",
                "properties": properties,
                "required": required
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, arguments: Value) -> ToolCall {
        ToolCall::new("call-1", name, arguments)
    }

    #[test]
    fn move_accepts_numbers_and_numeric_strings() {
        let parsed = parse_tool_call(&call("move", json!({ "row": 2, "col": "7" })));
        assert_eq!(
            parsed,
            Ok(GameAction::Move {
                to: GridCoordinate::new(2, 7)
            })
        );
        assert_eq!(
            parse_tool_call(&call("move", json!({ "row": 2.0, "col": 1 }))),
            Ok(GameAction::Move {
                to: GridCoordinate::new(2, 1)
            })
        );
    }

    #[test]
    fn missing_and_malformed_arguments_are_reported() {
        assert_eq!(
            parse_tool_call(&call("move", json!({ "row": 2 }))),
            Err(ToolError::MissingArgument("col"))
        );
        assert_eq!(
            parse_tool_call(&call("attack", json!({ "targetId": -3 }))),
            Err(ToolError::InvalidArgument {
                name: "targetId",
                expected: "a non-negative element id"
            })
        );
        assert_eq!(
            parse_tool_call(&call("drop_item", json!({ "itemType": "sword" })))
                .map_err(|error| error.to_string()),
            Err(String::from("Invalid item type: sword"))
        );
    }

    #[test]
    fn item_types_and_directions_ignore_case() {
        assert_eq!(
            parse_tool_call(&call(
                "give_item",
                json!({ "targetCharacterId": 4, "itemType": "KEY" })
            )),
            Ok(GameAction::Give {
                to: ElementId::new(4),
                item_type: ItemType::Key
            })
        );
        assert_eq!(
            parse_tool_call(&call("look", json!({ "direction": "Up" }))),
            Ok(GameAction::Look {
                direction: Some(ViewDirection::Up)
            })
        );
        assert_eq!(
            parse_tool_call(&call("look", json!({}))),
            Ok(GameAction::Look { direction: None })
        );
    }

    #[test]
    fn unknown_tools_are_rejected() {
        assert!(!is_tool_supported("teleport"));
        assert!(is_tool_supported("give_item"));
        let error = parse_tool_call(&call("teleport", json!({}))).expect_err("unknown tool");
        assert_eq!(error.to_string(), "Unknown tool: teleport");
        assert!(!validate(&call("teleport", json!({}))));
        assert!(validate(&call("flip", Value::Null)));
    }

    #[test]
    fn catalog_lists_every_tool_once() {
        let catalog = tool_catalog();
        let names: Vec<&str> = catalog
            .as_array()
            .expect("catalog is an array")
            .iter()
            .filter_map(|entry| entry["function"]["name"].as_str())
            .collect();
        assert_eq!(names, TOOL_NAMES);
        assert_eq!(
            catalog[3]["function"]["parameters"]["required"],
            json!(["itemId"])
        );
        assert_eq!(
            catalog[4]["function"]["parameters"]["properties"]["itemType"]["enum"],
            json!(["Key", "Money", "Apple"])
        );
    }

    #[test]
    fn calls_deserialize_from_json() {
        let parsed: ToolCall = serde_json::from_value(json!({
            "id": "abc",
            "name": "talk",
            "arguments": { "message": "hi" }
        }))
        .expect("valid call");
        assert_eq!(
            parse_tool_call(&parsed),
            Ok(GameAction::Talk {
                message: String::from("hi")
            })
        );
    }
}
