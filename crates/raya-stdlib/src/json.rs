//! JSON parsing and stringification implementation
//!
//! This module provides native implementations of JSON.parse() and JSON.stringify()
//! using Raya's custom high-performance JSON parser.

use raya_core::gc::GarbageCollector;
use raya_core::json::JsonValue;
use raya_core::object::RayaString;
use raya_core::VmResult;

/// Parse a JSON string into a JsonValue
///
/// This function uses Raya's custom JSON parser that directly creates
/// JsonValue with GC-managed allocations, avoiding intermediate representations.
///
/// # Arguments
///
/// * `json_str` - The JSON string to parse
/// * `gc` - Garbage collector for allocating heap objects
///
/// # Returns
///
/// A JsonValue on success, or a VmError on parse failure
///
/// # Example
///
/// ```raya
/// let data = JSON.parse('{"name": "Alice", "age": 30}');
/// console.log(data.name);  // "Alice"
/// ```
pub fn parse(json_str: &RayaString, gc: &mut GarbageCollector) -> VmResult<JsonValue> {
    raya_core::json::parser::parse(&json_str.data, gc)
}

/// Convert a JsonValue to a JSON string
///
/// This function uses Raya's custom JSON stringifier that efficiently
/// converts JsonValue to JSON string representation.
///
/// # Arguments
///
/// * `json_value` - The JsonValue to stringify
/// * `gc` - Garbage collector (unused but kept for API consistency)
///
/// # Returns
///
/// A RayaString containing the JSON representation
///
/// # Example
///
/// ```raya
/// let obj: json = { name: "Alice", age: 30 };
/// let str = JSON.stringify(obj);  // '{"name":"Alice","age":30}'
/// ```
pub fn stringify(json_value: &JsonValue, _gc: &mut GarbageCollector) -> VmResult<RayaString> {
    let json_str = raya_core::json::stringify::stringify(json_value)?;
    Ok(RayaString::new(json_str))
}
