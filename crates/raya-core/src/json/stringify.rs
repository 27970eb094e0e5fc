//! Fast JSON stringifier for JsonValue
//!
//! Converts JsonValue to JSON string representation with proper escaping.

use super::JsonValue;
use crate::{VmError, VmResult};
use std::fmt::Write;

/// Convert a JsonValue to a JSON string
///
/// This stringifier:
/// - Properly escapes strings
/// - Handles all JSON value types
/// - Returns error for NaN/Infinity
/// - Converts Undefined to null
pub fn stringify(value: &JsonValue) -> VmResult<String> {
    let mut output = String::new();
    stringify_impl(value, &mut output)?;
    Ok(output)
}

/// Internal recursive stringification
fn stringify_impl(value: &JsonValue, output: &mut String) -> VmResult<()> {
    match value {
        JsonValue::Null | JsonValue::Undefined => {
            output.push_str("null");
        }

        JsonValue::Bool(b) => {
            output.push_str(if *b { "true" } else { "false" });
        }

        JsonValue::Number(n) => {
            if n.is_nan() || n.is_infinite() {
                return Err(VmError::RuntimeError(
                    "Cannot stringify NaN or Infinity".to_string(),
                ));
            }
            // Use Rust's f64 Display which handles formatting nicely
            write!(output, "{}", n).unwrap();
        }

        JsonValue::String(s_ptr) => {
            let s = unsafe { &*s_ptr.as_ptr() };
            output.push('"');
            escape_string(&s.data, output);
            output.push('"');
        }

        JsonValue::Array(arr_ptr) => {
            let arr = unsafe { &*arr_ptr.as_ptr() };
            output.push('[');

            for (i, elem) in arr.iter().enumerate() {
                if i > 0 {
                    output.push(',');
                }
                stringify_impl(elem, output)?;
            }

            output.push(']');
        }

        JsonValue::Object(obj_ptr) => {
            let obj = unsafe { &*obj_ptr.as_ptr() };
            output.push('{');

            let mut first = true;
            for (key, value) in obj.iter() {
                if !first {
                    output.push(',');
                }
                first = false;

                output.push('"');
                escape_string(key, output);
                output.push('"');
                output.push(':');
                stringify_impl(value, output)?;
            }

            output.push('}');
        }
    }

    Ok(())
}

/// Escape a string for JSON
///
/// Escapes: " \ / \b \f \n \r \t and control characters
fn escape_string(s: &str, output: &mut String) {
    for ch in s.chars() {
        match ch {
            '"' => output.push_str("\\\""),
            '\\' => output.push_str("\\\\"),
            '/' => output.push_str("\\/"),
            '\x08' => output.push_str("\\b"),
            '\x0C' => output.push_str("\\f"),
            '\n' => output.push_str("\\n"),
            '\r' => output.push_str("\\r"),
            '\t' => output.push_str("\\t"),
            c if c.is_control() => {
                // Escape control characters as \uXXXX
                write!(output, "\\u{:04x}", c as u32).unwrap();
            }
            c => output.push(c),
        }
    }
}
