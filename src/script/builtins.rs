//! Global bindings and the built-in methods of arrays, strings and numbers.
//!
//! Strings are indexed by `char` rather than by UTF-16 code unit.

use super::environment::Env;
use super::error::{invalid_argument, invalid_string_length, EvalResult};
use super::interpreter::Interpreter;
use super::value::{number_to_string, NativeFn, ObjectMap, Value};
use crate::constants::limits::MAX_STRING_LENGTH;
use crate::escape::{escape_html, unescape_html};
use std::cell::RefCell;
use std::rc::Rc;

/// Names bound in the global scope of every render.
pub const GLOBAL_NAMES: &[&str] =
    &["_", "undefined", "NaN", "Infinity", "String", "Number", "Boolean"];

/// Builds the global scope.
pub fn globals() -> Env {
    let env = Env::root();
    env.define("undefined", Value::Undefined, false);
    env.define("NaN", Value::Number(f64::NAN), false);
    env.define("Infinity", Value::Number(f64::INFINITY), false);
    env.define("String", Value::native("String", to_string), false);
    env.define("Number", Value::native("Number", to_number), false);
    env.define("Boolean", Value::native("Boolean", to_boolean), false);
    env.define("_", utility(), false);
    env
}

/// The `_` helper object.
fn utility() -> Value {
    let functions: [(&'static str, NativeFn); 8] = [
        ("escape", escape),
        ("unescape", unescape),
        ("each", each),
        ("map", map),
        ("keys", keys),
        ("values", values),
        ("size", size),
        ("isEmpty", is_empty),
    ];
    let map: ObjectMap = functions
        .into_iter()
        .map(|(name, call)| (name.to_string(), Value::native(name, call)))
        .collect();
    Value::object(map)
}

fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or_default()
}

fn to_string(_: &mut Interpreter, args: &[Value]) -> EvalResult<Value> {
    Ok(match args.first() {
        Some(value) => Value::string(value.to_js_string()),
        None => Value::string(""),
    })
}

fn to_number(_: &mut Interpreter, args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Number(args.first().map_or(0.0, Value::to_number)))
}

fn to_boolean(_: &mut Interpreter, args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Bool(arg(args, 0).truthy()))
}

fn escape(_: &mut Interpreter, args: &[Value]) -> EvalResult<Value> {
    let value = arg(args, 0);
    if value.is_nullish() {
        return Ok(Value::string(""));
    }
    Ok(Value::string(escape_html(&value.to_js_string()).into_owned()))
}

fn unescape(_: &mut Interpreter, args: &[Value]) -> EvalResult<Value> {
    let value = arg(args, 0);
    if value.is_nullish() {
        return Ok(Value::string(""));
    }
    Ok(Value::string(unescape_html(&value.to_js_string()).into_owned()))
}

/// `(value, key)` pairs of an array or object; empty for anything else.
fn entries(list: &Value) -> Vec<(Value, Value)> {
    match list {
        Value::Array(items) => items
            .borrow()
            .iter()
            .enumerate()
            .map(|(i, item)| (item.clone(), Value::Number(i as f64)))
            .collect(),
        Value::Object(map) => map
            .borrow()
            .iter()
            .map(|(key, value)| (value.clone(), Value::string(key.as_str())))
            .collect(),
        _ => Vec::new(),
    }
}

fn each(interpreter: &mut Interpreter, args: &[Value]) -> EvalResult<Value> {
    let list = arg(args, 0);
    let iteratee = arg(args, 1);
    for (value, key) in entries(&list) {
        interpreter.call(&iteratee, vec![value, key, list.clone()])?;
    }
    Ok(list)
}

fn map(interpreter: &mut Interpreter, args: &[Value]) -> EvalResult<Value> {
    let list = arg(args, 0);
    let iteratee = arg(args, 1);
    let mut results = Vec::new();
    for (value, key) in entries(&list) {
        results.push(interpreter.call(&iteratee, vec![value, key, list.clone()])?);
    }
    Ok(Value::array(results))
}

fn keys(_: &mut Interpreter, args: &[Value]) -> EvalResult<Value> {
    let keys = entries(&arg(args, 0))
        .into_iter()
        .map(|(_, key)| Value::string(key.to_property_key()))
        .collect();
    Ok(Value::array(keys))
}

fn values(_: &mut Interpreter, args: &[Value]) -> EvalResult<Value> {
    let values = entries(&arg(args, 0)).into_iter().map(|(value, _)| value).collect();
    Ok(Value::array(values))
}

fn length_of(value: &Value) -> usize {
    match value {
        Value::Array(items) => items.borrow().len(),
        Value::Object(map) => map.borrow().len(),
        Value::String(s) => s.chars().count(),
        _ => 0,
    }
}

fn size(_: &mut Interpreter, args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Number(length_of(&arg(args, 0)) as f64))
}

fn is_empty(_: &mut Interpreter, args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Bool(length_of(&arg(args, 0)) == 0))
}

/// `ToIntegerOrInfinity`, with NaN mapped to zero.
fn to_integer(value: &Value) -> f64 {
    let n = value.to_number();
    if n.is_nan() {
        0.0
    } else {
        n.trunc()
    }
}

/// Resolves `slice(start, end)` arguments against a length.
fn slice_bounds(len: usize, args: &[Value]) -> (usize, usize) {
    let resolve = |value: &Value, default: usize| -> usize {
        if matches!(value, Value::Undefined) {
            return default;
        }
        let n = to_integer(value);
        if n < 0.0 {
            (len as f64 + n).max(0.0) as usize
        } else {
            n.min(len as f64) as usize
        }
    };
    let start = resolve(&arg(args, 0), 0);
    let end = resolve(&arg(args, 1), len);
    (start, end.max(start))
}

/// Calls a built-in method on `receiver`, or returns `None` if the receiver
/// has no built-in method of that name.
pub fn call_method(
    interpreter: &mut Interpreter,
    receiver: &Value,
    name: &str,
    args: &[Value],
) -> EvalResult<Option<Value>> {
    match receiver {
        Value::Array(items) => array_method(interpreter, items, receiver, name, args),
        Value::String(s) => string_method(s, name, args),
        Value::Number(n) => number_method(*n, name, args),
        Value::Bool(b) if name == "toString" => Ok(Some(Value::string(b.to_string()))),
        _ => Ok(None),
    }
}

fn array_method(
    interpreter: &mut Interpreter,
    items: &Rc<RefCell<Vec<Value>>>,
    receiver: &Value,
    name: &str,
    args: &[Value],
) -> EvalResult<Option<Value>> {
    let result = match name {
        "push" => {
            let mut items = items.borrow_mut();
            items.extend(args.iter().cloned());
            Value::Number(items.len() as f64)
        }
        "pop" => items.borrow_mut().pop().unwrap_or_default(),
        "join" | "toString" => {
            let separator = match arg(args, 0) {
                Value::Undefined => ",".to_string(),
                other => other.to_js_string(),
            };
            let joined = items
                .borrow()
                .iter()
                .map(|item| if item.is_nullish() { String::new() } else { item.to_js_string() })
                .collect::<Vec<_>>()
                .join(&separator);
            Value::string(joined)
        }
        "indexOf" => {
            let needle = arg(args, 0);
            let position = items.borrow().iter().position(|item| item.strict_equals(&needle));
            Value::Number(position.map_or(-1.0, |i| i as f64))
        }
        "includes" => {
            let needle = arg(args, 0);
            Value::Bool(items.borrow().iter().any(|item| item.strict_equals(&needle)))
        }
        "slice" => {
            let items = items.borrow();
            let (start, end) = slice_bounds(items.len(), args);
            Value::array(items[start..end].to_vec())
        }
        "concat" => {
            let mut joined = items.borrow().clone();
            for value in args {
                match value {
                    Value::Array(other) => joined.extend(other.borrow().iter().cloned()),
                    other => joined.push(other.clone()),
                }
            }
            Value::array(joined)
        }
        "forEach" | "map" | "filter" => {
            let callback = arg(args, 0);
            let snapshot = items.borrow().clone();
            let mut results = Vec::new();
            for (i, item) in snapshot.into_iter().enumerate() {
                let index = Value::Number(i as f64);
                let returned = interpreter.call(&callback, vec![item.clone(), index, receiver.clone()])?;
                match name {
                    "map" => results.push(returned),
                    "filter" if returned.truthy() => results.push(item),
                    _ => {}
                }
            }
            if name == "forEach" {
                Value::Undefined
            } else {
                Value::array(results)
            }
        }
        _ => return Ok(None),
    };
    Ok(Some(result))
}

fn char_index(haystack: &str, byte_index: usize) -> f64 {
    haystack[..byte_index].chars().count() as f64
}

fn string_method(s: &Rc<str>, name: &str, args: &[Value]) -> EvalResult<Option<Value>> {
    let text = || arg(args, 0).to_js_string();
    let result = match name {
        "toString" => Value::String(s.clone()),
        "toUpperCase" => Value::string(s.to_uppercase()),
        "toLowerCase" => Value::string(s.to_lowercase()),
        "trim" => Value::string(s.trim()),
        "indexOf" => Value::Number(s.find(&text()).map_or(-1.0, |i| char_index(s, i))),
        "includes" => Value::Bool(s.contains(&text())),
        "startsWith" => Value::Bool(s.starts_with(&text())),
        "endsWith" => Value::Bool(s.ends_with(&text())),
        "charAt" => {
            let index = to_integer(&arg(args, 0));
            let found = (index >= 0.0).then(|| s.chars().nth(index as usize)).flatten();
            Value::string(found.map(String::from).unwrap_or_default())
        }
        "slice" => {
            let chars: Vec<char> = s.chars().collect();
            let (start, end) = slice_bounds(chars.len(), args);
            Value::string(chars[start..end].iter().collect::<String>())
        }
        "split" => {
            let parts: Vec<Value> = match arg(args, 0) {
                Value::Undefined => vec![Value::String(s.clone())],
                separator => {
                    let separator = separator.to_js_string();
                    if separator.is_empty() {
                        s.chars().map(|c| Value::string(c.to_string())).collect()
                    } else {
                        s.split(separator.as_str()).map(Value::from).collect()
                    }
                }
            };
            Value::array(parts)
        }
        "repeat" => {
            let count = to_integer(&arg(args, 0));
            if count < 0.0 || count.is_infinite() {
                return Err(invalid_argument("String.prototype.repeat", "Invalid count value"));
            }
            let length = (count as usize).checked_mul(s.len());
            if length.is_none_or(|length| length > MAX_STRING_LENGTH) {
                return Err(invalid_string_length());
            }
            Value::string(s.repeat(count as usize))
        }
        _ => return Ok(None),
    };
    Ok(Some(result))
}

fn number_method(n: f64, name: &str, args: &[Value]) -> EvalResult<Option<Value>> {
    let result = match name {
        "toString" => Value::string(number_to_string(n)),
        "toFixed" => {
            let digits = to_integer(&arg(args, 0));
            if !(0.0..=100.0).contains(&digits) {
                return Err(invalid_argument(
                    "Number.prototype.toFixed",
                    "toFixed() digits argument must be between 0 and 100",
                ));
            }
            if n.is_finite() && n.abs() < 1e21 {
                Value::string(to_fixed(n, digits as usize))
            } else {
                Value::string(number_to_string(n))
            }
        }
        _ => return Ok(None),
    };
    Ok(Some(result))
}

/// Fixed-point formatting where exact halves round away from zero.
fn to_fixed(n: f64, digits: usize) -> String {
    let sign = if n < 0.0 { "-" } else { "" };
    let magnitude = n.abs();
    if !is_exact_half(magnitude, digits) {
        return format!("{sign}{magnitude:.digits$}");
    }
    // The expansion ends in a 5 right after the kept digits.
    let exact = format!("{magnitude:.*}", digits + 1);
    let mut kept: Vec<char> = exact.chars().collect();
    kept.pop();
    if kept.last() == Some(&'.') {
        kept.pop();
    }
    let mut carry = true;
    for c in kept.iter_mut().rev() {
        match *c {
            '.' => {}
            '9' => *c = '0',
            d => {
                *c = char::from(d as u8 + 1);
                carry = false;
                break;
            }
        }
    }
    if carry {
        kept.insert(0, '1');
    }
    format!("{sign}{}", kept.into_iter().collect::<String>())
}

/// Whether `x * 10^digits` lies exactly halfway between two integers.
///
/// With `x = m * 2^e` and `m` having `t` trailing zero bits, that product
/// doubled is `(m >> t) * 5^digits * 2^(t + e + digits + 1)`, an odd integer
/// exactly when the power of two vanishes.
fn is_exact_half(x: f64, digits: usize) -> bool {
    if x == 0.0 || !x.is_finite() {
        return false;
    }
    let bits = x.to_bits();
    let biased = ((bits >> 52) & 0x7ff) as i64;
    let fraction = bits & ((1 << 52) - 1);
    let (mantissa, exponent) = if biased == 0 {
        (fraction, -1074)
    } else {
        (fraction | (1 << 52), biased - 1075)
    };
    let trailing = i64::from(mantissa.trailing_zeros());
    trailing + exponent + digits as i64 + 1 == 0
}
