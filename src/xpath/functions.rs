//! XPath 1.0 core function library.
//!
//! Node set: position(), last(), count(), name(), local-name()
//! String: string(), concat(), starts-with(), contains(), substring(),
//!   substring-before(), substring-after(), string-length(),
//!   normalize-space(), translate()
//! Boolean: boolean(), not(), true(), false()
//! Number: number(), sum(), floor(), ceiling(), round()

use super::error::XPathError;
use super::value::XPathValue;
use crate::dom::{Document, NodeId};

/// Dispatch a function call.
pub fn call(
    name: &str,
    args: Vec<XPathValue>,
    doc: &Document,
    context: NodeId,
    position: usize,
    size: usize,
) -> Result<XPathValue, XPathError> {
    match name {
        "position" => Ok(XPathValue::Number(position as f64)),
        "last" => Ok(XPathValue::Number(size as f64)),
        "count" => {
            let [arg] = arity::<1>(name, args)?;
            match arg {
                XPathValue::NodeSet(nodes) => Ok(XPathValue::Number(nodes.len() as f64)),
                XPathValue::Strings(list) => Ok(XPathValue::Number(list.len() as f64)),
                _ => Err(XPathError::Type("count() requires a node-set".to_string())),
            }
        }
        "name" => node_name_fn(args, doc, context, |doc, id| doc.name(id).to_string()),
        "local-name" => node_name_fn(args, doc, context, |doc, id| doc.local_name(id).to_string()),

        "string" => Ok(XPathValue::String(match args.into_iter().next() {
            Some(arg) => resolve_string(&arg, doc),
            None => doc.string_value(context),
        })),
        "concat" => {
            if args.len() < 2 {
                return Err(XPathError::Type(
                    "concat() requires at least 2 arguments".to_string(),
                ));
            }
            let result: String = args.iter().map(|a| resolve_string(a, doc)).collect();
            Ok(XPathValue::String(result))
        }
        "starts-with" => {
            let [s, prefix] = arity::<2>(name, args)?;
            Ok(XPathValue::Boolean(
                resolve_string(&s, doc).starts_with(&resolve_string(&prefix, doc)),
            ))
        }
        "contains" => {
            let [s, needle] = arity::<2>(name, args)?;
            Ok(XPathValue::Boolean(
                resolve_string(&s, doc).contains(&resolve_string(&needle, doc)),
            ))
        }
        "substring" => fn_substring(args, doc),
        "substring-before" => {
            let [s, pattern] = arity::<2>(name, args)?;
            let s = resolve_string(&s, doc);
            let pattern = resolve_string(&pattern, doc);
            let result = s.find(&pattern).map(|pos| s[..pos].to_string());
            Ok(XPathValue::String(result.unwrap_or_default()))
        }
        "substring-after" => {
            let [s, pattern] = arity::<2>(name, args)?;
            let s = resolve_string(&s, doc);
            let pattern = resolve_string(&pattern, doc);
            let result = s
                .find(&pattern)
                .map(|pos| s[pos + pattern.len()..].to_string());
            Ok(XPathValue::String(result.unwrap_or_default()))
        }
        "string-length" => {
            let s = match args.into_iter().next() {
                Some(arg) => resolve_string(&arg, doc),
                None => doc.string_value(context),
            };
            Ok(XPathValue::Number(s.chars().count() as f64))
        }
        "normalize-space" => {
            let s = match args.into_iter().next() {
                Some(arg) => resolve_string(&arg, doc),
                None => doc.string_value(context),
            };
            let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ");
            Ok(XPathValue::String(normalized))
        }
        "translate" => {
            let [s, from, to] = arity::<3>(name, args)?;
            let s = resolve_string(&s, doc);
            let from: Vec<char> = resolve_string(&from, doc).chars().collect();
            let to: Vec<char> = resolve_string(&to, doc).chars().collect();
            let result: String = s
                .chars()
                .filter_map(|c| match from.iter().position(|&fc| fc == c) {
                    Some(pos) => to.get(pos).copied(),
                    None => Some(c),
                })
                .collect();
            Ok(XPathValue::String(result))
        }

        "boolean" => {
            let [arg] = arity::<1>(name, args)?;
            Ok(XPathValue::Boolean(arg.to_boolean()))
        }
        "not" => {
            let [arg] = arity::<1>(name, args)?;
            Ok(XPathValue::Boolean(!arg.to_boolean()))
        }
        "true" => Ok(XPathValue::Boolean(true)),
        "false" => Ok(XPathValue::Boolean(false)),

        "number" => {
            let value = match args.into_iter().next() {
                Some(XPathValue::NodeSet(nodes)) => {
                    resolve_nodeset_string(&nodes, doc).trim().parse().unwrap_or(f64::NAN)
                }
                Some(arg) => arg.to_number(),
                None => doc.string_value(context).trim().parse().unwrap_or(f64::NAN),
            };
            Ok(XPathValue::Number(value))
        }
        "sum" => {
            let [arg] = arity::<1>(name, args)?;
            match arg {
                XPathValue::NodeSet(nodes) => {
                    let mut total = 0.0;
                    for &node in &nodes {
                        match doc.string_value(node).trim().parse::<f64>() {
                            Ok(n) => total += n,
                            Err(_) => return Ok(XPathValue::Number(f64::NAN)),
                        }
                    }
                    Ok(XPathValue::Number(total))
                }
                _ => Err(XPathError::Type("sum() requires a node-set".to_string())),
            }
        }
        "floor" => {
            let [arg] = arity::<1>(name, args)?;
            Ok(XPathValue::Number(arg.to_number().floor()))
        }
        "ceiling" => {
            let [arg] = arity::<1>(name, args)?;
            Ok(XPathValue::Number(arg.to_number().ceil()))
        }
        "round" => {
            let [arg] = arity::<1>(name, args)?;
            let n = arg.to_number();
            // Halves round toward positive infinity.
            let rounded = if n.fract().abs() == 0.5 { n.ceil() } else { n.round() };
            Ok(XPathValue::Number(rounded))
        }

        _ => Err(XPathError::UnknownFunction(name.to_string())),
    }
}

fn arity<const N: usize>(name: &str, args: Vec<XPathValue>) -> Result<[XPathValue; N], XPathError> {
    let len = args.len();
    args.try_into().map_err(|_| {
        XPathError::Type(format!("{name}() expects {N} argument(s), got {len}"))
    })
}

fn node_name_fn(
    args: Vec<XPathValue>,
    doc: &Document,
    context: NodeId,
    get: impl Fn(&Document, NodeId) -> String,
) -> Result<XPathValue, XPathError> {
    let node = match args.first() {
        None => Some(context),
        Some(XPathValue::NodeSet(nodes)) => nodes.first().copied(),
        Some(_) => {
            return Err(XPathError::Type(
                "name() argument must be a node-set".to_string(),
            ))
        }
    };
    Ok(XPathValue::String(
        node.map(|id| get(doc, id)).unwrap_or_default(),
    ))
}

fn fn_substring(args: Vec<XPathValue>, doc: &Document) -> Result<XPathValue, XPathError> {
    if args.len() < 2 || args.len() > 3 {
        return Err(XPathError::Type(
            "substring() requires 2 or 3 arguments".to_string(),
        ));
    }

    let s = resolve_string(&args[0], doc);
    // XPath positions are 1-based.
    let start = (args[1].to_number().round() as i64 - 1).max(0) as usize;
    let chars: Vec<char> = s.chars().collect();
    let start = start.min(chars.len());

    let result: String = if args.len() == 3 {
        let len = args[2].to_number().round().max(0.0) as usize;
        let end = (start + len).min(chars.len());
        chars[start..end].iter().collect()
    } else {
        chars[start..].iter().collect()
    };

    Ok(XPathValue::String(result))
}

/// String conversion with document access: the string-value of a node-set
/// is the string-value of its first node.
pub(super) fn resolve_string(val: &XPathValue, doc: &Document) -> String {
    match val {
        XPathValue::NodeSet(nodes) => resolve_nodeset_string(nodes, doc),
        _ => val.to_string_value(),
    }
}

fn resolve_nodeset_string(nodes: &[NodeId], doc: &Document) -> String {
    match nodes.first() {
        Some(&first) => doc.string_value(first),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> Document {
        Document::parse("<r>hello</r>")
    }

    #[test]
    fn test_concat() {
        let d = doc();
        let args = vec![
            XPathValue::String("a".to_string()),
            XPathValue::String("-".to_string()),
            XPathValue::String("b".to_string()),
        ];
        let result = call("concat", args, &d, 0, 1, 1).unwrap();
        assert_eq!(result.to_string_value(), "a-b");
    }

    #[test]
    fn test_contains() {
        let d = doc();
        let args = vec![
            XPathValue::String("hello world".to_string()),
            XPathValue::String("world".to_string()),
        ];
        assert!(call("contains", args, &d, 0, 1, 1).unwrap().to_boolean());
    }

    #[test]
    fn test_substring() {
        let d = doc();
        let args = vec![
            XPathValue::String("hello".to_string()),
            XPathValue::Number(2.0),
            XPathValue::Number(3.0),
        ];
        let result = call("substring", args, &d, 0, 1, 1).unwrap();
        assert_eq!(result.to_string_value(), "ell");
    }

    #[test]
    fn test_normalize_space() {
        let d = doc();
        let args = vec![XPathValue::String("  a   b  ".to_string())];
        let result = call("normalize-space", args, &d, 0, 1, 1).unwrap();
        assert_eq!(result.to_string_value(), "a b");
    }

    #[test]
    fn test_string_of_context_node() {
        let d = doc();
        let root = d.root_element_id().unwrap();
        let result = call("string", vec![], &d, root, 1, 1).unwrap();
        assert_eq!(result.to_string_value(), "hello");
    }

    #[test]
    fn test_round_half_goes_up() {
        let d = doc();
        let result = call("round", vec![XPathValue::Number(-0.5)], &d, 0, 1, 1).unwrap();
        assert_eq!(result.to_number(), 0.0);
        let result = call("round", vec![XPathValue::Number(2.5)], &d, 0, 1, 1).unwrap();
        assert_eq!(result.to_number(), 3.0);
    }

    #[test]
    fn test_unknown_function() {
        let d = doc();
        let err = call("nosuch", vec![], &d, 0, 1, 1).unwrap_err();
        assert!(matches!(err, XPathError::UnknownFunction(name) if name == "nosuch"));
    }

    #[test]
    fn test_wrong_arity() {
        let d = doc();
        assert!(call("not", vec![], &d, 0, 1, 1).is_err());
    }
}
