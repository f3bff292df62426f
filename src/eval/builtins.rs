use crate::eval::{
    object::{Builtin, Object},
    Evaluator,
};
use std::path::Path;

const BUILTINS: &[Builtin] = &[
    Builtin {
        name: "len",
        func: len,
    },
    Builtin {
        name: "first",
        func: first,
    },
    Builtin {
        name: "last",
        func: last,
    },
    Builtin {
        name: "rest",
        func: rest,
    },
    Builtin {
        name: "push",
        func: push,
    },
    Builtin {
        name: "print",
        func: print,
    },
    Builtin {
        name: "map",
        func: map,
    },
    Builtin {
        name: "read_file",
        func: read_file,
    },
];

pub fn lookup(name: &str) -> Option<Builtin> {
    BUILTINS.iter().find(|builtin| builtin.name == name).copied()
}

fn wrong_arity(got: usize, want: &str) -> Object {
    Object::Error(format!(
        "wrong number of arguments. got={}, want={}",
        got, want
    ))
}

fn arity<const N: usize>(args: Vec<Object>) -> Result<[Object; N], Object> {
    args.try_into()
        .map_err(|args: Vec<Object>| wrong_arity(args.len(), &N.to_string()))
}

fn single(args: Vec<Object>) -> Result<Object, Object> {
    let [arg] = arity::<1>(args)?;
    Ok(arg)
}

fn len(_: &mut Evaluator, args: Vec<Object>) -> Object {
    let arg = match single(args) {
        Ok(arg) => arg,
        Err(e) => return e,
    };

    match arg {
        Object::String(s) => Object::Integer(s.len() as i64),
        Object::Array(elements) => Object::Integer(elements.borrow().len() as i64),
        Object::Hash(pairs) => Object::Integer(pairs.borrow().len() as i64),
        other => Object::Error(format!(
            "argument to `len` not supported, got {}",
            other.type_name()
        )),
    }
}

fn first(_: &mut Evaluator, args: Vec<Object>) -> Object {
    match single(args) {
        Ok(Object::Array(elements)) => elements.borrow().first().cloned().unwrap_or(Object::Null),
        Ok(other) => Object::Error(format!(
            "argument to `first` must be ARRAY, got {}",
            other.type_name()
        )),
        Err(e) => e,
    }
}

fn last(_: &mut Evaluator, args: Vec<Object>) -> Object {
    match single(args) {
        Ok(Object::Array(elements)) => elements.borrow().last().cloned().unwrap_or(Object::Null),
        Ok(other) => Object::Error(format!(
            "argument to `last` must be ARRAY, got {}",
            other.type_name()
        )),
        Err(e) => e,
    }
}

fn rest(_: &mut Evaluator, args: Vec<Object>) -> Object {
    match single(args) {
        Ok(Object::Array(elements)) => {
            let elements = elements.borrow();
            match elements.split_first() {
                Some((_, tail)) => Object::array(tail.to_vec()),
                None => Object::Null,
            }
        }
        Ok(other) => Object::Error(format!(
            "argument to `rest` must be ARRAY, got {}",
            other.type_name()
        )),
        Err(e) => e,
    }
}

fn push(_: &mut Evaluator, args: Vec<Object>) -> Object {
    let [array, value] = match arity::<2>(args) {
        Ok(args) => args,
        Err(e) => return e,
    };

    match array {
        Object::Array(elements) => {
            let mut pushed = elements.borrow().clone();
            pushed.push(value);
            Object::array(pushed)
        }
        other => Object::Error(format!(
            "argument to `push` must be ARRAY, got {}",
            other.type_name()
        )),
    }
}

fn print(evaluator: &mut Evaluator, args: Vec<Object>) -> Object {
    let output = evaluator.output();

    for arg in &args {
        if let Err(e) = writeln!(output, "{}", arg) {
            return Object::Error(format!("print: {}", e));
        }
    }

    match output.flush() {
        Ok(()) => Object::Null,
        Err(e) => Object::Error(format!("print: {}", e)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ElementKind {
    String,
    Numeric,
}

impl ElementKind {
    fn of(object: &Object) -> Option<Self> {
        match object {
            Object::String(_) => Some(ElementKind::String),
            Object::Integer(_) | Object::Float(_) => Some(ElementKind::Numeric),
            _ => None,
        }
    }
}

/// `map(fn, array)`. Elements must all be strings or all be numbers.
fn map(evaluator: &mut Evaluator, args: Vec<Object>) -> Object {
    let [function, array] = match arity::<2>(args) {
        Ok(args) => args,
        Err(e) => return e,
    };

    if !matches!(function, Object::Function(_)) {
        return Object::Error(format!(
            "first argument to map must be a function, got {}",
            function.type_name()
        ));
    }

    // Copied up front so the mapped function may mutate the array.
    let elements = match &array {
        Object::Array(elements) => elements.borrow().clone(),
        other => {
            return Object::Error(format!(
                "second argument to map must be an array, got {}",
                other.type_name()
            ))
        }
    };

    if let Some(head) = elements.first() {
        let kind = match ElementKind::of(head) {
            Some(kind) => kind,
            None => {
                return Object::Error(format!(
                    "map: unsupported element type {}",
                    head.type_name()
                ))
            }
        };

        if let Some(odd) = elements
            .iter()
            .find(|element| ElementKind::of(element) != Some(kind))
        {
            return Object::Error(match kind {
                ElementKind::String => format!(
                    "map: array contains mixed types; expected all STRING, got {}",
                    odd.type_name()
                ),
                ElementKind::Numeric => format!(
                    "map: array contains mixed types; expected numeric types, got {}",
                    odd.type_name()
                ),
            });
        }
    }

    let mut mapped = Vec::with_capacity(elements.len());
    for element in elements {
        match evaluator.apply_function(function.clone(), vec![element]) {
            Ok(object) => mapped.push(object),
            Err(unwind) => return Object::Error(unwind.to_string()),
        }
    }

    Object::array(mapped)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum FieldType {
    Int,
    Float,
    String,
}

/// `read_file(path, delimiter, type?)` returns one array of fields per
/// line. A blank line reads as `[null]`.
fn read_file(evaluator: &mut Evaluator, args: Vec<Object>) -> Object {
    match read_table(evaluator, &args) {
        Ok(table) => table,
        Err(message) => Object::Error(message),
    }
}

fn read_table(evaluator: &Evaluator, args: &[Object]) -> Result<Object, String> {
    let (path, delimiter, hint) = match args {
        [path, delimiter] => (path, delimiter, None),
        [path, delimiter, hint] => (path, delimiter, Some(hint)),
        _ => {
            return Err(format!(
                "wrong number of arguments. got={}, want=2 or 3",
                args.len()
            ))
        }
    };

    let path = string_argument(path, "first")?;
    let delimiter = string_argument(delimiter, "second")?;
    if delimiter.is_empty() {
        return Err("read_file: delimiter must not be empty".to_string());
    }

    let field_type = match hint {
        None => FieldType::String,
        Some(hint) => match string_argument(hint, "third")?.to_uppercase().as_str() {
            "INT" => FieldType::Int,
            "FLOAT" => FieldType::Float,
            "STRING" => FieldType::String,
            other => return Err(format!("read_file: unknown type hint {}", other)),
        },
    };

    let bytes = evaluator
        .files()
        .read(Path::new(path))
        .map_err(|e| format!("read_file: {}: {}", path, e))?;
    let text = String::from_utf8(bytes)
        .map_err(|_| format!("read_file: {}: file is not valid UTF-8", path))?;

    let mut rows = vec![];
    for (number, line) in text.lines().enumerate() {
        let row = line
            .split(delimiter)
            .map(|field| convert_field(field.trim(), field_type, number + 1))
            .collect::<Result<Vec<Object>, String>>()?;
        rows.push(Object::array(row));
    }

    Ok(Object::array(rows))
}

fn string_argument<'a>(arg: &'a Object, position: &str) -> Result<&'a str, String> {
    match arg {
        Object::String(s) => Ok(s),
        other => Err(format!(
            "{} argument to `read_file` must be STRING, got {}",
            position,
            other.type_name()
        )),
    }
}

fn convert_field(field: &str, field_type: FieldType, line: usize) -> Result<Object, String> {
    if field.is_empty() {
        return Ok(Object::Null);
    }

    match field_type {
        FieldType::Int => field
            .parse::<i64>()
            .map(Object::Integer)
            .map_err(|_| format!("read_file: could not parse {:?} as INT on line {}", field, line)),
        FieldType::Float => field
            .parse::<f64>()
            .map(|value| Object::Float(value as f32))
            .map_err(|_| {
                format!("read_file: could not parse {:?} as FLOAT on line {}", field, line)
            }),
        FieldType::String => Ok(Object::String(field.to_string())),
    }
}
