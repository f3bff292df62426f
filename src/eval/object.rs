use crate::{
    eval::{environment::Env, Evaluator},
    parser::ast::{Block, Ident},
};
use std::{
    cell::RefCell,
    collections::HashMap,
    fmt::{self, Debug, Display},
    rc::Rc,
};

pub type BuiltinFn = fn(&mut Evaluator, Vec<Object>) -> Object;

#[derive(Clone)]
pub enum Object {
    Integer(i64),
    Float(f32),
    String(String),
    Boolean(bool),
    Null,
    Array(Rc<RefCell<Vec<Object>>>),
    Hash(Rc<RefCell<HashPairs>>),
    Function(Rc<Function>),
    Builtin(Builtin),
    Error(String),
    Comment(String),
    Exit,
}

/// A user function together with the scope it was defined in.
pub struct Function {
    pub params: Vec<Ident>,
    pub body: Block,
    pub env: Env,
}

#[derive(Clone, Copy)]
pub struct Builtin {
    pub name: &'static str,
    pub func: BuiltinFn,
}

/// The object kinds allowed as hash keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HashKey {
    Integer(i64),
    String(String),
    Boolean(bool),
}

/// Hash contents. Lookups go through `index`; `entries` keeps insertion order.
#[derive(Debug, Clone, Default)]
pub struct HashPairs {
    entries: Vec<(HashKey, Object)>,
    index: HashMap<HashKey, usize>,
}

impl Object {
    pub fn array(elements: Vec<Object>) -> Self {
        Object::Array(Rc::new(RefCell::new(elements)))
    }

    pub fn hash(pairs: HashPairs) -> Self {
        Object::Hash(Rc::new(RefCell::new(pairs)))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Integer(_) => "INTEGER",
            Object::Float(_) => "FLOAT",
            Object::String(_) => "STRING",
            Object::Boolean(_) => "BOOLEAN",
            Object::Null => "NULL",
            Object::Array(_) => "ARRAY",
            Object::Hash(_) => "HASH",
            Object::Function(_) => "FUNCTION",
            Object::Builtin(_) => "BUILTIN",
            Object::Error(_) => "ERROR",
            Object::Comment(_) => "COMMENT",
            Object::Exit => "EXIT",
        }
    }

    /// Only `false` and `null` are falsy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Object::Boolean(false) | Object::Null)
    }
}

impl HashKey {
    pub fn from_object(object: &Object) -> Option<Self> {
        match object {
            Object::Integer(i) => Some(HashKey::Integer(*i)),
            Object::String(s) => Some(HashKey::String(s.clone())),
            Object::Boolean(b) => Some(HashKey::Boolean(*b)),
            _ => None,
        }
    }

    pub fn to_object(&self) -> Object {
        match self {
            HashKey::Integer(i) => Object::Integer(*i),
            HashKey::String(s) => Object::String(s.clone()),
            HashKey::Boolean(b) => Object::Boolean(*b),
        }
    }
}

impl HashPairs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &HashKey) -> Option<&Object> {
        self.index.get(key).map(|&position| &self.entries[position].1)
    }

    /// Replaces the value of an existing key in place, otherwise appends.
    pub fn insert(&mut self, key: HashKey, value: Object) {
        match self.index.get(&key) {
            Some(&position) => self.entries[position].1 = value,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(HashKey, Object)> {
        self.entries.iter()
    }
}

impl PartialEq for HashPairs {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(key, value)| other.get(key) == Some(value))
    }
}

impl Display for HashKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_object())
    }
}

impl Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_display(f, &mut vec![])
    }
}

impl Object {
    // `open` holds the arrays and hashes currently being written. Meeting one
    // again means the value contains itself, which prints as `[...]`/`{...}`.
    fn write_display(
        &self,
        f: &mut fmt::Formatter<'_>,
        open: &mut Vec<*const ()>,
    ) -> fmt::Result {
        match self {
            Object::Integer(int) => write!(f, "{}", int),
            Object::Float(float) => write!(f, "{:?}", float),
            Object::String(s) => write!(f, "{}", s),
            Object::Boolean(b) => write!(f, "{}", b),
            Object::Null => write!(f, "null"),
            Object::Array(elements) => {
                let id = Rc::as_ptr(elements) as *const ();
                if open.contains(&id) {
                    return write!(f, "[...]");
                }

                open.push(id);
                write!(f, "[")?;
                for (index, element) in elements.borrow().iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    element.write_display(f, open)?;
                }
                open.pop();
                write!(f, "]")
            }
            Object::Hash(pairs) => {
                let id = Rc::as_ptr(pairs) as *const ();
                if open.contains(&id) {
                    return write!(f, "{{...}}");
                }

                open.push(id);
                write!(f, "{{")?;
                for (index, (key, value)) in pairs.borrow().iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: ", key)?;
                    value.write_display(f, open)?;
                }
                open.pop();
                write!(f, "}}")
            }
            Object::Function(function) => write!(
                f,
                "fn({}) {{ {} }}",
                function.params.join(", "),
                function.body
            ),
            Object::Builtin(builtin) => write!(f, "builtin function: {}", builtin.name),
            Object::Error(e) => write!(f, "Error: {}", e),
            Object::Comment(text) => write!(f, "{}", text),
            Object::Exit => write!(f, "exit"),
        }
    }
}

impl Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Object::Integer(int) => write!(f, "Object::Integer({})", int),
            Object::Float(float) => write!(f, "Object::Float({:?})", float),
            Object::String(s) => write!(f, "Object::String({:?})", s),
            Object::Boolean(b) => write!(f, "Object::Boolean({})", b),
            Object::Null => write!(f, "Object::Null"),
            Object::Array(elements) => write!(f, "Object::Array({:?})", elements.borrow()),
            Object::Hash(pairs) => {
                write!(f, "Object::Hash(")?;
                f.debug_map()
                    .entries(pairs.borrow().iter().map(|(key, value)| (key, value)))
                    .finish()?;
                write!(f, ")")
            }
            Object::Function(function) => write!(
                f,
                "Object::Function(fn({}) {{ {} }})",
                function.params.join(", "),
                function.body
            ),
            Object::Builtin(builtin) => write!(f, "Object::Builtin({})", builtin.name),
            Object::Error(e) => write!(f, "Object::Error({:?})", e),
            Object::Comment(text) => write!(f, "Object::Comment({:?})", text),
            Object::Exit => write!(f, "Object::Exit"),
        }
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Object::Integer(a), Object::Integer(b)) => a == b,
            (Object::Float(a), Object::Float(b)) => a == b,
            (Object::String(a), Object::String(b)) => a == b,
            (Object::Boolean(a), Object::Boolean(b)) => a == b,
            (Object::Null, Object::Null) => true,
            (Object::Array(a), Object::Array(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Object::Hash(a), Object::Hash(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Object::Function(a), Object::Function(b)) => Rc::ptr_eq(a, b),
            (Object::Builtin(a), Object::Builtin(b)) => a.name == b.name,
            (Object::Error(a), Object::Error(b)) => a == b,
            (Object::Comment(a), Object::Comment(b)) => a == b,
            (Object::Exit, Object::Exit) => true,
            _ => false,
        }
    }
}
