use crate::{
    eval::{
        environment::{Env, Environment},
        host::{FileReader, OsFiles},
        object::{Function, HashKey, HashPairs, Object},
    },
    parser::ast::{Block, Expr, Infix, Literal, Prefix, Program, Statement},
};
use log::{debug, trace};
use std::{
    io::{self, Write},
    rc::Rc,
};
use thiserror::Error;

pub mod builtins;
pub mod environment;
pub mod host;
pub mod object;

/// Why evaluation stopped early. `Return` unwinds to the nearest function
/// call; `Error` unwinds all the way to the program.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Unwind {
    #[error("return with value: {0}")]
    Return(Object),
    #[error("{0}")]
    Error(String),
}

pub type Eval = Result<Object, Unwind>;

fn error<T>(message: impl Into<String>) -> Result<T, Unwind> {
    Err(Unwind::Error(message.into()))
}

pub struct Evaluator {
    environment: Env,
    output: Box<dyn Write>,
    files: Box<dyn FileReader>,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator {
    pub fn new() -> Self {
        Self {
            environment: Environment::new().into_env(),
            output: Box::new(io::stdout()),
            files: Box::new(OsFiles),
        }
    }

    /// Sends `print` output to `output` instead of stdout.
    pub fn with_output(mut self, output: Box<dyn Write>) -> Self {
        self.output = output;
        self
    }

    /// Serves `read_file` from `files` instead of the OS filesystem.
    pub fn with_files(mut self, files: Box<dyn FileReader>) -> Self {
        self.files = files;
        self
    }

    /// The global scope. It outlives each `eval` call.
    pub fn environment(&self) -> Env {
        self.environment.clone()
    }

    pub fn eval(&mut self, program: &Program) -> Object {
        let environment = self.environment.clone();
        self.eval_in(program, &environment)
    }

    /// Evaluates `program` in `env`. A top-level `return` ends the program
    /// with its value; a runtime error becomes an `Object::Error`.
    pub fn eval_in(&mut self, program: &Program, env: &Env) -> Object {
        match self.eval_statements(&program.statements, env) {
            Ok(object) | Err(Unwind::Return(object)) => object,
            Err(Unwind::Error(message)) => {
                debug!("program failed: {}", message);
                Object::Error(message)
            }
        }
    }

    pub(crate) fn output(&mut self) -> &mut dyn Write {
        self.output.as_mut()
    }

    pub(crate) fn files(&self) -> &dyn FileReader {
        self.files.as_ref()
    }

    fn eval_statements(&mut self, statements: &[Statement], env: &Env) -> Eval {
        statements
            .iter()
            .try_fold(Object::Null, |_, statement| self.eval_statement(statement, env))
    }

    fn eval_block(&mut self, block: &Block, env: &Env) -> Eval {
        self.eval_statements(&block.statements, env)
    }

    fn eval_statement(&mut self, statement: &Statement, env: &Env) -> Eval {
        trace!("eval statement: {}", statement);

        match statement {
            Statement::Let(ident, expr) => {
                let val = self.eval_expr(expr, env)?;
                env.borrow_mut().set(ident, val);

                Ok(Object::Null)
            }
            Statement::Return(expr) => {
                let val = match expr {
                    Some(expr) => self.eval_expr(expr, env)?,
                    None => Object::Null,
                };

                Err(Unwind::Return(val))
            }
            Statement::Expression(expr) => self.eval_expr(expr, env),
            Statement::IndexAssign {
                collection,
                index,
                value,
            } => self.eval_index_assign(collection, index, value, env),
        }
    }

    fn eval_expr(&mut self, expr: &Expr, env: &Env) -> Eval {
        match expr {
            Expr::Ident(ident) => Self::eval_ident(ident, env),
            Expr::Literal(lit) => Ok(Self::eval_literal(lit)),
            Expr::Prefix(prefix_op, right) => {
                let right = self.eval_expr(right, env)?;
                Self::eval_prefix_expr(*prefix_op, right)
            }
            Expr::Infix(infix_op, left, right) => {
                let left = self.eval_expr(left, env)?;
                let right = self.eval_expr(right, env)?;
                Self::eval_infix_expr(*infix_op, left, right)
            }
            Expr::If {
                condition,
                consequence,
                alternative,
            } => {
                let condition = self.eval_expr(condition, env)?;

                if condition.is_truthy() {
                    self.eval_block(consequence, env)
                } else if let Some(alternative) = alternative {
                    self.eval_block(alternative, env)
                } else {
                    Ok(Object::Null)
                }
            }
            Expr::Function { params, body } => Ok(Object::Function(Rc::new(Function {
                params: params.clone(),
                body: body.clone(),
                env: env.clone(),
            }))),
            Expr::Call {
                function,
                arguments,
            } => {
                let function = self.eval_expr(function, env)?;
                let args = self.eval_exprs(arguments, env)?;

                self.apply_function(function, args)
            }
            Expr::Array(elements) => Ok(Object::array(self.eval_exprs(elements, env)?)),
            Expr::Index(left, index) => {
                let left = self.eval_expr(left, env)?;
                let index = self.eval_expr(index, env)?;
                Self::eval_index_expr(left, index)
            }
            Expr::Hash(pairs) => self.eval_hash_literal(pairs, env),
        }
    }

    fn eval_exprs(&mut self, exprs: &[Expr], env: &Env) -> Result<Vec<Object>, Unwind> {
        exprs.iter().map(|expr| self.eval_expr(expr, env)).collect()
    }

    fn eval_ident(ident: &str, env: &Env) -> Eval {
        let bound = env.borrow().get(ident);

        match bound {
            Some(object) => Ok(object),
            None => match builtins::lookup(ident) {
                Some(builtin) => Ok(Object::Builtin(builtin)),
                None => error(format!("identifier not found: {}", ident)),
            },
        }
    }

    fn eval_literal(lit: &Literal) -> Object {
        match lit {
            Literal::Int(i) => Object::Integer(*i),
            Literal::Float(f) => Object::Float(*f),
            Literal::String(s) => Object::String(s.clone()),
            Literal::Bool(b) => Object::Boolean(*b),
            Literal::Null => Object::Null,
            Literal::Comment(text) => Object::Comment(text.clone()),
            Literal::Exit => Object::Exit,
        }
    }

    fn eval_prefix_expr(prefix: Prefix, right: Object) -> Eval {
        match prefix {
            Prefix::Bang => Ok(Object::Boolean(!right.is_truthy())),
            Prefix::Minus => match right {
                Object::Integer(i) => match i.checked_neg() {
                    Some(negated) => Ok(Object::Integer(negated)),
                    None => error(format!("integer overflow: -{}", i)),
                },
                Object::Float(f) => Ok(Object::Float(-f)),
                other => error(format!("unknown operator: -{}", other.type_name())),
            },
        }
    }

    fn eval_infix_expr(operator: Infix, left: Object, right: Object) -> Eval {
        match (&left, &right) {
            (Object::Integer(left), Object::Integer(right)) => {
                Self::eval_integer_infix_expr(operator, *left, *right)
            }
            (Object::Integer(_) | Object::Float(_), Object::Integer(_) | Object::Float(_)) => {
                Self::eval_float_infix_expr(operator, Self::as_float(&left), Self::as_float(&right))
            }
            (Object::String(left), Object::String(right)) => {
                Self::eval_string_infix_expr(operator, left, right)
            }
            (Object::Boolean(_) | Object::Null, _) | (_, Object::Boolean(_) | Object::Null)
                if matches!(operator, Infix::Equal | Infix::NotEqual) =>
            {
                let same = match (&left, &right) {
                    (Object::Boolean(left), Object::Boolean(right)) => left == right,
                    (Object::Null, Object::Null) => true,
                    _ => false,
                };

                Ok(Object::Boolean(same == (operator == Infix::Equal)))
            }
            _ if left.type_name() != right.type_name() => error(format!(
                "type mismatch: {} {} {}",
                left.type_name(),
                operator,
                right.type_name()
            )),
            _ => error(format!(
                "unknown operator: {} {} {}",
                left.type_name(),
                operator,
                right.type_name()
            )),
        }
    }

    fn eval_integer_infix_expr(operator: Infix, left: i64, right: i64) -> Eval {
        let checked = |result: Option<i64>| match result {
            Some(value) => Ok(Object::Integer(value)),
            None => error(format!("integer overflow: {} {} {}", left, operator, right)),
        };

        match operator {
            Infix::Plus => checked(left.checked_add(right)),
            Infix::Minus => checked(left.checked_sub(right)),
            Infix::Multiply => checked(left.checked_mul(right)),
            Infix::Divide if right == 0 => error("division by zero"),
            Infix::Divide => checked(left.checked_div(right)),
            Infix::LessThan => Ok(Object::Boolean(left < right)),
            Infix::GreaterThan => Ok(Object::Boolean(left > right)),
            Infix::LessThanEqual => Ok(Object::Boolean(left <= right)),
            Infix::GreaterThanEqual => Ok(Object::Boolean(left >= right)),
            Infix::Equal => Ok(Object::Boolean(left == right)),
            Infix::NotEqual => Ok(Object::Boolean(left != right)),
        }
    }

    fn eval_float_infix_expr(operator: Infix, left: f32, right: f32) -> Eval {
        let result = match operator {
            Infix::Plus => Object::Float(left + right),
            Infix::Minus => Object::Float(left - right),
            Infix::Multiply => Object::Float(left * right),
            Infix::Divide => Object::Float(left / right),
            Infix::LessThan => Object::Boolean(left < right),
            Infix::GreaterThan => Object::Boolean(left > right),
            Infix::LessThanEqual => Object::Boolean(left <= right),
            Infix::GreaterThanEqual => Object::Boolean(left >= right),
            Infix::Equal => Object::Boolean(left == right),
            Infix::NotEqual => Object::Boolean(left != right),
        };

        Ok(result)
    }

    fn eval_string_infix_expr(operator: Infix, left: &str, right: &str) -> Eval {
        match operator {
            Infix::Plus => Ok(Object::String(format!("{}{}", left, right))),
            Infix::Equal => Ok(Object::Boolean(left == right)),
            Infix::NotEqual => Ok(Object::Boolean(left != right)),
            _ => error(format!("unknown operator: STRING {} STRING", operator)),
        }
    }

    fn as_float(object: &Object) -> f32 {
        match object {
            Object::Integer(i) => *i as f32,
            Object::Float(f) => *f,
            _ => f32::NAN,
        }
    }

    fn eval_index_expr(left: Object, index: Object) -> Eval {
        match (&left, &index) {
            (Object::Array(elements), Object::Integer(i)) => {
                let element = usize::try_from(*i)
                    .ok()
                    .and_then(|position| elements.borrow().get(position).cloned());

                Ok(element.unwrap_or(Object::Null))
            }
            (Object::Array(_), other) => error(format!(
                "array index must be INTEGER, got {}",
                other.type_name()
            )),
            (Object::Hash(pairs), key) => match HashKey::from_object(key) {
                Some(key) => Ok(pairs.borrow().get(&key).cloned().unwrap_or(Object::Null)),
                None => error(format!("unusable as hash key: {}", key.type_name())),
            },
            _ => error(format!("index operator not supported: {}", left.type_name())),
        }
    }

    fn eval_index_assign(
        &mut self,
        collection: &Expr,
        index: &Expr,
        value: &Expr,
        env: &Env,
    ) -> Eval {
        let collection = self.eval_expr(collection, env)?;
        let index = self.eval_expr(index, env)?;
        let value = self.eval_expr(value, env)?;

        match (&collection, &index) {
            (Object::Array(elements), Object::Integer(i)) => {
                let mut elements = elements.borrow_mut();
                let len = elements.len();

                match usize::try_from(*i).ok().filter(|position| *position < len) {
                    Some(position) => {
                        elements[position] = value;
                        Ok(Object::Null)
                    }
                    None => error(format!("index out of range: {} (length {})", i, len)),
                }
            }
            (Object::Array(_), other) => error(format!(
                "array index must be INTEGER, got {}",
                other.type_name()
            )),
            (Object::Hash(pairs), key) => match HashKey::from_object(key) {
                Some(key) => {
                    pairs.borrow_mut().insert(key, value);
                    Ok(Object::Null)
                }
                None => error(format!("unusable as hash key: {}", key.type_name())),
            },
            _ => error(format!(
                "index assignment not supported: {}",
                collection.type_name()
            )),
        }
    }

    fn eval_hash_literal(&mut self, pairs: &[(Expr, Expr)], env: &Env) -> Eval {
        let mut hash = HashPairs::new();

        for (key_expr, value_expr) in pairs {
            let key = self.eval_expr(key_expr, env)?;
            let key = match HashKey::from_object(&key) {
                Some(key) => key,
                None => return error(format!("unusable as hash key: {}", key.type_name())),
            };
            let value = self.eval_expr(value_expr, env)?;

            hash.insert(key, value);
        }

        Ok(Object::hash(hash))
    }

    /// Calls a user function or builtin with already evaluated arguments.
    /// Missing arguments are bound to `null`; extra ones are dropped.
    pub(crate) fn apply_function(&mut self, function: Object, args: Vec<Object>) -> Eval {
        match function {
            Object::Function(function) => {
                if args.len() != function.params.len() {
                    debug!(
                        "fn({}) called with {} argument(s)",
                        function.params.join(", "),
                        args.len()
                    );
                }

                let call_env = Environment::new_enclosed(function.env.clone()).into_env();
                let mut args = args.into_iter();
                for param in &function.params {
                    call_env
                        .borrow_mut()
                        .set(param, args.next().unwrap_or(Object::Null));
                }

                match self.eval_block(&function.body, &call_env) {
                    Err(Unwind::Return(value)) => Ok(value),
                    result => result,
                }
            }
            Object::Builtin(builtin) => {
                debug!("calling builtin {} with {} argument(s)", builtin.name, args.len());

                match (builtin.func)(self, args) {
                    Object::Error(message) => Err(Unwind::Error(message)),
                    object => Ok(object),
                }
            }
            other => error(format!("not a function: {}", other.type_name())),
        }
    }
}

#[cfg(test)]
mod test {
    use crate::{
        eval::{
            environment::Environment,
            host::SharedOutput,
            object::{HashKey, HashPairs, Object},
            Evaluator,
        },
        parser::Parser,
    };
    use pretty_assertions::assert_eq;

    #[derive(Debug)]
    struct TestDataSimple<T> {
        input: &'static str,
        expected: T,
    }

    #[test]
    fn eval_integer_expression() {
        let test_data = vec![
            TestDataSimple {
                input: "5",
                expected: 5,
            },
            TestDataSimple {
                input: "10",
                expected: 10,
            },
            TestDataSimple {
                input: "-5",
                expected: -5,
            },
            TestDataSimple {
                input: "-10",
                expected: -10,
            },
            TestDataSimple {
                input: "5 + 5 + 5 + 5 - 10",
                expected: 10,
            },
            TestDataSimple {
                input: "2 * 2 * 2 * 2 * 2",
                expected: 32,
            },
            TestDataSimple {
                input: "-50 + 100 + -50",
                expected: 0,
            },
            TestDataSimple {
                input: "5 * 2 + 10",
                expected: 20,
            },
            TestDataSimple {
                input: "5 + 2 * 10",
                expected: 25,
            },
            TestDataSimple {
                input: "20 + 2 * -10",
                expected: 0,
            },
            TestDataSimple {
                input: "50 / 2 * 2 + 10",
                expected: 60,
            },
            TestDataSimple {
                input: "2 * (5 + 10)",
                expected: 30,
            },
            TestDataSimple {
                input: "3 * 3 * 3 + 10",
                expected: 37,
            },
            TestDataSimple {
                input: "3 * (3 * 3) + 10",
                expected: 37,
            },
            TestDataSimple {
                input: "(5 + 10 * 2 + 15 / 3) * 2 + -10",
                expected: 50,
            },
            TestDataSimple {
                input: "10 - 2 - 3",
                expected: 5,
            },
            TestDataSimple {
                input: "0x10 + 0b11",
                expected: 19,
            },
        ];

        test_data.into_iter().for_each(|test_datum| {
            let actual = eval(test_datum.input);
            assert_integer_object(actual, test_datum.expected);
        });
    }

    #[test]
    fn eval_float_expression() {
        let test_data = vec![
            TestDataSimple {
                input: "2.5",
                expected: 2.5,
            },
            TestDataSimple {
                input: "-2.5",
                expected: -2.5,
            },
            TestDataSimple {
                input: "1.5 + 1",
                expected: 2.5,
            },
            TestDataSimple {
                input: "3 * 0.5",
                expected: 1.5,
            },
            TestDataSimple {
                input: "7 / 2.0",
                expected: 3.5,
            },
            TestDataSimple {
                input: "1.0 / 0",
                expected: f32::INFINITY,
            },
        ];

        test_data.into_iter().for_each(|test_datum| {
            assert_eq!(eval(test_datum.input), Object::Float(test_datum.expected));
        });
    }

    #[test]
    fn eval_boolean_expression() {
        let test_data = vec![
            TestDataSimple {
                input: "true",
                expected: true,
            },
            TestDataSimple {
                input: "false",
                expected: false,
            },
            TestDataSimple {
                input: "1 < 2",
                expected: true,
            },
            TestDataSimple {
                input: "1 > 2",
                expected: false,
            },
            TestDataSimple {
                input: "1 < 1",
                expected: false,
            },
            TestDataSimple {
                input: "1 > 1",
                expected: false,
            },
            TestDataSimple {
                input: "1 <= 1",
                expected: true,
            },
            TestDataSimple {
                input: "2 >= 3",
                expected: false,
            },
            TestDataSimple {
                input: "1 == 1",
                expected: true,
            },
            TestDataSimple {
                input: "1 != 1",
                expected: false,
            },
            TestDataSimple {
                input: "1 == 2",
                expected: false,
            },
            TestDataSimple {
                input: "1 != 2",
                expected: true,
            },
            TestDataSimple {
                input: "true == true",
                expected: true,
            },
            TestDataSimple {
                input: "false == false",
                expected: true,
            },
            TestDataSimple {
                input: "true == false",
                expected: false,
            },
            TestDataSimple {
                input: "true != false",
                expected: true,
            },
            TestDataSimple {
                input: "false != true",
                expected: true,
            },
            TestDataSimple {
                input: "(1 < 2) == true",
                expected: true,
            },
            TestDataSimple {
                input: "(1 < 2) == false",
                expected: false,
            },
            TestDataSimple {
                input: "(1 > 2) == true",
                expected: false,
            },
            TestDataSimple {
                input: "(1 > 2) == false",
                expected: true,
            },
            TestDataSimple {
                input: "3 + 4 * 2 == 3 + (4 * 2)",
                expected: true,
            },
            TestDataSimple {
                input: "1 == 1.0",
                expected: true,
            },
            TestDataSimple {
                input: "1.5 > 1",
                expected: true,
            },
            TestDataSimple {
                input: r#""a" == "a""#,
                expected: true,
            },
            TestDataSimple {
                input: r#""a" != "b""#,
                expected: true,
            },
            TestDataSimple {
                input: "null == null",
                expected: true,
            },
            TestDataSimple {
                input: "1 == true",
                expected: false,
            },
            TestDataSimple {
                input: "0 != null",
                expected: true,
            },
        ];

        test_data.into_iter().for_each(|test_datum| {
            let actual = eval(test_datum.input);
            assert_boolean_object(actual, test_datum.expected);
        })
    }

    #[test]
    fn bang_operator_expression() {
        let test_data = vec![
            TestDataSimple {
                input: "!true",
                expected: false,
            },
            TestDataSimple {
                input: "!false",
                expected: true,
            },
            TestDataSimple {
                input: "!5",
                expected: false,
            },
            TestDataSimple {
                input: "!0",
                expected: false,
            },
            TestDataSimple {
                input: "!null",
                expected: true,
            },
            TestDataSimple {
                input: "!!true",
                expected: true,
            },
            TestDataSimple {
                input: "!!false",
                expected: false,
            },
            TestDataSimple {
                input: "!!5",
                expected: true,
            },
        ];

        test_data.into_iter().for_each(|test_datum| {
            let actual = eval(test_datum.input);
            assert_boolean_object(actual, test_datum.expected);
        })
    }

    #[test]
    fn string_concatenation() {
        assert_eq!(
            eval(r#""Hello" + " " + "World!""#),
            Object::String("Hello World!".to_string())
        );
    }

    #[test]
    fn if_else_expressions() {
        let test_data = vec![
            TestDataSimple {
                input: "if (true) { 10 }",
                expected: Object::Integer(10),
            },
            TestDataSimple {
                input: "if (false) { 10 }",
                expected: Object::Null,
            },
            TestDataSimple {
                input: "if (1) { 10 }",
                expected: Object::Integer(10),
            },
            TestDataSimple {
                input: "if (0) { 10 }",
                expected: Object::Integer(10),
            },
            TestDataSimple {
                input: "if (null) { 10 } else { 5 }",
                expected: Object::Integer(5),
            },
            TestDataSimple {
                input: "if (1 < 2) { 10 }",
                expected: Object::Integer(10),
            },
            TestDataSimple {
                input: "if (1 > 2) { 10 }",
                expected: Object::Null,
            },
            TestDataSimple {
                input: "if (1 > 2) { 10 } else { 20 }",
                expected: Object::Integer(20),
            },
            TestDataSimple {
                input: "if (1 < 2) { 10 } else { 20 }",
                expected: Object::Integer(10),
            },
            TestDataSimple {
                input: "if (10 > 1) { if (10 > 1) { return 10; } return 1; }",
                expected: Object::Integer(10),
            },
        ];

        test_data.into_iter().for_each(|test_datum| {
            let actual = eval(test_datum.input);
            assert_object(actual, test_datum.expected);
        });
    }

    #[test]
    fn return_statements() {
        let test_data = vec![
            TestDataSimple {
                input: "return 10;",
                expected: Object::Integer(10),
            },
            TestDataSimple {
                input: "return 10; 9;",
                expected: Object::Integer(10),
            },
            TestDataSimple {
                input: "return 2 * 5; 9;",
                expected: Object::Integer(10),
            },
            TestDataSimple {
                input: "9; return 2 * 5; 9;",
                expected: Object::Integer(10),
            },
            TestDataSimple {
                input: "return;",
                expected: Object::Null,
            },
            TestDataSimple {
                input: "let f = fn() { return; 1 }; f()",
                expected: Object::Null,
            },
            TestDataSimple {
                input: "let f = fn(x) { if (x) { return 1; } 2 }; f(true) + f(false)",
                expected: Object::Integer(3),
            },
        ];

        test_data.into_iter().for_each(|test_datum| {
            let actual = eval(test_datum.input);
            assert_object(actual, test_datum.expected);
        });
    }

    #[test]
    fn error_handling() {
        let test_data = vec![
            TestDataSimple {
                input: "5 + true;",
                expected: "type mismatch: INTEGER + BOOLEAN",
            },
            TestDataSimple {
                input: "5 + true; 5;",
                expected: "type mismatch: INTEGER + BOOLEAN",
            },
            TestDataSimple {
                input: "-true",
                expected: "unknown operator: -BOOLEAN",
            },
            TestDataSimple {
                input: "true + false;",
                expected: "unknown operator: BOOLEAN + BOOLEAN",
            },
            TestDataSimple {
                input: "5; true + false; 5",
                expected: "unknown operator: BOOLEAN + BOOLEAN",
            },
            TestDataSimple {
                input: "if (10 > 1) { true + false; }",
                expected: "unknown operator: BOOLEAN + BOOLEAN",
            },
            TestDataSimple {
                input: "if (10 > 1) { if ( 10 > 1) { return true + false; } return 1; }",
                expected: "unknown operator: BOOLEAN + BOOLEAN",
            },
            TestDataSimple {
                input: "foobar",
                expected: "identifier not found: foobar",
            },
            TestDataSimple {
                input: r#""Hello" - "World""#,
                expected: "unknown operator: STRING - STRING",
            },
            TestDataSimple {
                input: r#""a" + 1"#,
                expected: "type mismatch: STRING + INTEGER",
            },
            TestDataSimple {
                input: "[1] == [1]",
                expected: "unknown operator: ARRAY == ARRAY",
            },
            TestDataSimple {
                input: "true < false",
                expected: "unknown operator: BOOLEAN < BOOLEAN",
            },
            TestDataSimple {
                input: r#"{"name": "Monkey"}[fn(x) { x }];"#,
                expected: "unusable as hash key: FUNCTION",
            },
            TestDataSimple {
                input: "{[1]: 2}",
                expected: "unusable as hash key: ARRAY",
            },
            TestDataSimple {
                input: "[1, 2][true]",
                expected: "array index must be INTEGER, got BOOLEAN",
            },
            TestDataSimple {
                input: "5[0]",
                expected: "index operator not supported: INTEGER",
            },
            TestDataSimple {
                input: "5(1)",
                expected: "not a function: INTEGER",
            },
            TestDataSimple {
                input: "9223372036854775807 + 1",
                expected: "integer overflow: 9223372036854775807 + 1",
            },
            TestDataSimple {
                input: "-(-9223372036854775807 - 1)",
                expected: "integer overflow: --9223372036854775808",
            },
            TestDataSimple {
                input: "10 / 0",
                expected: "division by zero",
            },
            TestDataSimple {
                input: "[1, 2][5] = 3",
                expected: "index out of range: 5 (length 2)",
            },
            TestDataSimple {
                input: r#"let s = "abc"; s[0] = "x";"#,
                expected: "index assignment not supported: STRING",
            },
        ];

        test_data.into_iter().for_each(|test_datum| {
            let actual = eval(test_datum.input);
            assert_error(actual, test_datum.expected);
        });
    }

    #[test]
    fn errors_stop_the_enclosing_block() {
        let output = SharedOutput::new();
        let mut evaluator = Evaluator::new().with_output(Box::new(output.clone()));
        let (program, errors) =
            Parser::parse_program(r#"let f = fn() { 5 + true; print("unreachable"); }; f(); print("also unreachable")"#);
        assert!(errors.is_empty());

        assert_error(
            evaluator.eval(&program),
            "type mismatch: INTEGER + BOOLEAN",
        );
        assert_eq!(output.contents(), "");
    }

    #[test]
    fn arguments_are_evaluated_left_to_right() {
        let output = SharedOutput::new();
        let mut evaluator = Evaluator::new().with_output(Box::new(output.clone()));
        let (program, _) = Parser::parse_program(
            r#"let f = fn(a, b, c) { a }; f(print("a"), print("b"), nope, print("c"))"#,
        );

        assert_error(evaluator.eval(&program), "identifier not found: nope");
        assert_eq!(output.contents(), "a\nb\n");
    }

    #[test]
    fn let_statement() {
        let test_data = vec![
            TestDataSimple {
                input: "let a = 5; a;",
                expected: 5,
            },
            TestDataSimple {
                input: "let a = 5 * 5; a;",
                expected: 25,
            },
            TestDataSimple {
                input: "let a = 5; let b = a; b;",
                expected: 5,
            },
            TestDataSimple {
                input: "let a = 5; let b = a; let c = a + b + 5; c;",
                expected: 15,
            },
            TestDataSimple {
                input: "let a = 1; let f = fn() { let a = 2; a }; f() * 10 + a",
                expected: 21,
            },
        ];

        test_data.into_iter().for_each(|test_datum| {
            let actual = eval(test_datum.input);
            assert_integer_object(actual, test_datum.expected)
        });
    }

    #[test]
    fn let_yields_null() {
        assert_eq!(eval("let a = 5;"), Object::Null);
    }

    #[test]
    fn function_object() {
        let actual = eval("fn(x) { x + 2; };");

        match &actual {
            Object::Function(function) => {
                assert_eq!(function.params, vec!["x".to_string()]);
                assert_eq!(function.body.to_string(), "(x + 2)");
            }
            other => panic!("expected Object::Function(_), received {:?}", other),
        }
        assert_eq!(actual.to_string(), "fn(x) { (x + 2) }");
    }

    #[test]
    fn function_application() {
        let test_data = vec![
            TestDataSimple {
                input: "let identity = fn(x) {x; }; identity(5);",
                expected: 5,
            },
            TestDataSimple {
                input: "let identity = fn(x) { return x; }; identity(5)",
                expected: 5,
            },
            TestDataSimple {
                input: "let double = fn(x) { return x * 2; }; double(5);",
                expected: 10,
            },
            TestDataSimple {
                input: "let add = fn(x, y) { x + y; }; add(5, 5);",
                expected: 10,
            },
            TestDataSimple {
                input: "let add = fn(x, y) { x + y; }; add(5 + 5, add(5, 5));",
                expected: 20,
            },
            TestDataSimple {
                input: "fn(x) { x; }(5)",
                expected: 5,
            },
            TestDataSimple {
                input: "let fact = fn(n) { if (n < 2) { 1 } else { n * fact(n - 1) } }; fact(10)",
                expected: 3628800,
            },
        ];

        test_data.into_iter().for_each(|test_datum| {
            let actual = eval(test_datum.input);
            assert_integer_object(actual, test_datum.expected);
        });
    }

    #[test]
    fn call_arity_is_lenient() {
        assert_eq!(eval("let f = fn(a, b) { b }; f(1)"), Object::Null);
        assert_eq!(eval("let f = fn(a) { a }; f(1, 2, 3)"), Object::Integer(1));
    }

    #[test]
    fn closures() {
        let test_data = vec![
            TestDataSimple {
                input: r#"let newAdder = fn(x) {
                  fn(y) { x + y };
                };

                let addTwo = newAdder(2);
                addTwo(2);"#,
                expected: 4,
            },
            TestDataSimple {
                input: "let newAdder = fn(x) { fn(y) { x + y } }; let addTwo = newAdder(2); addTwo(3)",
                expected: 5,
            },
            TestDataSimple {
                input: "let n = 1; let get = fn() { n }; let n = 41; get() + 1",
                expected: 42,
            },
        ];

        test_data.into_iter().for_each(|test_datum| {
            let actual = eval(test_datum.input);
            assert_integer_object(actual, test_datum.expected);
        });
    }

    #[test]
    fn array_literals_and_index() {
        let test_data = vec![
            TestDataSimple {
                input: "[1, 2 * 2, 3 + 3]",
                expected: Object::array(vec![
                    Object::Integer(1),
                    Object::Integer(4),
                    Object::Integer(6),
                ]),
            },
            TestDataSimple {
                input: "[1, 2, 3][0]",
                expected: Object::Integer(1),
            },
            TestDataSimple {
                input: "let i = 0; [1][i]",
                expected: Object::Integer(1),
            },
            TestDataSimple {
                input: "let myArray = [1, 2, 3]; myArray[0] + myArray[1] + myArray[2];",
                expected: Object::Integer(6),
            },
            TestDataSimple {
                input: "[1, 2, 3][3]",
                expected: Object::Null,
            },
            TestDataSimple {
                input: "[1, 2, 3][-1]",
                expected: Object::Null,
            },
        ];

        test_data.into_iter().for_each(|test_datum| {
            assert_object(eval(test_datum.input), test_datum.expected);
        });
    }

    #[test]
    fn hash_literals_and_index() {
        let mut expected = HashPairs::new();
        expected.insert(HashKey::String("one".to_string()), Object::Integer(1));
        expected.insert(HashKey::String("two".to_string()), Object::Integer(2));
        expected.insert(HashKey::Integer(4), Object::Integer(4));
        expected.insert(HashKey::Boolean(true), Object::Integer(5));

        assert_object(
            eval(r#"let two = "two"; {"one": 10 - 9, two: 1 + 1, 4: 4, true: 5}"#),
            Object::hash(expected),
        );

        let test_data = vec![
            TestDataSimple {
                input: r#"{"foo": 5}["foo"]"#,
                expected: Object::Integer(5),
            },
            TestDataSimple {
                input: r#"{"foo": 5}["bar"]"#,
                expected: Object::Null,
            },
            TestDataSimple {
                input: r#"let key = "foo"; {"foo": 5}[key]"#,
                expected: Object::Integer(5),
            },
            TestDataSimple {
                input: r#"{}["foo"]"#,
                expected: Object::Null,
            },
            TestDataSimple {
                input: "{5: 5}[5]",
                expected: Object::Integer(5),
            },
            TestDataSimple {
                input: "{false: 5}[false]",
                expected: Object::Integer(5),
            },
        ];

        test_data.into_iter().for_each(|test_datum| {
            assert_object(eval(test_datum.input), test_datum.expected);
        });
    }

    #[test]
    fn index_assignment() {
        let test_data = vec![
            TestDataSimple {
                input: "let a = [1, 2, 3]; a[1] = 20; a",
                expected: "[1, 20, 3]",
            },
            TestDataSimple {
                input: "let a = [1, 2]; let b = a; b[0] = 9; a",
                expected: "[9, 2]",
            },
            TestDataSimple {
                input: r#"let h = {"a": 1}; h["a"] = 2; h["b"] = 3; h"#,
                expected: "{a: 2, b: 3}",
            },
            TestDataSimple {
                input: "let grid = [[0, 0], [0, 0]]; grid[1][0] = 7; grid",
                expected: "[[0, 0], [7, 0]]",
            },
        ];

        test_data.into_iter().for_each(|test_datum| {
            assert_eq!(eval(test_datum.input).to_string(), test_datum.expected);
        });
    }

    #[test]
    fn comments_and_exit_are_values() {
        assert_eq!(eval("// note //"), Object::Comment(" note ".to_string()));
        assert_eq!(eval("exit"), Object::Exit);
        assert_eq!(eval("1; // trailing //"), Object::Comment(" trailing ".to_string()));
    }

    #[test]
    fn builtins_resolve_after_user_bindings() {
        assert_eq!(eval("len").to_string(), "builtin function: len");
        assert_eq!(eval("let len = fn(x) { 42 }; len([1])"), Object::Integer(42));
    }

    #[test]
    fn global_environment_persists_between_evals() {
        let mut evaluator = Evaluator::new();

        let (first, _) = Parser::parse_program("let x = 40;");
        let (second, _) = Parser::parse_program("x + 2");

        evaluator.eval(&first);
        assert_eq!(evaluator.eval(&second), Object::Integer(42));
        assert_eq!(
            evaluator.environment().borrow().get("x"),
            Some(Object::Integer(40))
        );
    }

    #[test]
    fn eval_in_uses_the_given_environment() {
        let env = Environment::new().into_env();
        env.borrow_mut().set("y", Object::Integer(2));

        let (program, _) = Parser::parse_program("let z = y * 21; z");
        let mut evaluator = Evaluator::new();

        assert_eq!(evaluator.eval_in(&program, &env), Object::Integer(42));
        assert_eq!(evaluator.environment().borrow().get("z"), None);
        assert_eq!(env.borrow().get("z"), Some(Object::Integer(42)));
    }

    fn eval(input: &str) -> Object {
        let (program, errors) = Parser::parse_program(input);
        assert!(errors.is_empty(), "parse errors for {:?}: {:?}", input, errors);

        Evaluator::new().eval(&program)
    }

    fn assert_integer_object(actual: Object, expected: i64) {
        assert!(
            matches!(actual, Object::Integer(_)),
            "expected Object::Integer(_), received {:?}",
            actual
        );
        if let Object::Integer(actual) = actual {
            assert_eq!(actual, expected);
        }
    }

    fn assert_boolean_object(actual: Object, expected: bool) {
        assert!(
            matches!(actual, Object::Boolean(_)),
            "Expected Object::Boolean(_), Received {:?}",
            actual
        );
        if let Object::Boolean(actual) = actual {
            assert_eq!(actual, expected);
        }
    }

    fn assert_object(actual: Object, expected: Object) {
        assert_eq!(actual, expected);
    }

    fn assert_error(actual: Object, expected: &str) {
        assert!(
            matches!(actual, Object::Error(_)),
            "Expected Object::Error(_), received {:?}",
            actual
        );
        if let Object::Error(actual) = actual {
            assert_eq!(actual, expected);
        }
    }
}
