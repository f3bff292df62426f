use std::io::{self, stdin, stdout, BufRead, Write};

use crate::{
    eval::{object::Object, Evaluator},
    parser::{ast::Statement, Parser},
};
use log::debug;

pub const PROMPT: &str = ">> ";
const PARSE_ERROR_BANNER: &str = "Woops! The input did not parse.\n parser errors:";

pub fn start() -> io::Result<()> {
    let mut evaluator = Evaluator::new();

    run(stdin().lock(), stdout(), &mut evaluator)
}

/// Reads a line, evaluates it, and echoes the result until `exit` or end of
/// input. Bindings persist in `evaluator` between lines.
pub fn run<R: BufRead, W: Write>(
    mut input: R,
    mut output: W,
    evaluator: &mut Evaluator,
) -> io::Result<()> {
    let mut buffer = String::new();

    loop {
        write!(output, "{}", PROMPT)?;
        output.flush()?;

        buffer.clear();
        if input.read_line(&mut buffer)? == 0 {
            writeln!(output)?;
            return Ok(());
        }

        if buffer.trim().is_empty() {
            continue;
        }

        let (program, errors) = Parser::parse_program(&buffer);
        if !errors.is_empty() {
            debug!("skipping line with {} parse error(s)", errors.len());
            print_parse_errors(&mut output, &errors)?;
            continue;
        }

        let result = evaluator.eval(&program);
        if result == Object::Exit {
            return Ok(());
        }

        let echo = !matches!(
            program.statements.last(),
            Some(Statement::Let(..)) | Some(Statement::IndexAssign { .. })
        );
        if echo {
            writeln!(output, "{}", result)?;
        }
    }
}

fn print_parse_errors<W: Write>(output: &mut W, errors: &[String]) -> io::Result<()> {
    writeln!(output, "{}", PARSE_ERROR_BANNER)?;
    for error in errors {
        writeln!(output, "\t{}", error)?;
    }

    Ok(())
}
