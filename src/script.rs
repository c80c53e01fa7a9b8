//! Line-oriented command scripts driving a segment tree.
//!
//! ```text
//! # comment
//! from 1 2 3 4 5 6
//! set 0 10
//! query 2 5
//! max_right 0 < 7
//! ```

use monoid_segtree::{Max, Min, Monoid, SegTree, Sum, UsageError, Xor};
use std::convert::TryFrom;
use std::fmt;
use std::io::{self, BufRead, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("line {line}: no tree; start the script with `new` or `from`")]
    NoTree { line: usize },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Values a script can store: monoids over `i64`.
pub trait ScriptValue: Monoid + Clone + fmt::Display {
    fn from_i64(value: i64) -> Self;
    fn to_i64(&self) -> i64;
}

macro_rules! impl_script_value {
    ($($m:ident),*) => {$(
        impl ScriptValue for $m<i64> {
            fn from_i64(value: i64) -> Self {
                $m(value)
            }

            fn to_i64(&self) -> i64 {
                self.0
            }
        }
    )*};
}

impl_script_value!(Sum, Min, Max, Xor);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cmp {
    Lt,
    Le,
    Gt,
    Ge,
}

impl Cmp {
    pub fn parse(word: &str) -> Option<Self> {
        match word {
            "<" => Some(Cmp::Lt),
            "<=" => Some(Cmp::Le),
            ">" => Some(Cmp::Gt),
            ">=" => Some(Cmp::Ge),
            _ => None,
        }
    }

    pub fn test(self, left: i64, right: i64) -> bool {
        match self {
            Cmp::Lt => left < right,
            Cmp::Le => left <= right,
            Cmp::Gt => left > right,
            Cmp::Ge => left >= right,
        }
    }
}

impl fmt::Display for Cmp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Cmp::Lt => "<",
            Cmp::Le => "<=",
            Cmp::Gt => ">",
            Cmp::Ge => ">=",
        };
        f.write_str(s)
    }
}

/// One script line. Indices stay signed until execution so that negative
/// ones surface as usage errors rather than parse errors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    New(i64),
    From(Vec<i64>),
    Set(i64, i64),
    Get(i64),
    Query(i64, i64),
    All,
    MaxRight(i64, Cmp, i64),
    MinLeft(i64, Cmp, i64),
    Dump,
}

/// Parses a line. Blank and comment-only lines yield `None`.
pub fn parse_line(line: usize, text: &str) -> Result<Option<Command>, ScriptError> {
    let text = text.split('#').next().unwrap_or("");
    let words = text.split_whitespace().collect::<Vec<_>>();
    let (name, args) = match words.split_first() {
        None => return Ok(None),
        Some((name, args)) => (*name, args),
    };

    let parse_error = |message: String| ScriptError::Parse { line, message };
    let int = |word: &str| {
        word.parse::<i64>()
            .map_err(|_| parse_error(format!("invalid integer `{}`", word)))
    };
    let arity = |n: usize| {
        if args.len() == n {
            Ok(())
        } else {
            Err(parse_error(format!(
                "`{}` expects {} arguments, got {}",
                name,
                n,
                args.len()
            )))
        }
    };

    let command = match name {
        "new" => {
            arity(1)?;
            Command::New(int(args[0])?)
        }
        "from" => Command::From(args.iter().map(|&w| int(w)).collect::<Result<_, _>>()?),
        "set" => {
            arity(2)?;
            Command::Set(int(args[0])?, int(args[1])?)
        }
        "get" => {
            arity(1)?;
            Command::Get(int(args[0])?)
        }
        "query" => {
            arity(2)?;
            Command::Query(int(args[0])?, int(args[1])?)
        }
        "all" => {
            arity(0)?;
            Command::All
        }
        "max_right" | "min_left" => {
            arity(3)?;
            let bound = int(args[0])?;
            let cmp = Cmp::parse(args[1])
                .ok_or_else(|| parse_error(format!("invalid comparison `{}`", args[1])))?;
            let x = int(args[2])?;
            if name == "max_right" {
                Command::MaxRight(bound, cmp, x)
            } else {
                Command::MinLeft(bound, cmp, x)
            }
        }
        "dump" => {
            arity(0)?;
            Command::Dump
        }
        _ => return Err(parse_error(format!("unknown command `{}`", name))),
    };
    Ok(Some(command))
}

fn to_index(op: &'static str, value: i64) -> Result<usize, UsageError> {
    usize::try_from(value).map_err(|_| {
        if value < 0 {
            UsageError::Negative { op, value }
        } else {
            UsageError::TooLarge {
                op,
                value: value as u64,
            }
        }
    })
}

pub struct Interpreter<V> {
    tree: Option<SegTree<V>>,
}

impl<V: ScriptValue> Interpreter<V> {
    pub fn new() -> Self {
        Interpreter { tree: None }
    }

    pub fn tree(&self) -> Option<&SegTree<V>> {
        self.tree.as_ref()
    }

    /// Runs one command, writing its result (if any) as a line to `out`.
    ///
    /// Usage errors are logged and the fallback value is written instead.
    pub fn execute<W: Write>(
        &mut self,
        line: usize,
        command: Command,
        out: &mut W,
    ) -> Result<(), ScriptError> {
        trace!("line {}: {:?}", line, command);

        match command {
            Command::New(n) => match to_index("new", n).and_then(SegTree::try_new) {
                Ok(tree) => self.tree = Some(tree),
                Err(err) => error!("line {}: {}", line, err),
            },
            Command::From(values) => {
                self.tree = Some(values.into_iter().map(V::from_i64).collect());
            }
            Command::Set(p, x) => {
                let tree = self.tree.as_mut().ok_or(ScriptError::NoTree { line })?;
                match to_index("set", p) {
                    Ok(p) => tree.set(p, V::from_i64(x)),
                    Err(err) => error!("line {}: {}", line, err),
                }
            }
            Command::Get(p) => {
                let tree = self.tree.as_ref().ok_or(ScriptError::NoTree { line })?;
                let value = match to_index("get", p) {
                    Ok(p) => tree.get(p),
                    Err(err) => {
                        error!("line {}: {}", line, err);
                        V::identity()
                    }
                };
                writeln!(out, "{}", value)?;
            }
            Command::Query(l, r) => {
                let tree = self.tree.as_ref().ok_or(ScriptError::NoTree { line })?;
                let value = match (to_index("query", l), to_index("query", r)) {
                    (Ok(l), Ok(r)) => tree.query(l, r),
                    (Err(err), _) | (_, Err(err)) => {
                        error!("line {}: {}", line, err);
                        V::identity()
                    }
                };
                writeln!(out, "{}", value)?;
            }
            Command::All => {
                let tree = self.tree.as_ref().ok_or(ScriptError::NoTree { line })?;
                writeln!(out, "{}", tree.all())?;
            }
            Command::MaxRight(l, cmp, x) => {
                let tree = self.tree.as_ref().ok_or(ScriptError::NoTree { line })?;
                let index = search(line, "max_right", tree, l, cmp, x, |l, pred| {
                    tree.max_right(l, pred)
                });
                writeln!(out, "{}", index)?;
            }
            Command::MinLeft(r, cmp, x) => {
                let tree = self.tree.as_ref().ok_or(ScriptError::NoTree { line })?;
                let index = search(line, "min_left", tree, r, cmp, x, |r, pred| {
                    tree.min_left(r, pred)
                });
                writeln!(out, "{}", index)?;
            }
            Command::Dump => {
                let tree = self.tree.as_ref().ok_or(ScriptError::NoTree { line })?;
                write!(out, "{}", tree.display())?;
            }
        }
        Ok(())
    }
}

/// Shared front half of `max_right` / `min_left`: validates the boundary and
/// the predicate before handing them to `run`.
///
/// A boundary past the end is reported first and yields `len`, whatever the
/// predicate.
///
/// A predicate that fails on the identity cannot be searched with; the
/// boundary itself is reported.
fn search<V, F>(
    line: usize,
    op: &'static str,
    tree: &SegTree<V>,
    bound: i64,
    cmp: Cmp,
    x: i64,
    run: F,
) -> usize
where
    V: ScriptValue,
    F: FnOnce(usize, &dyn Fn(&V) -> bool) -> usize,
{
    let bound = match to_index(op, bound) {
        Ok(bound) if bound > tree.len() => {
            let err = UsageError::IndexOutOfRange {
                op,
                index: bound,
                len: tree.len(),
            };
            error!("line {}: {}", line, err);
            return tree.len();
        }
        Ok(bound) => bound,
        Err(err) => {
            error!("line {}: {}", line, err);
            return tree.len();
        }
    };

    let pred = |value: &V| cmp.test(value.to_i64(), x);
    if !pred(&V::identity()) {
        error!(
            "line {}: {}: predicate `{} {}` fails on the identity {}",
            line,
            op,
            cmp,
            x,
            V::identity()
        );
        return bound;
    }
    run(bound, &pred)
}

/// Runs a whole script, stopping at the first malformed line.
pub fn run<V, R, W>(input: R, out: &mut W) -> Result<Interpreter<V>, ScriptError>
where
    V: ScriptValue,
    R: BufRead,
    W: Write,
{
    let mut interpreter = Interpreter::new();
    for (i, text) in input.lines().enumerate() {
        let text = text?;
        if let Some(command) = parse_line(i + 1, &text)? {
            interpreter.execute(i + 1, command, out)?;
        }
    }
    Ok(interpreter)
}
