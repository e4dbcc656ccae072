use {
    crate::{Pid, Value},
    common::pub_fields_struct,
    snafu::{prelude::*, Backtrace},
    std::{fmt, num::ParseIntError, str::FromStr},
};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ParseError {
    #[snafu(display("expected `pid op vaddr [value]`, got {} fields", count))]
    FieldCount { count: usize, backtrace: Backtrace },

    #[snafu(display("unknown instruction `{}`", op))]
    UnknownOp { op: String, backtrace: Backtrace },

    #[snafu(display("invalid {} `{}`: {}", field, text, source))]
    InvalidNumber {
        field: &'static str,
        text: String,
        source: ParseIntError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Map,
    Store,
    Load,
}

impl FromStr for Op {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "map" => Ok(Self::Map),
            "store" => Ok(Self::Store),
            "load" => Ok(Self::Load),
            _ => UnknownOpSnafu { op: s }.fail(),
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::Map => "map",
            Self::Store => "store",
            Self::Load => "load",
        })
    }
}

pub_fields_struct! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct Instruction {
        pid: Pid,
        op: Op,
        v_addr: usize,
        /// Permission for `map` (non-zero is writable), the value for `store`,
        /// ignored by `load`.
        value: Value,
    }
}

fn number<T>(field: &'static str, text: &str) -> Result<T, ParseError>
where
    T: FromStr<Err = ParseIntError>,
{
    text.parse().context(InvalidNumberSnafu { field, text })
}

impl FromStr for Instruction {
    type Err = ParseError;

    /// Parses `pid op vaddr [value]`, fields separated by whitespace and/or commas.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|field| !field.is_empty())
            .collect();

        ensure!(
            (3..=4).contains(&fields.len()),
            FieldCountSnafu {
                count: fields.len()
            }
        );

        Ok(Self {
            pid: number("pid", fields[0])?,
            op: fields[1].parse()?,
            v_addr: number("virtual address", fields[2])?,
            value: fields
                .get(3)
                .map(|text| number("value", text))
                .transpose()?
                .unwrap_or(0),
        })
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}, {}, {}, {}", self.pid, self.op, self.v_addr, self.value)
    }
}
