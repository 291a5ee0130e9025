use std::{fmt, str::FromStr};

use nom::{
    character::complete::{char, multispace0, u64},
    combinator::{all_consuming, map_res},
    sequence::{delimited, separated_pair},
    IResult,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ShapeError {
    #[error("expected `<lines>x<ways>`, found `{0}`")]
    Syntax(String),
    #[error("cache dimensions {lines}x{ways} aren't powers of 2")]
    NotPowerOfTwo { lines: usize, ways: usize },
    #[error("cache {lines}x{ways} holds more than {} slots", u16::MAX)]
    TooLarge { lines: usize, ways: usize },
}

/// number of lines and ways of a cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Shape {
    pub lines: usize,
    pub ways: usize,
}

impl Shape {
    /// `2^k` lines and `2^(total_exponent - k)` ways. requires `k <= total_exponent`.
    pub fn from_split(k: u32, total_exponent: u32) -> Self {
        Self {
            lines: 1 << k,
            ways: 1 << (total_exponent - k),
        }
    }
    /// number of slots. `None` on overflow.
    pub fn capacity(&self) -> Option<usize> {
        self.lines.checked_mul(self.ways)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.lines, self.ways)
    }
}

fn dimension(input: &str) -> IResult<&str, usize> {
    map_res(u64, usize::try_from)(input)
}

fn shape(input: &str) -> IResult<&str, (usize, usize)> {
    all_consuming(delimited(
        multispace0,
        separated_pair(dimension, char('x'), dimension),
        multispace0,
    ))(input)
}

impl FromStr for Shape {
    type Err = ShapeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (_, (lines, ways)) = shape(s).map_err(|_| ShapeError::Syntax(s.to_string()))?;
        if !lines.is_power_of_two() || !ways.is_power_of_two() {
            return Err(ShapeError::NotPowerOfTwo { lines, ways });
        }
        let shape = Self { lines, ways };
        match shape.capacity() {
            Some(c) if c <= u16::MAX as usize => Ok(shape),
            _ => Err(ShapeError::TooLarge { lines, ways }),
        }
    }
}
