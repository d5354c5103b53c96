use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use rand::Rng;
use regex::Regex;
use serde_json::json;

use crate::terminal::command::{ArgSpec, Category, Command, CommandOutput, CommandSpec};
use crate::terminal::context::{CommandContext, DiceRoller};

pub const MAX_DICE: u32 = 100;
pub const MIN_SIDES: u32 = 2;
pub const MAX_SIDES: u32 = 1000;
pub const MAX_MODIFIER: i64 = 1000;

static DICE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(\d*)d(\d+)(?:([+-])(\d+))?$").expect("dice pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiceError {
    #[error("Invalid dice expression '{0}'. Use NdM, NdM+K or NdM-K (e.g. 2d6+1)")]
    Malformed(String),
    #[error("Number of dice must be between 1 and {MAX_DICE}, got {0}")]
    DiceCount(u64),
    #[error("Dice must have between {MIN_SIDES} and {MAX_SIDES} sides, got {0}")]
    Sides(u64),
    #[error("Modifier must be at most {MAX_MODIFIER}, got {0}")]
    Modifier(u64),
}

/// A parsed `NdM[+/-K]` roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiceExpression {
    pub count: u32,
    pub sides: u32,
    pub modifier: i64,
}

impl FromStr for DiceExpression {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let malformed = || DiceError::Malformed(trimmed.to_string());
        let caps = DICE_RE.captures(trimmed).ok_or_else(malformed)?;

        let count = match caps.get(1).map(|m| m.as_str()) {
            None | Some("") => 1,
            Some(digits) => digits.parse::<u64>().map_err(|_| malformed())?,
        };
        let sides = caps[2].parse::<u64>().map_err(|_| malformed())?;
        let modifier = match (caps.get(3), caps.get(4)) {
            (Some(sign), Some(value)) => {
                let magnitude = value.as_str().parse::<u64>().map_err(|_| malformed())?;
                if magnitude > MAX_MODIFIER as u64 {
                    return Err(DiceError::Modifier(magnitude));
                }
                if sign.as_str() == "-" { -(magnitude as i64) } else { magnitude as i64 }
            }
            _ => 0,
        };

        if !(1..=MAX_DICE as u64).contains(&count) {
            return Err(DiceError::DiceCount(count));
        }
        if !(MIN_SIDES as u64..=MAX_SIDES as u64).contains(&sides) {
            return Err(DiceError::Sides(sides));
        }
        Ok(DiceExpression {
            count: count as u32,
            sides: sides as u32,
            modifier,
        })
    }
}

impl fmt::Display for DiceExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d{}", self.count, self.sides)?;
        match self.modifier {
            0 => Ok(()),
            m if m > 0 => write!(f, "+{m}"),
            m => write!(f, "{m}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiceRoll {
    pub expression: DiceExpression,
    pub rolls: Vec<u32>,
    pub total: i64,
}

impl DiceExpression {
    pub fn roll(&self, roller: &mut dyn DiceRoller) -> DiceRoll {
        let rolls: Vec<u32> = (0..self.count).map(|_| roller.roll(self.sides)).collect();
        let total = rolls.iter().map(|&r| r as i64).sum::<i64>() + self.modifier;
        DiceRoll { expression: *self, rolls, total }
    }
}

impl DiceRoll {
    pub fn describe(&self) -> String {
        let rolls = self.rolls.iter().map(u32::to_string).collect::<Vec<_>>().join(", ");
        let modifier = match self.expression.modifier {
            0 => String::new(),
            m if m > 0 => format!(" + {m}"),
            m => format!(" - {}", -m),
        };
        format!("Rolled {}: [{rolls}]{modifier} = {}", self.expression, self.total)
    }
}

/// Rolls with the thread-local generator.
#[derive(Debug, Default)]
pub struct ThreadRngRoller;

impl DiceRoller for ThreadRngRoller {
    fn roll(&mut self, sides: u32) -> u32 { rand::rng().random_range(1..=sides.max(1)) }
}

pub struct RollCommand {
    spec: CommandSpec,
}

impl RollCommand {
    pub fn new() -> Self {
        Self {
            spec: CommandSpec {
                name: "roll",
                aliases: &["r", "d"],
                description: "Roll dice, e.g. 2d6+1",
                usage: "roll <NdM[+/-K]>",
                args: vec![ArgSpec::required("expression", "Dice to roll, like d20 or 3d6-2")],
                category: Category::Dice,
            },
        }
    }
}

impl Command for RollCommand {
    fn spec(&self) -> &CommandSpec { &self.spec }

    fn execute(&self, args: &[String], ctx: &mut CommandContext<'_>) -> anyhow::Result<CommandOutput> {
        let expression = match args.join("").parse::<DiceExpression>() {
            Ok(expression) => expression,
            Err(e) => return Ok(CommandOutput::text(e.to_string())),
        };
        let roll = match ctx.dice.as_deref_mut() {
            Some(roller) => expression.roll(roller),
            None => expression.roll(&mut ThreadRngRoller),
        };
        Ok(CommandOutput::structured(
            "dice",
            json!({
                "expression": expression.to_string(),
                "count": expression.count,
                "sides": expression.sides,
                "modifier": expression.modifier,
                "rolls": roll.rolls,
                "total": roll.total,
                "text": roll.describe(),
            }),
        ))
    }
}
