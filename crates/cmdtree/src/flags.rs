//! Named, typed options scoped to one command node.
//!
//! A [`FlagSet`] holds declarations (name, kind, default, help), the current
//! value of every declared flag, and the positional tokens left over by the
//! last [`parse`](FlagSet::parse).
//!
//! # Syntax
//!
//! Parsing consumes a leading run of flag tokens and stops at the first
//! positional token:
//!
//! ```text
//! --name value      non-boolean flags
//! --name=value      any flag
//! --name            boolean flags (sets true)
//! --                ends the flag run; dropped
//! ```
//!
//! Everything from the first positional token on is returned untouched, even
//! tokens that look like flags. This is what lets the dispatcher hand the
//! remainder to the next command node.
//!
//! The token grammar itself is delegated to `clap`: every parse builds a
//! throwaway `clap::Command` from the declarations, so the set stays plain data
//! that can be cloned and merged while walking the command tree.

use std::collections::BTreeMap;
use std::fmt;

use clap::builder::BoolishValueParser;
use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::parser::ValueSource;
use clap::{value_parser, Arg, ArgAction, ArgMatches};

use crate::error::{FlagError, SetupError};

/// clap id of the catch-all positional. Contains '=' so it can never clash with
/// a declared flag name.
const POSITIONAL_ID: &str = "=positional";

/// The scalar kinds a flag can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlagKind {
    Bool,
    String,
    Int,
    Uint,
    Float,
}

impl FlagKind {
    /// Name shown in usage text next to the flag. Booleans take no value and
    /// have none.
    pub fn type_name(self) -> &'static str {
        match self {
            FlagKind::Bool => "",
            FlagKind::String => "string",
            FlagKind::Int => "int",
            FlagKind::Uint => "uint",
            FlagKind::Float => "float",
        }
    }
}

/// A flag's default or current value.
#[derive(Debug, Clone, PartialEq)]
pub enum FlagValue {
    Bool(bool),
    String(String),
    Int(i64),
    Uint(u64),
    Float(f64),
}

impl FlagValue {
    /// The kind of this value.
    pub fn kind(&self) -> FlagKind {
        match self {
            FlagValue::Bool(_) => FlagKind::Bool,
            FlagValue::String(_) => FlagKind::String,
            FlagValue::Int(_) => FlagKind::Int,
            FlagValue::Uint(_) => FlagKind::Uint,
            FlagValue::Float(_) => FlagKind::Float,
        }
    }

    /// Returns true for `false`, `""` and numeric zero.
    pub fn is_zero(&self) -> bool {
        match self {
            FlagValue::Bool(b) => !b,
            FlagValue::String(s) => s.is_empty(),
            FlagValue::Int(n) => *n == 0,
            FlagValue::Uint(n) => *n == 0,
            FlagValue::Float(n) => *n == 0.0,
        }
    }
}

impl fmt::Display for FlagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlagValue::Bool(b) => write!(f, "{b}"),
            FlagValue::String(s) => write!(f, "{s}"),
            FlagValue::Int(n) => write!(f, "{n}"),
            FlagValue::Uint(n) => write!(f, "{n}"),
            FlagValue::Float(n) => write!(f, "{n}"),
        }
    }
}

impl From<bool> for FlagValue {
    fn from(value: bool) -> Self {
        FlagValue::Bool(value)
    }
}

impl From<&str> for FlagValue {
    fn from(value: &str) -> Self {
        FlagValue::String(value.to_string())
    }
}

impl From<String> for FlagValue {
    fn from(value: String) -> Self {
        FlagValue::String(value)
    }
}

impl From<i32> for FlagValue {
    fn from(value: i32) -> Self {
        FlagValue::Int(value.into())
    }
}

impl From<i64> for FlagValue {
    fn from(value: i64) -> Self {
        FlagValue::Int(value)
    }
}

impl From<u64> for FlagValue {
    fn from(value: u64) -> Self {
        FlagValue::Uint(value)
    }
}

impl From<f64> for FlagValue {
    fn from(value: f64) -> Self {
        FlagValue::Float(value)
    }
}

/// Rust types that can be read back out of a [`FlagSet`] with
/// [`FlagSet::lookup`].
pub trait FromFlagValue: Sized + Default {
    /// Returns `None` when the value is of another kind.
    fn from_flag_value(value: &FlagValue) -> Option<Self>;
}

impl FromFlagValue for bool {
    fn from_flag_value(value: &FlagValue) -> Option<Self> {
        match value {
            FlagValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl FromFlagValue for String {
    fn from_flag_value(value: &FlagValue) -> Option<Self> {
        match value {
            FlagValue::String(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl FromFlagValue for i64 {
    fn from_flag_value(value: &FlagValue) -> Option<Self> {
        match value {
            FlagValue::Int(n) => Some(*n),
            _ => None,
        }
    }
}

impl FromFlagValue for u64 {
    fn from_flag_value(value: &FlagValue) -> Option<Self> {
        match value {
            FlagValue::Uint(n) => Some(*n),
            _ => None,
        }
    }
}

impl FromFlagValue for f64 {
    fn from_flag_value(value: &FlagValue) -> Option<Self> {
        match value {
            FlagValue::Float(n) => Some(*n),
            _ => None,
        }
    }
}

/// A single declared flag.
#[derive(Debug, Clone, PartialEq)]
pub struct Flag {
    name: String,
    help: String,
    default: FlagValue,
    value: FlagValue,
    set: bool,
}

impl Flag {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn help(&self) -> &str {
        &self.help
    }

    pub fn kind(&self) -> FlagKind {
        self.default.kind()
    }

    pub fn default_value(&self) -> &FlagValue {
        &self.default
    }

    pub fn value(&self) -> &FlagValue {
        &self.value
    }

    /// Returns true once the flag has been given on a command line (or via
    /// [`FlagSet::set`]), even if the given value equals the default.
    pub fn is_set(&self) -> bool {
        self.set
    }

    fn arg(&self) -> Arg {
        let arg = Arg::new(self.name.clone())
            .long(self.name.clone())
            .action(ArgAction::Set);

        match self.kind() {
            FlagKind::Bool => arg
                .num_args(0..=1)
                .require_equals(true)
                .default_missing_value("true")
                .value_parser(BoolishValueParser::new()),
            // `--name value` takes the next token whatever it looks like.
            FlagKind::String => arg.num_args(1).allow_hyphen_values(true),
            FlagKind::Int => arg
                .num_args(1)
                .allow_hyphen_values(true)
                .value_parser(value_parser!(i64)),
            FlagKind::Uint => arg
                .num_args(1)
                .allow_hyphen_values(true)
                .value_parser(value_parser!(u64)),
            FlagKind::Float => arg
                .num_args(1)
                .allow_hyphen_values(true)
                .value_parser(value_parser!(f64)),
        }
    }

    fn take_match(&mut self, matches: &ArgMatches) {
        if matches.value_source(&self.name) != Some(ValueSource::CommandLine) {
            return;
        }

        let id = self.name.as_str();
        let value = match self.kind() {
            FlagKind::Bool => matches.get_one::<bool>(id).copied().map(FlagValue::Bool),
            FlagKind::String => matches.get_one::<String>(id).cloned().map(FlagValue::String),
            FlagKind::Int => matches.get_one::<i64>(id).copied().map(FlagValue::Int),
            FlagKind::Uint => matches.get_one::<u64>(id).copied().map(FlagValue::Uint),
            FlagKind::Float => matches.get_one::<f64>(id).copied().map(FlagValue::Float),
        };

        if let Some(value) = value {
            self.value = value;
            self.set = true;
        }
    }
}

/// Named options of one command node plus the positional remainder of the
/// last parse.
///
/// # Example
///
/// ```rust
/// use cmdtree::FlagSet;
///
/// let mut flags = FlagSet::new("echo");
/// flags.string("case", "", "Case to use (upper, lower)")?;
///
/// let rest = flags.parse(["--case=upper", "hello", "world"])?;
/// assert_eq!(rest, ["hello", "world"]);
/// assert_eq!(flags.lookup::<String>("case"), "upper");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FlagSet {
    name: String,
    flags: BTreeMap<String, Flag>,
    args: Vec<String>,
}

impl FlagSet {
    /// Creates an empty set. `name` is the owning command's name and only
    /// shows up in error messages.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            flags: BTreeMap::new(),
            args: Vec::new(),
        }
    }

    /// The owning command's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declares a flag. Its kind is the kind of `default`.
    pub fn declare(
        &mut self,
        name: &str,
        default: impl Into<FlagValue>,
        help: &str,
    ) -> Result<&mut Self, SetupError> {
        if name.is_empty() || name.starts_with('-') || name.contains('=') {
            return Err(SetupError::InvalidFlagName(name.to_string()));
        }
        if self.flags.contains_key(name) {
            return Err(SetupError::DuplicateFlag {
                command: self.name.clone(),
                flag: name.to_string(),
            });
        }

        let default = default.into();
        self.flags.insert(
            name.to_string(),
            Flag {
                name: name.to_string(),
                help: help.to_string(),
                value: default.clone(),
                default,
                set: false,
            },
        );
        Ok(self)
    }

    pub fn bool(&mut self, name: &str, default: bool, help: &str) -> Result<&mut Self, SetupError> {
        self.declare(name, default, help)
    }

    pub fn string(&mut self, name: &str, default: &str, help: &str) -> Result<&mut Self, SetupError> {
        self.declare(name, default, help)
    }

    pub fn int(&mut self, name: &str, default: i64, help: &str) -> Result<&mut Self, SetupError> {
        self.declare(name, default, help)
    }

    pub fn uint(&mut self, name: &str, default: u64, help: &str) -> Result<&mut Self, SetupError> {
        self.declare(name, default, help)
    }

    pub fn float(&mut self, name: &str, default: f64, help: &str) -> Result<&mut Self, SetupError> {
        self.declare(name, default, help)
    }

    /// Parses a leading run of flag tokens and returns the positional
    /// remainder, which is also kept and available from [`args`](Self::args).
    ///
    /// Values of flags given in `tokens` are updated in place. On error the
    /// set is left unchanged.
    pub fn parse<I, S>(&mut self, tokens: I) -> Result<&[String], FlagError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens: Vec<String> = tokens.into_iter().map(Into::into).collect();
        let matches = self
            .parser()
            .try_get_matches_from(tokens.iter())
            .map_err(|err| FlagError::from_clap(&err))?;

        for flag in self.flags.values_mut() {
            flag.take_match(&matches);
        }

        self.args = matches
            .get_many::<String>(POSITIONAL_ID)
            .map(|values| values.cloned().collect())
            .unwrap_or_default();

        Ok(&self.args)
    }

    /// Assigns a flag from its textual form, as if `--name=raw` had been
    /// parsed. The positional remainder is left alone.
    pub fn set(&mut self, name: &str, raw: &str) -> Result<(), FlagError> {
        if !self.flags.contains_key(name) {
            return Err(FlagError::Unknown(format!("--{name}")));
        }

        let args = std::mem::take(&mut self.args);
        let result = self.parse([format!("--{name}={raw}")]).map(|_| ());
        self.args = args;
        result
    }

    /// Positional tokens left by the last parse.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Returns the current value of `name` as `T`, or `T::default()` when the
    /// flag is not declared or holds another kind.
    pub fn lookup<T: FromFlagValue>(&self, name: &str) -> T {
        self.flags
            .get(name)
            .and_then(|flag| T::from_flag_value(&flag.value))
            .unwrap_or_default()
    }

    pub fn get(&self, name: &str) -> Option<&Flag> {
        self.flags.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.flags.contains_key(name)
    }

    /// All declared flags, sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = &Flag> {
        self.flags.values()
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Copies every flag of `ancestor` that is not declared here, with its
    /// current value. Local declarations win on name clashes.
    pub(crate) fn inherit(&mut self, ancestor: &FlagSet) {
        for (name, flag) in &ancestor.flags {
            self.flags
                .entry(name.clone())
                .or_insert_with(|| flag.clone());
        }
    }

    fn parser(&self) -> clap::Command {
        let cmd = clap::Command::new(self.name.clone())
            .no_binary_name(true)
            .disable_help_flag(true)
            .disable_version_flag(true)
            .args_override_self(true);

        self.flags
            .values()
            .fold(cmd, |cmd, flag| cmd.arg(flag.arg()))
            .arg(
                Arg::new(POSITIONAL_ID)
                    .action(ArgAction::Append)
                    .num_args(0..)
                    .trailing_var_arg(true),
            )
    }
}

impl FlagError {
    fn from_clap(err: &clap::Error) -> Self {
        let context = |kind: ContextKind| match err.get(kind) {
            Some(ContextValue::String(s)) => Some(s.clone()),
            _ => None,
        };
        let arg = context(ContextKind::InvalidArg).unwrap_or_default();

        match err.kind() {
            ErrorKind::UnknownArgument => {
                let name = arg.split('=').next().unwrap_or_default();
                if name == "-h" || name == "--help" {
                    FlagError::Help
                } else {
                    FlagError::Unknown(arg)
                }
            }
            ErrorKind::InvalidValue | ErrorKind::ValueValidation => {
                // clap renders the arg with its placeholder: `--n <n>`, `--v[=<v>]`
                let flag = arg
                    .split([' ', '['])
                    .next()
                    .unwrap_or_default()
                    .to_string();
                match context(ContextKind::InvalidValue) {
                    Some(value) if !value.is_empty() => FlagError::InvalidValue { flag, value },
                    _ => FlagError::MissingValue(flag),
                }
            }
            kind => FlagError::Invalid(
                kind.as_str()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("invalid flag syntax: {arg}")),
            ),
        }
    }
}
