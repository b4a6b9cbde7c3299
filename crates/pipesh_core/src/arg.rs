use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use crate::utils::path_to_string;

/// A working directory directive.
///
/// Accepted anywhere in a command's argument list. Overrides the session's
/// default directory for that single pipeline stage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dir(pub PathBuf);

impl Dir {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self(path.into())
    }
}

/// An environment directive.
///
/// Variables set here apply to a single pipeline stage and take precedence
/// over the session's environment.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Env(pub HashMap<String, String>);

impl Env {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a variable to the directive.
    pub fn var<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }
}

impl From<HashMap<String, String>> for Env {
    fn from(vars: HashMap<String, String>) -> Self {
        Self(vars)
    }
}

/// A single value passed to a command.
///
/// Values are either literal arguments (strings and scalars), sequences of
/// scalars that are flattened into multiple arguments, or directives that
/// configure the stage instead of adding to its argument list.
#[derive(Clone, Debug, PartialEq)]
pub enum Arg {
    Str(String),
    Bool(bool),
    Int(i64),
    Uint(u64),
    /// 32-bit float. Rendered with 2 decimals.
    F32(f32),
    /// 64-bit float. Rendered with 4 decimals.
    F64(f64),
    List(Vec<Arg>),
    Dir(Dir),
    Env(Env),
    /// A value without an argument representation. Named by its type.
    Unsupported(&'static str),
}

/// Out-of-band settings collected while resolving arguments.
#[derive(Debug, Default)]
pub struct Directives {
    /// The last working directory directive, if any.
    pub dir: Option<PathBuf>,
    /// Per-stage environment overrides. Later directives replace earlier keys.
    pub env: HashMap<String, String>,
}

impl Arg {
    /// Returns the textual form of a scalar value, or `None` for values that
    /// are not scalars.
    pub fn to_scalar_string(&self) -> Option<String> {
        match self {
            Arg::Str(value) => Some(value.clone()),
            Arg::Bool(value) => Some(value.to_string()),
            Arg::Int(value) => Some(value.to_string()),
            Arg::Uint(value) => Some(value.to_string()),
            Arg::F32(value) => Some(format!("{:.2}", value)),
            Arg::F64(value) => Some(format!("{:.4}", value)),
            Arg::List(_) | Arg::Dir(_) | Arg::Env(_) | Arg::Unsupported(_) => None,
        }
    }

    /// Resolves the value into `args` or `directives`.
    ///
    /// Sequence elements that are not scalars, and unsupported values, are
    /// dropped without error.
    pub fn resolve(self, args: &mut Vec<String>, directives: &mut Directives) {
        match self {
            Arg::List(items) => {
                for item in items {
                    match item.to_scalar_string() {
                        Some(value) => args.push(value),
                        None => log::trace!("skipping non-scalar sequence element: {:?}", item),
                    }
                }
            }
            Arg::Dir(Dir(path)) => directives.dir = Some(path),
            Arg::Env(Env(vars)) => directives.env.extend(vars),
            Arg::Unsupported(kind) => log::trace!("skipping unsupported argument of type {kind}"),
            scalar => {
                if let Some(value) = scalar.to_scalar_string() {
                    args.push(value);
                }
            }
        }
    }
}

impl From<&str> for Arg {
    fn from(value: &str) -> Self {
        Arg::Str(value.to_owned())
    }
}

impl From<String> for Arg {
    fn from(value: String) -> Self {
        Arg::Str(value)
    }
}

impl From<&String> for Arg {
    fn from(value: &String) -> Self {
        Arg::Str(value.clone())
    }
}

impl From<&Path> for Arg {
    fn from(value: &Path) -> Self {
        Arg::Str(path_to_string(&value))
    }
}

impl From<PathBuf> for Arg {
    fn from(value: PathBuf) -> Self {
        Arg::Str(path_to_string(&value))
    }
}

impl From<bool> for Arg {
    fn from(value: bool) -> Self {
        Arg::Bool(value)
    }
}

impl From<f32> for Arg {
    fn from(value: f32) -> Self {
        Arg::F32(value)
    }
}

impl From<f64> for Arg {
    fn from(value: f64) -> Self {
        Arg::F64(value)
    }
}

impl From<Dir> for Arg {
    fn from(value: Dir) -> Self {
        Arg::Dir(value)
    }
}

impl From<Env> for Arg {
    fn from(value: Env) -> Self {
        Arg::Env(value)
    }
}

macro_rules! impl_from_integer {
    ($variant:ident, $target:ty: $($source:ty),+) => {
        $(
            impl From<$source> for Arg {
                fn from(value: $source) -> Self {
                    Arg::$variant(value as $target)
                }
            }
        )+
    };
}

impl_from_integer!(Int, i64: i8, i16, i32, i64, isize);
impl_from_integer!(Uint, u64: u8, u16, u32, u64, usize);

impl<T: Into<Arg>> From<Vec<T>> for Arg {
    fn from(values: Vec<T>) -> Self {
        Arg::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Arg> + Clone> From<&[T]> for Arg {
    fn from(values: &[T]) -> Self {
        Arg::List(values.iter().cloned().map(Into::into).collect())
    }
}

impl<T: Into<Arg>, const N: usize> From<[T; N]> for Arg {
    fn from(values: [T; N]) -> Self {
        Arg::List(values.into_iter().map(Into::into).collect())
    }
}

/// `None` has no argument representation and is dropped like any other
/// unsupported value.
impl<T: Into<Arg>> From<Option<T>> for Arg {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => value.into(),
            None => Arg::Unsupported(std::any::type_name::<Option<T>>()),
        }
    }
}

/// Builds a `Vec<Arg>` from values of mixed types.
///
/// ```
/// use pipesh_core::{args, Arg, Dir};
///
/// let args = args!["-n", 3, Dir::new("/tmp")];
/// assert_eq!(args[1], Arg::Int(3));
/// ```
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::Arg>::new()
    };
    ($($arg:expr),+ $(,)?) => {
        vec![$($crate::Arg::from($arg)),+]
    };
}
