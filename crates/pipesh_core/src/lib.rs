mod alias;
mod arg;
pub mod env;
mod host;
mod invocation;
mod stream;
pub mod utils;

pub use alias::{AliasEntry, AliasTable};
pub use arg::{Arg, Dir, Directives, Env};
pub use host::{Host, StdHost};
pub use invocation::{Invocation, InvocationBuilder};
pub use stream::{Input, Output, Stream, StreamError};
