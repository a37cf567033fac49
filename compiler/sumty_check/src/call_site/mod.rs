//! Handler arguments as written at a dispatch call site.

use std::fmt;

use sumty_ir::{Span, CATCH_ALL};

/// One handler passed to a dispatch call.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum HandlerArg {
    /// Bound to the case with this name, or the catch-all `_`.
    Named(String),
    /// Bound to the case at the argument's ordinal.
    Positional,
}

impl HandlerArg {
    pub fn named(name: impl Into<String>) -> Self {
        HandlerArg::Named(name.into())
    }

    pub fn catch_all() -> Self {
        HandlerArg::Named(CATCH_ALL.to_string())
    }

    pub fn is_catch_all(&self) -> bool {
        matches!(self, HandlerArg::Named(name) if name == CATCH_ALL)
    }
}

/// A dispatch call: where it is and the handlers it passes, in order.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct CallSite {
    pub span: Span,
    pub args: Vec<HandlerArg>,
}

impl CallSite {
    pub fn new(span: Span, args: impl IntoIterator<Item = HandlerArg>) -> Self {
        CallSite {
            span,
            args: args.into_iter().collect(),
        }
    }

    /// A call site binding every handler by name.
    pub fn named<'a>(span: Span, names: impl IntoIterator<Item = &'a str>) -> Self {
        Self::new(span, names.into_iter().map(HandlerArg::named))
    }

    /// A call site binding `count` handlers by position.
    pub fn positional(span: Span, count: usize) -> Self {
        Self::new(span, vec![HandlerArg::Positional; count])
    }
}

impl fmt::Display for CallSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match arg {
                HandlerArg::Named(name) => write!(f, "{name}: ..")?,
                HandlerArg::Positional => f.write_str("..")?,
            }
        }
        f.write_str(")")
    }
}
