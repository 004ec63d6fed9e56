//! Solver variables.
//!
//! A [`Variable`] is a small `Copy` handle. Its identity is the numeric id
//! handed out by a [`VariableAllocator`]; the kind only decides how the
//! simplex engine is allowed to treat it.

use std::fmt;

/// The role a variable plays in the tableau.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VariableKind {
    /// A client variable. Restricted externals must stay non-negative.
    External { restricted: bool },
    /// Converts an inequality into an equality.
    Slack,
    /// Measures the violation of a non-required constraint.
    Error,
    /// Marks the row of a required equality.
    Dummy,
}

/// A handle to a solver variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Variable {
    id: u32,
    kind: VariableKind,
}

impl Variable {
    /// The numeric id of this variable.
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn kind(&self) -> VariableKind {
        self.kind
    }

    /// True only for client-created variables.
    pub fn is_external(&self) -> bool {
        matches!(self.kind, VariableKind::External { .. })
    }

    pub fn is_slack(&self) -> bool {
        matches!(self.kind, VariableKind::Slack)
    }

    pub fn is_error(&self) -> bool {
        matches!(self.kind, VariableKind::Error)
    }

    pub fn is_dummy(&self) -> bool {
        matches!(self.kind, VariableKind::Dummy)
    }

    /// Slack and error variables: the internal variables a new row may be
    /// solved for.
    pub fn is_pivotable(&self) -> bool {
        self.is_slack() || self.is_error()
    }

    /// Whether the simplex passes may move this variable into the basis.
    /// Dummies are pinned at zero and free externals never leave it.
    pub fn can_enter(&self) -> bool {
        match self.kind {
            VariableKind::External { restricted } => restricted,
            VariableKind::Slack | VariableKind::Error => true,
            VariableKind::Dummy => false,
        }
    }

    /// A restricted variable must keep a value `>= 0`.
    pub fn is_restricted(&self) -> bool {
        match self.kind {
            VariableKind::External { restricted } => restricted,
            VariableKind::Slack | VariableKind::Error | VariableKind::Dummy => true,
        }
    }
}

impl PartialOrd for Variable {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Variable {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id.cmp(&other.id)
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.kind {
            VariableKind::External { restricted: false } => "x",
            VariableKind::External { restricted: true } => "r",
            VariableKind::Slack => "s",
            VariableKind::Error => "e",
            VariableKind::Dummy => "d",
        };
        write!(f, "{}{}", prefix, self.id)
    }
}

/// Hands out variables with unique ids.
///
/// Every solver owns one allocator, so two variables from the same solver
/// never compare equal unless they are the same variable.
#[derive(Debug, Clone, Default)]
pub struct VariableAllocator {
    next: u32,
}

impl VariableAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self, kind: VariableKind) -> Variable {
        let id = self.next;
        self.next += 1;
        Variable { id, kind }
    }

    /// A free external variable.
    pub fn external(&mut self) -> Variable {
        self.allocate(VariableKind::External { restricted: false })
    }

    /// An external variable that must remain non-negative.
    pub fn restricted(&mut self) -> Variable {
        self.allocate(VariableKind::External { restricted: true })
    }

    pub fn slack(&mut self) -> Variable {
        self.allocate(VariableKind::Slack)
    }

    pub fn error(&mut self) -> Variable {
        self.allocate(VariableKind::Error)
    }

    pub fn dummy(&mut self) -> Variable {
        self.allocate(VariableKind::Dummy)
    }

    /// Number of variables allocated so far.
    pub fn allocated(&self) -> u32 {
        self.next
    }

    /// Whether `variable` could have come from this allocator.
    pub fn owns(&self, variable: Variable) -> bool {
        variable.id < self.next
    }
}
