use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

/// Comparison operators accepted in `where` clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EqTest {
    /// Equal (`==`)
    Equal,
    /// Less than (`<`)
    LessThan,
    /// Less than or equal (`<=`)
    LessEqual,
    /// Greater than (`>`)
    GreaterThan,
    /// Greater than or equal (`>=`)
    GreaterEqual,
}

impl EqTest {
    pub fn symbol(self) -> &'static str {
        match self {
            EqTest::Equal => "==",
            EqTest::LessThan => "<",
            EqTest::LessEqual => "<=",
            EqTest::GreaterThan => ">",
            EqTest::GreaterEqual => ">=",
        }
    }

    /// Whether `left.cmp(right) == ordering` satisfies the operator.
    pub fn holds(self, ordering: Ordering) -> bool {
        match self {
            EqTest::Equal => ordering == Ordering::Equal,
            EqTest::LessThan => ordering == Ordering::Less,
            EqTest::LessEqual => ordering != Ordering::Greater,
            EqTest::GreaterThan => ordering == Ordering::Greater,
            EqTest::GreaterEqual => ordering != Ordering::Less,
        }
    }
}

impl fmt::Display for EqTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Named switches toggled by bare keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Flag {
    /// Only files modified within the recency window
    Recent,
    /// Presentation hint for the renderer; never filters rows
    Verbose,
    /// Only files whose content is shared with at least one other file
    Duplicates,
    /// Only files with two or more hard links
    Hardlinks,
}

impl Flag {
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word.to_ascii_lowercase().as_str() {
            "recent" => Some(Flag::Recent),
            "verbose" => Some(Flag::Verbose),
            "duplicates" => Some(Flag::Duplicates),
            "hardlinks" => Some(Flag::Hardlinks),
            _ => None,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Flag::Recent => "recent",
            Flag::Verbose => "verbose",
            Flag::Duplicates => "duplicates",
            Flag::Hardlinks => "hardlinks",
        }
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A set of flags in canonical order.
///
/// Inserting a flag twice is a no-op, and the iteration order never depends
/// on the order in which flags were written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagSet(BTreeSet<Flag>);

impl FlagSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, flag: Flag) -> bool {
        self.0.insert(flag)
    }

    pub fn contains(&self, flag: Flag) -> bool {
        self.0.contains(&flag)
    }

    pub fn union_with(&mut self, other: &FlagSet) {
        self.0.extend(other.0.iter().copied());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = Flag> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Flag> for FlagSet {
    fn from_iter<I: IntoIterator<Item = Flag>>(iter: I) -> Self {
        FlagSet(iter.into_iter().collect())
    }
}

impl fmt::Display for FlagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(Flag::keyword).collect();
        f.write_str(&names.join(" "))
    }
}

#[test]
fn test_eq_test_holds() {
    assert!(EqTest::LessEqual.holds(Ordering::Equal));
    assert!(EqTest::LessEqual.holds(Ordering::Less));
    assert!(!EqTest::LessEqual.holds(Ordering::Greater));
    assert!(EqTest::Equal.holds(Ordering::Equal));
    assert!(!EqTest::GreaterThan.holds(Ordering::Equal));
}

#[test]
fn test_flag_set_is_canonical() {
    let a: FlagSet = [Flag::Verbose, Flag::Recent, Flag::Verbose].into_iter().collect();
    let b: FlagSet = [Flag::Recent, Flag::Verbose].into_iter().collect();
    assert_eq!(a, b);
    assert_eq!(a.len(), 2);
    assert_eq!(a.to_string(), "recent verbose");
}
