use crate::error::ParseError;
use hashbrown::HashMap;

/// Maximum number of distinct free variables in one expression
pub const MAX_VARIABLES: usize = 32;

/// How a name is resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Supplied at evaluation time, through a slot
    Variable,
    /// Known when parsing, folded into a literal
    Constant,
}

/// One named entry of a [`SymbolTable`]
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub role: Role,
    /// Set for constants
    pub value: Option<f64>,
    /// Set for variables
    pub slot: Option<usize>,
}

/// Outcome of looking up an identifier
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolved {
    Constant(f64),
    Variable(usize),
}

/// Names seen by a single parse.
///
/// Constants are registered up front. Any other name becomes a variable the
/// first time it is resolved, and is given the next free slot, so slots follow
/// first-use order.
#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    index: HashMap<String, usize>,
    variables: usize,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table knowing the given named constants
    pub fn with_constants<'a, I, K>(constants: I) -> Self
    where
        I: IntoIterator<Item = (K, &'a f64)>,
        K: AsRef<str>,
    {
        let mut table = Self::new();
        for (name, &value) in constants {
            table.define_constant(name.as_ref(), value);
        }
        table
    }

    /// Register `name` as a constant, replacing a previous definition
    pub fn define_constant(&mut self, name: &str, value: f64) {
        let symbol = Symbol {
            name: name.to_string(),
            role: Role::Constant,
            value: Some(value),
            slot: None,
        };
        match self.index.get(name) {
            Some(&i) if self.symbols[i].role == Role::Constant => self.symbols[i] = symbol,
            // A name that is already a variable keeps its slot
            Some(_) => {}
            None => {
                self.index.insert(symbol.name.clone(), self.symbols.len());
                self.symbols.push(symbol);
            }
        }
    }

    /// Resolve `name`, assigning it a new variable slot on first use
    pub fn resolve(&mut self, name: &str) -> Result<Resolved, ParseError> {
        if let Some(&i) = self.index.get(name) {
            let symbol = &self.symbols[i];
            return Ok(match (symbol.value, symbol.slot) {
                (Some(value), _) => Resolved::Constant(value),
                (None, Some(slot)) => Resolved::Variable(slot),
                (None, None) => unreachable!("symbol '{}' is neither constant nor variable", name),
            });
        }

        if self.variables == MAX_VARIABLES {
            return Err(ParseError::TooManyVariables { max: MAX_VARIABLES });
        }
        let slot = self.variables;
        self.variables += 1;
        self.index.insert(name.to_string(), self.symbols.len());
        self.symbols.push(Symbol {
            name: name.to_string(),
            role: Role::Variable,
            value: None,
            slot: Some(slot),
        });
        Ok(Resolved::Variable(slot))
    }

    /// Number of variable slots handed out so far
    pub fn variable_count(&self) -> usize {
        self.variables
    }

    /// Names of the variables, indexed by slot
    pub fn variable_names(&self) -> Vec<String> {
        let mut names = vec![String::new(); self.variables];
        for symbol in &self.symbols {
            if let Some(slot) = symbol.slot {
                names[slot] = symbol.name.clone();
            }
        }
        names
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_follow_first_use() {
        let mut table = SymbolTable::new();
        assert_eq!(table.resolve("y"), Ok(Resolved::Variable(0)));
        assert_eq!(table.resolve("x"), Ok(Resolved::Variable(1)));
        assert_eq!(table.resolve("y"), Ok(Resolved::Variable(0)));
        assert_eq!(table.variable_names(), vec!["y", "x"]);
        assert_eq!(table.variable_count(), 2);
    }

    #[test]
    fn constants_take_no_slot() {
        let constants = [("pi".to_string(), std::f64::consts::PI)];
        let mut table = SymbolTable::with_constants(constants.iter().map(|(k, v)| (k, v)));
        assert_eq!(table.resolve("pi"), Ok(Resolved::Constant(std::f64::consts::PI)));
        assert_eq!(table.resolve("t"), Ok(Resolved::Variable(0)));
        assert_eq!(table.variable_names(), vec!["t"]);

        let roles: Vec<Role> = table.symbols().iter().map(|s| s.role).collect();
        assert_eq!(roles, vec![Role::Constant, Role::Variable]);
    }

    #[test]
    fn redefining_a_constant_replaces_it() {
        let mut table = SymbolTable::new();
        table.define_constant("a", 1.0);
        table.define_constant("a", 2.0);
        assert_eq!(table.resolve("a"), Ok(Resolved::Constant(2.0)));
        assert_eq!(table.symbols().len(), 1);
    }

    #[test]
    fn variable_limit() {
        let mut table = SymbolTable::new();
        for i in 0..MAX_VARIABLES {
            assert!(table.resolve(&format!("v{}", i)).is_ok());
        }
        assert_eq!(
            table.resolve("one_too_many"),
            Err(ParseError::TooManyVariables { max: MAX_VARIABLES })
        );
        // Known names still resolve
        assert_eq!(table.resolve("v0"), Ok(Resolved::Variable(0)));
    }
}
