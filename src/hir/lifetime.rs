//! Per-package index of where each symbol is defined and used.

use indexmap::IndexMap;

use crate::analyzer::{Symbol, TypeInfo};
use crate::base::Pos;
use crate::syntax::ast::Ident;

/// Definition and use sites of one symbol inside one package.
#[derive(Debug, Clone)]
pub struct Lifetime {
    /// Start of the earliest definition or use.
    pub first: Pos,
    /// End of the latest definition or use.
    pub last: Pos,
    /// The defining identifier; `None` for symbols declared elsewhere.
    pub def: Option<Ident>,
    /// Using identifiers, in position order.
    pub uses: Vec<Ident>,
}

impl Lifetime {
    fn start(ident: &Ident) -> Self {
        Self {
            first: ident.pos,
            last: ident.end,
            def: None,
            uses: Vec::new(),
        }
    }

    fn extend(&mut self, ident: &Ident) {
        if ident.pos < self.first {
            self.first = ident.pos;
        }
        if ident.end > self.last {
            self.last = ident.end;
        }
    }

    /// Whether `pos` lies inside `[first, last)`.
    pub fn contains(&self, pos: Pos) -> bool {
        self.first <= pos && pos < self.last
    }
}

#[derive(Debug, Default)]
pub struct LifetimeIndex {
    records: IndexMap<Symbol, Lifetime>,
}

impl LifetimeIndex {
    /// Fold every defining and using identifier of `info` into one record
    /// per symbol. Records are ordered by their first position.
    pub fn build(info: &TypeInfo) -> Self {
        let mut records: IndexMap<Symbol, Lifetime> = IndexMap::new();

        for def in info.defs.values() {
            let record = records
                .entry(def.symbol.clone())
                .or_insert_with(|| Lifetime::start(&def.ident));
            record.extend(&def.ident);
            record.def = Some(def.ident.clone());
        }
        for used in info.uses.values() {
            let record = records
                .entry(used.symbol.clone())
                .or_insert_with(|| Lifetime::start(&used.ident));
            record.extend(&used.ident);
            record.uses.push(used.ident.clone());
        }

        for record in records.values_mut() {
            record.uses.sort_by_key(|ident| ident.pos);
        }
        records.sort_by(|_, a, _, b| a.first.cmp(&b.first));
        Self { records }
    }

    pub fn get(&self, symbol: &Symbol) -> Option<&Lifetime> {
        self.records.get(symbol)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Symbol, &Lifetime)> {
        self.records.iter()
    }

    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.records.keys()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
