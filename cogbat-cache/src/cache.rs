use lazy_static::lazy_static;
use std::collections::HashMap;
use std::sync::RwLock;
pub use string_cache::DefaultAtom as Atom;

/// Process-wide intern table. Ids are dense and stable for the lifetime of
/// the process, which lets the renderer cache rasterized labels by id.
struct Interner {
    atoms: Vec<Atom>,
    index: HashMap<Atom, usize>,
}

lazy_static! {
    static ref TEXT_INTERNER: RwLock<Interner> = RwLock::new(Interner {
        atoms: Vec::new(),
        index: HashMap::new(),
    });
}

/// Intern a string and return its id. Re-interning returns the same id.
pub fn intern_text(s: &str) -> usize {
    let atom = Atom::from(s);
    {
        let interner = TEXT_INTERNER.read().unwrap();
        if let Some(&id) = interner.index.get(&atom) {
            return id;
        }
    }
    let mut interner = TEXT_INTERNER.write().unwrap();
    if let Some(&id) = interner.index.get(&atom) {
        return id;
    }
    let id = interner.atoms.len();
    interner.atoms.push(atom.clone());
    interner.index.insert(atom, id);
    id
}

/// Number of unique interned strings.
pub fn text_count() -> usize {
    TEXT_INTERNER.read().unwrap().atoms.len()
}

/// Look up an interned atom by id.
pub fn get_text(id: usize) -> Option<Atom> {
    TEXT_INTERNER.read().unwrap().atoms.get(id).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_is_idempotent() {
        let a = intern_text("fixate");
        let b = intern_text("fixate");
        assert_eq!(a, b);
        assert_eq!(get_text(a).as_deref(), Some("fixate"));
    }

    #[test]
    fn distinct_strings_get_distinct_ids() {
        let a = intern_text("left");
        let b = intern_text("right");
        assert_ne!(a, b);
    }

    #[test]
    fn unknown_id_is_none() {
        assert!(get_text(usize::MAX).is_none());
    }
}
