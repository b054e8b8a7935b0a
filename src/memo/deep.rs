/// Memoises a derived value behind a structural equality check on its
/// dependencies.
pub struct DeepMemo<D, T> {
    cached: Option<(D, T)>,
}

impl<D: PartialEq + Clone, T> DeepMemo<D, T> {
    pub fn new() -> Self {
        Self { cached: None }
    }

    pub fn get(&mut self, deps: &D, factory: impl FnOnce(&D) -> T) -> &T {
        let stale = !matches!(&self.cached, Some((prev, _)) if prev == deps);
        if stale {
            self.cached = None;
        }
        &self
            .cached
            .get_or_insert_with(|| (deps.clone(), factory(deps)))
            .1
    }

    pub fn peek(&self) -> Option<&T> {
        self.cached.as_ref().map(|(_, value)| value)
    }
}

impl<D: PartialEq + Clone, T> Default for DeepMemo<D, T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recomputes_only_on_structural_change() {
        let mut memo = DeepMemo::new();
        let mut calls = 0;

        let deps = vec![String::from("a"), String::from("b")];
        memo.get(&deps, |d| {
            calls += 1;
            d.len()
        });
        // A fresh allocation with equal contents is not a change.
        let same = deps.clone();
        assert_eq!(
            *memo.get(&same, |d| {
                calls += 1;
                d.len()
            }),
            2
        );
        assert_eq!(calls, 1);

        let changed = vec![String::from("a")];
        assert_eq!(*memo.get(&changed, |d| d.len()), 1);
        assert_eq!(memo.peek(), Some(&1));
    }
}
