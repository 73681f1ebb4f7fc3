use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::rc::Rc;

use crate::ast::Expr;

use super::error::{Result, RuntimeError};

/// Which names were derived from which, scoped to a single frame.
///
/// An edge `a -> b` labeled `e` means `b` was bound with `b <- e` and `e`
/// read `a`, so `b` must be recomputed from `e` whenever `a` changes. Names
/// are variables or signal identities. A vertex exists only while it has at
/// least one incident edge, and the graph never contains a cycle.
#[derive(Debug, Default, Clone)]
pub struct DependencyGraph {
    outgoing: HashMap<String, BTreeMap<String, Rc<Expr>>>,
    incoming: HashMap<String, BTreeSet<String>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.outgoing.contains_key(name) || self.incoming.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.outgoing.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.outgoing.values().map(BTreeMap::len).sum()
    }

    /// `(target, expr)` for every edge leaving `name`; empty for unknown names.
    pub fn outgoing<'a>(&'a self, name: &str) -> impl Iterator<Item = (&'a str, &'a Rc<Expr>)> + 'a {
        self.outgoing
            .get(name)
            .into_iter()
            .flat_map(|targets| targets.iter().map(|(t, e)| (t.as_str(), e)))
    }

    /// Names `name` was derived from.
    pub fn incoming<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a str> + 'a {
        self.incoming.get(name).into_iter().flatten().map(String::as_str)
    }

    /// Add one edge per source into `target`, all labeled `expr`, as a
    /// single batch. If any of them closes a cycle the whole batch is undone.
    pub fn add_edges<I, S>(&mut self, target: &str, sources: I, expr: Rc<Expr>) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut added = Vec::new();
        for source in sources {
            let source = source.into();
            let replaced = self.insert_edge(&source, target, Rc::clone(&expr));
            added.push((source, replaced));
        }

        if added.iter().any(|(source, _)| self.reaches(target, source)) {
            for (source, replaced) in added.into_iter().rev() {
                self.remove_edge(&source, target);
                if let Some(previous) = replaced {
                    self.insert_edge(&source, target, previous);
                }
            }
            return Err(RuntimeError::CyclicDependency { name: target.to_string() });
        }
        Ok(())
    }

    /// Drop every edge into `name`, returning what was removed.
    pub fn remove_incoming(&mut self, name: &str) -> Vec<(String, Rc<Expr>)> {
        let sources = self.incoming.get(name).cloned().unwrap_or_default();
        sources
            .into_iter()
            .filter_map(|source| {
                let expr = self.remove_edge(&source, name)?;
                Some((source, expr))
            })
            .collect()
    }

    /// Replace the derivation of `target`. On a cycle the previous incoming
    /// edges are put back, leaving the graph exactly as it was.
    pub fn rebind<I, S>(&mut self, target: &str, sources: I, expr: Rc<Expr>) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let previous = self.remove_incoming(target);
        let result = self.add_edges(target, sources, expr);
        if result.is_err() {
            for (source, expr) in previous {
                self.insert_edge(&source, target, expr);
            }
        }
        result
    }

    fn insert_edge(&mut self, source: &str, target: &str, expr: Rc<Expr>) -> Option<Rc<Expr>> {
        self.incoming
            .entry(target.to_string())
            .or_default()
            .insert(source.to_string());
        self.outgoing
            .entry(source.to_string())
            .or_default()
            .insert(target.to_string(), expr)
    }

    /// Remove one edge, pruning whichever endpoints are left without edges.
    fn remove_edge(&mut self, source: &str, target: &str) -> Option<Rc<Expr>> {
        let targets = self.outgoing.get_mut(source)?;
        let expr = targets.remove(target)?;
        if targets.is_empty() {
            self.outgoing.remove(source);
        }
        if let Some(sources) = self.incoming.get_mut(target) {
            sources.remove(source);
            if sources.is_empty() {
                self.incoming.remove(target);
            }
        }
        Some(expr)
    }

    /// Is there a path `from -> ... -> to`? A name always reaches itself.
    fn reaches(&self, from: &str, to: &str) -> bool {
        let mut stack = vec![from];
        let mut seen = HashSet::new();
        while let Some(name) = stack.pop() {
            if name == to {
                return true;
            }
            if !seen.insert(name) {
                continue;
            }
            stack.extend(self.outgoing(name).map(|(target, _)| target));
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expr(name: &str) -> Rc<Expr> {
        Rc::new(Expr::Ref(name.to_string()))
    }

    fn targets(g: &DependencyGraph, name: &str) -> Vec<String> {
        g.outgoing(name).map(|(t, _)| t.to_string()).collect()
    }

    fn sources(g: &DependencyGraph, name: &str) -> Vec<String> {
        g.incoming(name).map(str::to_string).collect()
    }

    #[test]
    fn edges_show_up_in_both_directions() {
        let mut g = DependencyGraph::new();
        g.add_edges("c", ["a", "b"], expr("a")).unwrap();
        assert_eq!(targets(&g, "a"), vec!["c"]);
        assert_eq!(targets(&g, "b"), vec!["c"]);
        assert_eq!(sources(&g, "c"), vec!["a", "b"]);
        assert_eq!(g.edge_count(), 2);
    }

    #[test]
    fn outgoing_of_unknown_name_is_empty() {
        let g = DependencyGraph::new();
        assert_eq!(g.outgoing("nope").count(), 0);
        assert!(!g.contains("nope"));
    }

    #[test]
    fn outgoing_carries_the_expression() {
        let mut g = DependencyGraph::new();
        let e = Rc::new(Expr::Integer(7));
        g.add_edges("b", ["a"], Rc::clone(&e)).unwrap();
        let (_, label) = g.outgoing("a").next().unwrap();
        assert!(Rc::ptr_eq(label, &e));
    }

    #[test]
    fn self_dependency_is_a_cycle() {
        let mut g = DependencyGraph::new();
        let err = g.add_edges("a", ["a"], expr("a")).unwrap_err();
        assert_eq!(err, RuntimeError::CyclicDependency { name: "a".to_string() });
        assert!(g.is_empty());
    }

    #[test]
    fn cycle_rolls_back_whole_batch() {
        let mut g = DependencyGraph::new();
        g.add_edges("b", ["a"], expr("a")).unwrap();
        g.add_edges("c", ["b"], expr("b")).unwrap();
        // x -> a is fine on its own, c -> a closes a -> b -> c -> a
        let err = g.add_edges("a", ["x", "c"], expr("x")).unwrap_err();
        assert!(matches!(err, RuntimeError::CyclicDependency { ref name } if name == "a"));
        assert!(!g.contains("x"));
        assert_eq!(sources(&g, "a"), Vec::<String>::new());
        assert_eq!(g.edge_count(), 2);
    }

    #[test]
    fn diamond_is_not_a_cycle() {
        let mut g = DependencyGraph::new();
        g.add_edges("b", ["a"], expr("a")).unwrap();
        g.add_edges("c", ["a"], expr("a")).unwrap();
        g.add_edges("d", ["b", "c"], expr("b")).unwrap();
        assert_eq!(g.edge_count(), 4);
    }

    #[test]
    fn remove_incoming_prunes_isolated_vertices() {
        let mut g = DependencyGraph::new();
        g.add_edges("b", ["a"], expr("a")).unwrap();
        g.add_edges("c", ["b"], expr("b")).unwrap();

        let removed = g.remove_incoming("b");
        assert_eq!(removed.len(), 1);
        assert!(!g.contains("a"));
        // b still feeds c
        assert!(g.contains("b"));
        assert_eq!(targets(&g, "b"), vec!["c"]);

        g.remove_incoming("c");
        assert!(g.is_empty());
        assert!(!g.contains("b"));
        assert!(!g.contains("c"));
    }

    #[test]
    fn remove_incoming_of_unknown_name_is_noop() {
        let mut g = DependencyGraph::new();
        g.add_edges("b", ["a"], expr("a")).unwrap();
        assert!(g.remove_incoming("zzz").is_empty());
        assert_eq!(g.edge_count(), 1);
    }

    #[test]
    fn rebind_replaces_previous_sources() {
        let mut g = DependencyGraph::new();
        g.add_edges("c", ["a"], expr("a")).unwrap();
        g.rebind("c", ["b"], expr("b")).unwrap();
        assert!(!g.contains("a"));
        assert_eq!(sources(&g, "c"), vec!["b"]);
    }

    #[test]
    fn rebind_to_nothing_detaches() {
        let mut g = DependencyGraph::new();
        g.add_edges("c", ["a"], expr("a")).unwrap();
        g.rebind("c", Vec::<String>::new(), expr("a")).unwrap();
        assert!(g.is_empty());
    }

    #[test]
    fn failed_rebind_restores_previous_edges() {
        let mut g = DependencyGraph::new();
        g.add_edges("a", ["x"], expr("x")).unwrap();
        g.add_edges("b", ["a"], expr("a")).unwrap();

        let err = g.rebind("a", ["b"], expr("b")).unwrap_err();
        assert!(matches!(err, RuntimeError::CyclicDependency { .. }));
        assert_eq!(sources(&g, "a"), vec!["x"]);
        assert_eq!(sources(&g, "b"), vec!["a"]);
        assert_eq!(g.edge_count(), 2);
        let (_, label) = g.outgoing("x").next().unwrap();
        assert_eq!(**label, Expr::Ref("x".to_string()));
    }
}
