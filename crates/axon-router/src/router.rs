//! Segment-indexed listener tree.

use crate::error::RouterError;
use crate::pattern::{normalize, segments, WILDCARD};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Listener callback. Receives the normalized event path and its payload.
///
/// Callbacks are invoked synchronously during [`PatternRouter::dispatch`]
/// and must not block; shared with `Arc` so dispatch can run against
/// `&self` while callers keep interior state of their own.
pub type ListenerFn = Arc<dyn Fn(&str, &Value) + Send + Sync>;

struct Listener {
    callback: ListenerFn,
    enabled: bool,
    /// Registration sequence number; dispatch order is ascending `seq`.
    seq: u64,
}

#[derive(Default)]
struct Node {
    literals: HashMap<String, Node>,
    wildcard: Option<Box<Node>>,
    listener: Option<Listener>,
}

impl Node {
    fn is_empty(&self) -> bool {
        self.listener.is_none() && self.literals.is_empty() && self.wildcard.is_none()
    }
}

/// Dynamic registry of path patterns with multicast dispatch.
///
/// One listener per normalized pattern; re-registering an active pattern
/// is an idempotent no-op. Disabling keeps the tree node (and with it the
/// listener's registration-order position); unregistering removes it and
/// prunes nodes left empty.
///
/// # Example
///
/// ```
/// use axon_router::PatternRouter;
/// use serde_json::json;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// let mut router = PatternRouter::new();
/// let hits = Arc::new(AtomicUsize::new(0));
/// let h = Arc::clone(&hits);
///
/// router
///     .register("/game-flow/*", move |_, _| {
///         h.fetch_add(1, Ordering::SeqCst);
///     })
///     .unwrap();
///
/// router.dispatch("game-flow/phase/", &json!("InProgress"));
/// assert_eq!(hits.load(Ordering::SeqCst), 1);
/// ```
pub struct PatternRouter {
    root: Node,
    next_seq: u64,
    len: usize,
}

impl PatternRouter {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: Node::default(),
            next_seq: 0,
            len: 0,
        }
    }

    /// Registers a listener for `pattern`.
    ///
    /// The pattern is normalized first. Returns `Ok(true)` if the
    /// listener was inserted, `Ok(false)` if the normalized pattern
    /// already has an active listener (idempotent no-op).
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::InvalidPattern`] if the pattern has no
    /// segments after normalization.
    pub fn register<F>(&mut self, pattern: &str, callback: F) -> Result<bool, RouterError>
    where
        F: Fn(&str, &Value) + Send + Sync + 'static,
    {
        let normalized = normalize(pattern);
        let segs = segments(&normalized);
        if segs.is_empty() {
            return Err(RouterError::InvalidPattern(pattern.to_string()));
        }

        let mut node = &mut self.root;
        for seg in &segs {
            node = if *seg == WILDCARD {
                node.wildcard.get_or_insert_with(Box::default).as_mut()
            } else {
                node.literals.entry((*seg).to_string()).or_default()
            };
        }

        if node.listener.is_some() {
            return Ok(false);
        }

        node.listener = Some(Listener {
            callback: Arc::new(callback),
            enabled: true,
            seq: self.next_seq,
        });
        self.next_seq += 1;
        self.len += 1;
        Ok(true)
    }

    /// Removes the listener for `pattern`, pruning nodes left without
    /// listeners or children.
    ///
    /// Returns `true` if a listener was removed.
    pub fn unregister(&mut self, pattern: &str) -> bool {
        let normalized = normalize(pattern);
        let segs = segments(&normalized);
        if segs.is_empty() {
            return false;
        }
        let removed = remove_at(&mut self.root, &segs);
        if removed {
            self.len -= 1;
        }
        removed
    }

    /// Enables or disables the listener for `pattern` without removing
    /// it. A disabled listener keeps its registration-order position.
    ///
    /// Returns `false` if no listener is registered for the pattern.
    pub fn set_enabled(&mut self, pattern: &str, enabled: bool) -> bool {
        let normalized = normalize(pattern);
        let segs = segments(&normalized);

        let mut node = &mut self.root;
        for seg in &segs {
            let next = if *seg == WILDCARD {
                node.wildcard.as_deref_mut()
            } else {
                node.literals.get_mut(*seg)
            };
            match next {
                Some(n) => node = n,
                None => return false,
            }
        }

        match node.listener.as_mut() {
            Some(listener) => {
                listener.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Returns `true` if `pattern` has a registered listener
    /// (enabled or not).
    #[must_use]
    pub fn contains(&self, pattern: &str) -> bool {
        let normalized = normalize(pattern);
        let segs = segments(&normalized);

        let mut node = &self.root;
        for seg in &segs {
            let next = if *seg == WILDCARD {
                node.wildcard.as_deref()
            } else {
                node.literals.get(*seg)
            };
            match next {
                Some(n) => node = n,
                None => return false,
            }
        }
        node.listener.is_some()
    }

    /// Dispatches a path-keyed event to every matching enabled listener.
    ///
    /// The path is normalized identically to registered patterns, then
    /// the tree is walked segment by segment, following both the literal
    /// child and the wildcard child at each step. All reachable terminal
    /// listeners fire, in registration order, each exactly once.
    ///
    /// Returns the number of listeners invoked.
    pub fn dispatch(&self, path: &str, payload: &Value) -> usize {
        let normalized = normalize(path);
        let segs = segments(&normalized);
        if segs.is_empty() {
            return 0;
        }

        let mut matched: Vec<(u64, ListenerFn)> = Vec::new();
        collect(&self.root, &segs, &mut matched);

        // Overlapping traversal paths must not double-fire one listener.
        matched.sort_by_key(|(seq, _)| *seq);
        matched.dedup_by_key(|(seq, _)| *seq);

        for (_, callback) in &matched {
            callback(&normalized, payload);
        }
        matched.len()
    }

    /// Returns the number of registered listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no listeners are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for PatternRouter {
    fn default() -> Self {
        Self::new()
    }
}

fn remove_at(node: &mut Node, segs: &[&str]) -> bool {
    let Some((head, rest)) = segs.split_first() else {
        return node.listener.take().is_some();
    };

    if *head == WILDCARD {
        let Some(child) = node.wildcard.as_deref_mut() else {
            return false;
        };
        let removed = remove_at(child, rest);
        if removed && child.is_empty() {
            node.wildcard = None;
        }
        removed
    } else {
        let Some(child) = node.literals.get_mut(*head) else {
            return false;
        };
        let removed = remove_at(child, rest);
        if removed && child.is_empty() {
            node.literals.remove(*head);
        }
        removed
    }
}

fn collect(node: &Node, segs: &[&str], out: &mut Vec<(u64, ListenerFn)>) {
    let Some((head, rest)) = segs.split_first() else {
        if let Some(listener) = &node.listener {
            if listener.enabled {
                out.push((listener.seq, Arc::clone(&listener.callback)));
            }
        }
        return;
    };

    if let Some(child) = node.literals.get(*head) {
        collect(child, rest, out);
    }

    if let Some(wild) = node.wildcard.as_deref() {
        collect(wild, rest, out);

        // A terminal wildcard consumes the whole remaining suffix, so
        // "/a/*" also matches "/a/b/c".
        if !rest.is_empty() {
            if let Some(listener) = &wild.listener {
                if listener.enabled {
                    out.push((listener.seq, Arc::clone(&listener.callback)));
                }
            }
        }
    }
}
