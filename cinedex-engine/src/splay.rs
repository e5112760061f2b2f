// ---------------------------------------------------------------------------
// Splay Tree — self-adjusting BST over integer scores
// ---------------------------------------------------------------------------
//
// Nodes live in an arena owned by the tree and link to each other through
// `NodeId` handles. Splaying is top-down (Sleator & Tarjan) and every
// traversal is iterative, so adversarial insert orders that build long
// chains cannot overflow the call stack.
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

/// Handle of a node inside a [`SplayTree`] arena.
pub type NodeId = usize;

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

/// How an insert resolves a score that is already present at the root.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TieBreak {
	/// Bump the incoming score by one so it never overwrites. Stored scores
	/// near ties may differ from the computed ones.
	#[default]
	Nudge,
	/// Order by (score, insertion rank). Stored scores stay exact and equal
	/// scores come back in insertion order.
	Sequence,
}

/// Ordering key. `order` is 0 under [`TieBreak::Nudge`]; under
/// [`TieBreak::Sequence`] it is `u64::MAX - insertion_number`, so earlier
/// inserts rank higher among equal scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct SplayKey {
	score: i64,
	order: u64,
}

#[derive(Debug, Clone)]
struct SplayNode {
	key: SplayKey,
	record_index: usize,
	left: Option<NodeId>,
	right: Option<NodeId>,
}

/// Read-only snapshot of one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeView {
	pub score: i64,
	pub record_index: usize,
}

/// The root and its immediate children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RootView {
	pub root: NodeView,
	pub left: Option<NodeView>,
	pub right: Option<NodeView>,
}

// ---------------------------------------------------------------------------
// SplayTree
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct SplayTree {
	nodes: Vec<SplayNode>,
	root: Option<NodeId>,
	tie_break: TieBreak,
	inserted: u64,
}

impl SplayTree {
	pub fn new(tie_break: TieBreak) -> Self {
		Self {
			tie_break,
			..Self::default()
		}
	}

	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// Drop every node. The tie-break policy is kept.
	pub fn clear(&mut self) {
		self.nodes.clear();
		self.root = None;
		self.inserted = 0;
	}

	// -- Mutation ----------------------------------------------------------

	/// Insert `record_index` under `score` and make it the root.
	///
	/// Returns the score actually stored. Under [`TieBreak::Nudge`] a taken
	/// score is bumped by one, repeatedly, until it is free.
	pub fn insert(&mut self, score: i64, record_index: usize) -> i64 {
		let mut key = self.key_for_insert(score);
		self.inserted += 1;

		let Some(root) = self.root else {
			self.root = Some(self.alloc(key, record_index));
			return key.score;
		};

		let mut root = self.splay(root, key);
		// A bumped score may itself be taken, so keep bumping until the
		// root differs. The split below relies on that.
		while self.tie_break == TieBreak::Nudge
			&& self.nodes[root].key == key
			&& key.score < i64::MAX
		{
			key.score += 1;
			root = self.splay(root, key);
		}

		let node = self.alloc(key, record_index);
		if key < self.nodes[root].key {
			self.nodes[node].right = Some(root);
			self.nodes[node].left = self.nodes[root].left.take();
		} else {
			self.nodes[node].left = Some(root);
			self.nodes[node].right = self.nodes[root].right.take();
		}
		self.root = Some(node);
		key.score
	}

	/// Splay the node nearest `score` to the root. The in-order sequence and
	/// node count are unchanged.
	pub fn access(&mut self, score: i64) {
		if let Some(root) = self.root {
			let target = SplayKey { score, order: 0 };
			self.root = Some(self.splay(root, target));
		}
	}

	fn key_for_insert(&self, score: i64) -> SplayKey {
		match self.tie_break {
			TieBreak::Nudge => SplayKey { score, order: 0 },
			TieBreak::Sequence => SplayKey {
				score,
				order: u64::MAX - self.inserted,
			},
		}
	}

	fn alloc(&mut self, key: SplayKey, record_index: usize) -> NodeId {
		self.nodes.push(SplayNode {
			key,
			record_index,
			left: None,
			right: None,
		});
		self.nodes.len() - 1
	}

	fn rotate_right(&mut self, x: NodeId) -> NodeId {
		let Some(y) = self.nodes[x].left else {
			return x;
		};
		self.nodes[x].left = self.nodes[y].right;
		self.nodes[y].right = Some(x);
		y
	}

	fn rotate_left(&mut self, x: NodeId) -> NodeId {
		let Some(y) = self.nodes[x].right else {
			return x;
		};
		self.nodes[x].right = self.nodes[y].left;
		self.nodes[y].left = Some(x);
		y
	}

	/// Top-down splay of the subtree rooted at `t` toward `key`; returns the
	/// new root. Nodes smaller than `key` are threaded onto a left tree,
	/// larger ones onto a right tree, and both are hung under the final root.
	fn splay(&mut self, mut t: NodeId, key: SplayKey) -> NodeId {
		let mut left_root: Option<NodeId> = None;
		let mut right_root: Option<NodeId> = None;
		let mut left_max: Option<NodeId> = None;
		let mut right_min: Option<NodeId> = None;

		loop {
			let t_key = self.nodes[t].key;
			if key < t_key {
				let Some(l) = self.nodes[t].left else { break };
				if key < self.nodes[l].key {
					t = self.rotate_right(t);
				}
				let Some(next) = self.nodes[t].left else { break };
				match right_min {
					Some(r) => self.nodes[r].left = Some(t),
					None => right_root = Some(t),
				}
				right_min = Some(t);
				self.nodes[t].left = None;
				t = next;
			} else if key > t_key {
				let Some(r) = self.nodes[t].right else { break };
				if key > self.nodes[r].key {
					t = self.rotate_left(t);
				}
				let Some(next) = self.nodes[t].right else { break };
				match left_max {
					Some(l) => self.nodes[l].right = Some(t),
					None => left_root = Some(t),
				}
				left_max = Some(t);
				self.nodes[t].right = None;
				t = next;
			} else {
				break;
			}
		}

		let (t_left, t_right) = (self.nodes[t].left, self.nodes[t].right);
		match left_max {
			Some(l) => self.nodes[l].right = t_left,
			None => left_root = t_left,
		}
		match right_min {
			Some(r) => self.nodes[r].left = t_right,
			None => right_root = t_right,
		}
		self.nodes[t].left = left_root;
		self.nodes[t].right = right_root;
		t
	}

	// -- Reads -------------------------------------------------------------

	/// Record indices from highest to lowest key, at most `limit` of them.
	pub fn collect_descending(&self, limit: usize) -> Vec<usize> {
		let mut out = Vec::with_capacity(limit.min(self.len()));
		self.walk_descending(limit, |node| out.push(node.record_index));
		out
	}

	/// Like [`SplayTree::collect_descending`] but with the stored scores.
	pub fn entries_descending(&self, limit: usize) -> Vec<NodeView> {
		let mut out = Vec::with_capacity(limit.min(self.len()));
		self.walk_descending(limit, |node| out.push(view(node)));
		out
	}

	/// Stored scores in ascending (in-order) sequence.
	#[cfg(test)]
	fn scores_in_order(&self) -> Vec<i64> {
		let mut scores = Vec::with_capacity(self.len());
		self.walk_descending(usize::MAX, |node| scores.push(node.key.score));
		scores.reverse();
		scores
	}

	pub fn root(&self) -> Option<RootView> {
		let root = &self.nodes[self.root?];
		Some(RootView {
			root: view(root),
			left: root.left.map(|id| view(&self.nodes[id])),
			right: root.right.map(|id| view(&self.nodes[id])),
		})
	}

	/// Reverse in-order walk (right, node, left) with an explicit stack.
	fn walk_descending(&self, limit: usize, mut visit: impl FnMut(&SplayNode)) {
		let mut stack: Vec<NodeId> = Vec::new();
		let mut cursor = self.root;
		let mut visited = 0;
		while visited < limit {
			while let Some(id) = cursor {
				stack.push(id);
				cursor = self.nodes[id].right;
			}
			let Some(id) = stack.pop() else { break };
			visit(&self.nodes[id]);
			visited += 1;
			cursor = self.nodes[id].left;
		}
	}
}

fn view(node: &SplayNode) -> NodeView {
	NodeView {
		score: node.key.score,
		record_index: node.record_index,
	}
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
