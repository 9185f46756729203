//! Skill catalog: the fixed, validated set of skill definitions.
//!
//! Catalogs are assembled with a [`SkillCatalogBuilder`] and frozen by
//! [`SkillCatalogBuilder::build`], which refuses to produce a catalog whose
//! prerequisite graph is broken. A built [`Catalog`] never changes; unlock
//! state lives in the progression engine.
//!
//! # Validation passes
//!
//! 1. Definitions: unique ids, tiers in `1..=5`.
//! 2. References: every prerequisite exists, is listed once, and is not the
//!    node itself. Skills named inside effects (synergy companions,
//!    `SkillUnlocked` conditions) must exist and must not be the owner.
//! 3. Cycles: three-colour depth-first search over the prerequisite edges.

use crate::effect::Effect;
use crate::id::{Category, SkillId, Tier};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

// ---------------------------------------------------------------------------
// Skill node
// ---------------------------------------------------------------------------

/// A single unlockable skill. Immutable once part of a [`Catalog`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillNode {
    pub id: SkillId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// XP required to unlock.
    pub cost: u32,
    pub tier: Tier,
    pub category: Category,
    pub effect: Effect,
    /// Skills that must be unlocked first, in definition order.
    #[serde(default)]
    pub prerequisites: Vec<SkillId>,
}

impl SkillNode {
    pub fn new(
        id: impl Into<SkillId>,
        name: impl Into<String>,
        cost: u32,
        tier: u8,
        category: Category,
        effect: Effect,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            cost,
            tier: Tier(tier),
            category,
            effect,
            prerequisites: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effect = effect;
        self
    }

    pub fn with_prerequisites<I, S>(mut self, prerequisites: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SkillId>,
    {
        self.prerequisites = prerequisites.into_iter().map(Into::into).collect();
        self
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A structural problem in a set of skill definitions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogIntegrityError {
    #[error("duplicate skill id: {0}")]
    DuplicateSkill(SkillId),

    #[error("skill {skill} has tier {tier}, expected 1..=5")]
    InvalidTier { skill: SkillId, tier: u8 },

    #[error("prerequisite {prerequisite} of skill {skill} does not exist")]
    DanglingPrerequisite {
        skill: SkillId,
        prerequisite: SkillId,
    },

    #[error("skill {skill} lists itself as a prerequisite")]
    SelfPrerequisite { skill: SkillId },

    #[error("skill {skill} lists prerequisite {prerequisite} more than once")]
    DuplicatePrerequisite {
        skill: SkillId,
        prerequisite: SkillId,
    },

    #[error("effect of skill {skill} refers to unknown skill {reference}")]
    DanglingEffectReference { skill: SkillId, reference: SkillId },

    #[error("effect of skill {skill} refers to the skill itself")]
    SelfEffectReference { skill: SkillId },

    #[error("prerequisite cycle through skill {skill}")]
    Cycle { skill: SkillId },
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Collects skill definitions and validates them into a [`Catalog`].
#[derive(Debug, Default)]
pub struct SkillCatalogBuilder {
    nodes: Vec<SkillNode>,
}

impl SkillCatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a definition. Nothing is checked until [`build`](Self::build).
    pub fn add(&mut self, node: SkillNode) -> &mut Self {
        self.nodes.push(node);
        self
    }

    pub fn extend(&mut self, nodes: impl IntoIterator<Item = SkillNode>) -> &mut Self {
        self.nodes.extend(nodes);
        self
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Run every validation pass and freeze the catalog. Fails with the
    /// first issue found.
    pub fn build(self) -> Result<Catalog, CatalogIntegrityError> {
        if let Some(err) = validate_nodes(&self.nodes).into_iter().next() {
            tracing::warn!(error = %err, "skill catalog rejected");
            return Err(err);
        }
        let catalog = Catalog::from_validated(self.nodes);
        tracing::debug!(skills = catalog.len(), "skill catalog built");
        Ok(catalog)
    }
}

/// Run all validation passes over `nodes` and return every issue found.
///
/// Reference and cycle checks only follow edges that resolve to a single
/// known node, so a dangling or self reference is reported once and never
/// doubles as a cycle.
pub fn validate_nodes(nodes: &[SkillNode]) -> Vec<CatalogIntegrityError> {
    let mut issues = Vec::new();

    // Pass 1: definitions.
    let mut index: HashMap<&SkillId, usize> = HashMap::with_capacity(nodes.len());
    for (i, node) in nodes.iter().enumerate() {
        if index.insert(&node.id, i).is_some() {
            issues.push(CatalogIntegrityError::DuplicateSkill(node.id.clone()));
        }
        if !node.tier.is_valid() {
            issues.push(CatalogIntegrityError::InvalidTier {
                skill: node.id.clone(),
                tier: node.tier.0,
            });
        }
    }

    // Pass 2: references. Builds the adjacency used by pass 3.
    let mut edges: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    for (i, node) in nodes.iter().enumerate() {
        let mut listed: HashSet<&SkillId> = HashSet::with_capacity(node.prerequisites.len());
        for prereq in &node.prerequisites {
            if *prereq == node.id {
                issues.push(CatalogIntegrityError::SelfPrerequisite {
                    skill: node.id.clone(),
                });
                continue;
            }
            if !listed.insert(prereq) {
                issues.push(CatalogIntegrityError::DuplicatePrerequisite {
                    skill: node.id.clone(),
                    prerequisite: prereq.clone(),
                });
                continue;
            }
            match index.get(prereq) {
                Some(&p) => edges[i].push(p),
                None => issues.push(CatalogIntegrityError::DanglingPrerequisite {
                    skill: node.id.clone(),
                    prerequisite: prereq.clone(),
                }),
            }
        }

        // Effect references are not unlock edges and take no part in pass 3.
        for reference in node.effect.referenced_skills() {
            if *reference == node.id {
                issues.push(CatalogIntegrityError::SelfEffectReference {
                    skill: node.id.clone(),
                });
            } else if !index.contains_key(reference) {
                issues.push(CatalogIntegrityError::DanglingEffectReference {
                    skill: node.id.clone(),
                    reference: reference.clone(),
                });
            }
        }
    }

    // Pass 3: cycles.
    for i in find_cycles(&edges) {
        issues.push(CatalogIntegrityError::Cycle {
            skill: nodes[i].id.clone(),
        });
    }

    issues
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
    Unvisited,
    Visiting,
    Visited,
}

/// Iterative three-colour DFS. Returns the nodes at which a back edge was
/// found, one per back edge, in discovery order.
fn find_cycles(edges: &[Vec<usize>]) -> Vec<usize> {
    let mut color = vec![Color::Unvisited; edges.len()];
    let mut found = Vec::new();
    let mut stack: Vec<(usize, usize)> = Vec::new();

    for start in 0..edges.len() {
        if color[start] != Color::Unvisited {
            continue;
        }
        color[start] = Color::Visiting;
        stack.push((start, 0));

        while let Some(top) = stack.last_mut() {
            let node = top.0;
            if top.1 < edges[node].len() {
                let next = edges[node][top.1];
                top.1 += 1;
                match color[next] {
                    Color::Unvisited => {
                        color[next] = Color::Visiting;
                        stack.push((next, 0));
                    }
                    Color::Visiting => found.push(next),
                    Color::Visited => {}
                }
            } else {
                color[node] = Color::Visited;
                stack.pop();
            }
        }
    }

    found
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Immutable, validated skill catalog. Iteration follows definition order.
#[derive(Debug, Clone)]
pub struct Catalog {
    nodes: Vec<SkillNode>,
    index: HashMap<SkillId, usize>,
    /// Direct dependents of each node, by index.
    dependents: Vec<Vec<usize>>,
}

impl Catalog {
    fn from_validated(nodes: Vec<SkillNode>) -> Self {
        let index: HashMap<SkillId, usize> = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.clone(), i))
            .collect();

        let mut dependents = vec![Vec::new(); nodes.len()];
        for (i, node) in nodes.iter().enumerate() {
            for prereq in &node.prerequisites {
                if let Some(&p) = index.get(prereq) {
                    dependents[p].push(i);
                }
            }
        }

        Self {
            nodes,
            index,
            dependents,
        }
    }

    pub fn get<Q>(&self, id: &Q) -> Option<&SkillNode>
    where
        SkillId: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn contains<Q>(&self, id: &Q) -> bool
    where
        SkillId: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.contains_key(id)
    }

    /// Definition-order position of a skill.
    pub fn position<Q>(&self, id: &Q) -> Option<usize>
    where
        SkillId: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.get(id).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SkillNode> {
        self.nodes.iter()
    }

    pub fn nodes(&self) -> &[SkillNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Skills that list `id` as a direct prerequisite.
    pub fn dependents<Q>(&self, id: &Q) -> Vec<&SkillNode>
    where
        SkillId: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.index.get(id) {
            Some(&i) => self.dependents[i].iter().map(|&d| &self.nodes[d]).collect(),
            None => Vec::new(),
        }
    }

    /// Skills with no prerequisites.
    pub fn roots(&self) -> impl Iterator<Item = &SkillNode> {
        self.nodes.iter().filter(|n| n.prerequisites.is_empty())
    }

    pub fn by_category(&self, category: Category) -> impl Iterator<Item = &SkillNode> {
        self.nodes.iter().filter(move |n| n.category == category)
    }

    pub fn by_tier(&self, tier: Tier) -> impl Iterator<Item = &SkillNode> {
        self.nodes.iter().filter(move |n| n.tier == tier)
    }

    /// Re-run the builder's validation passes. A built catalog always
    /// returns an empty list.
    pub fn validate(&self) -> Vec<CatalogIntegrityError> {
        validate_nodes(&self.nodes)
    }

    /// Every skill reachable backwards from `id` through prerequisites,
    /// excluding `id` itself.
    pub fn ancestors<Q>(&self, id: &Q) -> HashSet<&SkillId>
    where
        SkillId: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut seen = HashSet::new();
        let Some(node) = self.get(id) else {
            return seen;
        };
        let mut stack: Vec<&SkillId> = node.prerequisites.iter().collect();
        while let Some(next) = stack.pop() {
            if seen.insert(next)
                && let Some(n) = self.get::<SkillId>(next)
            {
                stack.extend(n.prerequisites.iter());
            }
        }
        seen
    }
}

// ===========================================================================
// Tests
// ===========================================================================
