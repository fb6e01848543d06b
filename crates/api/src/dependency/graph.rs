use std::collections::HashMap;
use std::fmt;
use std::iter;
use std::sync::Arc;

use super::provider::{Provide, Provider};
use crate::error::ConfigError;
use crate::extract::ParamSpec;

pub type NodeId = usize;

/// A provider with its sub-dependency names resolved to node ids.
pub struct Node {
    name: String,
    params: Vec<ParamSpec>,
    dependencies: Vec<NodeId>,
    provide: Arc<dyn Provide>,
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("dependencies", &self.dependencies)
            .finish_non_exhaustive()
    }
}

impl Node {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    pub fn dependencies(&self) -> &[NodeId] {
        &self.dependencies
    }

    pub(crate) fn provide(&self) -> &dyn Provide {
        self.provide.as_ref()
    }
}

/// The registered providers, checked to form a DAG.
#[derive(Debug)]
pub struct DependencyGraph {
    nodes: Vec<Node>,
    index: HashMap<String, NodeId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

impl DependencyGraph {
    pub fn build(providers: Vec<Provider>) -> Result<Self, ConfigError> {
        let mut index = HashMap::with_capacity(providers.len());
        for (id, provider) in providers.iter().enumerate() {
            if index.insert(provider.name.clone(), id).is_some() {
                return Err(ConfigError::DuplicateProvider { name: provider.name.clone() });
            }
        }

        let nodes = providers
            .into_iter()
            .map(|provider| {
                let dependencies = provider
                    .dependencies
                    .iter()
                    .map(|name| index.get(name).copied().ok_or_else(|| ConfigError::unknown_dependency(name, &provider.name)))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Node { name: provider.name, params: provider.params, dependencies, provide: provider.provide })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        let graph = Self { nodes, index };
        graph.check_acyclic()?;
        Ok(graph)
    }

    /// Finds the provider registered under `name`; `required_by` names the consumer for the error.
    pub fn lookup(&self, name: &str, required_by: &str) -> Result<NodeId, ConfigError> {
        self.index.get(name).copied().ok_or_else(|| ConfigError::unknown_dependency(name, required_by))
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Every node reachable from `roots`, each once, dependencies before their consumers.
    pub fn reachable(&self, roots: &[NodeId]) -> Vec<NodeId> {
        let mut seen = vec![false; self.nodes.len()];
        let mut order = Vec::new();
        for &root in roots {
            self.collect(root, &mut seen, &mut order);
        }
        order
    }

    fn collect(&self, id: NodeId, seen: &mut [bool], order: &mut Vec<NodeId>) {
        if seen[id] {
            return;
        }
        seen[id] = true;
        for &dependency in &self.nodes[id].dependencies {
            self.collect(dependency, seen, order);
        }
        order.push(id);
    }

    fn check_acyclic(&self) -> Result<(), ConfigError> {
        let mut marks = vec![Mark::Unvisited; self.nodes.len()];
        let mut path = Vec::new();
        for id in 0..self.nodes.len() {
            self.visit(id, &mut marks, &mut path)?;
        }
        Ok(())
    }

    fn visit(&self, id: NodeId, marks: &mut [Mark], path: &mut Vec<NodeId>) -> Result<(), ConfigError> {
        match marks[id] {
            Mark::Done => return Ok(()),
            Mark::InProgress => {
                let start = path.iter().position(|&node| node == id).unwrap_or_default();
                let cycle: Vec<&str> =
                    path[start..].iter().chain(iter::once(&id)).map(|&node| self.nodes[node].name.as_str()).collect();
                return Err(ConfigError::DependencyCycle { cycle: cycle.join(" -> ") });
            }
            Mark::Unvisited => {}
        }

        marks[id] = Mark::InProgress;
        path.push(id);
        for &dependency in &self.nodes[id].dependencies {
            self.visit(dependency, marks, path)?;
        }
        path.pop();
        marks[id] = Mark::Done;
        Ok(())
    }
}
