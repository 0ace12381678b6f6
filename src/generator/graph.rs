//! Task dependency graph.
//!
//! Edges point from an upstream task to the task that consumes its output.
//! All validation happens in [`TaskGraph::new`], so an invalid plan never
//! reaches the scheduler.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use petgraph::Direction;
use petgraph::algo::{is_cyclic_directed, kosaraju_scc};
use petgraph::graph::{DiGraph, NodeIndex};

use crate::error::GraphError;
use crate::generator::task::{TaskDefinition, TaskId};

/// 已校验的任务图
#[derive(Debug)]
pub struct TaskGraph {
    tasks: Vec<TaskDefinition>,
    /// 节点权重为任务在 `tasks` 中的下标
    graph: DiGraph<usize, ()>,
    /// 与源顺序保持稳定的拓扑序
    order: Vec<usize>,
}

impl TaskGraph {
    pub fn new(tasks: Vec<TaskDefinition>) -> Result<Self, GraphError> {
        if tasks.is_empty() {
            return Err(GraphError::Empty);
        }

        let mut index: HashMap<&TaskId, usize> = HashMap::with_capacity(tasks.len());
        for (i, task) in tasks.iter().enumerate() {
            if index.insert(task.id(), i).is_some() {
                return Err(GraphError::DuplicateTask(task.id().clone()));
            }
        }

        let mut graph = DiGraph::with_capacity(tasks.len(), tasks.len());
        let nodes: Vec<NodeIndex> = (0..tasks.len()).map(|i| graph.add_node(i)).collect();

        for (i, task) in tasks.iter().enumerate() {
            for upstream in task.context() {
                let j = *index
                    .get(upstream)
                    .ok_or_else(|| GraphError::UnresolvedDependency {
                        task: task.id().clone(),
                        missing: upstream.clone(),
                    })?;
                graph.add_edge(nodes[j], nodes[i], ());
            }
        }

        if is_cyclic_directed(&graph) {
            return Err(GraphError::CycleDetected {
                cycle: Self::cycle_members(&graph, &tasks),
            });
        }

        let order = Self::stable_topological_order(&graph);
        Ok(Self {
            tasks,
            graph,
            order,
        })
    }

    /// 找出第一个成环的强连通分量，按源顺序列出其中的任务
    fn cycle_members(graph: &DiGraph<usize, ()>, tasks: &[TaskDefinition]) -> Vec<TaskId> {
        let mut cyclic: Vec<Vec<usize>> = kosaraju_scc(graph)
            .into_iter()
            .filter(|scc| scc.len() > 1 || graph.contains_edge(scc[0], scc[0]))
            .map(|scc| {
                let mut members: Vec<usize> = scc.into_iter().map(|n| graph[n]).collect();
                members.sort_unstable();
                members
            })
            .collect();
        cyclic.sort_by_key(|members| members[0]);

        cyclic
            .into_iter()
            .next()
            .unwrap_or_default()
            .into_iter()
            .map(|i| tasks[i].id().clone())
            .collect()
    }

    /// Kahn 算法，就绪任务中总是先取源顺序靠前的那个
    fn stable_topological_order(graph: &DiGraph<usize, ()>) -> Vec<usize> {
        let mut in_degree: Vec<usize> = graph
            .node_indices()
            .map(|n| graph.neighbors_directed(n, Direction::Incoming).count())
            .collect();

        let mut ready: BinaryHeap<Reverse<usize>> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, d)| **d == 0)
            .map(|(i, _)| Reverse(i))
            .collect();

        let mut order = Vec::with_capacity(in_degree.len());
        while let Some(Reverse(i)) = ready.pop() {
            order.push(i);
            for next in graph.neighbors_directed(NodeIndex::new(i), Direction::Outgoing) {
                let j = graph[next];
                in_degree[j] -= 1;
                if in_degree[j] == 0 {
                    ready.push(Reverse(j));
                }
            }
        }
        order
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// 按编写顺序的任务列表
    pub fn tasks(&self) -> &[TaskDefinition] {
        &self.tasks
    }

    /// 执行顺序
    pub fn execution_order(&self) -> impl Iterator<Item = &TaskDefinition> {
        self.order.iter().map(|&i| &self.tasks[i])
    }

    /// 终结任务：执行顺序中的最后一个（约定为撰写类任务）
    pub fn terminal(&self) -> &TaskDefinition {
        // order 覆盖全部任务，且任务图非空
        &self.tasks[self.order[self.order.len() - 1]]
    }

    /// 依赖层级：同一层内的任务互不依赖，上游全部位于更早的层
    pub fn waves(&self) -> Vec<Vec<&TaskDefinition>> {
        let mut level = vec![0usize; self.tasks.len()];
        for &i in &self.order {
            level[i] = self
                .graph
                .neighbors_directed(NodeIndex::new(i), Direction::Incoming)
                .map(|n| level[self.graph[n]] + 1)
                .max()
                .unwrap_or(0);
        }

        let depth = level.iter().copied().max().map_or(0, |m| m + 1);
        let mut waves: Vec<Vec<&TaskDefinition>> = vec![Vec::new(); depth];
        for (i, task) in self.tasks.iter().enumerate() {
            waves[level[i]].push(task);
        }
        waves
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::agent::tests::test_agent;

    fn task(id: &str, deps: &[&str]) -> TaskDefinition {
        TaskDefinition::new(id, test_agent("Worker"), format!("do {}", id), "text")
            .unwrap()
            .with_context(deps.iter().copied())
    }

    fn ids<'a>(tasks: impl Iterator<Item = &'a TaskDefinition>) -> Vec<&'a str> {
        tasks.map(|t| t.id().as_str()).collect()
    }

    #[test]
    fn test_backward_dependencies_keep_source_order() {
        let graph = TaskGraph::new(vec![
            task("research", &[]),
            task("analysis", &["research"]),
            task("proposal", &["research", "analysis"]),
        ])
        .unwrap();

        assert_eq!(
            ids(graph.execution_order()),
            vec!["research", "analysis", "proposal"]
        );
        assert_eq!(graph.terminal().id().as_str(), "proposal");
    }

    #[test]
    fn test_forward_reference_is_reordered() {
        let graph = TaskGraph::new(vec![
            task("summary", &["facts"]),
            task("facts", &[]),
            task("appendix", &[]),
        ])
        .unwrap();

        assert_eq!(
            ids(graph.execution_order()),
            vec!["facts", "summary", "appendix"]
        );
    }

    #[test]
    fn test_order_is_deterministic() {
        let build = || {
            TaskGraph::new(vec![
                task("a", &[]),
                task("b", &[]),
                task("c", &["b"]),
                task("d", &["a"]),
            ])
            .unwrap()
        };
        let first: Vec<String> = build()
            .execution_order()
            .map(|t| t.id().to_string())
            .collect();
        for _ in 0..10 {
            let again: Vec<String> = build()
                .execution_order()
                .map(|t| t.id().to_string())
                .collect();
            assert_eq!(first, again);
        }
        assert_eq!(first, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_two_task_cycle_detected() {
        let err = TaskGraph::new(vec![task("a", &["b"]), task("b", &["a"])]).unwrap_err();
        assert_eq!(
            err,
            GraphError::CycleDetected {
                cycle: vec![TaskId::from("a"), TaskId::from("b")]
            }
        );
    }

    #[test]
    fn test_self_dependency_detected() {
        let err = TaskGraph::new(vec![task("root", &[]), task("loop", &["loop"])]).unwrap_err();
        assert_eq!(
            err,
            GraphError::CycleDetected {
                cycle: vec![TaskId::from("loop")]
            }
        );
    }

    #[test]
    fn test_transitive_cycle_detected() {
        let err = TaskGraph::new(vec![
            task("ok", &[]),
            task("a", &["c"]),
            task("b", &["a"]),
            task("c", &["b", "ok"]),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            GraphError::CycleDetected {
                cycle: vec![TaskId::from("a"), TaskId::from("b"), TaskId::from("c")]
            }
        );
    }

    #[test]
    fn test_unresolved_dependency() {
        let err = TaskGraph::new(vec![task("analysis", &["research"])]).unwrap_err();
        assert_eq!(
            err,
            GraphError::UnresolvedDependency {
                task: TaskId::from("analysis"),
                missing: TaskId::from("research"),
            }
        );
    }

    #[test]
    fn test_duplicate_and_empty() {
        assert_eq!(TaskGraph::new(vec![]).unwrap_err(), GraphError::Empty);
        assert_eq!(
            TaskGraph::new(vec![task("a", &[]), task("a", &[])]).unwrap_err(),
            GraphError::DuplicateTask(TaskId::from("a"))
        );
    }

    #[test]
    fn test_waves_group_independent_tasks() {
        let graph = TaskGraph::new(vec![
            task("web", &[]),
            task("papers", &[]),
            task("analysis", &["web", "papers"]),
            task("proposal", &["analysis", "web"]),
        ])
        .unwrap();

        let waves: Vec<Vec<&str>> = graph
            .waves()
            .into_iter()
            .map(|w| ids(w.into_iter()))
            .collect();
        assert_eq!(
            waves,
            vec![vec!["web", "papers"], vec!["analysis"], vec!["proposal"]]
        );
    }
}
