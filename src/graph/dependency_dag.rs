use crate::task::Task;
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet, VecDeque};

/// Dependency DAG over a task list. Nodes carry task ids in input order;
/// edges run predecessor -> successor. References to unknown task ids are
/// skipped, so the graph only ever contains tasks from the input list.
pub struct DependencyDag {
    pub graph: DiGraph<String, ()>,
    pub id_to_index: HashMap<String, NodeIndex>,
}

impl DependencyDag {
    pub fn build(tasks: &[Task]) -> Self {
        let mut graph: DiGraph<String, ()> = DiGraph::new();
        let mut id_to_index: HashMap<String, NodeIndex> = HashMap::with_capacity(tasks.len());

        for task in tasks {
            let node_ix = graph.add_node(task.id.clone());
            id_to_index.insert(task.id.clone(), node_ix);
        }

        for task in tasks {
            let Some(&succ_ix) = id_to_index.get(&task.id) else {
                continue;
            };
            for dependency in &task.predecessors {
                if let Some(&pred_ix) = id_to_index.get(&dependency.task_id) {
                    graph.add_edge(pred_ix, succ_ix, ());
                }
            }
        }

        Self { graph, id_to_index }
    }

    /// Depth-first cycle search with a path set tracking the chain currently
    /// being explored. The traversal keeps its own work stack, so dependency
    /// chains of any depth are safe. Returns the id of the task where the
    /// first cycle was detected, or `None` for a DAG.
    pub fn find_cycle(&self) -> Option<String> {
        let mut visited: HashSet<NodeIndex> = HashSet::new();
        let mut on_path: HashSet<NodeIndex> = HashSet::new();

        for start_ix in self.graph.node_indices() {
            if visited.contains(&start_ix) {
                continue;
            }
            visited.insert(start_ix);
            on_path.insert(start_ix);
            let mut stack =
                vec![(start_ix, self.graph.neighbors_directed(start_ix, Direction::Outgoing))];

            while let Some(frame) = stack.last_mut() {
                let node_ix = frame.0;
                match frame.1.next() {
                    Some(succ_ix) => {
                        if on_path.contains(&succ_ix) {
                            return Some(self.graph[succ_ix].clone());
                        }
                        if visited.insert(succ_ix) {
                            on_path.insert(succ_ix);
                            stack.push((
                                succ_ix,
                                self.graph.neighbors_directed(succ_ix, Direction::Outgoing),
                            ));
                        }
                    }
                    None => {
                        on_path.remove(&node_ix);
                        stack.pop();
                    }
                }
            }
        }
        None
    }

    /// Kahn's algorithm. The queue is seeded in input order, so tasks with no
    /// dependency relationship stay in their relative input order. Tasks on a
    /// cycle are never reached and are omitted from the result; callers must
    /// run [`find_cycle`](Self::find_cycle) first.
    pub fn topological_order(&self) -> Vec<String> {
        let mut in_degree: HashMap<NodeIndex, usize> = HashMap::new();
        for node_ix in self.graph.node_indices() {
            let degree = self
                .graph
                .neighbors_directed(node_ix, Direction::Incoming)
                .count();
            in_degree.insert(node_ix, degree);
        }

        let mut queue: VecDeque<NodeIndex> = self
            .graph
            .node_indices()
            .filter(|node_ix| in_degree[node_ix] == 0)
            .collect();

        let mut order = Vec::with_capacity(self.graph.node_count());
        while let Some(node_ix) = queue.pop_front() {
            order.push(self.graph[node_ix].clone());
            for succ_ix in self.graph.neighbors_directed(node_ix, Direction::Outgoing) {
                let degree = in_degree.get_mut(&succ_ix).unwrap();
                *degree -= 1;
                if *degree == 0 {
                    queue.push_back(succ_ix);
                }
            }
        }
        order
    }
}
